//! 跨服务环境变量组合
//!
//! 纯函数：同样的 URL 输入总是得到同样的变量集合。

use std::collections::BTreeMap;

/// Postgres 服务的延迟引用（部署时由 Railway 解析）
pub const POSTGRES_REFERENCE: &str = "${{Postgres.DATABASE_URL}}";
/// Redis 服务的延迟引用
pub const REDIS_REFERENCE: &str = "${{Redis.REDIS_URL}}";

pub const API_PLACEHOLDER_URL: &str = "https://api-placeholder.railway.app";
pub const FRONTEND_PLACEHOLDER_URL: &str = "https://frontend-placeholder.railway.app";

/// 编辑器链接中的两个动态路径参数
pub const EDITOR_PATH_PATTERN: &str = "/bal/<id>/<token>";
pub const API_VERSION_PATH: &str = "/v2";

pub const URL_SCHEME: &str = "https://";

/// 两个服务的公网 URL，未生成域名时为 None
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ServiceUrls {
    pub api: Option<String>,
    pub frontend: Option<String>,
}

impl ServiceUrls {
    pub fn api_or_placeholder(&self) -> &str {
        self.api.as_deref().unwrap_or(API_PLACEHOLDER_URL)
    }

    pub fn frontend_or_placeholder(&self) -> &str {
        self.frontend.as_deref().unwrap_or(FRONTEND_PLACEHOLDER_URL)
    }
}

/// 主机名 -> 完整 URL；空主机名视为没有域名
pub fn url_for_domain(domain: Option<&str>) -> Option<String> {
    domain
        .map(str::trim)
        .filter(|d| !d.is_empty())
        .map(|d| format!("{}{}", URL_SCHEME, d))
}

/// API 服务变量
pub fn api_variables(urls: &ServiceUrls) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    vars.insert("POSTGRES_URL".to_string(), POSTGRES_REFERENCE.to_string());
    vars.insert("REDIS_URL".to_string(), REDIS_REFERENCE.to_string());
    vars.insert("API_URL".to_string(), urls.api_or_placeholder().to_string());
    vars.insert(
        "EDITOR_URL_PATTERN".to_string(),
        format!("{}{}", urls.frontend_or_placeholder(), EDITOR_PATH_PATTERN),
    );
    vars
}

/// Frontend 服务变量
pub fn frontend_variables(urls: &ServiceUrls) -> BTreeMap<String, String> {
    let mut vars = BTreeMap::new();
    vars.insert(
        "NEXT_PUBLIC_EDITEUR_URL".to_string(),
        urls.frontend_or_placeholder().to_string(),
    );
    vars.insert(
        "NEXT_PUBLIC_BAL_API_URL".to_string(),
        format!("{}{}", urls.api_or_placeholder(), API_VERSION_PATH),
    );
    vars
}
