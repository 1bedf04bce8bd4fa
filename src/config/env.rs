//! 环境变量配置加载

use std::env;
use tracing::debug;

use crate::domain::source::{GithubSource, RepoSpec, ServiceRole};
use crate::error::{ProvisionError, ProvisionResult};

use self::constants::{DEFAULT_BRANCH, DEFAULT_PROJECT_NAME, RAILWAY_GRAPHQL_URL};

/// 运行配置（一次构建，按引用传入编排流程）
#[derive(Clone, Debug)]
pub struct SetupConfig {
    /// Railway API token
    pub token: String,
    /// GraphQL 端点
    pub endpoint: String,
    /// 已有项目 ID；未设置时创建新项目
    pub project_id: Option<String>,
    /// 新项目所在 workspace
    pub workspace_id: Option<String>,
    /// 新项目名称
    pub project_name: String,
    pub github_owner: String,
    pub api_repo: RepoSpec,
    pub frontend_repo: RepoSpec,
    pub branch: String,
    /// Monorepo 子目录
    pub api_root_dir: Option<String>,
    pub frontend_root_dir: Option<String>,
    /// 只打印计划，不调用远端
    pub dry_run: bool,
}

/// 命令行参数（覆盖环境变量）
#[derive(Clone, Debug, Default)]
pub struct RuntimeConfig {
    pub dry_run: bool,
}

impl SetupConfig {
    /// 从环境变量加载配置
    pub fn from_env() -> ProvisionResult<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// 从任意 key 查找函数加载配置，空字符串视为未设置
    pub fn from_lookup<F>(lookup: F) -> ProvisionResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());
        let required = |key: &str| {
            get(key).ok_or_else(|| {
                ProvisionError::configuration(format!("Missing required env: {}", key))
            })
        };

        let token = required("RAILWAY_TOKEN")?;
        let github_owner = required("GITHUB_OWNER")?;
        let api_repo = RepoSpec::parse(&required("GITHUB_REPO_API")?, &github_owner)?;
        let frontend_repo = RepoSpec::parse(&required("GITHUB_REPO_FRONTEND")?, &github_owner)?;

        let endpoint = get("RAILWAY_API_URL").unwrap_or_else(|| RAILWAY_GRAPHQL_URL.to_string());
        let project_name =
            get("RAILWAY_PROJECT_NAME").unwrap_or_else(|| DEFAULT_PROJECT_NAME.to_string());
        let branch = get("GITHUB_BRANCH").unwrap_or_else(|| DEFAULT_BRANCH.to_string());
        let dry_run = get("DRY_RUN").map(|v| parse_flag(&v)).unwrap_or(false);

        let config = Self {
            token,
            endpoint,
            project_id: get("RAILWAY_PROJECT_ID"),
            workspace_id: get("RAILWAY_WORKSPACE_ID"),
            project_name,
            github_owner,
            api_repo,
            frontend_repo,
            branch,
            api_root_dir: get("API_ROOT_DIR"),
            frontend_root_dir: get("FRONTEND_ROOT_DIR"),
            dry_run,
        };

        debug!(
            endpoint = %config.endpoint,
            project_id = ?config.project_id,
            api_repo = %config.api_repo,
            frontend_repo = %config.frontend_repo,
            branch = %config.branch,
            dry_run = config.dry_run,
            "Loaded setup config"
        );

        Ok(config)
    }

    /// 指定角色的 GitHub 源
    pub fn source_for(&self, role: ServiceRole) -> GithubSource {
        match role {
            ServiceRole::Api => {
                GithubSource::new(&self.api_repo, &self.branch, self.api_root_dir.as_deref())
            }
            ServiceRole::Frontend => GithubSource::new(
                &self.frontend_repo,
                &self.branch,
                self.frontend_root_dir.as_deref(),
            ),
        }
    }

    /// 应用命令行覆盖
    pub fn with_runtime(mut self, runtime: &RuntimeConfig) -> Self {
        if runtime.dry_run {
            self.dry_run = true;
        }
        self
    }
}

/// `1` / `true`（不区分大小写）
fn parse_flag(value: &str) -> bool {
    value == "1" || value.eq_ignore_ascii_case("true")
}

/// 常量
pub mod constants {
    /// Railway GraphQL 端点
    pub const RAILWAY_GRAPHQL_URL: &str = "https://backboard.railway.app/graphql/v2";

    pub const DEFAULT_PROJECT_NAME: &str = "nap-us";

    pub const DEFAULT_BRANCH: &str = "main";

    /// HTTP 请求超时（秒）
    pub const REQUEST_TIMEOUT_SECS: u64 = 30;

    /// 版本号
    pub const VERSION: &str = env!("CARGO_PKG_VERSION");
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| map.get(key).cloned()
    }

    const BASE: &[(&str, &str)] = &[
        ("RAILWAY_TOKEN", "tok"),
        ("GITHUB_OWNER", "acme"),
        ("GITHUB_REPO_API", "bal-api"),
        ("GITHUB_REPO_FRONTEND", "bal-front"),
    ];

    #[test]
    fn test_defaults() {
        let config = SetupConfig::from_lookup(lookup(BASE)).unwrap();
        assert_eq!(config.token, "tok");
        assert_eq!(config.endpoint, RAILWAY_GRAPHQL_URL);
        assert_eq!(config.project_name, "nap-us");
        assert_eq!(config.branch, "main");
        assert_eq!(config.api_repo.full_name(), "acme/bal-api");
        assert_eq!(config.frontend_repo.full_name(), "acme/bal-front");
        assert!(config.project_id.is_none());
        assert!(config.api_root_dir.is_none());
        assert!(!config.dry_run);
    }

    #[test]
    fn test_missing_required() {
        for missing in ["RAILWAY_TOKEN", "GITHUB_OWNER", "GITHUB_REPO_API", "GITHUB_REPO_FRONTEND"] {
            let pairs: Vec<(&str, &str)> =
                BASE.iter().copied().filter(|(k, _)| *k != missing).collect();
            let err = SetupConfig::from_lookup(lookup(&pairs)).unwrap_err();
            assert!(matches!(err, ProvisionError::Configuration(_)));
            assert!(err.to_string().contains(missing));
        }
    }

    #[test]
    fn test_empty_values_are_unset() {
        let mut pairs = BASE.to_vec();
        pairs.push(("RAILWAY_PROJECT_ID", ""));
        pairs.push(("GITHUB_BRANCH", ""));
        let config = SetupConfig::from_lookup(lookup(&pairs)).unwrap();
        assert!(config.project_id.is_none());
        assert_eq!(config.branch, "main");

        let mut pairs = BASE.to_vec();
        pairs.retain(|(k, _)| *k != "RAILWAY_TOKEN");
        pairs.push(("RAILWAY_TOKEN", ""));
        assert!(SetupConfig::from_lookup(lookup(&pairs)).is_err());
    }

    #[test]
    fn test_optional_values() {
        let mut pairs = BASE.to_vec();
        pairs.extend([
            ("RAILWAY_PROJECT_ID", "proj-1"),
            ("RAILWAY_WORKSPACE_ID", "ws-1"),
            ("GITHUB_REPO_FRONTEND", "otherorg/front"),
            ("GITHUB_BRANCH", "develop"),
            ("API_ROOT_DIR", "mes-adresses-api"),
            ("DRY_RUN", "TRUE"),
        ]);
        let config = SetupConfig::from_lookup(lookup(&pairs)).unwrap();
        assert_eq!(config.project_id.as_deref(), Some("proj-1"));
        assert_eq!(config.workspace_id.as_deref(), Some("ws-1"));
        assert_eq!(config.frontend_repo.owner, "otherorg");
        assert_eq!(config.branch, "develop");
        assert_eq!(config.api_root_dir.as_deref(), Some("mes-adresses-api"));
        assert!(config.dry_run);
    }

    #[test]
    fn test_source_for_roles() {
        let mut pairs = BASE.to_vec();
        pairs.push(("FRONTEND_ROOT_DIR", "mes-adresses"));
        let config = SetupConfig::from_lookup(lookup(&pairs)).unwrap();

        let api = config.source_for(ServiceRole::Api);
        assert_eq!(api.repo, "acme/bal-api");
        assert_eq!(api.root_directory, "/");

        let frontend = config.source_for(ServiceRole::Frontend);
        assert_eq!(frontend.repo, "acme/bal-front");
        assert_eq!(frontend.root_directory, "mes-adresses");
        assert_eq!(frontend.branch, "main");
    }

    #[test]
    fn test_parse_flag() {
        assert!(parse_flag("1"));
        assert!(parse_flag("true"));
        assert!(parse_flag("True"));
        assert!(!parse_flag("0"));
        assert!(!parse_flag("yes"));
    }

    #[test]
    fn test_runtime_override() {
        let config = SetupConfig::from_lookup(lookup(BASE))
            .unwrap()
            .with_runtime(&RuntimeConfig { dry_run: true });
        assert!(config.dry_run);
    }
}
