//! 统一错误处理
//!
//! 提供 `ProvisionError` 枚举：所有错误都是致命的，一路传播到 `main` 后以退出码 1 结束。
//! 唯一的非致命情况（服务实例尚未就绪）不是错误，见 `services::provision::ProvisionOutcome`。

use thiserror::Error;

/// 统一 provisioning 错误类型
#[derive(Debug, Error)]
pub enum ProvisionError {
    /// 缺少必需输入、仓库格式错误、项目没有环境
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// 网络 / HTTP 层失败（非 2xx，或响应体无法解析）
    #[error("Railway API {}: {body}", describe_status(.status))]
    Transport {
        status: Option<u16>,
        body: String,
    },

    /// 平台在结构合法的响应中返回了 errors 列表
    #[error("GraphQL: {}", .0.join("; "))]
    Remote(Vec<String>),

    /// 响应成功但缺少预期的标识符（通常是 GitHub 仓库未授权给 Railway）
    #[error("{0}")]
    Provisioning(String),

    /// 引用的资源不存在
    #[error("{0} not found")]
    NotFound(String),
}

impl ProvisionError {
    /// 创建配置错误
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration(message.into())
    }

    /// 创建 provisioning 错误
    pub fn provisioning(message: impl Into<String>) -> Self {
        Self::Provisioning(message.into())
    }

    /// 创建未找到错误
    pub fn not_found(resource: impl Into<String>) -> Self {
        Self::NotFound(resource.into())
    }

    /// 进程退出码
    pub fn exit_code(&self) -> i32 {
        1
    }
}

impl From<reqwest::Error> for ProvisionError {
    fn from(e: reqwest::Error) -> Self {
        Self::Transport {
            status: e.status().map(|s| s.as_u16()),
            body: e.to_string(),
        }
    }
}

fn describe_status(status: &Option<u16>) -> String {
    match status {
        Some(code) => code.to_string(),
        None => "request failed".to_string(),
    }
}

/// 便捷类型别名
pub type ProvisionResult<T> = Result<T, ProvisionError>;
