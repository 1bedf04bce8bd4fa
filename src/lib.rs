//! Railway Provisioner - 在 Railway 上一次性创建 API + Frontend 服务
//!
//! 创建（或复用）项目，从 GitHub 创建两个服务，生成域名，
//! 写入互相引用的环境变量，并触发首次部署。

pub mod config;
pub mod domain;
pub mod error;
pub mod infra;
pub mod services;

pub use config::{RuntimeConfig, SetupConfig};
pub use error::{ProvisionError, ProvisionResult};
pub use services::provision::ProvisionOutcome;

use infra::{GraphqlClient, RailwayClient};

/// 初始化 tracing
///
/// 通过 `RUST_LOG` 控制日志级别，未设置时默认 `info`
pub fn setup_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

/// 使用 Railway GraphQL 客户端执行 provisioning
///
/// plan-only 模式下不会创建任何远端请求
pub async fn provision(config: &SetupConfig) -> ProvisionResult<ProvisionOutcome> {
    let gql = GraphqlClient::new(config.endpoint.clone(), config.token.clone())?;
    let railway = RailwayClient::new(gql);
    services::provision::execute(&railway, config).await
}
