//! 基础设施模块
//!
//! 封装外部依赖（GraphQL HTTP client、Railway 控制面）

pub mod graphql;
pub mod railway;

pub use graphql::GraphqlClient;
pub use railway::{ControlPlane, RailwayClient};
