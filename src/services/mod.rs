//! 服务模块
//!
//! 包含 provisioning 编排流程

pub mod provision;

pub use provision::{execute, ProvisionOutcome};
