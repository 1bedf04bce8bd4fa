//! 配置模块
//!
//! 环境变量解析与命令行覆盖

pub mod env;

pub use env::{RuntimeConfig, SetupConfig};
