//! 领域模型
//!
//! 纯数据结构与纯函数，不做任何 I/O

pub mod railway;
pub mod source;
pub mod stage;
pub mod variables;

pub use source::{GithubSource, RepoSpec, RolePair, ServiceRole};
pub use stage::{ProvisionStage, StageKind, StageStatus};
pub use variables::ServiceUrls;
