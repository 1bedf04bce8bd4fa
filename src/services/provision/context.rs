//! Provisioning 运行上下文
//!
//! 记录每个阶段的开始 / 结束 / 跳过，作为本次运行的审计日志

use std::future::Future;
use tracing::{error, info};

use crate::domain::stage::ProvisionStage;
use crate::error::ProvisionResult;

pub use crate::domain::stage::StageKind;

/// 运行上下文
pub struct RunContext {
    stages: Vec<ProvisionStage>,
}

impl Default for RunContext {
    fn default() -> Self {
        Self::new()
    }
}

impl RunContext {
    pub fn new() -> Self {
        Self {
            stages: StageKind::ALL
                .iter()
                .map(|kind| ProvisionStage::pending(*kind))
                .collect(),
        }
    }

    /// 执行一个阶段并记录结果
    ///
    /// 阶段之间严格串行：`fut` 完成后才返回
    pub async fn run_stage<T, F>(&mut self, kind: StageKind, fut: F) -> ProvisionResult<T>
    where
        F: Future<Output = ProvisionResult<T>>,
    {
        let stage = &mut self.stages[kind.index()];
        stage.begin();
        info!(
            stage = kind.name(),
            "[{}/{}] {}",
            kind.index() + 1,
            StageKind::ALL.len(),
            kind.display_name()
        );

        let result = fut.await;

        if let Err(ref e) = result {
            error!(stage = kind.name(), error = %e, "Stage failed");
        }
        self.stages[kind.index()].record(&result);
        result
    }

    /// 为已完成的阶段附加说明
    pub fn note(&mut self, kind: StageKind, message: impl Into<String>) {
        self.stages[kind.index()].note = Some(message.into());
    }

    /// 标记阶段未达成目标（非致命）
    pub fn mark_incomplete(&mut self, kind: StageKind, message: impl Into<String>) {
        self.stages[kind.index()].mark_incomplete(message);
    }

    /// 跳过所有尚未开始的阶段
    pub fn skip_remaining(&mut self, reason: &str) {
        for stage in self.stages.iter_mut() {
            stage.skip(reason);
        }
    }

    pub fn into_stages(self) -> Vec<ProvisionStage> {
        self.stages
    }
}
