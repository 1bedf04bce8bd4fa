//! Provisioning 流水线阶段与运行审计记录

use chrono::{DateTime, Utc};
use std::fmt;

use crate::error::ProvisionResult;

/// 流水线阶段（按执行顺序）
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageKind {
    Project,
    Environment,
    Services,
    Instances,
    Domains,
    Variables,
    Deploy,
}

impl StageKind {
    pub const ALL: [StageKind; 7] = [
        StageKind::Project,
        StageKind::Environment,
        StageKind::Services,
        StageKind::Instances,
        StageKind::Domains,
        StageKind::Variables,
        StageKind::Deploy,
    ];

    /// 日志字段中使用的标识
    pub fn name(&self) -> &'static str {
        match self {
            StageKind::Project => "project",
            StageKind::Environment => "environment",
            StageKind::Services => "services",
            StageKind::Instances => "instances",
            StageKind::Domains => "domains",
            StageKind::Variables => "variables",
            StageKind::Deploy => "deploy",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            StageKind::Project => "Project",
            StageKind::Environment => "Environment",
            StageKind::Services => "Create Services",
            StageKind::Instances => "Service Instances",
            StageKind::Domains => "Generate Domains",
            StageKind::Variables => "Set Variables",
            StageKind::Deploy => "Trigger Deploys",
        }
    }

    /// 在流水线中的位置（从 0 开始）
    pub fn index(&self) -> usize {
        *self as usize
    }
}

/// 阶段状态
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum StageStatus {
    Pending,
    Running,
    Succeeded,
    Failed,
    /// 远端尚未就绪，后续步骤需在控制台手动完成
    Incomplete,
    Skipped,
}

impl fmt::Display for StageStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            StageStatus::Pending => "pending",
            StageStatus::Running => "running",
            StageStatus::Succeeded => "ok",
            StageStatus::Failed => "failed",
            StageStatus::Incomplete => "incomplete",
            StageStatus::Skipped => "skipped",
        };
        f.pad(label)
    }
}

/// 一个阶段的审计记录
#[derive(Clone, Debug)]
pub struct ProvisionStage {
    pub kind: StageKind,
    pub status: StageStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub elapsed_ms: Option<i64>,
    /// 失败原因、跳过原因或附加说明
    pub note: Option<String>,
}

impl ProvisionStage {
    pub fn pending(kind: StageKind) -> Self {
        Self {
            kind,
            status: StageStatus::Pending,
            started_at: None,
            elapsed_ms: None,
            note: None,
        }
    }

    pub fn begin(&mut self) {
        self.started_at = Some(Utc::now());
        self.status = StageStatus::Running;
    }

    /// 按阶段结果收尾，失败时记下错误文本
    pub fn record<T>(&mut self, result: &ProvisionResult<T>) {
        self.elapsed_ms = self
            .started_at
            .map(|started| (Utc::now() - started).num_milliseconds());
        match result {
            Ok(_) => self.status = StageStatus::Succeeded,
            Err(e) => {
                self.status = StageStatus::Failed;
                self.note = Some(e.to_string());
            }
        }
    }

    pub fn mark_incomplete(&mut self, reason: impl Into<String>) {
        self.status = StageStatus::Incomplete;
        self.note = Some(reason.into());
    }

    /// 只有未开始的阶段会被跳过
    pub fn skip(&mut self, reason: &str) {
        if self.status == StageStatus::Pending {
            self.status = StageStatus::Skipped;
            self.note = Some(reason.to_string());
        }
    }
}

impl fmt::Display for ProvisionStage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "[{}/{}] {:<18} {:<10}",
            self.kind.index() + 1,
            StageKind::ALL.len(),
            self.kind.display_name(),
            self.status
        )?;
        if let Some(ms) = self.elapsed_ms {
            write!(f, " {:>6}ms", ms)?;
        }
        if let Some(ref note) = self.note {
            write!(f, "  {}", note)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ProvisionError;

    #[test]
    fn test_record_success_sets_elapsed() {
        let mut stage = ProvisionStage::pending(StageKind::Domains);
        stage.begin();
        assert_eq!(stage.status, StageStatus::Running);

        stage.record(&Ok::<_, ProvisionError>(()));
        assert_eq!(stage.status, StageStatus::Succeeded);
        assert!(stage.elapsed_ms.is_some());
        assert!(stage.note.is_none());
    }

    #[test]
    fn test_record_failure_keeps_error_text() {
        let mut stage = ProvisionStage::pending(StageKind::Project);
        stage.begin();
        stage.record(&Err::<(), _>(ProvisionError::Remote(vec!["Not Authorized".into()])));
        assert_eq!(stage.status, StageStatus::Failed);
        assert_eq!(stage.note.as_deref(), Some("GraphQL: Not Authorized"));
    }

    #[test]
    fn test_skip_leaves_started_stage_alone() {
        let mut done = ProvisionStage::pending(StageKind::Services);
        done.begin();
        done.record(&Ok::<_, ProvisionError>(()));
        done.skip("instances not ready");
        assert_eq!(done.status, StageStatus::Succeeded);

        let mut deploy = ProvisionStage::pending(StageKind::Deploy);
        deploy.skip("instances not ready");
        assert_eq!(deploy.status, StageStatus::Skipped);
        assert!(deploy.started_at.is_none());
        let line = deploy.to_string();
        assert!(line.starts_with("[7/7] Trigger Deploys"));
        assert!(line.contains("skipped"));
        assert!(line.ends_with("instances not ready"));
    }

    #[test]
    fn test_stage_order() {
        assert_eq!(StageKind::Project.index(), 0);
        assert_eq!(StageKind::Instances.index(), 3);
        assert_eq!(StageKind::ALL[6], StageKind::Deploy);
    }
}
