//! 运行结果与操作指引

use std::fmt;

use crate::domain::source::{RolePair, ServiceRole};
use crate::domain::stage::ProvisionStage;
use crate::domain::variables::ServiceUrls;

use super::plan::ProvisionPlan;

/// 已创建的服务
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ServiceHandle {
    pub role: ServiceRole,
    pub id: String,
    pub name: Option<String>,
}

/// 项目 + 活动环境
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProjectTarget {
    pub project_id: String,
    pub project_name: Option<String>,
    pub environment_id: String,
    pub environment_name: Option<String>,
}

/// 完整运行结果
#[derive(Clone, Debug)]
pub struct ProvisionReport {
    pub target: ProjectTarget,
    pub services: RolePair<ServiceHandle>,
    pub urls: ServiceUrls,
    /// 部署 ID（只确认，不轮询）
    pub deployments: RolePair<String>,
    pub stages: Vec<ProvisionStage>,
}

/// 服务实例尚未就绪时的提前结束
#[derive(Clone, Debug)]
pub struct PartialReport {
    pub target: ProjectTarget,
    pub services: RolePair<ServiceHandle>,
    pub stages: Vec<ProvisionStage>,
}

/// 编排结果；三种情况进程都以 0 退出
#[derive(Clone, Debug)]
pub enum ProvisionOutcome {
    Planned(ProvisionPlan),
    Incomplete(PartialReport),
    Completed(ProvisionReport),
}

impl ProvisionOutcome {
    pub fn exit_code(&self) -> i32 {
        0
    }

    pub fn is_completed(&self) -> bool {
        matches!(self, ProvisionOutcome::Completed(_))
    }
}

impl fmt::Display for ProvisionOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionOutcome::Planned(plan) => fmt::Display::fmt(plan, f),
            ProvisionOutcome::Incomplete(report) => fmt::Display::fmt(report, f),
            ProvisionOutcome::Completed(report) => fmt::Display::fmt(report, f),
        }
    }
}

fn write_stages(f: &mut fmt::Formatter<'_>, stages: &[ProvisionStage]) -> fmt::Result {
    writeln!(f, "Stages:")?;
    for stage in stages {
        writeln!(f, "  {}", stage)?;
    }
    Ok(())
}

impl fmt::Display for PartialReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "Service instances may not be ready yet. Generate domains and set variables in the dashboard, then trigger the deploys manually."
        )?;
        writeln!(f, "Project ID: {}", self.target.project_id)?;
        writeln!(f, "Environment ID: {}", self.target.environment_id)?;
        for role in ServiceRole::ALL {
            writeln!(f, "{} service ID: {}", role, self.services.get(role).id)?;
        }
        writeln!(f)?;
        write_stages(f, &self.stages)
    }
}

impl fmt::Display for ProvisionReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Done. Next steps:")?;
        writeln!(
            f,
            "1. In Railway dashboard, ensure Postgres and Redis services exist and are named \"Postgres\" and \"Redis\" (or update variable references in the API service)."
        )?;
        writeln!(
            f,
            "2. Run migrations once: railway link (to this project) then railway run --service api yarn typeorm:migration:run"
        )?;
        let mut step = 3;
        if let Some(ref url) = self.urls.api {
            writeln!(f, "{}. API: {}", step, url)?;
            step += 1;
        }
        if let Some(ref url) = self.urls.frontend {
            writeln!(f, "{}. Frontend: {}", step, url)?;
        }
        writeln!(f)?;
        for role in ServiceRole::ALL {
            writeln!(f, "{} deployment: {}", role, self.deployments.get(role))?;
        }
        writeln!(f)?;
        write_stages(f, &self.stages)
    }
}
