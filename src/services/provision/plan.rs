//! Plan-only 模式：只打印解析后的配置，不发起任何远端调用

use std::fmt;

use crate::config::SetupConfig;
use crate::domain::source::{GithubSource, RolePair, ServiceRole};

/// 将要执行的操作
#[derive(Clone, Debug)]
pub struct ProvisionPlan {
    /// 已有项目 ID；None 表示新建
    pub project_id: Option<String>,
    pub project_name: String,
    pub workspace_id: Option<String>,
    /// 未写 owner 的仓库默认归属
    pub github_owner: String,
    pub sources: RolePair<GithubSource>,
    pub branch: String,
}

impl ProvisionPlan {
    pub fn from_config(config: &SetupConfig) -> Self {
        Self {
            project_id: config.project_id.clone(),
            project_name: config.project_name.clone(),
            workspace_id: config.workspace_id.clone(),
            github_owner: config.github_owner.clone(),
            sources: RolePair {
                api: config.source_for(ServiceRole::Api),
                frontend: config.source_for(ServiceRole::Frontend),
            },
            branch: config.branch.clone(),
        }
    }
}

impl fmt::Display for ProvisionPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "DRY RUN: would execute the following.")?;
        match (&self.project_id, &self.workspace_id) {
            (Some(id), _) => writeln!(f, "Project: {}", id)?,
            (None, Some(ws)) => writeln!(
                f,
                "Project: (create new \"{}\" in workspace {})",
                self.project_name, ws
            )?,
            (None, None) => writeln!(f, "Project: (create new \"{}\")", self.project_name)?,
        }
        writeln!(f, "GitHub owner: {}", self.github_owner)?;
        for role in ServiceRole::ALL {
            let source = self.sources.get(role);
            write!(f, "{} repo: {}", role, source.repo)?;
            if source.root_directory != "/" {
                write!(f, "  root: {}", source.root_directory)?;
            }
            writeln!(f)?;
        }
        write!(f, "Branch: {}", self.branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(project_id: Option<&str>) -> SetupConfig {
        let project_id = project_id.map(String::from);
        SetupConfig::from_lookup(move |key: &str| match key {
            "RAILWAY_TOKEN" => Some("tok".into()),
            "GITHUB_OWNER" => Some("acme".into()),
            "GITHUB_REPO_API" => Some("bal-api".into()),
            "GITHUB_REPO_FRONTEND" => Some("otherorg/bal-front".into()),
            "API_ROOT_DIR" => Some("packages/api".into()),
            "RAILWAY_PROJECT_ID" => project_id.clone(),
            _ => None,
        })
        .unwrap()
    }

    #[test]
    fn test_plan_for_new_project() {
        let text = ProvisionPlan::from_config(&config(None)).to_string();
        assert!(text.starts_with("DRY RUN"));
        assert!(text.contains("Project: (create new \"nap-us\")"));
        assert!(text.contains("GitHub owner: acme\n"));
        assert!(text.contains("API repo: acme/bal-api  root: packages/api"));
        assert!(text.contains("Frontend repo: otherorg/bal-front\n"));
        assert!(text.ends_with("Branch: main"));
    }

    #[test]
    fn test_plan_for_existing_project() {
        let text = ProvisionPlan::from_config(&config(Some("proj-1"))).to_string();
        assert!(text.contains("Project: proj-1"));
    }
}
