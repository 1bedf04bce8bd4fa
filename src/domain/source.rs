//! GitHub 源描述与仓库规格解析

use serde::Serialize;
use std::fmt;

use crate::error::{ProvisionError, ProvisionResult};

/// 本工具创建的两个服务角色
///
/// 名称固定，后续按名称查找服务实例。
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ServiceRole {
    Api,
    Frontend,
}

impl ServiceRole {
    /// 创建顺序：API 在前
    pub const ALL: [ServiceRole; 2] = [ServiceRole::Api, ServiceRole::Frontend];

    /// Railway 上的服务名
    pub fn service_name(&self) -> &'static str {
        match self {
            ServiceRole::Api => "api",
            ServiceRole::Frontend => "frontend",
        }
    }

    /// 日志 / 控制台显示名
    pub fn display_name(&self) -> &'static str {
        match self {
            ServiceRole::Api => "API",
            ServiceRole::Frontend => "Frontend",
        }
    }
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// 按角色存放的一对值（api / frontend）
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RolePair<T> {
    pub api: T,
    pub frontend: T,
}

impl<T> RolePair<T> {
    pub fn get(&self, role: ServiceRole) -> &T {
        match role {
            ServiceRole::Api => &self.api,
            ServiceRole::Frontend => &self.frontend,
        }
    }
}

/// 规范化后的 GitHub 仓库
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RepoSpec {
    pub owner: String,
    pub repo: String,
}

impl RepoSpec {
    /// 解析仓库规格
    ///
    /// 接受 `repo`（使用 `default_owner`）或 `owner/repo`（忽略 `default_owner`）。
    pub fn parse(spec: &str, default_owner: &str) -> ProvisionResult<Self> {
        let spec = spec.trim();
        match spec.split_once('/') {
            Some((owner, repo)) => {
                if owner.is_empty() || repo.is_empty() || repo.contains('/') {
                    return Err(ProvisionError::configuration(format!(
                        "Invalid repository '{}': expected 'name' or 'owner/name'",
                        spec
                    )));
                }
                Ok(Self {
                    owner: owner.to_string(),
                    repo: repo.to_string(),
                })
            }
            None => {
                if spec.is_empty() {
                    return Err(ProvisionError::configuration("Repository name is empty"));
                }
                if default_owner.is_empty() {
                    return Err(ProvisionError::configuration(format!(
                        "Repository '{}' has no owner and GITHUB_OWNER is empty",
                        spec
                    )));
                }
                Ok(Self {
                    owner: default_owner.to_string(),
                    repo: spec.to_string(),
                })
            }
        }
    }

    /// `owner/repo` 形式
    pub fn full_name(&self) -> String {
        format!("{}/{}", self.owner, self.repo)
    }
}

impl fmt::Display for RepoSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.owner, self.repo)
    }
}

/// serviceCreate 的 `source.github` 描述
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GithubSource {
    pub repo: String,
    pub branch: String,
    pub root_directory: String,
}

impl GithubSource {
    /// 根目录未配置时使用 `/`
    pub fn new(repo: &RepoSpec, branch: &str, root_dir: Option<&str>) -> Self {
        Self {
            repo: repo.full_name(),
            branch: branch.to_string(),
            root_directory: root_dir.unwrap_or("/").to_string(),
        }
    }
}
