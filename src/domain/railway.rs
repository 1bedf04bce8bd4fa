//! Railway 控制面资源模型
//!
//! 远端返回的嵌套字段全部是可选的，访问前必须显式检查；
//! 缺失如何映射为错误由编排流程决定。

use serde::{Deserialize, Deserializer, Serialize};
use std::collections::BTreeMap;

use crate::domain::source::GithubSource;

/// GraphQL connection (`edges { node { ... } }`)
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Connection<T> {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub edges: Vec<Edge<T>>,
}

#[derive(Clone, Debug, Deserialize, Serialize)]
pub struct Edge<T> {
    pub node: T,
}

impl<T> Connection<T> {
    pub fn from_nodes(nodes: Vec<T>) -> Self {
        Self {
            edges: nodes.into_iter().map(|node| Edge { node }).collect(),
        }
    }

    pub fn nodes(&self) -> impl Iterator<Item = &T> {
        self.edges.iter().map(|e| &e.node)
    }
}

/// 项目
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Project {
    pub id: Option<String>,
    pub name: Option<String>,
    pub environments: Option<Connection<Environment>>,
    pub services: Option<Connection<Service>>,
}

impl Project {
    /// 平台给出的第一个环境（不排序）
    pub fn first_environment(&self) -> Option<&Environment> {
        self.environments
            .as_ref()
            .and_then(|c| c.nodes().next())
    }

    pub fn service_nodes(&self) -> Vec<&Service> {
        self.services
            .as_ref()
            .map(|c| c.nodes().collect())
            .unwrap_or_default()
    }
}

/// 环境
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Environment {
    pub id: Option<String>,
    pub name: Option<String>,
}

/// 服务
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: Option<String>,
    pub name: Option<String>,
    pub service_instances: Option<Connection<ServiceInstance>>,
}

impl Service {
    /// 指定环境下的服务实例
    pub fn instance_in(&self, environment_id: &str) -> Option<&ServiceInstance> {
        self.service_instances.as_ref().and_then(|c| {
            c.nodes()
                .find(|i| i.environment_id.as_deref() == Some(environment_id))
        })
    }
}

/// 服务实例（服务在某个环境中的具体化）
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceInstance {
    pub id: Option<String>,
    pub environment_id: Option<String>,
    pub domains: Option<InstanceDomains>,
}

impl ServiceInstance {
    /// 已存在的 Railway 生成域名
    pub fn existing_domain(&self) -> Option<&str> {
        self.domains
            .as_ref()
            .and_then(|d| d.service_domains.iter().find_map(|sd| sd.hostname()))
    }
}

#[derive(Clone, Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceDomains {
    #[serde(default, deserialize_with = "null_as_empty")]
    pub service_domains: Vec<ServiceDomain>,
}

/// 服务域名
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct ServiceDomain {
    pub id: Option<String>,
    pub domain: Option<String>,
}

impl ServiceDomain {
    /// 非空主机名
    pub fn hostname(&self) -> Option<&str> {
        self.domain.as_deref().filter(|d| !d.is_empty())
    }
}

/// 部署
#[derive(Clone, Debug, Default, Deserialize, Serialize)]
pub struct Deployment {
    pub id: Option<String>,
}

/// 列表字段缺失或为 `null` 时都按空列表处理
fn null_as_empty<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Ok(Option::<Vec<T>>::deserialize(deserializer)?.unwrap_or_default())
}

// ---------------------------------------------------------------------------
// Mutation inputs
// ---------------------------------------------------------------------------

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ProjectCreateInput {
    pub name: String,
    pub workspace_id: Option<String>,
}

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceCreateInput {
    pub project_id: String,
    pub environment_id: String,
    pub name: String,
    pub source: ServiceSourceInput,
}

/// `source: { type: GITHUB, github: {...} }`
#[derive(Clone, Debug, Serialize, PartialEq)]
pub struct ServiceSourceInput {
    #[serde(rename = "type")]
    pub kind: SourceKind,
    pub github: GithubSource,
}

#[derive(Clone, Copy, Debug, Serialize, PartialEq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SourceKind {
    Github,
}

impl ServiceSourceInput {
    pub fn github(github: GithubSource) -> Self {
        Self {
            kind: SourceKind::Github,
            github,
        }
    }
}

/// 域名生成与部署触发共用同一形状
#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ServiceEnvironmentInput {
    pub service_id: String,
    pub environment_id: String,
}

pub type ServiceDomainCreateInput = ServiceEnvironmentInput;
pub type DeploymentTriggerInput = ServiceEnvironmentInput;

#[derive(Clone, Debug, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct VariableCollectionUpsertInput {
    pub project_id: String,
    pub environment_id: String,
    pub service_id: String,
    pub variables: BTreeMap<String, String>,
}
