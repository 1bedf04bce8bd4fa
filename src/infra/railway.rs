//! Railway 控制面客户端
//!
//! `ControlPlane` 是编排流程与远端之间的唯一接缝；
//! `RailwayClient` 用 GraphQL 实现它，所有操作文档都集中在这里。

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::json;
use tracing::info;

use crate::domain::railway::{
    Deployment, DeploymentTriggerInput, Project, ProjectCreateInput, Service, ServiceCreateInput,
    ServiceDomain, ServiceDomainCreateInput, VariableCollectionUpsertInput,
};
use crate::error::ProvisionResult;
use crate::infra::graphql::GraphqlClient;

/// 编排流程使用的远端操作
///
/// 返回值保持远端的可选形状，缺失字段由调用方映射为具体错误
#[async_trait]
pub trait ControlPlane: Send + Sync {
    /// projectCreate
    async fn create_project(&self, input: &ProjectCreateInput) -> ProvisionResult<Option<Project>>;

    /// project { environments }
    async fn project_environments(&self, project_id: &str) -> ProvisionResult<Option<Project>>;

    /// serviceCreate
    async fn create_service(&self, input: &ServiceCreateInput) -> ProvisionResult<Option<Service>>;

    /// project { services { serviceInstances } }
    async fn project_services(&self, project_id: &str) -> ProvisionResult<Option<Project>>;

    /// serviceDomainCreate
    async fn create_service_domain(
        &self,
        input: &ServiceDomainCreateInput,
    ) -> ProvisionResult<Option<ServiceDomain>>;

    /// variableCollectionUpsert
    async fn upsert_variables(&self, input: &VariableCollectionUpsertInput) -> ProvisionResult<bool>;

    /// deploymentTrigger
    async fn trigger_deployment(
        &self,
        input: &DeploymentTriggerInput,
    ) -> ProvisionResult<Option<Deployment>>;
}

const PROJECT_CREATE: &str = r#"
mutation projectCreate($input: ProjectCreateInput!) {
  projectCreate(input: $input) {
    id
    name
  }
}"#;

const PROJECT_ENVIRONMENTS: &str = r#"
query project($id: String!) {
  project(id: $id) {
    id
    name
    environments {
      edges { node { id name } }
    }
  }
}"#;

const SERVICE_CREATE: &str = r#"
mutation serviceCreate($input: ServiceCreateInput!) {
  serviceCreate(input: $input) {
    id
    name
  }
}"#;

const PROJECT_SERVICES: &str = r#"
query project($id: String!) {
  project(id: $id) {
    id
    services {
      edges {
        node {
          id
          name
          serviceInstances {
            edges {
              node {
                id
                environmentId
                domains { serviceDomains { id domain } }
              }
            }
          }
        }
      }
    }
  }
}"#;

const SERVICE_DOMAIN_CREATE: &str = r#"
mutation domainCreate($input: ServiceDomainCreateInput!) {
  serviceDomainCreate(input: $input) {
    id
    domain
  }
}"#;

const VARIABLE_COLLECTION_UPSERT: &str = r#"
mutation variableCollectionUpsert($input: VariableCollectionUpsertInput!) {
  variableCollectionUpsert(input: $input)
}"#;

const DEPLOYMENT_TRIGGER: &str = r#"
mutation deploymentTrigger($input: DeploymentTriggerInput!) {
  deploymentTrigger(input: $input) {
    id
  }
}"#;

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProjectCreateData {
    project_create: Option<Project>,
}

#[derive(Deserialize)]
struct ProjectData {
    project: Option<Project>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceCreateData {
    service_create: Option<Service>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ServiceDomainCreateData {
    service_domain_create: Option<ServiceDomain>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct VariableCollectionUpsertData {
    variable_collection_upsert: Option<bool>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DeploymentTriggerData {
    deployment_trigger: Option<Deployment>,
}

/// Railway GraphQL 客户端
#[derive(Clone)]
pub struct RailwayClient {
    gql: GraphqlClient,
}

impl RailwayClient {
    pub fn new(gql: GraphqlClient) -> Self {
        Self { gql }
    }
}

#[async_trait]
impl ControlPlane for RailwayClient {
    async fn create_project(&self, input: &ProjectCreateInput) -> ProvisionResult<Option<Project>> {
        let data: ProjectCreateData = self
            .gql
            .execute("projectCreate", PROJECT_CREATE, json!({ "input": input }))
            .await?;
        Ok(data.project_create)
    }

    async fn project_environments(&self, project_id: &str) -> ProvisionResult<Option<Project>> {
        let data: ProjectData = self
            .gql
            .execute("project", PROJECT_ENVIRONMENTS, json!({ "id": project_id }))
            .await?;
        Ok(data.project)
    }

    async fn create_service(&self, input: &ServiceCreateInput) -> ProvisionResult<Option<Service>> {
        let data: ServiceCreateData = self
            .gql
            .execute("serviceCreate", SERVICE_CREATE, json!({ "input": input }))
            .await?;
        Ok(data.service_create)
    }

    async fn project_services(&self, project_id: &str) -> ProvisionResult<Option<Project>> {
        let data: ProjectData = self
            .gql
            .execute("project", PROJECT_SERVICES, json!({ "id": project_id }))
            .await?;
        Ok(data.project)
    }

    async fn create_service_domain(
        &self,
        input: &ServiceDomainCreateInput,
    ) -> ProvisionResult<Option<ServiceDomain>> {
        let data: ServiceDomainCreateData = self
            .gql
            .execute("serviceDomainCreate", SERVICE_DOMAIN_CREATE, json!({ "input": input }))
            .await?;
        Ok(data.service_domain_create)
    }

    async fn upsert_variables(&self, input: &VariableCollectionUpsertInput) -> ProvisionResult<bool> {
        let data: VariableCollectionUpsertData = self
            .gql
            .execute(
                "variableCollectionUpsert",
                VARIABLE_COLLECTION_UPSERT,
                json!({ "input": input }),
            )
            .await?;
        info!(
            service_id = %input.service_id,
            count = input.variables.len(),
            "Upserted variables"
        );
        Ok(data.variable_collection_upsert.unwrap_or(false))
    }

    async fn trigger_deployment(
        &self,
        input: &DeploymentTriggerInput,
    ) -> ProvisionResult<Option<Deployment>> {
        let data: DeploymentTriggerData = self
            .gql
            .execute("deploymentTrigger", DEPLOYMENT_TRIGGER, json!({ "input": input }))
            .await?;
        Ok(data.deployment_trigger)
    }
}
