//! Provisioning 编排流程
//!
//! 项目 → 环境 → 服务 → 服务实例 → 域名 → 变量 → 部署，严格串行：
//! 每个远端调用完成后才开始下一个，任何错误立即终止本次运行。
//! 唯一的非致命分支是服务实例尚未就绪，此时提前成功结束。

pub mod context;
pub mod plan;
pub mod report;

use tracing::{info, warn};

use crate::config::SetupConfig;
use crate::domain::railway::{
    Project, ProjectCreateInput, Service, ServiceCreateInput, ServiceEnvironmentInput,
    ServiceSourceInput, VariableCollectionUpsertInput,
};
use crate::domain::source::{RolePair, ServiceRole};
use crate::domain::variables::{self, ServiceUrls};
use crate::error::{ProvisionError, ProvisionResult};
use crate::infra::ControlPlane;

pub use context::{RunContext, StageKind};
pub use plan::ProvisionPlan;
pub use report::{PartialReport, ProjectTarget, ProvisionOutcome, ProvisionReport, ServiceHandle};

/// 已解析的服务实例
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InstanceHandle {
    pub id: String,
    /// 实例上已有的 Railway 域名（重复运行时复用）
    pub existing_domain: Option<String>,
}

/// 执行完整的 provisioning 流程
///
/// 这是编排的主入口点；plan-only 模式下不发起任何远端调用
pub async fn execute(
    plane: &dyn ControlPlane,
    config: &SetupConfig,
) -> ProvisionResult<ProvisionOutcome> {
    if config.dry_run {
        info!("Dry run: no remote calls will be made");
        return Ok(ProvisionOutcome::Planned(ProvisionPlan::from_config(config)));
    }

    let mut ctx = RunContext::new();

    let project_id = ctx
        .run_stage(StageKind::Project, ensure_project(plane, config))
        .await?;

    let target = ctx
        .run_stage(StageKind::Environment, resolve_environment(plane, &project_id))
        .await?;

    let services = ctx
        .run_stage(StageKind::Services, create_services(plane, config, &target))
        .await?;

    let instances = ctx
        .run_stage(StageKind::Instances, resolve_instances(plane, &target, &services))
        .await?;

    let Some(instances) = instances else {
        warn!(
            api_service_id = %services.api.id,
            frontend_service_id = %services.frontend.id,
            "Service instances may not be ready yet. Generate domains and set variables in the dashboard."
        );
        ctx.mark_incomplete(StageKind::Instances, "service instances not materialized");
        ctx.skip_remaining("service instances not ready; complete manually");
        return Ok(ProvisionOutcome::Incomplete(PartialReport {
            target,
            services,
            stages: ctx.into_stages(),
        }));
    };

    let (urls, reused) = ctx
        .run_stage(
            StageKind::Domains,
            generate_domains(plane, &target, &services, &instances),
        )
        .await?;
    if reused > 0 {
        ctx.note(StageKind::Domains, format!("{} existing domain(s) reused", reused));
    }

    ctx.run_stage(
        StageKind::Variables,
        upsert_variables(plane, &target, &services, &urls),
    )
    .await?;

    let deployments = ctx
        .run_stage(StageKind::Deploy, trigger_deployments(plane, &target, &services))
        .await?;

    info!(project_id = %target.project_id, "Provisioning complete");

    Ok(ProvisionOutcome::Completed(ProvisionReport {
        target,
        services,
        urls,
        deployments,
        stages: ctx.into_stages(),
    }))
}

/// 复用已有项目，或创建新项目（恰好一次）
async fn ensure_project(plane: &dyn ControlPlane, config: &SetupConfig) -> ProvisionResult<String> {
    if let Some(ref id) = config.project_id {
        info!(project_id = %id, "Using existing project");
        return Ok(id.clone());
    }

    info!(name = %config.project_name, workspace_id = ?config.workspace_id, "Creating new project...");
    let input = ProjectCreateInput {
        name: config.project_name.clone(),
        workspace_id: config.workspace_id.clone(),
    };
    let created = plane.create_project(&input).await?;

    let Some(Project { id: Some(id), name, .. }) = created else {
        return Err(ProvisionError::provisioning(
            "Failed to create project: projectCreate returned no project id",
        ));
    };
    info!(project_id = %id, name = ?name, "Created project");
    Ok(id)
}

/// 获取项目并选择第一个环境
async fn resolve_environment(
    plane: &dyn ControlPlane,
    project_id: &str,
) -> ProvisionResult<ProjectTarget> {
    let project = plane
        .project_environments(project_id)
        .await?
        .ok_or_else(|| ProvisionError::not_found(format!("Project {}", project_id)))?;

    let environment = project
        .first_environment()
        .and_then(|e| e.id.clone().map(|id| (id, e.name.clone())));
    let Some((environment_id, environment_name)) = environment else {
        return Err(ProvisionError::configuration(
            "No environment found; create one in the dashboard.",
        ));
    };

    info!(
        project_id = %project_id,
        environment_id = %environment_id,
        environment = ?environment_name,
        "Resolved environment"
    );

    Ok(ProjectTarget {
        project_id: project.id.unwrap_or_else(|| project_id.to_string()),
        project_name: project.name,
        environment_id,
        environment_name,
    })
}

/// 依次创建 api 与 frontend 服务
async fn create_services(
    plane: &dyn ControlPlane,
    config: &SetupConfig,
    target: &ProjectTarget,
) -> ProvisionResult<RolePair<ServiceHandle>> {
    let api = create_service(plane, config, target, ServiceRole::Api).await?;
    let frontend = create_service(plane, config, target, ServiceRole::Frontend).await?;
    Ok(RolePair { api, frontend })
}

async fn create_service(
    plane: &dyn ControlPlane,
    config: &SetupConfig,
    target: &ProjectTarget,
    role: ServiceRole,
) -> ProvisionResult<ServiceHandle> {
    let source = config.source_for(role);
    info!(
        service = role.service_name(),
        repo = %source.repo,
        branch = %source.branch,
        root = %source.root_directory,
        "Creating {} service from GitHub...",
        role
    );

    let repo = source.repo.clone();
    let input = ServiceCreateInput {
        project_id: target.project_id.clone(),
        environment_id: target.environment_id.clone(),
        name: role.service_name().to_string(),
        source: ServiceSourceInput::github(source),
    };
    let created = plane.create_service(&input).await?;

    let Some(Service { id: Some(id), name, .. }) = created else {
        return Err(ProvisionError::provisioning(format!(
            "Failed to create {} service. Ensure the repo {} is connected to Railway (install the Railway GitHub app / deploy once from the dashboard).",
            role, repo
        )));
    };
    info!(service = role.service_name(), service_id = %id, "{} service created", role);

    Ok(ServiceHandle { role, id, name })
}

/// 查找两个服务在活动环境中的实例；任一缺失返回 None
async fn resolve_instances(
    plane: &dyn ControlPlane,
    target: &ProjectTarget,
    services: &RolePair<ServiceHandle>,
) -> ProvisionResult<Option<RolePair<InstanceHandle>>> {
    let project = plane
        .project_services(&target.project_id)
        .await?
        .ok_or_else(|| ProvisionError::not_found(format!("Project {}", target.project_id)))?;
    let nodes = project.service_nodes();

    let api = find_instance(&nodes, &services.api, &target.environment_id);
    let frontend = find_instance(&nodes, &services.frontend, &target.environment_id);

    match (api, frontend) {
        (Some(api), Some(frontend)) => {
            info!(
                api_instance_id = %api.id,
                frontend_instance_id = %frontend.id,
                "Resolved service instances"
            );
            Ok(Some(RolePair { api, frontend }))
        }
        (api, frontend) => {
            warn!(
                api_ready = api.is_some(),
                frontend_ready = frontend.is_some(),
                "Service instance lookup incomplete"
            );
            Ok(None)
        }
    }
}

/// 优先匹配刚创建的服务 ID，其次按服务名
///
/// 只有按 ID 命中时才复用实例上的域名；按名称命中的可能是同名旧服务。
fn find_instance(
    nodes: &[&Service],
    service: &ServiceHandle,
    environment_id: &str,
) -> Option<InstanceHandle> {
    let by_id = nodes
        .iter()
        .find(|n| n.id.as_deref() == Some(service.id.as_str()));
    let (node, same_service) = match by_id {
        Some(node) => (node, true),
        None => {
            let node = nodes
                .iter()
                .find(|n| n.name.as_deref() == Some(service.role.service_name()))?;
            (node, false)
        }
    };

    let instance = node.instance_in(environment_id)?;
    let id = instance.id.clone()?;
    let existing_domain = if same_service {
        instance.existing_domain().map(String::from)
    } else {
        None
    };
    Some(InstanceHandle { id, existing_domain })
}

/// 为每个服务生成（或复用）公网域名，返回 URL 与复用数量
async fn generate_domains(
    plane: &dyn ControlPlane,
    target: &ProjectTarget,
    services: &RolePair<ServiceHandle>,
    instances: &RolePair<InstanceHandle>,
) -> ProvisionResult<(ServiceUrls, usize)> {
    info!("Generating public domains...");
    let mut reused = 0;

    let mut urls = ServiceUrls::default();
    for role in ServiceRole::ALL {
        let hostname = match instances.get(role).existing_domain {
            Some(ref domain) => {
                info!(service = role.service_name(), domain = %domain, "Reusing existing domain");
                reused += 1;
                Some(domain.clone())
            }
            None => {
                let input = ServiceEnvironmentInput {
                    service_id: services.get(role).id.clone(),
                    environment_id: target.environment_id.clone(),
                };
                let created = plane.create_service_domain(&input).await?;
                created.and_then(|d| d.hostname().map(String::from))
            }
        };

        let url = variables::url_for_domain(hostname.as_deref());
        match url {
            Some(ref url) => info!(service = role.service_name(), url = %url, "{} URL", role),
            None => warn!(service = role.service_name(), "No domain generated, using placeholder URL"),
        }
        match role {
            ServiceRole::Api => urls.api = url,
            ServiceRole::Frontend => urls.frontend = url,
        }
    }

    Ok((urls, reused))
}

/// 写入两个服务的变量集合
async fn upsert_variables(
    plane: &dyn ControlPlane,
    target: &ProjectTarget,
    services: &RolePair<ServiceHandle>,
    urls: &ServiceUrls,
) -> ProvisionResult<()> {
    for role in ServiceRole::ALL {
        let vars = match role {
            ServiceRole::Api => variables::api_variables(urls),
            ServiceRole::Frontend => variables::frontend_variables(urls),
        };
        let input = VariableCollectionUpsertInput {
            project_id: target.project_id.clone(),
            environment_id: target.environment_id.clone(),
            service_id: services.get(role).id.clone(),
            variables: vars,
        };
        let accepted = plane.upsert_variables(&input).await?;
        if !accepted {
            warn!(service = role.service_name(), "variableCollectionUpsert returned false");
        }
        info!(service = role.service_name(), "Set {} variables.", role);
    }
    Ok(())
}

/// 触发首次部署（不等待完成）
async fn trigger_deployments(
    plane: &dyn ControlPlane,
    target: &ProjectTarget,
    services: &RolePair<ServiceHandle>,
) -> ProvisionResult<RolePair<String>> {
    let api = trigger_deployment(plane, target, services.get(ServiceRole::Api)).await?;
    let frontend = trigger_deployment(plane, target, services.get(ServiceRole::Frontend)).await?;
    Ok(RolePair { api, frontend })
}

async fn trigger_deployment(
    plane: &dyn ControlPlane,
    target: &ProjectTarget,
    service: &ServiceHandle,
) -> ProvisionResult<String> {
    info!(service = service.role.service_name(), "Triggering {} deploy...", service.role);
    let input = ServiceEnvironmentInput {
        service_id: service.id.clone(),
        environment_id: target.environment_id.clone(),
    };
    let deployment = plane.trigger_deployment(&input).await?;
    let id = deployment.and_then(|d| d.id).ok_or_else(|| {
        ProvisionError::provisioning(format!(
            "Failed to trigger {} deploy: deploymentTrigger returned no deployment id",
            service.role
        ))
    })?;
    info!(service = service.role.service_name(), deployment_id = %id, "Deploy triggered");
    Ok(id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::railway::{Connection, InstanceDomains, ServiceDomain, ServiceInstance};

    fn handle(role: ServiceRole, id: &str) -> ServiceHandle {
        ServiceHandle {
            role,
            id: id.to_string(),
            name: Some(role.service_name().to_string()),
        }
    }

    fn service(id: &str, name: &str, instances: Vec<(&str, &str)>) -> Service {
        Service {
            id: Some(id.to_string()),
            name: Some(name.to_string()),
            service_instances: Some(Connection::from_nodes(
                instances
                    .into_iter()
                    .map(|(iid, env)| ServiceInstance {
                        id: Some(iid.to_string()),
                        environment_id: Some(env.to_string()),
                        domains: None,
                    })
                    .collect(),
            )),
        }
    }

    fn with_domain(mut service: Service, domain: &str) -> Service {
        if let Some(ref mut instances) = service.service_instances {
            for edge in instances.edges.iter_mut() {
                edge.node.domains = Some(InstanceDomains {
                    service_domains: vec![ServiceDomain {
                        id: Some("d-1".to_string()),
                        domain: Some(domain.to_string()),
                    }],
                });
            }
        }
        service
    }

    #[test]
    fn test_find_instance_prefers_created_id() {
        let old = service("svc-old", "api", vec![("si-old", "e1")]);
        let new = service("svc-new", "api", vec![("si-new", "e1")]);
        let nodes = vec![&old, &new];

        let found = find_instance(&nodes, &handle(ServiceRole::Api, "svc-new"), "e1").unwrap();
        assert_eq!(found.id, "si-new");
    }

    #[test]
    fn test_find_instance_falls_back_to_name() {
        let api = service("svc-other", "api", vec![("si-api", "e1")]);
        let nodes = vec![&api];
        let found = find_instance(&nodes, &handle(ServiceRole::Api, "svc-api"), "e1").unwrap();
        assert_eq!(found.id, "si-api");
        assert!(found.existing_domain.is_none());
    }

    #[test]
    fn test_find_instance_reuses_domain_of_same_service() {
        let api = with_domain(
            service("svc-api", "api", vec![("si-api", "e1")]),
            "api-x.up.railway.app",
        );
        let nodes = vec![&api];
        let found = find_instance(&nodes, &handle(ServiceRole::Api, "svc-api"), "e1").unwrap();
        assert_eq!(found.existing_domain.as_deref(), Some("api-x.up.railway.app"));
    }

    #[test]
    fn test_find_instance_by_name_never_reuses_old_domain() {
        let old = with_domain(
            service("svc-old", "api", vec![("si-old", "e1")]),
            "old-api.up.railway.app",
        );
        let nodes = vec![&old];
        let found = find_instance(&nodes, &handle(ServiceRole::Api, "svc-new-api"), "e1").unwrap();
        assert_eq!(found.id, "si-old");
        assert!(found.existing_domain.is_none());
    }

    #[test]
    fn test_find_instance_requires_matching_environment() {
        let api = service("svc-api", "api", vec![("si-api", "e2")]);
        let nodes = vec![&api];
        assert!(find_instance(&nodes, &handle(ServiceRole::Api, "svc-api"), "e1").is_none());
        assert!(find_instance(&[], &handle(ServiceRole::Frontend, "svc-fe"), "e1").is_none());
    }
}
