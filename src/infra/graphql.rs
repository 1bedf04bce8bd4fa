//! GraphQL HTTP Client
//!
//! 每次调用恰好一次 POST `{query, variables}`，不缓存、不批量、不重试

use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::config::env::constants::{REQUEST_TIMEOUT_SECS, VERSION};
use crate::error::{ProvisionError, ProvisionResult};

/// GraphQL 客户端
///
/// 持有 bearer token 与复用的连接池，是唯一的对外出口
#[derive(Clone)]
pub struct GraphqlClient {
    client: Client,
    endpoint: String,
    token: String,
}

impl GraphqlClient {
    /// 创建新的 GraphQL 客户端
    ///
    /// # Arguments
    /// * `endpoint` - GraphQL 端点 URL
    /// * `token` - Bearer token
    pub fn new(endpoint: impl Into<String>, token: impl Into<String>) -> ProvisionResult<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .pool_max_idle_per_host(2)
            .user_agent(format!("railway-provisioner/{}", VERSION))
            .build()
            .map_err(|e| {
                ProvisionError::configuration(format!("Failed to create HTTP client: {}", e))
            })?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
            token: token.into(),
        })
    }

    /// 执行一次 query / mutation，返回解码后的 `data`
    ///
    /// `operation` 只用于日志和错误信息
    pub async fn execute<T: DeserializeOwned>(
        &self,
        operation: &str,
        query: &str,
        variables: Value,
    ) -> ProvisionResult<T> {
        debug!(operation = %operation, "Sending GraphQL request");

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.token)
            .json(&serde_json::json!({
                "query": query,
                "variables": variables,
            }))
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            warn!(operation = %operation, status = %status, "Railway API returned non-success status");
            return Err(ProvisionError::Transport {
                status: Some(status.as_u16()),
                body,
            });
        }

        let envelope: GraphqlResponse = serde_json::from_str(&body).map_err(|e| {
            warn!(operation = %operation, error = %e, "Failed to decode GraphQL response");
            ProvisionError::Transport {
                status: Some(status.as_u16()),
                body: body.clone(),
            }
        })?;

        if let Some(errors) = envelope.errors.filter(|errs| !errs.is_empty()) {
            let messages: Vec<String> = errors.into_iter().map(|e| e.message).collect();
            warn!(operation = %operation, errors = ?messages, "GraphQL returned errors");
            return Err(ProvisionError::Remote(messages));
        }

        let data = match envelope.data {
            Some(data) if !data.is_null() => data,
            _ => {
                return Err(ProvisionError::provisioning(format!(
                    "{} returned no data",
                    operation
                )))
            }
        };

        serde_json::from_value(data).map_err(|e| {
            warn!(operation = %operation, error = %e, "GraphQL data has unexpected shape");
            ProvisionError::Transport {
                status: Some(status.as_u16()),
                body,
            }
        })
    }
}

/// GraphQL 响应信封
#[derive(Deserialize)]
struct GraphqlResponse {
    data: Option<Value>,
    errors: Option<Vec<GraphqlError>>,
}

#[derive(Deserialize)]
struct GraphqlError {
    #[serde(default)]
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    #[derive(Debug, Deserialize)]
    struct Echo {
        value: Option<String>,
    }

    async fn client_for(server: &MockServer) -> GraphqlClient {
        GraphqlClient::new(format!("{}/graphql/v2", server.uri()), "secret-token").unwrap()
    }

    #[tokio::test]
    async fn test_execute_decodes_data() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/graphql/v2"))
            .and(header("authorization", "Bearer secret-token"))
            .and(body_partial_json(json!({
                "query": "query echo { value }",
                "variables": { "id": "42" }
            })))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(json!({ "data": { "value": "hello" } })),
            )
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let echo: Echo = client
            .execute("echo", "query echo { value }", json!({ "id": "42" }))
            .await
            .unwrap();
        assert_eq!(echo.value.as_deref(), Some("hello"));
    }

    #[tokio::test]
    async fn test_non_success_status_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(401).set_body_string("Not Authorized"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .execute::<Echo>("echo", "query echo { value }", json!({}))
            .await
            .unwrap_err();
        match err {
            ProvisionError::Transport { status, body } => {
                assert_eq!(status, Some(401));
                assert_eq!(body, "Not Authorized");
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_errors_list_is_remote_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "data": null,
                "errors": [ { "message": "Problem processing request" }, { "message": "Rate limited" } ]
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .execute::<Echo>("echo", "query echo { value }", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Remote(ref msgs) if msgs.len() == 2));
        assert_eq!(err.to_string(), "GraphQL: Problem processing request; Rate limited");
    }

    #[tokio::test]
    async fn test_empty_errors_list_is_ignored() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_json(json!({ "data": { "value": "ok" }, "errors": [] })),
            )
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let echo: Echo = client.execute("echo", "q", json!({})).await.unwrap();
        assert_eq!(echo.value.as_deref(), Some("ok"));
    }

    #[tokio::test]
    async fn test_invalid_json_is_transport_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>maintenance</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .execute::<Echo>("echo", "q", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::Transport { status: Some(200), ref body } if body.contains("maintenance")
        ));
    }

    #[tokio::test]
    async fn test_missing_data_is_provisioning_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client
            .execute::<Echo>("echo", "q", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Provisioning(ref m) if m.contains("echo")));
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_is_transport_error() {
        let client = GraphqlClient::new("http://127.0.0.1:1/graphql/v2", "t").unwrap();
        let err = client
            .execute::<Echo>("echo", "q", json!({}))
            .await
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Transport { status: None, .. }));
    }
}
