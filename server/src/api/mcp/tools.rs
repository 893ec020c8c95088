use chrono::Utc;
use chrono_tz::Tz;
use rmcp::handler::server::router::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{
    CallToolResult, Content, Implementation, ServerCapabilities, ServerInfo, ToolsCapability,
};
use rmcp::{ServerHandler, tool, tool_handler, tool_router};
use serde_json::{Value, json};

use crate::core::constants::{APP_NAME_LOWER, DEFAULT_RAW_TIME};
use crate::data::control_plane::{ApiRequest, ControlPlaneClient, ControlPlaneError, Presented, Shape};
use crate::domain::metrics::{GroupDimension, MetricFilters, MetricsRequest, MetricsService};
use crate::domain::resources::ResourceError;
use crate::domain::risk::{assessment_instructions, collect_overview, overview_message};
use crate::utils::string::{is_valid_id, non_empty};

use super::types::*;

type McpError = rmcp::model::ErrorData;

#[derive(Clone)]
pub struct McpServer {
    client: ControlPlaneClient,
    metrics: MetricsService,
    tz: Tz,
    tool_router: ToolRouter<Self>,
}

impl McpServer {
    pub fn new(client: ControlPlaneClient, tz: Tz) -> Self {
        Self {
            metrics: MetricsService::new(client.clone(), tz),
            client,
            tz,
            tool_router: Self::tool_router(),
        }
    }

    /// Present `req`, then attach a dashboard link built from the response
    async fn present_linked<F>(&self, req: &ApiRequest, link: F) -> CallToolResult
    where
        F: FnOnce(&Value) -> Option<String>,
    {
        let client = &self.client;
        let result = client
            .present_with(req, Shape::Full, |value| {
                let url = link(&value).map(|page| client.console_url(&page));
                with_console_url(value, url)
            })
            .await;
        to_tool_result(result)
    }
}

#[tool_handler]
impl ServerHandler for McpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(INSTRUCTIONS.to_string()),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
                ..Default::default()
            },
            server_info: Implementation {
                name: APP_NAME_LOWER.to_string(),
                version: env!("CARGO_PKG_VERSION").to_string(),
                ..Default::default()
            },
            ..Default::default()
        }
    }
}

const INSTRUCTIONS: &str = r#"API7 Enterprise gateway - inspect traffic metrics, gateway resources and access control.

WORKFLOW for a health or risk review:
1. check_risk for a condensed overview of every gateway group plus a review checklist
2. get_resource for the full configuration of the resources that look suspicious
3. get_prometheus_metrics for traffic, error and latency trends
4. get_role / get_permission_policy / get_permission_policy_by_role for access control

KEY CONCEPTS:
- Gateway group: an isolated set of gateway instances sharing configuration
- Published service: a service with its upstream and routes, deployed to a gateway group
- Consumer / credential: API callers and their authentication material
- Role / permission policy: dashboard access control (policies attach to roles, roles to users)

TIPS:
- get_prometheus_metrics accepts several types at once; one type returns its data unwrapped
- Use raw_time (15m, 6h, 7d) for relative windows, start/end for absolute ones
- Pass gateway_group_id when listing admin resources
- Write tools return a console_url linking to the dashboard page of the changed object"#;

#[tool_router]
impl McpServer {
    #[tool(
        description = "Get Prometheus metrics from API7 Gateway, including status code distribution, request failures, total requests, bandwidth usage, latency, connections, and QPS"
    )]
    async fn get_prometheus_metrics(
        &self,
        Parameters(input): Parameters<PrometheusMetricsInput>,
    ) -> Result<CallToolResult, McpError> {
        let req = MetricsRequest {
            types: input.metric_type.into_vec(),
            raw_time: non_empty(input.raw_time.as_deref())
                .unwrap_or(DEFAULT_RAW_TIME)
                .to_string(),
            step: input.step,
            start: input.start,
            end: input.end,
            filters: MetricFilters {
                service_id: input.service_id,
                route_id: input.route_id,
                instance_id: input.instance_id,
                gateway_group_id: input.gateway_group_id,
            },
            group_by: input
                .group_by
                .unwrap_or_else(|| vec![GroupDimension::GatewayGroupId]),
        };

        match self.metrics.collect(&req, Utc::now()).await {
            Ok(report) => {
                let all_failed = report.all_failed();
                let text = report.into_text();
                if all_failed {
                    Ok(CallToolResult::error(vec![Content::text(text)]))
                } else {
                    Ok(CallToolResult::success(vec![Content::text(text)]))
                }
            }
            Err(e) if e.is_invalid_input() => Err(McpError::invalid_params(e.to_string(), None)),
            Err(e) => Err(mcp_err(e)),
        }
    }

    #[tool(
        description = "Scan API7 resources configurations for security, performance, and compliance risks, then generates a structured report with actionable fixes."
    )]
    async fn check_risk(&self) -> Result<CallToolResult, McpError> {
        let overview = match collect_overview(&self.client, &self.tz).await {
            Ok(overview) => overview,
            Err(e) => {
                tracing::warn!(error = %e, "Resource overview collection failed");
                return Ok(CallToolResult::error(vec![Content::text(e.to_tool_text())]));
            }
        };
        let json = overview.to_pretty_json().map_err(mcp_err)?;
        Ok(CallToolResult::success(vec![
            Content::text(assessment_instructions()),
            Content::text(overview_message(&json)),
        ]))
    }

    #[tool(
        description = "Get resource details by ID or list resources based on filters, pass in the input object of the corresponding resource to get the data of the corresponding resource"
    )]
    async fn get_resource(
        &self,
        Parameters(input): Parameters<GetResourceInput>,
    ) -> Result<CallToolResult, McpError> {
        let requested = input.requested();
        if requested.is_empty() {
            return Ok(CallToolResult::error(vec![Content::text(
                ResourceError::NothingRequested.to_string(),
            )]));
        }

        let requests = requested
            .into_iter()
            .map(|(kind, filter)| filter.request(kind))
            .collect::<Result<Vec<_>, _>>()
            .map_err(|e| McpError::invalid_params(e.to_string(), None))?;

        let mut contents = Vec::with_capacity(requests.len());
        for req in &requests {
            match self.client.present(req, Shape::Full).await {
                Ok(presented) => contents.push(Content::text(presented.to_text())),
                Err(e) => return Ok(error_result(&e)),
            }
        }
        Ok(CallToolResult::success(contents))
    }

    #[tool(description = "Get role details by ID or list roles based on filters")]
    async fn get_role(
        &self,
        Parameters(input): Parameters<GetByIdOrSearchInput>,
    ) -> Result<CallToolResult, McpError> {
        let req = match non_empty(input.id.as_deref()) {
            Some(id) => {
                require_id("id", id)?;
                ApiRequest::get(format!("/api/roles/{}", id))
            }
            None => ApiRequest::get("/api/roles").query_opt("search", input.search),
        };
        Ok(to_tool_result(self.client.present(&req, Shape::Full).await))
    }

    #[tool(description = "Create a role")]
    async fn create_role(
        &self,
        Parameters(input): Parameters<CreateRoleInput>,
    ) -> Result<CallToolResult, McpError> {
        input
            .role
            .validate()
            .map_err(|e| McpError::invalid_params(e, None))?;
        for policy in &input.role.policies {
            require_id("policies", policy)?;
        }
        let body = serde_json::to_value(&input.role).map_err(mcp_err)?;
        let req = ApiRequest::post("/api/roles").json(body);
        Ok(self
            .present_linked(&req, |v| created_id(v).map(|id| format!("/roles/{}", id)))
            .await)
    }

    #[tool(description = "Delete a role")]
    async fn delete_role(
        &self,
        Parameters(input): Parameters<IdInput>,
    ) -> Result<CallToolResult, McpError> {
        require_id("id", &input.id)?;
        let req = ApiRequest::delete(format!("/api/roles/{}", input.id));
        Ok(to_tool_result(self.client.present(&req, Shape::Full).await))
    }

    #[tool(description = "Update assigned roles for a user")]
    async fn update_assigned_roles_for_user(
        &self,
        Parameters(input): Parameters<UpdateAssignedRolesInput>,
    ) -> Result<CallToolResult, McpError> {
        require_id("user_id", &input.user_id)?;
        for role in &input.roles {
            require_id("roles", role)?;
        }
        let req = ApiRequest::put(format!("/api/users/{}/assigned_roles", input.user_id))
            .json(json!({ "roles": input.roles }));
        let page = format!("/users/{}", input.user_id);
        Ok(self.present_linked(&req, |_| Some(page)).await)
    }

    #[tool(description = "Get role details by user id")]
    async fn get_role_by_user_id(
        &self,
        Parameters(input): Parameters<IdInput>,
    ) -> Result<CallToolResult, McpError> {
        require_id("id", &input.id)?;
        let req = ApiRequest::get(format!("/api/users/{}", input.id));
        Ok(to_tool_result(
            self.client.present(&req, Shape::Pick("value.roles")).await,
        ))
    }

    #[tool(name = "get_userId_by_username", description = "Get user id by username")]
    async fn get_user_id_by_username(
        &self,
        Parameters(input): Parameters<GetUserIdInput>,
    ) -> Result<CallToolResult, McpError> {
        let req = ApiRequest::get("/api/users").query_opt("search", input.username);
        let result = self
            .client
            .present_with(&req, Shape::Pick("list"), user_summaries)
            .await;
        Ok(to_tool_result(result))
    }

    #[tool(
        description = "Get permission policy details by ID or list permission policies based on filters"
    )]
    async fn get_permission_policy(
        &self,
        Parameters(input): Parameters<GetByIdOrSearchInput>,
    ) -> Result<CallToolResult, McpError> {
        let req = match non_empty(input.id.as_deref()) {
            Some(id) => {
                require_id("id", id)?;
                ApiRequest::get(format!("/api/permission_policies/{}", id))
            }
            None => ApiRequest::get("/api/permission_policies").query_opt("search", input.search),
        };
        Ok(to_tool_result(self.client.present(&req, Shape::Full).await))
    }

    #[tool(
        description = "Create a permission policy\nNotes:\n1. Condition resource is only used for label matching, other field matching is not supported\n2. Supports using regular expressions in angle brackets. For example: `gateway:<.*>CustomPlugin<.*>` represents all operations related to custom plugins. `<.*>Get<.*>` matches all actions containing 'Get'."
    )]
    async fn create_permission_policy(
        &self,
        Parameters(input): Parameters<CreatePermissionPolicyInput>,
    ) -> Result<CallToolResult, McpError> {
        input
            .permission_policy
            .validate()
            .map_err(|e| McpError::invalid_params(e, None))?;
        let body = serde_json::to_value(&input.permission_policy).map_err(mcp_err)?;
        let req = ApiRequest::post("/api/permission_policies").json(body);
        Ok(self
            .present_linked(&req, |v| created_id(v).map(|id| format!("/policies/{}", id)))
            .await)
    }

    #[tool(
        description = "Update a permission policy\nNotes:\n1. Condition resource is only used for label matching, other field matching is not supported\n2. Supports using regular expressions in angle brackets. For example: `gateway:<.*>CustomPlugin<.*>` represents all operations related to custom plugins. `<.*>Get<.*>` matches all actions containing 'Get'."
    )]
    async fn update_permission_policy(
        &self,
        Parameters(input): Parameters<UpdatePermissionPolicyInput>,
    ) -> Result<CallToolResult, McpError> {
        require_id("id", &input.id)?;
        input
            .permission_policy
            .validate()
            .map_err(|e| McpError::invalid_params(e, None))?;
        let body = serde_json::to_value(&input.permission_policy).map_err(mcp_err)?;
        let req = ApiRequest::put(format!("/api/permission_policies/{}", input.id)).json(body);
        Ok(self
            .present_linked(&req, |v| created_id(v).map(|id| format!("/policies/{}", id)))
            .await)
    }

    #[tool(description = "Delete a permission policy")]
    async fn delete_permission_policy(
        &self,
        Parameters(input): Parameters<IdInput>,
    ) -> Result<CallToolResult, McpError> {
        require_id("id", &input.id)?;
        let req = ApiRequest::delete(format!("/api/permission_policies/{}", input.id));
        Ok(to_tool_result(self.client.present(&req, Shape::Full).await))
    }

    #[tool(description = "Get permission policy details by role id")]
    async fn get_permission_policy_by_role(
        &self,
        Parameters(input): Parameters<IdInput>,
    ) -> Result<CallToolResult, McpError> {
        require_id("id", &input.id)?;
        let req = ApiRequest::get(format!("/api/roles/{}/permission_policies", input.id));
        Ok(to_tool_result(self.client.present(&req, Shape::Full).await))
    }

    #[tool(description = "Attach permission policy to role")]
    async fn attach_permission_policy_to_role(
        &self,
        Parameters(input): Parameters<RolePoliciesInput>,
    ) -> Result<CallToolResult, McpError> {
        self.change_role_policies("attach", input).await
    }

    #[tool(description = "Detach permission policy from role")]
    async fn detach_permission_policy_from_role(
        &self,
        Parameters(input): Parameters<RolePoliciesInput>,
    ) -> Result<CallToolResult, McpError> {
        self.change_role_policies("detach", input).await
    }
}

impl McpServer {
    async fn change_role_policies(
        &self,
        action: &str,
        input: RolePoliciesInput,
    ) -> Result<CallToolResult, McpError> {
        require_id("id", &input.id)?;
        for id in &input.permission_policy_id {
            require_id("permissionPolicyId", id)?;
        }
        let req = ApiRequest::post(format!(
            "/api/roles/{}/{}_permission_policies",
            input.id, action
        ))
        .json(json!(input.permission_policy_id));
        let page = format!("/roles/{}/detail", input.id);
        Ok(self.present_linked(&req, |_| Some(page)).await)
    }
}

fn require_id(field: &str, value: &str) -> Result<(), McpError> {
    if is_valid_id(value) {
        Ok(())
    } else {
        Err(McpError::invalid_params(
            format!("invalid {}: must match ^[a-zA-Z0-9-_.]+$ and be at most 256 characters", field),
            None,
        ))
    }
}

/// `value.id` of a create/update response, as text
fn created_id(value: &Value) -> Option<String> {
    match value.pointer("/value/id")? {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn with_console_url(value: Value, url: Option<String>) -> Value {
    let Some(url) = url else {
        return value;
    };
    match value {
        Value::Object(mut map) => {
            map.insert("console_url".to_string(), Value::String(url));
            Value::Object(map)
        }
        Value::Null => json!({ "console_url": url }),
        other => json!({ "data": other, "console_url": url }),
    }
}

/// `[{id, name, username}]` from a user list
fn user_summaries(list: Value) -> Value {
    match list {
        Value::Array(users) => Value::Array(
            users
                .into_iter()
                .map(|u| json!({ "id": u["id"], "name": u["name"], "username": u["username"] }))
                .collect(),
        ),
        _ => Value::Null,
    }
}

fn to_tool_result(result: Result<Presented, ControlPlaneError>) -> CallToolResult {
    match result {
        Ok(presented) => CallToolResult::success(vec![Content::text(presented.to_text())]),
        Err(e) => error_result(&e),
    }
}

fn error_result(e: &ControlPlaneError) -> CallToolResult {
    tracing::debug!(error = %e, "Control plane call failed");
    CallToolResult::error(vec![Content::text(e.to_tool_text())])
}

fn mcp_err(e: impl std::fmt::Display) -> McpError {
    tracing::debug!(error = %e, "MCP tool error");
    McpError::internal_error(e.to_string(), None)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use httpmock::prelude::*;

    use crate::core::config::ControlPlaneConfig;
    use crate::domain::resources::ResourceFilter;

    fn server_for(mock: &MockServer) -> McpServer {
        let client = ControlPlaneClient::new(&ControlPlaneConfig {
            address: mock.base_url(),
            token: Some("t".to_string()),
            dashboard_url: "https://dash.local".to_string(),
            timeout: Duration::from_secs(5),
            accept_invalid_certs: false,
        })
        .unwrap();
        McpServer::new(client, Tz::UTC)
    }

    fn text(result: &CallToolResult, i: usize) -> &str {
        result.content[i]
            .as_text()
            .map(|t| t.text.as_str())
            .unwrap_or_default()
    }

    #[test]
    fn test_tool_names() {
        let mut names: Vec<String> = McpServer::tool_router()
            .list_all()
            .into_iter()
            .map(|tool| tool.name.to_string())
            .collect();
        names.sort();
        assert_eq!(
            names,
            vec![
                "attach_permission_policy_to_role",
                "check_risk",
                "create_permission_policy",
                "create_role",
                "delete_permission_policy",
                "delete_role",
                "detach_permission_policy_from_role",
                "get_permission_policy",
                "get_permission_policy_by_role",
                "get_prometheus_metrics",
                "get_resource",
                "get_role",
                "get_role_by_user_id",
                "get_userId_by_username",
                "update_assigned_roles_for_user",
                "update_permission_policy",
            ]
        );
    }

    #[test]
    fn test_with_console_url() {
        assert_eq!(
            with_console_url(json!({"value": {"id": 1}}), Some("u".to_string())),
            json!({"value": {"id": 1}, "console_url": "u"})
        );
        assert_eq!(
            with_console_url(Value::Null, Some("u".to_string())),
            json!({"console_url": "u"})
        );
        assert_eq!(with_console_url(json!({"a": 1}), None), json!({"a": 1}));
    }

    #[test]
    fn test_created_id() {
        assert_eq!(created_id(&json!({"value": {"id": "r1"}})).as_deref(), Some("r1"));
        assert_eq!(created_id(&json!({"value": {"id": 7}})).as_deref(), Some("7"));
        assert_eq!(created_id(&json!({"list": []})), None);
    }

    #[test]
    fn test_user_summaries() {
        let list = json!([{"id": "u1", "name": "Alice", "username": "alice", "email": "a@x"}]);
        assert_eq!(
            user_summaries(list),
            json!([{"id": "u1", "name": "Alice", "username": "alice"}])
        );
        assert_eq!(user_summaries(Value::Null), Value::Null);
    }

    #[test]
    fn test_require_id() {
        assert!(require_id("id", "role-1").is_ok());
        assert!(require_id("id", "../x").is_err());
        assert!(require_id("id", "").is_err());
    }

    #[tokio::test]
    async fn test_create_role_adds_console_url() {
        let mock = MockServer::start_async().await;
        let m = mock
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/roles")
                    .json_body(json!({"name": "auditor", "policies": ["p1"]}));
                then.status(200)
                    .json_body(json!({"value": {"id": "r9", "name": "auditor"}}));
            })
            .await;

        let server = server_for(&mock);
        let result = server
            .create_role(Parameters(CreateRoleInput {
                role: Role {
                    name: "auditor".to_string(),
                    desc: None,
                    labels: None,
                    policies: vec!["p1".to_string()],
                },
            }))
            .await
            .unwrap();

        m.assert_async().await;
        assert_ne!(result.is_error, Some(true));
        let body: Value = serde_json::from_str(text(&result, 0)).unwrap();
        assert_eq!(body["console_url"], "https://dash.local/roles/r9");
    }

    #[tokio::test]
    async fn test_get_role_lists_with_search() {
        let mock = MockServer::start_async().await;
        let m = mock
            .mock_async(|when, then| {
                when.method(GET).path("/api/roles").query_param("search", "admin");
                then.status(200).json_body(json!({"list": [], "total": 0}));
            })
            .await;

        let result = server_for(&mock)
            .get_role(Parameters(GetByIdOrSearchInput {
                id: None,
                search: Some("admin".to_string()),
            }))
            .await
            .unwrap();
        m.assert_async().await;
        assert_eq!(text(&result, 0), "{\n  \"list\": [],\n  \"total\": 0\n}");
    }

    #[tokio::test]
    async fn test_delete_role_error_is_tool_error() {
        let mock = MockServer::start_async().await;
        mock.mock_async(|when, then| {
            when.method(DELETE).path("/api/roles/r1");
            then.status(404).json_body(json!({"error_msg": "role not found"}));
        })
        .await;

        let result = server_for(&mock)
            .delete_role(Parameters(IdInput {
                id: "r1".to_string(),
            }))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(text(&result, 0).starts_with("Status: 404\n"));
        assert!(text(&result, 0).contains("role not found"));
    }

    #[tokio::test]
    async fn test_invalid_id_is_invalid_params() {
        let mock = MockServer::start_async().await;
        let err = server_for(&mock)
            .get_permission_policy_by_role(Parameters(IdInput {
                id: "a/b".to_string(),
            }))
            .await
            .unwrap_err();
        assert!(err.message.contains("invalid id"));
    }

    #[tokio::test]
    async fn test_get_user_id_by_username() {
        let mock = MockServer::start_async().await;
        mock.mock_async(|when, then| {
            when.method(GET).path("/api/users").query_param("search", "alice");
            then.status(200).json_body(json!({
                "list": [{"id": "u1", "name": "Alice", "username": "alice", "roles": ["r1"]}],
                "total": 1
            }));
        })
        .await;

        let result = server_for(&mock)
            .get_user_id_by_username(Parameters(GetUserIdInput {
                username: Some("alice".to_string()),
            }))
            .await
            .unwrap();
        let body: Value = serde_json::from_str(text(&result, 0)).unwrap();
        assert_eq!(body, json!([{"id": "u1", "name": "Alice", "username": "alice"}]));
    }

    #[tokio::test]
    async fn test_attach_policies_posts_id_list() {
        let mock = MockServer::start_async().await;
        let m = mock
            .mock_async(|when, then| {
                when.method(POST)
                    .path("/api/roles/r1/attach_permission_policies")
                    .json_body(json!(["p1", "p2"]));
                then.status(200).json_body(json!({"value": {}}));
            })
            .await;

        let result = server_for(&mock)
            .attach_permission_policy_to_role(Parameters(RolePoliciesInput {
                id: "r1".to_string(),
                permission_policy_id: vec!["p1".to_string(), "p2".to_string()],
            }))
            .await
            .unwrap();
        m.assert_async().await;
        let body: Value = serde_json::from_str(text(&result, 0)).unwrap();
        assert_eq!(body["console_url"], "https://dash.local/roles/r1/detail");
    }

    #[tokio::test]
    async fn test_get_resource_concatenates_and_short_circuits() {
        let mock = MockServer::start_async().await;
        mock.mock_async(|when, then| {
            when.method(GET)
                .path("/apisix/admin/services")
                .query_param("gateway_group_id", "default");
            then.status(200).json_body(json!({"list": [{"id": "s1"}]}));
        })
        .await;
        mock.mock_async(|when, then| {
            when.method(GET).path("/apisix/admin/routes/r1");
            then.status(200).json_body(json!({"value": {"id": "r1"}}));
        })
        .await;
        mock.mock_async(|when, then| {
            when.method(GET).path("/api/custom_plugins");
            then.status(500).json_body(json!({"error_msg": "boom"}));
        })
        .await;

        let server = server_for(&mock);
        let ok = server
            .get_resource(Parameters(GetResourceInput {
                published_service: Some(ResourceFilter {
                    gateway_group_id: Some("default".to_string()),
                    ..Default::default()
                }),
                route: Some(ResourceFilter {
                    id: Some("r1".to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(ok.content.len(), 2);
        assert!(text(&ok, 1).contains("\"r1\""));

        let failed = server
            .get_resource(Parameters(GetResourceInput {
                route: Some(ResourceFilter {
                    id: Some("r1".to_string()),
                    ..Default::default()
                }),
                custom_plugin: Some(ResourceFilter::default()),
                ..Default::default()
            }))
            .await
            .unwrap();
        assert_eq!(failed.is_error, Some(true));
        assert_eq!(failed.content.len(), 1);
        assert!(text(&failed, 0).starts_with("Status: 500"));
    }

    #[tokio::test]
    async fn test_get_resource_requires_a_kind() {
        let mock = MockServer::start_async().await;
        let result = server_for(&mock)
            .get_resource(Parameters(GetResourceInput::default()))
            .await
            .unwrap();
        assert_eq!(result.is_error, Some(true));
        assert_eq!(text(&result, 0), "No resource parameters passed in");

        let err = server_for(&mock)
            .get_resource(Parameters(GetResourceInput {
                upstream: Some(ResourceFilter::default()),
                ..Default::default()
            }))
            .await
            .unwrap_err();
        assert!(err.message.contains("upstream requires service_id"));
    }

    #[tokio::test]
    async fn test_check_risk_returns_prompt_and_overview() {
        let mock = MockServer::start_async().await;
        for path in ["/api/custom_plugins", "/api/gateway_groups"] {
            mock.mock_async(|when, then| {
                when.method(GET).path(path);
                then.status(200).json_body(json!({"list": []}));
            })
            .await;
        }

        let result = server_for(&mock).check_risk().await.unwrap();
        assert_eq!(result.content.len(), 2);
        assert!(text(&result, 0).contains("Risk Item List"));
        assert!(text(&result, 1).ends_with("Resource Overview (Use this for initial assessment):\n{}"));
    }

    #[tokio::test]
    async fn test_check_risk_failure_is_tool_error() {
        let mock = MockServer::start_async().await;
        mock.mock_async(|when, then| {
            when.method(GET).path("/api/custom_plugins");
            then.status(401).json_body(json!({"error_msg": "unauthorized"}));
        })
        .await;

        let result = server_for(&mock).check_risk().await.unwrap();
        assert_eq!(result.is_error, Some(true));
        assert!(text(&result, 0).starts_with("Status: 401"));
    }

    #[tokio::test]
    async fn test_metrics_invalid_raw_time_is_invalid_params() {
        let mock = MockServer::start_async().await;
        let input: PrometheusMetricsInput =
            serde_json::from_value(json!({"type": "api-requests", "raw_time": "a week"})).unwrap();
        let err = server_for(&mock)
            .get_prometheus_metrics(Parameters(input))
            .await
            .unwrap_err();
        assert!(err.message.contains("Invalid duration"));
    }

    #[tokio::test]
    async fn test_metrics_single_type_unwrapped() {
        let mock = MockServer::start_async().await;
        mock.mock_async(|when, then| {
            when.method(GET)
                .path("/api/control_plane/prometheus/api/v1/query");
            then.status(200).json_body(json!({
                "status": "success",
                "data": {"resultType": "vector", "result": []}
            }));
        })
        .await;

        let input: PrometheusMetricsInput =
            serde_json::from_value(json!({"type": "api-failure-requests"})).unwrap();
        let result = server_for(&mock)
            .get_prometheus_metrics(Parameters(input))
            .await
            .unwrap();
        let body: Value = serde_json::from_str(text(&result, 0)).unwrap();
        assert_eq!(body["no_data"], true);
        assert_eq!(body["message"], "No failed requests in this period");
    }
}
