//! Condensed inventory of gateway resources used for risk analysis

use chrono_tz::Tz;
use futures::future::try_join_all;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::data::control_plane::{ApiRequest, ControlPlaneClient, ControlPlaneError, ListResponse, ResourceId};
use crate::utils::time::format_unix;

// Raw control-plane records. Only the fields the overview needs are decoded.

#[derive(Debug, Deserialize)]
struct RawNamed {
    id: ResourceId,
    #[serde(default)]
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RawService {
    id: ResourceId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    path_prefix: Option<String>,
    #[serde(default)]
    hosts: Option<Vec<String>>,
    #[serde(default)]
    plugins: Option<Map<String, Value>>,
    #[serde(default)]
    upstream: Option<RawUpstream>,
}

#[derive(Debug, Default, Deserialize)]
struct RawUpstream {
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    checks: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RawRoute {
    id: ResourceId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    paths: Option<Vec<String>>,
    #[serde(default)]
    methods: Option<Vec<String>>,
    #[serde(default)]
    plugins: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RawGlobalRule {
    id: ResourceId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    plugins: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RawCertificate {
    id: ResourceId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    common_name: Option<String>,
    #[serde(default)]
    exptime: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RawConsumer {
    id: ResourceId,
    #[serde(default)]
    username: Option<String>,
    #[serde(default)]
    plugins: Option<Map<String, Value>>,
}

#[derive(Debug, Deserialize)]
struct RawCredential {
    id: ResourceId,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    plugins: Option<Map<String, Value>>,
}

// Overview records

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NamedEntry {
    pub id: ResourceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HealthChecks {
    pub active: bool,
    pub passive: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpstreamSummary {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub checks: HealthChecks,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteSummary {
    pub id: ResourceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub paths: Option<Vec<String>>,
    pub methods: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugins: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ServiceSummary {
    pub id: ResourceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    pub path_prefix: String,
    pub hosts: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugins: Option<Vec<String>>,
    pub upstream: UpstreamSummary,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub routes: Option<Vec<RouteSummary>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GlobalRuleSummary {
    pub id: ResourceId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugins: Option<Vec<String>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CertificateSummary {
    pub id: ResourceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub common_name: Option<String>,
    pub exptime: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CredentialSummary {
    pub id: ResourceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugin: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConsumerSummary {
    pub id: ResourceId,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub plugins: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub credentials: Option<Vec<CredentialSummary>>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GatewayGroupSummary {
    pub id: ResourceId,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub published_services: Option<Vec<ServiceSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub global_rules: Option<Vec<GlobalRuleSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ssl: Option<Vec<CertificateSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ca_certificate: Option<Vec<CertificateSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub consumer: Option<Vec<ConsumerSummary>>,
}

impl GatewayGroupSummary {
    /// Whether the group carries anything beyond its id and name
    pub fn has_resources(&self) -> bool {
        self.published_services.is_some()
            || self.global_rules.is_some()
            || self.ssl.is_some()
            || self.ca_certificate.is_some()
            || self.consumer.is_some()
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceOverview {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub gateway_groups: Option<Vec<GatewayGroupSummary>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub custom_plugins: Option<Vec<NamedEntry>>,
}

impl ResourceOverview {
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// `Some(items)` unless empty
fn non_empty<T>(items: Vec<T>) -> Option<Vec<T>> {
    if items.is_empty() { None } else { Some(items) }
}

fn plugin_names(plugins: Option<Map<String, Value>>) -> Option<Vec<String>> {
    non_empty(plugins.map(|p| p.into_iter().map(|(k, _)| k).collect()).unwrap_or_default())
}

fn truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) | Some(Value::Bool(false)) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

fn format_exptime(exptime: Option<i64>, tz: &Tz) -> String {
    match exptime {
        Some(secs) if secs != 0 => format_unix(secs, tz),
        _ => String::new(),
    }
}

fn summarize_certificate(cert: RawCertificate, tz: &Tz) -> CertificateSummary {
    CertificateSummary {
        exptime: format_exptime(cert.exptime, tz),
        id: cert.id,
        name: cert.name,
        common_name: cert.common_name,
    }
}

fn summarize_route(route: RawRoute) -> RouteSummary {
    RouteSummary {
        id: route.id,
        name: route.name,
        paths: route.paths,
        methods: route.methods.unwrap_or_else(|| vec!["*".to_string()]),
        plugins: plugin_names(route.plugins),
    }
}

fn summarize_global_rule(rule: RawGlobalRule) -> GlobalRuleSummary {
    GlobalRuleSummary {
        name: rule
            .name
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("Global Rule {}", rule.id)),
        id: rule.id,
        plugins: plugin_names(rule.plugins),
    }
}

fn summarize_credential(credential: RawCredential) -> CredentialSummary {
    CredentialSummary {
        id: credential.id,
        name: credential.name,
        plugin: credential
            .plugins
            .and_then(|p| p.into_iter().next().map(|(k, _)| k)),
    }
}

async fn list<T>(client: &ControlPlaneClient, req: ApiRequest) -> Result<Vec<T>, ControlPlaneError>
where
    T: serde::de::DeserializeOwned,
{
    let resp: ListResponse<T> = client.fetch(&req).await?;
    Ok(resp.into_items())
}

async fn collect_service(
    client: &ControlPlaneClient,
    group_id: &ResourceId,
    service: RawService,
) -> Result<ServiceSummary, ControlPlaneError> {
    let routes: Vec<RawRoute> = list(
        client,
        ApiRequest::get("/apisix/admin/routes")
            .query("service_id", &service.id)
            .query("gateway_group_id", group_id),
    )
    .await?;

    let upstream = service.upstream.unwrap_or_default();
    let checks = upstream.checks.unwrap_or_default();
    Ok(ServiceSummary {
        id: service.id,
        name: service.name,
        path_prefix: service.path_prefix.unwrap_or_default(),
        hosts: service
            .hosts
            .filter(|h| !h.is_empty())
            .unwrap_or_else(|| vec!["*".to_string()]),
        plugins: plugin_names(service.plugins),
        upstream: UpstreamSummary {
            name: upstream.name,
            checks: HealthChecks {
                active: truthy(checks.get("active")),
                passive: truthy(checks.get("passive")),
            },
        },
        routes: non_empty(routes.into_iter().map(summarize_route).collect()),
    })
}

async fn collect_consumer(
    client: &ControlPlaneClient,
    group_id: &ResourceId,
    consumer: RawConsumer,
) -> Result<ConsumerSummary, ControlPlaneError> {
    let username = consumer.username.filter(|u| !u.is_empty());
    let credentials: Vec<RawCredential> = match &username {
        Some(username) => {
            list(
                client,
                ApiRequest::get(format!("/apisix/admin/consumers/{}/credentials", username))
                    .query("gateway_group_id", group_id),
            )
            .await?
        }
        None => Vec::new(),
    };

    Ok(ConsumerSummary {
        name: username.unwrap_or_else(|| format!("Consumer {}", consumer.id)),
        id: consumer.id,
        plugins: plugin_names(consumer.plugins),
        credentials: non_empty(credentials.into_iter().map(summarize_credential).collect()),
    })
}

async fn collect_group(
    client: &ControlPlaneClient,
    group: RawNamed,
    tz: &Tz,
) -> Result<GatewayGroupSummary, ControlPlaneError> {
    let in_group = |path: &str| ApiRequest::get(path).query("gateway_group_id", &group.id);

    let (services, global_rules, certificates, ca_certificates, consumers) = tokio::try_join!(
        list::<RawService>(client, in_group("/apisix/admin/services")),
        list::<RawGlobalRule>(client, in_group("/apisix/admin/global_rules")),
        list::<RawCertificate>(client, in_group("/apisix/admin/certificates")),
        list::<RawCertificate>(client, in_group("/apisix/admin/ca_certificates")),
        list::<RawConsumer>(client, in_group("/apisix/admin/consumers")),
    )?;

    let (services, consumers) = tokio::try_join!(
        try_join_all(services.into_iter().map(|s| collect_service(client, &group.id, s))),
        try_join_all(consumers.into_iter().map(|c| collect_consumer(client, &group.id, c))),
    )?;

    Ok(GatewayGroupSummary {
        published_services: non_empty(services),
        global_rules: non_empty(global_rules.into_iter().map(summarize_global_rule).collect()),
        ssl: non_empty(
            certificates
                .into_iter()
                .map(|c| summarize_certificate(c, tz))
                .collect(),
        ),
        ca_certificate: non_empty(
            ca_certificates
                .into_iter()
                .map(|c| summarize_certificate(c, tz))
                .collect(),
        ),
        consumer: non_empty(consumers),
        id: group.id,
        name: group.name,
    })
}

/// Walk custom plugins and every gateway group; any failed request aborts the walk
pub async fn collect_overview(
    client: &ControlPlaneClient,
    tz: &Tz,
) -> Result<ResourceOverview, ControlPlaneError> {
    let custom_plugins: Vec<RawNamed> = list(client, ApiRequest::get("/api/custom_plugins")).await?;
    let groups: Vec<RawNamed> = list(client, ApiRequest::get("/api/gateway_groups")).await?;
    tracing::debug!(
        custom_plugins = custom_plugins.len(),
        gateway_groups = groups.len(),
        "Collecting resource overview"
    );

    let groups = try_join_all(groups.into_iter().map(|g| collect_group(client, g, tz))).await?;

    Ok(ResourceOverview {
        gateway_groups: non_empty(groups.into_iter().filter(|g| g.has_resources()).collect()),
        custom_plugins: non_empty(
            custom_plugins
                .into_iter()
                .map(|p| NamedEntry { id: p.id, name: p.name })
                .collect(),
        ),
    })
}
