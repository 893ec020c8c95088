use std::collections::BTreeMap;

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::domain::metrics::{GroupDimension, MetricType};
use crate::domain::resources::{ResourceFilter, ResourceKind};

/// One metric type or a list of them
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(untagged)]
pub enum MetricSelection {
    One(MetricType),
    Many(Vec<MetricType>),
}

impl MetricSelection {
    pub fn into_vec(self) -> Vec<MetricType> {
        match self {
            MetricSelection::One(t) => vec![t],
            MetricSelection::Many(ts) => ts,
        }
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct PrometheusMetricsInput {
    /// Metric type, options: api-status-dist(status code distribution), api-failure-requests(failed requests),
    /// api-requests(total requests), api-bandwidth(bandwidth), api-latency(latency),
    /// api-connections(connections), api-qps(queries per second)
    #[serde(rename = "type")]
    pub metric_type: MetricSelection,
    /// Start time in ISO format, e.g.: 2025-04-10T02:34:00.878Z, raw_time will be used if not provided
    pub start: Option<String>,
    /// End time in ISO format, e.g.: 2025-04-10T03:04:00.878Z, raw_time will be used if not provided
    pub end: Option<String>,
    /// Step interval, e.g.: 15s, 1m
    pub step: Option<String>,
    /// Time range, e.g.: 1m, 5m, 15m, 30m, 1h, 4h, 12h, 1d, 7d, 10d (default: 15m)
    pub raw_time: Option<String>,
    /// Route ID
    pub route_id: Option<String>,
    /// Service ID
    pub service_id: Option<String>,
    /// Instance ID
    pub instance_id: Option<String>,
    /// Gateway Group ID
    pub gateway_group_id: Option<String>,
    /// Dimensions to group metrics by (default: [gateway_group_id])
    pub group_by: Option<Vec<GroupDimension>>,
}

/// Pass the object of each resource kind to fetch; an `id` fetches one item, otherwise the kind is listed
#[derive(Debug, Default, Deserialize, JsonSchema)]
pub struct GetResourceInput {
    #[serde(rename = "publishedService")]
    pub published_service: Option<ResourceFilter>,
    /// Requires service_id
    pub upstream: Option<ResourceFilter>,
    #[serde(rename = "serviceTemplate")]
    pub service_template: Option<ResourceFilter>,
    pub route: Option<ResourceFilter>,
    pub stream_route: Option<ResourceFilter>,
    #[serde(rename = "secretProvider")]
    pub secret_provider: Option<ResourceFilter>,
    pub certificate: Option<ResourceFilter>,
    /// id is the consumer username
    pub consumer: Option<ResourceFilter>,
    /// Requires username
    pub credential: Option<ResourceFilter>,
    #[serde(rename = "gatewayGroup")]
    pub gateway_group: Option<ResourceFilter>,
    #[serde(rename = "caCertificate")]
    pub ca_certificate: Option<ResourceFilter>,
    pub sni: Option<ResourceFilter>,
    #[serde(rename = "globalRules")]
    pub global_rules: Option<ResourceFilter>,
    /// id is the plugin name
    #[serde(rename = "pluginMetadata")]
    pub plugin_metadata: Option<ResourceFilter>,
    /// List only; gateway_group_id narrows to one group
    #[serde(rename = "gatewayInstance")]
    pub gateway_instance: Option<ResourceFilter>,
    /// Requires gateway_group_id
    #[serde(rename = "serviceRegistry")]
    pub service_registry: Option<ResourceFilter>,
    #[serde(rename = "customPlugin")]
    pub custom_plugin: Option<ResourceFilter>,
}

impl GetResourceInput {
    /// Requested kinds in catalogue order
    pub fn requested(&self) -> Vec<(ResourceKind, &ResourceFilter)> {
        let slots = [
            &self.published_service,
            &self.upstream,
            &self.service_template,
            &self.route,
            &self.stream_route,
            &self.secret_provider,
            &self.certificate,
            &self.consumer,
            &self.credential,
            &self.gateway_group,
            &self.ca_certificate,
            &self.sni,
            &self.global_rules,
            &self.plugin_metadata,
            &self.gateway_instance,
            &self.service_registry,
            &self.custom_plugin,
        ];
        ResourceKind::ALL
            .into_iter()
            .zip(slots)
            .filter_map(|(kind, slot)| slot.as_ref().map(|f| (kind, f)))
            .collect()
    }
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetByIdOrSearchInput {
    /// The object ID. Omit to list.
    pub id: Option<String>,
    /// The search query
    pub search: Option<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct IdInput {
    /// The object ID
    pub id: String,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Role {
    /// The role name
    pub name: String,
    /// The object description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    /// The labels of the object
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    /// The policies attached to the role
    pub policies: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreateRoleInput {
    pub role: Role,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdateAssignedRolesInput {
    /// The user ID
    pub user_id: String,
    /// The roles to assign to the user
    pub roles: Vec<String>,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetUserIdInput {
    /// username
    pub username: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "snake_case")]
pub enum PolicyType {
    BuiltIn,
    #[default]
    Custom,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "lowercase")]
pub enum Effect {
    Allow,
    Deny,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct Statement {
    pub effect: Effect,
    /// Resource patterns, e.g. `arn:api7:gateway:gatewaygroup/<.*>`
    pub resources: Vec<String>,
    /// Actions, e.g. `gateway:GetPublishedService`; `<.*>` matches any text
    pub actions: Vec<String>,
    /// Label match conditions keyed by label kind, e.g. `gateway_group_label`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub conditions: Option<Map<String, Value>>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PolicyDocument {
    pub statement: Vec<Statement>,
}

#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct PermissionPolicy {
    pub name: String,
    #[serde(rename = "type", default)]
    pub policy_type: PolicyType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub desc: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub labels: Option<BTreeMap<String, String>>,
    pub policy_document: PolicyDocument,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct CreatePermissionPolicyInput {
    #[serde(rename = "permissionPolicy")]
    pub permission_policy: PermissionPolicy,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct UpdatePermissionPolicyInput {
    /// The policy ID
    pub id: String,
    #[serde(rename = "permissionPolicy")]
    pub permission_policy: PermissionPolicy,
}

#[derive(Debug, Deserialize, JsonSchema)]
pub struct RolePoliciesInput {
    /// The role ID
    pub id: String,
    /// Permission policy IDs
    #[serde(rename = "permissionPolicyId")]
    pub permission_policy_id: Vec<String>,
}

impl Role {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() || self.name.chars().count() > 256 {
            return Err("role name must be 1 to 256 characters".to_string());
        }
        Ok(())
    }
}

impl PermissionPolicy {
    pub fn validate(&self) -> Result<(), String> {
        if self.name.is_empty() || self.name.chars().count() > 100 {
            return Err("policy name must be 1 to 100 characters".to_string());
        }
        if self.policy_document.statement.is_empty() {
            return Err("policy_document.statement must not be empty".to_string());
        }
        for (i, statement) in self.policy_document.statement.iter().enumerate() {
            if statement.resources.is_empty() || statement.actions.is_empty() {
                return Err(format!(
                    "statement {} needs at least one resource and one action",
                    i
                ));
            }
        }
        Ok(())
    }
}
