use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::data::control_plane::ApiRequest;
use crate::utils::string::{is_valid_id, non_empty};

use super::error::ResourceError;
use super::kind::ResourceKind;

/// Lookup or list filters for one resource kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct ResourceFilter {
    /// Fetch a single item by its ID (username for consumers, plugin name for plugin metadata).
    /// Omit to list.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Gateway group the resource belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gateway_group_id: Option<String>,
    /// Parent service, required for upstreams
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub service_id: Option<String>,
    /// Parent consumer, required for credentials
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    /// Free-text search when listing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search: Option<String>,
    /// Page number when listing, starting at 1
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page: Option<u32>,
    /// Page size when listing
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub page_size: Option<u32>,
}

fn checked<'a>(field: &'static str, value: Option<&'a str>) -> Result<Option<&'a str>, ResourceError> {
    match non_empty(value) {
        Some(v) if !is_valid_id(v) => Err(ResourceError::InvalidId { field }),
        other => Ok(other),
    }
}

fn required<'a>(
    kind: ResourceKind,
    field: &'static str,
    value: Option<&'a str>,
) -> Result<&'a str, ResourceError> {
    value.ok_or(ResourceError::MissingField { kind, field })
}

impl ResourceFilter {
    /// Build the GET request for `kind`
    pub fn request(&self, kind: ResourceKind) -> Result<ApiRequest, ResourceError> {
        let id = checked("id", self.id.as_deref())?;
        let group = checked("gateway_group_id", self.gateway_group_id.as_deref())?;
        let service = checked("service_id", self.service_id.as_deref())?;
        let username = checked("username", self.username.as_deref())?;

        let collection = match kind {
            ResourceKind::PublishedService => "/apisix/admin/services".to_string(),
            ResourceKind::Upstream => format!(
                "/apisix/admin/services/{}/upstreams",
                required(kind, "service_id", service)?
            ),
            ResourceKind::ServiceTemplate => "/api/services/template".to_string(),
            ResourceKind::Route => "/apisix/admin/routes".to_string(),
            ResourceKind::StreamRoute => "/apisix/admin/stream_routes".to_string(),
            ResourceKind::SecretProvider => "/apisix/admin/secret_providers".to_string(),
            ResourceKind::Certificate => "/apisix/admin/certificates".to_string(),
            ResourceKind::Consumer => "/apisix/admin/consumers".to_string(),
            ResourceKind::Credential => format!(
                "/apisix/admin/consumers/{}/credentials",
                required(kind, "username", username)?
            ),
            ResourceKind::GatewayGroup => "/api/gateway_groups".to_string(),
            ResourceKind::CaCertificate => "/apisix/admin/ca_certificates".to_string(),
            ResourceKind::Sni => "/apisix/admin/snis".to_string(),
            ResourceKind::GlobalRules => "/apisix/admin/global_rules".to_string(),
            ResourceKind::PluginMetadata => "/apisix/admin/plugin_metadata".to_string(),
            ResourceKind::GatewayInstance => {
                if id.is_some() {
                    return Err(ResourceError::ItemLookupUnsupported(kind));
                }
                match group {
                    Some(group) => format!("/api/gateway_groups/{}/instances", group),
                    None => "/api/instances".to_string(),
                }
            }
            ResourceKind::ServiceRegistry => format!(
                "/api/gateway_groups/{}/service_registries",
                required(kind, "gateway_group_id", group)?
            ),
            ResourceKind::CustomPlugin => "/api/custom_plugins".to_string(),
        };

        let req = match id {
            Some(id) => ApiRequest::get(format!("{}/{}", collection, id)),
            None => ApiRequest::get(collection)
                .query_opt("search", non_empty(self.search.as_deref()))
                .query_opt("page", self.page)
                .query_opt("page_size", self.page_size),
        };

        if kind.scoped_by_query() {
            Ok(req.query_opt("gateway_group_id", group))
        } else {
            Ok(req)
        }
    }
}
