use std::fmt;

/// Gateway resource families reachable through `get_resource`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceKind {
    PublishedService,
    Upstream,
    ServiceTemplate,
    Route,
    StreamRoute,
    SecretProvider,
    Certificate,
    Consumer,
    Credential,
    GatewayGroup,
    CaCertificate,
    Sni,
    GlobalRules,
    PluginMetadata,
    GatewayInstance,
    ServiceRegistry,
    CustomPlugin,
}

impl ResourceKind {
    pub const ALL: [ResourceKind; 17] = [
        ResourceKind::PublishedService,
        ResourceKind::Upstream,
        ResourceKind::ServiceTemplate,
        ResourceKind::Route,
        ResourceKind::StreamRoute,
        ResourceKind::SecretProvider,
        ResourceKind::Certificate,
        ResourceKind::Consumer,
        ResourceKind::Credential,
        ResourceKind::GatewayGroup,
        ResourceKind::CaCertificate,
        ResourceKind::Sni,
        ResourceKind::GlobalRules,
        ResourceKind::PluginMetadata,
        ResourceKind::GatewayInstance,
        ResourceKind::ServiceRegistry,
        ResourceKind::CustomPlugin,
    ];

    /// Input key of the kind in the `get_resource` arguments
    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceKind::PublishedService => "publishedService",
            ResourceKind::Upstream => "upstream",
            ResourceKind::ServiceTemplate => "serviceTemplate",
            ResourceKind::Route => "route",
            ResourceKind::StreamRoute => "stream_route",
            ResourceKind::SecretProvider => "secretProvider",
            ResourceKind::Certificate => "certificate",
            ResourceKind::Consumer => "consumer",
            ResourceKind::Credential => "credential",
            ResourceKind::GatewayGroup => "gatewayGroup",
            ResourceKind::CaCertificate => "caCertificate",
            ResourceKind::Sni => "sni",
            ResourceKind::GlobalRules => "globalRules",
            ResourceKind::PluginMetadata => "pluginMetadata",
            ResourceKind::GatewayInstance => "gatewayInstance",
            ResourceKind::ServiceRegistry => "serviceRegistry",
            ResourceKind::CustomPlugin => "customPlugin",
        }
    }

    /// Whether the admin API scopes this kind by a `gateway_group_id` query parameter
    pub fn scoped_by_query(&self) -> bool {
        !matches!(
            self,
            ResourceKind::ServiceTemplate
                | ResourceKind::GatewayGroup
                | ResourceKind::GatewayInstance
                | ResourceKind::ServiceRegistry
        )
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
