// =============================================================================
// Application Identity
// =============================================================================

/// Application name in lowercase (for paths, identifiers and the MCP server info)
pub const APP_NAME_LOWER: &str = "api7-mcp";

/// Crate name as it appears in tracing targets
pub const LOG_TARGET: &str = "api7_mcp_server";

/// Unix-style dotfile folder name
pub const APP_DOT_FOLDER: &str = ".api7-mcp";

// =============================================================================
// Configuration Files
// =============================================================================

/// Config file name
pub const CONFIG_FILE_NAME: &str = "api7-mcp.json";

/// Environment variable for config file path
pub const ENV_CONFIG: &str = "API7_MCP_CONFIG";

/// Environment variable for log level/filter
pub const ENV_LOG: &str = "API7_MCP_LOG";

// =============================================================================
// Environment Variables - Control Plane
// =============================================================================

/// Base address of the control plane, e.g. `https://api7.example.com:7443`
pub const ENV_CONTROL_PLANE_ADDRESS: &str = "API7_CONTROL_PLANE_ADDRESS";

/// Access token sent with every control-plane request
pub const ENV_TOKEN: &str = "API7_TOKEN";

/// Dashboard base URL used for console links
pub const ENV_DASHBOARD_URL: &str = "API7_DASHBOARD_URL";

/// Control-plane request timeout in seconds
pub const ENV_REQUEST_TIMEOUT: &str = "API7_REQUEST_TIMEOUT";

/// IANA timezone for rendering metric timestamps
pub const ENV_TIMEZONE: &str = "API7_MCP_TIMEZONE";

// =============================================================================
// Environment Variables - HTTP Transport
// =============================================================================

pub const ENV_HOST: &str = "API7_MCP_HOST";
pub const ENV_PORT: &str = "API7_MCP_PORT";

// =============================================================================
// Defaults
// =============================================================================

/// Default HTTP transport host
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Default HTTP transport port
pub const DEFAULT_PORT: u16 = 5390;

/// Default control-plane request timeout
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Default timezone for metric timestamps
pub const DEFAULT_TIMEZONE: &str = "UTC";

/// Mount path of the streamable HTTP MCP endpoint
pub const MCP_HTTP_PATH: &str = "/mcp";

// =============================================================================
// Control Plane API
// =============================================================================

/// Header carrying the access token
pub const API_KEY_HEADER: &str = "X-API-KEY";

/// Prefix of the Prometheus proxy exposed by the control plane
pub const PROMETHEUS_PROXY_PATH: &str = "/api/control_plane/prometheus";

/// Instant query endpoint (relative to the Prometheus proxy)
pub const PROMETHEUS_QUERY_PATH: &str = "/api/v1/query";

/// Range query endpoint (relative to the Prometheus proxy)
pub const PROMETHEUS_QUERY_RANGE_PATH: &str = "/api/v1/query_range";

// =============================================================================
// Metrics
// =============================================================================

/// Upper bound on samples per ranged series
pub const MAX_DATA_POINTS: u64 = 5000;

/// Default relative time range for metric queries
pub const DEFAULT_RAW_TIME: &str = "15m";

/// Step used when nothing else applies
pub const DEFAULT_STEP: &str = "15s";

/// Group key used when a series carries none of the grouping labels
pub const ALL_RESOURCES_GROUP: &str = "all-resources";

/// Timestamp format for metric samples
pub const SAMPLE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";

// =============================================================================
// Shutdown
// =============================================================================

/// Maximum seconds to wait for the HTTP transport to drain
pub const SHUTDOWN_TIMEOUT_SECS: u64 = 10;
