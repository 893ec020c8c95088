//! Fixed risk-assessment instructions returned by `check_risk`

/// Checklist and report layout for the assistant
pub const RISK_PROMPT: &str = r#"### Call the API7 MCP tools to inspect the following risk items and output a final risk report.

**Risk Item List:**
#### **Security & Authentication**
1. **Security Plugin Configuration**
   - Data source: Configurations of get_resource routes/services/global rules.
   - MCP tool: get_resource
   - Analysis: Examine all routes (especially those with POST/PUT/DELETE methods or sensitive paths) and services to check if necessary auth plugins (e.g., key-auth, jwt-auth, ldap-auth, openid-connect) are configured. Identify APIs without any authentication.

2. **Weak Authentication Plugin Configurations**
   - Data source: Consumer/auth credential plugin configurations.
   - MCP tool: get_resource
   - AI analysis: Evaluate the security level of configured auth plugins (e.g., key-auth, jwt-auth, openid-connect, ldap-auth).

#### **Data Transmission**
1. **HTTPS Enforcement for APIs**
   - Data source: scheme field in service/upstream configurations, SSL settings.
   - MCP tool: get_resource
   - AI analysis: Verify that all public-facing routes/services enforce SSL, disallow plain HTTP, and check ports (80/443).

2. **SSL Certificate Security**
   - Data source: SSL certificate configurations.
   - MCP tool: get_resource
   - AI analysis: Check for expired/near-expiry certificates, encryption algorithms (e.g., TLS 1.2+), key length, unused SNIs, or orphaned certificates.

3. **Gateway Instance Version Incompatibility**
   - Data source: Gateway instance data.
   - MCP tool: get_resource
   - AI analysis: Detect incompatible gateway versions.

#### **API Access & Rate Limiting Risks**
1. **Sensitive API Rate Limiting (Optional)**
   - Data source: Rate-limiting plugins (e.g., limit-req, limit-count, limit-conn) on routes/services.
   - AI analysis: Assess if sensitive APIs have rate-limiting enabled with reasonable thresholds.

2. **Global Protection Mechanisms (Optional)**
   - Data source: Global rule configurations (e.g., IP whitelist/blacklist, block rules).
   - MCP tool: get_resource
   - AI analysis: Check for foundational protections (e.g., ip-restriction, user-agent-restriction).

3. **Route Conflict Detection**
   - Data source: All route data.
   - MCP tool: get_resource
   - AI analysis: Identify overlaps/conflicts in Host + Path Prefix + Route Path.

4. **Health Check Configuration & Node Status**
   - Data source: Upstream and node data.
   - MCP tool: get_resource
   - AI analysis: Verify health checks for multi-node upstreams and assess node health.

#### **Logging & Auditing Risks**
1. **Logging Completeness**
   - Data source: Log plugin/configurations.
   - MCP tool: get_resource
   - AI analysis: Ensure core routes/services log critical data (e.g., user_id, IP).

2. **Log Leakage Inspection**
   - Data source: Access/error log samples.
   - MCP tool: get_resource
   - AI analysis: Check for sensitive data (e.g., Authorization headers, passwords, IDs) and recommend masking.

#### **Plugin Management**
1. **Duplicate Plugins**
   - Data source: Plugin configurations for routes/services/consumers/global rules.
   - MCP tool: get_resource
   - AI analysis: Detect redundant/conflicting plugins.

2. **Custom Plugin Risks**
   - Data source: Custom plugins or serverless-pre/post-function code snippets.
   - MCP tool: get_resource
   - AI analysis: Static analysis for security risks (e.g., injection, hardcoded secrets) or performance issues.

#### **API Exposure & Sensitive Protection**
1. **Exposed Sensitive/Debug/Admin APIs**
   - Data source: Route/upstream configurations, OpenAPI/Swagger.
   - AI analysis: Flag unsecured endpoints (e.g., /admin, /debug).

#### **Role Management & Compliance**
1. **Permission Granularity & Least Privilege**
   - Data source: Permission policies, role bindings.
   - MCP tools: get_permission_policy, get_permission_policy_by_role, get_role
   - AI analysis:
     - Check for overly permissive policies (e.g., Resources: ["*"], Actions: ["*"]).
     - Validate least privilege adherence and unused/redundant permissions.
     - Detect role conflicts (e.g., a user with both config and audit roles).

#### **Monitoring & Alerts**
1. **Abnormal Traffic & Resource Usage**
   - Data source: Real-time/historical metrics (bandwidth, QPS, concurrent requests).
   - MCP tool: get_prometheus_metrics
   - AI analysis: Identify spikes/drops (e.g., DoS, crawlers) or sustained high resource usage.

2. **Request Anomalies & Error Trends**
   - Data source: Access logs, status codes (2xx/4xx/5xx).
   - MCP tool: get_prometheus_metrics
   - AI analysis: Detect 5xx surges, 4xx spikes (e.g., auth failures), or prolonged API errors.

---

### **Report Structure:**
[Risk Category]
│
├── [Risk Item Name]
│    ├── **Result**: (✅/⚠️/❌/🔴)
│    ├── **Affected Resources**: (Route/service/certificate ID)
│    └── **Recommendation**: (Commands/config examples)
│
├── [Risk Item Name]
│    └── ...

**Result Key:**
- ✅ Passed
- ⚠️ Warning (needs optimization)
- ❌ Failed (requires fixes)
- 🔴 Critical (high risk)

**Affected Resources**: Specify exact routes, services, or plugin IDs.
**Recommendations**: Include plugin names/parameters (e.g., limit-req: {rate=1000})."#;

/// How the assistant should work through the overview
pub const OVERVIEW_GUIDANCE: &str = "
IMPORTANT INSTRUCTION:
1. First analyze the resource overview to identify potential risk areas and problematic resources.
2. Then use the get_resource tool SELECTIVELY to fetch detailed information ONLY for resources that need further investigation.
3. Don't fetch all resources at once - this will cause token limits and reduce analysis quality.
4. If the resource has a large amount of resource overview, ask the user if they want to get a detailed report or just an abbreviated report.
";

/// First text content of a `check_risk` result
pub fn assessment_instructions() -> String {
    format!("{}{}", RISK_PROMPT, OVERVIEW_GUIDANCE)
}

/// Second text content: guidance followed by the pretty-printed overview
pub fn overview_message(overview_json: &str) -> String {
    format!(
        "{}\n Resource Overview (Use this for initial assessment):\n{}",
        OVERVIEW_GUIDANCE, overview_json
    )
}
