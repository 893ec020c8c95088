//! Risk assessment: fixed review instructions plus a live resource overview

mod overview;
mod prompt;

pub use overview::{
    CertificateSummary, ConsumerSummary, CredentialSummary, GatewayGroupSummary,
    GlobalRuleSummary, HealthChecks, NamedEntry, ResourceOverview, RouteSummary, ServiceSummary,
    UpstreamSummary, collect_overview,
};
pub use prompt::{OVERVIEW_GUIDANCE, RISK_PROMPT, assessment_instructions, overview_message};
