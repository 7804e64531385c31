//! Audit DTOs

use serde::{Deserialize, Serialize};

use domain_audit::AuditScorecard;
use domain_reporting::{RedactionSummary, RunStamp};

/// Query string of `POST /api/v1/audits`
#[derive(Debug, Default, Deserialize)]
pub struct AuditQuery {
    /// Comma-separated domains, e.g. `water,flooring`
    pub domains: Option<String>,
    /// Redact PII from finding text
    #[serde(default)]
    pub redact: bool,
    /// `json` (default), `text` or `html`
    pub format: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct AuditResponse {
    #[serde(flatten)]
    pub run: RunStamp,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub redactions: Option<RedactionSummary>,
    pub scorecard: AuditScorecard,
}
