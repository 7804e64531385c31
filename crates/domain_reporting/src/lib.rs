//! Claim Audit Reporting
//!
//! Renders audit scorecards for people and machines and strips personal
//! data from finding text before a scorecard leaves the service.
//!
//! ```text
//! AuditScorecard -> PiiRedactor (optional) -> ScorecardFormatter -> text | JSON
//! ```

pub mod format;
pub mod redaction;
pub mod error;

pub use format::{ReportFormat, RunStamp, ScorecardFormatter};
pub use redaction::{PiiKind, PiiRedactor, RedactionSummary, REDACTED};
pub use error::ReportError;
