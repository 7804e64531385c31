//! Audit handlers

use std::sync::Arc;

use axum::{
    extract::{Query, State},
    http::header,
    response::{IntoResponse, Response},
    Json,
};

use domain_claims::{ClaimData, ClaimRecord};
use domain_reporting::{ReportFormat, RunStamp, ScorecardFormatter};

use crate::config::parse_domains;
use crate::dto::audits::{AuditQuery, AuditResponse};
use crate::{error::ApiError, AppState};

/// Audits one claim record
///
/// The record is validated as a whole before any rule runs. The audit and
/// redaction run on the blocking pool. With `format=text` or `format=html`
/// the rendered report is returned instead of JSON.
pub async fn run_audit(
    State(state): State<AppState>,
    Query(query): Query<AuditQuery>,
    Json(record): Json<ClaimRecord>,
) -> Result<Response, ApiError> {
    let format = match query.format.as_deref() {
        Some(raw) => raw.parse::<ReportFormat>()?,
        None => ReportFormat::default(),
    };
    let domains = match query.domains.as_deref() {
        Some(list) if !list.trim().is_empty() => parse_domains(list)?,
        _ => state.default_domains.as_ref().clone(),
    };

    let claim = ClaimData::try_from(record)?;
    let run = RunStamp::now();
    tracing::info!(
        run_id = %run.run_id,
        claim_id = %claim.claim_id(),
        domains = domains.len(),
        redact = query.redact,
        "Audit requested"
    );

    let auditor = Arc::clone(&state.auditor);
    let redactor = Arc::clone(&state.redactor);
    let redact = query.redact;
    let (scorecard, redactions) = tokio::task::spawn_blocking(move || {
        let scorecard = auditor.audit(&claim, &domains);
        if redact {
            let (redacted, summary) = redactor.redact_scorecard(&scorecard);
            (redacted, Some(summary))
        } else {
            (scorecard, None)
        }
    })
    .await
    .map_err(|e| ApiError::Internal(format!("Audit task failed: {e}")))?;

    let response = match format {
        ReportFormat::Json => Json(AuditResponse {
            run,
            redactions,
            scorecard,
        })
        .into_response(),
        ReportFormat::Text | ReportFormat::Html => {
            let body = ScorecardFormatter::new(&scorecard).with_run(&run).render(format)?;
            ([(header::CONTENT_TYPE, format.content_type())], body).into_response()
        }
    };
    Ok(response)
}
