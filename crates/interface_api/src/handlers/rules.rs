//! Rule catalog handlers

use axum::{extract::State, Json};

use crate::dto::rules::RulesResponse;
use crate::AppState;

/// Lists every registered rule in evaluation order
pub async fn list_rules(State(state): State<AppState>) -> Json<RulesResponse> {
    let rules = state.auditor.rule_descriptors();
    Json(RulesResponse {
        catalog_version: state.auditor.classifier().version().to_string(),
        count: rules.len(),
        rules,
    })
}
