//! HTTP API Layer
//!
//! This crate exposes the claim audit engine over HTTP using Axum.
//!
//! # Routes
//!
//! - `GET /health`: liveness and number of loaded rules
//! - `GET /api/v1/rules`: registered rules in evaluation order
//! - `POST /api/v1/audits?domains=&redact=&format=`: audit one claim record
//!
//! # Example
//!
//! ```rust,ignore
//! use interface_api::{create_router, AppState};
//!
//! let state = AppState::from_config(config)?;
//! axum::serve(listener, create_router(state)).await?;
//! ```

pub mod config;
pub mod error;
pub mod middleware;
pub mod handlers;
pub mod dto;

use axum::{
    middleware as axum_middleware,
    routing::{get, post},
    Router,
};
use std::collections::BTreeSet;
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer};
use tower_http::trace::TraceLayer;

use domain_audit::{AuditDomain, ClaimAuditor};
use domain_reporting::PiiRedactor;

use crate::config::ApiConfig;
use crate::error::StartupError;
use crate::handlers::{audits, health, rules};
use crate::middleware::{access_log_middleware, REQUEST_ID_HEADER};

/// Application state shared across handlers
#[derive(Clone)]
pub struct AppState {
    pub auditor: Arc<ClaimAuditor>,
    pub redactor: Arc<PiiRedactor>,
    pub default_domains: Arc<BTreeSet<AuditDomain>>,
    pub config: ApiConfig,
}

impl AppState {
    /// Builds the auditor and redactor described by the configuration
    ///
    /// # Errors
    ///
    /// Fails on an unreadable or invalid policy, an unknown default domain,
    /// or a rule set that cannot be registered.
    pub fn from_config(config: ApiConfig) -> Result<Self, StartupError> {
        let policy = config.load_policy()?;
        let auditor = ClaimAuditor::new(&policy)?;
        let default_domains = config.enabled_domains()?;
        tracing::info!(
            rules = auditor.rule_descriptors().len(),
            domains = default_domains.len(),
            parallel = policy.parallel,
            "Audit engine ready"
        );
        Ok(Self {
            auditor: Arc::new(auditor),
            redactor: Arc::new(PiiRedactor::standard()?),
            default_domains: Arc::new(default_domains),
            config,
        })
    }
}

/// Creates the main API router
pub fn create_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/rules", get(rules::list_rules))
        .route("/audits", post(audits::run_audit))
        .layer(axum_middleware::from_fn(access_log_middleware));

    let request_id = axum::http::HeaderName::from_static(REQUEST_ID_HEADER);

    Router::new()
        .route("/health", get(health::health_check))
        .nest("/api/v1", api_routes)
        .layer(TraceLayer::new_for_http())
        .layer(PropagateRequestIdLayer::new(request_id.clone()))
        .layer(SetRequestIdLayer::new(request_id, MakeRequestUuid))
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
