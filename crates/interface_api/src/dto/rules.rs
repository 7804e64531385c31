//! Rule listing DTOs

use serde::Serialize;

use domain_audit::RuleDescriptor;

#[derive(Debug, Serialize)]
pub struct RulesResponse {
    pub catalog_version: String,
    pub count: usize,
    pub rules: Vec<RuleDescriptor>,
}
