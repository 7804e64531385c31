//! API configuration

use serde::Deserialize;
use std::collections::BTreeSet;

use domain_audit::{AuditDomain, AuditError, AuditPolicy};

use crate::error::StartupError;

/// API configuration
#[derive(Debug, Clone, Deserialize)]
pub struct ApiConfig {
    /// Server host
    pub host: String,
    /// Server port
    pub port: u16,
    /// Log level or `EnvFilter` directive
    pub log_level: String,
    /// Optional audit policy file (JSON, TOML or YAML)
    #[serde(default)]
    pub policy_path: Option<String>,
    /// Comma-separated domains audited when a request names none
    #[serde(default)]
    pub default_domains: Option<String>,
    /// Overrides the policy's score cap
    #[serde(default)]
    pub max_score: Option<u32>,
    /// Run domain validators concurrently
    #[serde(default)]
    pub parallel: bool,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            log_level: "info".to_string(),
            policy_path: None,
            default_domains: None,
            max_score: None,
            parallel: false,
        }
    }
}

impl ApiConfig {
    /// Loads configuration from `API_`-prefixed environment variables
    pub fn from_env() -> Result<Self, config::ConfigError> {
        let defaults = Self::default();
        config::Config::builder()
            .set_default("host", defaults.host)?
            .set_default("port", i64::from(defaults.port))?
            .set_default("log_level", defaults.log_level)?
            .set_default("parallel", defaults.parallel)?
            .add_source(config::Environment::with_prefix("API"))
            .build()?
            .try_deserialize()
    }

    /// Returns the server address
    pub fn server_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Domains audited when a request does not name any
    ///
    /// Falls back to every domain when unset or blank.
    pub fn enabled_domains(&self) -> Result<BTreeSet<AuditDomain>, AuditError> {
        match self.default_domains.as_deref() {
            Some(list) if !list.trim().is_empty() => parse_domains(list),
            _ => Ok(AuditDomain::ALL.into_iter().collect()),
        }
    }

    /// Reads the audit policy file, then applies the overrides set here
    pub fn load_policy(&self) -> Result<AuditPolicy, StartupError> {
        let mut policy = match &self.policy_path {
            Some(path) => {
                tracing::info!(path = %path, "Loading audit policy");
                config::Config::builder()
                    .add_source(config::File::with_name(path))
                    .build()?
                    .try_deserialize::<AuditPolicy>()?
            }
            None => AuditPolicy::default(),
        };
        if self.max_score.is_some() {
            policy.scoring.max_score = self.max_score;
        }
        policy.parallel = policy.parallel || self.parallel;
        policy.validate()?;
        Ok(policy)
    }
}

/// Parses a comma-separated domain list such as `"water,flooring"`
///
/// Blank entries are ignored.
pub fn parse_domains(list: &str) -> Result<BTreeSet<AuditDomain>, AuditError> {
    list.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::parse::<AuditDomain>)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_domains() {
        let domains = parse_domains("water, FLR ,,general").unwrap();
        assert_eq!(domains.len(), 3);
        assert!(domains.contains(&AuditDomain::WaterRemediation));
        assert!(domains.contains(&AuditDomain::Flooring));
        assert!(domains.contains(&AuditDomain::GeneralRepair));
    }

    #[test]
    fn test_parse_domains_rejects_unknown() {
        assert!(matches!(
            parse_domains("water,roofing"),
            Err(AuditError::UnknownDomain(_))
        ));
    }

    #[test]
    fn test_default_domains_cover_everything() {
        let config = ApiConfig::default();
        assert_eq!(config.enabled_domains().unwrap().len(), 4);
        assert_eq!(config.server_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_policy_overrides() {
        let config = ApiConfig {
            max_score: Some(100),
            parallel: true,
            ..ApiConfig::default()
        };
        let policy = config.load_policy().unwrap();
        assert_eq!(policy.scoring.max_score, Some(100));
        assert!(policy.parallel);
    }
}
