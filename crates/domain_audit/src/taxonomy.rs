//! Finding categories, severities and audit domains

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::AuditError;

/// What kind of problem a finding reports
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditCategory {
    /// Policy limit, deductible or arithmetic problems
    Financial,
    /// Overpayment risk in the billed scope
    Leakage,
    /// Likely-missing scope that will come back as a supplement
    SupplementRisk,
}

impl AuditCategory {
    pub const ALL: [AuditCategory; 3] = [
        AuditCategory::Financial,
        AuditCategory::Leakage,
        AuditCategory::SupplementRisk,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            AuditCategory::Financial => "Financial",
            AuditCategory::Leakage => "Leakage",
            AuditCategory::SupplementRisk => "Supplement Risk",
        }
    }
}

impl fmt::Display for AuditCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Finding severity, totally ordered by weight
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AuditSeverity {
    Info,
    Warning,
    Error,
    Critical,
}

impl AuditSeverity {
    pub const ALL: [AuditSeverity; 4] = [
        AuditSeverity::Info,
        AuditSeverity::Warning,
        AuditSeverity::Error,
        AuditSeverity::Critical,
    ];

    /// Contribution of one finding to the risk score
    pub fn weight(&self) -> u32 {
        match self {
            AuditSeverity::Info => 5,
            AuditSeverity::Warning => 15,
            AuditSeverity::Error => 30,
            AuditSeverity::Critical => 50,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            AuditSeverity::Info => "INFO",
            AuditSeverity::Warning => "WARNING",
            AuditSeverity::Error => "ERROR",
            AuditSeverity::Critical => "CRITICAL",
        }
    }
}

impl fmt::Display for AuditSeverity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Audit domains, declared in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditDomain {
    Financial,
    WaterRemediation,
    Flooring,
    GeneralRepair,
}

impl AuditDomain {
    /// All domains in phase order
    pub const ALL: [AuditDomain; 4] = [
        AuditDomain::Financial,
        AuditDomain::WaterRemediation,
        AuditDomain::Flooring,
        AuditDomain::GeneralRepair,
    ];

    /// Human-readable module name used in reports
    pub fn label(&self) -> &'static str {
        match self {
            AuditDomain::Financial => "Financial Validation",
            AuditDomain::WaterRemediation => "Water Remediation (WTR)",
            AuditDomain::Flooring => "Flooring (FCC/FNC)",
            AuditDomain::GeneralRepair => "General Repair",
        }
    }

    /// Rule id namespace of the domain
    pub fn rule_prefix(&self) -> &'static str {
        match self {
            AuditDomain::Financial => "FIN",
            AuditDomain::WaterRemediation => "WTR",
            AuditDomain::Flooring => "FLR",
            AuditDomain::GeneralRepair => "GEN",
        }
    }

    pub fn key(&self) -> &'static str {
        match self {
            AuditDomain::Financial => "financial",
            AuditDomain::WaterRemediation => "water_remediation",
            AuditDomain::Flooring => "flooring",
            AuditDomain::GeneralRepair => "general_repair",
        }
    }
}

impl fmt::Display for AuditDomain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl FromStr for AuditDomain {
    type Err = AuditError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace(['-', ' '], "_").as_str() {
            "financial" | "fin" => Ok(AuditDomain::Financial),
            "water" | "water_remediation" | "wtr" => Ok(AuditDomain::WaterRemediation),
            "flooring" | "flr" => Ok(AuditDomain::Flooring),
            "general" | "general_repair" | "gen" => Ok(AuditDomain::GeneralRepair),
            _ => Err(AuditError::UnknownDomain(s.to_string())),
        }
    }
}
