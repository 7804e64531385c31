//! Unit tests for the Identifiers module
//!
//! Tests cover claim/rule code validation, serde behaviour, and audit run
//! id creation and parsing.

use core_kernel::{AuditRunId, ClaimId, IdentifierError, RuleId};
use uuid::Uuid;

mod claim_id_tests {
    use super::*;

    #[test]
    fn test_parse_valid_claim_number() {
        let id = ClaimId::parse("CLM-2024-WTR-001").unwrap();
        assert_eq!(id.to_string(), "CLM-2024-WTR-001");
    }

    #[test]
    fn test_parse_rejects_blank() {
        let result = ClaimId::parse("   ");
        assert!(matches!(result, Err(IdentifierError::Empty { .. })));
    }

    #[test]
    fn test_parse_rejects_inner_whitespace() {
        let result = ClaimId::parse("CLM 001");
        assert!(matches!(result, Err(IdentifierError::InvalidCharacters { .. })));
    }

    #[test]
    fn test_serde_is_transparent_string() {
        let id = ClaimId::parse("TEST-CLM-001").unwrap();
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"TEST-CLM-001\"");

        let back: ClaimId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn test_deserialize_rejects_empty_string() {
        let result: Result<ClaimId, _> = serde_json::from_str("\"\"");
        assert!(result.is_err());
    }
}

mod rule_id_tests {
    use super::*;

    #[test]
    fn test_namespace_of_prefixed_id() {
        assert_eq!(RuleId::parse("FLR-002").unwrap().namespace(), "FLR");
    }

    #[test]
    fn test_namespace_of_unprefixed_id() {
        assert_eq!(RuleId::parse("CUSTOM").unwrap().namespace(), "CUSTOM");
    }

    #[test]
    fn test_rule_id_is_upper_cased() {
        let id = RuleId::parse(" wtr-006 ").unwrap();
        assert_eq!(id.as_str(), "WTR-006");
        assert_eq!(id, RuleId::parse("WTR-006").unwrap());
        assert_eq!(id.namespace(), "WTR");
    }

    #[test]
    fn test_rule_id_deserializes_upper_cased() {
        let id: RuleId = serde_json::from_str("\"flr-002\"").unwrap();
        assert_eq!(id.as_str(), "FLR-002");
    }

    #[test]
    fn test_claim_id_keeps_its_case() {
        assert_eq!(ClaimId::parse("clm-2024-a").unwrap().as_str(), "clm-2024-a");
    }

    #[test]
    fn test_rule_ids_order_lexically() {
        let a = RuleId::parse("WTR-001").unwrap();
        let b = RuleId::parse("WTR-006").unwrap();
        assert!(a < b);
    }
}

mod audit_run_id_tests {
    use super::*;

    #[test]
    fn test_new_v7_generates_unique_ids() {
        assert_ne!(AuditRunId::new_v7(), AuditRunId::new_v7());
    }

    #[test]
    fn test_display_format() {
        let id = AuditRunId::new();
        assert!(id.to_string().starts_with("AUD-"));
        assert_eq!(AuditRunId::prefix(), "AUD");
    }

    #[test]
    fn test_from_str_without_prefix() {
        let uuid = Uuid::new_v4();
        let parsed: AuditRunId = uuid.to_string().parse().unwrap();
        assert_eq!(*parsed.as_uuid(), uuid);
    }

    #[test]
    fn test_from_str_invalid() {
        let result: Result<AuditRunId, _> = "AUD-not-a-uuid".parse();
        assert!(matches!(result, Err(IdentifierError::Uuid(_))));
    }
}
