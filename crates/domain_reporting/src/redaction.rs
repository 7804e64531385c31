//! PII redaction of finding text
//!
//! Finding titles, messages, evidence values, item codes and
//! recommendations can echo line item descriptions, which sometimes carry
//! an insured's name, phone number or address. The redactor replaces each
//! match with [`REDACTED`] and counts what it removed by kind.
//!
//! Patterns run in a fixed order so longer forms win: a card number is
//! gone before the phone pattern could see part of it.
//!
//! Bare digit runs such as ZIP codes or account numbers are not redacted;
//! they are indistinguishable from the amounts and areas findings quote.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;
use std::cell::RefCell;
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use domain_audit::AuditScorecard;
use crate::error::ReportError;

/// Replacement text for every redacted match
pub const REDACTED: &str = "[REDACTED]";

/// Kind of personal data a pattern detects
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum PiiKind {
    Email,
    CreditCard,
    Ssn,
    Phone,
    DateOfBirth,
    Address,
    Name,
}

impl PiiKind {
    /// Kinds in the order their patterns are applied
    pub const ALL: [PiiKind; 7] = [
        PiiKind::Email,
        PiiKind::CreditCard,
        PiiKind::Ssn,
        PiiKind::Phone,
        PiiKind::DateOfBirth,
        PiiKind::Address,
        PiiKind::Name,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            PiiKind::Email => "email",
            PiiKind::CreditCard => "credit_card",
            PiiKind::Ssn => "ssn",
            PiiKind::Phone => "phone",
            PiiKind::DateOfBirth => "date_of_birth",
            PiiKind::Address => "address",
            PiiKind::Name => "name",
        }
    }

    fn pattern(&self) -> &'static str {
        match self {
            PiiKind::Email => r"\b[A-Za-z0-9._%+-]+@[A-Za-z0-9.-]+\.[A-Za-z]{2,}\b",
            PiiKind::CreditCard => r"\b(?:\d{4}[-\s]){3}\d{4}\b|\b\d{15,16}\b",
            PiiKind::Ssn => r"\b\d{3}-\d{2}-\d{4}\b",
            PiiKind::Phone => r"(?:\+?1[-.\s]?)?(?:\(\d{3}\)\s?|\b\d{3}[-.\s])\d{3}[-.\s]\d{4}\b",
            PiiKind::DateOfBirth => {
                r"\b(?:0?[1-9]|1[0-2])[/-](?:0?[1-9]|[12]\d|3[01])[/-](?:19|20)\d{2}\b"
            }
            PiiKind::Address => {
                r"(?i)\b\d+\s+(?:[A-Za-z0-9]+\s+){1,4}(?:street|st|avenue|ave|road|rd|boulevard|blvd|drive|dr|court|ct|lane|ln|way|circle|cir|place|pl)\b\.?"
            }
            PiiKind::Name => r"\b(?:Mr|Mrs|Ms|Dr|Prof)\.\s+[A-Z][a-z]+(?:\s+[A-Z][a-z]+)?",
        }
    }
}

impl fmt::Display for PiiKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

type CompiledPatterns = Arc<Vec<(PiiKind, Regex)>>;

static PATTERNS: Lazy<Result<CompiledPatterns, regex::Error>> = Lazy::new(|| {
    PiiKind::ALL
        .iter()
        .map(|kind| Regex::new(kind.pattern()).map(|re| (*kind, re)))
        .collect::<Result<Vec<_>, _>>()
        .map(Arc::new)
});

/// Count of redacted matches by kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RedactionSummary {
    counts: BTreeMap<PiiKind, usize>,
}

impl RedactionSummary {
    pub fn count(&self, kind: PiiKind) -> usize {
        self.counts.get(&kind).copied().unwrap_or(0)
    }

    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    pub fn counts(&self) -> &BTreeMap<PiiKind, usize> {
        &self.counts
    }

    fn record(&mut self, kind: PiiKind, n: usize) {
        if n > 0 {
            *self.counts.entry(kind).or_default() += n;
        }
    }

    fn merge(&mut self, other: RedactionSummary) {
        for (kind, n) in other.counts {
            self.record(kind, n);
        }
    }
}

/// Regex-based PII redactor
#[derive(Debug, Clone)]
pub struct PiiRedactor {
    patterns: CompiledPatterns,
    redact_names: bool,
    redact_addresses: bool,
}

impl PiiRedactor {
    /// Redactor with every built-in pattern enabled
    ///
    /// # Errors
    ///
    /// `ReportError::Pattern` if the built-in patterns fail to compile.
    pub fn standard() -> Result<Self, ReportError> {
        let patterns = PATTERNS.as_ref().map_err(|e| ReportError::Pattern(e.clone()))?;
        Ok(Self {
            patterns: Arc::clone(patterns),
            redact_names: true,
            redact_addresses: true,
        })
    }

    /// Leaves titled names in place
    pub fn without_names(mut self) -> Self {
        self.redact_names = false;
        self
    }

    /// Leaves street addresses in place
    pub fn without_addresses(mut self) -> Self {
        self.redact_addresses = false;
        self
    }

    fn enabled(&self, kind: PiiKind) -> bool {
        match kind {
            PiiKind::Name => self.redact_names,
            PiiKind::Address => self.redact_addresses,
            _ => true,
        }
    }

    /// Redacts one string and reports what was removed
    pub fn redact_text(&self, text: &str) -> (String, RedactionSummary) {
        let mut summary = RedactionSummary::default();
        let mut current = text.to_string();
        for (kind, re) in self.patterns.iter().filter(|(kind, _)| self.enabled(*kind)) {
            let hits = re.find_iter(&current).count();
            if hits == 0 {
                continue;
            }
            summary.record(*kind, hits);
            current = re.replace_all(&current, REDACTED).into_owned();
        }
        (current, summary)
    }

    pub fn redact(&self, text: &str) -> String {
        self.redact_text(text).0
    }

    pub fn contains_pii(&self, text: &str) -> bool {
        self.patterns
            .iter()
            .any(|(kind, re)| self.enabled(*kind) && re.is_match(text))
    }

    /// New scorecard with all finding text redacted
    ///
    /// Scores, counts and amounts are unchanged; the copy is flagged
    /// as redacted.
    pub fn redact_scorecard(&self, scorecard: &AuditScorecard) -> (AuditScorecard, RedactionSummary) {
        let summary = RefCell::new(RedactionSummary::default());
        let redacted = scorecard.redact_with(|text| {
            let (clean, found) = self.redact_text(text);
            summary.borrow_mut().merge(found);
            clean
        });
        let summary = summary.into_inner();

        tracing::debug!(
            claim_id = %scorecard.claim_id(),
            redactions = summary.total(),
            "Scorecard redacted"
        );
        (redacted, summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn redactor() -> PiiRedactor {
        PiiRedactor::standard().unwrap()
    }

    #[test]
    fn test_patterns_compile() {
        assert!(PiiRedactor::standard().is_ok());
    }

    #[test]
    fn test_ssn_redacted() {
        let (text, summary) = redactor().redact_text("Insured SSN 123-45-6789 on file");
        assert_eq!(text, "Insured SSN [REDACTED] on file");
        assert_eq!(summary.count(PiiKind::Ssn), 1);
    }

    #[test]
    fn test_email_and_phone_redacted() {
        let (text, summary) = redactor().redact_text("Call (555) 123-4567 or mail jane.doe@example.com");
        assert!(!text.contains("555"));
        assert!(!text.contains("example.com"));
        assert_eq!(summary.count(PiiKind::Phone), 1);
        assert_eq!(summary.count(PiiKind::Email), 1);
    }

    #[test]
    fn test_card_wins_over_phone() {
        let (text, summary) = redactor().redact_text("Card 4111 1111 1111 1111");
        assert_eq!(text, "Card [REDACTED]");
        assert_eq!(summary.count(PiiKind::CreditCard), 1);
        assert_eq!(summary.count(PiiKind::Phone), 0);
    }

    #[test]
    fn test_address_and_name_toggles() {
        let text = "Mr. John Smith at 123 Main Street";
        let full = redactor().redact(text);
        assert_eq!(full, "[REDACTED] at [REDACTED]");

        let partial = redactor().without_names().without_addresses().redact(text);
        assert_eq!(partial, text);
    }

    #[test]
    fn test_amounts_and_areas_survive() {
        let text = "12 Air Mover units billed for Living Room (300 sqft) where 3 are required; excess $315.00 of $15000.00";
        assert_eq!(redactor().redact(text), text);
        assert!(!redactor().contains_pii(text));
    }

    #[test]
    fn test_date_of_birth_redacted() {
        let (_, summary) = redactor().redact_text("DOB 04/12/1961");
        assert_eq!(summary.count(PiiKind::DateOfBirth), 1);
    }
}
