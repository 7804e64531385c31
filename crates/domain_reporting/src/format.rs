//! Scorecard rendering
//!
//! The text report is a fixed-width summary followed by one section per
//! finding category. The HTML report is a self-contained fragment with the
//! same sections and inline styles. JSON output is the scorecard's own
//! serde shape, optionally wrapped with the audit run stamp.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::Serialize;
use std::fmt::Write;
use std::str::FromStr;

use core_kernel::{AuditRunId, Currency, Money};
use domain_audit::{AuditCategory, AuditFinding, AuditScorecard, AuditSeverity};
use crate::error::ReportError;

const RULE: usize = 70;
const MAX_ITEMS: usize = 5;

/// Output format of a rendered scorecard
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ReportFormat {
    #[default]
    Json,
    Text,
    Html,
}

impl ReportFormat {
    /// HTTP content type of a rendered report
    pub fn content_type(&self) -> &'static str {
        match self {
            ReportFormat::Json => "application/json",
            ReportFormat::Text => "text/plain; charset=utf-8",
            ReportFormat::Html => "text/html; charset=utf-8",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = ReportError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "json" => Ok(ReportFormat::Json),
            "text" | "txt" => Ok(ReportFormat::Text),
            "html" | "htm" => Ok(ReportFormat::Html),
            _ => Err(ReportError::UnknownFormat(s.to_string())),
        }
    }
}

/// Identity of one audit execution, kept outside the scorecard
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunStamp {
    pub run_id: AuditRunId,
    pub audited_at: DateTime<Utc>,
}

impl RunStamp {
    pub fn now() -> Self {
        Self {
            run_id: AuditRunId::new_v7(),
            audited_at: Utc::now(),
        }
    }
}

#[derive(Serialize)]
struct Envelope<'a> {
    #[serde(flatten)]
    run: &'a RunStamp,
    scorecard: &'a AuditScorecard,
}

/// Renders a scorecard as text or JSON
pub struct ScorecardFormatter<'a> {
    scorecard: &'a AuditScorecard,
    run: Option<&'a RunStamp>,
    include_details: bool,
}

impl<'a> ScorecardFormatter<'a> {
    pub fn new(scorecard: &'a AuditScorecard) -> Self {
        Self {
            scorecard,
            run: None,
            include_details: true,
        }
    }

    /// Prints the run id and audit time in the header
    pub fn with_run(mut self, run: &'a RunStamp) -> Self {
        self.run = Some(run);
        self
    }

    /// Summary only, without per-finding sections
    pub fn summary_only(mut self) -> Self {
        self.include_details = false;
        self
    }

    pub fn render(&self, format: ReportFormat) -> Result<String, ReportError> {
        match format {
            ReportFormat::Json => self.to_json(),
            ReportFormat::Text => Ok(self.to_text()),
            ReportFormat::Html => Ok(self.to_html()),
        }
    }

    /// Pretty JSON; wrapped with the run stamp when one is attached
    pub fn to_json(&self) -> Result<String, ReportError> {
        let json = match self.run {
            Some(run) => serde_json::to_string_pretty(&Envelope {
                run,
                scorecard: self.scorecard,
            })?,
            None => serde_json::to_string_pretty(self.scorecard)?,
        };
        Ok(json)
    }

    pub fn to_text(&self) -> String {
        let card = self.scorecard;
        let mut out = String::new();
        let heavy = "=".repeat(RULE);
        let light = "-".repeat(RULE);

        line(&mut out, &heavy);
        line(&mut out, "CLAIM INTEGRITY AUDIT SCORECARD");
        line(&mut out, &heavy);
        line(&mut out, "");
        line(&mut out, &format!("Claim ID: {}", card.claim_id()));
        if let Some(run) = self.run {
            line(&mut out, &format!("Audit Run: {}", run.run_id));
            line(
                &mut out,
                &format!("Audit Date: {}", run.audited_at.format("%Y-%m-%d %H:%M:%S UTC")),
            );
        }
        if card.is_redacted() {
            line(&mut out, "*** PII REDACTED FOR COMPLIANCE ***");
        }
        line(&mut out, "");

        line(&mut out, &light);
        line(&mut out, "SUMMARY");
        line(&mut out, &light);
        line(&mut out, &format!("Total Findings: {}", card.findings().len()));
        for category in AuditCategory::ALL {
            let count = card.category_counts().get(&category).copied().unwrap_or(0);
            line(&mut out, &format!("  - {}: {count}", category.label()));
        }
        line(&mut out, "");
        let currency = self.currency();
        line(
            &mut out,
            &format!("Potential Leakage Amount: {}", money(card.total_potential_leakage(), currency)),
        );
        line(
            &mut out,
            &format!("Potential Supplement Risk: {}", money(card.total_supplement_risk(), currency)),
        );
        let score = if card.risk_score() == card.raw_score() {
            format!("Risk Score: {}", card.risk_score())
        } else {
            format!("Risk Score: {} (uncapped {})", card.risk_score(), card.raw_score())
        };
        line(&mut out, &score);
        if let Some(summary) = card.claim_summary() {
            line(
                &mut out,
                &format!(
                    "Line Items: {} ({} unclassified)",
                    summary.line_items, summary.unknown_items
                ),
            );
        }
        line(&mut out, "");

        if !card.domains_executed().is_empty() {
            let labels: Vec<&str> = card.domains_executed().iter().map(|d| d.label()).collect();
            line(&mut out, &format!("Modules Executed: {}", labels.join(", ")));
            line(&mut out, "");
        }

        if self.include_details {
            for category in AuditCategory::ALL {
                let findings: Vec<&AuditFinding> = card.findings_in_category(category).collect();
                if findings.is_empty() {
                    continue;
                }
                line(&mut out, &light);
                line(&mut out, section_title(category));
                line(&mut out, &light);
                for finding in findings {
                    line(&mut out, "");
                    write_finding(&mut out, finding, currency);
                }
                line(&mut out, "");
            }
        }

        line(&mut out, &heavy);
        line(&mut out, "END OF REPORT");
        out.push_str(&heavy);
        out
    }

    /// Self-contained HTML fragment; all finding text is escaped
    pub fn to_html(&self) -> String {
        let card = self.scorecard;
        let currency = self.currency();
        let mut out = String::new();

        line(&mut out, r#"<div class="audit-scorecard" style="font-family: Arial, sans-serif; max-width: 900px; margin: 0 auto;">"#);
        line(&mut out, "<style>");
        line(&mut out, ".finding-card { border: 1px solid #ddd; border-radius: 4px; margin: 10px 0; padding: 15px; }");
        line(&mut out, ".summary-box { background: #f8f9fa; padding: 20px; border-radius: 4px; margin: 20px 0; }");
        line(&mut out, ".metric { display: inline-block; margin-right: 30px; }");
        line(&mut out, ".metric-value { font-size: 24px; font-weight: bold; }");
        line(&mut out, ".metric-label { color: #666; font-size: 12px; }");
        line(&mut out, "</style>");
        line(&mut out, "<h1>Claim Integrity Audit Scorecard</h1>");
        line(
            &mut out,
            &format!("<p><strong>Claim ID:</strong> {}</p>", escape_html(card.claim_id().as_str())),
        );
        if let Some(run) = self.run {
            line(&mut out, &format!("<p><strong>Audit Run:</strong> {}</p>", run.run_id));
            line(
                &mut out,
                &format!(
                    "<p><strong>Audit Date:</strong> {}</p>",
                    run.audited_at.format("%Y-%m-%d %H:%M:%S UTC")
                ),
            );
        }
        if card.is_redacted() {
            line(
                &mut out,
                r#"<p class="redacted" style="color: #dc3545;"><strong>PII REDACTED FOR COMPLIANCE</strong></p>"#,
            );
        }

        line(&mut out, r#"<div class="summary-box">"#);
        line(&mut out, "<h2>Summary</h2>");
        metric(&mut out, &card.findings().len().to_string(), "Total Findings");
        metric(&mut out, &money(card.total_potential_leakage(), currency), "Potential Leakage");
        metric(&mut out, &money(card.total_supplement_risk(), currency), "Supplement Risk");
        metric(&mut out, &card.risk_score().to_string(), "Risk Score");
        line(&mut out, "</div>");

        if !card.domains_executed().is_empty() {
            let labels: Vec<&str> = card.domains_executed().iter().map(|d| d.label()).collect();
            line(
                &mut out,
                &format!("<p><strong>Modules Executed:</strong> {}</p>", escape_html(&labels.join(", "))),
            );
        }

        if self.include_details {
            for category in AuditCategory::ALL {
                let findings: Vec<&AuditFinding> = card.findings_in_category(category).collect();
                if findings.is_empty() {
                    continue;
                }
                line(&mut out, &format!("<h2>{}</h2>", section_title(category)));
                for finding in findings {
                    write_finding_html(&mut out, finding, currency);
                }
            }
        }

        out.push_str("</div>");
        out
    }

    fn currency(&self) -> Currency {
        self.scorecard
            .claim_summary()
            .map(|s| s.gross.currency())
            .unwrap_or_default()
    }
}

fn section_title(category: AuditCategory) -> &'static str {
    match category {
        AuditCategory::Financial => "FINANCIAL VALIDATION",
        AuditCategory::Leakage => "POTENTIAL LEAKAGE",
        AuditCategory::SupplementRisk => "SUPPLEMENT RISK",
    }
}

fn write_finding(out: &mut String, finding: &AuditFinding, currency: Currency) {
    line(
        out,
        &format!("[{}] {} ({})", finding.severity().label(), finding.title(), finding.rule_id()),
    );
    line(out, &format!("   Rule: {}", finding.rule_name()));
    line(out, &format!("   {}", finding.message()));
    if let Some(delta) = finding.delta() {
        line(out, &format!("   Potential Impact: {}", money(delta, currency)));
    }
    if !finding.items().is_empty() {
        line(out, "   Affected Items:");
        for item in finding.items().iter().take(MAX_ITEMS) {
            line(out, &format!("     - #{} {}", item.index + 1, item.code));
        }
        if finding.items().len() > MAX_ITEMS {
            line(out, &format!("     ... and {} more", finding.items().len() - MAX_ITEMS));
        }
    }
    if let Some(recommendation) = finding.recommendation() {
        line(out, &format!("   Recommendation: {recommendation}"));
    }
}

fn severity_color(severity: AuditSeverity) -> &'static str {
    match severity {
        AuditSeverity::Info => "#17a2b8",
        AuditSeverity::Warning => "#ffc107",
        AuditSeverity::Error => "#dc3545",
        AuditSeverity::Critical => "#721c24",
    }
}

fn metric(out: &mut String, value: &str, label: &str) {
    line(
        out,
        &format!(
            r#"<div class="metric"><div class="metric-value">{}</div><div class="metric-label">{label}</div></div>"#,
            escape_html(value)
        ),
    );
}

fn write_finding_html(out: &mut String, finding: &AuditFinding, currency: Currency) {
    let color = severity_color(finding.severity());
    line(
        out,
        &format!(r#"<div class="finding-card" style="border-left: 4px solid {color};">"#),
    );
    line(
        out,
        &format!(
            r#"<h3 style="margin-top: 0; color: {color};">[{}] {} ({})</h3>"#,
            finding.severity().label(),
            escape_html(finding.title()),
            finding.rule_id()
        ),
    );
    line(out, &format!("<p><em>{}</em></p>", escape_html(finding.rule_name())));
    line(out, &format!("<p>{}</p>", escape_html(finding.message())));
    if let Some(delta) = finding.delta() {
        line(
            out,
            &format!("<p><strong>Potential Impact:</strong> {}</p>", escape_html(&money(delta, currency))),
        );
    }
    if !finding.items().is_empty() {
        line(out, "<ul>");
        for item in finding.items().iter().take(MAX_ITEMS) {
            line(out, &format!("<li>#{} {}</li>", item.index + 1, escape_html(&item.code)));
        }
        if finding.items().len() > MAX_ITEMS {
            line(out, &format!("<li>... and {} more</li>", finding.items().len() - MAX_ITEMS));
        }
        line(out, "</ul>");
    }
    if let Some(recommendation) = finding.recommendation() {
        line(
            out,
            &format!("<p><strong>Recommendation:</strong> {}</p>", escape_html(recommendation)),
        );
    }
    line(out, "</div>");
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#39;")
}

fn money(amount: Decimal, currency: Currency) -> String {
    Money::new(amount, currency).to_string()
}

fn line(out: &mut String, text: &str) {
    // Writing to a String cannot fail
    let _ = writeln!(out, "{text}");
}
