//! Risk sentinel: a single LLM audit call with deterministic short-circuits
//! and an optional deterministic post-scorer that can override the LLM's
//! own verdict.

use serde::Deserialize;
use serde_json::Value;

use crate::domain::NO_DOCUMENTS_MARKER;
use crate::error::Result;
use crate::llm::{Llm, Message, parse_json_response};

/// Risk severity level.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RiskLevel {
    /// No material concerns identified.
    Low,
    /// Minor issues worth tracking.
    Medium,
    /// Significant issues requiring review.
    High,
    /// Blocking issues.
    Critical,
}

impl RiskLevel {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        }
    }
}

/// Compliance gate status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ComplianceStatus {
    /// Cleared to proceed.
    Approved,
    /// Needs human review before proceeding.
    Pending,
    /// Blocked.
    Rejected,
}

impl ComplianceStatus {
    /// Wire representation.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Approved => "approved",
            Self::Pending => "pending",
            Self::Rejected => "rejected",
        }
    }
}

/// Severity of an individual risk factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Severity {
    /// Negligible.
    Low,
    /// Noteworthy.
    Medium,
    /// Serious.
    High,
    /// Severe, potentially blocking.
    Critical,
}

impl Severity {
    fn coerce(raw: &str) -> Self {
        match raw.trim().to_uppercase().as_str() {
            "HIGH" => Self::High,
            "CRITICAL" => Self::Critical,
            "MEDIUM" => Self::Medium,
            _ => Self::Low,
        }
    }

    const fn weight(self) -> f64 {
        match self {
            Self::Low => 5.0,
            Self::Medium => 15.0,
            Self::High => 30.0,
            Self::Critical => 50.0,
        }
    }
}

/// Category of an individual risk factor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RiskCategory {
    /// Financial risk.
    Financial,
    /// Legal/contractual risk.
    Legal,
    /// Technical/architectural risk.
    Technical,
    /// Schedule risk.
    Timeline,
    /// Requirements-compliance risk.
    Requirements,
    /// Reputational risk.
    Reputation,
}

impl RiskCategory {
    fn coerce(raw: &str) -> Self {
        match raw.trim().to_lowercase().as_str() {
            "legal" => Self::Legal,
            "technical" => Self::Technical,
            "timeline" => Self::Timeline,
            "requirements" => Self::Requirements,
            "reputation" => Self::Reputation,
            _ => Self::Financial,
        }
    }
}

/// A single typed risk factor, coerced from the audit LLM's raw JSON.
#[derive(Debug, Clone)]
pub struct RiskFactor {
    /// Severity of this factor.
    pub severity: Severity,
    /// Category this factor falls under.
    pub category: RiskCategory,
    /// Probability (0.0..=1.0) the audit LLM assigned, defaulting to 0.5.
    pub probability: f64,
}

/// GO/REVIEW/NO_GO recommendation produced by a [`RiskScorer`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Recommendation {
    /// Proceed.
    Go,
    /// Proceed with caution / human review.
    Review,
    /// Do not proceed.
    NoGo,
}

/// Deterministic risk-scoring skill: turns typed risk factors into a 0-100
/// score and a GO/REVIEW/NO_GO recommendation.
pub trait RiskScorer: Send + Sync {
    /// Scores `factors`, returning `(score, recommendation)`.
    fn score(&self, factors: &[RiskFactor]) -> (u8, Recommendation);
}

/// Probability above which a single `critical` factor alone forces `NO_GO`.
const CRITICAL_KILL_SWITCH_PROBABILITY: f64 = 0.5;

/// Weighted severity/probability sum scorer with a critical-factor kill switch.
#[derive(Debug, Clone, Copy, Default)]
pub struct WeightedRiskScorer;

impl RiskScorer for WeightedRiskScorer {
    fn score(&self, factors: &[RiskFactor]) -> (u8, Recommendation) {
        if factors.is_empty() {
            return (100, Recommendation::Go);
        }

        let has_critical_kill = factors
            .iter()
            .any(|f| f.severity == Severity::Critical && f.probability >= CRITICAL_KILL_SWITCH_PROBABILITY);

        let total_weighted: f64 = factors.iter().map(|f| f.severity.weight() * f.probability).sum();
        let max_possible = factors.len() as f64 * Severity::Critical.weight();
        let deduction = if max_possible > 0.0 { (total_weighted / max_possible) * 100.0 } else { 0.0 };
        let score = (100.0 - deduction).clamp(0.0, 100.0).round() as u8;

        let recommendation = if has_critical_kill || score < 40 {
            Recommendation::NoGo
        } else if score < 70 {
            Recommendation::Review
        } else {
            Recommendation::Go
        };

        (score, recommendation)
    }
}

/// Result of a completed risk audit.
#[derive(Debug, Clone)]
pub struct AuditOutcome {
    /// Assessed risk level.
    pub risk_level: RiskLevel,
    /// Compliance gate status.
    pub compliance_status: ComplianceStatus,
    /// Non-placeholder issue strings.
    pub issues: Vec<String>,
    /// Whether the pipeline may proceed to completion.
    pub gate_passed: bool,
}

impl AuditOutcome {
    /// `"pass"` iff `compliance_status != Rejected`, else `"fail"`.
    #[must_use]
    pub const fn audit_result(&self) -> &'static str {
        if matches!(self.compliance_status, ComplianceStatus::Rejected) { "fail" } else { "pass" }
    }
}

fn auto_approved(issues: Vec<String>) -> AuditOutcome {
    AuditOutcome {
        risk_level: RiskLevel::Low,
        compliance_status: ComplianceStatus::Approved,
        issues,
        gate_passed: true,
    }
}

fn default_medium_approved() -> AuditOutcome {
    AuditOutcome {
        risk_level: RiskLevel::Medium,
        compliance_status: ComplianceStatus::Approved,
        issues: Vec::new(),
        gate_passed: true,
    }
}

/// Placeholder prefix the original audit prompt can leak verbatim when the
/// model ignores the instruction to omit empty lists.
const PLACEHOLDER_ISSUE_PREFIX: &str = "Lista SOLO";

#[derive(Debug, Deserialize)]
struct RawAudit {
    #[serde(default)]
    risk_level: Option<String>,
    #[serde(default)]
    compliance_status: Option<String>,
    #[serde(default)]
    issues: Vec<String>,
    #[serde(default)]
    risk_factors: Vec<RawRiskFactor>,
}

#[derive(Debug, Deserialize)]
struct RawRiskFactor {
    #[serde(default)]
    severity: Option<String>,
    #[serde(default)]
    category: Option<String>,
    #[serde(default)]
    probability: Option<f64>,
}

fn parse_risk_level(raw: Option<&str>) -> RiskLevel {
    match raw.unwrap_or("").trim().to_lowercase().as_str() {
        "low" => RiskLevel::Low,
        "high" => RiskLevel::High,
        "critical" => RiskLevel::Critical,
        _ => RiskLevel::Medium,
    }
}

fn parse_compliance_status(raw: Option<&str>) -> ComplianceStatus {
    match raw.unwrap_or("").trim().to_lowercase().as_str() {
        "rejected" => ComplianceStatus::Rejected,
        "pending" => ComplianceStatus::Pending,
        _ => ComplianceStatus::Approved,
    }
}

fn filter_issues(issues: Vec<String>) -> Vec<String> {
    issues
        .into_iter()
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty() && !s.starts_with(PLACEHOLDER_ISSUE_PREFIX))
        .collect()
}

const AUDIT_PROMPT: &str = "Audita la siguiente respuesta generada por un asistente de licitaciones \
en busca de riesgos de cumplimiento, legales, financieros o reputacionales. Responde con un JSON \
con los campos risk_level (low|medium|high|critical), compliance_status (approved|pending|rejected), \
issues (lista de strings) y risk_factors (lista de objetos con severity, category y probability).\n\n\
Pregunta: {question}\n\nContexto:\n{context}\n\nRespuesta a auditar:\n{answer}";

/// Runs the risk audit over `answer`, given the `question` and supporting
/// `context`, using `llm` for the audit call and `scorer` for the optional
/// deterministic post-scoring pass.
///
/// # Errors
///
/// Propagates the LLM's error if the audit call itself fails to execute
/// (transport-level failure, not a parse failure — parse failures fall back
/// to [`default_medium_approved`]).
pub async fn audit(
    llm: &dyn Llm,
    scorer: &dyn RiskScorer,
    question: &str,
    context: &[crate::retrieval::Document],
    answer: &str,
    temperature: f32,
    context_max_chars: usize,
    answer_max_chars: usize,
) -> Result<AuditOutcome> {
    if answer.chars().count() < 50 || answer.to_lowercase().contains("error") {
        return Ok(auto_approved(Vec::new()));
    }
    if answer.to_lowercase().contains(NO_DOCUMENTS_MARKER) {
        return Ok(auto_approved(Vec::new()));
    }

    let top_docs: Vec<&crate::retrieval::Document> = context.iter().take(5).collect();
    let context_text = crate::agents::flatten_context(
        &top_docs.into_iter().cloned().collect::<Vec<_>>(),
        Some(context_max_chars),
    );
    let truncated_answer = {
        let boundary = crate::io::find_char_boundary(answer, answer_max_chars);
        &answer[..boundary]
    };

    let prompt = AUDIT_PROMPT
        .replace("{question}", question)
        .replace("{context}", &context_text)
        .replace("{answer}", truncated_answer);

    let response = llm.chat(&[Message::user(prompt)], temperature).await?;

    let Some(parsed) = parse_json_response(&response.content) else {
        return Ok(default_medium_approved());
    };

    let raw: RawAudit = match serde_json::from_value::<RawAudit>(parsed.clone()) {
        Ok(raw) => raw,
        Err(_) => return Ok(default_medium_approved()),
    };

    let mut risk_level = parse_risk_level(raw.risk_level.as_deref());
    let mut compliance_status = parse_compliance_status(raw.compliance_status.as_deref());
    let mut gate_passed = !matches!(compliance_status, ComplianceStatus::Rejected);
    let issues = filter_issues(raw.issues);

    if !raw.risk_factors.is_empty() {
        let factors: Vec<RiskFactor> = raw
            .risk_factors
            .iter()
            .map(|f| RiskFactor {
                severity: Severity::coerce(f.severity.as_deref().unwrap_or("LOW")),
                category: RiskCategory::coerce(f.category.as_deref().unwrap_or("financial")),
                probability: f.probability.unwrap_or(0.5).clamp(0.0, 1.0),
            })
            .collect();

        let (score, recommendation) = scorer.score(&factors);

        (risk_level, compliance_status, gate_passed) = match recommendation {
            Recommendation::Go => (RiskLevel::Low, ComplianceStatus::Approved, true),
            Recommendation::Review => (RiskLevel::Medium, ComplianceStatus::Pending, true),
            Recommendation::NoGo => (RiskLevel::Critical, ComplianceStatus::Rejected, false),
        };

        if score < 40 {
            risk_level = RiskLevel::Critical;
        } else if score < 70 && !matches!(risk_level, RiskLevel::Critical) {
            risk_level = RiskLevel::High;
        }
    }

    Ok(AuditOutcome {
        risk_level,
        compliance_status,
        issues,
        gate_passed,
    })
}

/// Exposes the raw parsed JSON `Value` for callers that want to inspect the
/// audit payload without re-running the LLM (used by tests).
#[must_use]
pub fn try_parse_audit(raw: &str) -> Option<Value> {
    parse_json_response(raw)
}
