//! Wire types for the HTTP surface: request bodies, the chat response
//! envelope, and its nested agent metadata.

use serde::{Deserialize, Serialize};

use crate::graph::AgentState;

/// `POST /api/chat` and `POST /api/chat/stream` request body.
#[derive(Debug, Clone, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

/// Quantitative-analysis metadata, present only when the routed domain was
/// `quantitative`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QuantAnalysis {
    pub chart_base64: Option<String>,
    pub chart_type: Option<String>,
    pub insights: String,
    pub data_quality: String,
}

/// Risk/compliance audit metadata.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RiskAssessment {
    pub risk_level: String,
    pub compliance_status: String,
    pub issues: Vec<String>,
    pub gate_passed: bool,
}

/// Non-answer metadata describing how the answer was produced.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AgentMetadata {
    pub domain: String,
    pub specialist_used: String,
    pub documents_retrieved: usize,
    pub documents_filtered: usize,
    pub revision_count: u32,
    pub audit_result: String,
    pub quant_analysis: Option<QuantAnalysis>,
    pub risk_assessment: Option<RiskAssessment>,
}

/// The full `/api/chat` response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct QueryResponse {
    pub answer: String,
    pub sources: Vec<String>,
    pub agent_metadata: AgentMetadata,
}

impl QueryResponse {
    /// Builds the response envelope from a terminal [`AgentState`].
    ///
    /// `sources` is the deduplicated set of source filenames across
    /// `filtered_context` (falling back to `context` when grading never
    /// ran). `quant_analysis` is present iff a chart or insights were
    /// produced; `risk_assessment` iff the sentinel set a risk level.
    #[must_use]
    pub fn from_state(state: &AgentState) -> Self {
        let filtered_docs = state.active_documents();

        let mut sources: Vec<String> =
            filtered_docs.iter().map(|d| d.source().to_string()).filter(|s| !s.is_empty()).collect();
        sources.sort_unstable();
        sources.dedup();

        let quant_analysis = if state.quant_chart.is_some() || state.quant_insights.is_some() {
            Some(QuantAnalysis {
                chart_base64: state.quant_chart.clone(),
                chart_type: state.quant_chart_type.map(|t| t.as_str().to_string()),
                insights: state.quant_insights.clone().unwrap_or_default(),
                data_quality: state
                    .quant_data_quality
                    .map(|q| q.as_str().to_string())
                    .unwrap_or_else(|| "incomplete".to_string()),
            })
        } else {
            None
        };

        let risk_assessment = state.risk_level.map(|risk_level| RiskAssessment {
            risk_level: risk_level.as_str().to_string(),
            compliance_status: state
                .compliance_status
                .map(|s| s.as_str().to_string())
                .unwrap_or_else(|| "pending".to_string()),
            issues: state.risk_issues.clone(),
            gate_passed: state.gate_passed,
        });

        let domain = state.domain.key().to_string();
        let specialist_used =
            if state.domain == crate::domain::Domain::Quantitative { "quant".to_string() } else { format!("specialist_{domain}") };

        Self {
            answer: state.answer.clone(),
            sources,
            agent_metadata: AgentMetadata {
                domain,
                specialist_used,
                documents_retrieved: state.context.len(),
                documents_filtered: filtered_docs.len(),
                revision_count: state.revision_count,
                audit_result: state.audit_result.clone(),
                quant_analysis,
                risk_assessment,
            },
        }
    }
}

/// `GET /api/index/stats` response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IndexStats {
    pub document_count: usize,
    pub chunk_count: usize,
}

/// A single ingested-document summary for `GET /api/documents`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct DocumentSummary {
    pub source: String,
    pub chunk_count: usize,
}

/// `POST /api/ingest` response body.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IngestResponse {
    pub source: String,
    pub chunks_added: usize,
}

/// Generic error envelope returned by failing endpoints.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ErrorResponse {
    pub error: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Domain;
    use crate::quant::{ChartType, DataQuality};
    use crate::risk::{ComplianceStatus, RiskLevel};

    #[test]
    fn test_from_state_without_quant_or_risk() {
        let mut state = AgentState::new("abcd1234", "pregunta");
        state.answer = "respuesta".to_string();
        state.domain = Domain::Legal;

        let response = QueryResponse::from_state(&state);
        assert_eq!(response.answer, "respuesta");
        assert!(response.agent_metadata.quant_analysis.is_none());
        assert!(response.agent_metadata.risk_assessment.is_none());
        assert_eq!(response.agent_metadata.domain, "legal");
    }

    #[test]
    fn test_from_state_with_quant_and_risk() {
        let mut state = AgentState::new("abcd1234", "pregunta");
        state.domain = Domain::Quantitative;
        state.quant_chart = Some("base64data".to_string());
        state.quant_chart_type = Some(ChartType::Bar);
        state.quant_insights = Some("insight text".to_string());
        state.quant_data_quality = Some(DataQuality::Clean);
        state.audit_result = "pass".to_string();
        state.risk_level = Some(RiskLevel::Low);
        state.compliance_status = Some(ComplianceStatus::Approved);
        state.gate_passed = true;

        let response = QueryResponse::from_state(&state);
        let quant = response.agent_metadata.quant_analysis.unwrap();
        assert_eq!(quant.chart_base64, Some("base64data".to_string()));
        assert_eq!(quant.chart_type, Some("bar".to_string()));

        let risk = response.agent_metadata.risk_assessment.unwrap();
        assert_eq!(risk.risk_level, "low");
        assert!(risk.gate_passed);
    }
}
