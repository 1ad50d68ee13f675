//! `AgentState`: the single mutable value that flows through the graph.

use crate::domain::Domain;
use crate::quant::{ChartType, DataQuality};
use crate::retrieval::Document;
use crate::risk::{ComplianceStatus, RiskLevel};

/// The full pipeline state for one request.
///
/// Nodes never mutate this directly; they return a [`StateUpdate`] which the
/// engine merges in (last-writer-wins per field).
#[derive(Debug, Clone)]
pub struct AgentState {
    /// 8-hex trace id, set once at creation.
    pub trace_id: String,
    /// The user's question, 1..=2000 chars.
    pub question: String,
    /// All documents retrieved so far; never shrinks.
    pub context: Vec<Document>,
    /// Subset of `context` the grader judged relevant.
    pub filtered_context: Vec<Document>,
    /// Domain the router assigned.
    pub domain: Domain,
    /// The current answer text.
    pub answer: String,
    /// `"pass"`, `"fail"`, or `"N/A"` before the sentinel has run.
    pub audit_result: String,
    /// Monotonically non-decreasing refine-loop counter.
    pub revision_count: u32,
    /// Base64 PNG, set only on the quantitative branch.
    pub quant_chart: Option<String>,
    /// Chart strategy used, if any.
    pub quant_chart_type: Option<ChartType>,
    /// Quant textual insight.
    pub quant_insights: Option<String>,
    /// Quant data-quality grade.
    pub quant_data_quality: Option<DataQuality>,
    /// Risk level assigned by the sentinel.
    pub risk_level: Option<RiskLevel>,
    /// Compliance status assigned by the sentinel.
    pub compliance_status: Option<ComplianceStatus>,
    /// Non-placeholder risk issue strings.
    pub risk_issues: Vec<String>,
    /// Whether the pipeline may terminate successfully.
    pub gate_passed: bool,
    /// Set by `retrieve` when the index returned zero documents.
    pub no_documents: bool,
}

impl AgentState {
    /// Builds the initial state for a fresh request.
    #[must_use]
    pub fn new(trace_id: impl Into<String>, question: impl Into<String>) -> Self {
        Self {
            trace_id: trace_id.into(),
            question: question.into(),
            context: Vec::new(),
            filtered_context: Vec::new(),
            domain: Domain::None,
            answer: String::new(),
            audit_result: "N/A".to_string(),
            revision_count: 0,
            quant_chart: None,
            quant_chart_type: None,
            quant_insights: None,
            quant_data_quality: None,
            risk_level: None,
            compliance_status: None,
            risk_issues: Vec::new(),
            gate_passed: false,
            no_documents: false,
        }
    }

    /// The documents a specialist/quant node should read: `filtered_context`
    /// if the grader ran, else the raw `context`.
    #[must_use]
    pub fn active_documents(&self) -> &[Document] {
        if self.filtered_context.is_empty() { &self.context } else { &self.filtered_context }
    }

    /// Applies a partial update, overwriting only the fields `update` sets.
    pub fn apply(&mut self, update: StateUpdate) {
        if let Some(context) = update.context {
            self.context = context;
        }
        if let Some(filtered) = update.filtered_context {
            self.filtered_context = filtered;
        }
        if let Some(domain) = update.domain {
            self.domain = domain;
        }
        if let Some(answer) = update.answer {
            self.answer = answer;
        }
        if let Some(audit_result) = update.audit_result {
            self.audit_result = audit_result;
        }
        if let Some(revision_count) = update.revision_count {
            self.revision_count = revision_count;
        }
        if let Some(chart) = update.quant_chart {
            self.quant_chart = chart;
        }
        if let Some(chart_type) = update.quant_chart_type {
            self.quant_chart_type = Some(chart_type);
        }
        if let Some(insights) = update.quant_insights {
            self.quant_insights = Some(insights);
        }
        if let Some(quality) = update.quant_data_quality {
            self.quant_data_quality = Some(quality);
        }
        if let Some(risk_level) = update.risk_level {
            self.risk_level = Some(risk_level);
        }
        if let Some(status) = update.compliance_status {
            self.compliance_status = Some(status);
        }
        if let Some(issues) = update.risk_issues {
            self.risk_issues = issues;
        }
        if let Some(gate_passed) = update.gate_passed {
            self.gate_passed = gate_passed;
        }
        if let Some(no_documents) = update.no_documents {
            self.no_documents = no_documents;
        }
    }
}

/// A partial update a node returns; `None` fields are left untouched when
/// merged into the running [`AgentState`].
#[derive(Debug, Clone, Default)]
pub struct StateUpdate {
    /// New full context, if `retrieve` ran.
    pub context: Option<Vec<Document>>,
    /// New filtered context, if the grader ran.
    pub filtered_context: Option<Vec<Document>>,
    /// New domain, if the router ran.
    pub domain: Option<Domain>,
    /// New answer text.
    pub answer: Option<String>,
    /// New audit result.
    pub audit_result: Option<String>,
    /// New revision count.
    pub revision_count: Option<u32>,
    /// New quant chart (double `Option` allows explicitly clearing it).
    pub quant_chart: Option<Option<String>>,
    /// New quant chart type.
    pub quant_chart_type: Option<ChartType>,
    /// New quant insights.
    pub quant_insights: Option<String>,
    /// New quant data quality.
    pub quant_data_quality: Option<DataQuality>,
    /// New risk level.
    pub risk_level: Option<RiskLevel>,
    /// New compliance status.
    pub compliance_status: Option<ComplianceStatus>,
    /// New risk issues.
    pub risk_issues: Option<Vec<String>>,
    /// New gate-passed flag.
    pub gate_passed: Option<bool>,
    /// New no-documents flag.
    pub no_documents: Option<bool>,
}

impl StateUpdate {
    /// An update that sets nothing.
    #[must_use]
    pub fn empty() -> Self {
        Self::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_state_has_na_audit_result() {
        let state = AgentState::new("abcd1234", "pregunta");
        assert_eq!(state.audit_result, "N/A");
        assert_eq!(state.revision_count, 0);
        assert!(!state.no_documents);
    }

    #[test]
    fn test_apply_merges_only_set_fields() {
        let mut state = AgentState::new("abcd1234", "pregunta");
        state.answer = "previous answer".to_string();

        let mut update = StateUpdate::empty();
        update.revision_count = Some(1);
        state.apply(update);

        assert_eq!(state.answer, "previous answer");
        assert_eq!(state.revision_count, 1);
    }

    #[test]
    fn test_active_documents_prefers_filtered() {
        let mut state = AgentState::new("abcd1234", "pregunta");
        state.context = vec![Document::new("a", "f.pdf", 1), Document::new("b", "f.pdf", 2)];
        state.filtered_context = vec![Document::new("a", "f.pdf", 1)];
        assert_eq!(state.active_documents().len(), 1);
    }

    #[test]
    fn test_active_documents_falls_back_to_context() {
        let mut state = AgentState::new("abcd1234", "pregunta");
        state.context = vec![Document::new("a", "f.pdf", 1)];
        assert_eq!(state.active_documents().len(), 1);
    }
}
