//! `risk_sentinel` node: audits the current answer and decides whether the
//! pipeline may terminate.

use std::sync::Arc;

use crate::graph::engine::{NodeFn, NodeFuture};
use crate::graph::state::{AgentState, StateUpdate};
use crate::llm::Llm;
use crate::risk::{ComplianceStatus, RiskLevel, RiskScorer, audit};

/// Parameters the risk sentinel needs from configuration.
#[derive(Debug, Clone, Copy)]
pub struct RiskConfig {
    /// Audit LLM temperature.
    pub temperature: f32,
    /// Char cap on context sent to the audit prompt.
    pub context_max_chars: usize,
    /// Char cap on the answer sent to the audit prompt.
    pub answer_max_chars: usize,
}

/// Builds the `risk_sentinel` node.
#[must_use]
pub fn build(llm: Arc<dyn Llm>, scorer: Arc<dyn RiskScorer>, config: RiskConfig) -> NodeFn {
    Box::new(move |state: &AgentState| -> NodeFuture<'_> {
        let llm = Arc::clone(&llm);
        let scorer = Arc::clone(&scorer);
        let question = state.question.clone();
        let context = state.active_documents().to_vec();
        let answer = state.answer.clone();
        Box::pin(async move {
            let outcome = audit(
                llm.as_ref(),
                scorer.as_ref(),
                &question,
                &context,
                &answer,
                config.temperature,
                config.context_max_chars,
                config.answer_max_chars,
            )
            .await;

            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(e) => {
                    return Ok(StateUpdate {
                        audit_result: Some("pass".to_string()),
                        risk_level: Some(RiskLevel::Medium),
                        compliance_status: Some(ComplianceStatus::Approved),
                        risk_issues: Some(vec![format!("Error en auditoria: {e}")]),
                        gate_passed: Some(true),
                        ..StateUpdate::empty()
                    });
                }
            };

            Ok(StateUpdate {
                audit_result: Some(outcome.audit_result().to_string()),
                risk_level: Some(outcome.risk_level),
                compliance_status: Some(outcome.compliance_status),
                risk_issues: Some(outcome.issues),
                gate_passed: Some(outcome.gate_passed),
                ..StateUpdate::empty()
            })
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlm;
    use crate::risk::WeightedRiskScorer;

    #[tokio::test]
    async fn test_risk_node_auto_approves_short_answer() {
        let llm: Arc<dyn Llm> = Arc::new(ScriptedLlm::new("should not be called"));
        let scorer: Arc<dyn RiskScorer> = Arc::new(WeightedRiskScorer);
        let node = build(llm, scorer, RiskConfig { temperature: 0.0, context_max_chars: 1000, answer_max_chars: 1000 });

        let mut state = AgentState::new("abcd1234", "pregunta");
        state.answer = "short".to_string();
        let update = node(&state).await.unwrap();
        assert_eq!(update.audit_result, Some("pass".to_string()));
        assert_eq!(update.gate_passed, Some(true));
    }

    struct FailingLlm;

    #[async_trait::async_trait]
    impl Llm for FailingLlm {
        async fn chat(&self, _messages: &[crate::llm::Message], _temperature: f32) -> crate::error::Result<crate::llm::LlmResponse> {
            Err(crate::error::LlmError::RequestFailed { reason: "connection refused".to_string() }.into())
        }
    }

    #[tokio::test]
    async fn test_risk_node_degrades_to_approved_on_audit_failure() {
        let llm: Arc<dyn Llm> = Arc::new(FailingLlm);
        let scorer: Arc<dyn RiskScorer> = Arc::new(WeightedRiskScorer);
        let node = build(llm, scorer, RiskConfig { temperature: 0.0, context_max_chars: 1000, answer_max_chars: 1000 });

        let mut state = AgentState::new("abcd1234", "pregunta");
        state.answer = "Esta es una respuesta suficientemente larga para disparar la auditoria de riesgo real.".to_string();

        let update = node(&state).await.unwrap();
        assert_eq!(update.audit_result, Some("pass".to_string()));
        assert_eq!(update.risk_level, Some(RiskLevel::Medium));
        assert_eq!(update.compliance_status, Some(ComplianceStatus::Approved));
        assert_eq!(update.gate_passed, Some(true));
        assert!(update.risk_issues.unwrap()[0].starts_with("Error en auditoria"));
    }
}
