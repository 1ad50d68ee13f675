//! `quant` node: runs the quantitative analyzer pipeline when the question
//! was routed to the quantitative domain; a no-op otherwise.

use std::sync::Arc;

use crate::domain::Domain;
use crate::graph::engine::{NodeFn, NodeFuture};
use crate::graph::state::{AgentState, StateUpdate};
use crate::llm::Llm;
use crate::quant::analyze;

/// Temperatures for the three quant sub-calls.
#[derive(Debug, Clone, Copy)]
pub struct QuantConfig {
    /// Extraction call temperature.
    pub extract_temperature: f32,
    /// Strategy call temperature.
    pub strategy_temperature: f32,
    /// Insight call temperature.
    pub insight_temperature: f32,
}

/// Builds the `quant` node.
#[must_use]
pub fn build(llm: Arc<dyn Llm>, config: QuantConfig) -> NodeFn {
    Box::new(move |state: &AgentState| -> NodeFuture<'_> {
        let llm = Arc::clone(&llm);
        let question = state.question.clone();
        let domain = state.domain;
        let docs = state.active_documents().to_vec();
        Box::pin(async move {
            if domain != Domain::Quantitative {
                return Ok(StateUpdate::empty());
            }

            let outcome = analyze(
                llm.as_ref(),
                &question,
                &docs,
                config.extract_temperature,
                config.strategy_temperature,
                config.insight_temperature,
            )
            .await;

            let outcome = match outcome {
                Ok(outcome) => outcome,
                Err(_) => {
                    let degraded = "Error al procesar analisis cuantitativo.".to_string();
                    return Ok(StateUpdate {
                        quant_chart: Some(None),
                        quant_chart_type: Some(crate::quant::ChartType::None),
                        quant_insights: Some(degraded.clone()),
                        quant_data_quality: Some(crate::quant::DataQuality::Incomplete),
                        answer: Some(degraded),
                        ..StateUpdate::empty()
                    });
                }
            };

            Ok(StateUpdate {
                quant_chart: Some(outcome.chart_base64),
                quant_chart_type: Some(outcome.chart_type),
                quant_insights: Some(outcome.insights.clone()),
                quant_data_quality: Some(outcome.data_quality),
                answer: Some(outcome.insights),
                ..StateUpdate::empty()
            })
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlm;
    use crate::retrieval::Document;

    fn config() -> QuantConfig {
        QuantConfig { extract_temperature: 0.0, strategy_temperature: 0.0, insight_temperature: 0.2 }
    }

    #[tokio::test]
    async fn test_quant_node_noop_when_not_quantitative_domain() {
        let llm: Arc<dyn Llm> = Arc::new(ScriptedLlm::new("should not be called"));
        let node = build(llm, config());
        let mut state = AgentState::new("abcd1234", "pregunta");
        state.domain = Domain::Legal;
        let update = node(&state).await.unwrap();
        assert!(update.answer.is_none());
        assert!(update.quant_chart_type.is_none());
    }

    #[tokio::test]
    async fn test_quant_node_runs_pipeline_when_quantitative() {
        let llm: Arc<dyn Llm> = Arc::new(ScriptedLlm::new(r#"{"data_found": false}"#));
        let node = build(llm, config());
        let mut state = AgentState::new("abcd1234", "cuanto cuesta?");
        state.domain = Domain::Quantitative;
        state.context = vec![Document::new("presupuesto 1000 usd", "f.pdf", 1)];
        let update = node(&state).await.unwrap();
        assert!(update.answer.is_some());
    }

    struct FailingLlm;

    #[async_trait::async_trait]
    impl Llm for FailingLlm {
        async fn chat(&self, _messages: &[crate::llm::Message], _temperature: f32) -> crate::error::Result<crate::llm::LlmResponse> {
            Err(crate::error::LlmError::RequestFailed { reason: "connection refused".to_string() }.into())
        }
    }

    #[tokio::test]
    async fn test_quant_node_degrades_on_analyzer_failure() {
        let llm: Arc<dyn Llm> = Arc::new(FailingLlm);
        let node = build(llm, config());
        let mut state = AgentState::new("abcd1234", "cuanto cuesta?");
        state.domain = Domain::Quantitative;
        state.context = vec![Document::new("presupuesto 1000 usd", "f.pdf", 1)];

        let update = node(&state).await.unwrap();
        assert_eq!(update.quant_chart, Some(None));
        assert_eq!(update.quant_chart_type, Some(crate::quant::ChartType::None));
        assert_eq!(update.quant_data_quality, Some(crate::quant::DataQuality::Incomplete));
        assert_eq!(update.answer, Some("Error al procesar analisis cuantitativo.".to_string()));
    }
}
