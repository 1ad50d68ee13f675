//! `specialist` node: dispatches to the domain's specialist agent, catching
//! any failure into a degraded answer instead of propagating it.

use std::sync::Arc;

use crate::container::AgentFactory;
use crate::error::Error;
use crate::graph::engine::{NodeFn, NodeFuture};
use crate::graph::state::{AgentState, StateUpdate};
use crate::io::find_char_boundary;

/// Max length of the failure detail embedded when a specialist's own
/// generation call fails.
const SPECIALIZED_ERROR_MAX_CHARS: usize = 300;

/// Max length of the failure detail embedded for any other failure (e.g.
/// the factory refusing to build an agent for the domain).
const GENERIC_ERROR_MAX_CHARS: usize = 200;

/// Builds the `specialist` node.
#[must_use]
pub fn build(factory: Arc<AgentFactory>) -> NodeFn {
    Box::new(move |state: &AgentState| -> NodeFuture<'_> {
        let factory = Arc::clone(&factory);
        let question = state.question.clone();
        let docs = state.active_documents().to_vec();
        let domain = state.domain.coerce_for_specialist();
        Box::pin(async move {
            let answer = match factory.create(domain) {
                Ok(agent) => match agent.generate(&question, &docs).await {
                    Ok(answer) => answer,
                    Err(Error::AgentProcessing { message, .. }) => degraded_answer_specialized(&message),
                    Err(e) => degraded_answer_generic(&e.to_string()),
                },
                Err(e) => degraded_answer_generic(&e.to_string()),
            };

            Ok(StateUpdate { answer: Some(answer), domain: Some(domain), ..StateUpdate::empty() })
        })
    })
}

fn degraded_answer_specialized(message: &str) -> String {
    let boundary = find_char_boundary(message, SPECIALIZED_ERROR_MAX_CHARS);
    format!("Error en el agente especializado: {}", &message[..boundary])
}

fn degraded_answer_generic(message: &str) -> String {
    let boundary = find_char_boundary(message, GENERIC_ERROR_MAX_CHARS);
    format!("Error en el agente: {}", &message[..boundary])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::container::Container;
    use crate::domain::Domain;
    use crate::llm::ScriptedLlm;
    use crate::retrieval::Document;

    #[tokio::test]
    async fn test_specialist_node_generates_via_factory() {
        let container = Container::new("http://localhost", "model");
        container.override_llm(Arc::new(ScriptedLlm::new("respuesta del especialista")));
        let node = build(container.factory());

        let mut state = AgentState::new("abcd1234", "pregunta legal");
        state.domain = Domain::Legal;
        state.context = vec![Document::new("clausula", "f.pdf", 1)];

        let update = node(&state).await.unwrap();
        assert_eq!(update.answer, Some("respuesta del especialista".to_string()));
    }

    #[tokio::test]
    async fn test_specialist_node_coerces_quantitative_to_general() {
        let container = Container::new("http://localhost", "model");
        container.override_llm(Arc::new(ScriptedLlm::new("respuesta general")));
        let node = build(container.factory());

        let mut state = AgentState::new("abcd1234", "pregunta");
        state.domain = Domain::Quantitative;
        state.context = vec![Document::new("contenido", "f.pdf", 1)];

        let update = node(&state).await.unwrap();
        assert_eq!(update.domain, Some(Domain::General));
        assert_eq!(update.answer, Some("respuesta general".to_string()));
    }
}
