//! `refine` node: regenerates an answer that failed the risk audit. Always
//! increments `revision_count`, even on failure, to guarantee the bounded
//! `refine <-> risk_sentinel` loop terminates.

use std::sync::Arc;

use crate::domain::REFINE_PROMPT;
use crate::graph::engine::{NodeFn, NodeFuture};
use crate::graph::state::{AgentState, StateUpdate};
use crate::llm::{Llm, Message};

/// Builds the `refine` node.
#[must_use]
pub fn build(llm: Arc<dyn Llm>, temperature: f32) -> NodeFn {
    Box::new(move |state: &AgentState| -> NodeFuture<'_> {
        let llm = Arc::clone(&llm);
        let question = state.question.clone();
        let answer = state.answer.clone();
        let issues = state.risk_issues.clone();
        let context = crate::agents::flatten_context(state.active_documents(), None);
        let revision_count = state.revision_count;
        Box::pin(async move {
            let prompt = REFINE_PROMPT
                .replace("{issues}", &issues.join("; "))
                .replace("{context}", &context)
                .replace("{question}", &question)
                .replace("{answer}", &answer);

            match llm.chat(&[Message::user(prompt)], temperature).await {
                Ok(response) => Ok(StateUpdate {
                    answer: Some(response.content),
                    revision_count: Some(revision_count + 1),
                    ..StateUpdate::empty()
                }),
                Err(_) => Ok(StateUpdate { revision_count: Some(revision_count + 1), ..StateUpdate::empty() }),
            }
        })
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlm;

    #[tokio::test]
    async fn test_refine_regenerates_answer_and_increments_revision() {
        let llm: Arc<dyn Llm> = Arc::new(ScriptedLlm::new("respuesta mejorada"));
        let node = build(llm, 0.1);

        let mut state = AgentState::new("abcd1234", "pregunta");
        state.answer = "respuesta original".to_string();
        state.revision_count = 1;
        state.risk_issues = vec!["clausula ambigua".to_string()];

        let update = node(&state).await.unwrap();
        assert_eq!(update.answer, Some("respuesta mejorada".to_string()));
        assert_eq!(update.revision_count, Some(2));
    }
}
