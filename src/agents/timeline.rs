//! Timeline specialist: deadlines, milestones, and scheduling dependencies.

use std::sync::Arc;

use async_trait::async_trait;

use super::{SpecialistAgent, generate_with_llm};
use crate::domain::Domain;
use crate::error::Result;
use crate::llm::Llm;
use crate::retrieval::Document;

const TEMPERATURE: f32 = 0.1;

/// Identifies deadlines, milestones, and schedule conflicts.
pub struct TimelineAgent {
    llm: Arc<dyn Llm>,
}

impl TimelineAgent {
    /// Builds a new timeline specialist wired to `llm`.
    #[must_use]
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl SpecialistAgent for TimelineAgent {
    fn domain(&self) -> Domain {
        Domain::Timeline
    }

    async fn generate(&self, question: &str, context: &[Document]) -> Result<String> {
        generate_with_llm(self.llm.as_ref(), Domain::Timeline, question, context, TEMPERATURE, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlm;

    #[tokio::test]
    async fn test_timeline_agent_reports_its_domain() {
        let agent = TimelineAgent::new(Arc::new(ScriptedLlm::new("ok")));
        assert_eq!(agent.domain(), Domain::Timeline);
    }

    #[tokio::test]
    async fn test_timeline_agent_short_circuits_on_empty_context() {
        let agent = TimelineAgent::new(Arc::new(ScriptedLlm::new("should not be used")));
        let answer = agent.generate("pregunta", &[]).await.unwrap();
        assert!(answer.contains("timeline"));
    }

    #[tokio::test]
    async fn test_timeline_agent_uses_llm_with_context() {
        let agent = TimelineAgent::new(Arc::new(ScriptedLlm::new("el plazo es 30 dias")));
        let docs = vec![Document::new("el plazo de entrega es de 30 dias", "rfp.pdf", 5)];
        let answer = agent.generate("cual es el plazo?", &docs).await.unwrap();
        assert_eq!(answer, "el plazo es 30 dias");
    }
}
