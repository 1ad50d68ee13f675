//! General specialist: fallback for questions outside the other domains.

use std::sync::Arc;

use async_trait::async_trait;

use super::{SpecialistAgent, generate_with_llm};
use crate::domain::Domain;
use crate::error::Result;
use crate::llm::Llm;
use crate::retrieval::Document;

const TEMPERATURE: f32 = 0.2;

/// Answers general questions about the loaded tender documents.
pub struct GeneralAgent {
    llm: Arc<dyn Llm>,
}

impl GeneralAgent {
    /// Builds a new general specialist wired to `llm`.
    #[must_use]
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl SpecialistAgent for GeneralAgent {
    fn domain(&self) -> Domain {
        Domain::General
    }

    async fn generate(&self, question: &str, context: &[Document]) -> Result<String> {
        generate_with_llm(self.llm.as_ref(), Domain::General, question, context, TEMPERATURE, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlm;

    #[tokio::test]
    async fn test_general_agent_reports_its_domain() {
        let agent = GeneralAgent::new(Arc::new(ScriptedLlm::new("ok")));
        assert_eq!(agent.domain(), Domain::General);
    }

    #[tokio::test]
    async fn test_general_agent_short_circuits_on_empty_context() {
        let agent = GeneralAgent::new(Arc::new(ScriptedLlm::new("should not be used")));
        let answer = agent.generate("pregunta", &[]).await.unwrap();
        assert!(answer.contains("general"));
    }

    #[tokio::test]
    async fn test_general_agent_uses_llm_with_context() {
        let agent = GeneralAgent::new(Arc::new(ScriptedLlm::new("resumen general")));
        let docs = vec![Document::new("introduccion al pliego", "rfp.pdf", 1)];
        let answer = agent.generate("de que trata el pliego?", &docs).await.unwrap();
        assert_eq!(answer, "resumen general");
    }
}
