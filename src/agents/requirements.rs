//! Requirements specialist: formal/functional requirement extraction.

use std::sync::Arc;

use async_trait::async_trait;

use super::{SpecialistAgent, generate_with_llm};
use crate::domain::Domain;
use crate::error::Result;
use crate::llm::Llm;
use crate::retrieval::Document;

const TEMPERATURE: f32 = 0.1;

/// Extracts and classifies formal and functional requirements.
pub struct RequirementsAgent {
    llm: Arc<dyn Llm>,
}

impl RequirementsAgent {
    /// Builds a new requirements specialist wired to `llm`.
    #[must_use]
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl SpecialistAgent for RequirementsAgent {
    fn domain(&self) -> Domain {
        Domain::Requirements
    }

    async fn generate(&self, question: &str, context: &[Document]) -> Result<String> {
        generate_with_llm(self.llm.as_ref(), Domain::Requirements, question, context, TEMPERATURE, None).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlm;

    #[tokio::test]
    async fn test_requirements_agent_reports_its_domain() {
        let agent = RequirementsAgent::new(Arc::new(ScriptedLlm::new("ok")));
        assert_eq!(agent.domain(), Domain::Requirements);
    }

    #[tokio::test]
    async fn test_requirements_agent_short_circuits_on_empty_context() {
        let agent = RequirementsAgent::new(Arc::new(ScriptedLlm::new("should not be used")));
        let answer = agent.generate("pregunta", &[]).await.unwrap();
        assert!(answer.contains("requirements"));
    }

    #[tokio::test]
    async fn test_requirements_agent_uses_llm_with_context() {
        let agent = RequirementsAgent::new(Arc::new(ScriptedLlm::new("requisito excluyente: ISO 9001")));
        let docs = vec![Document::new("el proponente debe contar con ISO 9001", "rfp.pdf", 2)];
        let answer = agent.generate("que requisitos excluyentes hay?", &docs).await.unwrap();
        assert_eq!(answer, "requisito excluyente: ISO 9001");
    }
}
