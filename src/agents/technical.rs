//! Technical specialist: architecture, infrastructure, and tech-stack fit.

use std::sync::Arc;

use async_trait::async_trait;

use super::skills::{KeywordTechStackExtractor, TechStackExtractor};
use super::{SpecialistAgent, generate_with_llm};
use crate::domain::Domain;
use crate::error::Result;
use crate::llm::Llm;
use crate::retrieval::Document;

const TEMPERATURE: f32 = 0.15;

/// Evaluates technical feasibility, architecture requirements, and
/// requested tech stack, consulting a deterministic tech-stack extractor
/// before calling the LLM.
pub struct TechnicalAgent {
    llm: Arc<dyn Llm>,
    tech_stack_extractor: Box<dyn TechStackExtractor>,
}

impl TechnicalAgent {
    /// Builds a new technical specialist wired to `llm`, using the default
    /// keyword-based tech-stack extractor.
    #[must_use]
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self::with_extractor(llm, Box::new(KeywordTechStackExtractor))
    }

    /// Builds a technical specialist with an explicit extractor, for tests.
    #[must_use]
    pub fn with_extractor(llm: Arc<dyn Llm>, tech_stack_extractor: Box<dyn TechStackExtractor>) -> Self {
        Self { llm, tech_stack_extractor }
    }
}

#[async_trait]
impl SpecialistAgent for TechnicalAgent {
    fn domain(&self) -> Domain {
        Domain::Technical
    }

    async fn generate(&self, question: &str, context: &[Document]) -> Result<String> {
        let texts: Vec<&str> = context.iter().map(|d| d.content.as_str()).collect();
        let extra = self.tech_stack_extractor.extract_tech_stack(&texts);

        generate_with_llm(
            self.llm.as_ref(),
            Domain::Technical,
            question,
            context,
            TEMPERATURE,
            extra.as_deref(),
        )
        .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::llm::ScriptedLlm;

    struct NoOpExtractor;

    impl TechStackExtractor for NoOpExtractor {
        fn extract_tech_stack(&self, _texts: &[&str]) -> Option<String> {
            None
        }
    }

    #[tokio::test]
    async fn test_technical_agent_reports_its_domain() {
        let agent = TechnicalAgent::new(Arc::new(ScriptedLlm::new("ok")));
        assert_eq!(agent.domain(), Domain::Technical);
    }

    #[tokio::test]
    async fn test_technical_agent_short_circuits_on_empty_context() {
        let agent = TechnicalAgent::new(Arc::new(ScriptedLlm::new("should not be used")));
        let answer = agent.generate("pregunta", &[]).await.unwrap();
        assert!(answer.contains("technical"));
    }

    #[tokio::test]
    async fn test_technical_agent_uses_llm_with_context() {
        let agent =
            TechnicalAgent::with_extractor(Arc::new(ScriptedLlm::new("respuesta tecnica")), Box::new(NoOpExtractor));
        let docs = vec![Document::new("arquitectura propuesta", "rfp.pdf", 4)];
        let answer = agent.generate("cual es la arquitectura?", &docs).await.unwrap();
        assert_eq!(answer, "respuesta tecnica");
    }
}
