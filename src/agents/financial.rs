//! Financial specialist: budgets, payment structures, and pricing tables.

use std::sync::Arc;

use async_trait::async_trait;

use super::skills::{FinancialTableExtractor, HeuristicFinancialTableExtractor, unique_pages};
use super::{SpecialistAgent, generate_with_llm};
use crate::domain::Domain;
use crate::error::Result;
use crate::llm::Llm;
use crate::retrieval::Document;

const TEMPERATURE: f32 = 0.1;

/// Caps the number of distinct `(source, page)` pairs the table extractor
/// is run against, to bound cost on large retrieved contexts.
const MAX_TABLE_PAGES: usize = 5;

/// Evaluates budgets, payment structures, guarantees, and price tables,
/// consulting a deterministic table extractor per unique `(source, page)`
/// before calling the LLM.
pub struct FinancialAgent {
    llm: Arc<dyn Llm>,
    table_extractor: Box<dyn FinancialTableExtractor>,
}

impl FinancialAgent {
    /// Builds a new financial specialist wired to `llm`, using the default
    /// heuristic table extractor.
    #[must_use]
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self::with_extractor(llm, Box::new(HeuristicFinancialTableExtractor))
    }

    /// Builds a financial specialist with an explicit extractor, for tests.
    #[must_use]
    pub fn with_extractor(llm: Arc<dyn Llm>, table_extractor: Box<dyn FinancialTableExtractor>) -> Self {
        Self { llm, table_extractor }
    }
}

#[async_trait]
impl SpecialistAgent for FinancialAgent {
    fn domain(&self) -> Domain {
        Domain::Financial
    }

    async fn generate(&self, question: &str, context: &[Document]) -> Result<String> {
        let pages = unique_pages(context, MAX_TABLE_PAGES);
        let tables: Vec<String> = pages
            .iter()
            .filter_map(|(source, page, content)| {
                self.table_extractor
                    .extract_table(content)
                    .map(|table| format!("[{source} p.{page}]\n{table}"))
            })
            .collect();

        let extra = if tables.is_empty() { None } else { Some(tables.join("\n\n")) };

        generate_with_llm(
            self.llm.as_ref(),
            Domain::Financial,
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

    impl FinancialTableExtractor for NoOpExtractor {
        fn extract_table(&self, _content: &str) -> Option<String> {
            None
        }
    }

    #[tokio::test]
    async fn test_financial_agent_reports_its_domain() {
        let agent = FinancialAgent::new(Arc::new(ScriptedLlm::new("ok")));
        assert_eq!(agent.domain(), Domain::Financial);
    }

    #[tokio::test]
    async fn test_financial_agent_short_circuits_on_empty_context() {
        let agent = FinancialAgent::new(Arc::new(ScriptedLlm::new("should not be used")));
        let answer = agent.generate("pregunta", &[]).await.unwrap();
        assert!(answer.contains("financial"));
    }

    #[tokio::test]
    async fn test_financial_agent_uses_llm_with_context() {
        let agent = FinancialAgent::with_extractor(
            Arc::new(ScriptedLlm::new("respuesta financiera")),
            Box::new(NoOpExtractor),
        );
        let docs = vec![Document::new("presupuesto total 500000 usd", "rfp.pdf", 7)];
        let answer = agent.generate("cual es el presupuesto?", &docs).await.unwrap();
        assert_eq!(answer, "respuesta financiera");
    }
}
