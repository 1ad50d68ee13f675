//! Legal specialist: contractual clauses, obligations, and penalties.

use std::sync::Arc;

use async_trait::async_trait;

use super::{SpecialistAgent, generate_with_llm};
use crate::domain::Domain;
use crate::error::Result;
use crate::llm::Llm;
use crate::retrieval::Document;

/// Default generation temperature for the legal specialist: low, since
/// contractual readings should stay close to the source text.
const TEMPERATURE: f32 = 0.1;

/// Reviews contractual clauses, obligations, penalties and guarantees.
pub struct LegalAgent {
    llm: Arc<dyn Llm>,
}

impl LegalAgent {
    /// Builds a new legal specialist wired to `llm`.
    #[must_use]
    pub fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm }
    }
}

#[async_trait]
impl SpecialistAgent for LegalAgent {
    fn domain(&self) -> Domain {
        Domain::Legal
    }

    async fn generate(&self, question: &str, context: &[Document]) -> Result<String> {
        generate_with_llm(self.llm.as_ref(), Domain::Legal, question, context, TEMPERATURE, None).await
    }
}
