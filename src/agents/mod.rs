//! Specialist agents: one per domain, sharing a common generation contract,
//! plus the deterministic skill sidecars two of them consult.

mod financial;
mod general;
mod legal;
mod requirements;
pub mod skills;
mod technical;
mod timeline;

pub use financial::FinancialAgent;
pub use general::GeneralAgent;
pub use legal::LegalAgent;
pub use requirements::RequirementsAgent;
pub use technical::TechnicalAgent;
pub use timeline::TimelineAgent;

use std::sync::Arc;

use async_trait::async_trait;

use crate::domain::Domain;
use crate::error::{Error, Result};
use crate::llm::{Llm, Message};
use crate::retrieval::Document;

/// Separator used to flatten retrieved documents into a single context
/// string.
pub const CONTEXT_SEPARATOR: &str = "\n\n---\n\n";

/// Marker appended when context is truncated to a maximum length.
pub const TRUNCATION_MARKER: &str = "\n\n[... contenido truncado ...]";

/// Domain-specific "no relevant information" fallback, returned without
/// calling the LLM when the flattened context is whitespace-only.
#[must_use]
pub fn no_context_message(domain: Domain) -> String {
    format!(
        "No se encontró información relevante en los documentos para responder esta pregunta \
         desde la perspectiva de {}.",
        domain.key()
    )
}

/// Flattens documents into a single string, joined by [`CONTEXT_SEPARATOR`],
/// truncating (with [`TRUNCATION_MARKER`]) if it exceeds `max_chars`.
#[must_use]
pub fn flatten_context(docs: &[Document], max_chars: Option<usize>) -> String {
    let joined = docs
        .iter()
        .map(|d| d.content.as_str())
        .collect::<Vec<_>>()
        .join(CONTEXT_SEPARATOR);

    match max_chars {
        Some(max) if joined.len() > max => {
            let boundary = crate::io::find_char_boundary(&joined, max);
            format!("{}{}", &joined[..boundary], TRUNCATION_MARKER)
        }
        _ => joined,
    }
}

/// Contract shared by every domain specialist.
#[async_trait]
pub trait SpecialistAgent: Send + Sync {
    /// The domain this agent answers for.
    fn domain(&self) -> Domain;

    /// Generates an answer to `question` using `context`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::AgentProcessing`] wrapping the node name
    /// (`specialist_<domain>`) if the LLM call fails.
    async fn generate(&self, question: &str, context: &[Document]) -> Result<String>;
}

/// Shared generation flow used by every specialist: flatten context, short
/// circuit on empty context, build the two-message prompt, invoke the LLM.
pub(crate) async fn generate_with_llm(
    llm: &dyn Llm,
    domain: Domain,
    question: &str,
    context: &[Document],
    temperature: f32,
    extra_context: Option<&str>,
) -> Result<String> {
    let context_text = flatten_context(context, None);

    if context_text.trim().is_empty() {
        return Ok(no_context_message(domain));
    }

    let mut user_context = context_text;
    if let Some(extra) = extra_context {
        user_context.push_str("\n\n[SKILL]\n");
        user_context.push_str(extra);
    }

    let system = format!("{}\n\n{}", domain.system_prompt(), RESPONSE_FORMAT_CLAUSE);
    let user = format!("Contexto del documento:\n{user_context}\n\nPregunta: {question}");

    let messages = vec![Message::system(system), Message::user(user)];

    let response = llm.chat(&messages, temperature).await.map_err(|e| Error::AgentProcessing {
        domain: domain.key().to_string(),
        message: e.to_string(),
    })?;

    Ok(response.content)
}

const RESPONSE_FORMAT_CLAUSE: &str = "Responde en español, de forma clara y concisa, citando \
el documento y la página cuando sea posible. No inventes información que no esté en el contexto.";

/// Constructs a [`SpecialistAgent`] for `domain`, wired with the shared LLM.
///
/// # Errors
///
/// Returns [`Error::Validation`] if `domain` has no registered specialist
/// (i.e. is [`Domain::None`] or [`Domain::Quantitative`], which is handled
/// by the quant node instead).
pub fn build_agent(domain: Domain, llm: Arc<dyn Llm>) -> Result<Box<dyn SpecialistAgent>> {
    match domain {
        Domain::Legal => Ok(Box::new(LegalAgent::new(llm))),
        Domain::Technical => Ok(Box::new(TechnicalAgent::new(llm))),
        Domain::Financial => Ok(Box::new(FinancialAgent::new(llm))),
        Domain::Timeline => Ok(Box::new(TimelineAgent::new(llm))),
        Domain::Requirements => Ok(Box::new(RequirementsAgent::new(llm))),
        Domain::General => Ok(Box::new(GeneralAgent::new(llm))),
        Domain::Quantitative | Domain::None => Err(Error::Validation {
            message: format!("no specialist registered for domain '{}'", domain.key()),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_context_joins_with_separator() {
        let docs = vec![
            Document::new("first", "a.pdf", 1),
            Document::new("second", "a.pdf", 2),
        ];
        let flattened = flatten_context(&docs, None);
        assert_eq!(flattened, "first\n\n---\n\nsecond");
    }

    #[test]
    fn test_flatten_context_truncates() {
        let docs = vec![Document::new("a".repeat(100), "a.pdf", 1)];
        let flattened = flatten_context(&docs, Some(10));
        assert!(flattened.starts_with("aaaaaaaaaa"));
        assert!(flattened.ends_with(TRUNCATION_MARKER));
    }

    #[test]
    fn test_build_agent_rejects_quantitative() {
        let llm: Arc<dyn Llm> = Arc::new(crate::llm::ScriptedLlm::new("x"));
        assert!(build_agent(Domain::Quantitative, llm).is_err());
    }

    #[test]
    fn test_build_agent_accepts_legal() {
        let llm: Arc<dyn Llm> = Arc::new(crate::llm::ScriptedLlm::new("x"));
        assert!(build_agent(Domain::Legal, llm).is_ok());
    }
}
