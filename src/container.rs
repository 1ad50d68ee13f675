//! Dependency-injection container: lazy process-wide singletons for the LLM
//! client, the structured agent logger, and the specialist-agent factory.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::agents::{SpecialistAgent, build_agent};
use crate::domain::Domain;
use crate::error::Result;
use crate::llm::{HttpLlmClient, Llm};

/// Thin wrapper around `tracing` giving node implementations a uniform
/// enter/exit/error logging surface keyed by trace id.
#[derive(Debug, Default)]
pub struct AgentLogger;

impl AgentLogger {
    /// Logs entry into `node` for `trace_id`.
    pub fn node_enter(&self, trace_id: &str, node: &str) {
        tracing::debug!(trace_id, node, "node enter");
    }

    /// Logs exit from `node` for `trace_id`.
    pub fn node_exit(&self, trace_id: &str, node: &str) {
        tracing::debug!(trace_id, node, "node exit");
    }

    /// Logs an error raised by `node` for `trace_id`.
    pub fn error(&self, trace_id: &str, node: &str, message: &str) {
        tracing::error!(trace_id, node, message, "node error");
    }
}

/// Domain -> specialist constructor registry.
///
/// `create` builds a fresh agent per call (agents are cheap `Arc<dyn Llm>`
/// wrappers); the "registry" is the fixed domain -> constructor mapping
/// owned by [`build_agent`], instantiated lazily the first time a domain is
/// requested.
pub struct AgentFactory {
    llm: Arc<dyn Llm>,
}

impl AgentFactory {
    fn new(llm: Arc<dyn Llm>) -> Self {
        Self { llm }
    }

    /// Builds the specialist registered for `domain`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Validation`] if `domain` has no registered
    /// specialist (unknown or not-yet-registered, i.e. [`Domain::None`] or
    /// [`Domain::Quantitative`]).
    pub fn create(&self, domain: Domain) -> Result<Box<dyn SpecialistAgent>> {
        build_agent(domain, Arc::clone(&self.llm))
    }
}

/// Process-wide lazy singleton container.
pub struct Container {
    llm_base_url: String,
    llm_model: String,
    llm: Mutex<Option<Arc<dyn Llm>>>,
    logger: Mutex<Option<Arc<AgentLogger>>>,
    factory: Mutex<Option<Arc<AgentFactory>>>,
}

impl Container {
    /// Builds a container that lazily constructs an [`HttpLlmClient`]
    /// pointed at `llm_base_url`/`llm_model` on first access.
    #[must_use]
    pub fn new(llm_base_url: impl Into<String>, llm_model: impl Into<String>) -> Self {
        Self {
            llm_base_url: llm_base_url.into(),
            llm_model: llm_model.into(),
            llm: Mutex::new(None),
            logger: Mutex::new(None),
            factory: Mutex::new(None),
        }
    }

    /// Returns the shared LLM, constructing it on first access.
    #[must_use]
    pub fn llm(&self) -> Arc<dyn Llm> {
        let mut slot = self.llm.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        slot.get_or_insert_with(|| Arc::new(HttpLlmClient::new(self.llm_base_url.clone(), self.llm_model.clone())))
            .clone()
    }

    /// Returns the shared agent logger, constructing it on first access.
    #[must_use]
    pub fn logger(&self) -> Arc<AgentLogger> {
        let mut slot = self.logger.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        slot.get_or_insert_with(|| Arc::new(AgentLogger)).clone()
    }

    /// Returns the shared agent factory, constructing it (with the current
    /// LLM) on first access.
    #[must_use]
    pub fn factory(&self) -> Arc<AgentFactory> {
        let mut slot = self.factory.lock().unwrap_or_else(std::sync::PoisonError::into_inner);
        slot.get_or_insert_with(|| Arc::new(AgentFactory::new(self.llm()))).clone()
    }

    /// Clears every lazy slot; the next accessor rebuilds from scratch.
    pub fn reset(&self) {
        *self.llm.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        *self.logger.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
        *self.factory.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }

    /// Replaces the shared LLM with `llm` and invalidates the factory slot
    /// (since the factory closes over the old LLM instance). Used by tests
    /// to inject a [`crate::llm::ScriptedLlm`].
    pub fn override_llm(&self, llm: Arc<dyn Llm>) {
        *self.llm.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = Some(llm);
        *self.factory.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = None;
    }
}

/// Validates that `domain` names a closed-set value, for HTTP-facing
/// domain query params. Not used by the graph itself (which only ever
/// produces valid `Domain` values), but kept alongside the factory as the
/// natural "unknown domain" boundary check.
#[must_use]
pub fn known_domains() -> HashMap<&'static str, Domain> {
    [
        ("legal", Domain::Legal),
        ("technical", Domain::Technical),
        ("financial", Domain::Financial),
        ("timeline", Domain::Timeline),
        ("requirements", Domain::Requirements),
        ("general", Domain::General),
        ("quantitative", Domain::Quantitative),
    ]
    .into_iter()
    .collect()
}
