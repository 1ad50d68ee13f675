//! # rfp-orchestrator
//!
//! Multi-agent question-answering engine over procurement/RFP PDF corpora.
//!
//! A question is retrieved against an ingested document index, graded and
//! routed to one of several domain specialists (legal, technical, financial,
//! timeline, requirements, general, or a quantitative analyzer), and audited
//! by a risk/compliance sentinel before being returned. A bounded
//! refine-and-reaudit loop gives the sentinel a chance to push back on a
//! failing answer before the pipeline gives up and returns its best attempt.
//!
//! ## Modules
//!
//! - [`retrieval`]: the document index port and its SQLite-backed and
//!   in-memory implementations.
//! - [`domain`]: the closed set of specialist domains and their prompts.
//! - [`agents`]: one specialist per domain, sharing a generation contract.
//! - [`quant`]: the quantitative analyzer (data extraction, chart rendering,
//!   insight generation).
//! - [`risk`]: the risk/compliance sentinel.
//! - [`graph`]: the typed async-node orchestration engine and the wired
//!   pipeline.
//! - [`nodes`]: the graph node implementations.
//! - [`container`]: the dependency-injection container wiring nodes to the
//!   LLM client and agent factory.
//! - [`http`]: the Axum HTTP surface and response cache.
//! - [`config`]: environment-driven configuration.

#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![warn(clippy::nursery)]
#![warn(missing_docs)]
// Note: unsafe is needed for std::env::set_var/remove_var in config tests.
#![warn(unsafe_code)]

pub mod agents;
pub mod chunking;
pub mod config;
pub mod container;
pub mod core;
pub mod domain;
pub mod embedding;
pub mod error;
pub mod graph;
pub mod http;
pub mod io;
pub mod llm;
pub mod nodes;
pub mod quant;
pub mod retrieval;
pub mod risk;
pub mod search;

// Re-export commonly used types at crate root
pub use error::{Error, Result};

// Re-export config
pub use config::{AppEnv, Settings};

// Re-export domain types
pub use domain::Domain;

// Re-export the DI container
pub use container::Container;

// Re-export the graph engine
pub use graph::{AgentState, Graph};

// Re-export retrieval types
pub use retrieval::{Document, InMemoryRetrievalService, PdfRetrievalService, RetrievalService};

// Re-export LLM types
pub use llm::{HttpLlmClient, Llm, Message};

// Re-export risk types
pub use risk::{RiskScorer, WeightedRiskScorer};

// Re-export the HTTP surface
pub use http::{build_router, AppState};
