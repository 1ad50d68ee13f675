//! `grade_and_route` node: runs the document grader and the domain router
//! concurrently via `tokio::join!`, then merges their disjoint outputs.

use std::sync::Arc;

use crate::domain::{self, Domain, GRADER_PROMPT_BATCH, ROUTER_PROMPT, is_data_heavy_question};
use crate::graph::engine::{NodeFn, NodeFuture};
use crate::graph::state::{AgentState, StateUpdate};
use crate::llm::{Llm, Message};
use crate::retrieval::Document;

/// Parameters governing the grader's data-heavy safety net.
#[derive(Debug, Clone, Copy)]
pub struct GradeRouteConfig {
    /// Per-document char cap before sending to the grader.
    pub doc_truncation: usize,
    /// Minimum relevant-doc count before the safety net engages.
    pub safety_net_min_docs: usize,
    /// Fallback doc count used by the safety net.
    pub safety_net_fallback_docs: usize,
    /// Grader LLM temperature.
    pub grader_temperature: f32,
    /// Router LLM temperature.
    pub router_temperature: f32,
}

/// Builds the `grade_and_route` node.
#[must_use]
pub fn build(llm: Arc<dyn Llm>, config: GradeRouteConfig) -> NodeFn {
    Box::new(move |state: &AgentState| -> NodeFuture<'_> {
        let llm = Arc::clone(&llm);
        let question = state.question.clone();
        let context = state.context.clone();
        Box::pin(async move {
            let (filtered_context, domain) =
                tokio::join!(grade(llm.as_ref(), &question, &context, config), route(llm.as_ref(), &question, config));

            Ok(StateUpdate {
                filtered_context: Some(filtered_context?),
                domain: Some(domain?),
                ..StateUpdate::empty()
            })
        })
    })
}

async fn grade(
    llm: &dyn Llm,
    question: &str,
    context: &[Document],
    config: GradeRouteConfig,
) -> crate::error::Result<Vec<Document>> {
    if context.is_empty() {
        return Ok(Vec::new());
    }

    let truncated: Vec<String> = context
        .iter()
        .map(|d| {
            let boundary = crate::io::find_char_boundary(&d.content, config.doc_truncation);
            d.content[..boundary].to_string()
        })
        .collect();

    let documents_block =
        truncated.iter().enumerate().map(|(i, text)| format!("{i}: {text}")).collect::<Vec<_>>().join("\n\n");

    let prompt = GRADER_PROMPT_BATCH.replace("{question}", question).replace("{documents}", &documents_block);

    let response = llm.chat(&[Message::user(prompt)], config.grader_temperature).await?;
    let relevant_indices = parse_grader_response(&response.content, context.len());

    let mut filtered: Vec<Document> =
        relevant_indices.iter().filter_map(|&i| context.get(i).cloned()).collect();

    let needs_safety_net =
        is_data_heavy_question(question) && filtered.len() < config.safety_net_min_docs || filtered.is_empty();

    if needs_safety_net {
        filtered = context.iter().take(config.safety_net_fallback_docs).cloned().collect();
    }

    Ok(filtered)
}

fn parse_grader_response(raw: &str, doc_count: usize) -> Vec<usize> {
    let mut relevant = Vec::new();
    for line in raw.lines() {
        let Some((index_str, label)) = line.split_once(':') else { continue };
        let Ok(index) = index_str.trim().parse::<usize>() else { continue };
        if index >= doc_count {
            continue;
        }
        let label_lower = label.trim().to_lowercase();
        if label_lower.contains("relevant") && !label_lower.contains("not_relevant") {
            relevant.push(index);
        }
    }
    relevant
}

async fn route(llm: &dyn Llm, question: &str, config: GradeRouteConfig) -> crate::error::Result<Domain> {
    let prompt = ROUTER_PROMPT.replace("{question}", question);
    let response = llm.chat(&[Message::user(prompt)], config.router_temperature).await?;
    Ok(Domain::parse_routed(&response.content))
}

/// Re-exported for callers that want the raw prompt lookup without going
/// through the node (kept for symmetry with [`domain::prompt`]).
pub use domain::prompt as domain_prompt;
