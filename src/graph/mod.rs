//! Graph engine: typed state, the node registry, and the wired pipeline
//! graph described in the orchestration design.

pub mod engine;
pub mod state;

use std::collections::HashMap;
use std::sync::Arc;

use crate::config::Settings;
use crate::container::Container;
use crate::domain::Domain;
use crate::retrieval::RetrievalService;
use crate::risk::RiskScorer;

pub use engine::Graph;
pub use state::AgentState;

/// Builds the wired pipeline graph:
///
/// ```text
/// START -> retrieve
/// retrieve --cond(route_after_retrieve)--> grade_and_route | END
/// grade_and_route --cond(route_after_router)--> specialist | quant
/// specialist -> risk_sentinel
/// quant -> risk_sentinel
/// risk_sentinel --cond(should_continue_after_audit)--> refine | END
/// refine -> risk_sentinel
/// ```
#[must_use]
pub fn build_pipeline(
    container: &Container,
    retrieval: Arc<dyn RetrievalService>,
    scorer: Arc<dyn RiskScorer>,
    settings: &Settings,
) -> Graph {
    let mut graph = Graph::new();

    graph.add_edge(engine::START, "retrieve");
    graph.add_node("retrieve", crate::nodes::retrieve::build(retrieval, settings.retrieval_k));

    let mut after_retrieve = HashMap::new();
    after_retrieve.insert("end", engine::END);
    after_retrieve.insert("grade_and_route", "grade_and_route");
    graph.add_conditional_edge(
        "retrieve",
        Box::new(|state| if state.no_documents { "end" } else { "grade_and_route" }),
        after_retrieve,
    );

    graph.add_node(
        "grade_and_route",
        crate::nodes::grade_route::build(
            container.llm(),
            crate::nodes::grade_route::GradeRouteConfig {
                doc_truncation: settings.grader_doc_truncation,
                safety_net_min_docs: settings.safety_net_min_docs,
                safety_net_fallback_docs: settings.safety_net_fallback_docs,
                grader_temperature: settings.grader_temperature,
                router_temperature: settings.router_temperature,
            },
        ),
    );

    let mut after_router = HashMap::new();
    after_router.insert("quant", "quant");
    after_router.insert("specialist", "specialist");
    graph.add_conditional_edge(
        "grade_and_route",
        Box::new(|state| if state.domain == Domain::Quantitative { "quant" } else { "specialist" }),
        after_router,
    );

    graph.add_node("specialist", crate::nodes::specialist::build(container.factory()));
    graph.add_edge("specialist", "risk_sentinel");

    graph.add_node(
        "quant",
        crate::nodes::quant_node::build(
            container.llm(),
            crate::nodes::quant_node::QuantConfig {
                extract_temperature: settings.quant_extract_temperature,
                strategy_temperature: settings.quant_strategy_temperature,
                insight_temperature: settings.quant_insight_temperature,
            },
        ),
    );
    graph.add_edge("quant", "risk_sentinel");

    graph.add_node(
        "risk_sentinel",
        crate::nodes::risk_node::build(
            container.llm(),
            scorer,
            crate::nodes::risk_node::RiskConfig {
                temperature: settings.risk_temperature,
                context_max_chars: settings.context_max_chars,
                answer_max_chars: settings.answer_max_chars,
            },
        ),
    );

    let max_revisions = settings.max_audit_revisions;
    let mut after_audit = HashMap::new();
    after_audit.insert("refine", "refine");
    after_audit.insert("end", engine::END);
    graph.add_conditional_edge(
        "risk_sentinel",
        Box::new(move |state| {
            if state.audit_result == "fail" && state.revision_count < max_revisions { "refine" } else { "end" }
        }),
        after_audit,
    );

    graph.add_node("refine", crate::nodes::refine::build(container.llm(), settings.refine_temperature));
    graph.add_edge("refine", "risk_sentinel");

    graph
}
