//! Graph engine: a registry of named async nodes joined by static and
//! conditional edges, executed against a single [`AgentState`] per request.

use std::collections::HashMap;
use std::future::Future;
use std::pin::Pin;

use crate::error::Result;

use super::state::{AgentState, StateUpdate};

/// A node's signature: takes the current state by reference, returns a
/// partial update.
pub type NodeFuture<'a> = Pin<Box<dyn Future<Output = Result<StateUpdate>> + Send + 'a>>;

/// Boxed node function.
pub type NodeFn = Box<dyn for<'a> Fn(&'a AgentState) -> NodeFuture<'a> + Send + Sync>;

/// Selector for a conditional edge: inspects the state, returns the name of
/// the branch to follow.
pub type EdgeSelector = Box<dyn Fn(&AgentState) -> &'static str + Send + Sync>;

/// The `END` sentinel node name.
pub const END: &str = "__end__";

/// The `START` sentinel node name.
pub const START: &str = "__start__";

enum Edge {
    Static(&'static str),
    Conditional { selector: EdgeSelector, branches: HashMap<&'static str, &'static str> },
}

/// A typed directed graph of async nodes.
pub struct Graph {
    nodes: HashMap<&'static str, NodeFn>,
    edges: HashMap<&'static str, Edge>,
}

impl Graph {
    /// Creates an empty graph with only the `START` edge unset.
    #[must_use]
    pub fn new() -> Self {
        Self { nodes: HashMap::new(), edges: HashMap::new() }
    }

    /// Registers a node under `name`.
    pub fn add_node(&mut self, name: &'static str, node: NodeFn) {
        self.nodes.insert(name, node);
    }

    /// Adds a static edge `from -> to`.
    pub fn add_edge(&mut self, from: &'static str, to: &'static str) {
        self.edges.insert(from, Edge::Static(to));
    }

    /// Adds a conditional edge: `selector(state)` picks a branch name, which
    /// `branches` maps to a destination node (or [`END`]).
    pub fn add_conditional_edge(
        &mut self,
        from: &'static str,
        selector: EdgeSelector,
        branches: HashMap<&'static str, &'static str>,
    ) {
        self.edges.insert(from, Edge::Conditional { selector, branches });
    }

    /// Runs the graph from `START` to `END`, returning the final state.
    ///
    /// # Errors
    ///
    /// Returns the first node error encountered; that node's partial update
    /// is discarded and the state as of the prior node is not further
    /// mutated.
    pub async fn run(&self, mut state: AgentState) -> Result<AgentState> {
        let mut current = self.next(START, &state)?;

        while current != END {
            let node = self.nodes.get(current).ok_or_else(|| crate::error::Error::Internal {
                message: format!("no node registered for '{current}'"),
            })?;

            let update = node(&state).await?;
            state.apply(update);

            current = self.next(current, &state)?;
        }

        Ok(state)
    }

    fn next<'a>(&'a self, from: &str, state: &AgentState) -> Result<&'a str> {
        match self.edges.get(from) {
            Some(Edge::Static(to)) => Ok(to),
            Some(Edge::Conditional { selector, branches }) => {
                let branch = selector(state);
                branches.get(branch).copied().ok_or_else(|| crate::error::Error::Internal {
                    message: format!("conditional edge from '{from}' has no branch '{branch}'"),
                })
            }
            None => Err(crate::error::Error::Internal { message: format!("no outgoing edge from '{from}'") }),
        }
    }
}

impl Default for Graph {
    fn default() -> Self {
        Self::new()
    }
}
