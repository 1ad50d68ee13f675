//! Node implementations: `retrieve`, `grade_and_route`, `specialist`,
//! `quant`, `risk_sentinel`, and `refine`, each exposed as a `build(...)`
//! constructor closing over its dependencies into a [`crate::graph::engine::NodeFn`].

pub mod grade_route;
pub mod quant_node;
pub mod refine;
pub mod retrieve;
pub mod risk_node;
pub mod specialist;
