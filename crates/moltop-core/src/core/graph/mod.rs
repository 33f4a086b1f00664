//! # Graph Module
//!
//! A generic structural-comparison utility over an abstract vertex/edge/
//! payload model, independent of the topology's physical meaning.
//!
//! ## Overview
//!
//! Connectivity lives in an immutable [`container::EdgeContainer`]; per-vertex
//! payload lives in [`node::GraphNode`] objects attached to vertex ids. The
//! composed [`Graph`] derives a canonical string id from node content alone,
//! sorted canonically, so that two graphs compare equal exactly when they
//! carry the same multiset of node contents — regardless of vertex numbering
//! or edge structure. That content-only identity is the load-bearing rule of
//! this module.

pub mod container;
pub mod edge;
mod graph;
pub mod node;

pub use graph::{Graph, cmp_vert_node_pair};
pub use node::GraphNode;
