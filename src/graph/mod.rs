//! Graph data structures and operations.
//!
//! This module provides the graph model using petgraph's StableGraph for
//! stable node/link handles, with Structure of Arrays (SoA) layout for
//! positions and velocities so the force loops stay cache-friendly.

mod bodies;
mod link;
mod model;
mod node;
pub mod path;

pub use bodies::Bodies;
pub use link::{Link, LinkId, LinkRecord, ResolvedLink};
pub use model::GraphModel;
pub use node::{NodeId, NodeKey, NodeRecord};
