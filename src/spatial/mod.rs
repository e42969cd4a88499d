//! Spatial indexing.
//!
//! - `quadtree`: Barnes-Hut partition used by the charge force every tick
//! - `rtree`: R-tree over a finished layout for O(log n) hit testing

pub mod quadtree;
mod rtree;

pub use quadtree::{BarnesHut, QuadTree};
pub use rtree::{NodePoint, SpatialIndex};
