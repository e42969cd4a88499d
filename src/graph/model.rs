//! GraphModel - Node arena and resolved links.
//!
//! The GraphModel stores the topology using petgraph's StableGraph and keeps
//! positions and velocities in SoA (Structure of Arrays) buffers so the force
//! loops run over plain slices. Caller records are copied on ingestion; the
//! simulation never touches caller-owned data.

use petgraph::stable_graph::{NodeIndex, StableGraph};
use petgraph::{Directed, Direction};
use std::collections::HashMap;
use std::f64::consts::PI;

use super::bodies::Bodies;
use super::link::{Link, LinkId, LinkRecord, ResolvedLink};
use super::node::{NodeId, NodeKey, NodeRecord};
use crate::diagnostic::{Diagnostic, Endpoint};

/// Radius scale of the initial placement spiral.
const INITIAL_RADIUS: f64 = 10.0;

/// The graph being laid out.
///
/// This struct manages:
/// - Graph topology via petgraph
/// - Position/velocity buffers in SoA layout
/// - Fixed-position overrides
/// - Mapping between caller keys and node handles
/// - Ingestion diagnostics
#[derive(Debug, Clone)]
pub struct GraphModel {
    /// The underlying graph structure.
    /// Nodes store their handle, edges store their link handle.
    graph: StableGraph<NodeId, LinkId, Directed>,

    /// Map from caller key to petgraph NodeIndex
    key_to_index: HashMap<NodeKey, NodeIndex>,

    /// Copied node records, indexed by slot
    records: Vec<NodeRecord>,

    /// Resolved links, in input order
    links: Vec<Link>,

    /// Copied link records, indexed by LinkId
    link_records: Vec<LinkRecord>,

    /// Kinematic state
    bodies: Bodies,

    /// Problems found while ingesting records
    diagnostics: Vec<Diagnostic>,
}

impl GraphModel {
    /// Create a new empty model.
    pub fn new() -> Self {
        Self {
            graph: StableGraph::new(),
            key_to_index: HashMap::new(),
            records: Vec::new(),
            links: Vec::new(),
            link_records: Vec::new(),
            bodies: Bodies::default(),
            diagnostics: Vec::new(),
        }
    }

    /// Create a model with pre-allocated capacity.
    pub fn with_capacity(node_capacity: usize, link_capacity: usize) -> Self {
        Self {
            graph: StableGraph::with_capacity(node_capacity, link_capacity),
            key_to_index: HashMap::with_capacity(node_capacity),
            records: Vec::with_capacity(node_capacity),
            links: Vec::with_capacity(link_capacity),
            link_records: Vec::with_capacity(link_capacity),
            bodies: Bodies::with_capacity(node_capacity),
            diagnostics: Vec::new(),
        }
    }

    /// Build a model from caller records.
    ///
    /// Links whose endpoints cannot be resolved are dropped and recorded as
    /// diagnostics; see [`GraphModel::diagnostics`].
    pub fn from_records(nodes: &[NodeRecord], links: &[LinkRecord]) -> Self {
        let mut model = Self::with_capacity(nodes.len(), links.len());

        for record in nodes {
            model.add_node(record.clone());
        }

        for record in links {
            if let Err(diagnostic) = model.add_link(record.clone()) {
                model.diagnostics.push(diagnostic);
            }
        }

        model
    }

    // =========================================================================
    // Node Operations
    // =========================================================================

    /// Add a node from its record.
    ///
    /// Missing positions are placed on a phyllotaxis spiral so that the
    /// initial layout is deterministic and free of coincident nodes.
    pub fn add_node(&mut self, record: NodeRecord) -> NodeId {
        let slot = self.records.len();
        let id = NodeId(slot as u32);

        let fixed = (finite(record.fx), finite(record.fy));
        let mut position = (
            fixed.0.or(finite(record.x)).unwrap_or(f64::NAN),
            fixed.1.or(finite(record.y)).unwrap_or(f64::NAN),
        );
        if position.0.is_nan() || position.1.is_nan() {
            position = spiral_position(slot);
        }
        let velocity = match (finite(record.vx), finite(record.vy)) {
            (Some(vx), Some(vy)) => (vx, vy),
            _ => (0.0, 0.0),
        };

        let index = self.graph.add_node(id);
        if self.key_to_index.insert(record.id.clone(), index).is_some() {
            self.diagnostics.push(
                Diagnostic::DuplicateNodeKey {
                    key: record.id.clone(),
                    index: slot,
                }
                .report(),
            );
        }

        self.bodies.push(position, velocity, fixed);
        self.records.push(record);
        id
    }

    /// Get the number of nodes.
    pub fn node_count(&self) -> usize {
        self.records.len()
    }

    /// Resolve a caller key to a node handle.
    pub fn node_id(&self, key: &NodeKey) -> Option<NodeId> {
        self.key_to_index
            .get(key)
            .and_then(|&index| self.graph.node_weight(index).copied())
    }

    /// Get the caller key of a node.
    pub fn node_key(&self, id: NodeId) -> Option<&NodeKey> {
        self.records.get(id.index()).map(|record| &record.id)
    }

    /// Get the copied record of a node.
    pub fn node_record(&self, id: NodeId) -> Option<&NodeRecord> {
        self.records.get(id.index())
    }

    /// Iterate over all node handles in slot order.
    pub fn node_ids(&self) -> impl Iterator<Item = NodeId> + '_ {
        (0..self.records.len()).map(|slot| NodeId(slot as u32))
    }

    /// Get a node's position.
    pub fn position(&self, id: NodeId) -> Option<(f64, f64)> {
        let i = id.index();
        (i < self.bodies.len()).then(|| (self.bodies.x[i], self.bodies.y[i]))
    }

    /// Get a node's velocity.
    pub fn velocity(&self, id: NodeId) -> Option<(f64, f64)> {
        let i = id.index();
        (i < self.bodies.len()).then(|| (self.bodies.vx[i], self.bodies.vy[i]))
    }

    /// Set a node's position.
    pub fn set_position(&mut self, id: NodeId, x: f64, y: f64) {
        let i = id.index();
        if i < self.bodies.len() {
            self.bodies.x[i] = x;
            self.bodies.y[i] = y;
        }
    }

    /// Pin a node at a position (excluded from force accumulation).
    pub fn fix(&mut self, id: NodeId, x: f64, y: f64) {
        let i = id.index();
        if i < self.bodies.len() {
            self.bodies.fx[i] = Some(x);
            self.bodies.fy[i] = Some(y);
            self.bodies.x[i] = x;
            self.bodies.y[i] = y;
            self.bodies.vx[i] = 0.0;
            self.bodies.vy[i] = 0.0;
        }
    }

    /// Release a pinned node.
    pub fn unfix(&mut self, id: NodeId) {
        let i = id.index();
        if i < self.bodies.len() {
            self.bodies.fx[i] = None;
            self.bodies.fy[i] = None;
        }
    }

    /// Check if a node is pinned on both axes.
    pub fn is_fixed(&self, id: NodeId) -> bool {
        let i = id.index();
        i < self.bodies.len() && self.bodies.is_fixed(i)
    }

    // =========================================================================
    // Link Operations
    // =========================================================================

    /// Resolve and add a link.
    ///
    /// Fails with a diagnostic, leaving the model unchanged, if either
    /// endpoint key has no matching node.
    pub fn add_link(&mut self, record: LinkRecord) -> Result<LinkId, Diagnostic> {
        let source = self.resolve_endpoint(&record, Endpoint::Source)?;
        let target = self.resolve_endpoint(&record, Endpoint::Target)?;

        let id = LinkId(self.links.len() as u32);
        self.graph.add_edge(source, target, id);

        let source = self.graph[source];
        let target = self.graph[target];
        self.links.push(Link { id, source, target });
        self.link_records.push(record);

        Ok(id)
    }

    fn resolve_endpoint(
        &self,
        record: &LinkRecord,
        endpoint: Endpoint,
    ) -> Result<NodeIndex, Diagnostic> {
        let key = match endpoint {
            Endpoint::Source => &record.source,
            Endpoint::Target => &record.target,
        };
        self.key_to_index.get(key).copied().ok_or_else(|| {
            Diagnostic::UnresolvedEndpoint {
                link: record.key(),
                endpoint,
                missing: key.clone(),
            }
            .report()
        })
    }

    /// Get the number of resolved links.
    pub fn link_count(&self) -> usize {
        self.links.len()
    }

    /// Resolved links in input order.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Get the copied record of a link.
    pub fn link_record(&self, id: LinkId) -> Option<&LinkRecord> {
        self.link_records.get(id.0 as usize)
    }

    /// A link with its record and both endpoint records.
    pub fn resolved_link(&self, link: &Link) -> Option<ResolvedLink<'_>> {
        Some(ResolvedLink {
            record: self.link_record(link.id)?,
            source: self.node_record(link.source)?,
            target: self.node_record(link.target)?,
        })
    }

    /// Number of link endpoints touching a node.
    ///
    /// A self-link counts twice.
    pub fn degree(&self, id: NodeId) -> usize {
        let index = NodeIndex::new(id.index());
        if !self.graph.contains_node(index) {
            return 0;
        }
        self.graph.edges_directed(index, Direction::Outgoing).count()
            + self.graph.edges_directed(index, Direction::Incoming).count()
    }

    /// Get neighbors of a node, in either direction, without duplicates.
    pub fn neighbors(&self, id: NodeId) -> Vec<NodeId> {
        let index = NodeIndex::new(id.index());
        if !self.graph.contains_node(index) {
            return Vec::new();
        }
        let mut neighbors: Vec<NodeId> = self
            .graph
            .neighbors_undirected(index)
            .filter_map(|n| self.graph.node_weight(n).copied())
            .collect();
        neighbors.sort_unstable();
        neighbors.dedup();
        neighbors
    }

    // =========================================================================
    // Buffer Access
    // =========================================================================

    /// Kinematic state.
    pub fn bodies(&self) -> &Bodies {
        &self.bodies
    }

    /// Mutable kinematic state.
    pub fn bodies_mut(&mut self) -> &mut Bodies {
        &mut self.bodies
    }

    /// Get the bounding box of all nodes as (min_x, min_y, max_x, max_y).
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        self.bodies.bounds()
    }

    /// Get the mean position of all nodes.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        self.bodies.centroid()
    }

    // =========================================================================
    // Diagnostics
    // =========================================================================

    /// Problems found while ingesting records.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Move the ingestion diagnostics out of the model.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}

impl Default for GraphModel {
    fn default() -> Self {
        Self::new()
    }
}

fn finite(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite())
}

/// Position of slot `i` on the phyllotaxis spiral.
fn spiral_position(i: usize) -> (f64, f64) {
    let initial_angle = PI * (3.0 - 5.0_f64.sqrt());
    let radius = INITIAL_RADIUS * (0.5 + i as f64).sqrt();
    let angle = i as f64 * initial_angle;
    (radius * angle.cos(), radius * angle.sin())
}
