//! Positioned output records.

use std::collections::HashMap;

use serde::Serialize;
use serde_json::{Map, Value};

use crate::diagnostic::Diagnostic;
use crate::graph::{NodeId, NodeKey};
use crate::simulation::Simulation;
use crate::spatial::SpatialIndex;

/// A node record with its simulated state.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedNode {
    pub id: NodeKey,
    pub x: f64,
    pub y: f64,
    pub vx: f64,
    pub vy: f64,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fx: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fy: Option<f64>,
    /// Caller attributes, passed through untouched.
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

/// A link record with resolved endpoints.
///
/// `previous_source` / `previous_target` hold the endpoint nodes as they
/// were in the previous layout of the same session, for transitions.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionedLink {
    pub id: String,
    pub source: PositionedNode,
    pub target: PositionedNode,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_source: Option<PositionedNode>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub previous_target: Option<PositionedNode>,
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

/// A finished layout.
#[derive(Debug, Clone, Serialize)]
pub struct Layout {
    /// Nodes in input order, duplicates included.
    pub nodes: Vec<PositionedNode>,
    /// Links that resolved, in input order.
    pub links: Vec<PositionedLink>,
    /// Everything that was dropped, replaced or reset along the way.
    pub diagnostics: Vec<Diagnostic>,
    /// Ticks simulated.
    pub ticks: u64,
    #[serde(skip)]
    index: SpatialIndex,
}

impl Layout {
    /// Snapshot the current state of a simulation.
    ///
    /// Link endpoints are paired by key with the nodes of `previous`, when
    /// given.
    pub fn from_simulation(simulation: &Simulation, previous: Option<&Layout>) -> Self {
        let graph = simulation.graph();
        let bodies = graph.bodies();

        let nodes: Vec<PositionedNode> = graph
            .node_ids()
            .filter_map(|id| {
                let record = graph.node_record(id)?;
                let i = id.index();
                Some(PositionedNode {
                    id: record.id.clone(),
                    x: bodies.x[i],
                    y: bodies.y[i],
                    vx: bodies.vx[i],
                    vy: bodies.vy[i],
                    fx: bodies.fx[i],
                    fy: bodies.fy[i],
                    data: record.data.clone(),
                })
            })
            .collect();

        // First node per key, matching `Layout::node`
        let mut previous_by_key: HashMap<&NodeKey, &PositionedNode> = HashMap::new();
        for node in previous.map_or(&[][..], |layout| layout.nodes.as_slice()) {
            previous_by_key.entry(&node.id).or_insert(node);
        }
        let previous_node =
            |node: &PositionedNode| previous_by_key.get(&node.id).map(|&found| found.clone());

        let links = graph
            .links()
            .iter()
            .filter_map(|link| {
                let record = graph.link_record(link.id)?;
                let source = nodes.get(link.source.index())?.clone();
                let target = nodes.get(link.target.index())?.clone();
                Some(PositionedLink {
                    id: record.key(),
                    previous_source: previous_node(&source),
                    previous_target: previous_node(&target),
                    source,
                    target,
                    data: record.data.clone(),
                })
            })
            .collect();

        let diagnostics = graph
            .diagnostics()
            .iter()
            .chain(simulation.diagnostics())
            .cloned()
            .collect();

        let index = SpatialIndex::from_points(
            nodes
                .iter()
                .enumerate()
                .map(|(slot, node)| (NodeId(slot as u32), node.x, node.y)),
        );

        Self {
            nodes,
            links,
            diagnostics,
            ticks: simulation.tick_count(),
            index,
        }
    }

    /// First node with the given key.
    pub fn node(&self, key: &NodeKey) -> Option<&PositionedNode> {
        self.nodes.iter().find(|node| node.id == *key)
    }

    /// Bounding box of all nodes as (min_x, min_y, max_x, max_y).
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        let first = self.nodes.first()?;
        Some(self.nodes.iter().fold(
            (first.x, first.y, first.x, first.y),
            |(min_x, min_y, max_x, max_y), node| {
                (
                    min_x.min(node.x),
                    min_y.min(node.y),
                    max_x.max(node.x),
                    max_y.max(node.y),
                )
            },
        ))
    }

    /// Nearest node within `max_distance` of a point.
    pub fn node_at(&self, x: f64, y: f64, max_distance: f64) -> Option<&PositionedNode> {
        self.index
            .nearest_within(x, y, max_distance)
            .and_then(|id| self.nodes.get(id.index()))
    }

    /// All nodes inside a rectangle, in input order.
    pub fn nodes_in_rect(&self, min_x: f64, min_y: f64, max_x: f64, max_y: f64) -> Vec<&PositionedNode> {
        let mut slots: Vec<usize> = self
            .index
            .in_rect(min_x, min_y, max_x, max_y)
            .into_iter()
            .map(NodeId::index)
            .collect();
        slots.sort_unstable();
        slots.iter().filter_map(|&slot| self.nodes.get(slot)).collect()
    }

    /// All nodes within `radius` of a point, in input order.
    pub fn nodes_in_radius(&self, x: f64, y: f64, radius: f64) -> Vec<&PositionedNode> {
        let mut slots: Vec<usize> = self
            .index
            .in_radius(x, y, radius)
            .into_iter()
            .map(NodeId::index)
            .collect();
        slots.sort_unstable();
        slots.iter().filter_map(|&slot| self.nodes.get(slot)).collect()
    }

    /// Positions as `[x0, y0, x1, y1, ...]`.
    pub fn positions(&self) -> Vec<f64> {
        self.nodes.iter().flat_map(|node| [node.x, node.y]).collect()
    }
}
