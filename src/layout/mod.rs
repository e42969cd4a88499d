//! Network layout.
//!
//! Turns caller node and link records into positioned records in one call:
//! copy the records into a [`GraphModel`], register the `link`, `charge` and
//! `center` forces from a [`LayoutConfig`], run a fixed number of ticks and
//! snapshot the result. [`LayoutSession`] adds transition history across
//! successive layouts.

mod output;
mod session;

use log::debug;

pub use output::{Layout, PositionedLink, PositionedNode};
pub use session::LayoutSession;

use crate::config::LayoutConfig;
use crate::error::{ConfigError, LayoutError};
use crate::force::{CenterForce, ChargeForce, ForceRegistry, LinkForce};
use crate::graph::{GraphModel, LinkRecord, NodeRecord};
use crate::simulation::Simulation;

/// Build the standard network simulation without running it.
pub fn build_simulation(
    nodes: &[NodeRecord],
    links: &[LinkRecord],
    config: &LayoutConfig,
) -> Result<Simulation, ConfigError> {
    config.validate()?;

    let graph = GraphModel::from_records(nodes, links);
    let (cx, cy) = config.center;
    let forces = ForceRegistry::new()
        .with(
            "link",
            LinkForce::new()
                .distance(config.link_distance.clone())
                .strength(config.link_strength)
                .iterations(config.link_iterations),
        )
        .with(
            "charge",
            ChargeForce::new()
                .strength(-config.repulsivity)
                .distance_min(config.distance_min)
                .distance_max(config.distance_max)
                .theta(config.theta),
        )
        .with(
            "center",
            CenterForce::new(cx, cy).strength(config.center_strength),
        );

    Simulation::new(graph, forces, config.simulation)
}

/// Lay out a graph synchronously.
pub fn compute_layout(
    nodes: &[NodeRecord],
    links: &[LinkRecord],
    config: &LayoutConfig,
) -> Result<Layout, LayoutError> {
    compute_with_previous(nodes, links, config, None)
}

fn compute_with_previous(
    nodes: &[NodeRecord],
    links: &[LinkRecord],
    config: &LayoutConfig,
    previous: Option<&Layout>,
) -> Result<Layout, LayoutError> {
    let mut simulation = build_simulation(nodes, links, config)?;
    simulation.tick(config.iterations);

    let layout = Layout::from_simulation(&simulation, previous);
    debug!(
        "layout: {} nodes, {} links, {} ticks, {} diagnostics",
        layout.nodes.len(),
        layout.links.len(),
        layout.ticks,
        layout.diagnostics.len()
    );
    Ok(layout)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diagnostic::{Diagnostic, Endpoint};
    use crate::force::{DEFAULT_LINK_DISTANCE, LinkDistance};
    use crate::graph::NodeKey;
    use float_cmp::assert_approx_eq;
    use serde_json::json;

    fn distance(layout: &Layout, a: &str, b: &str) -> f64 {
        let a = layout.node(&NodeKey::from(a)).unwrap();
        let b = layout.node(&NodeKey::from(b)).unwrap();
        ((a.x - b.x).powi(2) + (a.y - b.y).powi(2)).sqrt()
    }

    #[test]
    fn test_link_distance_is_realized() {
        let nodes = vec![NodeRecord::new("a"), NodeRecord::new("b")];
        let links = vec![LinkRecord::new("a", "b")];
        let config = LayoutConfig::default()
            .with_link_distance(50.0)
            .with_repulsivity(0.0)
            .with_iterations(300);

        let layout = compute_layout(&nodes, &links, &config).unwrap();
        assert_approx_eq!(f64, distance(&layout, "a", "b"), 50.0, epsilon = 1.0);
        assert_eq!(layout.ticks, 300);
    }

    #[test]
    fn test_single_node_moves_to_center() {
        let nodes = vec![NodeRecord::new("only")];
        let config = LayoutConfig::default()
            .with_center(100.0, 50.0)
            .with_iterations(50);

        let layout = compute_layout(&nodes, &[], &config).unwrap();
        let node = &layout.nodes[0];
        assert_approx_eq!(f64, node.x, 100.0, epsilon = 1e-6);
        assert_approx_eq!(f64, node.y, 50.0, epsilon = 1e-6);
    }

    #[test]
    fn test_unlinked_centroid_converges_to_center() {
        let nodes: Vec<_> = (0..8).map(|i| NodeRecord::new(format!("n{i}"))).collect();
        let config = LayoutConfig::default()
            .with_center(-20.0, 35.0)
            .with_theta(0.0)
            .with_iterations(120);

        let layout = compute_layout(&nodes, &[], &config).unwrap();
        let n = layout.nodes.len() as f64;
        let cx = layout.nodes.iter().map(|node| node.x).sum::<f64>() / n;
        let cy = layout.nodes.iter().map(|node| node.y).sum::<f64>() / n;
        assert_approx_eq!(f64, cx, -20.0, epsilon = 1e-6);
        assert_approx_eq!(f64, cy, 35.0, epsilon = 1e-6);

        // Repulsion spreads the nodes out
        let (min_x, _, max_x, _) = layout.bounds().unwrap();
        assert!(max_x - min_x > 10.0);
    }

    #[test]
    fn test_deterministic() {
        let nodes: Vec<_> = (0..12).map(|i| NodeRecord::new(i.to_string())).collect();
        let links: Vec<_> = (1..12)
            .map(|i| LinkRecord::new((i / 2).to_string(), i.to_string()))
            .collect();
        let config = LayoutConfig::default();

        let first = compute_layout(&nodes, &links, &config).unwrap();
        let second = compute_layout(&nodes, &links, &config).unwrap();
        assert_eq!(first.nodes, second.nodes);
        assert_eq!(first.links, second.links);
    }

    #[test]
    fn test_unresolved_link_does_not_disturb_layout() {
        let nodes = vec![NodeRecord::new("a"), NodeRecord::new("b"), NodeRecord::new("c")];
        let clean = vec![LinkRecord::new("a", "b"), LinkRecord::new("b", "c")];
        let mut dirty = clean.clone();
        dirty.insert(1, LinkRecord::new("b", "ghost"));
        let config = LayoutConfig::default();

        let expected = compute_layout(&nodes, &clean, &config).unwrap();
        let actual = compute_layout(&nodes, &dirty, &config).unwrap();

        assert_eq!(actual.nodes, expected.nodes);
        assert_eq!(actual.links.len(), 2);
        assert_eq!(
            actual.diagnostics,
            vec![Diagnostic::UnresolvedEndpoint {
                link: "b.ghost".into(),
                endpoint: Endpoint::Target,
                missing: "ghost".into(),
            }]
        );
    }

    #[test]
    fn test_fixed_nodes_stay_put() {
        let nodes = vec![
            NodeRecord::new("pin").with_fixed(25.0, 25.0),
            NodeRecord::new("free"),
        ];
        let links = vec![LinkRecord::new("pin", "free")];

        let layout = compute_layout(&nodes, &links, &LayoutConfig::default()).unwrap();
        let pin = &layout.nodes[0];
        assert_eq!((pin.x, pin.y), (25.0, 25.0));
        assert_eq!((pin.vx, pin.vy), (0.0, 0.0));
        assert_eq!(pin.fx, Some(25.0));
    }

    #[test]
    fn test_field_path_distance_with_fallback() {
        let nodes = vec![NodeRecord::new("a"), NodeRecord::new("b"), NodeRecord::new("c")];
        let links = vec![
            LinkRecord::new("a", "b").with_data("style", json!({ "length": 80 })),
            LinkRecord::new("b", "c"),
        ];
        let config = LayoutConfig::default().with_link_distance(LinkDistance::field_path("style.length"));

        let layout = compute_layout(&nodes, &links, &config).unwrap();
        assert_eq!(
            layout.diagnostics,
            vec![Diagnostic::DistanceFallback {
                link: "b.c".into(),
                fallback: DEFAULT_LINK_DISTANCE,
            }]
        );
        assert_eq!(layout.links[0].data["style"], json!({ "length": 80 }));
    }

    #[test]
    fn test_invalid_config_runs_nothing() {
        let nodes = vec![NodeRecord::new("a")];
        let config = LayoutConfig::default().with_distance_range(1.0, f64::NAN);

        let err = compute_layout(&nodes, &[], &config).unwrap_err();
        assert!(matches!(
            err,
            LayoutError::Config(ConfigError::InvertedDistanceRange { .. })
        ));
    }

    #[test]
    fn test_zero_iterations_returns_initial_placement() {
        let nodes = vec![NodeRecord::new("a").with_position(3.0, 4.0)];
        let config = LayoutConfig::default().with_iterations(0);

        let layout = compute_layout(&nodes, &[], &config).unwrap();
        assert_eq!((layout.nodes[0].x, layout.nodes[0].y), (3.0, 4.0));
        assert_eq!(layout.ticks, 0);
    }

    #[test]
    fn test_link_output_shape() {
        let nodes: Vec<NodeRecord> = serde_json::from_value(json!([
            { "id": 1, "color": "red" },
            { "id": 2 }
        ]))
        .unwrap();
        let links: Vec<LinkRecord> =
            serde_json::from_value(json!([{ "source": 1, "target": 2, "weight": 3 }])).unwrap();

        let layout = compute_layout(&nodes, &links, &LayoutConfig::default()).unwrap();
        let value = serde_json::to_value(&layout).unwrap();

        assert_eq!(value["nodes"][0]["id"], "1");
        assert_eq!(value["nodes"][0]["color"], "red");
        assert!(value["nodes"][0]["x"].is_f64());
        assert_eq!(value["links"][0]["id"], "1.2");
        assert_eq!(value["links"][0]["weight"], 3);
        assert_eq!(value["links"][0]["source"]["id"], "1");
        assert!(value["links"][0].get("previousSource").is_none());
        assert_eq!(value["ticks"], 90);
    }

    #[test]
    fn test_hit_testing() {
        let nodes = vec![
            NodeRecord::new("left").with_fixed(-50.0, 0.0),
            NodeRecord::new("right").with_fixed(50.0, 0.0),
            NodeRecord::new("top").with_fixed(0.0, 80.0),
        ];
        let layout = compute_layout(&nodes, &[], &LayoutConfig::default()).unwrap();

        assert_eq!(layout.node_at(48.0, 1.0, 5.0).map(|n| n.id.as_str()), Some("right"));
        assert!(layout.node_at(0.0, 0.0, 5.0).is_none());

        let hits: Vec<_> = layout
            .nodes_in_rect(-60.0, -10.0, 60.0, 10.0)
            .into_iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(hits, vec!["left", "right"]);

        let near: Vec<_> = layout
            .nodes_in_radius(0.0, 0.0, 51.0)
            .into_iter()
            .map(|n| n.id.as_str())
            .collect();
        assert_eq!(near, vec!["left", "right"]);
        assert!(layout.nodes_in_radius(0.0, 40.0, 5.0).is_empty());
        assert_eq!(layout.bounds(), Some((-50.0, 0.0, 50.0, 80.0)));
        assert_eq!(layout.positions(), vec![-50.0, 0.0, 50.0, 0.0, 0.0, 80.0]);
    }
}
