//! Spring force between linked nodes.
//!
//! Each link pulls (or pushes) its endpoints toward a target separation. The
//! correction is split between the two ends by a per-link bias so that
//! low-degree nodes move more than hubs.

use std::fmt;
use std::rc::Rc;

use super::{Force, TickContext};
use crate::diagnostic::Diagnostic;
use crate::error::ConfigError;
use crate::graph::{GraphModel, ResolvedLink};

/// Target distance used when none is configured or a lookup fails.
pub const DEFAULT_LINK_DISTANCE: f64 = 30.0;

/// How the target distance of each link is chosen.
#[derive(Clone)]
pub enum LinkDistance {
    /// The same distance for every link.
    Constant(f64),
    /// Computed from the link and its endpoint records.
    Function(Rc<dyn Fn(&ResolvedLink<'_>) -> f64>),
    /// Read from the link's attributes, e.g. `"meta.distance"` or `"w[0]"`.
    /// `source.*` and `target.*` read the endpoint nodes.
    FieldPath(String),
}

impl LinkDistance {
    /// Wrap a closure.
    pub fn function(f: impl Fn(&ResolvedLink<'_>) -> f64 + 'static) -> Self {
        Self::Function(Rc::new(f))
    }

    /// Look the distance up by attribute path.
    pub fn field_path(path: impl Into<String>) -> Self {
        Self::FieldPath(path.into())
    }

    /// Check the variant's own parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Constant(d) if !d.is_finite() || *d < 0.0 => {
                Err(ConfigError::InvalidLinkDistance(*d))
            }
            Self::FieldPath(path) if path.trim().is_empty() => Err(ConfigError::EmptyFieldPath),
            _ => Ok(()),
        }
    }

    /// Collapse the variant into one lookup. `None` means no usable number.
    fn resolve(&self) -> Box<dyn Fn(&ResolvedLink<'_>) -> Option<f64> + '_> {
        match self {
            Self::Constant(d) => {
                let d = *d;
                Box::new(move |_: &ResolvedLink<'_>| Some(d))
            }
            Self::Function(f) => {
                Box::new(move |link: &ResolvedLink<'_>| Some(f(link)).filter(|d| d.is_finite()))
            }
            Self::FieldPath(path) => Box::new(move |link: &ResolvedLink<'_>| {
                link.lookup_f64(path).filter(|d| d.is_finite())
            }),
        }
    }
}

impl Default for LinkDistance {
    fn default() -> Self {
        Self::Constant(DEFAULT_LINK_DISTANCE)
    }
}

impl From<f64> for LinkDistance {
    fn from(distance: f64) -> Self {
        Self::Constant(distance)
    }
}

impl fmt::Debug for LinkDistance {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(d) => f.debug_tuple("Constant").field(d).finish(),
            Self::Function(_) => f.write_str("Function(..)"),
            Self::FieldPath(path) => f.debug_tuple("FieldPath").field(path).finish(),
        }
    }
}

/// How stiff each link is.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum LinkStrength {
    /// `1 / min(degree(source), degree(target))`.
    #[default]
    Degree,
    /// The same strength for every link.
    Constant(f64),
}

impl LinkStrength {
    pub fn validate(&self) -> Result<(), ConfigError> {
        match self {
            Self::Constant(s) if !s.is_finite() => Err(ConfigError::InvalidLinkStrength(*s)),
            _ => Ok(()),
        }
    }
}

/// Per-link values fixed at initialization.
#[derive(Debug, Clone, Copy, PartialEq)]
struct Spring {
    source: usize,
    target: usize,
    distance: f64,
    strength: f64,
    /// Share of the correction taken by the target.
    bias: f64,
}

/// The link force.
#[derive(Debug, Clone)]
pub struct LinkForce {
    distance: LinkDistance,
    strength: LinkStrength,
    iterations: usize,
    springs: Vec<Spring>,
}

impl LinkForce {
    /// Default distance and strength, one pass per tick.
    pub fn new() -> Self {
        Self {
            distance: LinkDistance::default(),
            strength: LinkStrength::default(),
            iterations: 1,
            springs: Vec::new(),
        }
    }

    /// Set the target distance.
    pub fn distance(mut self, distance: impl Into<LinkDistance>) -> Self {
        self.distance = distance.into();
        self
    }

    /// Set the stiffness.
    pub fn strength(mut self, strength: LinkStrength) -> Self {
        self.strength = strength;
        self
    }

    /// Set the number of relaxation passes per tick.
    pub fn iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    /// Target distance of every link, after initialization.
    pub fn distances(&self) -> Vec<f64> {
        self.springs.iter().map(|s| s.distance).collect()
    }

    /// Strength of every link, after initialization.
    pub fn strengths(&self) -> Vec<f64> {
        self.springs.iter().map(|s| s.strength).collect()
    }
}

impl Default for LinkForce {
    fn default() -> Self {
        Self::new()
    }
}

impl Force for LinkForce {
    fn initialize(&mut self, graph: &GraphModel) -> Vec<Diagnostic> {
        let lookup = self.distance.resolve();
        let mut diagnostics = Vec::new();

        self.springs = graph
            .links()
            .iter()
            .map(|link| {
                let distance = graph
                    .resolved_link(link)
                    .and_then(|resolved| match lookup(&resolved) {
                        Some(d) => Some(d),
                        None => {
                            diagnostics.push(
                                Diagnostic::DistanceFallback {
                                    link: resolved.key(),
                                    fallback: DEFAULT_LINK_DISTANCE,
                                }
                                .report(),
                            );
                            None
                        }
                    })
                    .unwrap_or(DEFAULT_LINK_DISTANCE);

                let source_degree = graph.degree(link.source) as f64;
                let target_degree = graph.degree(link.target) as f64;
                let strength = match self.strength {
                    LinkStrength::Degree => 1.0 / source_degree.min(target_degree),
                    LinkStrength::Constant(s) => s,
                };

                Spring {
                    source: link.source.index(),
                    target: link.target.index(),
                    distance,
                    strength,
                    bias: source_degree / (source_degree + target_degree),
                }
            })
            .collect();

        diagnostics
    }

    fn apply(&mut self, ctx: &mut TickContext<'_>) {
        let bodies = &*ctx.bodies;
        let dv = &mut *ctx.dv;

        for _ in 0..self.iterations {
            for spring in &self.springs {
                let (s, t) = (spring.source, spring.target);

                let mut x = bodies.x[t] + bodies.vx[t] + dv.dvx[t]
                    - (bodies.x[s] + bodies.vx[s] + dv.dvx[s]);
                let mut y = bodies.y[t] + bodies.vy[t] + dv.dvy[t]
                    - (bodies.y[s] + bodies.vy[s] + dv.dvy[s]);
                if x == 0.0 {
                    x = ctx.random.jiggle();
                }
                if y == 0.0 {
                    y = ctx.random.jiggle();
                }

                let l = (x * x + y * y).sqrt();
                let k = (l - spring.distance) / l * ctx.alpha * spring.strength;
                x *= k;
                y *= k;

                dv.dvx[t] -= x * spring.bias;
                dv.dvy[t] -= y * spring.bias;
                dv.dvx[s] += x * (1.0 - spring.bias);
                dv.dvy[s] += y * (1.0 - spring.bias);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::force::Accumulator;
    use crate::graph::{LinkRecord, NodeRecord};
    use crate::random::Lcg;
    use float_cmp::assert_approx_eq;

    fn model(positions: &[(&str, f64, f64)], links: Vec<LinkRecord>) -> GraphModel {
        let nodes: Vec<_> = positions
            .iter()
            .map(|&(key, x, y)| NodeRecord::new(key).with_position(x, y))
            .collect();
        GraphModel::from_records(&nodes, &links)
    }

    fn apply(force: &mut LinkForce, graph: &mut GraphModel, alpha: f64) -> Accumulator {
        let mut dv = Accumulator::default();
        dv.reset(graph.node_count());
        let mut random = Lcg::default();
        let mut ctx = TickContext {
            alpha,
            bodies: graph.bodies_mut(),
            dv: &mut dv,
            random: &mut random,
        };
        force.apply(&mut ctx);
        dv
    }

    #[test]
    fn test_single_link_correction() {
        let mut graph = model(&[("a", 0.0, 0.0), ("b", 10.0, 0.0)], vec![LinkRecord::new("a", "b")]);
        let mut force = LinkForce::new();
        assert!(force.initialize(&graph).is_empty());

        // k = (10 - 30) / 10 = -2, split evenly between equal-degree ends
        let dv = apply(&mut force, &mut graph, 1.0);
        assert_approx_eq!(f64, dv.dvx[0], -10.0, epsilon = 1e-9);
        assert_approx_eq!(f64, dv.dvx[1], 10.0, epsilon = 1e-9);
        // The zero y offset is jiggled, leaving only a tiny residue
        assert!(dv.dvy.iter().all(|v| v.abs() < 1e-6));
        assert_approx_eq!(f64, dv.dvy[0], -dv.dvy[1], epsilon = 1e-15);
    }

    #[test]
    fn test_alpha_scales_correction() {
        let mut graph = model(&[("a", 0.0, 0.0), ("b", 0.0, 60.0)], vec![LinkRecord::new("a", "b")]);
        let mut force = LinkForce::new();
        force.initialize(&graph);

        // k = (60 - 30) / 60 * 0.5 = 0.25; target moves -60 * 0.25 * 0.5
        let dv = apply(&mut force, &mut graph, 0.5);
        assert_approx_eq!(f64, dv.dvy[1], -7.5, epsilon = 1e-9);
        assert_approx_eq!(f64, dv.dvy[0], 7.5, epsilon = 1e-9);
    }

    #[test]
    fn test_degree_strength_and_bias() {
        let links = vec![
            LinkRecord::new("hub", "a"),
            LinkRecord::new("hub", "b"),
            LinkRecord::new("hub", "c"),
        ];
        let graph = model(
            &[("hub", 0.0, 0.0), ("a", 1.0, 0.0), ("b", 2.0, 0.0), ("c", 3.0, 0.0)],
            links,
        );
        let mut force = LinkForce::new();
        force.initialize(&graph);

        assert_eq!(force.strengths(), vec![1.0, 1.0, 1.0]);
        assert_eq!(force.springs[0].bias, 0.75);

        let mut force = LinkForce::new().strength(LinkStrength::Constant(0.2));
        force.initialize(&graph);
        assert_eq!(force.strengths(), vec![0.2, 0.2, 0.2]);
    }

    #[test]
    fn test_field_path_distance() {
        let links = vec![
            LinkRecord::new("a", "b").with_data("meta", serde_json::json!({ "len": [12.5] })),
            LinkRecord::new("b", "c"),
        ];
        let graph = model(&[("a", 0.0, 0.0), ("b", 1.0, 0.0), ("c", 2.0, 0.0)], links);
        let mut force = LinkForce::new().distance(LinkDistance::field_path("meta.len[0]"));

        let diagnostics = force.initialize(&graph);
        assert_eq!(force.distances(), vec![12.5, DEFAULT_LINK_DISTANCE]);
        assert_eq!(
            diagnostics,
            vec![Diagnostic::DistanceFallback {
                link: "b.c".into(),
                fallback: DEFAULT_LINK_DISTANCE
            }]
        );
    }

    #[test]
    fn test_field_path_reads_endpoint_nodes() {
        let nodes = vec![
            NodeRecord::new("a").with_data("size", 80),
            NodeRecord::new("b").with_data("size", 20),
        ];
        let links = vec![LinkRecord::new("a", "b"), LinkRecord::new("b", "a")];
        let graph = GraphModel::from_records(&nodes, &links);

        let mut force = LinkForce::new().distance(LinkDistance::field_path("source.size"));
        assert!(force.initialize(&graph).is_empty());
        assert_eq!(force.distances(), vec![80.0, 20.0]);

        let mut force = LinkForce::new().distance(LinkDistance::function(|link| {
            link.lookup_f64("source.size").unwrap_or(0.0) + link.lookup_f64("target.size").unwrap_or(0.0)
        }));
        force.initialize(&graph);
        assert_eq!(force.distances(), vec![100.0, 100.0]);
    }

    #[test]
    fn test_function_distance() {
        let links = vec![
            LinkRecord::new("a", "b").with_data("weight", 4.0),
            LinkRecord::new("b", "a"),
        ];
        let graph = model(&[("a", 0.0, 0.0), ("b", 1.0, 0.0)], links);
        let mut force = LinkForce::new().distance(LinkDistance::function(|record| {
            record.lookup_f64("weight").map_or(f64::NAN, |w| w * 10.0)
        }));

        let diagnostics = force.initialize(&graph);
        assert_eq!(force.distances(), vec![40.0, DEFAULT_LINK_DISTANCE]);
        assert_eq!(diagnostics.len(), 1);
    }

    #[test]
    fn test_coincident_endpoints_are_jiggled() {
        let mut graph = model(&[("a", 5.0, 5.0), ("b", 5.0, 5.0)], vec![LinkRecord::new("a", "b")]);
        let mut force = LinkForce::new();
        force.initialize(&graph);

        let dv = apply(&mut force, &mut graph, 1.0);
        assert!(dv.dvx.iter().chain(&dv.dvy).all(|v| v.is_finite()));
        assert!(dv.dvx[0] != 0.0 || dv.dvy[0] != 0.0);
    }

    #[test]
    fn test_validate() {
        assert!(LinkDistance::Constant(0.0).validate().is_ok());
        assert_eq!(
            LinkDistance::Constant(-1.0).validate(),
            Err(ConfigError::InvalidLinkDistance(-1.0))
        );
        assert_eq!(
            LinkDistance::field_path(" ").validate(),
            Err(ConfigError::EmptyFieldPath)
        );
        assert!(LinkStrength::Constant(f64::NAN).validate().is_err());
        assert_eq!(format!("{:?}", LinkDistance::function(|_| 1.0)), "Function(..)");
    }
}
