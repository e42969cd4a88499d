//! Many-body charge force.
//!
//! Negative strength repels, positive strength attracts. Evaluated with a
//! Barnes-Hut quadtree rebuilt from the current positions every tick.

use super::{Force, TickContext};
use crate::diagnostic::Diagnostic;
use crate::graph::GraphModel;
use crate::spatial::{BarnesHut, QuadTree};

/// Default node strength.
pub const DEFAULT_STRENGTH: f64 = -30.0;

/// Default Barnes-Hut opening angle.
pub const DEFAULT_THETA: f64 = 0.9;

/// The charge force.
#[derive(Debug, Clone)]
pub struct ChargeForce {
    strength: f64,
    distance_min: f64,
    distance_max: f64,
    theta: f64,
    strengths: Vec<f64>,
}

impl ChargeForce {
    /// Repulsion of -30 between every pair, no distance cap.
    pub fn new() -> Self {
        Self {
            strength: DEFAULT_STRENGTH,
            distance_min: 1.0,
            distance_max: f64::INFINITY,
            theta: DEFAULT_THETA,
            strengths: Vec::new(),
        }
    }

    /// Set the per-node strength.
    pub fn strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }

    /// Distances below this are softened.
    pub fn distance_min(mut self, distance_min: f64) -> Self {
        self.distance_min = distance_min;
        self
    }

    /// Pairs at or beyond this distance do not interact.
    pub fn distance_max(mut self, distance_max: f64) -> Self {
        self.distance_max = distance_max;
        self
    }

    /// Barnes-Hut opening angle; 0 evaluates every pair exactly.
    pub fn theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self
    }
}

impl Default for ChargeForce {
    fn default() -> Self {
        Self::new()
    }
}

impl Force for ChargeForce {
    fn initialize(&mut self, graph: &GraphModel) -> Vec<Diagnostic> {
        self.strengths = vec![self.strength; graph.node_count()];
        Vec::new()
    }

    fn apply(&mut self, ctx: &mut TickContext<'_>) {
        let bodies = &*ctx.bodies;
        if bodies.len() < 2 || self.strength == 0.0 {
            return;
        }
        if self.strengths.len() != bodies.len() {
            self.strengths = vec![self.strength; bodies.len()];
        }

        let mut tree = QuadTree::build(&bodies.x, &bodies.y);
        tree.accumulate(&self.strengths);

        let params = BarnesHut {
            theta2: self.theta * self.theta,
            distance_min2: self.distance_min * self.distance_min,
            distance_max2: self.distance_max * self.distance_max,
            alpha: ctx.alpha,
        };

        for i in 0..bodies.len() {
            if bodies.is_fixed(i) || !(bodies.x[i].is_finite() && bodies.y[i].is_finite()) {
                continue;
            }
            let (vx, vy) = tree.force_on(i, &params, &self.strengths, ctx.random);
            ctx.dv.dvx[i] += vx;
            ctx.dv.dvy[i] += vy;
        }
    }
}
