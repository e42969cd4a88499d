//! Centering force.
//!
//! Translates every node by the same offset so the mean position moves onto
//! the target point. Corrects positions, never velocities.

use super::{Force, TickContext};

/// The center force.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CenterForce {
    /// Target x (default: 0.0).
    pub x: f64,
    /// Target y (default: 0.0).
    pub y: f64,
    /// Fraction of the offset removed per tick (default: 1.0).
    pub strength: f64,
}

impl CenterForce {
    /// Center on a point at full strength.
    pub fn new(x: f64, y: f64) -> Self {
        Self {
            x,
            y,
            strength: 1.0,
        }
    }

    /// Set the strength.
    pub fn strength(mut self, strength: f64) -> Self {
        self.strength = strength;
        self
    }
}

impl Default for CenterForce {
    fn default() -> Self {
        Self::new(0.0, 0.0)
    }
}

impl Force for CenterForce {
    fn apply(&mut self, ctx: &mut TickContext<'_>) {
        let Some((mx, my)) = ctx.bodies.centroid() else {
            return;
        };
        let sx = (mx - self.x) * self.strength;
        let sy = (my - self.y) * self.strength;
        if !(sx.is_finite() && sy.is_finite()) {
            return;
        }

        for x in &mut ctx.bodies.x {
            *x -= sx;
        }
        for y in &mut ctx.bodies.y {
            *y -= sy;
        }
    }
}
