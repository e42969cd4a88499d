//! Velocity and position update.

use crate::force::Accumulator;
use crate::graph::Bodies;

/// Advances bodies by one time step from accumulated contributions.
///
/// Keeps the positions seen at the start of the tick so that a node whose
/// state turns non-finite can be put back.
#[derive(Debug, Clone, Default)]
pub struct Integrator {
    /// Fraction of velocity removed per step (default: 0.4).
    pub velocity_decay: f64,
    /// Step size (default: 1.0).
    pub time_step: f64,
    checkpoint_x: Vec<f64>,
    checkpoint_y: Vec<f64>,
}

impl Integrator {
    pub fn new(velocity_decay: f64, time_step: f64) -> Self {
        Self {
            velocity_decay,
            time_step,
            checkpoint_x: Vec::new(),
            checkpoint_y: Vec::new(),
        }
    }

    /// Remember the current positions.
    pub fn checkpoint(&mut self, bodies: &Bodies) {
        self.checkpoint_x.clone_from(&bodies.x);
        self.checkpoint_y.clone_from(&bodies.y);
    }

    /// Apply `dv` and move every body.
    ///
    /// Pinned axes snap to their override with zero velocity. Returns the
    /// slots that went non-finite and were reset to their checkpoint.
    pub fn integrate(&self, bodies: &mut Bodies, dv: &Accumulator) -> Vec<usize> {
        let dt = self.time_step;
        let keep = 1.0 - self.velocity_decay;
        let mut reset = Vec::new();

        for i in 0..bodies.len() {
            match bodies.fx[i] {
                Some(fx) => {
                    bodies.x[i] = fx;
                    bodies.vx[i] = 0.0;
                }
                None => {
                    bodies.vx[i] = (bodies.vx[i] + dv.dvx[i] * dt) * keep;
                    bodies.x[i] += bodies.vx[i] * dt;
                }
            }
            match bodies.fy[i] {
                Some(fy) => {
                    bodies.y[i] = fy;
                    bodies.vy[i] = 0.0;
                }
                None => {
                    bodies.vy[i] = (bodies.vy[i] + dv.dvy[i] * dt) * keep;
                    bodies.y[i] += bodies.vy[i] * dt;
                }
            }

            let finite = bodies.x[i].is_finite()
                && bodies.y[i].is_finite()
                && bodies.vx[i].is_finite()
                && bodies.vy[i].is_finite();
            if !finite {
                bodies.x[i] = last_finite(&self.checkpoint_x, i);
                bodies.y[i] = last_finite(&self.checkpoint_y, i);
                bodies.vx[i] = 0.0;
                bodies.vy[i] = 0.0;
                reset.push(i);
            }
        }

        reset
    }
}

fn last_finite(checkpoint: &[f64], i: usize) -> f64 {
    checkpoint
        .get(i)
        .copied()
        .filter(|v| v.is_finite())
        .unwrap_or(0.0)
}
