//! Forces and the force registry.
//!
//! A force reads the current node state and adds a velocity contribution to a
//! shared [`Accumulator`] (or, for centering, corrects positions directly).
//! All registered forces run in registration order each tick and their
//! contributions sum before integration.

mod center;
mod charge;
mod link;

use std::fmt;

pub use center::CenterForce;
pub use charge::ChargeForce;
pub use link::{DEFAULT_LINK_DISTANCE, LinkDistance, LinkForce, LinkStrength};

use crate::diagnostic::Diagnostic;
use crate::graph::{Bodies, GraphModel};
use crate::random::Lcg;

/// Per-node velocity contributions gathered during one tick.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Accumulator {
    pub dvx: Vec<f64>,
    pub dvy: Vec<f64>,
}

impl Accumulator {
    /// Zero the buffers, resizing them to `len` slots.
    pub fn reset(&mut self, len: usize) {
        self.dvx.clear();
        self.dvx.resize(len, 0.0);
        self.dvy.clear();
        self.dvy.resize(len, 0.0);
    }

    /// Number of slots.
    pub fn len(&self) -> usize {
        self.dvx.len()
    }

    /// Whether there are no slots.
    pub fn is_empty(&self) -> bool {
        self.dvx.is_empty()
    }
}

/// Everything a force may read or write during one tick.
pub struct TickContext<'a> {
    /// Current simulation energy.
    pub alpha: f64,
    /// Node state. Positions may be corrected in place; velocities are
    /// read-only by convention and changed through `dv`.
    pub bodies: &'a mut Bodies,
    /// Velocity contributions for this tick.
    pub dv: &'a mut Accumulator,
    /// Jiggle source for coincident nodes.
    pub random: &'a mut Lcg,
}

/// A force acting on the simulation.
pub trait Force {
    /// Precompute per-node or per-link values for a graph.
    ///
    /// Called when the simulation is built and whenever the force is
    /// registered on a live simulation. Returns any problems found.
    fn initialize(&mut self, graph: &GraphModel) -> Vec<Diagnostic> {
        let _ = graph;
        Vec::new()
    }

    /// Add this force's contribution for one tick.
    fn apply(&mut self, ctx: &mut TickContext<'_>);
}

/// Named forces, applied in insertion order.
#[derive(Default)]
pub struct ForceRegistry {
    forces: Vec<(String, Box<dyn Force>)>,
}

impl ForceRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`ForceRegistry::insert`].
    pub fn with(mut self, name: impl Into<String>, force: impl Force + 'static) -> Self {
        self.insert(name, force);
        self
    }

    /// Register a force.
    ///
    /// An existing force with the same name is replaced in place, keeping
    /// its position in the application order. Returns whether a force was
    /// replaced.
    pub fn insert(&mut self, name: impl Into<String>, force: impl Force + 'static) -> bool {
        self.insert_boxed(name.into(), Box::new(force))
    }

    pub(crate) fn insert_boxed(&mut self, name: String, force: Box<dyn Force>) -> bool {
        match self.forces.iter_mut().find(|(existing, _)| *existing == name) {
            Some(slot) => {
                slot.1 = force;
                true
            }
            None => {
                self.forces.push((name, force));
                false
            }
        }
    }

    /// Remove a force by name.
    pub fn remove(&mut self, name: &str) -> Option<Box<dyn Force>> {
        let position = self.forces.iter().position(|(existing, _)| existing == name)?;
        Some(self.forces.remove(position).1)
    }

    /// Look up a force by name.
    pub fn get(&self, name: &str) -> Option<&dyn Force> {
        self.forces
            .iter()
            .find(|(existing, _)| existing == name)
            .map(|(_, force)| force.as_ref())
    }

    /// Registered names in application order.
    pub fn names(&self) -> impl Iterator<Item = &str> + '_ {
        self.forces.iter().map(|(name, _)| name.as_str())
    }

    /// Number of registered forces.
    pub fn len(&self) -> usize {
        self.forces.len()
    }

    /// Whether no forces are registered.
    pub fn is_empty(&self) -> bool {
        self.forces.is_empty()
    }

    /// Initialize every force against a graph, collecting diagnostics.
    pub fn initialize_all(&mut self, graph: &GraphModel) -> Vec<Diagnostic> {
        self.forces
            .iter_mut()
            .flat_map(|(_, force)| force.initialize(graph))
            .collect()
    }

    /// Apply every force for one tick.
    pub fn apply_all(&mut self, ctx: &mut TickContext<'_>) {
        for (_, force) in &mut self.forces {
            force.apply(ctx);
        }
    }
}

impl fmt::Debug for ForceRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.names()).finish()
    }
}
