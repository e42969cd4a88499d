//! Simulation driver.
//!
//! Owns the graph, the forces and the energy schedule. Two ways to run:
//!
//! - **Step-N**: [`Simulation::tick`] advances a fixed number of ticks
//!   synchronously, ignoring the energy threshold.
//! - **Animated**: [`Simulation::start`] hands out a [`RunHandle`]; an
//!   external scheduler then calls [`Simulation::turn`] once per frame until
//!   the energy drops below `alpha_min` or the handle is stopped or dropped.

mod integrator;

use std::cell::Cell;
use std::rc::Rc;

use log::debug;

pub use integrator::Integrator;

use crate::diagnostic::Diagnostic;
use crate::error::ConfigError;
use crate::force::{Accumulator, Force, ForceRegistry, TickContext};
use crate::graph::{GraphModel, NodeId};
use crate::random::{DEFAULT_SEED, Lcg};

/// Default energy floor of an animated run.
pub const DEFAULT_ALPHA_MIN: f64 = 0.001;

/// Ticks an animated run takes to decay from 1 to `alpha_min`.
const DECAY_TICKS: f64 = 300.0;

/// Decay rate that takes alpha from 1 to `alpha_min` in 300 ticks.
pub fn alpha_decay_for(alpha_min: f64) -> f64 {
    1.0 - alpha_min.powf(1.0 / DECAY_TICKS)
}

/// Energy schedule and integration parameters.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimulationSettings {
    /// Initial energy (default: 1.0).
    pub alpha: f64,
    /// Animated runs end below this energy (default: 0.001).
    pub alpha_min: f64,
    /// Fraction of the gap to `alpha_target` closed per tick
    /// (default: `1 - 0.001^(1/300)`, about 0.0228).
    pub alpha_decay: f64,
    /// Energy the simulation settles toward (default: 0.0).
    pub alpha_target: f64,
    /// Fraction of velocity removed per tick (default: 0.4).
    pub velocity_decay: f64,
    /// Integration step (default: 1.0).
    pub time_step: f64,
    /// Jiggle seed (default: 1).
    pub seed: u32,
}

impl Default for SimulationSettings {
    fn default() -> Self {
        Self {
            alpha: 1.0,
            alpha_min: DEFAULT_ALPHA_MIN,
            alpha_decay: alpha_decay_for(DEFAULT_ALPHA_MIN),
            alpha_target: 0.0,
            velocity_decay: 0.4,
            time_step: 1.0,
            seed: DEFAULT_SEED,
        }
    }
}

impl SimulationSettings {
    /// Reject values the driver cannot run with.
    pub fn validate(&self) -> Result<(), ConfigError> {
        unit_range("alpha", self.alpha)?;
        unit_range("alphaTarget", self.alpha_target)?;
        unit_range("alphaDecay", self.alpha_decay)?;
        unit_range("velocityDecay", self.velocity_decay)?;
        if self.alpha_min <= 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "alphaMin",
                value: self.alpha_min,
                min: f64::MIN_POSITIVE,
                max: 1.0,
            });
        }
        unit_range("alphaMin", self.alpha_min)?;
        if !self.time_step.is_finite() || self.time_step <= 0.0 {
            return Err(ConfigError::InvalidTimeStep(self.time_step));
        }
        Ok(())
    }
}

fn unit_range(name: &'static str, value: f64) -> Result<(), ConfigError> {
    if (0.0..=1.0).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            min: 0.0,
            max: 1.0,
        })
    }
}

/// Outcome of one scheduler turn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Turn {
    /// One tick ran and the run continues.
    Ticked { alpha: f64 },
    /// One tick ran and the energy fell below `alpha_min`; the run ended.
    Converged,
    /// No run is active; nothing happened.
    Idle,
}

/// Handle to an animated run.
///
/// Stopping the handle, or dropping it, ends the run before the next turn.
#[derive(Debug)]
#[must_use = "dropping the handle stops the run"]
pub struct RunHandle {
    active: Rc<Cell<bool>>,
}

impl RunHandle {
    /// End the run.
    pub fn stop(&self) {
        self.active.set(false);
    }

    /// Whether the run is still live.
    pub fn is_active(&self) -> bool {
        self.active.get()
    }
}

impl Drop for RunHandle {
    fn drop(&mut self) {
        self.active.set(false);
    }
}

/// A force simulation over a graph.
#[derive(Debug)]
pub struct Simulation {
    graph: GraphModel,
    forces: ForceRegistry,
    settings: SimulationSettings,
    integrator: Integrator,
    accumulator: Accumulator,
    random: Lcg,
    alpha: f64,
    alpha_target: f64,
    tick_count: u64,
    run: Option<Rc<Cell<bool>>>,
    diagnostics: Vec<Diagnostic>,
}

impl Simulation {
    /// Build a simulation and initialize its forces against the graph.
    pub fn new(
        graph: GraphModel,
        mut forces: ForceRegistry,
        settings: SimulationSettings,
    ) -> Result<Self, ConfigError> {
        settings.validate()?;
        let diagnostics = forces.initialize_all(&graph);
        let accumulator = Accumulator::default();

        Ok(Self {
            integrator: Integrator::new(settings.velocity_decay, settings.time_step),
            random: Lcg::new(settings.seed),
            alpha: settings.alpha,
            alpha_target: settings.alpha_target,
            tick_count: 0,
            run: None,
            graph,
            forces,
            settings,
            accumulator,
            diagnostics,
        })
    }

    // =========================================================================
    // Ticking
    // =========================================================================

    /// Advance exactly `n` ticks, regardless of the current energy.
    pub fn tick(&mut self, n: usize) {
        for _ in 0..n {
            self.step();
        }
    }

    fn step(&mut self) {
        self.alpha += (self.alpha_target - self.alpha) * self.settings.alpha_decay;

        let bodies = self.graph.bodies_mut();
        self.accumulator.reset(bodies.len());
        self.integrator.checkpoint(bodies);

        let mut ctx = TickContext {
            alpha: self.alpha,
            bodies,
            dv: &mut self.accumulator,
            random: &mut self.random,
        };
        self.forces.apply_all(&mut ctx);

        let reset = self
            .integrator
            .integrate(self.graph.bodies_mut(), &self.accumulator);
        self.tick_count += 1;

        for slot in reset {
            if let Some(key) = self.graph.node_key(NodeId(slot as u32)) {
                self.diagnostics.push(
                    Diagnostic::NonFiniteReset {
                        node: key.clone(),
                        tick: self.tick_count,
                    }
                    .report(),
                );
            }
        }
    }

    /// Begin an animated run.
    ///
    /// Any previous run is stopped. Call [`Simulation::turn`] once per
    /// scheduler turn while the handle is live.
    pub fn start(&mut self) -> RunHandle {
        self.stop();
        let active = Rc::new(Cell::new(true));
        self.run = Some(Rc::clone(&active));
        debug!(
            "simulation started: {} nodes, alpha {:.4}",
            self.graph.node_count(),
            self.alpha
        );
        RunHandle { active }
    }

    /// Perform one scheduler turn of the animated run.
    pub fn turn(&mut self) -> Turn {
        if !self.is_running() {
            self.run = None;
            return Turn::Idle;
        }

        self.step();
        if self.alpha < self.settings.alpha_min {
            debug!("simulation converged after {} ticks", self.tick_count);
            self.stop();
            Turn::Converged
        } else {
            Turn::Ticked { alpha: self.alpha }
        }
    }

    /// Stop the animated run, if any.
    pub fn stop(&mut self) {
        if let Some(active) = self.run.take() {
            active.set(false);
        }
    }

    /// Whether an animated run is live.
    pub fn is_running(&self) -> bool {
        self.run.as_ref().is_some_and(|active| active.get())
    }

    // =========================================================================
    // Energy
    // =========================================================================

    /// Current energy.
    pub fn alpha(&self) -> f64 {
        self.alpha
    }

    /// Set the energy, e.g. to restart a settled layout.
    pub fn reheat(&mut self, alpha: f64) {
        self.alpha = alpha.clamp(0.0, 1.0);
    }

    /// Current energy target.
    pub fn alpha_target(&self) -> f64 {
        self.alpha_target
    }

    /// Keep the simulation warm (or let it cool) toward `target`.
    pub fn set_alpha_target(&mut self, target: f64) {
        self.alpha_target = target.clamp(0.0, 1.0);
    }

    /// Ticks performed so far, in either mode.
    pub fn tick_count(&self) -> u64 {
        self.tick_count
    }

    pub fn settings(&self) -> &SimulationSettings {
        &self.settings
    }

    // =========================================================================
    // Graph and Forces
    // =========================================================================

    /// The simulated graph.
    pub fn graph(&self) -> &GraphModel {
        &self.graph
    }

    /// Give the graph back, ending the simulation.
    pub fn into_graph(self) -> GraphModel {
        self.graph
    }

    /// Pin a node.
    pub fn fix(&mut self, id: NodeId, x: f64, y: f64) {
        self.graph.fix(id, x, y);
    }

    /// Release a pinned node.
    pub fn unfix(&mut self, id: NodeId) {
        self.graph.unfix(id);
    }

    /// Register a force, replacing any force of the same name in place.
    pub fn add_force(&mut self, name: impl Into<String>, mut force: impl Force + 'static) {
        let diagnostics = force.initialize(&self.graph);
        self.diagnostics.extend(diagnostics);
        self.forces.insert(name, force);
    }

    /// Unregister a force.
    pub fn remove_force(&mut self, name: &str) -> bool {
        self.forces.remove(name).is_some()
    }

    /// The registered forces.
    pub fn forces(&self) -> &ForceRegistry {
        &self.forces
    }

    /// Problems raised by the forces and the integrator.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Move the diagnostics out.
    pub fn take_diagnostics(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }
}
