//! Layout configuration.
//!
//! [`LayoutConfig`] is the typed configuration used from Rust. [`LayoutOptions`]
//! is its loosely typed mirror for JSON and JavaScript callers: every field is
//! optional and falls back to the network defaults.

use serde::Deserialize;

use crate::error::ConfigError;
use crate::force::{DEFAULT_LINK_DISTANCE, LinkDistance, LinkStrength};
use crate::simulation::{SimulationSettings, alpha_decay_for};

/// Default repulsion between every pair of nodes.
pub const DEFAULT_REPULSIVITY: f64 = 10.0;

/// Default number of synchronous ticks.
pub const DEFAULT_ITERATIONS: usize = 90;

/// Configuration of a network layout.
#[derive(Debug, Clone)]
pub struct LayoutConfig {
    /// Target distance of each link (default: 30).
    pub link_distance: LinkDistance,
    /// Stiffness of each link (default: degree based).
    pub link_strength: LinkStrength,
    /// Link relaxation passes per tick (default: 1).
    pub link_iterations: usize,
    /// Strength of the pairwise repulsion; the charge force uses its
    /// negation (default: 10).
    pub repulsivity: f64,
    /// Distance floor of the charge force (default: 1).
    pub distance_min: f64,
    /// Distance cap of the charge force (default: infinity).
    pub distance_max: f64,
    /// Barnes-Hut opening angle (default: 0.9).
    pub theta: f64,
    /// Point the layout is centered on (default: (0, 0)).
    pub center: (f64, f64),
    /// Strength of the centering correction (default: 1).
    pub center_strength: f64,
    /// Synchronous ticks to run (default: 90).
    pub iterations: usize,
    /// Energy schedule and integration parameters.
    pub simulation: SimulationSettings,
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            link_distance: LinkDistance::Constant(DEFAULT_LINK_DISTANCE),
            link_strength: LinkStrength::Degree,
            link_iterations: 1,
            repulsivity: DEFAULT_REPULSIVITY,
            distance_min: 1.0,
            distance_max: f64::INFINITY,
            theta: 0.9,
            center: (0.0, 0.0),
            center_strength: 1.0,
            iterations: DEFAULT_ITERATIONS,
            simulation: SimulationSettings::default(),
        }
    }
}

impl LayoutConfig {
    pub fn with_link_distance(mut self, link_distance: impl Into<LinkDistance>) -> Self {
        self.link_distance = link_distance.into();
        self
    }

    pub fn with_link_strength(mut self, link_strength: LinkStrength) -> Self {
        self.link_strength = link_strength;
        self
    }

    pub fn with_repulsivity(mut self, repulsivity: f64) -> Self {
        self.repulsivity = repulsivity;
        self
    }

    pub fn with_distance_range(mut self, distance_min: f64, distance_max: f64) -> Self {
        self.distance_min = distance_min;
        self.distance_max = distance_max;
        self
    }

    pub fn with_theta(mut self, theta: f64) -> Self {
        self.theta = theta;
        self
    }

    pub fn with_center(mut self, x: f64, y: f64) -> Self {
        self.center = (x, y);
        self
    }

    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations;
        self
    }

    pub fn with_simulation(mut self, simulation: SimulationSettings) -> Self {
        self.simulation = simulation;
        self
    }

    /// Check every parameter. Nothing is simulated with a config that fails
    /// here.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.link_distance.validate()?;
        self.link_strength.validate()?;

        if !self.repulsivity.is_finite() {
            return Err(ConfigError::InvalidRepulsivity(self.repulsivity));
        }
        if !self.distance_min.is_finite() || self.distance_min < 0.0 {
            return Err(ConfigError::InvalidDistanceMin(self.distance_min));
        }
        // NaN fails this comparison too
        if !(self.distance_max >= self.distance_min) {
            return Err(ConfigError::InvertedDistanceRange {
                min: self.distance_min,
                max: self.distance_max,
            });
        }
        if !self.theta.is_finite() || self.theta < 0.0 {
            return Err(ConfigError::OutOfRange {
                name: "theta",
                value: self.theta,
                min: 0.0,
                max: f64::MAX,
            });
        }
        let (cx, cy) = self.center;
        if !cx.is_finite() || !cy.is_finite() {
            return Err(ConfigError::NonFiniteCenter(cx, cy));
        }
        if !self.center_strength.is_finite() {
            return Err(ConfigError::OutOfRange {
                name: "centerStrength",
                value: self.center_strength,
                min: f64::MIN,
                max: f64::MAX,
            });
        }

        self.simulation.validate()
    }
}

/// A link distance as it arrives from JSON: a number or a field path.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum LinkDistanceOption {
    Constant(f64),
    FieldPath(String),
}

impl From<LinkDistanceOption> for LinkDistance {
    fn from(option: LinkDistanceOption) -> Self {
        match option {
            LinkDistanceOption::Constant(d) => Self::Constant(d),
            LinkDistanceOption::FieldPath(path) => Self::FieldPath(path),
        }
    }
}

/// Layout options in their serialized form.
///
/// Field names are camelCase. Absent fields take the [`LayoutConfig`]
/// defaults; when only `alphaMin` is given, `alphaDecay` is derived from it.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LayoutOptions {
    pub link_distance: Option<LinkDistanceOption>,
    pub link_strength: Option<f64>,
    pub link_iterations: Option<u32>,
    pub repulsivity: Option<f64>,
    pub distance_min: Option<f64>,
    pub distance_max: Option<f64>,
    pub theta: Option<f64>,
    pub center: Option<[f64; 2]>,
    pub center_strength: Option<f64>,
    pub iterations: Option<i64>,
    pub alpha: Option<f64>,
    pub alpha_min: Option<f64>,
    pub alpha_decay: Option<f64>,
    pub alpha_target: Option<f64>,
    pub velocity_decay: Option<f64>,
    pub time_step: Option<f64>,
    pub seed: Option<u32>,
}

impl TryFrom<LayoutOptions> for LayoutConfig {
    type Error = ConfigError;

    fn try_from(options: LayoutOptions) -> Result<Self, Self::Error> {
        let defaults = LayoutConfig::default();

        let iterations = match options.iterations {
            Some(n) if n < 0 => return Err(ConfigError::NegativeIterations(n)),
            Some(n) => n as usize,
            None => defaults.iterations,
        };

        let mut simulation = defaults.simulation;
        if let Some(alpha_min) = options.alpha_min {
            simulation.alpha_min = alpha_min;
            simulation.alpha_decay = alpha_decay_for(alpha_min);
        }
        simulation.alpha = options.alpha.unwrap_or(simulation.alpha);
        simulation.alpha_decay = options.alpha_decay.unwrap_or(simulation.alpha_decay);
        simulation.alpha_target = options.alpha_target.unwrap_or(simulation.alpha_target);
        simulation.velocity_decay = options.velocity_decay.unwrap_or(simulation.velocity_decay);
        simulation.time_step = options.time_step.unwrap_or(simulation.time_step);
        simulation.seed = options.seed.unwrap_or(simulation.seed);

        let config = LayoutConfig {
            link_distance: options
                .link_distance
                .map(LinkDistance::from)
                .unwrap_or(defaults.link_distance),
            link_strength: options
                .link_strength
                .map(LinkStrength::Constant)
                .unwrap_or(defaults.link_strength),
            link_iterations: options
                .link_iterations
                .map(|n| n as usize)
                .unwrap_or(defaults.link_iterations),
            repulsivity: options.repulsivity.unwrap_or(defaults.repulsivity),
            distance_min: options.distance_min.unwrap_or(defaults.distance_min),
            distance_max: options.distance_max.unwrap_or(defaults.distance_max),
            theta: options.theta.unwrap_or(defaults.theta),
            center: options
                .center
                .map(|[x, y]| (x, y))
                .unwrap_or(defaults.center),
            center_strength: options.center_strength.unwrap_or(defaults.center_strength),
            iterations,
            simulation,
        };

        config.validate()?;
        Ok(config)
    }
}
