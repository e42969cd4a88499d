//! Network Layout - WASM Module
//!
//! A force-directed layout engine for network diagrams. Caller node and link
//! records go in, positioned records come out. The engine is exposed to
//! JavaScript via wasm-bindgen and usable directly from Rust.
//!
//! # Architecture
//!
//! - `graph`: Node arena (petgraph StableGraph + SoA buffers) and link resolution
//! - `force`: Force registry with the link, charge and center forces
//! - `simulation`: Alpha schedule, integrator, step-N and animated runs
//! - `spatial`: Barnes-Hut quadtree and R-tree hit testing
//! - `layout`: The network layer: records in, positioned records out
//! - `config`: Typed configuration and its serialized form

use js_sys::{Float64Array, Function};
use log::Level;
use serde::Serialize;
use serde_wasm_bindgen::Serializer;
use wasm_bindgen::prelude::*;

pub mod config;
pub mod diagnostic;
pub mod error;
pub mod force;
pub mod graph;
pub mod layout;
pub mod random;
pub mod simulation;
pub mod spatial;

pub use config::{LayoutConfig, LayoutOptions};
pub use diagnostic::{Diagnostic, Endpoint};
pub use error::{ConfigError, LayoutError};
pub use graph::{LinkRecord, NodeKey, NodeRecord};
pub use layout::{Layout, LayoutSession, build_simulation, compute_layout};

use force::LinkDistance;
use graph::NodeId;
use simulation::{RunHandle, Simulation, Turn};

/// Initialize the WASM module: console logging and the panic hook.
#[wasm_bindgen(start)]
pub fn init() {
    let _ = console_log::init_with_level(Level::Debug);
    console_error_panic_hook::set_once();
}

fn to_js<T: Serialize + ?Sized>(value: &T) -> Result<JsValue, JsError> {
    value
        .serialize(&Serializer::json_compatible())
        .map_err(|err| JsError::new(&err.to_string()))
}

fn read_records(nodes: JsValue, links: JsValue) -> Result<(Vec<NodeRecord>, Vec<LinkRecord>), LayoutError> {
    let nodes = serde_wasm_bindgen::from_value(nodes)?;
    let links = serde_wasm_bindgen::from_value(links)?;
    Ok((nodes, links))
}

/// Build a config from a JS options object and an optional distance callback.
///
/// The callback receives each link, with `source` and `target` set to the
/// endpoint node records, and should return a number; any other result, or
/// a throw, counts as "no distance" for that link.
fn read_config(options: JsValue, link_distance: Option<Function>) -> Result<LayoutConfig, LayoutError> {
    let options: LayoutOptions = if options.is_undefined() || options.is_null() {
        LayoutOptions::default()
    } else {
        serde_wasm_bindgen::from_value(options)?
    };
    let mut config = LayoutConfig::try_from(options)?;

    if let Some(callback) = link_distance {
        config.link_distance = LinkDistance::function(move |link| {
            to_js(link)
                .ok()
                .and_then(|value| callback.call1(&JsValue::NULL, &value).ok())
                .and_then(|result| result.as_f64())
                .unwrap_or(f64::NAN)
        });
    }

    Ok(config)
}

/// Synchronous network layout.
///
/// Each `compute` call lays out a fresh set of records. Links carry
/// `previousSource` / `previousTarget` from the previous call until
/// `reset` is called.
#[wasm_bindgen]
pub struct NetworkLayoutWasm {
    session: LayoutSession,
}

#[wasm_bindgen]
impl NetworkLayoutWasm {
    /// Create a layout with no history.
    #[wasm_bindgen(constructor)]
    pub fn new() -> Self {
        Self {
            session: LayoutSession::new(),
        }
    }

    /// Lay out nodes and links.
    ///
    /// # Arguments
    ///
    /// * `nodes` - Array of `{ id, x?, y?, fx?, fy?, ...data }`
    /// * `links` - Array of `{ source, target, id?, ...data }`
    /// * `options` - Layout options (camelCase), or undefined for defaults
    /// * `link_distance` - Optional per-link distance callback; overrides
    ///   `options.linkDistance`
    ///
    /// Returns `{ nodes, links, diagnostics, ticks }`.
    pub fn compute(
        &mut self,
        nodes: JsValue,
        links: JsValue,
        options: JsValue,
        link_distance: Option<Function>,
    ) -> Result<JsValue, JsError> {
        let (nodes, links) = read_records(nodes, links)?;
        let config = read_config(options, link_distance)?;
        let layout = self.session.update(&nodes, &links, &config)?;
        to_js(layout)
    }

    /// Forget the previous layout.
    pub fn reset(&mut self) {
        self.session.reset();
    }

    /// Find the node nearest to a point in the last layout.
    ///
    /// Returns the positioned node, or undefined if none is within the distance.
    #[wasm_bindgen(js_name = nodeAt)]
    pub fn node_at(&self, x: f64, y: f64, max_distance: f64) -> Result<JsValue, JsError> {
        match self.session.layout().and_then(|l| l.node_at(x, y, max_distance)) {
            Some(node) => to_js(node),
            None => Ok(JsValue::UNDEFINED),
        }
    }

    /// Get the bounding box of the last layout.
    ///
    /// Returns [min_x, min_y, max_x, max_y], or None if there is no layout.
    #[wasm_bindgen(js_name = getBounds)]
    pub fn get_bounds(&self) -> Option<Vec<f64>> {
        self.session
            .layout()
            .and_then(Layout::bounds)
            .map(|(min_x, min_y, max_x, max_y)| vec![min_x, min_y, max_x, max_y])
    }
}

impl Default for NetworkLayoutWasm {
    fn default() -> Self {
        Self::new()
    }
}

/// Animated network simulation.
///
/// Call `start()` once, then `step()` from `requestAnimationFrame` until it
/// returns false.
#[wasm_bindgen]
pub struct NetworkSimulationWasm {
    simulation: Simulation,
    run: Option<RunHandle>,
}

#[wasm_bindgen]
impl NetworkSimulationWasm {
    /// Build a simulation from records and options.
    #[wasm_bindgen(constructor)]
    pub fn new(
        nodes: JsValue,
        links: JsValue,
        options: JsValue,
        link_distance: Option<Function>,
    ) -> Result<NetworkSimulationWasm, JsError> {
        let (nodes, links) = read_records(nodes, links)?;
        let config = read_config(options, link_distance)?;
        let simulation = build_simulation(&nodes, &links, &config)?;
        Ok(Self {
            simulation,
            run: None,
        })
    }

    // =========================================================================
    // Running
    // =========================================================================

    /// Begin an animated run.
    pub fn start(&mut self) {
        self.run = Some(self.simulation.start());
    }

    /// Advance one frame. Returns whether the run is still live.
    pub fn step(&mut self) -> bool {
        match self.simulation.turn() {
            Turn::Ticked { .. } => true,
            Turn::Converged | Turn::Idle => {
                self.run = None;
                false
            }
        }
    }

    /// End the animated run.
    pub fn stop(&mut self) {
        self.run = None;
        self.simulation.stop();
    }

    /// Run `n` ticks synchronously.
    pub fn tick(&mut self, n: u32) {
        self.simulation.tick(n as usize);
    }

    /// Restore energy, e.g. after the graph was dragged.
    pub fn reheat(&mut self, alpha: f64) {
        self.simulation.reheat(alpha);
    }

    #[wasm_bindgen(getter)]
    pub fn alpha(&self) -> f64 {
        self.simulation.alpha()
    }

    #[wasm_bindgen(getter, js_name = isRunning)]
    pub fn is_running(&self) -> bool {
        self.simulation.is_running()
    }

    // =========================================================================
    // Node State
    // =========================================================================

    /// Pin a node (by input index) at a position.
    #[wasm_bindgen(js_name = fixNode)]
    pub fn fix_node(&mut self, index: u32, x: f64, y: f64) {
        self.simulation.fix(NodeId(index), x, y);
    }

    /// Release a pinned node.
    #[wasm_bindgen(js_name = unfixNode)]
    pub fn unfix_node(&mut self, index: u32) {
        self.simulation.unfix(NodeId(index));
    }

    /// Positions as a Float64Array [x0, y0, x1, y1, ...] in input order.
    pub fn positions(&self) -> Float64Array {
        let bodies = self.simulation.graph().bodies();
        let positions: Vec<f64> = bodies
            .x
            .iter()
            .zip(&bodies.y)
            .flat_map(|(&x, &y)| [x, y])
            .collect();
        Float64Array::from(&positions[..])
    }

    /// Positioned node records.
    pub fn nodes(&self) -> Result<JsValue, JsError> {
        to_js(&Layout::from_simulation(&self.simulation, None).nodes)
    }

    /// Full snapshot: `{ nodes, links, diagnostics, ticks }`.
    pub fn layout(&self) -> Result<JsValue, JsError> {
        to_js(&Layout::from_simulation(&self.simulation, None))
    }
}
