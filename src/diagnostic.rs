//! Non-fatal problems found while ingesting records or simulating.

use std::fmt;

use log::warn;
use serde::Serialize;

use crate::graph::NodeKey;

/// Which end of a link a diagnostic refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Endpoint {
    Source,
    Target,
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Source => f.write_str("source"),
            Self::Target => f.write_str("target"),
        }
    }
}

/// A recorded problem that did not stop the layout.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Diagnostic {
    /// A link endpoint named a node that does not exist; the link was dropped.
    UnresolvedEndpoint {
        link: String,
        endpoint: Endpoint,
        missing: NodeKey,
    },
    /// Two nodes share a key; links resolve to the later one.
    DuplicateNodeKey { key: NodeKey, index: usize },
    /// A per-link distance lookup produced no usable number.
    DistanceFallback { link: String, fallback: f64 },
    /// A node went non-finite and was reset to its last finite position.
    NonFiniteReset { node: NodeKey, tick: u64 },
}

impl Diagnostic {
    /// Emit the diagnostic through the logger.
    pub(crate) fn report(self) -> Self {
        warn!("{self}");
        self
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UnresolvedEndpoint {
                link,
                endpoint,
                missing,
            } => write!(f, "dropping link {link}: {endpoint} node not found: {missing}"),
            Self::DuplicateNodeKey { key, index } => {
                write!(f, "duplicate node key {key} at index {index}")
            }
            Self::DistanceFallback { link, fallback } => {
                write!(f, "link {link} has no usable distance, using {fallback}")
            }
            Self::NonFiniteReset { node, tick } => {
                write!(f, "node {node} went non-finite at tick {tick}, position reset")
            }
        }
    }
}
