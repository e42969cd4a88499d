//! Node types.
//!
//! Each node has:
//! - A stable handle ([`NodeId`]) into the model's SoA buffers
//! - The caller's key ([`NodeKey`]) used to resolve link endpoints
//! - The caller's record ([`NodeRecord`]), copied at ingestion time

use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{Map, Value};

/// Stable node handle.
///
/// Indexes the model's position/velocity buffers directly. It wraps a u32
/// for efficient storage and WebAssembly interop.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

impl NodeId {
    /// Create a new NodeId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }

    /// Slot in the SoA buffers.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Node({})", self.0)
    }
}

impl From<u32> for NodeId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<NodeId> for u32 {
    #[inline]
    fn from(id: NodeId) -> Self {
        id.0
    }
}

/// The caller's identifier for a node.
///
/// Deserializes from either a string or a number; numbers are kept as their
/// decimal text so `1` and `"1"` name the same node.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct NodeKey(String);

impl NodeKey {
    /// Create a key from anything string-like.
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for NodeKey {
    fn from(key: &str) -> Self {
        Self(key.to_owned())
    }
}

impl From<String> for NodeKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl<'de> Deserialize<'de> for NodeKey {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawKey {
            Text(String),
            Integer(i64),
            Float(f64),
        }

        Ok(match RawKey::deserialize(deserializer)? {
            RawKey::Text(text) => Self(text),
            RawKey::Integer(number) => Self(number.to_string()),
            RawKey::Float(number) => Self(number.to_string()),
        })
    }
}

/// A node as supplied by the caller.
///
/// Only `id` is required. Any attribute besides the simulation fields is
/// kept in `data` and handed back untouched with the positioned node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NodeRecord {
    /// Unique key.
    pub id: NodeKey,
    /// Initial x position; placed on a spiral when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub x: Option<f64>,
    /// Initial y position; placed on a spiral when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub y: Option<f64>,
    /// Initial x velocity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vx: Option<f64>,
    /// Initial y velocity.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub vy: Option<f64>,
    /// Fixed x position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fx: Option<f64>,
    /// Fixed y position.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fy: Option<f64>,
    /// Remaining attributes.
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl NodeRecord {
    /// A record with only a key.
    pub fn new(id: impl Into<NodeKey>) -> Self {
        Self {
            id: id.into(),
            x: None,
            y: None,
            vx: None,
            vy: None,
            fx: None,
            fy: None,
            data: Map::new(),
        }
    }

    /// Set the initial position.
    pub fn with_position(mut self, x: f64, y: f64) -> Self {
        self.x = Some(x);
        self.y = Some(y);
        self
    }

    /// Pin the node at a fixed position.
    pub fn with_fixed(mut self, fx: f64, fy: f64) -> Self {
        self.fx = Some(fx);
        self.fy = Some(fy);
        self
    }

    /// Attach an extra attribute.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// The record as one attribute map: `id`, the simulation fields that are
    /// set, and the remaining attributes.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = self.data.clone();
        map.insert("id".into(), self.id.as_str().into());
        let fields = [
            ("x", self.x),
            ("y", self.y),
            ("vx", self.vx),
            ("vy", self.vy),
            ("fx", self.fx),
            ("fy", self.fy),
        ];
        for (key, value) in fields {
            if let Some(value) = value {
                map.insert(key.into(), value.into());
            }
        }
        map
    }
}
