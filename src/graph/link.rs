//! Link types.
//!
//! Links are the connections between nodes. Each link has:
//! - A stable handle ([`LinkId`])
//! - Source and target node handles, resolved from the caller's keys
//! - The caller's record, whose attributes feed per-link distances

use std::fmt;

use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};

use super::node::{NodeId, NodeKey, NodeRecord};
use super::path;

/// Stable link handle.
///
/// Numbers the links that survived endpoint resolution, in input order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LinkId(pub u32);

impl LinkId {
    /// Create a new LinkId from a raw u32.
    #[inline]
    pub fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw u32 value.
    #[inline]
    pub fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Link({})", self.0)
    }
}

impl From<u32> for LinkId {
    #[inline]
    fn from(id: u32) -> Self {
        Self(id)
    }
}

impl From<LinkId> for u32 {
    #[inline]
    fn from(id: LinkId) -> Self {
        id.0
    }
}

/// A link as supplied by the caller.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    /// Key of the source node.
    pub source: NodeKey,
    /// Key of the target node.
    pub target: NodeKey,
    /// Explicit identifier; derived from the endpoints when absent.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Remaining attributes.
    #[serde(flatten)]
    pub data: Map<String, Value>,
}

impl LinkRecord {
    /// A link between two keys.
    pub fn new(source: impl Into<NodeKey>, target: impl Into<NodeKey>) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            id: None,
            data: Map::new(),
        }
    }

    /// Attach an extra attribute.
    pub fn with_data(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.data.insert(key.into(), value.into());
        self
    }

    /// Set an explicit identifier.
    pub fn with_id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// The link identifier: the explicit `id`, or `"{source}.{target}"`.
    pub fn key(&self) -> String {
        match &self.id {
            Some(id) => id.clone(),
            None => format!("{}.{}", self.source, self.target),
        }
    }

    /// Read a numeric attribute by field path.
    pub fn lookup_f64(&self, field_path: &str) -> Option<f64> {
        path::lookup_f64(&self.data, field_path)
    }
}

/// A link record together with the records of its endpoints.
///
/// This is what per-link distances see: `source` and `target` are the
/// endpoint nodes, so a field path such as `"source.size"` reads a node
/// attribute.
#[derive(Debug, Clone, Copy)]
pub struct ResolvedLink<'a> {
    pub record: &'a LinkRecord,
    pub source: &'a NodeRecord,
    pub target: &'a NodeRecord,
}

impl ResolvedLink<'_> {
    /// The link identifier.
    pub fn key(&self) -> String {
        self.record.key()
    }

    /// The link attributes, with `source` / `target` replaced by the
    /// endpoint node records.
    pub fn to_map(&self) -> Map<String, Value> {
        let mut map = self.record.data.clone();
        if let Some(id) = &self.record.id {
            map.insert("id".into(), id.as_str().into());
        }
        map.insert("source".into(), Value::Object(self.source.to_map()));
        map.insert("target".into(), Value::Object(self.target.to_map()));
        map
    }

    /// Read a numeric attribute of the link or its endpoints by field path.
    pub fn lookup_f64(&self, field_path: &str) -> Option<f64> {
        path::lookup_f64(&self.to_map(), field_path)
    }
}

impl Serialize for ResolvedLink<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_map().serialize(serializer)
    }
}

/// A resolved link inside the graph model.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Link {
    /// Handle of this link.
    pub id: LinkId,
    /// Source node handle.
    pub source: NodeId,
    /// Target node handle.
    pub target: NodeId,
}

impl Link {
    /// Whether both endpoints are the same node.
    pub fn is_self_loop(&self) -> bool {
        self.source == self.target
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_link_id() {
        let id = LinkId::new(42);
        assert_eq!(id.raw(), 42);
        assert_eq!(format!("{}", id), "Link(42)");
    }

    #[test]
    fn test_link_key_derived_from_endpoints() {
        let link = LinkRecord::new("a", "b");
        assert_eq!(link.key(), "a.b");

        let link = link.with_id("custom");
        assert_eq!(link.key(), "custom");
    }

    #[test]
    fn test_link_record_from_json() {
        let link: LinkRecord =
            serde_json::from_str(r#"{"source":1,"target":"b","weight":{"len":80}}"#).unwrap();

        assert_eq!(link.source, NodeKey::from("1"));
        assert_eq!(link.key(), "1.b");
        assert_eq!(link.lookup_f64("weight.len"), Some(80.0));
        assert_eq!(link.lookup_f64("weight.missing"), None);
    }

    #[test]
    fn test_resolved_link_reaches_endpoints() {
        let record = LinkRecord::new("a", "b").with_data("weight", 2);
        let source = NodeRecord::new("a").with_data("size", 80);
        let target = NodeRecord::new("b").with_position(3.0, 4.0);
        let link = ResolvedLink {
            record: &record,
            source: &source,
            target: &target,
        };

        assert_eq!(link.key(), "a.b");
        assert_eq!(link.lookup_f64("weight"), Some(2.0));
        assert_eq!(link.lookup_f64("source.size"), Some(80.0));
        assert_eq!(link.lookup_f64("target.y"), Some(4.0));
        assert_eq!(link.lookup_f64("target.size"), None);

        let value = serde_json::to_value(link).unwrap();
        assert_eq!(value["source"]["id"], "a");
        assert_eq!(value["target"]["x"], 3.0);
        assert_eq!(value["weight"], 2);
    }

    #[test]
    fn test_self_loop() {
        let link = Link {
            id: LinkId(0),
            source: NodeId(3),
            target: NodeId(3),
        };
        assert!(link.is_self_loop());
    }
}
