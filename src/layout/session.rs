//! Repeated layouts with transition history.

use super::{Layout, compute_with_previous};
use crate::config::LayoutConfig;
use crate::error::LayoutError;
use crate::graph::{LinkRecord, NodeRecord};

/// Keeps the last layout so the next one can pair links with the endpoint
/// positions they are animating from.
#[derive(Debug, Clone, Default)]
pub struct LayoutSession {
    previous: Option<Layout>,
}

impl LayoutSession {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lay out a new set of records.
    ///
    /// On error the previous layout is kept.
    pub fn update(
        &mut self,
        nodes: &[NodeRecord],
        links: &[LinkRecord],
        config: &LayoutConfig,
    ) -> Result<&Layout, LayoutError> {
        let layout = compute_with_previous(nodes, links, config, self.previous.as_ref())?;
        Ok(&*self.previous.insert(layout))
    }

    /// The most recent layout.
    pub fn layout(&self) -> Option<&Layout> {
        self.previous.as_ref()
    }

    /// Forget the history; the next layout has no previous positions.
    pub fn reset(&mut self) {
        self.previous = None;
    }
}
