//! Structure-of-Arrays kinematic state.

/// Positions, velocities and fixed-position overrides, one slot per node.
///
/// Slots are indexed by [`NodeId::index`](super::NodeId::index).
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Bodies {
    /// X positions
    pub x: Vec<f64>,
    /// Y positions
    pub y: Vec<f64>,
    /// X velocities
    pub vx: Vec<f64>,
    /// Y velocities
    pub vy: Vec<f64>,
    /// Fixed x positions
    pub fx: Vec<Option<f64>>,
    /// Fixed y positions
    pub fy: Vec<Option<f64>>,
}

impl Bodies {
    /// Create empty buffers with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            x: Vec::with_capacity(capacity),
            y: Vec::with_capacity(capacity),
            vx: Vec::with_capacity(capacity),
            vy: Vec::with_capacity(capacity),
            fx: Vec::with_capacity(capacity),
            fy: Vec::with_capacity(capacity),
        }
    }

    /// Append a body.
    pub fn push(&mut self, position: (f64, f64), velocity: (f64, f64), fixed: (Option<f64>, Option<f64>)) {
        self.x.push(position.0);
        self.y.push(position.1);
        self.vx.push(velocity.0);
        self.vy.push(velocity.1);
        self.fx.push(fixed.0);
        self.fy.push(fixed.1);
    }

    /// Number of bodies.
    #[inline]
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Whether there are no bodies.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }

    /// Whether both axes of a body are pinned.
    #[inline]
    pub fn is_fixed(&self, i: usize) -> bool {
        self.fx[i].is_some() && self.fy[i].is_some()
    }

    /// Mean position of all bodies.
    pub fn centroid(&self) -> Option<(f64, f64)> {
        if self.is_empty() {
            return None;
        }
        let n = self.len() as f64;
        let sx: f64 = self.x.iter().sum();
        let sy: f64 = self.y.iter().sum();
        Some((sx / n, sy / n))
    }

    /// Bounding box as (min_x, min_y, max_x, max_y).
    pub fn bounds(&self) -> Option<(f64, f64, f64, f64)> {
        if self.is_empty() {
            return None;
        }

        let mut min_x = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_y = f64::NEG_INFINITY;

        for (&x, &y) in self.x.iter().zip(&self.y) {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }

        Some((min_x, min_y, max_x, max_y))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_push_and_fixed() {
        let mut bodies = Bodies::with_capacity(2);
        bodies.push((1.0, 2.0), (0.0, 0.0), (None, None));
        bodies.push((3.0, 4.0), (0.0, 0.0), (Some(3.0), Some(4.0)));

        assert_eq!(bodies.len(), 2);
        assert!(!bodies.is_fixed(0));
        assert!(bodies.is_fixed(1));
    }

    #[test]
    fn test_centroid_and_bounds() {
        let mut bodies = Bodies::default();
        assert_eq!(bodies.centroid(), None);
        assert_eq!(bodies.bounds(), None);

        bodies.push((-10.0, -5.0), (0.0, 0.0), (None, None));
        bodies.push((10.0, 5.0), (0.0, 0.0), (None, None));

        assert_eq!(bodies.centroid(), Some((0.0, 0.0)));
        assert_eq!(bodies.bounds(), Some((-10.0, -5.0, 10.0, 5.0)));
    }
}
