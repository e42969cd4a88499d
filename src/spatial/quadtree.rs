//! Barnes-Hut quadtree for many-body forces.
//!
//! Cells are stored in an arena; children always have larger indices than
//! their parent, so a reverse scan over the arena is a post-order traversal.
//! Bodies at identical coordinates share a leaf through a `next` chain.

use crate::random::Lcg;

/// Subdivision limit; bodies closer than `size / 2^MAX_DEPTH` share a leaf.
const MAX_DEPTH: usize = 64;

#[derive(Debug, Clone)]
struct Cell {
    x0: f64,
    y0: f64,
    size: f64,
    children: [Option<u32>; 4],
    internal: bool,
    /// Head of the body chain (leaves only)
    first: Option<u32>,
    /// Aggregate strength
    charge: f64,
    /// Strength-weighted center
    cx: f64,
    cy: f64,
}

impl Cell {
    fn empty(x0: f64, y0: f64, size: f64) -> Self {
        Self {
            x0,
            y0,
            size,
            children: [None; 4],
            internal: false,
            first: None,
            charge: 0.0,
            cx: 0.0,
            cy: 0.0,
        }
    }

    #[inline]
    fn quadrant(&self, x: f64, y: f64) -> usize {
        let half = self.size / 2.0;
        let right = (x >= self.x0 + half) as usize;
        let bottom = (y >= self.y0 + half) as usize;
        (bottom << 1) | right
    }
}

/// Parameters of one many-body evaluation.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BarnesHut {
    /// Squared opening angle; 0 forces exact pairwise evaluation.
    pub theta2: f64,
    /// Squared distance below which the distance is softened.
    pub distance_min2: f64,
    /// Squared distance at or beyond which no force applies.
    pub distance_max2: f64,
    /// Simulation energy scaling the result.
    pub alpha: f64,
}

/// A quadtree over a snapshot of body positions.
#[derive(Debug, Clone)]
pub struct QuadTree {
    cells: Vec<Cell>,
    next: Vec<Option<u32>>,
    xs: Vec<f64>,
    ys: Vec<f64>,
    len: usize,
}

impl QuadTree {
    /// Build a tree over the given positions.
    ///
    /// Non-finite positions are left out of the tree.
    pub fn build(xs: &[f64], ys: &[f64]) -> Self {
        let count = xs.len().min(ys.len());

        let mut min_x = f64::INFINITY;
        let mut min_y = f64::INFINITY;
        let mut max_x = f64::NEG_INFINITY;
        let mut max_y = f64::NEG_INFINITY;
        for (&x, &y) in xs.iter().zip(ys).take(count) {
            if x.is_finite() && y.is_finite() {
                min_x = min_x.min(x);
                min_y = min_y.min(y);
                max_x = max_x.max(x);
                max_y = max_y.max(y);
            }
        }

        let mut size = (max_x - min_x).max(max_y - min_y);
        if !size.is_finite() || size <= 0.0 {
            size = 1.0;
        }
        if !min_x.is_finite() {
            min_x = 0.0;
            min_y = 0.0;
        }

        let mut tree = Self {
            cells: vec![Cell::empty(min_x, min_y, size)],
            next: vec![None; count],
            xs: xs[..count].to_vec(),
            ys: ys[..count].to_vec(),
            len: 0,
        };

        for i in 0..count {
            if tree.xs[i].is_finite() && tree.ys[i].is_finite() {
                tree.insert(i as u32);
            }
        }

        tree
    }

    fn insert(&mut self, i: u32) {
        let (x, y) = (self.xs[i as usize], self.ys[i as usize]);
        let mut c = 0;
        let mut depth = 0;

        loop {
            if self.cells[c].internal {
                let q = self.cells[c].quadrant(x, y);
                match self.cells[c].children[q] {
                    Some(child) => {
                        c = child as usize;
                        depth += 1;
                    }
                    None => {
                        let child = self.push_child(c, q);
                        self.cells[child].first = Some(i);
                        break;
                    }
                }
                continue;
            }

            match self.cells[c].first {
                None => {
                    self.cells[c].first = Some(i);
                    break;
                }
                Some(j) => {
                    let (xj, yj) = (self.xs[j as usize], self.ys[j as usize]);
                    if (xj == x && yj == y) || depth >= MAX_DEPTH {
                        self.next[i as usize] = Some(j);
                        self.cells[c].first = Some(i);
                        break;
                    }

                    // Split: push the resident chain down one level, then retry.
                    self.cells[c].first = None;
                    self.cells[c].internal = true;
                    let q = self.cells[c].quadrant(xj, yj);
                    let child = self.push_child(c, q);
                    self.cells[child].first = Some(j);
                }
            }
        }

        self.len += 1;
    }

    fn push_child(&mut self, parent: usize, q: usize) -> usize {
        let p = &self.cells[parent];
        let half = p.size / 2.0;
        let x0 = if q & 1 == 1 { p.x0 + half } else { p.x0 };
        let y0 = if q & 2 == 2 { p.y0 + half } else { p.y0 };

        let index = self.cells.len();
        self.cells.push(Cell::empty(x0, y0, half));
        self.cells[parent].children[q] = Some(index as u32);
        index
    }

    /// Compute aggregate strengths and centers, bottom-up.
    ///
    /// `strengths` is indexed like the positions the tree was built from.
    pub fn accumulate(&mut self, strengths: &[f64]) {
        for c in (0..self.cells.len()).rev() {
            let (charge, cx, cy) = if self.cells[c].internal {
                let mut charge = 0.0;
                let mut weight = 0.0;
                let mut sx = 0.0;
                let mut sy = 0.0;
                for child in self.cells[c].children.iter().flatten() {
                    let child = &self.cells[*child as usize];
                    let w = child.charge.abs();
                    if w != 0.0 {
                        charge += child.charge;
                        weight += w;
                        sx += w * child.cx;
                        sy += w * child.cy;
                    }
                }
                if weight > 0.0 {
                    (charge, sx / weight, sy / weight)
                } else {
                    (charge, 0.0, 0.0)
                }
            } else {
                match self.cells[c].first {
                    Some(first) => {
                        let mut charge = 0.0;
                        let mut body = Some(first);
                        while let Some(j) = body {
                            charge += strengths.get(j as usize).copied().unwrap_or(0.0);
                            body = self.next[j as usize];
                        }
                        (charge, self.xs[first as usize], self.ys[first as usize])
                    }
                    None => (0.0, 0.0, 0.0),
                }
            };

            let cell = &mut self.cells[c];
            cell.charge = charge;
            cell.cx = cx;
            cell.cy = cy;
        }
    }

    /// Velocity contribution on body `i` from every other body.
    ///
    /// Requires a prior [`QuadTree::accumulate`] with the same strengths.
    pub fn force_on(
        &self,
        i: usize,
        params: &BarnesHut,
        strengths: &[f64],
        random: &mut Lcg,
    ) -> (f64, f64) {
        let (x, y) = (self.xs[i], self.ys[i]);
        let mut vx = 0.0;
        let mut vy = 0.0;
        let mut stack = Vec::with_capacity(32);
        stack.push(0usize);

        while let Some(c) = stack.pop() {
            let cell = &self.cells[c];
            if cell.charge == 0.0 {
                continue;
            }

            let mut dx = cell.cx - x;
            let mut dy = cell.cy - y;
            let w = cell.size;
            let mut l = dx * dx + dy * dy;

            // Far enough away: treat the cell as a single body.
            if w * w / params.theta2 < l {
                if l < params.distance_max2 {
                    if dx == 0.0 {
                        dx = random.jiggle();
                        l += dx * dx;
                    }
                    if dy == 0.0 {
                        dy = random.jiggle();
                        l += dy * dy;
                    }
                    if l < params.distance_min2 {
                        l = (params.distance_min2 * l).sqrt();
                    }
                    vx += dx * cell.charge * params.alpha / l;
                    vy += dy * cell.charge * params.alpha / l;
                }
                continue;
            }

            if cell.internal {
                for child in cell.children.iter().rev().flatten() {
                    stack.push(*child as usize);
                }
                continue;
            }

            if l >= params.distance_max2 {
                continue;
            }

            let Some(first) = cell.first else {
                continue;
            };
            if first as usize != i || self.next[first as usize].is_some() {
                if dx == 0.0 {
                    dx = random.jiggle();
                    l += dx * dx;
                }
                if dy == 0.0 {
                    dy = random.jiggle();
                    l += dy * dy;
                }
                if l < params.distance_min2 {
                    l = (params.distance_min2 * l).sqrt();
                }
            }

            let mut body = Some(first);
            while let Some(j) = body {
                let j = j as usize;
                if j != i {
                    let k = strengths.get(j).copied().unwrap_or(0.0) * params.alpha / l;
                    vx += dx * k;
                    vy += dy * k;
                }
                body = self.next[j];
            }
        }

        (vx, vy)
    }

    /// Number of bodies in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the tree holds no bodies.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of cells, internal and leaf.
    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    /// Root extent as (x0, y0, size).
    pub fn extent(&self) -> (f64, f64, f64) {
        let root = &self.cells[0];
        (root.x0, root.y0, root.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use float_cmp::{approx_eq, assert_approx_eq};

    fn exact(xs: &[f64], ys: &[f64], i: usize, params: &BarnesHut, strengths: &[f64]) -> (f64, f64) {
        let mut v = (0.0, 0.0);
        for j in 0..xs.len() {
            if j == i {
                continue;
            }
            let dx = xs[j] - xs[i];
            let dy = ys[j] - ys[i];
            let mut l = dx * dx + dy * dy;
            if l >= params.distance_max2 {
                continue;
            }
            if l < params.distance_min2 {
                l = (params.distance_min2 * l).sqrt();
            }
            v.0 += dx * strengths[j] * params.alpha / l;
            v.1 += dy * strengths[j] * params.alpha / l;
        }
        v
    }

    fn params(theta: f64) -> BarnesHut {
        BarnesHut {
            theta2: theta * theta,
            distance_min2: 1.0,
            distance_max2: f64::INFINITY,
            alpha: 1.0,
        }
    }

    #[test]
    fn test_empty_tree() {
        let tree = QuadTree::build(&[], &[]);
        assert!(tree.is_empty());
        assert_eq!(tree.cell_count(), 1);
        assert_eq!(tree.extent(), (0.0, 0.0, 1.0));
    }

    #[test]
    fn test_build_counts_bodies() {
        let xs = [0.0, 10.0, 5.0, -3.0];
        let ys = [0.0, 10.0, 2.0, 8.0];
        let tree = QuadTree::build(&xs, &ys);

        assert_eq!(tree.len(), 4);
        assert!(tree.cell_count() > 4);
        assert_eq!(tree.extent(), (-3.0, 0.0, 13.0));
    }

    #[test]
    fn test_skips_non_finite() {
        let xs = [0.0, f64::NAN, 5.0];
        let ys = [0.0, 1.0, f64::INFINITY];
        let tree = QuadTree::build(&xs, &ys);
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_coincident_bodies_share_leaf() {
        let xs = [1.0, 1.0, 1.0];
        let ys = [2.0, 2.0, 2.0];
        let mut tree = QuadTree::build(&xs, &ys);
        assert_eq!(tree.len(), 3);
        assert_eq!(tree.cell_count(), 1);

        let strengths = [-30.0; 3];
        tree.accumulate(&strengths);
        assert_eq!(tree.cells[0].charge, -90.0);

        // Coincident bodies are pushed apart by the jiggle.
        let mut random = Lcg::default();
        let (vx, vy) = tree.force_on(0, &params(0.9), &strengths, &mut random);
        assert!(vx.is_finite() && vy.is_finite());
        assert!(vx != 0.0 || vy != 0.0);
    }

    #[test]
    fn test_zero_theta_matches_exact() {
        let xs = [0.0, 10.0, 5.5, -3.0, 40.0, 41.0, 7.25];
        let ys = [0.0, 10.0, 2.0, 8.0, -20.0, -21.5, 7.5];
        let strengths = [-30.0, -30.0, -10.0, 5.0, -30.0, -30.0, -1.0];
        let mut tree = QuadTree::build(&xs, &ys);
        tree.accumulate(&strengths);

        let params = params(0.0);
        let mut random = Lcg::default();
        for i in 0..xs.len() {
            let (vx, vy) = tree.force_on(i, &params, &strengths, &mut random);
            let (ex, ey) = exact(&xs, &ys, i, &params, &strengths);
            assert_approx_eq!(f64, vx, ex, epsilon = 1e-9);
            assert_approx_eq!(f64, vy, ey, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_far_cluster_is_approximated_closely() {
        let mut xs = vec![0.0];
        let mut ys = vec![0.0];
        for k in 0..8 {
            xs.push(1000.0 + (k % 3) as f64 * 0.5);
            ys.push(1000.0 + (k / 3) as f64 * 0.5);
        }
        let strengths = vec![-30.0; xs.len()];
        let mut tree = QuadTree::build(&xs, &ys);
        tree.accumulate(&strengths);

        let params = params(0.5);
        let (vx, vy) = tree.force_on(0, &params, &strengths, &mut Lcg::default());
        let (ex, ey) = exact(&xs, &ys, 0, &params, &strengths);
        assert!(approx_eq!(f64, vx, ex, epsilon = ex.abs() * 1e-3));
        assert!(approx_eq!(f64, vy, ey, epsilon = ey.abs() * 1e-3));
    }

    #[test]
    fn test_distance_max_cuts_off() {
        let xs = [0.0, 100.0];
        let ys = [0.0, 0.0];
        let strengths = [-30.0, -30.0];
        let mut tree = QuadTree::build(&xs, &ys);
        tree.accumulate(&strengths);

        let mut params = params(0.9);
        params.distance_max2 = 50.0 * 50.0;
        let force = tree.force_on(0, &params, &strengths, &mut Lcg::default());
        assert_eq!(force, (0.0, 0.0));
    }

    #[test]
    fn test_zero_strength_produces_no_force() {
        let xs = [0.0, 1.0, 2.0];
        let ys = [0.0, 1.0, 0.5];
        let strengths = [0.0; 3];
        let mut tree = QuadTree::build(&xs, &ys);
        tree.accumulate(&strengths);

        for i in 0..3 {
            let force = tree.force_on(i, &params(0.9), &strengths, &mut Lcg::default());
            assert_eq!(force, (0.0, 0.0));
        }
    }
}

#[cfg(test)]
mod proptest_tests {
    use float_cmp::approx_eq;
    use proptest::prelude::*;

    use super::*;

    fn points_strategy() -> impl Strategy<Value = Vec<(f64, f64)>> {
        prop::collection::vec((-1000.0f64..1000.0, -1000.0f64..1000.0), 2..40)
    }

    /// With theta = 0 every cell is opened, so the tree must agree with
    /// direct pairwise summation.
    fn check_zero_theta_is_exact(points: Vec<(f64, f64)>) -> Result<(), TestCaseError> {
        let xs: Vec<f64> = points.iter().map(|p| p.0).collect();
        let ys: Vec<f64> = points.iter().map(|p| p.1).collect();
        let strengths = vec![-30.0; xs.len()];
        let mut tree = QuadTree::build(&xs, &ys);
        tree.accumulate(&strengths);
        prop_assert_eq!(tree.len(), xs.len());

        let params = BarnesHut {
            theta2: 0.0,
            distance_min2: 1.0,
            distance_max2: f64::INFINITY,
            alpha: 0.5,
        };
        for i in 0..xs.len() {
            let (vx, vy) = tree.force_on(i, &params, &strengths, &mut Lcg::default());
            let mut ex = 0.0;
            let mut ey = 0.0;
            for j in 0..xs.len() {
                if i == j {
                    continue;
                }
                let dx = xs[j] - xs[i];
                let dy = ys[j] - ys[i];
                let mut l = dx * dx + dy * dy;
                if l < 1.0 {
                    l = l.sqrt();
                }
                ex += dx * -30.0 * 0.5 / l;
                ey += dy * -30.0 * 0.5 / l;
            }
            prop_assert!(approx_eq!(f64, vx, ex, epsilon = 1e-6));
            prop_assert!(approx_eq!(f64, vy, ey, epsilon = 1e-6));
        }
        Ok(())
    }

    proptest! {
        #[test]
        fn zero_theta_is_exact(points in points_strategy()) {
            check_zero_theta_is_exact(points)?;
        }
    }
}
