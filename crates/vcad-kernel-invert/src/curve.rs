//! Adaptive 1D segment tree for curve point-inversion.
//!
//! Given a 3D query point, finds the curve parameter whose evaluated point
//! is closest to it. The domain is seeded as `ROOT` equal root segments;
//! each is grown lazily, node by node, only along the path a query walks —
//! it never shrinks, and segment indices remain stable once allocated so
//! callers can cache a "last hit" segment across repeated nearby queries.

use vcad_kernel_geom::Curve3d;
use vcad_kernel_math::{Point3, FINE_TESS, FINE_TESS_SQ};

const ROOT: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SegmentState {
    Raw,
    Divided,
    Leaf,
}

/// Which side of a leaf segment's chord a query point's projection fell
/// outside of.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Overrun {
    Left,
    Right,
    Nil,
}

#[derive(Debug, Clone, Copy)]
struct Node {
    t: f64,
    point: Point3,
}

impl Node {
    fn new(curve: &dyn Curve3d, t: f64) -> Self {
        Self { t, point: curve.evaluate(t) }
    }
}

#[derive(Debug, Clone)]
struct Segment {
    t_c: f64,
    dt: f64,
    center: Node,
    /// Populated once this segment has been subdivided: `Leaf` carries its
    /// own chord endpoints, `Divided` carries its two children's base
    /// index.
    left: Option<Node>,
    right: Option<Node>,
    children_first: usize,
    state: SegmentState,
}

impl Segment {
    fn new(curve: &dyn Curve3d, t_c: f64, dt: f64) -> Self {
        Self {
            t_c,
            dt,
            center: Node::new(curve, t_c),
            left: None,
            right: None,
            children_first: 0,
            state: SegmentState::Raw,
        }
    }
}

/// Squared distance from a chord `a -> b`'s midpoint to `p`.
fn chord_midpoint_deviation_sq(a: Point3, b: Point3, p: Point3) -> f64 {
    let chord_mid = a + (b - a) * 0.5;
    (chord_mid - p).norm_squared()
}

/// Arena-backed adaptive segment tree over a curve's parameter domain.
///
/// Stable segment indices, monotonic growth (splits append, never remove),
/// single-owner / not `Sync`-shared across threads while mutating.
#[derive(Debug, Clone)]
pub struct AdaptiveSegmentTree {
    segments: Vec<Segment>,
    roots: [usize; ROOT],
}

impl AdaptiveSegmentTree {
    /// Create a tree seeded with `ROOT` equal root segments spanning the
    /// curve's domain.
    pub fn new(curve: &dyn Curve3d) -> Self {
        let (lo, hi) = curve.domain();
        let span = (hi - lo) / ROOT as f64;
        let dt = span * 0.5;
        let mut segments = Vec::with_capacity(ROOT);
        let mut roots = [0usize; ROOT];
        for (i, root) in roots.iter_mut().enumerate() {
            let t_c = lo + span * (i as f64 + 0.5);
            *root = segments.len();
            segments.push(Segment::new(curve, t_c, dt));
        }
        Self { segments, roots }
    }

    /// Number of segments currently allocated in the arena.
    pub fn node_count(&self) -> usize {
        self.segments.len()
    }

    /// Subdivide the `Raw` segment at `idx` into a `Leaf` (with its own
    /// chord endpoints) or a `Divided` pair of half-span children,
    /// per §4.2's center-deviation and left/right symmetry test.
    fn subdivide(&mut self, curve: &dyn Curve3d, idx: usize) {
        if self.segments[idx].state != SegmentState::Raw {
            return;
        }
        let (t_c, dt, center) = (
            self.segments[idx].t_c,
            self.segments[idx].dt,
            self.segments[idx].center,
        );
        let left = Node::new(curve, t_c - dt);
        let right = Node::new(curve, t_c + dt);
        let deviation_sq = chord_midpoint_deviation_sq(left.point, right.point, center.point);
        let dist_left = (center.point - left.point).norm();
        let dist_right = (center.point - right.point).norm();

        if deviation_sq < FINE_TESS_SQ && (dist_left - dist_right).abs() < FINE_TESS {
            self.segments[idx].left = Some(left);
            self.segments[idx].right = Some(right);
            self.segments[idx].state = SegmentState::Leaf;
            return;
        }

        let half = dt * 0.5;
        let child_left = Segment::new(curve, t_c - half, half);
        let child_right = Segment::new(curve, t_c + half, half);
        let first = self.segments.len();
        self.segments.push(child_left);
        self.segments.push(child_right);
        self.segments[idx].children_first = first;
        self.segments[idx].state = SegmentState::Divided;
    }

    /// Descend from `idx`, subdividing `Raw` segments and recursing into
    /// the closer child of `Divided` ones, until a `Leaf` is reached.
    fn descend(&mut self, curve: &dyn Curve3d, mut idx: usize, p: &Point3) -> usize {
        loop {
            if self.segments[idx].state == SegmentState::Raw {
                self.subdivide(curve, idx);
            }
            match self.segments[idx].state {
                SegmentState::Leaf => return idx,
                SegmentState::Divided => {
                    let first = self.segments[idx].children_first;
                    let (a, b) = (first, first + 1);
                    let da = (self.segments[a].center.point - p).norm_squared();
                    let db = (self.segments[b].center.point - p).norm_squared();
                    idx = if da <= db { a } else { b };
                }
                SegmentState::Raw => unreachable!("subdivide always leaves Raw"),
            }
        }
    }

    /// Snap `p` onto leaf `idx`'s chord and return the interpolated `t`
    /// plus which side (if any) the projection overran.
    fn interpolate(&self, idx: usize, p: &Point3) -> (f64, Overrun) {
        let seg = &self.segments[idx];
        let left = seg.left.expect("leaf always has chord endpoints");
        let right = seg.right.expect("leaf always has chord endpoints");
        let chord = right.point - left.point;
        let denom = chord.norm_squared();
        let lie = if denom < 1e-20 {
            0.0
        } else {
            (p - left.point).dot(&chord) / denom
        };
        let t = left.t + lie.clamp(0.0, 1.0) * (right.t - left.t);
        let overrun = if lie < 0.0 {
            Overrun::Left
        } else if lie > 1.0 {
            Overrun::Right
        } else {
            Overrun::Nil
        };
        (t, overrun)
    }

    /// Find the parameter `t` whose point on `curve` is closest to `p`.
    ///
    /// Picks the root segment whose center is nearest `p`, descends to a
    /// leaf, and interpolates along its chord. If that interpolation
    /// overruns the leaf's span, retries on the adjacent root segment and
    /// keeps whichever candidate's 3D evaluation lands nearer to `p`.
    pub fn invert(&mut self, curve: &dyn Curve3d, p: &Point3) -> f64 {
        let root_idx = (0..ROOT)
            .min_by(|&a, &b| {
                let da = (self.segments[self.roots[a]].center.point - p).norm_squared();
                let db = (self.segments[self.roots[b]].center.point - p).norm_squared();
                da.partial_cmp(&db).unwrap()
            })
            .unwrap();

        let leaf = self.descend(curve, self.roots[root_idx], p);
        let (t, overrun) = self.interpolate(leaf, p);
        if overrun == Overrun::Nil {
            return t;
        }

        let neighbor = match overrun {
            Overrun::Left => root_idx.checked_sub(1),
            Overrun::Right if root_idx + 1 < ROOT => Some(root_idx + 1),
            _ => None,
        };
        let Some(neighbor_root) = neighbor else {
            return t;
        };

        let neighbor_leaf = self.descend(curve, self.roots[neighbor_root], p);
        let (neighbor_t, _) = self.interpolate(neighbor_leaf, p);

        let d = (curve.evaluate(t) - p).norm_squared();
        let d_neighbor = (curve.evaluate(neighbor_t) - p).norm_squared();
        if d_neighbor < d {
            neighbor_t
        } else {
            t
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcad_kernel_geom::Line3d;

    #[test]
    fn test_invert_line_midpoint() {
        let line = Line3d::from_points(Point3::origin(), Point3::new(10.0, 0.0, 0.0));
        let mut tree = AdaptiveSegmentTree::new(&line);
        let t = tree.invert(&line, &Point3::new(5.0, 0.0, 0.0));
        assert!((t - 0.5).abs() < 1e-6, "t={t}");
    }

    #[test]
    fn test_invert_line_off_curve_point() {
        let line = Line3d::from_points(Point3::origin(), Point3::new(10.0, 0.0, 0.0));
        let mut tree = AdaptiveSegmentTree::new(&line);
        // Point off the line should still project to the nearest t.
        let t = tree.invert(&line, &Point3::new(3.0, 4.0, 0.0));
        assert!((t - 0.3).abs() < 1e-6, "t={t}");
    }

    #[test]
    fn test_invert_circle_subdivides_and_converges() {
        use std::f64::consts::PI;
        use vcad_kernel_geom::Circle3d;
        let circle = Circle3d::new(Point3::origin(), 5.0);
        let mut tree = AdaptiveSegmentTree::new(&circle);
        let p = circle.evaluate(PI / 3.0);
        let t = tree.invert(&circle, &p);
        assert!((t - PI / 3.0).abs() < 1e-3, "t={t}");
        // A circle's chord deviates from its arc everywhere, so the root
        // segments must have split at least once to pass the leaf test.
        assert!(tree.node_count() > ROOT);
    }

    #[test]
    fn test_tree_grows_monotonically() {
        let line = Line3d::from_points(Point3::origin(), Point3::new(10.0, 0.0, 0.0));
        let mut tree = AdaptiveSegmentTree::new(&line);
        let before = tree.node_count();
        tree.invert(&line, &Point3::new(2.0, 0.0, 0.0));
        let after = tree.invert(&line, &Point3::new(2.0, 0.0, 0.0));
        assert!(tree.node_count() >= before);
        let _ = after;
    }
}
