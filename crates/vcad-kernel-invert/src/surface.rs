//! Adaptive 2D tile quadtree for surface point-inversion.
//!
//! Given a 3D query point known to lie on (or very near) a surface, finds
//! the `(u, v)` parameter pair whose evaluated point is closest to it.
//! Each tile caches its four corner points; inversion projects the query
//! point onto whichever coordinate plane (XY, YZ, or XZ) the tile's
//! corners span the most area in, then solves the inverse bilinear map
//! for the local `(u, v)` inside that tile. A tile is subdivided into
//! four quadrants lazily, only along the path a query walks.

use crate::error::InvertError;
use vcad_kernel_geom::Surface;
use vcad_kernel_math::{Point2, Point3};

const MAX_DEPTH: u32 = 12;
const MAX_RUNGS: u32 = 64;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Plane {
    Xy,
    Yz,
    Xz,
}

impl Plane {
    fn project(self, p: &Point3) -> Point2 {
        match self {
            Plane::Xy => Point2::new(p.x, p.y),
            Plane::Yz => Point2::new(p.y, p.z),
            Plane::Xz => Point2::new(p.x, p.z),
        }
    }
}

#[derive(Debug, Clone)]
struct Node {
    u0: f64,
    u1: f64,
    v0: f64,
    v1: f64,
    p00: Point3,
    p10: Point3,
    p01: Point3,
    p11: Point3,
    /// `[00, 10, 01, 11]` quadrant child indices, once split.
    children: Option<[usize; 4]>,
}

impl Node {
    fn new(surface: &dyn Surface, u0: f64, u1: f64, v0: f64, v1: f64) -> Self {
        Self {
            u0,
            u1,
            v0,
            v1,
            p00: surface.evaluate(Point2::new(u0, v0)),
            p10: surface.evaluate(Point2::new(u1, v0)),
            p01: surface.evaluate(Point2::new(u0, v1)),
            p11: surface.evaluate(Point2::new(u1, v1)),
            children: None,
        }
    }

    /// The plane the tile's corners span the largest projected area in.
    fn dominant_plane(&self) -> Plane {
        let area = |a: Point2, b: Point2, c: Point2, d: Point2| -> f64 {
            let shoelace = |p: Point2, q: Point2| p.x * q.y - q.x * p.y;
            (shoelace(a, b) + shoelace(b, d) + shoelace(d, c) + shoelace(c, a)).abs()
        };
        let xy = area(
            Point2::new(self.p00.x, self.p00.y),
            Point2::new(self.p10.x, self.p10.y),
            Point2::new(self.p01.x, self.p01.y),
            Point2::new(self.p11.x, self.p11.y),
        );
        let yz = area(
            Point2::new(self.p00.y, self.p00.z),
            Point2::new(self.p10.y, self.p10.z),
            Point2::new(self.p01.y, self.p01.z),
            Point2::new(self.p11.y, self.p11.z),
        );
        let xz = area(
            Point2::new(self.p00.x, self.p00.z),
            Point2::new(self.p10.x, self.p10.z),
            Point2::new(self.p01.x, self.p01.z),
            Point2::new(self.p11.x, self.p11.z),
        );
        if xy >= yz && xy >= xz {
            Plane::Xy
        } else if yz >= xz {
            Plane::Yz
        } else {
            Plane::Xz
        }
    }

    /// Solve the inverse bilinear map for `p` projected onto `plane`,
    /// returning local `(u, v) ∈ ~[0, 1]^2` (may fall slightly outside
    /// when `p` is not exactly on the tile).
    fn inverse_bilinear(&self, p: &Point3, plane: Plane) -> (f64, f64) {
        let q00 = plane.project(&self.p00);
        let q10 = plane.project(&self.p10);
        let q01 = plane.project(&self.p01);
        let q11 = plane.project(&self.p11);
        let target = plane.project(p);

        let a_pt = q00;
        let b = q10 - q00;
        let c = q01 - q00;
        let d = q11.coords - q10.coords - q01.coords + q00.coords;
        let e = target - a_pt;

        let cross = |ux: f64, uy: f64, vx: f64, vy: f64| ux * vy - uy * vx;

        let k2 = cross(b.x, b.y, d.x, d.y);
        let k1 = cross(b.x, b.y, c.x, c.y) + cross(e.x, e.y, d.x, d.y);
        let k0 = cross(e.x, e.y, c.x, c.y);

        let v = if k2.abs() < 1e-12 {
            if k1.abs() < 1e-12 {
                0.5
            } else {
                -k0 / k1
            }
        } else {
            let disc = (k1 * k1 - 4.0 * k2 * k0).max(0.0).sqrt();
            let v1 = (-k1 + disc) / (2.0 * k2);
            let v2 = (-k1 - disc) / (2.0 * k2);
            if (v1 - 0.5).abs() <= (v2 - 0.5).abs() {
                v1
            } else {
                v2
            }
        };

        let denom_x = b.x + v * d.x;
        let denom_y = b.y + v * d.y;
        let u = if denom_x.abs() >= denom_y.abs() {
            if denom_x.abs() < 1e-12 {
                0.5
            } else {
                (e.x - v * c.x) / denom_x
            }
        } else if denom_y.abs() < 1e-12 {
            0.5
        } else {
            (e.y - v * c.y) / denom_y
        };

        (u, v)
    }
}

/// Arena-backed adaptive tile quadtree over a surface's `(u, v)` domain.
#[derive(Debug, Clone)]
pub struct AdaptiveTileTree {
    nodes: Vec<Node>,
}

impl AdaptiveTileTree {
    /// Create a tree with a single root tile spanning the surface's
    /// domain.
    pub fn new(surface: &dyn Surface) -> Self {
        let ((u0, u1), (v0, v1)) = surface.domain();
        Self {
            nodes: vec![Node::new(surface, u0, u1, v0, v1)],
        }
    }

    /// Number of tiles currently allocated in the arena.
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    fn split(&mut self, surface: &dyn Surface, idx: usize) -> [usize; 4] {
        if let Some(children) = self.nodes[idx].children {
            return children;
        }
        let (u0, u1, v0, v1) = (
            self.nodes[idx].u0,
            self.nodes[idx].u1,
            self.nodes[idx].v0,
            self.nodes[idx].v1,
        );
        let um = 0.5 * (u0 + u1);
        let vm = 0.5 * (v0 + v1);
        let quads = [
            (u0, um, v0, vm),
            (um, u1, v0, vm),
            (u0, um, vm, v1),
            (um, u1, vm, v1),
        ];
        let mut children = [0usize; 4];
        for (i, (a, b, c, d)) in quads.into_iter().enumerate() {
            children[i] = self.nodes.len();
            self.nodes.push(Node::new(surface, a, b, c, d));
        }
        self.nodes[idx].children = Some(children);
        children
    }

    /// Descend to the leaf tile at `idx` whose bounding box (the convex
    /// hull of its four corners) is closest to `p`, splitting up to
    /// `MAX_DEPTH` along the way.
    fn descend(&mut self, surface: &dyn Surface, p: &Point3) -> usize {
        let mut idx = 0usize;
        let mut depth = 0u32;
        while depth < MAX_DEPTH {
            let children = self.split(surface, idx);
            idx = *children
                .iter()
                .min_by(|&&a, &&b| {
                    self.tile_distance_sq(a, p)
                        .partial_cmp(&self.tile_distance_sq(b, p))
                        .unwrap()
                })
                .unwrap();
            depth += 1;
        }
        idx
    }

    fn tile_distance_sq(&self, idx: usize, p: &Point3) -> f64 {
        let n = &self.nodes[idx];
        let centroid = Point3::from(
            (n.p00.coords + n.p10.coords + n.p01.coords + n.p11.coords) * 0.25,
        );
        (centroid - p).norm_squared()
    }

    /// Find the `(u, v)` parameter pair whose point on `surface` is
    /// closest to `p`.
    ///
    /// Returns [`InvertError::DidNotConverge`] (carrying the best
    /// candidate found) if the neighbor walk exhausts its cycle guard
    /// without landing inside a tile.
    pub fn invert(
        &mut self,
        surface: &dyn Surface,
        p: &Point3,
    ) -> Result<(f64, f64), InvertError> {
        let mut idx = self.descend(surface, p);
        let mut rungs = 0u32;
        let mut visited = std::collections::HashSet::new();

        loop {
            let plane = self.nodes[idx].dominant_plane();
            let (local_u, local_v) = self.nodes[idx].inverse_bilinear(p, plane);

            let node = &self.nodes[idx];
            if (-1e-6..=1.0 + 1e-6).contains(&local_u) && (-1e-6..=1.0 + 1e-6).contains(&local_v) {
                let u = node.u0 + local_u.clamp(0.0, 1.0) * (node.u1 - node.u0);
                let v = node.v0 + local_v.clamp(0.0, 1.0) * (node.v1 - node.v0);
                return Ok((u, v));
            }

            if rungs >= MAX_RUNGS || !visited.insert(idx) {
                return Err(InvertError::DidNotConverge(rungs));
            }

            // Neighbor walk: step toward whichever side the overrun points.
            let step_u = if local_u < -1e-6 {
                -(node.u1 - node.u0)
            } else if local_u > 1.0 + 1e-6 {
                node.u1 - node.u0
            } else {
                0.0
            };
            let step_v = if local_v < -1e-6 {
                -(node.v1 - node.v0)
            } else if local_v > 1.0 + 1e-6 {
                node.v1 - node.v0
            } else {
                0.0
            };
            let target = Point3::new(
                0.5 * (node.u0 + node.u1) + step_u,
                0.5 * (node.v0 + node.v1) + step_v,
                0.0,
            );
            let ((min_u, max_u), (min_v, max_v)) = surface.domain();
            let clamped_u = target.x.clamp(min_u, max_u);
            let clamped_v = target.y.clamp(min_v, max_v);
            idx = self.descend(surface, &surface.evaluate(Point2::new(clamped_u, clamped_v)));
            rungs += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcad_kernel_geom::Plane as GeomPlane;

    #[test]
    fn test_invert_planar_surface_center() {
        let plane = GeomPlane::xy();
        let mut tree = AdaptiveTileTree::new(&plane);
        let (u, v) = tree.invert(&plane, &Point3::new(3.0, 4.0, 0.0)).unwrap();
        assert!((u - 3.0).abs() < 1e-3, "u={u}");
        assert!((v - 4.0).abs() < 1e-3, "v={v}");
    }

    #[test]
    fn test_tile_tree_grows() {
        let plane = GeomPlane::xy();
        let mut tree = AdaptiveTileTree::new(&plane);
        let before = tree.node_count();
        let _ = tree.invert(&plane, &Point3::new(1.0, 1.0, 0.0));
        assert!(tree.node_count() > before);
    }
}
