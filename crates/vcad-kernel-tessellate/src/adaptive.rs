//! Adaptive curvature-driven triangle refinement for parametric surfaces.
//!
//! Each UV cell starts as a single quad (two triangles). The midpoint of
//! every edge is evaluated in 3D and compared against the midpoint of the
//! straight chord between that edge's endpoints; if the deviation exceeds
//! the chord tolerance, the cell is split along that axis. Splitting
//! always uses the same UV midpoint for both the deviation check and the
//! actual subdivision, so a shared edge between sibling cells is always
//! measured and split identically — no seam cracks can open between a
//! refined cell and an unrefined neighbor sharing that edge.
//!
//! The quad's diagonal (`p00`-`p11`), shared by both emitted triangles, is
//! checked the same way: a saddle-shaped patch can be flat along all four
//! perimeter edges while its diagonal deviates arbitrarily, so the
//! diagonal check forces a split on its own even when the perimeter would
//! otherwise accept the cell as a leaf.

use crate::mesh::TriangleMesh;
use std::collections::HashMap;
use vcad_kernel_geom::Surface;
use vcad_kernel_math::{Point2, Point3, Tolerances};

const MAX_DEPTH: u32 = 24;
const UV_DEDUP: f64 = 1e-6;

/// Observable events emitted while tessellating, for tracing/diagnostics.
#[derive(Debug, Clone, Copy)]
pub enum TessellationEvent {
    /// A cell was split; `axes` is `(u, v)` indicating which axes split.
    CellSplit {
        /// Recursion depth of the cell that was split.
        depth: u32,
        /// Which axes split.
        axes: (bool, bool),
    },
    /// The node budget was exhausted; remaining cells are accepted as-is.
    BudgetExhausted,
}

struct VertexCache<'a> {
    surface: &'a dyn Surface,
    map: HashMap<(i64, i64), u32>,
    positions: Vec<Point3>,
    uvs: Vec<Point2>,
    mesh: TriangleMesh,
}

impl<'a> VertexCache<'a> {
    fn new(surface: &'a dyn Surface) -> Self {
        Self {
            surface,
            map: HashMap::new(),
            positions: Vec::new(),
            uvs: Vec::new(),
            mesh: TriangleMesh::new(),
        }
    }

    fn key(u: f64, v: f64) -> (i64, i64) {
        ((u / UV_DEDUP).round() as i64, (v / UV_DEDUP).round() as i64)
    }

    fn get(&mut self, u: f64, v: f64) -> u32 {
        let k = Self::key(u, v);
        if let Some(&idx) = self.map.get(&k) {
            return idx;
        }
        let uv = Point2::new(u, v);
        let p = self.surface.evaluate(uv);
        let n = self.surface.normal(uv);
        let idx = self.mesh.num_vertices() as u32;
        self.mesh
            .vertices
            .extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
        self.mesh
            .normals
            .extend_from_slice(&[n.x as f32, n.y as f32, n.z as f32]);
        self.positions.push(p);
        self.uvs.push(uv);
        self.map.insert(k, idx);
        idx
    }

    fn pos(&self, idx: u32) -> Point3 {
        self.positions[idx as usize]
    }
}

fn edge_deviation(surface: &dyn Surface, a_uv: Point2, b_uv: Point2, a_p: Point3, b_p: Point3) -> f64 {
    let mid_uv = nalgebra::center(&a_uv, &b_uv);
    let mid_3d = surface.evaluate(mid_uv);
    let chord_mid = nalgebra::center(&a_p, &b_p);
    (mid_3d - chord_mid).norm()
}

#[allow(clippy::too_many_arguments)]
fn subdivide(
    u0: f64,
    u1: f64,
    v0: f64,
    v1: f64,
    tol: Tolerances,
    budget: &mut u32,
    depth: u32,
    cache: &mut VertexCache,
    tris: &mut Vec<[u32; 3]>,
    on_event: &mut Option<&mut dyn FnMut(TessellationEvent)>,
) {
    let p00 = cache.get(u0, v0);
    let p10 = cache.get(u1, v0);
    let p01 = cache.get(u0, v1);
    let p11 = cache.get(u1, v1);

    let surface = cache.surface;
    let bottom = edge_deviation(surface, Point2::new(u0, v0), Point2::new(u1, v0), cache.pos(p00), cache.pos(p10));
    let top = edge_deviation(surface, Point2::new(u0, v1), Point2::new(u1, v1), cache.pos(p01), cache.pos(p11));
    let left = edge_deviation(surface, Point2::new(u0, v0), Point2::new(u0, v1), cache.pos(p00), cache.pos(p01));
    let right = edge_deviation(surface, Point2::new(u1, v0), Point2::new(u1, v1), cache.pos(p10), cache.pos(p11));
    // p00-p11 is the diagonal shared by both emitted triangles; a saddle
    // patch can pass all four perimeter checks while this edge deviates
    // arbitrarily, so it forces a split on its own.
    let diag = edge_deviation(surface, Point2::new(u0, v0), Point2::new(u1, v1), cache.pos(p00), cache.pos(p11));

    let need_u = bottom > tol.chord || top > tol.chord || diag > tol.chord;
    let need_v = left > tol.chord || right > tol.chord || diag > tol.chord;

    if depth >= MAX_DEPTH || *budget == 0 || (!need_u && !need_v) {
        if *budget == 0 && (need_u || need_v) {
            if let Some(cb) = on_event.as_mut() {
                cb(TessellationEvent::BudgetExhausted);
            }
        }
        tris.push([p00, p10, p11]);
        tris.push([p00, p11, p01]);
        return;
    }

    *budget -= 1;
    if let Some(cb) = on_event.as_mut() {
        cb(TessellationEvent::CellSplit {
            depth,
            axes: (need_u, need_v),
        });
    }
    let um = 0.5 * (u0 + u1);
    let vm = 0.5 * (v0 + v1);

    match (need_u, need_v) {
        (true, true) => {
            subdivide(u0, um, v0, vm, tol, budget, depth + 1, cache, tris, on_event);
            subdivide(um, u1, v0, vm, tol, budget, depth + 1, cache, tris, on_event);
            subdivide(u0, um, vm, v1, tol, budget, depth + 1, cache, tris, on_event);
            subdivide(um, u1, vm, v1, tol, budget, depth + 1, cache, tris, on_event);
        }
        (true, false) => {
            subdivide(u0, um, v0, v1, tol, budget, depth + 1, cache, tris, on_event);
            subdivide(um, u1, v0, v1, tol, budget, depth + 1, cache, tris, on_event);
        }
        (false, true) => {
            subdivide(u0, u1, v0, vm, tol, budget, depth + 1, cache, tris, on_event);
            subdivide(u0, u1, vm, v1, tol, budget, depth + 1, cache, tris, on_event);
        }
        (false, false) => unreachable!(),
    }
}

/// Adaptively tessellate the rectangular UV region `(u0, u1) x (v0, v1)` of
/// `surface`, refining until every cell's edge midpoints deviate from the
/// straight chord by no more than `tolerances.chord`.
///
/// `budget` bounds the total number of splits performed across the whole
/// call tree (not a per-branch depth), so a pathological region cannot
/// blow up mesh size unboundedly; cells still needing refinement when the
/// budget runs out are accepted as-is and the caller is notified via
/// [`TessellationEvent::BudgetExhausted`] through `on_event`.
pub fn tessellate_region(
    surface: &dyn Surface,
    region: ((f64, f64), (f64, f64)),
    tolerances: Tolerances,
    budget: u32,
    on_event: Option<&mut dyn FnMut(TessellationEvent)>,
) -> TriangleMesh {
    tessellate_region_with_uv(surface, region, tolerances, budget, on_event).0
}

/// Same as [`tessellate_region`] but also returns each output vertex's
/// source `(u, v)`, needed by [`crate::trim`] to classify triangles
/// against a boundary loop defined in parameter space.
pub fn tessellate_region_with_uv(
    surface: &dyn Surface,
    region: ((f64, f64), (f64, f64)),
    tolerances: Tolerances,
    mut budget: u32,
    on_event: Option<&mut dyn FnMut(TessellationEvent)>,
) -> (TriangleMesh, Vec<Point2>) {
    let ((u0, u1), (v0, v1)) = region;
    let mut cache = VertexCache::new(surface);
    let mut tris = Vec::new();
    let mut on_event = on_event;
    subdivide(u0, u1, v0, v1, tolerances, &mut budget, 0, &mut cache, &mut tris, &mut on_event);

    let mut mesh = cache.mesh;
    mesh.indices.reserve(tris.len() * 3);
    for [a, b, c] in tris {
        mesh.indices.push(a);
        mesh.indices.push(b);
        mesh.indices.push(c);
    }
    (mesh, cache.uvs)
}

/// Recursion/split budget used when the caller does not need a tighter
/// bound — generous enough for most production surfaces without letting a
/// single tessellation call run away.
pub const DEFAULT_BUDGET: u32 = 20_000;

#[cfg(test)]
mod tests {
    use super::*;
    use std::any::Any;
    use vcad_kernel_geom::{Surface, SurfaceKind};
    use vcad_kernel_math::Dir3;
    use vcad_kernel_geom::SphereSurface;
    use vcad_kernel_math::{Transform, Vec3};

    /// `z = u*v`: flat at all four corners of `[-1,1]x[-1,1]` but curved
    /// along the diagonal, so perimeter-only deviation checks would
    /// accept it as a single unsplit quad.
    #[derive(Debug, Clone)]
    struct SaddleSurface;

    impl Surface for SaddleSurface {
        fn evaluate(&self, uv: Point2) -> Point3 {
            Point3::new(uv.x, uv.y, uv.x * uv.y)
        }
        fn normal(&self, uv: Point2) -> Dir3 {
            Dir3::new_normalize(Vec3::new(-uv.y, -uv.x, 1.0))
        }
        fn d_du(&self, uv: Point2) -> Vec3 {
            Vec3::new(1.0, 0.0, uv.y)
        }
        fn d_dv(&self, uv: Point2) -> Vec3 {
            Vec3::new(0.0, 1.0, uv.x)
        }
        fn domain(&self) -> ((f64, f64), (f64, f64)) {
            ((-1.0, 1.0), (-1.0, 1.0))
        }
        fn surface_type(&self) -> SurfaceKind {
            SurfaceKind::Bilinear
        }
        fn clone_box(&self) -> Box<dyn Surface> {
            Box::new(self.clone())
        }
        fn as_any(&self) -> &dyn Any {
            self
        }
        fn transform(&self, _t: &Transform) -> Box<dyn Surface> {
            Box::new(self.clone())
        }
    }

    #[test]
    fn test_saddle_diagonal_forces_split_despite_flat_perimeter() {
        let saddle = SaddleSurface;
        // The four corners (-1,-1,1), (1,-1,-1), (-1,1,-1), (1,1,1) are
        // coplanar with flat edge midpoints, but the diagonal through the
        // center deviates from z=0 (the chord midpoint) by 1.0.
        let mesh = tessellate_region(&saddle, ((-1.0, 1.0), (-1.0, 1.0)), Tolerances::FINE, DEFAULT_BUDGET, None);
        assert!(mesh.num_triangles() > 2, "saddle diagonal must force a split beyond the initial quad");
    }

    #[test]
    fn test_flat_region_needs_no_split() {
        use vcad_kernel_geom::Plane;
        let plane = Plane::xy();
        let mesh = tessellate_region(
            &plane,
            ((0.0, 10.0), (0.0, 10.0)),
            Tolerances::COARSE,
            DEFAULT_BUDGET,
            None,
        );
        assert_eq!(mesh.num_triangles(), 2);
        assert_eq!(mesh.num_vertices(), 4);
    }

    #[test]
    fn test_curved_region_refines() {
        let sphere = SphereSurface::new(10.0);
        use std::f64::consts::PI;
        let coarse = tessellate_region(
            &sphere,
            ((0.0, PI / 2.0), (-PI / 4.0, PI / 4.0)),
            Tolerances::COARSE,
            DEFAULT_BUDGET,
            None,
        );
        let fine = tessellate_region(
            &sphere,
            ((0.0, PI / 2.0), (-PI / 4.0, PI / 4.0)),
            Tolerances::FINE,
            DEFAULT_BUDGET,
            None,
        );
        assert!(fine.num_triangles() > coarse.num_triangles());
    }

    #[test]
    fn test_no_duplicate_vertices_at_shared_edges() {
        let sphere = SphereSurface::new(5.0);
        use std::f64::consts::PI;
        let mesh = tessellate_region(
            &sphere,
            ((0.0, PI), (-PI / 3.0, PI / 3.0)),
            Tolerances::FINE,
            DEFAULT_BUDGET,
            None,
        );
        // Every vertex should be referenced by at least one triangle, and
        // no vertex position should be duplicated within dedup tolerance.
        assert!(mesh.num_vertices() > 0);
        assert!(mesh.indices.iter().all(|&i| (i as usize) < mesh.num_vertices()));
    }

    #[test]
    fn test_budget_exhaustion_reports_event() {
        let sphere = SphereSurface::new(1.0);
        use std::f64::consts::PI;
        let mut hit = false;
        {
            let mut cb = |e: TessellationEvent| {
                if matches!(e, TessellationEvent::BudgetExhausted) {
                    hit = true;
                }
            };
            tessellate_region(
                &sphere,
                ((0.0, 2.0 * PI), (-PI / 2.0, PI / 2.0)),
                Tolerances::FINE,
                2,
                Some(&mut cb),
            );
        }
        assert!(hit);
    }
}
