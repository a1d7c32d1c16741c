//! Builds UV trim loops from a face's bounding contours.
//!
//! This is the M1 → M4 → M5 link: each contour curve is discretized in 3D
//! (M1's `Curve3d::discretize`), and every boundary point is mapped onto
//! the surface's parameter domain by inverting it through an
//! [`AdaptiveTileTree`] (M4). The resulting [`TrimLoop`] is what
//! [`crate::tessellate_trimmed`] needs to cut a full tessellation down to
//! the trimmed region.

use vcad_kernel_geom::{Contour, Curve3d, Face, GeometryStore, Surface};
use vcad_kernel_invert::AdaptiveTileTree;
use vcad_kernel_math::{Point2, Point3, Tolerances};

use crate::trim::TrimLoop;

/// Discretize a single curve's points as this contour traverses it: in
/// parametric order if `forward`, reversed otherwise, always stopping one
/// point short of the curve's exit point from this contour (which is the
/// entry point of the next curve, per `discretize`'s "start but not end"
/// contract applied in the traversal direction).
fn curve_points(curve: &dyn Curve3d, forward: bool, tolerances: Tolerances) -> Vec<Point3> {
    let mut pts = Vec::new();
    curve.discretize(&mut pts, tolerances.chord, tolerances.angle);
    let (_, t1) = curve.domain();
    pts.push(curve.evaluate(t1));
    if forward {
        pts.pop();
    } else {
        pts.reverse();
        pts.pop();
    }
    pts
}

/// Discretize `contour`'s curves end-to-end and invert every boundary
/// point onto `surface`'s parameter domain via `tree`, producing the UV
/// loop the trimmer needs.
///
/// A point that fails to invert (an ill-conditioned neighbor walk) falls
/// back to the surface's domain midpoint, per the inverter's own silent-
/// degradation contract — it never panics or aborts the loop.
pub fn contour_to_trim_loop(
    store: &GeometryStore,
    surface: &dyn Surface,
    contour: &Contour,
    tolerances: Tolerances,
    tree: &mut AdaptiveTileTree,
) -> TrimLoop {
    let mut points = Vec::new();
    for curve_ref in &contour.curves {
        let curve = store.curves_3d[curve_ref.curve_id].as_ref();
        points.extend(curve_points(curve, curve_ref.forward, tolerances));
    }

    let ((u0, u1), (v0, v1)) = surface.domain();
    let uv = points
        .iter()
        .map(|p| {
            tree.invert(surface, p)
                .unwrap_or((0.5 * (u0 + u1), 0.5 * (v0 + v1)))
        })
        .map(|(u, v)| Point2::new(u, v))
        .collect();

    TrimLoop { uv }
}

/// Build the outer/hole trim loops for `face` (outer boundary first, any
/// remaining contours as holes) and the UV region enclosing them all.
pub fn face_trim_loops(
    store: &GeometryStore,
    face: &Face,
    tolerances: Tolerances,
) -> (Box<dyn Surface>, TrimLoop, Vec<TrimLoop>, ((f64, f64), (f64, f64))) {
    let surface = store.surfaces[face.surface].clone_box();
    let mut tree = AdaptiveTileTree::new(surface.as_ref());

    let mut loops: Vec<TrimLoop> = face
        .contours
        .iter()
        .map(|&ci| contour_to_trim_loop(store, surface.as_ref(), &store.contours[ci], tolerances, &mut tree))
        .collect();

    let outer = loops.remove(0);
    let region = bounding_region(&outer, &loops);
    (surface, outer, loops, region)
}

fn bounding_region(outer: &TrimLoop, holes: &[TrimLoop]) -> ((f64, f64), (f64, f64)) {
    let mut u0 = f64::MAX;
    let mut u1 = f64::MIN;
    let mut v0 = f64::MAX;
    let mut v1 = f64::MIN;
    for p in outer.uv.iter().chain(holes.iter().flat_map(|h| h.uv.iter())) {
        u0 = u0.min(p.x);
        u1 = u1.max(p.x);
        v0 = v0.min(p.y);
        v1 = v1.max(p.y);
    }
    ((u0, u1), (v0, v1))
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcad_kernel_geom::{GeometryStore, Line3d, Plane};

    fn square_face(store: &mut GeometryStore) -> Face {
        let surface = store.add_surface(Box::new(Plane::xy()));
        let corners = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mut contour = Contour::new();
        for i in 0..4 {
            let line = store.add_curve_3d(Box::new(Line3d::from_points(corners[i], corners[(i + 1) % 4])));
            contour.push(line, true, -1);
        }
        let contour = store.add_contour(contour);
        let idx = store.add_face(surface, vec![contour]);
        store.faces[idx].clone()
    }

    #[test]
    fn test_contour_to_trim_loop_traces_square() {
        let mut store = GeometryStore::new();
        let face = square_face(&mut store);
        let surface = store.surfaces[face.surface].clone_box();
        let mut tree = AdaptiveTileTree::new(surface.as_ref());
        let loop_ = contour_to_trim_loop(&store, surface.as_ref(), &store.contours[face.contours[0]], Tolerances::FINE, &mut tree);
        assert_eq!(loop_.uv.len(), 4);
        assert!((loop_.uv[0].x - 0.0).abs() < 1e-6 && (loop_.uv[0].y - 0.0).abs() < 1e-6);
        assert!((loop_.uv[2].x - 1.0).abs() < 1e-6 && (loop_.uv[2].y - 1.0).abs() < 1e-6);
    }

    #[test]
    fn test_face_trim_loops_region_covers_square() {
        let mut store = GeometryStore::new();
        let face = square_face(&mut store);
        let (_surface, outer, holes, region) = face_trim_loops(&store, &face, Tolerances::FINE);
        assert_eq!(outer.uv.len(), 4);
        assert!(holes.is_empty());
        assert!((region.0 .0 - 0.0).abs() < 1e-6);
        assert!((region.0 .1 - 1.0).abs() < 1e-6);
    }
}
