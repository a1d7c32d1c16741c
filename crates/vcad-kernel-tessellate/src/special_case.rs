//! Closed-form tessellation shortcuts for surfaces whose curvature is
//! uniform across their whole domain, where adaptive subdivision would
//! waste work re-discovering the same refinement everywhere.

use crate::mesh::TriangleMesh;
use vcad_kernel_geom::{CylinderSurface, Plane, Surface, SurfaceKind};
use vcad_kernel_math::{Point2, Tolerances};

/// A flat rectangular region needs no refinement at all: two triangles
/// spanning the four corners reproduce the plane exactly.
fn tessellate_planar(
    surface: &dyn Surface,
    region: ((f64, f64), (f64, f64)),
) -> (TriangleMesh, Vec<Point2>) {
    let ((u0, u1), (v0, v1)) = region;
    let mut mesh = TriangleMesh::new();
    let corners = [(u0, v0), (u1, v0), (u1, v1), (u0, v1)];
    let mut uvs = Vec::with_capacity(4);
    for (u, v) in corners {
        let p = surface.evaluate(Point2::new(u, v));
        let n = surface.normal(Point2::new(u, v));
        mesh.vertices.extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
        mesh.normals.extend_from_slice(&[n.x as f32, n.y as f32, n.z as f32]);
        uvs.push(Point2::new(u, v));
    }
    mesh.indices.extend_from_slice(&[0, 1, 2, 0, 2, 3]);
    (mesh, uvs)
}

/// A cylindrical patch's curvature only varies along `u` (the angular
/// axis) and is constant along `v` (the axial axis), so a single ring of
/// quads at a fixed angular step reproduces it within tolerance with no
/// recursive refinement: the number of angular segments is chosen from
/// the chord tolerance via the sagitta formula for a circular arc.
fn tessellate_cylindrical(
    surface: &CylinderSurface,
    region: ((f64, f64), (f64, f64)),
    tolerances: Tolerances,
) -> (TriangleMesh, Vec<Point2>) {
    let ((u0, u1), (v0, v1)) = region;
    let span = u1 - u0;
    let r = surface.radius.max(1e-9);
    // sagitta s = r * (1 - cos(theta/2)) <= chord  =>  theta <= 2*acos(1 - chord/r)
    let chord_ratio = (tolerances.chord / r).min(1.0);
    let angle_from_chord = 2.0 * (1.0 - chord_ratio).acos();
    let step = angle_from_chord.min(tolerances.angle).max(1e-6);
    let segments = (span / step).ceil().max(1.0) as usize;

    let mut mesh = TriangleMesh::new();
    let mut uvs = Vec::with_capacity((segments + 1) * 2);
    for i in 0..=segments {
        let u = u0 + span * (i as f64) / (segments as f64);
        for v in [v0, v1] {
            let p = surface.evaluate(Point2::new(u, v));
            let n = surface.normal(Point2::new(u, v));
            mesh.vertices.extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
            mesh.normals.extend_from_slice(&[n.x as f32, n.y as f32, n.z as f32]);
            uvs.push(Point2::new(u, v));
        }
    }
    for i in 0..segments {
        let base = (i * 2) as u32;
        // bottom-left, bottom-right, top-right, top-left (v0 at even indices)
        mesh.indices.extend_from_slice(&[base, base + 2, base + 3, base, base + 3, base + 1]);
    }
    (mesh, uvs)
}

/// Dispatch to a closed-form shortcut when the surface's kind admits one,
/// else `None` so the caller falls back to adaptive subdivision.
pub fn tessellate_special_case(
    surface: &dyn Surface,
    region: ((f64, f64), (f64, f64)),
    tolerances: Tolerances,
) -> Option<TriangleMesh> {
    tessellate_special_case_with_uv(surface, region, tolerances).map(|(mesh, _)| mesh)
}

/// Same as [`tessellate_special_case`] but also returns each vertex's
/// source `(u, v)`, needed for trimming.
pub fn tessellate_special_case_with_uv(
    surface: &dyn Surface,
    region: ((f64, f64), (f64, f64)),
    tolerances: Tolerances,
) -> Option<(TriangleMesh, Vec<Point2>)> {
    match surface.surface_type() {
        SurfaceKind::Plane => surface
            .as_any()
            .downcast_ref::<Plane>()
            .map(|_| tessellate_planar(surface, region)),
        SurfaceKind::Cylinder => surface
            .as_any()
            .downcast_ref::<CylinderSurface>()
            .map(|cyl| tessellate_cylindrical(cyl, region, tolerances)),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_planar_shortcut_is_a_single_quad() {
        let plane = Plane::xy();
        let mesh = tessellate_special_case(&plane, ((0.0, 5.0), (0.0, 5.0)), Tolerances::FINE).unwrap();
        assert_eq!(mesh.num_triangles(), 2);
        assert_eq!(mesh.num_vertices(), 4);
    }

    #[test]
    fn test_full_cylinder_shortcut_segments_by_radius() {
        use std::f64::consts::PI;
        let small = CylinderSurface::new(1.0);
        let large = CylinderSurface::new(100.0);
        let small_mesh =
            tessellate_special_case(&small, ((0.0, 2.0 * PI), (0.0, 10.0)), Tolerances::FINE).unwrap();
        let large_mesh =
            tessellate_special_case(&large, ((0.0, 2.0 * PI), (0.0, 10.0)), Tolerances::FINE).unwrap();
        // A larger radius needs fewer angular segments for the same chord budget.
        assert!(large_mesh.num_triangles() < small_mesh.num_triangles());
    }

    #[test]
    fn test_partial_cylinder_shortcut_spans_only_its_arc() {
        use std::f64::consts::PI;
        let cyl = CylinderSurface::new(5.0);
        let mesh = tessellate_special_case(&cyl, ((0.0, PI / 2.0), (0.0, 1.0)), Tolerances::FINE).unwrap();
        assert!(mesh.num_triangles() > 0);
    }

    #[test]
    fn test_non_special_surface_returns_none() {
        use vcad_kernel_geom::SphereSurface;
        let sphere = SphereSurface::new(1.0);
        assert!(tessellate_special_case(&sphere, sphere.domain(), Tolerances::FINE).is_none());
    }
}
