#![warn(missing_docs)]

//! Adaptive curvature-driven surface tessellation for the vcad kernel.
//!
//! Converts a parametric [`Surface`] into a [`TriangleMesh`] by recursive
//! UV-space subdivision, refining only where the surface's curvature
//! demands it: a cell is split along whichever axis has an edge whose
//! midpoint deviates from its straight chord by more than the requested
//! chord tolerance. Surfaces with uniform curvature across their whole
//! domain (planes, cylinders) skip recursion entirely via
//! [`special_case::tessellate_special_case`].
//!
//! A face trimmed to a boundary contour narrower than the surface's full
//! domain is handled by tessellating the full region and then discarding
//! triangles outside the trim loop(s); see [`trim`].

pub mod adaptive;
pub mod contour;
pub mod mesh;
pub mod special_case;
pub mod trim;

pub use adaptive::{tessellate_region, TessellationEvent, DEFAULT_BUDGET};
pub use contour::{contour_to_trim_loop, face_trim_loops};
pub use mesh::TriangleMesh;
pub use trim::TrimLoop;

use vcad_kernel_geom::{Face, GeometryStore, Surface};
use vcad_kernel_math::{Point2, Tolerances};

/// Tessellate the whole of `surface`'s parameter domain, choosing a
/// closed-form shortcut when its surface kind admits one and falling
/// back to adaptive subdivision otherwise.
///
/// Surfaces with an unbounded domain (a raw [`vcad_kernel_geom::Plane`]
/// has `u, v ∈ [-1e10, 1e10]`) should be tessellated with
/// [`tessellate_bounded_region`] against a caller-supplied finite region
/// instead — tessellating the raw domain would produce a degenerate,
/// enormous quad.
pub fn tessellate_surface(surface: &dyn Surface, tolerances: Tolerances) -> TriangleMesh {
    tessellate_bounded_region(surface, surface.domain(), tolerances)
}

/// Tessellate a caller-specified rectangular `(u, v)` region of `surface`.
pub fn tessellate_bounded_region(
    surface: &dyn Surface,
    region: ((f64, f64), (f64, f64)),
    tolerances: Tolerances,
) -> TriangleMesh {
    if let Some(mesh) = special_case::tessellate_special_case(surface, region, tolerances) {
        tracing::debug!(surface_type = ?surface.surface_type(), "tessellated via closed-form shortcut");
        return mesh;
    }
    tracing::debug!(surface_type = ?surface.surface_type(), "tessellating via adaptive subdivision");
    adaptive::tessellate_region(surface, region, tolerances, DEFAULT_BUDGET, None)
}

/// Tessellate `surface` and cut the result down to the region bounded by
/// `outer` (with `holes` subtracted), all in the surface's parameter
/// space. `region` should be a rectangle enclosing every loop.
pub fn tessellate_trimmed(
    surface: &dyn Surface,
    region: ((f64, f64), (f64, f64)),
    tolerances: Tolerances,
    outer: &TrimLoop,
    holes: &[TrimLoop],
) -> TriangleMesh {
    let (mesh, uvs) = tessellate_region_with_uv(surface, region, tolerances);
    let mut trimmed = trim::trim_mesh(&mesh, &uvs, outer, holes);
    trimmed.wires = wire_indices(surface, &mut trimmed, outer, holes);
    trimmed
}

/// Tessellate `face`'s surface, trimmed to the contours `store` records
/// for it: M1's curve discretization walks each contour in 3D, M4 inverts
/// the boundary onto the surface's `(u, v)` domain, and the result cuts
/// down a full tessellation of the enclosing region (§4.4 steps 1-2).
pub fn tessellate_face(store: &GeometryStore, face: &Face, tolerances: Tolerances) -> TriangleMesh {
    let _span = tracing::debug_span!("tessellate_face", surface = face.surface, contours = face.contours.len()).entered();
    let (surface, outer, holes, region) = face_trim_loops(store, face, tolerances);
    tessellate_trimmed(surface.as_ref(), region, tolerances, &outer, &holes)
}

fn tessellate_region_with_uv(
    surface: &dyn Surface,
    region: ((f64, f64), (f64, f64)),
    tolerances: Tolerances,
) -> (TriangleMesh, Vec<Point2>) {
    if let Some(result) = special_case::tessellate_special_case_with_uv(surface, region, tolerances) {
        return result;
    }
    adaptive::tessellate_region_with_uv(surface, region, tolerances, DEFAULT_BUDGET, None)
}

/// Append the trim loops' own vertices (evaluated fresh on `surface`) to
/// `mesh` and return the flat wire index-pair array tracing them.
fn wire_indices(
    surface: &dyn Surface,
    mesh: &mut TriangleMesh,
    outer: &TrimLoop,
    holes: &[TrimLoop],
) -> Vec<u32> {
    let mut wires = Vec::new();
    for loop_ in std::iter::once(outer).chain(holes.iter()) {
        if loop_.uv.len() < 2 {
            continue;
        }
        let start = mesh.num_vertices() as u32;
        for &uv in &loop_.uv {
            let p = surface.evaluate(uv);
            let n = surface.normal(uv);
            mesh.vertices.extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
            mesh.normals.extend_from_slice(&[n.x as f32, n.y as f32, n.z as f32]);
        }
        let count = loop_.uv.len() as u32;
        for i in 0..count {
            wires.push(start + i);
            wires.push(start + (i + 1) % count);
        }
    }
    wires
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcad_kernel_geom::{Plane, SphereSurface};

    #[test]
    fn test_tessellate_bounded_region_uses_planar_shortcut() {
        let plane = Plane::xy();
        let mesh = tessellate_bounded_region(&plane, ((0.0, 1.0), (0.0, 1.0)), Tolerances::FINE);
        assert_eq!(mesh.num_triangles(), 2);
    }

    #[test]
    fn test_tessellate_surface_on_bounded_kind() {
        let sphere = SphereSurface::new(2.0);
        let mesh = tessellate_surface(&sphere, Tolerances::COARSE);
        assert!(mesh.num_triangles() > 0);
    }

    #[test]
    fn test_tessellate_trimmed_keeps_only_inner_region() {
        use std::f64::consts::PI;
        let sphere = SphereSurface::new(5.0);
        let full = tessellate_bounded_region(
            &sphere,
            ((0.0, 2.0 * PI), (-PI / 2.0, PI / 2.0)),
            Tolerances::FINE,
        );
        let outer = TrimLoop {
            uv: vec![
                Point2::new(0.5, -0.5),
                Point2::new(1.5, -0.5),
                Point2::new(1.5, 0.5),
                Point2::new(0.5, 0.5),
            ],
        };
        let trimmed = tessellate_trimmed(
            &sphere,
            ((0.0, 2.0 * PI), (-PI / 2.0, PI / 2.0)),
            Tolerances::FINE,
            &outer,
            &[],
        );
        assert!(trimmed.num_triangles() < full.num_triangles());
        assert!(!trimmed.wires.is_empty());
    }
}
