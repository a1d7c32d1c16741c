#![warn(missing_docs)]

//! Facade for the vcad B-rep geometry kernel.
//!
//! Ties together the kernel's independent engines — trimmed parametric
//! surfaces and curves ([`vcad_kernel_geom`]), NURBS evaluation
//! ([`vcad_kernel_nurbs`]), adaptive point inversion
//! ([`vcad_kernel_invert`]), adaptive surface tessellation
//! ([`vcad_kernel_tessellate`]), plane-section slicing
//! ([`vcad_kernel_drafting`]), and OBB-tree collision
//! ([`vcad_kernel_collision`]) — behind a single crate and a single
//! [`KernelError`].
//!
//! # Example
//!
//! ```
//! use vcad_kernel::{mesh_surface, vcad_kernel_geom::Plane, vcad_kernel_math::Tolerances};
//!
//! let plane = Plane::xy();
//! let mesh = mesh_surface(&plane, Tolerances::FINE);
//! assert!(mesh.num_triangles() > 0);
//! ```

pub use vcad_kernel_collision;
pub use vcad_kernel_drafting;
pub use vcad_kernel_geom;
pub use vcad_kernel_invert;
pub use vcad_kernel_math;
pub use vcad_kernel_nurbs;
pub use vcad_kernel_tessellate;

use vcad_kernel_collision::{bvh::CMesh, CollisionResult};
use vcad_kernel_drafting::{SectionChain, SectionPlane};
use vcad_kernel_geom::{Face, GeomError, GeometryStore, Surface};
use vcad_kernel_invert::{AdaptiveTileTree, InvertError};
use vcad_kernel_math::{Point3, Tolerances, Transform};
use vcad_kernel_tessellate::TriangleMesh;

/// Errors that cross the kernel's public boundary.
///
/// Internal query functions the kernel requires to never throw (point
/// inversion's neighbor walk, the adaptive mesher, the collision
/// traversal) represent failure in-band instead — a best-effort
/// parameter pair, an exhausted split budget, a boolean `crash`. This
/// enum is reserved for the tier-2 domain-violation boundary: malformed
/// constructor arguments and the handful of query functions that do
/// carry a `Result` already.
#[derive(Debug, thiserror::Error)]
pub enum KernelError {
    /// A curve or surface constructor was given invalid parameters.
    #[error(transparent)]
    Geom(#[from] GeomError),
    /// Point inversion's neighbor walk failed to converge.
    #[error(transparent)]
    Invert(#[from] InvertError),
}

/// Tessellate a surface over its full, untrimmed domain at the given
/// tolerances. For a surface bounded by contours, use [`mesh_face`]
/// instead.
pub fn mesh_surface(surface: &dyn Surface, tolerances: Tolerances) -> TriangleMesh {
    let _span = tracing::debug_span!(
        "mesh_surface",
        surface_type = ?surface.surface_type(),
        chord = tolerances.chord,
    )
    .entered();
    vcad_kernel_tessellate::tessellate_surface(surface, tolerances)
}

/// Tessellate `face`'s surface trimmed to the contours `store` records
/// for it, discretizing the boundary in 3D and inverting it onto the
/// surface's domain before meshing.
pub fn mesh_face(store: &GeometryStore, face: &Face, tolerances: Tolerances) -> TriangleMesh {
    let _span = tracing::debug_span!("mesh_face", surface = face.surface).entered();
    vcad_kernel_tessellate::tessellate_face(store, face, tolerances)
}

/// Invert a 3D point to its closest `(u, v)` on `surface`, growing
/// `tree` lazily as needed.
///
/// `tree` must have been built over the same `surface`; it is thread-
/// confined to that surface's owning object, per the kernel's
/// concurrency model.
pub fn invert_point(
    tree: &mut AdaptiveTileTree,
    surface: &dyn Surface,
    p: &Point3,
) -> Result<(f64, f64), KernelError> {
    Ok(tree.invert(surface, p)?)
}

/// Build an OBB collision tree over a triangle mesh's current
/// (already-transformed) vertex positions.
///
/// `xfm` is the world-to-local transform under which the tree's boxes
/// are expressed, as required by [`vcad_kernel_collision::collide`].
pub fn build_collision_mesh(mesh: &TriangleMesh, xfm: Transform) -> CMesh {
    let _span = tracing::debug_span!("build_collision_mesh", triangles = mesh.num_triangles()).entered();
    let points = mesh
        .vertices
        .chunks_exact(3)
        .map(|c| Point3::new(c[0] as f64, c[1] as f64, c[2] as f64))
        .collect();
    vcad_kernel_collision::bvh::build(points, mesh.indices.clone(), xfm)
}

/// Test two collision meshes for intersection.
pub fn collide(a: &CMesh, b: &CMesh, only_one: bool) -> CollisionResult {
    let _span = tracing::debug_span!("collide_meshes", only_one).entered();
    vcad_kernel_collision::collide(a, b, only_one)
}

/// Cut one or more triangle meshes with a plane, returning the 3D
/// polylines traced where the plane crosses their surfaces.
pub fn section(meshes: &[&TriangleMesh], plane: &SectionPlane) -> Vec<SectionChain> {
    let _span = tracing::debug_span!("section_meshes", meshes = meshes.len()).entered();
    vcad_kernel_drafting::section_meshes(meshes, plane)
}

#[cfg(test)]
mod tests {
    use super::*;
    use vcad_kernel_geom::{Contour, GeometryStore, Line3d, Plane};

    #[test]
    fn test_mesh_face_trims_to_contour() {
        let mut store = GeometryStore::new();
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
        let face_idx = store.add_face(surface, vec![contour]);
        let face = store.faces[face_idx].clone();

        let mesh = mesh_face(&store, &face, Tolerances::FINE);
        assert!(mesh.num_triangles() > 0);
    }

    #[test]
    fn test_mesh_surface_plane() {
        let plane = Plane::xy();
        let mesh = mesh_surface(&plane, Tolerances::FINE);
        assert!(mesh.num_triangles() > 0);
    }

    #[test]
    fn test_full_pipeline_mesh_collide_section() {
        let plane_a = Plane::xy();
        let mesh_a = mesh_surface(&plane_a, Tolerances::COARSE);
        let cmesh_a = build_collision_mesh(&mesh_a, Transform::identity());
        let cmesh_b = build_collision_mesh(&mesh_a, Transform::translation(0.0, 0.0, 0.0));
        let result = collide(&cmesh_a, &cmesh_b, false);
        assert!(result.crash);

        let chains = section(&[&mesh_a], &SectionPlane::horizontal(0.0));
        // A plane mesh at z=0 sectioned at z=0 is degenerate; just
        // confirm the pipeline runs end to end without panicking.
        let _ = chains;
    }

    #[test]
    fn test_invert_point_on_plane() {
        let plane = Plane::xy();
        let mut tree = AdaptiveTileTree::new(&plane);
        let p = Point3::new(0.3, -0.7, 0.0);
        let (u, v) = invert_point(&mut tree, &plane, &p).unwrap();
        assert!((u - 0.3).abs() < 1e-6);
        assert!((v - -0.7).abs() < 1e-6);
    }
}
