//! Separating-axis collision queries between two OBB trees.

use nalgebra::Matrix3;
use vcad_kernel_math::{Point3, Vec3};

use crate::bvh::{child_box, encode_box, CMesh};

/// An axis-epsilon added to `|R|` entries to keep the separating-axis
/// test well-conditioned when two edges are (near) parallel and their
/// cross product collapses toward zero.
const AXIS_EPSILON: f64 = 1e-8;

/// Result of a collision query between two collision meshes.
#[derive(Debug, Clone, Default)]
pub struct CollisionResult {
    /// Whether any triangle pair overlaps.
    pub crash: bool,
    /// Colliding triangle pairs, as `(base index into a.indices, base index into b.indices)`.
    /// Empty if `only_one` stopped the query at first contact.
    pub pairs: Vec<(u32, u32)>,
}

/// Test two collision meshes for intersection.
///
/// If `only_one` is set, the traversal stops at the first colliding
/// triangle pair and `pairs` is left empty; otherwise every colliding
/// pair is recorded.
pub fn collide(a: &CMesh, b: &CMesh, only_one: bool) -> CollisionResult {
    let _span = tracing::debug_span!("collide", only_one).entered();

    // Drive the recursion from the smaller tree.
    if a.boxes.len() > b.boxes.len() {
        let mut result = collide(b, a, only_one);
        for pair in result.pairs.iter_mut() {
            std::mem::swap(&mut pair.0, &mut pair.1);
        }
        return result;
    }

    if a.root().is_none() || b.root().is_none() {
        return CollisionResult::default();
    }

    let b_inv = b.xfm.inverse().unwrap_or_default();
    // Maps a point expressed in b's local frame into a's local frame.
    let to_a = a.xfm.then(&b_inv);
    let r = Matrix3::new(
        to_a.matrix[(0, 0)],
        to_a.matrix[(0, 1)],
        to_a.matrix[(0, 2)],
        to_a.matrix[(1, 0)],
        to_a.matrix[(1, 1)],
        to_a.matrix[(1, 2)],
        to_a.matrix[(2, 0)],
        to_a.matrix[(2, 1)],
        to_a.matrix[(2, 2)],
    );
    let abs_r = r.map(|v| v.abs() + AXIS_EPSILON);
    let translation = Vec3::new(to_a.matrix[(0, 3)], to_a.matrix[(1, 3)], to_a.matrix[(2, 3)]);
    let to_a_point = |p: &Point3| -> Point3 {
        let v = r * p.coords + translation;
        Point3::from(v)
    };

    let mut result = CollisionResult::default();
    let root_a = encode_box(1);
    let root_b = encode_box(1);
    descend(a, root_a, b, root_b, &r, &abs_r, &translation, &to_a_point, only_one, &mut result);
    result
}

#[allow(clippy::too_many_arguments)]
fn descend(
    a: &CMesh,
    a_ref: i32,
    b: &CMesh,
    b_ref: i32,
    r: &Matrix3<f64>,
    abs_r: &Matrix3<f64>,
    translation: &Vec3,
    to_a_point: &dyn Fn(&Point3) -> Point3,
    only_one: bool,
    result: &mut CollisionResult,
) {
    if result.crash && only_one {
        return;
    }

    match (child_box(a, a_ref), child_box(b, b_ref)) {
        (Some(box_a), Some(box_b)) => {
            let center_b_in_a = r * box_b.center.coords + translation;
            let t = center_b_in_a - box_a.center.coords;
            if !obb_overlap(&box_a.half_extent, &box_b.half_extent, r, abs_r, &t) {
                return;
            }
            descend(a, box_a.left, b, box_b.left, r, abs_r, translation, to_a_point, only_one, result);
            if result.crash && only_one {
                return;
            }
            descend(a, box_a.left, b, box_b.right, r, abs_r, translation, to_a_point, only_one, result);
            if result.crash && only_one {
                return;
            }
            descend(a, box_a.right, b, box_b.left, r, abs_r, translation, to_a_point, only_one, result);
            if result.crash && only_one {
                return;
            }
            descend(a, box_a.right, b, box_b.right, r, abs_r, translation, to_a_point, only_one, result);
        }
        (Some(box_a), None) => {
            let tri_b = triangle_box(b, b_ref as u32);
            let t = (r * tri_b.center.coords + translation) - box_a.center.coords;
            if obb_overlap(&box_a.half_extent, &tri_b.half_extent, r, abs_r, &t) {
                descend(a, box_a.left, b, b_ref, r, abs_r, translation, to_a_point, only_one, result);
                if result.crash && only_one {
                    return;
                }
                descend(a, box_a.right, b, b_ref, r, abs_r, translation, to_a_point, only_one, result);
            }
        }
        (None, Some(box_b)) => {
            let tri_a = triangle_box(a, a_ref as u32);
            let center_b_in_a = r * box_b.center.coords + translation;
            let t = center_b_in_a - tri_a.center.coords;
            if obb_overlap(&tri_a.half_extent, &box_b.half_extent, r, abs_r, &t) {
                descend(a, a_ref, b, box_b.left, r, abs_r, translation, to_a_point, only_one, result);
                if result.crash && only_one {
                    return;
                }
                descend(a, a_ref, b, box_b.right, r, abs_r, translation, to_a_point, only_one, result);
            }
        }
        (None, None) => {
            let tri_a = a.triangle(a_ref as u32);
            let raw_tri_b = b.triangle(b_ref as u32);
            let tri_b = [
                to_a_point(&raw_tri_b[0]),
                to_a_point(&raw_tri_b[1]),
                to_a_point(&raw_tri_b[2]),
            ];
            if triangle_triangle_overlap(&tri_a, &tri_b) {
                result.crash = true;
                if only_one {
                    return;
                }
                result.pairs.push((a_ref as u32, b_ref as u32));
            }
        }
    }
}

struct LocalBox {
    center: Point3,
    half_extent: Vec3,
}

/// Bounding box of a single triangle, aligned to the mesh's own local
/// axes (the same frame every `BoxNode` in the tree is expressed in).
fn triangle_box(mesh: &CMesh, base: u32) -> LocalBox {
    let verts = mesh.triangle(base);
    let mut min = verts[0];
    let mut max = verts[0];
    for v in &verts[1..] {
        min = Point3::new(min.x.min(v.x), min.y.min(v.y), min.z.min(v.z));
        max = Point3::new(max.x.max(v.x), max.y.max(v.y), max.z.max(v.z));
    }
    LocalBox {
        center: Point3::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0, (min.z + max.z) / 2.0),
        half_extent: Vec3::new((max.x - min.x) / 2.0, (max.y - min.y) / 2.0, (max.z - min.z) / 2.0),
    }
}

/// Classic 15-axis separating-axis test between two oriented boxes: `a`
/// expressed in its own frame, `b`'s half-extents rotated into `a`'s
/// frame via `r`/`abs_r`, `t` the offset between the two box centers in
/// `a`'s frame.
fn obb_overlap(he_a: &Vec3, he_b: &Vec3, r: &Matrix3<f64>, abs_r: &Matrix3<f64>, t: &Vec3) -> bool {
    // L = A0, A1, A2
    for i in 0..3 {
        let ra = he_a[i];
        let rb = he_b.x * abs_r[(i, 0)] + he_b.y * abs_r[(i, 1)] + he_b.z * abs_r[(i, 2)];
        if t[i].abs() > ra + rb {
            return false;
        }
    }

    // L = B0, B1, B2
    for j in 0..3 {
        let ra = he_a.x * abs_r[(0, j)] + he_a.y * abs_r[(1, j)] + he_a.z * abs_r[(2, j)];
        let rb = he_b[j];
        let t_proj = t.x * r[(0, j)] + t.y * r[(1, j)] + t.z * r[(2, j)];
        if t_proj.abs() > ra + rb {
            return false;
        }
    }

    // L = A0 x B0
    let ra = he_a[1] * abs_r[(2, 0)] + he_a[2] * abs_r[(1, 0)];
    let rb = he_b[1] * abs_r[(0, 2)] + he_b[2] * abs_r[(0, 1)];
    if (t[2] * r[(1, 0)] - t[1] * r[(2, 0)]).abs() > ra + rb {
        return false;
    }
    // L = A0 x B1
    let ra = he_a[1] * abs_r[(2, 1)] + he_a[2] * abs_r[(1, 1)];
    let rb = he_b[0] * abs_r[(0, 2)] + he_b[2] * abs_r[(0, 0)];
    if (t[2] * r[(1, 1)] - t[1] * r[(2, 1)]).abs() > ra + rb {
        return false;
    }
    // L = A0 x B2
    let ra = he_a[1] * abs_r[(2, 2)] + he_a[2] * abs_r[(1, 2)];
    let rb = he_b[0] * abs_r[(0, 1)] + he_b[1] * abs_r[(0, 0)];
    if (t[2] * r[(1, 2)] - t[1] * r[(2, 2)]).abs() > ra + rb {
        return false;
    }
    // L = A1 x B0
    let ra = he_a[0] * abs_r[(2, 0)] + he_a[2] * abs_r[(0, 0)];
    let rb = he_b[1] * abs_r[(1, 2)] + he_b[2] * abs_r[(1, 1)];
    if (t[0] * r[(2, 0)] - t[2] * r[(0, 0)]).abs() > ra + rb {
        return false;
    }
    // L = A1 x B1
    let ra = he_a[0] * abs_r[(2, 1)] + he_a[2] * abs_r[(0, 1)];
    let rb = he_b[0] * abs_r[(1, 2)] + he_b[2] * abs_r[(1, 0)];
    if (t[0] * r[(2, 1)] - t[2] * r[(0, 1)]).abs() > ra + rb {
        return false;
    }
    // L = A1 x B2
    let ra = he_a[0] * abs_r[(2, 2)] + he_a[2] * abs_r[(0, 2)];
    let rb = he_b[0] * abs_r[(1, 1)] + he_b[1] * abs_r[(1, 0)];
    if (t[0] * r[(2, 2)] - t[2] * r[(0, 2)]).abs() > ra + rb {
        return false;
    }
    // L = A2 x B0
    let ra = he_a[0] * abs_r[(1, 0)] + he_a[1] * abs_r[(0, 0)];
    let rb = he_b[1] * abs_r[(2, 2)] + he_b[2] * abs_r[(2, 1)];
    if (t[1] * r[(0, 0)] - t[0] * r[(1, 0)]).abs() > ra + rb {
        return false;
    }
    // L = A2 x B1
    let ra = he_a[0] * abs_r[(1, 1)] + he_a[1] * abs_r[(0, 1)];
    let rb = he_b[0] * abs_r[(2, 2)] + he_b[2] * abs_r[(2, 0)];
    if (t[1] * r[(0, 1)] - t[0] * r[(1, 1)]).abs() > ra + rb {
        return false;
    }
    // L = A2 x B2
    let ra = he_a[0] * abs_r[(1, 2)] + he_a[1] * abs_r[(0, 2)];
    let rb = he_b[0] * abs_r[(2, 1)] + he_b[1] * abs_r[(2, 0)];
    if (t[1] * r[(0, 2)] - t[0] * r[(1, 2)]).abs() > ra + rb {
        return false;
    }

    true
}

/// Exact triangle-triangle separating-axis test: the two face normals
/// plus the nine cross products of edge pairs. Both triangles must
/// already be expressed in the same frame.
fn triangle_triangle_overlap(tri_a: &[Point3; 3], tri_b: &[Point3; 3]) -> bool {
    let edges_a = [tri_a[1] - tri_a[0], tri_a[2] - tri_a[1], tri_a[0] - tri_a[2]];
    let edges_b = [tri_b[1] - tri_b[0], tri_b[2] - tri_b[1], tri_b[0] - tri_b[2]];

    let mut axes = vec![edges_a[0].cross(&edges_a[1]), edges_b[0].cross(&edges_b[1])];
    for ea in &edges_a {
        for eb in &edges_b {
            axes.push(ea.cross(eb));
        }
    }

    for axis in axes {
        if axis.norm_squared() < 1e-20 {
            continue;
        }
        let (min_a, max_a) = project(tri_a, &axis);
        let (min_b, max_b) = project(tri_b, &axis);
        if max_a < min_b || max_b < min_a {
            return false;
        }
    }
    true
}

fn project(tri: &[Point3; 3], axis: &Vec3) -> (f64, f64) {
    let mut min = axis.dot(&tri[0].coords);
    let mut max = min;
    for v in &tri[1..] {
        let d = axis.dot(&v.coords);
        min = min.min(d);
        max = max.max(d);
    }
    (min, max)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::bvh::build;
    use vcad_kernel_math::{Point3, Transform};

    #[rustfmt::skip]
    fn cube_indices() -> Vec<u32> {
        vec![
            0, 2, 1, 0, 3, 2,
            4, 5, 6, 4, 6, 7,
            0, 1, 5, 0, 5, 4,
            2, 3, 7, 2, 7, 6,
            0, 4, 7, 0, 7, 3,
            1, 2, 6, 1, 6, 5,
        ]
    }

    fn cube_points(size: f64) -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(size, 0.0, 0.0),
            Point3::new(size, size, 0.0),
            Point3::new(0.0, size, 0.0),
            Point3::new(0.0, 0.0, size),
            Point3::new(size, 0.0, size),
            Point3::new(size, size, size),
            Point3::new(0.0, size, size),
        ]
    }

    fn cube_at(origin: [f64; 3], size: f64) -> CMesh {
        let world_to_local = Transform::translation(-origin[0], -origin[1], -origin[2]);
        build(cube_points(size), cube_indices(), world_to_local)
    }

    #[test]
    fn test_separated_cubes_do_not_collide() {
        let a = cube_at([0.0, 0.0, 0.0], 1.0);
        let b = cube_at([5.0, 0.0, 0.0], 1.0);
        let result = collide(&a, &b, false);
        assert!(!result.crash);
        assert!(result.pairs.is_empty());
    }

    #[test]
    fn test_overlapping_cubes_collide() {
        let a = cube_at([0.0, 0.0, 0.0], 1.0);
        let b = cube_at([0.5, 0.0, 0.0], 1.0);
        let result = collide(&a, &b, false);
        assert!(result.crash);
        assert!(!result.pairs.is_empty());
    }

    #[test]
    fn test_only_one_stops_at_first_contact() {
        let a = cube_at([0.0, 0.0, 0.0], 1.0);
        let b = cube_at([0.5, 0.0, 0.0], 1.0);
        let result = collide(&a, &b, true);
        assert!(result.crash);
        assert!(result.pairs.is_empty());
    }

    #[test]
    fn test_touching_cubes_at_boundary_collide() {
        let a = cube_at([0.0, 0.0, 0.0], 1.0);
        let b = cube_at([1.0, 0.0, 0.0], 1.0);
        let result = collide(&a, &b, false);
        assert!(result.crash);
    }

    #[test]
    fn test_collision_is_symmetric() {
        let a = cube_at([0.0, 0.0, 0.0], 1.0);
        let b = cube_at([0.5, 0.0, 0.0], 1.0);
        assert_eq!(collide(&a, &b, false).crash, collide(&b, &a, false).crash);
    }
}
