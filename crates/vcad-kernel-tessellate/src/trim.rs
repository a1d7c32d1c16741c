//! UV-space trimming: cut an untrimmed tessellation down to the region
//! bounded by one or more closed 2D loops.
//!
//! This is a post-filter, not a constrained triangulation: triangles from
//! the full adaptive/special-case mesh are kept only if their centroid
//! falls inside the outer loop and outside every hole loop, then orphaned
//! vertices are dropped. It does not snap triangle edges to the trim
//! boundary, so a trimmed edge is jagged at the underlying mesh's
//! resolution rather than exact — acceptable because the boundary is
//! already resolved separately into `wires`.

use crate::mesh::TriangleMesh;
use vcad_kernel_math::Point2;

/// A single closed boundary loop in UV space, plus the 3D points it
/// traces on the surface (used to populate [`TriangleMesh::wires`]).
#[derive(Debug, Clone)]
pub struct TrimLoop {
    /// Loop vertices in the surface's parameter space, in order.
    pub uv: Vec<Point2>,
}

/// Even-odd point-in-polygon test (ray casting along +u).
fn point_in_polygon(p: Point2, poly: &[Point2]) -> bool {
    let mut inside = false;
    let n = poly.len();
    if n < 3 {
        return false;
    }
    let mut j = n - 1;
    for i in 0..n {
        let (vi, vj) = (poly[i], poly[j]);
        if (vi.y > p.y) != (vj.y > p.y) {
            let u_cross = (vj.x - vi.x) * (p.y - vi.y) / (vj.y - vi.y) + vi.x;
            if p.x < u_cross {
                inside = !inside;
            }
        }
        j = i;
    }
    inside
}

/// `true` if `p` is inside `outer` and outside every loop in `holes`.
pub fn inside_trim(p: Point2, outer: &TrimLoop, holes: &[TrimLoop]) -> bool {
    if !point_in_polygon(p, &outer.uv) {
        return false;
    }
    !holes.iter().any(|h| point_in_polygon(p, &h.uv))
}

/// Filter `mesh`'s triangles to those whose UV centroid lies inside the
/// trim region, dropping vertices no surviving triangle references.
///
/// `uv_of_vertex` maps a mesh vertex index back to the `(u, v)` it was
/// generated from; callers that build the mesh via [`crate::adaptive`] or
/// [`crate::special_case`] know this mapping because they generated it.
pub fn trim_mesh(
    mesh: &TriangleMesh,
    uv_of_vertex: &[Point2],
    outer: &TrimLoop,
    holes: &[TrimLoop],
) -> TriangleMesh {
    let mut kept_indices = Vec::new();
    for tri in mesh.indices.chunks_exact(3) {
        let (a, b, c) = (tri[0] as usize, tri[1] as usize, tri[2] as usize);
        let centroid = Point2::new(
            (uv_of_vertex[a].x + uv_of_vertex[b].x + uv_of_vertex[c].x) / 3.0,
            (uv_of_vertex[a].y + uv_of_vertex[b].y + uv_of_vertex[c].y) / 3.0,
        );
        if inside_trim(centroid, outer, holes) {
            kept_indices.push(tri[0]);
            kept_indices.push(tri[1]);
            kept_indices.push(tri[2]);
        }
    }

    let mut remap = vec![u32::MAX; mesh.num_vertices()];
    let mut out = TriangleMesh::new();
    for &old in &kept_indices {
        let old_u = old as usize;
        if remap[old_u] == u32::MAX {
            remap[old_u] = out.num_vertices() as u32;
            out.vertices
                .extend_from_slice(&mesh.vertices[old_u * 3..old_u * 3 + 3]);
            out.normals
                .extend_from_slice(&mesh.normals[old_u * 3..old_u * 3 + 3]);
        }
        out.indices.push(remap[old_u]);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_in_square() {
        let square = TrimLoop {
            uv: vec![
                Point2::new(0.0, 0.0),
                Point2::new(1.0, 0.0),
                Point2::new(1.0, 1.0),
                Point2::new(0.0, 1.0),
            ],
        };
        assert!(point_in_polygon(Point2::new(0.5, 0.5), &square.uv));
        assert!(!point_in_polygon(Point2::new(2.0, 0.5), &square.uv));
    }

    #[test]
    fn test_hole_excludes_center() {
        let outer = TrimLoop {
            uv: vec![
                Point2::new(0.0, 0.0),
                Point2::new(4.0, 0.0),
                Point2::new(4.0, 4.0),
                Point2::new(0.0, 4.0),
            ],
        };
        let hole = TrimLoop {
            uv: vec![
                Point2::new(1.0, 1.0),
                Point2::new(3.0, 1.0),
                Point2::new(3.0, 3.0),
                Point2::new(1.0, 3.0),
            ],
        };
        assert!(inside_trim(Point2::new(0.5, 0.5), &outer, &[hole.clone()]));
        assert!(!inside_trim(Point2::new(2.0, 2.0), &outer, &[hole]));
    }

    #[test]
    fn test_trim_mesh_drops_outside_triangle_and_vertex() {
        let mesh = TriangleMesh {
            vertices: vec![
                0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 10.0, 10.0, 0.0, 11.0, 10.0, 0.0,
                11.0, 11.0, 0.0,
            ],
            indices: vec![0, 1, 2, 3, 4, 5],
            normals: vec![0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0],
            wires: Vec::new(),
        };
        let uv = vec![
            Point2::new(0.0, 0.0),
            Point2::new(1.0, 0.0),
            Point2::new(1.0, 1.0),
            Point2::new(10.0, 10.0),
            Point2::new(11.0, 10.0),
            Point2::new(11.0, 11.0),
        ];
        let outer = TrimLoop {
            uv: vec![
                Point2::new(-1.0, -1.0),
                Point2::new(2.0, -1.0),
                Point2::new(2.0, 2.0),
                Point2::new(-1.0, 2.0),
            ],
        };
        let trimmed = trim_mesh(&mesh, &uv, &outer, &[]);
        assert_eq!(trimmed.num_triangles(), 1);
        assert_eq!(trimmed.num_vertices(), 3);
    }
}
