//! Collision mesh and OBB-tree construction.
//!
//! Builds a binary bounding-volume hierarchy over a triangle mesh, used
//! as the acceleration structure for the separating-axis collision test
//! in [`crate::collide`]. Splits are chosen by per-axis centroid
//! variance rather than a surface-area heuristic: cheaper to compute,
//! and adequate since the tree exists for collision pruning rather than
//! ray traversal.

use vcad_kernel_math::{Point3, Transform, Vec3};

/// A node in an OBB tree.
///
/// `left`/`right` use the same encoding: a non-negative value is the
/// base index of a triangle in [`CMesh::indices`] (`index * 3`); a
/// negative value is the bitwise negation of another node's index in
/// [`CMesh::boxes`].
#[derive(Debug, Clone, Copy, Default)]
pub struct BoxNode {
    /// Center of the bounding box, in the mesh's local frame.
    pub center: Point3,
    /// Half-extents of the bounding box along the local x/y/z axes.
    pub half_extent: Vec3,
    /// Left child: triangle base index or negated box index.
    pub left: i32,
    /// Right child: triangle base index or negated box index.
    pub right: i32,
}

/// Encode a box index as a negative child reference.
pub(crate) fn encode_box(idx: usize) -> i32 {
    !(idx as i32)
}

/// Decode a child reference: `Some(box_index)` if it names a box, `None`
/// if it names a triangle (in which case the caller already has the
/// triangle base index, since it equals the child value itself).
fn as_box_index(child: i32) -> Option<usize> {
    if child < 0 {
        Some(!child as usize)
    } else {
        None
    }
}

/// An immutable collision mesh: a triangle soup plus the OBB tree built
/// over it, and the transform from world space into the mesh's local
/// frame in which the tree's boxes are expressed.
#[derive(Debug, Clone)]
pub struct CMesh {
    /// Vertex positions, in the mesh's local frame.
    pub points: Vec<Point3>,
    /// Flat triangle index array, three per triangle.
    pub indices: Vec<u32>,
    /// OBB tree nodes. `boxes[0]` is unused; `boxes[1]` is the root.
    pub boxes: Vec<BoxNode>,
    /// World-to-local transform.
    pub xfm: Transform,
}

impl CMesh {
    /// Number of triangles in the mesh.
    pub fn num_triangles(&self) -> usize {
        self.indices.len() / 3
    }

    /// Positions of a triangle's three vertices, base index into `indices`.
    pub fn triangle(&self, base: u32) -> [Point3; 3] {
        let i0 = self.indices[base as usize] as usize;
        let i1 = self.indices[base as usize + 1] as usize;
        let i2 = self.indices[base as usize + 2] as usize;
        [self.points[i0], self.points[i1], self.points[i2]]
    }

    /// Root box, if the mesh has any triangles.
    pub fn root(&self) -> Option<&BoxNode> {
        self.boxes.get(1)
    }
}

struct TriRecord {
    base: u32,
    centroid: Point3,
    min: Point3,
    max: Point3,
}

fn triangle_bounds(points: &[Point3], indices: &[u32], base: u32) -> TriRecord {
    let verts = [
        points[indices[base as usize] as usize],
        points[indices[base as usize + 1] as usize],
        points[indices[base as usize + 2] as usize],
    ];
    let mut min = verts[0];
    let mut max = verts[0];
    for v in &verts[1..] {
        min = Point3::new(min.x.min(v.x), min.y.min(v.y), min.z.min(v.z));
        max = Point3::new(max.x.max(v.x), max.y.max(v.y), max.z.max(v.z));
    }
    let centroid = Point3::new(
        (verts[0].x + verts[1].x + verts[2].x) / 3.0,
        (verts[0].y + verts[1].y + verts[2].y) / 3.0,
        (verts[0].z + verts[1].z + verts[2].z) / 3.0,
    );
    TriRecord {
        base,
        centroid,
        min,
        max,
    }
}

fn axis_of(p: &Point3, axis: usize) -> f64 {
    match axis {
        0 => p.x,
        1 => p.y,
        _ => p.z,
    }
}

/// Build a `CMesh` over `points`/`indices` (already expressed in the
/// mesh's own local frame), recording `xfm` as the world-to-local
/// transform that will place the tree in world space for a query.
pub fn build(points: Vec<Point3>, indices: Vec<u32>, xfm: Transform) -> CMesh {
    let tri_count = indices.len() / 3;
    let mut records: Vec<TriRecord> = (0..tri_count)
        .map(|i| triangle_bounds(&points, &indices, (i * 3) as u32))
        .collect();

    let mut boxes = vec![BoxNode::default()]; // index 0 reserved, unused

    if records.is_empty() {
        boxes.push(BoxNode::default());
    } else {
        let root = build_node(&mut records, &mut boxes);
        if boxes.len() == 1 {
            // Single triangle: build_node returned a triangle reference
            // directly without pushing a box. Wrap it so the root still
            // occupies index 1.
            let rec = &records[0];
            let center = Point3::new(
                (rec.min.x + rec.max.x) / 2.0,
                (rec.min.y + rec.max.y) / 2.0,
                (rec.min.z + rec.max.z) / 2.0,
            );
            let half_extent = Vec3::new(
                (rec.max.x - rec.min.x) / 2.0,
                (rec.max.y - rec.min.y) / 2.0,
                (rec.max.z - rec.min.z) / 2.0,
            );
            boxes.push(BoxNode {
                center,
                half_extent,
                left: root,
                right: root,
            });
        }
    }

    tracing::debug!(triangles = tri_count, boxes = boxes.len(), "built OBB tree");

    CMesh {
        points,
        indices,
        boxes,
        xfm,
    }
}

/// Recursively build a node covering `records`, pushing it (and its
/// descendants) onto `boxes`, and returning the child-reference value a
/// parent should store for it.
fn build_node(records: &mut [TriRecord], boxes: &mut Vec<BoxNode>) -> i32 {
    if records.len() == 1 {
        return records[0].base as i32;
    }

    let mut min = records[0].min;
    let mut max = records[0].max;
    let mut mean = Vec3::zeros();
    for r in records.iter() {
        min = Point3::new(min.x.min(r.min.x), min.y.min(r.min.y), min.z.min(r.min.z));
        max = Point3::new(max.x.max(r.max.x), max.y.max(r.max.y), max.z.max(r.max.z));
        mean += r.centroid.coords;
    }
    mean /= records.len() as f64;

    let mut variance = [0.0f64; 3];
    for r in records.iter() {
        for axis in 0..3 {
            let d = axis_of(&r.centroid, axis) - mean[axis];
            variance[axis] += d * d;
        }
    }
    let mut axes_by_variance = [0usize, 1, 2];
    axes_by_variance.sort_by(|&a, &b| variance[b].partial_cmp(&variance[a]).unwrap());

    let mut mid = None;
    for &axis in &axes_by_variance {
        let split = partition(records, axis, mean[axis]);
        if split != 0 && split != records.len() {
            mid = Some(split);
            break;
        }
    }
    let mid = mid.unwrap_or(records.len() / 2);

    let idx = boxes.len();
    boxes.push(BoxNode::default());

    let (left_records, right_records) = records.split_at_mut(mid);
    let left = build_node(left_records, boxes);
    let right = build_node(right_records, boxes);

    let center = Point3::new((min.x + max.x) / 2.0, (min.y + max.y) / 2.0, (min.z + max.z) / 2.0);
    let half_extent = Vec3::new((max.x - min.x) / 2.0, (max.y - min.y) / 2.0, (max.z - min.z) / 2.0);
    boxes[idx] = BoxNode {
        center,
        half_extent,
        left,
        right,
    };

    encode_box(idx)
}

/// Partition `records` in place by centroid along `axis`, elements with
/// `centroid[axis] < threshold` moved to the front. Returns the split point.
fn partition(records: &mut [TriRecord], axis: usize, threshold: f64) -> usize {
    let mut left = 0;
    let mut right = records.len();
    while left < right {
        if axis_of(&records[left].centroid, axis) < threshold {
            left += 1;
        } else {
            right -= 1;
            records.swap(left, right);
        }
    }
    left
}

pub(crate) fn child_box(mesh: &CMesh, child: i32) -> Option<&BoxNode> {
    as_box_index(child).map(|idx| &mesh.boxes[idx])
}

#[cfg(test)]
mod tests {
    use super::*;

    fn unit_cube_points() -> Vec<Point3> {
        vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(0.0, 0.0, 1.0),
            Point3::new(1.0, 0.0, 1.0),
            Point3::new(1.0, 1.0, 1.0),
            Point3::new(0.0, 1.0, 1.0),
        ]
    }

    #[rustfmt::skip]
    fn unit_cube_indices() -> Vec<u32> {
        vec![
            0, 2, 1, 0, 3, 2,
            4, 5, 6, 4, 6, 7,
            0, 1, 5, 0, 5, 4,
            2, 3, 7, 2, 7, 6,
            0, 4, 7, 0, 7, 3,
            1, 2, 6, 1, 6, 5,
        ]
    }

    #[test]
    fn test_build_cube_has_root_covering_all_triangles() {
        let mesh = build(unit_cube_points(), unit_cube_indices(), Transform::identity());
        let root = mesh.root().expect("cube should have a root box");
        assert!((root.center.x - 0.5).abs() < 1e-9);
        assert!((root.half_extent.x - 0.5).abs() < 1e-9);
        assert!(mesh.boxes.len() > 1);
    }

    #[test]
    fn test_build_single_triangle_still_has_root_at_index_one() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let mesh = build(points, vec![0, 1, 2], Transform::identity());
        assert_eq!(mesh.boxes.len(), 2);
        let root = mesh.root().unwrap();
        assert_eq!(root.left, 0);
        assert_eq!(root.right, 0);
    }

    #[test]
    fn test_build_empty_mesh() {
        let mesh = build(Vec::new(), Vec::new(), Transform::identity());
        assert_eq!(mesh.num_triangles(), 0);
    }

    #[test]
    fn test_child_encoding_roundtrip() {
        assert_eq!(as_box_index(encode_box(3)), Some(3));
        assert_eq!(as_box_index(7), None);
    }
}
