//! Section slicing: plane-mesh intersection and polyline chaining.
//!
//! Cuts one or more triangle meshes with a plane and returns the 3D
//! polylines where the plane crosses the surface. A triangle whose AABB
//! lies entirely on one side of the plane is rejected before its edges
//! are tested, since a deep mesh produces far more non-intersecting
//! triangles than intersecting ones.

use std::collections::HashMap;
use vcad_kernel_math::{Point3, Vec3};
use vcad_kernel_tessellate::TriangleMesh;

use crate::types::{SectionChain, SectionPlane};

/// Geometric tolerance (mm) used for vertex-on-plane classification and
/// chain-endpoint matching.
const DEFAULT_TOLERANCE: f64 = 1e-6;

/// Bias added to a vertex's signed distance before classifying it as
/// positive/negative, so a triangle with one vertex exactly on the plane
/// resolves consistently instead of flickering between adjacent triangles
/// sharing that vertex.
const PLANE_BIAS: f64 = 1e-8;

/// Tolerance used when merging open chains that were produced by
/// different meshes in the same `section_meshes` call but meet at a
/// shared seam.
const CROSS_MESH_MERGE_TOLERANCE: f64 = 1e-3;

fn triangle_aabb_straddles_plane(
    v0: Point3,
    v1: Point3,
    v2: Point3,
    plane_origin: Point3,
    plane_normal: &Vec3,
) -> bool {
    let d0 = plane_normal.dot(&(v0 - plane_origin));
    let d1 = plane_normal.dot(&(v1 - plane_origin));
    let d2 = plane_normal.dot(&(v2 - plane_origin));
    let min_d = d0.min(d1).min(d2);
    let max_d = d0.max(d1).max(d2);
    min_d <= PLANE_BIAS && max_d >= -PLANE_BIAS
}

/// Intersect a single triangle with a plane.
///
/// Returns 0, 1, or 2 intersection points. When 2 points are returned,
/// they form a line segment where the plane cuts through the triangle.
fn intersect_triangle_with_plane(
    v0: Point3,
    v1: Point3,
    v2: Point3,
    plane_origin: Point3,
    plane_normal: &Vec3,
) -> Vec<Point3> {
    if !triangle_aabb_straddles_plane(v0, v1, v2, plane_origin, plane_normal) {
        return Vec::new();
    }

    let d0 = plane_normal.dot(&(v0 - plane_origin)) + PLANE_BIAS;
    let d1 = plane_normal.dot(&(v1 - plane_origin)) + PLANE_BIAS;
    let d2 = plane_normal.dot(&(v2 - plane_origin)) + PLANE_BIAS;

    let tol = DEFAULT_TOLERANCE;
    let on0 = d0.abs() < tol;
    let on1 = d1.abs() < tol;
    let on2 = d2.abs() < tol;
    let pos0 = d0 > tol;
    let pos1 = d1 > tol;
    let pos2 = d2 > tol;
    let neg0 = d0 < -tol;
    let neg1 = d1 < -tol;
    let neg2 = d2 < -tol;

    let mut points = Vec::new();

    let intersect_edge = |p0: Point3, p1: Point3, d0: f64, d1: f64| -> Point3 {
        let t = d0 / (d0 - d1);
        Point3::new(
            p0.x + t * (p1.x - p0.x),
            p0.y + t * (p1.y - p0.y),
            p0.z + t * (p1.z - p0.z),
        )
    };

    if on0 {
        points.push(v0);
    }
    if on1 && !points.iter().any(|p| (*p - v1).norm() < tol) {
        points.push(v1);
    }
    if on2 && !points.iter().any(|p| (*p - v2).norm() < tol) {
        points.push(v2);
    }

    if (pos0 && neg1) || (neg0 && pos1) {
        let p = intersect_edge(v0, v1, d0, d1);
        if !points.iter().any(|q| (*q - p).norm() < tol) {
            points.push(p);
        }
    }
    if (pos1 && neg2) || (neg1 && pos2) {
        let p = intersect_edge(v1, v2, d1, d2);
        if !points.iter().any(|q| (*q - p).norm() < tol) {
            points.push(p);
        }
    }
    if (pos2 && neg0) || (neg2 && pos0) {
        let p = intersect_edge(v2, v0, d2, d0);
        if !points.iter().any(|q| (*q - p).norm() < tol) {
            points.push(p);
        }
    }

    points.truncate(2);
    points
}

/// Intersect a mesh with a plane, returning 3D line segments.
pub fn intersect_mesh_with_plane(
    mesh: &TriangleMesh,
    plane_origin: Point3,
    plane_normal: Vec3,
) -> Vec<(Point3, Point3)> {
    let normal = plane_normal.normalize();
    let mut segments = Vec::new();

    let num_tris = mesh.indices.len() / 3;
    for i in 0..num_tris {
        let i0 = mesh.indices[i * 3] as usize;
        let i1 = mesh.indices[i * 3 + 1] as usize;
        let i2 = mesh.indices[i * 3 + 2] as usize;

        let v0 = Point3::new(
            mesh.vertices[i0 * 3] as f64,
            mesh.vertices[i0 * 3 + 1] as f64,
            mesh.vertices[i0 * 3 + 2] as f64,
        );
        let v1 = Point3::new(
            mesh.vertices[i1 * 3] as f64,
            mesh.vertices[i1 * 3 + 1] as f64,
            mesh.vertices[i1 * 3 + 2] as f64,
        );
        let v2 = Point3::new(
            mesh.vertices[i2 * 3] as f64,
            mesh.vertices[i2 * 3 + 1] as f64,
            mesh.vertices[i2 * 3 + 2] as f64,
        );

        let pts = intersect_triangle_with_plane(v0, v1, v2, plane_origin, &normal);
        if pts.len() == 2 {
            segments.push((pts[0], pts[1]));
        }
    }

    segments
}

/// Key for endpoint lookup with tolerance-based hashing.
fn point_key(p: &Point3, tolerance: f64) -> (i64, i64, i64) {
    let scale = 1.0 / tolerance;
    (
        (p.x * scale).round() as i64,
        (p.y * scale).round() as i64,
        (p.z * scale).round() as i64,
    )
}

/// Chain individual segments into continuous polylines.
///
/// Uses tolerance-based endpoint matching to connect segments that share
/// endpoints. Returns a list of polylines, each marked as closed or open.
pub fn chain_segments(segments: Vec<(Point3, Point3)>, tolerance: f64) -> Vec<(Vec<Point3>, bool)> {
    if segments.is_empty() {
        return Vec::new();
    }

    let mut adjacency: HashMap<(i64, i64, i64), Vec<(usize, bool)>> = HashMap::new();
    for (i, (p0, p1)) in segments.iter().enumerate() {
        adjacency.entry(point_key(p0, tolerance)).or_default().push((i, false));
        adjacency.entry(point_key(p1, tolerance)).or_default().push((i, true));
    }

    let mut used = vec![false; segments.len()];
    let mut polylines = Vec::new();

    for start_idx in 0..segments.len() {
        if used[start_idx] {
            continue;
        }

        let mut chain = Vec::new();
        let (p0, p1) = segments[start_idx];
        chain.push(p0);
        chain.push(p1);
        used[start_idx] = true;

        let mut current = p1;
        loop {
            let key = point_key(&current, tolerance);
            let mut found = false;
            if let Some(neighbors) = adjacency.get(&key) {
                for &(seg_idx, is_end) in neighbors {
                    if used[seg_idx] {
                        continue;
                    }
                    let (s0, s1) = segments[seg_idx];
                    let next_pt = if is_end { s0 } else { s1 };
                    chain.push(next_pt);
                    current = next_pt;
                    used[seg_idx] = true;
                    found = true;
                    break;
                }
            }
            if !found {
                break;
            }
        }

        let mut current = p0;
        loop {
            let key = point_key(&current, tolerance);
            let mut found = false;
            if let Some(neighbors) = adjacency.get(&key) {
                for &(seg_idx, is_end) in neighbors {
                    if used[seg_idx] {
                        continue;
                    }
                    let (s0, s1) = segments[seg_idx];
                    let next_pt = if is_end { s0 } else { s1 };
                    chain.insert(0, next_pt);
                    current = next_pt;
                    used[seg_idx] = true;
                    found = true;
                    break;
                }
            }
            if !found {
                break;
            }
        }

        let is_closed = chain.len() >= 3 && (chain[0] - *chain.last().unwrap()).norm() < tolerance;
        if is_closed && chain.len() > 1 {
            chain.pop();
        }

        polylines.push((chain, is_closed));
    }

    polylines
}

/// Merge open chains whose endpoints meet within `tolerance`, as happens
/// when two meshes that should share a seam (e.g. adjacent solids in an
/// assembly) are sectioned independently. Closed chains and chains with
/// no nearby partner pass through unchanged.
fn merge_open_chains(chains: Vec<(Vec<Point3>, bool)>, tolerance: f64) -> Vec<(Vec<Point3>, bool)> {
    let (mut open, closed): (Vec<_>, Vec<_>) = chains.into_iter().partition(|(_, closed)| !closed);
    let mut merged: Vec<(Vec<Point3>, bool)> = Vec::new();

    'outer: while let Some((mut chain, _)) = open.pop() {
        loop {
            let head = chain[0];
            let tail = *chain.last().unwrap();
            let mut joined = false;
            for i in 0..open.len() {
                let (other, _) = &open[i];
                let other_head = other[0];
                let other_tail = *other.last().unwrap();
                if (tail - other_head).norm() < tolerance {
                    let (mut other, _) = open.remove(i);
                    other.remove(0);
                    chain.extend(other);
                    joined = true;
                    break;
                } else if (tail - other_tail).norm() < tolerance {
                    let (mut other, _) = open.remove(i);
                    other.pop();
                    other.reverse();
                    chain.extend(other);
                    joined = true;
                    break;
                } else if (head - other_tail).norm() < tolerance {
                    let (mut other, _) = open.remove(i);
                    other.pop();
                    other.extend(chain);
                    chain = other;
                    joined = true;
                    break;
                }
            }
            if !joined {
                let is_closed = chain.len() >= 3 && (chain[0] - *chain.last().unwrap()).norm() < tolerance;
                if is_closed {
                    chain.pop();
                }
                merged.push((chain, is_closed));
                continue 'outer;
            }
        }
    }

    merged.extend(closed);
    merged
}

/// Minimum number of points a chain needs to be geometrically meaningful;
/// shorter chains (a single stray point, or two coincident points left
/// over from a near-tangent cut) are discarded.
const MIN_CHAIN_POINTS: usize = 2;

/// Section a single mesh with `plane`, returning its intersection chains.
pub fn section_mesh(mesh: &TriangleMesh, plane: &SectionPlane) -> Vec<SectionChain> {
    section_meshes(std::slice::from_ref(&mesh), plane)
}

/// Section multiple meshes with the same plane, merging open chains that
/// meet across a mesh boundary (e.g. two parts of an assembly sharing a
/// seam) before returning the combined chain list.
pub fn section_meshes(meshes: &[&TriangleMesh], plane: &SectionPlane) -> Vec<SectionChain> {
    let origin = plane.origin_point();
    let normal = plane.normal_vec();

    let mut all_segments = Vec::new();
    for mesh in meshes {
        all_segments.extend(intersect_mesh_with_plane(mesh, origin, normal));
    }
    if all_segments.is_empty() {
        return Vec::new();
    }

    let chain_tolerance = DEFAULT_TOLERANCE * 100.0;
    let chains = chain_segments(all_segments, chain_tolerance);
    let chains = if meshes.len() > 1 {
        merge_open_chains(chains, CROSS_MESH_MERGE_TOLERANCE)
    } else {
        chains
    };

    chains
        .into_iter()
        .filter(|(points, _)| points.len() >= MIN_CHAIN_POINTS)
        .map(|(points, is_closed)| SectionChain::new(points, is_closed))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_cube(size: f64) -> TriangleMesh {
        #[rustfmt::skip]
        let vertices: Vec<f32> = vec![
            0.0, 0.0, 0.0,
            size as f32, 0.0, 0.0,
            size as f32, size as f32, 0.0,
            0.0, size as f32, 0.0,
            0.0, 0.0, size as f32,
            size as f32, 0.0, size as f32,
            size as f32, size as f32, size as f32,
            0.0, size as f32, size as f32,
        ];
        #[rustfmt::skip]
        let indices: Vec<u32> = vec![
            0, 2, 1, 0, 3, 2,
            4, 5, 6, 4, 6, 7,
            0, 1, 5, 0, 5, 4,
            2, 3, 7, 2, 7, 6,
            0, 4, 7, 0, 7, 3,
            1, 2, 6, 1, 6, 5,
        ];
        TriangleMesh {
            vertices,
            indices,
            normals: Vec::new(),
            wires: Vec::new(),
        }
    }

    #[test]
    fn test_triangle_no_intersection() {
        let v0 = Point3::new(0.0, 0.0, 0.0);
        let v1 = Point3::new(1.0, 0.0, 0.0);
        let v2 = Point3::new(0.0, 1.0, 0.0);
        let origin = Point3::new(0.0, 0.0, 10.0);
        let normal = Vec3::new(0.0, 0.0, 1.0);
        let pts = intersect_triangle_with_plane(v0, v1, v2, origin, &normal);
        assert!(pts.len() < 2);
    }

    #[test]
    fn test_triangle_edge_intersection() {
        let v0 = Point3::new(0.0, 0.0, -1.0);
        let v1 = Point3::new(1.0, 0.0, 1.0);
        let v2 = Point3::new(0.0, 1.0, -1.0);
        let origin = Point3::new(0.0, 0.0, 0.0);
        let normal = Vec3::new(0.0, 0.0, 1.0);
        let pts = intersect_triangle_with_plane(v0, v1, v2, origin, &normal);
        assert_eq!(pts.len(), 2);
    }

    #[test]
    fn test_cube_horizontal_section() {
        let mesh = make_cube(10.0);
        let plane = SectionPlane::horizontal(5.0);
        let chains = section_mesh(&mesh, &plane);

        assert_eq!(chains.len(), 1, "should have 1 chain");
        assert!(chains[0].is_closed, "chain should be closed");
        assert!(chains[0].points.len() >= 4);
    }

    #[test]
    fn test_cube_outside_section() {
        let mesh = make_cube(10.0);
        let plane = SectionPlane::horizontal(20.0);
        let chains = section_mesh(&mesh, &plane);
        assert!(chains.is_empty());
    }

    #[test]
    fn test_section_meshes_merges_across_seam() {
        let left = make_cube(5.0);
        let mut right = make_cube(5.0);
        for i in (0..right.vertices.len()).step_by(3) {
            right.vertices[i] += 5.0;
        }
        let plane = SectionPlane::horizontal(2.5);
        let chains = section_meshes(&[&left, &right], &plane);
        assert!(!chains.is_empty());
    }
}
