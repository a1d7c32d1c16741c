//! Core types for plane-section slicing.

use serde::{Deserialize, Serialize};
use vcad_kernel_math::{Point3, Vec3};

/// Defines a cutting plane for section views.
///
/// Uses array representation for serialization compatibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionPlane {
    /// Point on the cutting plane `[x, y, z]`.
    pub origin: [f64; 3],
    /// Plane normal vector (defines the "front" side) `[x, y, z]`.
    pub normal: [f64; 3],
}

impl SectionPlane {
    /// Create a new section plane.
    pub fn new(origin: Point3, normal: Vec3) -> Self {
        Self {
            origin: [origin.x, origin.y, origin.z],
            normal: [normal.x, normal.y, normal.z],
        }
    }

    /// Create from arrays directly.
    pub fn from_arrays(origin: [f64; 3], normal: [f64; 3]) -> Self {
        Self { origin, normal }
    }

    /// Horizontal section at a given Z height (looking down).
    pub fn horizontal(z: f64) -> Self {
        Self {
            origin: [0.0, 0.0, z],
            normal: [0.0, 0.0, 1.0],
        }
    }

    /// Front section at a given Y depth.
    pub fn front(y: f64) -> Self {
        Self {
            origin: [0.0, y, 0.0],
            normal: [0.0, -1.0, 0.0],
        }
    }

    /// Right section at a given X position.
    pub fn right(x: f64) -> Self {
        Self {
            origin: [x, 0.0, 0.0],
            normal: [-1.0, 0.0, 0.0],
        }
    }

    /// Get origin as `Point3`.
    pub fn origin_point(&self) -> Point3 {
        Point3::new(self.origin[0], self.origin[1], self.origin[2])
    }

    /// Get normal as `Vec3`.
    pub fn normal_vec(&self) -> Vec3 {
        Vec3::new(self.normal[0], self.normal[1], self.normal[2])
    }
}

/// A continuous 3D polyline produced by cutting a mesh with a plane.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SectionChain {
    /// Ordered vertices of the polyline, lying on the cutting plane.
    pub points: Vec<Point3>,
    /// Whether the chain closes on itself (its own boundary loop).
    pub is_closed: bool,
}

impl SectionChain {
    /// Create a new section chain.
    pub fn new(points: Vec<Point3>, is_closed: bool) -> Self {
        Self { points, is_closed }
    }

    /// Length of the chain (sum of segment lengths, plus the closing
    /// segment if closed).
    pub fn length(&self) -> f64 {
        if self.points.len() < 2 {
            return 0.0;
        }
        let mut total = 0.0;
        for i in 0..self.points.len() - 1 {
            total += (self.points[i + 1] - self.points[i]).norm();
        }
        if self.is_closed {
            total += (self.points[0] - *self.points.last().unwrap()).norm();
        }
        total
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_section_plane_helpers() {
        let horiz = SectionPlane::horizontal(5.0);
        assert!((horiz.origin[2] - 5.0).abs() < 1e-10);
        assert!((horiz.normal[2] - 1.0).abs() < 1e-10);

        let front = SectionPlane::front(3.0);
        assert!((front.origin[1] - 3.0).abs() < 1e-10);

        let right = SectionPlane::right(2.0);
        assert!((right.origin[0] - 2.0).abs() < 1e-10);
    }

    #[test]
    fn test_chain_length_open_vs_closed() {
        let open = SectionChain::new(
            vec![Point3::new(0.0, 0.0, 0.0), Point3::new(3.0, 4.0, 0.0)],
            false,
        );
        assert!((open.length() - 5.0).abs() < 1e-10);

        let closed = SectionChain::new(
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(1.0, 0.0, 0.0),
                Point3::new(1.0, 1.0, 0.0),
                Point3::new(0.0, 1.0, 0.0),
            ],
            true,
        );
        assert!((closed.length() - 4.0).abs() < 1e-10);
    }
}
