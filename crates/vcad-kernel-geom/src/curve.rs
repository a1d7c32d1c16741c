//! Additional curve variants: bounded arcs, ellipses, polylines, and the
//! ordered-curve sequences ([`Contour`]) that bound a trimmed surface
//! region.

use crate::{Curve3d, CurveKind, GeomError};
use std::any::Any;
use std::f64::consts::PI;
use vcad_kernel_math::{Dir3, Point3, Transform, Vec3};

// =============================================================================
// Arc3d
// =============================================================================

/// A circular arc spanning `[0, span]` radians about `normal`, starting at
/// `center + radius * x_dir`.
///
/// Parameterized over `t ∈ [0, 1]` so every curve in the model shares the
/// same normalized-domain convention; the angle at parameter `t` is
/// `t * span`.
#[derive(Debug, Clone)]
pub struct Arc3d {
    /// Center of the supporting circle.
    pub center: Point3,
    /// Radius.
    pub radius: f64,
    /// Reference direction for `t = 0`.
    pub x_dir: Dir3,
    /// Second in-plane direction, perpendicular to `x_dir` and `normal`.
    pub y_dir: Dir3,
    /// Normal to the arc's plane.
    pub normal: Dir3,
    /// Angular span in radians, `span ∈ (0, 2π]`.
    pub span: f64,
}

impl Arc3d {
    /// Create an arc with an explicit local frame.
    ///
    /// Returns [`GeomError::NonPositiveRadius`] or
    /// [`GeomError::InvalidSpan`] if `radius` or `span` are out of range.
    pub fn new(
        center: Point3,
        radius: f64,
        x_dir: Vec3,
        normal: Vec3,
        span: f64,
    ) -> Result<Self, GeomError> {
        if radius <= 0.0 {
            return Err(GeomError::NonPositiveRadius(radius));
        }
        if span <= 0.0 || span > 2.0 * PI + 1e-9 {
            return Err(GeomError::InvalidSpan(span));
        }
        let n = Dir3::new_normalize(normal);
        let x = Dir3::new_normalize(x_dir - x_dir.dot(n.as_ref()) * n.as_ref());
        let y = Dir3::new_normalize(n.as_ref().cross(x.as_ref()));
        Ok(Self {
            center,
            radius,
            x_dir: x,
            y_dir: y,
            normal: n,
            span,
        })
    }

    /// Create a full circle (span `2π`) as an arc, in the XY plane.
    pub fn full_circle(center: Point3, radius: f64) -> Result<Self, GeomError> {
        Self::new(center, radius, Vec3::x(), Vec3::z(), 2.0 * PI)
    }

    fn angle(&self, t: f64) -> f64 {
        t * self.span
    }
}

impl Curve3d for Arc3d {
    fn evaluate(&self, t: f64) -> Point3 {
        let (sin_a, cos_a) = self.angle(t).sin_cos();
        self.center + self.radius * (cos_a * self.x_dir.as_ref() + sin_a * self.y_dir.as_ref())
    }

    fn tangent(&self, t: f64) -> Vec3 {
        let (sin_a, cos_a) = self.angle(t).sin_cos();
        self.radius
            * self.span
            * (-sin_a * self.x_dir.as_ref() + cos_a * self.y_dir.as_ref())
    }

    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn curve_type(&self) -> CurveKind {
        CurveKind::Arc
    }

    fn clone_box(&self) -> Box<dyn Curve3d> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn transformed(&self, t: &Transform) -> Box<dyn Curve3d> {
        Box::new(Arc3d {
            center: t.apply_point(&self.center),
            radius: self.radius,
            x_dir: Dir3::new_normalize(t.apply_vec(&self.x_dir.into_inner())),
            y_dir: Dir3::new_normalize(t.apply_vec(&self.y_dir.into_inner())),
            normal: Dir3::new_normalize(t.apply_vec(&self.normal.into_inner())),
            span: self.span,
        })
    }

    fn get_t(&self, p: &Point3) -> f64 {
        let v = p - self.center;
        let x = v.dot(&self.x_dir);
        let y = v.dot(&self.y_dir);
        let mut a = y.atan2(x);
        if a < 0.0 {
            a += 2.0 * PI;
        }
        (a / self.span).clamp(0.0, 1.0)
    }
}

// =============================================================================
// Ellipse
// =============================================================================

/// An ellipse or elliptical arc spanning `[alpha0, alpha1]` (radians,
/// `alpha0 <= alpha1`), parameterized over `t ∈ [0, 1]`.
#[derive(Debug, Clone)]
pub struct Ellipse {
    /// Center of the ellipse.
    pub center: Point3,
    /// Radius along `x_dir`.
    pub major_radius: f64,
    /// Radius along `y_dir`.
    pub minor_radius: f64,
    /// Major-axis direction.
    pub x_dir: Dir3,
    /// Minor-axis direction, perpendicular to `x_dir` and `normal`.
    pub y_dir: Dir3,
    /// Normal to the ellipse's plane.
    pub normal: Dir3,
    /// Start angle in radians.
    pub alpha0: f64,
    /// End angle in radians, `alpha1 >= alpha0`.
    pub alpha1: f64,
}

impl Ellipse {
    /// Create an elliptical arc. Returns [`GeomError::NonPositiveRadius`]
    /// if either radius is non-positive, or [`GeomError::InvalidSpan`] if
    /// `alpha1 < alpha0`.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        center: Point3,
        major_radius: f64,
        minor_radius: f64,
        x_dir: Vec3,
        normal: Vec3,
        alpha0: f64,
        alpha1: f64,
    ) -> Result<Self, GeomError> {
        if major_radius <= 0.0 {
            return Err(GeomError::NonPositiveRadius(major_radius));
        }
        if minor_radius <= 0.0 {
            return Err(GeomError::NonPositiveRadius(minor_radius));
        }
        if alpha1 < alpha0 {
            return Err(GeomError::InvalidSpan(alpha1 - alpha0));
        }
        let n = Dir3::new_normalize(normal);
        let x = Dir3::new_normalize(x_dir - x_dir.dot(n.as_ref()) * n.as_ref());
        let y = Dir3::new_normalize(n.as_ref().cross(x.as_ref()));
        Ok(Self {
            center,
            major_radius,
            minor_radius,
            x_dir: x,
            y_dir: y,
            normal: n,
            alpha0,
            alpha1,
        })
    }

    /// Create a full ellipse (span `[0, 2π]`) in the XY plane.
    pub fn full(center: Point3, major_radius: f64, minor_radius: f64) -> Result<Self, GeomError> {
        Self::new(
            center,
            major_radius,
            minor_radius,
            Vec3::x(),
            Vec3::z(),
            0.0,
            2.0 * PI,
        )
    }

    fn angle(&self, t: f64) -> f64 {
        self.alpha0 + t * (self.alpha1 - self.alpha0)
    }
}

impl Curve3d for Ellipse {
    fn evaluate(&self, t: f64) -> Point3 {
        let (sin_a, cos_a) = self.angle(t).sin_cos();
        self.center
            + self.major_radius * cos_a * self.x_dir.as_ref()
            + self.minor_radius * sin_a * self.y_dir.as_ref()
    }

    fn tangent(&self, t: f64) -> Vec3 {
        let (sin_a, cos_a) = self.angle(t).sin_cos();
        let span = self.alpha1 - self.alpha0;
        span * (-self.major_radius * sin_a * self.x_dir.as_ref()
            + self.minor_radius * cos_a * self.y_dir.as_ref())
    }

    fn domain(&self) -> (f64, f64) {
        (0.0, 1.0)
    }

    fn curve_type(&self) -> CurveKind {
        CurveKind::Ellipse
    }

    fn clone_box(&self) -> Box<dyn Curve3d> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn transformed(&self, t: &Transform) -> Box<dyn Curve3d> {
        Box::new(Ellipse {
            center: t.apply_point(&self.center),
            major_radius: self.major_radius,
            minor_radius: self.minor_radius,
            x_dir: Dir3::new_normalize(t.apply_vec(&self.x_dir.into_inner())),
            y_dir: Dir3::new_normalize(t.apply_vec(&self.y_dir.into_inner())),
            normal: Dir3::new_normalize(t.apply_vec(&self.normal.into_inner())),
            alpha0: self.alpha0,
            alpha1: self.alpha1,
        })
    }
}

// =============================================================================
// Polyline
// =============================================================================

/// An immutable sequence of straight segments through `points`.
///
/// Domain is `[0, n - 1]` where `n = points.len()`; integer parameter
/// values land exactly on vertices.
#[derive(Debug, Clone)]
pub struct Polyline {
    /// Vertices of the polyline, in order.
    pub points: Vec<Point3>,
}

impl Polyline {
    /// Create a polyline through `points`. Returns
    /// [`GeomError::PolylineTooShort`] if fewer than two points are given.
    pub fn new(points: Vec<Point3>) -> Result<Self, GeomError> {
        if points.len() < 2 {
            return Err(GeomError::PolylineTooShort(points.len()));
        }
        Ok(Self { points })
    }

    fn segment(&self, t: f64) -> (usize, f64) {
        let n = self.points.len() - 1;
        let t = t.clamp(0.0, n as f64);
        let i = (t.floor() as usize).min(n.saturating_sub(1));
        (i, t - i as f64)
    }
}

impl Curve3d for Polyline {
    fn evaluate(&self, t: f64) -> Point3 {
        let (i, frac) = self.segment(t);
        self.points[i] + frac * (self.points[i + 1] - self.points[i])
    }

    fn tangent(&self, t: f64) -> Vec3 {
        let (i, _) = self.segment(t);
        self.points[i + 1] - self.points[i]
    }

    fn domain(&self) -> (f64, f64) {
        (0.0, (self.points.len() - 1) as f64)
    }

    fn curve_type(&self) -> CurveKind {
        CurveKind::Polyline
    }

    fn clone_box(&self) -> Box<dyn Curve3d> {
        Box::new(self.clone())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn transformed(&self, t: &Transform) -> Box<dyn Curve3d> {
        Box::new(Polyline {
            points: self.points.iter().map(|p| t.apply_point(p)).collect(),
        })
    }

    fn discretize(&self, out: &mut Vec<Point3>, _chord_tol: f64, _max_ang_step: f64) {
        if out.is_empty() {
            out.push(self.points[0]);
        }
        // The last point belongs to the next curve in the contour.
        out.extend(self.points[1..self.points.len() - 1].iter());
    }

    fn get_t(&self, p: &Point3) -> f64 {
        let mut best_t = 0.0;
        let mut best_d2 = f64::MAX;
        for i in 0..self.points.len() - 1 {
            let a = self.points[i];
            let b = self.points[i + 1];
            let d = b - a;
            let denom = d.norm_squared();
            let frac = if denom < 1e-20 {
                0.0
            } else {
                ((p - a).dot(&d) / denom).clamp(0.0, 1.0)
            };
            let proj = a + frac * d;
            let d2 = (proj - p).norm_squared();
            if d2 < best_d2 {
                best_d2 = d2;
                best_t = i as f64 + frac;
            }
        }
        best_t
    }
}

// =============================================================================
// Contour
// =============================================================================

/// A single curve's participation in a [`Contour`], carrying the curve's
/// index into the enclosing geometry store and the integer id shared by
/// its topological pair (the matching edge on an adjacent face), or `-1`
/// if the curve has no pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CurveRef {
    /// Index into `GeometryStore::curves_3d`.
    pub curve_id: usize,
    /// Whether the curve is traversed start-to-end (`true`) or reversed.
    pub forward: bool,
    /// Id shared with the matching edge on an adjacent face, or `-1`.
    pub pair_id: i32,
}

/// An ordered, closed sequence of curves bounding a trimmed surface
/// region.
///
/// Curves are referenced by index into the enclosing `GeometryStore`
/// rather than by direct pointer, avoiding the ownership cycle that would
/// otherwise arise between a contour and the surface it trims (see the
/// kernel's design notes on id-based cross-references).
#[derive(Debug, Clone, Default)]
pub struct Contour {
    /// The curves bounding this contour, in traversal order.
    pub curves: Vec<CurveRef>,
}

impl Contour {
    /// Create an empty contour.
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a curve reference to the contour.
    pub fn push(&mut self, curve_id: usize, forward: bool, pair_id: i32) {
        self.curves.push(CurveRef {
            curve_id,
            forward,
            pair_id,
        });
    }
}
