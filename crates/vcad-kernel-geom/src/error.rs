//! Domain-violation errors for malformed curve/surface constructors.

use thiserror::Error;

/// Errors returned by fallible curve and surface constructors.
///
/// These are tier-2 "domain violation" errors: fatal for the object being
/// constructed, but they never corrupt state shared with other objects.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum GeomError {
    /// An ellipse/arc was given a non-positive radius.
    #[error("radius must be positive, got {0}")]
    NonPositiveRadius(f64),
    /// An arc/ellipse angular span was outside `(0, 2π]`.
    #[error("angular span must be in (0, 2π], got {0}")]
    InvalidSpan(f64),
    /// A spun surface's generatrix must lie on the XZ plane.
    #[error("spun surface generatrix is not on the XZ plane")]
    GeneratrixNotOnXz,
    /// A swept surface's generatrix must lie on the XY plane.
    #[error("swept surface generatrix is not on the XY plane")]
    GeneratrixNotOnXy,
    /// A polyline needs at least two points to define a domain.
    #[error("polyline needs at least 2 points, got {0}")]
    PolylineTooShort(usize),
}
