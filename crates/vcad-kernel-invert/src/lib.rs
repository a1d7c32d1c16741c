#![warn(missing_docs)]

//! Adaptive point-inversion trees for the vcad kernel.
//!
//! Point inversion answers "given a 3D point known to lie on this curve
//! or surface, what parameter value produced it?" — the inverse of
//! evaluation. Naive inversion re-samples the whole domain on every
//! query; the trees here cache evaluated points in an arena-backed tree
//! that is grown lazily along the path each query walks, so repeated
//! nearby queries (as happen during adaptive meshing and slicing) amortize
//! the cost of earlier ones.
//!
//! - [`curve::AdaptiveSegmentTree`] inverts a point against a 3D curve.
//! - [`surface::AdaptiveTileTree`] inverts a point against a parametric
//!   surface, via inverse bilinear interpolation on whichever coordinate
//!   plane (XY, YZ, XZ) each tile projects onto with the least distortion.

pub mod curve;
pub mod error;
pub mod surface;

pub use curve::AdaptiveSegmentTree;
pub use error::InvertError;
pub use surface::AdaptiveTileTree;
