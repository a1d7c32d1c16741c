#![warn(missing_docs)]

//! OBB-tree collision detection for the vcad kernel.
//!
//! Builds a binary bounding-volume hierarchy over a triangle mesh
//! ([`bvh`]) and tests two such trees for intersection with a 15-axis
//! separating-axis test ([`collide`]).
//!
//! # Example
//!
//! ```ignore
//! use vcad_kernel_collision::{bvh, collide};
//! use vcad_kernel_math::Transform;
//!
//! let a = bvh::build(points_a, indices_a, Transform::identity());
//! let b = bvh::build(points_b, indices_b, Transform::translation(3.0, 0.0, 0.0));
//! let result = collide::collide(&a, &b, false);
//! ```

pub mod bvh;
pub mod collide;

pub use bvh::CMesh;
pub use collide::{collide, CollisionResult};
