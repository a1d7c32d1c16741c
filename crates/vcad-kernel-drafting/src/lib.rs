#![warn(missing_docs)]

//! Plane-section slicing for the vcad kernel.
//!
//! Cuts one or more triangle meshes with a plane and returns the 3D
//! polylines traced where the plane crosses the surface — closed loops
//! where the cut is entirely interior, open chains where it runs off a
//! mesh boundary.

pub mod section;
pub mod types;

pub use section::{chain_segments, intersect_mesh_with_plane, section_mesh, section_meshes};
pub use types::{SectionChain, SectionPlane};
