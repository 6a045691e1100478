//! Interpolation types and operations.
//!
//! This module provides interpolation traits and implementations
//! for sampling volumes at continuous voxel coordinates.

pub mod boundary;
pub mod linear;
pub mod nearest;
pub mod trait_;

pub use boundary::BoundaryMode;
pub use linear::LinearInterpolator;
pub use nearest::NearestNeighborInterpolator;
pub use trait_::Interpolator;
