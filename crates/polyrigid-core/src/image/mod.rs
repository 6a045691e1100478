//! Image types and operations.
//!
//! This module provides the Image type and its header for representing
//! medical images with physical metadata.

pub mod image;
pub mod metadata;

pub use image::{tensor_to_vec, Image};
pub use metadata::ImageMetadata;
