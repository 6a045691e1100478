pub mod error;
pub mod filter;
pub mod image;
pub mod interpolation;
pub mod matrix;
pub mod spatial;

pub use error::{CoreError, Result};
pub use image::{Image, ImageMetadata};
pub use spatial::{Affine, Direction, Point, Spacing};
