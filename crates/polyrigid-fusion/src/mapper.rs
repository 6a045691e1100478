//! Voxel-to-voxel coordinate mapping between two image grids.
//!
//! A point is carried from the source grid (floating image) into the
//! target grid (reference image) through a homogeneous transform acting on
//! millimetre coordinates:
//!
//! 1. flip every axis (`x -> n - 1 - x`) if the source sform has a positive determinant
//! 2. scale by the source voxel sizes
//! 3. apply the transform
//! 4. divide by the target voxel sizes
//! 5. flip against the target shape if the target sform has a positive determinant
//! 6. take the absolute value of each coordinate
//!
//! The flips are keyed independently to each grid's own header. Step 6
//! hides any residual sign: a point that lands at `-x` is reported at `x`.

use burn::tensor::backend::Backend;
use nalgebra::{Matrix4, Vector3, Vector4};
use polyrigid_core::image::Image;
use polyrigid_core::spatial::Spacing3;

/// The parts of an image header the mapper needs.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GridHeader {
    shape: [usize; 3],
    zooms: Spacing3,
    flip: bool,
}

impl GridHeader {
    /// `orientation_sign` is the sign of the sform determinant; only `1` flips.
    pub fn new(shape: [usize; 3], zooms: Spacing3, orientation_sign: i8) -> Self {
        Self {
            shape,
            zooms,
            flip: orientation_sign == 1,
        }
    }

    pub fn from_image<B: Backend>(image: &Image<B, 3>) -> Self {
        Self::new(image.shape(), *image.metadata().zooms(), image.orientation_sign())
    }

    pub fn shape(&self) -> [usize; 3] {
        self.shape
    }

    /// Whether coordinates are mirrored on this grid.
    pub fn flips(&self) -> bool {
        self.flip
    }

    fn mirror(&self, mut point: Vector3<f64>) -> Vector3<f64> {
        if self.flip {
            for axis in 0..3 {
                point[axis] = (self.shape[axis] as f64 - 1.0) - point[axis];
            }
        }
        point
    }
}

/// Maps voxel coordinates from a source grid to a target grid.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelMapper {
    source: GridHeader,
    target: GridHeader,
}

impl VoxelMapper {
    pub fn new(source: GridHeader, target: GridHeader) -> Self {
        Self { source, target }
    }

    /// Mapper from the floating grid into the reference grid.
    pub fn from_images<B: Backend>(floating: &Image<B, 3>, reference: &Image<B, 3>) -> Self {
        Self::new(GridHeader::from_image(floating), GridHeader::from_image(reference))
    }

    pub fn source(&self) -> &GridHeader {
        &self.source
    }

    pub fn target(&self) -> &GridHeader {
        &self.target
    }

    /// Map a source voxel coordinate through `transform` into the target grid.
    pub fn map_point(&self, point: &Vector3<f64>, transform: &Matrix4<f64>) -> Vector3<f64> {
        let source = self.source.mirror(*point).component_mul(&self.source.zooms);

        let moved = transform * Vector4::new(source[0], source[1], source[2], 1.0);
        let target = moved.xyz().component_div(&self.target.zooms);

        self.target.mirror(target).abs()
    }
}
