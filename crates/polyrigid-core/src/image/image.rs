//! Image type with physical metadata.
//!
//! An [`Image`] pairs a voxel tensor with the header that places it in
//! physical space. Array axis 0, 1, 2 are the NIfTI i, j, k axes.

use burn::tensor::backend::Backend;
use burn::tensor::Tensor;

use super::metadata::ImageMetadata;
use crate::error::{CoreError, Result};
use crate::spatial::{Affine, Direction, Point, Spacing};

/// Medical image with physical metadata.
///
/// # Type Parameters
/// * `B` - The backend (CPU or GPU) for tensor operations
/// * `D` - The dimensionality of the image
///
/// # Examples
/// ```rust
/// use polyrigid_core::Image;
/// use polyrigid_core::image::ImageMetadata;
/// use burn::tensor::Tensor;
/// use burn_ndarray::NdArray;
///
/// type Backend = NdArray<f32>;
///
/// let device = Default::default();
/// let data = Tensor::<Backend, 3>::zeros([10, 10, 10], &device);
/// let image = Image::from_metadata(data, ImageMetadata::default());
/// assert_eq!(image.shape(), [10, 10, 10]);
/// ```
#[derive(Debug, Clone)]
pub struct Image<B: Backend, const D: usize> {
    /// The voxel data, potentially on GPU.
    data: Tensor<B, D>,
    /// Origin, spacing and direction.
    metadata: ImageMetadata<D>,
}

impl<B: Backend, const D: usize> Image<B, D> {
    /// Create a new image with the given data and metadata components.
    pub fn new(
        data: Tensor<B, D>,
        origin: Point<D>,
        spacing: Spacing<D>,
        direction: Direction<D>,
    ) -> Self {
        Self::from_metadata(data, ImageMetadata::new(origin, spacing, direction))
    }

    /// Create an image from data and a complete header.
    pub fn from_metadata(data: Tensor<B, D>, metadata: ImageMetadata<D>) -> Self {
        Self { data, metadata }
    }

    /// Get the image data tensor.
    pub fn data(&self) -> &Tensor<B, D> {
        &self.data
    }

    /// Get the header.
    pub fn metadata(&self) -> &ImageMetadata<D> {
        &self.metadata
    }

    /// Get the origin (physical coordinate of first voxel).
    pub fn origin(&self) -> &Point<D> {
        self.metadata.origin()
    }

    /// Get the spacing (physical distance between voxels).
    pub fn spacing(&self) -> &Spacing<D> {
        self.metadata.spacing()
    }

    /// Get the direction (orientation matrix).
    pub fn direction(&self) -> &Direction<D> {
        self.metadata.direction()
    }

    /// Get the image shape as an array.
    pub fn shape(&self) -> [usize; D] {
        self.data.dims()
    }

    /// Total number of voxels.
    pub fn num_voxels(&self) -> usize {
        self.shape().iter().product()
    }

    /// A new image sharing this header but holding different data.
    ///
    /// The caller is responsible for `data` having the same shape.
    pub fn with_data(&self, data: Tensor<B, D>) -> Self {
        Self::from_metadata(data, self.metadata.clone())
    }

    /// Copy the voxel values to the host as `f32`, in row-major order.
    pub fn to_vec(&self) -> Result<Vec<f32>> {
        tensor_to_vec(&self.data)
    }
}

impl<B: Backend> Image<B, 3> {
    /// The voxel-to-world affine.
    pub fn affine(&self) -> Affine {
        self.metadata.affine()
    }

    /// Sign of `det(affine)`, see [`ImageMetadata::orientation_sign`].
    pub fn orientation_sign(&self) -> i8 {
        self.metadata.orientation_sign()
    }
}

/// Read a tensor back to the host as a flat row-major `Vec<f32>`.
pub fn tensor_to_vec<B: Backend, const D: usize>(tensor: &Tensor<B, D>) -> Result<Vec<f32>> {
    tensor
        .clone()
        .into_data()
        .convert::<f32>()
        .to_vec::<f32>()
        .map_err(|e| CoreError::TensorData(format!("{:?}", e)))
}
