//! Image header types.
//!
//! The header describes how voxel indices map to physical millimetres:
//! origin, per-axis voxel size (zooms) and axis orientation.

use crate::spatial::{
    compose_affine, decompose_affine, determinant_sign, Affine, Direction, Point, Spacing,
};

/// Image metadata containing physical space information.
#[derive(Debug, Clone, PartialEq)]
pub struct ImageMetadata<const D: usize> {
    /// Physical coordinate of the first voxel (index 0, 0, ...).
    origin: Point<D>,
    /// Voxel size in millimetres along each axis.
    spacing: Spacing<D>,
    /// Orientation of the image axes.
    direction: Direction<D>,
    /// Voxel sizes recorded by the file header (pixdim), if read from one.
    zooms: Option<Spacing<D>>,
    /// Sign of the raw sform determinant, if read from a file header.
    sform_sign: Option<i8>,
}

impl<const D: usize> ImageMetadata<D> {
    /// Create new image metadata.
    pub fn new(origin: Point<D>, spacing: Spacing<D>, direction: Direction<D>) -> Self {
        Self {
            origin,
            spacing,
            direction,
            zooms: None,
            sform_sign: None,
        }
    }

    /// Record the voxel sizes stored in the file header.
    pub fn with_zooms(mut self, zooms: Spacing<D>) -> Self {
        self.zooms = Some(zooms);
        self
    }

    /// Voxel sizes used for millimetre conversion.
    ///
    /// The header's own voxel sizes when recorded, else the spacing.
    pub fn zooms(&self) -> &Spacing<D> {
        self.zooms.as_ref().unwrap_or(&self.spacing)
    }

    /// Get the origin.
    pub fn origin(&self) -> &Point<D> {
        &self.origin
    }

    /// Get the spacing (voxel zooms).
    pub fn spacing(&self) -> &Spacing<D> {
        &self.spacing
    }

    /// Get the direction.
    pub fn direction(&self) -> &Direction<D> {
        &self.direction
    }
}

impl ImageMetadata<3> {
    /// Recover metadata from a voxel-to-world affine.
    pub fn from_affine(affine: &Affine) -> Self {
        let (origin, spacing, direction) = decompose_affine(affine);
        Self::new(origin, spacing, direction)
    }

    /// The voxel-to-world affine described by this header.
    pub fn affine(&self) -> Affine {
        compose_affine(&self.origin, &self.spacing, &self.direction)
    }

    /// Record the determinant sign of the file's sform rows.
    ///
    /// The sform rows count whatever the file's `sform_code` says.
    pub fn with_sform_sign(mut self, sign: i8) -> Self {
        self.sform_sign = Some(sign);
        self
    }

    /// Sign of the sform determinant.
    ///
    /// `1` marks a neurological (RAS-like) voxel ordering, `-1` a
    /// radiological one, `0` a degenerate or empty sform. Falls back to the
    /// affine's determinant when no file sform was recorded.
    pub fn orientation_sign(&self) -> i8 {
        self.sform_sign
            .unwrap_or_else(|| determinant_sign(&self.affine()))
    }
}

impl<const D: usize> Default for ImageMetadata<D> {
    fn default() -> Self {
        Self {
            origin: Point::origin(),
            spacing: Spacing::repeat(1.0),
            direction: Direction::identity(),
            zooms: None,
            sform_sign: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spatial::{Direction3, Point3, Spacing3};

    #[test]
    fn test_metadata_default() {
        let metadata = ImageMetadata::<3>::default();
        assert_eq!(metadata.origin(), &Point3::origin());
        assert_eq!(metadata.spacing(), &Spacing3::repeat(1.0));
        assert_eq!(metadata.direction(), &Direction3::identity());
        assert_eq!(metadata.orientation_sign(), 1);
    }

    #[test]
    fn test_metadata_affine_roundtrip() {
        let mut direction = Direction3::identity();
        direction[(1, 1)] = -1.0;
        let metadata = ImageMetadata::new(
            Point3::new(10.0, 20.0, 30.0),
            Spacing3::new(0.5, 0.75, 2.0),
            direction,
        );

        let affine = metadata.affine();
        assert_eq!(affine[(1, 1)], -0.75);
        assert_eq!(metadata.orientation_sign(), -1);

        let recovered = ImageMetadata::from_affine(&affine);
        assert!((recovered.spacing() - metadata.spacing()).norm() < 1e-12);
        assert!((recovered.direction() - metadata.direction()).norm() < 1e-12);
        assert_eq!(recovered.origin(), metadata.origin());
    }

    #[test]
    fn test_recorded_header_geometry_wins() {
        let metadata = ImageMetadata::<3>::default()
            .with_zooms(Spacing3::new(2.0, 2.0, 2.5))
            .with_sform_sign(-1);

        assert_eq!(metadata.spacing(), &Spacing3::repeat(1.0));
        assert_eq!(metadata.zooms(), &Spacing3::new(2.0, 2.0, 2.5));
        assert_eq!(metadata.orientation_sign(), -1);
        assert_eq!(ImageMetadata::<3>::default().zooms(), &Spacing3::repeat(1.0));
    }
}
