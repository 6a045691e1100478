//! Spatial types for points, spacing, direction matrices and affines.
//!
//! All types are nalgebra aliases; the helpers convert between a homogeneous
//! voxel-to-world affine and its (origin, spacing, direction) decomposition.

use nalgebra::{Matrix4, Point as NaPoint, SMatrix, SVector, Vector3};

pub type Point<const D: usize> = NaPoint<f64, D>;
pub type Spacing<const D: usize> = SVector<f64, D>;
pub type Direction<const D: usize> = SMatrix<f64, D, D>;

// Common aliases
pub type Point3 = Point<3>;
pub type Spacing3 = Spacing<3>;
pub type Direction3 = Direction<3>;

/// Homogeneous 4x4 voxel-to-world matrix (sform/qform).
pub type Affine = Matrix4<f64>;

/// Build the affine `[Direction * diag(spacing) | origin]`.
pub fn compose_affine(origin: &Point3, spacing: &Spacing3, direction: &Direction3) -> Affine {
    let linear = direction * Direction3::from_diagonal(spacing);
    let mut affine = Affine::identity();
    affine.fixed_view_mut::<3, 3>(0, 0).copy_from(&linear);
    affine.fixed_view_mut::<3, 1>(0, 3).copy_from(&origin.coords);
    affine
}

/// Split an affine into origin, spacing (column norms) and unit direction columns.
///
/// A degenerate (zero-length) column keeps its spacing at zero and falls
/// back to the corresponding canonical axis as direction.
pub fn decompose_affine(affine: &Affine) -> (Point3, Spacing3, Direction3) {
    let origin = Point3::new(affine[(0, 3)], affine[(1, 3)], affine[(2, 3)]);
    let axes = [Vector3::x(), Vector3::y(), Vector3::z()];

    let mut spacing = Spacing3::zeros();
    let mut direction = Direction3::identity();
    for c in 0..3 {
        let column: Vector3<f64> = affine.fixed_view::<3, 1>(0, c).into_owned();
        let norm = column.norm();
        spacing[c] = norm;
        let unit = if norm > 1e-9 { column / norm } else { axes[c] };
        direction.set_column(c, &unit);
    }
    (origin, spacing, direction)
}

/// Sign of `det(affine)`: `1`, `-1`, or `0` for a singular affine.
pub fn determinant_sign(affine: &Affine) -> i8 {
    let det = affine.determinant();
    if det > 0.0 {
        1
    } else if det < 0.0 {
        -1
    } else {
        0
    }
}
