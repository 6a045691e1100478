//! Matrix logarithm and exponential for homogeneous 4x4 transforms.
//!
//! Transforms are lifted to complex matrices so that the principal logarithm
//! of a general affine (rotations included) is always representable.
//!
//! * [`expm`] uses nalgebra's Padé scaling-and-squaring exponential.
//! * [`logm`] uses inverse scaling-and-squaring: repeated Denman–Beavers
//!   square roots bring the matrix close to the identity, then an 8-point
//!   Gauss–Legendre quadrature of `log(I + X) = ∫₀¹ X (I + sX)⁻¹ ds`
//!   (the diagonal [8/8] Padé approximant) is evaluated and rescaled.

use nalgebra::{Complex, Matrix4};

use crate::error::{CoreError, Result};

pub type Complex64 = Complex<f64>;

/// Complex homogeneous 4x4 matrix.
pub type Matrix4c = Matrix4<Complex64>;

/// `‖A - I‖₁` below which the Padé approximant is applied directly.
const PADE_RADIUS: f64 = 0.25;
/// Upper bound on square roots taken by [`logm`].
const MAX_SQUARE_ROOTS: usize = 48;
/// Upper bound on Denman–Beavers iterations per square root.
const MAX_SQRT_ITERATIONS: usize = 100;
const SQRT_TOLERANCE: f64 = 1e-13;

/// Gauss–Legendre nodes and weights on `[-1, 1]`.
const GAUSS_LEGENDRE_8: [(f64, f64); 8] = [
    (-0.960_289_856_497_536_3, 0.101_228_536_290_376_3),
    (-0.796_666_477_413_626_7, 0.222_381_034_453_374_5),
    (-0.525_532_409_916_329_0, 0.313_706_645_877_887_3),
    (-0.183_434_642_495_649_8, 0.362_683_783_378_362_0),
    (0.183_434_642_495_649_8, 0.362_683_783_378_362_0),
    (0.525_532_409_916_329_0, 0.313_706_645_877_887_3),
    (0.796_666_477_413_626_7, 0.222_381_034_453_374_5),
    (0.960_289_856_497_536_3, 0.101_228_536_290_376_3),
];

/// Lift a real matrix to the complex domain.
pub fn to_complex(m: &Matrix4<f64>) -> Matrix4c {
    m.map(|v| Complex64::new(v, 0.0))
}

/// Real part of a complex matrix.
pub fn real_part(m: &Matrix4c) -> Matrix4<f64> {
    m.map(|z| z.re)
}

/// Largest imaginary magnitude in a complex matrix.
pub fn max_imaginary(m: &Matrix4c) -> f64 {
    m.iter().fold(0.0_f64, |acc, z| acc.max(z.im.abs()))
}

/// Maximum absolute column sum.
fn norm1(m: &Matrix4c) -> f64 {
    (0..4)
        .map(|c| m.column(c).iter().map(|z| z.norm()).sum::<f64>())
        .fold(0.0, f64::max)
}

fn is_finite(m: &Matrix4c) -> bool {
    m.iter().all(|z| z.re.is_finite() && z.im.is_finite())
}

fn scalar(v: f64) -> Complex64 {
    Complex64::new(v, 0.0)
}

/// Matrix exponential.
pub fn expm(a: &Matrix4c) -> Matrix4c {
    a.exp()
}

/// Principal square root by the Denman–Beavers iteration.
///
/// Fails when an iterate becomes singular or the iteration stalls, which
/// happens for matrices with eigenvalues on the closed negative real axis.
pub fn sqrtm(a: &Matrix4c) -> Result<Matrix4c> {
    let half = scalar(0.5);
    let mut y = *a;
    let mut z = Matrix4c::identity();

    for _ in 0..MAX_SQRT_ITERATIONS {
        let y_inv = y
            .try_inverse()
            .ok_or_else(|| CoreError::SingularMatrix("square-root iterate is singular".into()))?;
        let z_inv = z
            .try_inverse()
            .ok_or_else(|| CoreError::SingularMatrix("square-root iterate is singular".into()))?;

        let y_next = (y + z_inv) * half;
        let z_next = (z + y_inv) * half;
        let delta = norm1(&(y_next - y));
        y = y_next;
        z = z_next;

        if !is_finite(&y) {
            return Err(CoreError::NonFinite("matrix square root".into()));
        }
        if delta <= SQRT_TOLERANCE * norm1(&y).max(1.0) {
            return Ok(y);
        }
    }

    Err(CoreError::NonFinite(format!(
        "matrix square root did not settle after {} iterations",
        MAX_SQRT_ITERATIONS
    )))
}

/// Principal matrix logarithm.
///
/// Matrices with repeated eigenvalues on the negative real axis (for example
/// a rotation by exactly π) have no principal logarithm and yield an error.
pub fn logm(a: &Matrix4c) -> Result<Matrix4c> {
    if !is_finite(a) {
        return Err(CoreError::NonFinite("matrix logarithm input".into()));
    }
    if a.try_inverse().is_none() {
        return Err(CoreError::SingularMatrix("transform has no inverse".into()));
    }

    let identity = Matrix4c::identity();
    let mut x = *a;
    let mut roots = 0;
    while norm1(&(x - identity)) > PADE_RADIUS {
        if roots == MAX_SQUARE_ROOTS {
            return Err(CoreError::LogarithmDidNotConverge { iterations: roots });
        }
        x = sqrtm(&x)?;
        roots += 1;
    }

    let e = x - identity;
    let mut log = Matrix4c::zeros();
    for &(node, weight) in GAUSS_LEGENDRE_8.iter() {
        let s = scalar(0.5 * (node + 1.0));
        let resolvent = (identity + e * s)
            .try_inverse()
            .ok_or_else(|| CoreError::SingularMatrix("Padé resolvent is singular".into()))?;
        log += e * resolvent * scalar(0.5 * weight);
    }

    let log = log * scalar(2f64.powi(roots as i32));
    if !is_finite(&log) {
        return Err(CoreError::NonFinite("matrix logarithm".into()));
    }
    Ok(log)
}

/// Principal logarithm of a real transform.
pub fn logm_real(a: &Matrix4<f64>) -> Result<Matrix4c> {
    logm(&to_complex(a))
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::{Rotation3, Vector3};

    fn affine(rotation: Rotation3<f64>, scale: f64, translation: Vector3<f64>) -> Matrix4<f64> {
        let mut m = Matrix4::identity();
        m.fixed_view_mut::<3, 3>(0, 0).copy_from(&(rotation.matrix() * scale));
        m.fixed_view_mut::<3, 1>(0, 3).copy_from(&translation);
        m
    }

    fn max_abs_diff(a: &Matrix4<f64>, b: &Matrix4<f64>) -> f64 {
        (a - b).iter().fold(0.0_f64, |acc, v| acc.max(v.abs()))
    }

    #[test]
    fn test_logm_identity_is_zero() {
        let log = logm_real(&Matrix4::identity()).unwrap();
        assert!(norm1(&log) < 1e-14);
    }

    #[test]
    fn test_logm_translation_is_nilpotent() {
        let t = affine(Rotation3::identity(), 1.0, Vector3::new(12.0, -3.0, 40.0));
        let log = real_part(&logm_real(&t).unwrap());

        let mut expected = Matrix4::zeros();
        expected[(0, 3)] = 12.0;
        expected[(1, 3)] = -3.0;
        expected[(2, 3)] = 40.0;
        assert!(max_abs_diff(&log, &expected) < 1e-9, "got {}", log);
    }

    #[test]
    fn test_logm_rotation_recovers_angle() {
        let angle = 0.7;
        let r = affine(Rotation3::from_axis_angle(&Vector3::z_axis(), angle), 1.0, Vector3::zeros());
        let log = logm_real(&r).unwrap();

        assert!(max_imaginary(&log) < 1e-10);
        let log = real_part(&log);
        assert!((log[(1, 0)] - angle).abs() < 1e-10);
        assert!((log[(0, 1)] + angle).abs() < 1e-10);
        assert!(log[(2, 2)].abs() < 1e-10);
    }

    #[test]
    fn test_expm_inverts_logm() {
        let a = affine(
            Rotation3::from_euler_angles(0.3, -0.5, 1.2),
            1.3,
            Vector3::new(5.0, -8.0, 2.5),
        );
        let log = logm_real(&a).unwrap();
        let back = real_part(&expm(&log));
        assert!(max_abs_diff(&back, &a) < 1e-9, "expm(logm(A)) = {}", back);
    }

    #[test]
    fn test_expm_of_negated_log_is_inverse() {
        let a = affine(
            Rotation3::from_axis_angle(&Vector3::x_axis(), -0.4),
            1.0,
            Vector3::new(1.0, 2.0, 3.0),
        );
        let inverse = real_part(&expm(&-logm_real(&a).unwrap()));
        let product = inverse * a;
        assert!(max_abs_diff(&product, &Matrix4::identity()) < 1e-9);
    }

    #[test]
    fn test_sqrtm_squares_back() {
        let a = to_complex(&affine(
            Rotation3::from_axis_angle(&Vector3::y_axis(), 1.0),
            2.0,
            Vector3::new(0.0, 4.0, 0.0),
        ));
        let root = sqrtm(&a).unwrap();
        assert!(norm1(&(root * root - a)) < 1e-10);
    }

    #[test]
    fn test_logm_singular_matrix() {
        let mut m = Matrix4::identity();
        m[(1, 1)] = 0.0;
        assert!(matches!(logm_real(&m), Err(CoreError::SingularMatrix(_))));
    }

    #[test]
    fn test_logm_half_turn_has_no_principal_log() {
        // Exact rotation by pi about z: eigenvalue -1 twice.
        let mut r = Matrix4::identity();
        r[(0, 0)] = -1.0;
        r[(1, 1)] = -1.0;
        assert!(logm_real(&r).is_err());
    }

    #[test]
    fn test_logm_rejects_non_finite() {
        let mut m = Matrix4::identity();
        m[(0, 3)] = f64::NAN;
        assert!(matches!(logm_real(&m), Err(CoreError::NonFinite(_))));
    }
}
