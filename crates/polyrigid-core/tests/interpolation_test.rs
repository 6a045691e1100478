use burn::tensor::{Tensor, TensorData};
use burn_ndarray::NdArray;
use polyrigid_core::interpolation::{BoundaryMode, Interpolator, LinearInterpolator};
use proptest::prelude::*;

type B = NdArray<f32>;

/// 4x5x6 volume holding the affine function 3*i0 - 2*i1 + 0.5*i2 + 1.
fn ramp(device: &<B as burn::tensor::backend::Backend>::Device) -> Tensor<B, 3> {
    let mut values = Vec::with_capacity(4 * 5 * 6);
    for i0 in 0..4 {
        for i1 in 0..5 {
            for i2 in 0..6 {
                values.push(3.0 * i0 as f32 - 2.0 * i1 as f32 + 0.5 * i2 as f32 + 1.0);
            }
        }
    }
    Tensor::from_data(TensorData::new(values, [4, 5, 6]), device)
}

proptest! {
    #[test]
    fn test_trilinear_is_exact_on_affine_functions(
        p0 in 0.0f32..3.0, p1 in 0.0f32..4.0, p2 in 0.0f32..5.0
    ) {
        let device = Default::default();
        let data = ramp(&device);
        let indices = Tensor::<B, 2>::from_data(TensorData::new(vec![p0, p1, p2], [1, 3]), &device);

        let value = LinearInterpolator::new().interpolate(&data, indices).into_data().to_vec::<f32>().unwrap()[0];
        let expected = 3.0 * p0 - 2.0 * p1 + 0.5 * p2 + 1.0;
        prop_assert!((value - expected).abs() < 1e-3, "{} vs {}", value, expected);
    }
}

#[test]
fn test_fill_value_outside_grid() {
    let device = Default::default();
    let data = ramp(&device);
    let interpolator = LinearInterpolator::new().with_boundary(BoundaryMode::Constant, 42.0);

    let indices = Tensor::<B, 2>::from_floats([[3.5, 0.0, 0.0], [0.0, 0.0, 0.0]], &device);
    let values = interpolator.interpolate(&data, indices).into_data().to_vec::<f32>().unwrap();
    assert_eq!(values, vec![42.0, 1.0]);
}
