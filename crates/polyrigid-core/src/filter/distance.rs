//! Exact Euclidean distance transform.
//!
//! Separable lower-envelope algorithm (Felzenszwalb & Huttenlocher): squared
//! distances are propagated along axis 2, then 1, then 0, each pass computing
//! the lower envelope of the parabolas rooted at finite samples of a line.

use burn::tensor::backend::Backend;
use burn::tensor::{Tensor, TensorData};

use crate::error::Result;
use crate::image::Image;

/// Distance, in voxels, from every voxel to the nearest zero-valued voxel.
///
/// Zero voxels map to `0`. A volume without any zero voxel maps to
/// `f64::INFINITY` everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub struct EuclideanDistanceTransform;

impl EuclideanDistanceTransform {
    pub fn new() -> Self {
        Self
    }

    /// Apply the transform to an image, keeping its header.
    pub fn apply<B: Backend>(&self, image: &Image<B, 3>) -> Result<Image<B, 3>> {
        let shape = image.shape();
        let values = image.to_vec()?;
        let distances: Vec<f32> = self
            .compute(&values, shape)
            .into_iter()
            .map(|d| d as f32)
            .collect();

        let device = image.data().device();
        let data = Tensor::<B, 3>::from_data(TensorData::new(distances, shape), &device);
        Ok(image.with_data(data))
    }

    /// Compute distances for row-major `values` of the given shape.
    pub fn compute(&self, values: &[f32], shape: [usize; 3]) -> Vec<f64> {
        let [d0, d1, d2] = shape;
        debug_assert_eq!(values.len(), d0 * d1 * d2);

        let mut squared: Vec<f64> = values
            .iter()
            .map(|&v| if v == 0.0 { 0.0 } else { f64::INFINITY })
            .collect();

        let strides = [d1 * d2, d2, 1];
        for axis in [2, 1, 0] {
            transform_axis(&mut squared, shape, strides, axis);
        }

        squared.into_iter().map(f64::sqrt).collect()
    }
}

/// Run the 1D squared-distance pass along every line parallel to `axis`.
fn transform_axis(grid: &mut [f64], shape: [usize; 3], strides: [usize; 3], axis: usize) {
    let n = shape[axis];
    let stride = strides[axis];
    let others: Vec<usize> = (0..3).filter(|&a| a != axis).collect();
    let (a, b) = (others[0], others[1]);

    let mut line = vec![0.0; n];
    let mut out = vec![0.0; n];
    let mut envelope = Envelope::with_capacity(n);

    for i in 0..shape[a] {
        for j in 0..shape[b] {
            let start = i * strides[a] + j * strides[b];
            for (q, value) in line.iter_mut().enumerate() {
                *value = grid[start + q * stride];
            }
            envelope.squared_distance(&line, &mut out);
            for (q, value) in out.iter().enumerate() {
                grid[start + q * stride] = *value;
            }
        }
    }
}

/// Scratch storage for the lower envelope of parabolas.
struct Envelope {
    /// Roots of the parabolas in the envelope.
    roots: Vec<usize>,
    /// Left boundary of each parabola's interval.
    bounds: Vec<f64>,
}

impl Envelope {
    fn with_capacity(n: usize) -> Self {
        Self {
            roots: Vec::with_capacity(n),
            bounds: Vec::with_capacity(n),
        }
    }

    /// `out[q] = min_p (q - p)^2 + f[p]` over finite `f[p]`.
    fn squared_distance(&mut self, f: &[f64], out: &mut [f64]) {
        self.roots.clear();
        self.bounds.clear();

        for q in (0..f.len()).filter(|&q| f[q].is_finite()) {
            let fq = f[q] + (q * q) as f64;
            let mut s = f64::NEG_INFINITY;
            while let Some(&p) = self.roots.last() {
                let candidate = (fq - (f[p] + (p * p) as f64)) / (2 * (q - p)) as f64;
                if candidate > self.bounds[self.bounds.len() - 1] {
                    s = candidate;
                    break;
                }
                self.roots.pop();
                self.bounds.pop();
            }
            self.roots.push(q);
            self.bounds.push(s);
        }

        if self.roots.is_empty() {
            out.fill(f64::INFINITY);
            return;
        }

        let mut k = 0;
        for (q, value) in out.iter_mut().enumerate() {
            while k + 1 < self.roots.len() && self.bounds[k + 1] < q as f64 {
                k += 1;
            }
            let p = self.roots[k];
            let dq = q as f64 - p as f64;
            *value = dq * dq + f[p];
        }
    }
}
