use tracing::trace;

use crate::error::{Error, Result};

/// A square, normalized Gaussian convolution kernel with an odd side length.
#[derive(Clone, Debug, PartialEq)]
pub struct Kernel {
    size: usize,
    weights: Vec<f64>,
}

impl Kernel {
    /// Calculates a `size × size` Gaussian kernel with standard deviation `sigma`.
    ///
    /// The raw Gaussian is first scaled so its corner weight becomes 1 and every weight is
    /// rounded to a whole number. The integer weights are then divided by their sum, so the
    /// kernel sums to 1.
    pub fn gaussian(size: usize, sigma: f64) -> Result<Kernel> {
        if size == 0 || size % 2 == 0 {
            return Err(Error::invalid("size", format!("must be odd and positive, got {}", size)));
        }
        if !(sigma.is_finite() && sigma > 0.0) {
            return Err(Error::invalid("sigma", format!("must be positive and finite, got {}", sigma)));
        }

        let half = (size / 2) as i64;
        let gauss = |i: i64, j: i64| (-((i * i + j * j) as f64) / (2.0 * sigma * sigma)).exp();
        let corner_scale = 1.0 / gauss(-half, -half);
        if !corner_scale.is_finite() {
            return Err(Error::invalid(
                "sigma",
                format!("{} is too small for a kernel of size {}", sigma, size),
            ));
        }

        let mut weights: Vec<f64> = (-half..=half)
            .flat_map(|i| (-half..=half).map(move |j| (gauss(i, j) * corner_scale).round()))
            .collect();
        let sum: f64 = weights.iter().sum();
        if !sum.is_finite() {
            return Err(Error::invalid(
                "sigma",
                format!("{} is too small for a kernel of size {}", sigma, size),
            ));
        }
        for w in weights.iter_mut() {
            *w /= sum;
        }
        trace!(size, sigma, integer_sum = sum, "built gaussian kernel");
        Ok(Kernel { size, weights })
    }

    /// Side length of the kernel.
    pub fn size(&self) -> usize {
        self.size
    }

    /// Distance from the center to the edge of the kernel.
    pub fn radius(&self) -> usize {
        self.size / 2
    }

    /// The weight at `(row, col)`.
    pub fn weight(&self, row: usize, col: usize) -> f64 {
        self.weights[row * self.size + col]
    }

    /// A single row of weights.
    pub fn row(&self, row: usize) -> &[f64] {
        &self.weights[row * self.size..(row + 1) * self.size]
    }

    /// All weights, row-major.
    pub fn weights(&self) -> &[f64] {
        &self.weights
    }
}

/// Builds the normalized Gaussian kernel used by the smoothing stage.
///
/// See [`Kernel::gaussian`].
pub fn build_kernel(size: usize, sigma: f64) -> Result<Kernel> {
    Kernel::gaussian(size, sigma)
}
