use rayon::prelude::*;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::grid::PixelGrid;
use crate::kernel::Kernel;

/// Where the result of a kernel placement is written in the destination grid.
///
/// Placements only happen where the whole kernel window fits inside the source, so the
/// destination is left with a band of zero pixels along its edges under either policy.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BorderPolicy {
    /// The window with its top-left corner at `(i, j)` is written to `(i + 1, j + 1)`, whatever
    /// the kernel size. For a 3×3 kernel this is the window center; for larger kernels the
    /// output is shifted up and to the left and the right/bottom zero band is wider.
    #[default]
    OffsetByOne,
    /// The window is written at its center, `(i + size / 2, j + size / 2)`.
    Centered,
}

impl BorderPolicy {
    fn offset(self, kernel: &Kernel) -> usize {
        match self {
            BorderPolicy::OffsetByOne => 1,
            BorderPolicy::Centered => kernel.radius(),
        }
    }
}

/// Convolves `grid` with `kernel` using [`BorderPolicy::OffsetByOne`].
pub fn smooth(grid: &PixelGrid, kernel: &Kernel) -> Result<PixelGrid> {
    smooth_with(grid, kernel, BorderPolicy::OffsetByOne)
}

/// Convolves `grid` with `kernel`, placing results according to `policy`.
///
/// The output has the dimensions of the input. Weighted sums are rounded to the nearest integer
/// and clamped to [0, 255]; pixels no kernel placement maps to stay 0. Rounding rather than
/// truncating keeps flat regions flat: a sum of `199.99998` on a region of 200 stays 200.
pub fn smooth_with(grid: &PixelGrid, kernel: &Kernel, policy: BorderPolicy) -> Result<PixelGrid> {
    let (rows, cols) = grid.dimensions();
    let size = kernel.size();
    if rows < size || cols < size {
        return Err(Error::DimensionMismatch {
            expected: (rows.max(size), cols.max(size)),
            actual: (rows, cols),
        });
    }

    let offset = policy.offset(kernel);
    // Number of valid top-left placements along each axis.
    let (places_r, places_c) = (rows - size + 1, cols - size + 1);
    debug!(rows, cols, size, ?policy, "smoothing");

    let mut out = PixelGrid::new(rows, cols);
    out.as_mut_slice()
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(r, out_row)| {
            let i = match r.checked_sub(offset) {
                Some(i) if i < places_r => i,
                _ => return,
            };
            for j in 0..places_c {
                let mut sum = 0.0;
                for x in 0..size {
                    let src = &grid.row(i + x)[j..j + size];
                    for (pix, w) in src.iter().zip(kernel.row(x)) {
                        sum += *pix as f64 * w;
                    }
                }
                out_row[j + offset] = sum.round().max(0.0).min(255.0) as u8;
            }
        });
    Ok(out)
}
