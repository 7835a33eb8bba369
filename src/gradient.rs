//! Sobel gradients with an L1 magnitude and a four-way quantized direction.
//!
//! Both 3×3 masks are only evaluated where the full window fits inside the source grid, so the
//! resulting [`GradientField`] is two samples narrower and two samples shorter than its input.
//! The value computed for the window with its top-left corner at `(i, j)` is stored at `(i, j)`.

use rayon::prelude::*;
use tracing::debug;

use crate::error::{Error, Result};
use crate::grid::{Grid, PixelGrid};

type Mask = [[i32; 3]; 3];

const SOBEL_X: Mask = [[-1, 0, 1], [-2, 0, 2], [-1, 0, 1]];
const SOBEL_Y: Mask = [[1, 2, 1], [0, 0, 0], [-1, -2, -1]];

/// The orientation a continuous gradient angle is rounded into.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// 0°
    #[default]
    Horizontal,
    /// 45°
    Diagonal45,
    /// 90°
    Vertical,
    /// 135°
    Diagonal135,
}

impl Direction {
    /// Quantizes an angle in degrees.
    ///
    /// The angle is first folded by whole steps of 180°, then mapped by the
    /// half-open ranges `[0, 22.5) ∪ [157.5, 180]`, `[22.5, 67.5)`, `[67.5, 112.5)` and
    /// `[112.5, 157.5)`.
    pub fn from_degrees(degrees: f64) -> Direction {
        if !degrees.is_finite() {
            return Direction::Horizontal;
        }
        // 180° and 0° quantize alike, so folding into [0, 180) is enough.
        match degrees.rem_euclid(180.0) {
            a if a < 22.5 => Direction::Horizontal,
            a if a < 67.5 => Direction::Diagonal45,
            a if a < 112.5 => Direction::Vertical,
            a if a < 157.5 => Direction::Diagonal135,
            _ => Direction::Horizontal,
        }
    }

    /// The canonical angle of this direction in degrees.
    pub fn degrees(self) -> u32 {
        match self {
            Direction::Horizontal => 0,
            Direction::Diagonal45 => 45,
            Direction::Vertical => 90,
            Direction::Diagonal135 => 135,
        }
    }

    /// `(d_row, d_col)` offsets of the two neighbours a pixel is compared with during
    /// non-maximum suppression.
    pub fn suppression_neighbours(self) -> [(isize, isize); 2] {
        match self {
            Direction::Horizontal => [(0, 1), (0, -1)],   // east, west
            Direction::Vertical => [(-1, 0), (1, 0)],     // north, south
            Direction::Diagonal45 => [(-1, -1), (1, 1)],  // north-west, south-east
            Direction::Diagonal135 => [(-1, 1), (1, -1)], // north-east, south-west
        }
    }
}

/// Per-pixel gradient magnitude and quantized direction.
#[derive(Clone, Debug, PartialEq)]
pub struct GradientField {
    magnitude: Grid<f32>,
    direction: Grid<Direction>,
}

impl GradientField {
    /// Pairs a magnitude grid with a direction grid of the same size.
    ///
    /// Magnitudes are clamped to [0, 255]; NaN becomes 0.
    pub fn new(mut magnitude: Grid<f32>, direction: Grid<Direction>) -> Result<GradientField> {
        if magnitude.dimensions() != direction.dimensions() {
            return Err(Error::DimensionMismatch {
                expected: magnitude.dimensions(),
                actual: direction.dimensions(),
            });
        }
        for m in magnitude.as_mut_slice() {
            *m = clamp_magnitude(*m);
        }
        Ok(GradientField {
            magnitude,
            direction,
        })
    }

    /// Magnitudes, clamped to [0, 255].
    pub fn magnitude(&self) -> &Grid<f32> {
        &self.magnitude
    }

    /// Quantized gradient directions.
    pub fn direction(&self) -> &Grid<Direction> {
        &self.direction
    }

    /// `(rows, cols)` shared by both grids.
    pub fn dimensions(&self) -> (usize, usize) {
        self.magnitude.dimensions()
    }
}

fn clamp_magnitude(m: f32) -> f32 {
    if m.is_nan() {
        0.0
    } else {
        m.max(0.0).min(255.0)
    }
}

/// Applies the Sobel masks to `grid`.
///
/// Returns the field together with the largest magnitude seen before clamping. That maximum is
/// what the hysteresis thresholds are derived from.
pub fn compute_gradient_field(grid: &PixelGrid) -> Result<(GradientField, f32)> {
    let (rows, cols) = grid.dimensions();
    if rows < 3 || cols < 3 {
        return Err(Error::DimensionMismatch {
            expected: (rows.max(3), cols.max(3)),
            actual: (rows, cols),
        });
    }
    let (out_rows, out_cols) = (rows - 2, cols - 2);

    let mut magnitude = Grid::<f32>::new(out_rows, out_cols);
    let mut direction = Grid::<Direction>::new(out_rows, out_cols);
    let global_max = magnitude
        .as_mut_slice()
        .par_chunks_mut(out_cols)
        .zip(direction.as_mut_slice().par_chunks_mut(out_cols))
        .enumerate()
        .map(|(i, (mag_row, dir_row))| {
            let window = [grid.row(i), grid.row(i + 1), grid.row(i + 2)];
            let mut row_max = 0.0f32;
            for j in 0..out_cols {
                let (mut sum_x, mut sum_y) = (0i32, 0i32);
                for (x, src) in window.iter().enumerate() {
                    for y in 0..3 {
                        let pix = src[j + y] as i32;
                        sum_x += pix * SOBEL_X[x][y];
                        sum_y += pix * SOBEL_Y[x][y];
                    }
                }
                let (sum_x, sum_y) = (sum_x.abs() as f32, sum_y.abs() as f32);
                let modulus = sum_x + sum_y;
                row_max = row_max.max(modulus);
                mag_row[j] = clamp_magnitude(modulus);
                dir_row[j] = Direction::from_degrees((sum_y as f64).atan2(sum_x as f64).to_degrees());
            }
            row_max
        })
        .reduce(|| 0.0, f32::max);

    debug!(rows = out_rows, cols = out_cols, global_max, "computed gradient field");
    Ok((
        GradientField {
            magnitude,
            direction,
        },
        global_max,
    ))
}
