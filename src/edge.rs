use rayon::prelude::*;
use serde::Deserialize;
use tracing::{debug, warn};

use crate::error::{Error, Result};
use crate::gradient::GradientField;
use crate::grid::{Grid, PixelGrid};

/// Value of an edge pixel in an [`EdgeMap`].
pub const EDGE: u8 = 255;
/// Value of a background pixel in an [`EdgeMap`].
pub const NO_EDGE: u8 = 0;

/// A binary image in which every pixel is either [`EDGE`] or [`NO_EDGE`].
#[derive(Clone, Debug, PartialEq)]
pub struct EdgeMap {
    grid: PixelGrid,
}

impl EdgeMap {
    /// The underlying grid.
    pub fn as_grid(&self) -> &PixelGrid {
        &self.grid
    }

    /// Consumes the map, returning the underlying grid.
    pub fn into_grid(self) -> PixelGrid {
        self.grid
    }

    /// `(rows, cols)`
    pub fn dimensions(&self) -> (usize, usize) {
        self.grid.dimensions()
    }

    /// Whether `(row, col)` is part of an edge.
    pub fn is_edge(&self, row: usize, col: usize) -> bool {
        self.grid.get(row, col) == EDGE
    }

    /// Number of edge pixels.
    pub fn edge_count(&self) -> usize {
        self.grid.as_slice().iter().filter(|&&p| p == EDGE).count()
    }

    /// Renders the map as a grayscale image.
    pub fn to_image(&self) -> image::GrayImage {
        self.grid.to_image()
    }
}

/// The fractions of the global maximum magnitude that the two hysteresis thresholds are set at.
#[derive(Copy, Clone, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct HysteresisRatios {
    /// Fraction for the low threshold.
    pub low: f64,
    /// Fraction for the high threshold.
    pub high: f64,
}

impl Default for HysteresisRatios {
    fn default() -> Self {
        HysteresisRatios {
            low: 0.05,
            high: 0.10,
        }
    }
}

impl HysteresisRatios {
    /// Checks that `0 <= low <= high` and both are finite.
    pub fn validate(&self) -> Result<()> {
        if !(self.low.is_finite() && self.low >= 0.0) {
            return Err(Error::invalid("ratios.low", format!("must be non-negative, got {}", self.low)));
        }
        if !(self.high.is_finite() && self.high >= self.low) {
            return Err(Error::invalid(
                "ratios.high",
                format!("must be at least ratios.low ({}), got {}", self.low, self.high),
            ));
        }
        Ok(())
    }
}

/// The low and high hysteresis thresholds, in magnitude units.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Thresholds {
    /// Magnitudes below this are never edges.
    pub low: f32,
    /// Magnitudes above this are always edges.
    pub high: f32,
}

impl Thresholds {
    /// Derives both thresholds by rounding `global_max * ratio` to the nearest integer.
    ///
    /// The product is taken in `f64` and halves round to even, so a global maximum of 50 gives a
    /// low threshold of 2, not 3.
    pub fn from_global_max(global_max: f32, ratios: &HysteresisRatios) -> Result<Thresholds> {
        if !(global_max.is_finite() && global_max >= 0.0) {
            return Err(Error::invalid(
                "global_max",
                format!("must be non-negative and finite, got {}", global_max),
            ));
        }
        ratios.validate()?;
        let global_max = global_max as f64;
        Ok(Thresholds {
            low: (global_max * ratios.low).round_ties_even() as f32,
            high: (global_max * ratios.high).round_ties_even() as f32,
        })
    }
}

/// The final classification of a pixel.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq)]
pub enum PixelClass {
    /// Above the high threshold.
    Strong,
    /// Within the threshold band and directly next to a strong pixel.
    WeakLinked,
    /// Everything else, including pixels zeroed by non-maximum suppression.
    #[default]
    Suppressed,
}

impl PixelClass {
    /// The value this class takes in an [`EdgeMap`].
    pub fn value(self) -> u8 {
        match self {
            PixelClass::Strong | PixelClass::WeakLinked => EDGE,
            PixelClass::Suppressed => NO_EDGE,
        }
    }
}

/// Zeroes every magnitude that is not a local maximum along its gradient direction.
///
/// Each pixel is compared against the two neighbours picked by
/// [`Direction::suppression_neighbours`](crate::Direction::suppression_neighbours) and zeroed if
/// it is strictly smaller than either. Pixels on the border see a zero neighbour outside of the
/// field. Neighbour values are always read from the unsuppressed field, which makes the result
/// independent of the order pixels are visited in.
pub fn suppress_non_maxima(field: &GradientField) -> Grid<f32> {
    let (rows, cols) = field.dimensions();
    let mut out = field.magnitude().clone();
    if out.is_empty() {
        return out;
    }
    let padded = field.magnitude().padded();
    let direction = field.direction();

    out.as_mut_slice()
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(r, out_row)| {
            // (r + 1, c + 1) is the current pixel in padded coordinates.
            for c in 0..cols {
                let center = padded.get(r + 1, c + 1);
                let is_max = direction
                    .get(r, c)
                    .suppression_neighbours()
                    .iter()
                    .all(|&(dr, dc)| {
                        let nr = (r as isize + 1 + dr) as usize;
                        let nc = (c as isize + 1 + dc) as usize;
                        center >= padded.get(nr, nc)
                    });
                if !is_max {
                    out_row[c] = 0.0;
                }
            }
        });
    debug!(rows, cols, "suppressed non-maxima");
    out
}

/// Classifies every pixel of a suppressed magnitude grid.
///
/// Magnitudes above `thresholds.high` are strong, magnitudes below `thresholds.low` are
/// suppressed. A magnitude inside the band is linked when any of its eight neighbours is
/// strong. This is a single pass: weak pixels only link to strong pixels directly next to them,
/// never through other weak pixels.
pub fn hysteresis(suppressed: &Grid<f32>, thresholds: Thresholds) -> Grid<PixelClass> {
    let (rows, cols) = suppressed.dimensions();
    let mut classes = Grid::<PixelClass>::new(rows, cols);
    if classes.is_empty() {
        return classes;
    }
    let padded = suppressed.padded();
    let Thresholds { low, high } = thresholds;

    classes
        .as_mut_slice()
        .par_chunks_mut(cols)
        .enumerate()
        .for_each(|(r, class_row)| {
            let window = [padded.row(r), padded.row(r + 1), padded.row(r + 2)];
            for c in 0..cols {
                let magnitude = window[1][c + 1];
                class_row[c] = if magnitude > high {
                    PixelClass::Strong
                } else if magnitude < low {
                    PixelClass::Suppressed
                } else {
                    let linked = window.iter().enumerate().any(|(dr, row)| {
                        row[c..c + 3]
                            .iter()
                            .enumerate()
                            .any(|(dc, &nb)| !(dr == 1 && dc == 1) && nb > high)
                    });
                    if linked {
                        PixelClass::WeakLinked
                    } else {
                        PixelClass::Suppressed
                    }
                };
            }
        });
    classes
}

/// Runs non-maximum suppression and hysteresis with the default 0.05 / 0.10 ratios.
pub fn detect_edges(field: &GradientField, global_max: f32) -> Result<EdgeMap> {
    detect_edges_with(field, global_max, &HysteresisRatios::default())
}

/// Runs non-maximum suppression and hysteresis with custom threshold ratios.
///
/// The edge map has the dimensions of `field`.
pub fn detect_edges_with(field: &GradientField, global_max: f32, ratios: &HysteresisRatios) -> Result<EdgeMap> {
    let thresholds = Thresholds::from_global_max(global_max, ratios)?;
    if global_max == 0.0 {
        warn!("gradient field is flat, the edge map will only link zero magnitudes");
    }
    debug!(low = thresholds.low, high = thresholds.high, global_max, "hysteresis thresholds");

    let suppressed = suppress_non_maxima(field);
    let classes = hysteresis(&suppressed, thresholds);
    let (rows, cols) = classes.dimensions();
    let values = classes.into_vec().into_iter().map(PixelClass::value).collect();
    let grid = PixelGrid::from_vec(rows, cols, values)?;
    Ok(EdgeMap { grid })
}


#[cfg(all(test, feature = "unstable"))]
mod benchmarks {
    extern crate test;
    use super::*;
    use crate::gradient::compute_gradient_field;

    fn noise_field() -> (GradientField, f32) {
        let grid = Grid::from_fn(256, 256, |r, c| ((r * 31 + c * 17 + r * c) % 256) as u8);
        compute_gradient_field(&grid).unwrap()
    }

    #[bench]
    fn bench_suppress_non_maxima(b: &mut test::Bencher) {
        let (field, _) = noise_field();
        b.iter(|| suppress_non_maxima(&field));
    }

    #[bench]
    fn bench_hysteresis(b: &mut test::Bencher) {
        let (field, global_max) = noise_field();
        let suppressed = suppress_non_maxima(&field);
        let thresholds = Thresholds::from_global_max(global_max, &HysteresisRatios::default()).unwrap();
        b.iter(|| hysteresis(&suppressed, thresholds));
    }
}
