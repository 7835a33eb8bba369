#![cfg_attr(all(test, feature = "unstable"), feature(test))]
#![warn(missing_docs)]

//! A Canny style edge detector for 8-bit grayscale images.
//!
//! The detector runs four stages, each one fully consuming the output of the previous one:
//!
//! 1. [`build_kernel`] derives a normalized Gaussian kernel,
//! 2. [`smooth`] convolves the image with it,
//! 3. [`compute_gradient_field`] applies the Sobel masks, yielding a magnitude, a quantized
//!    [`Direction`] and the largest magnitude of the image,
//! 4. [`detect_edges`] thins the magnitudes by non-maximum suppression and links them with a
//!    double threshold.
//!
//! # Finding the edges in an image
//!
//! ```
//! use canny_pipeline::{build_kernel, compute_gradient_field, detect_edges, smooth, Grid};
//!
//! // A dark square on a bright background.
//! let grid = Grid::from_fn(32, 32, |r, c| {
//!     if (8..24).contains(&r) && (8..24).contains(&c) { 20 } else { 230 }
//! });
//!
//! let kernel = build_kernel(3, 1.0)?;
//! let smoothed = smooth(&grid, &kernel)?;
//! let (field, global_max) = compute_gradient_field(&smoothed)?;
//! let edges = detect_edges(&field, global_max)?;
//! assert!(edges.edge_count() > 0);
//! # Ok::<(), canny_pipeline::Error>(())
//! ```
//!
//! Callers holding an `image::GrayImage` can use [`canny`] with a [`CannyConfig`] instead, which
//! also keeps every intermediate stage in the returned [`Detection`].

mod config;
mod edge;
mod error;
mod gradient;
mod grid;
mod kernel;
mod pipeline;
mod smooth;

pub use config::*;
pub use edge::*;
pub use error::*;
pub use gradient::*;
pub use grid::*;
pub use kernel::*;
pub use pipeline::*;
pub use smooth::*;
