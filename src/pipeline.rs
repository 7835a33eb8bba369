use tracing::info;

use crate::config::CannyConfig;
use crate::edge::{detect_edges_with, EdgeMap};
use crate::error::Result;
use crate::gradient::{compute_gradient_field, GradientField};
use crate::grid::PixelGrid;
use crate::kernel::Kernel;
use crate::smooth::smooth_with;

/// The result of a detection run, including every intermediate stage.
#[derive(Clone, Debug)]
pub struct Detection {
    /// The input after Gaussian smoothing. Same size as the input.
    pub smoothed: PixelGrid,
    /// Gradient magnitude and direction of `smoothed`.
    pub field: GradientField,
    /// The largest unclamped magnitude in `field`.
    pub global_max: f32,
    /// The final binary edge map. Same size as `field`.
    pub edges: EdgeMap,
}

impl Detection {
    /// Width of the edge map.
    pub fn width(&self) -> usize {
        self.edges.dimensions().1
    }

    /// Height of the edge map.
    pub fn height(&self) -> usize {
        self.edges.dimensions().0
    }
}

/// A validated configuration with its kernel built, ready to process any number of grids.
#[derive(Clone, Debug)]
pub struct Pipeline {
    config: CannyConfig,
    kernel: Kernel,
}

impl Pipeline {
    /// Validates `config` and builds its kernel.
    pub fn new(config: CannyConfig) -> Result<Pipeline> {
        config.validate()?;
        let kernel = Kernel::gaussian(config.kernel_size, config.sigma)?;
        Ok(Pipeline { config, kernel })
    }

    /// The configuration this pipeline was built from.
    pub fn config(&self) -> &CannyConfig {
        &self.config
    }

    /// The smoothing kernel.
    pub fn kernel(&self) -> &Kernel {
        &self.kernel
    }

    /// Runs all four stages on `grid`, one after the other.
    pub fn run(&self, grid: &PixelGrid) -> Result<Detection> {
        let smoothed = smooth_with(grid, &self.kernel, self.config.border)?;
        let (field, global_max) = compute_gradient_field(&smoothed)?;
        let edges = detect_edges_with(&field, global_max, &self.config.ratios)?;
        info!(
            "{} edge pixels in {}x{} map",
            edges.edge_count(),
            edges.dimensions().1,
            edges.dimensions().0
        );
        Ok(Detection {
            smoothed,
            field,
            global_max,
            edges,
        })
    }
}

/// Detects the edges of an already decoded grayscale image.
pub fn canny<T: Into<image::GrayImage>>(image: T, config: &CannyConfig) -> Result<Detection> {
    let grid = PixelGrid::from(image.into());
    Pipeline::new(config.clone())?.run(&grid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::edge::{detect_edges, EDGE, NO_EDGE};
    use crate::gradient::Direction;
    use crate::grid::Grid;
    use crate::kernel::build_kernel;
    use crate::smooth::smooth;

    fn step_config() -> CannyConfig {
        CannyConfig {
            kernel_size: 3,
            sigma: 1.0,
            ..CannyConfig::default()
        }
    }

    #[test]
    fn detect_vertical_step() {
        // Columns 0..8 are black, 8.. are white.
        let grid = Grid::from_fn(12, 16, |_, c| if c < 8 { 0 } else { 255 });
        let detection = Pipeline::new(step_config()).unwrap().run(&grid).unwrap();
        assert_eq!((detection.height(), detection.width()), (10, 14));

        // Field column j is centered on source column j + 1, so the boundary column 8 is j = 7.
        // Rows 0 and 9 see the zero frame left by the smoothing stage.
        for r in 1..=8 {
            assert_eq!(detection.field.direction().get(r, 7), Direction::Horizontal);
            for c in 0..14 {
                // The L1 magnitude saturates at 255 on all four columns whose window overlaps
                // the smoothed ramp, so suppression cannot thin the band. Column 13 is the
                // right hand side of the zero frame.
                let expected = (5..=8).contains(&c) || c == 13;
                assert_eq!(detection.edges.is_edge(r, c), expected, "at ({}, {})", r, c);
            }
        }
    }

    #[test]
    fn stages_compose() {
        let grid = Grid::from_fn(20, 30, |r, c| ((r * 13 + c * 7) % 256) as u8);
        let detection = Pipeline::new(step_config()).unwrap().run(&grid).unwrap();

        let kernel = build_kernel(3, 1.0).unwrap();
        let smoothed = smooth(&grid, &kernel).unwrap();
        let (field, global_max) = compute_gradient_field(&smoothed).unwrap();
        let edges = detect_edges(&field, global_max).unwrap();
        assert_eq!(detection.smoothed, smoothed);
        assert_eq!(detection.global_max, global_max);
        assert_eq!(detection.edges, edges);
    }

    #[test]
    fn scaling_intensities_keeps_classification() {
        // Two steps of different contrast, no clamping involved.
        let profile = |c: usize| -> u8 { if c < 4 { 0 } else if c < 8 { 20 } else { 60 } };
        let bright = Grid::from_fn(10, 16, |_, c| profile(c));
        let dark = Grid::from_fn(10, 16, |_, c| (profile(c) as f32 * 0.5).round() as u8);

        let (bright_field, bright_max) = compute_gradient_field(&bright).unwrap();
        let (dark_field, dark_max) = compute_gradient_field(&dark).unwrap();
        assert!(dark_max > 0.0 && dark_max < bright_max);

        let bright_edges = detect_edges(&bright_field, bright_max).unwrap();
        let dark_edges = detect_edges(&dark_field, dark_max).unwrap();
        assert_eq!(bright_edges, dark_edges);
        assert_eq!(bright_edges.edge_count(), 4 * 8);
    }

    #[test]
    fn canny_accepts_images() {
        let image = image::GrayImage::from_fn(24, 18, |x, y| image::Luma([if x + y < 20 { 30 } else { 220 }]));
        let detection = canny(image.clone(), &step_config()).unwrap();
        let expected = Pipeline::new(step_config()).unwrap().run(&PixelGrid::from(image)).unwrap();
        assert_eq!(detection.edges, expected.edges);
        assert!(detection.edges.edge_count() > 0);

        let rendered = detection.edges.to_image();
        assert_eq!((rendered.width(), rendered.height()), (22, 16));
        assert!(rendered.pixels().all(|p| p.0[0] == EDGE || p.0[0] == NO_EDGE));
    }

    #[test]
    fn invalid_config_is_rejected_before_running() {
        let config = CannyConfig {
            kernel_size: 2,
            ..CannyConfig::default()
        };
        assert!(Pipeline::new(config.clone()).is_err());
        assert!(canny(image::GrayImage::new(8, 8), &config).is_err());
    }

    #[test]
    fn image_smaller_than_kernel_is_rejected() {
        let config = CannyConfig {
            kernel_size: 5,
            sigma: 1.0,
            ..CannyConfig::default()
        };
        assert!(canny(image::GrayImage::new(4, 4), &config).is_err());
    }
}
