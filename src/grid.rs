use crate::error::{Error, Result};

/// A rectangular, row-major buffer of samples.
///
/// Every stage of the pipeline allocates a fresh grid for its output instead of mutating its
/// input.
#[derive(Clone, Debug, PartialEq)]
pub struct Grid<T> {
    rows: usize,
    cols: usize,
    data: Vec<T>,
}

/// An 8-bit grayscale image. Samples are in [0, 255] by construction.
pub type PixelGrid = Grid<u8>;

impl<T: Copy + Default> Grid<T> {
    /// Creates a grid filled with `T::default()`.
    pub fn new(rows: usize, cols: usize) -> Grid<T> {
        Grid::filled(rows, cols, T::default())
    }

    /// Creates a grid with every sample set to `value`.
    pub fn filled(rows: usize, cols: usize, value: T) -> Grid<T> {
        Grid {
            rows,
            cols,
            data: vec![value; rows * cols],
        }
    }

    /// Wraps a row-major buffer. Fails if `data` does not hold exactly `rows * cols` samples.
    pub fn from_vec(rows: usize, cols: usize, data: Vec<T>) -> Result<Grid<T>> {
        if data.len() != rows * cols {
            return Err(Error::BufferLength {
                expected: rows * cols,
                actual: data.len(),
            });
        }
        Ok(Grid { rows, cols, data })
    }

    /// Builds a grid by evaluating `f(row, col)` for every position.
    pub fn from_fn<F: FnMut(usize, usize) -> T>(rows: usize, cols: usize, mut f: F) -> Grid<T> {
        let mut data = Vec::with_capacity(rows * cols);
        for r in 0..rows {
            for c in 0..cols {
                data.push(f(r, c));
            }
        }
        Grid { rows, cols, data }
    }

    /// Returns a copy surrounded by a one sample wide border of `T::default()`.
    pub fn padded(&self) -> Grid<T> {
        let mut out = Grid::new(self.rows + 2, self.cols + 2);
        for r in 0..self.rows {
            out.row_mut(r + 1)[1..=self.cols].copy_from_slice(self.row(r));
        }
        out
    }

    /// Number of rows.
    pub fn rows(&self) -> usize {
        self.rows
    }

    /// Number of columns.
    pub fn cols(&self) -> usize {
        self.cols
    }

    /// `(rows, cols)`
    pub fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    /// True when the grid holds no samples.
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// The sample at `(row, col)`.
    ///
    /// # Panics
    ///
    /// Panics when `(row, col)` lies outside of the grid.
    pub fn get(&self, row: usize, col: usize) -> T {
        assert!(row < self.rows && col < self.cols);
        self.data[row * self.cols + col]
    }

    /// Overwrites the sample at `(row, col)`.
    pub fn set(&mut self, row: usize, col: usize, value: T) {
        assert!(row < self.rows && col < self.cols);
        self.data[row * self.cols + col] = value;
    }

    /// The samples of a single row.
    pub fn row(&self, row: usize) -> &[T] {
        &self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// Mutable access to a single row.
    pub fn row_mut(&mut self, row: usize) -> &mut [T] {
        &mut self.data[row * self.cols..(row + 1) * self.cols]
    }

    /// All samples in row-major order.
    pub fn as_slice(&self) -> &[T] {
        &self.data
    }

    pub(crate) fn as_mut_slice(&mut self) -> &mut [T] {
        &mut self.data
    }

    /// Consumes the grid, returning the row-major buffer.
    pub fn into_vec(self) -> Vec<T> {
        self.data
    }
}

impl PixelGrid {
    /// Copies the samples into an `image::GrayImage` of `cols × rows` pixels.
    pub fn to_image(&self) -> image::GrayImage {
        let (width, height) = (self.cols as u32, self.rows as u32);
        image::GrayImage::from_fn(width, height, |x, y| image::Luma([self.get(y as usize, x as usize)]))
    }
}

impl From<image::GrayImage> for PixelGrid {
    fn from(image: image::GrayImage) -> PixelGrid {
        let (width, height) = (image.width() as usize, image.height() as usize);
        Grid {
            rows: height,
            cols: width,
            data: image.into_raw(),
        }
    }
}

impl From<&image::GrayImage> for PixelGrid {
    fn from(image: &image::GrayImage) -> PixelGrid {
        PixelGrid::from(image.clone())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn from_vec_rejects_wrong_length() {
        let err = Grid::<u8>::from_vec(2, 3, vec![0; 5]).unwrap_err();
        assert_eq!(err, Error::BufferLength { expected: 6, actual: 5 });
        assert!(Grid::<u8>::from_vec(2, 3, vec![0; 6]).is_ok());
    }

    #[test]
    fn padded_adds_zero_border() {
        let grid = Grid::from_fn(2, 3, |r, c| (r * 3 + c + 1) as u8);
        let padded = grid.padded();
        assert_eq!(padded.dimensions(), (4, 5));
        for c in 0..5 {
            assert_eq!(padded.get(0, c), 0);
            assert_eq!(padded.get(3, c), 0);
        }
        for r in 0..4 {
            assert_eq!(padded.get(r, 0), 0);
            assert_eq!(padded.get(r, 4), 0);
        }
        for r in 0..2 {
            for c in 0..3 {
                assert_eq!(padded.get(r + 1, c + 1), grid.get(r, c));
            }
        }
    }

    #[test]
    fn set_overwrites_one_sample() {
        let mut grid = Grid::<u8>::new(3, 4);
        grid.set(2, 1, 9);
        assert_eq!(grid.get(2, 1), 9);
        assert_eq!(grid.row(2), &[0, 9, 0, 0]);
        assert_eq!(grid.as_slice().iter().map(|&p| p as u32).sum::<u32>(), 9);
    }

    #[test]
    fn image_conversion_keeps_orientation() {
        let grid = Grid::from_fn(2, 4, |r, c| (r * 10 + c) as u8);
        let image = grid.to_image();
        assert_eq!((image.width(), image.height()), (4, 2));
        assert_eq!(image.get_pixel(3, 1).0[0], 13);
        assert_eq!(PixelGrid::from(image), grid);
    }
}
