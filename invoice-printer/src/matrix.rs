//! Pixel matrices passed between the image stages

/// Row-major luminance matrix, values nominally in `[0, 255]`
///
/// Produced by the preprocessor and consumed (by value) by the ditherer,
/// which uses it as its error-diffusion work buffer.
#[derive(Debug, Clone, PartialEq)]
pub struct IntensityMatrix {
    width: usize,
    height: usize,
    data: Vec<f64>,
}

impl IntensityMatrix {
    /// Matrix filled with a single value
    pub fn filled(width: usize, height: usize, value: f64) -> Self {
        Self {
            width,
            height,
            data: vec![value; width * height],
        }
    }

    /// Build from rows; returns `None` if rows differ in length
    pub fn from_rows(rows: &[Vec<f64>]) -> Option<Self> {
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != width) {
            return None;
        }
        Some(Self {
            width,
            height: rows.len(),
            data: rows.concat(),
        })
    }

    pub(crate) fn from_raw(width: usize, height: usize, data: Vec<f64>) -> Self {
        debug_assert_eq!(data.len(), width * height);
        Self { width, height, data }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn get(&self, x: usize, y: usize) -> f64 {
        self.data[y * self.width + x]
    }

    pub(crate) fn get_mut(&mut self, x: usize, y: usize) -> &mut f64 {
        &mut self.data[y * self.width + x]
    }

    pub fn sum(&self) -> f64 {
        self.data.iter().sum()
    }
}

/// Two-level image, `true` means a printed (black) dot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Bitmap {
    width: usize,
    height: usize,
    dots: Vec<bool>,
}

impl Bitmap {
    /// Build from rows; returns `None` if rows differ in length
    pub fn from_rows(rows: &[Vec<bool>]) -> Option<Self> {
        let width = rows.first().map_or(0, Vec::len);
        if rows.iter().any(|r| r.len() != width) {
            return None;
        }
        Some(Self {
            width,
            height: rows.len(),
            dots: rows.concat(),
        })
    }

    pub(crate) fn from_raw(width: usize, height: usize, dots: Vec<bool>) -> Self {
        debug_assert_eq!(dots.len(), width * height);
        Self { width, height, dots }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Whether the dot at `(x, y)` is printed; out-of-range reads as blank
    pub fn is_black(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.dots[y * self.width + x]
    }

    pub fn rows(&self) -> impl Iterator<Item = &[bool]> {
        self.dots.chunks(self.width.max(1)).take(self.height)
    }

    pub fn black_count(&self) -> usize {
        self.dots.iter().filter(|d| **d).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_rows_rejects_ragged_input() {
        assert!(IntensityMatrix::from_rows(&[vec![0.0, 1.0], vec![2.0]]).is_none());
        assert!(Bitmap::from_rows(&[vec![true], vec![true, false]]).is_none());
    }

    #[test]
    fn test_bitmap_out_of_range_is_blank() {
        let bmp = Bitmap::from_rows(&[vec![true, true]]).unwrap();
        assert!(bmp.is_black(1, 0));
        assert!(!bmp.is_black(2, 0));
        assert!(!bmp.is_black(0, 1));
    }

    #[test]
    fn test_matrix_indexing_is_row_major() {
        let m = IntensityMatrix::from_rows(&[vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]).unwrap();
        assert_eq!((m.width(), m.height()), (3, 2));
        assert_eq!(m.get(2, 0), 3.0);
        assert_eq!(m.get(0, 1), 4.0);
        assert_eq!(m.sum(), 21.0);
    }
}
