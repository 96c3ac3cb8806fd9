//! Floyd-Steinberg error diffusion
//!
//! Converts a luminance matrix into a two-level bitmap. Pixels are visited
//! row-major, left to right, top to bottom, and each quantization error is
//! pushed into neighbours that have not been visited yet:
//! - Right:        7/16
//! - Bottom-left:  3/16
//! - Bottom:       5/16
//! - Bottom-right: 1/16
//!
//! Error aimed outside the matrix is discarded.

use tracing::debug;

use crate::matrix::{Bitmap, IntensityMatrix};

/// Mid-gray threshold; values below it print black.
pub const THRESHOLD: f64 = 128.0;

/// Dither a luminance matrix into a printable bitmap.
///
/// Takes the matrix by value: it is the work buffer for the diffusion.
pub fn dither(matrix: IntensityMatrix) -> Bitmap {
    diffuse(matrix).0
}

/// Run the diffusion, returning the bitmap and the total error that fell
/// off the matrix edges.
pub(crate) fn diffuse(mut matrix: IntensityMatrix) -> (Bitmap, f64) {
    let (width, height) = (matrix.width(), matrix.height());
    debug!(width, height, "Applying Floyd-Steinberg dithering");

    let mut dots = Vec::with_capacity(width * height);
    let mut dropped = 0.0;

    for y in 0..height {
        for x in 0..width {
            let old = matrix.get(x, y);
            let new = if old < THRESHOLD { 0.0 } else { 255.0 };
            let error = old - new;
            dots.push(new == 0.0);

            dropped += distribute_error(&mut matrix, x, y, error);
        }
    }

    (Bitmap::from_raw(width, height, dots), dropped)
}

/// Distribute quantization error to unvisited neighbours.
///
/// Returns the share that had no in-bounds neighbour to land on.
fn distribute_error(matrix: &mut IntensityMatrix, x: usize, y: usize, error: f64) -> f64 {
    let (width, height) = (matrix.width(), matrix.height());
    let has_right = x + 1 < width;
    let has_below = y + 1 < height;
    let mut dropped = 0.0;

    let mut push = |ok: bool, nx: usize, ny: usize, share: f64| {
        if ok {
            *matrix.get_mut(nx, ny) += share;
        } else {
            dropped += share;
        }
    };

    push(has_right, x + 1, y, error * 7.0 / 16.0);
    push(x > 0 && has_below, x.wrapping_sub(1), y + 1, error * 3.0 / 16.0);
    push(has_below, x, y + 1, error * 5.0 / 16.0);
    push(has_right && has_below, x + 1, y + 1, error * 1.0 / 16.0);

    dropped
}
