//! ESC * bit-image raster encoding
//!
//! The image is cut into horizontal bands of 24 dots. Each band becomes one
//! `ESC * 33 nL nH d1..dk LF` command where every column contributes three
//! bytes, top dot in the most significant bit.

use tracing::debug;

use crate::matrix::Bitmap;

/// Dots per band
pub const BAND_HEIGHT: usize = 24;

/// Bytes per column within a band
pub const BYTES_PER_COLUMN: usize = BAND_HEIGHT / 8;

/// ESC * m: select bit-image mode
pub const BIT_IMAGE: [u8; 2] = [0x1B, 0x2A];

/// m = 33: 24-dot double density
pub const DOUBLE_DENSITY_24: u8 = 33;

/// Number of bands needed for `height` rows
pub fn band_count(height: usize) -> usize {
    height.div_ceil(BAND_HEIGHT)
}

/// Encode a bitmap as a sequence of 24-dot band commands
///
/// The width is sent as a 16-bit little-endian count; callers keep the
/// bitmap within the printer's raster width.
pub fn encode(bitmap: &Bitmap) -> Vec<u8> {
    let width = bitmap.width();
    let bands = band_count(bitmap.height());
    debug!(width, height = bitmap.height(), bands, "Encoding raster bands");

    let mut out = Vec::with_capacity(bands * (BIT_IMAGE.len() + 3 + BYTES_PER_COLUMN * width + 1));

    for band in 0..bands {
        let top = band * BAND_HEIGHT;

        out.extend_from_slice(&BIT_IMAGE);
        out.push(DOUBLE_DENSITY_24);
        out.push((width % 256) as u8);
        out.push((width / 256) as u8);

        for x in 0..width {
            for k in 0..BYTES_PER_COLUMN {
                let mut byte = 0u8;
                for b in 0..8 {
                    if bitmap.is_black(x, top + k * 8 + b) {
                        byte |= 1 << (7 - b);
                    }
                }
                out.push(byte);
            }
        }

        out.push(b'\n');
    }

    out
}
