//! Logo preprocessing: decode, resize, flatten, tone, luminance
//!
//! Output is an [`IntensityMatrix`] ready for dithering.

use image::imageops::FilterType;
use image::{DynamicImage, GenericImageView, Rgb, RgbImage, RgbaImage};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use crate::error::PrintResult;
use crate::matrix::IntensityMatrix;

/// Gamma applied before dithering unless configured otherwise
pub const DEFAULT_GAMMA: f32 = 0.9;

/// Contrast delta applied before dithering unless configured otherwise
pub const DEFAULT_CONTRAST: f32 = 15.0;

/// Tone curve applied to the resized image, before dithering
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToneAdjustment {
    /// Exponent on normalised intensity; `None` or 1.0 leaves it unchanged
    pub gamma: Option<f32>,
    /// Contrast delta as understood by `image::imageops::contrast`
    pub contrast: Option<f32>,
}

impl ToneAdjustment {
    pub fn none() -> Self {
        Self {
            gamma: None,
            contrast: None,
        }
    }
}

impl Default for ToneAdjustment {
    fn default() -> Self {
        Self {
            gamma: Some(DEFAULT_GAMMA),
            contrast: Some(DEFAULT_CONTRAST),
        }
    }
}

/// Turns encoded image bytes into a luminance matrix
#[derive(Debug, Clone, Default)]
pub struct ImagePreprocessor {
    tone: ToneAdjustment,
}

impl ImagePreprocessor {
    pub fn new(tone: ToneAdjustment) -> Self {
        Self { tone }
    }

    /// Decode and resize to exactly `target_width` pixels
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub fn preprocess(&self, bytes: &[u8], target_width: u32) -> PrintResult<IntensityMatrix> {
        let img = image::load_from_memory(bytes)?;
        Ok(self.convert(&img, target_width))
    }

    /// Decode and shrink to at most `max_width` pixels
    ///
    /// Images already narrower than `max_width` keep their native width.
    #[instrument(skip(self, bytes), fields(bytes = bytes.len()))]
    pub fn preprocess_fit(&self, bytes: &[u8], max_width: u32) -> PrintResult<IntensityMatrix> {
        let img = image::load_from_memory(bytes)?;
        let target = img.width().min(max_width);
        Ok(self.convert(&img, target))
    }

    fn convert(&self, img: &DynamicImage, target_width: u32) -> IntensityMatrix {
        let (w, h) = img.dimensions();
        if w == 0 || h == 0 || target_width == 0 {
            return IntensityMatrix::filled(0, 0, 255.0);
        }

        let target_height = target_height(w, h, target_width);
        debug!(from = ?(w, h), to = ?(target_width, target_height), "resizing image");

        // Straight alpha must be flattened before resampling
        let flat = flatten_on_white(&img.to_rgba8());
        let resized = if (w, h) == (target_width, target_height) {
            flat
        } else {
            image::imageops::resize(&flat, target_width, target_height, FilterType::CatmullRom)
        };

        luminance(&self.apply_tone(resized))
    }

    fn apply_tone(&self, mut img: RgbImage) -> RgbImage {
        if let Some(gamma) = self.tone.gamma.filter(|g| *g > 0.0 && (*g - 1.0).abs() > f32::EPSILON) {
            let lut: Vec<u8> = (0..=255u16)
                .map(|v| (255.0 * (v as f32 / 255.0).powf(gamma)).round().clamp(0.0, 255.0) as u8)
                .collect();
            for px in img.pixels_mut() {
                for c in px.0.iter_mut() {
                    *c = lut[*c as usize];
                }
            }
        }
        if let Some(contrast) = self.tone.contrast.filter(|c| *c != 0.0) {
            img = image::imageops::contrast(&img, contrast);
        }
        img
    }
}

/// `round(h * target_width / w)`, never below one row
pub fn target_height(width: u32, height: u32, target_width: u32) -> u32 {
    let h = (height as f64 * target_width as f64 / width as f64).round() as u32;
    h.max(1)
}

/// Composite RGBA over an opaque white background
fn flatten_on_white(img: &RgbaImage) -> RgbImage {
    let mut out = RgbImage::new(img.width(), img.height());
    for (x, y, px) in img.enumerate_pixels() {
        let alpha = px[3] as f32 / 255.0;
        let blend = |c: u8| (c as f32 * alpha + 255.0 * (1.0 - alpha)).round() as u8;
        out.put_pixel(x, y, Rgb([blend(px[0]), blend(px[1]), blend(px[2])]));
    }
    out
}

/// ITU-R 601 luma per pixel
fn luminance(img: &RgbImage) -> IntensityMatrix {
    let data = img
        .pixels()
        .map(|p| 0.299 * p[0] as f64 + 0.587 * p[1] as f64 + 0.114 * p[2] as f64)
        .collect();
    IntensityMatrix::from_raw(img.width() as usize, img.height() as usize, data)
}
