//! ESC/POS command builder
//!
//! Provides a fluent API for building ESC/POS print data. Text is encoded
//! for the printer's capability profile as it is written, so raster data
//! appended later is never touched by text conversion.

use crate::encoding::CapabilityProfile;
use crate::matrix::Bitmap;
use crate::raster;

/// Text justification (ESC a n)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Justification {
    Left = 0,
    Center = 1,
    Right = 2,
}

/// ESC/POS command builder
pub struct EscPosBuilder {
    buf: Vec<u8>,
    profile: CapabilityProfile,
}

impl EscPosBuilder {
    /// Create a builder; the stream starts with `ESC @` and the profile's code page
    pub fn new(profile: CapabilityProfile) -> Self {
        let mut buf = Vec::with_capacity(4096);
        buf.extend_from_slice(&[0x1B, 0x40]);
        buf.extend_from_slice(&profile.select_sequence());
        Self { buf, profile }
    }

    pub fn profile(&self) -> CapabilityProfile {
        self.profile
    }

    // === Text Output ===

    /// Write text in the profile's code page
    pub fn text(&mut self, s: &str) -> &mut Self {
        self.buf.extend_from_slice(&self.profile.encode(s));
        self
    }

    /// Write text followed by newline
    pub fn line(&mut self, s: &str) -> &mut Self {
        self.text(s);
        self.buf.push(b'\n');
        self
    }

    /// Print and feed `lines` lines
    ///
    /// A single line is a plain LF; more use ESC d n.
    pub fn feed(&mut self, lines: u8) -> &mut Self {
        if lines <= 1 {
            self.buf.push(b'\n');
        } else {
            self.buf.extend_from_slice(&[0x1B, 0x64, lines]);
        }
        self
    }

    // === Alignment & Style ===

    pub fn justify(&mut self, j: Justification) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x61, j as u8]);
        self
    }

    /// Bold on/off (ESC E n)
    pub fn emphasis(&mut self, on: bool) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x45, on as u8]);
        self
    }

    /// Character magnification (GS ! n), each factor 1..=8
    pub fn text_size(&mut self, width: u8, height: u8) -> &mut Self {
        let w = width.clamp(1, 8) - 1;
        let h = height.clamp(1, 8) - 1;
        self.buf.extend_from_slice(&[0x1D, 0x21, (w << 4) | h]);
        self
    }

    // === Images ===

    /// Print a bitmap as 24-dot bands
    ///
    /// Line spacing is set to the band height (ESC 3 24) so bands abut,
    /// then restored to the default (ESC 2).
    pub fn bit_image(&mut self, bitmap: &Bitmap) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x33, raster::BAND_HEIGHT as u8]);
        self.buf.extend_from_slice(&raster::encode(bitmap));
        self.buf.extend_from_slice(&[0x1B, 0x32]);
        self
    }

    // === Paper Control ===

    /// Full cut after feeding 3 lines (GS V 65 3)
    pub fn cut(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1D, 0x56, 0x41, 3]);
        self
    }

    // === Cash Drawer ===

    /// Kick the cash drawer on pin 2 (ESC p 0 t1 t2)
    ///
    /// Pulse 120 ms on, 240 ms off, in 2 ms units.
    pub fn pulse(&mut self) -> &mut Self {
        self.buf.extend_from_slice(&[0x1B, 0x70, 0x00, 60, 120]);
        self
    }

    // === Raw Commands ===

    /// Write raw bytes directly
    pub fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.buf.extend_from_slice(bytes);
        self
    }

    pub fn len(&self) -> usize {
        self.buf.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buf.is_empty()
    }

    // === Build ===

    pub fn build(self) -> Vec<u8> {
        self.buf
    }
}

impl Default for EscPosBuilder {
    fn default() -> Self {
        Self::new(CapabilityProfile::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_starts_with_init_and_code_page() {
        let data = EscPosBuilder::new(CapabilityProfile::Default).build();
        assert_eq!(data, vec![0x1B, 0x40, 0x1B, 0x74, 16]);

        let data = EscPosBuilder::new(CapabilityProfile::Simple).build();
        assert_eq!(data, vec![0x1B, 0x40]);
    }

    #[test]
    fn test_styles() {
        let mut b = EscPosBuilder::new(CapabilityProfile::Simple);
        b.justify(Justification::Center)
            .emphasis(true)
            .text_size(2, 2)
            .line("Hi")
            .text_size(1, 1)
            .emphasis(false);
        assert_eq!(
            b.build(),
            vec![
                0x1B, 0x40, 0x1B, 0x61, 1, 0x1B, 0x45, 1, 0x1D, 0x21, 0x11, b'H', b'i', b'\n', 0x1D,
                0x21, 0x00, 0x1B, 0x45, 0
            ]
        );
    }

    #[test]
    fn test_feed() {
        let mut b = EscPosBuilder::new(CapabilityProfile::Simple);
        b.feed(1).feed(0).feed(2);
        assert_eq!(b.build()[2..], [b'\n', b'\n', 0x1B, 0x64, 2]);
    }

    #[test]
    fn test_text_is_encoded_per_profile() {
        let mut b = EscPosBuilder::new(CapabilityProfile::Default);
        b.text("€");
        assert_eq!(b.build().last(), Some(&0x80));
    }

    #[test]
    fn test_bit_image_wraps_bands_in_line_spacing() {
        let bmp = Bitmap::from_rows(&[vec![true]]).unwrap();
        let mut b = EscPosBuilder::new(CapabilityProfile::Simple);
        b.bit_image(&bmp);
        let data = b.build();
        assert_eq!(
            data[2..],
            [0x1B, 0x33, 24, 0x1B, 0x2A, 33, 1, 0, 0x80, 0, 0, b'\n', 0x1B, 0x32]
        );
    }

    #[test]
    fn test_cut_and_pulse() {
        let mut b = EscPosBuilder::new(CapabilityProfile::Simple);
        b.cut().pulse();
        assert_eq!(b.build()[2..], [0x1D, 0x56, 0x41, 3, 0x1B, 0x70, 0, 60, 120]);
    }
}
