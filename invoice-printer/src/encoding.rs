//! Text encoding per printer capability profile
//!
//! Thermal printers do not speak UTF-8. The capability profile names the
//! code page the printer is switched into at initialisation, and every
//! text run is converted to that code page before it reaches the buffer.

use std::borrow::Cow;

use serde::{Deserialize, Serialize};

/// ESC t n: select character code table
const SELECT_CODE_TABLE: [u8; 2] = [0x1B, 0x74];
/// Code table 16: WPC1252
const WPC1252: u8 = 16;
/// Code table 19: PC858 (carries the euro sign at 0xD5)
const PC858: u8 = 19;

/// FS & - enter Chinese character mode
const FS_CHINESE_ON: [u8; 2] = [0x1C, 0x26];
/// FS . - leave Chinese character mode
const FS_CHINESE_OFF: [u8; 2] = [0x1C, 0x2E];
/// FS C 1 - select GBK
const FS_SELECT_GBK: [u8; 3] = [0x1C, 0x43, 0x01];

/// Printer text capability
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityProfile {
    /// Western printers, Windows-1252 code table
    #[default]
    Default,
    /// ASCII only; anything else prints as '?'
    Simple,
    /// Chinese printers in GBK double-byte mode
    Gbk,
}

impl CapabilityProfile {
    /// Commands that put the printer into this profile's code page
    ///
    /// Sent right after `ESC @`, which resets the code table.
    pub fn select_sequence(self) -> Vec<u8> {
        match self {
            CapabilityProfile::Default => vec![SELECT_CODE_TABLE[0], SELECT_CODE_TABLE[1], WPC1252],
            CapabilityProfile::Simple => Vec::new(),
            CapabilityProfile::Gbk => [FS_CHINESE_ON.as_slice(), FS_SELECT_GBK.as_slice()].concat(),
        }
    }

    /// Printed columns taken by one character
    ///
    /// GBK glyphs take one column per encoded byte; '€' is sent through
    /// a single-byte code page.
    pub fn char_width(self, c: char) -> usize {
        match self {
            CapabilityProfile::Gbk if !c.is_ascii() && c != '€' => {
                let mut buf = [0u8; 4];
                let (bytes, _, _) = encoding_rs::GBK.encode(c.encode_utf8(&mut buf));
                bytes.len()
            }
            _ => 1,
        }
    }

    /// Printed columns taken by a text run
    pub fn text_width(self, s: &str) -> usize {
        s.chars().map(|c| self.char_width(c)).sum()
    }

    /// Encode a UTF-8 text run for this profile
    ///
    /// ASCII passes through unchanged in every profile.
    pub fn encode<'a>(self, s: &'a str) -> Cow<'a, [u8]> {
        if s.is_ascii() {
            return Cow::Borrowed(s.as_bytes());
        }
        match self {
            CapabilityProfile::Default => {
                let (bytes, _, _) = encoding_rs::WINDOWS_1252.encode(s);
                bytes
            }
            CapabilityProfile::Simple => Cow::Owned(
                s.chars()
                    .map(|c| if c.is_ascii() { c as u8 } else { b'?' })
                    .collect(),
            ),
            CapabilityProfile::Gbk => Cow::Owned(encode_gbk(s)),
        }
    }
}

/// GBK-encode a text run, routing '€' through PC858
///
/// GBK has no euro sign, so each one is printed by leaving Chinese mode,
/// switching to PC858, printing 0xD5 and switching back.
fn encode_gbk(s: &str) -> Vec<u8> {
    let mut result = Vec::with_capacity(s.len() * 2);
    let parts: Vec<&str> = s.split('€').collect();

    for (idx, part) in parts.iter().enumerate() {
        if !part.is_empty() {
            let (gbk, _, _) = encoding_rs::GBK.encode(part);
            result.extend_from_slice(&gbk);
        }
        if idx < parts.len() - 1 {
            result.extend_from_slice(&FS_CHINESE_OFF);
            result.extend_from_slice(&[SELECT_CODE_TABLE[0], SELECT_CODE_TABLE[1], PC858, 0xD5]);
            result.extend_from_slice(&FS_CHINESE_ON);
        }
    }
    result
}
