//! sRGB colors as used by slide fills and text runs.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Regex matching `rgb(r, g, b)` and `rgba(r, g, b, a)` notation.
static RGB_FUNCTION_REGEX: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^rgba?\(\s*(\d{1,3})\s*,\s*(\d{1,3})\s*,\s*(\d{1,3})\s*(?:,\s*[\d.]+\s*)?\)$")
        .unwrap()
});

/// CSS named colors that show up in slide fragments.
const NAMED_COLORS: &[(&str, Color)] = &[
    ("black", Color::rgb(0x00, 0x00, 0x00)),
    ("white", Color::rgb(0xFF, 0xFF, 0xFF)),
    ("red", Color::rgb(0xFF, 0x00, 0x00)),
    ("green", Color::rgb(0x00, 0x80, 0x00)),
    ("blue", Color::rgb(0x00, 0x00, 0xFF)),
    ("gray", Color::rgb(0x80, 0x80, 0x80)),
    ("grey", Color::rgb(0x80, 0x80, 0x80)),
    ("silver", Color::rgb(0xC0, 0xC0, 0xC0)),
    ("gold", Color::rgb(0xFF, 0xD7, 0x00)),
    ("orange", Color::rgb(0xFF, 0xA5, 0x00)),
    ("yellow", Color::rgb(0xFF, 0xFF, 0x00)),
    ("limegreen", Color::rgb(0x32, 0xCD, 0x32)),
];

/// An opaque sRGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a CSS color value.
    ///
    /// Accepts `#rgb`, `#rrggbb`, `rgb()`/`rgba()` and a few named colors.
    /// Returns `None` for `transparent`, `inherit` and anything unrecognized.
    pub fn parse(value: &str) -> Option<Self> {
        let value = value.trim();

        if let Some(hex) = value.strip_prefix('#') {
            return Self::from_hex(hex);
        }

        if let Some(caps) = RGB_FUNCTION_REGEX.captures(value) {
            let channel = |i: usize| caps[i].parse::<u16>().ok().map(|v| v.min(255) as u8);
            return Some(Self::rgb(channel(1)?, channel(2)?, channel(3)?));
        }

        let lower = value.to_ascii_lowercase();
        NAMED_COLORS
            .iter()
            .find(|(name, _)| *name == lower)
            .map(|(_, color)| *color)
    }

    fn from_hex(hex: &str) -> Option<Self> {
        if !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return None;
        }
        match hex.len() {
            3 => {
                let digit = |i: usize| u8::from_str_radix(&hex[i..=i], 16).ok().map(|v| v * 17);
                Some(Self::rgb(digit(0)?, digit(1)?, digit(2)?))
            }
            6 | 8 => {
                let pair = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).ok();
                Some(Self::rgb(pair(0)?, pair(2)?, pair(4)?))
            }
            _ => None,
        }
    }

    /// Upper-case `RRGGBB` form used by DrawingML `srgbClr`.
    pub fn to_hex(&self) -> String {
        format!("{:02X}{:02X}{:02X}", self.r, self.g, self.b)
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.to_hex())
    }
}
