//! Length conversions between CSS pixels, points and EMUs.
//!
//! Office documents measure geometry in English Metric Units (914400 per
//! inch). HTML slide fragments are authored in CSS pixels at 96 per inch.

use serde::{Deserialize, Serialize};

/// EMUs per inch.
pub const EMU_PER_INCH: i64 = 914_400;

/// EMUs per CSS pixel (96 px per inch).
pub const EMU_PER_PX: i64 = EMU_PER_INCH / 96;

/// Convert CSS pixels to EMUs, rounding to the nearest unit.
pub fn px_to_emu(px: f64) -> i64 {
    (px * EMU_PER_PX as f64).round() as i64
}

/// Convert a CSS pixel font size to points.
pub fn px_to_pt(px: f64) -> f64 {
    px * 0.75
}

/// Position and size of a shape, in EMUs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Frame {
    pub x: i64,
    pub y: i64,
    pub cx: i64,
    pub cy: i64,
}

impl Frame {
    pub fn new(x: i64, y: i64, cx: i64, cy: i64) -> Self {
        Self { x, y, cx, cy }
    }

    /// Build a frame from CSS pixel geometry, scaled by `scale`.
    ///
    /// `scale` maps fragment pixels onto the slide when the fragment body
    /// is not authored at 96 px per inch of slide width.
    pub fn from_px(x: f64, y: f64, width: f64, height: f64, scale: f64) -> Self {
        Self {
            x: px_to_emu(x * scale),
            y: px_to_emu(y * scale),
            cx: px_to_emu(width.max(0.0) * scale),
            cy: px_to_emu(height.max(0.0) * scale),
        }
    }

    /// Bottom edge in EMUs.
    pub fn bottom(&self) -> i64 {
        self.y + self.cy
    }

    /// Right edge in EMUs.
    pub fn right(&self) -> i64 {
        self.x + self.cx
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_px_to_emu() {
        assert_eq!(px_to_emu(96.0), EMU_PER_INCH);
        assert_eq!(px_to_emu(960.0), 9_144_000);
        assert_eq!(px_to_emu(540.0), 5_143_500);
    }

    #[test]
    fn test_px_to_pt() {
        assert_eq!(px_to_pt(16.0), 12.0);
        assert_eq!(px_to_pt(96.0), 72.0);
    }

    #[test]
    fn test_frame_from_px_clamps_negative_size() {
        let frame = Frame::from_px(10.0, 20.0, -5.0, 40.0, 1.0);
        assert_eq!(frame.cx, 0);
        assert_eq!(frame.cy, px_to_emu(40.0));
        assert_eq!(frame.bottom(), px_to_emu(20.0) + px_to_emu(40.0));
    }
}
