//! Pulsing scale about the icon center.

use resvg::tiny_skia::Transform;

use crate::icon::SizePx;

/// Shrinks the content from 90% to 70% and back over 60 frames.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Breathe;

impl Breathe {
    pub const MAX_FRAME: u32 = 59;
    pub const LARGEST: f32 = 0.9;
    pub const SMALLEST: f32 = 0.7;

    pub fn new() -> Self {
        Self
    }

    /// Scale factor at `frame`, a triangle wave peaking at frame 0.
    pub fn scale(&self, frame: u32) -> f32 {
        let period = Self::MAX_FRAME + 1;
        let half = period / 2;
        let phase = frame % period;
        let distance = if phase <= half { phase } else { period - phase };
        Self::LARGEST - (Self::LARGEST - Self::SMALLEST) * distance as f32 / half as f32
    }

    pub fn transform(&self, frame: u32, size: SizePx) -> Transform {
        let (cx, cy) = size.center();
        let scale = self.scale(frame);

        Transform::from_translate(cx, cy)
            .pre_concat(Transform::from_scale(scale, scale))
            .pre_concat(Transform::from_translate(-cx, -cy))
    }
}
