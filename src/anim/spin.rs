//! Rotation about the icon center.

use resvg::tiny_skia::Transform;
use serde::{Deserialize, Serialize};

use crate::icon::SizePx;

/// Rotation direction of a [`Spin`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "kebab-case")]
pub enum SpinDirection {
    #[default]
    Clockwise,
    AntiClockwise,
}

impl SpinDirection {
    /// +1 for clockwise, -1 for anti-clockwise (y-down coordinates).
    pub fn sign(&self) -> f32 {
        match self {
            Self::Clockwise => 1.0,
            Self::AntiClockwise => -1.0,
        }
    }
}

/// Spins the rendered content one full turn every 60 frames.
///
/// The content is shrunk to 80% so the corners of a square icon stay
/// inside the buffer while rotating.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Spin {
    direction: SpinDirection,
}

impl Spin {
    pub const MAX_FRAME: u32 = 59;
    pub const DEGREES_PER_FRAME: f32 = 6.0;
    pub const SCALE: f32 = 0.8;

    pub fn new(direction: SpinDirection) -> Self {
        Self { direction }
    }

    pub fn direction(&self) -> SpinDirection {
        self.direction
    }

    /// Translate to center, scale, rotate, translate back.
    pub fn transform(&self, frame: u32, size: SizePx) -> Transform {
        let (cx, cy) = size.center();
        let degrees = self.direction.sign() * Self::DEGREES_PER_FRAME * frame as f32;

        Transform::from_translate(cx, cy)
            .pre_concat(Transform::from_scale(Self::SCALE, Self::SCALE))
            .pre_concat(Transform::from_rotate(degrees))
            .pre_concat(Transform::from_translate(-cx, -cy))
    }
}
