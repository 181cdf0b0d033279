//! Several animations stepped and rendered as one.

use std::rc::Rc;

use resvg::tiny_skia::Transform;

use super::{Animation, AnimationKey, FrameRange};
use crate::icon::SizePx;

/// Children of a combined animation, in composition order.
///
/// Each child keeps its own frame and wrap policy; stepping the combination
/// steps every child once. The combined transform is the product of the
/// children's transforms, the first child's applied first.
#[derive(Debug, Default)]
pub struct Combined {
    children: Vec<Rc<Animation>>,
}

impl Combined {
    pub fn new(children: Vec<Rc<Animation>>) -> Self {
        Self { children }
    }

    pub fn children(&self) -> &[Rc<Animation>] {
        &self.children
    }

    /// Frames `[0, lcm(child periods) - 1]`, so the combination loops when
    /// every child that started with it is back at its first frame.
    pub fn default_range(&self) -> FrameRange {
        let lcm = self
            .children
            .iter()
            .map(|child| child.range().period())
            .fold(1u64, lcm);
        let max = u32::try_from(lcm - 1).unwrap_or(u32::MAX);
        FrameRange::up_to(max)
    }

    pub fn transform(&self, size: SizePx) -> Transform {
        self.children
            .iter()
            .map(|child| child.transform(size))
            .reduce(|acc, t| acc.post_concat(t))
            .unwrap_or_default()
    }

    pub fn key(&self) -> AnimationKey {
        AnimationKey::Composite(self.children.iter().map(|child| child.key()).collect())
    }

    pub(super) fn step(&self) {
        for child in &self.children {
            child.step();
        }
    }

    pub(super) fn rewind(&self) {
        for child in &self.children {
            child.stop();
        }
    }
}

fn gcd(a: u64, b: u64) -> u64 {
    if b == 0 { a } else { gcd(b, a % b) }
}

fn lcm(a: u64, b: u64) -> u64 {
    (a / gcd(a, b)).saturating_mul(b)
}
