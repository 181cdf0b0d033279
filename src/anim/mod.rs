//! Frame-stepped animations that transform icon rendering.
//!
//! An [`Animation`] is a frame counter with a [`WrapPolicy`] plus a
//! [`Motion`] that maps the current frame and an output size to an affine
//! transform. Animations subscribe to a [`FrameClock`] while running and
//! notify their listeners after every step so the host can repaint.
//!
//! # Variants
//!
//! The motion family is a closed set:
//! - [`Motion::Still`]: identity transform, the base animation
//! - [`Motion::Spin`]: rotation about the center, see [`Spin`]
//! - [`Motion::Breathe`]: pulsing scale about the center, see [`Breathe`]
//! - [`Motion::Combined`]: several animations stepped together, see [`Combined`]
//!
//! # Example
//!
//! ```
//! use animicon::{Animation, SizePx, SpinDirection};
//!
//! let spin = Animation::spin(SpinDirection::Clockwise);
//! let pulse = Animation::breathe();
//! let both = Animation::combine([spin.clone(), pulse.clone()]);
//!
//! both.force_tick();
//! assert_eq!(spin.frame(), 1);
//! assert_eq!(pulse.frame(), 1);
//!
//! let expected = spin.transform(SizePx::square(64)).post_concat(pulse.transform(SizePx::square(64)));
//! assert_eq!(both.transform(SizePx::square(64)), expected);
//! ```

pub mod breathe;
pub mod combined;
pub mod spin;

pub use breathe::Breathe;
pub use combined::Combined;
pub use spin::{Spin, SpinDirection};

use std::cell::{Cell, RefCell};
use std::fmt;
use std::rc::{Rc, Weak};

use resvg::tiny_skia::Transform;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::clock::{FrameClock, SubscriptionId};
use crate::error::{Error, Result};
use crate::icon::SizePx;

// ============================================================================
// Frame range and wrap policy
// ============================================================================

/// Inclusive range of frames an animation cycles through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct FrameRange {
    min: u32,
    max: u32,
}

impl FrameRange {
    /// Creates a range, rejecting `min > max`.
    pub fn new(min: u32, max: u32) -> Result<Self> {
        if min > max {
            return Err(Error::InvalidAnimationConfig { min, max });
        }
        Ok(Self { min, max })
    }

    /// A range starting at zero. Always valid.
    pub const fn up_to(max: u32) -> Self {
        Self { min: 0, max }
    }

    pub fn min(&self) -> u32 {
        self.min
    }

    pub fn max(&self) -> u32 {
        self.max
    }

    /// Number of distinct frames in the range.
    pub fn period(&self) -> u64 {
        u64::from(self.max - self.min) + 1
    }

    pub fn contains(&self, frame: u32) -> bool {
        (self.min..=self.max).contains(&frame)
    }
}

/// What happens when a step moves past the last frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "kebab-case")]
pub enum WrapPolicy {
    /// Reset to the first frame and keep running.
    #[default]
    Loop,
    /// Reset to the first frame and stop.
    SingleShot,
}

// ============================================================================
// Animation key
// ============================================================================

/// Render identity of an animation at its current frame.
///
/// Two animations with equal keys produce equal transforms for every size,
/// so the key can stand in for the animation inside a pixmap cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum AnimationKey {
    Still { frame: u32 },
    Spin { direction: SpinDirection, frame: u32 },
    Breathe { frame: u32 },
    Composite(Vec<AnimationKey>),
}

// ============================================================================
// Motion
// ============================================================================

/// The transform-producing part of an animation.
#[derive(Debug)]
pub enum Motion {
    Still,
    Spin(Spin),
    Breathe(Breathe),
    Combined(Combined),
}

impl Motion {
    /// The frame range used when none is configured explicitly.
    pub fn default_range(&self) -> FrameRange {
        match self {
            Self::Still => FrameRange::up_to(100),
            Self::Spin(_) => FrameRange::up_to(Spin::MAX_FRAME),
            Self::Breathe(_) => FrameRange::up_to(Breathe::MAX_FRAME),
            Self::Combined(combined) => combined.default_range(),
        }
    }

    fn transform(&self, frame: u32, size: SizePx) -> Transform {
        match self {
            Self::Still => Transform::identity(),
            Self::Spin(spin) => spin.transform(frame, size),
            Self::Breathe(breathe) => breathe.transform(frame, size),
            Self::Combined(combined) => combined.transform(size),
        }
    }

    fn key(&self, frame: u32) -> AnimationKey {
        match self {
            Self::Still => AnimationKey::Still { frame },
            Self::Spin(spin) => AnimationKey::Spin {
                direction: spin.direction(),
                frame,
            },
            Self::Breathe(_) => AnimationKey::Breathe { frame },
            Self::Combined(combined) => combined.key(),
        }
    }

    fn step(&self) {
        if let Self::Combined(combined) = self {
            combined.step();
        }
    }

    fn rewind(&self) {
        if let Self::Combined(combined) = self {
            combined.rewind();
        }
    }
}

// ============================================================================
// Animation
// ============================================================================

/// Handle returned by [`Animation::connect`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ListenerId(u64);

type ListenerFn = Rc<dyn Fn()>;

/// A steppable frame counter bound to a [`Motion`].
///
/// Animations are shared through `Rc`: any number of pixmap generators may
/// hold the same instance. Dropping the last reference unsubscribes it from
/// its clock.
pub struct Animation {
    motion: Motion,
    range: FrameRange,
    wrap: WrapPolicy,
    frame: Cell<u32>,
    clock: Rc<FrameClock>,
    subscription: Cell<Option<SubscriptionId>>,
    listeners: RefCell<Vec<(ListenerId, ListenerFn)>>,
    next_listener: Cell<u64>,
    this: Weak<Animation>,
}

impl Animation {
    /// Starts building an animation around `motion`.
    pub fn builder(motion: Motion) -> AnimationBuilder {
        AnimationBuilder {
            motion,
            range: None,
            wrap: WrapPolicy::Loop,
            clock: None,
        }
    }

    /// A looping animation with an identity transform.
    pub fn still() -> Rc<Self> {
        Self::with_defaults(Motion::Still, WrapPolicy::Loop)
    }

    /// A looping spin on the shared clock.
    pub fn spin(direction: SpinDirection) -> Rc<Self> {
        Self::with_defaults(Motion::Spin(Spin::new(direction)), WrapPolicy::Loop)
    }

    /// A spin that performs one revolution and stops.
    pub fn spin_once(direction: SpinDirection) -> Rc<Self> {
        Self::with_defaults(Motion::Spin(Spin::new(direction)), WrapPolicy::SingleShot)
    }

    /// A looping breathe on the shared clock.
    pub fn breathe() -> Rc<Self> {
        Self::with_defaults(Motion::Breathe(Breathe::new()), WrapPolicy::Loop)
    }

    /// Combines animations into one that steps them together.
    ///
    /// Transforms are composed in iteration order: the first animation's
    /// transform applies first.
    pub fn combine(animations: impl IntoIterator<Item = Rc<Animation>>) -> Rc<Self> {
        let combined = Combined::new(animations.into_iter().collect());
        Self::with_defaults(Motion::Combined(combined), WrapPolicy::Loop)
    }

    fn with_defaults(motion: Motion, wrap: WrapPolicy) -> Rc<Self> {
        let range = motion.default_range();
        Self::assemble(motion, range, wrap, FrameClock::instance())
    }

    fn assemble(
        motion: Motion,
        range: FrameRange,
        wrap: WrapPolicy,
        clock: Rc<FrameClock>,
    ) -> Rc<Self> {
        Rc::new_cyclic(|this| Self {
            motion,
            range,
            wrap,
            frame: Cell::new(range.min()),
            clock,
            subscription: Cell::new(None),
            listeners: RefCell::new(Vec::new()),
            next_listener: Cell::new(0),
            this: this.clone(),
        })
    }

    pub fn motion(&self) -> &Motion {
        &self.motion
    }

    pub fn range(&self) -> FrameRange {
        self.range
    }

    pub fn wrap_policy(&self) -> WrapPolicy {
        self.wrap
    }

    /// The current frame.
    pub fn frame(&self) -> u32 {
        self.frame.get()
    }

    /// Returns true while subscribed to the clock.
    pub fn active(&self) -> bool {
        self.subscription.get().is_some()
    }

    /// Subscribes to the clock. Calling it while active does nothing.
    pub fn start(&self) {
        if self.active() {
            return;
        }

        let this = self.this.clone();
        let id = self.clock.subscribe(move || {
            if let Some(animation) = this.upgrade() {
                animation.step();
            }
        });
        self.subscription.set(Some(id));
        debug!(animation = ?self.key(), "animation started");
    }

    /// Unsubscribes from the clock, keeping the current frame.
    pub fn pause(&self) {
        if let Some(id) = self.subscription.take() {
            self.clock.unsubscribe(id);
            debug!(animation = ?self.key(), "animation paused");
        }
    }

    /// Unsubscribes from the clock and rewinds to the first frame.
    ///
    /// A combined animation also stops and rewinds every child, so its
    /// transform and key return to their initial values.
    pub fn stop(&self) {
        self.pause();
        self.frame.set(self.range.min());
        self.motion.rewind();
    }

    /// Pauses if active, starts otherwise.
    pub fn toggle(&self) {
        if self.active() {
            self.pause();
        } else {
            self.start();
        }
    }

    /// Performs exactly one step outside the clock.
    pub fn force_tick(&self) {
        self.step();
    }

    /// The transform for `size` at the current frame.
    pub fn transform(&self, size: SizePx) -> Transform {
        self.motion.transform(self.frame(), size)
    }

    /// The render identity at the current frame.
    pub fn key(&self) -> AnimationKey {
        self.motion.key(self.frame())
    }

    /// Registers a callback invoked after every step.
    pub fn connect(&self, listener: impl Fn() + 'static) -> ListenerId {
        let id = ListenerId(self.next_listener.get());
        self.next_listener.set(id.0 + 1);
        self.listeners.borrow_mut().push((id, Rc::new(listener)));
        id
    }

    /// Removes a callback. Returns true if it was registered.
    pub fn disconnect(&self, id: ListenerId) -> bool {
        let mut listeners = self.listeners.borrow_mut();
        let before = listeners.len();
        listeners.retain(|(listener, _)| *listener != id);
        before != listeners.len()
    }

    pub fn listener_count(&self) -> usize {
        self.listeners.borrow().len()
    }

    fn step(&self) {
        self.motion.step();

        let frame = self.frame.get();
        if frame >= self.range.max() {
            self.frame.set(self.range.min());
            if self.wrap == WrapPolicy::SingleShot {
                self.pause();
                debug!(animation = ?self.key(), "single-shot animation finished");
            }
        } else {
            self.frame.set(frame + 1);
        }

        let snapshot: Vec<ListenerFn> = self
            .listeners
            .borrow()
            .iter()
            .map(|(_, f)| Rc::clone(f))
            .collect();
        for listener in snapshot {
            listener();
        }
    }
}

impl Drop for Animation {
    fn drop(&mut self) {
        if let Some(id) = self.subscription.take() {
            self.clock.unsubscribe(id);
        }
    }
}

impl fmt::Debug for Animation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Animation")
            .field("motion", &self.motion)
            .field("range", &self.range)
            .field("wrap", &self.wrap)
            .field("frame", &self.frame.get())
            .field("active", &self.active())
            .finish()
    }
}

// ============================================================================
// AnimationBuilder
// ============================================================================

/// Builder for animations with a custom range, policy, or clock.
pub struct AnimationBuilder {
    motion: Motion,
    range: Option<(u32, u32)>,
    wrap: WrapPolicy,
    clock: Option<Rc<FrameClock>>,
}

impl AnimationBuilder {
    /// Overrides the motion's default frame range.
    pub fn frames(mut self, min: u32, max: u32) -> Self {
        self.range = Some((min, max));
        self
    }

    pub fn wrap(mut self, wrap: WrapPolicy) -> Self {
        self.wrap = wrap;
        self
    }

    /// Subscribes to `clock` instead of the shared instance.
    pub fn clock(mut self, clock: Rc<FrameClock>) -> Self {
        self.clock = Some(clock);
        self
    }

    /// Builds the animation. Fails if the frame range is empty.
    pub fn build(self) -> Result<Rc<Animation>> {
        let range = match self.range {
            Some((min, max)) => FrameRange::new(min, max)?,
            None => self.motion.default_range(),
        };
        let clock = self.clock.unwrap_or_else(FrameClock::instance);
        Ok(Animation::assemble(self.motion, range, self.wrap, clock))
    }
}

// ============================================================================
// Tests
// ============================================================================
