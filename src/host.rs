//! Glue between icons and the widget that displays them.
//!
//! The widget is only known through [`RepaintTarget`]: something that can be
//! told to repaint, and that later asks [`Icon::pixmap`] for a bitmap at
//! whatever size its layout decided on.

use std::fmt;
use std::rc::{Rc, Weak};

use crate::anim::{Animation, ListenerId};
use crate::cache::Bitmap;
use crate::error::Result;
use crate::generator::{Pipeline, PixmapGenerator};
use crate::icon::{Color, SizePx};
use crate::multi_state::{Mode, MultiStateIcon};

/// Receives repaint requests from animation ticks.
///
/// Implementations usually schedule a repaint rather than painting
/// synchronously, but calling back into [`Icon::pixmap`] from here is
/// allowed.
pub trait RepaintTarget {
    fn request_repaint(&self);
}

impl<F: Fn()> RepaintTarget for F {
    fn request_repaint(&self) {
        self()
    }
}

/// Keeps a target connected to an icon's animations.
///
/// Dropping the binding disconnects every listener it registered. The
/// binding holds the target weakly; a dropped target is silently skipped.
#[must_use = "dropping the binding disconnects the repaint target"]
pub struct RepaintBinding {
    connections: Vec<(Rc<Animation>, ListenerId)>,
}

impl RepaintBinding {
    /// Number of animations the target is connected to.
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Disconnects now instead of on drop.
    pub fn unbind(self) {}
}

impl Drop for RepaintBinding {
    fn drop(&mut self) {
        for (anim, id) in self.connections.drain(..) {
            anim.disconnect(id);
        }
    }
}

impl fmt::Debug for RepaintBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RepaintBinding")
            .field("connections", &self.connections.len())
            .finish()
    }
}

/// A displayable icon: a [`MultiStateIcon`] plus repaint wiring.
#[derive(Debug, Clone)]
pub struct Icon {
    states: MultiStateIcon,
}

impl Icon {
    pub fn new(
        pipeline: &Pipeline,
        path: &str,
        color: Option<Color>,
        anim: Option<Rc<Animation>>,
    ) -> Result<Self> {
        Ok(Self::from_states(MultiStateIcon::new(
            pipeline, path, color, anim,
        )?))
    }

    pub fn from_states(states: MultiStateIcon) -> Self {
        Self { states }
    }

    pub fn states(&self) -> &MultiStateIcon {
        &self.states
    }

    pub fn states_mut(&mut self) -> &mut MultiStateIcon {
        &mut self.states
    }

    /// The normal state's generator.
    pub fn generator(&self) -> &PixmapGenerator {
        self.states.state(Mode::Normal)
    }

    /// The normal state's animation.
    pub fn anim(&self) -> Option<&Rc<Animation>> {
        self.generator().anim()
    }

    pub fn pixmap(&self, size: SizePx, mode: Mode) -> Result<Bitmap> {
        self.states.pixmap(size, mode)
    }

    /// Requests a repaint of `target` after every step of any animation
    /// used by this icon. Shared animations are connected once.
    ///
    /// States added after binding are not covered; bind again to include
    /// them.
    pub fn bind_repaint(&self, target: &Rc<dyn RepaintTarget>) -> RepaintBinding {
        let connections = self
            .states
            .animations()
            .into_iter()
            .map(|anim| {
                let target: Weak<dyn RepaintTarget> = Rc::downgrade(target);
                let id = anim.connect(move || {
                    if let Some(target) = target.upgrade() {
                        target.request_repaint();
                    }
                });
                (anim, id)
            })
            .collect();
        RepaintBinding { connections }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::SpinDirection;
    use crate::cache::PixmapCache;
    use crate::multi_state::StateOptions;
    use crate::resolve::MemoryResolver;
    use std::cell::{Cell, RefCell};

    const SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="16"><rect x="4" y="4" width="8" height="8"/></svg>"##;

    fn pipeline() -> Pipeline {
        Pipeline::new(MemoryResolver::new().with("square", SVG))
            .with_cache(Rc::new(PixmapCache::new()))
    }

    fn counter() -> (Rc<Cell<u32>>, Rc<dyn RepaintTarget>) {
        let count = Rc::new(Cell::new(0));
        let count2 = Rc::clone(&count);
        let target: Rc<dyn RepaintTarget> = Rc::new(move || count2.set(count2.get() + 1));
        (count, target)
    }

    #[test]
    fn binding_repaints_on_tick() {
        let anim = Animation::spin(SpinDirection::Clockwise);
        let icon = Icon::new(&pipeline(), "square", None, Some(Rc::clone(&anim))).unwrap();
        let (count, target) = counter();

        let binding = icon.bind_repaint(&target);
        assert_eq!(binding.len(), 1);

        anim.force_tick();
        anim.force_tick();
        assert_eq!(count.get(), 2);

        drop(binding);
        anim.force_tick();
        assert_eq!(count.get(), 2);
        assert_eq!(anim.listener_count(), 0);
    }

    #[test]
    fn shared_animation_is_connected_once() {
        let anim = Animation::spin(SpinDirection::Clockwise);
        let mut icon = Icon::new(&pipeline(), "square", None, Some(Rc::clone(&anim))).unwrap();
        icon.states_mut()
            .add_state("square", Mode::Active, StateOptions::inherit())
            .unwrap();
        icon.states_mut()
            .add_state(
                "square",
                Mode::Selected,
                StateOptions::inherit().anim(Animation::breathe()),
            )
            .unwrap();

        let (count, target) = counter();
        let binding = icon.bind_repaint(&target);
        assert_eq!(binding.len(), 2);

        anim.force_tick();
        assert_eq!(count.get(), 1);
        binding.unbind();
        assert_eq!(anim.listener_count(), 0);
    }

    #[test]
    fn icon_without_animation_binds_nothing() {
        let icon = Icon::new(&pipeline(), "square", Some(Color::BLACK), None).unwrap();
        let (_, target) = counter();
        let binding = icon.bind_repaint(&target);
        assert!(binding.is_empty());
        assert!(icon.anim().is_none());
        assert_eq!(icon.generator().path(), "square");
    }

    #[test]
    fn dropped_target_is_skipped() {
        let anim = Animation::spin(SpinDirection::Clockwise);
        let icon = Icon::new(&pipeline(), "square", None, Some(Rc::clone(&anim))).unwrap();
        let (count, target) = counter();

        let _binding = icon.bind_repaint(&target);
        drop(target);
        anim.force_tick();
        assert_eq!(count.get(), 0);
    }

    #[test]
    fn repaint_may_request_pixmap() {
        struct Widget {
            icon: Icon,
            painted: RefCell<Vec<Bitmap>>,
        }

        impl RepaintTarget for Widget {
            fn request_repaint(&self) {
                let pixmap = self.icon.pixmap(SizePx::square(16), Mode::Normal).unwrap();
                self.painted.borrow_mut().push(pixmap);
            }
        }

        let anim = Animation::spin(SpinDirection::AntiClockwise);
        let icon = Icon::new(&pipeline(), "square", None, Some(Rc::clone(&anim))).unwrap();
        let widget = Rc::new(Widget {
            icon: icon.clone(),
            painted: RefCell::new(Vec::new()),
        });
        let target: Rc<dyn RepaintTarget> = widget.clone();

        let _binding = icon.bind_repaint(&target);
        anim.force_tick();
        anim.force_tick();

        let painted = widget.painted.borrow();
        assert_eq!(painted.len(), 2);
        assert_ne!(*painted[0], *painted[1]);
    }
}
