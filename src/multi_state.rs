//! Icons that render differently per interaction state.

use std::collections::{BTreeMap, HashSet};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::anim::Animation;
use crate::cache::Bitmap;
use crate::error::Result;
use crate::generator::{Pipeline, PixmapGenerator};
use crate::icon::{Color, SizePx};

/// Interaction state an icon is rendered for.
///
/// The host decides which mode is current; the icon never switches modes
/// by itself. [`Mode::Normal`] is the default state every icon has.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize,
)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "kebab-case")]
pub enum Mode {
    #[default]
    Normal,
    Active,
    Selected,
    Disabled,
}

/// Color and animation choices for a state added with
/// [`MultiStateIcon::add_state`].
///
/// Anything left unspecified is copied from the normal state when the state
/// is added.
#[derive(Debug, Clone, Default)]
pub struct StateOptions {
    color: Option<Option<Color>>,
    anim: Option<Option<Rc<Animation>>>,
}

impl StateOptions {
    /// Inherit both color and animation.
    pub fn inherit() -> Self {
        Self::default()
    }

    pub fn color(mut self, color: Color) -> Self {
        self.color = Some(Some(color));
        self
    }

    /// Render with the source's own colors.
    pub fn no_color(mut self) -> Self {
        self.color = Some(None);
        self
    }

    pub fn anim(mut self, anim: Rc<Animation>) -> Self {
        self.anim = Some(Some(anim));
        self
    }

    /// Render without animation.
    pub fn no_anim(mut self) -> Self {
        self.anim = Some(None);
        self
    }
}

/// A set of pixmap generators, one per [`Mode`].
///
/// Modes without a registered state fall back to the normal state.
#[derive(Debug, Clone)]
pub struct MultiStateIcon {
    pipeline: Pipeline,
    normal: PixmapGenerator,
    states: BTreeMap<Mode, PixmapGenerator>,
}

impl MultiStateIcon {
    /// Creates an icon whose normal state renders `path`.
    pub fn new(
        pipeline: &Pipeline,
        path: &str,
        color: Option<Color>,
        anim: Option<Rc<Animation>>,
    ) -> Result<Self> {
        let normal = PixmapGenerator::new(pipeline, path)?
            .with_color(color)
            .with_anim(anim);
        Ok(Self::from_generator(normal))
    }

    /// Wraps an existing generator as the normal state.
    pub fn from_generator(normal: PixmapGenerator) -> Self {
        Self {
            pipeline: normal.pipeline().clone(),
            normal,
            states: BTreeMap::new(),
        }
    }

    /// Registers or replaces the state for `mode`.
    ///
    /// Unspecified options take the normal state's current values. The copy
    /// is a snapshot: later changes to the normal state do not propagate.
    /// Adding [`Mode::Normal`] replaces the normal state itself.
    pub fn add_state(&mut self, path: &str, mode: Mode, options: StateOptions) -> Result<()> {
        let color = options.color.unwrap_or_else(|| self.normal.color());
        let anim = options.anim.unwrap_or_else(|| self.normal.anim().cloned());

        let generator = PixmapGenerator::new(&self.pipeline, path)?
            .with_color(color)
            .with_anim(anim);

        match mode {
            Mode::Normal => self.normal = generator,
            _ => {
                self.states.insert(mode, generator);
            }
        }
        Ok(())
    }

    /// Removes a non-normal state. The normal state cannot be removed.
    pub fn remove_state(&mut self, mode: Mode) -> Option<PixmapGenerator> {
        self.states.remove(&mode)
    }

    pub fn has_state(&self, mode: Mode) -> bool {
        mode == Mode::Normal || self.states.contains_key(&mode)
    }

    /// Number of registered states, at least one.
    pub fn state_count(&self) -> usize {
        1 + self.states.len()
    }

    /// Registered modes in order, normal first.
    pub fn modes(&self) -> impl Iterator<Item = Mode> + '_ {
        std::iter::once(Mode::Normal).chain(self.states.keys().copied())
    }

    /// The generator used for `mode`, falling back to the normal state.
    pub fn state(&self, mode: Mode) -> &PixmapGenerator {
        self.states.get(&mode).unwrap_or(&self.normal)
    }

    /// Mutable access to a registered state.
    pub fn state_mut(&mut self, mode: Mode) -> Option<&mut PixmapGenerator> {
        match mode {
            Mode::Normal => Some(&mut self.normal),
            _ => self.states.get_mut(&mode),
        }
    }

    pub fn color(&self, mode: Mode) -> Option<Color> {
        self.state(mode).color()
    }

    pub fn anim(&self, mode: Mode) -> Option<&Rc<Animation>> {
        self.state(mode).anim()
    }

    pub fn pixmap(&self, size: SizePx, mode: Mode) -> Result<Bitmap> {
        self.state(mode).pixmap(size)
    }

    /// Distinct animation instances across all states.
    pub fn animations(&self) -> Vec<Rc<Animation>> {
        let mut seen = HashSet::new();
        self.modes()
            .filter_map(|mode| self.state(mode).anim())
            .filter(|anim| seen.insert(Rc::as_ptr(anim)))
            .cloned()
            .collect()
    }

    /// Number of distinct animation instances across all states.
    ///
    /// States sharing one instance count once.
    pub fn anim_count(&self) -> usize {
        self.animations().len()
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::SpinDirection;
    use crate::cache::PixmapCache;
    use crate::resolve::MemoryResolver;

    const SQUARE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="16"><rect x="2" y="2" width="12" height="12"/></svg>"##;
    const DOT_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="16" height="16"><circle cx="8" cy="8" r="3"/></svg>"##;

    fn pipeline() -> Pipeline {
        let resolver = MemoryResolver::new()
            .with("square", SQUARE_SVG)
            .with("dot", DOT_SVG);
        Pipeline::new(resolver).with_cache(Rc::new(PixmapCache::new()))
    }

    fn icon() -> (MultiStateIcon, Rc<Animation>) {
        let anim = Animation::spin(SpinDirection::Clockwise);
        let icon = MultiStateIcon::new(
            &pipeline(),
            "square",
            Some(Color::rgb(200, 0, 0)),
            Some(Rc::clone(&anim)),
        )
        .unwrap();
        (icon, anim)
    }

    #[test]
    fn new_icon_has_only_normal_state() {
        let (icon, _) = icon();
        assert_eq!(icon.state_count(), 1);
        assert!(icon.has_state(Mode::Normal));
        assert!(!icon.has_state(Mode::Active));
        assert_eq!(icon.modes().collect::<Vec<_>>(), vec![Mode::Normal]);
    }

    #[test]
    fn added_state_inherits_snapshot() {
        let (mut icon, anim) = icon();
        icon.add_state("dot", Mode::Selected, StateOptions::inherit()).unwrap();

        assert_eq!(icon.color(Mode::Selected), icon.color(Mode::Normal));
        assert!(Rc::ptr_eq(icon.anim(Mode::Selected).unwrap(), &anim));

        icon.state_mut(Mode::Normal)
            .unwrap()
            .set_color(Some(Color::WHITE));
        assert_eq!(icon.color(Mode::Normal), Some(Color::WHITE));
        assert_eq!(icon.color(Mode::Selected), Some(Color::rgb(200, 0, 0)));
    }

    #[test]
    fn explicit_options_override_inheritance() {
        let (mut icon, _) = icon();
        let other = Animation::breathe();
        icon.add_state(
            "dot",
            Mode::Active,
            StateOptions::inherit().color(Color::BLACK).anim(Rc::clone(&other)),
        )
        .unwrap();
        icon.add_state(
            "dot",
            Mode::Disabled,
            StateOptions::inherit().no_color().no_anim(),
        )
        .unwrap();

        assert_eq!(icon.color(Mode::Active), Some(Color::BLACK));
        assert!(Rc::ptr_eq(icon.anim(Mode::Active).unwrap(), &other));
        assert_eq!(icon.color(Mode::Disabled), None);
        assert!(icon.anim(Mode::Disabled).is_none());
    }

    #[test]
    fn unregistered_modes_fall_back_to_normal() {
        let (icon, anim) = icon();
        assert_eq!(icon.color(Mode::Active), Some(Color::rgb(200, 0, 0)));
        assert!(Rc::ptr_eq(icon.anim(Mode::Disabled).unwrap(), &anim));

        let size = SizePx::square(16);
        let normal = icon.pixmap(size, Mode::Normal).unwrap();
        let active = icon.pixmap(size, Mode::Active).unwrap();
        assert!(Rc::ptr_eq(&normal, &active));
    }

    #[test]
    fn states_render_their_own_source() {
        let (mut icon, _) = icon();
        icon.add_state("dot", Mode::Selected, StateOptions::inherit()).unwrap();

        let size = SizePx::square(16);
        let normal = icon.pixmap(size, Mode::Normal).unwrap();
        let selected = icon.pixmap(size, Mode::Selected).unwrap();
        assert_ne!(*normal, *selected);
    }

    #[test]
    fn anim_count_dedups_shared_instances() {
        let (mut icon, _) = icon();
        assert_eq!(icon.anim_count(), 1);

        icon.add_state("dot", Mode::Active, StateOptions::inherit()).unwrap();
        assert_eq!(icon.anim_count(), 1);

        icon.add_state(
            "dot",
            Mode::Selected,
            StateOptions::inherit().anim(Animation::breathe()),
        )
        .unwrap();
        assert_eq!(icon.anim_count(), 2);

        icon.add_state("dot", Mode::Disabled, StateOptions::inherit().no_anim()).unwrap();
        assert_eq!(icon.anim_count(), 2);
        assert_eq!(icon.state_count(), 4);
    }

    #[test]
    fn adding_existing_mode_replaces_it() {
        let (mut icon, _) = icon();
        icon.add_state("dot", Mode::Active, StateOptions::inherit()).unwrap();
        icon.add_state("square", Mode::Active, StateOptions::inherit()).unwrap();
        assert_eq!(icon.state_count(), 2);
        assert_eq!(icon.state(Mode::Active).path(), "square");

        icon.add_state("dot", Mode::Normal, StateOptions::inherit()).unwrap();
        assert_eq!(icon.state_count(), 2);
        assert_eq!(icon.state(Mode::Normal).path(), "dot");
        assert_eq!(icon.color(Mode::Normal), Some(Color::rgb(200, 0, 0)));
    }

    #[test]
    fn failed_add_state_leaves_icon_unchanged() {
        let (mut icon, _) = icon();
        assert!(icon
            .add_state("missing", Mode::Active, StateOptions::inherit())
            .is_err());
        assert_eq!(icon.state_count(), 1);
        assert!(icon.pipeline().cache().is_empty());
    }

    #[test]
    fn remove_state_keeps_normal() {
        let (mut icon, _) = icon();
        icon.add_state("dot", Mode::Active, StateOptions::inherit()).unwrap();
        assert!(icon.remove_state(Mode::Active).is_some());
        assert!(icon.remove_state(Mode::Normal).is_none());
        assert_eq!(icon.state_count(), 1);
    }
}
