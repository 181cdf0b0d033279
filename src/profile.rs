//! Serializable icon profiles.
//!
//! An [`IconProfile`] describes a [`MultiStateIcon`] in a JSON-friendly
//! form: a table of named animations and one entry per state. States that
//! name the same animation share one instance when the profile is built.
//!
//! # Example
//!
//! ```
//! use animicon::{IconProfile, MemoryResolver, Pipeline};
//!
//! let json = r##"{
//!   "animations": { "spinner": { "kind": "spin", "direction": "anti-clockwise" } },
//!   "states": [
//!     { "mode": "normal", "path": "dots", "color": "#8c7a3d", "anim": "spinner" },
//!     { "mode": "selected", "path": "dots", "color": "#ffffff", "anim": "spinner" }
//!   ]
//! }"##;
//!
//! let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"/>"#;
//! let pipeline = Pipeline::new(MemoryResolver::new().with("dots", svg));
//!
//! let profile = IconProfile::from_json(json).unwrap();
//! let icon = profile.build(&pipeline).unwrap();
//! assert_eq!(icon.state_count(), 2);
//! assert_eq!(icon.anim_count(), 1);
//! ```

use std::collections::{BTreeMap, HashMap};
use std::rc::Rc;

use serde::{Deserialize, Serialize};

use crate::anim::{Animation, Breathe, Combined, Motion, Spin, SpinDirection, WrapPolicy};
use crate::clock::FrameClock;
use crate::error::{Error, Result};
use crate::generator::Pipeline;
use crate::icon::Color;
use crate::multi_state::{Mode, MultiStateIcon, StateOptions};

// ============================================================================
// Configurable Trait
// ============================================================================

/// Trait for types that can be configured from an [`IconProfile`].
pub trait Configurable {
    /// Replaces this instance's configuration with the profile's.
    ///
    /// On error the instance is left unchanged.
    fn apply_profile(&mut self, profile: &IconProfile) -> Result<()>;

    /// Exports the current configuration as a profile.
    fn export_profile(&self) -> IconProfile;
}

// ============================================================================
// Animation Settings
// ============================================================================

/// Explicit inclusive frame range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
pub struct FrameSettings {
    pub min: u32,
    pub max: u32,
}

/// Serializable description of an animation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(tag = "kind", rename_all = "kebab-case")]
pub enum AnimationSettings {
    Still {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        frames: Option<FrameSettings>,
        #[serde(default)]
        wrap: WrapPolicy,
    },
    Spin {
        #[serde(default)]
        direction: SpinDirection,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        frames: Option<FrameSettings>,
        #[serde(default)]
        wrap: WrapPolicy,
    },
    Breathe {
        #[serde(default, skip_serializing_if = "Option::is_none")]
        frames: Option<FrameSettings>,
        #[serde(default)]
        wrap: WrapPolicy,
    },
    /// Parts are composed in order, the first applied first.
    Combine { parts: Vec<AnimationSettings> },
}

impl AnimationSettings {
    /// Builds a new animation on `clock`.
    pub fn build(&self, clock: &Rc<FrameClock>) -> Result<Rc<Animation>> {
        let (motion, frames, wrap) = match self {
            Self::Still { frames, wrap } => (Motion::Still, *frames, *wrap),
            Self::Spin {
                direction,
                frames,
                wrap,
            } => (Motion::Spin(Spin::new(*direction)), *frames, *wrap),
            Self::Breathe { frames, wrap } => (Motion::Breathe(Breathe::new()), *frames, *wrap),
            Self::Combine { parts } => {
                let children = parts
                    .iter()
                    .map(|part| part.build(clock))
                    .collect::<Result<Vec<_>>>()?;
                (Motion::Combined(Combined::new(children)), None, WrapPolicy::Loop)
            }
        };

        let mut builder = Animation::builder(motion).wrap(wrap).clock(Rc::clone(clock));
        if let Some(FrameSettings { min, max }) = frames {
            builder = builder.frames(min, max);
        }
        builder.build()
    }

    /// Describes an existing animation.
    ///
    /// Frame ranges are only written when they differ from the motion's
    /// default.
    pub fn from_animation(anim: &Animation) -> Self {
        let range = anim.range();
        let frames = (range != anim.motion().default_range()).then(|| FrameSettings {
            min: range.min(),
            max: range.max(),
        });
        let wrap = anim.wrap_policy();

        match anim.motion() {
            Motion::Still => Self::Still { frames, wrap },
            Motion::Spin(spin) => Self::Spin {
                direction: spin.direction(),
                frames,
                wrap,
            },
            Motion::Breathe(_) => Self::Breathe { frames, wrap },
            Motion::Combined(combined) => Self::Combine {
                parts: combined
                    .children()
                    .iter()
                    .map(|child| Self::from_animation(child))
                    .collect(),
            },
        }
    }
}

// ============================================================================
// State Settings
// ============================================================================

/// Serializable description of one icon state.
///
/// Values are explicit: a missing color or animation means none, not
/// inherited from the normal state.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct StateSettings {
    #[serde(default)]
    pub mode: Mode,

    /// Logical icon identifier passed to the resolver.
    pub path: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[cfg_attr(feature = "jsonschema", schemars(with = "Option<String>"))]
    pub color: Option<Color>,

    /// Name of an entry in [`IconProfile::animations`].
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub anim: Option<String>,
}

// ============================================================================
// IconProfile
// ============================================================================

/// A serializable description of a multi-state icon.
///
/// # JSON Format
///
/// ```json
/// {
///   "animations": {
///     "spinner": { "kind": "spin", "direction": "clockwise", "wrap": "loop" }
///   },
///   "states": [
///     { "mode": "normal", "path": "spinners:dots", "color": "#9c8a50", "anim": "spinner" },
///     { "mode": "active", "path": "spinners:dots", "anim": "spinner" }
///   ]
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[cfg_attr(feature = "jsonschema", derive(schemars::JsonSchema))]
#[serde(rename_all = "camelCase")]
pub struct IconProfile {
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub animations: BTreeMap<String, AnimationSettings>,

    #[serde(default)]
    pub states: Vec<StateSettings>,
}

impl IconProfile {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a named animation.
    pub fn with_animation(mut self, name: impl Into<String>, settings: AnimationSettings) -> Self {
        self.animations.insert(name.into(), settings);
        self
    }

    /// Appends a state.
    pub fn with_state(mut self, state: StateSettings) -> Self {
        self.states.push(state);
        self
    }

    /// Builds the icon with animations on the shared clock.
    pub fn build(&self, pipeline: &Pipeline) -> Result<MultiStateIcon> {
        self.build_with_clock(pipeline, &FrameClock::instance())
    }

    /// Builds the icon with animations on `clock`.
    ///
    /// The first normal-mode state becomes the normal state; later states
    /// for the same mode replace earlier ones.
    pub fn build_with_clock(
        &self,
        pipeline: &Pipeline,
        clock: &Rc<FrameClock>,
    ) -> Result<MultiStateIcon> {
        let animations = self
            .animations
            .iter()
            .map(|(name, settings)| settings.build(clock).map(|anim| (name.as_str(), anim)))
            .collect::<Result<HashMap<_, _>>>()?;

        let lookup = |state: &StateSettings| -> Result<Option<Rc<Animation>>> {
            match &state.anim {
                Some(name) => animations
                    .get(name.as_str())
                    .cloned()
                    .map(Some)
                    .ok_or_else(|| Error::UnknownAnimation(name.clone())),
                None => Ok(None),
            }
        };

        let normal_index = self
            .states
            .iter()
            .position(|state| state.mode == Mode::Normal)
            .ok_or(Error::MissingDefaultState)?;
        let normal = &self.states[normal_index];

        let mut icon = MultiStateIcon::new(pipeline, &normal.path, normal.color, lookup(normal)?)?;

        for (index, state) in self.states.iter().enumerate() {
            if index == normal_index {
                continue;
            }
            let mut options = match state.color {
                Some(color) => StateOptions::inherit().color(color),
                None => StateOptions::inherit().no_color(),
            };
            options = match lookup(state)? {
                Some(anim) => options.anim(anim),
                None => options.no_anim(),
            };
            icon.add_state(&state.path, state.mode, options)?;
        }

        Ok(icon)
    }

    /// Serializes the profile to a JSON string.
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Serializes the profile to a pretty-printed JSON string.
    pub fn to_json_pretty(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Deserializes a profile from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

impl Configurable for MultiStateIcon {
    fn apply_profile(&mut self, profile: &IconProfile) -> Result<()> {
        *self = profile.build(self.pipeline())?;
        Ok(())
    }

    /// Shared animation instances are exported once, named `anim-0`,
    /// `anim-1`, ... in mode order.
    fn export_profile(&self) -> IconProfile {
        let mut profile = IconProfile::new();
        let mut names: HashMap<*const Animation, String> = HashMap::new();

        for anim in self.animations() {
            let name = format!("anim-{}", names.len());
            profile
                .animations
                .insert(name.clone(), AnimationSettings::from_animation(&anim));
            names.insert(Rc::as_ptr(&anim), name);
        }

        for mode in self.modes() {
            let state = self.state(mode);
            profile.states.push(StateSettings {
                mode,
                path: state.path().to_string(),
                color: state.color(),
                anim: state
                    .anim()
                    .and_then(|anim| names.get(&Rc::as_ptr(anim)).cloned()),
            });
        }

        profile
    }
}

// ============================================================================
// Tests
// ============================================================================
