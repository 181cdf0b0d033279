//! animicon: Animated, recolorable vector icons
//!
//! This crate renders SVG icons to bitmaps on demand, optionally recolored
//! and transformed by a frame-stepped animation, and memoizes every rendered
//! bitmap in a shared cache.
//!
//! # Example
//!
//! ```
//! use std::rc::Rc;
//! use animicon::{Animation, Color, MemoryResolver, Pipeline, PixmapGenerator, SizePx, SpinDirection};
//!
//! let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="24" height="24"><rect x="4" y="4" width="16" height="16"/></svg>"#;
//! let pipeline = Pipeline::new(MemoryResolver::new().with("square", svg));
//!
//! let spin = Animation::spin(SpinDirection::Clockwise);
//! let generator = PixmapGenerator::new(&pipeline, "square")
//!     .unwrap()
//!     .with_color(Some(Color::rgb(40, 120, 200)))
//!     .with_anim(Some(Rc::clone(&spin)));
//!
//! let first = generator.pixmap(SizePx::square(32)).unwrap();
//! assert!(Rc::ptr_eq(&first, &generator.pixmap(SizePx::square(32)).unwrap()));
//!
//! // The host's timer drives `FrameClock::poll`; here we step by hand
//! spin.force_tick();
//! let second = generator.pixmap(SizePx::square(32)).unwrap();
//! assert!(!Rc::ptr_eq(&first, &second));
//! ```
//!
//! # Multi-state icons
//!
//! A [`MultiStateIcon`] holds one generator per interaction [`Mode`], each
//! inheriting color and animation from the normal state unless overridden.
//! [`Icon::bind_repaint`] connects a widget to every animation the icon uses.
//!
//! # Serializable Profiles
//!
//! Icons can be described and rebuilt through [`IconProfile`] with the
//! [`Configurable`] trait:
//!
//! ```
//! use animicon::{Configurable, MemoryResolver, Mode, MultiStateIcon, Pipeline, StateOptions};
//!
//! let svg = r#"<svg xmlns="http://www.w3.org/2000/svg" width="8" height="8"/>"#;
//! let pipeline = Pipeline::new(MemoryResolver::new().with("dots", svg));
//!
//! let mut icon = MultiStateIcon::new(&pipeline, "dots", None, None).unwrap();
//! icon.add_state("dots", Mode::Disabled, StateOptions::inherit()).unwrap();
//!
//! let json = icon.export_profile().to_json().unwrap();
//! assert!(json.contains("\"disabled\""));
//! ```

mod anim;
mod cache;
mod clock;
mod error;
mod generator;
mod host;
mod icon;
mod multi_state;
mod profile;
mod raster;
mod resolve;

pub use anim::{
    Animation, AnimationBuilder, AnimationKey, Breathe, Combined, FrameRange, ListenerId, Motion,
    Spin, SpinDirection, WrapPolicy,
};
pub use cache::{Bitmap, CacheKey, PixmapCache};
pub use clock::{FrameClock, SubscriptionId};
pub use error::{Error, Result};
pub use generator::{Pipeline, PixmapGenerator};
pub use host::{Icon, RepaintBinding, RepaintTarget};
pub use icon::{Color, SizePx};
pub use multi_state::{Mode, MultiStateIcon, StateOptions};
pub use profile::{AnimationSettings, Configurable, FrameSettings, IconProfile, StateSettings};
pub use raster::{Rasterizer, ResvgRasterizer, apply_color_mask};
pub use resolve::{ImageResolver, ImageSource, MemoryResolver, SearchPath};

pub use resvg::tiny_skia::Transform;
