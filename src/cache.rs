//! Process-wide memoization of rendered pixmaps.
//!
//! Entries are keyed by every input that affects the rendered pixels, so the
//! cache never needs invalidation: changing a generator's color or animation
//! simply changes the key its next request computes. The cache is unbounded
//! for the lifetime of its owner. Distinct keys are finite in practice (one
//! per size, frame, and color actually requested), and bounding it would
//! turn cache hits into re-renders or dropped frames. Call
//! [`PixmapCache::clear`] explicitly to free memory.

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::rc::Rc;

use image::RgbaImage;
use tracing::trace;

use crate::anim::AnimationKey;
use crate::icon::{Color, SizePx};

thread_local! {
    static GLOBAL_CACHE: Rc<PixmapCache> = Rc::new(PixmapCache::new());
}

/// A rendered icon. Cache hits hand out the same allocation.
pub type Bitmap = Rc<RgbaImage>;

// ============================================================================
// CacheKey
// ============================================================================

/// Key for cached pixmaps.
///
/// Combines the resolved image identity, the output size, the color
/// override, and the animation's render identity at its current frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CacheKey {
    image: String,
    size: SizePx,
    color: Option<Color>,
    animation: Option<AnimationKey>,
}

impl CacheKey {
    pub fn new(
        image: impl Into<String>,
        size: SizePx,
        color: Option<Color>,
        animation: Option<AnimationKey>,
    ) -> Self {
        Self {
            image: image.into(),
            size,
            color,
            animation,
        }
    }

    pub fn image(&self) -> &str {
        &self.image
    }

    pub fn size(&self) -> SizePx {
        self.size
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn animation(&self) -> Option<&AnimationKey> {
        self.animation.as_ref()
    }
}

// ============================================================================
// PixmapCache
// ============================================================================

/// Shared map from [`CacheKey`] to rendered [`Bitmap`].
///
/// Borrows are held only for the duration of a lookup or insert, so the
/// cache may be used from inside tick and repaint callbacks.
#[derive(Debug, Default)]
pub struct PixmapCache {
    entries: RefCell<HashMap<CacheKey, Bitmap>>,
    hits: Cell<u64>,
    misses: Cell<u64>,
}

impl PixmapCache {
    /// Creates an empty, private cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the shared cache for the current UI thread.
    ///
    /// Created on first access and dropped when the thread exits.
    pub fn global() -> Rc<PixmapCache> {
        GLOBAL_CACHE.with(Rc::clone)
    }

    /// Looks up a pixmap, recording a hit or miss.
    pub fn get(&self, key: &CacheKey) -> Option<Bitmap> {
        let found = self.entries.borrow().get(key).cloned();
        match found {
            Some(_) => {
                self.hits.set(self.hits.get() + 1);
                trace!(image = key.image(), size = %key.size(), "pixmap cache hit");
            }
            None => self.misses.set(self.misses.get() + 1),
        }
        found
    }

    /// Stores a pixmap, replacing any previous entry for `key`.
    pub fn insert(&self, key: CacheKey, bitmap: Bitmap) {
        self.entries.borrow_mut().insert(key, bitmap);
    }

    pub fn contains(&self, key: &CacheKey) -> bool {
        self.entries.borrow().contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.borrow().is_empty()
    }

    pub fn hits(&self) -> u64 {
        self.hits.get()
    }

    pub fn misses(&self) -> u64 {
        self.misses.get()
    }

    /// Drops every entry. Never called by the pipeline itself.
    pub fn clear(&self) {
        self.entries.borrow_mut().clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::anim::SpinDirection;

    fn key(size: u32, frame: Option<u32>) -> CacheKey {
        CacheKey::new(
            "memory:square",
            SizePx::square(size),
            None,
            frame.map(|frame| AnimationKey::Spin {
                direction: SpinDirection::Clockwise,
                frame,
            }),
        )
    }

    #[test]
    fn hit_returns_same_bitmap() {
        let cache = PixmapCache::new();
        let bitmap: Bitmap = Rc::new(RgbaImage::new(4, 4));
        cache.insert(key(4, None), Rc::clone(&bitmap));

        let found = cache.get(&key(4, None)).unwrap();
        assert!(Rc::ptr_eq(&found, &bitmap));
        assert_eq!(cache.hits(), 1);
        assert_eq!(cache.misses(), 0);
    }

    #[test]
    fn keys_distinguish_every_input() {
        let base = key(4, Some(0));
        assert_ne!(base, key(8, Some(0)));
        assert_ne!(base, key(4, Some(1)));
        assert_ne!(base, key(4, None));
        assert_ne!(
            base,
            CacheKey::new("memory:other", SizePx::square(4), None, base.animation().cloned())
        );
        assert_ne!(
            base,
            CacheKey::new(
                base.image(),
                base.size(),
                Some(Color::WHITE),
                base.animation().cloned()
            )
        );
        assert_ne!(
            base,
            CacheKey::new(
                base.image(),
                base.size(),
                None,
                Some(AnimationKey::Spin {
                    direction: SpinDirection::AntiClockwise,
                    frame: 0
                })
            )
        );
    }

    #[test]
    fn miss_is_counted() {
        let cache = PixmapCache::new();
        assert!(cache.get(&key(4, None)).is_none());
        assert_eq!(cache.misses(), 1);
        assert!(cache.is_empty());
    }

    #[test]
    fn grows_without_eviction() {
        let cache = PixmapCache::new();
        for frame in 0..200 {
            cache.insert(key(16, Some(frame)), Rc::new(RgbaImage::new(1, 1)));
        }
        assert_eq!(cache.len(), 200);
        assert!(cache.contains(&key(16, Some(0))));

        cache.clear();
        assert!(cache.is_empty());
    }
}
