//! Pixmap generation: resolve, transform, rasterize, recolor, cache.

use std::fmt;
use std::rc::Rc;

use resvg::tiny_skia::Transform;
use tracing::debug;

use crate::anim::Animation;
use crate::cache::{Bitmap, CacheKey, PixmapCache};
use crate::error::Result;
use crate::icon::{Color, SizePx};
use crate::raster::{Rasterizer, ResvgRasterizer, apply_color_mask};
use crate::resolve::{ImageResolver, ImageSource, SearchPath};

// ============================================================================
// Pipeline
// ============================================================================

/// The collaborators a generator renders with.
///
/// Cloning is cheap; clones share the resolver, rasterizer, and cache.
#[derive(Clone)]
pub struct Pipeline {
    resolver: Rc<dyn ImageResolver>,
    rasterizer: Rc<dyn Rasterizer>,
    cache: Rc<PixmapCache>,
}

impl Pipeline {
    /// Uses `resolver` with the resvg rasterizer and the shared cache.
    pub fn new(resolver: impl ImageResolver + 'static) -> Self {
        Self {
            resolver: Rc::new(resolver),
            rasterizer: Rc::new(ResvgRasterizer),
            cache: PixmapCache::global(),
        }
    }

    /// Resolves against [`SearchPath::from_env`].
    pub fn from_env() -> Self {
        Self::new(SearchPath::from_env())
    }

    /// Replaces the cache, e.g. with a private one for isolation.
    pub fn with_cache(mut self, cache: Rc<PixmapCache>) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_rasterizer(mut self, rasterizer: impl Rasterizer + 'static) -> Self {
        self.rasterizer = Rc::new(rasterizer);
        self
    }

    pub fn cache(&self) -> &Rc<PixmapCache> {
        &self.cache
    }

    pub fn resolve(&self, name: &str) -> Result<ImageSource> {
        self.resolver.resolve(name)
    }
}

impl fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Pipeline")
            .field("cache_len", &self.cache.len())
            .finish_non_exhaustive()
    }
}

// ============================================================================
// PixmapGenerator
// ============================================================================

/// Renders one icon source at arbitrary sizes, with an optional color
/// override and an optional animation.
///
/// The animation is shared, not owned: the same instance may drive many
/// generators. Changing the color or animation never invalidates pixmaps
/// already cached; it only changes the key of future requests.
#[derive(Debug, Clone)]
pub struct PixmapGenerator {
    pipeline: Pipeline,
    path: String,
    source: ImageSource,
    color: Option<Color>,
    anim: Option<Rc<Animation>>,
}

impl PixmapGenerator {
    /// Resolves `path` and creates a generator with no color or animation.
    pub fn new(pipeline: &Pipeline, path: &str) -> Result<Self> {
        let source = pipeline.resolve(path)?;
        Ok(Self {
            pipeline: pipeline.clone(),
            path: path.to_string(),
            source,
            color: None,
            anim: None,
        })
    }

    pub fn with_color(mut self, color: Option<Color>) -> Self {
        self.color = color;
        self
    }

    pub fn with_anim(mut self, anim: Option<Rc<Animation>>) -> Self {
        self.anim = anim;
        self
    }

    /// The identifier this generator was created or last re-pointed with.
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    /// Re-points the generator. On failure the generator is unchanged.
    pub fn set_path(&mut self, path: &str) -> Result<()> {
        self.source = self.pipeline.resolve(path)?;
        self.path = path.to_string();
        Ok(())
    }

    pub fn color(&self) -> Option<Color> {
        self.color
    }

    pub fn set_color(&mut self, color: Option<Color>) {
        self.color = color;
    }

    pub fn anim(&self) -> Option<&Rc<Animation>> {
        self.anim.as_ref()
    }

    pub fn set_anim(&mut self, anim: Option<Rc<Animation>>) {
        self.anim = anim;
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// The key a request for `size` would use right now.
    pub fn cache_key(&self, size: SizePx) -> CacheKey {
        CacheKey::new(
            self.source.identity(),
            size,
            self.color,
            self.anim.as_ref().map(|anim| anim.key()),
        )
    }

    /// Returns the pixmap for `size` at the animation's current frame.
    ///
    /// 1. Looks up the cache and returns a hit unchanged
    /// 2. Rasterizes the source with the animation transform applied to the
    ///    content, not to the finished bitmap
    /// 3. Recolors through the rendered alpha channel if a color is set
    /// 4. Caches and returns the result
    pub fn pixmap(&self, size: SizePx) -> Result<Bitmap> {
        let key = self.cache_key(size);
        let cache = self.pipeline.cache();

        if let Some(cached) = cache.get(&key) {
            return Ok(cached);
        }

        let transform = self
            .anim
            .as_ref()
            .map(|anim| anim.transform(size))
            .unwrap_or_else(Transform::identity);

        let rendered = self.pipeline.rasterizer.rasterize(&self.source, size, transform)?;
        let image = match self.color {
            Some(color) => apply_color_mask(&rendered, color),
            None => rendered,
        };

        debug!(
            image = self.source.identity(),
            %size,
            animation = ?key.animation(),
            "rendered pixmap"
        );

        let bitmap = Rc::new(image);
        cache.insert(key, Rc::clone(&bitmap));
        Ok(bitmap)
    }
}
