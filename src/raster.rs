//! Vector rasterization using resvg/tiny-skia.
//!
//! The pipeline only depends on the [`Rasterizer`] trait; [`ResvgRasterizer`]
//! is the implementation used by default.

use image::{Rgba, RgbaImage};
use resvg::tiny_skia::{Pixmap, Transform};
use resvg::usvg::{Options, Tree};

use crate::error::{Error, Result};
use crate::icon::{Color, SizePx};
use crate::resolve::ImageSource;

/// Paints a vector source into a transparent buffer of exactly `size`.
///
/// `transform` is applied in buffer coordinates, on top of the mapping that
/// stretches the source's view box over the whole buffer.
pub trait Rasterizer {
    fn rasterize(&self, source: &ImageSource, size: SizePx, transform: Transform)
    -> Result<RgbaImage>;
}

/// Rasterizer backed by resvg.
#[derive(Debug, Clone, Copy, Default)]
pub struct ResvgRasterizer;

impl Rasterizer for ResvgRasterizer {
    fn rasterize(
        &self,
        source: &ImageSource,
        size: SizePx,
        transform: Transform,
    ) -> Result<RgbaImage> {
        let empty = || Error::EmptySize {
            width: size.width,
            height: size.height,
        };
        if size.is_empty() {
            return Err(empty());
        }

        let opts = Options::default();
        let tree = Tree::from_str(source.svg(), &opts).map_err(|e| Error::InvalidSvg {
            identity: source.identity().to_string(),
            message: e.to_string(),
        })?;

        // Stretch the view box over the buffer, then apply the caller's transform
        let svg_size = tree.size();
        let fit = Transform::from_scale(
            size.width as f32 / svg_size.width(),
            size.height as f32 / svg_size.height(),
        );

        let mut pixmap = Pixmap::new(size.width, size.height).ok_or_else(empty)?;
        resvg::render(&tree, transform.pre_concat(fit), &mut pixmap.as_mut());

        Ok(pixmap_to_rgba_image(&pixmap))
    }
}

/// Recolors a rendered icon, keeping only its silhouette.
///
/// Every output pixel is `color` with the alpha of the corresponding mask
/// pixel multiplied in.
pub fn apply_color_mask(mask: &RgbaImage, color: Color) -> RgbaImage {
    RgbaImage::from_fn(mask.width(), mask.height(), |x, y| {
        let coverage = mask.get_pixel(x, y)[3] as u32;
        let alpha = (color.a as u32 * coverage + 127) / 255;
        Rgba([color.r, color.g, color.b, alpha as u8])
    })
}

/// Converts a tiny_skia Pixmap to an image::RgbaImage.
fn pixmap_to_rgba_image(pixmap: &Pixmap) -> RgbaImage {
    let mut img = RgbaImage::new(pixmap.width(), pixmap.height());

    for (dst, src) in img.pixels_mut().zip(pixmap.pixels()) {
        // tiny_skia uses premultiplied alpha, we need to unpremultiply
        let (r, g, b, a) = unpremultiply(src.red(), src.green(), src.blue(), src.alpha());
        dst.0 = [r, g, b, a];
    }

    img
}

/// Unpremultiplies a premultiplied alpha pixel.
fn unpremultiply(r: u8, g: u8, b: u8, a: u8) -> (u8, u8, u8, u8) {
    if a == 0 {
        (0, 0, 0, 0)
    } else {
        let a_f = a as f32 / 255.0;
        (
            (r as f32 / a_f).round().min(255.0) as u8,
            (g as f32 / a_f).round().min(255.0) as u8,
            (b as f32 / a_f).round().min(255.0) as u8,
            a,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="64" height="64" viewBox="0 0 64 64"><rect x="8" y="8" width="48" height="48" fill="#ff0000"/></svg>"##;
    const WIDE_SVG: &str = r##"<svg xmlns="http://www.w3.org/2000/svg" width="100" height="50"><rect width="100" height="50" fill="#0000ff"/></svg>"##;

    fn square() -> ImageSource {
        ImageSource::new("test:square", SQUARE_SVG)
    }

    #[test]
    fn renders_at_exact_size() {
        let img = ResvgRasterizer
            .rasterize(&square(), SizePx::new(64, 64), Transform::identity())
            .unwrap();
        assert_eq!(img.dimensions(), (64, 64));
        assert_eq!(img.get_pixel(32, 32).0, [255, 0, 0, 255]);
        assert_eq!(img.get_pixel(2, 2).0, [0, 0, 0, 0]);
    }

    #[test]
    fn stretches_view_box_over_buffer() {
        let wide = ImageSource::new("test:wide", WIDE_SVG);
        let img = ResvgRasterizer
            .rasterize(&wide, SizePx::new(20, 20), Transform::identity())
            .unwrap();
        assert_eq!(img.get_pixel(10, 1)[3], 255);
        assert_eq!(img.get_pixel(10, 18)[3], 255);
    }

    #[test]
    fn transform_applies_to_content() {
        let plain = ResvgRasterizer
            .rasterize(&square(), SizePx::square(64), Transform::identity())
            .unwrap();
        let shrunk = ResvgRasterizer
            .rasterize(
                &square(),
                SizePx::square(64),
                Transform::from_scale(0.5, 0.5),
            )
            .unwrap();
        assert_eq!(plain.get_pixel(40, 40)[3], 255);
        assert_eq!(shrunk.get_pixel(40, 40)[3], 0);
        assert_eq!(shrunk.get_pixel(16, 16)[3], 255);
    }

    #[test]
    fn empty_size_is_an_error() {
        let result = ResvgRasterizer.rasterize(&square(), SizePx::new(0, 8), Transform::identity());
        assert!(matches!(result, Err(Error::EmptySize { width: 0, height: 8 })));
    }

    #[test]
    fn invalid_svg_is_an_error() {
        let broken = ImageSource::new("test:broken", "definitely not svg");
        let result = ResvgRasterizer.rasterize(&broken, SizePx::square(8), Transform::identity());
        assert!(
            matches!(result, Err(Error::InvalidSvg { identity, .. }) if identity == "test:broken")
        );
    }

    #[test]
    fn color_mask_keeps_silhouette() {
        let mut mask = RgbaImage::new(2, 1);
        mask.put_pixel(0, 0, Rgba([255, 0, 0, 255]));
        mask.put_pixel(1, 0, Rgba([0, 0, 0, 0]));

        let tinted = apply_color_mask(&mask, Color::rgb(0, 0, 255));
        assert_eq!(tinted.get_pixel(0, 0).0, [0, 0, 255, 255]);
        assert_eq!(tinted.get_pixel(1, 0)[3], 0);
    }

    #[test]
    fn color_mask_multiplies_alpha() {
        let mask = RgbaImage::from_pixel(1, 1, Rgba([9, 9, 9, 128]));
        let tinted = apply_color_mask(&mask, Color::rgba(10, 20, 30, 200));
        assert_eq!(tinted.get_pixel(0, 0).0, [10, 20, 30, 100]);
    }

    #[test]
    fn unpremultiply_transparent() {
        assert_eq!(unpremultiply(10, 10, 10, 0), (0, 0, 0, 0));
        assert_eq!(unpremultiply(255, 0, 17, 255), (255, 0, 17, 255));
    }
}
