//! Translucent attribution label stamped onto photos before publication.
//!
//! The label is rendered once into a coverage mask when the watermarker is
//! built; applying it is decode → overlay → composite → JPEG encode.

use std::io::Cursor;

use ab_glyph::{point, Font, FontVec, OutlinedGlyph, PxScale, ScaleFont};
use font8x8::{UnicodeFonts, BASIC_FONTS, LATIN_FONTS};
use image::{imageops, DynamicImage, ImageFormat, Rgba, RgbaImage};
use tracing::{info, warn};

use crate::{config::WatermarkConfig, errors::Error, Result};

/// Overlay alpha for fully covered label pixels (white at ~50%).
const LABEL_ALPHA: f32 = 128.0;

/// Largest accepted label font size, in pixels.
pub const MAX_FONT_SIZE: f32 = 512.0;

/// Upper bound on the rendered label mask; larger labels are skipped.
const MAX_LABEL_PIXELS: usize = 1 << 24;

pub struct Watermarker {
    label: Option<LabelMask>,
    margin: u32,
    fallback_font: bool,
}

impl Watermarker {
    /// Build from config. An unreadable or invalid font file falls back to the
    /// built-in bitmap face.
    pub fn load(cfg: &WatermarkConfig) -> Self {
        match load_font(cfg) {
            Ok(font) => {
                info!(font = %cfg.font_path.display(), "watermark font loaded");
                Self {
                    label: render_truetype(
                        &font,
                        PxScale::from(bounded_font_size(cfg.font_size)),
                        &cfg.text,
                    ),
                    margin: cfg.margin,
                    fallback_font: false,
                }
            }
            Err(e) => {
                warn!(
                    font = %cfg.font_path.display(),
                    error = %e,
                    "watermark font unavailable; using built-in bitmap font"
                );
                Self::with_bitmap_font(&cfg.text, cfg.font_size, cfg.margin)
            }
        }
    }

    pub fn with_bitmap_font(text: &str, font_size: f32, margin: u32) -> Self {
        let scale = ((bounded_font_size(font_size) / 8.0).round() as u32).max(1);
        Self {
            label: render_bitmap(text, scale),
            margin,
            fallback_font: true,
        }
    }

    pub fn uses_fallback_font(&self) -> bool {
        self.fallback_font
    }

    /// Stamp the label bottom-right and re-encode as JPEG.
    pub fn try_apply(&self, bytes: &[u8]) -> Result<Vec<u8>> {
        let mut base = image::load_from_memory(bytes)?.to_rgba8();

        if let Some(label) = &self.label {
            let (width, height) = base.dimensions();
            let mut overlay = RgbaImage::new(width, height);
            let left = i64::from(width) - i64::from(self.margin) - i64::from(label.width);
            let top = i64::from(height) - i64::from(self.margin) - i64::from(label.height);
            label.paint(&mut overlay, left, top);
            imageops::overlay(&mut base, &overlay, 0, 0);
        }

        let rgb = DynamicImage::ImageRgba8(base).to_rgb8();
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgb8(rgb).write_to(&mut out, ImageFormat::Jpeg)?;
        Ok(out.into_inner())
    }

    /// Best-effort variant: any failure hands back the original bytes.
    pub fn apply_or_original(&self, bytes: Vec<u8>) -> Vec<u8> {
        match self.try_apply(&bytes) {
            Ok(out) => out,
            Err(e) => {
                warn!(error = %e, "watermark failed; publishing original image");
                bytes
            }
        }
    }
}

fn bounded_font_size(size: f32) -> f32 {
    if size.is_nan() {
        1.0
    } else {
        size.clamp(1.0, MAX_FONT_SIZE)
    }
}

fn load_font(cfg: &WatermarkConfig) -> Result<FontVec> {
    let bytes = std::fs::read(&cfg.font_path)?;
    FontVec::try_from_vec(bytes)
        .map_err(|e| Error::Config(format!("invalid font {}: {e}", cfg.font_path.display())))
}

/// Per-pixel label coverage in `[0, 1]`, cropped to the ink bounding box.
#[derive(Clone, Debug)]
struct LabelMask {
    width: u32,
    height: u32,
    coverage: Vec<f32>,
}

impl LabelMask {
    /// `None` when the mask would exceed `MAX_LABEL_PIXELS`.
    fn new(width: u32, height: u32) -> Option<Self> {
        let len = (width as usize)
            .checked_mul(height as usize)
            .filter(|&n| n <= MAX_LABEL_PIXELS)?;
        Some(Self {
            width,
            height,
            coverage: vec![0.0; len],
        })
    }

    fn at(&self, x: u32, y: u32) -> f32 {
        self.coverage[(y * self.width + x) as usize]
    }

    fn cover(&mut self, x: u32, y: u32, c: f32) {
        if x >= self.width || y >= self.height {
            return;
        }
        let cell = &mut self.coverage[(y * self.width + x) as usize];
        *cell = cell.max(c.clamp(0.0, 1.0));
    }

    /// Crop to the inked area; `None` when nothing was drawn.
    fn trimmed(self) -> Option<Self> {
        let mut min = (u32::MAX, u32::MAX);
        let mut max = (0u32, 0u32);
        let mut any = false;
        for y in 0..self.height {
            for x in 0..self.width {
                if self.at(x, y) > 0.0 {
                    any = true;
                    min = (min.0.min(x), min.1.min(y));
                    max = (max.0.max(x), max.1.max(y));
                }
            }
        }
        if !any {
            return None;
        }

        let mut out = Self::new(max.0 - min.0 + 1, max.1 - min.1 + 1)?;
        for y in 0..out.height {
            for x in 0..out.width {
                out.cover(x, y, self.at(min.0 + x, min.1 + y));
            }
        }
        Some(out)
    }

    /// Paint translucent white onto `overlay` with the mask's top-left at (`left`, `top`).
    /// Pixels outside the overlay are clipped.
    fn paint(&self, overlay: &mut RgbaImage, left: i64, top: i64) {
        let (width, height) = overlay.dimensions();
        for my in 0..self.height {
            for mx in 0..self.width {
                let c = self.at(mx, my);
                if c <= 0.0 {
                    continue;
                }
                let x = left + i64::from(mx);
                let y = top + i64::from(my);
                if x < 0 || y < 0 || x >= i64::from(width) || y >= i64::from(height) {
                    continue;
                }
                let alpha = (LABEL_ALPHA * c).round() as u8;
                overlay.put_pixel(x as u32, y as u32, Rgba([255, 255, 255, alpha]));
            }
        }
    }
}

fn render_truetype(font: &FontVec, scale: PxScale, text: &str) -> Option<LabelMask> {
    let scaled = font.as_scaled(scale);
    let mut caret = 0.0f32;
    let mut last = None;
    let mut outlines: Vec<OutlinedGlyph> = Vec::new();

    for c in text.chars() {
        let id = scaled.glyph_id(c);
        if let Some(prev) = last {
            caret += scaled.kern(prev, id);
        }
        let glyph = id.with_scale_and_position(scale, point(caret, scaled.ascent()));
        caret += scaled.h_advance(id);
        last = Some(id);
        if let Some(outlined) = font.outline_glyph(glyph) {
            outlines.push(outlined);
        }
    }

    let first = outlines.first()?.px_bounds();
    let (mut min, mut max) = (first.min, first.max);
    for g in &outlines {
        let b = g.px_bounds();
        min.x = min.x.min(b.min.x);
        min.y = min.y.min(b.min.y);
        max.x = max.x.max(b.max.x);
        max.y = max.y.max(b.max.y);
    }

    let mut mask = LabelMask::new(
        ((max.x - min.x).ceil() as u32).saturating_add(1),
        ((max.y - min.y).ceil() as u32).saturating_add(1),
    )?;
    for g in &outlines {
        let b = g.px_bounds();
        let ox = (b.min.x - min.x).round() as u32;
        let oy = (b.min.y - min.y).round() as u32;
        g.draw(|x, y, c| mask.cover(ox + x, oy + y, c));
    }
    mask.trimmed()
}

/// 8x8 bitmap glyphs scaled up by an integer factor. Unknown characters render blank.
fn render_bitmap(text: &str, scale: u32) -> Option<LabelMask> {
    let glyphs: Vec<[u8; 8]> = text
        .chars()
        .map(|c| BASIC_FONTS.get(c).or_else(|| LATIN_FONTS.get(c)).unwrap_or([0; 8]))
        .collect();
    if glyphs.is_empty() {
        return None;
    }

    let cell = 8 * scale;
    let width = u32::try_from(glyphs.len()).ok()?.checked_mul(cell)?;
    let mut mask = LabelMask::new(width, cell)?;
    for (i, rows) in glyphs.iter().enumerate() {
        let gx = i as u32 * cell;
        for (row, bits) in rows.iter().enumerate() {
            for col in 0..8u32 {
                if bits & (1 << col) == 0 {
                    continue;
                }
                for dy in 0..scale {
                    for dx in 0..scale {
                        mask.cover(gx + col * scale + dx, row as u32 * scale + dy, 1.0);
                    }
                }
            }
        }
    }
    mask.trimmed()
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use image::{GenericImageView, Pixel, Rgb};

    use super::*;

    fn solid_png(width: u32, height: u32, shade: u8) -> Vec<u8> {
        let img = RgbaImage::from_pixel(width, height, Rgba([shade, shade, shade, 255]));
        let mut out = Cursor::new(Vec::new());
        DynamicImage::ImageRgba8(img)
            .write_to(&mut out, ImageFormat::Png)
            .unwrap();
        out.into_inner()
    }

    fn luma(p: Rgb<u8>) -> u8 {
        p.to_luma().0[0]
    }

    #[test]
    fn corrupt_bytes_come_back_unchanged() {
        let wm = Watermarker::with_bitmap_font("@deals ©", 16.0, 20);
        let junk = b"definitely not an image".to_vec();
        assert!(wm.try_apply(&junk).is_err());
        assert_eq!(wm.apply_or_original(junk.clone()), junk);
        assert_eq!(wm.apply_or_original(Vec::new()), Vec::<u8>::new());
    }

    #[test]
    fn stamps_label_in_bottom_right_corner() {
        let wm = Watermarker::with_bitmap_font("@deals ©", 16.0, 20);
        let out = wm.try_apply(&solid_png(240, 120, 40)).unwrap();

        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!(img.dimensions(), (240, 120));
        let rgb = img.to_rgb8();

        let corner_max = (90..220)
            .flat_map(|x| (84..100).map(move |y| (x, y)))
            .map(|(x, y)| luma(*rgb.get_pixel(x, y)))
            .max()
            .unwrap();
        assert!(corner_max > 100, "expected a light label, max luma {corner_max}");

        let clean_max = (0..60)
            .flat_map(|x| (0..60).map(move |y| (x, y)))
            .map(|(x, y)| luma(*rgb.get_pixel(x, y)))
            .max()
            .unwrap();
        assert!(clean_max < 70, "top-left should be untouched, max luma {clean_max}");

        // Nothing inside the margin.
        let margin_max = (0..240)
            .flat_map(|x| (105..120).map(move |y| (x, y)))
            .map(|(x, y)| luma(*rgb.get_pixel(x, y)))
            .max()
            .unwrap();
        assert!(margin_max < 70, "bottom margin should be untouched, max luma {margin_max}");
    }

    #[test]
    fn label_larger_than_image_is_clipped() {
        let wm = Watermarker::with_bitmap_font("a very long attribution label", 30.0, 20);
        let out = wm.try_apply(&solid_png(12, 12, 10)).unwrap();
        let img = image::load_from_memory(&out).unwrap();
        assert_eq!(img.dimensions(), (12, 12));
    }

    #[test]
    fn absurd_font_sizes_are_bounded() {
        for size in [1e9, f32::INFINITY, f32::NAN, -5.0] {
            let wm = Watermarker::with_bitmap_font("@deals ©", size, 20);
            assert!(wm.try_apply(&solid_png(64, 64, 40)).is_ok(), "size {size}");
        }
        let big = Watermarker::with_bitmap_font("@deals ©", 1e9, 20);
        let label = big.label.as_ref().unwrap();
        assert!(label.height <= MAX_FONT_SIZE as u32);
    }

    #[test]
    fn oversized_label_is_skipped() {
        let text = "x".repeat(20_000);
        let wm = Watermarker::with_bitmap_font(&text, MAX_FONT_SIZE, 20);
        assert!(wm.label.is_none());
        let out = wm.try_apply(&solid_png(32, 32, 40)).unwrap();
        assert_eq!(image::guess_format(&out).unwrap(), ImageFormat::Jpeg);
    }

    #[test]
    fn missing_font_falls_back_to_bitmap() {
        let wm = Watermarker::load(&WatermarkConfig {
            text: "@deals ©".to_string(),
            font_path: PathBuf::from("/nonexistent/chanpost-font.ttf"),
            font_size: 30.0,
            margin: 20,
        });
        assert!(wm.uses_fallback_font());
        assert!(wm.try_apply(&solid_png(300, 200, 40)).is_ok());
    }

    #[test]
    fn bitmap_label_is_cropped_to_ink() {
        let mask = render_bitmap("I", 2).unwrap();
        assert!(mask.width < 16);
        assert!(mask.height < 16);
        assert!(render_bitmap("   ", 2).is_none());
        assert!(render_bitmap("", 2).is_none());
    }
}
