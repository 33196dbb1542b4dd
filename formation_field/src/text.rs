//! Glyph-sampled text layout.
//!
//! The auxiliary text is rasterized onto an offscreen alpha bitmap, the
//! bitmap is scanned at a fixed stride, and covered pixels become shuffled
//! world-space targets on the z = 0 plane.  Rasterization is the expensive
//! step, so the choreography layer caches the result and recomputes only
//! when the text (or the formation) changes — never per frame.
//!
//! The default backend draws the built-in bitmap font scaled up to the
//! configured size; with the `truetype` feature a `rusttype` backend accepts
//! caller-provided font bytes instead.

use glam::Vec3;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::font;

// ════════════════════════════════════════════════════════════════════════════
// TextStyle
// ════════════════════════════════════════════════════════════════════════════

#[derive(Clone, Copy, Debug)]
pub struct TextStyle {
    /// Offscreen canvas size in pixels.
    pub canvas_width: usize,
    pub canvas_height: usize,
    /// Glyph height in pixels.
    pub font_size: f32,
    /// Pixel-grid sampling stride.
    pub stride: usize,
    /// Alpha above which a scanned pixel joins the layout (128 ≈ 50%).
    pub alpha_threshold: u8,
    /// World units per pixel when mapping to 3D.
    pub world_scale: f32,
}

impl Default for TextStyle {
    fn default() -> Self {
        TextStyle {
            canvas_width: 1024,
            canvas_height: 512,
            font_size: 320.0,
            stride: 4,
            alpha_threshold: 128,
            world_scale: 0.012,
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// RasterError (truetype backend)
// ════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "truetype")]
#[derive(Debug, thiserror::Error)]
pub enum RasterError {
    #[error("font data could not be parsed")]
    InvalidFont,
}

// ════════════════════════════════════════════════════════════════════════════
// TextLayout
// ════════════════════════════════════════════════════════════════════════════

/// Shuffled world-space targets sampled from one rasterized string.
///
/// An empty layout is a normal value (empty string, whitespace, glyphs the
/// font can't draw) — consumers fall back to floating behavior.
#[derive(Clone, Debug, Default)]
pub struct TextLayout {
    points: Vec<Vec3>,
}

impl TextLayout {
    /// Rasterize with the built-in bitmap font.  Infallible: unsupported
    /// input degrades to an empty layout.
    pub fn rasterize<R: Rng + ?Sized>(text: &str, style: &TextStyle, rng: &mut R) -> Self {
        let alpha = raster_bitmap_font(text, style);
        TextLayout {
            points: collect_points(&alpha, style, rng),
        }
    }

    /// Rasterize through `rusttype` with caller-provided font bytes.
    #[cfg(feature = "truetype")]
    pub fn rasterize_truetype<R: Rng + ?Sized>(
        text: &str,
        style: &TextStyle,
        font_data: &[u8],
        rng: &mut R,
    ) -> Result<Self, RasterError> {
        let alpha = raster_truetype(text, style, font_data)?;
        Ok(TextLayout {
            points: collect_points(&alpha, style, rng),
        })
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    /// Target for particle slot `k`, wrapping when more slots than points
    /// are requested.  `None` only when the layout is empty.
    pub fn point(&self, k: usize) -> Option<Vec3> {
        if self.points.is_empty() {
            None
        } else {
            Some(self.points[k % self.points.len()])
        }
    }

    pub fn points(&self) -> &[Vec3] {
        &self.points
    }
}

// ════════════════════════════════════════════════════════════════════════════
// Pixel collection (shared by both backends)
// ════════════════════════════════════════════════════════════════════════════

/// Scan the alpha bitmap at the configured stride, keep covered pixels,
/// shuffle them, and map pixel space to centered world space.
///
/// The shuffle decorrelates slot order from stroke order, so sequential
/// particle assignment doesn't trace the glyphs.
fn collect_points<R: Rng + ?Sized>(alpha: &[u8], style: &TextStyle, rng: &mut R) -> Vec<Vec3> {
    let (w, h) = (style.canvas_width, style.canvas_height);
    let stride = style.stride.max(1);

    let mut pixels = Vec::new();
    let mut py = 0;
    while py < h {
        let mut px = 0;
        while px < w {
            if alpha[py * w + px] > style.alpha_threshold {
                pixels.push((px, py));
            }
            px += stride;
        }
        py += stride;
    }

    pixels.shuffle(rng);

    let (half_w, half_h) = (w as f32 / 2.0, h as f32 / 2.0);
    pixels
        .into_iter()
        .map(|(px, py)| {
            Vec3::new(
                (px as f32 - half_w) * style.world_scale,
                -(py as f32 - half_h) * style.world_scale,
                0.0,
            )
        })
        .collect()
}

// ════════════════════════════════════════════════════════════════════════════
// Bitmap-font backend
// ════════════════════════════════════════════════════════════════════════════

/// Draw the string centered on the canvas using the scaled 3×5 font.
fn raster_bitmap_font(text: &str, style: &TextStyle) -> Vec<u8> {
    let (w, h) = (style.canvas_width, style.canvas_height);
    let mut alpha = vec![0u8; w * h];

    let cell = ((style.font_size / font::GLYPH_H as f32).round() as usize).max(1);
    let chars: Vec<char> = text.chars().collect();
    if chars.is_empty() {
        return alpha;
    }

    // Centered pen origin; the trailing gap is not part of the text width.
    let advance = font::ADVANCE * cell;
    let total_w = chars.len() * advance - cell;
    let start_x = w.saturating_sub(total_w) / 2;
    let start_y = h.saturating_sub(font::GLYPH_H * cell) / 2;

    for (i, &c) in chars.iter().enumerate() {
        let Some(rows) = font::glyph(c) else { continue };
        let gx = start_x + i * advance;
        for (row, &bits) in rows.iter().enumerate() {
            for col in 0..font::GLYPH_W {
                if bits & (1 << (font::GLYPH_W - 1 - col)) == 0 {
                    continue;
                }
                fill_cell(&mut alpha, w, h, gx + col * cell, start_y + row * cell, cell);
            }
        }
    }
    alpha
}

fn fill_cell(alpha: &mut [u8], w: usize, h: usize, x0: usize, y0: usize, cell: usize) {
    for y in y0..(y0 + cell).min(h) {
        for x in x0..(x0 + cell).min(w) {
            alpha[y * w + x] = 255;
        }
    }
}

// ════════════════════════════════════════════════════════════════════════════
// TrueType backend (feature = "truetype")
// ════════════════════════════════════════════════════════════════════════════

#[cfg(feature = "truetype")]
fn raster_truetype(text: &str, style: &TextStyle, font_data: &[u8]) -> Result<Vec<u8>, RasterError> {
    use rusttype::{point, Font, Scale};

    let font = Font::try_from_bytes(font_data).ok_or(RasterError::InvalidFont)?;
    let (w, h) = (style.canvas_width, style.canvas_height);
    let mut alpha = vec![0u8; w * h];

    let scale = Scale::uniform(style.font_size);
    let v_metrics = font.v_metrics(scale);

    // First pass measures, second pass lays out centered.
    let measured: Vec<_> = font.layout(text, scale, point(0.0, 0.0)).collect();
    let text_w = measured.last().map_or(0.0, |g| {
        g.position().x + g.unpositioned().h_metrics().advance_width
    });
    let text_h = v_metrics.ascent - v_metrics.descent;
    let start_x = ((w as f32 - text_w) / 2.0).max(0.0);
    let start_y = ((h as f32 - text_h) / 2.0 + v_metrics.ascent).max(0.0);

    for glyph in font.layout(text, scale, point(start_x, start_y)) {
        if let Some(bb) = glyph.pixel_bounding_box() {
            glyph.draw(|gx, gy, coverage| {
                let px = bb.min.x + gx as i32;
                let py = bb.min.y + gy as i32;
                if px >= 0 && (px as usize) < w && py >= 0 && (py as usize) < h {
                    let a = (coverage * 255.0) as u8;
                    let slot = &mut alpha[py as usize * w + px as usize];
                    *slot = (*slot).max(a);
                }
            });
        }
    }
    Ok(alpha)
}

// ════════════════════════════════════════════════════════════════════════════
// Tests
// ════════════════════════════════════════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn layout_of(text: &str, seed: u64) -> TextLayout {
        let mut rng = StdRng::seed_from_u64(seed);
        TextLayout::rasterize(text, &TextStyle::default(), &mut rng)
    }

    #[test]
    fn digit_two_yields_a_nonempty_centered_layout() {
        // 1024×512 canvas, stride 4 — the literal case the system renders
        // when two fingers are held up.
        let layout = layout_of("2", 1);
        assert!(!layout.is_empty());

        let xs: Vec<f32> = layout.points().iter().map(|p| p.x).collect();
        let ys: Vec<f32> = layout.points().iter().map(|p| p.y).collect();
        let span_x = xs.iter().cloned().fold(f32::MIN, f32::max)
            - xs.iter().cloned().fold(f32::MAX, f32::min);
        let span_y = ys.iter().cloned().fold(f32::MIN, f32::max)
            - ys.iter().cloned().fold(f32::MAX, f32::min);

        // A single glyph spans a visible region around the center, well
        // inside the canvas half-extents.
        assert!(span_x > 1.0 && span_y > 1.0);
        for p in layout.points() {
            assert!(p.x.abs() <= 512.0 * 0.012 + 1e-3);
            assert!(p.y.abs() <= 256.0 * 0.012 + 1e-3);
            assert_eq!(p.z, 0.0);
        }
    }

    #[test]
    fn empty_and_whitespace_text_yield_empty_layouts() {
        assert!(layout_of("", 1).is_empty());
        assert!(layout_of("   ", 1).is_empty());
        assert!(layout_of("", 1).point(0).is_none());
    }

    #[test]
    fn slot_lookup_wraps() {
        let layout = layout_of("hi", 2);
        let n = layout.len();
        assert!(n > 0);
        assert_eq!(layout.point(0), layout.point(n));
        assert_eq!(layout.point(3), layout.point(n + 3));
    }

    #[test]
    fn shuffle_reorders_but_preserves_the_pixel_set() {
        let a = layout_of("2026", 1);
        let b = layout_of("2026", 99);
        assert_eq!(a.len(), b.len());
        assert_ne!(a.points(), b.points(), "different seeds, same order");

        let key = |p: &Vec3| ((p.x * 1000.0) as i64, (p.y * 1000.0) as i64);
        let mut sa: Vec<_> = a.points().iter().map(key).collect();
        let mut sb: Vec<_> = b.points().iter().map(key).collect();
        sa.sort_unstable();
        sb.sort_unstable();
        assert_eq!(sa, sb);
    }

    #[test]
    fn same_seed_is_deterministic() {
        let a = layout_of("tree", 5);
        let b = layout_of("tree", 5);
        assert_eq!(a.points(), b.points());
    }

    #[test]
    fn longer_text_covers_more_pixels() {
        let narrow = layout_of("1", 3);
        let wide = layout_of("1111", 3);
        assert!(wide.len() > narrow.len());
    }
}
