//! Software [`DrawSurface`] backed by an RGBA image.
//!
//! Shapes are anti-aliased with a one-pixel coverage ramp; text uses a tiny
//! built-in 3x5 bitmap font scaled by whole pixels. This is enough for the
//! demo window and for snapshot output, not a general vector rasterizer.

use glam::DVec2;
use image::RgbaImage;
use std::path::Path;

use crate::error::SwarmError;
use crate::icons::Icon;
use crate::render::{DrawSurface, TextAlign};
use crate::visuals::Color;

/// Glyph cell in font units (3 wide, 5 tall, one column of spacing).
const GLYPH_W: i64 = 3;
const GLYPH_H: i64 = 5;
const GLYPH_ADVANCE: i64 = 4;

/// Rows of a 3x5 glyph, top to bottom, most significant bit on the left.
fn glyph(ch: char) -> [u8; 5] {
    match ch.to_ascii_uppercase() {
        '0' => [0b111, 0b101, 0b101, 0b101, 0b111],
        '1' => [0b010, 0b110, 0b010, 0b010, 0b111],
        '2' => [0b111, 0b001, 0b111, 0b100, 0b111],
        '3' => [0b111, 0b001, 0b111, 0b001, 0b111],
        '4' => [0b101, 0b101, 0b111, 0b001, 0b001],
        '5' => [0b111, 0b100, 0b111, 0b001, 0b111],
        '6' => [0b111, 0b100, 0b111, 0b101, 0b111],
        '7' => [0b111, 0b001, 0b001, 0b010, 0b010],
        '8' => [0b111, 0b101, 0b111, 0b101, 0b111],
        '9' => [0b111, 0b101, 0b111, 0b001, 0b111],
        'A' => [0b010, 0b101, 0b111, 0b101, 0b101],
        'B' => [0b110, 0b101, 0b110, 0b101, 0b110],
        'C' => [0b011, 0b100, 0b100, 0b100, 0b011],
        'D' => [0b110, 0b101, 0b101, 0b101, 0b110],
        'E' => [0b111, 0b100, 0b110, 0b100, 0b111],
        'F' => [0b111, 0b100, 0b110, 0b100, 0b100],
        'G' => [0b011, 0b100, 0b101, 0b101, 0b011],
        'H' => [0b101, 0b101, 0b111, 0b101, 0b101],
        'I' => [0b111, 0b010, 0b010, 0b010, 0b111],
        'J' => [0b001, 0b001, 0b001, 0b101, 0b010],
        'K' => [0b101, 0b101, 0b110, 0b101, 0b101],
        'L' => [0b100, 0b100, 0b100, 0b100, 0b111],
        'M' => [0b101, 0b111, 0b111, 0b101, 0b101],
        'N' => [0b110, 0b101, 0b101, 0b101, 0b101],
        'O' => [0b010, 0b101, 0b101, 0b101, 0b010],
        'P' => [0b110, 0b101, 0b110, 0b100, 0b100],
        'Q' => [0b010, 0b101, 0b101, 0b110, 0b011],
        'R' => [0b110, 0b101, 0b110, 0b101, 0b101],
        'S' => [0b011, 0b100, 0b010, 0b001, 0b110],
        'T' => [0b111, 0b010, 0b010, 0b010, 0b010],
        'U' => [0b101, 0b101, 0b101, 0b101, 0b111],
        'V' => [0b101, 0b101, 0b101, 0b101, 0b010],
        'W' => [0b101, 0b101, 0b111, 0b111, 0b101],
        'X' => [0b101, 0b101, 0b010, 0b101, 0b101],
        'Y' => [0b101, 0b101, 0b010, 0b010, 0b010],
        'Z' => [0b111, 0b001, 0b010, 0b100, 0b111],
        '.' => [0b000, 0b000, 0b000, 0b000, 0b010],
        ',' => [0b000, 0b000, 0b000, 0b010, 0b100],
        ':' => [0b000, 0b010, 0b000, 0b010, 0b000],
        '%' => [0b101, 0b001, 0b010, 0b100, 0b101],
        '-' => [0b000, 0b000, 0b111, 0b000, 0b000],
        '+' => [0b000, 0b010, 0b111, 0b010, 0b000],
        '$' => [0b011, 0b110, 0b010, 0b011, 0b110],
        ' ' => [0; 5],
        // Unknown glyph: hollow box.
        _ => [0b111, 0b101, 0b101, 0b101, 0b111],
    }
}

/// Width in pixels of `text` at a given glyph height.
pub fn text_width(text: &str, size: f64) -> f64 {
    let scale = glyph_scale(size);
    let n = text.chars().count() as i64;
    if n == 0 {
        0.0
    } else {
        ((n * GLYPH_ADVANCE - 1) * scale) as f64
    }
}

fn glyph_scale(size: f64) -> i64 {
    ((size / GLYPH_H as f64).round() as i64).max(1)
}

/// CPU canvas.
#[derive(Debug, Clone)]
pub struct Canvas {
    image: RgbaImage,
    clips: Vec<(DVec2, f64)>,
}

impl Canvas {
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            image: RgbaImage::new(width.max(1), height.max(1)),
            clips: Vec::new(),
        }
    }

    /// Reallocate for a new size. Contents are discarded.
    pub fn resize(&mut self, width: u32, height: u32) {
        if (width.max(1), height.max(1)) != self.image.dimensions() {
            self.image = RgbaImage::new(width.max(1), height.max(1));
        }
        self.clips.clear();
    }

    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }

    pub fn image(&self) -> &RgbaImage {
        &self.image
    }

    /// Raw RGBA8 bytes, row-major.
    pub fn as_raw(&self) -> &[u8] {
        self.image.as_raw()
    }

    pub fn pixel(&self, x: u32, y: u32) -> [u8; 4] {
        self.image.get_pixel(x, y).0
    }

    /// Write the canvas to a PNG file.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), SwarmError> {
        self.image.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }

    // ========== Internal Methods ==========

    fn clipped(&self, p: DVec2) -> bool {
        self.clips
            .iter()
            .any(|(center, radius)| p.distance_squared(*center) > radius * radius)
    }

    /// Source-over blend of `color` at `coverage` into one pixel.
    fn blend(&mut self, x: i64, y: i64, color: Color, coverage: f32) {
        if x < 0 || y < 0 || x >= self.width() as i64 || y >= self.height() as i64 {
            return;
        }
        let a = (color.w * coverage).clamp(0.0, 1.0);
        if a <= 0.0 {
            return;
        }
        let center = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
        if self.clipped(center) {
            return;
        }
        let px = self.image.get_pixel_mut(x as u32, y as u32);
        let src = [color.x, color.y, color.z];
        for c in 0..3 {
            let dst = px.0[c] as f32 / 255.0;
            let out = src[c].clamp(0.0, 1.0) * a + dst * (1.0 - a);
            px.0[c] = (out * 255.0).round() as u8;
        }
        let dst_a = px.0[3] as f32 / 255.0;
        px.0[3] = ((a + dst_a * (1.0 - a)) * 255.0).round() as u8;
    }

    /// Visit every pixel whose center lies within the box, clamped to the canvas.
    fn for_box(&mut self, min: DVec2, max: DVec2, mut f: impl FnMut(&mut Self, i64, i64, DVec2)) {
        if !(min.is_finite() && max.is_finite()) {
            return;
        }
        let x0 = (min.x.floor() as i64).max(0);
        let y0 = (min.y.floor() as i64).max(0);
        let x1 = (max.x.ceil() as i64).min(self.width() as i64 - 1);
        let y1 = (max.y.ceil() as i64).min(self.height() as i64 - 1);
        for y in y0..=y1 {
            for x in x0..=x1 {
                let p = DVec2::new(x as f64 + 0.5, y as f64 + 0.5);
                f(self, x, y, p);
            }
        }
    }
}

fn segment_distance(p: DVec2, a: DVec2, b: DVec2) -> f64 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    let t = if len_sq > 0.0 { ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0) } else { 0.0 };
    p.distance(a + ab * t)
}

impl DrawSurface for Canvas {
    fn size(&self) -> DVec2 {
        DVec2::new(self.width() as f64, self.height() as f64)
    }

    fn clear(&mut self, color: Color) {
        let rgba = [
            (color.x.clamp(0.0, 1.0) * 255.0).round() as u8,
            (color.y.clamp(0.0, 1.0) * 255.0).round() as u8,
            (color.z.clamp(0.0, 1.0) * 255.0).round() as u8,
            255,
        ];
        for px in self.image.pixels_mut() {
            px.0 = rgba;
        }
        self.clips.clear();
    }

    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Color) {
        if !(radius > 0.0) {
            return;
        }
        let reach = DVec2::splat(radius + 1.0);
        self.for_box(center - reach, center + reach, |canvas, x, y, p| {
            let coverage = (radius + 0.5 - p.distance(center)).clamp(0.0, 1.0) as f32;
            canvas.blend(x, y, color, coverage);
        });
    }

    fn stroke_circle(&mut self, center: DVec2, radius: f64, width: f64, color: Color) {
        if !(radius > 0.0) {
            return;
        }
        let half = width * 0.5;
        let reach = DVec2::splat(radius + half + 1.0);
        self.for_box(center - reach, center + reach, |canvas, x, y, p| {
            let d = (p.distance(center) - radius).abs();
            let coverage = (half + 0.5 - d).clamp(0.0, 1.0) as f32;
            canvas.blend(x, y, color, coverage);
        });
    }

    fn draw_line(&mut self, from: DVec2, to: DVec2, width: f64, color: Color) {
        if !(from.is_finite() && to.is_finite()) {
            return;
        }
        let half = width * 0.5;
        let pad = DVec2::splat(half + 1.0);
        self.for_box(from.min(to) - pad, from.max(to) + pad, |canvas, x, y, p| {
            let d = segment_distance(p, from, to);
            let coverage = (half + 0.5 - d).clamp(0.0, 1.0) as f32;
            canvas.blend(x, y, color, coverage);
        });
    }

    fn draw_text(&mut self, text: &str, anchor: DVec2, size: f64, align: TextAlign, color: Color) {
        let scale = glyph_scale(size);
        let width = text_width(text, size);
        let left = match align {
            TextAlign::Left => anchor.x,
            TextAlign::Center => anchor.x - width * 0.5,
            TextAlign::Right => anchor.x - width,
        }
        .round() as i64;
        let top = (anchor.y - (GLYPH_H * scale) as f64 * 0.5).round() as i64;

        for (i, ch) in text.chars().enumerate() {
            let origin_x = left + i as i64 * GLYPH_ADVANCE * scale;
            for (row, bits) in glyph(ch).iter().enumerate() {
                for col in 0..GLYPH_W {
                    if bits & (1 << (GLYPH_W - 1 - col)) == 0 {
                        continue;
                    }
                    let x0 = origin_x + col * scale;
                    let y0 = top + row as i64 * scale;
                    for dy in 0..scale {
                        for dx in 0..scale {
                            self.blend(x0 + dx, y0 + dy, color, 1.0);
                        }
                    }
                }
            }
        }
    }

    fn draw_image(&mut self, icon: &Icon, center: DVec2, radius: f64, alpha: f32) {
        if !(radius > 0.0) {
            return;
        }
        let min = center - DVec2::splat(radius);
        let side = radius * 2.0;
        self.for_box(min, center + DVec2::splat(radius), |canvas, x, y, p| {
            let uv = (p - min) / side;
            if uv.x < 0.0 || uv.y < 0.0 || uv.x > 1.0 || uv.y > 1.0 {
                return;
            }
            let [r, g, b, a] = icon.sample(uv.x, uv.y);
            let color = Color::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, a as f32 / 255.0);
            canvas.blend(x, y, color, alpha);
        });
    }

    fn push_clip_circle(&mut self, center: DVec2, radius: f64) {
        self.clips.push((center, radius.max(0.0)));
    }

    fn pop_clip(&mut self) {
        self.clips.pop();
    }
}
