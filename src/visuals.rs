//! Colors and theming.
//!
//! Particle color comes from the sign and size of the percent change: gains
//! (including zero) use the gain side of the [`Palette`], losses the loss side,
//! and saturation grows with magnitude. Everything else on screen (background,
//! grid, labels, table) comes from a [`Theme`].
//!
//! Colors are RGBA in `[0, 1]`.

use glam::Vec4;

/// RGBA color, each channel in `[0, 1]`.
pub type Color = Vec4;

/// Percent change at which a particle reaches full saturation.
pub const SATURATION_PCT: f64 = 10.0;

/// Build a color from 8-bit RGB components.
pub fn rgb8(r: u8, g: u8, b: u8) -> Color {
    Vec4::new(r as f32 / 255.0, g as f32 / 255.0, b as f32 / 255.0, 1.0)
}

/// Same color with a different alpha.
pub fn with_alpha(color: Color, alpha: f32) -> Color {
    Vec4::new(color.x, color.y, color.z, alpha.clamp(0.0, 1.0))
}

/// Gain/loss color palettes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Palette {
    /// Green for gains, red for losses.
    #[default]
    Classic,

    /// Blue for gains, orange for losses. Colorblind-friendly.
    Colorblind,

    /// Light gray to white for gains, dark gray for losses.
    Grayscale,
}

impl Palette {
    /// Color stops: strong loss, muted loss, muted gain, strong gain.
    pub fn colors(&self) -> [Color; 4] {
        match self {
            Palette::Classic => [
                rgb8(230, 57, 70),   // Red
                rgb8(150, 96, 100),  // Dusty red
                rgb8(96, 140, 110),  // Sage
                rgb8(38, 201, 118),  // Green
            ],
            Palette::Colorblind => [
                rgb8(240, 128, 20),  // Orange
                rgb8(160, 120, 90),  // Tan
                rgb8(100, 120, 160), // Slate
                rgb8(40, 120, 240),  // Blue
            ],
            Palette::Grayscale => [
                rgb8(70, 70, 70),
                rgb8(110, 110, 110),
                rgb8(170, 170, 170),
                rgb8(245, 245, 245),
            ],
        }
    }

    /// Color for a percent change.
    ///
    /// Zero counts as a gain. Saturation is linear in `|pct|` up to
    /// [`SATURATION_PCT`].
    pub fn change_color(&self, pct: f64) -> Color {
        let [loss_strong, loss_muted, gain_muted, gain_strong] = self.colors();
        let pct = if pct.is_finite() { pct } else { 0.0 };
        let t = (pct.abs() / SATURATION_PCT).clamp(0.0, 1.0) as f32;
        if pct >= 0.0 {
            gain_muted.lerp(gain_strong, t)
        } else {
            loss_muted.lerp(loss_strong, t)
        }
    }
}

/// Non-particle colors.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Theme {
    pub background: Color,
    pub grid: Color,
    pub axis: Color,
    pub text: Color,
    /// Label drawn on top of particle bodies.
    pub label: Color,
    pub hover_ring: Color,
    pub selected_ring: Color,
    pub table_edge: Color,
    pub pocket: Color,
    pub cue_ring: Color,
    pub aim: Color,
    pub palette: Palette,
}

impl Theme {
    pub fn dark() -> Self {
        Self {
            background: rgb8(13, 17, 23),
            grid: Vec4::new(1.0, 1.0, 1.0, 0.06),
            axis: Vec4::new(1.0, 1.0, 1.0, 0.35),
            text: Vec4::new(0.85, 0.87, 0.9, 1.0),
            label: Vec4::new(1.0, 1.0, 1.0, 0.95),
            hover_ring: Vec4::new(1.0, 1.0, 1.0, 0.8),
            selected_ring: rgb8(255, 200, 60),
            table_edge: rgb8(70, 90, 80),
            pocket: rgb8(2, 4, 6),
            cue_ring: Vec4::new(1.0, 1.0, 1.0, 0.9),
            aim: rgb8(255, 230, 120),
            palette: Palette::Classic,
        }
    }

    pub fn light() -> Self {
        Self {
            background: rgb8(246, 247, 249),
            grid: Vec4::new(0.0, 0.0, 0.0, 0.07),
            axis: Vec4::new(0.0, 0.0, 0.0, 0.4),
            text: rgb8(40, 44, 52),
            label: Vec4::new(1.0, 1.0, 1.0, 0.95),
            hover_ring: Vec4::new(0.0, 0.0, 0.0, 0.7),
            selected_ring: rgb8(230, 150, 0),
            table_edge: rgb8(120, 150, 130),
            pocket: rgb8(30, 30, 30),
            cue_ring: Vec4::new(0.0, 0.0, 0.0, 0.8),
            aim: rgb8(200, 120, 0),
            palette: Palette::Classic,
        }
    }

    /// Swap the gain/loss palette.
    pub fn with_palette(mut self, palette: Palette) -> Self {
        self.palette = palette;
        self
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::dark()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_zero_change_is_a_gain() {
        let p = Palette::Classic;
        let [_, _, gain_muted, _] = p.colors();
        assert_eq!(p.change_color(0.0), gain_muted);
        assert_eq!(p.change_color(f64::NAN), gain_muted);
    }

    #[test]
    fn test_saturation_grows_with_magnitude() {
        let p = Palette::Classic;
        let [loss_strong, _, _, gain_strong] = p.colors();
        assert_eq!(p.change_color(25.0), gain_strong);
        assert_eq!(p.change_color(-10.0), loss_strong);

        let half = p.change_color(-5.0);
        assert_ne!(half, loss_strong);
        assert!(half.x > p.change_color(-1.0).x);
    }

    #[test]
    fn test_with_alpha_clamps() {
        let c = with_alpha(rgb8(255, 0, 0), 1.5);
        assert_eq!(c.w, 1.0);
    }
}
