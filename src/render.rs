//! Per-frame drawing against an abstract surface.
//!
//! The renderer is stateless apart from its trail buffers. Everything it
//! draws comes from a read-only [`Scene`] built by the engine, and everything
//! it draws goes through the [`DrawSurface`] trait, so hosts can back it with
//! a canvas, a GPU batcher or a recording test double.
//!
//! Frame order:
//!
//! 1. Clear to the background.
//! 2. Map mode: grid, ticks, tick labels, axis titles. Game mode: table edge
//!    and pockets.
//! 3. Each on-screen particle in list order: trail, body, icon, labels,
//!    highlight rings.
//! 4. The aim line, if a shot is being drawn.

use glam::DVec2;
use std::collections::{HashMap, HashSet, VecDeque};

use crate::camera::Camera;
use crate::capture::SinkZone;
use crate::config::{RenderConfig, SwarmConfig};
use crate::icons::{Icon, IconRegistry};
use crate::interaction::AimState;
use crate::particle::Particle;
use crate::physics::{Bounds, Mode};
use crate::projector::{AxisDomain, AxisScale, PlotLayout, Projection};
use crate::visuals::{with_alpha, Color, Theme};

/// Number of gridlines the renderer asks each axis for.
pub const AXIS_TICKS: usize = 6;

/// Horizontal text alignment relative to the anchor point.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum TextAlign {
    Left,
    #[default]
    Center,
    Right,
}

/// Drawing primitives the renderer needs. Coordinates are surface pixels.
pub trait DrawSurface {
    /// Current surface size in pixels. Read fresh every frame.
    fn size(&self) -> DVec2;

    fn clear(&mut self, color: Color);

    fn fill_circle(&mut self, center: DVec2, radius: f64, color: Color);

    fn stroke_circle(&mut self, center: DVec2, radius: f64, width: f64, color: Color);

    fn draw_line(&mut self, from: DVec2, to: DVec2, width: f64, color: Color);

    /// Draw one line of text, vertically centered on `anchor`. `size` is the
    /// glyph height in pixels.
    fn draw_text(&mut self, text: &str, anchor: DVec2, size: f64, align: TextAlign, color: Color);

    /// Draw `icon` scaled to the square circumscribing the given circle.
    fn draw_image(&mut self, icon: &Icon, center: DVec2, radius: f64, alpha: f32);

    /// Restrict drawing to a circle until the matching [`pop_clip`](Self::pop_clip).
    fn push_clip_circle(&mut self, center: DVec2, radius: f64);

    fn pop_clip(&mut self);
}

/// Everything the renderer reads for one frame.
pub struct Scene<'a> {
    pub particles: &'a [Particle],
    pub camera: &'a Camera,
    pub mode: Mode,
    pub projection: &'a Projection,
    pub layout: &'a PlotLayout,
    pub bounds: &'a Bounds,
    pub pockets: &'a [SinkZone],
    pub hovered: Option<&'a str>,
    pub selected: Option<&'a str>,
    pub cue_id: Option<&'a str>,
    pub aim: Option<&'a AimState>,
    pub icons: &'a IconRegistry,
    pub config: &'a SwarmConfig,
}

#[derive(Debug, Clone, Copy)]
struct TrailPoint {
    position: DVec2,
    life: f32,
}

/// Fading screen-space motion history, one buffer per particle id.
#[derive(Debug, Default)]
pub struct TrailBuffers {
    trails: HashMap<String, VecDeque<TrailPoint>>,
}

impl TrailBuffers {
    /// Age every point once and drop the ones that faded out.
    fn age(&mut self, config: &RenderConfig) {
        for points in self.trails.values_mut() {
            for p in points.iter_mut() {
                p.life -= config.trail_decay;
            }
            while points.front().is_some_and(|p| p.life < config.trail_min_life) {
                points.pop_front();
            }
        }
    }

    /// Append `position` if it moved far enough from the newest point.
    fn record(&mut self, id: &str, position: DVec2, config: &RenderConfig) {
        if !self.trails.contains_key(id) {
            self.trails.insert(id.to_string(), VecDeque::new());
        }
        let Some(points) = self.trails.get_mut(id) else {
            return;
        };
        let moved = points
            .back()
            .map_or(true, |last| last.position.distance(position) > config.trail_min_distance);
        if moved {
            points.push_back(TrailPoint { position, life: 1.0 });
            while points.len() > config.trail_max_points {
                points.pop_front();
            }
        }
    }

    /// Drop buffers whose particle is gone.
    fn retain_ids(&mut self, live: &HashSet<&str>) {
        self.trails.retain(|id, _| live.contains(id.as_str()));
    }

    fn points(&self, id: &str) -> impl Iterator<Item = (DVec2, f32)> + '_ {
        self.trails
            .get(id)
            .into_iter()
            .flat_map(|points| points.iter().map(|p| (p.position, p.life)))
    }

    pub fn len(&self, id: &str) -> usize {
        self.trails.get(id).map_or(0, VecDeque::len)
    }

    /// Number of particles with a trail buffer.
    pub fn tracked(&self) -> usize {
        self.trails.len()
    }

    pub fn clear(&mut self) {
        self.trails.clear();
    }
}

/// Paints a [`Scene`] onto a [`DrawSurface`].
#[derive(Debug, Default)]
pub struct Renderer {
    theme: Theme,
    trails: TrailBuffers,
}

impl Renderer {
    pub fn new(theme: Theme) -> Self {
        Self {
            theme,
            trails: TrailBuffers::default(),
        }
    }

    pub fn theme(&self) -> &Theme {
        &self.theme
    }

    pub fn set_theme(&mut self, theme: Theme) {
        self.theme = theme;
    }

    pub fn trails(&self) -> &TrailBuffers {
        &self.trails
    }

    /// Forget all motion history, e.g. after a mode switch.
    pub fn clear_trails(&mut self) {
        self.trails.clear();
    }

    /// Draw one frame.
    pub fn render(&mut self, scene: &Scene<'_>, surface: &mut dyn DrawSurface) {
        let size = surface.size();
        surface.clear(self.theme.background);

        match scene.mode {
            Mode::Map => self.draw_axes(scene, surface, size),
            Mode::Game => self.draw_table(scene, surface),
        }

        let render = &scene.config.render;
        if render.trails {
            self.trails.age(render);
        }
        let live: HashSet<&str> = scene.particles.iter().map(|p| p.id.as_str()).collect();
        self.trails.retain_ids(&live);

        let viewport = Bounds::from_size(size);
        for particle in scene.particles {
            self.draw_particle(scene, surface, &viewport, particle);
        }

        if let Some(aim) = scene.aim {
            self.draw_aim(scene, surface, aim);
        }
    }

    // ========== Background ==========

    fn draw_axes(&self, scene: &Scene<'_>, surface: &mut dyn DrawSurface, size: DVec2) {
        let cam = scene.camera;
        let layout = scene.layout;
        let theme = &self.theme;
        let to_screen = |u: DVec2| cam.world_to_screen(layout.to_screen(u));

        let origin = to_screen(DVec2::ZERO);
        let x_end = to_screen(DVec2::X);
        let y_end = to_screen(DVec2::Y);
        let label_size = 10.0;

        for value in scene.projection.x.ticks(AXIS_TICKS) {
            let u = scene.projection.x.project(value);
            let bottom = to_screen(DVec2::new(u, 0.0));
            let top = to_screen(DVec2::new(u, 1.0));
            surface.draw_line(bottom, top, 1.0, theme.grid);
            surface.draw_line(bottom, bottom + DVec2::new(0.0, 5.0), 1.0, theme.axis);
            let label = scene.projection.pair.x.metric.format(value);
            surface.draw_text(&label, bottom + DVec2::new(0.0, 14.0), label_size, TextAlign::Center, theme.text);
        }

        for value in scene.projection.y.ticks(AXIS_TICKS) {
            let u = scene.projection.y.project(value);
            let left = to_screen(DVec2::new(0.0, u));
            let right = to_screen(DVec2::new(1.0, u));
            surface.draw_line(left, right, 1.0, theme.grid);
            surface.draw_line(left, left - DVec2::new(5.0, 0.0), 1.0, theme.axis);
            let label = scene.projection.pair.y.metric.format(value);
            surface.draw_text(&label, left - DVec2::new(8.0, 0.0), label_size, TextAlign::Right, theme.text);
        }

        // Zero line on a linear change axis that spans both signs.
        if let Some(u) = zero_crossing(&scene.projection.y) {
            surface.draw_line(to_screen(DVec2::new(0.0, u)), to_screen(DVec2::new(1.0, u)), 1.0, theme.axis);
        }

        surface.draw_line(origin, x_end, 1.5, theme.axis);
        surface.draw_line(origin, y_end, 1.5, theme.axis);

        let x_title = DVec2::new(size.x * 0.5, size.y - 12.0);
        surface.draw_text(scene.projection.pair.x.metric.title(), x_title, 10.0, TextAlign::Center, theme.text);
        surface.draw_text(scene.projection.pair.y.metric.title(), DVec2::new(8.0, 10.0), 10.0, TextAlign::Left, theme.text);
    }

    fn draw_table(&self, scene: &Scene<'_>, surface: &mut dyn DrawSurface) {
        let cam = scene.camera;
        let b = scene.bounds;
        let corners = [
            DVec2::new(b.min.x, b.min.y),
            DVec2::new(b.max.x, b.min.y),
            DVec2::new(b.max.x, b.max.y),
            DVec2::new(b.min.x, b.max.y),
        ];
        for i in 0..4 {
            let from = cam.world_to_screen(corners[i]);
            let to = cam.world_to_screen(corners[(i + 1) % 4]);
            surface.draw_line(from, to, 3.0, self.theme.table_edge);
        }
        for pocket in scene.pockets {
            surface.fill_circle(cam.world_to_screen(pocket.center), pocket.radius * cam.scale, self.theme.pocket);
        }
    }

    // ========== Particles ==========

    fn draw_particle(&mut self, scene: &Scene<'_>, surface: &mut dyn DrawSurface, viewport: &Bounds, p: &Particle) {
        if !p.has_body() {
            return;
        }
        let config = scene.config;
        let cam = scene.camera;
        let progress = p.capture.fall_progress(config.capture.fall_secs);
        let center = cam.world_to_screen(p.position);
        let radius = p.radius * cam.scale * (1.0 - progress);
        if radius <= 0.0 || !viewport.intersects_circle(center, radius) {
            return;
        }
        let alpha = (1.0 - progress) as f32;

        if config.render.trails {
            self.trails.record(&p.id, center, &config.render);
            self.draw_trail(surface, p, radius);
        }

        surface.fill_circle(center, radius, with_alpha(p.color, p.color.w * alpha));

        if config.render.show_icons {
            if let Some(icon) = p.icon.as_deref().and_then(|key| scene.icons.get(key)) {
                surface.push_clip_circle(center, radius);
                surface.draw_image(icon, center, radius * 0.85, alpha);
                surface.pop_clip();
            }
        }

        let label_min = config.render.label_min_radius;
        if radius > label_min {
            let size = (radius * 0.35).clamp(8.0, 28.0);
            let show_change = radius > label_min * 2.0;
            let symbol_at = if show_change { center - DVec2::new(0.0, size * 0.45) } else { center };
            surface.draw_text(&p.symbol, symbol_at, size, TextAlign::Center, with_alpha(self.theme.label, alpha));
            if show_change {
                let text = format!("{:+.2}%", p.change_pct);
                let sub = size * 0.6;
                surface.draw_text(&text, center + DVec2::new(0.0, size * 0.55), sub, TextAlign::Center, with_alpha(self.theme.label, alpha * 0.85));
            }
        }

        if scene.mode == Mode::Game && scene.cue_id == Some(p.id.as_str()) {
            surface.stroke_circle(center, radius + 2.0, 1.5, self.theme.cue_ring);
        }
        if scene.hovered == Some(p.id.as_str()) {
            surface.stroke_circle(center, radius + 3.0, 2.0, self.theme.hover_ring);
        }
        if scene.selected == Some(p.id.as_str()) {
            surface.stroke_circle(center, radius + 6.0, 3.0, self.theme.selected_ring);
        }
    }

    fn draw_trail(&self, surface: &mut dyn DrawSurface, p: &Particle, radius: f64) {
        let mut prev: Option<DVec2> = None;
        for (point, life) in self.trails.points(&p.id) {
            if let Some(from) = prev {
                let width = (radius * 0.4 * life as f64).max(1.0);
                surface.draw_line(from, point, width, with_alpha(p.color, life * 0.35));
            }
            prev = Some(point);
        }
    }

    // ========== Overlay ==========

    fn draw_aim(&self, scene: &Scene<'_>, surface: &mut dyn DrawSurface, aim: &AimState) {
        let Some(cue) = scene.particles.iter().find(|p| p.id == aim.cue_id) else {
            return;
        };
        let cfg = &scene.config.interaction;
        let cam = scene.camera;

        let from = cam.world_to_screen(cue.position);
        let dir = aim.direction();
        let fraction = aim.power_fraction(cfg);
        let full = cfg.max_draw_distance * cam.scale;
        let to = from + dir * full * fraction;

        // Pull-back guide toward the pointer.
        surface.draw_line(from, cam.world_to_screen(aim.draw), 1.0, with_alpha(self.theme.aim, 0.35));
        surface.draw_line(from, to, 2.0, self.theme.aim);

        let normal = dir.perp();
        for k in 1..=10 {
            let f = k as f64 / 10.0;
            if f > fraction + 1e-9 {
                break;
            }
            let at = from + dir * full * f;
            let half = if k % 5 == 0 { 6.0 } else { 3.5 };
            surface.draw_line(at - normal * half, at + normal * half, 1.5, self.theme.aim);
        }
    }
}

fn zero_crossing(domain: &AxisDomain) -> Option<f64> {
    (domain.scale == AxisScale::Linear && domain.min < 0.0 && domain.max > 0.0)
        .then(|| domain.project(0.0))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_trail_records_only_real_movement() {
        let config = RenderConfig::default();
        let mut trails = TrailBuffers::default();
        trails.record("a", DVec2::ZERO, &config);
        trails.record("a", DVec2::new(1.0, 0.0), &config);
        trails.record("a", DVec2::new(5.0, 0.0), &config);
        assert_eq!(trails.len("a"), 2);
    }

    #[test]
    fn test_trail_is_bounded() {
        let config = RenderConfig::default();
        let mut trails = TrailBuffers::default();
        for i in 0..100 {
            trails.record("a", DVec2::new(i as f64 * 10.0, 0.0), &config);
        }
        assert_eq!(trails.len("a"), config.trail_max_points);
    }

    #[test]
    fn test_trail_fades_out() {
        let config = RenderConfig::default();
        let mut trails = TrailBuffers::default();
        trails.record("a", DVec2::ZERO, &config);
        for _ in 0..16 {
            trails.age(&config);
        }
        assert_eq!(trails.len("a"), 0);
    }

    #[test]
    fn test_stale_trails_dropped() {
        let config = RenderConfig::default();
        let mut trails = TrailBuffers::default();
        trails.record("a", DVec2::ZERO, &config);
        trails.record("b", DVec2::ZERO, &config);
        trails.retain_ids(&HashSet::from(["b"]));
        assert_eq!(trails.tracked(), 1);
        assert_eq!(trails.len("a"), 0);
    }
}
