//! The two motion regimes.
//!
//! - **Map**: every body eases toward its anchor plus a slow Lissajous wobble.
//!   Velocity is not integrated.
//! - **Game**: billiards. Drag, wall reflection and elastic pair collisions,
//!   resolved with a few sequential sweeps.
//!
//! All rates are written per 60 Hz frame and rescaled by `dt * 60`, so the
//! feel is the same at any frame rate. Time is always an explicit argument.

use glam::DVec2;
use std::fmt;
use std::str::FromStr;

use crate::config::PhysicsConfig;
use crate::error::SwarmError;
use crate::particle::Particle;
use crate::spawn::Spawner;

/// Layout regime.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Mode {
    /// Scatter plot with drift toward metric anchors.
    #[default]
    Map,
    /// Billiard table with pockets.
    Game,
}

impl FromStr for Mode {
    type Err = SwarmError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "map" => Ok(Mode::Map),
            "game" => Ok(Mode::Game),
            _ => Err(SwarmError::UnknownMode(s.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Mode::Map => "map",
            Mode::Game => "game",
        })
    }
}

/// Axis-aligned rectangle in world space.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Bounds {
    pub min: DVec2,
    pub max: DVec2,
}

impl Bounds {
    pub fn new(min: DVec2, max: DVec2) -> Self {
        Self { min, max }
    }

    /// Rectangle from the origin to `size`.
    pub fn from_size(size: DVec2) -> Self {
        Self::new(DVec2::ZERO, size.max(DVec2::ZERO))
    }

    pub fn width(&self) -> f64 {
        self.max.x - self.min.x
    }

    pub fn height(&self) -> f64 {
        self.max.y - self.min.y
    }

    pub fn center(&self) -> DVec2 {
        (self.min + self.max) * 0.5
    }

    pub fn contains(&self, p: DVec2) -> bool {
        p.x >= self.min.x && p.x <= self.max.x && p.y >= self.min.y && p.y <= self.max.y
    }

    /// Whether a circle's bounding box overlaps this rectangle.
    pub fn intersects_circle(&self, center: DVec2, radius: f64) -> bool {
        center.x + radius >= self.min.x
            && center.x - radius <= self.max.x
            && center.y + radius >= self.min.y
            && center.y - radius <= self.max.y
    }
}

/// Clamp a raw frame delta into `[0, max_dt]`. Non-finite deltas become 0.
pub fn clamp_dt(dt: f64, max_dt: f64) -> f64 {
    if dt.is_finite() {
        dt.clamp(0.0, max_dt)
    } else {
        0.0
    }
}

/// Unit-amplitude wobble at time `t` for a particle with `phase`.
pub fn drift(t: f64, phase: f64) -> DVec2 {
    DVec2::new(
        (t * 0.55 + phase).sin(),
        (t * 0.83 + phase * 1.7).cos(),
    )
}

/// Map regime: ease every unpinned body toward its drifting anchor.
pub fn step_map(particles: &mut [Particle], t: f64, dt: f64, float_strength: f64, config: &PhysicsConfig) {
    let frames = dt * 60.0;
    let k = 1.0 - (1.0 - config.drift_smoothing).powf(frames);
    let amplitude = config.drift_amplitude * float_strength;

    for p in particles.iter_mut().filter(|p| !p.pinned) {
        let target = p.anchor + drift(t, p.phase) * amplitude;
        p.position += (target - p.position) * k;
    }
}

/// Game regime: integrate, contain, then resolve pairs.
pub fn step_game(particles: &mut [Particle], bounds: &Bounds, dt: f64, config: &PhysicsConfig) {
    integrate(particles, dt, config);
    contain(particles, bounds);
    resolve_pairs(particles, config);
}

/// Apply drag and move by velocity. Skips pinned and captured bodies.
pub fn integrate(particles: &mut [Particle], dt: f64, config: &PhysicsConfig) {
    let frames = dt * 60.0;
    let retain = config.drag.powf(frames);
    let scale = dt * config.speed_scale;

    for p in particles.iter_mut().filter(|p| p.is_free_body()) {
        p.velocity *= retain;
        p.position += p.velocity * scale;
    }
}

/// Keep free bodies inside `bounds`, reflecting the velocity component that
/// points out of the wall.
pub fn contain(particles: &mut [Particle], bounds: &Bounds) {
    for p in particles.iter_mut().filter(|p| p.is_free_body()) {
        let r = p.radius;
        for axis in 0..2 {
            let lo = bounds.min[axis] + r;
            let hi = bounds.max[axis] - r;
            if lo > hi {
                // Body wider than the table on this axis.
                p.position[axis] = (bounds.min[axis] + bounds.max[axis]) * 0.5;
                p.velocity[axis] = 0.0;
            } else if p.position[axis] < lo {
                p.position[axis] = lo;
                p.velocity[axis] = p.velocity[axis].abs();
            } else if p.position[axis] > hi {
                p.position[axis] = hi;
                p.velocity[axis] = -p.velocity[axis].abs();
            }
        }
    }
}

/// Sequential pairwise separation and restitution impulses.
///
/// Pinned bodies have zero inverse mass: they deflect others but never move.
/// Coincident centers separate along +x.
pub fn resolve_pairs(particles: &mut [Particle], config: &PhysicsConfig) {
    let n = particles.len();
    for _ in 0..config.solver_iterations {
        for i in 0..n {
            let (head, tail) = particles.split_at_mut(i + 1);
            let a = &mut head[i];
            if !a.is_collidable() {
                continue;
            }
            for b in tail.iter_mut() {
                if b.is_collidable() {
                    resolve_pair(a, b, config.restitution);
                }
            }
        }
    }
}

fn resolve_pair(a: &mut Particle, b: &mut Particle, restitution: f64) {
    let inv_a = a.inverse_mass();
    let inv_b = b.inverse_mass();
    let inv_sum = inv_a + inv_b;
    if inv_sum <= 0.0 {
        return;
    }

    let delta = b.position - a.position;
    let min_dist = a.radius + b.radius;
    let dist_sq = delta.length_squared();
    if dist_sq >= min_dist * min_dist {
        return;
    }

    let dist = dist_sq.sqrt();
    let normal = if dist > 1e-9 { delta / dist } else { DVec2::X };

    let overlap = min_dist - dist;
    a.position -= normal * (overlap * inv_a / inv_sum);
    b.position += normal * (overlap * inv_b / inv_sum);

    let approach = (b.velocity - a.velocity).dot(normal);
    if approach < 0.0 {
        let j = -(1.0 + restitution) * approach / inv_sum;
        a.velocity -= normal * (j * inv_a);
        b.velocity += normal * (j * inv_b);
    }
}

/// Ease every radius toward its target without overshoot, then refresh mass.
pub fn ease_radii(particles: &mut [Particle], dt: f64, config: &PhysicsConfig) {
    let k = 1.0 - (-dt * config.radius_ease_rate).exp();
    for p in particles.iter_mut() {
        p.radius += (p.target_radius - p.radius) * k;
        p.radius = p.radius.max(0.0);
        p.refresh_mass();
    }
}

/// Give every free body a random kick of at most `max_speed`.
pub fn seed_velocities(particles: &mut [Particle], spawner: &mut Spawner, max_speed: f64) {
    for p in particles.iter_mut().filter(|p| p.is_free_body()) {
        p.velocity = spawner.random_velocity(max_speed);
    }
}

/// Total kinetic energy of unpinned bodies.
pub fn kinetic_energy(particles: &[Particle]) -> f64 {
    particles
        .iter()
        .filter(|p| !p.pinned)
        .map(|p| 0.5 * p.mass * p.velocity.length_squared())
        .sum()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ball(id: &str, x: f64, y: f64, r: f64) -> Particle {
        Particle::new(id, id, DVec2::new(x, y), 0.0).with_radius(r)
    }

    #[test]
    fn test_clamp_dt() {
        assert_eq!(clamp_dt(-1.0, 0.05), 0.0);
        assert_eq!(clamp_dt(1.0, 0.05), 0.05);
        assert_eq!(clamp_dt(f64::NAN, 0.05), 0.0);
    }

    #[test]
    fn test_map_converges_without_drift() {
        let config = PhysicsConfig::default();
        let mut p = vec![ball("a", 0.0, 0.0, 10.0)];
        p[0].anchor = DVec2::new(100.0, 50.0);

        for i in 0..600 {
            step_map(&mut p, i as f64 / 60.0, 1.0 / 60.0, 0.0, &config);
        }
        assert!(p[0].position.distance(p[0].anchor) < 1e-6);
    }

    #[test]
    fn test_map_ignores_pinned() {
        let config = PhysicsConfig::default();
        let mut p = vec![ball("a", 0.0, 0.0, 10.0)];
        p[0].anchor = DVec2::new(100.0, 50.0);
        p[0].pinned = true;
        step_map(&mut p, 0.0, 1.0 / 60.0, 1.0, &config);
        assert_eq!(p[0].position, DVec2::ZERO);
    }

    #[test]
    fn test_walls_reflect() {
        let bounds = Bounds::from_size(DVec2::new(100.0, 100.0));
        let mut p = vec![ball("a", 5.0, 50.0, 10.0).with_velocity(DVec2::new(-3.0, 1.0))];
        contain(&mut p, &bounds);

        assert_eq!(p[0].position.x, 10.0);
        assert_eq!(p[0].velocity, DVec2::new(3.0, 1.0));
    }

    #[test]
    fn test_pair_separation() {
        let config = PhysicsConfig::default();
        let mut p = vec![ball("a", 0.0, 0.0, 10.0), ball("b", 15.0, 0.0, 10.0)];
        resolve_pairs(&mut p, &config);

        let gap = p[0].position.distance(p[1].position);
        assert!(gap >= 20.0 - 1e-9);
        // Equal masses share the correction.
        assert!((p[0].position.x + 2.5).abs() < 1e-9);
    }

    #[test]
    fn test_head_on_equal_masses_swap() {
        let config = PhysicsConfig::default();
        let mut p = vec![
            ball("a", 0.0, 0.0, 10.0).with_velocity(DVec2::new(2.0, 0.0)),
            ball("b", 19.0, 0.0, 10.0).with_velocity(DVec2::new(-2.0, 0.0)),
        ];
        let before = kinetic_energy(&p);
        resolve_pairs(&mut p, &config);

        assert!((p[0].velocity.x + 2.0 * config.restitution).abs() < 1e-9);
        assert!((p[1].velocity.x - 2.0 * config.restitution).abs() < 1e-9);
        assert!(kinetic_energy(&p) <= before);
    }

    #[test]
    fn test_pinned_deflects_without_moving() {
        let config = PhysicsConfig::default();
        let mut p = vec![
            ball("wall", 0.0, 0.0, 10.0),
            ball("b", 18.0, 0.0, 10.0).with_velocity(DVec2::new(-2.0, 0.0)),
        ];
        p[0].pinned = true;
        resolve_pairs(&mut p, &config);

        assert_eq!(p[0].position, DVec2::ZERO);
        assert_eq!(p[0].velocity, DVec2::ZERO);
        assert!(p[1].velocity.x > 0.0);
        assert!(p[1].position.x >= 20.0 - 1e-9);
    }

    #[test]
    fn test_coincident_centers_use_fixed_normal() {
        let config = PhysicsConfig::default();
        let mut p = vec![ball("a", 50.0, 50.0, 10.0), ball("b", 50.0, 50.0, 10.0)];
        resolve_pairs(&mut p, &config);
        assert!(p[0].position.x < p[1].position.x);
        assert_eq!(p[0].position.y, p[1].position.y);
    }

    #[test]
    fn test_tiny_and_captured_are_skipped() {
        let config = PhysicsConfig::default();
        let mut p = vec![ball("a", 0.0, 0.0, 10.0), ball("b", 0.0, 0.0, 0.4)];
        resolve_pairs(&mut p, &config);
        assert_eq!(p[1].position, DVec2::ZERO);
    }

    #[test]
    fn test_radius_eases_without_overshoot() {
        let config = PhysicsConfig::default();
        let mut p = vec![Particle::new("a", "A", DVec2::ZERO, 0.0)];
        p[0].target_radius = 20.0;
        let mut last = 0.0;
        for _ in 0..120 {
            ease_radii(&mut p, 1.0 / 60.0, &config);
            assert!(p[0].radius >= last && p[0].radius <= 20.0);
            last = p[0].radius;
        }
        assert!(p[0].radius > 19.9);
    }

    #[test]
    fn test_drag_slows_bodies() {
        let config = PhysicsConfig::default();
        let mut p = vec![ball("a", 0.0, 0.0, 10.0).with_velocity(DVec2::new(5.0, 0.0))];
        integrate(&mut p, 1.0 / 60.0, &config);
        assert!((p[0].velocity.x - 5.0 * config.drag).abs() < 1e-9);
        assert!((p[0].position.x - 5.0 * config.drag).abs() < 1e-9);
    }

    #[test]
    fn test_mode_parse() {
        assert_eq!("GAME".parse::<Mode>().unwrap(), Mode::Game);
        assert!(matches!("pinball".parse::<Mode>(), Err(SwarmError::UnknownMode(_))));
    }
}
