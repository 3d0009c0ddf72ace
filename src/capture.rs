//! Pocket capture for the game regime.
//!
//! Each particle moves through a small state machine once per tick, after
//! integration:
//!
//! ```text
//! Free --(inside capture radius, slow)--> Dwelling
//! Dwelling --(left, sped up or pinned)--> Free
//! Dwelling --(dwell_secs elapsed)-------> Falling
//! Falling --(fall_secs elapsed)---------> Removed
//! ```
//!
//! `Removed` particles are pruned from the live set by [`prune_removed`].

use glam::DVec2;

use crate::config::CaptureConfig;
use crate::particle::Particle;
use crate::physics::Bounds;

/// Pockets never shrink below this radius, in pixels.
pub const POCKET_MIN_RADIUS: f64 = 18.0;

/// Pocket radius relative to the largest particle radius.
pub const POCKET_RADIUS_FACTOR: f64 = 1.25;

/// Where a particle is in the pocket lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub enum CaptureState {
    #[default]
    Free,
    /// Resting inside a capture radius.
    Dwelling { elapsed: f64 },
    /// Dropping into `pocket` (an index into the pocket list).
    Falling { elapsed: f64, pocket: usize },
    Removed,
}

impl CaptureState {
    /// Falling or removed. Captured particles are excluded from physics.
    pub fn is_captured(&self) -> bool {
        matches!(self, CaptureState::Falling { .. } | CaptureState::Removed)
    }

    pub fn is_falling(&self) -> bool {
        matches!(self, CaptureState::Falling { .. })
    }

    /// Fall progress in `[0, 1]`. Zero unless falling, one once removed.
    pub fn fall_progress(&self, fall_secs: f64) -> f64 {
        match *self {
            CaptureState::Falling { elapsed, .. } if fall_secs > 0.0 => (elapsed / fall_secs).clamp(0.0, 1.0),
            CaptureState::Falling { .. } | CaptureState::Removed => 1.0,
            _ => 0.0,
        }
    }
}

/// A circular pocket.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SinkZone {
    pub center: DVec2,
    pub radius: f64,
}

impl SinkZone {
    pub fn new(center: DVec2, radius: f64) -> Self {
        Self { center, radius }
    }

    /// Pocket radius for a given largest particle radius.
    pub fn radius_for(max_particle_radius: f64) -> f64 {
        (max_particle_radius * POCKET_RADIUS_FACTOR).max(POCKET_MIN_RADIUS)
    }

    /// Six billiard pockets: the four corners plus the midpoints of the two
    /// long walls. Centers are inset from the walls by half the radius.
    pub fn table_pockets(bounds: &Bounds, radius: f64) -> Vec<SinkZone> {
        let inset = radius * 0.5;
        let min = bounds.min + DVec2::splat(inset);
        let max = bounds.max - DVec2::splat(inset);
        let mid = bounds.center();

        let mut pockets = vec![
            SinkZone::new(DVec2::new(min.x, min.y), radius),
            SinkZone::new(DVec2::new(max.x, min.y), radius),
            SinkZone::new(DVec2::new(min.x, max.y), radius),
            SinkZone::new(DVec2::new(max.x, max.y), radius),
        ];
        if bounds.width() >= bounds.height() {
            pockets.push(SinkZone::new(DVec2::new(mid.x, min.y), radius));
            pockets.push(SinkZone::new(DVec2::new(mid.x, max.y), radius));
        } else {
            pockets.push(SinkZone::new(DVec2::new(min.x, mid.y), radius));
            pockets.push(SinkZone::new(DVec2::new(max.x, mid.y), radius));
        }
        pockets
    }

    /// Whether `point` is within the capture radius of this pocket.
    pub fn captures(&self, point: DVec2, capture_fraction: f64) -> bool {
        point.distance_squared(self.center) <= (self.radius * capture_fraction).powi(2)
    }
}

fn capturing_pocket(pockets: &[SinkZone], point: DVec2, capture_fraction: f64) -> Option<usize> {
    pockets.iter().position(|z| z.captures(point, capture_fraction))
}

/// Advance one particle's capture state by `dt` seconds.
pub fn advance(particle: &mut Particle, pockets: &[SinkZone], dt: f64, config: &CaptureConfig) {
    let slow = particle.speed() <= config.speed_threshold;

    particle.capture = match particle.capture {
        CaptureState::Free => {
            let inside = capturing_pocket(pockets, particle.position, config.capture_fraction);
            if !particle.pinned && particle.has_body() && slow && inside.is_some() {
                CaptureState::Dwelling { elapsed: 0.0 }
            } else {
                CaptureState::Free
            }
        }
        CaptureState::Dwelling { elapsed } => {
            let inside = capturing_pocket(pockets, particle.position, config.capture_fraction);
            match inside {
                Some(pocket) if !particle.pinned && slow => {
                    let elapsed = elapsed + dt;
                    if elapsed >= config.dwell_secs {
                        particle.velocity = DVec2::ZERO;
                        CaptureState::Falling { elapsed: 0.0, pocket }
                    } else {
                        CaptureState::Dwelling { elapsed }
                    }
                }
                _ => CaptureState::Free,
            }
        }
        CaptureState::Falling { elapsed, pocket } => {
            let elapsed = elapsed + dt;
            if let Some(zone) = pockets.get(pocket) {
                let pull = (dt / config.fall_secs.max(f64::EPSILON)).clamp(0.0, 1.0);
                particle.position = particle.position.lerp(zone.center, pull);
            }
            if elapsed > config.fall_secs {
                CaptureState::Removed
            } else {
                CaptureState::Falling { elapsed, pocket }
            }
        }
        CaptureState::Removed => CaptureState::Removed,
    };
}

/// Advance every particle. Runs once per game tick.
pub fn update(particles: &mut [Particle], pockets: &[SinkZone], dt: f64, config: &CaptureConfig) {
    for particle in particles.iter_mut() {
        advance(particle, pockets, dt, config);
    }
}

/// Drop removed particles and return their ids in list order.
pub fn prune_removed(particles: &mut Vec<Particle>) -> Vec<String> {
    let mut removed = Vec::new();
    particles.retain(|p| {
        if matches!(p.capture, CaptureState::Removed) {
            removed.push(p.id.clone());
            false
        } else {
            true
        }
    });
    removed
}

#[cfg(test)]
mod tests {
    use super::*;

    fn table() -> (Vec<SinkZone>, CaptureConfig) {
        let bounds = Bounds::new(DVec2::ZERO, DVec2::new(800.0, 400.0));
        (SinkZone::table_pockets(&bounds, 40.0), CaptureConfig::default())
    }

    fn ball_at(position: DVec2) -> Particle {
        Particle::new("ball", "BALL", position, 0.0).with_radius(10.0)
    }

    #[test]
    fn test_pocket_layout() {
        let (pockets, _) = table();
        assert_eq!(pockets.len(), 6);
        assert_eq!(pockets[0].center, DVec2::new(20.0, 20.0));
        assert_eq!(pockets[3].center, DVec2::new(780.0, 380.0));
        // Long walls are top and bottom on a wide table.
        assert_eq!(pockets[4].center, DVec2::new(400.0, 20.0));
        assert_eq!(pockets[5].center, DVec2::new(400.0, 380.0));
    }

    #[test]
    fn test_pocket_radius_floor() {
        assert_eq!(SinkZone::radius_for(4.0), POCKET_MIN_RADIUS);
        assert_eq!(SinkZone::radius_for(40.0), 50.0);
    }

    #[test]
    fn test_lifecycle_order() {
        let (pockets, config) = table();
        let mut ball = ball_at(DVec2::new(22.0, 22.0));
        let mut seen = vec![ball.capture];

        for _ in 0..100 {
            advance(&mut ball, &pockets, 0.05, &config);
            if std::mem::discriminant(&ball.capture) != std::mem::discriminant(seen.last().unwrap()) {
                seen.push(ball.capture);
            }
            if ball.capture == CaptureState::Removed {
                break;
            }
        }

        let names: Vec<&str> = seen
            .iter()
            .map(|s| match s {
                CaptureState::Free => "free",
                CaptureState::Dwelling { .. } => "dwelling",
                CaptureState::Falling { .. } => "falling",
                CaptureState::Removed => "removed",
            })
            .collect();
        assert_eq!(names, vec!["free", "dwelling", "falling", "removed"]);
    }

    #[test]
    fn test_fast_particle_is_not_captured() {
        let (pockets, config) = table();
        let mut ball = ball_at(DVec2::new(20.0, 20.0)).with_velocity(DVec2::new(5.0, 0.0));
        advance(&mut ball, &pockets, 0.05, &config);
        assert_eq!(ball.capture, CaptureState::Free);
    }

    #[test]
    fn test_leaving_resets_dwell() {
        let (pockets, config) = table();
        let mut ball = ball_at(DVec2::new(20.0, 20.0));
        advance(&mut ball, &pockets, 0.05, &config);
        advance(&mut ball, &pockets, 0.05, &config);
        assert!(matches!(ball.capture, CaptureState::Dwelling { .. }));

        ball.velocity = DVec2::new(3.0, 0.0);
        advance(&mut ball, &pockets, 0.05, &config);
        assert_eq!(ball.capture, CaptureState::Free);
    }

    #[test]
    fn test_pinned_is_never_captured() {
        let (pockets, config) = table();
        let mut ball = ball_at(DVec2::new(20.0, 20.0));
        ball.pinned = true;
        for _ in 0..20 {
            advance(&mut ball, &pockets, 0.05, &config);
        }
        assert_eq!(ball.capture, CaptureState::Free);

        ball.pinned = false;
        advance(&mut ball, &pockets, 0.05, &config);
        ball.pinned = true;
        advance(&mut ball, &pockets, 0.05, &config);
        assert_eq!(ball.capture, CaptureState::Free);
    }

    #[test]
    fn test_prune_removed() {
        let mut particles = vec![ball_at(DVec2::ZERO), ball_at(DVec2::ONE)];
        particles[0].id = "gone".into();
        particles[0].capture = CaptureState::Removed;

        let removed = prune_removed(&mut particles);
        assert_eq!(removed, vec!["gone".to_string()]);
        assert_eq!(particles.len(), 1);
    }

    #[test]
    fn test_fall_progress() {
        let falling = CaptureState::Falling { elapsed: 0.175, pocket: 0 };
        assert!((falling.fall_progress(0.35) - 0.5).abs() < 1e-12);
        assert_eq!(CaptureState::Free.fall_progress(0.35), 0.0);
        assert_eq!(CaptureState::Removed.fall_progress(0.35), 1.0);
    }
}
