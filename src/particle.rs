//! Simulated bodies.
//!
//! A [`Particle`] is the engine's view of one selected entity. It carries
//! its own motion state plus the display data the renderer needs, so a frame
//! can be drawn without looking the entity up again.

use glam::DVec2;

use crate::capture::CaptureState;
use crate::visuals::Color;

/// Radii at or below this are neither drawn nor collidable.
pub const RADIUS_EPSILON: f64 = 0.5;

/// Mass per unit of disc area.
pub const MASS_PER_AREA: f64 = 0.05;

/// One body in the swarm.
#[derive(Debug, Clone, PartialEq)]
pub struct Particle {
    /// Entity id, used to re-identify the particle across refreshes.
    pub id: String,
    pub symbol: String,
    pub icon: Option<String>,
    /// Signed percent change for the active timeframe.
    pub change_pct: f64,

    pub position: DVec2,
    /// World units per 60 Hz frame.
    pub velocity: DVec2,
    pub radius: f64,
    pub target_radius: f64,
    pub mass: f64,
    pub color: Color,

    /// Held by the pointer. Physics never writes a pinned velocity.
    pub pinned: bool,
    /// Map-mode target point.
    pub anchor: DVec2,
    /// Drift phase in radians.
    pub phase: f64,
    pub capture: CaptureState,
}

impl Particle {
    /// A fresh particle with zero radius, so it grows in on the first frames.
    pub fn new(id: impl Into<String>, symbol: impl Into<String>, position: DVec2, phase: f64) -> Self {
        Self {
            id: id.into(),
            symbol: symbol.into(),
            icon: None,
            change_pct: 0.0,
            position,
            velocity: DVec2::ZERO,
            radius: 0.0,
            target_radius: 0.0,
            mass: 1.0,
            color: Color::ONE,
            pinned: false,
            anchor: position,
            phase,
            capture: CaptureState::Free,
        }
    }

    /// Set both current and target radius. Handy for tests and benches.
    pub fn with_radius(mut self, radius: f64) -> Self {
        self.radius = radius.max(0.0);
        self.target_radius = self.radius;
        self.refresh_mass();
        self
    }

    pub fn with_velocity(mut self, velocity: DVec2) -> Self {
        self.velocity = velocity;
        self
    }

    /// Recompute mass from the current radius.
    pub fn refresh_mass(&mut self) {
        self.mass = (self.radius * self.radius * MASS_PER_AREA).max(1.0);
    }

    /// Zero when pinned, so a held body acts as an immovable obstacle.
    pub fn inverse_mass(&self) -> f64 {
        if self.pinned {
            0.0
        } else {
            1.0 / self.mass
        }
    }

    pub fn speed(&self) -> f64 {
        self.velocity.length()
    }

    /// Large enough to draw, collide and hit test.
    pub fn has_body(&self) -> bool {
        self.radius > RADIUS_EPSILON
    }

    /// Falling into or already removed by a pocket.
    pub fn is_captured(&self) -> bool {
        self.capture.is_captured()
    }

    /// Takes part in pair resolution.
    pub fn is_collidable(&self) -> bool {
        self.has_body() && !self.is_captured()
    }

    /// Moved by integration and wall containment.
    pub fn is_free_body(&self) -> bool {
        !self.pinned && !self.is_captured()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mass_has_floor() {
        let tiny = Particle::new("a", "A", DVec2::ZERO, 0.0).with_radius(1.0);
        assert_eq!(tiny.mass, 1.0);

        let big = Particle::new("b", "B", DVec2::ZERO, 0.0).with_radius(20.0);
        assert!((big.mass - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_pinned_has_no_inverse_mass() {
        let mut p = Particle::new("a", "A", DVec2::ZERO, 0.0).with_radius(10.0);
        assert!(p.inverse_mass() > 0.0);
        p.pinned = true;
        assert_eq!(p.inverse_mass(), 0.0);
        assert!(!p.is_free_body());
    }

    #[test]
    fn test_new_particle_has_no_body() {
        let p = Particle::new("a", "A", DVec2::ZERO, 0.0);
        assert!(!p.has_body());
        assert!(!p.is_collidable());
    }
}
