//! Pan/zoom viewport.
//!
//! World space is where particles live; screen space is surface pixels. The
//! camera is a uniform scale plus a screen-space pan:
//!
//! ```text
//! screen = world * scale + pan
//! world  = (screen - pan) / scale
//! ```
//!
//! A locked camera ignores zoom and pan. The engine locks it in game mode and
//! while a modal overlay is open.

use glam::DVec2;

use crate::config::CameraConfig;
use crate::physics::Bounds;

/// Viewport transform.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Camera {
    pub scale: f64,
    pub pan: DVec2,
    min_scale: f64,
    max_scale: f64,
    zoom_step: f64,
    locked: bool,
}

impl Camera {
    pub fn new(config: &CameraConfig) -> Self {
        Self {
            scale: 1.0,
            pan: DVec2::ZERO,
            min_scale: config.min_scale,
            max_scale: config.max_scale,
            zoom_step: config.zoom_step,
            locked: false,
        }
    }

    #[inline]
    pub fn screen_to_world(&self, screen: DVec2) -> DVec2 {
        (screen - self.pan) / self.scale
    }

    #[inline]
    pub fn world_to_screen(&self, world: DVec2) -> DVec2 {
        world * self.scale + self.pan
    }

    /// Zoom by `zoom_step^notches` around `pointer`, keeping the world point
    /// under the pointer fixed. Returns whether anything changed.
    pub fn zoom_at(&mut self, pointer: DVec2, notches: f64) -> bool {
        if self.locked || !notches.is_finite() || notches == 0.0 {
            return false;
        }
        let anchor = self.screen_to_world(pointer);
        let scale = (self.scale * self.zoom_step.powf(notches)).clamp(self.min_scale, self.max_scale);
        if scale == self.scale {
            return false;
        }
        self.scale = scale;
        self.pan = pointer - anchor * scale;
        true
    }

    /// Shift the view by a screen-space delta.
    pub fn pan_by(&mut self, delta: DVec2) -> bool {
        if self.locked || !delta.is_finite() || delta == DVec2::ZERO {
            return false;
        }
        self.pan += delta;
        true
    }

    /// Back to identity.
    pub fn reset(&mut self) {
        self.scale = 1.0;
        self.pan = DVec2::ZERO;
    }

    pub fn set_locked(&mut self, locked: bool) {
        self.locked = locked;
    }

    pub fn is_locked(&self) -> bool {
        self.locked
    }

    pub fn is_identity(&self) -> bool {
        self.scale == 1.0 && self.pan == DVec2::ZERO
    }

    /// World-space rectangle visible on a surface of `size` pixels.
    pub fn visible_world_rect(&self, size: DVec2) -> Bounds {
        Bounds::new(self.screen_to_world(DVec2::ZERO), self.screen_to_world(size))
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::new(&CameraConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roundtrip_invariance() {
        let mut cam = Camera::default();
        cam.zoom_at(DVec2::new(120.0, 80.0), 3.0);
        cam.pan_by(DVec2::new(-40.0, 15.0));

        for p in [DVec2::ZERO, DVec2::new(333.0, -17.5), DVec2::new(1e4, 2e3)] {
            let back = cam.world_to_screen(cam.screen_to_world(p));
            assert!((back - p).length() < 1e-9);
        }
    }

    #[test]
    fn test_zoom_keeps_pointer_fixed() {
        let mut cam = Camera::default();
        let pointer = DVec2::new(250.0, 140.0);
        let before = cam.screen_to_world(pointer);

        for notches in [1.0, 4.0, -2.0, 0.5] {
            cam.zoom_at(pointer, notches);
            assert!((cam.screen_to_world(pointer) - before).length() < 1e-9);
        }
    }

    #[test]
    fn test_zoom_is_clamped() {
        let mut cam = Camera::default();
        cam.zoom_at(DVec2::ZERO, 1000.0);
        assert_eq!(cam.scale, 10.0);
        cam.zoom_at(DVec2::ZERO, -1000.0);
        assert_eq!(cam.scale, 0.1);
        assert!(!cam.zoom_at(DVec2::ZERO, -1.0));
    }

    #[test]
    fn test_locked_camera_ignores_input() {
        let mut cam = Camera::default();
        cam.set_locked(true);
        assert!(!cam.zoom_at(DVec2::new(10.0, 10.0), 2.0));
        assert!(!cam.pan_by(DVec2::new(5.0, 5.0)));
        assert!(cam.is_identity());
    }

    #[test]
    fn test_visible_rect_follows_zoom() {
        let mut cam = Camera::default();
        cam.zoom_at(DVec2::ZERO, 0.0);
        let size = DVec2::new(800.0, 600.0);
        assert_eq!(cam.visible_world_rect(size), Bounds::new(DVec2::ZERO, size));

        cam.scale = 2.0;
        assert_eq!(cam.visible_world_rect(size).max, DVec2::new(400.0, 300.0));
    }
}
