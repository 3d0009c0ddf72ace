//! Pointer gestures.
//!
//! The controller turns pointer events into hover, pan, drag-throw,
//! aim-and-shoot and click-to-open. Exactly one [`Gesture`] is active at a
//! time. Events that make no sense for the current gesture (an up without a
//! down, a drag whose particle vanished) are ignored.
//!
//! Handlers return [`Notification`]s instead of calling back directly, so the
//! engine decides when host callbacks run.

use glam::DVec2;

use crate::camera::Camera;
use crate::config::InteractionConfig;
use crate::particle::Particle;
use crate::physics::Mode;

/// Share of the previous throw velocity kept on each step.
const DRAG_VELOCITY_BLEND: f64 = 0.5;

/// Something the host should hear about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// The particle under the pointer changed.
    HoverChanged(Option<String>),
    /// A particle was clicked in map mode.
    Selected(String),
}

/// In-progress shot on the cue.
#[derive(Debug, Clone, PartialEq)]
pub struct AimState {
    pub cue_id: String,
    /// Cue position at pointer-down.
    pub pivot: DVec2,
    /// Current pointer position in world space.
    pub draw: DVec2,
}

impl AimState {
    /// Shot direction: away from the draw point. A zero-length draw shoots along +x.
    pub fn direction(&self) -> DVec2 {
        let d = self.draw - self.pivot;
        if d.length_squared() > 1e-18 {
            -d.normalize()
        } else {
            DVec2::X
        }
    }

    /// Shot speed for the current draw length.
    pub fn power(&self, config: &InteractionConfig) -> f64 {
        let len = (self.draw - self.pivot).length().min(config.max_draw_distance);
        (len / config.max_draw_distance * config.max_shot_power).max(config.min_shot_power)
    }

    /// Power as a fraction of the maximum, in `[0, 1]`.
    pub fn power_fraction(&self, config: &InteractionConfig) -> f64 {
        (self.power(config) / config.max_shot_power).clamp(0.0, 1.0)
    }

    /// Velocity added to the cue on release.
    pub fn impulse(&self, config: &InteractionConfig) -> DVec2 {
        self.direction() * self.power(config)
    }
}

/// The active pointer gesture.
#[derive(Debug, Clone, PartialEq, Default)]
pub enum Gesture {
    #[default]
    Idle,
    /// Panning the camera; `last` is the previous screen position.
    Pan { last: DVec2 },
    /// Holding a particle. `pointer` is the latest world position, `last`
    /// the position seen by the previous step.
    Drag { id: String, pointer: DVec2, last: DVec2 },
    Aim(AimState),
}

/// Mutable view of engine state a pointer event may touch.
pub struct InteractionContext<'a> {
    pub particles: &'a mut [Particle],
    pub camera: &'a mut Camera,
    pub mode: Mode,
    pub cue_id: Option<&'a str>,
}

#[derive(Debug, Clone)]
struct Press {
    screen: DVec2,
    target: Option<String>,
}

/// Topmost particle under `screen`, if any.
///
/// Particles are drawn in list order, so the search runs backwards. Falling
/// and sub-epsilon particles cannot be hit.
pub fn hit_test(particles: &[Particle], camera: &Camera, screen: DVec2, tolerance: f64) -> Option<usize> {
    particles.iter().enumerate().rev().find_map(|(i, p)| {
        if !p.has_body() || p.is_captured() {
            return None;
        }
        let center = camera.world_to_screen(p.position);
        let reach = p.radius * camera.scale + tolerance;
        (center.distance_squared(screen) <= reach * reach).then_some(i)
    })
}

fn find<'p>(particles: &'p mut [Particle], id: &str) -> Option<&'p mut Particle> {
    particles.iter_mut().find(|p| p.id == id)
}

/// Gesture state machine.
#[derive(Debug, Clone)]
pub struct InteractionController {
    gesture: Gesture,
    hovered: Option<String>,
    press: Option<Press>,
    config: InteractionConfig,
}

impl InteractionController {
    pub fn new(config: InteractionConfig) -> Self {
        Self {
            gesture: Gesture::Idle,
            hovered: None,
            press: None,
            config,
        }
    }

    pub fn gesture(&self) -> &Gesture {
        &self.gesture
    }

    pub fn hovered(&self) -> Option<&str> {
        self.hovered.as_deref()
    }

    /// Current aim, while aiming.
    pub fn aim(&self) -> Option<&AimState> {
        match &self.gesture {
            Gesture::Aim(aim) => Some(aim),
            _ => None,
        }
    }

    pub fn config(&self) -> &InteractionConfig {
        &self.config
    }

    pub fn set_config(&mut self, config: InteractionConfig) {
        self.config = config;
    }

    // ========== Pointer events ==========

    pub fn pointer_down(&mut self, screen: DVec2, ctx: InteractionContext<'_>) -> Vec<Notification> {
        if self.gesture != Gesture::Idle {
            return Vec::new();
        }

        let hit = hit_test(ctx.particles, ctx.camera, screen, self.config.hit_tolerance_px);
        let world = ctx.camera.screen_to_world(screen);
        self.press = Some(Press {
            screen,
            target: hit.map(|i| ctx.particles[i].id.clone()),
        });

        self.gesture = match hit {
            Some(i) => {
                let p = &mut ctx.particles[i];
                let is_cue = ctx.cue_id == Some(p.id.as_str());
                if ctx.mode == Mode::Game && is_cue {
                    Gesture::Aim(AimState {
                        cue_id: p.id.clone(),
                        pivot: p.position,
                        draw: world,
                    })
                } else {
                    p.pinned = true;
                    p.velocity = DVec2::ZERO;
                    Gesture::Drag {
                        id: p.id.clone(),
                        pointer: world,
                        last: world,
                    }
                }
            }
            None if ctx.mode == Mode::Map && !ctx.camera.is_locked() => Gesture::Pan { last: screen },
            None => Gesture::Idle,
        };
        Vec::new()
    }

    pub fn pointer_move(&mut self, screen: DVec2, ctx: InteractionContext<'_>) -> Vec<Notification> {
        match &mut self.gesture {
            Gesture::Idle => {
                let hit = hit_test(ctx.particles, ctx.camera, screen, self.config.hit_tolerance_px);
                let id = hit.map(|i| ctx.particles[i].id.clone());
                return self.set_hover(id).into_iter().collect();
            }
            Gesture::Pan { last } => {
                ctx.camera.pan_by(screen - *last);
                *last = screen;
            }
            Gesture::Drag { id, pointer, .. } => {
                let world = ctx.camera.screen_to_world(screen);
                match find(ctx.particles, id) {
                    Some(p) => {
                        p.position = world;
                        *pointer = world;
                    }
                    None => self.gesture = Gesture::Idle,
                }
            }
            Gesture::Aim(aim) => {
                aim.draw = ctx.camera.screen_to_world(screen);
            }
        }
        Vec::new()
    }

    pub fn pointer_up(&mut self, screen: DVec2, ctx: InteractionContext<'_>) -> Vec<Notification> {
        let press = self.press.take();
        let mut out = Vec::new();

        match std::mem::take(&mut self.gesture) {
            Gesture::Idle | Gesture::Pan { .. } => {}
            Gesture::Drag { id, .. } => {
                if let Some(p) = find(ctx.particles, &id) {
                    p.pinned = false;
                }
            }
            Gesture::Aim(aim) => {
                let impulse = aim.impulse(&self.config);
                if let Some(cue) = find(ctx.particles, &aim.cue_id) {
                    cue.velocity += impulse;
                    log::debug!("shot {} with power {:.1}", aim.cue_id, aim.power(&self.config));
                }
            }
        }

        if ctx.mode == Mode::Map {
            if let Some(Press { screen: start, target: Some(id) }) = press {
                let still = start.distance(screen) < self.config.click_slop_px;
                let hit = hit_test(ctx.particles, ctx.camera, screen, self.config.hit_tolerance_px);
                if still && hit.map(|i| ctx.particles[i].id.as_str()) == Some(id.as_str()) {
                    out.push(Notification::Selected(id));
                }
            }
        }
        out
    }

    /// Turn pointer travel since the previous step into the held particle's
    /// velocity, in world units per 60 Hz frame. Blended with the previous
    /// value and capped at `throw_speed_cap`. A zero `dt` changes nothing.
    pub fn update_drag(&mut self, particles: &mut [Particle], dt: f64) {
        let Gesture::Drag { id, pointer, last } = &mut self.gesture else {
            return;
        };
        if dt <= 0.0 {
            return;
        }
        if let Some(p) = find(particles, id) {
            let per_frame = (*pointer - *last) / (dt * 60.0);
            let blended = p.velocity * DRAG_VELOCITY_BLEND + per_frame * (1.0 - DRAG_VELOCITY_BLEND);
            p.velocity = blended.clamp_length_max(self.config.throw_speed_cap);
        }
        *last = *pointer;
    }

    /// The pointer left the surface: throw any drag, end pans, drop aims, clear hover.
    pub fn pointer_leave(&mut self, particles: &mut [Particle]) -> Vec<Notification> {
        self.press = None;
        if let Gesture::Drag { id, .. } = std::mem::take(&mut self.gesture) {
            if let Some(p) = find(particles, &id) {
                p.pinned = false;
            }
        }
        self.set_hover(None).into_iter().collect()
    }

    /// Abort the current gesture. Calling it again does nothing.
    pub fn cancel(&mut self, particles: &mut [Particle]) {
        self.press = None;
        if let Gesture::Drag { id, .. } = std::mem::take(&mut self.gesture) {
            if let Some(p) = find(particles, &id) {
                p.pinned = false;
                p.velocity = DVec2::ZERO;
            }
        }
    }

    /// Forget gestures and hover that point at particles no longer live.
    pub fn retain_live(&mut self, particles: &[Particle]) -> Option<Notification> {
        let live = |id: &str| particles.iter().any(|p| p.id == id && !p.is_captured());

        let stale = match &self.gesture {
            Gesture::Drag { id, .. } => !live(id),
            Gesture::Aim(aim) => !live(&aim.cue_id),
            _ => false,
        };
        if stale {
            self.gesture = Gesture::Idle;
            self.press = None;
        }

        match self.hovered.as_deref() {
            Some(id) if !live(id) => self.set_hover(None),
            _ => None,
        }
    }

    fn set_hover(&mut self, id: Option<String>) -> Option<Notification> {
        if self.hovered == id {
            return None;
        }
        self.hovered = id.clone();
        Some(Notification::HoverChanged(id))
    }
}

impl Default for InteractionController {
    fn default() -> Self {
        Self::new(InteractionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Rig {
        particles: Vec<Particle>,
        camera: Camera,
        mode: Mode,
        cue: Option<String>,
        ctl: InteractionController,
    }

    impl Rig {
        fn new(mode: Mode) -> Self {
            let particles = vec![
                Particle::new("cue", "CUE", DVec2::new(100.0, 100.0), 0.0).with_radius(10.0),
                Particle::new("btc", "BTC", DVec2::new(300.0, 100.0), 0.0).with_radius(20.0),
            ];
            Self {
                particles,
                camera: Camera::default(),
                mode,
                cue: (mode == Mode::Game).then(|| "cue".to_string()),
                ctl: InteractionController::default(),
            }
        }

        fn down(&mut self, x: f64, y: f64) -> Vec<Notification> {
            let ctx = InteractionContext {
                particles: &mut self.particles,
                camera: &mut self.camera,
                mode: self.mode,
                cue_id: self.cue.as_deref(),
            };
            self.ctl.pointer_down(DVec2::new(x, y), ctx)
        }

        fn moved(&mut self, x: f64, y: f64) -> Vec<Notification> {
            let ctx = InteractionContext {
                particles: &mut self.particles,
                camera: &mut self.camera,
                mode: self.mode,
                cue_id: self.cue.as_deref(),
            };
            self.ctl.pointer_move(DVec2::new(x, y), ctx)
        }

        fn up(&mut self, x: f64, y: f64) -> Vec<Notification> {
            let ctx = InteractionContext {
                particles: &mut self.particles,
                camera: &mut self.camera,
                mode: self.mode,
                cue_id: self.cue.as_deref(),
            };
            self.ctl.pointer_up(DVec2::new(x, y), ctx)
        }
    }

    #[test]
    fn test_hit_test_tolerance_and_order() {
        let mut rig = Rig::new(Mode::Map);
        let cam = Camera::default();
        assert_eq!(hit_test(&rig.particles, &cam, DVec2::new(114.0, 100.0), 5.0), Some(0));
        assert_eq!(hit_test(&rig.particles, &cam, DVec2::new(116.0, 100.0), 5.0), None);

        rig.particles[1].position = DVec2::new(105.0, 100.0);
        assert_eq!(hit_test(&rig.particles, &cam, DVec2::new(100.0, 100.0), 5.0), Some(1));
    }

    #[test]
    fn test_hover_notifies_on_change_only() {
        let mut rig = Rig::new(Mode::Map);
        assert_eq!(rig.moved(300.0, 100.0), vec![Notification::HoverChanged(Some("btc".into()))]);
        assert!(rig.moved(305.0, 100.0).is_empty());
        assert_eq!(rig.moved(600.0, 600.0), vec![Notification::HoverChanged(None)]);
    }

    #[test]
    fn test_aim_and_release() {
        let mut rig = Rig::new(Mode::Game);
        rig.down(100.0, 100.0);
        assert!(rig.ctl.aim().is_some());

        rig.moved(40.0, 100.0);
        rig.up(40.0, 100.0);

        let config = InteractionConfig::default();
        let v = rig.particles[0].velocity;
        assert!(v.x > 0.0);
        assert!(v.y.abs() < 1e-12);
        assert!((v.x - 60.0 / 150.0 * config.max_shot_power).abs() < 1e-9);
        assert_eq!(rig.ctl.gesture(), &Gesture::Idle);
    }

    #[test]
    fn test_pull_right_shoots_left() {
        let mut rig = Rig::new(Mode::Game);
        assert_eq!(rig.particles[0].position, DVec2::new(100.0, 100.0));
        rig.down(100.0, 100.0);
        rig.moved(150.0, 100.0);
        rig.up(150.0, 100.0);

        let v = rig.particles[0].velocity;
        assert!(v.x < 0.0);
        assert!(v.y.abs() < 1e-12);
    }

    #[test]
    fn test_zero_draw_still_shoots() {
        let mut rig = Rig::new(Mode::Game);
        rig.down(100.0, 100.0);
        rig.up(100.0, 100.0);
        let config = InteractionConfig::default();
        assert_eq!(rig.particles[0].velocity, DVec2::new(config.min_shot_power, 0.0));
    }

    #[test]
    fn test_draw_length_is_capped() {
        let config = InteractionConfig::default();
        let aim = AimState {
            cue_id: "cue".into(),
            pivot: DVec2::ZERO,
            draw: DVec2::new(0.0, 1000.0),
        };
        assert_eq!(aim.power(&config), config.max_shot_power);
        assert_eq!(aim.direction(), DVec2::new(0.0, -1.0));
    }

    #[test]
    fn test_drag_pins_and_throws() {
        let mut rig = Rig::new(Mode::Game);
        rig.particles[1].velocity = DVec2::new(3.0, 3.0);
        rig.down(300.0, 100.0);
        assert!(rig.particles[1].pinned);
        assert_eq!(rig.particles[1].velocity, DVec2::ZERO);

        rig.moved(320.0, 100.0);
        assert_eq!(rig.particles[1].position, DVec2::new(320.0, 100.0));
        assert_eq!(rig.particles[1].velocity, DVec2::ZERO);

        rig.ctl.update_drag(&mut rig.particles, 1.0 / 60.0);
        assert!((rig.particles[1].velocity - DVec2::new(10.0, 0.0)).length() < 1e-9);

        rig.moved(500.0, 100.0);
        rig.ctl.update_drag(&mut rig.particles, 1.0 / 60.0);
        assert!(rig.particles[1].velocity.length() <= InteractionConfig::default().throw_speed_cap + 1e-9);

        rig.up(500.0, 100.0);
        assert!(!rig.particles[1].pinned);
        assert!(rig.particles[1].velocity.x > 0.0);
    }

    #[test]
    fn test_throw_ignores_event_rate() {
        let dt = 1.0 / 60.0;
        let throw = |events_per_frame: usize| {
            let mut rig = Rig::new(Mode::Game);
            rig.down(300.0, 100.0);
            let mut x = 300.0;
            for _ in 0..5 {
                for _ in 0..events_per_frame {
                    x += 8.0 / events_per_frame as f64;
                    rig.moved(x, 100.0);
                }
                rig.ctl.update_drag(&mut rig.particles, dt);
            }
            rig.up(x, 100.0);
            rig.particles[1].velocity
        };

        let one = throw(1);
        assert!((one.x - 8.0 * (1.0 - 0.5f64.powi(5))).abs() < 1e-9);
        for n in [4, 16] {
            assert!((throw(n) - one).length() < 1e-9);
        }
    }

    #[test]
    fn test_throw_scales_with_frame_time() {
        // 8 px over one 30 Hz frame is 4 px per 60 Hz frame.
        let mut rig = Rig::new(Mode::Game);
        rig.down(300.0, 100.0);
        rig.moved(308.0, 100.0);
        rig.ctl.update_drag(&mut rig.particles, 1.0 / 30.0);
        assert!((rig.particles[1].velocity.x - 2.0).abs() < 1e-9);

        // No elapsed time, no change.
        rig.moved(400.0, 100.0);
        rig.ctl.update_drag(&mut rig.particles, 0.0);
        assert!((rig.particles[1].velocity.x - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_click_selects_in_map_mode() {
        let mut rig = Rig::new(Mode::Map);
        rig.down(300.0, 100.0);
        let out = rig.up(302.0, 101.0);
        assert_eq!(out, vec![Notification::Selected("btc".into())]);
    }

    #[test]
    fn test_drag_is_not_a_click() {
        let mut rig = Rig::new(Mode::Map);
        rig.down(300.0, 100.0);
        rig.moved(330.0, 100.0);
        assert!(rig.up(330.0, 100.0).is_empty());
    }

    #[test]
    fn test_pan_on_empty_space() {
        let mut rig = Rig::new(Mode::Map);
        rig.down(500.0, 500.0);
        rig.moved(520.0, 490.0);
        rig.up(520.0, 490.0);
        assert_eq!(rig.camera.pan, DVec2::new(20.0, -10.0));

        let mut game = Rig::new(Mode::Game);
        game.down(500.0, 500.0);
        assert_eq!(game.ctl.gesture(), &Gesture::Idle);
    }

    #[test]
    fn test_cancel_is_idempotent() {
        let mut rig = Rig::new(Mode::Game);
        rig.down(300.0, 100.0);
        rig.ctl.cancel(&mut rig.particles);
        rig.ctl.cancel(&mut rig.particles);
        assert!(!rig.particles[1].pinned);
        assert_eq!(rig.ctl.gesture(), &Gesture::Idle);
    }

    #[test]
    fn test_leave_drops_aim_and_hover() {
        let mut rig = Rig::new(Mode::Game);
        rig.moved(100.0, 100.0);
        rig.down(100.0, 100.0);
        rig.moved(60.0, 100.0);
        let out = rig.ctl.pointer_leave(&mut rig.particles);

        assert_eq!(out, vec![Notification::HoverChanged(None)]);
        assert_eq!(rig.particles[0].velocity, DVec2::ZERO);
        assert!(rig.up(60.0, 100.0).is_empty());
    }

    #[test]
    fn test_up_without_down_is_ignored() {
        let mut rig = Rig::new(Mode::Map);
        assert!(rig.up(300.0, 100.0).is_empty());
        assert!(!rig.particles[1].pinned);
    }

    #[test]
    fn test_vanished_drag_target_resets() {
        let mut rig = Rig::new(Mode::Game);
        rig.moved(300.0, 100.0);
        rig.down(300.0, 100.0);
        rig.particles.remove(1);

        let note = rig.ctl.retain_live(&rig.particles);
        assert_eq!(note, Some(Notification::HoverChanged(None)));
        assert_eq!(rig.ctl.gesture(), &Gesture::Idle);
        assert!(rig.moved(310.0, 100.0).is_empty());
    }
}
