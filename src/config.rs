//! Tunable parameters for the swarm engine.
//!
//! Every section has sensible defaults, so a JSON file only needs to name the
//! values it wants to change:
//!
//! ```json
//! {
//!   "entity_limit": 80,
//!   "physics": { "restitution": 0.95 },
//!   "render": { "trails": false }
//! }
//! ```

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::error::SwarmError;

/// Complete engine configuration.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SwarmConfig {
    /// Maximum number of simulated particles. Extra entities are truncated.
    pub entity_limit: usize,
    /// Fraction of the surface covered by particle discs at their target radii.
    pub fill_fraction: f64,
    /// Smallest radius as a fraction of the largest one.
    pub min_radius_ratio: f64,
    /// Strength of the map-mode drift wobble (0 = perfectly still).
    pub float_strength: f64,
    /// Seed for spawn positions, phases and velocities. `None` seeds from the clock.
    pub seed: Option<u64>,
    pub physics: PhysicsConfig,
    pub capture: CaptureConfig,
    pub interaction: InteractionConfig,
    pub camera: CameraConfig,
    pub render: RenderConfig,
}

impl Default for SwarmConfig {
    fn default() -> Self {
        Self {
            entity_limit: 50,
            fill_fraction: 0.875,
            min_radius_ratio: 0.3,
            float_strength: 1.0,
            seed: None,
            physics: PhysicsConfig::default(),
            capture: CaptureConfig::default(),
            interaction: InteractionConfig::default(),
            camera: CameraConfig::default(),
            render: RenderConfig::default(),
        }
    }
}

/// Integration and collision parameters.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Per-frame (at 60 fps) smoothing factor toward the map target.
    pub drift_smoothing: f64,
    /// Drift wobble amplitude in world units per unit of float strength.
    pub drift_amplitude: f64,
    /// Per-frame (at 60 fps) velocity retention in game mode.
    pub drag: f64,
    /// Multiplier turning `velocity * dt` into world units.
    pub speed_scale: f64,
    /// Coefficient of restitution for particle pairs.
    pub restitution: f64,
    /// Number of pair-resolution sweeps per step.
    pub solver_iterations: u32,
    /// Largest random speed given to particles when a game starts.
    pub initial_speed: f64,
    /// Rate (1/s) at which radius eases toward its target.
    pub radius_ease_rate: f64,
    /// Frame time ceiling in seconds.
    pub max_dt: f64,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            drift_smoothing: 0.08,
            drift_amplitude: 6.0,
            drag: 0.985,
            speed_scale: 60.0,
            restitution: 0.98,
            solver_iterations: 3,
            initial_speed: 4.0,
            radius_ease_rate: 8.0,
            max_dt: 0.05,
        }
    }
}

/// Pocket capture thresholds.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CaptureConfig {
    /// Capture radius as a fraction of the pocket radius.
    pub capture_fraction: f64,
    /// A particle counts as resting at or below this speed.
    pub speed_threshold: f64,
    /// Seconds a resting particle must dwell before it falls.
    pub dwell_secs: f64,
    /// Seconds the fall animation lasts before removal.
    pub fall_secs: f64,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            capture_fraction: 0.75,
            speed_threshold: 0.35,
            dwell_secs: 0.35,
            fall_secs: 0.35,
        }
    }
}

/// Pointer gesture tuning.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct InteractionConfig {
    /// Extra screen pixels added to a particle's radius when hit testing.
    pub hit_tolerance_px: f64,
    /// Pointer travel (screen px) below which a press-release counts as a click.
    pub click_slop_px: f64,
    /// Longest aim draw that still adds power.
    pub max_draw_distance: f64,
    /// Speed given to the cue at full draw.
    pub max_shot_power: f64,
    /// Speed given to the cue for the shortest possible draw.
    pub min_shot_power: f64,
    /// Largest speed a thrown particle keeps on release.
    pub throw_speed_cap: f64,
}

impl Default for InteractionConfig {
    fn default() -> Self {
        Self {
            hit_tolerance_px: 5.0,
            click_slop_px: 4.0,
            max_draw_distance: 150.0,
            max_shot_power: 30.0,
            min_shot_power: 1.5,
            throw_speed_cap: 40.0,
        }
    }
}

/// Camera zoom limits.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct CameraConfig {
    pub min_scale: f64,
    pub max_scale: f64,
    /// Multiplicative zoom per wheel notch.
    pub zoom_step: f64,
}

impl Default for CameraConfig {
    fn default() -> Self {
        Self {
            min_scale: 0.1,
            max_scale: 10.0,
            zoom_step: 1.1,
        }
    }
}

/// Renderer options.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RenderConfig {
    pub trails: bool,
    pub trail_max_points: usize,
    /// Screen distance a particle must travel before a new trail point is stored.
    pub trail_min_distance: f64,
    /// Life lost by every trail point each frame.
    pub trail_decay: f32,
    /// Trail points below this life are discarded.
    pub trail_min_life: f32,
    /// Screen radius above which the symbol label is drawn.
    pub label_min_radius: f64,
    pub show_icons: bool,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            trails: true,
            trail_max_points: 24,
            trail_min_distance: 2.0,
            trail_decay: 0.06,
            trail_min_life: 0.05,
            label_min_radius: 14.0,
            show_icons: true,
        }
    }
}

impl SwarmConfig {
    /// Save the configuration to a JSON file.
    pub fn save(&self, path: impl AsRef<Path>) -> Result<(), SwarmError> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    /// Load and validate a configuration from a JSON file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, SwarmError> {
        let json = fs::read_to_string(path.as_ref())?;
        let config = Self::from_json(&json)?;
        log::info!("loaded swarm config from {}", path.as_ref().display());
        Ok(config)
    }

    /// Parse and validate a configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self, SwarmError> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot work with.
    pub fn validate(&self) -> Result<(), SwarmError> {
        fn check(ok: bool, msg: &str) -> Result<(), SwarmError> {
            if ok {
                Ok(())
            } else {
                Err(SwarmError::InvalidConfig(msg.to_string()))
            }
        }

        check(self.entity_limit >= 1, "entity_limit must be at least 1")?;
        check(
            self.fill_fraction > 0.0 && self.fill_fraction <= 1.0,
            "fill_fraction must be in (0, 1]",
        )?;
        check(
            (0.0..=1.0).contains(&self.min_radius_ratio),
            "min_radius_ratio must be in [0, 1]",
        )?;
        check(self.float_strength >= 0.0, "float_strength must be non-negative")?;

        let p = &self.physics;
        check(
            p.drift_smoothing > 0.0 && p.drift_smoothing <= 1.0,
            "physics.drift_smoothing must be in (0, 1]",
        )?;
        check(p.drag > 0.0 && p.drag <= 1.0, "physics.drag must be in (0, 1]")?;
        check(
            (0.0..=1.0).contains(&p.restitution),
            "physics.restitution must be in [0, 1]",
        )?;
        check(p.solver_iterations >= 1, "physics.solver_iterations must be at least 1")?;
        check(p.speed_scale > 0.0, "physics.speed_scale must be positive")?;
        check(p.max_dt > 0.0, "physics.max_dt must be positive")?;

        let c = &self.capture;
        check(
            c.capture_fraction > 0.0 && c.capture_fraction <= 1.0,
            "capture.capture_fraction must be in (0, 1]",
        )?;
        check(c.speed_threshold >= 0.0, "capture.speed_threshold must be non-negative")?;
        check(
            c.dwell_secs > 0.0 && c.fall_secs > 0.0,
            "capture.dwell_secs and capture.fall_secs must be positive",
        )?;

        let i = &self.interaction;
        check(i.max_draw_distance > 0.0, "interaction.max_draw_distance must be positive")?;
        check(
            i.min_shot_power > 0.0 && i.min_shot_power <= i.max_shot_power,
            "interaction.min_shot_power must be positive and not exceed max_shot_power",
        )?;

        let cam = &self.camera;
        check(
            cam.min_scale > 0.0 && cam.min_scale <= cam.max_scale,
            "camera.min_scale must be positive and not exceed camera.max_scale",
        )?;
        check(cam.zoom_step > 1.0, "camera.zoom_step must be greater than 1")?;

        Ok(())
    }
}
