//! # coinswarm - Market Swarm Particle Engine
//!
//! A real-time 2D particle engine for crypto market dashboards. Each tracked
//! asset becomes a circle whose size, color and position encode its market
//! data. The swarm runs in two regimes:
//!
//! - **Map**: particles float around anchors placed on a two-axis metric plot
//!   (market cap against price change by default). Clicking a particle selects it.
//! - **Game**: the plot turns into a billiards table. Particles collide, bounce
//!   off the walls and fall into six corner and side pockets. The cue particle
//!   is shot with a drag-and-release gesture.
//!
//! ## Quick Start
//!
//! ```ignore
//! use coinswarm::prelude::*;
//!
//! fn main() -> Result<(), SwarmError> {
//!     let mut swarm = Swarm::new(SwarmConfig::default())?;
//!     swarm.set_entities(vec![
//!         MarketEntity::new("bitcoin", "BTC").with_change(2.4).with_market_cap(1.3e12),
//!         MarketEntity::new("ethereum", "ETH").with_change(-1.1).with_market_cap(4.1e11),
//!     ]);
//!     swarm.on_select(|id| println!("selected {id}"));
//!     coinswarm::window::run(swarm)
//! }
//! ```
//!
//! ## Frame Loop
//!
//! A host drives the engine with two calls per frame:
//!
//! ```ignore
//! swarm.step(now_secs);
//! swarm.render(&mut surface);
//! ```
//!
//! Rendering goes through the [`DrawSurface`] trait. [`Canvas`] is a CPU
//! implementation backed by an RGBA image; the demo window uploads it to the
//! GPU each frame.
//!
//! ## Sizing
//!
//! Radii are assigned by rank. In performance mode the basis is the absolute
//! percent change over the chosen [`Timeframe`]; in capitalization mode it is
//! market cap raised to a sub-linear power. The radius band is recomputed from
//! the surface size and particle count so the swarm fills a fixed share of the
//! screen.
//!
//! ## Configuration
//!
//! [`SwarmConfig`] holds every tunable and round-trips through JSON:
//!
//! ```ignore
//! let config = SwarmConfig::load("swarm.json")?;
//! config.save("swarm.json")?;
//! ```

pub mod camera;
pub mod capture;
pub mod config;
pub mod engine;
pub mod entity;
pub mod error;
pub mod gpu;
pub mod icons;
pub mod input;
pub mod interaction;
pub mod mapper;
pub mod particle;
pub mod physics;
pub mod projector;
pub mod raster;
pub mod render;
pub mod spawn;
pub mod time;
pub mod visuals;
pub mod window;

pub use camera::Camera;
pub use capture::{CaptureState, SinkZone};
pub use config::{CameraConfig, CaptureConfig, InteractionConfig, PhysicsConfig, RenderConfig, SwarmConfig};
pub use engine::Swarm;
pub use entity::{MarketEntity, SizingMode, Timeframe};
pub use error::{GpuError, SwarmError};
pub use glam::{DVec2, Vec4};
pub use icons::{Icon, IconRegistry};
pub use input::{InputEvent, KeyCode, PointerTracker};
pub use interaction::{AimState, Gesture, InteractionController, Notification};
pub use mapper::RadiusBand;
pub use particle::Particle;
pub use physics::{Bounds, Mode};
pub use projector::{AxisScale, AxisSpec, Metric, MetricPair, PlotLayout, Projection};
pub use raster::Canvas;
pub use render::{DrawSurface, Renderer, TextAlign};
pub use spawn::Spawner;
pub use time::FrameClock;
pub use visuals::{Color, Palette, Theme};

/// Convenient re-exports for common usage.
///
/// # Usage
///
/// ```ignore
/// use coinswarm::prelude::*;
/// ```
///
/// This imports:
/// - [`Swarm`] - the engine
/// - [`SwarmConfig`] - configuration
/// - [`MarketEntity`] - input records
/// - [`Mode`], [`SizingMode`], [`Timeframe`], [`MetricPair`] - display settings
/// - [`Canvas`] and [`DrawSurface`] - rendering
/// - [`DVec2`] - glam vector type used for all positions
pub mod prelude {
    pub use crate::config::SwarmConfig;
    pub use crate::engine::Swarm;
    pub use crate::entity::{MarketEntity, SizingMode, Timeframe};
    pub use crate::error::SwarmError;
    pub use crate::input::{InputEvent, KeyCode};
    pub use crate::physics::Mode;
    pub use crate::projector::{AxisScale, AxisSpec, Metric, MetricPair};
    pub use crate::raster::Canvas;
    pub use crate::render::{DrawSurface, TextAlign};
    pub use crate::time::FrameClock;
    pub use crate::visuals::{Palette, Theme};
    pub use crate::DVec2;
}
