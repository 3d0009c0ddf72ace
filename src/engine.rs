//! The swarm engine facade.
//!
//! [`Swarm`] owns every piece of simulation state and is the only thing a
//! host talks to. Per frame the host calls [`Swarm::step`] with the current
//! time and then [`Swarm::render`] with its drawing surface (or
//! [`Swarm::frame`] for both). Pointer input arrives between frames and is
//! picked up by the next step.
//!
//! # Example
//!
//! ```ignore
//! use coinswarm::prelude::*;
//!
//! let mut swarm = Swarm::new(SwarmConfig::default())?;
//! swarm.on_select(|id| println!("open details for {id}"));
//! swarm.set_entities(entities);
//!
//! let mut canvas = Canvas::new(1280, 720);
//! let mut clock = FrameClock::new();
//! loop {
//!     swarm.frame(clock.tick(), &mut canvas);
//! }
//! ```

use glam::DVec2;
use std::collections::{HashMap, HashSet};

use crate::camera::Camera;
use crate::capture::{self, SinkZone};
use crate::config::SwarmConfig;
use crate::entity::{MarketEntity, SizingMode, Timeframe};
use crate::error::SwarmError;
use crate::icons::IconRegistry;
use crate::input::{InputEvent, KeyCode};
use crate::interaction::{Gesture, InteractionContext, InteractionController, Notification};
use crate::mapper::{map_entities, RadiusBand};
use crate::particle::Particle;
use crate::physics::{self, Bounds, Mode};
use crate::projector::{MetricPair, PlotLayout, Projection};
use crate::render::{DrawSurface, Renderer, Scene};
use crate::spawn::Spawner;
use crate::visuals::Theme;

/// Surface size assumed until the first render or [`Swarm::resize`].
pub const DEFAULT_SURFACE: DVec2 = DVec2::new(800.0, 600.0);

type SelectCallback = Box<dyn FnMut(&str)>;
type HoverCallback = Box<dyn FnMut(Option<&str>)>;

/// Market swarm engine.
pub struct Swarm {
    config: SwarmConfig,
    mode: Mode,
    sizing: SizingMode,
    timeframe: Timeframe,
    metric_pair: MetricPair,

    /// Last entity list from the host, unfiltered.
    entities: Vec<MarketEntity>,
    particles: Vec<Particle>,

    surface_size: DVec2,
    band: RadiusBand,
    projection: Projection,
    layout: PlotLayout,
    bounds: Bounds,
    pockets: Vec<SinkZone>,

    camera: Camera,
    interaction: InteractionController,
    renderer: Renderer,
    icons: IconRegistry,
    spawner: Spawner,

    selected: Option<String>,
    cue_id: Option<String>,
    /// Ids pocketed since the last rack, in removal order.
    pocketed: Vec<String>,
    modal_open: bool,
    last_now: Option<f64>,

    on_select: Option<SelectCallback>,
    on_hover_change: Option<HoverCallback>,
}

impl Swarm {
    /// Create an engine with no entities. Fails if `config` is invalid.
    pub fn new(config: SwarmConfig) -> Result<Self, SwarmError> {
        config.validate()?;
        let size = DEFAULT_SURFACE;
        let bounds = Bounds::from_size(size);
        let band = RadiusBand::compute(size, std::iter::empty(), config.fill_fraction, config.min_radius_ratio);

        Ok(Self {
            mode: Mode::Map,
            sizing: SizingMode::default(),
            timeframe: Timeframe::default(),
            metric_pair: MetricPair::default(),
            entities: Vec::new(),
            particles: Vec::new(),
            surface_size: size,
            band,
            projection: Projection::default(),
            layout: PlotLayout::for_surface(size),
            bounds,
            pockets: SinkZone::table_pockets(&bounds, SinkZone::radius_for(band.max)),
            camera: Camera::new(&config.camera),
            interaction: InteractionController::new(config.interaction.clone()),
            renderer: Renderer::default(),
            icons: IconRegistry::new(),
            spawner: Spawner::new(config.seed),
            selected: None,
            cue_id: None,
            pocketed: Vec::new(),
            modal_open: false,
            last_now: None,
            on_select: None,
            on_hover_change: None,
            config,
        })
    }

    // ========== Data and settings ==========

    /// Replace the entity list. Surviving particles keep their motion state.
    pub fn set_entities(&mut self, entities: Vec<MarketEntity>) {
        self.entities = entities;
        self.resync();
    }

    /// Switch layout regime. Resets the camera, gestures and pocket state.
    pub fn set_mode(&mut self, mode: Mode) {
        if mode == self.mode {
            return;
        }
        self.interaction.cancel(&mut self.particles);
        self.camera.reset();
        self.mode = mode;
        self.update_camera_lock();
        self.renderer.clear_trails();
        self.reset_capture();
        self.resync();

        match mode {
            Mode::Game => {
                physics::seed_velocities(&mut self.particles, &mut self.spawner, self.config.physics.initial_speed);
                self.cue_id = self.particles.first().map(|p| p.id.clone());
            }
            Mode::Map => {
                for p in &mut self.particles {
                    p.velocity = DVec2::ZERO;
                }
                self.cue_id = None;
            }
        }
        log::info!("switched to {} mode with {} particles", mode, self.particles.len());
    }

    /// Switch what drives particle size. Survivors ease to their new radii.
    pub fn set_sizing_mode(&mut self, sizing: SizingMode) {
        if sizing != self.sizing {
            self.sizing = sizing;
            self.resync();
        }
    }

    /// Change the lookback window used for percent change.
    pub fn set_timeframe(&mut self, timeframe: Timeframe) {
        if timeframe != self.timeframe {
            self.timeframe = timeframe;
            self.resync();
        }
    }

    /// Change the map axes. Anchors move; particles drift over to them.
    pub fn set_metric_pair(&mut self, pair: MetricPair) {
        if pair != self.metric_pair {
            self.metric_pair = pair;
            self.resync();
        }
    }

    /// Cap the number of simulated particles. Zero is rejected.
    pub fn set_entity_limit(&mut self, limit: usize) -> Result<(), SwarmError> {
        if limit == 0 {
            return Err(SwarmError::InvalidConfig("entity limit must be at least 1".into()));
        }
        if limit != self.config.entity_limit {
            self.config.entity_limit = limit;
            self.resync();
        }
        Ok(())
    }

    /// Map-mode wobble strength. Zero makes particles sit still on their anchors.
    pub fn set_float_strength(&mut self, strength: f64) {
        self.config.float_strength = if strength.is_finite() { strength.max(0.0) } else { 0.0 };
    }

    /// While a modal overlay is open, pointer input and camera moves are ignored.
    pub fn set_modal_open(&mut self, open: bool) {
        self.modal_open = open;
        if open {
            self.interaction.cancel(&mut self.particles);
        }
        self.update_camera_lock();
    }

    pub fn reset_camera(&mut self) {
        self.camera.reset();
    }

    /// Bring every pocketed particle back and give the table a fresh break.
    pub fn rack(&mut self) {
        self.interaction.cancel(&mut self.particles);
        self.reset_capture();
        self.resync();
        if self.mode == Mode::Game {
            physics::seed_velocities(&mut self.particles, &mut self.spawner, self.config.physics.initial_speed);
        }
        log::info!("racked {} particles", self.particles.len());
    }

    pub fn clear_selection(&mut self) {
        self.selected = None;
    }

    /// Swap colors. Particle colors follow the new palette immediately.
    pub fn set_theme(&mut self, theme: Theme) {
        self.renderer.set_theme(theme);
        let palette = theme.palette;
        for p in &mut self.particles {
            p.color = palette.change_color(p.change_pct);
        }
    }

    pub fn icons_mut(&mut self) -> &mut IconRegistry {
        &mut self.icons
    }

    /// Tell the engine the surface size ahead of the next render.
    pub fn resize(&mut self, width: f64, height: f64) {
        self.update_viewport(DVec2::new(width, height));
    }

    // ========== Callbacks ==========

    /// Called with the entity id when a particle is clicked in map mode.
    pub fn on_select(&mut self, callback: impl FnMut(&str) + 'static) {
        self.on_select = Some(Box::new(callback));
    }

    /// Called whenever the hovered particle changes.
    pub fn on_hover_change(&mut self, callback: impl FnMut(Option<&str>) + 'static) {
        self.on_hover_change = Some(Box::new(callback));
    }

    // ========== Input ==========

    pub fn handle_input(&mut self, event: InputEvent) {
        match event {
            InputEvent::PointerDown(p) => self.pointer_down(p),
            InputEvent::PointerMove(p) => self.pointer_move(p),
            InputEvent::PointerUp(p) => self.pointer_up(p),
            InputEvent::PointerLeave => self.pointer_leave(),
            InputEvent::Wheel { position, notches } => self.wheel(position, notches),
            InputEvent::Key(KeyCode::Escape) => self.cancel(),
            InputEvent::Key(_) => {}
        }
    }

    pub fn pointer_down(&mut self, screen: DVec2) {
        if self.modal_open {
            return;
        }
        let ctx = InteractionContext {
            particles: &mut self.particles,
            camera: &mut self.camera,
            mode: self.mode,
            cue_id: self.cue_id.as_deref(),
        };
        let notes = self.interaction.pointer_down(screen, ctx);
        self.dispatch(notes);
    }

    pub fn pointer_move(&mut self, screen: DVec2) {
        if self.modal_open {
            return;
        }
        let ctx = InteractionContext {
            particles: &mut self.particles,
            camera: &mut self.camera,
            mode: self.mode,
            cue_id: self.cue_id.as_deref(),
        };
        let notes = self.interaction.pointer_move(screen, ctx);
        self.dispatch(notes);
    }

    pub fn pointer_up(&mut self, screen: DVec2) {
        if self.modal_open {
            return;
        }
        let ctx = InteractionContext {
            particles: &mut self.particles,
            camera: &mut self.camera,
            mode: self.mode,
            cue_id: self.cue_id.as_deref(),
        };
        let notes = self.interaction.pointer_up(screen, ctx);
        self.dispatch(notes);
    }

    pub fn pointer_leave(&mut self) {
        let notes = self.interaction.pointer_leave(&mut self.particles);
        self.dispatch(notes);
    }

    /// Zoom around `screen` by wheel notches. Ignored while the camera is locked.
    pub fn wheel(&mut self, screen: DVec2, notches: f64) {
        self.camera.zoom_at(screen, notches);
    }

    /// Abort the active gesture. Safe to call at any time.
    pub fn cancel(&mut self) {
        self.interaction.cancel(&mut self.particles);
    }

    // ========== Frame ==========

    /// Advance the simulation to `now` (seconds, any monotonic origin).
    pub fn step(&mut self, now: f64) {
        let dt = match self.last_now {
            Some(prev) => physics::clamp_dt(now - prev, self.config.physics.max_dt),
            None => 0.0,
        };
        self.last_now = Some(now);
        self.interaction.update_drag(&mut self.particles, dt);

        match self.mode {
            Mode::Map => physics::step_map(
                &mut self.particles,
                now,
                dt,
                self.config.float_strength,
                &self.config.physics,
            ),
            Mode::Game => {
                physics::step_game(&mut self.particles, &self.bounds, dt, &self.config.physics);
                capture::update(&mut self.particles, &self.pockets, dt, &self.config.capture);
                self.prune_pocketed();
            }
        }
        physics::ease_radii(&mut self.particles, dt, &self.config.physics);
    }

    /// Draw the current state. Picks up surface size changes first.
    pub fn render(&mut self, surface: &mut dyn DrawSurface) {
        let size = surface.size();
        if size != self.surface_size {
            self.update_viewport(size);
        }

        let scene = Scene {
            particles: &self.particles,
            camera: &self.camera,
            mode: self.mode,
            projection: &self.projection,
            layout: &self.layout,
            bounds: &self.bounds,
            pockets: &self.pockets,
            hovered: self.interaction.hovered(),
            selected: self.selected.as_deref(),
            cue_id: self.cue_id.as_deref(),
            aim: self.interaction.aim(),
            icons: &self.icons,
            config: &self.config,
        };
        self.renderer.render(&scene, surface);
    }

    /// [`step`](Self::step) then [`render`](Self::render).
    pub fn frame(&mut self, now: f64, surface: &mut dyn DrawSurface) {
        self.step(now);
        self.render(surface);
    }

    // ========== Accessors ==========

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn particle(&self, id: &str) -> Option<&Particle> {
        self.particles.iter().find(|p| p.id == id)
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn sizing_mode(&self) -> SizingMode {
        self.sizing
    }

    pub fn timeframe(&self) -> Timeframe {
        self.timeframe
    }

    pub fn metric_pair(&self) -> MetricPair {
        self.metric_pair
    }

    pub fn hovered(&self) -> Option<&str> {
        self.interaction.hovered()
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    pub fn cue_id(&self) -> Option<&str> {
        self.cue_id.as_deref()
    }

    pub fn gesture(&self) -> &Gesture {
        self.interaction.gesture()
    }

    /// Particles pocketed since the last rack or mode switch.
    pub fn pocketed_count(&self) -> usize {
        self.pocketed.len()
    }

    pub fn radius_band(&self) -> RadiusBand {
        self.band
    }

    pub fn projection(&self) -> &Projection {
        &self.projection
    }

    pub fn layout(&self) -> &PlotLayout {
        &self.layout
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn pockets(&self) -> &[SinkZone] {
        &self.pockets
    }

    pub fn config(&self) -> &SwarmConfig {
        &self.config
    }

    pub fn is_modal_open(&self) -> bool {
        self.modal_open
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    // ========== Internal Methods ==========

    /// Rebuild the particle vector from the current entity list and settings.
    ///
    /// Survivors keep position, velocity, radius, pin and capture state; only
    /// their targets, colors and display data change. The new vector is built
    /// in rank order and swapped in whole.
    fn resync(&mut self) {
        let mut seen = HashSet::new();
        let excluded: HashSet<&str> = match self.mode {
            Mode::Game => self.pocketed.iter().map(String::as_str).collect(),
            Mode::Map => HashSet::new(),
        };
        let owned: Vec<MarketEntity> = self
            .entities
            .iter()
            .filter(|e| !excluded.contains(e.id.as_str()) && seen.insert(e.id.as_str()))
            .cloned()
            .collect();

        let mapped = map_entities(&owned, self.timeframe, self.sizing, self.config.entity_limit);
        self.band = RadiusBand::for_mapped(
            self.surface_size,
            &mapped,
            self.config.fill_fraction,
            self.config.min_radius_ratio,
        );
        self.projection = Projection::from_entities(
            mapped.iter().map(|m| &owned[m.index]),
            self.metric_pair,
            self.timeframe,
        );

        let palette = self.renderer.theme().palette;
        let spawn_area = self.bounds;
        let mut previous: HashMap<String, Particle> = std::mem::take(&mut self.particles)
            .into_iter()
            .map(|p| (p.id.clone(), p))
            .collect();
        let mut spawned = 0usize;

        let mut next = Vec::with_capacity(mapped.len());
        for m in &mapped {
            let entity = &owned[m.index];
            let mut particle = match previous.remove(&entity.id) {
                Some(p) => p,
                None => {
                    spawned += 1;
                    let position = self.spawner.random_in_rect(&spawn_area);
                    let phase = self.spawner.random_phase();
                    Particle::new(entity.id.clone(), entity.symbol.clone(), position, phase)
                }
            };
            particle.symbol = entity.symbol.clone();
            particle.icon = entity.icon.clone();
            particle.change_pct = m.change_pct;
            particle.target_radius = self.band.radius(m.t);
            particle.color = palette.change_color(m.change_pct);
            particle.anchor = self.layout.to_screen(self.projection.project(entity));
            next.push(particle);
        }
        self.particles = next;

        let pocket_radius = SinkZone::radius_for(self.band.max);
        self.pockets = SinkZone::table_pockets(&self.bounds, pocket_radius);

        if self.mode == Mode::Game && !self.cue_id.as_deref().is_some_and(|id| self.particle(id).is_some()) {
            self.cue_id = self.particles.first().map(|p| p.id.clone());
        }
        if let Some(id) = self.selected.as_deref() {
            if self.particle(id).is_none() {
                self.selected = None;
            }
        }
        let note = self.interaction.retain_live(&self.particles);
        self.dispatch(note.into_iter().collect());

        log::debug!(
            "resync: {} entities -> {} particles ({} new, {} dropped), radius band {:.1}..{:.1}",
            self.entities.len(),
            self.particles.len(),
            spawned,
            previous.len(),
            self.band.min,
            self.band.max
        );
    }

    fn update_viewport(&mut self, size: DVec2) {
        let size = size.max(DVec2::ONE);
        if size == self.surface_size {
            return;
        }
        log::debug!("surface resized to {}x{}", size.x, size.y);
        self.surface_size = size;
        self.layout = PlotLayout::for_surface(size);
        self.bounds = Bounds::from_size(size);
        self.resync();
    }

    fn update_camera_lock(&mut self) {
        self.camera.set_locked(self.mode == Mode::Game || self.modal_open);
    }

    fn reset_capture(&mut self) {
        self.pocketed.clear();
        for p in &mut self.particles {
            p.capture = capture::CaptureState::Free;
        }
    }

    fn prune_pocketed(&mut self) {
        let removed = capture::prune_removed(&mut self.particles);
        if removed.is_empty() {
            return;
        }
        for id in &removed {
            log::debug!("pocketed {}", id);
        }
        let cue_gone = self.cue_id.as_ref().is_some_and(|cue| removed.contains(cue));
        self.pocketed.extend(removed);
        if cue_gone {
            self.cue_id = self.particles.first().map(|p| p.id.clone());
            log::info!("cue pocketed, next cue is {:?}", self.cue_id);
        }
        if let Some(id) = self.selected.as_deref() {
            if self.particle(id).is_none() {
                self.selected = None;
            }
        }
        let note = self.interaction.retain_live(&self.particles);
        self.dispatch(note.into_iter().collect());
    }

    fn dispatch(&mut self, notes: Vec<Notification>) {
        for note in notes {
            match note {
                Notification::HoverChanged(id) => {
                    if let Some(callback) = self.on_hover_change.as_mut() {
                        callback(id.as_deref());
                    }
                }
                Notification::Selected(id) => {
                    if let Some(callback) = self.on_select.as_mut() {
                        callback(&id);
                    }
                    self.selected = Some(id);
                }
            }
        }
    }
}

impl Default for Swarm {
    fn default() -> Self {
        match Self::new(SwarmConfig::default()) {
            Ok(swarm) => swarm,
            Err(e) => unreachable!("default config is valid: {}", e),
        }
    }
}
