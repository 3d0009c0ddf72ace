//! Demo window host.
//!
//! Runs a [`Swarm`] inside a winit window: window events go through a
//! [`PointerTracker`], every frame is rasterized into a [`Canvas`] and the
//! canvas is handed to the GPU [`Presenter`].
//!
//! Keys:
//!
//! - `G` / `M`: game / map mode
//! - `R`: rack the table
//! - `0`: reset the camera
//! - `T`: cycle the lookback window
//! - `S`: toggle performance / capitalization sizing
//! - `C`: cycle the color palette
//! - `1`..`3`: axis presets
//! - `Space`: pause
//! - `Esc`: cancel the current gesture

use std::sync::Arc;

use winit::{
    application::ApplicationHandler,
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::engine::Swarm;
use crate::entity::{SizingMode, Timeframe};
use crate::error::SwarmError;
use crate::gpu::Presenter;
use crate::input::{InputEvent, KeyCode, PointerTracker};
use crate::physics::Mode;
use crate::projector::{AxisSpec, Metric, MetricPair};
use crate::raster::Canvas;
use crate::time::FrameClock;
use crate::visuals::Palette;

const TITLE: &str = "coinswarm";

struct App {
    swarm: Swarm,
    window: Option<Arc<Window>>,
    presenter: Option<Presenter>,
    canvas: Canvas,
    tracker: PointerTracker,
    clock: FrameClock,
    /// First fatal error, returned from [`run`] after the loop exits.
    error: Option<SwarmError>,
}

impl App {
    fn new(swarm: Swarm) -> Self {
        Self {
            swarm,
            window: None,
            presenter: None,
            canvas: Canvas::new(1, 1),
            tracker: PointerTracker::new(),
            clock: FrameClock::new(),
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, error: SwarmError) {
        log::error!("{}", error);
        self.error.get_or_insert(error);
        event_loop.exit();
    }

    /// Keys the host owns. Everything else goes to the engine.
    fn host_key(&mut self, key: KeyCode) {
        let swarm = &mut self.swarm;
        match key {
            KeyCode::G => swarm.set_mode(Mode::Game),
            KeyCode::M => swarm.set_mode(Mode::Map),
            KeyCode::R => swarm.rack(),
            KeyCode::Key0 => swarm.reset_camera(),
            KeyCode::T => {
                let next = match swarm.timeframe() {
                    Timeframe::Hour => Timeframe::Day,
                    Timeframe::Day => Timeframe::Week,
                    Timeframe::Week => Timeframe::Hour,
                };
                log::info!("timeframe {}", next);
                swarm.set_timeframe(next);
            }
            KeyCode::S => {
                let next = match swarm.sizing_mode() {
                    SizingMode::Performance => SizingMode::Capitalization,
                    SizingMode::Capitalization => SizingMode::Performance,
                };
                swarm.set_sizing_mode(next);
            }
            KeyCode::C => {
                let theme = *swarm.renderer().theme();
                let next = match theme.palette {
                    Palette::Classic => Palette::Colorblind,
                    Palette::Colorblind => Palette::Grayscale,
                    Palette::Grayscale => Palette::Classic,
                };
                swarm.set_theme(theme.with_palette(next));
            }
            KeyCode::Key1 => swarm.set_metric_pair(MetricPair::default()),
            KeyCode::Key2 => swarm.set_metric_pair(MetricPair {
                x: AxisSpec::log(Metric::Volume),
                y: AxisSpec::linear(Metric::PercentChange),
            }),
            KeyCode::Key3 => swarm.set_metric_pair(MetricPair {
                x: AxisSpec::log(Metric::MarketCap),
                y: AxisSpec::log(Metric::Volume),
            }),
            KeyCode::Space => self.clock.toggle_pause(),
            other => swarm.handle_input(InputEvent::Key(other)),
        }
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let Some(presenter) = self.presenter.as_mut() else {
            return;
        };
        let (width, height) = presenter.size();
        if (self.canvas.width(), self.canvas.height()) != (width, height) {
            self.canvas.resize(width, height);
        }

        self.clock.tick();
        self.swarm.frame(self.clock.elapsed(), &mut self.canvas);

        match presenter.present(&self.canvas) {
            Ok(()) => {}
            Err(wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated) => presenter.reconfigure(),
            Err(wgpu::SurfaceError::OutOfMemory) => event_loop.exit(),
            Err(e) => log::warn!("present failed: {:?}", e),
        }
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.window.is_some() {
            return;
        }
        let window_attrs = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(winit::dpi::LogicalSize::new(1280, 720));

        let window = match event_loop.create_window(window_attrs) {
            Ok(window) => Arc::new(window),
            Err(e) => return self.fail(event_loop, e.into()),
        };
        match pollster::block_on(Presenter::new(window.clone())) {
            Ok(presenter) => {
                let (width, height) = presenter.size();
                self.canvas.resize(width, height);
                self.swarm.resize(width as f64, height as f64);
                self.presenter = Some(presenter);
            }
            Err(e) => return self.fail(event_loop, e.into()),
        }
        window.request_redraw();
        self.window = Some(window);
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match &event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
                return;
            }
            WindowEvent::Resized(size) => {
                if let Some(presenter) = &mut self.presenter {
                    presenter.resize(size.width, size.height);
                }
                self.swarm.resize(size.width.max(1) as f64, size.height.max(1) as f64);
            }
            WindowEvent::Focused(false) => self.swarm.cancel(),
            WindowEvent::RedrawRequested => {
                self.redraw(event_loop);
                if let Some(window) = &self.window {
                    window.request_redraw();
                }
                return;
            }
            _ => {}
        }

        match self.tracker.translate(&event) {
            Some(InputEvent::Key(key)) => self.host_key(key),
            Some(input) => self.swarm.handle_input(input),
            None => {}
        }
    }
}

/// Open a window and run `swarm` until it is closed.
pub fn run(swarm: Swarm) -> Result<(), SwarmError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = App::new(swarm);
    event_loop.run_app(&mut app)?;

    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

