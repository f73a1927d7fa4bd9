//! Desktop host: a winit window presenting a [`PixelSurface`] through softbuffer.
//!
//! The host owns the [`FrameClock`] and [`ResizeNotifier`]. It ticks the
//! clock once per display refresh (from the monitor's reported rate, 60 Hz
//! when unknown) and forwards window resizes to the notifier.

use std::cell::RefCell;
use std::num::NonZeroU32;
use std::rc::Rc;
use std::time::{Duration, Instant};

use tracing::{debug, error, info};
use winit::{
    application::ApplicationHandler,
    dpi::{LogicalSize, PhysicalSize},
    event::WindowEvent,
    event_loop::{ActiveEventLoop, ControlFlow, EventLoop},
    window::{Window, WindowId},
};

use crate::clock::{FrameClock, ResizeNotifier};
use crate::config::FieldConfig;
use crate::error::HostError;
use crate::lifecycle::{activate, SimulationHandle};
use crate::particle::Bounds;
use crate::raster::PixelSurface;
use crate::surface::Surface;

const TITLE: &str = "Particle Field";
const FALLBACK_REFRESH_MILLIHERTZ: u32 = 60_000;
/// Refresh the title readout every this many frames.
const TITLE_INTERVAL: u64 = 30;

/// Open a window and run the field until it is closed.
pub fn run(config: FieldConfig) -> Result<(), HostError> {
    config.validate()?;
    let event_loop = EventLoop::new()?;
    let mut app = App::new(config);
    event_loop.run_app(&mut app)?;
    match app.error.take() {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

struct Presenter {
    window: Rc<Window>,
    surface: softbuffer::Surface<Rc<Window>, Rc<Window>>,
}

impl Presenter {
    fn new(event_loop: &ActiveEventLoop) -> Result<Self, HostError> {
        let attrs = Window::default_attributes()
            .with_title(TITLE)
            .with_inner_size(LogicalSize::new(1280, 720));
        let window = Rc::new(event_loop.create_window(attrs)?);
        let context = softbuffer::Context::new(Rc::clone(&window))?;
        let surface = softbuffer::Surface::new(&context, Rc::clone(&window))?;
        let mut presenter = Self { window, surface };
        presenter.resize(presenter.window.inner_size())?;
        Ok(presenter)
    }

    /// Resize the framebuffer. Zero sizes are left alone.
    fn resize(&mut self, size: PhysicalSize<u32>) -> Result<(), HostError> {
        if let (Some(width), Some(height)) = (NonZeroU32::new(size.width), NonZeroU32::new(size.height)) {
            self.surface.resize(width, height)?;
        }
        Ok(())
    }

    fn frame_interval(&self) -> Duration {
        let millihertz = self
            .window
            .current_monitor()
            .and_then(|monitor| monitor.refresh_rate_millihertz())
            .filter(|&mhz| mhz > 0)
            .unwrap_or(FALLBACK_REFRESH_MILLIHERTZ);
        Duration::from_secs_f64(1000.0 / millihertz as f64)
    }

    /// Copy `pixels` into the window. Skipped while the two sizes disagree,
    /// which only happens between a resize and the next frame.
    fn present(&mut self, pixels: &PixelSurface) -> Result<(), HostError> {
        let size = self.window.inner_size();
        if pixels.pixels().is_empty() || size.width != pixels.width() || size.height != pixels.height() {
            return Ok(());
        }
        let mut buffer = self.surface.buffer_mut()?;
        if buffer.len() != pixels.pixels().len() {
            return Ok(());
        }
        buffer.copy_from_slice(pixels.pixels());
        buffer.present()?;
        Ok(())
    }
}

struct App {
    config: FieldConfig,
    presenter: Option<Presenter>,
    pixels: Rc<RefCell<PixelSurface>>,
    clock: FrameClock,
    resizes: ResizeNotifier,
    handle: Option<SimulationHandle>,
    frame_interval: Duration,
    next_frame: Instant,
    error: Option<HostError>,
}

impl App {
    fn new(config: FieldConfig) -> Self {
        Self {
            config,
            presenter: None,
            pixels: Rc::new(RefCell::new(PixelSurface::new(0, 0))),
            clock: FrameClock::new(),
            resizes: ResizeNotifier::new(),
            handle: None,
            frame_interval: Duration::from_secs_f64(1000.0 / FALLBACK_REFRESH_MILLIHERTZ as f64),
            next_frame: Instant::now(),
            error: None,
        }
    }

    fn fail(&mut self, event_loop: &ActiveEventLoop, e: HostError) {
        error!("{}", e);
        self.handle = None;
        self.error = Some(e);
        event_loop.exit();
    }

    fn start(&mut self) {
        let Some(presenter) = &self.presenter else {
            return;
        };
        let size = presenter.window.inner_size();
        self.pixels
            .borrow_mut()
            .resize(Bounds::from_size(size.width, size.height));
        self.frame_interval = presenter.frame_interval();
        info!(
            interval_ms = self.frame_interval.as_secs_f64() * 1000.0,
            "frame pacing"
        );
        self.handle = activate(Some(&self.pixels), &self.clock, &self.resizes, &self.config);
        self.next_frame = Instant::now();
        presenter.window.request_redraw();
    }

    fn redraw(&mut self) -> Result<(), HostError> {
        self.clock.tick();
        self.next_frame = Instant::now() + self.frame_interval;

        let Some(presenter) = &mut self.presenter else {
            return Ok(());
        };
        presenter.present(&self.pixels.borrow())?;

        if let Some(handle) = &self.handle {
            let field = handle.field();
            let time = field.time();
            if time.frame() % TITLE_INTERVAL == 0 {
                let links = field.last_stats().map_or(0, |s| s.links);
                presenter.window.set_title(&format!(
                    "{TITLE} | {:.0} fps | {} particles | {} links",
                    time.fps(),
                    field.len(),
                    links
                ));
            }
        }
        Ok(())
    }
}

impl ApplicationHandler for App {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        if self.presenter.is_none() {
            match Presenter::new(event_loop) {
                Ok(presenter) => self.presenter = Some(presenter),
                Err(e) => return self.fail(event_loop, e),
            }
        }
        if self.handle.is_none() {
            self.start();
        }
    }

    fn suspended(&mut self, _event_loop: &ActiveEventLoop) {
        debug!("suspended, stopping field");
        self.handle = None;
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        match event {
            WindowEvent::CloseRequested => {
                self.handle = None;
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                if let Some(presenter) = &mut self.presenter {
                    if let Err(e) = presenter.resize(size) {
                        return self.fail(event_loop, e);
                    }
                }
                self.resizes
                    .notify(&Bounds::from_size(size.width, size.height));
            }
            WindowEvent::RedrawRequested => {
                if let Err(e) = self.redraw() {
                    self.fail(event_loop, e);
                }
            }
            _ => {}
        }
    }

    fn about_to_wait(&mut self, event_loop: &ActiveEventLoop) {
        if self.handle.is_none() {
            event_loop.set_control_flow(ControlFlow::Wait);
            return;
        }
        if Instant::now() >= self.next_frame {
            if let Some(presenter) = &self.presenter {
                presenter.window.request_redraw();
            }
        }
        event_loop.set_control_flow(ControlFlow::WaitUntil(self.next_frame));
    }
}
