//! # Particle Field
//!
//! A drifting 2D particle field: points move at constant velocity, bounce off
//! the viewport edges, and are joined by lines that fade out with distance.
//!
//! The crate is split into a host-independent core and the hosts that drive
//! it. The core never opens windows or reads clocks; it paints through the
//! [`Surface`] trait and is driven by a [`FrameClock`] and a
//! [`ResizeNotifier`] that the host fires.
//!
//! ## Quick Start
//!
//! ```ignore
//! use particle_field::prelude::*;
//! use std::{cell::RefCell, rc::Rc};
//!
//! let clock = FrameClock::new();
//! let resizes = ResizeNotifier::new();
//! let surface = Rc::new(RefCell::new(PixelSurface::new(800, 600)));
//!
//! let handle = activate(Some(&surface), &clock, &resizes, &FieldConfig::default());
//!
//! // Once per display refresh:
//! clock.tick();
//!
//! // When the drawable area changes:
//! resizes.notify(&Bounds::new(1024.0, 768.0));
//!
//! drop(handle); // unregisters both callbacks
//! ```
//!
//! ## Frame Anatomy
//!
//! Every tick runs [`integrator::step`] over the whole particle list, then
//! [`Renderer::render`]: clear, backdrop gradient, particle discs, links,
//! overlay. Integration for a frame always completes before its rendering
//! starts.
//!
//! ## Scaling
//!
//! | Particles | Pair checks per frame |
//! |-----------|-----------------------|
//! | 200       | 19,900                |
//! | 1,000     | 499,500               |
//! | 5,000     | 12,497,500            |
//!
//! The default brute-force link scan is quadratic. [`EdgeScan::Grid`] finds
//! the same links through a uniform grid when counts get large.
//!
//! ## Hosts
//!
//! - [`window::run`]: a desktop window (winit + softbuffer)
//! - [`PixelSurface::save_png`]: headless frames, see the `snapshot` binary

pub mod clock;
pub mod config;
pub mod error;
pub mod field;
pub mod integrator;
pub mod lifecycle;
pub mod particle;
pub mod raster;
pub mod render;
pub mod spatial;
pub mod surface;
pub mod time;
pub mod visuals;
pub mod window;

pub use clock::{FrameClock, FrameTick, Notifier, ResizeNotifier, Subscription};
pub use config::{EdgeScan, FieldConfig, SampleRange};
pub use error::{ConfigError, ExportError, HostError};
pub use field::ParticleField;
pub use glam::Vec2;
pub use lifecycle::{activate, deactivate, SimulationHandle};
pub use particle::{Bounds, Particle};
pub use raster::PixelSurface;
pub use render::{link_alpha, FrameStats, Link, Renderer};
pub use spatial::SpatialGrid;
pub use surface::{DrawCommand, Fill, Recorder, Rect, Surface};
pub use time::Time;
pub use visuals::{ColorStop, LinearGradient, OverlayConfig, RadialGradient, Rgba};

/// Convenient re-exports for common usage.
///
/// ```ignore
/// use particle_field::prelude::*;
/// ```
pub mod prelude {
    pub use crate::clock::{FrameClock, ResizeNotifier, Subscription};
    pub use crate::config::{EdgeScan, FieldConfig};
    pub use crate::lifecycle::{activate, deactivate, SimulationHandle};
    pub use crate::particle::{Bounds, Particle};
    pub use crate::raster::PixelSurface;
    pub use crate::surface::Surface;
    pub use crate::visuals::{ColorStop, OverlayConfig, Rgba};
    pub use crate::Vec2;
}
