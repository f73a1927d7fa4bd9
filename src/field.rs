//! Simulation state.
//!
//! [`ParticleField`] owns the particle list, the current viewport bounds, the
//! renderer and the frame timer. One call to [`advance`](ParticleField::advance)
//! is one frame: integrate, then paint. The particle count never changes after
//! construction.

use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{debug, trace};

use crate::config::FieldConfig;
use crate::integrator;
use crate::particle::{self, Bounds, Particle};
use crate::render::{FrameStats, Link, Renderer};
use crate::surface::Surface;
use crate::time::Time;

/// Log frame statistics every this many frames.
const STATS_INTERVAL: u64 = 600;

#[derive(Debug)]
pub struct ParticleField {
    particles: Vec<Particle>,
    bounds: Bounds,
    /// Last bounds with a non-zero area, used to keep integrating while the
    /// viewport is collapsed.
    last_drawable: Option<Bounds>,
    renderer: Renderer,
    time: Time,
    last_stats: Option<FrameStats>,
}

impl ParticleField {
    /// Scatter `config.particle_count` particles over `bounds`.
    ///
    /// Uses `config.seed` when set, otherwise a randomly seeded generator.
    pub fn new(config: &FieldConfig, bounds: Bounds) -> Self {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let particles = particle::initialize(config.particle_count, bounds, config, &mut rng);
        Self::with_particles(config, bounds, particles)
    }

    /// Start from an explicit particle list.
    pub fn with_particles(config: &FieldConfig, bounds: Bounds, particles: Vec<Particle>) -> Self {
        Self {
            particles,
            bounds,
            last_drawable: (!bounds.is_empty()).then_some(bounds),
            renderer: Renderer::new(config),
            time: Time::new(),
            last_stats: None,
        }
    }

    /// Replace the frame timer, e.g. with [`Time::fixed`] for reproducible output.
    pub fn with_time(mut self, time: Time) -> Self {
        self.time = time;
        self
    }

    pub fn particles(&self) -> &[Particle] {
        &self.particles
    }

    pub fn len(&self) -> usize {
        self.particles.len()
    }

    pub fn is_empty(&self) -> bool {
        self.particles.is_empty()
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }

    pub fn time(&self) -> &Time {
        &self.time
    }

    pub fn renderer(&self) -> &Renderer {
        &self.renderer
    }

    /// Links drawn in the most recent rendered frame.
    pub fn links(&self) -> &[Link] {
        self.renderer.links()
    }

    /// Stats of the most recent rendered frame.
    pub fn last_stats(&self) -> Option<FrameStats> {
        self.last_stats
    }

    /// Take new viewport bounds. Particles keep their absolute positions.
    pub fn resize(&mut self, bounds: Bounds) {
        debug!(width = bounds.width, height = bounds.height, "viewport resized");
        self.bounds = bounds;
        if !bounds.is_empty() {
            self.last_drawable = Some(bounds);
        }
        self.renderer.invalidate_backdrop();
    }

    /// Bounds the integrator bounces against: the current bounds, or the
    /// last non-empty ones while the viewport has zero area.
    pub fn integration_bounds(&self) -> Bounds {
        if self.bounds.is_empty() {
            self.last_drawable.unwrap_or(self.bounds)
        } else {
            self.bounds
        }
    }

    /// Advance every particle one tick.
    pub fn step(&mut self) {
        let bounds = self.integration_bounds();
        integrator::step(&mut self.particles, bounds);
    }

    /// Paint the current state. `None` when the frame was skipped.
    pub fn render<S: Surface + ?Sized>(&mut self, surface: &mut S) -> Option<FrameStats> {
        let stats = self.renderer.render(
            surface,
            &self.particles,
            self.bounds,
            self.time.elapsed(),
        );
        if stats.is_some() {
            self.last_stats = stats;
        }
        stats
    }

    /// One full frame: step, then render.
    pub fn advance<S: Surface + ?Sized>(&mut self, surface: &mut S) -> Option<FrameStats> {
        self.time.update();
        self.step();
        let stats = self.render(surface);

        let frame = self.time.frame();
        match stats {
            Some(stats) if frame % STATS_INTERVAL == 0 => debug!(
                frame,
                fps = self.time.fps(),
                particles = stats.particles,
                links = stats.links,
                "frame stats"
            ),
            None => trace!(frame, "frame not rendered"),
            _ => {}
        }
        stats
    }
}
