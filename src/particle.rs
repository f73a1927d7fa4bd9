//! Particle state and the particle store.
//!
//! A [`Particle`] is a point with a velocity, a disc radius and an opacity.
//! [`initialize`] builds the whole population once per activation; after that
//! the list only ever changes through [`integrator::step`](crate::integrator::step).

use glam::Vec2;
use rand::Rng;

use crate::config::FieldConfig;

/// Width and height of the drawable area.
///
/// Same unit system as particle positions (pixels for the bundled hosts).
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Bounds {
    pub width: f32,
    pub height: f32,
}

impl Bounds {
    pub const fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }

    /// Bounds from an integer pixel size.
    pub fn from_size(width: u32, height: u32) -> Self {
        Self::new(width as f32, height as f32)
    }

    /// True when there is nothing to draw on.
    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn size(&self) -> Vec2 {
        Vec2::new(self.width, self.height)
    }
}

/// One simulated point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Particle {
    pub position: Vec2,
    pub velocity: Vec2,
    radius: f32,
    opacity: f32,
}

impl Particle {
    /// Create a particle. `radius` and `opacity` are fixed for its lifetime.
    pub fn new(position: Vec2, velocity: Vec2, radius: f32, opacity: f32) -> Self {
        Self {
            position,
            velocity,
            radius,
            opacity,
        }
    }

    #[inline]
    pub fn radius(&self) -> f32 {
        self.radius
    }

    /// Opacity as sampled; may exceed 1.0.
    #[inline]
    pub fn opacity(&self) -> f32 {
        self.opacity
    }

    /// Alpha to paint with: the opacity clamped to `1.0`.
    #[inline]
    pub fn alpha(&self) -> f32 {
        self.opacity.min(1.0)
    }
}

/// Build `count` particles scattered uniformly over `bounds`.
///
/// Velocity, radius and opacity are drawn from the ranges in `config`.
/// Insertion order is stable, so a seeded `rng` reproduces the same list.
pub fn initialize<R: Rng + ?Sized>(
    count: usize,
    bounds: Bounds,
    config: &FieldConfig,
    rng: &mut R,
) -> Vec<Particle> {
    (0..count)
        .map(|_| {
            let position = Vec2::new(
                rng.gen::<f32>() * bounds.width.max(0.0),
                rng.gen::<f32>() * bounds.height.max(0.0),
            );
            let velocity = Vec2::new(config.speed.sample(rng), config.speed.sample(rng));
            let radius = config.radius.sample(rng);
            let opacity = config.opacity.sample(rng);
            Particle::new(position, velocity, radius, opacity)
        })
        .collect()
}
