//! One simulation tick.
//!
//! Positions advance by exactly one velocity per call; there is no delta-time
//! scaling, so on-screen speed follows the frame rate. Walls reflect velocity
//! rather than clamping position: a particle that crosses a wall is drawn
//! outside the viewport for that frame and heads back in on the next one.

use crate::particle::{Bounds, Particle};

/// Advance every particle by its velocity and bounce off the viewport edges.
///
/// The bounce test uses the updated position. Each axis is checked on its
/// own, so a corner hit flips both components in the same tick. A position
/// exactly on a wall (`x == 0` or `x == width`) does not bounce.
pub fn step(particles: &mut [Particle], bounds: Bounds) {
    for p in particles.iter_mut() {
        p.position += p.velocity;

        if p.position.x < 0.0 || p.position.x > bounds.width {
            p.velocity.x = -p.velocity.x;
        }
        if p.position.y < 0.0 || p.position.y > bounds.height {
            p.velocity.y = -p.velocity.y;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use glam::Vec2;

    fn dot(x: f32, y: f32, vx: f32, vy: f32) -> Particle {
        Particle::new(Vec2::new(x, y), Vec2::new(vx, vy), 2.0, 1.0)
    }

    const BOUNDS: Bounds = Bounds::new(100.0, 100.0);

    #[test]
    fn test_moves_by_velocity() {
        let mut ps = [dot(10.0, 20.0, 0.5, -0.25)];
        step(&mut ps, BOUNDS);
        assert_eq!(ps[0].position, Vec2::new(10.5, 19.75));
        assert_eq!(ps[0].velocity, Vec2::new(0.5, -0.25));
    }

    #[test]
    fn test_bounce_left_wall() {
        let mut ps = [dot(0.0, 50.0, -0.75, 0.0)];
        step(&mut ps, BOUNDS);
        // Crossed the wall this tick: drawn outside, velocity reversed
        assert_eq!(ps[0].position.x, -0.75);
        assert_eq!(ps[0].velocity.x, 0.75);

        step(&mut ps, BOUNDS);
        assert_eq!(ps[0].position.x, 0.0);
        assert_eq!(ps[0].velocity.x, 0.75);

        step(&mut ps, BOUNDS);
        assert_eq!(ps[0].position.x, 0.75);
    }

    #[test]
    fn test_bounce_right_and_bottom_walls() {
        let mut ps = [dot(99.5, 99.5, 1.0, 1.0)];
        step(&mut ps, BOUNDS);
        assert_eq!(ps[0].velocity, Vec2::new(-1.0, -1.0));
    }

    #[test]
    fn test_corner_flips_both_axes_same_tick() {
        let mut ps = [dot(0.2, 0.3, -0.5, -0.5)];
        step(&mut ps, BOUNDS);
        assert_eq!(ps[0].velocity, Vec2::new(0.5, 0.5));
    }

    #[test]
    fn test_landing_exactly_on_wall_does_not_bounce() {
        let mut ps = [dot(99.0, 1.0, 1.0, -1.0)];
        step(&mut ps, BOUNDS);
        assert_eq!(ps[0].position, Vec2::new(100.0, 0.0));
        assert_eq!(ps[0].velocity, Vec2::new(1.0, -1.0));
    }

    #[test]
    fn test_step_is_deterministic() {
        let start = vec![
            dot(1.0, 2.0, -1.0, 0.3),
            dot(50.0, 98.0, 0.7, 0.9),
            dot(99.0, 0.5, 0.6, -0.8),
        ];
        let mut a = start.clone();
        let mut b = start;
        for _ in 0..500 {
            step(&mut a, BOUNDS);
            step(&mut b, BOUNDS);
        }
        assert_eq!(a, b);
    }

    #[test]
    fn test_zero_bounds_keeps_particles_near_origin() {
        let mut ps = [dot(0.0, 0.0, 0.5, -0.5)];
        for _ in 0..100 {
            step(&mut ps, Bounds::default());
            assert!(ps[0].position.x.abs() <= 0.5 && ps[0].position.y.abs() <= 0.5);
        }
    }
}
