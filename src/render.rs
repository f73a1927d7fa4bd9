//! Frame rendering.
//!
//! Each frame is painted in a fixed order:
//!
//! 1. clear the viewport
//! 2. fill it with the cached backdrop gradient
//! 3. one disc per particle, at the particle's own alpha
//! 4. one line per particle pair closer than the link distance, fading
//!    linearly from opaque at distance 0 to invisible at the threshold
//! 5. the translucent overlay, if enabled
//!
//! # Cost
//!
//! The link pass compares every unordered pair, O(n²) in particle count.
//! At the default 200 particles that is 19,900 distance checks per frame,
//! well inside a 16.6 ms budget; a few thousand particles is where the
//! brute-force scan starts to dominate the frame. [`EdgeScan::Grid`] swaps in
//! a [`SpatialGrid`] which finds the same links, in the same order, while
//! only comparing particles in neighbouring cells.

use tracing::{debug, trace};

use crate::config::{EdgeScan, FieldConfig};
use crate::particle::{Bounds, Particle};
use crate::spatial::SpatialGrid;
use crate::surface::{Fill, Rect, Surface};
use crate::visuals::{ColorStop, LinearGradient, OverlayConfig, Rgba};

/// Alpha of a link between two particles `distance` apart, or `None` when
/// they are at or beyond `threshold`.
#[inline]
pub fn link_alpha(distance: f32, threshold: f32) -> Option<f32> {
    if distance < threshold {
        Some(1.0 - distance / threshold)
    } else {
        None
    }
}

/// A visible connection between particles `a < b`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Link {
    pub a: usize,
    pub b: usize,
    pub distance: f32,
    pub alpha: f32,
}

/// Collect every link by testing all pairs `i < j` in store order.
pub fn brute_force_links(particles: &[Particle], threshold: f32, out: &mut Vec<Link>) {
    out.clear();
    for (a, pa) in particles.iter().enumerate() {
        for (offset, pb) in particles[a + 1..].iter().enumerate() {
            let distance = pa.position.distance(pb.position);
            if let Some(alpha) = link_alpha(distance, threshold) {
                out.push(Link {
                    a,
                    b: a + 1 + offset,
                    distance,
                    alpha,
                });
            }
        }
    }
}

/// Collect links through a spatial grid. Same result as [`brute_force_links`].
pub fn grid_links(
    particles: &[Particle],
    bounds: Bounds,
    threshold: f32,
    grid: &mut SpatialGrid,
    out: &mut Vec<Link>,
) {
    out.clear();
    grid.rebuild(particles, bounds, threshold);
    grid.for_each_candidate_pair(|a, b| {
        let distance = particles[a].position.distance(particles[b].position);
        if let Some(alpha) = link_alpha(distance, threshold) {
            out.push(Link {
                a,
                b,
                distance,
                alpha,
            });
        }
    });
    out.sort_unstable_by_key(|link| (link.a, link.b));
}

/// What one rendered frame contained.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FrameStats {
    pub particles: usize,
    pub links: usize,
}

/// Paints particle frames onto a [`Surface`].
///
/// Owns the backdrop gradient, which depends only on the viewport size and
/// is rebuilt when the size changes or [`invalidate_backdrop`](Self::invalidate_backdrop)
/// is called, never per frame.
#[derive(Debug)]
pub struct Renderer {
    link_distance: f32,
    link_width: f32,
    particle_color: Rgba,
    link_color: Rgba,
    backdrop_stops: Vec<ColorStop>,
    overlay: Option<OverlayConfig>,
    edge_scan: EdgeScan,
    backdrop: Option<(Bounds, LinearGradient)>,
    backdrop_builds: u64,
    grid: SpatialGrid,
    links: Vec<Link>,
}

impl Renderer {
    pub fn new(config: &FieldConfig) -> Self {
        Self {
            link_distance: config.link_distance,
            link_width: config.link_width,
            particle_color: config.particle_color,
            link_color: config.link_color,
            backdrop_stops: config.backdrop.clone(),
            overlay: config.overlay.clone(),
            edge_scan: config.edge_scan,
            backdrop: None,
            backdrop_builds: 0,
            grid: SpatialGrid::new(),
            links: Vec::new(),
        }
    }

    /// Drop the cached backdrop; the next frame rebuilds it.
    pub fn invalidate_backdrop(&mut self) {
        self.backdrop = None;
    }

    /// How many times the backdrop gradient has been built.
    pub fn backdrop_builds(&self) -> u64 {
        self.backdrop_builds
    }

    /// Links found by the most recent frame.
    pub fn links(&self) -> &[Link] {
        &self.links
    }

    fn backdrop(&mut self, bounds: Bounds) -> &LinearGradient {
        if !matches!(&self.backdrop, Some((cached, _)) if *cached == bounds) {
            self.backdrop = None;
        }
        let stops = &self.backdrop_stops;
        let builds = &mut self.backdrop_builds;
        let (_, gradient) = self.backdrop.get_or_insert_with(|| {
            debug!(width = bounds.width, height = bounds.height, "rebuilding backdrop");
            *builds += 1;
            (bounds, LinearGradient::backdrop(bounds, stops))
        });
        gradient
    }

    /// Find this frame's links with the configured scan.
    pub fn find_links(&mut self, particles: &[Particle], bounds: Bounds) -> &[Link] {
        match self.edge_scan {
            EdgeScan::BruteForce => brute_force_links(particles, self.link_distance, &mut self.links),
            EdgeScan::Grid => grid_links(
                particles,
                bounds,
                self.link_distance,
                &mut self.grid,
                &mut self.links,
            ),
        }
        &self.links
    }

    /// Paint one frame. Returns `None` without drawing when either the
    /// surface or `bounds` has zero area.
    ///
    /// `elapsed` is in seconds and only drives the overlay pulse.
    pub fn render<S: Surface + ?Sized>(
        &mut self,
        surface: &mut S,
        particles: &[Particle],
        bounds: Bounds,
        elapsed: f32,
    ) -> Option<FrameStats> {
        if surface.size().is_empty() || bounds.is_empty() {
            trace!("zero-area surface, skipping frame");
            return None;
        }
        let area = Rect::from(bounds);

        surface.clear_rect(area);
        let backdrop = self.backdrop(bounds);
        surface.fill_rect(area, Fill::Linear(backdrop));

        for p in particles {
            let color = self.particle_color.with_alpha(self.particle_color.a * p.alpha());
            surface.fill_circle(p.position, p.radius(), color);
        }

        self.find_links(particles, bounds);
        for link in &self.links {
            let color = self.link_color.with_alpha(self.link_color.a * link.alpha);
            surface.stroke_line(
                particles[link.a].position,
                particles[link.b].position,
                self.link_width,
                color,
            );
        }

        if let Some(overlay) = &self.overlay {
            let gradient = overlay.gradient(bounds, elapsed);
            surface.fill_rect(area, Fill::Radial(&gradient));
        }

        Some(FrameStats {
            particles: particles.len(),
            links: self.links.len(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::surface::{DrawCommand, RecordedFill, Recorder};
    use glam::Vec2;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn at(x: f32, y: f32) -> Particle {
        Particle::new(Vec2::new(x, y), Vec2::ZERO, 3.0, 1.2)
    }

    #[test]
    fn test_link_alpha_threshold_is_exclusive() {
        assert_eq!(link_alpha(0.0, 100.0), Some(1.0));
        assert!((link_alpha(50.0, 100.0).unwrap() - 0.5).abs() < 1e-6);
        assert!(link_alpha(99.999, 100.0).unwrap() > 0.0);
        assert_eq!(link_alpha(100.0, 100.0), None);
        assert_eq!(link_alpha(150.0, 100.0), None);
        assert_eq!(link_alpha(f32::NAN, 100.0), None);
    }

    #[test]
    fn test_link_alpha_strictly_decreasing() {
        let mut previous = f32::INFINITY;
        for d in (0..100).map(|d| d as f32) {
            let alpha = link_alpha(d, 100.0).unwrap();
            assert!(alpha < previous);
            previous = alpha;
        }
    }

    #[test]
    fn test_grid_matches_brute_force() {
        let config = FieldConfig::default();
        let bounds = Bounds::new(800.0, 600.0);
        let mut rng = StdRng::seed_from_u64(5);
        let mut particles = crate::particle::initialize(400, bounds, &config, &mut rng);
        // A few strays outside the viewport
        particles.push(at(-40.0, 300.0));
        particles.push(at(830.0, 610.0));

        let mut brute = Vec::new();
        brute_force_links(&particles, 100.0, &mut brute);
        let mut grid = SpatialGrid::new();
        let mut via_grid = Vec::new();
        grid_links(&particles, bounds, 100.0, &mut grid, &mut via_grid);

        assert!(!brute.is_empty());
        assert_eq!(brute, via_grid);
    }

    #[test]
    fn test_render_order() {
        let config = FieldConfig::default();
        let bounds = Bounds::new(200.0, 200.0);
        let particles = [at(10.0, 10.0), at(40.0, 10.0), at(190.0, 190.0)];
        let mut renderer = Renderer::new(&config);
        let mut surface = Recorder::new(bounds);

        let stats = renderer.render(&mut surface, &particles, bounds, 0.0).unwrap();
        assert_eq!(stats, FrameStats { particles: 3, links: 1 });

        let commands = surface.commands();
        assert_eq!(commands.len(), 1 + 1 + 3 + 1 + 1);
        assert!(matches!(commands[0], DrawCommand::Clear(_)));
        assert!(matches!(
            commands[1],
            DrawCommand::FillRect { fill: RecordedFill::Linear(_), .. }
        ));
        for c in &commands[2..5] {
            match c {
                // Opacity 1.2 is painted at alpha 1.0
                DrawCommand::Circle { radius, color, .. } => {
                    assert_eq!(*radius, 3.0);
                    assert_eq!(color.a, 1.0);
                }
                other => panic!("expected circle, got {:?}", other),
            }
        }
        match &commands[5] {
            DrawCommand::Line { from, to, width, color } => {
                assert_eq!(*from, Vec2::new(10.0, 10.0));
                assert_eq!(*to, Vec2::new(40.0, 10.0));
                assert_eq!(*width, 0.8);
                assert!((color.a - 0.7).abs() < 1e-6);
            }
            other => panic!("expected line, got {:?}", other),
        }
        assert!(matches!(
            commands[6],
            DrawCommand::FillRect { fill: RecordedFill::Radial(_), .. }
        ));
    }

    #[test]
    fn test_overlay_can_be_disabled() {
        let config = FieldConfig::default().with_overlay(None);
        let bounds = Bounds::new(50.0, 50.0);
        let mut renderer = Renderer::new(&config);
        let mut surface = Recorder::new(bounds);
        renderer.render(&mut surface, &[], bounds, 3.0);
        assert_eq!(surface.commands().len(), 2);
    }

    #[test]
    fn test_zero_area_skips_frame() {
        let config = FieldConfig::default();
        let mut renderer = Renderer::new(&config);
        let particles = [at(1.0, 1.0)];

        let mut surface = Recorder::new(Bounds::new(0.0, 100.0));
        assert!(renderer
            .render(&mut surface, &particles, Bounds::new(0.0, 100.0), 0.0)
            .is_none());
        assert!(surface.commands().is_empty());

        let mut surface = Recorder::new(Bounds::new(100.0, 100.0));
        assert!(renderer
            .render(&mut surface, &particles, Bounds::default(), 0.0)
            .is_none());
        assert!(surface.commands().is_empty());
    }

    #[test]
    fn test_backdrop_rebuilt_only_when_bounds_change() {
        let config = FieldConfig::default();
        let mut renderer = Renderer::new(&config);
        let small = Bounds::new(100.0, 100.0);
        let large = Bounds::new(300.0, 200.0);
        let mut surface = Recorder::new(large);

        for _ in 0..5 {
            renderer.render(&mut surface, &[], small, 0.0);
        }
        assert_eq!(renderer.backdrop_builds(), 1);

        renderer.render(&mut surface, &[], large, 0.0);
        renderer.render(&mut surface, &[], large, 0.0);
        assert_eq!(renderer.backdrop_builds(), 2);

        renderer.invalidate_backdrop();
        renderer.render(&mut surface, &[], large, 0.0);
        assert_eq!(renderer.backdrop_builds(), 3);

        let last_fill = surface
            .commands()
            .iter()
            .rev()
            .find_map(|c| match c {
                DrawCommand::FillRect { fill: RecordedFill::Linear(g), .. } => Some(g.clone()),
                _ => None,
            })
            .unwrap();
        assert_eq!(last_fill.end, Vec2::new(300.0, 200.0));
    }
}
