//! Colours and gradients used to paint the field.
//!
//! Everything here is plain data: a [`Surface`](crate::Surface) receives
//! gradients by reference and samples them per pixel (or forwards them to a
//! native canvas). Geometry is in the same units as particle positions.
//!
//! Two gradients make up the look of the background:
//!
//! - the **backdrop**, a diagonal [`LinearGradient`] from the top-left to the
//!   bottom-right corner, rebuilt only when the viewport changes size
//! - the **overlay**, a centred [`RadialGradient`] whose inner colour slowly
//!   pulses between two tints (see [`OverlayConfig`])

use glam::Vec2;
use serde::{Deserialize, Serialize};

use crate::particle::Bounds;

/// An sRGB colour with straight (non-premultiplied) alpha.
///
/// Channels are bytes like CSS `rgba()`; alpha is a float in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Rgba {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: f32,
}

impl Rgba {
    pub const WHITE: Rgba = Rgba::rgb(255, 255, 255);
    pub const BLACK: Rgba = Rgba::rgb(0, 0, 0);

    /// Opaque colour from channels.
    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    /// Colour with explicit alpha.
    pub const fn rgba(r: u8, g: u8, b: u8, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque colour from a `0xRRGGBB` literal.
    pub const fn from_hex(hex: u32) -> Self {
        Self::rgb((hex >> 16) as u8, (hex >> 8) as u8, hex as u8)
    }

    /// Same colour, different alpha.
    pub fn with_alpha(self, a: f32) -> Self {
        Self { a, ..self }
    }

    /// Linear interpolation in sRGB space, `t` clamped to `0..=1`.
    pub fn lerp(self, other: Rgba, t: f32) -> Rgba {
        let t = t.clamp(0.0, 1.0);
        let mix = |a: u8, b: u8| (a as f32 + (b as f32 - a as f32) * t).round() as u8;
        Rgba {
            r: mix(self.r, other.r),
            g: mix(self.g, other.g),
            b: mix(self.b, other.b),
            a: self.a + (other.a - self.a) * t,
        }
    }

    /// Pack as `0x00RRGGBB`, ignoring alpha.
    pub fn to_rgb_u32(self) -> u32 {
        ((self.r as u32) << 16) | ((self.g as u32) << 8) | self.b as u32
    }
}

/// A colour at a position along a gradient, `offset` in `0.0..=1.0`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ColorStop {
    pub offset: f32,
    pub color: Rgba,
}

impl ColorStop {
    pub const fn new(offset: f32, color: Rgba) -> Self {
        Self { offset, color }
    }
}

/// The default backdrop: dark violet, purple, near-black blue.
pub fn default_backdrop() -> Vec<ColorStop> {
    vec![
        ColorStop::new(0.0, Rgba::from_hex(0x1a001a)),
        ColorStop::new(0.5, Rgba::from_hex(0x4a0072)),
        ColorStop::new(1.0, Rgba::from_hex(0x000033)),
    ]
}

/// Sample a stop list at `t`. Stops must be sorted by offset.
fn sample_stops(stops: &[ColorStop], t: f32) -> Rgba {
    let (first, last) = match (stops.first(), stops.last()) {
        (Some(first), Some(last)) => (first, last),
        _ => return Rgba::BLACK.with_alpha(0.0),
    };
    if t <= first.offset {
        return first.color;
    }
    if t >= last.offset {
        return last.color;
    }
    for pair in stops.windows(2) {
        let (lo, hi) = (pair[0], pair[1]);
        if t <= hi.offset {
            let span = hi.offset - lo.offset;
            if span <= f32::EPSILON {
                return hi.color;
            }
            return lo.color.lerp(hi.color, (t - lo.offset) / span);
        }
    }
    last.color
}

/// Linear gradient between two points.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearGradient {
    pub start: Vec2,
    pub end: Vec2,
    pub stops: Vec<ColorStop>,
}

impl LinearGradient {
    pub fn new(start: Vec2, end: Vec2, stops: Vec<ColorStop>) -> Self {
        Self { start, end, stops }
    }

    /// Corner-to-corner backdrop for a viewport.
    pub fn backdrop(bounds: Bounds, stops: &[ColorStop]) -> Self {
        Self::new(Vec2::ZERO, Vec2::new(bounds.width, bounds.height), stops.to_vec())
    }

    /// Colour at `point`, projected onto the gradient axis.
    pub fn color_at(&self, point: Vec2) -> Rgba {
        let axis = self.end - self.start;
        let len_sq = axis.length_squared();
        let t = if len_sq > 0.0 {
            (point - self.start).dot(axis) / len_sq
        } else {
            0.0
        };
        sample_stops(&self.stops, t)
    }
}

/// Circular gradient from `center` out to `radius`.
#[derive(Debug, Clone, PartialEq)]
pub struct RadialGradient {
    pub center: Vec2,
    pub radius: f32,
    pub stops: Vec<ColorStop>,
}

impl RadialGradient {
    pub fn new(center: Vec2, radius: f32, stops: Vec<ColorStop>) -> Self {
        Self { center, radius, stops }
    }

    pub fn color_at(&self, point: Vec2) -> Rgba {
        let t = if self.radius > 0.0 {
            point.distance(self.center) / self.radius
        } else {
            1.0
        };
        sample_stops(&self.stops, t)
    }
}

/// Translucent radial tint painted over the whole field.
///
/// The inner colour travels `inner_from → inner_to → inner_from` once per
/// `period` seconds; the outer colour is fixed. The gradient is centred and
/// reaches the farthest corner.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OverlayConfig {
    /// Seconds for one full there-and-back pulse.
    pub period: f32,
    pub inner_from: Rgba,
    pub inner_to: Rgba,
    pub outer: Rgba,
}

impl Default for OverlayConfig {
    fn default() -> Self {
        Self {
            period: 10.0,
            inner_from: Rgba::rgba(238, 174, 202, 0.2),
            inner_to: Rgba::rgba(174, 238, 238, 0.2),
            outer: Rgba::rgba(148, 187, 233, 0.1),
        }
    }
}

impl OverlayConfig {
    /// Pulse position at `elapsed` seconds: 0 at the start of a period,
    /// 1 half way through, back to 0 at the end.
    pub fn phase_at(&self, elapsed: f32) -> f32 {
        if self.period <= 0.0 || !elapsed.is_finite() {
            return 0.0;
        }
        let cycle = (elapsed / self.period).rem_euclid(1.0);
        1.0 - (2.0 * cycle - 1.0).abs()
    }

    pub fn inner_at(&self, elapsed: f32) -> Rgba {
        self.inner_from.lerp(self.inner_to, self.phase_at(elapsed))
    }

    /// The overlay gradient for a viewport at a point in time.
    pub fn gradient(&self, bounds: Bounds, elapsed: f32) -> RadialGradient {
        let half = Vec2::new(bounds.width, bounds.height) * 0.5;
        RadialGradient::new(
            half,
            half.length(),
            vec![
                ColorStop::new(0.0, self.inner_at(elapsed)),
                ColorStop::new(1.0, self.outer),
            ],
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_hex() {
        let c = Rgba::from_hex(0x4a0072);
        assert_eq!((c.r, c.g, c.b), (0x4a, 0x00, 0x72));
        assert_eq!(c.a, 1.0);
        assert_eq!(c.to_rgb_u32(), 0x4a0072);
    }

    #[test]
    fn test_backdrop_corners_and_middle() {
        let stops = default_backdrop();
        let g = LinearGradient::backdrop(Bounds::new(200.0, 100.0), &stops);

        assert_eq!(g.color_at(Vec2::ZERO), Rgba::from_hex(0x1a001a));
        assert_eq!(g.color_at(Vec2::new(200.0, 100.0)), Rgba::from_hex(0x000033));
        assert_eq!(g.color_at(Vec2::new(100.0, 50.0)), Rgba::from_hex(0x4a0072));
        // Beyond the far corner clamps to the last stop
        assert_eq!(g.color_at(Vec2::new(400.0, 400.0)), Rgba::from_hex(0x000033));
    }

    #[test]
    fn test_degenerate_linear_gradient_uses_first_stop() {
        let g = LinearGradient::backdrop(Bounds::new(0.0, 0.0), &default_backdrop());
        assert_eq!(g.color_at(Vec2::new(5.0, 5.0)), Rgba::from_hex(0x1a001a));
    }

    #[test]
    fn test_radial_gradient() {
        let g = RadialGradient::new(
            Vec2::ZERO,
            10.0,
            vec![
                ColorStop::new(0.0, Rgba::WHITE),
                ColorStop::new(1.0, Rgba::BLACK),
            ],
        );
        assert_eq!(g.color_at(Vec2::ZERO), Rgba::WHITE);
        assert_eq!(g.color_at(Vec2::new(20.0, 0.0)), Rgba::BLACK);
        let mid = g.color_at(Vec2::new(5.0, 0.0));
        assert!(mid.r == 128 || mid.r == 127);
    }

    #[test]
    fn test_overlay_pulse() {
        let overlay = OverlayConfig::default();
        assert_eq!(overlay.phase_at(0.0), 0.0);
        assert!((overlay.phase_at(5.0) - 1.0).abs() < 1e-6);
        assert!((overlay.phase_at(2.5) - 0.5).abs() < 1e-6);
        assert!(overlay.phase_at(10.0).abs() < 1e-6);

        assert_eq!(overlay.inner_at(0.0), overlay.inner_from);
        assert_eq!(overlay.inner_at(5.0), overlay.inner_to);
    }

    #[test]
    fn test_overlay_gradient_reaches_corner() {
        let g = OverlayConfig::default().gradient(Bounds::new(300.0, 400.0), 0.0);
        assert_eq!(g.center, Vec2::new(150.0, 200.0));
        assert!((g.radius - 250.0).abs() < 1e-4);
    }
}
