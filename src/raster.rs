//! Software rasterizer.
//!
//! [`PixelSurface`] implements [`Surface`] on a plain `0x00RRGGBB` buffer,
//! the layout a softbuffer window expects, so the desktop host can copy it
//! straight to the screen. Shapes get one pixel of coverage-based
//! anti-aliasing; everything is blended source-over onto an opaque buffer.

use std::ops::Range;
use std::path::Path;

use glam::Vec2;
use image::{ImageFormat, RgbaImage};

use crate::error::ExportError;
use crate::particle::Bounds;
use crate::surface::{Fill, Rect, Surface};
use crate::visuals::Rgba;

/// CPU pixel buffer with an integer size.
#[derive(Debug, Clone)]
pub struct PixelSurface {
    width: u32,
    height: u32,
    pixels: Vec<u32>,
}

/// Pixel indices covering `lo..hi`, clipped to `0..limit`.
fn span(lo: f32, hi: f32, limit: u32) -> Range<u32> {
    let start = lo.floor().max(0.0).min(limit as f32) as u32;
    let end = hi.ceil().max(0.0).min(limit as f32) as u32;
    start..end.max(start)
}

/// Shortest distance from `p` to the segment `a..b`.
fn distance_to_segment(p: Vec2, a: Vec2, b: Vec2) -> f32 {
    let ab = b - a;
    let len_sq = ab.length_squared();
    if len_sq <= f32::EPSILON {
        return p.distance(a);
    }
    let t = ((p - a).dot(ab) / len_sq).clamp(0.0, 1.0);
    p.distance(a + ab * t)
}

fn blend_channel(src: u8, dst: u32, alpha: f32) -> u32 {
    let dst = (dst & 0xff) as f32;
    (src as f32 * alpha + dst * (1.0 - alpha)).round() as u32
}

impl PixelSurface {
    /// A black surface of the given size.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            pixels: vec![0; width as usize * height as usize],
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    /// Raw `0x00RRGGBB` pixels, row-major.
    pub fn pixels(&self) -> &[u32] {
        &self.pixels
    }

    /// RGB of one pixel, `None` when out of range.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 3]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let p = self.pixels[(y * self.width + x) as usize];
        Some([(p >> 16) as u8, (p >> 8) as u8, p as u8])
    }

    /// Blend `color` into one pixel with extra `coverage` in `0..=1`.
    fn blend(&mut self, x: u32, y: u32, color: Rgba, coverage: f32) {
        let alpha = (color.a * coverage).clamp(0.0, 1.0);
        if alpha <= 0.0 {
            return;
        }
        let idx = (y * self.width + x) as usize;
        let dst = self.pixels[idx];
        let r = blend_channel(color.r, dst >> 16, alpha);
        let g = blend_channel(color.g, dst >> 8, alpha);
        let b = blend_channel(color.b, dst, alpha);
        self.pixels[idx] = (r << 16) | (g << 8) | b;
    }

    /// Copy into an RGBA image with opaque alpha.
    pub fn to_image(&self) -> RgbaImage {
        RgbaImage::from_fn(self.width, self.height, |x, y| {
            let p = self.pixels[(y * self.width + x) as usize];
            image::Rgba([(p >> 16) as u8, (p >> 8) as u8, p as u8, 255])
        })
    }

    /// Write the current contents as a PNG.
    pub fn save_png(&self, path: impl AsRef<Path>) -> Result<(), ExportError> {
        if self.width == 0 || self.height == 0 {
            return Err(ExportError::EmptySurface);
        }
        self.to_image().save_with_format(path, ImageFormat::Png)?;
        Ok(())
    }
}

impl Surface for PixelSurface {
    fn size(&self) -> Bounds {
        Bounds::from_size(self.width, self.height)
    }

    fn resize(&mut self, bounds: Bounds) {
        let width = bounds.width.max(0.0).round() as u32;
        let height = bounds.height.max(0.0).round() as u32;
        if width == self.width && height == self.height {
            return;
        }
        self.width = width;
        self.height = height;
        self.pixels = vec![0; width as usize * height as usize];
    }

    fn clear_rect(&mut self, rect: Rect) {
        let xs = span(rect.x, rect.x + rect.width, self.width);
        for y in span(rect.y, rect.y + rect.height, self.height) {
            let row = (y * self.width) as usize;
            self.pixels[row + xs.start as usize..row + xs.end as usize].fill(0);
        }
    }

    fn fill_rect(&mut self, rect: Rect, fill: Fill<'_>) {
        let xs = span(rect.x, rect.x + rect.width, self.width);
        for y in span(rect.y, rect.y + rect.height, self.height) {
            for x in xs.clone() {
                let center = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                self.blend(x, y, fill.color_at(center), 1.0);
            }
        }
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        if radius <= 0.0 {
            return;
        }
        let reach = radius + 1.0;
        for y in span(center.y - reach, center.y + reach, self.height) {
            for x in span(center.x - reach, center.x + reach, self.width) {
                let d = Vec2::new(x as f32 + 0.5, y as f32 + 0.5).distance(center);
                let coverage = (radius + 0.5 - d).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(x, y, color, coverage);
                }
            }
        }
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        let half = width * 0.5;
        let min = from.min(to) - Vec2::splat(half + 1.0);
        let max = from.max(to) + Vec2::splat(half + 1.0);
        for y in span(min.y, max.y, self.height) {
            for x in span(min.x, max.x, self.width) {
                let p = Vec2::new(x as f32 + 0.5, y as f32 + 0.5);
                let coverage = (half + 0.5 - distance_to_segment(p, from, to)).clamp(0.0, 1.0);
                if coverage > 0.0 {
                    self.blend(x, y, color, coverage);
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::visuals::{default_backdrop, LinearGradient};

    #[test]
    fn test_new_is_black() {
        let s = PixelSurface::new(4, 3);
        assert_eq!(s.pixels().len(), 12);
        assert_eq!(s.pixel(3, 2), Some([0, 0, 0]));
        assert_eq!(s.pixel(4, 0), None);
    }

    #[test]
    fn test_fill_rect_solid_and_clear() {
        let mut s = PixelSurface::new(8, 8);
        s.fill_rect(Rect::new(0.0, 0.0, 8.0, 8.0), Fill::Solid(Rgba::from_hex(0x336699)));
        assert_eq!(s.pixel(5, 5), Some([0x33, 0x66, 0x99]));

        s.clear_rect(Rect::new(0.0, 0.0, 4.0, 8.0));
        assert_eq!(s.pixel(1, 1), Some([0, 0, 0]));
        assert_eq!(s.pixel(6, 1), Some([0x33, 0x66, 0x99]));
    }

    #[test]
    fn test_half_alpha_blends() {
        let mut s = PixelSurface::new(2, 2);
        s.fill_rect(Rect::new(0.0, 0.0, 2.0, 2.0), Fill::Solid(Rgba::WHITE.with_alpha(0.5)));
        assert_eq!(s.pixel(0, 0), Some([128, 128, 128]));
    }

    #[test]
    fn test_gradient_fill_runs_dark_to_dark_through_purple() {
        let mut s = PixelSurface::new(64, 64);
        let g = LinearGradient::backdrop(s.size(), &default_backdrop());
        s.fill_rect(Rect::from(s.size()), Fill::Linear(&g));

        let [r0, _, b0] = s.pixel(0, 0).unwrap();
        let [rm, _, bm] = s.pixel(32, 32).unwrap();
        assert!(rm > r0 && bm > b0);
    }

    #[test]
    fn test_fill_circle_covers_center_not_far_pixels() {
        let mut s = PixelSurface::new(20, 20);
        s.fill_circle(Vec2::new(10.0, 10.0), 3.0, Rgba::WHITE);
        assert_eq!(s.pixel(10, 10), Some([255, 255, 255]));
        assert_eq!(s.pixel(0, 0), Some([0, 0, 0]));
        assert_eq!(s.pixel(10, 16), Some([0, 0, 0]));
    }

    #[test]
    fn test_stroke_line_touches_pixels_along_segment() {
        let mut s = PixelSurface::new(20, 20);
        s.stroke_line(Vec2::new(2.0, 10.5), Vec2::new(18.0, 10.5), 1.0, Rgba::WHITE);
        assert_eq!(s.pixel(10, 10), Some([255, 255, 255]));
        assert_eq!(s.pixel(10, 3), Some([0, 0, 0]));
    }

    #[test]
    fn test_drawing_outside_is_clipped() {
        let mut s = PixelSurface::new(10, 10);
        s.fill_circle(Vec2::new(-50.0, -50.0), 4.0, Rgba::WHITE);
        s.stroke_line(Vec2::new(-5.0, -5.0), Vec2::new(30.0, 30.0), 0.8, Rgba::WHITE);
        s.fill_circle(Vec2::new(f32::NAN, 5.0), 4.0, Rgba::WHITE);
        assert_eq!(s.pixel(9, 0), Some([0, 0, 0]));
    }

    #[test]
    fn test_resize_reallocates() {
        let mut s = PixelSurface::new(10, 10);
        s.resize(Bounds::new(30.0, 20.0));
        assert_eq!((s.width(), s.height()), (30, 20));
        assert_eq!(s.pixels().len(), 600);
        s.resize(Bounds::new(0.0, 20.0));
        assert!(s.size().is_empty());
    }

    #[test]
    fn test_save_empty_surface_fails() {
        let s = PixelSurface::new(0, 0);
        let err = s.save_png(std::env::temp_dir().join("particle_field_empty.png"));
        assert!(matches!(err, Err(ExportError::EmptySurface)));
    }
}
