//! The drawing contract between the field and its host.
//!
//! A host provides something that implements [`Surface`]: a software pixel
//! buffer ([`PixelSurface`](crate::PixelSurface)), a browser canvas, a test
//! [`Recorder`], and so on. The renderer only ever uses the six operations
//! below.

use glam::Vec2;

use crate::particle::Bounds;
use crate::visuals::{LinearGradient, RadialGradient, Rgba};

/// Axis-aligned rectangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub const fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self { x, y, width, height }
    }
}

impl From<Bounds> for Rect {
    fn from(bounds: Bounds) -> Self {
        Rect::new(0.0, 0.0, bounds.width, bounds.height)
    }
}

/// Paint for [`Surface::fill_rect`].
#[derive(Debug, Clone, Copy)]
pub enum Fill<'a> {
    Solid(Rgba),
    Linear(&'a LinearGradient),
    Radial(&'a RadialGradient),
}

impl Fill<'_> {
    /// Colour of this paint at `point`.
    pub fn color_at(&self, point: Vec2) -> Rgba {
        match self {
            Fill::Solid(color) => *color,
            Fill::Linear(gradient) => gradient.color_at(point),
            Fill::Radial(gradient) => gradient.color_at(point),
        }
    }
}

/// A 2D drawing target.
///
/// All drawing blends source-over with the colour's alpha. Coordinates
/// outside the drawable area are clipped by the implementation.
pub trait Surface {
    /// Current drawable size.
    fn size(&self) -> Bounds;

    /// Change the drawable size. Contents after a resize are unspecified.
    fn resize(&mut self, bounds: Bounds);

    /// Reset `rect` to fully transparent.
    fn clear_rect(&mut self, rect: Rect);

    fn fill_rect(&mut self, rect: Rect, fill: Fill<'_>);

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba);

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba);
}

/// Owned copy of a [`Fill`], as stored by [`Recorder`].
#[derive(Debug, Clone, PartialEq)]
pub enum RecordedFill {
    Solid(Rgba),
    Linear(LinearGradient),
    Radial(RadialGradient),
}

/// One call made on a [`Recorder`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Resize(Bounds),
    Clear(Rect),
    FillRect { rect: Rect, fill: RecordedFill },
    Circle { center: Vec2, radius: f32, color: Rgba },
    Line { from: Vec2, to: Vec2, width: f32, color: Rgba },
}

/// A surface that draws nothing and remembers every call.
///
/// Useful for asserting exactly what the renderer asked for.
#[derive(Debug, Clone, Default)]
pub struct Recorder {
    size: Bounds,
    commands: Vec<DrawCommand>,
}

impl Recorder {
    pub fn new(size: Bounds) -> Self {
        Self {
            size,
            commands: Vec::new(),
        }
    }

    pub fn commands(&self) -> &[DrawCommand] {
        &self.commands
    }

    /// Drain the recorded commands, e.g. between frames.
    pub fn take_commands(&mut self) -> Vec<DrawCommand> {
        std::mem::take(&mut self.commands)
    }

    pub fn circles(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Circle { .. }))
    }

    pub fn lines(&self) -> impl Iterator<Item = &DrawCommand> {
        self.commands
            .iter()
            .filter(|c| matches!(c, DrawCommand::Line { .. }))
    }
}

impl Surface for Recorder {
    fn size(&self) -> Bounds {
        self.size
    }

    fn resize(&mut self, bounds: Bounds) {
        self.size = bounds;
        self.commands.push(DrawCommand::Resize(bounds));
    }

    fn clear_rect(&mut self, rect: Rect) {
        self.commands.push(DrawCommand::Clear(rect));
    }

    fn fill_rect(&mut self, rect: Rect, fill: Fill<'_>) {
        let fill = match fill {
            Fill::Solid(color) => RecordedFill::Solid(color),
            Fill::Linear(g) => RecordedFill::Linear(g.clone()),
            Fill::Radial(g) => RecordedFill::Radial(g.clone()),
        };
        self.commands.push(DrawCommand::FillRect { rect, fill });
    }

    fn fill_circle(&mut self, center: Vec2, radius: f32, color: Rgba) {
        self.commands.push(DrawCommand::Circle {
            center,
            radius,
            color,
        });
    }

    fn stroke_line(&mut self, from: Vec2, to: Vec2, width: f32, color: Rgba) {
        self.commands.push(DrawCommand::Line {
            from,
            to,
            width,
            color,
        });
    }
}
