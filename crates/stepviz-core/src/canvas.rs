//! Drawing contract between visual steps and the host renderer.
//!
//! The core never touches pixels. Steps describe what they want drawn as
//! [`Shape`]s and the host decides how.

/// Something a step wants drawn.
#[derive(Debug, Clone, PartialEq)]
pub enum Shape {
    Point { at: [f64; 3], radius: f64 },
    Line { from: [f64; 3], to: [f64; 3] },
    Label { at: [f64; 3], text: String },
}

/// How a shape is drawn.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Style {
    /// RGB, each 0.0 - 1.0
    pub color: [f32; 3],
    /// 0.0 = invisible, 1.0 = opaque
    pub opacity: f32,
}

impl Style {
    pub const fn new(color: [f32; 3], opacity: f32) -> Self {
        Self { color, opacity }
    }

    /// Same color at a different opacity.
    #[must_use]
    pub const fn with_opacity(self, opacity: f32) -> Self {
        Self {
            color: self.color,
            opacity,
        }
    }
}

/// Host-supplied drawing surface.
pub trait Canvas {
    fn draw(&mut self, shape: Shape, style: Style);
}

/// A canvas that records draw calls in order.
#[derive(Debug, Default, Clone)]
pub struct RecordingCanvas {
    pub commands: Vec<(Shape, Style)>,
}

impl RecordingCanvas {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }
}

impl Canvas for RecordingCanvas {
    fn draw(&mut self, shape: Shape, style: Style) {
        self.commands.push((shape, style));
    }
}
