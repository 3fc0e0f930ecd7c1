use crate::display::{Display, Orientation};
use crate::geometry::Color;
use crate::render::DrawMode;

/// Settings a [`Scene`](crate::Scene) is created with.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneConfig {
    pub content_width: f32,
    pub content_height: f32,
    pub orientation: Orientation,
    pub clear_color: Color,
    /// Frames between release-queue flushes
    pub collect_interval: u64,
    /// Frames between orphanage sweeps
    pub sweep_interval: u64,
    pub draw_mode: DrawMode,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            content_width: 320.0,
            content_height: 480.0,
            orientation: Orientation::Upright,
            clear_color: Color::BLACK,
            collect_interval: 4,
            sweep_interval: 32,
            draw_mode: DrawMode::Default,
        }
    }
}

impl SceneConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn content_size(mut self, width: f32, height: f32) -> Self {
        self.content_width = width;
        self.content_height = height;
        self
    }

    pub fn orientation(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    pub fn clear_color(mut self, color: Color) -> Self {
        self.clear_color = color;
        self
    }

    pub fn collect_interval(mut self, frames: u64) -> Self {
        self.collect_interval = frames.max(1);
        self
    }

    pub fn sweep_interval(mut self, frames: u64) -> Self {
        self.sweep_interval = frames.max(1);
        self
    }

    pub fn draw_mode(mut self, mode: DrawMode) -> Self {
        self.draw_mode = mode;
        self
    }

    pub(crate) fn display(&self) -> Display {
        Display {
            orientation: self.orientation,
            ..Display::new(self.content_width, self.content_height)
        }
    }
}
