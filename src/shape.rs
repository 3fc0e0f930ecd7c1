//! Leaf node kinds.
//!
//! A [`Shape`] is the paintable content of a leaf node. It lives in the node's
//! pre-anchor local space: the node supplies transforms, alpha and masking,
//! and the shape answers bounds, hit and draw questions about itself.

use crate::display::Display;
use crate::flags::DirtyFlags;
use crate::geometry::{Color, Rect};
use crate::render::{DrawCommand, DrawItem, Renderer};
use crate::resource::CpuResource;
use crate::transform::Matrix;

pub trait Shape {
    /// Bounds in the shape's own space, before the anchor offset.
    fn self_bounds(&self) -> Rect;

    /// Point test in the shape's own space. Only called for points inside
    /// the node's stage bounds.
    fn hit_test(&self, x: f32, y: f32) -> bool {
        self.self_bounds().contains(x, y)
    }

    fn can_cull(&self) -> bool {
        true
    }

    fn can_hit_test(&self) -> bool {
        true
    }

    /// Adjust a freshly composed world matrix (e.g. sprite frame trim).
    fn adjust_transform(&self, _world: &mut Matrix) {}

    /// Rebuild cached geometry. `dirty` holds the render flags being cleared.
    fn prepare(&mut self, _dirty: DirtyFlags, _display: &Display) {}

    fn draw(&self, renderer: &mut dyn Renderer, item: &DrawItem);

    /// Drawing this shape depends on time, so the frame must be redrawn.
    fn is_time_dependent(&self) -> bool {
        false
    }

    fn did_move_offscreen(&mut self) {}

    fn will_move_onscreen(&mut self) {}

    /// Native resources to hand to the scene's release queue on destruction.
    fn take_resources(&mut self) -> Vec<Box<dyn CpuResource>> {
        Vec::new()
    }
}

/// Solid rectangle centered on its origin.
#[derive(Debug, Clone, PartialEq)]
pub struct RectShape {
    pub width: f32,
    pub height: f32,
    pub fill: Color,
}

impl RectShape {
    pub fn new(width: f32, height: f32) -> Self {
        Self {
            width,
            height,
            fill: Color::WHITE,
        }
    }

    pub fn fill(mut self, color: Color) -> Self {
        self.fill = color;
        self
    }
}

impl Shape for RectShape {
    fn self_bounds(&self) -> Rect {
        Rect::centered(self.width, self.height)
    }

    fn draw(&self, renderer: &mut dyn Renderer, item: &DrawItem) {
        renderer.draw(
            item,
            DrawCommand::Rect {
                rect: self.self_bounds(),
                color: self.fill,
            },
        );
    }
}

/// Rectangle whose hit area excludes the rounded corners.
#[derive(Debug, Clone, PartialEq)]
pub struct RoundedRectShape {
    pub width: f32,
    pub height: f32,
    pub radius: f32,
    pub fill: Color,
}

impl RoundedRectShape {
    pub fn new(width: f32, height: f32, radius: f32) -> Self {
        Self {
            width,
            height,
            radius,
            fill: Color::WHITE,
        }
    }
}

impl Shape for RoundedRectShape {
    fn self_bounds(&self) -> Rect {
        Rect::centered(self.width, self.height)
    }

    fn hit_test(&self, x: f32, y: f32) -> bool {
        self.self_bounds().contains_rounded(x, y, self.radius)
    }

    fn draw(&self, renderer: &mut dyn Renderer, item: &DrawItem) {
        renderer.draw(
            item,
            DrawCommand::RoundedRect {
                rect: self.self_bounds(),
                color: self.fill,
                radius: self.radius,
            },
        );
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CircleShape {
    pub radius: f32,
    pub fill: Color,
}

impl CircleShape {
    pub fn new(radius: f32) -> Self {
        Self {
            radius,
            fill: Color::WHITE,
        }
    }
}

impl Shape for CircleShape {
    fn self_bounds(&self) -> Rect {
        Rect::centered(self.radius * 2.0, self.radius * 2.0)
    }

    fn hit_test(&self, x: f32, y: f32) -> bool {
        x * x + y * y <= self.radius * self.radius
    }

    fn draw(&self, renderer: &mut dyn Renderer, item: &DrawItem) {
        renderer.draw(
            item,
            DrawCommand::Circle {
                center: (0.0, 0.0),
                radius: self.radius,
                color: self.fill,
            },
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_bounds_are_centered() {
        assert_eq!(
            RectShape::new(100.0, 40.0).self_bounds(),
            Rect::new(-50.0, -20.0, 100.0, 40.0)
        );
    }

    #[test]
    fn test_circle_hit_excludes_bounding_corners() {
        let circle = CircleShape::new(10.0);
        assert!(circle.self_bounds().contains(-9.0, -9.0));
        assert!(!circle.hit_test(-9.0, -9.0));
        assert!(circle.hit_test(0.0, 9.0));
    }

    #[test]
    fn test_rounded_rect_hit() {
        let shape = RoundedRectShape::new(100.0, 100.0, 20.0);
        assert!(!shape.hit_test(-49.0, -49.0));
        assert!(shape.hit_test(0.0, -49.0));
    }
}
