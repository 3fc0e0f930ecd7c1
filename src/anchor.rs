use crate::geometry::Rect;

/// Pivot point for rotation and scale, relative to a node's self bounds.
///
/// Public values are normalized: `(0, 0)` is the top-left corner of the
/// bounds and `(1, 1)` the bottom-right. Internally the anchor is kept
/// centered on zero, in `[-0.5, 0.5]`.
///
/// # Example
/// ```
/// use stagecraft::{Anchor, Rect};
///
/// let bounds = Rect::centered(100.0, 50.0);
/// // Anchoring at the top-left moves the content so that corner sits on the origin.
/// assert_eq!(Anchor::TOP_LEFT.offset(&bounds), (50.0, 25.0));
/// assert_eq!(Anchor::CENTER.offset(&bounds), (0.0, 0.0));
/// ```
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Anchor {
    x: f32,
    y: f32,
}

impl Anchor {
    /// Center of the bounds - the default
    pub const CENTER: Self = Self { x: 0.0, y: 0.0 };

    pub const TOP_LEFT: Self = Self { x: -0.5, y: -0.5 };

    pub const TOP_RIGHT: Self = Self { x: 0.5, y: -0.5 };

    pub const BOTTOM_LEFT: Self = Self { x: -0.5, y: 0.5 };

    pub const BOTTOM_RIGHT: Self = Self { x: 0.5, y: 0.5 };

    /// Anchor from normalized coordinates. Values outside `[0, 1]` are kept;
    /// they pivot outside the bounds.
    pub fn new(x: f32, y: f32) -> Self {
        Self {
            x: x - 0.5,
            y: y - 0.5,
        }
    }

    pub fn x(&self) -> f32 {
        self.x + 0.5
    }

    pub fn y(&self) -> f32 {
        self.y + 0.5
    }

    pub fn set_x(&mut self, x: f32) {
        self.x = x - 0.5;
    }

    pub fn set_y(&mut self, y: f32) {
        self.y = y - 0.5;
    }

    /// Translation folded into the local matrix before rotation and scale.
    ///
    /// Per axis: `-(c * min + (1 - c) * max)` with `c = 0.5 - anchor`.
    pub fn offset(&self, bounds: &Rect) -> (f32, f32) {
        if bounds.is_empty() {
            return (0.0, 0.0);
        }
        let cx = 0.5 - self.x;
        let cy = 0.5 - self.y;
        (
            -(cx * bounds.x + (1.0 - cx) * bounds.max_x()),
            -(cy * bounds.y + (1.0 - cy) * bounds.max_y()),
        )
    }
}

impl Default for Anchor {
    fn default() -> Self {
        Self::CENTER
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalized_round_trip() {
        let a = Anchor::new(0.25, 1.0);
        assert_eq!(a.x(), 0.25);
        assert_eq!(a.y(), 1.0);
    }

    #[test]
    fn test_offset_for_corners() {
        let bounds = Rect::new(-50.0, -50.0, 100.0, 100.0);
        assert_eq!(Anchor::TOP_LEFT.offset(&bounds), (50.0, 50.0));
        assert_eq!(Anchor::BOTTOM_RIGHT.offset(&bounds), (-50.0, -50.0));
        assert_eq!(Anchor::CENTER.offset(&bounds), (0.0, 0.0));
    }

    #[test]
    fn test_offset_uncentered_bounds() {
        // Content already spanning [0, 40]: a centered anchor pulls it back by 20.
        let bounds = Rect::new(0.0, 0.0, 40.0, 10.0);
        assert_eq!(Anchor::CENTER.offset(&bounds), (-20.0, -5.0));
    }

    #[test]
    fn test_empty_bounds_have_no_offset() {
        assert_eq!(Anchor::TOP_LEFT.offset(&Rect::EMPTY), (0.0, 0.0));
    }
}
