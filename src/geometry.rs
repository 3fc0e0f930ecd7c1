//! Axis-aligned rectangles and colors.
//!
//! A `Rect` with a non-positive width or height is empty. Empty rects are the
//! identity for [`Rect::union`] and never intersect or contain anything, which
//! keeps degenerate bounds from producing false culling or hit results.

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);
}

impl Default for Color {
    fn default() -> Self {
        Self::TRANSPARENT
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    /// The canonical empty rect.
    pub const EMPTY: Rect = Rect {
        x: 0.0,
        y: 0.0,
        width: 0.0,
        height: 0.0,
    };

    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn from_min_max(min_x: f32, min_y: f32, max_x: f32, max_y: f32) -> Self {
        Self {
            x: min_x,
            y: min_y,
            width: max_x - min_x,
            height: max_y - min_y,
        }
    }

    /// A `width` x `height` rect centered on the origin.
    pub fn centered(width: f32, height: f32) -> Self {
        Self::new(-width * 0.5, -height * 0.5, width, height)
    }

    pub fn max_x(&self) -> f32 {
        self.x + self.width
    }

    pub fn max_y(&self) -> f32 {
        self.y + self.height
    }

    pub fn center(&self) -> (f32, f32) {
        (self.x + self.width * 0.5, self.y + self.height * 0.5)
    }

    pub fn is_empty(&self) -> bool {
        !(self.width > 0.0 && self.height > 0.0)
    }

    pub fn offset(&self, dx: f32, dy: f32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
            ..*self
        }
    }

    /// Strict overlap test. Rects that share only an edge do not intersect.
    pub fn intersects(&self, other: &Rect) -> bool {
        self.x < other.x + other.width
            && self.x + self.width > other.x
            && self.y < other.y + other.height
            && self.y + self.height > other.y
    }

    pub fn contains(&self, x: f32, y: f32) -> bool {
        x >= self.x && x < self.x + self.width && y >= self.y && y < self.y + self.height
    }

    pub fn union(&self, other: &Rect) -> Rect {
        if other.is_empty() {
            return *self;
        }
        if self.is_empty() {
            return *other;
        }
        Rect::from_min_max(
            self.x.min(other.x),
            self.y.min(other.y),
            self.max_x().max(other.max_x()),
            self.max_y().max(other.max_y()),
        )
    }

    /// Overlapping region, or [`Rect::EMPTY`] if the rects are disjoint.
    pub fn intersection(&self, other: &Rect) -> Rect {
        if !self.intersects(other) {
            return Rect::EMPTY;
        }
        Rect::from_min_max(
            self.x.max(other.x),
            self.y.max(other.y),
            self.max_x().min(other.max_x()),
            self.max_y().min(other.max_y()),
        )
    }

    /// Check if a point is inside this rect with rounded corners.
    /// The corner_radius is clamped to half of the smaller dimension.
    pub fn contains_rounded(&self, x: f32, y: f32, corner_radius: f32) -> bool {
        if !self.contains(x, y) {
            return false;
        }
        if corner_radius <= 0.0 {
            return true;
        }

        let r = corner_radius.min((self.width.min(self.height) / 2.0).max(0.0));
        let cx = if x < self.x + r {
            self.x + r
        } else if x > self.max_x() - r {
            self.max_x() - r
        } else {
            return true;
        };
        let cy = if y < self.y + r {
            self.y + r
        } else if y > self.max_y() - r {
            self.max_y() - r
        } else {
            return true;
        };

        let dx = x - cx;
        let dy = y - cy;
        dx * dx + dy * dy <= r * r
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_touching_rects_do_not_intersect() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        let b = Rect::new(10.0, 0.0, 10.0, 10.0);
        assert!(!a.intersects(&b));
        assert!(!b.intersects(&a));
        assert!(a.intersects(&Rect::new(9.5, 9.5, 1.0, 1.0)));
    }

    #[test]
    fn test_empty_rect_never_intersects() {
        let screen = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(!Rect::new(50.0, 50.0, 0.0, 0.0).intersects(&screen));
        assert!(!Rect::EMPTY.intersects(&screen));
    }

    #[test]
    fn test_union_ignores_empty() {
        let a = Rect::new(0.0, 0.0, 10.0, 10.0);
        assert_eq!(a.union(&Rect::EMPTY), a);
        assert_eq!(Rect::EMPTY.union(&a), a);
        assert_eq!(
            a.union(&Rect::new(20.0, -5.0, 5.0, 5.0)),
            Rect::from_min_max(0.0, -5.0, 25.0, 10.0)
        );
    }

    #[test]
    fn test_intersection() {
        let a = Rect::new(0.0, 0.0, 100.0, 100.0);
        let b = Rect::new(25.0, 25.0, 100.0, 50.0);
        assert_eq!(a.intersection(&b), Rect::new(25.0, 25.0, 75.0, 50.0));
        assert!(a.intersection(&Rect::new(200.0, 0.0, 1.0, 1.0)).is_empty());
    }

    #[test]
    fn test_contains_is_half_open() {
        let r = Rect::centered(10.0, 10.0);
        assert!(r.contains(-5.0, -5.0));
        assert!(!r.contains(5.0, 0.0));
    }

    #[test]
    fn test_contains_rounded_rejects_corner() {
        let r = Rect::new(0.0, 0.0, 100.0, 100.0);
        assert!(!r.contains_rounded(1.0, 1.0, 20.0));
        assert!(r.contains_rounded(20.0, 20.0, 20.0));
        assert!(r.contains_rounded(50.0, 1.0, 20.0));
    }
}
