use crate::geometry::Rect;
use crate::transform::Matrix;

/// Device orientation relative to the content's upright frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Orientation {
    #[default]
    Upright,
    SidewaysRight,
    UpsideDown,
    SidewaysLeft,
}

impl Orientation {
    fn degrees(self) -> f32 {
        match self {
            Orientation::Upright => 0.0,
            Orientation::SidewaysRight => 90.0,
            Orientation::UpsideDown => 180.0,
            Orientation::SidewaysLeft => 270.0,
        }
    }
}

/// View and projection for one frame.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Frustum {
    /// Content-to-view transform (orientation)
    pub view: Matrix,
    /// Row-major orthographic projection from view space to clip space
    pub projection: [[f32; 4]; 4],
    /// Physical pixels per content unit
    pub pixel_scale: (f32, f32),
}

/// Content geometry the scene renders into.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Display {
    pub content_width: f32,
    pub content_height: f32,
    pub content_scale_x: f32,
    pub content_scale_y: f32,
    pub orientation: Orientation,
}

impl Display {
    pub fn new(content_width: f32, content_height: f32) -> Self {
        Self {
            content_width,
            content_height,
            content_scale_x: 1.0,
            content_scale_y: 1.0,
            orientation: Orientation::Upright,
        }
    }

    /// The visible content rectangle; the default culling rectangle.
    pub fn screen_content_bounds(&self) -> Rect {
        Rect::new(0.0, 0.0, self.content_width, self.content_height)
    }

    pub fn frustum(&self) -> Frustum {
        let (cx, cy) = self.screen_content_bounds().center();
        let view = if self.orientation == Orientation::Upright {
            Matrix::IDENTITY
        } else {
            Matrix::translate(cx, cy)
                .then(&Matrix::rotate_degrees(self.orientation.degrees()))
                .then(&Matrix::translate(-cx, -cy))
        };

        let w = self.content_width.max(f32::EPSILON);
        let h = self.content_height.max(f32::EPSILON);
        let projection = [
            [2.0 / w, 0.0, 0.0, -1.0],
            [0.0, -2.0 / h, 0.0, 1.0],
            [0.0, 0.0, -1.0, 0.0],
            [0.0, 0.0, 0.0, 1.0],
        ];

        Frustum {
            view,
            projection,
            pixel_scale: (1.0 / self.content_scale_x, 1.0 / self.content_scale_y),
        }
    }
}

impl Default for Display {
    fn default() -> Self {
        Self::new(320.0, 480.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_projection_maps_content_corners() {
        let f = Display::new(200.0, 100.0).frustum();
        let p = f.projection;
        let clip = |x: f32, y: f32| (p[0][0] * x + p[0][3], p[1][1] * y + p[1][3]);
        let close = |a: (f32, f32), b: (f32, f32)| (a.0 - b.0).abs() < 1e-5 && (a.1 - b.1).abs() < 1e-5;
        assert!(close(clip(0.0, 0.0), (-1.0, 1.0)));
        assert!(close(clip(200.0, 100.0), (1.0, -1.0)));
        assert!(f.view.is_identity());
    }

    #[test]
    fn test_upside_down_view_rotates_about_center() {
        let mut display = Display::new(100.0, 100.0);
        display.orientation = Orientation::UpsideDown;
        let (x, y) = display.frustum().view.transform_point(0.0, 0.0);
        assert!((x - 100.0).abs() < 1e-3);
        assert!((y - 100.0).abs() < 1e-3);
    }
}
