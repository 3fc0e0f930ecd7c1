use crate::geometry::Rect;

/// A 2D affine matrix.
///
/// Maps `(x, y)` to `(a*x + b*y + tx, c*x + d*y + ty)`. Used for local,
/// world (source-to-destination) and mask-UV transforms.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Matrix {
    pub a: f32,
    pub b: f32,
    pub c: f32,
    pub d: f32,
    pub tx: f32,
    pub ty: f32,
}

impl Matrix {
    /// Identity matrix (no transformation)
    pub const IDENTITY: Self = Self {
        a: 1.0,
        b: 0.0,
        c: 0.0,
        d: 1.0,
        tx: 0.0,
        ty: 0.0,
    };

    pub fn identity() -> Self {
        Self::IDENTITY
    }

    pub fn translate(x: f32, y: f32) -> Self {
        Self {
            tx: x,
            ty: y,
            ..Self::IDENTITY
        }
    }

    /// Counter-clockwise in a y-up frame, clockwise on a y-down screen.
    pub fn rotate(angle_radians: f32) -> Self {
        let (sin, cos) = angle_radians.sin_cos();
        Self {
            a: cos,
            b: -sin,
            c: sin,
            d: cos,
            tx: 0.0,
            ty: 0.0,
        }
    }

    pub fn rotate_degrees(angle_degrees: f32) -> Self {
        Self::rotate(angle_degrees.to_radians())
    }

    pub fn scale(s: f32) -> Self {
        Self::scale_xy(s, s)
    }

    pub fn scale_xy(sx: f32, sy: f32) -> Self {
        Self {
            a: sx,
            d: sy,
            ..Self::IDENTITY
        }
    }

    /// Compose this matrix with another: self * other.
    /// Applies `other` first, then `self`.
    pub fn then(&self, other: &Matrix) -> Matrix {
        Matrix {
            a: self.a * other.a + self.b * other.c,
            b: self.a * other.b + self.b * other.d,
            c: self.c * other.a + self.d * other.c,
            d: self.c * other.b + self.d * other.d,
            tx: self.a * other.tx + self.b * other.ty + self.tx,
            ty: self.c * other.tx + self.d * other.ty + self.ty,
        }
    }

    pub fn determinant(&self) -> f32 {
        self.a * self.d - self.b * self.c
    }

    /// Inverse of this matrix, or `None` when it collapses an axis.
    pub fn inverse(&self) -> Option<Matrix> {
        let det = self.determinant();
        if det.abs() < 1e-10 {
            return None;
        }
        let inv_det = 1.0 / det;
        Some(Matrix {
            a: self.d * inv_det,
            b: -self.b * inv_det,
            c: -self.c * inv_det,
            d: self.a * inv_det,
            tx: (-self.d * self.tx + self.b * self.ty) * inv_det,
            ty: (self.c * self.tx - self.a * self.ty) * inv_det,
        })
    }

    pub fn transform_point(&self, x: f32, y: f32) -> (f32, f32) {
        (
            self.a * x + self.b * y + self.tx,
            self.c * x + self.d * y + self.ty,
        )
    }

    /// Axis-aligned bounds of `rect` after transformation. Empty stays empty.
    pub fn transform_rect(&self, rect: &Rect) -> Rect {
        if rect.is_empty() {
            return Rect::EMPTY;
        }
        let corners = [
            self.transform_point(rect.x, rect.y),
            self.transform_point(rect.max_x(), rect.y),
            self.transform_point(rect.x, rect.max_y()),
            self.transform_point(rect.max_x(), rect.max_y()),
        ];
        let (mut min_x, mut min_y) = corners[0];
        let (mut max_x, mut max_y) = corners[0];
        for &(x, y) in &corners[1..] {
            min_x = min_x.min(x);
            min_y = min_y.min(y);
            max_x = max_x.max(x);
            max_y = max_y.max(y);
        }
        Rect::from_min_max(min_x, min_y, max_x, max_y)
    }

    /// Column-major 3x3 padded to vec4 columns, as uploaded to a uniform block.
    pub fn to_columns(&self) -> [[f32; 4]; 3] {
        [
            [self.a, self.c, 0.0, 0.0],
            [self.b, self.d, 0.0, 0.0],
            [self.tx, self.ty, 1.0, 0.0],
        ]
    }

    pub fn is_identity(&self) -> bool {
        *self == Self::IDENTITY
    }
}

impl Default for Matrix {
    fn default() -> Self {
        Self::IDENTITY
    }
}

/// The user-facing transform properties of a node or mask.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalTransform {
    pub x: f32,
    pub y: f32,
    /// Degrees.
    pub rotation: f32,
    pub x_scale: f32,
    pub y_scale: f32,
}

impl LocalTransform {
    pub const IDENTITY: Self = Self {
        x: 0.0,
        y: 0.0,
        rotation: 0.0,
        x_scale: 1.0,
        y_scale: 1.0,
    };

    pub fn at(x: f32, y: f32) -> Self {
        Self {
            x,
            y,
            ..Self::IDENTITY
        }
    }

    /// `T(x, y) * R * S * T(offset)`: the offset moves content so rotation and
    /// scale pivot on the anchor.
    pub fn to_matrix(&self, offset: (f32, f32)) -> Matrix {
        let mut m = Matrix::translate(self.x, self.y);
        if self.rotation != 0.0 {
            m = m.then(&Matrix::rotate_degrees(self.rotation));
        }
        if self.x_scale != 1.0 || self.y_scale != 1.0 {
            m = m.then(&Matrix::scale_xy(self.x_scale, self.y_scale));
        }
        if offset != (0.0, 0.0) {
            m = m.then(&Matrix::translate(offset.0, offset.1));
        }
        m
    }
}

impl Default for LocalTransform {
    fn default() -> Self {
        Self::IDENTITY
    }
}
