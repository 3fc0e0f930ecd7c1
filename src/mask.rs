//! Bitmap masks.
//!
//! A mask clips a node through the luminance of a bitmap. It carries its own
//! transform relative to the node's pre-anchor local space, and a content size
//! that is used only for bounds and UV math. Decoding and texture upload
//! happen elsewhere; this module only needs the pixels for hit refinement.

use std::rc::Rc;

use image::GrayImage;

use crate::geometry::Rect;
use crate::transform::{LocalTransform, Matrix};

/// Pixel source backing a mask.
#[derive(Debug, Clone)]
pub enum MaskPaint {
    Owned(GrayImage),
    /// Borrowed from a texture cache for the lifetime of the mask.
    Shared(Rc<GrayImage>),
}

impl MaskPaint {
    pub fn bitmap(&self) -> &GrayImage {
        match self {
            MaskPaint::Owned(image) => image,
            MaskPaint::Shared(image) => image,
        }
    }
}

#[derive(Debug, Clone)]
pub struct BitmapMask {
    paint: MaskPaint,
    transform: LocalTransform,
    content_width: f32,
    content_height: f32,
    threshold: u8,
}

impl BitmapMask {
    /// A mask whose content size matches the bitmap's pixel size.
    pub fn new(bitmap: GrayImage) -> Self {
        Self::from_paint(MaskPaint::Owned(bitmap))
    }

    pub fn shared(bitmap: Rc<GrayImage>) -> Self {
        Self::from_paint(MaskPaint::Shared(bitmap))
    }

    fn from_paint(paint: MaskPaint) -> Self {
        let (w, h) = paint.bitmap().dimensions();
        Self {
            paint,
            transform: LocalTransform::IDENTITY,
            content_width: w as f32,
            content_height: h as f32,
            threshold: 0,
        }
    }

    /// Override the content size, e.g. for masks sampled from a scaled texture.
    pub fn with_content_size(mut self, width: f32, height: f32) -> Self {
        self.content_width = width;
        self.content_height = height;
        self
    }

    /// Pixels whose luminance is strictly above this value count as inside.
    pub fn with_threshold(mut self, threshold: u8) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn paint(&self) -> &MaskPaint {
        &self.paint
    }

    pub fn bitmap(&self) -> &GrayImage {
        self.paint.bitmap()
    }

    pub fn transform(&self) -> &LocalTransform {
        &self.transform
    }

    pub(crate) fn transform_mut(&mut self) -> &mut LocalTransform {
        &mut self.transform
    }

    pub fn content_size(&self) -> (f32, f32) {
        (self.content_width, self.content_height)
    }

    pub fn local_matrix(&self) -> Matrix {
        self.transform.to_matrix((0.0, 0.0))
    }

    /// Bounds of the mask in the owner's pre-anchor local space.
    pub fn self_bounds(&self) -> Rect {
        self.local_matrix()
            .transform_rect(&Rect::centered(self.content_width, self.content_height))
    }

    /// Matrix taking a point in the owner's destination space to mask UV.
    ///
    /// `inverse(world * mask_local)`, then shifted by half the content size
    /// and scaled by its reciprocal. `None` if either is degenerate.
    pub fn uv_matrix(&self, world: &Matrix) -> Option<Matrix> {
        if self.content_width <= 0.0 || self.content_height <= 0.0 {
            return None;
        }
        let inverse = world.then(&self.local_matrix()).inverse()?;
        let to_uv = Matrix::scale_xy(1.0 / self.content_width, 1.0 / self.content_height)
            .then(&Matrix::translate(
                self.content_width * 0.5,
                self.content_height * 0.5,
            ));
        Some(to_uv.then(&inverse))
    }

    /// Per-pixel threshold test at normalized coordinates.
    pub fn hit_test(&self, u: f32, v: f32) -> bool {
        if !(0.0..=1.0).contains(&u) || !(0.0..=1.0).contains(&v) {
            return false;
        }
        let bitmap = self.bitmap();
        let (w, h) = bitmap.dimensions();
        if w == 0 || h == 0 {
            return false;
        }
        let px = ((u * w as f32) as u32).min(w - 1);
        let py = ((v * h as f32) as u32).min(h - 1);
        bitmap.get_pixel(px, py).0[0] > self.threshold
    }
}

/// Mask-transform uniform as uploaded to the GPU.
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct MaskUniform {
    /// Destination-to-UV matrix, column-major, padded to vec4 columns.
    pub columns: [[f32; 4]; 3],
}

impl MaskUniform {
    pub fn new(uv: &Matrix) -> Self {
        Self {
            columns: uv.to_columns(),
        }
    }

    pub fn as_bytes(&self) -> &[u8] {
        bytemuck::bytes_of(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Luma;

    fn square_mask() -> BitmapMask {
        BitmapMask::new(GrayImage::from_fn(100, 100, |x, y| {
            if (25..75).contains(&x) && (25..75).contains(&y) {
                Luma([255])
            } else {
                Luma([0])
            }
        }))
    }

    #[test]
    fn test_self_bounds_centered() {
        let mask = square_mask();
        assert_eq!(mask.self_bounds(), Rect::centered(100.0, 100.0));
    }

    #[test]
    fn test_uv_matrix_maps_corners() {
        let mask = square_mask();
        let uv = mask.uv_matrix(&Matrix::translate(50.0, 50.0)).unwrap();
        for ((x, y), (u, v)) in [((0.0, 0.0), (0.0, 0.0)), ((100.0, 100.0), (1.0, 1.0)), ((50.0, 50.0), (0.5, 0.5))] {
            let (pu, pv) = uv.transform_point(x, y);
            assert!((pu - u).abs() < 1e-4 && (pv - v).abs() < 1e-4);
        }
    }

    #[test]
    fn test_pixel_threshold() {
        let mask = square_mask();
        assert!(!mask.hit_test(0.1, 0.1));
        assert!(mask.hit_test(0.5, 0.5));
        assert!(!mask.hit_test(1.5, 0.5));
        assert!(!mask.clone().with_threshold(255).hit_test(0.5, 0.5));
    }

    #[test]
    fn test_shared_bitmap_with_scaled_content() {
        let bitmap = Rc::new(square_mask().bitmap().clone());
        let mask = BitmapMask::shared(bitmap.clone()).with_content_size(200.0, 200.0);
        match mask.paint() {
            MaskPaint::Shared(shared) => assert!(Rc::ptr_eq(shared, &bitmap)),
            MaskPaint::Owned(_) => panic!("expected a shared paint"),
        }
        assert_eq!(mask.self_bounds(), Rect::centered(200.0, 200.0));

        // The opaque center now spans 50..150 in content space.
        let uv = mask.uv_matrix(&Matrix::translate(100.0, 100.0)).unwrap();
        let (u, v) = uv.transform_point(60.0, 60.0);
        assert!(mask.hit_test(u, v));
        let (u, v) = uv.transform_point(40.0, 40.0);
        assert!(!mask.hit_test(u, v));
    }

    #[test]
    fn test_degenerate_world_has_no_uv() {
        let mask = square_mask();
        assert!(mask.uv_matrix(&Matrix::scale(0.0)).is_none());
    }

    #[test]
    fn test_uniform_layout() {
        let uniform = MaskUniform::new(&Matrix::IDENTITY);
        assert_eq!(uniform.as_bytes().len(), 48);
    }
}
