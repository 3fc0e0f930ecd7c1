//! Geometric properties addressable by name.
//!
//! The name table is built once per [`Scene`](crate::Scene) and owned by it.
//! The tree itself only knows the typed [`GeometricProperty`] enum.

use std::collections::HashMap;

use crate::error::SceneError;
use crate::transform::LocalTransform;
use crate::tree::{NodeId, SceneTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GeometricProperty {
    X,
    Y,
    XScale,
    YScale,
    Rotation,
    AnchorX,
    AnchorY,
    /// Alpha normalized to `[0, 1]`
    Alpha,
    MaskX,
    MaskY,
    MaskScaleX,
    MaskScaleY,
    MaskRotation,
}

impl GeometricProperty {
    pub const ALL: [GeometricProperty; 13] = [
        Self::X,
        Self::Y,
        Self::XScale,
        Self::YScale,
        Self::Rotation,
        Self::AnchorX,
        Self::AnchorY,
        Self::Alpha,
        Self::MaskX,
        Self::MaskY,
        Self::MaskScaleX,
        Self::MaskScaleY,
        Self::MaskRotation,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::X => "x",
            Self::Y => "y",
            Self::XScale => "xScale",
            Self::YScale => "yScale",
            Self::Rotation => "rotation",
            Self::AnchorX => "anchorX",
            Self::AnchorY => "anchorY",
            Self::Alpha => "alpha",
            Self::MaskX => "maskX",
            Self::MaskY => "maskY",
            Self::MaskScaleX => "maskScaleX",
            Self::MaskScaleY => "maskScaleY",
            Self::MaskRotation => "maskRotation",
        }
    }

    pub fn is_mask(self) -> bool {
        matches!(
            self,
            Self::MaskX | Self::MaskY | Self::MaskScaleX | Self::MaskScaleY | Self::MaskRotation
        )
    }
}

/// Name to property lookup.
#[derive(Debug, Clone)]
pub struct PropertyTable {
    by_name: HashMap<&'static str, GeometricProperty>,
}

impl PropertyTable {
    pub fn new() -> Self {
        let by_name = GeometricProperty::ALL
            .iter()
            .map(|&p| (p.name(), p))
            .collect();
        Self { by_name }
    }

    pub fn lookup(&self, name: &str) -> Option<GeometricProperty> {
        self.by_name.get(name).copied()
    }

    pub fn resolve(&self, name: &str) -> Result<GeometricProperty, SceneError> {
        self.lookup(name)
            .ok_or_else(|| SceneError::UnknownProperty(name.to_string()))
    }
}

impl Default for PropertyTable {
    fn default() -> Self {
        Self::new()
    }
}

fn transform_field(transform: &LocalTransform, property: GeometricProperty) -> f32 {
    match property {
        GeometricProperty::X | GeometricProperty::MaskX => transform.x,
        GeometricProperty::Y | GeometricProperty::MaskY => transform.y,
        GeometricProperty::XScale | GeometricProperty::MaskScaleX => transform.x_scale,
        GeometricProperty::YScale | GeometricProperty::MaskScaleY => transform.y_scale,
        _ => transform.rotation,
    }
}

fn set_transform_field(transform: &mut LocalTransform, property: GeometricProperty, value: f32) {
    match property {
        GeometricProperty::X | GeometricProperty::MaskX => transform.x = value,
        GeometricProperty::Y | GeometricProperty::MaskY => transform.y = value,
        GeometricProperty::XScale | GeometricProperty::MaskScaleX => transform.x_scale = value,
        GeometricProperty::YScale | GeometricProperty::MaskScaleY => transform.y_scale = value,
        _ => transform.rotation = value,
    }
}

impl SceneTree {
    pub fn geometric_property(
        &self,
        id: NodeId,
        property: GeometricProperty,
    ) -> Result<f32, SceneError> {
        let object = self.try_get(id)?;
        let value = match property {
            GeometricProperty::AnchorX => object.anchor.x(),
            GeometricProperty::AnchorY => object.anchor.y(),
            GeometricProperty::Alpha => object.alpha as f32 / 255.0,
            p if p.is_mask() => {
                let mask = object.mask.as_ref().ok_or(SceneError::NoMask(id))?;
                transform_field(mask.transform(), p)
            }
            p => transform_field(&object.transform, p),
        };
        Ok(value)
    }

    pub fn set_geometric_property(
        &mut self,
        id: NodeId,
        property: GeometricProperty,
        value: f32,
    ) -> Result<(), SceneError> {
        match property {
            GeometricProperty::AnchorX | GeometricProperty::AnchorY => {
                let mut anchor = self.try_get(id)?.anchor;
                if property == GeometricProperty::AnchorX {
                    anchor.set_x(value);
                } else {
                    anchor.set_y(value);
                }
                self.set_anchor(id, anchor)
            }
            GeometricProperty::Alpha => {
                let alpha = (value.clamp(0.0, 1.0) * 255.0).round() as u8;
                self.set_alpha(id, alpha)
            }
            p if p.is_mask() => self.modify_mask_transform(id, |t| set_transform_field(t, p, value)),
            p => self.modify_transform(id, |t| set_transform_field(t, p, value)),
        }
    }
}
