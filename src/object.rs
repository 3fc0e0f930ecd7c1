use std::collections::HashMap;
use std::fmt;

use crate::anchor::Anchor;
use crate::event::InputId;
use crate::flags::{DirtyFlags, ObjectFlags};
use crate::geometry::Rect;
use crate::mask::{BitmapMask, MaskUniform};
use crate::resource::Proxy;
use crate::shape::Shape;
use crate::transform::{LocalTransform, Matrix};
use crate::tree::NodeId;

/// Per-stage state: focus bindings and the culling override.
#[derive(Debug, Default)]
pub struct StageData {
    pub(crate) focus: HashMap<InputId, NodeId>,
    /// Replaces the screen rect as the culling rectangle during offscreen renders.
    pub(crate) snapshot_bounds: Option<Rect>,
}

/// Composite node kinds. Each answers `can_cull` its own way.
#[derive(Debug)]
pub enum GroupKind {
    /// Ordinary group. Never culled as a whole.
    Plain,
    /// Group with a fixed extent centered on its origin.
    Container { width: f32, height: f32 },
    /// Root of a display tree.
    Stage(StageData),
}

#[derive(Debug)]
pub struct GroupData {
    pub(crate) kind: GroupKind,
    /// Paint order: index 0 is drawn first and hit last.
    pub(crate) children: Vec<NodeId>,
    /// Stage this group currently belongs to.
    pub(crate) stage: Option<NodeId>,
}

impl GroupData {
    fn new(kind: GroupKind) -> Self {
        Self {
            kind,
            children: Vec::new(),
            stage: None,
        }
    }
}

pub enum NodeKind {
    Shape(Box<dyn Shape>),
    Group(GroupData),
}

impl fmt::Debug for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeKind::Shape(shape) => f
                .debug_tuple("Shape")
                .field(&shape.self_bounds())
                .finish(),
            NodeKind::Group(group) => f.debug_tuple("Group").field(group).finish(),
        }
    }
}

/// One node of the scene graph.
///
/// Construct with [`DisplayObject::shape`], [`DisplayObject::group`],
/// [`DisplayObject::container`] or [`DisplayObject::stage`], then hand it to
/// [`SceneTree::register`](crate::SceneTree::register). After registration
/// every change goes through the tree so that invalidation reaches ancestors.
pub struct DisplayObject {
    pub(crate) kind: NodeKind,
    pub(crate) parent: Option<NodeId>,
    pub(crate) transform: LocalTransform,
    pub(crate) anchor: Anchor,
    pub(crate) local_matrix: Matrix,
    pub(crate) world_matrix: Matrix,
    /// Destination matrix last used for a parentless node.
    pub(crate) root_to_dst: Matrix,
    pub(crate) stage_bounds: Rect,
    pub(crate) alpha: u8,
    pub(crate) cumulative_alpha: u8,
    pub(crate) dirty: DirtyFlags,
    pub(crate) flags: ObjectFlags,
    pub(crate) mask: Option<BitmapMask>,
    pub(crate) mask_uniform: Option<MaskUniform>,
    pub(crate) proxy: Option<Box<dyn Proxy>>,
}

impl DisplayObject {
    fn new(kind: NodeKind) -> Self {
        Self {
            kind,
            parent: None,
            transform: LocalTransform::IDENTITY,
            anchor: Anchor::CENTER,
            local_matrix: Matrix::IDENTITY,
            world_matrix: Matrix::IDENTITY,
            root_to_dst: Matrix::IDENTITY,
            stage_bounds: Rect::EMPTY,
            alpha: 255,
            cumulative_alpha: 255,
            dirty: DirtyFlags::initial(),
            flags: ObjectFlags::default(),
            mask: None,
            mask_uniform: None,
            proxy: None,
        }
    }

    pub fn shape(shape: impl Shape + 'static) -> Self {
        Self::new(NodeKind::Shape(Box::new(shape)))
    }

    pub fn group() -> Self {
        Self::new(NodeKind::Group(GroupData::new(GroupKind::Plain)))
    }

    pub fn container(width: f32, height: f32) -> Self {
        Self::new(NodeKind::Group(GroupData::new(GroupKind::Container {
            width,
            height,
        })))
    }

    /// A locked root group with its own focus table.
    pub fn stage() -> Self {
        let mut stage = Self::new(NodeKind::Group(GroupData::new(GroupKind::Stage(
            StageData::default(),
        ))));
        stage.flags.insert(ObjectFlags::LOCKED);
        stage
    }

    pub fn at(mut self, x: f32, y: f32) -> Self {
        self.transform.x = x;
        self.transform.y = y;
        self
    }

    pub fn with_anchor(mut self, anchor: Anchor) -> Self {
        self.anchor = anchor;
        self
    }

    pub fn with_mask(mut self, mask: BitmapMask) -> Self {
        self.mask = Some(mask);
        self.dirty.insert(DirtyFlags::MASK);
        self
    }

    pub fn kind(&self) -> &NodeKind {
        &self.kind
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn transform(&self) -> &LocalTransform {
        &self.transform
    }

    pub fn anchor(&self) -> Anchor {
        self.anchor
    }

    pub fn alpha(&self) -> u8 {
        self.alpha
    }

    pub fn cumulative_alpha(&self) -> u8 {
        self.cumulative_alpha
    }

    pub fn dirty(&self) -> DirtyFlags {
        self.dirty
    }

    pub fn flags(&self) -> ObjectFlags {
        self.flags
    }

    pub fn mask(&self) -> Option<&BitmapMask> {
        self.mask.as_ref()
    }

    pub fn mask_uniform(&self) -> Option<&MaskUniform> {
        self.mask_uniform.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.flags.contains(ObjectFlags::VISIBLE)
    }

    pub fn is_offscreen(&self) -> bool {
        self.flags.contains(ObjectFlags::OFFSCREEN)
    }

    pub fn is_group(&self) -> bool {
        matches!(self.kind, NodeKind::Group(_))
    }

    pub fn is_stage(&self) -> bool {
        matches!(
            self.kind,
            NodeKind::Group(GroupData {
                kind: GroupKind::Stage(_),
                ..
            })
        )
    }

    /// Invisible hit-testable nodes and visible nodes with non-zero alpha
    /// take part in transform updates and hit testing.
    pub fn should_hit_test(&self) -> bool {
        self.flags.contains(ObjectFlags::HIT_TEST_INVISIBLE)
            || (self.flags.contains(ObjectFlags::VISIBLE) && self.alpha > 0)
    }

    pub fn can_cull(&self) -> bool {
        match &self.kind {
            NodeKind::Shape(shape) => shape.can_cull(),
            NodeKind::Group(group) => match group.kind {
                GroupKind::Plain | GroupKind::Stage(_) => false,
                GroupKind::Container { .. } => true,
            },
        }
    }

    pub fn can_hit_test(&self) -> bool {
        match &self.kind {
            NodeKind::Shape(shape) => shape.can_hit_test(),
            NodeKind::Group(_) => true,
        }
    }

    pub(crate) fn group_data(&self) -> Option<&GroupData> {
        match &self.kind {
            NodeKind::Group(group) => Some(group),
            NodeKind::Shape(_) => None,
        }
    }

    pub(crate) fn group_mut(&mut self) -> Option<&mut GroupData> {
        match &mut self.kind {
            NodeKind::Group(group) => Some(group),
            NodeKind::Shape(_) => None,
        }
    }

    pub(crate) fn stage_data(&self) -> Option<&StageData> {
        match self.group_data().map(|g| &g.kind) {
            Some(GroupKind::Stage(data)) => Some(data),
            _ => None,
        }
    }

    pub(crate) fn stage_data_mut(&mut self) -> Option<&mut StageData> {
        match self.group_mut().map(|g| &mut g.kind) {
            Some(GroupKind::Stage(data)) => Some(data),
            _ => None,
        }
    }

    /// Set `flags` directly, without walking ancestors.
    pub(crate) fn mark(&mut self, mut flags: DirtyFlags) {
        if self.mask.is_none() {
            flags.remove(DirtyFlags::MASK);
        }
        self.dirty.insert(flags);
    }
}

impl fmt::Debug for DisplayObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DisplayObject")
            .field("kind", &self.kind)
            .field("parent", &self.parent)
            .field("transform", &self.transform)
            .field("alpha", &self.alpha)
            .field("dirty", &self.dirty)
            .field("flags", &self.flags)
            .finish_non_exhaustive()
    }
}
