//! Transform propagation, bounds caching and culling.
//!
//! World matrices and stage bounds are cached per node behind dirty flags.
//! The per-frame [`SceneTree::update_transform`] pass pushes changes down
//! from the stage. Reads between passes ([`SceneTree::stage_bounds`],
//! [`SceneTree::world_matrix`]) pull validity instead: they walk the ancestor
//! chain and recompute any stale world matrix top-down before answering, so a
//! cached value is never derived from a stale ancestor.

use log::trace;

use crate::flags::{DirtyFlags, ObjectFlags};
use crate::geometry::Rect;
use crate::object::{GroupKind, NodeKind};
use crate::transform::Matrix;
use crate::tree::{NodeId, SceneTree};

/// Per-pass inputs and counters for [`SceneTree::update_transform`].
#[derive(Debug, Clone)]
pub struct UpdateContext {
    /// Default culling rectangle
    pub screen_bounds: Rect,
    /// Nodes that crossed the culling edge during this pass
    pub offscreen_transitions: u32,
}

impl UpdateContext {
    pub fn new(screen_bounds: Rect) -> Self {
        Self {
            screen_bounds,
            offscreen_transitions: 0,
        }
    }
}

impl SceneTree {
    /// Bounds of `id` in its own space.
    ///
    /// Leaves report their shape's bounds, containers their fixed extent.
    /// Other groups report the union of each child's self bounds mapped
    /// through that child's local matrix.
    pub fn self_bounds(&self, id: NodeId) -> Rect {
        let Some(object) = self.get(id) else {
            return Rect::EMPTY;
        };
        match &object.kind {
            NodeKind::Shape(shape) => shape.self_bounds(),
            NodeKind::Group(group) => match group.kind {
                GroupKind::Container { width, height } => Rect::centered(width, height),
                GroupKind::Plain | GroupKind::Stage(_) => {
                    group.children.iter().fold(Rect::EMPTY, |acc, &child| {
                        let bounds = self
                            .local_matrix(child)
                            .transform_rect(&self.self_bounds(child));
                        acc.union(&bounds)
                    })
                }
            },
        }
    }

    /// Local matrix of `id`, including the anchor offset.
    pub fn local_matrix(&self, id: NodeId) -> Matrix {
        match self.get(id) {
            Some(object) if object.dirty.contains(DirtyFlags::LOCAL_TRANSFORM) => {
                self.compose_local(id)
            }
            Some(object) => object.local_matrix,
            None => Matrix::IDENTITY,
        }
    }

    fn compose_local(&self, id: NodeId) -> Matrix {
        let Some(object) = self.get(id) else {
            return Matrix::IDENTITY;
        };
        let anchored = match &object.kind {
            NodeKind::Shape(_) => true,
            NodeKind::Group(group) => {
                matches!(group.kind, GroupKind::Container { .. })
                    || object.flags.contains(ObjectFlags::ANCHOR_CHILDREN)
            }
        };
        let offset = if anchored {
            object.anchor.offset(&self.self_bounds(id))
        } else {
            (0.0, 0.0)
        };
        object.transform.to_matrix(offset)
    }

    /// Compose `parent_to_dst * local` into the world matrix of `id`.
    fn recompose_world(&mut self, id: NodeId, parent_to_dst: &Matrix) {
        let local = self.local_matrix(id);
        let Some(object) = self.get_mut(id) else {
            return;
        };
        object.local_matrix = local;
        let mut world = parent_to_dst.then(&local);
        if let NodeKind::Shape(shape) = &object.kind {
            shape.adjust_transform(&mut world);
        }
        object.world_matrix = world;
        object
            .dirty
            .remove(DirtyFlags::TRANSFORM | DirtyFlags::LOCAL_TRANSFORM);
        object.mark(DirtyFlags::GEOMETRY | DirtyFlags::MASK | DirtyFlags::STAGE_BOUNDS);
    }

    fn mark_children(&mut self, id: NodeId, flags: DirtyFlags) {
        for i in 0..self.children(id).len() {
            let child = self.children(id)[i];
            if let Some(object) = self.get_mut(child) {
                object.mark(flags);
            }
        }
    }

    /// Recompute the world matrix of `id` for this frame.
    ///
    /// No-op returning `false` for nodes that should not hit test, or whose
    /// TRANSFORM flag is clean. Returns `true` if the world matrix was
    /// recomputed; groups then force every child to recompute as well.
    pub fn update_transform(
        &mut self,
        id: NodeId,
        parent_to_dst: &Matrix,
        ctx: &mut UpdateContext,
    ) -> bool {
        let changed = self.update_object_transform(id, parent_to_dst);
        let is_active_group = self
            .get(id)
            .is_some_and(|o| o.is_group() && o.should_hit_test());
        if is_active_group {
            self.update_group_children(id, changed, ctx);
        }
        changed
    }

    fn update_object_transform(&mut self, id: NodeId, parent_to_dst: &Matrix) -> bool {
        let Some(object) = self.get_mut(id) else {
            return false;
        };
        if object.parent.is_none() {
            object.cumulative_alpha = object.alpha;
            if object.root_to_dst != *parent_to_dst {
                object.root_to_dst = *parent_to_dst;
                object.dirty.insert(DirtyFlags::TRANSFORM);
            }
        }
        if !object.should_hit_test() || !object.dirty.contains(DirtyFlags::TRANSFORM) {
            return false;
        }
        self.recompose_world(id, parent_to_dst);
        true
    }

    fn update_group_children(&mut self, id: NodeId, changed: bool, ctx: &mut UpdateContext) {
        let parent = self.parent(id);
        let parent_stage = parent
            .and_then(|p| self.get(p))
            .and_then(|p| p.group_data())
            .and_then(|g| g.stage);
        let Some(object) = self.get_mut(id) else {
            return;
        };
        let world = object.world_matrix;
        let alpha = object.cumulative_alpha;
        let Some(group) = object.group_mut() else {
            return;
        };
        if !matches!(group.kind, GroupKind::Stage(_)) {
            group.stage = parent_stage;
        }
        let stage = group.stage;

        let cull_rect = stage
            .and_then(|s| self.get(s))
            .and_then(|s| s.stage_data())
            .and_then(|data| data.snapshot_bounds)
            .unwrap_or(ctx.screen_bounds);

        // Listeners never run during this pass, so the child list is stable.
        for i in 0..self.children(id).len() {
            let child = self.children(id)[i];
            if let Some(c) = self.get_mut(child) {
                let cumulative = (c.alpha as u16 * alpha as u16 / 255) as u8;
                if c.cumulative_alpha != cumulative {
                    c.cumulative_alpha = cumulative;
                    c.dirty.insert(DirtyFlags::COLOR);
                }
                if changed {
                    c.mark(
                        DirtyFlags::GEOMETRY
                            | DirtyFlags::LOCAL_TRANSFORM
                            | DirtyFlags::TRANSFORM
                            | DirtyFlags::STAGE_BOUNDS,
                    );
                }
            }
            self.update_transform(child, &world, ctx);
            self.update_culling(child, &cull_rect, ctx);
        }
    }

    fn update_culling(&mut self, child: NodeId, cull_rect: &Rect, ctx: &mut UpdateContext) {
        let cullable = self
            .get(child)
            .is_some_and(|c| c.should_hit_test() && c.can_cull());
        if !cullable {
            return;
        }
        let offscreen = !self.stage_bounds(child).intersects(cull_rect);
        let Some(c) = self.get_mut(child) else {
            return;
        };
        if c.flags.contains(ObjectFlags::OFFSCREEN) == offscreen {
            return;
        }
        c.flags.set(ObjectFlags::OFFSCREEN, offscreen);
        ctx.offscreen_transitions += 1;
        if let NodeKind::Shape(shape) = &mut c.kind {
            if offscreen {
                shape.did_move_offscreen();
            } else {
                shape.will_move_onscreen();
            }
        }
        trace!(
            "{:?} moved {}",
            child,
            if offscreen { "offscreen" } else { "onscreen" }
        );
    }

    /// Make the world matrix of `id` current by validating its ancestor chain
    /// from the root down. Returns true if the matrix of `id` was recomputed.
    pub(crate) fn validate_world(&mut self, id: NodeId) -> bool {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node) = current {
            chain.push(node);
            current = self.parent(node);
        }

        let mut parent_world: Option<Matrix> = None;
        let mut recomputed = false;
        for &node in chain.iter().rev() {
            let Some(object) = self.get(node) else {
                return false;
            };
            let base = parent_world.unwrap_or(object.root_to_dst);
            recomputed = object.dirty.contains(DirtyFlags::TRANSFORM);
            if recomputed {
                self.recompose_world(node, &base);
                self.mark_children(node, DirtyFlags::TRANSFORM | DirtyFlags::STAGE_BOUNDS);
            }
            parent_world = self.get(node).map(|o| o.world_matrix);
        }

        debug_assert!(chain
            .iter()
            .all(|&n| self.get(n).is_some_and(|o| !o.dirty.contains(DirtyFlags::TRANSFORM))));
        recomputed
    }

    /// Current world (source-to-destination) matrix of `id`.
    pub fn world_matrix(&mut self, id: NodeId) -> Option<Matrix> {
        self.validate_world(id);
        self.get(id).map(|o| o.world_matrix)
    }

    /// Axis-aligned bounds of `id` in stage space.
    ///
    /// `world * (self_bounds ∩ mask_bounds)`, the mask term applying only
    /// when the node is hit-test masked and owns a mask. Cached until the
    /// node's bounds are invalidated.
    pub fn stage_bounds(&mut self, id: NodeId) -> Rect {
        if !self.contains(id) {
            return Rect::EMPTY;
        }
        self.validate_world(id);

        let Some(object) = self.get(id) else {
            return Rect::EMPTY;
        };
        if !object.dirty.contains(DirtyFlags::STAGE_BOUNDS) {
            return object.stage_bounds;
        }

        let mut bounds = self.self_bounds(id);
        if object.flags.contains(ObjectFlags::HIT_TEST_MASKED) {
            if let Some(mask) = &object.mask {
                bounds = bounds.intersection(&mask.self_bounds());
            }
        }
        let bounds = object.world_matrix.transform_rect(&bounds);

        if let Some(object) = self.get_mut(id) {
            object.stage_bounds = bounds;
            object.dirty.remove(DirtyFlags::STAGE_BOUNDS);
        }
        bounds
    }
}
