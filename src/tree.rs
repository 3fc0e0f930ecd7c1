//! Arena-based node storage for the scene graph.
//!
//! The SceneTree owns every [`DisplayObject`] in a sparse-set arena addressed
//! by generational [`NodeId`]s. Parents are stored as ids and children as
//! ordered id lists, so removal and re-insertion never leave dangling links:
//! a stale id simply stops resolving.
//!
//! ## Key Features
//!
//! - **Generational Indices**: NodeId contains index + generation, so focus
//!   bindings and other weak references to a destroyed node fail explicitly
//!   instead of reaching whatever reused the slot.
//!
//! - **Dense Storage**: Objects stored contiguously; swap-remove keeps the
//!   dense array free of holes.
//!
//! - **Invalidation**: Every property change goes through [`SceneTree::invalidate`],
//!   which records dirty flags on the node and marks the stage bounds of every
//!   ancestor stale.

use log::{debug, trace, warn};

use crate::anchor::Anchor;
use crate::error::SceneError;
use crate::event::InputId;
use crate::flags::{DirtyFlags, ObjectFlags};
use crate::mask::{BitmapMask, MaskUniform};
use crate::object::{DisplayObject, GroupKind, NodeKind};
use crate::resource::Proxy;
use crate::shape::Shape;
use crate::transform::LocalTransform;

/// Unique identifier for a node in the tree.
///
/// Uses a generational index design:
/// - `index`: Position in the sparse array (reusable after removal)
/// - `generation`: Version counter that increments when a slot is reused
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug, PartialOrd, Ord)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    fn new(index: u32, generation: u32) -> Self {
        Self { index, generation }
    }
}

struct SparseEntry {
    dense_index: usize,
    generation: u32,
}

struct Slot {
    object: DisplayObject,
    /// Back-pointer to sparse array index (for swap-remove fixup)
    sparse_index: u32,
}

pub struct SceneTree {
    dense: Vec<Slot>,
    sparse: Vec<Option<SparseEntry>>,
    /// Generation last used by each freed sparse index
    free_indices: Vec<(u32, u32)>,
    /// Every registered stage, for focus cleanup
    stages: Vec<NodeId>,
    /// Set by any invalidation; cleared by the scene after a frame.
    content_dirty: bool,
}

impl SceneTree {
    pub fn new() -> Self {
        Self {
            dense: Vec::new(),
            sparse: Vec::new(),
            free_indices: Vec::new(),
            stages: Vec::new(),
            content_dirty: true,
        }
    }

    /// Store a detached object and return its id.
    pub fn register(&mut self, object: DisplayObject) -> NodeId {
        let (sparse_index, generation) = match self.free_indices.pop() {
            Some((idx, old_gen)) => (idx, old_gen.wrapping_add(1)),
            None => {
                let idx = self.sparse.len() as u32;
                self.sparse.push(None);
                (idx, 0)
            }
        };

        let id = NodeId::new(sparse_index, generation);
        let is_stage = object.is_stage();

        self.sparse[sparse_index as usize] = Some(SparseEntry {
            dense_index: self.dense.len(),
            generation,
        });
        self.dense.push(Slot {
            object,
            sparse_index,
        });

        if is_stage {
            if let Some(group) = self.get_mut(id).and_then(|o| o.group_mut()) {
                group.stage = Some(id);
            }
            self.stages.push(id);
        }
        self.content_dirty = true;
        id
    }

    /// Remove one node from the arena, unlinking it from its parent.
    /// Children are left pointing at a dead parent; use [`destroy`](Self::destroy).
    fn unregister(&mut self, id: NodeId) -> Option<DisplayObject> {
        let dense_index = self.get_dense_index(id)?;

        if let Some(parent) = self.dense[dense_index].object.parent {
            if let Some(group) = self.get_mut(parent).and_then(|p| p.group_mut()) {
                group.children.retain(|&c| c != id);
            }
        }

        let last_dense_index = self.dense.len() - 1;
        let removed = self.dense.swap_remove(dense_index);

        if dense_index != last_dense_index {
            let moved_sparse_idx = self.dense[dense_index].sparse_index;
            if let Some(entry) = self.sparse[moved_sparse_idx as usize].as_mut() {
                entry.dense_index = dense_index;
            }
        }

        self.sparse[id.index as usize] = None;
        self.free_indices.push((id.index, id.generation));
        self.stages.retain(|&s| s != id);
        Some(removed.object)
    }

    /// Destroy `id` and its whole subtree, children first.
    ///
    /// Focus bindings pointing into the subtree are cleared. The removed
    /// objects are returned so the caller can hand their native resources
    /// to a release queue.
    pub fn destroy(&mut self, id: NodeId) -> Vec<(NodeId, DisplayObject)> {
        let order = self.subtree_post_order(id);
        let mut removed = Vec::with_capacity(order.len());
        for node in order {
            self.clear_focus_for(node);
            if let Some(object) = self.unregister(node) {
                removed.push((node, object));
            }
        }
        if !removed.is_empty() {
            self.content_dirty = true;
            trace!("destroyed {} node(s) under {:?}", removed.len(), id);
        }
        removed
    }

    /// `id` and all its descendants, each node after its children.
    pub fn subtree_post_order(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        // (node, children visited)
        let mut stack = vec![(id, false)];
        while let Some((node, expanded)) = stack.pop() {
            if expanded {
                out.push(node);
                continue;
            }
            stack.push((node, true));
            for &child in self.children(node).iter().rev() {
                stack.push((child, false));
            }
        }
        out
    }

    fn get_dense_index(&self, id: NodeId) -> Option<usize> {
        self.sparse
            .get(id.index as usize)
            .and_then(|e| e.as_ref())
            .filter(|e| e.generation == id.generation)
            .map(|e| e.dense_index)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.get_dense_index(id).is_some()
    }

    pub fn len(&self) -> usize {
        self.dense.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dense.is_empty()
    }

    pub fn get(&self, id: NodeId) -> Option<&DisplayObject> {
        self.get_dense_index(id).map(|idx| &self.dense[idx].object)
    }

    pub(crate) fn get_mut(&mut self, id: NodeId) -> Option<&mut DisplayObject> {
        let idx = self.get_dense_index(id)?;
        Some(&mut self.dense[idx].object)
    }

    pub(crate) fn try_get(&self, id: NodeId) -> Result<&DisplayObject, SceneError> {
        self.get(id).ok_or(SceneError::StaleNode(id))
    }

    pub(crate) fn try_get_mut(&mut self, id: NodeId) -> Result<&mut DisplayObject, SceneError> {
        self.get_mut(id).ok_or(SceneError::StaleNode(id))
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.get(id).and_then(|o| o.parent)
    }

    /// Children in paint order. Empty for leaves and stale ids.
    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.get(id)
            .and_then(|o| o.group_data())
            .map(|g| g.children.as_slice())
            .unwrap_or(&[])
    }

    pub fn index_of(&self, child: NodeId) -> Option<usize> {
        let parent = self.parent(child)?;
        self.children(parent).iter().position(|&c| c == child)
    }

    /// True if `ancestor` is a strict ancestor of `id`.
    pub fn is_ancestor(&self, ancestor: NodeId, id: NodeId) -> bool {
        let mut current = self.parent(id);
        while let Some(node) = current {
            if node == ancestor {
                return true;
            }
            current = self.parent(node);
        }
        false
    }

    /// Root of the tree `id` lives in, if that root is a stage.
    pub fn stage_of(&self, id: NodeId) -> Option<NodeId> {
        let mut current = id;
        while let Some(parent) = self.parent(current) {
            current = parent;
        }
        self.get(current)
            .filter(|o| o.is_stage())
            .map(|_| current)
    }

    pub(crate) fn is_content_dirty(&self) -> bool {
        self.content_dirty
    }

    pub(crate) fn clear_content_dirty(&mut self) {
        self.content_dirty = false;
    }

    // -- invalidation --------------------------------------------------------

    /// Record that cached values of `id` are stale.
    ///
    /// The MASK bit is dropped for nodes without a mask. GEOMETRY also forces
    /// the local matrix to be recomposed, since the anchor offset depends on
    /// the self bounds. Any bounds-affecting flag marks the stage bounds of
    /// every ancestor dirty.
    pub fn invalidate(&mut self, id: NodeId, flags: DirtyFlags) {
        let Some(object) = self.get_mut(id) else {
            debug!("invalidate on stale node {:?}", id);
            return;
        };

        let mut flags = flags;
        if flags.contains(DirtyFlags::GEOMETRY) {
            flags |= DirtyFlags::LOCAL_TRANSFORM | DirtyFlags::TRANSFORM;
        }
        if flags.affects_bounds() {
            flags |= DirtyFlags::STAGE_BOUNDS;
        }
        object.mark(flags);
        let parent = object.parent;
        self.content_dirty = true;

        if flags.affects_bounds() {
            self.mark_ancestor_bounds(parent);
        }
    }

    fn mark_ancestor_bounds(&mut self, from: Option<NodeId>) {
        let mut current = from;
        while let Some(node) = current {
            let Some(object) = self.get_mut(node) else {
                return;
            };
            object.dirty.insert(DirtyFlags::STAGE_BOUNDS);
            current = object.parent;
        }
    }

    // -- composition ---------------------------------------------------------

    /// Insert `child` into `group` at `index` (clamped), detaching it from any
    /// previous parent first.
    ///
    /// With `reset_transform` the child's local transform is reset to the
    /// identity, for moves where a transform relative to the old parent is
    /// meaningless.
    pub fn insert(
        &mut self,
        group: NodeId,
        index: usize,
        child: NodeId,
        reset_transform: bool,
    ) -> Result<(), SceneError> {
        if !self.try_get(group)?.is_group() {
            warn!("cannot insert {:?} into non-group {:?}", child, group);
            return Err(SceneError::NotAGroup(group));
        }
        let child_obj = self.try_get(child)?;
        if child_obj.flags.contains(ObjectFlags::LOCKED) {
            return Err(SceneError::Locked(child));
        }
        if child == group || self.is_ancestor(child, group) {
            return Err(SceneError::WouldCreateCycle {
                parent: group,
                child,
            });
        }

        let old_parent = child_obj.parent;
        let parent_changed = old_parent != Some(group);
        if let Some(old) = old_parent {
            self.detach(old, child);
        }

        let Some(children) = self.get_mut(group).and_then(|g| g.group_mut()) else {
            return Err(SceneError::NotAGroup(group));
        };
        let index = index.min(children.children.len());
        children.children.insert(index, child);

        let child_obj = self.try_get_mut(child)?;
        child_obj.parent = Some(group);
        if reset_transform {
            child_obj.transform = LocalTransform::IDENTITY;
        }

        self.did_insert(group, child, parent_changed || reset_transform);
        Ok(())
    }

    /// Insert `child` on top of `group`'s children.
    pub fn append(&mut self, group: NodeId, child: NodeId) -> Result<(), SceneError> {
        let len = self.children(group).len();
        self.insert(group, len, child, false)
    }

    fn did_insert(&mut self, group: NodeId, child: NodeId, moved: bool) {
        if moved {
            let stage = self.stage_of(group);
            self.set_stage_recursive(child, stage);
            self.invalidate(
                child,
                DirtyFlags::GEOMETRY
                    | DirtyFlags::TRANSFORM
                    | DirtyFlags::STAGE_BOUNDS
                    | DirtyFlags::PAINT,
            );
            self.invalidate_anchored_group(group);
        } else {
            self.invalidate(child, DirtyFlags::PAINT);
        }
    }

    /// Detach and return the child at `index` without destroying it.
    pub fn release(&mut self, group: NodeId, index: usize) -> Option<NodeId> {
        let child = *self.children(group).get(index)?;
        self.detach(group, child);
        if let Some(object) = self.get_mut(child) {
            object.parent = None;
            object.mark(DirtyFlags::TRANSFORM | DirtyFlags::STAGE_BOUNDS);
        }
        self.set_stage_recursive(child, None);
        Some(child)
    }

    /// Release `child` from whatever group holds it.
    pub fn remove_from_parent(&mut self, child: NodeId) -> Result<Option<NodeId>, SceneError> {
        if self.try_get(child)?.flags.contains(ObjectFlags::LOCKED) {
            return Err(SceneError::Locked(child));
        }
        let (Some(parent), Some(index)) = (self.parent(child), self.index_of(child)) else {
            return Ok(None);
        };
        Ok(self.release(parent, index))
    }

    fn detach(&mut self, group: NodeId, child: NodeId) {
        if let Some(g) = self.get_mut(group).and_then(|o| o.group_mut()) {
            g.children.retain(|&c| c != child);
        }
        self.invalidate(group, DirtyFlags::STAGE_BOUNDS | DirtyFlags::PAINT);
        self.invalidate_anchored_group(group);
    }

    /// Groups anchored on their children move when the children change.
    fn invalidate_anchored_group(&mut self, group: NodeId) {
        let anchored = self
            .get(group)
            .is_some_and(|g| g.flags.contains(ObjectFlags::ANCHOR_CHILDREN));
        if anchored {
            self.invalidate(group, DirtyFlags::GEOMETRY);
        }
    }

    fn set_stage_recursive(&mut self, id: NodeId, stage: Option<NodeId>) {
        let mut stack = vec![id];
        while let Some(node) = stack.pop() {
            let Some(group) = self.get_mut(node).and_then(|o| o.group_mut()) else {
                continue;
            };
            if !matches!(group.kind, GroupKind::Stage(_)) {
                group.stage = stage;
            }
            stack.extend_from_slice(&group.children);
        }
    }

    // -- properties ----------------------------------------------------------

    /// Edit the local transform properties of `id`.
    pub fn modify_transform(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut LocalTransform),
    ) -> Result<(), SceneError> {
        f(&mut self.try_get_mut(id)?.transform);
        self.invalidate(id, DirtyFlags::LOCAL_TRANSFORM | DirtyFlags::TRANSFORM);
        Ok(())
    }

    pub fn set_position(&mut self, id: NodeId, x: f32, y: f32) -> Result<(), SceneError> {
        self.modify_transform(id, |t| {
            t.x = x;
            t.y = y;
        })
    }

    pub fn set_rotation(&mut self, id: NodeId, degrees: f32) -> Result<(), SceneError> {
        self.modify_transform(id, |t| t.rotation = degrees)
    }

    pub fn set_scale(&mut self, id: NodeId, x_scale: f32, y_scale: f32) -> Result<(), SceneError> {
        self.modify_transform(id, |t| {
            t.x_scale = x_scale;
            t.y_scale = y_scale;
        })
    }

    pub fn set_anchor(&mut self, id: NodeId, anchor: Anchor) -> Result<(), SceneError> {
        self.try_get_mut(id)?.anchor = anchor;
        self.invalidate(id, DirtyFlags::LOCAL_TRANSFORM | DirtyFlags::TRANSFORM);
        Ok(())
    }

    pub fn set_alpha(&mut self, id: NodeId, alpha: u8) -> Result<(), SceneError> {
        let object = self.try_get_mut(id)?;
        if object.alpha != alpha {
            object.alpha = alpha;
            self.invalidate(id, DirtyFlags::COLOR);
        }
        Ok(())
    }

    pub fn set_visible(&mut self, id: NodeId, visible: bool) -> Result<(), SceneError> {
        self.set_flag(id, ObjectFlags::VISIBLE, visible)?;
        self.invalidate(id, DirtyFlags::PAINT);
        Ok(())
    }

    /// Let the node receive hits even while invisible.
    pub fn set_hit_test_invisible(&mut self, id: NodeId, enabled: bool) -> Result<(), SceneError> {
        self.set_flag(id, ObjectFlags::HIT_TEST_INVISIBLE, enabled)
    }

    pub fn set_hit_test_masked(&mut self, id: NodeId, enabled: bool) -> Result<(), SceneError> {
        self.set_flag(id, ObjectFlags::HIT_TEST_MASKED, enabled)?;
        self.invalidate(id, DirtyFlags::STAGE_BOUNDS);
        Ok(())
    }

    pub fn set_anchor_children(&mut self, id: NodeId, enabled: bool) -> Result<(), SceneError> {
        if !self.try_get(id)?.is_group() {
            return Err(SceneError::NotAGroup(id));
        }
        self.set_flag(id, ObjectFlags::ANCHOR_CHILDREN, enabled)?;
        self.invalidate(id, DirtyFlags::GEOMETRY);
        Ok(())
    }

    pub fn set_locked(&mut self, id: NodeId, locked: bool) -> Result<(), SceneError> {
        self.set_flag(id, ObjectFlags::LOCKED, locked)
    }

    fn set_flag(&mut self, id: NodeId, flag: ObjectFlags, value: bool) -> Result<(), SceneError> {
        self.try_get_mut(id)?.flags.set(flag, value);
        Ok(())
    }

    /// Swap the paint content of a leaf.
    pub fn replace_shape(&mut self, id: NodeId, shape: Box<dyn Shape>) -> Result<(), SceneError> {
        let object = self.try_get_mut(id)?;
        match &mut object.kind {
            NodeKind::Shape(current) => *current = shape,
            NodeKind::Group(_) => return Err(SceneError::NotAShape(id)),
        }
        self.invalidate(id, DirtyFlags::GEOMETRY | DirtyFlags::PAINT);
        Ok(())
    }

    pub fn set_container_size(
        &mut self,
        id: NodeId,
        new_width: f32,
        new_height: f32,
    ) -> Result<(), SceneError> {
        let group = self
            .try_get_mut(id)?
            .group_mut()
            .ok_or(SceneError::NotAContainer(id))?;
        match &mut group.kind {
            GroupKind::Container { width, height } => {
                *width = new_width;
                *height = new_height;
            }
            _ => return Err(SceneError::NotAContainer(id)),
        }
        self.invalidate(id, DirtyFlags::GEOMETRY);
        Ok(())
    }

    // -- masks ---------------------------------------------------------------

    /// Attach, replace or (with `None`) remove the mask of `id`.
    ///
    /// Attaching allocates the mask-transform uniform; it is filled on the
    /// next prepare pass.
    pub fn set_mask(&mut self, id: NodeId, mask: Option<BitmapMask>) -> Result<(), SceneError> {
        let object = self.try_get_mut(id)?;
        object.mask_uniform = mask.as_ref().map(|_| bytemuck::Zeroable::zeroed());
        object.mask = mask;
        self.invalidate(
            id,
            DirtyFlags::MASK | DirtyFlags::STAGE_BOUNDS | DirtyFlags::PAINT,
        );
        Ok(())
    }

    pub fn modify_mask_transform(
        &mut self,
        id: NodeId,
        f: impl FnOnce(&mut LocalTransform),
    ) -> Result<(), SceneError> {
        let mask = self
            .try_get_mut(id)?
            .mask
            .as_mut()
            .ok_or(SceneError::NoMask(id))?;
        f(mask.transform_mut());
        self.invalidate(id, DirtyFlags::MASK | DirtyFlags::STAGE_BOUNDS);
        Ok(())
    }

    pub(crate) fn set_mask_uniform(&mut self, id: NodeId, uniform: Option<MaskUniform>) {
        match self.get_mut(id) {
            Some(object) if object.mask.is_some() => object.mask_uniform = uniform,
            _ => debug!("mask uniform update on {:?} without a mask", id),
        }
    }

    // -- script proxies ------------------------------------------------------

    /// Link `proxy` to `id`, returning any proxy it replaces.
    pub fn init_proxy(
        &mut self,
        id: NodeId,
        proxy: Box<dyn Proxy>,
    ) -> Result<Option<Box<dyn Proxy>>, SceneError> {
        Ok(self.try_get_mut(id)?.proxy.replace(proxy))
    }

    pub fn proxy(&self, id: NodeId) -> Option<&dyn Proxy> {
        self.get(id).and_then(|o| o.proxy.as_deref())
    }

    pub fn release_proxy(&mut self, id: NodeId) -> Option<Box<dyn Proxy>> {
        self.get_mut(id).and_then(|o| o.proxy.take())
    }

    /// Sever the script link of `id` and hand back the proxy for release.
    pub fn finalize_self(&mut self, id: NodeId) -> Option<Box<dyn Proxy>> {
        let mut proxy = self.release_proxy(id)?;
        proxy.finalize(id);
        Some(proxy)
    }

    // -- focus ---------------------------------------------------------------

    /// Bind (or with `None`, unbind) the focus object of `input` on `stage`.
    /// Returns false if `stage` is not a live stage.
    pub fn set_focus(&mut self, stage: NodeId, input: InputId, node: Option<NodeId>) -> bool {
        let Some(data) = self.get_mut(stage).and_then(|s| s.stage_data_mut()) else {
            debug!("set_focus on {:?} which is not a stage", stage);
            return false;
        };
        match node {
            Some(node) => {
                data.focus.insert(input, node);
                debug!("focus {:?} -> {:?}", input, node);
            }
            None => {
                data.focus.remove(&input);
                debug!("focus {:?} released", input);
            }
        }
        true
    }

    /// The live focus object of `input` on `stage`.
    pub fn focus(&self, stage: NodeId, input: InputId) -> Option<NodeId> {
        let node = *self.get(stage)?.stage_data()?.focus.get(&input)?;
        self.contains(node).then_some(node)
    }

    /// Drop the binding of `input` on `stage` if it points at a dead node.
    pub(crate) fn prune_stale_focus(&mut self, stage: NodeId, input: InputId) -> bool {
        let stale = self
            .get(stage)
            .and_then(|s| s.stage_data())
            .and_then(|data| data.focus.get(&input))
            .is_some_and(|&node| !self.contains(node));
        if stale {
            self.clear_focus(stage, input);
        }
        stale
    }

    pub fn clear_focus(&mut self, stage: NodeId, input: InputId) {
        if let Some(data) = self.get_mut(stage).and_then(|s| s.stage_data_mut()) {
            data.focus.remove(&input);
        }
    }

    /// Drop every focus binding, on every stage, that points at `node`.
    pub fn clear_focus_for(&mut self, node: NodeId) {
        for i in 0..self.stages.len() {
            let stage = self.stages[i];
            if let Some(data) = self.get_mut(stage).and_then(|s| s.stage_data_mut()) {
                data.focus.retain(|_, &mut bound| bound != node);
            }
        }
    }

    /// Nodes currently captured on `stage` by inputs other than `except`.
    pub(crate) fn captured_nodes(&self, stage: NodeId, except: InputId) -> Vec<NodeId> {
        self.get(stage)
            .and_then(|s| s.stage_data())
            .map(|data| {
                data.focus
                    .iter()
                    .filter(|(input, _)| **input != except)
                    .map(|(_, &node)| node)
                    .collect()
            })
            .unwrap_or_default()
    }
}

impl Default for SceneTree {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shape::RectShape;

    fn rect(tree: &mut SceneTree) -> NodeId {
        tree.register(DisplayObject::shape(RectShape::new(10.0, 10.0)))
    }

    #[test]
    fn test_tree_register_unregister() {
        let mut tree = SceneTree::new();
        let a = rect(&mut tree);
        let b = rect(&mut tree);
        assert_eq!(tree.len(), 2);

        tree.destroy(a);
        assert!(!tree.contains(a));
        assert!(tree.contains(b));
        assert_eq!(tree.len(), 1);
    }

    #[test]
    fn test_tree_generation_rejects_stale_id() {
        let mut tree = SceneTree::new();
        let a = rect(&mut tree);
        tree.destroy(a);
        let b = rect(&mut tree);

        assert_ne!(a, b);
        assert!(!tree.contains(a));
        assert!(tree.get(a).is_none());
        assert_eq!(
            tree.set_position(a, 1.0, 1.0),
            Err(SceneError::StaleNode(a))
        );
    }

    #[test]
    fn test_tree_swap_remove_keeps_lookups_valid() {
        let mut tree = SceneTree::new();
        let ids: Vec<_> = (0..4).map(|_| rect(&mut tree)).collect();
        tree.set_position(ids[3], 7.0, 0.0).unwrap();
        tree.destroy(ids[0]);
        assert_eq!(tree.get(ids[3]).unwrap().transform().x, 7.0);
    }

    #[test]
    fn test_tree_insert_clamps_and_orders() {
        let mut tree = SceneTree::new();
        let g = tree.register(DisplayObject::group());
        let a = rect(&mut tree);
        let b = rect(&mut tree);
        let c = rect(&mut tree);

        tree.insert(g, 99, a, false).unwrap();
        tree.insert(g, 0, b, false).unwrap();
        tree.insert(g, 1, c, false).unwrap();

        assert_eq!(tree.children(g), &[b, c, a]);
        assert_eq!(tree.parent(c), Some(g));
    }

    #[test]
    fn test_tree_reparent_detaches_first() {
        let mut tree = SceneTree::new();
        let g1 = tree.register(DisplayObject::group());
        let g2 = tree.register(DisplayObject::group());
        let a = rect(&mut tree);

        tree.append(g1, a).unwrap();
        tree.append(g2, a).unwrap();

        assert!(tree.children(g1).is_empty());
        assert_eq!(tree.children(g2), &[a]);
        assert_eq!(tree.parent(a), Some(g2));
    }

    #[test]
    fn test_tree_insert_release_inverse() {
        let mut tree = SceneTree::new();
        let g = tree.register(DisplayObject::group());
        let a = tree.register(DisplayObject::shape(RectShape::new(4.0, 4.0)).at(3.0, 5.0));
        tree.set_rotation(a, 30.0).unwrap();
        let before = *tree.get(a).unwrap().transform();

        tree.insert(g, 0, a, false).unwrap();
        assert_eq!(tree.release(g, 0), Some(a));

        assert_eq!(tree.parent(a), None);
        assert_eq!(*tree.get(a).unwrap().transform(), before);
        assert!(tree.children(g).is_empty());
    }

    #[test]
    fn test_tree_reset_transform_on_insert() {
        let mut tree = SceneTree::new();
        let g = tree.register(DisplayObject::group());
        let a = tree.register(DisplayObject::shape(RectShape::new(4.0, 4.0)).at(3.0, 5.0));
        tree.insert(g, 0, a, true).unwrap();
        assert_eq!(*tree.get(a).unwrap().transform(), LocalTransform::IDENTITY);
    }

    #[test]
    fn test_tree_insert_rejects_cycles_and_locked() {
        let mut tree = SceneTree::new();
        let outer = tree.register(DisplayObject::group());
        let inner = tree.register(DisplayObject::group());
        tree.append(outer, inner).unwrap();

        assert!(matches!(
            tree.append(inner, outer),
            Err(SceneError::WouldCreateCycle { .. })
        ));
        assert!(matches!(
            tree.append(outer, outer),
            Err(SceneError::WouldCreateCycle { .. })
        ));

        let stage = tree.register(DisplayObject::stage());
        assert_eq!(tree.append(outer, stage), Err(SceneError::Locked(stage)));

        let leaf = rect(&mut tree);
        assert_eq!(tree.append(leaf, inner), Err(SceneError::NotAGroup(leaf)));
    }

    #[test]
    fn test_tree_kind_specific_setters_name_expected_kind() {
        let mut tree = SceneTree::new();
        let plain = tree.register(DisplayObject::group());
        let boxed = tree.register(DisplayObject::container(10.0, 10.0));
        let leaf = rect(&mut tree);

        assert_eq!(
            tree.replace_shape(plain, Box::new(RectShape::new(1.0, 1.0))),
            Err(SceneError::NotAShape(plain))
        );
        assert!(tree.replace_shape(leaf, Box::new(RectShape::new(1.0, 1.0))).is_ok());

        assert_eq!(
            tree.set_container_size(plain, 5.0, 5.0),
            Err(SceneError::NotAContainer(plain))
        );
        assert_eq!(
            tree.set_container_size(leaf, 5.0, 5.0),
            Err(SceneError::NotAContainer(leaf))
        );
        assert!(tree.set_container_size(boxed, 5.0, 5.0).is_ok());
    }

    #[test]
    fn test_tree_invalidate_marks_all_ancestors() {
        let mut tree = SceneTree::new();
        let root = tree.register(DisplayObject::group());
        let mid = tree.register(DisplayObject::group());
        let leaf = rect(&mut tree);
        tree.append(root, mid).unwrap();
        tree.append(mid, leaf).unwrap();

        for id in [root, mid, leaf] {
            tree.get_mut(id).unwrap().dirty = DirtyFlags::empty();
        }
        // A dirty ancestor in between must not stop the walk.
        tree.get_mut(mid).unwrap().dirty = DirtyFlags::STAGE_BOUNDS;

        tree.invalidate(leaf, DirtyFlags::TRANSFORM);
        assert!(tree.get(root).unwrap().dirty().contains(DirtyFlags::STAGE_BOUNDS));
        assert!(tree.get(leaf).unwrap().dirty().contains(DirtyFlags::TRANSFORM));
    }

    #[test]
    fn test_tree_invalidate_geometry_recomposes_local() {
        let mut tree = SceneTree::new();
        let leaf = rect(&mut tree);
        tree.get_mut(leaf).unwrap().dirty = DirtyFlags::empty();
        tree.invalidate(leaf, DirtyFlags::GEOMETRY | DirtyFlags::MASK);

        let dirty = tree.get(leaf).unwrap().dirty();
        assert!(dirty.contains(DirtyFlags::LOCAL_TRANSFORM | DirtyFlags::TRANSFORM));
        assert!(!dirty.contains(DirtyFlags::MASK));
    }

    #[test]
    fn test_tree_paint_does_not_touch_ancestors() {
        let mut tree = SceneTree::new();
        let root = tree.register(DisplayObject::group());
        let leaf = rect(&mut tree);
        tree.append(root, leaf).unwrap();
        tree.get_mut(root).unwrap().dirty = DirtyFlags::empty();

        tree.invalidate(leaf, DirtyFlags::PAINT);
        assert!(tree.get(root).unwrap().dirty().is_empty());
    }

    #[test]
    fn test_tree_destroy_subtree_and_focus() {
        let mut tree = SceneTree::new();
        let stage = tree.register(DisplayObject::stage());
        let g = tree.register(DisplayObject::group());
        let a = rect(&mut tree);
        tree.append(stage, g).unwrap();
        tree.append(g, a).unwrap();
        assert_eq!(tree.stage_of(a), Some(stage));

        assert!(tree.set_focus(stage, InputId(7), Some(a)));
        assert_eq!(tree.focus(stage, InputId(7)), Some(a));

        let removed = tree.destroy(g);
        assert_eq!(removed.len(), 2);
        assert_eq!(removed[0].0, a);
        assert!(tree.children(stage).is_empty());
        assert_eq!(tree.focus(stage, InputId(7)), None);
    }

    #[test]
    fn test_tree_focus_on_non_stage_is_noop() {
        let mut tree = SceneTree::new();
        let g = tree.register(DisplayObject::group());
        let a = rect(&mut tree);
        assert!(!tree.set_focus(g, InputId::PRIMARY, Some(a)));
        assert_eq!(tree.focus(g, InputId::PRIMARY), None);
    }

    #[test]
    fn test_tree_stage_reference_follows_insert_and_release() {
        let mut tree = SceneTree::new();
        let stage = tree.register(DisplayObject::stage());
        let g = tree.register(DisplayObject::group());
        let inner = tree.register(DisplayObject::group());
        tree.append(g, inner).unwrap();
        tree.append(stage, g).unwrap();

        let group_stage = |tree: &SceneTree, id| tree.get(id).and_then(|o| o.group_data()).and_then(|g| g.stage);
        assert_eq!(group_stage(&tree, inner), Some(stage));

        tree.remove_from_parent(g).unwrap();
        assert_eq!(group_stage(&tree, inner), None);
        assert_eq!(tree.stage_of(inner), None);
    }

    #[test]
    fn test_tree_mask_transform_requires_mask() {
        let mut tree = SceneTree::new();
        let a = rect(&mut tree);
        assert_eq!(
            tree.modify_mask_transform(a, |t| t.x = 1.0),
            Err(SceneError::NoMask(a))
        );
    }
}
