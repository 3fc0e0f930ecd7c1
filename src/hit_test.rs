//! Hit-test snapshots.
//!
//! For each dispatched event the tree is tested against one point and the
//! objects actually hit are mirrored into a [`HitTestArena`]: a flat vector of
//! nodes linked by indices. The arena is cleared and refilled per event, so
//! its allocation is reused across dispatches.
//!
//! Children of a snapshot node are linked frontmost first: siblings are
//! visited in paint order and each hit is prepended.

use log::trace;

use crate::event::InputId;
use crate::flags::ObjectFlags;
use crate::object::NodeKind;
use crate::tree::{NodeId, SceneTree};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HitTestObject {
    pub target: NodeId,
    first_child: Option<usize>,
    next_sibling: Option<usize>,
}

#[derive(Debug, Default)]
pub struct HitTestArena {
    nodes: Vec<HitTestObject>,
}

impl HitTestArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn clear(&mut self) {
        self.nodes.clear();
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The stage the snapshot was taken on.
    pub fn root(&self) -> Option<NodeId> {
        self.nodes.first().map(|n| n.target)
    }

    pub fn get(&self, index: usize) -> Option<&HitTestObject> {
        self.nodes.get(index)
    }

    /// Snapshot children of `index`, frontmost first.
    pub fn children(&self, index: usize) -> impl Iterator<Item = usize> + '_ {
        let mut next = self.nodes.get(index).and_then(|n| n.first_child);
        std::iter::from_fn(move || {
            let current = next?;
            next = self.nodes[current].next_sibling;
            Some(current)
        })
    }

    /// Targets in the order dispatch offers them the event: children before
    /// their group, frontmost sibling first, the stage last.
    pub fn dispatch_order(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len());
        if !self.nodes.is_empty() {
            self.post_order(0, &mut order);
        }
        order
    }

    fn post_order(&self, index: usize, out: &mut Vec<NodeId>) {
        for child in self.children(index) {
            self.post_order(child, out);
        }
        out.push(self.nodes[index].target);
    }

    fn push(&mut self, target: NodeId) -> usize {
        self.nodes.push(HitTestObject {
            target,
            first_child: None,
            next_sibling: None,
        });
        self.nodes.len() - 1
    }

    fn prepend_child(&mut self, parent: usize, child: usize) {
        self.nodes[child].next_sibling = self.nodes[parent].first_child;
        self.nodes[parent].first_child = Some(child);
    }
}

impl SceneTree {
    /// Build the hit snapshot of `stage` at content point `(x, y)` into
    /// `arena`, skipping objects captured as focus by inputs other than
    /// `input`. Returns true if anything below the stage was hit.
    pub fn hit_test(
        &mut self,
        stage: NodeId,
        x: f32,
        y: f32,
        input: InputId,
        arena: &mut HitTestArena,
    ) -> bool {
        arena.clear();
        if !self.get(stage).is_some_and(|s| s.is_stage()) {
            return false;
        }
        let captured = self.captured_nodes(stage, input);
        let root = arena.push(stage);
        self.hit_test_children(stage, root, x, y, &captured, arena);

        let hit = arena.get(root).is_some_and(|r| r.first_child.is_some());
        trace!("hit test ({}, {}) on {:?}: {} nodes", x, y, stage, arena.len() - 1);
        hit
    }

    fn hit_test_children(
        &mut self,
        group: NodeId,
        slot: usize,
        x: f32,
        y: f32,
        captured: &[NodeId],
        arena: &mut HitTestArena,
    ) {
        for i in 0..self.children(group).len() {
            let child = self.children(group)[i];
            let Some(object) = self.get(child) else {
                continue;
            };
            if !object.should_hit_test() || !object.can_hit_test() || captured.contains(&child) {
                continue;
            }

            if object.is_group() {
                if !self.stage_bounds(child).contains(x, y) || !self.mask_admits(child, x, y) {
                    continue;
                }
                let index = arena.push(child);
                self.hit_test_children(child, index, x, y, captured, arena);
                if arena.nodes[index].first_child.is_none() {
                    arena.nodes.truncate(index);
                    continue;
                }
                arena.prepend_child(slot, index);
            } else if self.hit_test_object(child, x, y) {
                let index = arena.push(child);
                arena.prepend_child(slot, index);
            }
        }
    }

    /// Whether content point `(x, y)` hits `id` itself.
    ///
    /// Stage bounds reject first. Leaves then test the shape at the point
    /// mapped into their own space. Hit-test masked nodes finally sample
    /// their mask.
    pub fn hit_test_object(&mut self, id: NodeId, x: f32, y: f32) -> bool {
        if !self.stage_bounds(id).contains(x, y) {
            return false;
        }
        let Some(object) = self.get(id) else {
            return false;
        };
        if let NodeKind::Shape(shape) = &object.kind {
            let Some(inverse) = object.world_matrix.inverse() else {
                return false;
            };
            let (lx, ly) = inverse.transform_point(x, y);
            if !shape.hit_test(lx, ly) {
                return false;
            }
        }
        self.mask_admits(id, x, y)
    }

    fn mask_admits(&self, id: NodeId, x: f32, y: f32) -> bool {
        let Some(object) = self.get(id) else {
            return false;
        };
        if !object.flags.contains(ObjectFlags::HIT_TEST_MASKED) {
            return true;
        }
        let Some(mask) = &object.mask else {
            return true;
        };
        match mask.uv_matrix(&object.world_matrix) {
            Some(uv) => {
                let (u, v) = uv.transform_point(x, y);
                mask.hit_test(u, v)
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use image::{GrayImage, Luma};

    use super::*;
    use crate::anchor::Anchor;
    use crate::geometry::Rect;
    use crate::mask::BitmapMask;
    use crate::object::DisplayObject;
    use crate::shape::{CircleShape, RectShape};
    use crate::transform::Matrix;
    use crate::update::UpdateContext;

    fn update(tree: &mut SceneTree, stage: NodeId) {
        let mut ctx = UpdateContext::new(Rect::new(0.0, 0.0, 320.0, 480.0));
        tree.update_transform(stage, &Matrix::IDENTITY, &mut ctx);
    }

    fn square(tree: &mut SceneTree, size: f32) -> NodeId {
        tree.register(
            DisplayObject::shape(RectShape::new(size, size)).with_anchor(Anchor::TOP_LEFT),
        )
    }

    fn center_mask() -> BitmapMask {
        BitmapMask::new(GrayImage::from_fn(100, 100, |x, y| {
            if (25..75).contains(&x) && (25..75).contains(&y) {
                Luma([255])
            } else {
                Luma([0])
            }
        }))
    }

    #[test]
    fn test_mask_refines_hits() {
        let mut tree = SceneTree::new();
        let stage = tree.register(DisplayObject::stage());
        let object = square(&mut tree, 100.0);
        tree.append(stage, object).unwrap();
        tree.set_mask(object, Some(center_mask())).unwrap();
        update(&mut tree, stage);

        assert!(!tree.hit_test_object(object, 10.0, 10.0));
        assert!(tree.hit_test_object(object, 50.0, 50.0));

        tree.set_hit_test_masked(object, false).unwrap();
        assert!(tree.hit_test_object(object, 10.0, 10.0));
    }

    #[test]
    fn test_frontmost_sibling_dispatched_first() {
        let mut tree = SceneTree::new();
        let stage = tree.register(DisplayObject::stage());
        let g = tree.register(DisplayObject::group());
        let b = square(&mut tree, 50.0);
        let a = square(&mut tree, 50.0);
        tree.append(stage, g).unwrap();
        tree.append(g, b).unwrap();
        tree.append(g, a).unwrap();
        update(&mut tree, stage);

        let mut arena = HitTestArena::new();
        assert!(tree.hit_test(stage, 10.0, 10.0, InputId::PRIMARY, &mut arena));
        assert_eq!(arena.dispatch_order(), vec![a, b, g, stage]);
        assert_eq!(arena.root(), Some(stage));
    }

    #[test]
    fn test_groups_without_hit_children_are_dropped() {
        let mut tree = SceneTree::new();
        let stage = tree.register(DisplayObject::stage());
        let g = tree.register(DisplayObject::group());
        let ring = tree.register(DisplayObject::shape(CircleShape::new(20.0)).at(30.0, 30.0));
        let other = square(&mut tree, 100.0);
        tree.append(stage, other).unwrap();
        tree.append(stage, g).unwrap();
        tree.append(g, ring).unwrap();
        update(&mut tree, stage);

        // Inside the circle's bounding box but outside the circle.
        let mut arena = HitTestArena::new();
        assert!(tree.hit_test(stage, 12.0, 12.0, InputId::PRIMARY, &mut arena));
        assert_eq!(arena.dispatch_order(), vec![other, stage]);
        assert_eq!(arena.len(), 2);

        assert!(tree.hit_test(stage, 30.0, 30.0, InputId::PRIMARY, &mut arena));
        assert_eq!(arena.dispatch_order(), vec![ring, g, other, stage]);
    }

    #[test]
    fn test_nothing_hit_leaves_only_the_stage() {
        let mut tree = SceneTree::new();
        let stage = tree.register(DisplayObject::stage());
        let object = square(&mut tree, 10.0);
        tree.append(stage, object).unwrap();
        update(&mut tree, stage);

        let mut arena = HitTestArena::new();
        assert!(!tree.hit_test(stage, 200.0, 200.0, InputId::PRIMARY, &mut arena));
        assert_eq!(arena.dispatch_order(), vec![stage]);
    }

    #[test]
    fn test_objects_captured_by_other_inputs_are_skipped() {
        let mut tree = SceneTree::new();
        let stage = tree.register(DisplayObject::stage());
        let object = square(&mut tree, 100.0);
        tree.append(stage, object).unwrap();
        update(&mut tree, stage);
        tree.set_focus(stage, InputId(3), Some(object));

        let mut arena = HitTestArena::new();
        assert!(!tree.hit_test(stage, 10.0, 10.0, InputId(4), &mut arena));
        assert!(tree.hit_test(stage, 10.0, 10.0, InputId(3), &mut arena));
    }

    #[test]
    fn test_invisible_objects_need_hit_test_invisible() {
        let mut tree = SceneTree::new();
        let stage = tree.register(DisplayObject::stage());
        let object = square(&mut tree, 100.0);
        tree.append(stage, object).unwrap();
        tree.set_visible(object, false).unwrap();
        update(&mut tree, stage);

        let mut arena = HitTestArena::new();
        assert!(!tree.hit_test(stage, 10.0, 10.0, InputId::PRIMARY, &mut arena));

        tree.set_hit_test_invisible(object, true).unwrap();
        update(&mut tree, stage);
        assert!(tree.hit_test(stage, 10.0, 10.0, InputId::PRIMARY, &mut arena));
    }

    #[test]
    fn test_rotated_leaf_uses_local_shape_test() {
        let mut tree = SceneTree::new();
        let stage = tree.register(DisplayObject::stage());
        let bar = tree.register(DisplayObject::shape(RectShape::new(100.0, 10.0)).at(100.0, 100.0));
        tree.append(stage, bar).unwrap();
        tree.set_rotation(bar, 90.0).unwrap();
        update(&mut tree, stage);

        assert!(tree.hit_test_object(bar, 100.0, 140.0));
        assert!(!tree.hit_test_object(bar, 140.0, 100.0));
    }
}
