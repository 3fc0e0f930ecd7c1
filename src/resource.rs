//! Links to things that live outside the scene graph.
//!
//! A [`Proxy`] is the script-side representation of a node. A
//! [`CpuResource`] is native memory (geometry buffers, decoded bitmaps) that
//! render commands may still reference after its owner is gone, so the scene
//! destroys it only after a grace period.

use crate::tree::NodeId;

/// Script-side representation of a node.
pub trait Proxy {
    /// Sever the link to `node`. Called exactly once, before the node is destroyed.
    fn finalize(&mut self, node: NodeId);
}

/// Native memory released through the scene's deferred queues.
pub trait CpuResource {
    /// Free the resource. Called once, when its release queue is flushed.
    fn release(&mut self);
}
