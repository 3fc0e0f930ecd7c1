//! Event listeners and dispatch.
//!
//! An event either follows the focus path (the object bound to its input id,
//! then each ancestor) or is hit tested against the current stage and offered
//! to the snapshot in post order. Either way the first object whose
//! listeners report [`EventResponse::Handled`] stops propagation, and an
//! unhandled event falls through to the default listener.
//!
//! Listeners get `&mut Scene` and may mutate the tree freely. A node's
//! listener list is taken out of the registry for the duration of the call
//! and merged back afterwards.

use std::collections::{HashMap, HashSet};
use std::mem;

use log::{debug, trace, warn};

use crate::event::{Event, EventKind, EventResponse, InputId, TouchPoint};
use crate::scene::Scene;
use crate::tree::NodeId;

pub type Listener = Box<dyn FnMut(&mut Scene, NodeId, &Event) -> EventResponse>;

/// Receives events no object handled.
pub type DefaultListener = Box<dyn FnMut(&mut Scene, &Event) -> EventResponse>;

struct Registration {
    kind: EventKind,
    listener: Listener,
}

#[derive(Default)]
pub(crate) struct ListenerRegistry {
    by_node: HashMap<NodeId, Vec<Registration>>,
    default: Option<DefaultListener>,
    /// Nodes whose listeners are currently taken out for a call
    in_flight: HashSet<NodeId>,
    /// In-flight nodes whose listeners were removed during the call
    cleared: HashSet<NodeId>,
}

impl ListenerRegistry {
    fn add(&mut self, node: NodeId, kind: EventKind, listener: Listener) {
        self.by_node
            .entry(node)
            .or_default()
            .push(Registration { kind, listener });
    }

    pub(crate) fn remove(&mut self, node: NodeId) {
        self.by_node.remove(&node);
        if self.in_flight.contains(&node) {
            self.cleared.insert(node);
        }
    }

    fn has(&self, node: NodeId, kind: EventKind) -> bool {
        self.by_node
            .get(&node)
            .is_some_and(|list| list.iter().any(|r| r.kind == kind))
    }

    fn take(&mut self, node: NodeId) -> Option<Vec<Registration>> {
        if self.in_flight.contains(&node) {
            return None;
        }
        let taken = self.by_node.remove(&node)?;
        self.in_flight.insert(node);
        Some(taken)
    }

    fn restore(&mut self, node: NodeId, mut taken: Vec<Registration>) {
        self.in_flight.remove(&node);
        if self.cleared.remove(&node) {
            return;
        }
        if let Some(added) = self.by_node.remove(&node) {
            taken.extend(added);
        }
        self.by_node.insert(node, taken);
    }

    pub(crate) fn len(&self) -> usize {
        self.by_node.values().map(Vec::len).sum()
    }
}

impl Scene {
    /// Register `listener` for events of `kind` delivered to `node`.
    pub fn add_event_listener<F>(&mut self, node: NodeId, kind: EventKind, listener: F)
    where
        F: FnMut(&mut Scene, NodeId, &Event) -> EventResponse + 'static,
    {
        self.listeners.add(node, kind, Box::new(listener));
    }

    /// Drop every listener of `node`.
    pub fn remove_event_listeners(&mut self, node: NodeId) {
        self.listeners.remove(node);
    }

    pub fn has_event_listener(&self, node: NodeId, kind: EventKind) -> bool {
        self.listeners.has(node, kind)
    }

    pub fn set_default_listener<F>(&mut self, listener: F)
    where
        F: FnMut(&mut Scene, &Event) -> EventResponse + 'static,
    {
        self.listeners.default = Some(Box::new(listener));
    }

    pub fn clear_default_listener(&mut self) {
        self.listeners.default = None;
    }

    /// Bind `node` as the focus of `input` on its stage.
    ///
    /// Returns false, doing nothing, if `node` is not part of a stage.
    pub fn set_focus(&mut self, node: NodeId, input: InputId) -> bool {
        match self.tree.stage_of(node) {
            Some(stage) => self.tree.set_focus(stage, input, Some(node)),
            None => {
                debug!("set_focus: {:?} is not on a stage", node);
                false
            }
        }
    }

    /// Release the focus binding of `input` on the current stage.
    pub fn release_focus(&mut self, input: InputId) {
        self.tree.clear_focus(self.current, input);
    }

    pub fn focus(&self, input: InputId) -> Option<NodeId> {
        self.tree.focus(self.current, input)
    }

    /// Deliver `event` on the current stage. Returns true if something,
    /// including the default listener, handled it.
    ///
    /// Only contact events consult the focus table; taps and mouse events
    /// are always hit tested.
    pub fn dispatch_event(&mut self, event: &Event) -> bool {
        let stage = self.current;
        let input = event.input_id();
        let is_contact = event.phase().is_some();

        let focus = if is_contact {
            self.tree.focus(stage, input)
        } else {
            None
        };
        let mut handled = match focus {
            Some(focus) => self.dispatch_focused(focus, event),
            None => {
                if is_contact && self.tree.prune_stale_focus(stage, input) {
                    warn!("dropped stale focus binding for {:?}", input);
                }
                self.dispatch_hit_test(stage, event)
            }
        };
        if !handled {
            handled = self.call_default_listener(event);
        }

        if event.phase().is_some_and(|p| p.is_terminal()) {
            self.tree.clear_focus(stage, input);
        }
        handled
    }

    /// Split a multi-contact input frame into one event per contact and
    /// dispatch each. Returns how many were handled.
    pub fn dispatch_multitouch(&mut self, points: &[TouchPoint]) -> usize {
        let events: Vec<Event> = crate::event::split_multitouch(points).collect();
        events
            .iter()
            .filter(|event| self.dispatch_event(event))
            .count()
    }

    /// Offer `event` to `focus`, then to each of its ancestors.
    fn dispatch_focused(&mut self, focus: NodeId, event: &Event) -> bool {
        let mut current = Some(focus);
        while let Some(node) = current {
            if self.deliver(node, event) {
                trace!("{:?} handled by focus path at {:?}", event.kind(), node);
                return true;
            }
            current = self.tree.parent(node);
        }
        false
    }

    fn dispatch_hit_test(&mut self, stage: NodeId, event: &Event) -> bool {
        let (x, y) = event.coords();
        let mut arena = mem::take(&mut self.hit_arena);
        self.tree.hit_test(stage, x, y, event.input_id(), &mut arena);
        let order = arena.dispatch_order();
        arena.clear();
        self.hit_arena = arena;

        for node in order {
            // An earlier listener may have destroyed it.
            if !self.tree.contains(node) {
                continue;
            }
            if self.deliver(node, event) {
                trace!("{:?} at ({}, {}) handled by {:?}", event.kind(), x, y, node);
                return true;
            }
        }
        false
    }

    /// Call every listener of `node` matching the event's kind. The node
    /// handles the event if any of them does.
    fn deliver(&mut self, node: NodeId, event: &Event) -> bool {
        let Some(mut taken) = self.listeners.take(node) else {
            return false;
        };
        let kind = event.kind();
        let mut handled = false;
        for registration in taken.iter_mut().filter(|r| r.kind == kind) {
            if (registration.listener)(self, node, event).is_handled() {
                handled = true;
            }
        }
        self.listeners.restore(node, taken);
        handled
    }

    fn call_default_listener(&mut self, event: &Event) -> bool {
        let Some(mut listener) = self.listeners.default.take() else {
            return false;
        };
        let handled = listener(self, event).is_handled();
        if self.listeners.default.is_none() {
            self.listeners.default = Some(listener);
        }
        handled
    }
}
