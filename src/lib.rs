//! A retained-mode 2D scene graph.
//!
//! Nodes live in a [`SceneTree`] arena and are addressed by generational
//! [`NodeId`]s. Each node caches its world matrix and stage-space bounds
//! behind dirty flags, so a frame only recomputes what changed. A [`Scene`]
//! drives the per-frame transform, prepare and draw passes, routes input
//! through hit testing or focus, and defers the release of native resources.
//!
//! ```
//! use stagecraft::{CommandBuffer, DisplayObject, Event, EventKind, EventResponse, RectShape, Scene};
//!
//! let mut scene = Scene::default();
//! let stage = scene.current_stage();
//! let button = scene
//!     .add_child(stage, DisplayObject::shape(RectShape::new(80.0, 40.0)).at(100.0, 100.0))
//!     .unwrap();
//! scene.add_event_listener(button, EventKind::Tap, |_, _, _| EventResponse::Handled);
//!
//! let mut renderer = CommandBuffer::new();
//! scene.tick(&mut renderer);
//! assert!(scene.dispatch_event(&Event::tap(100.0, 100.0)));
//! ```

pub mod anchor;
pub mod config;
pub mod dispatch;
pub mod display;
pub mod error;
pub mod event;
pub mod flags;
pub mod geometry;
pub mod hit_test;
pub mod mask;
pub mod object;
pub mod properties;
pub mod render;
pub mod resource;
pub mod scene;
pub mod shape;
pub mod stats;
pub mod transform;
pub mod tree;
pub mod update;

pub use anchor::Anchor;
pub use config::SceneConfig;
pub use dispatch::{DefaultListener, Listener};
pub use display::{Display, Frustum, Orientation};
pub use error::SceneError;
pub use event::{
    split_multitouch, Event, EventKind, EventResponse, InputId, MouseButtons, TouchPhase,
    TouchPoint,
};
pub use flags::{DirtyFlags, ObjectFlags};
pub use geometry::{Color, Rect};
pub use hit_test::{HitTestArena, HitTestObject};
pub use mask::{BitmapMask, MaskPaint, MaskUniform};
pub use object::{DisplayObject, GroupKind, NodeKind};
pub use properties::{GeometricProperty, PropertyTable};
pub use render::{
    CommandBuffer, DrawCommand, DrawItem, DrawMode, DrawOutcome, RecordedCommand, Renderer,
};
pub use resource::{CpuResource, Proxy};
pub use scene::Scene;
pub use shape::{CircleShape, RectShape, RoundedRectShape, Shape};
pub use stats::FrameStats;
pub use transform::{LocalTransform, Matrix};
pub use tree::{NodeId, SceneTree};
pub use update::UpdateContext;
