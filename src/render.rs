//! Prepare/Draw contract between the scene graph and a rendering backend.
//!
//! The backend is an opaque [`Renderer`] command sink. Nodes hand it resolved
//! world matrices, cumulative alpha and mask uniforms; everything past that
//! (tessellation, shaders, textures) belongs to the backend.

use log::debug;

use crate::display::{Display, Frustum};
use crate::flags::DirtyFlags;
use crate::geometry::{Color, Rect};
use crate::mask::MaskUniform;
use crate::object::NodeKind;
use crate::transform::Matrix;
use crate::tree::{NodeId, SceneTree};

/// How the backend should draw a frame.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    #[default]
    Default,
    Wireframe,
    /// Filled geometry with wireframe on top
    Hybrid,
}

/// A single draw operation in a shape's own coordinates.
///
/// World transforms travel alongside in the [`DrawItem`].
#[derive(Debug, Clone, PartialEq)]
pub enum DrawCommand {
    Rect {
        rect: Rect,
        color: Color,
    },

    RoundedRect {
        rect: Rect,
        color: Color,
        /// Corner radius in content units
        radius: f32,
    },

    Circle {
        /// Center point in local coordinates
        center: (f32, f32),
        radius: f32,
        color: Color,
    },
}

/// Per-node state resolved for one draw call.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct DrawItem {
    pub node: NodeId,
    /// World (source-to-destination) matrix
    pub matrix: Matrix,
    /// Cumulative alpha, 0-255
    pub alpha: u8,
}

pub trait Renderer {
    fn begin_frame(&mut self, frustum: &Frustum, mode: DrawMode);

    fn clear(&mut self, color: Color);

    /// Clip subsequent draws through the mask of `node` until the matching
    /// [`Renderer::pop_mask`].
    fn push_mask(&mut self, node: NodeId, uniform: &MaskUniform);

    fn pop_mask(&mut self);

    fn draw(&mut self, item: &DrawItem, command: DrawCommand);

    fn end_frame(&mut self) {}
}

#[derive(Debug, Clone, PartialEq)]
pub enum RecordedCommand {
    BeginFrame { frustum: Frustum, mode: DrawMode },
    Clear(Color),
    PushMask { node: NodeId, uniform: MaskUniform },
    PopMask,
    Draw { item: DrawItem, command: DrawCommand },
    EndFrame,
}

/// A [`Renderer`] that records every call, for headless use.
#[derive(Debug, Default)]
pub struct CommandBuffer {
    commands: Vec<RecordedCommand>,
}

impl CommandBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn commands(&self) -> &[RecordedCommand] {
        &self.commands
    }

    /// Nodes drawn so far, in draw order.
    pub fn drawn_nodes(&self) -> Vec<NodeId> {
        self.commands
            .iter()
            .filter_map(|c| match c {
                RecordedCommand::Draw { item, .. } => Some(item.node),
                _ => None,
            })
            .collect()
    }

    /// Number of frames begun.
    pub fn frames(&self) -> usize {
        self.commands
            .iter()
            .filter(|c| matches!(c, RecordedCommand::BeginFrame { .. }))
            .count()
    }

    pub fn clear(&mut self) {
        self.commands.clear();
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }
}

impl Renderer for CommandBuffer {
    fn begin_frame(&mut self, frustum: &Frustum, mode: DrawMode) {
        self.commands.push(RecordedCommand::BeginFrame {
            frustum: *frustum,
            mode,
        });
    }

    fn clear(&mut self, color: Color) {
        self.commands.push(RecordedCommand::Clear(color));
    }

    fn push_mask(&mut self, node: NodeId, uniform: &MaskUniform) {
        self.commands.push(RecordedCommand::PushMask {
            node,
            uniform: *uniform,
        });
    }

    fn pop_mask(&mut self) {
        self.commands.push(RecordedCommand::PopMask);
    }

    fn draw(&mut self, item: &DrawItem, command: DrawCommand) {
        self.commands.push(RecordedCommand::Draw {
            item: *item,
            command,
        });
    }

    fn end_frame(&mut self) {
        self.commands.push(RecordedCommand::EndFrame);
    }
}

/// What a draw pass did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DrawOutcome {
    /// Leaves handed to the renderer
    pub drawn: usize,
    /// A drawn shape depends on time, so the next frame must redraw
    pub time_dependent: bool,
}

impl SceneTree {
    /// Consume render flags on `id` and its visible, on-screen descendants.
    ///
    /// Rebuilds leaf geometry through [`Shape::prepare`](crate::Shape::prepare)
    /// and recomputes the mask uniform when MASK is dirty. Expects a
    /// preceding transform pass.
    pub fn prepare(&mut self, id: NodeId, display: &Display) {
        let Some(object) = self.get(id) else {
            return;
        };
        if !object.is_visible() || object.is_offscreen() || object.alpha == 0 {
            return;
        }

        let dirty = object.dirty & DirtyFlags::RENDER;
        if dirty.contains(DirtyFlags::MASK) {
            let uv = object
                .mask
                .as_ref()
                .and_then(|mask| mask.uv_matrix(&object.world_matrix));
            match uv {
                Some(uv) => self.set_mask_uniform(id, Some(MaskUniform::new(&uv))),
                None => debug!("mask of {:?} is degenerate, keeping previous uniform", id),
            }
        }

        let Some(object) = self.get_mut(id) else {
            return;
        };
        if let NodeKind::Shape(shape) = &mut object.kind {
            if !dirty.is_empty() {
                shape.prepare(dirty, display);
            }
        }
        object.dirty.remove(DirtyFlags::RENDER);

        for i in 0..self.children(id).len() {
            let child = self.children(id)[i];
            self.prepare(child, display);
        }
    }

    /// Draw `id` and its descendants in paint order.
    pub fn draw(&self, id: NodeId, renderer: &mut dyn Renderer) -> DrawOutcome {
        let mut outcome = DrawOutcome::default();
        self.draw_node(id, renderer, &mut outcome);
        outcome
    }

    fn draw_node(&self, id: NodeId, renderer: &mut dyn Renderer, outcome: &mut DrawOutcome) {
        let Some(object) = self.get(id) else {
            return;
        };
        if !object.is_visible() || object.is_offscreen() || object.cumulative_alpha == 0 {
            return;
        }

        // WillDraw
        let masked = match (&object.mask, &object.mask_uniform) {
            (Some(_), Some(uniform)) => {
                renderer.push_mask(id, uniform);
                true
            }
            _ => false,
        };

        match &object.kind {
            NodeKind::Shape(shape) => {
                let item = DrawItem {
                    node: id,
                    matrix: object.world_matrix,
                    alpha: object.cumulative_alpha,
                };
                shape.draw(renderer, &item);
                outcome.drawn += 1;
                outcome.time_dependent |= shape.is_time_dependent();
            }
            NodeKind::Group(group) => {
                for &child in &group.children {
                    self.draw_node(child, renderer, outcome);
                }
            }
        }

        // DidDraw
        if masked {
            renderer.pop_mask();
        }
    }
}
