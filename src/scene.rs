//! Per-frame orchestration and deferred reclamation.
//!
//! A [`Scene`] owns the [`SceneTree`] and a fixed set of stages:
//!
//! - the current stage, rendered every frame;
//! - an offscreen stage for snapshot renders;
//! - an overlay stage drawn on top with its own transform;
//! - two orphanages holding removed nodes until the next sweep.
//!
//! Native resources are never freed synchronously. They go into a front
//! queue that becomes the back queue on the next collect interval and is
//! flushed on the one after, so anything queued survives at least one full
//! interval of frames.

use std::mem;

use log::{debug, trace};

use crate::config::SceneConfig;
use crate::dispatch::ListenerRegistry;
use crate::display::Display;
use crate::error::SceneError;
use crate::geometry::{Color, Rect};
use crate::hit_test::HitTestArena;
use crate::object::{DisplayObject, NodeKind};
use crate::properties::PropertyTable;
use crate::render::{DrawMode, DrawOutcome, Renderer};
use crate::resource::{CpuResource, Proxy};
use crate::stats::FrameStats;
use crate::transform::Matrix;
use crate::tree::{NodeId, SceneTree};
use crate::update::UpdateContext;

pub struct Scene {
    pub(crate) tree: SceneTree,
    config: SceneConfig,
    display: Display,

    pub(crate) current: NodeId,
    offscreen: NodeId,
    overlay: NodeId,
    orphanage: NodeId,
    snapshot_orphanage: NodeId,
    overlay_transform: Matrix,

    front_queue: Vec<Box<dyn CpuResource>>,
    back_queue: Vec<Box<dyn CpuResource>>,
    proxy_queue: Vec<Box<dyn Proxy>>,

    frame: u64,
    is_valid: bool,
    active_updatables: usize,
    draw_mode: DrawMode,

    pub(crate) listeners: ListenerRegistry,
    pub(crate) hit_arena: HitTestArena,
    properties: PropertyTable,
    stats: FrameStats,
}

impl Scene {
    pub fn new(config: SceneConfig) -> Self {
        let mut tree = SceneTree::new();
        let current = tree.register(DisplayObject::stage());
        let offscreen = tree.register(DisplayObject::stage());
        let overlay = tree.register(DisplayObject::stage());
        let orphanage = tree.register(DisplayObject::stage());
        let snapshot_orphanage = tree.register(DisplayObject::stage());

        Self {
            tree,
            display: config.display(),
            draw_mode: config.draw_mode,
            config,
            current,
            offscreen,
            overlay,
            orphanage,
            snapshot_orphanage,
            overlay_transform: Matrix::IDENTITY,
            front_queue: Vec::new(),
            back_queue: Vec::new(),
            proxy_queue: Vec::new(),
            frame: 0,
            is_valid: false,
            active_updatables: 0,
            listeners: ListenerRegistry::default(),
            hit_arena: HitTestArena::new(),
            properties: PropertyTable::new(),
            stats: FrameStats::default(),
        }
    }

    pub fn tree(&self) -> &SceneTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut SceneTree {
        &mut self.tree
    }

    pub fn config(&self) -> &SceneConfig {
        &self.config
    }

    pub fn display(&self) -> &Display {
        &self.display
    }

    /// Replace the content geometry. Forces a redraw.
    pub fn set_display(&mut self, display: Display) {
        self.display = display;
        self.is_valid = false;
    }

    pub fn current_stage(&self) -> NodeId {
        self.current
    }

    pub fn offscreen_stage(&self) -> NodeId {
        self.offscreen
    }

    pub fn overlay_stage(&self) -> NodeId {
        self.overlay
    }

    pub fn orphanage(&self) -> NodeId {
        self.orphanage
    }

    pub fn snapshot_orphanage(&self) -> NodeId {
        self.snapshot_orphanage
    }

    pub fn overlay_transform(&self) -> Matrix {
        self.overlay_transform
    }

    pub fn set_overlay_transform(&mut self, transform: Matrix) {
        self.overlay_transform = transform;
        self.is_valid = false;
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    pub fn set_draw_mode(&mut self, mode: DrawMode) {
        self.draw_mode = mode;
        self.is_valid = false;
    }

    pub fn stats(&self) -> FrameStats {
        self.stats
    }

    /// Calls to [`Scene::collect`] so far.
    pub fn frame_count(&self) -> u64 {
        self.frame
    }

    pub fn is_valid(&self) -> bool {
        self.is_valid
    }

    /// Force the next [`Scene::render`] to draw.
    pub fn invalidate(&mut self) {
        self.is_valid = false;
    }

    /// Register a time-driven updatable; the scene redraws every frame
    /// while any is active.
    pub fn add_active_updatable(&mut self) {
        self.active_updatables += 1;
    }

    pub fn remove_active_updatable(&mut self) {
        self.active_updatables = self.active_updatables.saturating_sub(1);
    }

    pub fn active_updatables(&self) -> usize {
        self.active_updatables
    }

    // -- tree helpers --------------------------------------------------------

    /// Register `object` and append it to `parent`.
    pub fn add_child(
        &mut self,
        parent: NodeId,
        object: DisplayObject,
    ) -> Result<NodeId, SceneError> {
        let id = self.tree.register(object);
        if let Err(err) = self.tree.append(parent, id) {
            self.tree.destroy(id);
            return Err(err);
        }
        Ok(id)
    }

    /// Detach `id` from its parent and park it in the orphanage until the
    /// next sweep destroys it.
    pub fn remove(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.park(id, self.orphanage)
    }

    /// Like [`Scene::remove`], for nodes that belonged to a snapshot.
    pub fn remove_snapshot(&mut self, id: NodeId) -> Result<(), SceneError> {
        self.park(id, self.snapshot_orphanage)
    }

    fn park(&mut self, id: NodeId, orphanage: NodeId) -> Result<(), SceneError> {
        self.tree.remove_from_parent(id)?;
        self.tree.append(orphanage, id)?;
        trace!("{:?} parked for collection", id);
        Ok(())
    }

    /// Set a geometric property by its script name, e.g. `"xScale"`.
    pub fn set_property(&mut self, id: NodeId, name: &str, value: f32) -> Result<(), SceneError> {
        let property = self.properties.resolve(name)?;
        self.tree.set_geometric_property(id, property, value)
    }

    pub fn property(&self, id: NodeId, name: &str) -> Result<f32, SceneError> {
        let property = self.properties.resolve(name)?;
        self.tree.geometric_property(id, property)
    }

    // -- reclamation ---------------------------------------------------------

    /// Hand `resource` to the scene for deferred release.
    pub fn queue_release(&mut self, resource: Box<dyn CpuResource>) {
        self.front_queue.push(resource);
    }

    /// Hand a script proxy to the scene; it is released on the next sweep.
    pub fn queue_release_proxy(&mut self, proxy: Box<dyn Proxy>) {
        self.proxy_queue.push(proxy);
    }

    /// Resources waiting in the (front, back) queues.
    pub fn pending_releases(&self) -> (usize, usize) {
        (self.front_queue.len(), self.back_queue.len())
    }

    /// Per-frame reclamation step.
    ///
    /// Every collect interval the back queue is flushed and the queues are
    /// swapped. Every sweep interval the orphanages are swept.
    pub fn collect(&mut self) {
        self.frame += 1;
        if self.frame % self.config.collect_interval == 0 {
            self.flush_back_queue();
            mem::swap(&mut self.front_queue, &mut self.back_queue);
        }
        if self.frame % self.config.sweep_interval == 0 {
            self.sweep();
        }
    }

    /// Release everything now: sweep both orphanages and flush both queues.
    pub fn force_collect(&mut self) {
        self.sweep();
        self.flush_back_queue();
        mem::swap(&mut self.front_queue, &mut self.back_queue);
        self.flush_back_queue();
        debug!("force collect: {}", self.stats);
    }

    fn flush_back_queue(&mut self) {
        if self.back_queue.is_empty() {
            return;
        }
        let count = self.back_queue.len();
        for mut resource in self.back_queue.drain(..) {
            resource.release();
        }
        self.stats.queue_flushes += 1;
        self.stats.resources_released += count as u64;
        debug!("released {} queued resource(s)", count);
    }

    fn sweep(&mut self) {
        self.sweep_orphanage(self.orphanage);
        self.sweep_orphanage(self.snapshot_orphanage);

        let proxies = self.proxy_queue.len();
        self.proxy_queue.clear();
        self.stats.sweeps += 1;
        debug!("sweep released {} proxy handle(s); {}", proxies, self.stats);
    }

    fn sweep_orphanage(&mut self, orphanage: NodeId) {
        while let Some(child) = self.tree.release(orphanage, 0) {
            for node in self.tree.subtree_post_order(child) {
                if let Some(proxy) = self.tree.finalize_self(node) {
                    self.proxy_queue.push(proxy);
                    self.stats.proxies_finalized += 1;
                }
                self.listeners.remove(node);
            }
            for (_, mut object) in self.tree.destroy(child) {
                if let NodeKind::Shape(shape) = &mut object.kind {
                    self.front_queue.extend(shape.take_resources());
                }
            }
        }
    }

    // -- rendering -----------------------------------------------------------

    /// Transform, prepare and draw the current stage, then the overlay.
    ///
    /// Skipped, returning false, while the scene is valid: nothing was
    /// invalidated since the last frame, no updatable is active and the
    /// draw mode is the default.
    pub fn render(&mut self, renderer: &mut dyn Renderer) -> bool {
        if self.is_valid
            && !self.tree.is_content_dirty()
            && self.active_updatables == 0
            && self.draw_mode == DrawMode::Default
        {
            self.stats.frames_skipped += 1;
            trace!("frame skipped");
            return false;
        }

        let frustum = self.display.frustum();
        renderer.begin_frame(&frustum, self.draw_mode);
        renderer.clear(self.config.clear_color);

        let mut outcome = self.render_stage(self.current, &Matrix::IDENTITY, renderer);
        if !self.tree.children(self.overlay).is_empty() {
            let overlay_transform = self.overlay_transform;
            let overlay = self.render_stage(self.overlay, &overlay_transform, renderer);
            outcome.drawn += overlay.drawn;
            outcome.time_dependent |= overlay.time_dependent;
        }

        renderer.end_frame();
        self.tree.clear_content_dirty();
        self.is_valid = !outcome.time_dependent;
        self.stats.frames_rendered += 1;
        true
    }

    /// [`Scene::render`] followed by [`Scene::collect`].
    pub fn tick(&mut self, renderer: &mut dyn Renderer) -> bool {
        let rendered = self.render(renderer);
        self.collect();
        rendered
    }

    /// Draw the offscreen stage clipped to `bounds`, culling against
    /// `bounds` instead of the screen.
    pub fn render_offscreen(&mut self, renderer: &mut dyn Renderer, bounds: Rect) -> DrawOutcome {
        self.set_snapshot_bounds(Some(bounds));

        let mut frustum = Display::new(bounds.width, bounds.height).frustum();
        frustum.view = Matrix::translate(-bounds.x, -bounds.y);
        renderer.begin_frame(&frustum, self.draw_mode);
        renderer.clear(Color::TRANSPARENT);
        let outcome = self.render_stage(self.offscreen, &Matrix::IDENTITY, renderer);
        renderer.end_frame();

        self.set_snapshot_bounds(None);
        outcome
    }

    fn set_snapshot_bounds(&mut self, bounds: Option<Rect>) {
        if let Some(data) = self
            .tree
            .get_mut(self.offscreen)
            .and_then(|s| s.stage_data_mut())
        {
            data.snapshot_bounds = bounds;
        }
    }

    fn render_stage(
        &mut self,
        stage: NodeId,
        root_to_dst: &Matrix,
        renderer: &mut dyn Renderer,
    ) -> DrawOutcome {
        let mut ctx = UpdateContext::new(self.display.screen_content_bounds());
        self.tree.update_transform(stage, root_to_dst, &mut ctx);
        self.stats.offscreen_transitions += ctx.offscreen_transitions as u64;
        self.tree.prepare(stage, &self.display);
        self.tree.draw(stage, renderer)
    }
}

impl Drop for Scene {
    fn drop(&mut self) {
        self.force_collect();
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new(SceneConfig::default())
    }
}
