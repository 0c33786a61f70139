use serde_json::Value;

use crate::{
    animation::AnimationScheduler,
    assets::ImageStore,
    camera::{Camera, CameraController, PointerTarget},
    compositor::{Compositor, FrameInput, FrameOptions, FrameStats, FrameTargets},
    content::{self, MarkupRenderer, PlainText},
    foundation::{
        core::{Point, Rgba8, ViewportSize},
        error::{StageError, StageResult},
    },
    render::{
        FrameRGBA,
        backend::{CanvasSurface, ElementContent, OverlayHost},
        cpu::CpuCanvas,
        grid::GridStyle,
        overlay::RetainedOverlay,
        raster::rasterize_overlay,
    },
    scene::{model::Scene, patch},
};

/// Largest viewport edge the stage accepts, in pixels.
pub const MAX_VIEWPORT_PX: f64 = 16384.0;

#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StageOpts {
    pub width: f64,
    pub height: f64,
    pub interactive: bool,
    pub animations_enabled: bool,
    pub background: Rgba8,
    pub grid: Option<GridStyle>,
}

impl Default for StageOpts {
    fn default() -> Self {
        let frame = FrameOptions::default();
        Self {
            width: 1280.0,
            height: 720.0,
            interactive: true,
            animations_enabled: frame.animations_enabled,
            background: frame.background,
            grid: frame.grid,
        }
    }
}

impl StageOpts {
    /// Default options with the viewport set to the scene's design resolution.
    pub fn for_scene(scene: &Scene) -> Self {
        Self {
            width: scene.defaults.design_width,
            height: scene.defaults.design_height,
            ..Self::default()
        }
    }
}

fn checked_viewport(width: f64, height: f64) -> StageResult<ViewportSize> {
    if width > MAX_VIEWPORT_PX || height > MAX_VIEWPORT_PX {
        return Err(StageError::init(format!(
            "viewport {width}x{height} exceeds {MAX_VIEWPORT_PX} px"
        )));
    }
    ViewportSize::new(width, height).map_err(|_| {
        StageError::init(format!("viewport must be at least 1x1 pixels, got {width}x{height}"))
    })
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase", tag = "outcome")]
pub enum TickOutcome {
    Rendered(FrameStats),
    /// A previous tick failed; the stage no longer renders.
    Halted,
}

/// A scene bound to a camera, drawing targets and per-node animation state.
///
/// Drive it by calling [`Stage::tick`] once per display frame.
pub struct Stage<C = CpuCanvas, O = RetainedOverlay> {
    scene: Scene,
    viewport: ViewportSize,
    camera: CameraController,
    compositor: Compositor,
    frame_opts: FrameOptions,
    canvas: C,
    overlay: O,
    images: ImageStore,
    renderer: Box<dyn MarkupRenderer>,
    halted: Option<String>,
    last_stats: Option<FrameStats>,
}

impl Stage {
    pub fn new(scene: Scene, opts: StageOpts) -> StageResult<Self> {
        Self::with_backends(scene, opts, CpuCanvas::new(), RetainedOverlay::new())
    }
}

impl<C: CanvasSurface, O: OverlayHost> Stage<C, O> {
    pub fn with_backends(scene: Scene, opts: StageOpts, canvas: C, overlay: O) -> StageResult<Self> {
        let viewport = checked_viewport(opts.width, opts.height)?;
        scene.validate()?;

        let initial_camera = scene
            .initial_view_id
            .as_deref()
            .and_then(|id| scene.view(id))
            .map_or_else(Camera::default, |v| v.camera);
        let mut camera = CameraController::new(initial_camera);
        camera.set_interactive(opts.interactive);

        tracing::debug!(
            nodes = scene.nodes.len(),
            views = scene.views.len(),
            width = viewport.width,
            height = viewport.height,
            "stage created"
        );
        Ok(Self {
            scene,
            viewport,
            camera,
            compositor: Compositor::new(),
            frame_opts: FrameOptions {
                animations_enabled: opts.animations_enabled,
                background: opts.background,
                grid: opts.grid,
                ..FrameOptions::default()
            },
            canvas,
            overlay,
            images: ImageStore::new(),
            renderer: Box::new(PlainText),
            halted: None,
            last_stats: None,
        })
    }

    /// Render one frame at `now_ms`.
    ///
    /// Any error halts the stage: it is logged, shown as an overlay diagnostic, and later
    /// ticks do nothing.
    #[tracing::instrument(skip(self))]
    pub fn tick(&mut self, now_ms: f64) -> TickOutcome {
        if self.halted.is_some() {
            return TickOutcome::Halted;
        }
        self.settle_exits();
        let result = self.compositor.render_frame(
            FrameInput {
                scene: &self.scene,
                viewport: self.viewport,
                now_ms,
                opts: &self.frame_opts,
                renderer: self.renderer.as_ref(),
            },
            &mut self.camera,
            FrameTargets {
                canvas: &mut self.canvas,
                overlay: &mut self.overlay,
            },
            &mut self.images,
        );
        match result {
            Ok(stats) => {
                self.last_stats = Some(stats);
                TickOutcome::Rendered(stats)
            }
            Err(err) => {
                self.halt(&err);
                TickOutcome::Halted
            }
        }
    }

    fn halt(&mut self, err: &StageError) {
        let message = err.to_string();
        tracing::error!(error = %message, "stage halted");
        self.overlay.show_diagnostic(&message);
        self.halted = Some(message);
    }

    /// Hide nodes whose exit animation has finished and clear their exit mark.
    fn settle_exits(&mut self) {
        let scheduler = self.compositor.scheduler();
        for node in &mut self.scene.nodes {
            let Some(marker) = node.exit_start_ms else {
                continue;
            };
            if node.visible && scheduler.exit_done(&node.id, marker) {
                tracing::debug!(node = %node.id, "exit settled");
                node.visible = false;
                node.exit_start_ms = None;
            }
        }
    }

    pub fn is_halted(&self) -> bool {
        self.halted.is_some()
    }

    pub fn halt_reason(&self) -> Option<&str> {
        self.halted.as_deref()
    }

    pub fn last_stats(&self) -> Option<FrameStats> {
        self.last_stats
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn camera(&self) -> Camera {
        self.camera.camera()
    }

    pub fn viewport(&self) -> ViewportSize {
        self.viewport
    }

    pub fn resize(&mut self, width: f64, height: f64) -> StageResult<()> {
        self.viewport = checked_viewport(width, height)?;
        Ok(())
    }

    /// Direct camera write; cancels any running transition.
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera.set(camera);
    }

    pub fn transition_camera(&mut self, to: Camera, duration_ms: f64, now_ms: f64) {
        self.camera.transition_to(to, duration_ms, now_ms);
    }

    /// Show the view's nodes, send the rest off (animated when they have a `disappear`
    /// spec) and move the camera there.
    pub fn go_to_view(&mut self, view_id: &str, now_ms: f64) -> StageResult<()> {
        let view = self
            .scene
            .view(view_id)
            .cloned()
            .ok_or_else(|| StageError::validation(format!("unknown view '{view_id}'")))?;
        let animate = self.frame_opts.animations_enabled;
        for node in &mut self.scene.nodes {
            if view.show.iter().any(|id| *id == node.id) {
                node.visible = true;
                node.exit_start_ms = None;
            } else if node.visible && node.exit_start_ms.is_none() {
                if animate && node.disappear.is_some() {
                    node.exit_start_ms = Some(now_ms);
                } else {
                    node.visible = false;
                }
            }
        }
        let duration = view
            .transition_ms
            .unwrap_or(self.scene.defaults.view_transition_ms);
        tracing::debug!(view = view_id, duration, "going to view");
        self.camera.transition_to(view.camera, duration, now_ms);
        Ok(())
    }

    /// Start `id`'s exit at `now_ms`. Nodes without a `disappear` spec are hidden at once.
    pub fn mark_exit(&mut self, id: &str, now_ms: f64) -> StageResult<()> {
        let node = self
            .scene
            .node_mut(id)
            .ok_or_else(|| StageError::validation(format!("unknown node '{id}'")))?;
        if node.disappear.is_some() {
            node.exit_start_ms = Some(now_ms);
        } else {
            node.visible = false;
            node.exit_start_ms = None;
        }
        Ok(())
    }

    /// Merge a JSON patch into node `id`. The scene is left unchanged if the result does not
    /// validate.
    pub fn patch_node(&mut self, id: &str, patch: &Value) -> StageResult<()> {
        let idx = self
            .scene
            .nodes
            .iter()
            .position(|n| n.id == id)
            .ok_or_else(|| StageError::validation(format!("unknown node '{id}'")))?;
        let before = self.scene.nodes[idx].clone();
        patch::patch_node(&mut self.scene.nodes[idx], patch)?;
        if let Err(err) = self.scene.validate() {
            self.scene.nodes[idx] = before;
            return Err(err);
        }
        Ok(())
    }

    pub fn set_interactive(&mut self, interactive: bool) {
        self.camera.set_interactive(interactive);
    }

    pub fn set_animations_enabled(&mut self, enabled: bool) {
        self.frame_opts.animations_enabled = enabled;
    }

    /// Editor UI state for subsequent frames.
    pub fn set_editor_state(&mut self, dim_canvas_nodes: bool, selected: Option<String>) {
        self.frame_opts.dim_canvas_nodes = dim_canvas_nodes;
        self.frame_opts.selected = selected;
    }

    pub fn set_markup_renderer(&mut self, renderer: Box<dyn MarkupRenderer>) {
        self.renderer = renderer;
    }

    pub fn element(&self, id: &str) -> Option<&O::Element> {
        self.overlay.element(id)
    }

    pub fn overlay(&self) -> &O {
        &self.overlay
    }

    pub fn canvas(&self) -> &C {
        &self.canvas
    }

    pub fn scheduler(&self) -> &AnimationScheduler {
        self.compositor.scheduler()
    }

    /// Render `raw` into node `id`'s content slot unless the same raw content is already
    /// there. Returns whether the slot was written.
    pub fn hydrate_content(
        &mut self,
        id: &str,
        raw: &str,
        render: &dyn MarkupRenderer,
    ) -> StageResult<bool> {
        let node = self
            .scene
            .node(id)
            .ok_or_else(|| StageError::validation(format!("unknown node '{id}'")))?;
        let fp = content::fingerprint(node.content.type_name(), raw);
        let cache = self.compositor.content_cache_mut();
        if cache.is_current(id, fp) {
            return Ok(false);
        }
        if !self.overlay.is_attached(id) {
            self.overlay.attach(id, node.content.type_name());
        }
        self.overlay.set_content(
            id,
            ElementContent::Markup {
                html: render.render(raw),
            },
        );
        cache.record(id, fp);
        Ok(true)
    }

    pub fn pointer_down(&mut self, pos: Point, target: PointerTarget) {
        self.camera.pointer_down(pos, target);
    }

    pub fn pointer_move(&mut self, pos: Point) {
        self.camera.pointer_move(pos);
    }

    pub fn pointer_up(&mut self) {
        self.camera.pointer_up();
    }

    pub fn wheel(&mut self, cursor: Point, delta_y: f64) {
        self.camera.wheel(cursor, delta_y, self.viewport);
    }

    pub fn images(&self) -> &ImageStore {
        &self.images
    }

    pub fn images_mut(&mut self) -> &mut ImageStore {
        &mut self.images
    }
}

impl Stage<CpuCanvas, RetainedOverlay> {
    /// The last frame with overlay elements flattened on top of the canvas.
    pub fn snapshot(&self) -> StageResult<FrameRGBA> {
        let mut frame = self.canvas.frame();
        rasterize_overlay(&mut frame, &self.overlay, &self.images)?;
        Ok(frame)
    }
}
