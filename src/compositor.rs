use crate::{
    animation::{AnimationScheduler, FrameClock, VisualState},
    assets::{ImageStatus, ImageStore},
    camera::CameraController,
    content::{self, ContentCache, MarkupRenderer},
    foundation::{
        core::{Rgba8, ViewportSize},
        error::{StageError, StageResult},
    },
    layout::{CullDecision, PixelRect, TransformResolver, cull, project},
    render::{
        backend::{CanvasSurface, ElementStyle, OverlayHost},
        grid::{GridStyle, draw_grid},
        vector::{VectorDraw, VectorKind, draw_vector},
    },
    scene::model::{Node, NodeContent, Scene, Space},
};

/// Per-frame editor state and rendering switches.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct FrameOptions {
    /// Fade canvas primitives so overlay editing stands out.
    pub dim_canvas_nodes: bool,
    pub selected: Option<String>,
    pub animations_enabled: bool,
    pub background: Rgba8,
    pub grid: Option<GridStyle>,
}

impl Default for FrameOptions {
    fn default() -> Self {
        Self {
            dim_canvas_nodes: false,
            selected: None,
            animations_enabled: true,
            background: Rgba8::new(0, 0, 0, 255),
            grid: Some(GridStyle::default()),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FrameStats {
    pub overlay_elements: usize,
    pub vectors: usize,
    pub hidden: usize,
    pub culled_offscreen: usize,
    pub culled_degenerate: usize,
    pub grid_lines: usize,
    pub content_updates: usize,
    pub camera_moving: bool,
}

/// Read-only inputs for one frame.
#[derive(Clone, Copy)]
pub struct FrameInput<'a> {
    pub scene: &'a Scene,
    pub viewport: ViewportSize,
    pub now_ms: f64,
    pub opts: &'a FrameOptions,
    pub renderer: &'a dyn MarkupRenderer,
}

/// The two drawing targets of a frame.
pub struct FrameTargets<'a, C, O> {
    pub canvas: &'a mut C,
    pub overlay: &'a mut O,
}

struct Planned<'a> {
    z: usize,
    node: &'a Node,
    rect: PixelRect,
    visual: VisualState,
    /// Authored units to pixels.
    scale: f64,
}

/// Canvas primitives take no mask, so a directional reveal becomes a plain fade.
fn vector_opacity(visual: &VisualState) -> f64 {
    visual.opacity * visual.mask.map_or(1.0, |m| m.revealed())
}

/// Per-frame driver: owns the animation and content side tables.
#[derive(Debug, Default)]
pub struct Compositor {
    scheduler: AnimationScheduler,
    content: ContentCache,
}

impl Compositor {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn scheduler(&self) -> &AnimationScheduler {
        &self.scheduler
    }

    pub fn scheduler_mut(&mut self) -> &mut AnimationScheduler {
        &mut self.scheduler
    }

    pub fn content_cache_mut(&mut self) -> &mut ContentCache {
        &mut self.content
    }

    /// Render one frame.
    ///
    /// Canvas primitives are drawn before overlay elements are repositioned, so overlay
    /// content always stacks above them.
    #[tracing::instrument(skip_all, fields(now_ms = input.now_ms))]
    pub fn render_frame<C, O>(
        &mut self,
        input: FrameInput<'_>,
        camera: &mut CameraController,
        targets: FrameTargets<'_, C, O>,
        images: &mut ImageStore,
    ) -> StageResult<FrameStats>
    where
        C: CanvasSurface,
        O: OverlayHost,
    {
        if !input.now_ms.is_finite() {
            return Err(StageError::validation(format!(
                "frame time must be finite, got {}",
                input.now_ms
            )));
        }
        let FrameTargets { canvas, overlay } = targets;
        let opts = input.opts;
        let viewport = input.viewport;
        let mut stats = FrameStats::default();

        canvas.begin_frame(viewport, opts.background)?;
        stats.camera_moving = camera.advance(input.now_ms);
        let cam = camera.camera();
        if let Some(grid) = &opts.grid {
            stats.grid_lines = draw_grid(&mut *canvas, &cam, viewport, grid)?;
        }

        let clock = FrameClock {
            now_ms: input.now_ms,
            animations_enabled: opts.animations_enabled,
            default_steps: input.scene.defaults.pixelate_steps,
        };
        let mut resolver = TransformResolver::new(&input.scene.nodes);
        let mut planned = Vec::with_capacity(input.scene.nodes.len());

        for (idx, node) in input.scene.nodes.iter().enumerate() {
            if !node.visible {
                overlay.hide(&node.id);
                self.scheduler.clear(&node.id);
                stats.hidden += 1;
                continue;
            }
            let resolved = resolver.resolve(idx);
            let rect = project(&resolved, node.space, &cam, viewport);
            let decision = cull(&rect, viewport);
            match decision {
                CullDecision::Visible => {}
                CullDecision::Degenerate | CullDecision::Offscreen => {
                    overlay.hide(&node.id);
                    self.scheduler.settle_unseen_exit(node, clock);
                    if decision == CullDecision::Degenerate {
                        stats.culled_degenerate += 1;
                    } else {
                        stats.culled_offscreen += 1;
                    }
                    continue;
                }
            }
            let ready = match node.content.image_src() {
                None => true,
                Some(src) => {
                    images.request(src);
                    !matches!(images.status(src), Some(ImageStatus::Pending))
                }
            };
            let visual = self.scheduler.evaluate(node, ready, clock);
            let scale = match node.space {
                Space::World => cam.zoom,
                Space::Screen => 1.0,
            };
            planned.push(Planned {
                z: idx,
                node,
                rect,
                visual,
                scale,
            });
        }

        for p in planned.iter().filter(|p| p.node.content.is_vector()) {
            overlay.hide(&p.node.id);
            let opacity = vector_opacity(&p.visual);
            if !(opacity > 0.0) {
                continue;
            }
            let (kind, style) = match &p.node.content {
                NodeContent::Line(style) => (VectorKind::Line, style),
                NodeContent::Arrow(style) => (VectorKind::Arrow, style),
                _ => continue,
            };
            let selected = opts.selected.as_deref() == Some(p.node.id.as_str());
            draw_vector(
                &mut *canvas,
                &VectorDraw {
                    kind,
                    style,
                    rect: p.rect,
                    scale: p.scale,
                    opacity,
                    dimmed: opts.dim_canvas_nodes && !selected,
                    selected,
                },
            )?;
            stats.vectors += 1;
        }
        canvas.end_frame()?;

        for p in planned.iter().filter(|p| !p.node.content.is_vector()) {
            let id = p.node.id.as_str();
            if !overlay.is_attached(id) {
                overlay.attach(id, p.node.content.type_name());
            }
            let background = match p.node.style.background() {
                Ok(bg) => bg,
                Err(err) => {
                    tracing::warn!(node = id, %err, "ignoring invalid background");
                    None
                }
            };
            overlay.apply_style(
                id,
                &ElementStyle {
                    rect: p.rect,
                    opacity: p.visual.opacity,
                    mask: p.visual.mask,
                    background,
                    border_radius: p.node.style.border_radius.unwrap_or(0.0) * p.scale,
                    z: p.z,
                },
            );
            let source = p
                .node
                .content
                .image_src()
                .and_then(|src| images.get(src))
                .map(|img| img.as_ref());
            overlay.set_pixelation(id, p.visual.pixelation, source)?;

            if let Some(raw) = content::content_source(&p.node.content) {
                let fp = content::fingerprint(p.node.content.type_name(), &raw);
                if !self.content.is_current(id, fp) {
                    overlay.set_content(id, content::paint(&p.node.content, input.renderer));
                    self.content.record(id, fp);
                    stats.content_updates += 1;
                }
            }
            stats.overlay_elements += 1;
        }

        tracing::debug!(?stats, "frame rendered");
        Ok(stats)
    }
}
