//! zoomstage renders a pannable, zoomable 2D scene of positioned nodes.
//!
//! Each [`Stage::tick`] runs one frame:
//!
//! 1. **Camera**: advance any eased view transition.
//! 2. **Resolve**: compose parent chains into per-node geometry ([`TransformResolver`]).
//! 3. **Project and cull**: map to viewport pixels and skip what cannot be seen.
//! 4. **Animate**: sample enter/exit effects per node ([`AnimationScheduler`]).
//! 5. **Draw**: grid and vector nodes on the canvas, everything else as overlay elements.
//!
//! The default backends are CPU-only: [`CpuCanvas`] for the canvas and [`RetainedOverlay`] for
//! the element layer. [`Stage::snapshot`] flattens both into premultiplied RGBA8.
#![forbid(unsafe_code)]

pub mod animation;
pub mod assets;
pub mod camera;
pub mod compositor;
pub mod content;
pub mod foundation;
pub mod layout;
pub mod render;
pub mod scene;
pub mod stage;

pub use animation::{AnimEffect, AnimationScheduler, Ease, RevealMask, VisualState, parse_anim};
pub use assets::{ImageStatus, ImageStore};
pub use camera::{Camera, CameraController, PointerTarget};
pub use compositor::{Compositor, FrameOptions, FrameStats};
pub use content::{MarkupRenderer, PlainText};
pub use foundation::core::{Affine, BezPath, Point, Rect, Rgba8, Vec2, ViewportSize};
pub use foundation::error::{StageError, StageResult};
pub use layout::{CullDecision, PixelRect, ResolvedTransform, TransformResolver};
pub use render::{CanvasSurface, CpuCanvas, FrameRGBA, GridStyle, OverlayHost, RetainedOverlay};
pub use scene::model::{Anchor, LocalTransform, Node, NodeContent, Scene, Space, View};
pub use stage::{Stage, StageOpts, TickOutcome};
