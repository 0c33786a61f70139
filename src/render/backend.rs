use crate::{
    animation::{Pixelation, RevealMask},
    foundation::{
        core::{BezPath, Point, Rgba8, ViewportSize},
        error::StageResult,
    },
    layout::PixelRect,
};

/// Immediate-mode drawing target, cleared and redrawn every frame.
pub trait CanvasSurface {
    fn begin_frame(&mut self, viewport: ViewportSize, background: Rgba8) -> StageResult<()>;

    /// Fill a path given in device pixels.
    fn fill_path(&mut self, path: &BezPath, color: Rgba8, opacity: f32) -> StageResult<()>;

    /// A straight line segment with butt caps.
    fn stroke_line(
        &mut self,
        from: Point,
        to: Point,
        width: f64,
        color: Rgba8,
        opacity: f32,
    ) -> StageResult<()> {
        let dir = to - from;
        let len = dir.hypot();
        if !(len > 0.0) || !(width > 0.0) {
            return Ok(());
        }
        let n = dir.turn_90() * (width / 2.0 / len);
        let mut path = BezPath::new();
        path.move_to(from + n);
        path.line_to(to + n);
        path.line_to(to - n);
        path.line_to(from - n);
        path.close_path();
        self.fill_path(&path, color, opacity)
    }

    fn end_frame(&mut self) -> StageResult<()>;
}

/// Everything the compositor writes to an overlay element's style each frame.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ElementStyle {
    pub rect: PixelRect,
    pub opacity: f64,
    pub mask: Option<RevealMask>,
    pub background: Option<Rgba8>,
    /// Corner radius in device pixels.
    pub border_radius: f64,
    /// Stacking order; model order of the node.
    pub z: usize,
}

/// Content placed in an element's slot.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum ElementContent {
    #[default]
    Empty,
    Markup {
        html: String,
    },
    Image {
        src: String,
    },
}

/// Retained layer of positioned elements drawn above the canvas.
pub trait OverlayHost {
    type Element;

    fn is_attached(&self, id: &str) -> bool;

    fn attach(&mut self, id: &str, kind: &str);

    /// Keep the element but stop showing it.
    fn hide(&mut self, id: &str);

    fn apply_style(&mut self, id: &str, style: &ElementStyle);

    /// Update the pixelated rendition of an element. `source` is its decoded image, when
    /// available.
    fn set_pixelation(
        &mut self,
        id: &str,
        pixelation: Option<Pixelation>,
        source: Option<&image::RgbaImage>,
    ) -> StageResult<()>;

    fn set_content(&mut self, id: &str, content: ElementContent);

    /// Replace the stage with a visible error message.
    fn show_diagnostic(&mut self, message: &str);

    fn element(&self, id: &str) -> Option<&Self::Element>;
}
