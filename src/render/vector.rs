use std::f64::consts::PI;

use crate::{
    foundation::{
        core::{BezPath, Point, Rgba8},
        error::StageResult,
    },
    layout::PixelRect,
    render::backend::CanvasSurface,
    scene::model::VectorStyle,
};

const ARROW_ANGLE: f64 = PI / 7.0;
const SELECTION_GLOW: Rgba8 = Rgba8::new(80, 160, 255, 255);
const SELECTION_GLOW_OPACITY: f32 = 0.45;
const SELECTION_GLOW_PAD_PX: f64 = 6.0;
/// Opacity multiplier for canvas primitives while the editor dims them.
pub const DIMMED_OPACITY: f64 = 0.35;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VectorKind {
    Line,
    Arrow,
}

/// How a single line or arrow is drawn this frame.
#[derive(Clone, Copy, Debug)]
pub struct VectorDraw<'a> {
    pub kind: VectorKind,
    pub style: &'a VectorStyle,
    pub rect: PixelRect,
    /// Multiplier from authored stroke units to pixels.
    pub scale: f64,
    pub opacity: f64,
    pub dimmed: bool,
    pub selected: bool,
}

/// Endpoints of the segment: left-middle to right-middle of the node box, rotated with it.
pub fn endpoints(rect: &PixelRect) -> (Point, Point) {
    let m = rect.local_to_screen();
    (
        m * Point::new(0.0, rect.height / 2.0),
        m * Point::new(rect.width, rect.height / 2.0),
    )
}

fn arrowhead(tip: Point, angle: f64, size: f64) -> BezPath {
    let mut path = BezPath::new();
    path.move_to(tip);
    path.line_to(Point::new(
        tip.x - size * (angle - ARROW_ANGLE).cos(),
        tip.y - size * (angle - ARROW_ANGLE).sin(),
    ));
    path.line_to(Point::new(
        tip.x - size * (angle + ARROW_ANGLE).cos(),
        tip.y - size * (angle + ARROW_ANGLE).sin(),
    ));
    path.close_path();
    path
}

pub fn draw_vector(canvas: &mut dyn CanvasSurface, draw: &VectorDraw<'_>) -> StageResult<()> {
    let color = match Rgba8::parse_hex(&draw.style.stroke) {
        Ok(c) => c,
        Err(err) => {
            tracing::warn!(%err, "invalid stroke color; using white");
            Rgba8::WHITE
        }
    };
    let mut opacity = draw.opacity;
    if draw.dimmed {
        opacity *= DIMMED_OPACITY;
    }
    let opacity = opacity.clamp(0.0, 1.0) as f32;
    let width = (draw.style.stroke_width * draw.scale).max(1.0);
    let (a, b) = endpoints(&draw.rect);
    let angle = (b.y - a.y).atan2(b.x - a.x);
    let head = (draw.rect.height.abs() * 0.5).max(width * 3.0);

    let segment_end = match draw.kind {
        VectorKind::Line => b,
        // Stop the shaft inside the head so the tip stays sharp.
        VectorKind::Arrow => b - (b - a).normalize() * (head * ARROW_ANGLE.cos() * 0.5),
    };

    if draw.selected {
        canvas.stroke_line(
            a,
            b,
            width + SELECTION_GLOW_PAD_PX * 2.0,
            SELECTION_GLOW,
            SELECTION_GLOW_OPACITY * opacity.max(0.5),
        )?;
    }
    canvas.stroke_line(a, segment_end, width, color, opacity)?;
    if draw.kind == VectorKind::Arrow {
        canvas.fill_path(&arrowhead(b, angle, head), color, opacity)?;
    }
    Ok(())
}
