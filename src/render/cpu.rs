use crate::{
    foundation::{
        core::{Affine, BezPath, Point, Rgba8, ViewportSize},
        error::{StageError, StageResult},
    },
    render::{FrameRGBA, backend::CanvasSurface},
};

/// [`CanvasSurface`] rasterized on the CPU with `vello_cpu`.
pub struct CpuCanvas {
    width: u16,
    height: u16,
    pixmap: vello_cpu::Pixmap,
    /// Context of the frame in progress.
    ctx: Option<vello_cpu::RenderContext>,
    /// Finished context, reset and reused by the next frame of the same size.
    spare: Option<vello_cpu::RenderContext>,
}

impl Default for CpuCanvas {
    fn default() -> Self {
        Self::new()
    }
}

impl CpuCanvas {
    pub fn new() -> Self {
        Self {
            width: 1,
            height: 1,
            pixmap: vello_cpu::Pixmap::new(1, 1),
            ctx: None,
            spare: None,
        }
    }

    pub fn width(&self) -> u32 {
        u32::from(self.width)
    }

    pub fn height(&self) -> u32 {
        u32::from(self.height)
    }

    /// Premultiplied RGBA8 pixels of the last finished frame.
    pub fn pixels(&self) -> &[u8] {
        self.pixmap.data_as_u8_slice()
    }

    pub fn frame(&self) -> FrameRGBA {
        FrameRGBA {
            width: self.width(),
            height: self.height(),
            data: self.pixels().to_vec(),
            premultiplied: true,
        }
    }

    fn ctx(&mut self) -> StageResult<&mut vello_cpu::RenderContext> {
        self.ctx
            .as_mut()
            .ok_or_else(|| StageError::render("canvas draw outside begin_frame/end_frame"))
    }
}

impl CanvasSurface for CpuCanvas {
    fn begin_frame(&mut self, viewport: ViewportSize, background: Rgba8) -> StageResult<()> {
        let (w, h) = viewport.pixel_dims();
        let width: u16 = w
            .try_into()
            .map_err(|_| StageError::render("viewport width exceeds u16"))?;
        let height: u16 = h
            .try_into()
            .map_err(|_| StageError::render("viewport height exceeds u16"))?;
        if width != self.width || height != self.height {
            self.width = width;
            self.height = height;
            self.pixmap = vello_cpu::Pixmap::new(width, height);
        }

        let mut ctx = match self.spare.take().or_else(|| self.ctx.take()) {
            Some(mut ctx) if ctx.width() == width && ctx.height() == height => {
                ctx.reset();
                ctx
            }
            _ => vello_cpu::RenderContext::new(width, height),
        };
        ctx.set_transform(vello_cpu::kurbo::Affine::IDENTITY);
        ctx.set_paint(color_to_cpu(background));
        ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
            0.0,
            0.0,
            f64::from(width),
            f64::from(height),
        ));
        self.ctx = Some(ctx);
        Ok(())
    }

    fn fill_path(&mut self, path: &BezPath, color: Rgba8, opacity: f32) -> StageResult<()> {
        let opacity = opacity.clamp(0.0, 1.0);
        if opacity <= 0.0 || color.a == 0 {
            return Ok(());
        }
        let ctx = self.ctx()?;
        ctx.set_transform(affine_to_cpu(Affine::IDENTITY));
        ctx.set_paint(color_to_cpu(color));
        if opacity < 1.0 {
            ctx.push_opacity_layer(opacity);
        }
        ctx.fill_path(&bezpath_to_cpu(path));
        if opacity < 1.0 {
            ctx.pop_layer();
        }
        Ok(())
    }

    fn end_frame(&mut self) -> StageResult<()> {
        let mut ctx = self
            .ctx
            .take()
            .ok_or_else(|| StageError::render("end_frame without begin_frame"))?;
        ctx.flush();
        ctx.render_to_pixmap(&mut self.pixmap);
        self.spare = Some(ctx);
        Ok(())
    }
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn point_to_cpu(p: Point) -> vello_cpu::kurbo::Point {
    vello_cpu::kurbo::Point::new(p.x, p.y)
}

fn bezpath_to_cpu(path: &BezPath) -> vello_cpu::kurbo::BezPath {
    use kurbo::PathEl;

    let mut out = vello_cpu::kurbo::BezPath::new();
    for &el in path.elements() {
        match el {
            PathEl::MoveTo(p) => out.move_to(point_to_cpu(p)),
            PathEl::LineTo(p) => out.line_to(point_to_cpu(p)),
            PathEl::QuadTo(p1, p2) => out.quad_to(point_to_cpu(p1), point_to_cpu(p2)),
            PathEl::CurveTo(p1, p2, p3) => {
                out.curve_to(point_to_cpu(p1), point_to_cpu(p2), point_to_cpu(p3));
            }
            PathEl::ClosePath => out.close_path(),
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::Rect;
    use kurbo::Shape;

    fn px(canvas: &CpuCanvas, x: u32, y: u32) -> [u8; 4] {
        let idx = ((y * canvas.width() + x) * 4) as usize;
        let d = canvas.pixels();
        [d[idx], d[idx + 1], d[idx + 2], d[idx + 3]]
    }

    #[test]
    fn clears_to_background_and_fills() {
        let mut canvas = CpuCanvas::new();
        let vp = ViewportSize::new(16.0, 16.0).unwrap();
        canvas.begin_frame(vp, Rgba8::new(0, 0, 0, 255)).unwrap();
        let rect = Rect::new(4.0, 4.0, 12.0, 12.0);
        canvas
            .fill_path(&rect.to_path(0.1), Rgba8::new(255, 0, 0, 255), 1.0)
            .unwrap();
        canvas.end_frame().unwrap();

        assert_eq!((canvas.width(), canvas.height()), (16, 16));
        assert_eq!(px(&canvas, 0, 0), [0, 0, 0, 255]);
        assert_eq!(px(&canvas, 8, 8), [255, 0, 0, 255]);
    }

    #[test]
    fn frame_is_redrawn_from_scratch() {
        let mut canvas = CpuCanvas::new();
        let vp = ViewportSize::new(8.0, 8.0).unwrap();
        canvas.begin_frame(vp, Rgba8::new(0, 0, 0, 255)).unwrap();
        canvas
            .fill_path(&vp.rect().to_path(0.1), Rgba8::WHITE, 1.0)
            .unwrap();
        canvas.end_frame().unwrap();
        canvas.begin_frame(vp, Rgba8::new(0, 0, 255, 255)).unwrap();
        canvas.end_frame().unwrap();
        assert_eq!(px(&canvas, 3, 3), [0, 0, 255, 255]);
    }

    #[test]
    fn drawing_outside_a_frame_is_an_error() {
        let mut canvas = CpuCanvas::new();
        let err = canvas
            .fill_path(&BezPath::new(), Rgba8::WHITE, 1.0)
            .unwrap_err();
        assert!(err.to_string().starts_with("render error:"));
        assert!(canvas.end_frame().is_err());
    }

    #[test]
    fn stroke_line_covers_its_span() {
        let mut canvas = CpuCanvas::new();
        let vp = ViewportSize::new(20.0, 20.0).unwrap();
        canvas.begin_frame(vp, Rgba8::new(0, 0, 0, 255)).unwrap();
        canvas
            .stroke_line(
                Point::new(2.0, 10.0),
                Point::new(18.0, 10.0),
                4.0,
                Rgba8::WHITE,
                1.0,
            )
            .unwrap();
        canvas.end_frame().unwrap();
        assert_eq!(px(&canvas, 10, 10), [255, 255, 255, 255]);
        assert_eq!(px(&canvas, 10, 2), [0, 0, 0, 255]);
    }
}
