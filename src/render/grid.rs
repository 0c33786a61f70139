use crate::{
    camera::Camera,
    foundation::{
        core::{Point, Rgba8, ViewportSize},
        error::StageResult,
        math::smoothstep,
    },
    render::backend::CanvasSurface,
};

/// Caps line count per level when zoomed far out on a huge viewport.
const MAX_LINES_PER_AXIS: usize = 400;

#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GridStyle {
    pub color: Rgba8,
    pub line_width_px: f64,
    /// Screen spacing the coarse level reaches just before a new finer level takes over.
    pub target_spacing_px: f64,
}

impl Default for GridStyle {
    fn default() -> Self {
        Self {
            color: Rgba8::new(255, 255, 255, 20),
            line_width_px: 1.0,
            target_spacing_px: 800.0,
        }
    }
}

/// The two grid levels on screen for a zoom, as `(world_spacing, alpha)` pairs.
///
/// Spacings are powers of ten; the finer level fades out with a smoothstep of the fractional
/// log-zoom while the coarser one stays solid.
pub fn grid_levels(zoom: f64, style: &GridStyle) -> [(f64, f64); 2] {
    let l = (style.target_spacing_px / zoom).log10();
    let base = l.floor();
    let frac = l - base;
    let fine = 10f64.powf(base - 1.0);
    [
        (fine, 1.0 - smoothstep(0.0, 1.0, frac)),
        (fine * 10.0, 1.0),
    ]
}

/// Draw the adaptive background grid. Returns the number of lines drawn.
pub fn draw_grid(
    canvas: &mut dyn CanvasSurface,
    camera: &Camera,
    viewport: ViewportSize,
    style: &GridStyle,
) -> StageResult<usize> {
    let visible = camera.visible_world_rect(viewport);
    let mut drawn = 0;
    for (spacing, alpha) in grid_levels(camera.zoom, style) {
        if alpha <= 0.0 || !(spacing > 0.0) {
            continue;
        }
        let opacity = alpha as f32;

        let x0 = (visible.x0 / spacing).floor() as i64;
        let x1 = (visible.x1 / spacing).ceil() as i64;
        for i in (x0..=x1).take(MAX_LINES_PER_AXIS) {
            let sx = camera
                .world_to_screen(Point::new(i as f64 * spacing, 0.0), viewport)
                .x;
            canvas.stroke_line(
                Point::new(sx, 0.0),
                Point::new(sx, viewport.height),
                style.line_width_px,
                style.color,
                opacity,
            )?;
            drawn += 1;
        }

        let y0 = (visible.y0 / spacing).floor() as i64;
        let y1 = (visible.y1 / spacing).ceil() as i64;
        for j in (y0..=y1).take(MAX_LINES_PER_AXIS) {
            let sy = camera
                .world_to_screen(Point::new(0.0, j as f64 * spacing), viewport)
                .y;
            canvas.stroke_line(
                Point::new(0.0, sy),
                Point::new(viewport.width, sy),
                style.line_width_px,
                style.color,
                opacity,
            )?;
            drawn += 1;
        }
    }
    Ok(drawn)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::foundation::core::BezPath;

    #[derive(Default)]
    struct CountingCanvas {
        fills: usize,
    }

    impl CanvasSurface for CountingCanvas {
        fn begin_frame(&mut self, _: ViewportSize, _: Rgba8) -> StageResult<()> {
            Ok(())
        }
        fn fill_path(&mut self, _: &BezPath, _: Rgba8, _: f32) -> StageResult<()> {
            self.fills += 1;
            Ok(())
        }
        fn end_frame(&mut self) -> StageResult<()> {
            Ok(())
        }
    }

    #[test]
    fn levels_are_powers_of_ten() {
        let style = GridStyle::default();
        let [(fine, fine_alpha), (coarse, coarse_alpha)] = grid_levels(1.0, &style);
        // log10(800) = 2.903: fine 10, coarse 100, fine almost faded out.
        assert!((fine - 10.0).abs() < 1e-9);
        assert!((coarse - 100.0).abs() < 1e-9);
        assert!(fine_alpha < 0.05);
        assert_eq!(coarse_alpha, 1.0);
    }

    #[test]
    fn fine_level_fades_continuously_across_decades() {
        let style = GridStyle::default();
        // Just below and just above a decade boundary the visible structure matches.
        let below = grid_levels(8.0 * 1.0001, &style);
        let above = grid_levels(8.0 / 1.0001, &style);
        assert!((below[1].0 - above[0].0).abs() < 1e-9);
        assert!(below[0].1 < 0.01 || above[0].1 > 0.99);
    }

    #[test]
    fn draws_lines_across_viewport() {
        let mut canvas = CountingCanvas::default();
        let vp = ViewportSize::new(800.0, 600.0).unwrap();
        let n = draw_grid(&mut canvas, &Camera::default(), vp, &GridStyle::default()).unwrap();
        assert_eq!(n, canvas.fills);
        // Coarse 100-unit lines: 9 or 10 columns and 7 rows at zoom 1, plus the fine level.
        assert!(n >= 16);
        assert!(n <= 4 * MAX_LINES_PER_AXIS);
    }
}
