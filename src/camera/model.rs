use crate::foundation::core::{Point, Rect, ViewportSize};

pub const MIN_ZOOM: f64 = 0.02;
pub const MAX_ZOOM: f64 = 40.0;

/// Clamp a zoom factor into `[MIN_ZOOM, MAX_ZOOM]`.
///
/// Non-finite input never escapes: NaN maps to 1.0, infinities to the nearest bound.
pub fn clamp_zoom(z: f64) -> f64 {
    if z.is_nan() {
        return 1.0_f64.clamp(MIN_ZOOM, MAX_ZOOM);
    }
    z.clamp(MIN_ZOOM, MAX_ZOOM)
}

/// Camera looking at world point `(cx, cy)` with the given zoom.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Camera {
    pub cx: f64,
    pub cy: f64,
    pub zoom: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            cx: 0.0,
            cy: 0.0,
            zoom: 1.0,
        }
    }
}

impl Camera {
    pub fn new(cx: f64, cy: f64, zoom: f64) -> Self {
        Self {
            cx,
            cy,
            zoom: clamp_zoom(zoom),
        }
    }

    pub fn clamped(self) -> Self {
        Self::new(self.cx, self.cy, self.zoom)
    }

    pub fn world_to_screen(&self, world: Point, screen: ViewportSize) -> Point {
        Point::new(
            (world.x - self.cx) * self.zoom + screen.width / 2.0,
            (world.y - self.cy) * self.zoom + screen.height / 2.0,
        )
    }

    pub fn screen_to_world(&self, pt: Point, screen: ViewportSize) -> Point {
        Point::new(
            (pt.x - screen.width / 2.0) / self.zoom + self.cx,
            (pt.y - screen.height / 2.0) / self.zoom + self.cy,
        )
    }

    /// World-space rectangle currently covered by the viewport.
    pub fn visible_world_rect(&self, screen: ViewportSize) -> Rect {
        let a = self.screen_to_world(Point::ORIGIN, screen);
        let b = self.screen_to_world(Point::new(screen.width, screen.height), screen);
        Rect::from_points(a, b)
    }

    /// Blend each field as `(1 - w) * a + w * b`.
    pub fn blend(a: &Self, b: &Self, w: f64) -> Self {
        let mix = |x: f64, y: f64| x * (1.0 - w) + y * w;
        Self::new(mix(a.cx, b.cx), mix(a.cy, b.cy), mix(a.zoom, b.zoom))
    }
}
