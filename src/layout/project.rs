use crate::{
    camera::Camera,
    foundation::core::{Affine, Point, Rect, ViewportSize},
    layout::resolve::ResolvedTransform,
    scene::model::Space,
};

/// A node's box in device pixels, already shifted so `(left, top)` is its top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PixelRect {
    pub left: f64,
    pub top: f64,
    pub width: f64,
    pub height: f64,
    pub rotation_deg: f64,
}

impl PixelRect {
    pub fn rect(&self) -> Rect {
        Rect::new(
            self.left,
            self.top,
            self.left + self.width,
            self.top + self.height,
        )
    }

    pub fn center(&self) -> Point {
        self.rect().center()
    }

    /// Maps box-local pixel coordinates (origin at the top-left, unrotated) to the screen.
    pub fn local_to_screen(&self) -> Affine {
        Affine::rotate_about(self.rotation_deg.to_radians(), self.center())
            * Affine::translate((self.left, self.top))
    }

    /// Axis-aligned bounds of the rotated box.
    pub fn bounding_box(&self) -> Rect {
        if self.rotation_deg == 0.0 {
            return self.rect();
        }
        Affine::rotate_about(self.rotation_deg.to_radians(), self.center())
            .transform_rect_bbox(self.rect())
    }
}

/// Project a resolved transform into pixels and apply its anchor offset.
pub fn project(
    resolved: &ResolvedTransform,
    space: Space,
    camera: &Camera,
    viewport: ViewportSize,
) -> PixelRect {
    let (pos, width, height) = match space {
        Space::World => (
            camera.world_to_screen(Point::new(resolved.x, resolved.y), viewport),
            resolved.w * camera.zoom,
            resolved.h * camera.zoom,
        ),
        Space::Screen => (
            Point::new(resolved.x * viewport.width, resolved.y * viewport.height),
            resolved.w * viewport.width,
            resolved.h * viewport.height,
        ),
    };
    let (fx, fy) = resolved.anchor.unwrap_or_default().fraction();
    PixelRect {
        left: pos.x - fx * width,
        top: pos.y - fy * height,
        width,
        height,
        rotation_deg: resolved.rotation_deg,
    }
}
