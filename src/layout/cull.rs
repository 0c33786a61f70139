use crate::{foundation::core::ViewportSize, layout::project::PixelRect};

/// Slack around the viewport before a node counts as offscreen.
pub const CULL_MARGIN_PX: f64 = 80.0;

#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum CullDecision {
    Visible,
    /// Rounds to less than one pixel on some axis.
    Degenerate,
    Offscreen,
}

impl CullDecision {
    pub fn is_visible(self) -> bool {
        self == Self::Visible
    }
}

/// Decide whether a projected node needs any work this frame.
pub fn cull(rect: &PixelRect, viewport: ViewportSize) -> CullDecision {
    let finite = [rect.left, rect.top, rect.width, rect.height, rect.rotation_deg]
        .iter()
        .all(|v| v.is_finite());
    if !finite || rect.width.round() < 1.0 || rect.height.round() < 1.0 {
        return CullDecision::Degenerate;
    }
    let bounds = rect.bounding_box().inflate(CULL_MARGIN_PX, CULL_MARGIN_PX);
    if bounds.intersect(viewport.rect()).is_zero_area() {
        return CullDecision::Offscreen;
    }
    CullDecision::Visible
}
