//! Per-frame geometry: parent-chain resolution, projection to pixels and culling.

pub mod cull;
pub mod project;
pub mod resolve;

pub use cull::{CULL_MARGIN_PX, CullDecision, cull};
pub use project::{PixelRect, project};
pub use resolve::{ResolvedTransform, TransformResolver};
