//! Drawing backends and the per-element painters the compositor drives.

pub mod backend;
pub mod composite;
pub mod cpu;
pub mod grid;
pub mod overlay;
pub mod pixelate;
pub mod raster;
pub mod vector;

pub use backend::{CanvasSurface, ElementContent, ElementStyle, OverlayHost};
pub use cpu::CpuCanvas;
pub use grid::GridStyle;
pub use overlay::{OverlayElement, RetainedOverlay};

/// A rendered frame, row-major RGBA8.
#[derive(Clone, Debug)]
pub struct FrameRGBA {
    pub width: u32,
    pub height: u32,
    pub data: Vec<u8>,
    pub premultiplied: bool,
}

impl FrameRGBA {
    /// Straight-alpha copy of the pixel data, suitable for PNG encoding.
    pub fn to_straight_rgba(&self) -> Vec<u8> {
        if !self.premultiplied {
            return self.data.clone();
        }
        let mut out = self.data.clone();
        for px in out.chunks_exact_mut(4) {
            let a = u16::from(px[3]);
            if a == 0 || a == 255 {
                continue;
            }
            for c in &mut px[..3] {
                *c = ((u16::from(*c) * 255 + a / 2) / a).min(255) as u8;
            }
        }
        out
    }
}
