use image::{RgbaImage, imageops::FilterType};

/// Size of the low-resolution pass for `step` of `steps` on a `width`×`height` box.
pub fn low_res_size(width: u32, height: u32, step: u32, steps: u32) -> (u32, u32) {
    let steps = steps.max(1);
    let step = step.min(steps);
    let scale = |v: u32| -> u32 {
        ((f64::from(v) / f64::from(steps) * f64::from(step)).floor() as u32).max(1)
    };
    (scale(width), scale(height))
}

/// Downsample `src` to the low-resolution grid for a box of `box_w`×`box_h` pixels.
///
/// The grid never exceeds the source's own size. Upscaling the result with nearest-neighbour
/// sampling to the box gives the pixelated look.
pub fn downsample(src: &RgbaImage, box_w: u32, box_h: u32, step: u32, steps: u32) -> RgbaImage {
    let grid_w = box_w.clamp(1, src.width().max(1));
    let grid_h = box_h.clamp(1, src.height().max(1));
    let (w, h) = low_res_size(grid_w, grid_h, step, steps);
    image::imageops::resize(src, w, h, FilterType::Triangle)
}

/// Full pixelation of `src` at its own size.
pub fn pixelate(src: &RgbaImage, step: u32, steps: u32) -> RgbaImage {
    if step >= steps {
        return src.clone();
    }
    let small = downsample(src, src.width(), src.height(), step, steps);
    image::imageops::resize(&small, src.width(), src.height(), FilterType::Nearest)
}
