use image::RgbaImage;

use crate::{
    assets::ImageStore,
    foundation::{
        core::{Point, Rgba8},
        error::{StageError, StageResult},
    },
    render::{
        FrameRGBA,
        backend::ElementContent,
        composite::{PremulRgba8, blend_pixel, over},
        overlay::{OverlayElement, RetainedOverlay},
    },
};

/// Flatten the shown overlay elements onto a canvas frame.
///
/// Paints backgrounds (with rounded corners), images and pixelated renditions, under each
/// element's opacity, rotation and reveal mask. Markup is not rasterized. Returns the number
/// of elements painted.
pub fn rasterize_overlay(
    frame: &mut FrameRGBA,
    overlay: &RetainedOverlay,
    images: &ImageStore,
) -> StageResult<usize> {
    if !frame.premultiplied {
        return Err(StageError::render(
            "overlay rasterization expects a premultiplied frame",
        ));
    }
    let mut painted = 0;
    for el in overlay.shown_elements() {
        if paint_element(frame, el, images) {
            painted += 1;
        }
    }
    Ok(painted)
}

fn paint_element(frame: &mut FrameRGBA, el: &OverlayElement, images: &ImageStore) -> bool {
    let Some(style) = el.style.as_ref() else {
        return false;
    };
    if !(style.opacity > 0.0) {
        return false;
    }
    let rect = style.rect;
    if !(rect.width >= 1.0 && rect.height >= 1.0) {
        return false;
    }

    let image: Option<&RgbaImage> = match (&el.content, el.pixelation) {
        (ElementContent::Image { .. }, Some(_)) => el.pixel_frame.as_deref(),
        (ElementContent::Image { src }, None) => images.get(src).map(|img| img.as_ref()),
        _ => None,
    };
    let background = style.background.map(Rgba8::to_premul);
    if image.is_none() && background.is_none() {
        return false;
    }

    let bounds = rect.bounding_box();
    let x0 = bounds.x0.floor().max(0.0) as u32;
    let y0 = bounds.y0.floor().max(0.0) as u32;
    let x1 = (bounds.x1.ceil().max(0.0) as u32).min(frame.width);
    let y1 = (bounds.y1.ceil().max(0.0) as u32).min(frame.height);
    let to_local = rect.local_to_screen().inverse();
    let radius = style
        .border_radius
        .max(0.0)
        .min(rect.width / 2.0)
        .min(rect.height / 2.0);

    for y in y0..y1 {
        for x in x0..x1 {
            let p = to_local * Point::new(f64::from(x) + 0.5, f64::from(y) + 0.5);
            if p.x < 0.0 || p.y < 0.0 || p.x >= rect.width || p.y >= rect.height {
                continue;
            }
            if radius > 0.0 && outside_rounded_corner(p, rect.width, rect.height, radius) {
                continue;
            }
            let (u, v) = (p.x / rect.width, p.y / rect.height);
            let mut color: PremulRgba8 = [0, 0, 0, 0];
            if let Some(bg) = background {
                color = over(color, bg, 1.0);
            }
            if let Some(img) = image {
                color = over(color, sample_nearest(img, u, v), 1.0);
            }
            let coverage = style.mask.map_or(1.0, |m| m.coverage(u, v));
            let alpha = (style.opacity * coverage) as f32;
            blend_pixel(&mut frame.data, frame.width, x, y, color, alpha);
        }
    }
    true
}

fn outside_rounded_corner(p: Point, w: f64, h: f64, r: f64) -> bool {
    let cx = p.x.clamp(r, w - r);
    let cy = p.y.clamp(r, h - r);
    let (dx, dy) = (p.x - cx, p.y - cy);
    dx * dx + dy * dy > r * r
}

fn sample_nearest(img: &RgbaImage, u: f64, v: f64) -> PremulRgba8 {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return [0, 0, 0, 0];
    }
    let ix = ((u * f64::from(w)).floor() as u32).min(w - 1);
    let iy = ((v * f64::from(h)).floor() as u32).min(h - 1);
    let [r, g, b, a] = img.get_pixel(ix, iy).0;
    Rgba8::new(r, g, b, a).to_premul()
}
