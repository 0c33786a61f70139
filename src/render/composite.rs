use crate::foundation::math::mul_div255;

pub type PremulRgba8 = [u8; 4];

/// Source-over of premultiplied pixels, with an extra opacity applied to `src`.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let opacity = opacity.clamp(0.0, 1.0);
    if opacity <= 0.0 || src[3] == 0 {
        return dst;
    }

    let op = ((opacity * 255.0).round() as i32).clamp(0, 255) as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }

    let inv = 255u16 - u16::from(sa);

    let mut out = [0u8; 4];
    out[3] = sa.saturating_add(mul_div255(u16::from(dst[3]), inv));

    for i in 0..3 {
        let sc = mul_div255(u16::from(src[i]), op);
        let dc = mul_div255(u16::from(dst[i]), inv);
        out[i] = sc.saturating_add(dc);
    }
    out
}

/// Composite one premultiplied pixel onto `frame` at `(x, y)`; out-of-range writes are
/// dropped.
pub fn blend_pixel(frame: &mut [u8], width: u32, x: u32, y: u32, src: PremulRgba8, opacity: f32) {
    let idx = (y as usize * width as usize + x as usize) * 4;
    let Some(px) = frame.get_mut(idx..idx + 4) else {
        return;
    };
    let out = over([px[0], px[1], px[2], px[3]], src, opacity);
    px.copy_from_slice(&out);
}
