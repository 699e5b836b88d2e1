//! Premultiplied RGBA pixels, compositing and byte conversion.

use lava_lamp_core::{CompositeOp, Srgb};

/// Premultiplied RGBA with components in [0, 1].
pub type Rgba = [f32; 4];

pub const TRANSPARENT: Rgba = [0.0; 4];

/// `color` at opacity `alpha`, premultiplied.
pub fn premultiply(color: Srgb, alpha: f32) -> Rgba {
    [
        color.r as f32 * alpha,
        color.g as f32 * alpha,
        color.b as f32 * alpha,
        alpha,
    ]
}

/// Composites `src` onto `dst` in place.
///
/// `SourceOver` is the usual painter's blend; `Lighter` adds both
/// premultiplied values and clamps, so overlapping layers brighten.
pub fn blend(dst: &mut Rgba, src: Rgba, op: CompositeOp) {
    match op {
        CompositeOp::SourceOver => {
            let keep = 1.0 - src[3];
            for (d, s) in dst.iter_mut().zip(src) {
                *d = s + *d * keep;
            }
        }
        CompositeOp::Lighter => {
            for (d, s) in dst.iter_mut().zip(src) {
                *d = (*d + s).min(1.0);
            }
        }
    }
}

fn to_byte(v: f32) -> u8 {
    (v.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Straight-alpha RGBA8 bytes, as a canvas hands them out.
pub fn to_rgba8(pixels: &[Rgba]) -> Vec<u8> {
    pixels
        .iter()
        .flat_map(|&[r, g, b, a]| {
            if a <= 0.0 {
                [0, 0, 0, 0]
            } else {
                [to_byte(r / a), to_byte(g / a), to_byte(b / a), to_byte(a)]
            }
        })
        .collect()
}

/// Opaque RGBA8 bytes with every pixel composited over `background`.
pub fn to_rgba8_over(pixels: &[Rgba], background: Srgb) -> Vec<u8> {
    let bg = premultiply(background, 1.0);
    pixels
        .iter()
        .flat_map(|&px| {
            let mut out = bg;
            blend(&mut out, px, CompositeOp::SourceOver);
            [to_byte(out[0]), to_byte(out[1]), to_byte(out[2]), 255]
        })
        .collect()
}
