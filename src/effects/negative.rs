use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

use crate::error::{EffectError, Result};
use crate::effects::RgbColor;

/// Build the photographic negative of `image`.
///
/// RGB channels are inverted; alpha is the luminance of the original image,
/// so bright regions of the source end up opaque in the negative.
pub fn create_negative(image: &DynamicImage) -> RgbaImage {
    let rgb = image.to_rgb8();

    RgbaImage::from_fn(rgb.width(), rgb.height(), |x, y| {
        let Rgb([r, g, b]) = *rgb.get_pixel(x, y);
        Rgba([255 - r, 255 - g, 255 - b, luma(r, g, b)])
    })
}

/// ITU-R 601-2 luma in 16-bit fixed point (0.299, 0.587, 0.114)
fn luma(r: u8, g: u8, b: u8) -> u8 {
    ((u32::from(r) * 19595 + u32::from(g) * 38470 + u32::from(b) * 7471 + 0x8000) >> 16) as u8
}

/// Project `light_color` through a negative made by [`create_negative`].
///
/// The negative is composited over a solid light layer, the composite is
/// inverted, and every pixel is then scaled by `255 / alpha` to undo the
/// darkening the composite applied. Fully transparent pixels stay black.
pub fn apply_light(negative: &DynamicImage, light_color: RgbColor) -> Result<RgbImage> {
    let negative = match negative {
        DynamicImage::ImageRgba8(buffer) => buffer,
        other => {
            return Err(EffectError::InvalidInputKind {
                effect: "apply_light".to_string(),
                expected: "Rgba8 negative".to_string(),
                found: format!("{:?}", other.color()),
            }.into());
        }
    };
    if negative.width() == 0 || negative.height() == 0 {
        return Err(EffectError::InvalidInputKind {
            effect: "apply_light".to_string(),
            expected: "non-empty negative".to_string(),
            found: "0-area negative".to_string(),
        }.into());
    }

    let light = light_color.0;
    let output = RgbImage::from_fn(negative.width(), negative.height(), |x, y| {
        let Rgba([r, g, b, alpha]) = *negative.get_pixel(x, y);
        let scale = correction_factor(alpha);

        let mut out = [0u8; 3];
        for (channel, (&value, &tint)) in [r, g, b].iter().zip(light.iter()).enumerate() {
            let inverted = 255 - over(value, tint, alpha);
            out[channel] = (f32::from(inverted) * scale).clamp(0.0, 255.0) as u8;
        }
        Rgb(out)
    });

    Ok(output)
}

/// "Over" composite of one channel onto an opaque backdrop
fn over(src: u8, dst: u8, alpha: u8) -> u8 {
    let a = u32::from(alpha);
    ((u32::from(src) * a + u32::from(dst) * (255 - a) + 127) / 255) as u8
}

/// Undo the `alpha / 255` scaling of the composite; zero alpha stays zero
fn correction_factor(alpha: u8) -> f32 {
    if alpha == 0 {
        0.0
    } else {
        255.0 / f32::from(alpha)
    }
}
