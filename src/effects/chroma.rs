use image::{Rgba, RgbaImage};

use crate::error::{EffectError, Result};
use crate::effects::RgbColor;
use crate::video::PixelBuffer;

/// How far the key's dominant channel must exceed the other two
const DOMINANCE_MARGIN: i32 = 10;

/// Composite `bg` into the areas of `fg` that match `key_color`.
///
/// A pixel is replaced when it is within `tolerance` (Euclidean RGB distance)
/// of the key, is dominated by the key's strongest channel, and is not brighter
/// than `white_protect`. The mask is hard: each output pixel comes whole from
/// either `fg` or `bg`, alpha included.
///
/// Both buffers must already have the same dimensions (see
/// [`resize_to_match`](super::resize_to_match)).
pub fn chroma_key(
    fg: &PixelBuffer,
    bg: &PixelBuffer,
    key_color: RgbColor,
    tolerance: f32,
    white_protect: f32,
) -> Result<PixelBuffer> {
    if fg.dimensions() != bg.dimensions() {
        return Err(EffectError::InvalidInputKind {
            effect: "chroma_key".to_string(),
            expected: format!("background of {}x{}", fg.width(), fg.height()),
            found: format!("{}x{}", bg.width(), bg.height()),
        }.into());
    }
    if fg.width() == 0 || fg.height() == 0 {
        return Err(EffectError::InvalidInputKind {
            effect: "chroma_key".to_string(),
            expected: "non-empty frame".to_string(),
            found: "0-area frame".to_string(),
        }.into());
    }

    let dominant = key_color.dominant_channel();
    let others = [(dominant + 1) % 3, (dominant + 2) % 3];

    let output = RgbaImage::from_fn(fg.width(), fg.height(), |x, y| {
        let pixel = fg.get_pixel(x, y);
        if is_keyed(pixel, key_color, dominant, others, tolerance, white_protect) {
            *bg.get_pixel(x, y)
        } else {
            *pixel
        }
    });

    Ok(output)
}

fn is_keyed(
    pixel: &Rgba<u8>,
    key_color: RgbColor,
    dominant: usize,
    others: [usize; 2],
    tolerance: f32,
    white_protect: f32,
) -> bool {
    let channels = [i32::from(pixel[0]), i32::from(pixel[1]), i32::from(pixel[2])];

    let distance_sq: i32 = channels
        .iter()
        .zip(key_color.0.iter())
        .map(|(&c, &k)| (c - i32::from(k)).pow(2))
        .sum();
    let close = (distance_sq as f32).sqrt() < tolerance;

    let key_dominant = others
        .iter()
        .all(|&other| channels[dominant] > channels[other] + DOMINANCE_MARGIN);

    let luma = channels.iter().sum::<i32>() as f32 / 3.0;
    let bright = luma > white_protect;

    close && key_dominant && !bright
}
