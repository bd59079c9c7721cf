use image::imageops::{self, FilterType};

use crate::video::PixelBuffer;

/// Bring two buffers to the same dimensions before compositing.
///
/// The buffer with the smaller pixel area is scaled (bilinear) to the larger
/// one's exact dimensions. When both areas are equal but the shapes differ,
/// `a` is scaled to `b`.
pub fn resize_to_match(a: PixelBuffer, b: PixelBuffer) -> (PixelBuffer, PixelBuffer) {
    if a.dimensions() == b.dimensions() {
        return (a, b);
    }

    let area = |buf: &PixelBuffer| u64::from(buf.width()) * u64::from(buf.height());

    if area(&a) > area(&b) {
        let b = imageops::resize(&b, a.width(), a.height(), FilterType::Triangle);
        (a, b)
    } else {
        let a = imageops::resize(&a, b.width(), b.height(), FilterType::Triangle);
        (a, b)
    }
}
