//! # Effect Engine
//!
//! Stateless per-pixel effects applied to one frame (and optionally one
//! background frame) at a time.
//!
//! ## Built-in Effects
//!
//! - **Chroma key**: replaces key-colored pixels with the background
//! - **Negative**: inverted colors with the original brightness as alpha
//! - **Negative reimage**: projects colored light through the negative
//!
//! ## Usage
//!
//! ```rust,no_run
//! use framefx::effects::{EffectSpec, RgbColor};
//! use framefx::video::Frame;
//!
//! let spec = EffectSpec::ChromaKey {
//!     key_color: "#00FF00".parse::<RgbColor>().unwrap(),
//!     tolerance: 30.0,
//!     white_protect: 180.0,
//! };
//! let fg = Frame::new_filled(0, 4, 4, [0, 255, 0, 255]);
//! let bg = Frame::new_filled(0, 4, 4, [0, 0, 255, 255]);
//! let keyed = spec.apply(fg.into_buffer(), Some(bg.into_buffer())).unwrap();
//! ```

pub mod chroma;
pub mod negative;
pub mod resize;

use std::fmt;
use std::str::FromStr;

use image::DynamicImage;

use crate::error::{ConfigError, EffectError, FxError, Result};
use crate::video::PixelBuffer;

pub use chroma::chroma_key;
pub use negative::{apply_light, create_negative};
pub use resize::resize_to_match;

/// An 8-bit RGB color given on the command line as `RRGGBB` or `#RRGGBB`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RgbColor(pub [u8; 3]);

impl RgbColor {
    pub fn new(r: u8, g: u8, b: u8) -> Self {
        Self([r, g, b])
    }

    /// Index of the largest channel; ties go to the earlier channel
    pub fn dominant_channel(&self) -> usize {
        let mut dominant = 0;
        for channel in 1..3 {
            if self.0[channel] > self.0[dominant] {
                dominant = channel;
            }
        }
        dominant
    }
}

impl FromStr for RgbColor {
    type Err = FxError;

    fn from_str(value: &str) -> Result<Self> {
        let invalid = || ConfigError::InvalidColor { value: value.to_string() };

        let hex = value.strip_prefix('#').unwrap_or(value);
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(invalid().into());
        }

        let channel = |i: usize| u8::from_str_radix(&hex[i..i + 2], 16).map_err(|_| invalid());
        Ok(Self([channel(0)?, channel(2)?, channel(4)?]))
    }
}

impl fmt::Display for RgbColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{:02X}{:02X}{:02X}", self.0[0], self.0[1], self.0[2])
    }
}

/// The effect selected for a run
#[derive(Debug, Clone, PartialEq)]
pub enum EffectSpec {
    ChromaKey {
        key_color: RgbColor,
        tolerance: f32,
        white_protect: f32,
    },
    Negative,
    NegativeReimage {
        light_color: RgbColor,
    },
}

impl EffectSpec {
    /// Operation name as accepted on the command line
    pub fn name(&self) -> &'static str {
        match self {
            Self::ChromaKey { .. } => "chromakey",
            Self::Negative => "negative",
            Self::NegativeReimage { .. } => "negative-reimage",
        }
    }

    pub fn requires_background(&self) -> bool {
        matches!(self, Self::ChromaKey { .. })
    }

    /// Apply the effect to one foreground buffer.
    ///
    /// The background, when given, is size-matched to the foreground before
    /// compositing. Negative effects ignore it.
    pub fn apply(&self, fg: PixelBuffer, bg: Option<PixelBuffer>) -> Result<DynamicImage> {
        match self {
            Self::ChromaKey { key_color, tolerance, white_protect } => {
                let bg = bg.ok_or_else(|| EffectError::MissingBackground {
                    effect: self.name().to_string(),
                })?;
                let (fg, bg) = resize_to_match(fg, bg);
                let keyed = chroma_key(&fg, &bg, *key_color, *tolerance, *white_protect)?;
                Ok(DynamicImage::ImageRgba8(keyed))
            }
            Self::Negative => {
                let negative = create_negative(&DynamicImage::ImageRgba8(fg));
                Ok(DynamicImage::ImageRgba8(negative))
            }
            Self::NegativeReimage { light_color } => {
                let negative = create_negative(&DynamicImage::ImageRgba8(fg));
                let lit = apply_light(&DynamicImage::ImageRgba8(negative), *light_color)?;
                Ok(DynamicImage::ImageRgb8(lit))
            }
        }
    }
}

impl fmt::Display for EffectSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ChromaKey { key_color, tolerance, white_protect } => write!(
                f,
                "chromakey (key {}, tolerance {}, white protect {})",
                key_color, tolerance, white_protect
            ),
            Self::Negative => write!(f, "negative"),
            Self::NegativeReimage { light_color } => write!(f, "negative-reimage (light {})", light_color),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{Rgba, RgbaImage};

    #[test]
    fn test_parse_hex_with_and_without_hash() {
        assert_eq!("#00FF00".parse::<RgbColor>().unwrap(), RgbColor::new(0, 255, 0));
        assert_eq!("ff8000".parse::<RgbColor>().unwrap(), RgbColor::new(255, 128, 0));
    }

    #[test]
    fn test_parse_hex_rejects_bad_input() {
        for bad in ["", "#", "00FF0", "00FF000", "#GG0000", "##00FF00", "+0FF00"] {
            let err = bad.parse::<RgbColor>().unwrap_err();
            assert!(
                matches!(err, FxError::Config(ConfigError::InvalidColor { .. })),
                "{bad:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_display_roundtrips() {
        let color = RgbColor::new(18, 52, 171);
        assert_eq!(color.to_string(), "#1234AB");
        assert_eq!(color.to_string().parse::<RgbColor>().unwrap(), color);
    }

    #[test]
    fn test_dominant_channel() {
        assert_eq!(RgbColor::new(0, 255, 0).dominant_channel(), 1);
        assert_eq!(RgbColor::new(10, 20, 200).dominant_channel(), 2);
        assert_eq!(RgbColor::new(90, 90, 10).dominant_channel(), 0);
    }

    #[test]
    fn test_chroma_key_requires_background() {
        let spec = EffectSpec::ChromaKey {
            key_color: RgbColor::new(0, 255, 0),
            tolerance: 30.0,
            white_protect: 180.0,
        };
        assert!(spec.requires_background());

        let fg = RgbaImage::from_pixel(2, 2, Rgba([0, 255, 0, 255]));
        let err = spec.apply(fg, None).unwrap_err();
        assert!(matches!(err, FxError::Effect(EffectError::MissingBackground { .. })));
    }

    #[test]
    fn test_solid_green_over_blue_becomes_blue() {
        let spec = EffectSpec::ChromaKey {
            key_color: "#00FF00".parse().unwrap(),
            tolerance: 30.0,
            white_protect: 180.0,
        };
        let fg = RgbaImage::from_pixel(4, 4, Rgba([0, 255, 0, 255]));
        let bg = RgbaImage::from_pixel(4, 4, Rgba([0, 0, 255, 255]));

        let out = spec.apply(fg, Some(bg)).unwrap().to_rgba8();
        assert_eq!(out.dimensions(), (4, 4));
        assert!(out.pixels().all(|p| *p == Rgba([0, 0, 255, 255])));
    }

    #[test]
    fn test_background_scaled_up_to_foreground() {
        let spec = EffectSpec::ChromaKey {
            key_color: RgbColor::new(0, 255, 0),
            tolerance: 30.0,
            white_protect: 180.0,
        };
        let fg = RgbaImage::from_pixel(8, 6, Rgba([0, 255, 0, 255]));
        let bg = RgbaImage::from_pixel(4, 3, Rgba([0, 0, 255, 255]));

        let out = spec.apply(fg, Some(bg)).unwrap();
        assert_eq!((out.width(), out.height()), (8, 6));
    }

    #[test]
    fn test_negative_variants_ignore_background() {
        let fg = RgbaImage::from_pixel(3, 2, Rgba([255, 255, 255, 255]));
        let bg = RgbaImage::from_pixel(9, 9, Rgba([1, 2, 3, 255]));

        let negative = EffectSpec::Negative.apply(fg.clone(), Some(bg)).unwrap();
        assert!(matches!(negative, DynamicImage::ImageRgba8(_)));
        assert_eq!((negative.width(), negative.height()), (3, 2));

        let reimage = EffectSpec::NegativeReimage { light_color: RgbColor::new(255, 0, 0) }
            .apply(fg, None)
            .unwrap();
        assert!(matches!(reimage, DynamicImage::ImageRgb8(_)));
    }
}
