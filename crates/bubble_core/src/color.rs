//! Color and shadow types

use serde::de::{self, Deserializer, SeqAccess, Visitor};
use serde::{Deserialize, Serialize, Serializer};
use std::fmt;

/// RGBA color with `f32` components in `[0, 1]`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
    pub a: f32,
}

impl Color {
    pub const WHITE: Color = Color::rgb(1.0, 1.0, 1.0);
    pub const BLACK: Color = Color::rgb(0.0, 0.0, 0.0);
    pub const RED: Color = Color::rgb(1.0, 0.0, 0.0);
    pub const GREEN: Color = Color::rgb(0.0, 1.0, 0.0);
    pub const BLUE: Color = Color::rgb(0.0, 0.0, 1.0);
    pub const GRAY: Color = Color::rgb(0.5, 0.5, 0.5);
    pub const TRANSPARENT: Color = Color::rgba(0.0, 0.0, 0.0, 0.0);

    pub const fn rgb(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub const fn rgba(r: f32, g: f32, b: f32, a: f32) -> Self {
        Self { r, g, b, a }
    }

    /// Opaque color from `0xRRGGBB`
    pub fn from_hex(hex: u32) -> Self {
        let r = ((hex >> 16) & 0xFF) as f32 / 255.0;
        let g = ((hex >> 8) & 0xFF) as f32 / 255.0;
        let b = (hex & 0xFF) as f32 / 255.0;
        Self::rgb(r, g, b)
    }

    /// Color from 8-bit channels
    pub fn from_rgba8(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self::rgba(
            r as f32 / 255.0,
            g as f32 / 255.0,
            b as f32 / 255.0,
            a as f32 / 255.0,
        )
    }

    /// Same color with its alpha replaced
    pub fn with_alpha(mut self, alpha: f32) -> Self {
        self.a = alpha;
        self
    }

    /// Scale red, green and blue by `factor`, leaving alpha untouched.
    ///
    /// Factors above 1 behave like 1, so a color can only get darker.
    pub fn darken(self, factor: f32) -> Self {
        let factor = factor.min(1.0);
        Self {
            r: self.r * factor,
            g: self.g * factor,
            b: self.b * factor,
            a: self.a,
        }
    }

    pub fn to_array(&self) -> [f32; 4] {
        [self.r, self.g, self.b, self.a]
    }

    /// Quantize to 8-bit channels (clamped)
    pub fn to_rgba8(&self) -> [u8; 4] {
        let q = |v: f32| (v.clamp(0.0, 1.0) * 255.0).round() as u8;
        [q(self.r), q(self.g), q(self.b), q(self.a)]
    }

    /// `#RRGGBB`, or `#RRGGBBAA` when not fully opaque
    pub fn to_hex_string(&self) -> String {
        let [r, g, b, a] = self.to_rgba8();
        if a == 255 {
            format!("#{r:02X}{g:02X}{b:02X}")
        } else {
            format!("#{r:02X}{g:02X}{b:02X}{a:02X}")
        }
    }

    /// Parse `#RGB`, `#RRGGBB` or `#RRGGBBAA` (leading `#` optional)
    pub fn parse_hex(s: &str) -> Option<Self> {
        let hex = s.trim().trim_start_matches('#');
        let channel = |i: usize| u8::from_str_radix(hex.get(i..i + 2)?, 16).ok();
        match hex.len() {
            3 => {
                let mut out = [0u8; 3];
                for (slot, c) in out.iter_mut().zip(hex.chars()) {
                    let v = c.to_digit(16)? as u8;
                    *slot = v * 17;
                }
                Some(Self::from_rgba8(out[0], out[1], out[2], 255))
            }
            6 => Some(Self::from_rgba8(channel(0)?, channel(2)?, channel(4)?, 255)),
            8 => Some(Self::from_rgba8(
                channel(0)?,
                channel(2)?,
                channel(4)?,
                channel(6)?,
            )),
            _ => None,
        }
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::BLACK
    }
}

impl Serialize for Color {
    /// Hex when 8-bit channels hold the color exactly, `[r, g, b, a]` otherwise
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let hex = self.to_hex_string();
        if Color::parse_hex(&hex) == Some(*self) {
            serializer.serialize_str(&hex)
        } else {
            self.to_array().serialize(serializer)
        }
    }
}

impl<'de> Deserialize<'de> for Color {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct ColorVisitor;

        impl<'de> Visitor<'de> for ColorVisitor {
            type Value = Color;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a hex color such as \"#RRGGBB\" or an [r, g, b, a] array")
            }

            fn visit_str<E: de::Error>(self, v: &str) -> Result<Color, E> {
                Color::parse_hex(v).ok_or_else(|| E::invalid_value(de::Unexpected::Str(v), &self))
            }

            fn visit_seq<A: SeqAccess<'de>>(self, mut seq: A) -> Result<Color, A::Error> {
                let mut channel = |i: usize| -> Result<f32, A::Error> {
                    seq.next_element()?
                        .ok_or_else(|| de::Error::invalid_length(i, &"3 or 4 channels"))
                };
                let (r, g, b) = (channel(0)?, channel(1)?, channel(2)?);
                let a = seq.next_element()?.unwrap_or(1.0);
                if seq.next_element::<de::IgnoredAny>()?.is_some() {
                    return Err(de::Error::invalid_length(5, &"3 or 4 channels"));
                }
                Ok(Color::rgba(r, g, b, a))
            }
        }

        deserializer.deserialize_any(ColorVisitor)
    }
}

/// Shadow layer configuration, in pixels
///
/// Mirrors a blur-capable paint's shadow layer: the painted shape is copied,
/// blurred by `blur`, tinted with `color` and drawn at the given offset.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Shadow {
    pub offset_x: f32,
    pub offset_y: f32,
    pub blur: f32,
    pub color: Color,
}

impl Shadow {
    pub fn new(offset_x: f32, offset_y: f32, blur: f32, color: Color) -> Self {
        Self {
            offset_x,
            offset_y,
            blur,
            color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_darken_scales_rgb_only() {
        let c = Color::rgba(0.8, 0.4, 0.2, 0.5).darken(0.5);
        assert!((c.r - 0.4).abs() < 1e-6);
        assert!((c.g - 0.2).abs() < 1e-6);
        assert!((c.b - 0.1).abs() < 1e-6);
        assert_eq!(c.a, 0.5);
    }

    #[test]
    fn test_darken_clamps_factor_above_one() {
        let c = Color::rgba(0.3, 0.6, 0.9, 0.25);
        assert_eq!(c.darken(3.0), c.darken(1.0));
        assert_eq!(c.darken(1.0), c);
    }

    #[test]
    fn test_hex_round_trip() {
        let c = Color::from_hex(0x757575);
        assert_eq!(c.to_hex_string(), "#757575");
        assert_eq!(Color::parse_hex("#757575"), Some(c));

        let translucent = Color::parse_hex("#FF000080").unwrap();
        assert_eq!(translucent.to_rgba8(), [255, 0, 0, 128]);
        assert_eq!(translucent.to_hex_string(), "#FF000080");

        assert_eq!(Color::parse_hex("#fff"), Some(Color::WHITE));
        assert_eq!(Color::parse_hex("#12345"), None);
        assert_eq!(Color::parse_hex("zzzzzz"), None);
    }

    #[test]
    fn test_serde_picks_lossless_form() {
        use serde::de::value::{Error, SeqDeserializer, StrDeserializer};
        use serde::de::IntoDeserializer;

        let hex: StrDeserializer<Error> = "#757575".into_deserializer();
        assert_eq!(Color::deserialize(hex), Ok(Color::from_hex(0x757575)));

        let floats: SeqDeserializer<_, Error> = vec![0.5f32, 0.25, 0.125].into_deserializer();
        assert_eq!(Color::deserialize(floats), Ok(Color::rgb(0.5, 0.25, 0.125)));

        let too_long: SeqDeserializer<_, Error> = vec![0.0f32; 5].into_deserializer();
        assert!(Color::deserialize(too_long).is_err());
    }
}
