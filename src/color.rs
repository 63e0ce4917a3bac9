use std::fmt;
use std::str::FromStr;

use glam::Vec3;
use serde::{Deserialize, Serialize};

use crate::error::FieldError;

/// RGB colour with channels in the `0..=1` range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Color {
    pub r: f32,
    pub g: f32,
    pub b: f32,
}

impl Color {
    pub const WHITE: Self = Self::new(1.0, 1.0, 1.0);
    pub const BLACK: Self = Self::new(0.0, 0.0, 0.0);

    pub const fn new(r: f32, g: f32, b: f32) -> Self {
        Self { r, g, b }
    }

    /// Builds a colour from a packed `0xRRGGBB` value.
    pub fn from_rgb_u32(value: u32) -> Self {
        let channel = |shift: u32| ((value >> shift) & 0xff) as f32 / 255.0;
        Self::new(channel(16), channel(8), channel(0))
    }

    /// Parses `#rrggbb`, `#rgb` or `0xrrggbb`.
    pub fn from_hex(text: &str) -> Result<Self, FieldError> {
        let digits = text
            .strip_prefix('#')
            .or_else(|| text.strip_prefix("0x"))
            .unwrap_or(text);
        let expanded = match digits.len() {
            3 => digits.chars().flat_map(|c| [c, c]).collect::<String>(),
            6 => digits.to_string(),
            _ => {
                return Err(FieldError::invalid(
                    "color",
                    format!("expected 3 or 6 hex digits, got `{text}`"),
                ))
            }
        };
        let value = u32::from_str_radix(&expanded, 16)
            .map_err(|err| FieldError::invalid("color", format!("`{text}`: {err}")))?;
        Ok(Self::from_rgb_u32(value))
    }

    /// Parses three whitespace separated 0-255 components, e.g. `255 128 0`.
    fn from_components(text: &str) -> Result<Self, FieldError> {
        let components = text
            .split_whitespace()
            .map(|component| {
                component
                    .parse::<f32>()
                    .map_err(|err| FieldError::invalid("color", format!("`{text}`: {err}")))
            })
            .collect::<Result<Vec<_>, _>>()?;
        if let Some(bad) = components
            .iter()
            .find(|component| !(0.0..=255.0).contains(*component))
        {
            return Err(FieldError::invalid(
                "color",
                format!("component {bad} in `{text}` is outside 0..=255"),
            ));
        }
        match components.as_slice() {
            [r, g, b] => Ok(Self::new(r / 255.0, g / 255.0, b / 255.0)),
            _ => Err(FieldError::invalid(
                "color",
                format!("expected three components, got `{text}`"),
            )),
        }
    }

    /// Per-channel linear blend; `t = 0` yields `self`, `t = 1` yields `other`.
    pub fn lerp(self, other: Self, t: f32) -> Self {
        Self::from(Vec3::from(self).lerp(Vec3::from(other), t))
    }

    pub fn to_array(self) -> [f32; 3] {
        [self.r, self.g, self.b]
    }
}

impl Default for Color {
    fn default() -> Self {
        Self::WHITE
    }
}

impl From<Vec3> for Color {
    fn from(value: Vec3) -> Self {
        Self::new(value.x, value.y, value.z)
    }
}

impl From<Color> for Vec3 {
    fn from(value: Color) -> Self {
        Vec3::new(value.r, value.g, value.b)
    }
}

impl FromStr for Color {
    type Err = FieldError;

    fn from_str(text: &str) -> Result<Self, Self::Err> {
        let text = text.trim();
        if text.starts_with('#') || text.starts_with("0x") {
            Self::from_hex(text)
        } else if text.contains(char::is_whitespace) {
            Self::from_components(text)
        } else {
            Self::from_hex(text)
        }
    }
}

impl fmt::Display for Color {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let byte = |channel: f32| (channel.clamp(0.0, 1.0) * 255.0).round() as u8;
        write!(f, "#{:02x}{:02x}{:02x}", byte(self.r), byte(self.g), byte(self.b))
    }
}
