use serde::{Deserialize, Serialize};

use crate::color::Color;
use crate::error::FieldError;

/// Slider range advertised to configuration surfaces.
///
/// Ranges are guidance only; the generators accept anything that passes
/// [`GalaxyParameters::validate`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ParamRange {
    pub min: f64,
    pub max: f64,
    pub step: f64,
}

impl ParamRange {
    pub const fn new(min: f64, max: f64, step: f64) -> Self {
        Self { min, max, step }
    }

    pub fn clamp(&self, value: f64) -> f64 {
        value.clamp(self.min, self.max)
    }

    pub fn contains(&self, value: f64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

pub mod ranges {
    use super::ParamRange;

    pub const COUNT: ParamRange = ParamRange::new(100.0, 1_000_000.0, 100.0);
    pub const SIZE: ParamRange = ParamRange::new(0.001, 0.05, 0.001);
    pub const RADIUS: ParamRange = ParamRange::new(0.01, 20.0, 0.01);
    pub const BRANCHES: ParamRange = ParamRange::new(2.0, 20.0, 1.0);
    pub const SPIN: ParamRange = ParamRange::new(-5.0, 5.0, 0.001);
    pub const RANDOMNESS: ParamRange = ParamRange::new(0.0, 2.0, 0.001);
    pub const RANDOMNESS_POWER: ParamRange = ParamRange::new(1.0, 10.0, 0.001);
    pub const STARS_COUNT: ParamRange = ParamRange::new(0.0, 50_000.0, 100.0);
    pub const STARS_RADIUS: ParamRange = ParamRange::new(1.0, 100.0, 1.0);
}

/// Shape and colour of the spiral galaxy.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GalaxyParameters {
    pub count: usize,
    /// Point size handed to the display surface; unused by the generator.
    pub size: f32,
    pub radius: f32,
    pub branches: u32,
    /// Radians of twist per unit of radius.
    pub spin: f32,
    /// Scatter magnitude as a fraction of each particle's radius.
    pub randomness: f32,
    /// Higher values pull particles towards the ideal arm curve.
    pub randomness_power: f32,
    pub inside_color: Color,
    pub outside_color: Color,
}

impl Default for GalaxyParameters {
    fn default() -> Self {
        Self {
            count: 200_000,
            size: 0.005,
            radius: 3.0,
            branches: 5,
            spin: 1.5,
            randomness: 0.5,
            randomness_power: 3.0,
            inside_color: Color::from_rgb_u32(0xff4500),
            outside_color: Color::from_rgb_u32(0x0066ff),
        }
    }
}

impl GalaxyParameters {
    /// Rejects values the generator cannot produce a galaxy from.
    pub fn validate(&self) -> Result<(), FieldError> {
        validate_count(self.count)?;
        validate_radius("radius", self.radius)?;
        validate_finite("size", self.size)?;
        validate_finite("spin", self.spin)?;
        validate_finite("randomness", self.randomness)?;
        validate_finite("randomnessPower", self.randomness_power)?;
        if self.branches == 0 {
            return Err(FieldError::invalid("branches", "must be at least 1"));
        }
        Ok(())
    }

    pub fn apply(&mut self, change: GalaxyChange) {
        match change {
            GalaxyChange::Count(count) => self.count = count,
            GalaxyChange::Size(size) => self.size = size,
            GalaxyChange::Radius(radius) => self.radius = radius,
            GalaxyChange::Branches(branches) => self.branches = branches,
            GalaxyChange::Spin(spin) => self.spin = spin,
            GalaxyChange::Randomness(randomness) => self.randomness = randomness,
            GalaxyChange::RandomnessPower(power) => self.randomness_power = power,
            GalaxyChange::InsideColor(color) => self.inside_color = color,
            GalaxyChange::OutsideColor(color) => self.outside_color = color,
        }
    }
}

/// Ambient background star field.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct StarFieldParameters {
    pub count: usize,
    pub size: f32,
    pub radius: f32,
    pub color: Color,
}

impl Default for StarFieldParameters {
    fn default() -> Self {
        Self {
            count: 5_000,
            size: 0.004,
            radius: 70.0,
            color: Color::WHITE,
        }
    }
}

impl StarFieldParameters {
    pub fn validate(&self) -> Result<(), FieldError> {
        validate_count(self.count)?;
        validate_radius("radius", self.radius)?;
        validate_finite("size", self.size)
    }

    pub fn apply(&mut self, change: StarFieldChange) {
        match change {
            StarFieldChange::Count(count) => self.count = count,
            StarFieldChange::Size(size) => self.size = size,
            StarFieldChange::Radius(radius) => self.radius = radius,
            StarFieldChange::Color(color) => self.color = color,
        }
    }
}

/// Largest count whose position and colour buffers stay addressable.
pub const MAX_COUNT: usize = isize::MAX as usize / (3 * std::mem::size_of::<f32>());

fn validate_count(count: usize) -> Result<(), FieldError> {
    if count > MAX_COUNT {
        return Err(FieldError::invalid(
            "count",
            format!("{count} exceeds the maximum of {MAX_COUNT}"),
        ));
    }
    Ok(())
}

fn validate_finite(name: &str, value: f32) -> Result<(), FieldError> {
    if !value.is_finite() {
        return Err(FieldError::invalid(
            name,
            format!("must be a finite number, got {value}"),
        ));
    }
    Ok(())
}

fn validate_radius(name: &str, radius: f32) -> Result<(), FieldError> {
    if !radius.is_finite() || radius <= 0.0 {
        return Err(FieldError::invalid(
            name,
            format!("must be a positive number, got {radius}"),
        ));
    }
    Ok(())
}

/// A single edit to [`GalaxyParameters`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GalaxyChange {
    Count(usize),
    Size(f32),
    Radius(f32),
    Branches(u32),
    Spin(f32),
    Randomness(f32),
    RandomnessPower(f32),
    InsideColor(Color),
    OutsideColor(Color),
}

impl GalaxyChange {
    /// Parses a `key`/`value` pair as typed by a user, e.g. `("branches", "6")`.
    pub fn parse(key: &str, value: &str) -> Result<Self, FieldError> {
        let value = value.trim();
        Ok(match key {
            "count" => Self::Count(parse_count(key, value)?),
            "size" => Self::Size(parse_float(key, value)?),
            "radius" => Self::Radius(parse_float(key, value)?),
            "branches" => Self::Branches(parse_branches(value)?),
            "spin" => Self::Spin(parse_float(key, value)?),
            "randomness" | "spread" => Self::Randomness(parse_float(key, value)?),
            "randomnessPower" | "randomness_power" | "spreadFocus" => {
                Self::RandomnessPower(parse_float(key, value)?)
            }
            "insideColor" | "inside_color" => Self::InsideColor(value.parse()?),
            "outsideColor" | "outside_color" => Self::OutsideColor(value.parse()?),
            other => return Err(FieldError::UnknownParameter(other.to_string())),
        })
    }
}

/// A single edit to [`StarFieldParameters`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum StarFieldChange {
    Count(usize),
    Size(f32),
    Radius(f32),
    Color(Color),
}

impl StarFieldChange {
    pub fn parse(key: &str, value: &str) -> Result<Self, FieldError> {
        let value = value.trim();
        Ok(match key {
            "count" | "starsCount" => Self::Count(parse_count(key, value)?),
            "size" | "starsSize" => Self::Size(parse_float(key, value)?),
            "radius" | "starsRadius" => Self::Radius(parse_float(key, value)?),
            "color" => Self::Color(value.parse()?),
            other => return Err(FieldError::UnknownParameter(other.to_string())),
        })
    }
}

pub(crate) fn parse_count(name: &str, value: &str) -> Result<usize, FieldError> {
    let count = value
        .parse::<i64>()
        .map_err(|err| FieldError::invalid(name, format!("`{value}`: {err}")))?;
    usize::try_from(count)
        .map_err(|_| FieldError::invalid(name, format!("must not be negative, got {count}")))
}

pub(crate) fn parse_branches(value: &str) -> Result<u32, FieldError> {
    let branches = value
        .parse::<i64>()
        .map_err(|err| FieldError::invalid("branches", format!("`{value}`: {err}")))?;
    if branches < 1 {
        return Err(FieldError::invalid(
            "branches",
            format!("must be at least 1, got {branches}"),
        ));
    }
    u32::try_from(branches)
        .map_err(|_| FieldError::invalid("branches", format!("{branches} is too large")))
}

pub(crate) fn parse_float(name: &str, value: &str) -> Result<f32, FieldError> {
    let parsed = value
        .parse::<f32>()
        .map_err(|err| FieldError::invalid(name, format!("`{value}`: {err}")))?;
    validate_finite(name, parsed)?;
    Ok(parsed)
}
