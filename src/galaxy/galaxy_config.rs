use std::fmt::Display;
use std::path::Path;

use bevy::prelude::*;
use serde::{Deserialize, Serialize};

use super::{ConfigError, GalaxyError};

/// Immutable snapshot of everything that shapes a generated galaxy.
///
/// The control panel edits its own copy (`GalaxyConfigUi`) and hands out a fresh
/// snapshot whenever an edit is committed.
#[derive(Clone, Copy, PartialEq, Debug, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GalaxyParams {
    pub count: u32,
    /// Point diameter in world units, display only.
    pub size: f32,
    pub radius: f32,
    pub branches: u32,
    /// Radians of twist per unit radius.
    pub spin: f32,
    pub randomness: f32,
    pub randomness_power: f32,
    #[serde(with = "hex_color")]
    pub inside_color: Srgba,
    #[serde(with = "hex_color")]
    pub outside_color: Srgba,
}

impl Default for GalaxyParams {
    fn default() -> Self {
        Self {
            count: 200_000,
            size: 0.005,
            radius: 5.0,
            branches: 5,
            spin: 1.2,
            randomness: 0.4,
            randomness_power: 3.0,
            inside_color: Srgba::rgb_u8(0xff, 0xcc, 0xaa),
            outside_color: Srgba::rgb_u8(0x1b, 0x39, 0x84),
        }
    }
}

impl GalaxyParams {
    pub const MIN: Self = Self {
        count: 100,
        size: 0.001,
        radius: 0.1,
        branches: 2,
        spin: -3.0,
        randomness: 0.0,
        randomness_power: 1.0,
        inside_color: Srgba::BLACK,
        outside_color: Srgba::BLACK,
    };
    pub const MAX: Self = Self {
        count: 1_000_000,
        size: 0.1,
        radius: 20.0,
        branches: 15,
        spin: 3.0,
        randomness: 2.0,
        randomness_power: 10.0,
        inside_color: Srgba::WHITE,
        outside_color: Srgba::WHITE,
    };

    /// The minimum a galaxy needs to be generated at all: some points, at least
    /// one arm and a radius that can be divided by.
    pub fn check_shape(&self) -> Result<(), GalaxyError> {
        if self.count == 0 {
            return Err(GalaxyError::invalid("count", "must be positive"));
        }
        if self.branches < 1 {
            return Err(GalaxyError::invalid("branches", "must be at least 1"));
        }
        if !(self.radius.is_finite() && self.radius > 0.0) {
            return Err(GalaxyError::invalid(
                "radius",
                format!("must be a positive number, got {}", self.radius),
            ));
        }
        Ok(())
    }

    /// Full validation against the `MIN`/`MAX` bounds.
    pub fn validate(&self) -> Result<(), GalaxyError> {
        self.check_shape()?;

        let (min, max) = (Self::MIN, Self::MAX);
        check_bounds("count", self.count, min.count, max.count)?;
        check_bounds("size", self.size, min.size, max.size)?;
        check_bounds("radius", self.radius, min.radius, max.radius)?;
        check_bounds("branches", self.branches, min.branches, max.branches)?;
        check_bounds("spin", self.spin, min.spin, max.spin)?;
        check_bounds("randomness", self.randomness, min.randomness, max.randomness)?;
        check_bounds(
            "randomness_power",
            self.randomness_power,
            min.randomness_power,
            max.randomness_power,
        )?;
        check_color("inside_color", self.inside_color)?;
        check_color("outside_color", self.outside_color)
    }

    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let params: Self = toml::from_str(source)?;
        params.validate()?;
        Ok(params)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let source = std::fs::read_to_string(path)?;
        Self::from_toml_str(&source)
    }
}

fn check_bounds<T>(name: &'static str, value: T, min: T, max: T) -> Result<(), GalaxyError>
where
    T: PartialOrd + Display + Copy,
{
    // written so NaN fails too
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(GalaxyError::invalid(
            name,
            format!("{value} is outside [{min}, {max}]"),
        ))
    }
}

fn check_color(name: &'static str, color: Srgba) -> Result<(), GalaxyError> {
    for channel in [color.red, color.green, color.blue] {
        check_bounds(name, channel, 0.0, 1.0)?;
    }
    Ok(())
}

/// Working copy owned by the control panel.
#[derive(Resource, Clone, Debug, Default)]
pub struct GalaxyConfigUi {
    pub params: GalaxyParams,
}

mod hex_color {
    use bevy::color::Srgba;
    use serde::{de::Error, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(color: &Srgba, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&color.to_hex())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Srgba, D::Error> {
        let hex = String::deserialize(deserializer)?;
        Srgba::hex(&hex).map_err(D::Error::custom)
    }
}
