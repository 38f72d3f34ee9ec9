// Shared types module - Presets, modes and HSV parameter sets
use serde::{de, Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::{StoreError, ValidationError};

/// OpenCV 8-bit hue tops out at 180; saturation and value use the full byte
pub const HUE_LIMIT: u16 = 180;
pub const SAT_VAL_LIMIT: u16 = 255;

// Tunable parameter set identifier
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Preset {
    Cone,
    Cube,
}

impl Preset {
    pub const ALL: [Preset; 2] = [Preset::Cone, Preset::Cube];

    pub fn as_str(&self) -> &'static str {
        match self {
            Preset::Cone => "cone",
            Preset::Cube => "cube",
        }
    }

    /// Name of the backing file, e.g. `cone-params.txt`
    pub fn file_name(&self) -> String {
        format!("{}-params.txt", self.as_str())
    }

    pub fn title(&self) -> &'static str {
        match self {
            Preset::Cone => "Cones",
            Preset::Cube => "Cubes",
        }
    }

    /// Endpoint the preset page posts its values to
    pub fn send_route(&self) -> &'static str {
        match self {
            Preset::Cone => "/send-cones",
            Preset::Cube => "/send-cubes",
        }
    }
}

impl FromStr for Preset {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cone" => Ok(Preset::Cone),
            "cube" => Ok(Preset::Cube),
            other => Err(format!("unknown preset '{}'", other)),
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// Operating state of the vision process
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Mode {
    Run,
    Tune,
    Restart,
}

impl Mode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Mode::Run => "run",
            Mode::Tune => "tune",
            Mode::Restart => "restart",
        }
    }
}

impl FromStr for Mode {
    type Err = StoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "run" => Ok(Mode::Run),
            "tune" => Ok(Mode::Tune),
            "restart" => Ok(Mode::Restart),
            other => Err(StoreError::UnknownMode(other.to_string())),
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// HSV threshold bounds for one preset.
///
/// Field order here is the line order of the parameter files. Values arrive
/// from the browser as strings, so deserialization accepts either a JSON
/// number or a numeric string for each bound.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct HsvParams {
    #[serde(deserialize_with = "bound")]
    pub hue_min: u16,
    #[serde(deserialize_with = "bound")]
    pub hue_max: u16,
    #[serde(deserialize_with = "bound")]
    pub sat_min: u16,
    #[serde(deserialize_with = "bound")]
    pub sat_max: u16,
    #[serde(deserialize_with = "bound")]
    pub val_min: u16,
    #[serde(deserialize_with = "bound")]
    pub val_max: u16,
}

impl HsvParams {
    pub const FIELDS: [&'static str; 6] =
        ["hue_min", "hue_max", "sat_min", "sat_max", "val_min", "val_max"];

    /// Bounds that let every pixel through
    pub fn full_range() -> Self {
        HsvParams {
            hue_min: 0,
            hue_max: HUE_LIMIT,
            sat_min: 0,
            sat_max: SAT_VAL_LIMIT,
            val_min: 0,
            val_max: SAT_VAL_LIMIT,
        }
    }

    pub fn from_values(v: [u16; 6]) -> Self {
        HsvParams {
            hue_min: v[0],
            hue_max: v[1],
            sat_min: v[2],
            sat_max: v[3],
            val_min: v[4],
            val_max: v[5],
        }
    }

    pub fn values(&self) -> [u16; 6] {
        [
            self.hue_min,
            self.hue_max,
            self.sat_min,
            self.sat_max,
            self.val_min,
            self.val_max,
        ]
    }

    /// Upper bound for the field at `index` in `FIELDS` order
    pub fn limit(index: usize) -> u16 {
        if index < 2 {
            HUE_LIMIT
        } else {
            SAT_VAL_LIMIT
        }
    }

    pub fn validate(&self) -> Result<(), ValidationError> {
        let values = self.values();
        for (i, (&field, &value)) in Self::FIELDS.iter().zip(values.iter()).enumerate() {
            let max = Self::limit(i);
            if value > max {
                return Err(ValidationError::OutOfRange { field, value, max });
            }
        }

        for pair in [0, 2, 4] {
            if values[pair] > values[pair + 1] {
                return Err(ValidationError::Inverted {
                    min_field: Self::FIELDS[pair],
                    min: values[pair],
                    max_field: Self::FIELDS[pair + 1],
                    max: values[pair + 1],
                });
            }
        }

        Ok(())
    }
}

fn bound<'de, D>(deserializer: D) -> Result<u16, D::Error>
where
    D: Deserializer<'de>,
{
    match serde_json::Value::deserialize(deserializer)? {
        serde_json::Value::Number(n) => n
            .as_u64()
            .and_then(|n| u16::try_from(n).ok())
            .ok_or_else(|| de::Error::custom(format!("{} is not a valid bound", n))),
        serde_json::Value::String(s) => s
            .trim()
            .parse::<u16>()
            .map_err(|_| de::Error::custom(format!("'{}' is not a whole number", s))),
        other => Err(de::Error::custom(format!("expected a number, got {}", other))),
    }
}
