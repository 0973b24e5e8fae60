use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Temperature unit preference.
///
/// Temperatures are always stored in Celsius; the unit only matters when a
/// value is shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum TemperatureUnit {
    #[default]
    Celsius,
    Fahrenheit,
}

impl TemperatureUnit {
    /// Convert a Celsius temperature to this unit, rounding half away from zero.
    pub fn convert(self, celsius: i32) -> i32 {
        match self {
            Self::Celsius => celsius,
            Self::Fahrenheit => (f64::from(celsius) * 9.0 / 5.0 + 32.0).round() as i32,
        }
    }

    /// The other unit.
    pub fn toggled(self) -> Self {
        match self {
            Self::Celsius => Self::Fahrenheit,
            Self::Fahrenheit => Self::Celsius,
        }
    }

    pub fn symbol(self) -> &'static str {
        match self {
            Self::Celsius => "°C",
            Self::Fahrenheit => "°F",
        }
    }

    /// String form used by the `temperatureUnit` settings key.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Celsius => "celsius",
            Self::Fahrenheit => "fahrenheit",
        }
    }

    pub fn is_celsius(self) -> bool {
        self == Self::Celsius
    }

    /// Inverse of [`is_celsius`](Self::is_celsius), for the `isCelsius` key.
    pub fn from_is_celsius(is_celsius: bool) -> Self {
        if is_celsius {
            Self::Celsius
        } else {
            Self::Fahrenheit
        }
    }
}

/// Free-function form of [`TemperatureUnit::convert`].
pub fn convert(celsius: i32, unit: TemperatureUnit) -> i32 {
    unit.convert(celsius)
}

/// Free-function form of [`TemperatureUnit::toggled`].
pub fn toggle(unit: TemperatureUnit) -> TemperatureUnit {
    unit.toggled()
}

impl fmt::Display for TemperatureUnit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Unknown temperature unit: {0}")]
pub struct ParseUnitError(pub String);

impl FromStr for TemperatureUnit {
    type Err = ParseUnitError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "celsius" | "c" => Ok(Self::Celsius),
            "fahrenheit" | "f" => Ok(Self::Fahrenheit),
            other => Err(ParseUnitError(other.to_string())),
        }
    }
}
