use serde::{Deserialize, Serialize};
use std::fmt;

/// Geographic coordinate in decimal degrees
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinate {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinate {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Cache key for this coordinate. No rounding is applied, so two
    /// differently-rounded coordinates for the same place are distinct keys.
    pub fn cache_key(&self) -> String {
        format!("{},{}", self.latitude, self.longitude)
    }
}

impl fmt::Display for Coordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4}, {:.4}", self.latitude, self.longitude)
    }
}

/// Display category used for hourly/daily iconography.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConditionTag {
    Clear,
    Cloudy,
    Rainy,
    PartlyCloudy,
}

impl ConditionTag {
    pub fn icon_name(&self) -> &'static str {
        match self {
            Self::Clear => "sun.max.fill",
            Self::Cloudy => "cloud.fill",
            Self::Rainy => "cloud.rain.fill",
            Self::PartlyCloudy => "cloud.sun.fill",
        }
    }
}

/// Coarse label for the current conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CoarseCondition {
    Clear,
    Cloudy,
    Rain,
    Snow,
    Storms,
}

impl CoarseCondition {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Clear => "Clear",
            Self::Cloudy => "Cloudy",
            Self::Rain => "Rain",
            Self::Snow => "Snow",
            Self::Storms => "Storms",
        }
    }
}

impl fmt::Display for CoarseCondition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// One of the next 24 hours
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HourlyPoint {
    pub time_label: String,
    pub temperature: i32,
    pub condition: ConditionTag,
    /// Percent, multiple of 5; `None` when there is no chance
    pub precipitation_chance: Option<u8>,
}

/// One forecast day
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DailyPoint {
    pub day_label: String,
    pub condition: ConditionTag,
    pub low_temp: i32,
    pub high_temp: i32,
    pub precipitation_chance: Option<u8>,
}

/// Assembled weather for one coordinate at one point in time.
///
/// Temperatures are Celsius. A snapshot is never modified after it is
/// built; a refresh replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeatherSnapshot {
    pub location: String,
    pub current_temp: i32,
    pub condition: String,
    pub high_temp: i32,
    pub low_temp: i32,
    pub description: String,
    pub hourly: Vec<HourlyPoint>,
    pub daily: Vec<DailyPoint>,
}

impl WeatherSnapshot {
    /// Placeholder shown when nothing better is available.
    pub fn sample() -> Self {
        let hour = |time: &str, temperature, condition, precipitation_chance| HourlyPoint {
            time_label: time.to_string(),
            temperature,
            condition,
            precipitation_chance,
        };
        let day = |label: &str, condition, low_temp, high_temp, precipitation_chance| DailyPoint {
            day_label: label.to_string(),
            condition,
            low_temp,
            high_temp,
            precipitation_chance,
        };

        Self {
            location: "Joniec".to_string(),
            current_temp: 12,
            condition: "Rain".to_string(),
            high_temp: 19,
            low_temp: 11,
            description: "Cloudy conditions expected around 8AM. Wind gusts are up to 15 mph."
                .to_string(),
            hourly: vec![
                hour("Now", 12, ConditionTag::Rainy, None),
                hour("6AM", 12, ConditionTag::Rainy, Some(35)),
                hour("7AM", 13, ConditionTag::Rainy, Some(30)),
                hour("8AM", 14, ConditionTag::Cloudy, None),
                hour("9AM", 14, ConditionTag::Cloudy, None),
                hour("10AM", 15, ConditionTag::Cloudy, None),
            ],
            daily: vec![
                day("Today", ConditionTag::Rainy, 11, 19, Some(70)),
                day("Thu", ConditionTag::Clear, 8, 19, None),
                day("Fri", ConditionTag::Cloudy, 8, 20, None),
                day("Sat", ConditionTag::Clear, 10, 23, None),
            ],
        }
    }
}

/// Positioning errors
#[derive(Debug, Clone, thiserror::Error)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,
    #[error("Location service unavailable")]
    ServiceUnavailable,
    #[error("Location error: {0}")]
    Other(String),
}

/// Weather provider and geocoding errors
#[derive(Debug, thiserror::Error)]
pub enum WeatherError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("Weather API returned {status}: {message}")]
    Api { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Geocoding failed: {0}")]
    Geocode(String),
    #[error("Location error: {0}")]
    Location(#[from] LocationError),
}
