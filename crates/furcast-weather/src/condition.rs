//! The provider's condition taxonomy and the two tables that fold it onto
//! Furcast's display categories.

use serde::{Deserialize, Serialize};

use crate::types::{CoarseCondition, ConditionTag};

/// Conditions as reported by the weather provider.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProviderCondition {
    Clear,
    MostlyClear,
    PartlyCloudy,
    Cloudy,
    Foggy,
    Drizzle,
    Rain,
    HeavyRain,
    FreezingDrizzle,
    FreezingRain,
    Snow,
    HeavySnow,
    Flurries,
    Sleet,
    Thunderstorms,
    Unknown(i32),
}

impl ProviderCondition {
    /// Every named condition, for exhaustive checks.
    pub const ALL: [ProviderCondition; 15] = [
        Self::Clear,
        Self::MostlyClear,
        Self::PartlyCloudy,
        Self::Cloudy,
        Self::Foggy,
        Self::Drizzle,
        Self::Rain,
        Self::HeavyRain,
        Self::FreezingDrizzle,
        Self::FreezingRain,
        Self::Snow,
        Self::HeavySnow,
        Self::Flurries,
        Self::Sleet,
        Self::Thunderstorms,
    ];

    /// Decode a WMO weather interpretation code.
    /// See: https://open-meteo.com/en/docs#weathervariables
    pub fn from_wmo_code(code: i32) -> Self {
        match code {
            0 => Self::Clear,
            1 => Self::MostlyClear,
            2 => Self::PartlyCloudy,
            3 => Self::Cloudy,
            45 | 48 => Self::Foggy,
            51 | 53 | 55 => Self::Drizzle,
            56 | 57 => Self::FreezingDrizzle,
            61 | 63 | 80 | 81 => Self::Rain,
            65 | 82 => Self::HeavyRain,
            66 | 67 => Self::FreezingRain,
            71 | 73 | 85 => Self::Snow,
            75 | 86 => Self::HeavySnow,
            77 => Self::Flurries,
            // WMO has no dedicated sleet code; rain and snow showers mixed
            68 | 69 | 83 | 84 => Self::Sleet,
            95 | 96 | 99 => Self::Thunderstorms,
            other => Self::Unknown(other),
        }
    }

    /// Coarse label for the current conditions.
    pub fn coarse(self) -> CoarseCondition {
        match self {
            Self::Clear | Self::MostlyClear => CoarseCondition::Clear,
            Self::Cloudy | Self::PartlyCloudy => CoarseCondition::Cloudy,
            Self::Rain | Self::Drizzle | Self::HeavyRain => CoarseCondition::Rain,
            Self::Snow | Self::Sleet | Self::Flurries | Self::HeavySnow => CoarseCondition::Snow,
            Self::Thunderstorms => CoarseCondition::Storms,
            _ => CoarseCondition::Cloudy,
        }
    }

    /// Icon category. Snow and storms have no icon of their own.
    pub fn tag(self) -> ConditionTag {
        match self {
            Self::Clear | Self::MostlyClear => ConditionTag::Clear,
            Self::Cloudy => ConditionTag::Cloudy,
            Self::PartlyCloudy => ConditionTag::PartlyCloudy,
            Self::Rain | Self::Drizzle | Self::HeavyRain => ConditionTag::Rainy,
            _ => ConditionTag::Cloudy,
        }
    }
}
