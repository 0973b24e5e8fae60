//! Weather provider: the Open-Meteo forecast API behind a small trait.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{NaiveDate, NaiveDateTime, Timelike};
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::condition::ProviderCondition;
use crate::types::{Coordinate, WeatherError};

const OPEN_METEO_URL: &str = "https://api.open-meteo.com/v1/forecast";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const DEFAULT_FORECAST_DAYS: u32 = 10;

/// Current conditions as the provider reports them
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderCurrent {
    /// Celsius
    pub temperature: f64,
    pub condition: ProviderCondition,
    /// Miles per hour
    pub wind_speed: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderHour {
    pub time: NaiveDateTime,
    pub temperature: f64,
    pub condition: ProviderCondition,
    /// Fraction of one
    pub precipitation_chance: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ProviderDay {
    pub date: NaiveDate,
    pub high: f64,
    pub low: f64,
    pub condition: ProviderCondition,
    /// Fraction of one
    pub precipitation_chance: f64,
}

/// Raw forecast for one coordinate
#[derive(Debug, Clone, PartialEq)]
pub struct ProviderForecast {
    pub current: ProviderCurrent,
    /// Starts at the current hour
    pub hourly: Vec<ProviderHour>,
    pub daily: Vec<ProviderDay>,
}

/// Source of raw forecasts.
#[async_trait]
pub trait WeatherSource: Send + Sync {
    async fn fetch(&self, coordinate: Coordinate) -> Result<ProviderForecast, WeatherError>;
}

#[derive(Debug, Clone)]
pub struct OpenMeteoProvider {
    client: Arc<Client>,
    base_url: String,
    forecast_days: u32,
}

impl OpenMeteoProvider {
    pub fn new() -> Result<Self, WeatherError> {
        Self::with_base_url(OPEN_METEO_URL, Duration::from_secs(REQUEST_TIMEOUT_SECS))
    }

    pub fn with_base_url(base_url: &str, timeout: Duration) -> Result<Self, WeatherError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client: Arc::new(client),
            base_url: base_url.to_string(),
            forecast_days: DEFAULT_FORECAST_DAYS,
        })
    }

    pub fn with_forecast_days(mut self, days: u32) -> Self {
        self.forecast_days = days;
        self
    }

    fn parse_response(response: OpenMeteoResponse) -> Result<ProviderForecast, WeatherError> {
        let now = parse_datetime(&response.current.time)?;
        let current_hour = now
            .with_minute(0)
            .and_then(|t| t.with_second(0))
            .unwrap_or(now);

        let current = ProviderCurrent {
            temperature: response.current.temperature_2m,
            condition: ProviderCondition::from_wmo_code(response.current.weather_code),
            wind_speed: response.current.wind_speed_10m,
        };

        let hourly_data = response.hourly;
        let hourly_len = hourly_data.time.len();
        if hourly_data.temperature_2m.len() != hourly_len || hourly_data.weather_code.len() != hourly_len {
            return Err(WeatherError::Parse("hourly arrays differ in length".into()));
        }

        let mut hourly = Vec::with_capacity(hourly_len);
        for (i, time) in hourly_data.time.iter().enumerate() {
            let time = parse_datetime(time)?;
            if time < current_hour {
                continue;
            }
            let Some(temperature) = hourly_data.temperature_2m[i] else {
                continue;
            };
            hourly.push(ProviderHour {
                time,
                temperature,
                condition: ProviderCondition::from_wmo_code(hourly_data.weather_code[i].unwrap_or(-1)),
                precipitation_chance: percent_to_fraction(
                    hourly_data.precipitation_probability.get(i).copied().flatten(),
                ),
            });
        }

        let daily_data = response.daily;
        let daily_len = daily_data.time.len();
        if daily_data.temperature_2m_max.len() != daily_len
            || daily_data.temperature_2m_min.len() != daily_len
            || daily_data.weather_code.len() != daily_len
        {
            return Err(WeatherError::Parse("daily arrays differ in length".into()));
        }

        let mut daily = Vec::with_capacity(daily_len);
        for (i, date) in daily_data.time.iter().enumerate() {
            let date = NaiveDate::parse_from_str(date, "%Y-%m-%d")
                .map_err(|e| WeatherError::Parse(format!("daily date {:?}: {}", date, e)))?;
            let (Some(high), Some(low)) = (daily_data.temperature_2m_max[i], daily_data.temperature_2m_min[i])
            else {
                continue;
            };
            daily.push(ProviderDay {
                date,
                high,
                low,
                condition: ProviderCondition::from_wmo_code(daily_data.weather_code[i].unwrap_or(-1)),
                precipitation_chance: percent_to_fraction(
                    daily_data.precipitation_probability_max.get(i).copied().flatten(),
                ),
            });
        }

        Ok(ProviderForecast {
            current,
            hourly,
            daily,
        })
    }
}

#[async_trait]
impl WeatherSource for OpenMeteoProvider {
    #[instrument(skip(self), level = "info")]
    async fn fetch(&self, coordinate: Coordinate) -> Result<ProviderForecast, WeatherError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("latitude", coordinate.latitude.to_string()),
                ("longitude", coordinate.longitude.to_string()),
                ("current", "temperature_2m,weather_code,wind_speed_10m".to_string()),
                (
                    "hourly",
                    "temperature_2m,weather_code,precipitation_probability".to_string(),
                ),
                (
                    "daily",
                    "weather_code,temperature_2m_max,temperature_2m_min,precipitation_probability_max"
                        .to_string(),
                ),
                ("temperature_unit", "celsius".to_string()),
                ("wind_speed_unit", "mph".to_string()),
                ("timezone", "auto".to_string()),
                ("forecast_days", self.forecast_days.to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response.text().await.unwrap_or_default();
            return Err(WeatherError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let body: OpenMeteoResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Parse(e.to_string()))?;

        let forecast = Self::parse_response(body)?;
        tracing::debug!(
            hourly = forecast.hourly.len(),
            daily = forecast.daily.len(),
            "Fetched forecast"
        );
        Ok(forecast)
    }
}

fn parse_datetime(s: &str) -> Result<NaiveDateTime, WeatherError> {
    NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M")
        .map_err(|e| WeatherError::Parse(format!("time {:?}: {}", s, e)))
}

fn percent_to_fraction(percent: Option<f64>) -> f64 {
    percent.map(|p| (p / 100.0).clamp(0.0, 1.0)).unwrap_or(0.0)
}

#[derive(Debug, Deserialize)]
struct OpenMeteoResponse {
    current: OpenMeteoCurrent,
    hourly: OpenMeteoHourly,
    daily: OpenMeteoDaily,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoCurrent {
    time: String,
    temperature_2m: f64,
    weather_code: i32,
    wind_speed_10m: f64,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoHourly {
    time: Vec<String>,
    temperature_2m: Vec<Option<f64>>,
    weather_code: Vec<Option<i32>>,
    #[serde(default)]
    precipitation_probability: Vec<Option<f64>>,
}

#[derive(Debug, Deserialize)]
struct OpenMeteoDaily {
    time: Vec<String>,
    weather_code: Vec<Option<i32>>,
    temperature_2m_max: Vec<Option<f64>>,
    temperature_2m_min: Vec<Option<f64>>,
    #[serde(default)]
    precipitation_probability_max: Vec<Option<f64>>,
}
