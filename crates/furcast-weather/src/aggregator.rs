//! Weather aggregation: provider forecast + place name -> display snapshot.

use std::sync::Arc;

use chrono::Timelike;
use tracing::instrument;

use crate::cache::SnapshotCache;
use crate::describe::{DescriptionRequest, DescriptionSource, TemplateDescriber};
use crate::geocode::Geocoder;
use crate::provider::{ProviderForecast, WeatherSource};
use crate::types::{Coordinate, DailyPoint, HourlyPoint, WeatherError, WeatherSnapshot};

/// Place name used when geocoding finds nothing.
pub const UNKNOWN_LOCATION: &str = "Unknown Location";

const DEFAULT_HOURLY_HOURS: usize = 24;

/// Round a percentage to the nearest multiple of 5, halves away from zero.
pub fn round_to_nearest_5(percent: f64) -> u8 {
    ((percent / 5.0).round() * 5.0).clamp(0.0, 100.0) as u8
}

/// Display percentage for a provider fraction; `None` when there is no chance.
///
/// A small nonzero chance still shows, as 0%.
fn precipitation_percent(fraction: f64) -> Option<u8> {
    (fraction > 0.0).then(|| round_to_nearest_5(fraction * 100.0))
}

/// Builds and caches [`WeatherSnapshot`]s.
///
/// Does not retry and does not de-duplicate concurrent misses for the same
/// coordinate: both callers fetch and the later insert wins.
pub struct WeatherAggregator {
    source: Arc<dyn WeatherSource>,
    geocoder: Arc<dyn Geocoder>,
    describer: Arc<dyn DescriptionSource>,
    cache: SnapshotCache,
    hourly_hours: usize,
}

impl std::fmt::Debug for WeatherAggregator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WeatherAggregator")
            .field("cache", &self.cache)
            .field("hourly_hours", &self.hourly_hours)
            .finish_non_exhaustive()
    }
}

impl WeatherAggregator {
    pub fn new(source: Arc<dyn WeatherSource>, geocoder: Arc<dyn Geocoder>) -> Self {
        Self {
            source,
            geocoder,
            describer: Arc::new(TemplateDescriber),
            cache: SnapshotCache::default(),
            hourly_hours: DEFAULT_HOURLY_HOURS,
        }
    }

    pub fn with_describer(mut self, describer: Arc<dyn DescriptionSource>) -> Self {
        self.describer = describer;
        self
    }

    pub fn with_cache(mut self, cache: SnapshotCache) -> Self {
        self.cache = cache;
        self
    }

    pub fn with_hourly_hours(mut self, hours: usize) -> Self {
        self.hourly_hours = hours;
        self
    }

    pub fn cache(&self) -> &SnapshotCache {
        &self.cache
    }

    /// Weather for a coordinate, from cache when fresh.
    ///
    /// # Errors
    /// Provider and geocoding failures are returned as-is; callers are
    /// expected to show last-known or sample data instead.
    #[instrument(skip(self), level = "info")]
    pub async fn fetch_weather(
        &self,
        latitude: f64,
        longitude: f64,
    ) -> Result<Arc<WeatherSnapshot>, WeatherError> {
        let coordinate = Coordinate::new(latitude, longitude);
        let key = coordinate.cache_key();

        if let Some(snapshot) = self.cache.get(&key) {
            tracing::debug!("Weather cache hit for {}", key);
            return Ok(snapshot);
        }
        tracing::debug!("Weather cache miss for {}", key);

        let forecast = self.source.fetch(coordinate).await?;
        let location = self
            .geocoder
            .reverse_geocode(coordinate)
            .await?
            .unwrap_or_else(|| UNKNOWN_LOCATION.to_string());

        let snapshot = Arc::new(self.assemble(forecast, location).await);
        self.cache.insert(key, snapshot.clone());

        tracing::info!(
            location = %snapshot.location,
            temp = snapshot.current_temp,
            condition = %snapshot.condition,
            "Assembled weather snapshot"
        );
        Ok(snapshot)
    }

    async fn assemble(&self, forecast: ProviderForecast, location: String) -> WeatherSnapshot {
        // Integer temperatures truncate toward zero.
        let current_temp = forecast.current.temperature as i32;
        let condition = forecast.current.condition.coarse().label().to_string();

        let today = forecast.daily.first();
        let high_temp = today.map(|d| d.high as i32).unwrap_or(current_temp);
        let low_temp = today.map(|d| d.low as i32).unwrap_or(current_temp);

        let hour = forecast
            .hourly
            .first()
            .map(|h| h.time.hour())
            .unwrap_or_else(|| chrono::Local::now().hour());

        let hourly = forecast
            .hourly
            .iter()
            .take(self.hourly_hours)
            .enumerate()
            .map(|(i, h)| HourlyPoint {
                time_label: if i == 0 {
                    "Now".to_string()
                } else {
                    h.time.format("%-I%p").to_string()
                },
                temperature: h.temperature as i32,
                condition: h.condition.tag(),
                precipitation_chance: precipitation_percent(h.precipitation_chance),
            })
            .collect();

        let daily = forecast
            .daily
            .iter()
            .enumerate()
            .map(|(i, d)| DailyPoint {
                day_label: if i == 0 {
                    "Today".to_string()
                } else {
                    d.date.format("%a").to_string()
                },
                condition: d.condition.tag(),
                low_temp: d.low as i32,
                high_temp: d.high as i32,
                precipitation_chance: precipitation_percent(d.precipitation_chance),
            })
            .collect();

        let description = self
            .describer
            .describe(&DescriptionRequest {
                location: location.clone(),
                temperature: current_temp,
                high: high_temp,
                low: low_temp,
                condition: condition.clone(),
                wind_speed: forecast.current.wind_speed,
                hour,
            })
            .await;

        WeatherSnapshot {
            location,
            current_temp,
            condition,
            high_temp,
            low_temp,
            description,
            hourly,
            daily,
        }
    }
}
