//! Home-screen widget: timeline entries, the unit toggle and a refresh loop.
//!
//! The widget runs apart from the app and shares only the settings store
//! with it. It talks to the provider directly and keeps no cache.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Local};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;
use tracing::instrument;

use furcast_core::{units, AppError, SettingsStore, TemperatureUnit};
use furcast_weather::{Coordinate, Geocoder, WeatherSource};

use crate::error_mapping::IntoAppError;

const PLACEHOLDER_CITY: &str = "Loading...";
const UNAVAILABLE_CITY: &str = "Unavailable";
const CURRENT_LOCATION_CITY: &str = "Current Location";
const UNNAMED_CITY: &str = "Unknown";
const RELOAD_CAPACITY: usize = 8;

/// One rendered state of the widget. Temperatures are stored in Celsius.
#[derive(Debug, Clone, PartialEq)]
pub struct WidgetEntry {
    pub date: DateTime<Local>,
    pub city_name: String,
    pub current_temp: i32,
    pub high_temp: i32,
    pub low_temp: i32,
    pub condition: String,
    pub icon: String,
    pub is_celsius: bool,
}

impl WidgetEntry {
    /// Canned entry with the given city name, used before and instead of data.
    fn canned(city_name: &str, is_celsius: bool) -> Self {
        Self {
            date: Local::now(),
            city_name: city_name.to_string(),
            current_temp: 20,
            high_temp: 25,
            low_temp: 15,
            condition: "Clear".to_string(),
            icon: "sun.max.fill".to_string(),
            is_celsius,
        }
    }

    pub fn unit(&self) -> TemperatureUnit {
        TemperatureUnit::from_is_celsius(self.is_celsius)
    }

    pub fn display_current_temp(&self) -> i32 {
        units::convert(self.current_temp, self.unit())
    }

    pub fn display_high_temp(&self) -> i32 {
        units::convert(self.high_temp, self.unit())
    }

    pub fn display_low_temp(&self) -> i32 {
        units::convert(self.low_temp, self.unit())
    }

    pub fn temp_unit(&self) -> &'static str {
        self.unit().symbol()
    }
}

/// Entries to show plus when to ask again.
#[derive(Debug, Clone, PartialEq)]
pub struct Timeline {
    pub entries: Vec<WidgetEntry>,
    pub next_refresh: DateTime<Local>,
}

/// Builds widget entries for the last location the app stored.
pub struct WidgetTimelineProvider {
    source: Arc<dyn WeatherSource>,
    geocoder: Arc<dyn Geocoder>,
    settings: SettingsStore,
    fallback: Coordinate,
    refresh: Duration,
}

impl std::fmt::Debug for WidgetTimelineProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WidgetTimelineProvider")
            .field("fallback", &self.fallback)
            .field("refresh", &self.refresh)
            .finish_non_exhaustive()
    }
}

impl WidgetTimelineProvider {
    pub fn new(
        source: Arc<dyn WeatherSource>,
        geocoder: Arc<dyn Geocoder>,
        settings: SettingsStore,
        fallback: Coordinate,
        refresh: Duration,
    ) -> Self {
        Self {
            source,
            geocoder,
            settings,
            fallback,
            refresh,
        }
    }

    pub fn refresh_interval(&self) -> Duration {
        self.refresh
    }

    /// Shown while the first real entry loads.
    pub fn placeholder(&self) -> WidgetEntry {
        WidgetEntry::canned(PLACEHOLDER_CITY, true)
    }

    /// Current entry. Never fails; a provider error yields the
    /// "Unavailable" entry in the stored unit.
    #[instrument(skip(self))]
    pub async fn entry(&self) -> WidgetEntry {
        let is_celsius = self.settings.unit().is_celsius();
        let coordinate = self
            .settings
            .current_location()
            .map(|(lat, lon)| Coordinate::new(lat, lon))
            .unwrap_or(self.fallback);

        let forecast = match self.source.fetch(coordinate).await {
            Ok(forecast) => forecast,
            Err(e) => {
                tracing::warn!(
                    "Widget weather fetch failed: {}",
                    e.into_app_error().user_message()
                );
                return WidgetEntry::canned(UNAVAILABLE_CITY, is_celsius);
            }
        };

        let city_name = match self.geocoder.reverse_geocode(coordinate).await {
            Ok(Some(name)) => name,
            Ok(None) => UNNAMED_CITY.to_string(),
            Err(e) => {
                tracing::debug!("Widget geocoding failed: {}", e);
                CURRENT_LOCATION_CITY.to_string()
            }
        };

        let current_temp = forecast.current.temperature as i32;
        let today = forecast.daily.first();
        let condition = forecast.current.condition;

        WidgetEntry {
            date: Local::now(),
            city_name,
            current_temp,
            high_temp: today.map(|d| d.high as i32).unwrap_or(current_temp),
            low_temp: today.map(|d| d.low as i32).unwrap_or(current_temp),
            condition: condition.coarse().label().to_string(),
            icon: condition.tag().icon_name().to_string(),
            is_celsius,
        }
    }

    pub async fn timeline(&self) -> Timeline {
        let entry = self.entry().await;
        let refresh = chrono::Duration::from_std(self.refresh)
            .unwrap_or_else(|_| chrono::Duration::minutes(30));
        Timeline {
            next_refresh: entry.date + refresh,
            entries: vec![entry],
        }
    }
}

/// Signal asking every widget to rebuild its timeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ReloadAllTimelines;

/// Widget button that flips the shared temperature unit.
#[derive(Debug, Clone)]
pub struct ToggleTemperatureIntent {
    settings: SettingsStore,
    reload: broadcast::Sender<ReloadAllTimelines>,
}

impl ToggleTemperatureIntent {
    pub fn new(settings: SettingsStore, reload: broadcast::Sender<ReloadAllTimelines>) -> Self {
        Self { settings, reload }
    }

    /// A reload channel for wiring intents to schedulers.
    pub fn reload_channel() -> (
        broadcast::Sender<ReloadAllTimelines>,
        broadcast::Receiver<ReloadAllTimelines>,
    ) {
        broadcast::channel(RELOAD_CAPACITY)
    }

    /// Flip the unit, persist it and ask for a reload.
    ///
    /// Nothing is reloaded when the new unit could not be stored.
    pub fn perform(&self) -> Result<TemperatureUnit, AppError> {
        let previous = self.settings.unit();
        let unit = self.settings.toggle()?;
        tracing::info!("Widget toggle: {} -> {}", previous, unit);

        if self.reload.send(ReloadAllTimelines).is_err() {
            tracing::debug!("No widget timelines to reload");
        }
        Ok(unit)
    }
}

/// Drives a widget: one entry per refresh interval or reload signal.
pub struct WidgetScheduler {
    provider: Arc<WidgetTimelineProvider>,
    reload: broadcast::Receiver<ReloadAllTimelines>,
}

impl WidgetScheduler {
    pub fn new(
        provider: Arc<WidgetTimelineProvider>,
        reload: broadcast::Receiver<ReloadAllTimelines>,
    ) -> Self {
        Self { provider, reload }
    }

    /// Emit a timeline immediately, then on every tick or reload, until
    /// `shutdown` fires.
    pub async fn run<F>(mut self, shutdown: CancellationToken, mut on_timeline: F)
    where
        F: FnMut(Timeline) + Send,
    {
        let mut ticker = tokio::time::interval(self.provider.refresh_interval());
        ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
        let mut reload_open = true;

        loop {
            tokio::select! {
                biased;
                _ = shutdown.cancelled() => break,
                _ = ticker.tick() => {}
                signal = self.reload.recv(), if reload_open => match signal {
                    Ok(ReloadAllTimelines) => tracing::debug!("Reloading widget timeline"),
                    Err(RecvError::Lagged(_)) => {}
                    Err(RecvError::Closed) => {
                        reload_open = false;
                        continue;
                    }
                },
            }

            on_timeline(self.provider.timeline().await);
        }

        tracing::info!("Widget scheduler stopped");
    }
}
