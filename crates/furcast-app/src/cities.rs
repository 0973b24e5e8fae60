//! City list: theme asset assignment, location fixes and per-city weather.

use std::sync::Arc;

use parking_lot::{Mutex, RwLock};
use rand::seq::SliceRandom;
use rand::Rng;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio::task::{JoinHandle, JoinSet};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use furcast_core::{AppError, SettingsStore};
use furcast_weather::{
    Coordinate, LocationEvent, PositioningService, WeatherAggregator, WeatherSnapshot,
};

use crate::error_mapping::IntoAppError;

const UPDATE_CAPACITY: usize = 16;

/// A city shown as one page of the app.
#[derive(Debug, Clone, PartialEq)]
pub struct City {
    pub id: Uuid,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
    /// Background animation; `None` when the pool ran out
    pub theme_asset: Option<String>,
    /// Coordinates follow the device position
    pub is_current_location: bool,
}

impl City {
    pub fn new(name: impl Into<String>, latitude: f64, longitude: f64) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            latitude,
            longitude,
            theme_asset: None,
            is_current_location: false,
        }
    }

    /// Placeholder entry at (0, 0) until the first location fix.
    pub fn current_location() -> Self {
        Self {
            is_current_location: true,
            ..Self::new("Current Location", 0.0, 0.0)
        }
    }

    pub fn coordinate(&self) -> Coordinate {
        Coordinate::new(self.latitude, self.longitude)
    }

    /// Assigned asset, or `fallback` for cities the pool did not cover.
    pub fn theme_asset_or<'a>(&'a self, fallback: &'a str) -> &'a str {
        self.theme_asset.as_deref().unwrap_or(fallback)
    }

    /// The default list: the device location followed by six fixed cities.
    pub fn sample_cities() -> Vec<Self> {
        vec![
            Self::current_location(),
            Self::new("Vancouver", 49.2827, -123.1207),
            Self::new("Boston", 42.3601, -71.0589),
            Self::new("Sandwich", 43.7792, -71.4050),
            Self::new("New York", 40.7128, -74.0060),
            Self::new("Salt Lake City", 40.7608, -111.8910),
            Self::new("San Francisco", 37.7749, -122.4194),
        ]
    }
}

/// A change applied to the city list
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CityUpdate {
    /// The current-location city at `index` moved to `coordinate`
    LocationFixed { index: usize, coordinate: Coordinate },
}

/// Outcome of [`CityListController::prefetch_all`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PrefetchSummary {
    pub succeeded: usize,
    pub failed: usize,
}

/// Owns the city list and keeps the current-location entry up to date.
///
/// The list is shared between the display path and the location listener.
/// Only the coordinates of the current-location city ever change; ids,
/// names and theme assets are fixed at construction.
pub struct CityListController {
    cities: Arc<RwLock<Vec<City>>>,
    updates: broadcast::Sender<CityUpdate>,
    listener: Mutex<Option<Listener>>,
    shutdown: CancellationToken,
}

struct Listener {
    handle: JoinHandle<()>,
    token: CancellationToken,
}

impl Listener {
    fn stop(self) {
        self.token.cancel();
        self.handle.abort();
    }
}

impl std::fmt::Debug for CityListController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CityListController")
            .field("cities", &self.cities.read().len())
            .finish_non_exhaustive()
    }
}

impl CityListController {
    /// Give each city a distinct asset drawn from `asset_pool`.
    ///
    /// Cities past the size of the pool keep `theme_asset: None`.
    pub fn new<R: Rng + ?Sized>(mut cities: Vec<City>, asset_pool: &[String], rng: &mut R) -> Self {
        let drawn = asset_pool.choose_multiple(rng, cities.len());
        for (city, asset) in cities.iter_mut().zip(drawn) {
            city.theme_asset = Some(asset.clone());
        }
        if asset_pool.len() < cities.len() {
            tracing::warn!(
                "Only {} theme assets for {} cities",
                asset_pool.len(),
                cities.len()
            );
        }

        let (updates, _) = broadcast::channel(UPDATE_CAPACITY);
        Self {
            cities: Arc::new(RwLock::new(cities)),
            updates,
            listener: Mutex::new(None),
            shutdown: CancellationToken::new(),
        }
    }

    /// Snapshot of the list.
    pub fn cities(&self) -> Vec<City> {
        self.cities.read().clone()
    }

    pub fn city(&self, index: usize) -> Option<City> {
        self.cities.read().get(index).cloned()
    }

    pub fn len(&self) -> usize {
        self.cities.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.cities.read().is_empty()
    }

    pub fn subscribe_updates(&self) -> broadcast::Receiver<CityUpdate> {
        self.updates.subscribe()
    }

    /// Start following the device position.
    ///
    /// Subscribes before asking for anything so no event is missed, then asks
    /// for permission (or directly for a fix when already authorized). Every
    /// fix is also written to the settings store for the widget. Calling this
    /// again replaces the previous listener, also after [`stop`](Self::stop).
    pub fn start(&self, positioning: Arc<dyn PositioningService>, settings: SettingsStore) {
        let mut events = positioning.subscribe();
        let cities = self.cities.clone();
        let updates = self.updates.clone();
        let token = self.shutdown.child_token();
        let shutdown = token.clone();
        let service = positioning.clone();

        let handle = tokio::spawn(async move {
            loop {
                let event = tokio::select! {
                    _ = shutdown.cancelled() => break,
                    event = events.recv() => event,
                };

                match event {
                    Ok(LocationEvent::Authorization(status)) => {
                        tracing::info!("Location authorization: {:?}", status);
                        if status.is_authorized() {
                            service.request_location();
                        }
                    }
                    Ok(LocationEvent::Fix(coordinate)) => {
                        apply_fix(&cities, &updates, &settings, coordinate);
                    }
                    Ok(LocationEvent::Failed(reason)) => {
                        tracing::warn!("Location error: {}", reason);
                    }
                    Err(RecvError::Lagged(skipped)) => {
                        tracing::warn!("Location listener skipped {} events", skipped);
                    }
                    Err(RecvError::Closed) => {
                        tracing::debug!("Positioning service closed");
                        break;
                    }
                }
            }
        });

        if let Some(previous) = self.listener.lock().replace(Listener { handle, token }) {
            previous.stop();
        }

        if positioning.authorization_status().is_authorized() {
            positioning.request_location();
        } else {
            positioning.request_permission();
        }
    }

    /// Stop the location listener. A later `start` follows the position again.
    pub fn stop(&self) {
        if let Some(listener) = self.listener.lock().take() {
            listener.stop();
        }
    }

    /// Fetch every city concurrently to warm the aggregator's cache.
    ///
    /// Failures are logged and counted, never propagated.
    pub async fn prefetch_all(&self, aggregator: Arc<WeatherAggregator>) -> PrefetchSummary {
        let mut tasks = JoinSet::new();
        for city in self.cities() {
            let aggregator = aggregator.clone();
            tasks.spawn(async move {
                let result = aggregator.fetch_weather(city.latitude, city.longitude).await;
                (city.name, result)
            });
        }

        let mut summary = PrefetchSummary::default();
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((_, Ok(_))) => summary.succeeded += 1,
                Ok((name, Err(e))) => {
                    tracing::warn!("Prefetch for {} failed: {}", name, e);
                    summary.failed += 1;
                }
                Err(e) => {
                    tracing::warn!("Prefetch task failed: {}", e);
                    summary.failed += 1;
                }
            }
        }

        tracing::info!(
            succeeded = summary.succeeded,
            failed = summary.failed,
            "Prefetched city weather"
        );
        summary
    }

    /// Weather for the city at `index`, falling back to sample data.
    ///
    /// Returns `None` only when `index` is out of range.
    pub async fn weather_for(
        &self,
        index: usize,
        aggregator: &WeatherAggregator,
    ) -> Option<Arc<WeatherSnapshot>> {
        let city = self.city(index)?;
        match aggregator.fetch_weather(city.latitude, city.longitude).await {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                let app_error = e.into_app_error();
                tracing::warn!(
                    "Weather for {} unavailable ({}): {}",
                    city.name,
                    app_error,
                    app_error.user_message()
                );
                Some(Arc::new(WeatherSnapshot::sample()))
            }
        }
    }
}

impl Drop for CityListController {
    fn drop(&mut self) {
        self.shutdown.cancel();
    }
}

fn apply_fix(
    cities: &RwLock<Vec<City>>,
    updates: &broadcast::Sender<CityUpdate>,
    settings: &SettingsStore,
    coordinate: Coordinate,
) {
    if let Err(e) = settings.set_current_location(coordinate.latitude, coordinate.longitude) {
        let e = AppError::from(e);
        tracing::warn!("Failed to store location fix ({}): {}", e, e.user_message());
    }

    let index = {
        let mut cities = cities.write();
        let Some((index, city)) = cities
            .iter_mut()
            .enumerate()
            .find(|(_, c)| c.is_current_location)
        else {
            tracing::debug!("No current-location city; fix at {} ignored", coordinate);
            return;
        };
        city.latitude = coordinate.latitude;
        city.longitude = coordinate.longitude;
        index
    };

    tracing::info!("Current location updated to {}", coordinate);
    // Nobody listening is fine.
    let _ = updates.send(CityUpdate::LocationFixed { index, coordinate });
}
