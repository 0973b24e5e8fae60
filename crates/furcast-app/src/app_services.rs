//! Application services wired from configuration.
//!
//! `AppServices` owns one instance of every shared service: the weather
//! aggregator with its snapshot cache, the settings store shared with the
//! widget, the color extractor and the city list. Everything is cheap to
//! share through `Arc`; shutdown is coordinated with a cancellation token.

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::broadcast;
use tokio_util::sync::CancellationToken;

use furcast_core::{Config, FileDefaults, SettingsStore, SharedDefaults};
use furcast_theme::{AssetSource, ColorExtractor, DirAssetSource, Theme};
use furcast_weather::{
    ChatDescriber, Coordinate, DescriptionSource, Geocoder, NominatimGeocoder, OpenMeteoProvider,
    SnapshotCache, TemplateDescriber, WeatherAggregator, WeatherSource,
};

use crate::cities::{City, CityListController};
use crate::widget::{
    ReloadAllTimelines, ToggleTemperatureIntent, WidgetScheduler, WidgetTimelineProvider,
};

pub struct AppServices {
    config: Config,
    aggregator: Arc<WeatherAggregator>,
    settings: SettingsStore,
    colors: Arc<ColorExtractor>,
    cities: Arc<CityListController>,
    widget: Arc<WidgetTimelineProvider>,
    reload_tx: broadcast::Sender<ReloadAllTimelines>,
    shutdown: CancellationToken,
}

impl std::fmt::Debug for AppServices {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppServices")
            .field("aggregator", &self.aggregator)
            .field("cities", &self.cities)
            .finish_non_exhaustive()
    }
}

impl AppServices {
    /// Build every service from `config`.
    ///
    /// # Errors
    /// Fails only when an HTTP client cannot be constructed.
    pub fn from_config(config: Config) -> Result<Self> {
        let timeout = Duration::from_secs(config.weather.request_timeout_secs);
        let source: Arc<dyn WeatherSource> = Arc::new(
            OpenMeteoProvider::with_base_url(&config.weather.base_url, timeout)
                .context("Failed to create weather provider")?
                .with_forecast_days(config.weather.forecast_days),
        );
        let geocoder: Arc<dyn Geocoder> = Arc::new(
            NominatimGeocoder::with_base_url(&config.geocoding.base_url, &config.geocoding.user_agent)
                .context("Failed to create geocoder")?,
        );
        let describer = Self::describer(&config)?;
        let defaults: Arc<dyn SharedDefaults> =
            Arc::new(FileDefaults::open(&config.settings.shared_path));
        let assets: Arc<dyn AssetSource> = Arc::new(DirAssetSource::new(&config.theme.asset_dir));

        Ok(Self::assemble(config, source, geocoder, describer, defaults, assets))
    }

    /// Wire services around the given backends.
    pub fn assemble(
        config: Config,
        source: Arc<dyn WeatherSource>,
        geocoder: Arc<dyn Geocoder>,
        describer: Arc<dyn DescriptionSource>,
        defaults: Arc<dyn SharedDefaults>,
        assets: Arc<dyn AssetSource>,
    ) -> Self {
        let cache = SnapshotCache::new(Duration::from_secs(config.weather.cache_ttl_secs));
        let aggregator = Arc::new(
            WeatherAggregator::new(source.clone(), geocoder.clone())
                .with_describer(describer)
                .with_cache(cache)
                .with_hourly_hours(config.weather.hourly_hours),
        );

        let settings = SettingsStore::new(defaults);
        let colors = Arc::new(ColorExtractor::new(assets));
        let cities = Arc::new(CityListController::new(
            City::sample_cities(),
            &config.theme.asset_pool,
            &mut rand::thread_rng(),
        ));

        let widget = Arc::new(WidgetTimelineProvider::new(
            source,
            geocoder,
            settings.clone(),
            Coordinate::new(
                config.widget.fallback_latitude,
                config.widget.fallback_longitude,
            ),
            Duration::from_secs(u64::from(config.widget.refresh_minutes) * 60),
        ));
        let (reload_tx, _) = ToggleTemperatureIntent::reload_channel();

        tracing::info!("App services initialized");
        Self {
            config,
            aggregator,
            settings,
            colors,
            cities,
            widget,
            reload_tx,
            shutdown: CancellationToken::new(),
        }
    }

    fn describer(config: &Config) -> Result<Arc<dyn DescriptionSource>> {
        if !config.description.enabled {
            return Ok(Arc::new(TemplateDescriber));
        }
        match config.description.resolved_api_key() {
            Some(key) => {
                let describer = ChatDescriber::new(
                    &config.description.base_url,
                    &config.description.model,
                    &key,
                )
                .context("Failed to create description client")?;
                Ok(Arc::new(describer))
            }
            None => {
                tracing::warn!("Descriptions enabled but no API key; using template text");
                Ok(Arc::new(TemplateDescriber))
            }
        }
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn aggregator(&self) -> Arc<WeatherAggregator> {
        self.aggregator.clone()
    }

    pub fn settings(&self) -> &SettingsStore {
        &self.settings
    }

    pub fn cities(&self) -> Arc<CityListController> {
        self.cities.clone()
    }

    pub fn widget(&self) -> Arc<WidgetTimelineProvider> {
        self.widget.clone()
    }

    /// Background and text colors for a city.
    pub fn theme_for(&self, city: &City) -> Theme {
        self.colors
            .theme_for(city.theme_asset_or(&self.config.theme.fallback_asset))
    }

    pub fn toggle_intent(&self) -> ToggleTemperatureIntent {
        ToggleTemperatureIntent::new(self.settings.clone(), self.reload_tx.clone())
    }

    /// A scheduler that reloads whenever a toggle intent fires.
    pub fn widget_scheduler(&self) -> WidgetScheduler {
        WidgetScheduler::new(self.widget.clone(), self.reload_tx.subscribe())
    }

    pub fn shutdown_token(&self) -> CancellationToken {
        self.shutdown.clone()
    }

    /// Stop background work.
    pub fn shutdown(&self) {
        tracing::info!("Shutting down app services");
        self.cities.stop();
        self.shutdown.cancel();
    }
}
