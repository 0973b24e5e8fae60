//! Shared foundation for Furcast: logging, configuration, errors, the
//! temperature unit and the settings store shared by the app and the widget.

pub mod config;
pub mod error;
pub mod settings;
pub mod units;

pub use config::{
    Config, DescriptionConfig, GeocodingConfig, SettingsConfig, ThemeConfig, WeatherConfig,
    WidgetConfig,
};
pub use error::{AppError, NetworkError, ReqwestErrorExt, SettingsError, WeatherError};
pub use settings::{FileDefaults, MemoryDefaults, SettingValue, SettingsStore, SharedDefaults};
pub use units::TemperatureUnit;

use anyhow::Result;

/// Initialize logging for a Furcast process.
///
/// Honours `RUST_LOG`, falling back to `info`.
pub fn init() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to install tracing subscriber: {}", e))?;

    tracing::info!("Furcast core initialized");
    Ok(())
}
