use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use url::Url;

/// Configuration validation errors
#[derive(Debug, Clone)]
pub struct ConfigValidationError {
    pub field: String,
    pub message: String,
}

impl std::fmt::Display for ConfigValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.field, self.message)
    }
}

/// Result of config validation
#[derive(Debug, Clone, Default)]
pub struct ValidationResult {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationResult {
    /// Returns true if there are no errors (warnings are OK)
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn add_error(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    pub fn add_warning(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            field: field.into(),
            message: message.into(),
        });
    }

    /// Get a single line summarizing all errors
    pub fn error_summary(&self) -> String {
        self.errors
            .iter()
            .map(|e| e.to_string())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub weather: WeatherConfig,

    #[serde(default)]
    pub geocoding: GeocodingConfig,

    #[serde(default)]
    pub description: DescriptionConfig,

    #[serde(default)]
    pub widget: WidgetConfig,

    #[serde(default)]
    pub theme: ThemeConfig,

    #[serde(default)]
    pub settings: SettingsConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WeatherConfig {
    /// Open-Meteo forecast endpoint
    pub base_url: String,

    /// How long a fetched snapshot is served from memory
    pub cache_ttl_secs: u64,

    /// Number of hourly points kept in a snapshot
    pub hourly_hours: usize,

    /// Number of forecast days requested from the provider
    pub forecast_days: u32,

    pub request_timeout_secs: u64,
}

impl Default for WeatherConfig {
    fn default() -> Self {
        Self {
            base_url: "https://api.open-meteo.com/v1/forecast".to_string(),
            cache_ttl_secs: 600,
            hourly_hours: 24,
            forecast_days: 10,
            request_timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeocodingConfig {
    /// Nominatim reverse geocoding endpoint
    pub base_url: String,
    pub user_agent: String,
}

impl Default for GeocodingConfig {
    fn default() -> Self {
        Self {
            base_url: "https://nominatim.openstreetmap.org/reverse".to_string(),
            user_agent: "Furcast/0.1.0".to_string(),
        }
    }
}

/// Witty description generation through an OpenAI-compatible chat API.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DescriptionConfig {
    pub enabled: bool,
    pub base_url: String,
    pub model: String,
    /// Falls back to `OPENAI_API_KEY` when unset
    pub api_key: Option<String>,
}

impl Default for DescriptionConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            base_url: "https://api.openai.com/v1".to_string(),
            model: "gpt-4o-mini".to_string(),
            api_key: None,
        }
    }
}

impl DescriptionConfig {
    pub fn resolved_api_key(&self) -> Option<String> {
        self.api_key
            .clone()
            .filter(|k| !k.is_empty())
            .or_else(|| std::env::var("OPENAI_API_KEY").ok())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct WidgetConfig {
    pub refresh_minutes: u32,

    /// Used until the app has stored a location fix
    pub fallback_latitude: f64,
    pub fallback_longitude: f64,
}

impl Default for WidgetConfig {
    fn default() -> Self {
        // Boston
        Self {
            refresh_minutes: 30,
            fallback_latitude: 42.3601,
            fallback_longitude: -71.0589,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    /// Directory holding `<asset>.gif` backgrounds
    pub asset_dir: PathBuf,

    /// Asset ids handed out to cities
    pub asset_pool: Vec<String>,

    /// Asset shown for a city that was not given one from the pool
    pub fallback_asset: String,
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            asset_dir: default_config_dir().join("assets"),
            asset_pool: (1..=7).map(|i| i.to_string()).collect(),
            fallback_asset: "toiletpaperdance".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SettingsConfig {
    /// File backing the settings scope shared by the app and the widget
    pub shared_path: PathBuf,
}

impl Default for SettingsConfig {
    fn default() -> Self {
        Self {
            shared_path: default_config_dir().join("shared_defaults.json"),
        }
    }
}

fn default_config_dir() -> PathBuf {
    dirs::config_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("furcast")
}

impl Config {
    /// Load configuration from file, creating default if it doesn't exist
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Self::default();
            config.save()?;
            return Ok(config);
        }

        let contents =
            std::fs::read_to_string(&config_path).context("Failed to read config file")?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config)
    }

    /// Load configuration and validate it
    ///
    /// Returns an error if validation fails with critical errors; warnings
    /// are logged.
    pub fn load_validated() -> Result<(Self, ValidationResult)> {
        let config = Self::load()?;
        let validation = config.validate();

        if !validation.is_valid() {
            anyhow::bail!(
                "Configuration validation failed: {}",
                validation.error_summary()
            );
        }

        for warning in &validation.warnings {
            tracing::warn!("Config warning: {}", warning);
        }

        Ok((config, validation))
    }

    pub fn validate(&self) -> ValidationResult {
        let mut result = ValidationResult::default();

        validate_url(&self.weather.base_url, "weather.base_url", &mut result);
        validate_url(&self.geocoding.base_url, "geocoding.base_url", &mut result);
        if self.description.enabled {
            validate_url(&self.description.base_url, "description.base_url", &mut result);
            if self.description.resolved_api_key().is_none() {
                result.add_warning(
                    "description.api_key",
                    "No API key - descriptions will use the fallback sentence",
                );
            }
        }

        if self.weather.cache_ttl_secs == 0 {
            result.add_warning("weather.cache_ttl_secs", "Weather caching disabled (0 seconds)");
        }

        if self.weather.hourly_hours == 0 {
            result.add_error("weather.hourly_hours", "Must keep at least one hourly point");
        }

        if self.weather.forecast_days == 0 || self.weather.forecast_days > 16 {
            result.add_error("weather.forecast_days", "Must be between 1 and 16");
        }

        if self.widget.refresh_minutes == 0 {
            result.add_error("widget.refresh_minutes", "Widget refresh must be at least 1 minute");
        }

        if !(-90.0..=90.0).contains(&self.widget.fallback_latitude) {
            result.add_error("widget.fallback_latitude", "Latitude must be within [-90, 90]");
        }
        if !(-180.0..=180.0).contains(&self.widget.fallback_longitude) {
            result.add_error("widget.fallback_longitude", "Longitude must be within [-180, 180]");
        }

        if self.theme.asset_pool.is_empty() {
            result.add_error("theme.asset_pool", "At least one theme asset is required");
        }
        if !self.theme.asset_dir.is_dir() {
            result.add_warning(
                "theme.asset_dir",
                format!(
                    "Asset directory does not exist: {} - backgrounds will be clear",
                    self.theme.asset_dir.display()
                ),
            );
        }

        result
    }

    /// Save configuration to file
    pub fn save(&self) -> Result<()> {
        let config_path = Self::config_path()?;

        if let Some(parent) = config_path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let contents = toml::to_string_pretty(self).context("Failed to serialize config")?;

        std::fs::write(&config_path, contents).context("Failed to write config file")?;

        Ok(())
    }

    fn config_path() -> Result<PathBuf> {
        let config_dir = dirs::config_dir()
            .context("Failed to get config directory")?
            .join("furcast");

        Ok(config_dir.join("config.toml"))
    }
}

fn validate_url(url_str: &str, field_name: &str, result: &mut ValidationResult) {
    match Url::parse(url_str) {
        Ok(url) => {
            if url.scheme() != "http" && url.scheme() != "https" {
                result.add_error(
                    field_name,
                    format!("URL must use http or https scheme, got: {}", url.scheme()),
                );
            }

            if url.host().is_none() {
                result.add_error(field_name, "URL must have a host");
            }
        }
        Err(e) => {
            result.add_error(field_name, format!("Invalid URL: {}", e));
        }
    }
}
