//! Weather aggregation for Furcast
//!
//! Fetches forecasts from Open-Meteo, maps the provider's condition codes
//! onto Furcast's display categories, names the place via reverse geocoding
//! and caches assembled snapshots for a short time.

pub mod aggregator;
pub mod cache;
pub mod condition;
pub mod describe;
pub mod geocode;
pub mod location;
pub mod provider;
pub mod types;

pub use aggregator::{round_to_nearest_5, WeatherAggregator, UNKNOWN_LOCATION};
pub use cache::{CacheEntry, Clock, ManualClock, SnapshotCache, SystemClock, DEFAULT_TTL};
pub use condition::ProviderCondition;
pub use describe::{ChatDescriber, DescriptionRequest, DescriptionSource, TemplateDescriber};
pub use geocode::{Geocoder, NominatimGeocoder};
pub use location::{AuthorizationStatus, FixedPositioning, LocationEvent, PositioningService};
pub use provider::{
    OpenMeteoProvider, ProviderCurrent, ProviderDay, ProviderForecast, ProviderHour, WeatherSource,
};
pub use types::*;
