//! Reverse geocoding: convert coordinates to human-readable place names.
//! Uses Nominatim (OpenStreetMap) - free, no API key required.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::instrument;

use crate::types::{Coordinate, WeatherError};

const NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/reverse";
const REQUEST_TIMEOUT_SECS: u64 = 10;
const USER_AGENT: &str = "Furcast/0.1.0";

/// Turns a coordinate into a place name.
///
/// `Ok(None)` means the service answered but knows no name for the spot.
#[async_trait]
pub trait Geocoder: Send + Sync {
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<Option<String>, WeatherError>;
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    address: Option<NominatimAddress>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct NominatimAddress {
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    state: Option<String>,
    country: Option<String>,
}

impl NominatimAddress {
    /// Locality first, then wider areas.
    fn place_name(self) -> Option<String> {
        self.city
            .or(self.town)
            .or(self.village)
            .or(self.municipality)
            .or(self.county)
            .or(self.state)
            .or(self.country)
            .filter(|s| !s.is_empty())
    }
}

#[derive(Debug, Clone)]
pub struct NominatimGeocoder {
    client: Client,
    base_url: String,
}

impl NominatimGeocoder {
    pub fn new() -> Result<Self, WeatherError> {
        Self::with_base_url(NOMINATIM_URL, USER_AGENT)
    }

    pub fn with_base_url(base_url: &str, user_agent: &str) -> Result<Self, WeatherError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .user_agent(user_agent)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }
}

#[async_trait]
impl Geocoder for NominatimGeocoder {
    #[instrument(skip(self), level = "debug")]
    async fn reverse_geocode(&self, coordinate: Coordinate) -> Result<Option<String>, WeatherError> {
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("lat", coordinate.latitude.to_string()),
                ("lon", coordinate.longitude.to_string()),
                ("format", "json".to_string()),
                ("addressdetails", "1".to_string()),
                ("zoom", "10".to_string()),
            ])
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            return Err(WeatherError::Geocode(format!(
                "reverse geocode returned status {}",
                status
            )));
        }

        let body: NominatimResponse = response
            .json()
            .await
            .map_err(|e| WeatherError::Geocode(e.to_string()))?;

        let name = body
            .address
            .and_then(NominatimAddress::place_name)
            .or(body.name.filter(|s| !s.is_empty()));

        match &name {
            Some(n) => tracing::info!("Reverse geocoded to: {}", n),
            None => tracing::debug!("No place name for {}", coordinate),
        }
        Ok(name)
    }
}
