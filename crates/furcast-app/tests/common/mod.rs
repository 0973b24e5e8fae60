//! Shared mock backends for the app integration tests.

#![allow(dead_code)]

use std::path::Path;

use furcast_core::Config;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

pub fn forecast_body() -> serde_json::Value {
    serde_json::json!({
        "current": {
            "time": "2026-10-18T14:15",
            "temperature_2m": 12.7,
            "weather_code": 61,
            "wind_speed_10m": 9.4
        },
        "hourly": {
            "time": ["2026-10-18T14:00", "2026-10-18T15:00", "2026-10-18T16:00"],
            "temperature_2m": [12.5, 13.1, 13.8],
            "weather_code": [61, 2, 0],
            "precipitation_probability": [35, 12, 0]
        },
        "daily": {
            "time": ["2026-10-18", "2026-10-19"],
            "weather_code": [61, 0],
            "temperature_2m_max": [19.2, 21.0],
            "temperature_2m_min": [11.4, 8.0],
            "precipitation_probability_max": [70, null]
        }
    })
}

pub fn place_body(city: &str) -> serde_json::Value {
    serde_json::json!({ "address": { "city": city, "country": "Somewhere" } })
}

/// Forecast at `/v1/forecast`, reverse geocoding at `/reverse`.
pub async fn mount_backends(server: &MockServer, city: &str) {
    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(server)
        .await;

    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(place_body(city)))
        .mount(server)
        .await;
}

/// Config pointing every backend at `server` and every file into `dir`.
pub fn config_for(server: &MockServer, dir: &Path) -> Config {
    let mut config = Config::default();
    config.weather.base_url = format!("{}/v1/forecast", server.uri());
    config.weather.request_timeout_secs = 5;
    config.geocoding.base_url = format!("{}/reverse", server.uri());
    config.settings.shared_path = dir.join("shared_defaults.json");
    config.theme.asset_dir = dir.join("assets");
    config
}
