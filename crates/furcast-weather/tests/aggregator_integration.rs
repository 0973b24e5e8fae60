//! Integration tests for WeatherAggregator using wiremock.
//!
//! The provider, geocoder and describer are the real HTTP clients, pointed
//! at one mock server.

use std::sync::Arc;
use std::time::Duration;

use furcast_weather::{
    ChatDescriber, ConditionTag, ManualClock, NominatimGeocoder, OpenMeteoProvider, SnapshotCache,
    WeatherAggregator, WeatherError, DEFAULT_TTL, UNKNOWN_LOCATION,
};
use wiremock::matchers::{body_string_contains, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn forecast_body() -> serde_json::Value {
    serde_json::json!({
        "current": {
            "time": "2026-10-18T14:40",
            "temperature_2m": -3.6,
            "weather_code": 73,
            "wind_speed_10m": 21.8
        },
        "hourly": {
            "time": ["2026-10-18T13:00", "2026-10-18T14:00", "2026-10-18T15:00"],
            "temperature_2m": [-3.0, -3.4, -4.1],
            "weather_code": [71, 73, 1],
            "precipitation_probability": [80, 77, 3]
        },
        "daily": {
            "time": ["2026-10-18", "2026-10-19", "2026-10-20"],
            "weather_code": [73, 2, 95],
            "temperature_2m_max": [-1.5, 2.9, 6.0],
            "temperature_2m_min": [-7.8, -5.0, 1.2],
            "precipitation_probability_max": [90, 22, 48]
        }
    })
}

fn aggregator_for(server: &MockServer, clock: Arc<ManualClock>) -> WeatherAggregator {
    let provider = OpenMeteoProvider::with_base_url(
        &format!("{}/v1/forecast", server.uri()),
        Duration::from_secs(5),
    )
    .unwrap();
    let geocoder =
        NominatimGeocoder::with_base_url(&format!("{}/reverse", server.uri()), "furcast-tests")
            .unwrap();

    WeatherAggregator::new(Arc::new(provider), Arc::new(geocoder))
        .with_cache(SnapshotCache::with_clock(DEFAULT_TTL, clock))
}

#[tokio::test]
async fn test_snapshot_assembled_from_provider_and_geocoder() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "43.7792"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "address": { "town": "Sandwich", "state": "New Hampshire" }
        })))
        .mount(&server)
        .await;

    let aggregator = aggregator_for(&server, Arc::new(ManualClock::default()));
    let snapshot = aggregator.fetch_weather(43.7792, -71.4050).await.unwrap();

    assert_eq!(snapshot.location, "Sandwich");
    // Truncation toward zero
    assert_eq!(snapshot.current_temp, -3);
    assert_eq!(snapshot.condition, "Snow");
    assert_eq!(snapshot.high_temp, -1);
    assert_eq!(snapshot.low_temp, -7);
    assert_eq!(
        snapshot.description,
        "Snow conditions throughout the day. Wind gusts up to 21 mph."
    );

    // 13:00 is before the current hour and is dropped
    let labels: Vec<&str> = snapshot.hourly.iter().map(|h| h.time_label.as_str()).collect();
    assert_eq!(labels, ["Now", "3PM"]);
    assert_eq!(snapshot.hourly[0].precipitation_chance, Some(75));
    assert_eq!(snapshot.hourly[0].condition, ConditionTag::Cloudy);
    assert_eq!(snapshot.hourly[1].precipitation_chance, Some(5));
    assert_eq!(snapshot.hourly[1].condition, ConditionTag::Clear);

    let days: Vec<&str> = snapshot.daily.iter().map(|d| d.day_label.as_str()).collect();
    assert_eq!(days, ["Today", "Mon", "Tue"]);
    assert_eq!(snapshot.daily[1].condition, ConditionTag::PartlyCloudy);
    assert_eq!(snapshot.daily[2].precipitation_chance, Some(50));
}

#[tokio::test]
async fn test_cache_expires_after_ttl() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({})))
        .mount(&server)
        .await;

    let clock = Arc::new(ManualClock::default());
    let aggregator = aggregator_for(&server, clock.clone());

    let first = aggregator.fetch_weather(49.2827, -123.1207).await.unwrap();
    assert_eq!(first.location, UNKNOWN_LOCATION);

    clock.advance(Duration::from_secs(599));
    let cached = aggregator.fetch_weather(49.2827, -123.1207).await.unwrap();
    assert!(Arc::ptr_eq(&first, &cached));

    clock.advance(Duration::from_secs(1));
    let refreshed = aggregator.fetch_weather(49.2827, -123.1207).await.unwrap();
    assert!(!Arc::ptr_eq(&first, &refreshed));
    assert_eq!(*first, *refreshed);
}

#[tokio::test]
async fn test_provider_error_is_not_cached() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(500).set_body_string("upstream down"))
        .expect(2)
        .mount(&server)
        .await;

    let aggregator = aggregator_for(&server, Arc::new(ManualClock::default()));

    for _ in 0..2 {
        let err = aggregator.fetch_weather(40.7128, -74.0060).await.unwrap_err();
        assert!(matches!(err, WeatherError::Api { status: 500, .. }));
    }
    assert!(aggregator.cache().is_empty());
}

#[tokio::test]
async fn test_chat_description_is_used_when_available() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "address": { "city": "Salt Lake City" }
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/v1/chat/completions"))
        .and(body_string_contains("Salt Lake City this afternoon"))
        .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
            "choices": [{ "message": { "role": "assistant", "content": "Parka weather. 🧥" } }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let describer =
        ChatDescriber::new(&format!("{}/v1", server.uri()), "gpt-4o-mini", "test-key").unwrap();
    let aggregator = aggregator_for(&server, Arc::new(ManualClock::default()))
        .with_describer(Arc::new(describer));

    let snapshot = aggregator.fetch_weather(40.7608, -111.8910).await.unwrap();
    assert_eq!(snapshot.description, "Parka weather. 🧥");
}
