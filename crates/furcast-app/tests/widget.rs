mod common;

use std::time::Duration;

use chrono::Local;
use furcast_app::{AppServices, Timeline};
use furcast_core::TemperatureUnit;
use tempfile::TempDir;
use tokio::sync::mpsc;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::{config_for, forecast_body, mount_backends, place_body};

async fn recv(rx: &mut mpsc::UnboundedReceiver<Timeline>) -> Timeline {
    tokio::time::timeout(Duration::from_secs(5), rx.recv())
        .await
        .unwrap()
        .unwrap()
}

#[tokio::test]
async fn entry_uses_stored_location_and_place_name() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "51.5"))
        .and(query_param("longitude", "-0.12"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(200).set_body_json(place_body("London")))
        .mount(&server)
        .await;

    let services = AppServices::from_config(config_for(&server, dir.path())).unwrap();
    services.settings().set_current_location(51.5, -0.12).unwrap();

    let entry = services.widget().entry().await;
    assert_eq!(entry.city_name, "London");
    assert_eq!(entry.current_temp, 12);
    assert_eq!(entry.high_temp, 19);
    assert_eq!(entry.low_temp, 11);
    assert_eq!(entry.condition, "Rain");
    assert_eq!(entry.icon, "cloud.rain.fill");
    assert!(entry.is_celsius);
}

#[tokio::test]
async fn entry_without_stored_location_uses_fallback_city() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .and(query_param("latitude", "42.3601"))
        .and(query_param("longitude", "-71.0589"))
        .respond_with(ResponseTemplate::new(200).set_body_json(forecast_body()))
        .expect(1)
        .mount(&server)
        .await;
    // Geocoding down: the widget still shows weather under a generic name.
    Mock::given(method("GET"))
        .and(path("/reverse"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let services = AppServices::from_config(config_for(&server, dir.path())).unwrap();
    let entry = services.widget().entry().await;
    assert_eq!(entry.city_name, "Current Location");
    assert_eq!(entry.current_temp, 12);
}

#[tokio::test]
async fn provider_failure_gives_unavailable_entry_in_stored_unit() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/v1/forecast"))
        .respond_with(ResponseTemplate::new(502))
        .mount(&server)
        .await;

    let services = AppServices::from_config(config_for(&server, dir.path())).unwrap();
    services.settings().set_unit(TemperatureUnit::Fahrenheit).unwrap();

    let entry = services.widget().entry().await;
    assert_eq!(entry.city_name, "Unavailable");
    assert!(!entry.is_celsius);
    assert_eq!(entry.display_current_temp(), 68);
    assert_eq!(entry.temp_unit(), "°F");

    let placeholder = services.widget().placeholder();
    assert_eq!(placeholder.city_name, "Loading...");
    assert!(placeholder.is_celsius);
}

#[tokio::test]
async fn timeline_refreshes_after_thirty_minutes() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_backends(&server, "Boston").await;

    let services = AppServices::from_config(config_for(&server, dir.path())).unwrap();
    let before = Local::now();
    let timeline = services.widget().timeline().await;

    assert_eq!(timeline.entries.len(), 1);
    let entry = &timeline.entries[0];
    assert_eq!(timeline.next_refresh - entry.date, chrono::Duration::minutes(30));
    assert!(entry.date >= before);
}

#[tokio::test]
async fn toggle_reloads_scheduled_widget_in_new_unit() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();
    mount_backends(&server, "Boston").await;

    let services = AppServices::from_config(config_for(&server, dir.path())).unwrap();
    let (tx, mut rx) = mpsc::unbounded_channel::<Timeline>();
    let scheduler = services.widget_scheduler();
    let shutdown = services.shutdown_token();
    let task = tokio::spawn(scheduler.run(shutdown, move |timeline| {
        let _ = tx.send(timeline);
    }));

    let first = recv(&mut rx).await;
    assert!(first.entries[0].is_celsius);
    assert_eq!(first.entries[0].city_name, "Boston");

    let unit = services.toggle_intent().perform().unwrap();
    assert_eq!(unit, TemperatureUnit::Fahrenheit);

    let second = recv(&mut rx).await;
    assert!(!second.entries[0].is_celsius);
    assert_eq!(second.entries[0].display_current_temp(), 54);

    services.shutdown();
    tokio::time::timeout(Duration::from_secs(5), task)
        .await
        .unwrap()
        .unwrap();
}

#[tokio::test]
async fn toggle_is_visible_through_a_second_store_on_the_same_file() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    let app = AppServices::from_config(config_for(&server, dir.path())).unwrap();
    let widget = AppServices::from_config(config_for(&server, dir.path())).unwrap();

    assert_eq!(widget.settings().unit(), TemperatureUnit::Celsius);
    app.toggle_intent().perform().unwrap();
    assert_eq!(widget.settings().unit(), TemperatureUnit::Fahrenheit);
}
