use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};

use furcast_app::{AppServices, CityUpdate, Timeline};
use furcast_core::{Config, TemperatureUnit};
use furcast_weather::{Coordinate, FixedPositioning, WeatherSnapshot};

#[derive(Parser)]
#[command(author, version, about = "Weather for a list of cities", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show the forecast for a city in the list, or for a coordinate
    Forecast {
        /// Index into the city list
        #[arg(short, long, default_value_t = 2)]
        city: usize,
        /// Latitude; overrides --city together with --lon
        #[arg(long, requires = "lon", allow_hyphen_values = true)]
        lat: Option<f64>,
        #[arg(long, requires = "lat", allow_hyphen_values = true)]
        lon: Option<f64>,
    },
    /// List cities with their theme and current temperature
    Cities {
        /// Simulated device position for the current-location entry
        #[arg(long, num_args = 2, value_names = ["LAT", "LON"], allow_hyphen_values = true)]
        locate: Option<Vec<f64>>,
    },
    /// Print the widget timeline
    Widget {
        /// Keep running and print a timeline on every refresh
        #[arg(long)]
        watch: bool,
    },
    /// Switch between Celsius and Fahrenheit
    ToggleUnit,
    /// Show the colors extracted from a background asset
    Theme {
        /// Asset id, e.g. "3"
        asset: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    furcast_core::init()?;

    let cli = Cli::parse();
    let (config, _) = Config::load_validated().context("Failed to load configuration")?;
    let services = AppServices::from_config(config)?;

    let result = match cli.command {
        Command::Forecast { city, lat, lon } => forecast(&services, city, lat.zip(lon)).await,
        Command::Cities { locate } => cities(&services, locate).await,
        Command::Widget { watch } => widget(&services, watch).await,
        Command::ToggleUnit => match services.toggle_intent().perform() {
            Ok(unit) => {
                println!("Temperature unit is now {}", unit.symbol());
                Ok(())
            }
            Err(e) => {
                tracing::error!("Toggle failed: {}", e);
                Err(anyhow::anyhow!(e.user_message()))
            }
        },
        Command::Theme { asset } => {
            let city = furcast_app::City {
                theme_asset: Some(asset.clone()),
                ..furcast_app::City::new(asset, 0.0, 0.0)
            };
            let theme = services.theme_for(&city);
            println!("background: {}", theme.background);
            println!("text:       {}", theme.text);
            Ok(())
        }
    };

    services.shutdown();
    result
}

async fn forecast(services: &AppServices, index: usize, at: Option<(f64, f64)>) -> Result<()> {
    let unit = services.settings().unit();
    let aggregator = services.aggregator();

    let snapshot = match at {
        Some((lat, lon)) => match aggregator.fetch_weather(lat, lon).await {
            Ok(snapshot) => snapshot,
            Err(e) => {
                tracing::warn!("Forecast unavailable: {}", e);
                Arc::new(WeatherSnapshot::sample())
            }
        },
        None => services
            .cities()
            .weather_for(index, &aggregator)
            .await
            .with_context(|| format!("No city at index {}", index))?,
    };

    print_snapshot(&snapshot, unit);
    Ok(())
}

async fn cities(services: &AppServices, locate: Option<Vec<f64>>) -> Result<()> {
    let controller = services.cities();

    if let Some(&[lat, lon]) = locate.as_deref() {
        let mut updates = controller.subscribe_updates();
        let positioning = Arc::new(FixedPositioning::new(Some(Coordinate::new(lat, lon))));
        controller.start(positioning, services.settings().clone());
        match updates.recv().await {
            Ok(CityUpdate::LocationFixed { coordinate, .. }) => {
                tracing::info!("Located at {}", coordinate);
            }
            Err(e) => tracing::warn!("No location fix: {}", e),
        }
    }

    let summary = controller.prefetch_all(services.aggregator()).await;
    tracing::debug!("Prefetch: {:?}", summary);

    let unit = services.settings().unit();
    let aggregator = services.aggregator();
    for (index, city) in controller.cities().iter().enumerate() {
        let theme = services.theme_for(city);
        let temp = match controller.weather_for(index, &aggregator).await {
            Some(snapshot) => format!("{}{}", unit.convert(snapshot.current_temp), unit.symbol()),
            None => "--".to_string(),
        };
        println!(
            "{:>2}  {:<18} {:>6}  asset {:<4} bg {} text {}",
            index,
            city.name,
            temp,
            city.theme_asset_or(&services.config().theme.fallback_asset),
            theme.background,
            theme.text,
        );
    }
    Ok(())
}

async fn widget(services: &AppServices, watch: bool) -> Result<()> {
    if !watch {
        print_timeline(&services.widget().timeline().await);
        return Ok(());
    }

    let shutdown = services.shutdown_token();
    let scheduler = services.widget_scheduler();
    let task = tokio::spawn(scheduler.run(shutdown.clone(), |timeline| print_timeline(&timeline)));

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for ctrl-c")?;
    shutdown.cancel();
    task.await.context("Widget scheduler panicked")?;
    Ok(())
}

fn print_snapshot(snapshot: &WeatherSnapshot, unit: TemperatureUnit) {
    let t = |c: i32| format!("{}°", unit.convert(c));

    println!("{}", snapshot.location);
    println!(
        "{}{} {}  H:{} L:{}",
        unit.convert(snapshot.current_temp),
        unit.symbol(),
        snapshot.condition,
        t(snapshot.high_temp),
        t(snapshot.low_temp)
    );
    println!("{}", snapshot.description);
    println!();

    for hour in &snapshot.hourly {
        let chance = hour
            .precipitation_chance
            .map(|p| format!("{}%", p))
            .unwrap_or_default();
        println!(
            "  {:<5} {:<16} {:>5} {:>4}",
            hour.time_label,
            hour.condition.icon_name(),
            t(hour.temperature),
            chance
        );
    }
    println!();

    for day in &snapshot.daily {
        let chance = day
            .precipitation_chance
            .map(|p| format!("{}%", p))
            .unwrap_or_default();
        println!(
            "  {:<5} {:<16} {:>5} {:>5} {:>4}",
            day.day_label,
            day.condition.icon_name(),
            t(day.low_temp),
            t(day.high_temp),
            chance
        );
    }
}

fn print_timeline(timeline: &Timeline) {
    for entry in &timeline.entries {
        println!(
            "[{}] {}  {}{}  {} ({})  ↑{}° ↓{}°",
            entry.date.format("%H:%M"),
            entry.city_name,
            entry.display_current_temp(),
            entry.temp_unit(),
            entry.condition,
            entry.icon,
            entry.display_high_temp(),
            entry.display_low_temp()
        );
    }
    println!("next refresh at {}", timeline.next_refresh.format("%H:%M"));
}
