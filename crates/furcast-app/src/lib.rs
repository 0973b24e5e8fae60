//! Furcast application layer: the city list, the home-screen widget and the
//! wiring between them.

pub mod app_services;
pub mod cities;
pub mod error_mapping;
pub mod widget;

pub use app_services::AppServices;
pub use cities::{City, CityListController, CityUpdate, PrefetchSummary};
pub use error_mapping::IntoAppError;
pub use widget::{
    ReloadAllTimelines, Timeline, ToggleTemperatureIntent, WidgetEntry, WidgetScheduler,
    WidgetTimelineProvider,
};
