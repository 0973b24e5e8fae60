//! Maps weather-layer errors to furcast_core::AppError for consistent
//! user-facing messages.

use furcast_core::{AppError, NetworkError, ReqwestErrorExt, WeatherError as CoreWeatherError};
use furcast_weather::{LocationError, WeatherError};

/// Conversion into the application error type.
///
/// A trait rather than `From` because both sides live in other crates.
pub trait IntoAppError {
    fn into_app_error(self) -> AppError;
}

impl IntoAppError for WeatherError {
    fn into_app_error(self) -> AppError {
        match self {
            WeatherError::Network(e) => AppError::Network(e.into_network_error()),
            WeatherError::Api { status, message } => {
                AppError::Network(NetworkError::ServerError { status, message })
            }
            WeatherError::Parse(s) => AppError::Network(NetworkError::InvalidResponse(s)),
            WeatherError::Geocode(s) => AppError::Weather(CoreWeatherError::LocationNotFound(s)),
            WeatherError::Location(e) => e.into_app_error(),
        }
    }
}

impl IntoAppError for LocationError {
    fn into_app_error(self) -> AppError {
        match self {
            LocationError::PermissionDenied | LocationError::ServiceUnavailable => {
                AppError::Weather(CoreWeatherError::ServiceUnavailable)
            }
            LocationError::Other(s) => AppError::Weather(CoreWeatherError::LocationNotFound(s)),
        }
    }
}
