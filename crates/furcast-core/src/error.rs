//! Centralized error types for Furcast.
//!
//! Every failure in Furcast has a non-fatal fallback, so these types exist to
//! classify what went wrong for logging and to pick a short user-facing
//! sentence for degraded content. Nothing here is shown as an error dialog.

use thiserror::Error;

/// Top-level application error type.
///
/// Domain errors from the weather and settings layers convert into
/// this type. Use `user_message()` for UI-appropriate text.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Settings error: {0}")]
    Settings(#[from] SettingsError),

    #[error("Weather service error: {0}")]
    Weather(#[from] WeatherError),
}

impl AppError {
    /// Returns a user-friendly message suitable for display.
    pub fn user_message(&self) -> &'static str {
        match self {
            AppError::Network(e) => e.user_message(),
            AppError::Settings(e) => e.user_message(),
            AppError::Weather(e) => e.user_message(),
        }
    }
}

/// Network-related errors (HTTP, connectivity).
#[derive(Debug, Error)]
pub enum NetworkError {
    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Server error: {status} - {message}")]
    ServerError { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

impl NetworkError {
    pub fn user_message(&self) -> &'static str {
        match self {
            NetworkError::ConnectionFailed(_) => {
                "Unable to connect. Showing the last known forecast."
            }
            NetworkError::Timeout => "The forecast took too long to load.",
            NetworkError::ServerError { status, .. } if *status >= 500 => {
                "The weather service is having trouble. Try again later."
            }
            NetworkError::ServerError { .. } => "The forecast request failed.",
            NetworkError::InvalidResponse(_) => "Received an unexpected forecast.",
        }
    }
}

/// Errors from the shared settings scope.
#[derive(Debug, Error)]
pub enum SettingsError {
    #[error("Settings storage error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Settings file is malformed: {0}")]
    Malformed(#[from] serde_json::Error),
}

impl SettingsError {
    pub fn user_message(&self) -> &'static str {
        match self {
            SettingsError::Io(_) => "Your preferences could not be saved.",
            SettingsError::Malformed(_) => "Your preferences were reset.",
        }
    }
}

/// Weather errors as seen by the app surfaces.
#[derive(Debug, Error)]
pub enum WeatherError {
    #[error("Location not found: {0}")]
    LocationNotFound(String),

    #[error("Service unavailable")]
    ServiceUnavailable,
}

impl WeatherError {
    pub fn user_message(&self) -> &'static str {
        match self {
            WeatherError::LocationNotFound(_) => "Unknown Location",
            WeatherError::ServiceUnavailable => "Weather service unavailable. Try again later.",
        }
    }
}

/// Extension trait for converting reqwest errors to our error types.
pub trait ReqwestErrorExt {
    fn into_network_error(self) -> NetworkError;
}

impl ReqwestErrorExt for reqwest::Error {
    fn into_network_error(self) -> NetworkError {
        if self.is_timeout() {
            NetworkError::Timeout
        } else if self.is_decode() {
            NetworkError::InvalidResponse(self.to_string())
        } else if let Some(status) = self.status() {
            NetworkError::ServerError {
                status: status.as_u16(),
                message: self.to_string(),
            }
        } else {
            NetworkError::ConnectionFailed(self.to_string())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_messages_are_non_empty() {
        let errors: Vec<AppError> = vec![
            NetworkError::Timeout.into(),
            WeatherError::ServiceUnavailable.into(),
            SettingsError::Io(std::io::Error::other("disk full")).into(),
        ];

        for err in errors {
            assert!(!err.user_message().is_empty(), "{:?}", err);
        }
    }

    #[test]
    fn test_app_error_conversion() {
        let err: AppError = WeatherError::LocationNotFound("nowhere".into()).into();
        assert!(matches!(
            err,
            AppError::Weather(WeatherError::LocationNotFound(_))
        ));
    }

    #[test]
    fn test_server_error_message_depends_on_status() {
        let server = NetworkError::ServerError {
            status: 503,
            message: "down".into(),
        };
        let client = NetworkError::ServerError {
            status: 400,
            message: "bad".into(),
        };
        assert_ne!(server.user_message(), client.user_message());
    }

    #[test]
    fn test_location_not_found_message_matches_fallback_name() {
        let err = AppError::Weather(WeatherError::LocationNotFound("x".into()));
        assert_eq!(err.user_message(), "Unknown Location");
    }
}
