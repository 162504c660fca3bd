//! Application error types.

use std::fmt;

use crate::provider::ProviderError;

/// Errors that can occur during application lifecycle.
#[derive(Debug)]
pub enum AppError {
    /// Failed to bind the listen address.
    Bind { address: String, source: std::io::Error },

    /// Failed to build the HTTP client used for Overpass.
    HttpClient(ProviderError),

    /// Configuration error.
    Config(String),

    /// The server task failed or panicked.
    Server(String),
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppError::Bind { address, source } => {
                write!(f, "Failed to bind {}: {}", address, source)
            }
            AppError::HttpClient(e) => {
                write!(f, "Failed to create HTTP client: {}", e)
            }
            AppError::Config(msg) => {
                write!(f, "Configuration error: {}", msg)
            }
            AppError::Server(msg) => {
                write!(f, "Server error: {}", msg)
            }
        }
    }
}

impl std::error::Error for AppError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            AppError::Bind { source, .. } => Some(source),
            AppError::HttpClient(e) => Some(e),
            AppError::Config(_) => None,
            AppError::Server(_) => None,
        }
    }
}

impl From<ProviderError> for AppError {
    fn from(e: ProviderError) -> Self {
        AppError::HttpClient(e)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::error::Error;

    #[test]
    fn test_app_error_display() {
        let err = AppError::Config("index zoom out of range".to_string());
        assert!(err.to_string().contains("Configuration error"));
        assert!(err.to_string().contains("index zoom out of range"));
    }

    #[test]
    fn test_bind_error_has_source() {
        let err = AppError::Bind {
            address: "0.0.0.0:80".to_string(),
            source: std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied"),
        };
        assert!(err.to_string().contains("0.0.0.0:80"));
        assert!(err.source().is_some());
    }

    #[test]
    fn test_app_error_from_provider_error() {
        let app_err: AppError = ProviderError::HttpError("tls".to_string()).into();
        assert!(matches!(app_err, AppError::HttpClient(_)));
    }
}
