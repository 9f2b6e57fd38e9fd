//! Error types and handling for the `TripMap` crate

use thiserror::Error;

/// Main error type for the `TripMap` crate
#[derive(Error, Debug)]
pub enum TripMapError {
    /// Configuration-related errors
    #[error("Configuration error: {message}")]
    Config { message: String },

    /// Static catalog or itinerary data is inconsistent
    #[error("Catalog error: {message}")]
    Catalog { message: String },

    /// Mapping or directions provider communication errors
    #[error("Provider error: {message}")]
    Provider { message: String },

    /// Input validation errors
    #[error("Invalid input: {message}")]
    Validation { message: String },

    /// Cache / preference store errors
    #[error("Cache error: {message}")]
    Cache { message: String },

    /// I/O operation errors
    #[error("I/O error: {source}")]
    Io {
        #[from]
        source: std::io::Error,
    },
}

impl TripMapError {
    /// Create a new configuration error
    pub fn config<S: Into<String>>(message: S) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Create a new catalog error
    pub fn catalog<S: Into<String>>(message: S) -> Self {
        Self::Catalog {
            message: message.into(),
        }
    }

    /// Create a new provider error
    pub fn provider<S: Into<String>>(message: S) -> Self {
        Self::Provider {
            message: message.into(),
        }
    }

    /// Create a new validation error
    pub fn validation<S: Into<String>>(message: S) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a new cache error
    pub fn cache<S: Into<String>>(message: S) -> Self {
        Self::Cache {
            message: message.into(),
        }
    }

    /// Get a user-friendly error message
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            TripMapError::Config { .. } => {
                "Configuration error. Please check your config file and API keys.".to_string()
            }
            TripMapError::Catalog { message } => {
                format!("The built-in location data is inconsistent: {message}")
            }
            TripMapError::Provider { .. } => {
                "Unable to reach the mapping service. Please check your internet connection."
                    .to_string()
            }
            TripMapError::Validation { message } => {
                format!("Invalid input: {message}")
            }
            TripMapError::Cache { .. } => {
                "Cache operation failed. You may need to clear your cache.".to_string()
            }
            TripMapError::Io { .. } => {
                "File operation failed. Please check file permissions.".to_string()
            }
        }
    }
}

/// Text to show for an application error
///
/// Leads with the user message of the first [`TripMapError`] in the chain,
/// followed by the full chain on its own line.
#[must_use]
pub fn describe(err: &anyhow::Error) -> String {
    match err.chain().find_map(|cause| cause.downcast_ref::<TripMapError>()) {
        Some(cause) => format!("{}\n{err:#}", cause.user_message()),
        None => format!("{err:#}"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_creation() {
        let config_err = TripMapError::config("missing API key");
        assert!(matches!(config_err, TripMapError::Config { .. }));

        let provider_err = TripMapError::provider("connection failed");
        assert!(matches!(provider_err, TripMapError::Provider { .. }));

        let catalog_err = TripMapError::catalog("duplicate id 3");
        assert!(matches!(catalog_err, TripMapError::Catalog { .. }));
    }

    #[test]
    fn test_user_messages() {
        let config_err = TripMapError::config("test");
        assert!(config_err.user_message().contains("Configuration error"));

        let provider_err = TripMapError::provider("test");
        assert!(provider_err.user_message().contains("mapping service"));

        let validation_err = TripMapError::validation("unknown language 'fr'");
        assert!(validation_err.user_message().contains("unknown language 'fr'"));
    }

    #[test]
    fn test_describe_finds_wrapped_error() {
        let err = anyhow::Error::new(TripMapError::cache("write entry"))
            .context("Failed to store language preference");
        let text = describe(&err);
        assert!(text.starts_with("Cache operation failed. You may need to clear your cache.\n"));
        assert!(text.ends_with("Failed to store language preference: Cache error: write entry"));

        let plain = anyhow::anyhow!("disk full").context("Failed to write dist/manifest.json");
        assert_eq!(describe(&plain), "Failed to write dist/manifest.json: disk full");
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "file not found");
        let err: TripMapError = io_err.into();
        assert!(matches!(err, TripMapError::Io { .. }));
    }
}
