//! Configuration management for `TripMap`
//!
//! Handles loading configuration from files, environment variables,
//! and provides validation for all configuration settings.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};

use crate::TripMapError;
use crate::i18n::Language;
use crate::map::viewport::MAX_PROVIDER_ZOOM;

/// Environment variable consulted when no maps key is configured
pub const API_KEY_FALLBACK_VAR: &str = "GOOGLE_MAPS_API_KEY";

/// Root configuration structure for `TripMap`
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TripMapConfig {
    /// Directions provider settings
    #[serde(default)]
    pub maps: MapsConfig,
    /// Map widget framing
    #[serde(default)]
    pub map: MapConfig,
    #[serde(default)]
    pub language: LanguageConfig,
    #[serde(default)]
    pub cache: CacheConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Directions provider settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapsConfig {
    /// API key; empty disables route requests
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_maps_base_url")]
    pub base_url: String,
    /// Request timeout in seconds
    #[serde(default = "default_maps_timeout")]
    pub timeout_seconds: u64,
    /// Maximum number of retries for transient failures
    #[serde(default = "default_maps_max_retries")]
    pub max_retries: u32,
}

/// Map size and zoom rules
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MapConfig {
    #[serde(default = "default_width_px")]
    pub width_px: u32,
    #[serde(default = "default_height_px")]
    pub height_px: u32,
    /// Padding kept around fitted markers
    #[serde(default = "default_padding_px")]
    pub padding_px: u32,
    #[serde(default = "default_max_fit_zoom")]
    pub max_fit_zoom: u8,
    #[serde(default = "default_selection_zoom")]
    pub selection_zoom: u8,
    #[serde(default = "default_initial_zoom")]
    pub initial_zoom: u8,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LanguageConfig {
    /// Language used when no preference is stored
    #[serde(default)]
    pub default: Language,
    /// How long a chosen language is remembered
    #[serde(default = "default_session_ttl")]
    pub session_ttl_hours: u64,
}

/// Cache configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CacheConfig {
    /// Preference store directory; `~/` is expanded
    #[serde(default = "default_cache_location")]
    pub location: String,
}

/// Logging configuration settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Log format (pretty or json)
    #[serde(default = "default_log_format")]
    pub format: String,
}

// Default value functions
fn default_maps_base_url() -> String {
    "https://maps.googleapis.com/maps/api".to_string()
}

fn default_maps_timeout() -> u64 {
    15
}

fn default_maps_max_retries() -> u32 {
    2
}

fn default_width_px() -> u32 {
    800
}

fn default_height_px() -> u32 {
    400
}

fn default_padding_px() -> u32 {
    50
}

fn default_max_fit_zoom() -> u8 {
    15
}

fn default_selection_zoom() -> u8 {
    16
}

fn default_initial_zoom() -> u8 {
    11
}

fn default_session_ttl() -> u64 {
    24
}

fn default_cache_location() -> String {
    "~/.cache/tripmap".to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_log_format() -> String {
    "pretty".to_string()
}

impl Default for MapsConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            base_url: default_maps_base_url(),
            timeout_seconds: default_maps_timeout(),
            max_retries: default_maps_max_retries(),
        }
    }
}

impl Default for MapConfig {
    fn default() -> Self {
        Self {
            width_px: default_width_px(),
            height_px: default_height_px(),
            padding_px: default_padding_px(),
            max_fit_zoom: default_max_fit_zoom(),
            selection_zoom: default_selection_zoom(),
            initial_zoom: default_initial_zoom(),
        }
    }
}

impl Default for LanguageConfig {
    fn default() -> Self {
        Self {
            default: Language::DEFAULT,
            session_ttl_hours: default_session_ttl(),
        }
    }
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            location: default_cache_location(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

impl LanguageConfig {
    #[must_use]
    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session_ttl_hours * 3600)
    }
}

impl CacheConfig {
    /// Store directory with a leading `~/` expanded
    #[must_use]
    pub fn resolved_location(&self) -> PathBuf {
        match self.location.strip_prefix("~/") {
            Some(rest) => dirs::home_dir()
                .map(|home| home.join(rest))
                .unwrap_or_else(|| PathBuf::from(&self.location)),
            None => PathBuf::from(&self.location),
        }
    }
}

impl TripMapConfig {
    /// Load configuration from file and environment variables
    pub fn load() -> Result<Self> {
        Self::load_from_path(None)
    }

    /// Load configuration from specified path
    pub fn load_from_path(config_path: Option<PathBuf>) -> Result<Self> {
        let mut builder = Config::builder();

        let config_file = config_path.unwrap_or_else(|| {
            Self::get_config_path().unwrap_or_else(|| PathBuf::from("config.toml"))
        });

        if config_file.exists() {
            builder = builder.add_source(
                File::from(config_file.clone())
                    .required(false)
                    .format(config::FileFormat::Toml),
            );
        }

        // TRIPMAP_MAPS__API_KEY, TRIPMAP_MAP__PADDING_PX, ...
        builder = builder.add_source(
            Environment::with_prefix("TRIPMAP")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let settings = builder
            .build()
            .with_context(|| "Failed to build configuration")?;

        let mut config: TripMapConfig = settings
            .try_deserialize()
            .with_context(|| format!("Failed to deserialize configuration from {}", config_file.display()))?;

        if config.maps.api_key.is_empty() {
            if let Ok(key) = std::env::var(API_KEY_FALLBACK_VAR) {
                config.maps.api_key = key;
            }
        }

        config.apply_defaults();
        config.validate()?;

        Ok(config)
    }

    /// Get the default configuration file path
    #[must_use]
    pub fn get_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("tripmap").join("config.toml"))
    }

    /// Apply default values to zero or empty configuration fields
    pub fn apply_defaults(&mut self) {
        self.maps.api_key = self.maps.api_key.trim().to_string();
        if self.maps.base_url.is_empty() {
            self.maps.base_url = default_maps_base_url();
        }
        if self.maps.timeout_seconds == 0 {
            self.maps.timeout_seconds = default_maps_timeout();
        }
        if self.map.width_px == 0 {
            self.map.width_px = default_width_px();
        }
        if self.map.height_px == 0 {
            self.map.height_px = default_height_px();
        }
        if self.map.max_fit_zoom == 0 {
            self.map.max_fit_zoom = default_max_fit_zoom();
        }
        if self.map.selection_zoom == 0 {
            self.map.selection_zoom = default_selection_zoom();
        }
        if self.map.initial_zoom == 0 {
            self.map.initial_zoom = default_initial_zoom();
        }
        if self.language.session_ttl_hours == 0 {
            self.language.session_ttl_hours = default_session_ttl();
        }
        if self.cache.location.is_empty() {
            self.cache.location = default_cache_location();
        }
        if self.logging.level.is_empty() {
            self.logging.level = default_log_level();
        }
        if self.logging.format.is_empty() {
            self.logging.format = default_log_format();
        }
    }

    /// Validate all configuration settings
    pub fn validate(&self) -> Result<()> {
        self.validate_numeric_ranges()?;
        self.validate_string_values()?;
        Ok(())
    }

    fn validate_numeric_ranges(&self) -> Result<()> {
        if self.maps.timeout_seconds > 300 {
            return Err(TripMapError::config("Maps API timeout cannot exceed 300 seconds").into());
        }

        if self.maps.max_retries > 10 {
            return Err(TripMapError::config("Maps API max retries cannot exceed 10").into());
        }

        let padding = self.map.padding_px.saturating_mul(2);
        if self.map.width_px <= padding || self.map.height_px <= padding {
            return Err(TripMapError::config(format!(
                "Map size {}x{} leaves no room inside {}px padding",
                self.map.width_px, self.map.height_px, self.map.padding_px
            ))
            .into());
        }

        for (name, zoom) in [
            ("max_fit_zoom", self.map.max_fit_zoom),
            ("selection_zoom", self.map.selection_zoom),
            ("initial_zoom", self.map.initial_zoom),
        ] {
            if zoom > MAX_PROVIDER_ZOOM {
                return Err(TripMapError::config(format!(
                    "map.{name} cannot exceed {MAX_PROVIDER_ZOOM}"
                ))
                .into());
            }
        }

        if self.language.session_ttl_hours > 24 * 30 {
            return Err(TripMapError::config("Language session TTL cannot exceed 720 hours (30 days)").into());
        }

        Ok(())
    }

    fn validate_string_values(&self) -> Result<()> {
        let valid_log_levels = ["error", "warn", "info", "debug", "trace"];
        if !valid_log_levels.contains(&self.logging.level.as_str()) {
            return Err(TripMapError::config(format!(
                "Invalid log level '{}'. Must be one of: {}",
                self.logging.level,
                valid_log_levels.join(", ")
            ))
            .into());
        }

        let valid_log_formats = ["pretty", "json"];
        if !valid_log_formats.contains(&self.logging.format.as_str()) {
            return Err(TripMapError::config(format!(
                "Invalid log format '{}'. Must be one of: {}",
                self.logging.format,
                valid_log_formats.join(", ")
            ))
            .into());
        }

        if !self.maps.base_url.starts_with("http://") && !self.maps.base_url.starts_with("https://") {
            return Err(TripMapError::config("Maps API base URL must be a valid HTTP or HTTPS URL").into());
        }

        Ok(())
    }
}
