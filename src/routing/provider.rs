//! Directions provider interface and the Google Directions client

use std::time::Duration;

use async_trait::async_trait;
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{RetryTransientMiddleware, policies::ExponentialBackoff};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, instrument, warn};

use super::TravelMode;
use crate::config::MapsConfig;
use crate::i18n::Language;
use crate::models::Coordinates;
use crate::{Result, TripMapError};

/// One directions request between two resolved places
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionsRequest {
    pub origin: Coordinates,
    pub destination: Coordinates,
    pub mode: TravelMode,
    /// Language the provider should phrase distance and duration in
    pub language: Language,
    pub alternatives: bool,
}

/// Top-level status reported by the provider
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DirectionsStatus {
    Ok,
    NotFound,
    ZeroResults,
    MaxWaypointsExceeded,
    MaxRouteLengthExceeded,
    InvalidRequest,
    OverDailyLimit,
    OverQueryLimit,
    RequestDenied,
    UnknownError,
    #[serde(other)]
    Unrecognized,
}

/// Provider text plus the numeric value it was derived from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextValue {
    #[serde(default)]
    pub text: String,
    /// Meters for distances, seconds for durations
    #[serde(default)]
    pub value: Option<f64>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteLeg {
    #[serde(default)]
    pub distance: Option<TextValue>,
    #[serde(default)]
    pub duration: Option<TextValue>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Polyline {
    #[serde(default)]
    pub points: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteCandidate {
    #[serde(default)]
    pub summary: String,
    #[serde(default)]
    pub legs: Vec<RouteLeg>,
    #[serde(default)]
    pub overview_polyline: Polyline,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DirectionsResponse {
    pub status: DirectionsStatus,
    #[serde(default)]
    pub routes: Vec<RouteCandidate>,
    #[serde(default)]
    pub error_message: Option<String>,
}

impl DirectionsResponse {
    /// A response carrying only a status, e.g. for failures
    #[must_use]
    pub fn with_status(status: DirectionsStatus) -> Self {
        Self {
            status,
            routes: Vec::new(),
            error_message: None,
        }
    }
}

/// Failures reaching the provider at all
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Directions provider returned HTTP {status}")]
    Http { status: u16 },

    #[error("Directions request failed: {0}")]
    Transport(String),

    #[error("Could not decode directions response: {0}")]
    Decode(String),

    #[error("No directions API key configured")]
    NotConfigured,
}

/// Something that can compute routes between coordinates
#[async_trait]
pub trait DirectionsProvider: Send + Sync {
    async fn route(
        &self,
        request: &DirectionsRequest,
    ) -> std::result::Result<DirectionsResponse, ProviderError>;
}

/// Client for the Google Directions web service
#[derive(Clone)]
pub struct GoogleDirectionsClient {
    client: ClientWithMiddleware,
    base_url: String,
    api_key: String,
}

impl std::fmt::Debug for GoogleDirectionsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleDirectionsClient")
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GoogleDirectionsClient {
    pub fn new(config: &MapsConfig) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(concat!("tripmap/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| TripMapError::provider(format!("Failed to create HTTP client: {e}")))?;

        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(http)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
        })
    }

    fn url(&self, request: &DirectionsRequest) -> String {
        format!(
            "{}/directions/json?origin={}&destination={}&mode={}&alternatives={}&language={}&key={}",
            self.base_url,
            urlencoding::encode(&request.origin.format_coordinates()),
            urlencoding::encode(&request.destination.format_coordinates()),
            request.mode.api_value(),
            request.alternatives,
            urlencoding::encode(request.language.maps_tag()),
            urlencoding::encode(&self.api_key)
        )
    }
}

#[async_trait]
impl DirectionsProvider for GoogleDirectionsClient {
    #[instrument(skip(self), fields(mode = %request.mode))]
    async fn route(
        &self,
        request: &DirectionsRequest,
    ) -> std::result::Result<DirectionsResponse, ProviderError> {
        if self.api_key.is_empty() {
            return Err(ProviderError::NotConfigured);
        }

        debug!("Calling the directions API");
        let response = self
            .client
            .get(self.url(request))
            .send()
            .await
            .map_err(|e| ProviderError::Transport(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            warn!("Directions API answered with HTTP {}", status);
            return Err(ProviderError::Http {
                status: status.as_u16(),
            });
        }

        let body: DirectionsResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::Decode(e.to_string()))?;

        if let Some(message) = &body.error_message {
            warn!("Directions API reported {:?}: {}", body.status, message);
        }
        Ok(body)
    }
}
