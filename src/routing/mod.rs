//! Point-to-point routes between catalog places
//!
//! Path finding is delegated to a [`DirectionsProvider`]; this module
//! validates the query, normalizes the provider's text and classifies
//! its failures.

pub mod calculator;
pub mod format;
pub mod provider;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::TripMapError;
use crate::i18n::keys;

pub use calculator::{
    RouteCalculator, RouteDisplay, RouteFailure, RouteOutcome, RouteOverlay, RoutePrecondition,
    RouteState, RouteSummary, RouteTicket, TicketResult,
};
pub use provider::{
    DirectionsProvider, DirectionsRequest, DirectionsResponse, DirectionsStatus,
    GoogleDirectionsClient, ProviderError,
};

/// How the route is travelled
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TravelMode {
    #[default]
    Driving,
    Transit,
    Walking,
}

impl TravelMode {
    pub const ALL: [TravelMode; 3] = [TravelMode::Driving, TravelMode::Transit, TravelMode::Walking];

    /// Value of the provider's `mode` parameter
    #[must_use]
    pub fn api_value(self) -> &'static str {
        match self {
            TravelMode::Driving => "driving",
            TravelMode::Transit => "transit",
            TravelMode::Walking => "walking",
        }
    }

    #[must_use]
    pub fn label_key(self) -> &'static str {
        match self {
            TravelMode::Driving => keys::MODE_DRIVING,
            TravelMode::Transit => keys::MODE_TRANSIT,
            TravelMode::Walking => keys::MODE_WALKING,
        }
    }
}

impl fmt::Display for TravelMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.api_value())
    }
}

impl FromStr for TravelMode {
    type Err = TripMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "driving" | "drive" | "car" => Ok(TravelMode::Driving),
            "transit" | "public" => Ok(TravelMode::Transit),
            "walking" | "walk" => Ok(TravelMode::Walking),
            other => Err(TripMapError::validation(format!("Unknown travel mode '{other}'"))),
        }
    }
}

/// Free-text origin and destination as typed by the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteQuery {
    pub origin: String,
    pub destination: String,
    pub mode: TravelMode,
}

impl RouteQuery {
    #[must_use]
    pub fn new(origin: impl Into<String>, destination: impl Into<String>, mode: TravelMode) -> Self {
        Self {
            origin: origin.into(),
            destination: destination.into(),
            mode,
        }
    }
}
