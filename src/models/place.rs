//! Catalog places, categories and itinerary days

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::i18n::LocalizedText;
use crate::models::Coordinates;

/// Identifier of a place, unique across the catalog
pub type PlaceId = u32;

/// A point of interest shown on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Place {
    pub id: PlaceId,
    pub name: LocalizedText,
    pub lat: f64,
    pub lng: f64,
    #[serde(default)]
    pub description: LocalizedText,
}

impl Place {
    #[must_use]
    pub fn coordinates(&self) -> Coordinates {
        Coordinates::new(self.lat, self.lng)
    }
}

/// A geographic grouping of places (one map tab per category)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LocationCategory {
    /// Stable, language-independent key (e.g. `taipei`)
    pub key: String,
    pub label: LocalizedText,
    /// Where the map is centered before markers are fitted
    pub center: Coordinates,
    pub places: Vec<Place>,
}

/// One day of the trip and the places it visits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DayPlan {
    pub day: u32,
    pub date: NaiveDate,
    pub title: LocalizedText,
    /// Ordered place references; may contain ids unknown to the catalog
    pub place_ids: Vec<PlaceId>,
}
