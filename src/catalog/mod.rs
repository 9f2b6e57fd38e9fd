//! Location catalog
//!
//! The catalog is the single source of truth for every map and route
//! lookup. It is loaded once from the JSON compiled into the binary,
//! validated, and never mutated afterwards.

pub mod itinerary;

use std::collections::{HashMap, HashSet};

use tracing::{debug, info};

use crate::i18n::Language;
use crate::models::{LocationCategory, Place, PlaceId};
use crate::{Result, TripMapError};

pub use itinerary::Itinerary;

const LOCATIONS_JSON: &str = include_str!("../data/locations.json");

/// Read-only table of all known places, grouped by category
#[derive(Debug, Clone)]
pub struct Catalog {
    categories: Vec<LocationCategory>,
    /// id -> (category index, place index)
    by_id: HashMap<PlaceId, (usize, usize)>,
}

impl Catalog {
    /// Load the catalog compiled into the binary
    pub fn embedded() -> Result<Self> {
        Self::from_json(LOCATIONS_JSON)
    }

    /// Parse and validate a catalog from JSON
    pub fn from_json(json: &str) -> Result<Self> {
        let categories: Vec<LocationCategory> = serde_json::from_str(json)
            .map_err(|e| TripMapError::catalog(format!("Failed to parse locations: {e}")))?;
        Self::new(categories)
    }

    /// Build a catalog, rejecting duplicate ids, duplicate category keys
    /// and out-of-range coordinates
    pub fn new(categories: Vec<LocationCategory>) -> Result<Self> {
        let mut by_id = HashMap::new();
        let mut category_keys = HashSet::new();

        for (category_index, category) in categories.iter().enumerate() {
            if !category_keys.insert(category.key.as_str()) {
                return Err(TripMapError::catalog(format!(
                    "Duplicate category key '{}'",
                    category.key
                )));
            }
            for (place_index, place) in category.places.iter().enumerate() {
                if !place.coordinates().is_valid() {
                    return Err(TripMapError::catalog(format!(
                        "Place {} has invalid coordinates ({}, {})",
                        place.id, place.lat, place.lng
                    )));
                }
                if by_id.insert(place.id, (category_index, place_index)).is_some() {
                    return Err(TripMapError::catalog(format!(
                        "Duplicate place id {}",
                        place.id
                    )));
                }
            }
        }

        info!(
            "Loaded catalog with {} places in {} categories",
            by_id.len(),
            categories.len()
        );
        Ok(Self { categories, by_id })
    }

    /// Categories in display order
    #[must_use]
    pub fn categories(&self) -> &[LocationCategory] {
        &self.categories
    }

    #[must_use]
    pub fn category(&self, key: &str) -> Option<&LocationCategory> {
        self.categories.iter().find(|category| category.key == key)
    }

    /// Look up a place by id
    #[must_use]
    pub fn get(&self, id: PlaceId) -> Option<&Place> {
        let place = self
            .by_id
            .get(&id)
            .map(|&(category, index)| &self.categories[category].places[index]);
        if place.is_none() {
            debug!("Place {} not found in catalog", id);
        }
        place
    }

    /// Category a place belongs to
    #[must_use]
    pub fn category_of(&self, id: PlaceId) -> Option<&LocationCategory> {
        self.by_id
            .get(&id)
            .map(|&(category, _)| &self.categories[category])
    }

    /// Exact match on the localized name in `lang`
    #[must_use]
    pub fn find_by_name(&self, lang: Language, name: &str) -> Option<&Place> {
        let name = name.trim();
        if name.is_empty() {
            return None;
        }
        self.all_places().find(|place| place.name.raw(lang) == name)
    }

    /// Places of one category in display order
    #[must_use]
    pub fn places_in(&self, key: &str) -> &[Place] {
        self.category(key)
            .map(|category| category.places.as_slice())
            .unwrap_or_default()
    }

    pub fn all_places(&self) -> impl Iterator<Item = &Place> {
        self.categories
            .iter()
            .flat_map(|category| category.places.iter())
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.by_id.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// Localized names of every place, ordered by id
    #[must_use]
    pub fn names_by_id(&self, lang: Language) -> Vec<&str> {
        let mut places: Vec<&Place> = self.all_places().collect();
        places.sort_by_key(|place| place.id);
        places.into_iter().map(|place| place.name.get(lang)).collect()
    }

    /// Case-insensitive substring filter over names translated into
    /// `lang`, in catalog order
    #[must_use]
    pub fn suggest(&self, lang: Language, fragment: &str) -> Vec<&str> {
        let needle = fragment.trim().to_lowercase();
        if needle.is_empty() {
            return Vec::new();
        }
        self.all_places()
            .map(|place| place.name.raw(lang))
            .filter(|name| name.to_lowercase().contains(&needle))
            .collect()
    }
}
