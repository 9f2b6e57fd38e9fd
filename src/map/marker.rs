//! Map pins and their info payloads

use serde::{Deserialize, Serialize};

use crate::i18n::{Language, Translator, keys};
use crate::models::{Coordinates, LocationCategory, Place, PlaceId};

/// Labels shown next to the info payload values
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoLabels {
    pub address: String,
    pub description: String,
    pub view_details: String,
}

/// Content of the info display opened for a marker
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InfoPayload {
    pub place_id: PlaceId,
    pub name: String,
    /// The catalog has no street addresses; the category label stands in
    pub address: String,
    pub description: String,
    pub labels: InfoLabels,
}

/// One pin on the map
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Marker {
    pub place_id: PlaceId,
    pub position: Coordinates,
    pub title: String,
    pub info: InfoPayload,
}

impl Marker {
    /// Build the pin for `place` in `lang`
    #[must_use]
    pub fn for_place(
        place: &Place,
        category: Option<&LocationCategory>,
        lang: Language,
        translator: &Translator,
    ) -> Self {
        let name = place.name.get(lang).to_string();
        let description = place
            .description
            .translated(lang)
            .unwrap_or_else(|| translator.text(lang, keys::MAP_NO_DESCRIPTION))
            .to_string();
        let address = category
            .map(|category| category.label.get(lang).to_string())
            .unwrap_or_default();

        Self {
            place_id: place.id,
            position: place.coordinates(),
            title: name.clone(),
            info: InfoPayload {
                place_id: place.id,
                name,
                address,
                description,
                labels: InfoLabels {
                    address: translator.text(lang, keys::MAP_ADDRESS).to_string(),
                    description: translator.text(lang, keys::MAP_DESCRIPTION).to_string(),
                    view_details: translator.text(lang, keys::MAP_VIEW_DETAILS).to_string(),
                },
            },
        }
    }
}

/// A group entry whose place id has no catalog record
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingEntry {
    pub place_id: PlaceId,
    /// Localized "data missing" badge text
    pub label: String,
}

impl MissingEntry {
    #[must_use]
    pub fn new(place_id: PlaceId, lang: Language, translator: &Translator) -> Self {
        Self {
            place_id,
            label: translator.format(lang, keys::MAP_DATA_MISSING, &[("id", &place_id.to_string())]),
        }
    }
}

/// A row of the list shown beside the map
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ListEntry {
    Place {
        place_id: PlaceId,
        name: String,
        description: String,
        selected: bool,
    },
    Missing(MissingEntry),
}
