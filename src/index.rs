//! Category and day groupings over the catalog
//!
//! Both groupings drive the map tabs. Day groups reference places by id,
//! so resolving them may surface ids the catalog does not know about;
//! those are reported in [`ResolvedGroup::missing`] rather than dropped.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::catalog::{Catalog, Itinerary};
use crate::i18n::{Language, Translator, keys};
use crate::TripMapError;
use crate::models::{Coordinates, Place, PlaceId};

/// How places are partitioned into tabs
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GroupingMode {
    ByCategory,
    ByDay,
}

/// Identifies one tab within a grouping
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "mode", content = "key", rename_all = "snake_case")]
pub enum GroupKey {
    Category(String),
    Day(u32),
}

impl GroupKey {
    #[must_use]
    pub fn mode(&self) -> GroupingMode {
        match self {
            GroupKey::Category(_) => GroupingMode::ByCategory,
            GroupKey::Day(_) => GroupingMode::ByDay,
        }
    }
}

impl fmt::Display for GroupKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GroupKey::Category(key) => write!(f, "category:{key}"),
            GroupKey::Day(day) => write!(f, "day:{day}"),
        }
    }
}

/// Accepts `day:3`, `day-3`, `3`, `category:taipei` or a bare category key
impl FromStr for GroupKey {
    type Err = TripMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(TripMapError::validation("Group key cannot be empty"));
        }
        let day = s
            .strip_prefix("day:")
            .or_else(|| s.strip_prefix("day-"))
            .unwrap_or(s);
        if let Ok(day) = day.parse::<u32>() {
            return Ok(GroupKey::Day(day));
        }
        if s.starts_with("day:") || s.starts_with("day-") {
            return Err(TripMapError::validation(format!("Invalid day '{s}'")));
        }
        let category = s.strip_prefix("category:").unwrap_or(s);
        Ok(GroupKey::Category(category.to_string()))
    }
}

/// The places of one group, resolved against the catalog
#[derive(Debug, Clone)]
pub struct ResolvedGroup<'a> {
    pub key: GroupKey,
    /// Resolvable places, in group order
    pub places: Vec<&'a Place>,
    /// Referenced ids with no catalog entry, in group order
    pub missing: Vec<PlaceId>,
    /// Where the map is recentered before fitting the markers
    pub anchor: Option<Coordinates>,
}

impl ResolvedGroup<'_> {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.places.is_empty()
    }

    #[must_use]
    pub fn place_ids(&self) -> Vec<PlaceId> {
        self.places.iter().map(|place| place.id).collect()
    }
}

/// Derives group keys and group contents from the catalog and itinerary
#[derive(Debug, Clone, Copy)]
pub struct GroupIndex<'a> {
    catalog: &'a Catalog,
    itinerary: &'a Itinerary,
}

impl<'a> GroupIndex<'a> {
    #[must_use]
    pub fn new(catalog: &'a Catalog, itinerary: &'a Itinerary) -> Self {
        Self { catalog, itinerary }
    }

    /// Ordered tab keys for a grouping mode
    #[must_use]
    pub fn keys(&self, mode: GroupingMode) -> Vec<GroupKey> {
        match mode {
            GroupingMode::ByCategory => self
                .catalog
                .categories()
                .iter()
                .map(|category| GroupKey::Category(category.key.clone()))
                .collect(),
            GroupingMode::ByDay => self
                .itinerary
                .days()
                .iter()
                .map(|plan| GroupKey::Day(plan.day))
                .collect(),
        }
    }

    /// Tab label for a key in `lang`, or `None` for an unknown key
    #[must_use]
    pub fn label(&self, key: &GroupKey, lang: Language, translator: &Translator) -> Option<String> {
        match key {
            GroupKey::Category(category) => self
                .catalog
                .category(category)
                .map(|category| category.label.get(lang).to_string()),
            GroupKey::Day(day) => self.itinerary.day(*day).map(|plan| {
                let prefix = translator.format(lang, keys::DAY_LABEL, &[("day", &day.to_string())]);
                match plan.title.translated(lang) {
                    Some(title) => format!("{prefix} - {title}"),
                    None => prefix,
                }
            }),
        }
    }

    /// Ordered place ids in a group, as referenced (dangling ids included)
    #[must_use]
    pub fn place_ids(&self, key: &GroupKey) -> Vec<PlaceId> {
        match key {
            GroupKey::Category(category) => self
                .catalog
                .places_in(category)
                .iter()
                .map(|place| place.id)
                .collect(),
            GroupKey::Day(day) => self
                .itinerary
                .day(*day)
                .map(|plan| plan.place_ids.clone())
                .unwrap_or_default(),
        }
    }

    /// Resolve a group against the catalog; `None` if the key is unknown
    #[must_use]
    pub fn resolve(&self, key: &GroupKey) -> Option<ResolvedGroup<'a>> {
        match key {
            GroupKey::Category(category_key) => {
                let category = self.catalog.category(category_key)?;
                Some(ResolvedGroup {
                    key: key.clone(),
                    places: category.places.iter().collect(),
                    missing: Vec::new(),
                    anchor: Some(category.center),
                })
            }
            GroupKey::Day(day) => {
                let plan = self.itinerary.day(*day)?;
                let mut places = Vec::with_capacity(plan.place_ids.len());
                let mut missing = Vec::new();
                for &id in &plan.place_ids {
                    match self.catalog.get(id) {
                        Some(place) => places.push(place),
                        None => {
                            warn!("Day {} references place {} which is not in the catalog", day, id);
                            missing.push(id);
                        }
                    }
                }
                let anchor = places.first().map(|place| place.coordinates());
                Some(ResolvedGroup {
                    key: key.clone(),
                    places,
                    missing,
                    anchor,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixtures() -> (Catalog, Itinerary) {
        (Catalog::embedded().unwrap(), Itinerary::embedded().unwrap())
    }

    #[test]
    fn test_category_keys_in_catalog_order() {
        let (catalog, itinerary) = fixtures();
        let index = GroupIndex::new(&catalog, &itinerary);
        let keys = index.keys(GroupingMode::ByCategory);
        assert_eq!(keys.len(), 5);
        assert_eq!(keys[0], GroupKey::Category("new-taipei".into()));
        assert_eq!(keys[4], GroupKey::Category("taichung".into()));
    }

    #[test]
    fn test_day_keys_are_one_to_n() {
        let (catalog, itinerary) = fixtures();
        let index = GroupIndex::new(&catalog, &itinerary);
        let keys = index.keys(GroupingMode::ByDay);
        assert_eq!(keys, (1..=9).map(GroupKey::Day).collect::<Vec<_>>());
    }

    #[test]
    fn test_every_day_id_is_accounted_for() {
        let (catalog, itinerary) = fixtures();
        let index = GroupIndex::new(&catalog, &itinerary);
        for key in index.keys(GroupingMode::ByDay) {
            let referenced = index.place_ids(&key);
            let group = index.resolve(&key).unwrap();
            for id in &referenced {
                let resolved = group.places.iter().any(|place| place.id == *id);
                let flagged = group.missing.contains(id);
                assert!(resolved ^ flagged, "id {id} of {key} unaccounted for");
            }
            assert_eq!(group.places.len() + group.missing.len(), referenced.len());
        }
    }

    #[test]
    fn test_dangling_ids_are_flagged() {
        let (catalog, itinerary) = fixtures();
        let index = GroupIndex::new(&catalog, &itinerary);
        let day7 = index.resolve(&GroupKey::Day(7)).unwrap();
        assert_eq!(day7.missing, vec![40]);
        assert_eq!(day7.place_ids(), vec![5, 1, 6, 3]);
    }

    #[test]
    fn test_day_anchor_is_first_resolvable_place() {
        let (catalog, itinerary) = fixtures();
        let index = GroupIndex::new(&catalog, &itinerary);
        let day3 = index.resolve(&GroupKey::Day(3)).unwrap();
        assert_eq!(day3.anchor, Some(catalog.get(1).unwrap().coordinates()));
    }

    #[test]
    fn test_unknown_keys_resolve_to_none() {
        let (catalog, itinerary) = fixtures();
        let index = GroupIndex::new(&catalog, &itinerary);
        assert!(index.resolve(&GroupKey::Day(10)).is_none());
        assert!(index.resolve(&GroupKey::Category("kaohsiung".into())).is_none());
        assert!(index.place_ids(&GroupKey::Day(0)).is_empty());
    }

    #[test]
    fn test_group_key_parsing() {
        assert_eq!("day:3".parse::<GroupKey>().unwrap(), GroupKey::Day(3));
        assert_eq!("day-9".parse::<GroupKey>().unwrap(), GroupKey::Day(9));
        assert_eq!("4".parse::<GroupKey>().unwrap(), GroupKey::Day(4));
        assert_eq!(
            "category:taoyuan".parse::<GroupKey>().unwrap(),
            GroupKey::Category("taoyuan".into())
        );
        assert_eq!("taipei".parse::<GroupKey>().unwrap(), GroupKey::Category("taipei".into()));
        assert!("day:x".parse::<GroupKey>().is_err());
        assert!("".parse::<GroupKey>().is_err());
    }

    #[test]
    fn test_labels() {
        let (catalog, itinerary) = fixtures();
        let translator = Translator::embedded().unwrap();
        let index = GroupIndex::new(&catalog, &itinerary);
        assert_eq!(
            index
                .label(&GroupKey::Category("hsinchu".into()), Language::Ja, &translator)
                .unwrap(),
            "新竹県"
        );
        assert_eq!(
            index.label(&GroupKey::Day(8), Language::En, &translator).unwrap(),
            "Day 8 - Jiufen Day Tour"
        );
    }
}
