//! Message bundles for UI strings
//!
//! Lookups resolve in a fixed order: the requested language, then
//! [`Language::BASE`], then the raw key itself. A lookup never fails.

use std::collections::HashMap;

use anyhow::{Context, Result};
use tracing::debug;

use super::Language;

/// Message keys used by the map and route components
pub mod keys {
    pub const MAP_LOAD_ERROR: &str = "map.loadError";
    pub const MAP_INIT_ERROR: &str = "map.initError";
    pub const MAP_NO_DATA: &str = "map.noData";
    pub const MAP_DATA_MISSING: &str = "map.dataMissing";
    pub const MAP_ADDRESS: &str = "map.address";
    pub const MAP_DESCRIPTION: &str = "map.description";
    pub const MAP_NO_DESCRIPTION: &str = "map.noDescription";
    pub const MAP_VIEW_DETAILS: &str = "map.viewDetails";
    pub const DAY_LABEL: &str = "day.label";

    pub const ROUTE_UNKNOWN_DISTANCE: &str = "route.unknownDistance";
    pub const ROUTE_UNKNOWN_TIME: &str = "route.unknownTime";
    pub const ROUTE_CANNOT_CALCULATE: &str = "route.cannotCalculate";
    pub const ROUTE_NO_ROUTE: &str = "route.noRoute";
    pub const ROUTE_PLACE_NOT_FOUND: &str = "route.placeNotFound";
    pub const ROUTE_QUERY_LIMIT: &str = "route.queryLimit";
    pub const ROUTE_EMPTY_INPUT: &str = "route.emptyInput";
    pub const ROUTE_UNKNOWN_PLACE: &str = "route.unknownPlace";
    pub const ROUTE_SAME_PLACE: &str = "route.samePlace";
    pub const ROUTE_STRAIGHT_LINE: &str = "route.straightLine";

    pub const MODE_DRIVING: &str = "mode.driving";
    pub const MODE_TRANSIT: &str = "mode.transit";
    pub const MODE_WALKING: &str = "mode.walking";

    pub const UNIT_KILOMETERS: &str = "unit.kilometers";
    pub const UNIT_HOUR: &str = "unit.hour";
    pub const UNIT_HOURS: &str = "unit.hours";
    pub const UNIT_MINUTE: &str = "unit.minute";
    pub const UNIT_MINUTES: &str = "unit.minutes";
}

const ZH_BUNDLE: &str = include_str!("../data/locales/zh.json");
const EN_BUNDLE: &str = include_str!("../data/locales/en.json");
const JA_BUNDLE: &str = include_str!("../data/locales/ja.json");

/// Resolves message keys to localized strings
#[derive(Debug, Clone, Default)]
pub struct Translator {
    bundles: HashMap<Language, HashMap<String, String>>,
}

impl Translator {
    /// Load the bundles compiled into the binary
    pub fn embedded() -> Result<Self> {
        let mut bundles = HashMap::new();
        for (lang, source) in [
            (Language::Zh, ZH_BUNDLE),
            (Language::En, EN_BUNDLE),
            (Language::Ja, JA_BUNDLE),
        ] {
            let bundle: HashMap<String, String> = serde_json::from_str(source)
                .with_context(|| format!("Failed to parse message bundle for {lang}"))?;
            bundles.insert(lang, bundle);
        }
        Ok(Self { bundles })
    }

    /// Build a translator from explicit bundles
    #[must_use]
    pub fn from_bundles(bundles: HashMap<Language, HashMap<String, String>>) -> Self {
        Self { bundles }
    }

    /// Resolve `key` for `lang`
    #[must_use]
    pub fn text<'a>(&'a self, lang: Language, key: &'a str) -> &'a str {
        if let Some(value) = self.lookup(lang, key) {
            return value;
        }
        if lang != Language::BASE {
            if let Some(value) = self.lookup(Language::BASE, key) {
                debug!("No {lang} translation for '{key}', using base language");
                return value;
            }
        }
        debug!("No translation for '{key}' in any bundle");
        key
    }

    /// Resolve `key` and substitute `{name}` placeholders
    #[must_use]
    pub fn format(&self, lang: Language, key: &str, args: &[(&str, &str)]) -> String {
        let mut text = self.text(lang, key).to_string();
        for (name, value) in args {
            text = text.replace(&format!("{{{name}}}"), value);
        }
        text
    }

    fn lookup(&self, lang: Language, key: &str) -> Option<&str> {
        self.bundles
            .get(&lang)
            .and_then(|bundle| bundle.get(key))
            .map(String::as_str)
            .filter(|value| !value.is_empty())
    }
}
