//! Display languages and localized text
//!
//! The site ships in three languages. Every piece of user-facing text is
//! either a [`LocalizedText`] value stored alongside the data it describes,
//! or a message key resolved through the [`Translator`].

pub mod translator;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::TripMapError;

pub use translator::{Translator, keys};

/// Supported display languages
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    /// Traditional Chinese, the language the data was authored in
    Zh,
    En,
    Ja,
}

impl Language {
    pub const ALL: [Language; 3] = [Language::Zh, Language::En, Language::Ja];

    /// Language used when a translation is absent
    pub const BASE: Language = Language::Zh;

    /// Language shown to first-time visitors
    pub const DEFAULT: Language = Language::Ja;

    /// Short tag used in preference storage and file names
    #[must_use]
    pub fn code(self) -> &'static str {
        match self {
            Language::Zh => "zh",
            Language::En => "en",
            Language::Ja => "ja",
        }
    }

    /// Language tag passed to the mapping provider for map labels
    #[must_use]
    pub fn maps_tag(self) -> &'static str {
        match self {
            Language::Zh => "zh-TW",
            Language::En => "en",
            Language::Ja => "ja",
        }
    }
}

impl Default for Language {
    fn default() -> Self {
        Language::DEFAULT
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for Language {
    type Err = TripMapError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "zh" | "zh-tw" | "zh-hant" => Ok(Language::Zh),
            "en" | "en-us" | "en-gb" => Ok(Language::En),
            "ja" | "ja-jp" => Ok(Language::Ja),
            other => Err(TripMapError::validation(format!(
                "unknown language '{other}', expected one of zh, en, ja"
            ))),
        }
    }
}

/// Text with one value per supported language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct LocalizedText {
    #[serde(default)]
    pub zh: String,
    #[serde(default)]
    pub en: String,
    #[serde(default)]
    pub ja: String,
}

impl LocalizedText {
    #[must_use]
    pub fn new(zh: impl Into<String>, en: impl Into<String>, ja: impl Into<String>) -> Self {
        Self {
            zh: zh.into(),
            en: en.into(),
            ja: ja.into(),
        }
    }

    /// Value stored for exactly this language, possibly empty
    #[must_use]
    pub fn raw(&self, lang: Language) -> &str {
        match lang {
            Language::Zh => &self.zh,
            Language::En => &self.en,
            Language::Ja => &self.ja,
        }
    }

    /// Value for `lang`, falling back to the base language when empty
    #[must_use]
    pub fn get(&self, lang: Language) -> &str {
        let value = self.raw(lang);
        if value.trim().is_empty() {
            self.raw(Language::BASE)
        } else {
            value
        }
    }

    /// Value for `lang` only if it is actually translated
    #[must_use]
    pub fn translated(&self, lang: Language) -> Option<&str> {
        let value = self.get(lang);
        (!value.trim().is_empty()).then_some(value)
    }
}
