//! Normalization of provider distance and duration text
//!
//! The provider phrases values in the request language ("5.2 km",
//! "1 時間20分", "1 小時 5 分鐘", "2 days 3 hours"). Text is parsed first;
//! the numeric meters/seconds are only used when the text is unusable.

use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};

use super::provider::TextValue;
use crate::i18n::{Language, Translator, keys};

const KM_PER_MILE: f64 = 1.609_344;

static DISTANCE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d[\d,]*(?:\.\d+)?)\s*(kilometers?|km|公里|キロメートル|キロ|miles?|mi|meters?|公尺|メートル|m)",
    )
    .unwrap_or_else(|e| unreachable!("invalid distance pattern: {e}"))
});

static DURATION_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)(\d+)\s*(days?|天|日|hours?|hrs?|小時|時間|時|minutes?|mins?|分鐘|分)",
    )
    .unwrap_or_else(|e| unreachable!("invalid duration pattern: {e}"))
});

/// Duration split into whole hours and remaining minutes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TravelTime {
    pub hours: u32,
    pub minutes: u32,
}

impl TravelTime {
    #[must_use]
    pub fn from_minutes(total: u32) -> Self {
        Self {
            hours: total / 60,
            minutes: total % 60,
        }
    }

    #[must_use]
    pub fn total_minutes(self) -> u32 {
        self.hours * 60 + self.minutes
    }
}

/// Parse distance text into kilometers
#[must_use]
pub fn parse_distance_km(text: &str) -> Option<f64> {
    let cleaned = text.replace(['"', '\''], "");
    let caps = DISTANCE_RE.captures(&cleaned)?;
    let value: f64 = caps[1].replace(',', "").parse().ok()?;
    let unit = caps[2].to_lowercase();

    let km = match unit.as_str() {
        "km" | "kilometer" | "kilometers" | "公里" | "キロメートル" | "キロ" => value,
        "mi" | "mile" | "miles" => value * KM_PER_MILE,
        _ => value / 1000.0,
    };
    Some(km)
}

/// Parse duration text into hours and minutes, folding days into hours
#[must_use]
pub fn parse_duration(text: &str) -> Option<TravelTime> {
    let cleaned = text.replace(['"', '\''], "");
    let mut total_minutes: u32 = 0;
    let mut matched = false;

    for caps in DURATION_RE.captures_iter(&cleaned) {
        let value: u32 = caps[1].parse().ok()?;
        let unit = caps[2].to_lowercase();
        let minutes = if unit.starts_with("day") || unit == "天" || unit == "日" {
            value.checked_mul(24 * 60)?
        } else if unit.starts_with('h') || unit.contains('時') {
            value.checked_mul(60)?
        } else {
            value
        };
        total_minutes = total_minutes.checked_add(minutes)?;
        matched = true;
    }

    matched.then(|| TravelTime::from_minutes(total_minutes))
}

/// Kilometers for a leg distance, falling back to the numeric meters
#[must_use]
pub fn normalize_distance(distance: Option<&TextValue>) -> Option<f64> {
    let distance = distance?;
    parse_distance_km(&distance.text).or_else(|| {
        distance
            .value
            .filter(|meters| meters.is_finite() && *meters >= 0.0)
            .map(|meters| meters / 1000.0)
    })
}

/// Travel time for a leg duration, falling back to the numeric seconds
#[must_use]
pub fn normalize_duration(duration: Option<&TextValue>) -> Option<TravelTime> {
    let duration = duration?;
    parse_duration(&duration.text).or_else(|| {
        duration
            .value
            .filter(|seconds| seconds.is_finite() && *seconds >= 0.0)
            .map(|seconds| {
                let minutes = (seconds / 60.0).round().min(f64::from(u32::MAX));
                // Bounded to the u32 range above.
                #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
                TravelTime::from_minutes(minutes as u32)
            })
    })
}

/// Round to one decimal, dropping a trailing `.0`
#[must_use]
pub fn display_km(km: f64) -> String {
    let rounded = (km * 10.0).round() / 10.0;
    format!("{rounded}")
}

#[must_use]
pub fn localize_distance(km: Option<f64>, lang: Language, translator: &Translator) -> String {
    match km {
        Some(km) => translator.format(lang, keys::UNIT_KILOMETERS, &[("value", &display_km(km))]),
        None => translator.text(lang, keys::ROUTE_UNKNOWN_DISTANCE).to_string(),
    }
}

#[must_use]
pub fn localize_duration(time: Option<TravelTime>, lang: Language, translator: &Translator) -> String {
    let Some(time) = time else {
        return translator.text(lang, keys::ROUTE_UNKNOWN_TIME).to_string();
    };

    let mut parts = Vec::with_capacity(2);
    if time.hours > 0 {
        let key = if time.hours == 1 { keys::UNIT_HOUR } else { keys::UNIT_HOURS };
        parts.push(translator.format(lang, key, &[("n", &time.hours.to_string())]));
    }
    if time.minutes > 0 || time.hours == 0 {
        let key = if time.minutes == 1 { keys::UNIT_MINUTE } else { keys::UNIT_MINUTES };
        parts.push(translator.format(lang, key, &[("n", &time.minutes.to_string())]));
    }
    parts.join(" ")
}
