//! Day-by-day trip plan

use chrono::{Days, NaiveDate};
use serde::Deserialize;

use crate::i18n::LocalizedText;
use crate::models::{DayPlan, PlaceId};
use crate::{Result, TripMapError};

const ITINERARY_JSON: &str = include_str!("../data/itinerary.json");

#[derive(Debug, Deserialize)]
struct ItineraryFile {
    start_date: NaiveDate,
    days: Vec<DayEntry>,
}

#[derive(Debug, Deserialize)]
struct DayEntry {
    day: u32,
    title: LocalizedText,
    place_ids: Vec<PlaceId>,
}

/// The ordered list of trip days
#[derive(Debug, Clone)]
pub struct Itinerary {
    start_date: NaiveDate,
    days: Vec<DayPlan>,
}

impl Itinerary {
    /// Load the itinerary compiled into the binary
    pub fn embedded() -> Result<Self> {
        Self::from_json(ITINERARY_JSON)
    }

    /// Parse an itinerary; days must be numbered 1..=N in order
    pub fn from_json(json: &str) -> Result<Self> {
        let file: ItineraryFile = serde_json::from_str(json)
            .map_err(|e| TripMapError::catalog(format!("Failed to parse itinerary: {e}")))?;

        let mut days = Vec::with_capacity(file.days.len());
        for (index, entry) in file.days.into_iter().enumerate() {
            let expected = u32::try_from(index + 1)
                .map_err(|_| TripMapError::catalog("Itinerary has too many days"))?;
            if entry.day != expected {
                return Err(TripMapError::catalog(format!(
                    "Itinerary day {} found where day {} was expected",
                    entry.day, expected
                )));
            }
            let date = file
                .start_date
                .checked_add_days(Days::new(u64::from(expected - 1)))
                .ok_or_else(|| TripMapError::catalog("Itinerary date out of range"))?;
            days.push(DayPlan {
                day: entry.day,
                date,
                title: entry.title,
                place_ids: entry.place_ids,
            });
        }

        Ok(Self {
            start_date: file.start_date,
            days,
        })
    }

    #[must_use]
    pub fn start_date(&self) -> NaiveDate {
        self.start_date
    }

    #[must_use]
    pub fn days(&self) -> &[DayPlan] {
        &self.days
    }

    #[must_use]
    pub fn day(&self, day: u32) -> Option<&DayPlan> {
        self.days.iter().find(|plan| plan.day == day)
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.days.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.days.is_empty()
    }
}
