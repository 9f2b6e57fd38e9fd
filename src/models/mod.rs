//! Data models for the TripMap crate
//!
//! This module contains the core domain models organized by concern:
//! - Location: Geographic coordinates and bounds
//! - Place: Catalog places, categories and itinerary days

pub mod location;
pub mod place;

// Re-export all public types for convenient access
pub use location::{Bounds, Coordinates};
pub use place::{DayPlan, LocationCategory, Place, PlaceId};
