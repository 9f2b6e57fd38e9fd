//! `TripMap` - map, itinerary and route core of a multilingual travel site
//!
//! This library provides the location catalog, the category/day groupings
//! behind the map tabs, marker and viewport state, and a route calculator
//! backed by an external directions provider.

pub mod cache;
pub mod catalog;
pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod i18n;
pub mod index;
pub mod logging;
pub mod map;
pub mod models;
pub mod routing;
pub mod web;

// Re-export core types for public API
pub use cache::PersistentCache;
pub use catalog::{Catalog, Itinerary};
pub use config::TripMapConfig;
pub use context::AppContext;
pub use error::TripMapError;
pub use i18n::{Language, LocalizedText, Translator};
pub use index::{GroupIndex, GroupKey, GroupingMode};
pub use map::{MapState, MapView, SelectionSource};
pub use models::{Bounds, Coordinates, DayPlan, LocationCategory, Place, PlaceId};
pub use routing::{RouteCalculator, RouteQuery, TravelMode};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Core result type used throughout the library
pub type Result<T> = std::result::Result<T, TripMapError>;
