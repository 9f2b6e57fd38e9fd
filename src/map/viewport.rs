//! Viewport framing
//!
//! Fitting uses Web-Mercator tile math: at zoom `z` the whole world is
//! `256 * 2^z` pixels wide, so the largest zoom at which a bounding box
//! fits into the usable map area can be computed directly.

use std::f64::consts::PI;

use serde::{Deserialize, Serialize};

use crate::config::MapConfig;
use crate::models::{Bounds, Coordinates};

const TILE_SIZE: f64 = 256.0;

/// Highest zoom level the provider renders
pub const MAX_PROVIDER_ZOOM: u8 = 21;

/// Center and zoom of the map
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Viewport {
    pub center: Coordinates,
    pub zoom: u8,
}

/// Fixed framing parameters
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewportSettings {
    pub width_px: u32,
    pub height_px: u32,
    pub padding_px: u32,
    /// Zoom ceiling applied after fitting bounds
    pub max_fit_zoom: u8,
    /// Zoom used when a single place is selected
    pub selection_zoom: u8,
    /// Zoom used when recentering on a group anchor
    pub initial_zoom: u8,
}

impl Default for ViewportSettings {
    fn default() -> Self {
        Self {
            width_px: 800,
            height_px: 400,
            padding_px: 50,
            max_fit_zoom: 15,
            selection_zoom: 16,
            initial_zoom: 11,
        }
    }
}

impl From<&MapConfig> for ViewportSettings {
    fn from(config: &MapConfig) -> Self {
        Self {
            width_px: config.width_px,
            height_px: config.height_px,
            padding_px: config.padding_px,
            max_fit_zoom: config.max_fit_zoom,
            selection_zoom: config.selection_zoom,
            initial_zoom: config.initial_zoom,
        }
    }
}

fn mercator_y(latitude: f64) -> f64 {
    let sin = latitude.to_radians().sin().clamp(-0.9999, 0.9999);
    0.5 * ((1.0 + sin) / (1.0 - sin)).ln()
}

fn latitude_from_mercator(y: f64) -> f64 {
    (2.0 * y.exp().atan() - PI / 2.0).to_degrees()
}

fn zoom_for(pixels: f64, world_fraction: f64) -> f64 {
    if world_fraction <= 0.0 {
        return f64::INFINITY;
    }
    (pixels / TILE_SIZE / world_fraction).log2()
}

/// Largest viewport showing all of `bounds` inside the padded map area,
/// with the zoom clamped to the fit ceiling
#[must_use]
pub fn fit_bounds(bounds: &Bounds, settings: &ViewportSettings) -> Viewport {
    let padding = f64::from(settings.padding_px) * 2.0;
    let usable_width = (f64::from(settings.width_px) - padding).max(1.0);
    let usable_height = (f64::from(settings.height_px) - padding).max(1.0);

    let north = mercator_y(bounds.north_east.latitude);
    let south = mercator_y(bounds.south_west.latitude);

    let lng_fraction = bounds.lng_span() / 360.0;
    let lat_fraction = (north - south) / (2.0 * PI);

    let zoom = zoom_for(usable_width, lng_fraction)
        .min(zoom_for(usable_height, lat_fraction))
        .floor()
        .clamp(0.0, f64::from(MAX_PROVIDER_ZOOM));
    // The clamp above bounds the value to 0..=21.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let zoom = (zoom as u8).min(settings.max_fit_zoom);

    let center = Coordinates::new(
        latitude_from_mercator((north + south) / 2.0),
        (bounds.south_west.longitude + bounds.north_east.longitude) / 2.0,
    );

    Viewport { center, zoom }
}

/// Width and height in pixels that `bounds` occupies at `zoom`
#[must_use]
pub fn pixel_extent(bounds: &Bounds, zoom: u8) -> (f64, f64) {
    let world = TILE_SIZE * 2f64.powi(i32::from(zoom));
    let width = bounds.lng_span() / 360.0 * world;
    let height = (mercator_y(bounds.north_east.latitude) - mercator_y(bounds.south_west.latitude))
        / (2.0 * PI)
        * world;
    (width, height)
}

/// Owns the current viewport and applies framing rules to it
#[derive(Debug, Clone)]
pub struct ViewportController {
    settings: ViewportSettings,
    current: Viewport,
}

impl ViewportController {
    #[must_use]
    pub fn new(settings: ViewportSettings, initial: Viewport) -> Self {
        Self {
            settings,
            current: initial,
        }
    }

    #[must_use]
    pub fn current(&self) -> Viewport {
        self.current
    }

    #[must_use]
    pub fn settings(&self) -> &ViewportSettings {
        &self.settings
    }

    /// Move to `center` at the initial zoom
    pub fn recenter(&mut self, center: Coordinates) -> Viewport {
        self.current = Viewport {
            center,
            zoom: self.settings.initial_zoom,
        };
        self.current
    }

    /// Frame all of `bounds`
    pub fn fit(&mut self, bounds: &Bounds) -> Viewport {
        self.current = fit_bounds(bounds, &self.settings);
        self.current
    }

    /// Pan to a single place and zoom in on it
    pub fn focus(&mut self, point: Coordinates) -> Viewport {
        self.current = Viewport {
            center: point,
            zoom: self.settings.selection_zoom,
        };
        self.current
    }
}
