//! The seam to the interactive map widget
//!
//! [`MapSurface`] is what a concrete widget binding implements.
//! [`SceneSurface`] records the resulting scene instead of drawing it; the
//! static export serializes that scene for the site to replay.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::debug;

use super::marker::{InfoPayload, Marker};
use super::viewport::Viewport;
use crate::i18n::Language;

/// Opaque handle to a marker placed on a surface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct MarkerHandle(pub u64);

/// Options the widget is created with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MapOptions {
    pub viewport: Viewport,
    /// Label language tag passed to the provider (e.g. `zh-TW`)
    pub language_tag: String,
}

impl MapOptions {
    #[must_use]
    pub fn new(viewport: Viewport, language: Language) -> Self {
        Self {
            viewport,
            language_tag: language.maps_tag().to_string(),
        }
    }
}

/// Operations the map view needs from the widget
pub trait MapSurface {
    fn set_view(&mut self, viewport: Viewport);
    fn add_marker(&mut self, marker: &Marker) -> MarkerHandle;
    fn remove_marker(&mut self, handle: MarkerHandle);
    /// Show `info` anchored at `anchor`, replacing whatever was open
    fn open_info(&mut self, anchor: MarkerHandle, info: &InfoPayload);
    fn close_info(&mut self);
    /// Reload map labels in the language tagged `tag`
    fn set_language(&mut self, tag: &str);
}

/// Serializable snapshot of a [`SceneSurface`]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scene {
    pub language_tag: String,
    pub viewport: Viewport,
    pub markers: Vec<Marker>,
    pub open_info: Option<InfoPayload>,
}

/// A surface that keeps the scene in memory
#[derive(Debug, Clone)]
pub struct SceneSurface {
    language_tag: String,
    viewport: Viewport,
    next_handle: u64,
    markers: BTreeMap<MarkerHandle, Marker>,
    open_info: Option<(MarkerHandle, InfoPayload)>,
    /// Total markers ever added, for diagnosing duplicate pins
    added: usize,
}

impl SceneSurface {
    #[must_use]
    pub fn new(options: &MapOptions) -> Self {
        Self {
            language_tag: options.language_tag.clone(),
            viewport: options.viewport,
            next_handle: 0,
            markers: BTreeMap::new(),
            open_info: None,
            added: 0,
        }
    }

    #[must_use]
    pub fn marker_count(&self) -> usize {
        self.markers.len()
    }

    #[must_use]
    pub fn markers_added(&self) -> usize {
        self.added
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport
    }

    /// Info payload and its anchor marker, if one is open
    #[must_use]
    pub fn open_info(&self) -> Option<(MarkerHandle, &InfoPayload)> {
        self.open_info.as_ref().map(|(handle, info)| (*handle, info))
    }

    #[must_use]
    pub fn scene(&self) -> Scene {
        Scene {
            language_tag: self.language_tag.clone(),
            viewport: self.viewport,
            markers: self.markers.values().cloned().collect(),
            open_info: self.open_info.as_ref().map(|(_, info)| info.clone()),
        }
    }
}

impl MapSurface for SceneSurface {
    fn set_view(&mut self, viewport: Viewport) {
        self.viewport = viewport;
    }

    fn add_marker(&mut self, marker: &Marker) -> MarkerHandle {
        let handle = MarkerHandle(self.next_handle);
        self.next_handle += 1;
        self.added += 1;
        self.markers.insert(handle, marker.clone());
        handle
    }

    fn remove_marker(&mut self, handle: MarkerHandle) {
        if self.markers.remove(&handle).is_none() {
            debug!("Marker {:?} was already removed", handle);
        }
        if matches!(self.open_info, Some((anchor, _)) if anchor == handle) {
            self.open_info = None;
        }
    }

    fn open_info(&mut self, anchor: MarkerHandle, info: &InfoPayload) {
        self.open_info = Some((anchor, info.clone()));
    }

    fn close_info(&mut self) {
        self.open_info = None;
    }

    fn set_language(&mut self, tag: &str) {
        self.language_tag = tag.to_string();
    }
}
