//! Marker and selection state behind the interactive map
//!
//! [`MapView`] owns the surface and is the only thing that mutates it.
//! Every grouping, key or language change goes through [`MapView::rebuild`],
//! which always clears the previous markers before installing new ones.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::marker::{ListEntry, Marker, MissingEntry};
use super::surface::{MapOptions, MapSurface, MarkerHandle};
use super::viewport::{Viewport, ViewportController, ViewportSettings};
use crate::catalog::{Catalog, Itinerary};
use crate::i18n::{Language, Translator, keys};
use crate::index::{GroupIndex, GroupKey, GroupingMode};
use crate::models::{Bounds, Coordinates, PlaceId};
use crate::{Result, TripMapError};

/// Geographic center of Taiwan, used before any group is shown
pub const TAIWAN_CENTER: Coordinates = Coordinates {
    latitude: 23.6978,
    longitude: 120.9605,
};

/// Read-only data a map view renders from
#[derive(Debug, Clone)]
pub struct MapData {
    pub catalog: Arc<Catalog>,
    pub itinerary: Arc<Itinerary>,
    pub translator: Arc<Translator>,
}

impl MapData {
    #[must_use]
    pub fn index(&self) -> GroupIndex<'_> {
        GroupIndex::new(&self.catalog, &self.itinerary)
    }
}

/// Where a place selection came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SelectionSource {
    Marker,
    List,
}

/// Rejected place selections; the view state is left untouched
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SelectionError {
    #[error("Place {0} has no marker in the active group")]
    NotOnMap(PlaceId),

    #[error("Marker {0:?} is not on the map")]
    UnknownMarker(MarkerHandle),
}

/// Active grouping, group and selected place
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Selection {
    pub key: GroupKey,
    pub place: Option<PlaceId>,
}

impl Selection {
    #[must_use]
    pub fn mode(&self) -> GroupingMode {
        self.key.mode()
    }
}

/// Result of one rebuild
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RebuildOutcome {
    pub key: GroupKey,
    pub language: Language,
    pub marker_count: usize,
    pub missing: Vec<MissingEntry>,
    /// Localized notice when the group has no resolvable places
    pub no_data: Option<String>,
    pub anchor: Option<Coordinates>,
    pub viewport: Viewport,
}

/// Owns a map surface and keeps it in sync with the selection
pub struct MapView<S: MapSurface> {
    surface: S,
    data: MapData,
    language: Language,
    selection: Selection,
    markers: Vec<(MarkerHandle, Marker)>,
    missing: Vec<MissingEntry>,
    no_data: Option<String>,
    info_open: Option<PlaceId>,
    viewport: ViewportController,
}

impl<S: MapSurface> MapView<S> {
    /// Create a view showing `key` in `language`
    pub fn new(
        surface: S,
        data: MapData,
        settings: ViewportSettings,
        key: GroupKey,
        language: Language,
    ) -> Result<Self> {
        let initial = initial_viewport(&data, &key, &settings);
        let mut view = Self {
            surface,
            data,
            language,
            selection: Selection {
                key: key.clone(),
                place: None,
            },
            markers: Vec::new(),
            missing: Vec::new(),
            no_data: None,
            info_open: None,
            viewport: ViewportController::new(settings, initial),
        };
        view.rebuild(key, language)?;
        Ok(view)
    }

    /// Clear and rebuild the map for `key` in `language`
    ///
    /// Calling this twice with the same arguments leaves the surface in the
    /// same state as calling it once.
    pub fn rebuild(&mut self, key: GroupKey, language: Language) -> Result<RebuildOutcome> {
        let data = self.data.clone();
        let index = data.index();
        let group = index
            .resolve(&key)
            .ok_or_else(|| TripMapError::validation(format!("Unknown group {key}")))?;
        let translator = &data.translator;

        self.close_info();
        for (handle, _) in self.markers.drain(..) {
            self.surface.remove_marker(handle);
        }

        for place in &group.places {
            let category = data.catalog.category_of(place.id);
            let marker = Marker::for_place(place, category, language, translator);
            let handle = self.surface.add_marker(&marker);
            self.markers.push((handle, marker));
        }

        self.missing = group
            .missing
            .iter()
            .map(|&id| MissingEntry::new(id, language, translator))
            .collect();
        if language != self.language {
            self.surface.set_language(language.maps_tag());
        }
        self.language = language;
        self.selection = Selection {
            key: key.clone(),
            place: None,
        };

        if group.is_empty() {
            warn!("Group {} has no places to show", key);
            self.no_data = Some(translator.text(language, keys::MAP_NO_DATA).to_string());
        } else {
            self.no_data = None;
            if let Some(anchor) = group.anchor {
                let view = self.viewport.recenter(anchor);
                self.surface.set_view(view);
            }
            if let Some(bounds) = Bounds::covering(group.places.iter().map(|place| place.coordinates())) {
                let view = self.viewport.fit(&bounds);
                self.surface.set_view(view);
            }
        }

        info!(
            "Rebuilt {} in {}: {} markers, {} missing",
            key,
            language,
            self.markers.len(),
            self.missing.len()
        );

        Ok(RebuildOutcome {
            key,
            language,
            marker_count: self.markers.len(),
            missing: self.missing.clone(),
            no_data: self.no_data.clone(),
            anchor: group.anchor,
            viewport: self.viewport.current(),
        })
    }

    /// Switch to another group; selecting the active group does nothing
    pub fn select_group(&mut self, key: GroupKey) -> Result<Option<RebuildOutcome>> {
        if key == self.selection.key {
            debug!("Group {} is already active", key);
            return Ok(None);
        }
        self.rebuild(key, self.language).map(Some)
    }

    /// Switch grouping mode, landing on the first group of that mode
    pub fn select_mode(&mut self, mode: GroupingMode) -> Result<Option<RebuildOutcome>> {
        if mode == self.selection.mode() {
            return Ok(None);
        }
        let key = self
            .data
            .index()
            .keys(mode)
            .into_iter()
            .next()
            .ok_or_else(|| TripMapError::catalog(format!("No groups for {mode:?}")))?;
        self.rebuild(key, self.language).map(Some)
    }

    /// Re-render everything in another language
    pub fn set_language(&mut self, language: Language) -> Result<RebuildOutcome> {
        self.rebuild(self.selection.key.clone(), language)
    }

    /// Focus a place and open its info display
    pub fn select_place(
        &mut self,
        id: PlaceId,
        source: SelectionSource,
    ) -> std::result::Result<Viewport, SelectionError> {
        let (handle, marker) = self
            .markers
            .iter()
            .find(|(_, marker)| marker.place_id == id)
            .cloned()
            .ok_or(SelectionError::NotOnMap(id))?;

        self.close_info();
        let view = self.viewport.focus(marker.position);
        self.surface.set_view(view);
        self.surface.open_info(handle, &marker.info);
        self.info_open = Some(id);
        self.selection.place = Some(id);

        debug!("Selected place {} from {:?}", id, source);
        Ok(view)
    }

    /// Handle a click on a marker
    pub fn click_marker(&mut self, handle: MarkerHandle) -> std::result::Result<Viewport, SelectionError> {
        let id = self
            .markers
            .iter()
            .find(|(candidate, _)| *candidate == handle)
            .map(|(_, marker)| marker.place_id)
            .ok_or(SelectionError::UnknownMarker(handle))?;
        self.select_place(id, SelectionSource::Marker)
    }

    pub fn close_info(&mut self) {
        if self.info_open.take().is_some() {
            self.surface.close_info();
        }
    }

    /// Rows for the list beside the map, missing entries in group order
    #[must_use]
    pub fn list_entries(&self) -> Vec<ListEntry> {
        let referenced = self.data.index().place_ids(&self.selection.key);
        let mut entries = Vec::with_capacity(referenced.len());
        for id in referenced {
            if let Some((_, marker)) = self.markers.iter().find(|(_, marker)| marker.place_id == id) {
                entries.push(ListEntry::Place {
                    place_id: id,
                    name: marker.title.clone(),
                    description: marker.info.description.clone(),
                    selected: self.selection.place == Some(id),
                });
            } else if let Some(missing) = self.missing.iter().find(|entry| entry.place_id == id) {
                entries.push(ListEntry::Missing(missing.clone()));
            }
        }
        entries
    }

    #[must_use]
    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    #[must_use]
    pub fn markers(&self) -> &[(MarkerHandle, Marker)] {
        &self.markers
    }

    #[must_use]
    pub fn handle_of(&self, id: PlaceId) -> Option<MarkerHandle> {
        self.markers
            .iter()
            .find(|(_, marker)| marker.place_id == id)
            .map(|(handle, _)| *handle)
    }

    #[must_use]
    pub fn missing(&self) -> &[MissingEntry] {
        &self.missing
    }

    #[must_use]
    pub fn no_data(&self) -> Option<&str> {
        self.no_data.as_deref()
    }

    /// Place whose info display is open
    #[must_use]
    pub fn info_open(&self) -> Option<PlaceId> {
        self.info_open
    }

    #[must_use]
    pub fn viewport(&self) -> Viewport {
        self.viewport.current()
    }

    #[must_use]
    pub fn surface(&self) -> &S {
        &self.surface
    }
}

fn initial_viewport(data: &MapData, key: &GroupKey, settings: &ViewportSettings) -> Viewport {
    let center = data
        .index()
        .resolve(key)
        .and_then(|group| group.anchor)
        .unwrap_or(TAIWAN_CENTER);
    Viewport {
        center,
        zoom: settings.initial_zoom,
    }
}

/// Result of mounting the map
pub enum MapState<S: MapSurface> {
    Ready(MapView<S>),
    /// The map could not be shown; `banner` stays up, there is no retry
    Unavailable { banner: String },
}

impl<S: MapSurface> MapState<S> {
    #[must_use]
    pub fn view(&self) -> Option<&MapView<S>> {
        match self {
            MapState::Ready(view) => Some(view),
            MapState::Unavailable { .. } => None,
        }
    }

    pub fn view_mut(&mut self) -> Option<&mut MapView<S>> {
        match self {
            MapState::Ready(view) => Some(view),
            MapState::Unavailable { .. } => None,
        }
    }

    #[must_use]
    pub fn banner(&self) -> Option<&str> {
        match self {
            MapState::Ready(_) => None,
            MapState::Unavailable { banner } => Some(banner),
        }
    }
}

/// Load the surface with `loader` and show `key`
///
/// A loader failure yields the localized load-error banner; a failure to
/// build the first scene yields the init-error banner.
pub fn mount<S, F>(
    loader: F,
    data: MapData,
    settings: ViewportSettings,
    key: GroupKey,
    language: Language,
) -> MapState<S>
where
    S: MapSurface,
    F: FnOnce(&MapOptions) -> anyhow::Result<S>,
{
    let options = MapOptions::new(initial_viewport(&data, &key, &settings), language);
    let translator = Arc::clone(&data.translator);

    let surface = match loader(&options) {
        Ok(surface) => surface,
        Err(e) => {
            warn!("Map surface failed to load: {:#}", e);
            return MapState::Unavailable {
                banner: translator.text(language, keys::MAP_LOAD_ERROR).to_string(),
            };
        }
    };

    match MapView::new(surface, data, settings, key, language) {
        Ok(view) => MapState::Ready(view),
        Err(e) => {
            warn!("Map initialization failed: {}", e);
            MapState::Unavailable {
                banner: translator.text(language, keys::MAP_INIT_ERROR).to_string(),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::map::surface::SceneSurface;

    fn data() -> MapData {
        MapData {
            catalog: Arc::new(Catalog::embedded().unwrap()),
            itinerary: Arc::new(Itinerary::embedded().unwrap()),
            translator: Arc::new(Translator::embedded().unwrap()),
        }
    }

    fn view(key: GroupKey, language: Language) -> MapView<SceneSurface> {
        let data = data();
        let settings = ViewportSettings::default();
        let options = MapOptions::new(initial_viewport(&data, &key, &settings), language);
        MapView::new(SceneSurface::new(&options), data, settings, key, language).unwrap()
    }

    #[test]
    fn test_rebuild_clears_previous_markers() {
        let mut view = view(GroupKey::Category("taipei".into()), Language::En);
        let taipei = view.markers().len();
        assert_eq!(view.surface().marker_count(), taipei);

        let outcome = view.rebuild(GroupKey::Category("taichung".into()), Language::En).unwrap();
        assert_eq!(outcome.marker_count, 4);
        assert_eq!(view.surface().marker_count(), 4);
        assert_eq!(view.surface().markers_added(), taipei + 4);
    }

    #[test]
    fn test_rebuild_is_idempotent() {
        let mut view = view(GroupKey::Day(2), Language::Ja);
        let first = view.rebuild(GroupKey::Day(2), Language::Ja).unwrap();
        let scene = view.surface().scene();
        let second = view.rebuild(GroupKey::Day(2), Language::Ja).unwrap();
        assert_eq!(first, second);
        assert_eq!(view.surface().scene(), scene);
    }

    #[test]
    fn test_rebuild_closes_info_and_clears_selection() {
        let mut view = view(GroupKey::Day(1), Language::En);
        view.select_place(9, SelectionSource::List).unwrap();
        assert!(view.surface().open_info().is_some());

        view.set_language(Language::Zh).unwrap();
        assert!(view.surface().open_info().is_none());
        assert_eq!(view.selection().place, None);
        assert_eq!(view.info_open(), None);
    }

    #[test]
    fn test_language_switch_reloads_map_labels() {
        let mut view = view(GroupKey::Day(1), Language::En);
        assert_eq!(view.surface().scene().language_tag, "en");

        view.set_language(Language::Zh).unwrap();
        let scene = view.surface().scene();
        assert_eq!(scene.language_tag, "zh-TW");
        assert_eq!(scene.markers[0].title, "桃園國際機場");
    }

    #[test]
    fn test_group_without_resolvable_places_keeps_viewport() {
        let itinerary = Itinerary::from_json(
            r#"{
                "start_date": "2025-04-25",
                "days": [
                    {"day": 1, "title": {"zh": "一", "en": "One", "ja": "一"}, "place_ids": [2, 9]},
                    {"day": 2, "title": {"zh": "二", "en": "Two", "ja": "二"}, "place_ids": [98, 99]}
                ]
            }"#,
        )
        .unwrap();
        let data = MapData {
            itinerary: Arc::new(itinerary),
            ..data()
        };
        let settings = ViewportSettings::default();
        let options = MapOptions::new(initial_viewport(&data, &GroupKey::Day(1), &settings), Language::En);
        let mut view = MapView::new(SceneSurface::new(&options), data, settings, GroupKey::Day(1), Language::En).unwrap();
        let before = view.viewport();

        let outcome = view.select_group(GroupKey::Day(2)).unwrap().unwrap();

        assert_eq!(outcome.marker_count, 0);
        assert_eq!(view.surface().marker_count(), 0);
        assert_eq!(outcome.no_data.as_deref(), Some("No places to show for this selection"));
        assert_eq!(view.no_data(), Some("No places to show for this selection"));
        assert_eq!(view.viewport(), before);
        assert_eq!(view.surface().viewport(), before);
        assert_eq!(outcome.anchor, None);
        assert_eq!(view.missing().len(), 2);
    }

    #[test]
    fn test_unknown_group_is_rejected() {
        let mut view = view(GroupKey::Day(1), Language::En);
        let before = view.surface().scene();
        assert!(view.rebuild(GroupKey::Day(42), Language::En).is_err());
        assert_eq!(view.surface().scene(), before);
    }

    #[test]
    fn test_select_group_skips_active_group() {
        let mut view = view(GroupKey::Day(4), Language::En);
        let added = view.surface().markers_added();
        assert!(view.select_group(GroupKey::Day(4)).unwrap().is_none());
        assert_eq!(view.surface().markers_added(), added);
    }

    #[test]
    fn test_select_mode_lands_on_first_group() {
        let mut view = view(GroupKey::Day(4), Language::En);
        let outcome = view.select_mode(GroupingMode::ByCategory).unwrap().unwrap();
        assert_eq!(outcome.key, GroupKey::Category("new-taipei".into()));
        assert!(view.select_mode(GroupingMode::ByCategory).unwrap().is_none());
    }

    #[test]
    fn test_selecting_place_outside_group_changes_nothing() {
        let mut view = view(GroupKey::Day(1), Language::En);
        view.select_place(2, SelectionSource::Marker).unwrap();
        let scene = view.surface().scene();

        assert_eq!(
            view.select_place(28, SelectionSource::List),
            Err(SelectionError::NotOnMap(28))
        );
        assert_eq!(view.surface().scene(), scene);
        assert_eq!(view.selection().place, Some(2));
    }

    #[test]
    fn test_selection_is_single_slot() {
        let mut view = view(GroupKey::Day(1), Language::En);
        view.select_place(2, SelectionSource::List).unwrap();
        view.select_place(10, SelectionSource::List).unwrap();
        let (anchor, info) = view.surface().open_info().unwrap();
        assert_eq!(info.place_id, 10);
        assert_eq!(Some(anchor), view.handle_of(10));
    }

    #[test]
    fn test_list_entries_flag_missing_places_in_order() {
        let view = view(GroupKey::Day(7), Language::En);
        let entries = view.list_entries();
        assert_eq!(entries.len(), 5);
        assert!(matches!(&entries[2], ListEntry::Missing(entry) if entry.place_id == 40));
        assert!(matches!(&entries[3], ListEntry::Place { place_id: 6, .. }));
    }

    #[test]
    fn test_mount_failure_shows_localized_banner() {
        let state: MapState<SceneSurface> = mount(
            |_| anyhow::bail!("script blocked"),
            data(),
            ViewportSettings::default(),
            GroupKey::Day(1),
            Language::En,
        );
        assert!(state.view().is_none());
        assert_eq!(
            state.banner(),
            Some("Failed to load map. Please check your internet connection or refresh the page.")
        );
    }

    #[test]
    fn test_mount_passes_language_tag_to_surface() {
        let state = mount(
            |options| {
                assert_eq!(options.language_tag, "zh-TW");
                Ok(SceneSurface::new(options))
            },
            data(),
            ViewportSettings::default(),
            GroupKey::Category("taoyuan".into()),
            Language::Zh,
        );
        let view = state.view().unwrap();
        assert_eq!(view.surface().scene().language_tag, "zh-TW");
        assert!(state.banner().is_none());
    }
}
