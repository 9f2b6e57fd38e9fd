//! Map markers, viewport framing and the view that ties them together

pub mod marker;
pub mod surface;
pub mod view;
pub mod viewport;

pub use marker::{InfoLabels, InfoPayload, ListEntry, Marker, MissingEntry};
pub use surface::{MapOptions, MapSurface, MarkerHandle, Scene, SceneSurface};
pub use view::{
    MapData, MapState, MapView, RebuildOutcome, Selection, SelectionError, SelectionSource, mount,
};
pub use viewport::{Viewport, ViewportController, ViewportSettings, fit_bounds};
