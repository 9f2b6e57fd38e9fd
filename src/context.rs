//! Application context passed to every command
//!
//! Holds configuration, the embedded data, the preference store and the
//! current display language.

use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use crate::cache::PersistentCache;
use crate::catalog::{Catalog, Itinerary};
use crate::config::TripMapConfig;
use crate::i18n::{Language, Translator};
use crate::index::GroupIndex;
use crate::map::{MapData, ViewportSettings};
use crate::routing::{GoogleDirectionsClient, RouteCalculator};

const LANGUAGE_KEY: &str = "preference:language";

pub struct AppContext {
    pub config: TripMapConfig,
    pub catalog: Arc<Catalog>,
    pub itinerary: Arc<Itinerary>,
    pub translator: Arc<Translator>,
    store: Option<PersistentCache>,
    language: Language,
}

impl AppContext {
    /// Load the embedded data; no preference store is attached
    pub fn new(config: TripMapConfig) -> Result<Self> {
        let catalog = Catalog::embedded().context("Failed to load location catalog")?;
        let itinerary = Itinerary::embedded().context("Failed to load itinerary")?;
        let translator = Translator::embedded()?;
        let language = config.language.default;

        Ok(Self {
            config,
            catalog: Arc::new(catalog),
            itinerary: Arc::new(itinerary),
            translator: Arc::new(translator),
            store: None,
            language,
        })
    }

    /// Open the store at the configured location and attach it
    pub fn open_store(&mut self) -> Result<()> {
        let path = self.config.cache.resolved_location();
        std::fs::create_dir_all(&path)
            .with_context(|| format!("Failed to create cache directory: {}", path.display()))?;
        self.store = Some(PersistentCache::open(&path)?);
        debug!("Opened preference store at {}", path.display());
        Ok(())
    }

    #[must_use]
    pub fn with_store(mut self, store: PersistentCache) -> Self {
        self.store = Some(store);
        self
    }

    #[must_use]
    pub fn language(&self) -> Language {
        self.language
    }

    /// Load the remembered language, keeping the default when none is
    /// stored or the store is unreadable
    pub async fn restore_language(&mut self) -> Language {
        if let Some(store) = &self.store {
            match store.get::<Language>(LANGUAGE_KEY).await {
                Ok(Some(language)) => {
                    debug!("Restored language preference {}", language);
                    self.language = language;
                }
                Ok(None) => {}
                Err(e) => warn!("Could not read language preference: {:#}", e),
            }
        }
        self.language
    }

    /// Switch the display language and remember it for the session
    pub async fn set_language(&mut self, language: Language) -> Result<()> {
        self.language = language;
        if let Some(store) = &self.store {
            store
                .put(LANGUAGE_KEY, language, self.config.language.session_ttl())
                .await
                .context("Failed to store language preference")?;
        }
        info!("Display language set to {}", language);
        Ok(())
    }

    #[must_use]
    pub fn group_index(&self) -> GroupIndex<'_> {
        GroupIndex::new(&self.catalog, &self.itinerary)
    }

    #[must_use]
    pub fn map_data(&self) -> MapData {
        MapData {
            catalog: Arc::clone(&self.catalog),
            itinerary: Arc::clone(&self.itinerary),
            translator: Arc::clone(&self.translator),
        }
    }

    #[must_use]
    pub fn viewport_settings(&self) -> ViewportSettings {
        ViewportSettings::from(&self.config.map)
    }

    #[must_use]
    pub fn route_calculator(&self) -> RouteCalculator {
        RouteCalculator::new(Arc::clone(&self.catalog))
    }

    /// Directions client; responses are never written to the store
    pub fn directions(&self) -> crate::Result<GoogleDirectionsClient> {
        GoogleDirectionsClient::new(&self.config.maps)
    }
}
