//! Route calculation state machine
//!
//! `Idle -> Resolving -> Requesting -> Done`. Input is validated against
//! the catalog before anything is sent; a rejected query leaves the state
//! as it was. Every request carries a sequence number and only the
//! response to the latest request is applied.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};

use super::format::{self, TravelTime};
use super::provider::{
    DirectionsProvider, DirectionsRequest, DirectionsResponse, DirectionsStatus, ProviderError,
};
use super::{RouteQuery, TravelMode};
use crate::catalog::Catalog;
use crate::i18n::{Language, Translator, keys};
use crate::models::{Coordinates, Place, PlaceId};

/// Input problems detected before any request is made
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RoutePrecondition {
    #[error("Origin and destination are required")]
    EmptyInput,

    #[error("'{0}' is not a known place")]
    UnknownPlace(String),

    #[error("Origin and destination are the same place")]
    SamePlace,
}

impl RoutePrecondition {
    #[must_use]
    pub fn message(&self, lang: Language, translator: &Translator) -> String {
        match self {
            RoutePrecondition::EmptyInput => translator.text(lang, keys::ROUTE_EMPTY_INPUT).to_string(),
            RoutePrecondition::UnknownPlace(name) => {
                translator.format(lang, keys::ROUTE_UNKNOWN_PLACE, &[("name", name)])
            }
            RoutePrecondition::SamePlace => translator.text(lang, keys::ROUTE_SAME_PLACE).to_string(),
        }
    }
}

/// Classified provider failure; the raw status is never shown
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RouteFailure {
    #[error("No route between the places")]
    NoRoute,

    #[error("The provider could not find one of the places")]
    PlaceNotFound,

    #[error("The provider rate limit was exceeded")]
    RateLimited,

    #[error("The route could not be calculated")]
    Other,
}

impl RouteFailure {
    /// Failure for a provider status, `None` for `OK`
    #[must_use]
    pub fn from_status(status: DirectionsStatus) -> Option<Self> {
        match status {
            DirectionsStatus::Ok => None,
            DirectionsStatus::ZeroResults => Some(RouteFailure::NoRoute),
            DirectionsStatus::NotFound => Some(RouteFailure::PlaceNotFound),
            DirectionsStatus::OverQueryLimit | DirectionsStatus::OverDailyLimit => {
                Some(RouteFailure::RateLimited)
            }
            _ => Some(RouteFailure::Other),
        }
    }

    #[must_use]
    pub fn from_provider_error(error: &ProviderError) -> Self {
        match error {
            ProviderError::Http { status: 429 } => RouteFailure::RateLimited,
            _ => RouteFailure::Other,
        }
    }

    #[must_use]
    pub fn message(self, lang: Language, translator: &Translator) -> String {
        let key = match self {
            RouteFailure::NoRoute => keys::ROUTE_NO_ROUTE,
            RouteFailure::PlaceNotFound => keys::ROUTE_PLACE_NOT_FOUND,
            RouteFailure::RateLimited => keys::ROUTE_QUERY_LIMIT,
            RouteFailure::Other => keys::ROUTE_CANNOT_CALCULATE,
        };
        translator.text(lang, key).to_string()
    }
}

/// Normalized, language-independent route result
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteSummary {
    pub origin: PlaceId,
    pub destination: PlaceId,
    pub mode: TravelMode,
    pub distance_km: Option<f64>,
    pub duration: Option<TravelTime>,
    pub straight_line_km: f64,
    /// Provider's route name, e.g. the main road
    pub summary: String,
}

/// A route summary rendered for one language
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RouteDisplay {
    pub mode: String,
    pub distance: String,
    pub duration: String,
    pub straight_line: String,
}

impl RouteSummary {
    #[must_use]
    pub fn localize(&self, lang: Language, translator: &Translator) -> RouteDisplay {
        RouteDisplay {
            mode: translator.text(lang, self.mode.label_key()).to_string(),
            distance: format::localize_distance(self.distance_km, lang, translator),
            duration: format::localize_duration(self.duration, lang, translator),
            straight_line: format!(
                "{}: {}",
                translator.text(lang, keys::ROUTE_STRAIGHT_LINE),
                format::localize_distance(Some(self.straight_line_km), lang, translator)
            ),
        }
    }
}

pub type RouteOutcome = Result<RouteSummary, RouteFailure>;

/// Path drawn on the map for a successful route
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteOverlay {
    pub origin: Coordinates,
    pub destination: Coordinates,
    pub mode: TravelMode,
    /// Encoded overview polyline as returned by the provider
    pub polyline: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum RouteState {
    Idle,
    /// Origin and destination are being matched against the catalog
    Resolving,
    Requesting { seq: u64 },
    Done(RouteOutcome),
}

/// An in-flight request; hand it back to [`RouteCalculator::finish`]
#[derive(Debug, Clone, PartialEq)]
pub struct RouteTicket {
    pub seq: u64,
    pub request: DirectionsRequest,
    origin: PlaceId,
    destination: PlaceId,
    straight_line_km: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TicketResult {
    Applied,
    /// A newer request was started; the response was dropped
    Stale,
}

pub struct RouteCalculator {
    catalog: Arc<Catalog>,
    state: RouteState,
    last_seq: u64,
    overlay: Option<RouteOverlay>,
}

impl RouteCalculator {
    #[must_use]
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self {
            catalog,
            state: RouteState::Idle,
            last_seq: 0,
            overlay: None,
        }
    }

    /// Resolve both ends of `query` against the catalog
    pub fn check(&self, query: &RouteQuery, lang: Language) -> Result<(&Place, &Place), RoutePrecondition> {
        resolve_places(&self.catalog, query, lang)
    }

    /// Whether `calculate` would send a request for `query`
    #[must_use]
    pub fn can_calculate(&self, query: &RouteQuery, lang: Language) -> bool {
        self.check(query, lang).is_ok()
    }

    /// Validate `query` and move to `Requesting`
    pub fn begin(&mut self, query: &RouteQuery, lang: Language) -> Result<RouteTicket, RoutePrecondition> {
        let previous = std::mem::replace(&mut self.state, RouteState::Resolving);

        let catalog = Arc::clone(&self.catalog);
        let (origin, destination) = match resolve_places(&catalog, query, lang) {
            Ok(places) => places,
            Err(rejection) => {
                debug!("Route query rejected: {}", rejection);
                self.state = previous;
                return Err(rejection);
            }
        };

        self.last_seq += 1;
        let seq = self.last_seq;
        self.state = RouteState::Requesting { seq };
        self.overlay = None;

        Ok(RouteTicket {
            seq,
            request: DirectionsRequest {
                origin: origin.coordinates(),
                destination: destination.coordinates(),
                mode: query.mode,
                language: lang,
                alternatives: true,
            },
            origin: origin.id,
            destination: destination.id,
            straight_line_km: origin.coordinates().distance_km(&destination.coordinates()),
        })
    }

    /// Apply the provider's answer to `ticket` unless a newer request exists
    pub fn finish(
        &mut self,
        ticket: RouteTicket,
        response: Result<DirectionsResponse, ProviderError>,
    ) -> TicketResult {
        if ticket.seq != self.last_seq {
            debug!(
                "Dropping response for request {} (latest is {})",
                ticket.seq, self.last_seq
            );
            return TicketResult::Stale;
        }
        self.apply(&ticket, response);
        TicketResult::Applied
    }

    fn apply(
        &mut self,
        ticket: &RouteTicket,
        response: Result<DirectionsResponse, ProviderError>,
    ) -> RouteOutcome {
        let (outcome, overlay) = match response {
            Ok(response) => Self::interpret(ticket, response),
            Err(e) => {
                warn!("Directions request failed: {}", e);
                (Err(RouteFailure::from_provider_error(&e)), None)
            }
        };

        match &outcome {
            Ok(summary) => info!(
                "Route {} -> {} ({}): {:?} km, {:?}",
                summary.origin, summary.destination, summary.mode, summary.distance_km, summary.duration
            ),
            Err(failure) => info!(
                "Route {} -> {} failed: {:?}",
                ticket.origin, ticket.destination, failure
            ),
        }

        self.overlay = overlay;
        self.state = RouteState::Done(outcome.clone());
        outcome
    }

    fn interpret(
        ticket: &RouteTicket,
        mut response: DirectionsResponse,
    ) -> (RouteOutcome, Option<RouteOverlay>) {
        if let Some(failure) = RouteFailure::from_status(response.status) {
            return (Err(failure), None);
        }
        if response.routes.is_empty() {
            return (Err(RouteFailure::NoRoute), None);
        }
        let route = response.routes.swap_remove(0);
        let leg = route.legs.first();

        let summary = RouteSummary {
            origin: ticket.origin,
            destination: ticket.destination,
            mode: ticket.request.mode,
            distance_km: format::normalize_distance(leg.and_then(|leg| leg.distance.as_ref())),
            duration: format::normalize_duration(leg.and_then(|leg| leg.duration.as_ref())),
            straight_line_km: ticket.straight_line_km,
            summary: route.summary,
        };
        let overlay = RouteOverlay {
            origin: ticket.request.origin,
            destination: ticket.request.destination,
            mode: ticket.request.mode,
            polyline: route.overview_polyline.points,
        };
        (Ok(summary), Some(overlay))
    }

    /// Validate, request and apply in one step
    ///
    /// Holding `&mut self` across the request means no newer request can
    /// start meanwhile, so the response is always applied.
    pub async fn calculate<P>(
        &mut self,
        provider: &P,
        query: &RouteQuery,
        lang: Language,
    ) -> Result<RouteOutcome, RoutePrecondition>
    where
        P: DirectionsProvider + ?Sized,
    {
        let ticket = self.begin(query, lang)?;
        let response = provider.route(&ticket.request).await;
        Ok(self.apply(&ticket, response))
    }

    #[must_use]
    pub fn state(&self) -> &RouteState {
        &self.state
    }

    /// Latest applied outcome
    #[must_use]
    pub fn outcome(&self) -> Option<&RouteOutcome> {
        match &self.state {
            RouteState::Done(outcome) => Some(outcome),
            _ => None,
        }
    }

    #[must_use]
    pub fn overlay(&self) -> Option<&RouteOverlay> {
        self.overlay.as_ref()
    }
}

fn resolve_places<'a>(
    catalog: &'a Catalog,
    query: &RouteQuery,
    lang: Language,
) -> Result<(&'a Place, &'a Place), RoutePrecondition> {
    let origin = query.origin.trim();
    let destination = query.destination.trim();
    if origin.is_empty() || destination.is_empty() {
        return Err(RoutePrecondition::EmptyInput);
    }

    let origin = catalog
        .find_by_name(lang, origin)
        .ok_or_else(|| RoutePrecondition::UnknownPlace(origin.to_string()))?;
    let destination = catalog
        .find_by_name(lang, destination)
        .ok_or_else(|| RoutePrecondition::UnknownPlace(destination.to_string()))?;

    if origin.id == destination.id {
        return Err(RoutePrecondition::SamePlace);
    }
    Ok((origin, destination))
}
