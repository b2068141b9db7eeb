//! Turns ranked routes into drawable geometry, one route at a time.
//!
//! Each route is drawn straight away from its own data (`Approximate`), then
//! the routing service is asked for the real road path. A non-empty answer
//! replaces the approximation (`Routed`); anything else leaves it in place.

use super::error::RoutingError;
use super::service::RoutingProvider;
use crate::sdk::routes::{LatLon, RankedRouteSet, RouteRecord};
use crate::sdk::util::rate_limit::Limiter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Provenance {
    /// Sampled points or a straight origin→destination segment.
    Approximate,
    /// A road-network path from the routing service.
    Routed,
}

impl Provenance {
    pub fn as_str(&self) -> &'static str {
        match self {
            Provenance::Approximate => "approximate",
            Provenance::Routed => "routed",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedGeometry {
    pub points: Vec<LatLon>,
    pub provenance: Provenance,
}

impl ResolvedGeometry {
    pub fn approximate(route: &RouteRecord) -> Self {
        Self {
            points: route.approximate_path(),
            provenance: Provenance::Approximate,
        }
    }

    pub fn routed(points: Vec<LatLon>) -> Self {
        Self {
            points,
            provenance: Provenance::Routed,
        }
    }
}

#[derive(Debug)]
pub enum FallbackReason {
    /// The service answered without a route.
    EmptyRoute,
    Failed(RoutingError),
}

/// Per-route result of the resolution stage.
#[derive(Debug)]
pub enum Outcome {
    Routed,
    Approximate(FallbackReason),
}

impl Outcome {
    pub fn provenance(&self) -> Provenance {
        match self {
            Outcome::Routed => Provenance::Routed,
            Outcome::Approximate(_) => Provenance::Approximate,
        }
    }
}

/// Receives geometry as it becomes available.
///
/// For a given index, a `Routed` geometry always arrives after the
/// `Approximate` one it supersedes.
pub trait GeometrySink {
    fn render(&mut self, index: usize, route: &RouteRecord, geometry: &ResolvedGeometry);
}

pub struct GeometryResolver {
    provider: Box<dyn RoutingProvider>,
    limiter: Limiter,
}

impl GeometryResolver {
    pub fn new(provider: Box<dyn RoutingProvider>, limiter: Limiter) -> Self {
        Self { provider, limiter }
    }

    /// Resolves a single route. Failures stay local to this route.
    pub async fn resolve(
        &self,
        index: usize,
        route: &RouteRecord,
        sink: &mut dyn GeometrySink,
    ) -> Outcome {
        sink.render(index, route, &ResolvedGeometry::approximate(route));

        log::debug!("Waiting for routing limiter before resolving route {}...", index);
        self.limiter.until_ready().await;

        match self
            .provider
            .get_directions(route.origin(), route.destination())
            .await
        {
            Ok(path) if !path.is_empty() => {
                sink.render(index, route, &ResolvedGeometry::routed(path));
                Outcome::Routed
            }
            Ok(_) => {
                log::warn!("No route found for route {}; keeping approximate line", index);
                Outcome::Approximate(FallbackReason::EmptyRoute)
            }
            Err(err) => {
                log::warn!(
                    "Routing failed for route {} ({} -> {}): {}; keeping approximate line",
                    index,
                    route.origin(),
                    route.destination(),
                    err
                );
                Outcome::Approximate(FallbackReason::Failed(err))
            }
        }
    }

    /// Resolves every route in rank order, strictly one request in flight.
    pub async fn resolve_all(
        &self,
        routes: &RankedRouteSet,
        sink: &mut dyn GeometrySink,
    ) -> Vec<Outcome> {
        log::info!("Drawing {} busiest routes...", routes.len());
        let mut outcomes = Vec::with_capacity(routes.len());
        for (index, route) in routes.iter() {
            outcomes.push(self.resolve(index, route, sink).await);
        }
        let routed = outcomes
            .iter()
            .filter(|o| matches!(o, Outcome::Routed))
            .count();
        log::info!(
            "All traffic routes overlaid on map ({} routed, {} approximate)",
            routed,
            outcomes.len() - routed
        );
        outcomes
    }
}
