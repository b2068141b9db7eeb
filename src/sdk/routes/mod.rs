pub mod combine;
pub mod generate;
pub mod record;
pub mod store;

pub use record::{Congestion, LatLon, RouteRecord};
pub use store::{DatasetFetcher, HttpDatasetFetcher, RankedRouteSet, RouteStore, ROUTE_LIMIT};
