use crate::sdk::routes::LatLon;
use async_trait::async_trait;

use super::error::RoutingError;

#[async_trait]
pub trait RoutingProvider: Send + Sync {
    /// Road-network path from `start` to `end`, in travel order.
    ///
    /// An empty path means the service answered but found no route.
    async fn get_directions(&self, start: LatLon, end: LatLon) -> Result<Vec<LatLon>, RoutingError>;
}
