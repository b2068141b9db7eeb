pub mod sdk;

pub use sdk::config::{key_from_query, AppConfig};
pub use sdk::error::FetchError;
pub use sdk::panel::{DetailPanel, PanelView};
pub use sdk::render::{GeoJsonCanvas, OverlayRenderer, Palette};
pub use sdk::routes::{RankedRouteSet, RouteRecord, RouteStore};
pub use sdk::routing::{GeometryResolver, Outcome, Provenance, RoutingError};
pub use sdk::session::{Services, Session};
pub use sdk::transit::{TransitNetwork, TransitOverlay};
