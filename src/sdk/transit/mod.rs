pub mod lines;
pub mod overlay;
pub mod overpass;

pub use lines::{TransitLine, TransitNetwork, TransitWay};
pub use overlay::{ToggleControl, TransitOverlay};
pub use overpass::{BoundingBox, HttpOverpassClient, OverpassClient, OverpassResponse};
