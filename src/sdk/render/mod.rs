pub mod canvas;
pub mod overlay;
pub mod palette;

pub use canvas::{GeoJsonCanvas, HoverEvent, LayerId, MapCanvas, Polyline, Sidebar, SidebarState, TileLayer};
pub use overlay::OverlayRenderer;
pub use palette::Palette;
