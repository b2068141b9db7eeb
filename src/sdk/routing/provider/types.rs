use serde::Deserialize;

// --- Data Structures for parsing OSRM `route` responses ---

#[derive(Deserialize)]
pub struct RouteResponse {
    pub code: String,
    #[serde(default)]
    pub routes: Vec<Route>,
}

#[derive(Deserialize)]
pub struct Route {
    pub geometry: LineGeometry,
    #[serde(default)]
    pub distance: f64,
    #[serde(default)]
    pub duration: f64,
}

/// GeoJSON LineString, positions in `[lon, lat]` order.
#[derive(Deserialize)]
pub struct LineGeometry {
    pub coordinates: Vec<[f64; 2]>,
}
