use serde::{Deserialize, Serialize};
use std::fmt;

/// A WGS84 position. Serialized as `[lat, lon]`, matching the dataset files.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(from = "[f64; 2]", into = "[f64; 2]")]
pub struct LatLon {
    pub lat: f64,
    pub lon: f64,
}

impl LatLon {
    pub const fn new(lat: f64, lon: f64) -> Self {
        Self { lat, lon }
    }

    /// GeoJSON position order.
    pub fn to_lon_lat(self) -> Vec<f64> {
        vec![self.lon, self.lat]
    }
}

impl From<[f64; 2]> for LatLon {
    fn from([lat, lon]: [f64; 2]) -> Self {
        Self { lat, lon }
    }
}

impl From<LatLon> for [f64; 2] {
    fn from(p: LatLon) -> Self {
        [p.lat, p.lon]
    }
}

impl fmt::Display for LatLon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.4},{:.4}", self.lat, self.lon)
    }
}

/// Congestion category the palette colours by.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Congestion {
    Free,
    Moderate,
    Heavy,
    /// Any label the palette does not know about.
    Unknown,
}

impl Congestion {
    /// Case and surrounding whitespace are ignored.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_lowercase().as_str() {
            "free" => Congestion::Free,
            "moderate" => Congestion::Moderate,
            "heavy" => Congestion::Heavy,
            _ => Congestion::Unknown,
        }
    }
}

/// One busy road segment from the traffic dataset. Never mutated after parsing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RouteRecord {
    pub origin_lat: f64,
    pub origin_lon: f64,
    pub dest_lat: f64,
    pub dest_lon: f64,
    /// Sampled points along the segment, `[lat, lon]` each.
    #[serde(default)]
    pub route_points: Option<Vec<LatLon>>,
    #[serde(default)]
    pub mean_flow_ratio: Option<f64>,
    /// Label as written in the dataset; see [`RouteRecord::congestion`].
    #[serde(default)]
    pub congestion_label: Option<String>,
    #[serde(default)]
    pub short_dist_m: Option<f64>,
    #[serde(default)]
    pub short_time_s: Option<f64>,
    #[serde(default)]
    pub fast_dist_m: Option<f64>,
    #[serde(default)]
    pub fast_time_s: Option<f64>,
    #[serde(default)]
    pub time_saved_s: Option<f64>,
    #[serde(default)]
    pub flow_agreement_score: Option<f64>,
}

impl RouteRecord {
    pub fn origin(&self) -> LatLon {
        LatLon::new(self.origin_lat, self.origin_lon)
    }

    pub fn destination(&self) -> LatLon {
        LatLon::new(self.dest_lat, self.dest_lon)
    }

    pub fn congestion(&self) -> Option<Congestion> {
        self.congestion_label.as_deref().map(Congestion::parse)
    }

    /// Popularity metric used for ranking; a missing ratio counts as zero.
    pub fn flow_ratio_or_zero(&self) -> f64 {
        self.mean_flow_ratio.unwrap_or(0.0)
    }

    /// The geometry drawn before the routing service answers: the sampled
    /// points when there are any, otherwise the straight origin→destination segment.
    pub fn approximate_path(&self) -> Vec<LatLon> {
        match &self.route_points {
            Some(points) if !points.is_empty() => points.clone(),
            _ => vec![self.origin(), self.destination()],
        }
    }

    /// Average speed on the fast route in km/h, if both operands are present and non-zero.
    pub fn average_speed_kmh(&self) -> Option<f64> {
        let dist = self.fast_dist_m.filter(|d| *d != 0.0)?;
        let time = self.fast_time_s.filter(|t| *t != 0.0)?;
        Some(dist / time * 3.6)
    }
}
