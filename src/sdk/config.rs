use std::env;

pub const DEFAULT_PRIMARY_DATASET: &str = "combined_routes.json";
pub const DEFAULT_FALLBACK_DATASET: &str = "busy_roads.json";
pub const DEFAULT_OSRM_BASE_URL: &str = "https://router.project-osrm.org";
pub const DEFAULT_OVERPASS_URL: &str = "https://overpass-api.de/api/interpreter";

/// Where the page session gets its data from.
///
/// Dataset locations starting with `http://` or `https://` are fetched over
/// HTTP, anything else is read from disk.
#[derive(Debug, Clone, PartialEq)]
pub struct AppConfig {
    pub primary_dataset: String,
    pub fallback_dataset: String,
    pub osrm_base_url: String,
    pub overpass_url: String,
    pub traffic_tile_key: Option<String>,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            primary_dataset: DEFAULT_PRIMARY_DATASET.to_string(),
            fallback_dataset: DEFAULT_FALLBACK_DATASET.to_string(),
            osrm_base_url: DEFAULT_OSRM_BASE_URL.to_string(),
            overpass_url: DEFAULT_OVERPASS_URL.to_string(),
            traffic_tile_key: None,
        }
    }
}

impl AppConfig {
    /// Reads the configuration from the environment. Call `dotenvy::dotenv()` first
    /// if a `.env` file should be honoured.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();
        let non_empty = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());
        Self {
            primary_dataset: non_empty("BUSY_ROUTES_PRIMARY").unwrap_or(defaults.primary_dataset),
            fallback_dataset: non_empty("BUSY_ROUTES_FALLBACK")
                .unwrap_or(defaults.fallback_dataset),
            osrm_base_url: non_empty("OSRM_BASE_URL").unwrap_or(defaults.osrm_base_url),
            overpass_url: non_empty("OVERPASS_URL").unwrap_or(defaults.overpass_url),
            traffic_tile_key: non_empty("TRAFFIC_TILE_KEY"),
        }
    }
}

/// Pulls the `key` parameter out of a page query string such as `?key=abc&x=1`.
pub fn key_from_query(query: &str) -> Option<String> {
    let query = query.trim_start_matches('?');
    // Parse against a dummy base so reqwest's Url does the percent-decoding.
    let url = reqwest::Url::parse(&format!("http://localhost/?{}", query)).ok()?;
    url.query_pairs()
        .find(|(k, _)| k == "key")
        .map(|(_, v)| v.into_owned())
        .filter(|v| !v.is_empty())
}
