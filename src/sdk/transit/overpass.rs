use crate::sdk::error::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;

/// Bounding box for Overpass queries, in Overpass `(south,west,north,east)` order.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub min_lon: f64,
    pub max_lat: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub const fn new(min_lat: f64, min_lon: f64, max_lat: f64, max_lon: f64) -> Self {
        Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        }
    }
}

/// All five NYC boroughs.
pub const NYC_BBOX: BoundingBox = BoundingBox::new(40.4774, -74.2591, 40.9176, -73.7004);

/// Subway route relations in `bbox` with their member ways' inline geometry.
///
/// Relations are stored in the named set `.routes` and printed with tags and
/// member lists only; the ways are printed with `out geom`. Filtering on the
/// bbox rather than `network=` avoids relations with a missing or oddly cased
/// network tag.
pub fn subway_query(bbox: &BoundingBox) -> String {
    format!(
        r#"[out:json][timeout:120];
relation["type"="route"]["route"="subway"]({},{},{},{})->.routes;
.routes out body;
way(r.routes);
out geom;"#,
        bbox.min_lat, bbox.min_lon, bbox.max_lat, bbox.max_lon
    )
}

// --- Data Structures for parsing Overpass JSON ---

#[derive(Debug, Default, Deserialize)]
pub struct OverpassResponse {
    #[serde(default)]
    pub elements: Vec<Element>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Element {
    Relation(Relation),
    Way(Way),
    #[serde(other)]
    Other,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Relation {
    pub id: i64,
    #[serde(default)]
    pub tags: Option<HashMap<String, String>>,
    #[serde(default)]
    pub members: Vec<Member>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Member {
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(rename = "ref")]
    pub id: i64,
    #[serde(default)]
    pub role: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Way {
    pub id: i64,
    #[serde(default)]
    pub geometry: Vec<GeomPoint>,
}

#[derive(Debug, Clone, Copy, Deserialize)]
pub struct GeomPoint {
    pub lat: f64,
    pub lon: f64,
}

impl OverpassResponse {
    pub fn relations(&self) -> impl Iterator<Item = &Relation> {
        self.elements.iter().filter_map(|e| match e {
            Element::Relation(r) => Some(r),
            _ => None,
        })
    }

    pub fn ways(&self) -> impl Iterator<Item = &Way> {
        self.elements.iter().filter_map(|e| match e {
            Element::Way(w) => Some(w),
            _ => None,
        })
    }
}

#[async_trait]
pub trait OverpassClient: Send + Sync {
    async fn query(&self, query: &str) -> Result<OverpassResponse, FetchError>;
}

pub struct HttpOverpassClient {
    client: Client,
    url: String,
}

impl HttpOverpassClient {
    pub fn new(url: String) -> Result<Self, FetchError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(30))
            .timeout(Duration::from_secs(180))
            .build()
            .map_err(|source| FetchError::Transport {
                url: url.clone(),
                source,
            })?;
        Ok(Self { client, url })
    }
}

#[async_trait]
impl OverpassClient for HttpOverpassClient {
    async fn query(&self, query: &str) -> Result<OverpassResponse, FetchError> {
        log::debug!("Overpass query:\n{}", query);
        log::info!("[TRANSIT] fetching from Overpass...");

        let response = self
            .client
            .get(&self.url)
            .query(&[("data", query)])
            .send()
            .await
            .map_err(|source| {
                log::error!("Overpass request failed: {}", source);
                FetchError::Transport {
                    url: self.url.clone(),
                    source,
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let text = response.text().await.map_err(|source| FetchError::Transport {
            url: self.url.clone(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| FetchError::Parse {
            origin: self.url.clone(),
            source,
        })
    }
}
