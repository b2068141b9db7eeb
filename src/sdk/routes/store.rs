use super::record::RouteRecord;
use crate::sdk::error::FetchError;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tokio::sync::OnceCell;

/// Size of the ranked set; one entry per colour in the route palette.
pub const ROUTE_LIMIT: usize = 10;

/// Source of raw route records.
#[async_trait]
pub trait DatasetFetcher: Send + Sync {
    /// Fetches every record stored at `location`.
    async fn fetch(&self, location: &str) -> Result<Vec<RouteRecord>, FetchError>;
}

/// Fetches `http(s)://` locations with GET and reads everything else from disk.
pub struct HttpDatasetFetcher {
    client: Client,
}

impl HttpDatasetFetcher {
    pub fn new() -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(15))
            .build()
            .map_err(|source| FetchError::Transport {
                url: "<client builder>".to_string(),
                source,
            })?;
        Ok(Self { client })
    }

    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    async fn fetch_remote(&self, url: &str) -> Result<String, FetchError> {
        log::debug!("[DATASET] GET {}", url);
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|source| FetchError::Transport {
                url: url.to_string(),
                source,
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http {
                url: url.to_string(),
                status: status.as_u16(),
            });
        }

        response.text().await.map_err(|source| FetchError::Transport {
            url: url.to_string(),
            source,
        })
    }
}

fn is_remote(location: &str) -> bool {
    location.starts_with("http://") || location.starts_with("https://")
}

#[async_trait]
impl DatasetFetcher for HttpDatasetFetcher {
    async fn fetch(&self, location: &str) -> Result<Vec<RouteRecord>, FetchError> {
        let text = if is_remote(location) {
            self.fetch_remote(location).await?
        } else {
            log::debug!("[DATASET] reading {}", location);
            tokio::fs::read_to_string(location)
                .await
                .map_err(|source| FetchError::Io {
                    path: location.to_string(),
                    source,
                })?
        };

        serde_json::from_str(&text).map_err(|source| {
            log::error!("Failed to parse dataset {}: {}", location, source);
            FetchError::Parse {
                origin: location.to_string(),
                source,
            }
        })
    }
}

/// The top [`ROUTE_LIMIT`] records by descending mean flow ratio.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RankedRouteSet {
    routes: Vec<RouteRecord>,
}

impl RankedRouteSet {
    /// Stable sort by mean flow ratio (missing counts as 0), then truncate.
    pub fn rank(mut records: Vec<RouteRecord>) -> Self {
        records.sort_by(|a, b| b.flow_ratio_or_zero().total_cmp(&a.flow_ratio_or_zero()));
        records.truncate(ROUTE_LIMIT);
        Self { routes: records }
    }

    pub fn get(&self, index: usize) -> Option<&RouteRecord> {
        self.routes.get(index)
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (usize, &RouteRecord)> {
        self.routes.iter().enumerate()
    }
}

/// Loads and memoizes the ranked route set for one page session.
pub struct RouteStore {
    fetcher: Box<dyn DatasetFetcher>,
    primary: String,
    fallback: String,
    ranked: OnceCell<RankedRouteSet>,
}

impl RouteStore {
    pub fn new(fetcher: Box<dyn DatasetFetcher>, primary: String, fallback: String) -> Self {
        Self {
            fetcher,
            primary,
            fallback,
            ranked: OnceCell::new(),
        }
    }

    /// Returns the ranked set, fetching it the first time only.
    ///
    /// Never fails: when neither data source yields records the set is empty
    /// and the caller is expected to surface that as a status message.
    pub async fn load(&self) -> &RankedRouteSet {
        self.ranked
            .get_or_init(|| async {
                let records = self.fetch_with_fallback().await;
                log::info!("Loaded {} routes", records.len());
                let ranked = RankedRouteSet::rank(records);
                log::info!("Reducing to top {} busiest routes", ranked.len());
                ranked
            })
            .await
    }

    /// The ranked set if [`RouteStore::load`] already completed. Never fetches.
    pub fn cached(&self) -> Option<&RankedRouteSet> {
        self.ranked.get()
    }

    async fn fetch_with_fallback(&self) -> Vec<RouteRecord> {
        match self.fetcher.fetch(&self.primary).await {
            Ok(records) => {
                log::info!("Loaded {} (merged)", self.primary);
                return records;
            }
            Err(err) => log::warn!(
                "{} unavailable ({}); falling back to {}",
                self.primary,
                err,
                self.fallback
            ),
        }

        match self.fetcher.fetch(&self.fallback).await {
            Ok(records) => records,
            Err(err) => {
                log::warn!("No {} either ({})", self.fallback, err);
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::{Arc, Mutex};

    fn record(ratio: Option<f64>, origin_lat: f64) -> RouteRecord {
        RouteRecord {
            origin_lat,
            origin_lon: -74.0,
            dest_lat: 40.8,
            dest_lon: -73.9,
            route_points: None,
            mean_flow_ratio: ratio,
            congestion_label: None,
            short_dist_m: None,
            short_time_s: None,
            fast_dist_m: None,
            fast_time_s: None,
            time_saved_s: None,
            flow_agreement_score: None,
        }
    }

    #[derive(Default)]
    struct FakeFetcher {
        datasets: HashMap<String, Vec<RouteRecord>>,
        calls: Arc<Mutex<Vec<String>>>,
        count: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl DatasetFetcher for FakeFetcher {
        async fn fetch(&self, location: &str) -> Result<Vec<RouteRecord>, FetchError> {
            self.count.fetch_add(1, Ordering::SeqCst);
            self.calls.lock().unwrap().push(location.to_string());
            self.datasets
                .get(location)
                .cloned()
                .ok_or_else(|| FetchError::Http {
                    url: location.to_string(),
                    status: 404,
                })
        }
    }

    #[test]
    fn rank_sorts_descending_and_keeps_ties_in_input_order() {
        let records = vec![
            record(Some(0.5), 1.0),
            record(None, 2.0),
            record(Some(0.9), 3.0),
            record(Some(0.5), 4.0),
            record(Some(0.0), 5.0),
        ];
        let ranked = RankedRouteSet::rank(records);
        let order: Vec<f64> = ranked.iter().map(|(_, r)| r.origin_lat).collect();
        // None and 0.0 tie at zero, so they stay in input order.
        assert_eq!(order, vec![3.0, 1.0, 4.0, 2.0, 5.0]);
    }

    #[test]
    fn rank_truncates_to_limit() {
        let records = (0..25).map(|i| record(Some(i as f64), i as f64)).collect();
        let ranked = RankedRouteSet::rank(records);
        assert_eq!(ranked.len(), ROUTE_LIMIT);
        assert_eq!(ranked.get(0).unwrap().origin_lat, 24.0);
        assert_eq!(ranked.get(9).unwrap().origin_lat, 15.0);
    }

    #[tokio::test]
    async fn falls_back_to_secondary_dataset() {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let fetcher = FakeFetcher {
            datasets: [("busy.json".to_string(), vec![record(Some(0.3), 1.0)])].into(),
            calls: calls.clone(),
            ..Default::default()
        };
        let store = RouteStore::new(Box::new(fetcher), "combined.json".into(), "busy.json".into());

        assert_eq!(store.load().await.len(), 1);
        assert_eq!(*calls.lock().unwrap(), vec!["combined.json", "busy.json"]);
    }

    #[tokio::test]
    async fn missing_datasets_yield_an_empty_set() {
        let store = RouteStore::new(
            Box::new(FakeFetcher::default()),
            "a.json".into(),
            "b.json".into(),
        );
        assert!(store.load().await.is_empty());
    }

    #[tokio::test]
    async fn load_is_memoized() {
        let count = Arc::new(AtomicUsize::new(0));
        let fetcher = FakeFetcher {
            datasets: [("a.json".to_string(), vec![record(Some(0.3), 1.0)])].into(),
            count: count.clone(),
            ..Default::default()
        };
        let store = RouteStore::new(Box::new(fetcher), "a.json".into(), "b.json".into());

        assert!(store.cached().is_none());
        store.load().await;
        store.load().await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(store.cached().map(|r| r.len()), Some(1));
    }

    #[tokio::test]
    async fn reads_local_dataset_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("busy_roads.json");
        std::fs::write(
            &path,
            r#"[{"origin_lat":40.7,"origin_lon":-74.0,"dest_lat":40.75,"dest_lon":-73.99,"mean_flow_ratio":0.91}]"#,
        )
        .unwrap();

        let fetcher = HttpDatasetFetcher::new().unwrap();
        let records = fetcher.fetch(path.to_str().unwrap()).await.unwrap();
        assert_eq!(records.len(), 1);

        let missing = fetcher.fetch(dir.path().join("nope.json").to_str().unwrap()).await;
        assert!(matches!(missing, Err(FetchError::Io { .. })));
    }
}
