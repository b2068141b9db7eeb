#![allow(dead_code)]

use async_trait::async_trait;
use busy_routes::sdk::error::FetchError;
use busy_routes::sdk::routes::{DatasetFetcher, LatLon, RouteRecord};
use busy_routes::sdk::routing::{RoutingError, RoutingProvider};
use busy_routes::sdk::session::Services;
use busy_routes::sdk::transit::{OverpassClient, OverpassResponse};
use busy_routes::sdk::util::rate_limit::spaced_limiter;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

pub fn record(ratio: f64, origin: (f64, f64), dest: (f64, f64)) -> RouteRecord {
    serde_json::from_value(serde_json::json!({
        "origin_lat": origin.0, "origin_lon": origin.1,
        "dest_lat": dest.0, "dest_lon": dest.1,
        "mean_flow_ratio": ratio,
        "congestion_label": "heavy",
        "time_saved_s": 75,
        "flow_agreement_score": 0.5,
    }))
    .unwrap()
}

/// Datasets by location; unknown locations answer 404.
#[derive(Default, Clone)]
pub struct FakeDatasets {
    pub datasets: HashMap<String, Vec<RouteRecord>>,
    pub requested: Arc<Mutex<Vec<String>>>,
}

#[async_trait]
impl DatasetFetcher for FakeDatasets {
    async fn fetch(&self, location: &str) -> Result<Vec<RouteRecord>, FetchError> {
        self.requested.lock().unwrap().push(location.to_string());
        self.datasets.get(location).cloned().ok_or(FetchError::Http {
            url: location.to_string(),
            status: 404,
        })
    }
}

pub enum Answer {
    Path(Vec<LatLon>),
    Status(u16),
}

/// Answers keyed by origin, so tests don't depend on request order.
#[derive(Default, Clone)]
pub struct FakeRouter {
    pub answers: Arc<Mutex<Vec<(LatLon, Answer)>>>,
    pub calls: Arc<Mutex<Vec<LatLon>>>,
}

impl FakeRouter {
    pub fn answer(&self, origin: LatLon, answer: Answer) {
        self.answers.lock().unwrap().push((origin, answer));
    }
}

#[async_trait]
impl RoutingProvider for FakeRouter {
    async fn get_directions(&self, start: LatLon, end: LatLon) -> Result<Vec<LatLon>, RoutingError> {
        self.calls.lock().unwrap().push(start);
        let answers = self.answers.lock().unwrap();
        match answers.iter().find(|(origin, _)| *origin == start) {
            Some((_, Answer::Path(path))) => Ok(path.clone()),
            Some((_, Answer::Status(status))) => Err(RoutingError::RawApiError {
                status: *status,
                body: "Internal Server Error".to_string(),
            }),
            None => Ok(vec![start, end]),
        }
    }
}

#[derive(Clone)]
pub struct FakeOverpass {
    pub body: String,
    pub calls: Arc<AtomicUsize>,
}

impl FakeOverpass {
    pub fn new(body: &str) -> Self {
        Self {
            body: body.to_string(),
            calls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl OverpassClient for FakeOverpass {
    async fn query(&self, _query: &str) -> Result<OverpassResponse, FetchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        serde_json::from_str(&self.body).map_err(|source| FetchError::Parse {
            origin: "fake".to_string(),
            source,
        })
    }
}

pub fn services(datasets: FakeDatasets, router: FakeRouter, overpass: FakeOverpass) -> Services {
    Services {
        datasets: Box::new(datasets),
        routing: Box::new(router),
        overpass: Box::new(overpass),
        limiter: spaced_limiter(Duration::from_millis(1)),
    }
}
