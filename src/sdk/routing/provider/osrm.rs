use super::types::RouteResponse;
use crate::sdk::routes::LatLon;
use crate::sdk::routing::error::RoutingError;
use crate::sdk::routing::service::RoutingProvider;
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;

/// Routing through an OSRM HTTP server (the public demo server by default).
pub struct OsrmProvider {
    client: Client,
    base_url: String,
    profile: String,
}

impl OsrmProvider {
    pub fn new(base_url: String) -> Result<Self, RoutingError> {
        let client = Client::builder().timeout(Duration::from_secs(15)).build()?;
        Ok(Self::with_client(client, base_url))
    }

    pub fn with_client(client: Client, base_url: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            profile: "driving".to_string(),
        }
    }

    pub fn route_url(&self, start: LatLon, end: LatLon) -> String {
        format!(
            "{}/route/v1/{}/{},{};{},{}?overview=full&geometries=geojson",
            self.base_url, self.profile, start.lon, start.lat, end.lon, end.lat
        )
    }
}

/// Converts an OSRM body into a path. `code: "Ok"` with no routes is an empty path.
pub fn parse_route_body(text: &str) -> Result<Vec<LatLon>, RoutingError> {
    let response: RouteResponse = serde_json::from_str(text)?;
    if response.code != "Ok" {
        return Err(RoutingError::from_response(200, text.to_string()));
    }
    Ok(response
        .routes
        .into_iter()
        .next()
        .map(|route| {
            route
                .geometry
                .coordinates
                .into_iter()
                .map(|[lon, lat]| LatLon::new(lat, lon))
                .collect()
        })
        .unwrap_or_default())
}

#[async_trait]
impl RoutingProvider for OsrmProvider {
    async fn get_directions(&self, start: LatLon, end: LatLon) -> Result<Vec<LatLon>, RoutingError> {
        let url = self.route_url(start, end);
        log::debug!(
            "[PROVIDER] Calling OSRM route for {:?} -> {:?}",
            start,
            end
        );

        let response = match self.client.get(&url).send().await {
            Ok(resp) => resp,
            Err(e) => {
                log::error!("Failed to send GET request. URL: {}\nError: {}", url, e);
                return Err(e.into());
            }
        };

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            let err = RoutingError::from_response(status.as_u16(), text);
            if let RoutingError::RawApiError { body, .. } = &err {
                log::error!(
                    "API returned non-success status: {}. Unparseable Body: {}",
                    status,
                    body
                );
            }
            return Err(err);
        }

        parse_route_body(&text).map_err(|e| {
            log::error!(
                "Failed to parse OSRM response. URL: {}\nError: {}. Body: {}",
                url,
                e,
                text
            );
            e
        })
    }
}
