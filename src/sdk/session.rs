//! One page session: the map, the caches and the components that read them.
//!
//! Everything that used to be ambient page state lives here and is written at
//! most once: the map handle on [`Session::init_map`], the ranked routes on the
//! first [`RouteStore::load`], the subway network on the first successful
//! transit load.

use super::config::{AppConfig, DEFAULT_OSRM_BASE_URL};
use super::error::FetchError;
use super::panel::{DetailPanel, PanelView};
use super::render::{
    GeoJsonCanvas, HoverEvent, LayerId, MapCanvas, OverlayRenderer, Palette, SidebarState,
    TileLayer,
};
use super::routes::{DatasetFetcher, HttpDatasetFetcher, LatLon, RouteStore};
use super::routing::{GeometryResolver, OsrmProvider, Outcome, RoutingProvider};
use super::transit::{HttpOverpassClient, OverpassClient, TransitOverlay};
use super::util::rate_limit::{routing_limiter, Limiter};
use anyhow::{Context, Result};

pub const MAP_CENTER: LatLon = LatLon::new(40.7128, -74.0060);
pub const MAP_ZOOM: u8 = 12;

const OSM_TILE_URL: &str = "https://{s}.tile.openstreetmap.org/{z}/{x}/{y}.png";
const TRAFFIC_TILE_URL: &str = "https://api.tomtom.com/map/1/tile/Traffic/Absolute/{z}/{x}/{y}.png";

pub const MISSING_TRAFFIC_KEY: &str = "Traffic tile key missing; traffic overlay disabled";

/// The single shared status line under the map.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StatusLine {
    message: Option<String>,
}

impl StatusLine {
    pub fn show(&mut self, message: impl Into<String>) {
        let message = message.into();
        log::info!("[STATUS] {}", message);
        self.message = Some(message);
    }

    pub fn clear(&mut self) {
        self.message = None;
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }
}

/// External services a session talks to.
pub struct Services {
    pub datasets: Box<dyn DatasetFetcher>,
    pub routing: Box<dyn RoutingProvider>,
    pub overpass: Box<dyn OverpassClient>,
    pub limiter: Limiter,
}

impl Services {
    /// HTTP-backed services for the given configuration.
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        let osrm_base = if config.osrm_base_url.is_empty() {
            DEFAULT_OSRM_BASE_URL.to_string()
        } else {
            config.osrm_base_url.clone()
        };
        Ok(Self {
            datasets: Box::new(HttpDatasetFetcher::new().context("Failed to build dataset client")?),
            routing: Box::new(OsrmProvider::new(osrm_base).context("Failed to build OSRM client")?),
            overpass: Box::new(
                HttpOverpassClient::new(config.overpass_url.clone())
                    .context("Failed to build Overpass client")?,
            ),
            limiter: routing_limiter(),
        })
    }
}

pub struct Session {
    map: Option<GeoJsonCanvas>,
    store: RouteStore,
    resolver: GeometryResolver,
    renderer: OverlayRenderer,
    sidebar: SidebarState,
    transit: TransitOverlay,
    panel: DetailPanel,
    status: StatusLine,
}

impl Session {
    pub fn new(config: &AppConfig, services: Services) -> Self {
        let palette = Palette::default();
        Self {
            map: None,
            store: RouteStore::new(
                services.datasets,
                config.primary_dataset.clone(),
                config.fallback_dataset.clone(),
            ),
            resolver: GeometryResolver::new(services.routing, services.limiter),
            renderer: OverlayRenderer::new(palette),
            sidebar: SidebarState::default(),
            transit: TransitOverlay::new(services.overpass, palette),
            panel: DetailPanel::new(palette),
            status: StatusLine::default(),
        }
    }

    pub fn from_config(config: &AppConfig) -> Result<Self> {
        Ok(Self::new(config, Services::from_config(config)?))
    }

    /// Creates the map with its base and traffic tile layers. A second call is a no-op.
    ///
    /// A missing traffic key is not fatal: the map comes up without the
    /// traffic layer and the status line says so.
    pub fn init_map(&mut self, traffic_key: Option<&str>) {
        if self.map.is_some() {
            log::debug!("Map already initialised");
            return;
        }
        self.status.show("Loading map...");

        let mut map = GeoJsonCanvas::new(MAP_CENTER, MAP_ZOOM);
        map.add_tile_layer(TileLayer {
            url_template: OSM_TILE_URL.to_string(),
            attribution: "© OpenStreetMap contributors".to_string(),
            max_zoom: 19,
            opacity: 1.0,
        });

        self.renderer.style_sidebar(&mut self.sidebar);
        match traffic_key {
            Some(key) => {
                map.add_tile_layer(TileLayer {
                    url_template: format!("{}?key={}", TRAFFIC_TILE_URL, key),
                    attribution: "© TomTom Traffic".to_string(),
                    max_zoom: 19,
                    opacity: 0.5,
                });
                self.status.clear();
            }
            None => {
                log::warn!("No traffic tile key supplied");
                self.status.show(MISSING_TRAFFIC_KEY);
            }
        }
        self.map = Some(map);
        log::info!("Map setup complete");
    }

    /// Loads the ranked routes and draws each one, resolving geometry in rank order.
    pub async fn render_routes(&mut self) -> Result<Vec<Outcome>, FetchError> {
        let map = self
            .map
            .as_mut()
            .ok_or(FetchError::NotReady("map not initialised"))?;

        let routes = self.store.load().await;
        if routes.is_empty() {
            self.status
                .show("No traffic routes available (check console for fetch errors)");
            return Ok(Vec::new());
        }

        let mut sink = self.renderer.sink(map);
        Ok(self.resolver.resolve_all(routes, &mut sink).await)
    }

    /// Shows or hides the subway overlay; failures land on the status line.
    pub async fn toggle_transit(&mut self, on: bool) -> Result<(), FetchError> {
        let canvas = self.map.as_mut().map(|m| m as &mut dyn MapCanvas);
        let result = self.transit.toggle(on, canvas).await;
        if let Err(err) = &result {
            self.status.show(format!("Failed to load subway lines: {}", err));
        }
        result
    }

    /// Opens the detail panel for the route at rank `index` from the cache.
    pub fn show_panel(&mut self, index: usize) -> &PanelView {
        self.panel.show(index, self.store.cached())
    }

    pub fn close_panel(&mut self) {
        self.panel.close();
    }

    pub fn map(&self) -> Option<&GeoJsonCanvas> {
        self.map.as_ref()
    }

    pub fn store(&self) -> &RouteStore {
        &self.store
    }

    pub fn renderer(&self) -> &OverlayRenderer {
        &self.renderer
    }

    /// Pointer entered or left a layer on the map.
    pub fn hover(&mut self, layer: LayerId, event: HoverEvent) {
        if let Some(map) = self.map.as_ref() {
            self.renderer.on_hover(map, &mut self.sidebar, layer, event);
        }
    }

    pub fn sidebar(&self) -> &SidebarState {
        &self.sidebar
    }

    pub fn transit(&self) -> &TransitOverlay {
        &self.transit
    }

    pub fn panel(&self) -> &DetailPanel {
        &self.panel
    }

    pub fn status(&self) -> &StatusLine {
        &self.status
    }
}
