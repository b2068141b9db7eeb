use super::lines::TransitNetwork;
use super::overpass::{subway_query, BoundingBox, OverpassClient, NYC_BBOX};
use crate::sdk::error::FetchError;
use crate::sdk::render::{LayerId, MapCanvas, Palette};

pub const TRANSIT_LAYER_NAME: &str = "subway";

/// State of the on/off switch for the subway overlay.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ToggleControl {
    pub checked: bool,
    /// True only while a load is in flight.
    pub disabled: bool,
}

/// Subway overlay: fetched once, then shown and hidden without re-fetching.
pub struct TransitOverlay {
    client: Box<dyn OverpassClient>,
    bbox: BoundingBox,
    palette: Palette,
    network: Option<TransitNetwork>,
    layer: Option<LayerId>,
    control: ToggleControl,
}

impl TransitOverlay {
    pub fn new(client: Box<dyn OverpassClient>, palette: Palette) -> Self {
        Self {
            client,
            bbox: NYC_BBOX,
            palette,
            network: None,
            layer: None,
            control: ToggleControl::default(),
        }
    }

    pub fn control(&self) -> ToggleControl {
        self.control
    }

    pub fn network(&self) -> Option<&TransitNetwork> {
        self.network.as_ref()
    }

    pub fn is_visible(&self) -> bool {
        self.layer.is_some()
    }

    pub fn layer(&self) -> Option<LayerId> {
        self.layer
    }

    /// Fetches and assembles the network unless it is already cached.
    pub async fn load(&mut self, map_ready: bool) -> Result<&TransitNetwork, FetchError> {
        if !map_ready {
            return Err(FetchError::NotReady("map not ready yet, try again in a moment"));
        }
        if self.network.is_none() {
            let response = self.client.query(&subway_query(&self.bbox)).await?;
            let network = TransitNetwork::assemble(&response, &self.palette)?;
            log::info!("[TRANSIT] {} features ready", network.ways().len());
            self.network = Some(network);
        }
        self.network
            .as_ref()
            .ok_or(FetchError::NotReady("transit network missing after load"))
    }

    /// Shows or hides the overlay.
    ///
    /// Turning it on disables the control until the load settles; on failure
    /// the control reverts to off and the error is returned for the status line.
    pub async fn toggle(
        &mut self,
        on: bool,
        canvas: Option<&mut dyn MapCanvas>,
    ) -> Result<(), FetchError> {
        if !on {
            // without a canvas the layer stays recorded so a later call can detach it
            if let Some(canvas) = canvas {
                if let Some(layer) = self.layer.take() {
                    canvas.remove_layer(layer);
                }
            }
            self.control.checked = false;
            return Ok(());
        }

        if self.layer.is_some() {
            self.control.checked = true;
            return Ok(());
        }

        self.control.checked = true;
        self.control.disabled = true;
        let result = self.show(canvas).await;
        self.control.disabled = false;

        if let Err(err) = &result {
            log::error!("Failed to load subway lines: {}", err);
            self.control.checked = false;
        }
        result
    }

    async fn show(&mut self, canvas: Option<&mut dyn MapCanvas>) -> Result<(), FetchError> {
        let canvas = match canvas {
            Some(canvas) => canvas,
            None => return self.load(false).await.map(|_| ()),
        };
        let features = self.load(true).await?.to_feature_collection();
        let count = features.features.len();
        self.layer = Some(canvas.add_features(TRANSIT_LAYER_NAME, features));
        log::info!("[TRANSIT] layer drawn: {} polylines", count);
        Ok(())
    }
}
