use crate::sdk::routes::LatLon;
use crate::sdk::routing::Provenance;
use geojson::{Feature, FeatureCollection, Geometry, JsonObject, JsonValue, Value};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::Path;

pub type LayerId = u64;

#[derive(Debug, Clone, PartialEq)]
pub struct TileLayer {
    pub url_template: String,
    pub attribution: String,
    pub max_zoom: u8,
    pub opacity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PolylineStyle {
    pub color: String,
    pub weight: f64,
    pub opacity: f64,
}

/// A drawn route line and the interactions bound to it.
#[derive(Debug, Clone, PartialEq)]
pub struct Polyline {
    pub points: Vec<LatLon>,
    pub style: PolylineStyle,
    pub popup: Option<String>,
    /// Sidebar control to highlight while the pointer is over the line.
    pub hover_index: Option<usize>,
    pub provenance: Option<Provenance>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HoverEvent {
    Enter,
    Exit,
}

/// The map widget the overlays are drawn onto.
pub trait MapCanvas {
    fn add_tile_layer(&mut self, layer: TileLayer);
    fn add_polyline(&mut self, line: Polyline) -> LayerId;
    /// Adds a whole feature collection as one removable layer.
    fn add_features(&mut self, name: &str, features: FeatureCollection) -> LayerId;
    /// Returns false if no layer had this id.
    fn remove_layer(&mut self, id: LayerId) -> bool;
    /// Sidebar index bound to the hover handlers of a layer.
    fn hover_target(&self, id: LayerId) -> Option<usize>;
}

/// Route buttons next to the map.
pub trait Sidebar {
    fn set_dot_color(&mut self, index: usize, color: &str);
    fn highlight(&mut self, index: usize, color: &str);
    fn unhighlight(&mut self, index: usize);
}

#[derive(Debug, Clone)]
enum Layer {
    Line(Polyline),
    Features {
        name: String,
        collection: FeatureCollection,
    },
}

/// In-memory map that can be exported as a single GeoJSON document.
#[derive(Debug, Clone)]
pub struct GeoJsonCanvas {
    center: LatLon,
    zoom: u8,
    tiles: Vec<TileLayer>,
    layers: BTreeMap<LayerId, Layer>,
    next_id: LayerId,
}

impl GeoJsonCanvas {
    pub fn new(center: LatLon, zoom: u8) -> Self {
        Self {
            center,
            zoom,
            tiles: Vec::new(),
            layers: BTreeMap::new(),
            next_id: 1,
        }
    }

    pub fn center(&self) -> LatLon {
        self.center
    }

    pub fn zoom(&self) -> u8 {
        self.zoom
    }

    pub fn tile_layers(&self) -> &[TileLayer] {
        &self.tiles
    }

    pub fn layer_count(&self) -> usize {
        self.layers.len()
    }

    pub fn has_layer(&self, id: LayerId) -> bool {
        self.layers.contains_key(&id)
    }

    pub fn polyline(&self, id: LayerId) -> Option<&Polyline> {
        match self.layers.get(&id)? {
            Layer::Line(line) => Some(line),
            Layer::Features { .. } => None,
        }
    }

    /// Every drawn route line, in drawing order.
    pub fn polylines(&self) -> impl Iterator<Item = (LayerId, &Polyline)> {
        self.layers.iter().filter_map(|(id, layer)| match layer {
            Layer::Line(line) => Some((*id, line)),
            Layer::Features { .. } => None,
        })
    }

    pub fn feature_layer(&self, id: LayerId) -> Option<&FeatureCollection> {
        match self.layers.get(&id)? {
            Layer::Features { collection, .. } => Some(collection),
            Layer::Line(_) => None,
        }
    }

    fn allocate(&mut self, layer: Layer) -> LayerId {
        let id = self.next_id;
        self.next_id += 1;
        self.layers.insert(id, layer);
        id
    }

    /// Flattens all layers into one FeatureCollection. Tile layers and the
    /// view go into foreign members.
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let mut features = Vec::new();
        for (id, layer) in &self.layers {
            match layer {
                Layer::Line(line) => features.push(polyline_feature(*id, line)),
                Layer::Features { name, collection } => {
                    for feature in &collection.features {
                        let mut feature = feature.clone();
                        feature.set_property("layer", *id);
                        feature.set_property("layer_name", name.clone());
                        features.push(feature);
                    }
                }
            }
        }

        let mut foreign = JsonObject::new();
        foreign.insert("center".into(), JsonValue::from(vec![self.center.lat, self.center.lon]));
        foreign.insert("zoom".into(), JsonValue::from(self.zoom));
        foreign.insert(
            "tile_layers".into(),
            JsonValue::Array(
                self.tiles
                    .iter()
                    .map(|t| {
                        serde_json::json!({
                            "url": t.url_template,
                            "attribution": t.attribution,
                            "max_zoom": t.max_zoom,
                            "opacity": t.opacity,
                        })
                    })
                    .collect(),
            ),
        );

        FeatureCollection {
            bbox: None,
            features,
            foreign_members: Some(foreign),
        }
    }

    pub fn write_to<P: AsRef<Path>>(&self, path: P) -> io::Result<()> {
        let data = serde_json::to_string_pretty(&self.to_feature_collection())?;
        fs::write(path, data)
    }
}

fn polyline_feature(id: LayerId, line: &Polyline) -> Feature {
    let coordinates = line.points.iter().map(|p| p.to_lon_lat()).collect();
    let mut feature = Feature::from(Geometry::new(Value::LineString(coordinates)));
    feature.set_property("layer", id);
    feature.set_property("stroke", line.style.color.clone());
    feature.set_property("stroke-width", line.style.weight);
    feature.set_property("stroke-opacity", line.style.opacity);
    if let Some(index) = line.hover_index {
        feature.set_property("route_index", index);
    }
    if let Some(provenance) = line.provenance {
        feature.set_property("provenance", provenance.as_str());
    }
    if let Some(popup) = &line.popup {
        feature.set_property("popup", popup.clone());
    }
    feature
}

impl MapCanvas for GeoJsonCanvas {
    fn add_tile_layer(&mut self, layer: TileLayer) {
        log::debug!("Tile layer added: {}", layer.url_template);
        self.tiles.push(layer);
    }

    fn add_polyline(&mut self, line: Polyline) -> LayerId {
        self.allocate(Layer::Line(line))
    }

    fn add_features(&mut self, name: &str, features: FeatureCollection) -> LayerId {
        self.allocate(Layer::Features {
            name: name.to_string(),
            collection: features,
        })
    }

    fn remove_layer(&mut self, id: LayerId) -> bool {
        self.layers.remove(&id).is_some()
    }

    fn hover_target(&self, id: LayerId) -> Option<usize> {
        self.polyline(id).and_then(|line| line.hover_index)
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct SidebarButton {
    pub dot_color: Option<String>,
    /// Set while highlighted.
    pub highlight_color: Option<String>,
}

/// Sidebar controls kept in memory.
#[derive(Debug, Clone, Default)]
pub struct SidebarState {
    buttons: BTreeMap<usize, SidebarButton>,
}

impl SidebarState {
    pub fn button(&self, index: usize) -> Option<&SidebarButton> {
        self.buttons.get(&index)
    }

    pub fn is_highlighted(&self, index: usize) -> bool {
        self.button(index)
            .map(|b| b.highlight_color.is_some())
            .unwrap_or(false)
    }
}

impl Sidebar for SidebarState {
    fn set_dot_color(&mut self, index: usize, color: &str) {
        self.buttons.entry(index).or_default().dot_color = Some(color.to_string());
    }

    fn highlight(&mut self, index: usize, color: &str) {
        log::debug!("highlightSidebar {}", index);
        self.buttons.entry(index).or_default().highlight_color = Some(color.to_string());
    }

    fn unhighlight(&mut self, index: usize) {
        log::debug!("unhighlightSidebar {}", index);
        if let Some(button) = self.buttons.get_mut(&index) {
            button.highlight_color = None;
        }
    }
}
