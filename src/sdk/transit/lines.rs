use super::overpass::{OverpassResponse, Relation};
use crate::sdk::error::FetchError;
use crate::sdk::render::palette::{Palette, DEFAULT_COLOR};
use crate::sdk::routes::LatLon;
use geojson::{Feature, FeatureCollection, Geometry, Value};
use std::collections::HashMap;

pub const TRANSIT_LINE_WEIGHT: f64 = 3.0;
pub const TRANSIT_LINE_OPACITY: f64 = 0.85;

/// Display metadata a way inherits from the first relation that claims it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LineInfo {
    pub color: String,
    pub reference: String,
    pub name: String,
}

impl Default for LineInfo {
    fn default() -> Self {
        Self {
            color: DEFAULT_COLOR.to_string(),
            reference: String::new(),
            name: String::new(),
        }
    }
}

impl LineInfo {
    fn from_relation(relation: &Relation, palette: &Palette) -> Option<Self> {
        let tags = relation.tags.as_ref()?;
        let reference = tags
            .get("ref")
            .map(|r| r.trim().to_uppercase())
            .unwrap_or_default();
        let color = tags
            .get("colour")
            .filter(|c| !c.trim().is_empty())
            .cloned()
            .or_else(|| palette.line_color(&reference).map(str::to_string))
            .unwrap_or_else(|| DEFAULT_COLOR.to_string());
        let name = tags.get("name").cloned().unwrap_or_default();
        Some(Self {
            color,
            reference,
            name,
        })
    }

    /// Popup label: the relation name, else "<ref> Train", else a generic label.
    pub fn label(&self) -> String {
        if !self.name.is_empty() {
            self.name.clone()
        } else if !self.reference.is_empty() {
            format!("{} Train", self.reference)
        } else {
            "Subway Line".to_string()
        }
    }
}

/// Assigns each member way the line info of the first relation claiming it.
///
/// Relations are visited in ascending id so the result does not depend on the
/// order the service returned them in. Relations without tags are skipped.
pub fn way_line_map<'a, I>(relations: I, palette: &Palette) -> HashMap<i64, LineInfo>
where
    I: IntoIterator<Item = &'a Relation>,
{
    let mut relations: Vec<&Relation> = relations.into_iter().collect();
    relations.sort_by_key(|r| r.id);

    let mut map = HashMap::new();
    for relation in relations {
        let Some(info) = LineInfo::from_relation(relation, palette) else {
            continue;
        };
        for member in relation.members.iter().filter(|m| m.kind == "way") {
            map.entry(member.id).or_insert_with(|| info.clone());
        }
    }
    map
}

#[derive(Debug, Clone, PartialEq)]
pub struct TransitWay {
    pub id: i64,
    pub info: LineInfo,
    pub points: Vec<LatLon>,
}

/// A subway line: every way drawn in the same colour under the same label.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitLine {
    pub color: String,
    pub label: String,
    pub ways: Vec<Vec<LatLon>>,
}

/// The assembled subway overlay.
#[derive(Debug, Clone, PartialEq)]
pub struct TransitNetwork {
    ways: Vec<TransitWay>,
}

impl TransitNetwork {
    /// Joins relations to ways.
    ///
    /// Fails with `EmptyResult` when the response holds no relations (the query
    /// cannot legitimately come back empty) and with `NoFeatures` when no way
    /// with at least two points survives.
    pub fn assemble(response: &OverpassResponse, palette: &Palette) -> Result<Self, FetchError> {
        let relation_count = response.relations().count();
        let way_count = response.ways().count();
        log::info!("[TRANSIT] relations: {} | ways: {}", relation_count, way_count);

        if relation_count == 0 {
            return Err(FetchError::EmptyResult(
                "no subway route relations in bbox".to_string(),
            ));
        }

        let lines = way_line_map(response.relations(), palette);
        log::debug!("[TRANSIT] way->color entries: {}", lines.len());

        let ways: Vec<TransitWay> = response
            .ways()
            .filter(|w| w.geometry.len() >= 2)
            .map(|w| TransitWay {
                id: w.id,
                info: lines.get(&w.id).cloned().unwrap_or_default(),
                points: w.geometry.iter().map(|p| LatLon::new(p.lat, p.lon)).collect(),
            })
            .collect();
        log::info!(
            "[TRANSIT] ways with geometry: {} / total ways: {}",
            ways.len(),
            way_count
        );

        if ways.is_empty() {
            return Err(FetchError::NoFeatures(
                "no subway ways with geometry".to_string(),
            ));
        }
        Ok(Self { ways })
    }

    pub fn ways(&self) -> &[TransitWay] {
        &self.ways
    }

    /// Ways grouped by (colour, label), in first-seen order.
    pub fn lines(&self) -> Vec<TransitLine> {
        let mut lines: Vec<TransitLine> = Vec::new();
        let mut slots: HashMap<(String, String), usize> = HashMap::new();
        for way in &self.ways {
            let key = (way.info.color.clone(), way.info.label());
            let slot = *slots.entry(key.clone()).or_insert_with(|| {
                lines.push(TransitLine {
                    color: key.0,
                    label: key.1,
                    ways: Vec::new(),
                });
                lines.len() - 1
            });
            lines[slot].ways.push(way.points.clone());
        }
        lines
    }

    /// One LineString feature per way, carrying `_color`, `_ref` and `_name`.
    pub fn to_feature_collection(&self) -> FeatureCollection {
        let features = self
            .ways
            .iter()
            .map(|way| {
                let coordinates = way.points.iter().map(|p| p.to_lon_lat()).collect();
                let mut feature = Feature::from(Geometry::new(Value::LineString(coordinates)));
                feature.set_property("_color", way.info.color.clone());
                feature.set_property("_ref", way.info.reference.clone());
                feature.set_property("_name", way.info.name.clone());
                feature.set_property("stroke", way.info.color.clone());
                feature.set_property("stroke-width", TRANSIT_LINE_WEIGHT);
                feature.set_property("stroke-opacity", TRANSIT_LINE_OPACITY);
                feature.set_property("popup", way.info.label());
                feature
            })
            .collect();
        FeatureCollection {
            bbox: None,
            features,
            foreign_members: None,
        }
    }
}
