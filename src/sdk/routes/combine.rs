//! Builds the merged dataset from the two ranked CSV exports.
//!
//! The first export has sampled geometry available from an existing
//! `busy_roads.json`; the second has none, so its routes get an empty
//! `route_points` and the page resolves them through the routing service.

use anyhow::{Context, Result};
use serde::Deserialize;
use serde_json::{Map, Number, Value};
use std::collections::HashMap;
use std::fs;
use std::path::Path;

use super::record::LatLon;

type GeometryKey = [u64; 4];

fn geometry_key(origin_lat: f64, origin_lon: f64, dest_lat: f64, dest_lon: f64) -> GeometryKey {
    [
        origin_lat.to_bits(),
        origin_lon.to_bits(),
        dest_lat.to_bits(),
        dest_lon.to_bits(),
    ]
}

#[derive(Deserialize)]
struct GeometryEntry {
    origin_lat: f64,
    origin_lon: f64,
    dest_lat: f64,
    dest_lon: f64,
    #[serde(default)]
    route_points: Vec<LatLon>,
}

/// Sampled geometry keyed by exact origin/destination coordinates.
#[derive(Default)]
pub struct GeometryLookup {
    by_endpoints: HashMap<GeometryKey, Vec<LatLon>>,
}

impl GeometryLookup {
    pub fn from_json(text: &str) -> Result<Self> {
        let entries: Vec<GeometryEntry> =
            serde_json::from_str(text).context("Failed to parse geometry dataset")?;
        let by_endpoints = entries
            .into_iter()
            .map(|e| {
                (
                    geometry_key(e.origin_lat, e.origin_lon, e.dest_lat, e.dest_lon),
                    e.route_points,
                )
            })
            .collect();
        Ok(Self { by_endpoints })
    }

    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = fs::read_to_string(path)
            .with_context(|| format!("Failed to read geometry dataset {}", path.display()))?;
        Self::from_json(&text)
    }

    fn points_for(&self, row: &Map<String, Value>) -> Vec<LatLon> {
        let coord = |name: &str| row.get(name).and_then(Value::as_f64);
        match (
            coord("origin_lat"),
            coord("origin_lon"),
            coord("dest_lat"),
            coord("dest_lon"),
        ) {
            (Some(a), Some(b), Some(c), Some(d)) => self
                .by_endpoints
                .get(&geometry_key(a, b, c, d))
                .cloned()
                .unwrap_or_default(),
            _ => Vec::new(),
        }
    }
}

/// CSV cells become JSON numbers where they parse, `null` when empty, strings otherwise.
fn cell_to_json(cell: &str) -> Value {
    let cell = cell.trim();
    if cell.is_empty() {
        return Value::Null;
    }
    if let Ok(int) = cell.parse::<i64>() {
        return Value::Number(int.into());
    }
    cell.parse::<f64>()
        .ok()
        .and_then(Number::from_f64)
        .map(Value::Number)
        .unwrap_or_else(|| Value::String(cell.to_string()))
}

fn read_rows<R: std::io::Read>(reader: R) -> Result<Vec<Map<String, Value>>> {
    let mut rdr = csv::ReaderBuilder::new().delimiter(b',').from_reader(reader);
    let headers = rdr.headers().context("CSV has no header row")?.clone();

    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        let row = headers
            .iter()
            .zip(record.iter())
            .map(|(name, cell)| (name.trim().to_string(), cell_to_json(cell)))
            .collect();
        rows.push(row);
    }
    Ok(rows)
}

/// Concatenates both exports, primary rows first, attaching geometry to the primary rows.
pub fn combine_rows<R1: std::io::Read, R2: std::io::Read>(
    primary: R1,
    secondary: R2,
    geometry: &GeometryLookup,
) -> Result<Vec<Value>> {
    let mut combined = Vec::new();

    for mut row in read_rows(primary).context("Failed to read primary CSV")? {
        let points = geometry.points_for(&row);
        row.insert("route_points".to_string(), serde_json::to_value(points)?);
        combined.push(Value::Object(row));
    }

    for mut row in read_rows(secondary).context("Failed to read secondary CSV")? {
        row.insert("route_points".to_string(), Value::Array(Vec::new()));
        combined.push(Value::Object(row));
    }

    Ok(combined)
}

/// File-level wrapper used by the `combine` subcommand. Returns the number of routes written.
pub fn combine_datasets(
    primary_csv: &Path,
    secondary_csv: &Path,
    geometry_json: &Path,
    out: &Path,
) -> Result<usize> {
    let geometry = GeometryLookup::load(geometry_json)?;
    let primary = fs::File::open(primary_csv)
        .with_context(|| format!("Failed to open {}", primary_csv.display()))?;
    let secondary = fs::File::open(secondary_csv)
        .with_context(|| format!("Failed to open {}", secondary_csv.display()))?;

    let combined = combine_rows(primary, secondary, &geometry)?;
    let json = serde_json::to_string_pretty(&combined)?;
    fs::write(out, json).with_context(|| format!("Failed to write {}", out.display()))?;
    Ok(combined.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::routes::RouteRecord;

    const PRIMARY: &str = "rank,origin_lat,origin_lon,dest_lat,dest_lon,mean_flow_ratio,congestion_label\n\
                           1,40.7,-74.0,40.75,-73.99,0.91,heavy\n\
                           2,40.6,-73.9,40.65,-73.95,0.4,free\n";
    const SECONDARY: &str = "rank,origin_lat,origin_lon,dest_lat,dest_lon,mean_flow_ratio,congestion_label\n\
                             1,40.8,-73.8,40.81,-73.85,,moderate\n";
    const GEOMETRY: &str = r#"[
        {"origin_lat":40.7,"origin_lon":-74.0,"dest_lat":40.75,"dest_lon":-73.99,
         "route_points":[[40.7,-74.0],[40.72,-73.995],[40.75,-73.99]]}
    ]"#;

    #[test]
    fn primary_rows_come_first_with_geometry() {
        let geometry = GeometryLookup::from_json(GEOMETRY).unwrap();
        let combined = combine_rows(PRIMARY.as_bytes(), SECONDARY.as_bytes(), &geometry).unwrap();
        assert_eq!(combined.len(), 3);

        let records: Vec<RouteRecord> = combined
            .into_iter()
            .map(|v| serde_json::from_value(v).unwrap())
            .collect();
        assert_eq!(records[0].route_points.as_ref().map(Vec::len), Some(3));
        // no geometry match for the second primary row
        assert_eq!(records[1].route_points.as_ref().map(Vec::len), Some(0));
        assert_eq!(records[2].route_points.as_ref().map(Vec::len), Some(0));
        assert_eq!(records[2].mean_flow_ratio, None);
    }

    #[test]
    fn cells_are_typed() {
        assert_eq!(cell_to_json("12"), Value::from(12));
        assert_eq!(cell_to_json("0.5"), Value::from(0.5));
        assert_eq!(cell_to_json(" heavy "), Value::from("heavy"));
        assert_eq!(cell_to_json(""), Value::Null);
    }

    #[test]
    fn combine_datasets_writes_json_file() {
        let dir = tempfile::tempdir().unwrap();
        let p = dir.path().join("a.csv");
        let s = dir.path().join("b.csv");
        let g = dir.path().join("busy_roads.json");
        let out = dir.path().join("combined_routes.json");
        fs::write(&p, PRIMARY).unwrap();
        fs::write(&s, SECONDARY).unwrap();
        fs::write(&g, GEOMETRY).unwrap();

        let written = combine_datasets(&p, &s, &g, &out).unwrap();
        assert_eq!(written, 3);
        let parsed: Vec<RouteRecord> =
            serde_json::from_str(&fs::read_to_string(&out).unwrap()).unwrap();
        assert_eq!(parsed.len(), 3);
    }
}
