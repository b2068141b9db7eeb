//! Builds the sampled-geometry dataset (`busy_roads.json`) from the top-routes CSV.
//!
//! Each row gets [`SAMPLED_POINTS`] evenly spaced points between its endpoints,
//! optionally jittered with gaussian noise so the line looks less like a ruler.

use anyhow::{Context, Result};
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};
use serde::Deserialize;
use std::f64::consts::PI;
use std::fs;
use std::path::Path;

use super::record::{LatLon, RouteRecord};

pub const SAMPLED_POINTS: usize = 8;

/// Standard deviation of the per-point jitter, in degrees.
pub const DEFAULT_JITTER_DEG: f64 = 0.001;

#[derive(Debug, Clone, Copy)]
pub struct Jitter {
    pub sigma_deg: f64,
    pub seed: u64,
}

#[derive(Deserialize)]
struct TopRouteRow {
    origin_lat: f64,
    origin_lon: f64,
    dest_lat: f64,
    dest_lon: f64,
    short_dist_m: f64,
    time_saved_s: f64,
    mean_flow_ratio: f64,
    congestion_label: String,
    flow_agreement_score: f64,
}

// Box-Muller; `1 - gen()` keeps the log argument in (0, 1].
fn gaussian<R: Rng>(rng: &mut R, sigma: f64) -> f64 {
    let u1 = 1.0 - rng.gen::<f64>();
    let u2 = rng.gen::<f64>();
    sigma * (-2.0 * u1.ln()).sqrt() * (2.0 * PI * u2).cos()
}

/// `count` evenly spaced points from `origin` to `dest`, both included.
pub fn interpolate(origin: LatLon, dest: LatLon, count: usize) -> Vec<LatLon> {
    match count {
        0 => Vec::new(),
        1 => vec![origin],
        _ => {
            let steps = (count - 1) as f64;
            (0..count)
                .map(|i| {
                    let t = i as f64 / steps;
                    LatLon::new(
                        origin.lat + (dest.lat - origin.lat) * t,
                        origin.lon + (dest.lon - origin.lon) * t,
                    )
                })
                .collect()
        }
    }
}

fn jittered<R: Rng>(points: Vec<LatLon>, sigma: f64, rng: &mut R) -> Vec<LatLon> {
    points
        .into_iter()
        .map(|p| {
            let lat = p.lat + gaussian(rng, sigma);
            let lon = p.lon + gaussian(rng, sigma);
            LatLon::new(lat, lon)
        })
        .collect()
}

/// Parses the CSV and attaches sampled geometry to every row.
pub fn generate_routes<R: std::io::Read>(reader: R, jitter: Option<Jitter>) -> Result<Vec<RouteRecord>> {
    let mut rdr = csv::ReaderBuilder::new().trim(csv::Trim::All).from_reader(reader);
    let mut rng = jitter.map(|j| SmallRng::seed_from_u64(j.seed));

    let mut routes = Vec::new();
    for (line, result) in rdr.deserialize::<TopRouteRow>().enumerate() {
        let row = result.with_context(|| format!("Bad route row {}", line + 1))?;
        let origin = LatLon::new(row.origin_lat, row.origin_lon);
        let dest = LatLon::new(row.dest_lat, row.dest_lon);

        let mut points = interpolate(origin, dest, SAMPLED_POINTS);
        if let (Some(rng), Some(jitter)) = (rng.as_mut(), jitter) {
            points = jittered(points, jitter.sigma_deg, rng);
        }

        routes.push(RouteRecord {
            origin_lat: row.origin_lat,
            origin_lon: row.origin_lon,
            dest_lat: row.dest_lat,
            dest_lon: row.dest_lon,
            route_points: Some(points),
            mean_flow_ratio: Some(row.mean_flow_ratio),
            congestion_label: Some(row.congestion_label),
            short_dist_m: Some(row.short_dist_m),
            short_time_s: None,
            fast_dist_m: None,
            fast_time_s: None,
            time_saved_s: Some(row.time_saved_s),
            flow_agreement_score: Some(row.flow_agreement_score),
        });
    }
    Ok(routes)
}

/// File-level wrapper used by the `generate` subcommand. Returns the number of routes written.
pub fn generate_dataset(top_csv: &Path, out: &Path, jitter: Option<Jitter>) -> Result<usize> {
    let file = fs::File::open(top_csv)
        .with_context(|| format!("Failed to open {}", top_csv.display()))?;
    let routes = generate_routes(file, jitter)?;
    let json = serde_json::to_string(&routes)?;
    fs::write(out, json).with_context(|| format!("Failed to write {}", out.display()))?;
    Ok(routes.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::routes::combine::{combine_rows, GeometryLookup};

    const TOP: &str = "origin_lat,origin_lon,dest_lat,dest_lon,short_dist_m,time_saved_s,mean_flow_ratio,congestion_label,flow_agreement_score\n\
                       40.7,-74.0,40.8,-73.9,1200,45,0.91, heavy ,0.87\n\
                       40.6,-73.95,40.65,-73.9,800,10,0.42,free,0.5\n";

    #[test]
    fn interpolation_includes_both_ends() {
        let points = interpolate(LatLon::new(0.0, 0.0), LatLon::new(7.0, -14.0), SAMPLED_POINTS);
        assert_eq!(points.len(), 8);
        assert_eq!(points[0], LatLon::new(0.0, 0.0));
        assert_eq!(points[7], LatLon::new(7.0, -14.0));
        assert!((points[3].lat - 3.0).abs() < 1e-9);
        assert!((points[3].lon + 6.0).abs() < 1e-9);

        assert_eq!(interpolate(LatLon::new(1.0, 2.0), LatLon::new(3.0, 4.0), 1).len(), 1);
        assert!(interpolate(LatLon::new(1.0, 2.0), LatLon::new(3.0, 4.0), 0).is_empty());
    }

    #[test]
    fn rows_become_records_with_straight_geometry() {
        let routes = generate_routes(TOP.as_bytes(), None).unwrap();
        assert_eq!(routes.len(), 2);

        let first = &routes[0];
        assert_eq!(first.congestion_label.as_deref(), Some("heavy"));
        assert_eq!(first.short_dist_m, Some(1200.0));
        assert_eq!(first.time_saved_s, Some(45.0));
        let points = first.route_points.as_ref().unwrap();
        assert_eq!(points.len(), SAMPLED_POINTS);
        assert_eq!(points[0], first.origin());
        assert_eq!(points[SAMPLED_POINTS - 1], first.destination());
    }

    #[test]
    fn jitter_is_reproducible_for_a_seed() {
        let jitter = Jitter {
            sigma_deg: DEFAULT_JITTER_DEG,
            seed: 7,
        };
        let a = generate_routes(TOP.as_bytes(), Some(jitter)).unwrap();
        let b = generate_routes(TOP.as_bytes(), Some(jitter)).unwrap();
        assert_eq!(a, b);

        let straight = generate_routes(TOP.as_bytes(), None).unwrap();
        let noisy = a[0].route_points.as_ref().unwrap();
        let exact = straight[0].route_points.as_ref().unwrap();
        assert_ne!(noisy, exact);
        for (n, e) in noisy.iter().zip(exact) {
            // ten sigma
            assert!((n.lat - e.lat).abs() < 0.01);
            assert!((n.lon - e.lon).abs() < 0.01);
        }
    }

    #[test]
    fn missing_column_is_an_error() {
        let csv = "origin_lat,origin_lon,dest_lat,dest_lon\n1,2,3,4\n";
        assert!(generate_routes(csv.as_bytes(), None).is_err());
    }

    #[test]
    fn generated_file_feeds_combine() {
        let dir = tempfile::tempdir().unwrap();
        let top = dir.path().join("top100_routes.csv");
        let out = dir.path().join("busy_roads.json");
        fs::write(&top, TOP).unwrap();

        assert_eq!(generate_dataset(&top, &out, None).unwrap(), 2);

        let geometry = GeometryLookup::load(&out).unwrap();
        let primary = "rank,origin_lat,origin_lon,dest_lat,dest_lon\n1,40.7,-74.0,40.8,-73.9\n";
        let combined = combine_rows(primary.as_bytes(), "rank\n".as_bytes(), &geometry).unwrap();
        assert_eq!(combined.len(), 1);
        assert_eq!(combined[0]["route_points"].as_array().unwrap().len(), SAMPLED_POINTS);
    }
}
