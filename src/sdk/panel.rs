use crate::sdk::render::palette::{Palette, DEFAULT_COLOR};
use crate::sdk::routes::{RankedRouteSet, RouteRecord};
use crate::sdk::util::format::fixed;
use std::fmt;

const MISSING: &str = "—";

#[derive(Debug, Clone, PartialEq)]
pub struct StatEntry {
    pub label: &'static str,
    pub value: String,
    pub note: &'static str,
}

impl StatEntry {
    fn new(label: &'static str, value: String) -> Self {
        Self {
            label,
            value,
            note: "",
        }
    }

    fn with_note(mut self, note: &'static str) -> Self {
        self.note = note;
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PanelBody {
    /// Routes have not finished loading.
    Loading,
    Stats(Vec<StatEntry>),
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelView {
    pub title: String,
    pub color: &'static str,
    pub subtitle: String,
    pub body: PanelBody,
}

fn or_missing(value: Option<f64>, fmt: impl Fn(f64) -> String) -> String {
    value.map(fmt).unwrap_or_else(|| MISSING.to_string())
}

/// Labelled stats in display order.
pub fn route_stats(route: &RouteRecord) -> Vec<StatEntry> {
    let seconds = |v: f64| format!("{}s", v);
    let metres = |v: f64| format!("{} m", v);
    vec![
        StatEntry::new(
            "Avg Speed",
            or_missing(route.average_speed_kmh(), |v| format!("{} km/h", fixed(v, 1))),
        ),
        StatEntry::new(
            "Daily Volume",
            or_missing(route.mean_flow_ratio, |v| fixed(v, 2)),
        )
        .with_note("flow ratio"),
        StatEntry::new("Avg Delay", or_missing(route.time_saved_s, seconds)),
        StatEntry::new("Short distance", or_missing(route.short_dist_m, metres)),
        StatEntry::new("Short time", or_missing(route.short_time_s, seconds)),
        StatEntry::new("Fast distance", or_missing(route.fast_dist_m, metres)),
        StatEntry::new("Fast time", or_missing(route.fast_time_s, seconds)),
        StatEntry::new("Time saved", or_missing(route.time_saved_s, seconds)),
        StatEntry::new(
            "Congestion",
            route
                .congestion_label
                .clone()
                .unwrap_or_else(|| MISSING.to_string()),
        ),
        StatEntry::new(
            "Flow agreement",
            or_missing(route.flow_agreement_score, |v| fixed(v, 3)),
        ),
    ]
}

/// "Mean flow ratio 0.91 – 40.7000,-74.0000 → 40.7500,-73.9900"
pub fn route_subtitle(route: &RouteRecord) -> String {
    format!(
        "Mean flow ratio {} – {} → {}",
        fixed(route.flow_ratio_or_zero(), 2),
        route.origin(),
        route.destination()
    )
}

/// Per-route statistics panel plus the overview panel it shares space with.
#[derive(Debug, Clone, Default)]
pub struct DetailPanel {
    palette: Palette,
    view: Option<PanelView>,
    visible: bool,
    overview_visible: bool,
}

impl DetailPanel {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            ..Default::default()
        }
    }

    /// Renders route `index` from the cached ranked set; never fetches.
    pub fn show(&mut self, index: usize, ranked: Option<&RankedRouteSet>) -> &PanelView {
        let route = ranked.and_then(|r| r.get(index));
        let view = PanelView {
            title: format!("Route {}", index + 1),
            color: self.palette.rank_color(index).unwrap_or(DEFAULT_COLOR),
            subtitle: route.map(route_subtitle).unwrap_or_default(),
            body: match route {
                Some(route) => PanelBody::Stats(route_stats(route)),
                None => PanelBody::Loading,
            },
        };
        self.overview_visible = false;
        self.visible = true;
        self.view.insert(view)
    }

    pub fn close(&mut self) {
        self.visible = false;
    }

    pub fn show_overview(&mut self) {
        self.visible = false;
        self.overview_visible = true;
    }

    pub fn close_overview(&mut self) {
        self.overview_visible = false;
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn is_overview_visible(&self) -> bool {
        self.overview_visible
    }

    /// Last rendered view; kept across close/open.
    pub fn view(&self) -> Option<&PanelView> {
        self.view.as_ref()
    }
}

impl fmt::Display for PanelView {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{} [{}]", self.title, self.color)?;
        if !self.subtitle.is_empty() {
            writeln!(f, "{}", self.subtitle)?;
        }
        match &self.body {
            PanelBody::Loading => writeln!(f, "Loading…"),
            PanelBody::Stats(stats) => {
                for stat in stats {
                    if stat.note.is_empty() {
                        writeln!(f, "  {:<16} {}", stat.label, stat.value)?;
                    } else {
                        writeln!(f, "  {:<16} {} ({})", stat.label, stat.value, stat.note)?;
                    }
                }
                Ok(())
            }
        }
    }
}

/// Maps a route page path such as `route3.html` to its zero-based rank index.
pub fn page_index_from_path(path: &str, palette: &Palette) -> Option<usize> {
    let file = path.rsplit('/').next()?;
    let lower = file.to_ascii_lowercase();
    let digits = lower.strip_prefix("route")?.strip_suffix(".html")?;
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let index = digits.parse::<usize>().ok()?.checked_sub(1)?;
    (index < palette.len()).then_some(index)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ranked() -> RankedRouteSet {
        let record: RouteRecord = serde_json::from_str(
            r#"{"origin_lat":40.70,"origin_lon":-74.00,"dest_lat":40.75,"dest_lon":-73.99,
                "mean_flow_ratio":0.91,"congestion_label":"free","fast_dist_m":2500,
                "fast_time_s":300,"short_dist_m":2300,"time_saved_s":30}"#,
        )
        .unwrap();
        RankedRouteSet::rank(vec![record])
    }

    #[test]
    fn stats_show_values_and_placeholders() {
        let ranked = ranked();
        let mut panel = DetailPanel::default();
        let view = panel.show(0, Some(&ranked)).clone();

        assert_eq!(view.title, "Route 1");
        assert_eq!(view.color, "#3b82f6");
        assert_eq!(
            view.subtitle,
            "Mean flow ratio 0.91 – 40.7000,-74.0000 → 40.7500,-73.9900"
        );
        let PanelBody::Stats(stats) = view.body else {
            panic!("expected stats");
        };
        let value = |label: &str| stats.iter().find(|s| s.label == label).unwrap().value.clone();
        assert_eq!(value("Avg Speed"), "30.0 km/h");
        assert_eq!(value("Daily Volume"), "0.91");
        assert_eq!(value("Short distance"), "2300 m");
        assert_eq!(value("Short time"), "—");
        assert_eq!(value("Time saved"), "30s");
        assert_eq!(value("Congestion"), "free");
        assert_eq!(value("Flow agreement"), "—");
        assert_eq!(stats.len(), 10);
    }

    #[test]
    fn missing_route_shows_loading() {
        let mut panel = DetailPanel::default();
        let view = panel.show(3, None);
        assert_eq!(view.body, PanelBody::Loading);
        assert_eq!(view.subtitle, "");

        let ranked = ranked();
        assert_eq!(panel.show(5, Some(&ranked)).body, PanelBody::Loading);
    }

    #[test]
    fn visibility_toggles() {
        let mut panel = DetailPanel::default();
        panel.show_overview();
        panel.show(0, None);
        assert!(panel.is_visible());
        assert!(!panel.is_overview_visible());

        panel.close();
        assert!(!panel.is_visible());
        assert!(panel.view().is_some());

        panel.show_overview();
        assert!(panel.is_overview_visible());
        panel.close_overview();
        assert!(!panel.is_overview_visible());
        assert!(!panel.is_visible());
    }

    #[test]
    fn halves_round_up_in_stats() {
        let mut record: RouteRecord = serde_json::from_str(
            r#"{"origin_lat":1,"origin_lon":2,"dest_lat":3,"dest_lon":4,
                "mean_flow_ratio":0.125,"flow_agreement_score":0.8125,
                "congestion_label":"Heavy"}"#,
        )
        .unwrap();
        let stats = route_stats(&record);
        let value = |label: &str| stats.iter().find(|s| s.label == label).unwrap().value.clone();
        assert_eq!(value("Daily Volume"), "0.13");
        assert_eq!(value("Flow agreement"), "0.813");
        assert_eq!(value("Congestion"), "Heavy");
        assert!(route_subtitle(&record).starts_with("Mean flow ratio 0.13 "));

        record.mean_flow_ratio = None;
        assert!(route_subtitle(&record).starts_with("Mean flow ratio 0.00 "));
    }

    #[test]
    fn page_paths_map_to_indices() {
        let palette = Palette::default();
        assert_eq!(page_index_from_path("/site/route1.html", &palette), Some(0));
        assert_eq!(page_index_from_path("Route10.HTML", &palette), Some(9));
        assert_eq!(page_index_from_path("route11.html", &palette), None);
        assert_eq!(page_index_from_path("route0.html", &palette), None);
        assert_eq!(page_index_from_path("index.html", &palette), None);
    }
}
