use super::canvas::{HoverEvent, LayerId, MapCanvas, Polyline, PolylineStyle, Sidebar};
use super::palette::Palette;
use crate::sdk::routes::RouteRecord;
use crate::sdk::routing::{GeometrySink, Provenance, ResolvedGeometry};
use crate::sdk::util::format::fixed;
use std::collections::HashMap;

const ROUTE_LINE_WEIGHT: f64 = 5.0;
const APPROXIMATE_OPACITY: f64 = 0.7;
const ROUTED_OPACITY: f64 = 0.9;

const MISSING: &str = "—";

/// Summary shown when a routed line is clicked.
pub fn route_popup(route: &RouteRecord) -> String {
    let congestion = route.congestion_label.as_deref().unwrap_or(MISSING);
    // half of free flow is assumed when the ratio is missing
    let flow = route.mean_flow_ratio.unwrap_or(0.5);
    let time_saved = route
        .time_saved_s
        .map(|s| format!("{}s", s))
        .unwrap_or_else(|| MISSING.to_string());
    let score = route
        .flow_agreement_score
        .map(|s| fixed(s, 3))
        .unwrap_or_else(|| MISSING.to_string());

    format!(
        "Congestion: {}\nFlow: {}% of free-flow\nTime saved: {}\nScore: {}",
        congestion,
        fixed(flow * 100.0, 0),
        time_saved,
        score
    )
}

#[derive(Debug, Clone, Copy)]
struct Drawn {
    layer: LayerId,
    provenance: Provenance,
}

/// Draws resolved route geometry and keeps track of what is on the map per route.
///
/// At most one line is drawn per route index: drawing a new geometry for an
/// index first removes the previous one.
#[derive(Debug, Default)]
pub struct OverlayRenderer {
    palette: Palette,
    drawn: HashMap<usize, Drawn>,
}

impl OverlayRenderer {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            drawn: HashMap::new(),
        }
    }

    pub fn render(
        &mut self,
        canvas: &mut dyn MapCanvas,
        index: usize,
        route: &RouteRecord,
        geometry: &ResolvedGeometry,
    ) -> LayerId {
        self.remove(canvas, index);

        let opacity = match geometry.provenance {
            Provenance::Approximate => APPROXIMATE_OPACITY,
            Provenance::Routed => ROUTED_OPACITY,
        };
        let popup = match geometry.provenance {
            Provenance::Routed => Some(route_popup(route)),
            Provenance::Approximate => None,
        };

        let layer = canvas.add_polyline(Polyline {
            points: geometry.points.clone(),
            style: PolylineStyle {
                color: self.palette.route_color(index, route.congestion()).to_string(),
                weight: ROUTE_LINE_WEIGHT,
                opacity,
            },
            popup,
            hover_index: Some(index),
            provenance: Some(geometry.provenance),
        });

        self.drawn.insert(
            index,
            Drawn {
                layer,
                provenance: geometry.provenance,
            },
        );
        layer
    }

    /// Detaches whatever is drawn for `index`. Returns false if nothing was.
    pub fn remove(&mut self, canvas: &mut dyn MapCanvas, index: usize) -> bool {
        match self.drawn.remove(&index) {
            Some(drawn) => canvas.remove_layer(drawn.layer),
            None => false,
        }
    }

    pub fn provenance(&self, index: usize) -> Option<Provenance> {
        self.drawn.get(&index).map(|d| d.provenance)
    }

    pub fn layer(&self, index: usize) -> Option<LayerId> {
        self.drawn.get(&index).map(|d| d.layer)
    }

    pub fn highlight(&self, sidebar: &mut dyn Sidebar, index: usize) {
        let color = self.palette.rank_color(index).unwrap_or(super::palette::DEFAULT_COLOR);
        sidebar.highlight(index, color);
    }

    pub fn unhighlight(&self, sidebar: &mut dyn Sidebar, index: usize) {
        sidebar.unhighlight(index);
    }

    /// Runs the hover handlers bound to `layer`.
    pub fn on_hover(
        &self,
        canvas: &dyn MapCanvas,
        sidebar: &mut dyn Sidebar,
        layer: LayerId,
        event: HoverEvent,
    ) {
        if let Some(index) = canvas.hover_target(layer) {
            match event {
                HoverEvent::Enter => self.highlight(sidebar, index),
                HoverEvent::Exit => self.unhighlight(sidebar, index),
            }
        }
    }

    /// Gives every sidebar dot its route colour.
    pub fn style_sidebar(&self, sidebar: &mut dyn Sidebar) {
        for index in 0..self.palette.len() {
            if let Some(color) = self.palette.rank_color(index) {
                sidebar.set_dot_color(index, color);
            }
        }
    }

    /// Binds this renderer to a canvas for the resolution stage.
    pub fn sink<'a>(&'a mut self, canvas: &'a mut dyn MapCanvas) -> CanvasSink<'a> {
        CanvasSink {
            renderer: self,
            canvas,
        }
    }
}

pub struct CanvasSink<'a> {
    renderer: &'a mut OverlayRenderer,
    canvas: &'a mut dyn MapCanvas,
}

impl GeometrySink for CanvasSink<'_> {
    fn render(&mut self, index: usize, route: &RouteRecord, geometry: &ResolvedGeometry) {
        self.renderer.render(self.canvas, index, route, geometry);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sdk::render::canvas::{GeoJsonCanvas, SidebarState};
    use crate::sdk::routes::LatLon;

    fn record() -> RouteRecord {
        serde_json::from_str(
            r#"{"origin_lat":40.70,"origin_lon":-74.00,"dest_lat":40.75,"dest_lon":-73.99,
                "mean_flow_ratio":0.91,"congestion_label":"heavy","time_saved_s":42,
                "flow_agreement_score":0.87}"#,
        )
        .unwrap()
    }

    fn canvas() -> GeoJsonCanvas {
        GeoJsonCanvas::new(LatLon::new(40.7128, -74.0060), 12)
    }

    #[test]
    fn popup_lists_summary_values() {
        let popup = route_popup(&record());
        assert!(popup.contains("Congestion: heavy"));
        assert!(popup.contains("Flow: 91% of free-flow"));
        assert!(popup.contains("Time saved: 42s"));
        assert!(popup.contains("Score: 0.870"));
    }

    #[test]
    fn popup_rounds_half_flow_up() {
        let mut route = record();
        route.mean_flow_ratio = Some(0.125);
        assert!(route_popup(&route).contains("Flow: 13% of free-flow"));
        route.mean_flow_ratio = Some(0.625);
        assert!(route_popup(&route).contains("Flow: 63% of free-flow"));
        route.mean_flow_ratio = Some(0.005);
        assert!(route_popup(&route).contains("Flow: 1% of free-flow"));
    }

    #[test]
    fn popup_shows_dataset_label_verbatim() {
        let mut route = record();
        route.congestion_label = Some("Gridlock".to_string());
        assert!(route_popup(&route).starts_with("Congestion: Gridlock\n"));
    }

    #[test]
    fn popup_uses_placeholders() {
        let mut route = record();
        route.congestion_label = None;
        route.mean_flow_ratio = None;
        route.time_saved_s = None;
        route.flow_agreement_score = None;
        let popup = route_popup(&route);
        assert_eq!(
            popup,
            "Congestion: —\nFlow: 50% of free-flow\nTime saved: —\nScore: —"
        );
    }

    #[test]
    fn routed_geometry_replaces_approximate() {
        let route = record();
        let mut canvas = canvas();
        let mut renderer = OverlayRenderer::default();

        let first = renderer.render(&mut canvas, 0, &route, &ResolvedGeometry::approximate(&route));
        assert_eq!(canvas.polyline(first).unwrap().style.opacity, APPROXIMATE_OPACITY);
        assert!(canvas.polyline(first).unwrap().popup.is_none());

        let path = vec![route.origin(), LatLon::new(40.72, -73.995), route.destination()];
        let second = renderer.render(&mut canvas, 0, &route, &ResolvedGeometry::routed(path));

        assert!(!canvas.has_layer(first));
        assert_eq!(canvas.layer_count(), 1);
        assert_eq!(renderer.provenance(0), Some(Provenance::Routed));
        let line = canvas.polyline(second).unwrap();
        assert_eq!(line.style.color, "#3b82f6");
        assert_eq!(line.points.len(), 3);
        assert!(line.popup.as_ref().unwrap().contains("heavy"));
    }

    #[test]
    fn color_falls_back_to_congestion_past_palette() {
        let mut route = record();
        route.congestion_label = Some("Moderate".to_string());
        let mut canvas = canvas();
        let mut renderer = OverlayRenderer::default();
        let layer = renderer.render(&mut canvas, 11, &route, &ResolvedGeometry::approximate(&route));
        assert_eq!(canvas.polyline(layer).unwrap().style.color, "#ffaa00");
    }

    #[test]
    fn hover_highlights_matching_sidebar_button() {
        let route = record();
        let mut canvas = canvas();
        let mut sidebar = SidebarState::default();
        let mut renderer = OverlayRenderer::default();
        let layer = renderer.render(&mut canvas, 4, &route, &ResolvedGeometry::approximate(&route));

        renderer.on_hover(&canvas, &mut sidebar, layer, HoverEvent::Enter);
        assert_eq!(
            sidebar.button(4).unwrap().highlight_color.as_deref(),
            Some("#8b5cf6")
        );
        renderer.on_hover(&canvas, &mut sidebar, layer, HoverEvent::Exit);
        assert!(!sidebar.is_highlighted(4));
    }

    #[test]
    fn style_sidebar_colors_every_dot() {
        let mut sidebar = SidebarState::default();
        OverlayRenderer::default().style_sidebar(&mut sidebar);
        assert_eq!(sidebar.button(9).unwrap().dot_color.as_deref(), Some("#a855f7"));
        assert!(sidebar.button(10).is_none());
    }
}
