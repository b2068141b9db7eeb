use crate::sdk::routes::Congestion;

/// Colours for the ten busiest routes, in rank order. The map lines, sidebar
/// dots and detail panel headers all read from here.
const ROUTE_COLORS: [&str; 10] = [
    "#3b82f6", // blue
    "#10b981", // green
    "#f59e0b", // amber
    "#ef4444", // red
    "#8b5cf6", // violet
    "#ec4899", // pink
    "#14b8a6", // teal
    "#f43f5e", // rose
    "#0ea5e9", // light blue
    "#a855f7", // purple
];

pub const DEFAULT_COLOR: &str = "#888888";

/// Official NYC subway bullet colours keyed by route ref.
const SUBWAY_LINE_COLORS: &[(&str, &str)] = &[
    ("A", "#0039A6"),
    ("C", "#0039A6"),
    ("E", "#0039A6"),
    ("B", "#FF6319"),
    ("D", "#FF6319"),
    ("F", "#FF6319"),
    ("M", "#FF6319"),
    ("G", "#6CBE45"),
    ("J", "#996633"),
    ("Z", "#996633"),
    ("L", "#A7A9AC"),
    ("N", "#FCCC0A"),
    ("Q", "#FCCC0A"),
    ("R", "#FCCC0A"),
    ("W", "#FCCC0A"),
    ("1", "#EE352E"),
    ("2", "#EE352E"),
    ("3", "#EE352E"),
    ("4", "#00933C"),
    ("5", "#00933C"),
    ("6", "#00933C"),
    ("7", "#B933AD"),
    ("S", "#808183"),
    ("FS", "#808183"),
    ("GS", "#808183"),
    ("H", "#0039A6"),
    ("SI", "#0039A6"),
];

#[derive(Debug, Clone, Copy)]
pub struct Palette {
    routes: &'static [&'static str],
    lines: &'static [(&'static str, &'static str)],
}

impl Default for Palette {
    fn default() -> Self {
        Self {
            routes: &ROUTE_COLORS,
            lines: SUBWAY_LINE_COLORS,
        }
    }
}

impl Palette {
    /// Number of ranked routes that get a dedicated colour.
    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    /// Colour of the route at rank position `index`, if it has one.
    pub fn rank_color(&self, index: usize) -> Option<&'static str> {
        self.routes.get(index).copied()
    }

    pub fn congestion_color(&self, label: Congestion) -> Option<&'static str> {
        match label {
            Congestion::Free => Some("#00cc00"),
            Congestion::Moderate => Some("#ffaa00"),
            Congestion::Heavy => Some("#ff0000"),
            Congestion::Unknown => None,
        }
    }

    /// Rank colour, else congestion colour, else gray.
    pub fn route_color(&self, index: usize, label: Option<Congestion>) -> &'static str {
        self.rank_color(index)
            .or_else(|| label.and_then(|l| self.congestion_color(l)))
            .unwrap_or(DEFAULT_COLOR)
    }

    /// Colour for a transit line ref such as `"A"` or `"gs"`; case and padding are ignored.
    pub fn line_color(&self, reference: &str) -> Option<&'static str> {
        let reference = reference.trim().to_uppercase();
        self.lines
            .iter()
            .find(|(r, _)| *r == reference)
            .map(|(_, color)| *color)
    }
}
