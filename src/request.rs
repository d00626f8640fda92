use crate::{convert::SvgView, foundation::color::BackgroundSpec};

/// Zoom multiplier used when the request gives none or an unusable one.
pub const DEFAULT_ZOOM_MULTIPLIER: f64 = 1.2;

/// What to draw.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum View {
    /// PCB layout.
    Pcb,
    /// Schematic.
    Schematic,
    /// Assembly drawing.
    Assembly,
    /// Pinout diagram.
    Pinout,
    /// Rendered 3D scene.
    ThreeD,
    /// Schematic with simulation overlay.
    SchematicSimulation,
}

impl View {
    /// Parse a view name. Accepts the canonical names and common aliases, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "pcb" => Some(Self::Pcb),
            "schematic" | "sch" => Some(Self::Schematic),
            "assembly" => Some(Self::Assembly),
            "pinout" => Some(Self::Pinout),
            "3d" | "three_d" | "three-d" | "threed" => Some(Self::ThreeD),
            "schsim" | "schematic_simulation" | "schematic-simulation" => {
                Some(Self::SchematicSimulation)
            }
            _ => None,
        }
    }

    /// Canonical name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Pcb => "pcb",
            Self::Schematic => "schematic",
            Self::Assembly => "assembly",
            Self::Pinout => "pinout",
            Self::ThreeD => "3d",
            Self::SchematicSimulation => "schematic-simulation",
        }
    }

    /// The per-view converter view, or `None` for the 3D view.
    pub fn svg_view(self) -> Option<SvgView> {
        match self {
            Self::Pcb => Some(SvgView::Pcb),
            Self::Schematic => Some(SvgView::Schematic),
            Self::Assembly => Some(SvgView::Assembly),
            Self::Pinout => Some(SvgView::Pinout),
            Self::SchematicSimulation => Some(SvgView::SchematicSimulation),
            Self::ThreeD => None,
        }
    }
}

impl std::fmt::Display for View {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Output encoding.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Encoding {
    /// SVG text.
    #[default]
    Svg,
    /// PNG bytes.
    Png,
    /// The resolved circuit document as JSON.
    RawDocument,
}

impl Encoding {
    /// Parse an encoding name, case-insensitively.
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "svg" => Some(Self::Svg),
            "png" => Some(Self::Png),
            "json" | "circuit_json" | "circuit-json" => Some(Self::RawDocument),
            _ => None,
        }
    }

    /// Canonical name.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Svg => "svg",
            Self::Png => "png",
            Self::RawDocument => "json",
        }
    }
}

/// Schematic simulation overlay options.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct SimulationOptions {
    /// Explicit experiment id. When absent the document's first experiment is used.
    pub experiment_id: Option<String>,
    /// Transient voltage graphs to overlay, deduplicated in request order.
    pub transient_graph_ids: Vec<String>,
    /// Fraction of the output height given to the schematic.
    pub schematic_height_ratio: Option<f64>,
}

/// Split comma-separated id lists, trim, drop empties, and dedup preserving first occurrence.
pub fn parse_graph_ids<'a>(values: impl IntoIterator<Item = &'a str>) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for id in values.into_iter().flat_map(|v| v.split(',')).map(str::trim) {
        if !id.is_empty() && !out.iter().any(|seen| seen == id) {
            out.push(id.to_owned());
        }
    }
    out
}

/// Non-finite or non-positive zoom multipliers become [`DEFAULT_ZOOM_MULTIPLIER`].
pub fn normalize_zoom(zoom: f64) -> f64 {
    if zoom.is_finite() && zoom > 0.0 {
        zoom
    } else {
        DEFAULT_ZOOM_MULTIPLIER
    }
}

/// Parse a leading base-10 integer (`"12px"` is `12`, `"7.9"` is `7`); `None` unless positive.
pub fn parse_positive_int(s: &str) -> Option<u32> {
    let s = s.trim();
    let (negative, digits) = match s.as_bytes().first() {
        Some(b'-') => (true, &s[1..]),
        Some(b'+') => (false, &s[1..]),
        _ => (false, s),
    };
    let end = digits
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(digits.len());
    let value: u64 = digits[..end].parse().ok()?;
    if negative || value == 0 {
        return None;
    }
    u32::try_from(value).ok()
}

/// Truncate a numeric parameter; `None` unless finite and at least one.
pub fn positive_int(v: f64) -> Option<u32> {
    if !v.is_finite() {
        return None;
    }
    let t = v.trunc();
    (t >= 1.0 && t <= f64::from(u32::MAX)).then_some(t as u32)
}

/// Everything about a render besides the circuit itself.
#[derive(Clone, Debug, PartialEq)]
pub struct RenderRequest {
    /// View to draw.
    pub view: View,
    /// Output encoding.
    pub encoding: Encoding,
    /// Output width in pixels (PNG output and 3D rasters).
    pub width: Option<u32>,
    /// Output height in pixels (PNG output and 3D rasters).
    pub height: Option<u32>,
    /// Rasterization density in DPI (PNG output of 2D views).
    pub density: Option<u32>,
    /// Background of 3D output.
    pub background: BackgroundSpec,
    /// 3D zoom multiplier, always finite and positive.
    pub zoom_multiplier: f64,
    /// Draw a ground grid under the 3D scene.
    pub show_infinite_grid: bool,
    /// Draw the solder mask (PCB only).
    pub show_solder_mask: Option<bool>,
    /// Schematic simulation options.
    pub simulation: SimulationOptions,
}

impl RenderRequest {
    /// Request with every option at its default.
    pub fn new(view: View, encoding: Encoding) -> Self {
        Self {
            view,
            encoding,
            width: None,
            height: None,
            density: None,
            background: BackgroundSpec::default(),
            zoom_multiplier: DEFAULT_ZOOM_MULTIPLIER,
            show_infinite_grid: false,
            show_solder_mask: None,
            simulation: SimulationOptions::default(),
        }
    }

    /// Set the output size. Zero dimensions are ignored.
    pub fn with_size(mut self, width: Option<u32>, height: Option<u32>) -> Self {
        self.width = width.filter(|w| *w > 0);
        self.height = height.filter(|h| *h > 0);
        self
    }

    /// Set the rasterization density. Zero is ignored.
    pub fn with_density(mut self, density: Option<u32>) -> Self {
        self.density = density.filter(|d| *d > 0);
        self
    }

    /// Set the background from raw color and opacity values.
    pub fn with_background(mut self, color: Option<&str>, opacity: Option<f64>) -> Self {
        self.background = BackgroundSpec::new(color, opacity);
        self
    }

    /// Set the zoom multiplier; unusable values fall back to the default.
    pub fn with_zoom(mut self, zoom: f64) -> Self {
        self.zoom_multiplier = normalize_zoom(zoom);
        self
    }

    /// Toggle the 3D ground grid.
    pub fn with_infinite_grid(mut self, show: bool) -> Self {
        self.show_infinite_grid = show;
        self
    }

    /// Toggle the PCB solder mask.
    pub fn with_solder_mask(mut self, show: bool) -> Self {
        self.show_solder_mask = Some(show);
        self
    }

    /// Set the simulation experiment id. Blank ids are ignored.
    pub fn with_simulation_experiment(mut self, id: impl Into<String>) -> Self {
        let id = id.into();
        self.simulation.experiment_id = (!id.trim().is_empty()).then_some(id);
        self
    }

    /// Set the transient voltage graphs from raw comma-separated values.
    pub fn with_transient_graphs<'a>(mut self, values: impl IntoIterator<Item = &'a str>) -> Self {
        self.simulation.transient_graph_ids = parse_graph_ids(values);
        self
    }

    /// Set the schematic height ratio. NaN is ignored.
    pub fn with_schematic_height_ratio(mut self, ratio: f64) -> Self {
        self.simulation.schematic_height_ratio = (!ratio.is_nan()).then_some(ratio);
        self
    }
}
