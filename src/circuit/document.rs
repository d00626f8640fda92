use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};

use crate::foundation::error::{RenderError, RenderResult};

/// Element types that end in `_error` but never block rendering.
const NON_FATAL_ERROR_KINDS: &[&str] = &["pcb_autorouting_error", "pcb_autorouting_warning"];

/// Lower bound applied to component-derived scene sizes.
pub const MIN_COMPONENT_DIM: f64 = 5.0;

/// Planar size of a geometric element.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlanarSize {
    /// Width in millimetres.
    pub width: f64,
    /// Height in millimetres.
    pub height: f64,
}

impl PlanarSize {
    /// Larger of the two dimensions.
    pub fn max_dim(self) -> f64 {
        self.width.max(self.height)
    }
}

/// The parts of an element the pipeline understands.
///
/// Everything else about an element is carried verbatim in [`CircuitElement::fields`].
#[derive(Clone, Debug, PartialEq)]
pub enum ElementKind {
    /// `pcb_board`, with explicit dimensions when both are present and positive.
    Board {
        /// Board outline size.
        size: Option<PlanarSize>,
    },
    /// `pcb_component`, sized by `width`/`height` or `size.{width,height}`.
    Component {
        /// Component footprint size, when any dimension is known.
        size: Option<PlanarSize>,
    },
    /// `simulation_experiment`.
    SimulationExperiment {
        /// `simulation_experiment_id`, if present.
        id: Option<String>,
    },
    /// Any `*_error` element.
    ErrorMarker {
        /// Whether this error blocks rendering.
        fatal: bool,
        /// Human-readable message, if present.
        message: Option<String>,
    },
    /// Every other element kind (traces, ports, graphs, ...).
    Other,
}

/// A single tagged element of a circuit document.
#[derive(Clone, Debug, PartialEq)]
pub struct CircuitElement {
    type_name: String,
    kind: ElementKind,
    fields: Map<String, Value>,
}

impl CircuitElement {
    /// Classify a raw JSON object. The object must carry a string `type`.
    pub fn from_fields(fields: Map<String, Value>) -> RenderResult<Self> {
        let type_name = fields
            .get("type")
            .and_then(Value::as_str)
            .ok_or_else(|| RenderError::input("circuit element is missing a string \"type\""))?
            .to_owned();
        let kind = classify(&type_name, &fields);
        Ok(Self {
            type_name,
            kind,
            fields,
        })
    }

    /// The element's `type` discriminant.
    pub fn type_name(&self) -> &str {
        &self.type_name
    }

    /// The classified view of this element.
    pub fn kind(&self) -> &ElementKind {
        &self.kind
    }

    /// All raw fields, including `type`.
    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// `true` for error markers that block rendering.
    pub fn is_fatal_error(&self) -> bool {
        matches!(self.kind, ElementKind::ErrorMarker { fatal: true, .. })
    }
}

fn classify(type_name: &str, fields: &Map<String, Value>) -> ElementKind {
    match type_name {
        "pcb_board" => {
            let size = match (positive(fields.get("width")), positive(fields.get("height"))) {
                (Some(width), Some(height)) => Some(PlanarSize { width, height }),
                _ => None,
            };
            ElementKind::Board { size }
        }
        "pcb_component" => {
            let nested = fields.get("size").and_then(Value::as_object);
            let width = positive(fields.get("width"))
                .or_else(|| nested.and_then(|s| positive(s.get("width"))));
            let height = positive(fields.get("height"))
                .or_else(|| nested.and_then(|s| positive(s.get("height"))));
            let size = width.map(|width| PlanarSize {
                width,
                height: height.unwrap_or(0.0),
            });
            ElementKind::Component { size }
        }
        "simulation_experiment" => ElementKind::SimulationExperiment {
            id: fields
                .get("simulation_experiment_id")
                .and_then(Value::as_str)
                .map(str::to_owned),
        },
        t if t.ends_with("_error") || t.ends_with("_warning") => ElementKind::ErrorMarker {
            fatal: t.ends_with("_error") && !NON_FATAL_ERROR_KINDS.contains(&t),
            message: fields
                .get("message")
                .and_then(Value::as_str)
                .map(str::to_owned),
        },
        _ => ElementKind::Other,
    }
}

fn positive(v: Option<&Value>) -> Option<f64> {
    v.and_then(Value::as_f64).filter(|x| x.is_finite() && *x > 0.0)
}

impl Serialize for CircuitElement {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.fields.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for CircuitElement {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let fields = Map::<String, Value>::deserialize(deserializer)?;
        Self::from_fields(fields).map_err(serde::de::Error::custom)
    }
}

/// A fatal error element found in a document.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct FatalError {
    /// Element `type`.
    pub kind: String,
    /// Element message, or the type name when the element carries none.
    pub message: String,
}

/// An evaluated circuit: an ordered sequence of tagged elements.
///
/// Documents are immutable once built and are treated as pass-through data; only board/component
/// sizing, simulation experiments and error markers are ever interpreted.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CircuitDocument {
    elements: Vec<CircuitElement>,
}

impl CircuitDocument {
    /// Build from already-classified elements.
    pub fn new(elements: Vec<CircuitElement>) -> Self {
        Self { elements }
    }

    /// Parse a JSON array of elements.
    pub fn from_json_str(s: &str) -> RenderResult<Self> {
        serde_json::from_str(s)
            .map_err(|e| RenderError::input(format!("invalid circuit document JSON: {e}")))
    }

    /// Convert an already-parsed JSON value.
    pub fn from_value(v: Value) -> RenderResult<Self> {
        if !v.is_array() {
            return Err(RenderError::input("circuit document must be a JSON array"));
        }
        serde_json::from_value(v)
            .map_err(|e| RenderError::input(format!("invalid circuit document: {e}")))
    }

    /// Serialize back to JSON exactly as the elements were supplied.
    pub fn to_json_string(&self) -> RenderResult<String> {
        Ok(serde_json::to_string(self)?)
    }

    /// Elements in document order.
    pub fn elements(&self) -> &[CircuitElement] {
        &self.elements
    }

    /// Element count.
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// `true` when the document has no elements.
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// First board with explicit positive width and height.
    pub fn board_dimensions(&self) -> Option<PlanarSize> {
        self.elements.iter().find_map(|el| match el.kind() {
            ElementKind::Board { size } => *size,
            _ => None,
        })
    }

    /// First component carrying a usable size.
    pub fn first_sized_component(&self) -> Option<PlanarSize> {
        self.elements.iter().find_map(|el| match el.kind() {
            ElementKind::Component { size } => *size,
            _ => None,
        })
    }

    /// Id of the first `simulation_experiment` element that has one.
    pub fn first_simulation_experiment_id(&self) -> Option<&str> {
        self.elements.iter().find_map(|el| match el.kind() {
            ElementKind::SimulationExperiment { id } => id.as_deref(),
            _ => None,
        })
    }

    /// All error elements that block rendering, in document order.
    pub fn fatal_errors(&self) -> Vec<FatalError> {
        self.elements
            .iter()
            .filter_map(|el| match el.kind() {
                ElementKind::ErrorMarker {
                    fatal: true,
                    message,
                } => Some(FatalError {
                    kind: el.type_name().to_owned(),
                    message: message.clone().unwrap_or_else(|| el.type_name().to_owned()),
                }),
                _ => None,
            })
            .collect()
    }

    /// Fail with [`RenderError::CircuitValidation`] when any fatal error element is present.
    pub fn ensure_renderable(&self) -> RenderResult<()> {
        let errors = self.fatal_errors();
        if errors.is_empty() {
            return Ok(());
        }
        let joined = errors
            .iter()
            .map(|e| e.message.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        Err(RenderError::circuit_validation(joined))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/circuit/document.rs"]
mod tests;
