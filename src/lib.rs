//! circuit-render turns circuit descriptions into images.
//!
//! A request names a circuit (pre-evaluated document, bundle of source files, or compressed
//! code), a view (`pcb`, `schematic`, `assembly`, `pinout`, `3d`, `schematic-simulation`) and an
//! encoding (SVG, PNG, or the raw document). The crate resolves the circuit, renders it through
//! pluggable converters, and turns every failure into an artifact a client can display.
//!
//! # Pipeline overview
//!
//! 1. **Resolve**: `CircuitSource -> CircuitDocument` through an [`EvaluationSandbox`] with a
//!    deadline ([`InputResolver`]).
//! 2. **Validate**: documents carrying fatal `*_error` elements are rejected before any converter
//!    runs.
//! 3. **Render**: 2D views go through a [`ViewConverter`]; the 3D view goes through
//!    [`ThreeDPipeline`] (GLB, camera framing, raster, vectorization with a raster-embed fallback),
//!    with GLB scenes and rasters held in bounded FIFO [`ArtifactCache`]s.
//! 4. **Format errors**: [`ErrorArtifactFormatter`] draws failures as SVG/PNG error cards or JSON
//!    bodies.
//!
//! The crate does no circuit evaluation, layout or 3D rendering of its own; those are supplied by
//! the caller as trait objects in [`Collaborators`]. SVG rasterization ([`ResvgRasterizer`]) and
//! raster tracing ([`PaletteVectorizer`]) are built in.
#![forbid(unsafe_code)]
#![deny(missing_docs)]

mod artifact;
mod cache;
mod camera;
mod circuit;
mod config;
mod convert;
mod error_artifact;
mod foundation;
mod input;
mod pipeline;
mod request;

pub use artifact::{Artifact, ArtifactBody, CONTENT_TYPE_JSON, CONTENT_TYPE_PNG, CONTENT_TYPE_SVG};
pub use cache::{
    ArtifactCache, ArtifactCaches, CacheKey, CacheStats, DEFAULT_CACHE_CAPACITY, DocumentKey,
    RasterParams, document_key,
};
pub use camera::{
    CameraFrame, DEFAULT_SCENE_DIM, HEIGHT_FACTOR, MIN_ZOOM, OFFSET_FACTOR, ZOOM_PIVOT,
    frame_camera, framing_zoom, scene_max_dim,
};
pub use circuit::document::{
    CircuitDocument, CircuitElement, ElementKind, FatalError, MIN_COMPONENT_DIM, PlanarSize,
};
pub use config::PipelineOpts;
pub use convert::{
    Collaborators, GridStyle, PaletteVectorizer, RasterizeOptions, ResvgRasterizer,
    SceneConverter, SceneRasterizer, SceneRenderOptions, SvgRasterizer, SvgView, VectorizeParams,
    Vectorizer, ViewConverter, ViewOptions,
};
pub use convert::svg_raster::{RASTER_FONT_STACK, normalize_font_families};
pub use error_artifact::{
    ErrorArtifactFormatter, MAX_LINES, WRAP_WIDTH, error_svg, strip_label_prefix, wrap_message,
};
pub use foundation::color::{BackgroundSpec, DEFAULT_BACKGROUND_HEX, Rgb8, parse_hex_color};
pub use foundation::error::{RenderError, RenderResult};
pub use input::{
    CircuitSource, DEFAULT_ENTRYPOINT, DEFAULT_EVALUATION_TIMEOUT, EvaluationJob,
    EvaluationSandbox, FileBundle, InputResolver, decode_compressed_bundle,
    decode_compressed_source, encode_bundle_to_hash, encode_compressed_source,
    parse_bundle_param, parse_bundle_value,
};
pub use pipeline::{RasterDefaults, RenderDispatcher, ThreeDPipeline};
pub use request::{
    DEFAULT_ZOOM_MULTIPLIER, Encoding, RenderRequest, SimulationOptions, View, normalize_zoom,
    parse_graph_ids, parse_positive_int, positive_int,
};
