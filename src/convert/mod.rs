//! Collaborator contracts at the edge of the pipeline.
//!
//! The pipeline core never draws circuits or 3D scenes itself. Each expensive conversion is a
//! trait object supplied by the caller; the crate ships implementations only for the two
//! conversions it can do on its own (SVG rasterization and raster vectorization).

use std::sync::Arc;

use crate::{
    camera::CameraFrame, circuit::document::CircuitDocument, foundation::error::RenderResult,
};

pub(crate) mod png;
pub(crate) mod svg_raster;
pub(crate) mod trace;
pub(crate) mod vectorize;

pub use svg_raster::{RasterizeOptions, ResvgRasterizer};
pub use vectorize::{PaletteVectorizer, VectorizeParams};

/// The 2D views served by per-view SVG converters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SvgView {
    /// PCB layout.
    Pcb,
    /// Schematic.
    Schematic,
    /// Assembly drawing.
    Assembly,
    /// Pinout diagram.
    Pinout,
    /// Schematic with simulation overlay.
    SchematicSimulation,
}

/// Options forwarded to a [`ViewConverter`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ViewOptions {
    /// Render the solder mask layer (PCB only).
    pub show_solder_mask: Option<bool>,
    /// Resolved experiment id (schematic simulation only).
    pub simulation_experiment_id: Option<String>,
    /// Transient voltage graphs to overlay (schematic simulation only).
    pub simulation_transient_voltage_graph_ids: Vec<String>,
    /// Fraction of the output height given to the schematic (schematic simulation only).
    pub schematic_height_ratio: Option<f64>,
}

/// Per-view circuit document to SVG conversion.
pub trait ViewConverter: Send + Sync {
    /// Draw `view` of `doc` as SVG text.
    fn convert(
        &self,
        view: SvgView,
        doc: &CircuitDocument,
        opts: &ViewOptions,
    ) -> RenderResult<String>;
}

/// Circuit document to binary GLB scene conversion.
pub trait SceneConverter: Send + Sync {
    /// Build a GLB scene for `doc`.
    fn to_glb(&self, doc: &CircuitDocument) -> RenderResult<Vec<u8>>;
}

/// Infinite ground grid drawn under the 3D scene.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridStyle {
    /// Minor line color, linear RGB `0..=1`.
    pub grid_color: [f32; 3],
    /// Section line color, linear RGB `0..=1`.
    pub section_color: [f32; 3],
    /// Vertical offset of the grid plane.
    pub offset_y: f32,
}

impl Default for GridStyle {
    fn default() -> Self {
        Self {
            grid_color: [0.8, 0.8, 0.8],
            section_color: [0.7, 0.7, 0.7],
            offset_y: 0.0,
        }
    }
}

/// Options forwarded to a [`SceneRasterizer`].
#[derive(Clone, Debug, PartialEq)]
pub struct SceneRenderOptions {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Solid background, linear RGB `0..=1`. `None` renders transparent.
    pub background: Option<[f64; 3]>,
    /// Camera placement.
    pub camera: CameraFrame,
    /// Ground grid, if any.
    pub grid: Option<GridStyle>,
}

/// GLB scene to PNG raster rendering.
pub trait SceneRasterizer: Send + Sync {
    /// Render `glb` and return encoded PNG bytes.
    fn render(&self, glb: &[u8], opts: &SceneRenderOptions) -> RenderResult<Vec<u8>>;
}

/// PNG raster to SVG tracing.
pub trait Vectorizer: Send + Sync {
    /// Trace `png` into SVG text.
    fn vectorize(&self, png: &[u8], params: &VectorizeParams) -> RenderResult<String>;
}

/// SVG to PNG rasterization.
pub trait SvgRasterizer: Send + Sync {
    /// Rasterize `svg` and return encoded PNG bytes.
    fn rasterize(&self, svg: &str, opts: &RasterizeOptions) -> RenderResult<Vec<u8>>;
}

/// The full set of collaborators a [`crate::RenderDispatcher`] needs.
#[derive(Clone)]
pub struct Collaborators {
    /// Per-view SVG drawing.
    pub views: Arc<dyn ViewConverter>,
    /// Document to GLB.
    pub scenes: Arc<dyn SceneConverter>,
    /// GLB to PNG.
    pub scene_rasterizer: Arc<dyn SceneRasterizer>,
    /// PNG to SVG.
    pub vectorizer: Arc<dyn Vectorizer>,
    /// SVG to PNG.
    pub svg_rasterizer: Arc<dyn SvgRasterizer>,
}

impl Collaborators {
    /// Use the caller's view, scene and 3D raster collaborators together with the built-in
    /// [`PaletteVectorizer`] and [`ResvgRasterizer`].
    pub fn with_builtin_imaging(
        views: Arc<dyn ViewConverter>,
        scenes: Arc<dyn SceneConverter>,
        scene_rasterizer: Arc<dyn SceneRasterizer>,
        font_dirs: &[std::path::PathBuf],
    ) -> Self {
        Self {
            views,
            scenes,
            scene_rasterizer,
            vectorizer: Arc::new(PaletteVectorizer),
            svg_rasterizer: Arc::new(ResvgRasterizer::new(font_dirs)),
        }
    }
}

impl std::fmt::Debug for Collaborators {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Collaborators").finish_non_exhaustive()
    }
}
