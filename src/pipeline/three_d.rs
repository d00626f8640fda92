use std::{
    borrow::Cow,
    sync::{Arc, LazyLock},
};

use base64::Engine as _;
use regex::Regex;

use crate::{
    artifact::Artifact,
    cache::{ArtifactCaches, CacheKey, DocumentKey, RasterParams, document_key},
    camera::frame_camera,
    circuit::document::CircuitDocument,
    convert::{
        GridStyle, SceneConverter, SceneRasterizer, SceneRenderOptions, VectorizeParams,
        Vectorizer, png,
    },
    foundation::{
        color::BackgroundSpec,
        error::{RenderError, RenderResult},
    },
    request::{Encoding, RenderRequest},
};

static SVG_OPEN_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)(<svg[^>]*>)").expect("static regex"));
static NEWLINE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s*\n\s*").expect("static regex"));
static INTER_TAG_SPACE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r">\s+<").expect("static regex"));

/// Raster sizes used when a 3D request gives none.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RasterDefaults {
    /// Width of PNG output.
    pub png_size: u32,
    /// Width of the raster traced for SVG output.
    pub svg_raster_size: u32,
}

impl Default for RasterDefaults {
    fn default() -> Self {
        Self {
            png_size: 1024,
            svg_raster_size: 1024,
        }
    }
}

/// Document to GLB to raster to (optionally) vector, with both intermediate artifacts cached.
#[derive(Clone)]
pub struct ThreeDPipeline {
    scenes: Arc<dyn SceneConverter>,
    rasterizer: Arc<dyn SceneRasterizer>,
    vectorizer: Arc<dyn Vectorizer>,
    caches: Arc<ArtifactCaches>,
    defaults: RasterDefaults,
    profile: VectorizeParams,
}

impl std::fmt::Debug for ThreeDPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ThreeDPipeline")
            .field("caches", &self.caches)
            .field("defaults", &self.defaults)
            .finish_non_exhaustive()
    }
}

impl ThreeDPipeline {
    /// Assemble a pipeline around shared caches.
    pub fn new(
        scenes: Arc<dyn SceneConverter>,
        rasterizer: Arc<dyn SceneRasterizer>,
        vectorizer: Arc<dyn Vectorizer>,
        caches: Arc<ArtifactCaches>,
    ) -> Self {
        Self {
            scenes,
            rasterizer,
            vectorizer,
            caches,
            defaults: RasterDefaults::default(),
            profile: VectorizeParams::circuit_profile(),
        }
    }

    /// Override the default raster sizes.
    pub fn with_defaults(mut self, defaults: RasterDefaults) -> Self {
        self.defaults = defaults;
        self
    }

    /// Override the tracing profile. The background always comes from the request.
    pub fn with_profile(mut self, profile: VectorizeParams) -> Self {
        self.profile = profile;
        self
    }

    /// The caches this pipeline reads and fills.
    pub fn caches(&self) -> &ArtifactCaches {
        &self.caches
    }

    /// Render `doc` in 3D per `req`.
    #[tracing::instrument(skip(self, doc, req), fields(encoding = req.encoding.as_str()))]
    pub fn render(&self, doc: &CircuitDocument, req: &RenderRequest) -> RenderResult<Artifact> {
        if req.encoding == Encoding::RawDocument {
            return Ok(Artifact::json(doc.to_json_string()?, 200));
        }

        let doc_key = document_key(doc)?;
        let glb = self.scene(doc, &doc_key)?;
        let raster = self.raster(doc, &doc_key, &glb, req)?;

        match req.encoding {
            Encoding::Png => Ok(Artifact::png(raster)),
            _ => Ok(Artifact::svg(self.vector_or_embed(&raster, &req.background)?)),
        }
    }

    fn scene(&self, doc: &CircuitDocument, doc_key: &DocumentKey) -> RenderResult<Vec<u8>> {
        let key = CacheKey::scene(doc_key);
        if let Some(glb) = self.caches.scenes.get(&key) {
            return Ok(glb);
        }
        let glb = self.scenes.to_glb(doc)?;
        if glb.is_empty() {
            return Err(RenderError::conversion(
                "GLB conversion did not return binary data",
            ));
        }
        self.caches.scenes.put(key, &glb);
        Ok(glb)
    }

    fn raster_params(&self, req: &RenderRequest) -> RasterParams {
        let default_width = match req.encoding {
            Encoding::Png => self.defaults.png_size,
            _ => self.defaults.svg_raster_size,
        };
        let width = req.width.unwrap_or(default_width);
        // SVG output composites its background after tracing; only PNG bakes it in.
        let baked_background = (req.encoding == Encoding::Png && req.background.is_opaque())
            .then_some(req.background.rgb);
        RasterParams {
            width,
            height: req.height.unwrap_or(width),
            zoom: req.zoom_multiplier,
            grid: req.show_infinite_grid,
            baked_background,
        }
    }

    fn raster(
        &self,
        doc: &CircuitDocument,
        doc_key: &DocumentKey,
        glb: &[u8],
        req: &RenderRequest,
    ) -> RenderResult<Vec<u8>> {
        let params = self.raster_params(req);
        let key = CacheKey::raster(doc_key, &params);
        if let Some(png) = self.caches.rasters.get(&key) {
            return Ok(png);
        }

        let opts = SceneRenderOptions {
            width: params.width,
            height: params.height,
            background: params.baked_background.map(|c| c.to_unit()),
            camera: frame_camera(doc, params.zoom),
            grid: params.grid.then(GridStyle::default),
        };
        let png = self.rasterizer.render(glb, &opts)?;
        if png.is_empty() {
            return Err(RenderError::conversion("3D rasterizer returned no data"));
        }
        self.caches.rasters.put(key, &png);
        Ok(png)
    }

    fn vector_or_embed(&self, raster: &[u8], bg: &BackgroundSpec) -> RenderResult<String> {
        match self.vectorize(raster, bg) {
            Ok(svg) => Ok(svg),
            Err(e) => {
                tracing::warn!(error = %e, "vectorization failed, embedding raster");
                embed_raster(raster, bg)
            }
        }
    }

    fn vectorize(&self, raster: &[u8], bg: &BackgroundSpec) -> RenderResult<String> {
        let params = self.profile.clone().with_background(bg.rgb, bg.opacity);
        let traced = self.vectorizer.vectorize(raster, &params)?;
        if !SVG_OPEN_TAG.is_match(&traced) {
            return Err(RenderError::vectorization("vectorizer output has no <svg> root"));
        }
        Ok(compact_svg(&inject_background(&traced, bg)))
    }
}

fn background_rect(bg: &BackgroundSpec) -> String {
    if bg.is_transparent() {
        return String::new();
    }
    format!(
        r#"<rect width="100%" height="100%" fill="{}" fill-opacity="{}"/>"#,
        bg.color_hex, bg.opacity
    )
}

/// Insert the background rect right after the first `<svg ...>` tag.
pub(crate) fn inject_background<'a>(svg: &'a str, bg: &BackgroundSpec) -> Cow<'a, str> {
    let rect = background_rect(bg);
    if rect.is_empty() {
        return Cow::Borrowed(svg);
    }
    SVG_OPEN_TAG.replacen(svg, 1, |caps: &regex::Captures<'_>| format!("{}{rect}", &caps[1]))
}

/// Drop line breaks with their surrounding whitespace and whitespace between tags.
pub(crate) fn compact_svg(svg: &str) -> String {
    let svg = NEWLINE_RUN.replace_all(svg, "");
    INTER_TAG_SPACE.replace_all(&svg, "><").trim().to_owned()
}

/// Minimal SVG showing `raster` as an inline PNG at its native size.
pub(crate) fn embed_raster(raster: &[u8], bg: &BackgroundSpec) -> RenderResult<String> {
    let (w, h) = png::dimensions(raster)?;
    let data = base64::engine::general_purpose::STANDARD.encode(raster);
    Ok(format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" xmlns:xlink="http://www.w3.org/1999/xlink" width="{w}" height="{h}" viewBox="0 0 {w} {h}">{}<image width="{w}" height="{h}" href="data:image/png;base64,{data}"/></svg>"#,
        background_rect(bg)
    ))
}

#[cfg(test)]
#[path = "../../tests/unit/pipeline/three_d.rs"]
mod tests;
