use std::{
    path::{Path, PathBuf},
    sync::{Arc, LazyLock},
};

use anyhow::Context;
use regex::Regex;

use crate::{
    convert::{SvgRasterizer, png},
    foundation::error::{RenderError, RenderResult},
};

/// Font stack substituted into every `font-family` attribute before rasterizing.
///
/// Per-view converters emit browser font names that are rarely installed on render hosts.
pub const RASTER_FONT_STACK: &str = "DejaVu Sans, Liberation Sans, FreeSans, Arial, sans-serif";

/// Density at which one SVG user unit maps to one pixel.
const BASE_DENSITY: f32 = 72.0;

// Avoid pathological allocations from hostile width/height/density parameters.
const MAX_DIM: u32 = 16_384;

static FONT_FAMILY_ATTR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"font-family="[^"]*""#).expect("static regex"));

/// Output sizing for SVG rasterization.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RasterizeOptions {
    /// Output width in pixels.
    pub width: Option<u32>,
    /// Output height in pixels.
    pub height: Option<u32>,
    /// Rendering density in DPI; `72` renders at the SVG's native size.
    pub density: Option<u32>,
}

/// Placement of the SVG inside the output canvas.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct RasterGeometry {
    pub(crate) canvas_w: u32,
    pub(crate) canvas_h: u32,
    pub(crate) scale: f32,
    pub(crate) offset_x: f32,
    pub(crate) offset_y: f32,
}

/// Compute the output canvas and transform for an SVG of native size `native_w x native_h`.
///
/// With both dimensions the SVG is fit inside with "contain" semantics and centered on a
/// transparent canvas. With one dimension the other follows the aspect ratio. With neither, the
/// native size is scaled by `density / 72`.
pub(crate) fn raster_geometry(
    native_w: f32,
    native_h: f32,
    opts: &RasterizeOptions,
) -> RenderResult<RasterGeometry> {
    if !native_w.is_finite() || !native_h.is_finite() || native_w <= 0.0 || native_h <= 0.0 {
        return Err(RenderError::conversion("svg has invalid width/height"));
    }

    fn to_px(v: f32) -> u32 {
        (v.round() as u32).max(1)
    }

    let geom = match (opts.width, opts.height) {
        (Some(w), Some(h)) => {
            let scale = (w as f32 / native_w).min(h as f32 / native_h);
            RasterGeometry {
                canvas_w: w,
                canvas_h: h,
                scale,
                offset_x: (w as f32 - native_w * scale) / 2.0,
                offset_y: (h as f32 - native_h * scale) / 2.0,
            }
        }
        (Some(w), None) => {
            let scale = w as f32 / native_w;
            RasterGeometry {
                canvas_w: w,
                canvas_h: to_px(native_h * scale),
                scale,
                offset_x: 0.0,
                offset_y: 0.0,
            }
        }
        (None, Some(h)) => {
            let scale = h as f32 / native_h;
            RasterGeometry {
                canvas_w: to_px(native_w * scale),
                canvas_h: h,
                scale,
                offset_x: 0.0,
                offset_y: 0.0,
            }
        }
        (None, None) => {
            let scale = opts
                .density
                .filter(|d| *d > 0)
                .map_or(1.0, |d| d as f32 / BASE_DENSITY);
            RasterGeometry {
                canvas_w: (native_w * scale).ceil().max(1.0) as u32,
                canvas_h: (native_h * scale).ceil().max(1.0) as u32,
                scale,
                offset_x: 0.0,
                offset_y: 0.0,
            }
        }
    };

    if geom.canvas_w == 0 || geom.canvas_h == 0 {
        return Err(RenderError::conversion("raster size must be non-zero"));
    }
    if geom.canvas_w > MAX_DIM || geom.canvas_h > MAX_DIM {
        return Err(RenderError::conversion(format!(
            "svg raster size too large: {}x{} (max {MAX_DIM}x{MAX_DIM})",
            geom.canvas_w, geom.canvas_h
        )));
    }
    Ok(geom)
}

/// Replace every `font-family="..."` attribute with [`RASTER_FONT_STACK`].
pub fn normalize_font_families(svg: &str) -> String {
    FONT_FAMILY_ATTR
        .replace_all(svg, format!(r#"font-family="{RASTER_FONT_STACK}""#).as_str())
        .into_owned()
}

/// SVG to PNG rasterizer backed by `usvg` + `resvg`.
#[derive(Clone)]
pub struct ResvgRasterizer {
    fontdb: Arc<usvg::fontdb::Database>,
}

impl std::fmt::Debug for ResvgRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResvgRasterizer")
            .field("faces", &self.fontdb.len())
            .finish()
    }
}

impl Default for ResvgRasterizer {
    fn default() -> Self {
        Self::new(&[])
    }
}

impl ResvgRasterizer {
    /// Build a rasterizer with system fonts plus any `.ttf`/`.otf`/`.ttc` files in `font_dirs`.
    pub fn new(font_dirs: &[PathBuf]) -> Self {
        Self {
            fontdb: build_fontdb(font_dirs),
        }
    }

    /// Build a rasterizer sharing an existing font database.
    pub fn with_fontdb(fontdb: Arc<usvg::fontdb::Database>) -> Self {
        Self { fontdb }
    }

    fn parse(&self, svg: &str) -> RenderResult<usvg::Tree> {
        let opts = usvg::Options {
            fontdb: self.fontdb.clone(),
            ..Default::default()
        };
        let tree = usvg::Tree::from_str(svg, &opts).context("parse svg tree")?;
        Ok(tree)
    }
}

impl SvgRasterizer for ResvgRasterizer {
    #[tracing::instrument(skip(self, svg), fields(svg_len = svg.len()))]
    fn rasterize(&self, svg: &str, opts: &RasterizeOptions) -> RenderResult<Vec<u8>> {
        let svg = normalize_font_families(svg);
        let tree = self.parse(&svg)?;
        let size = tree.size();
        let geom = raster_geometry(size.width(), size.height(), opts)?;

        let mut pixmap = resvg::tiny_skia::Pixmap::new(geom.canvas_w, geom.canvas_h)
            .ok_or_else(|| RenderError::conversion("failed to allocate svg pixmap"))?;
        let xform = resvg::tiny_skia::Transform::from_row(
            geom.scale,
            0.0,
            0.0,
            geom.scale,
            geom.offset_x,
            geom.offset_y,
        );
        resvg::render(&tree, xform, &mut pixmap.as_mut());

        let mut rgba = pixmap.take();
        png::demultiply_rgba8_in_place(&mut rgba);
        png::encode_rgba8(geom.canvas_w, geom.canvas_h, rgba)
    }
}

fn build_fontdb(font_dirs: &[PathBuf]) -> Arc<usvg::fontdb::Database> {
    let mut db = usvg::fontdb::Database::new();
    db.load_system_fonts();
    for dir in font_dirs {
        load_fonts_from_dir(&mut db, dir);
    }
    tracing::debug!(faces = db.len(), "loaded raster font database");
    Arc::new(db)
}

fn load_fonts_from_dir(db: &mut usvg::fontdb::Database, dir: &Path) {
    let Ok(rd) = std::fs::read_dir(dir) else {
        tracing::warn!(dir = %dir.display(), "font directory not readable");
        return;
    };

    for entry in rd.flatten() {
        let path = entry.path();
        if !path.is_file() {
            continue;
        }
        let Some(ext) = path.extension().and_then(|s| s.to_str()) else {
            continue;
        };
        let ext = ext.to_ascii_lowercase();
        if ext != "ttf" && ext != "otf" && ext != "ttc" {
            continue;
        }
        let _ = db.load_font_file(&path);
    }
}

#[cfg(test)]
#[path = "../../tests/unit/convert/svg_raster.rs"]
mod tests;
