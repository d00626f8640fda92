use std::fmt::Write as _;

use serde::{Deserialize, Serialize};

use crate::{
    convert::{
        Vectorizer, png,
        trace::{self, TraceThresholds},
    },
    foundation::{
        color::{Rgb8, clamp01},
        error::{RenderError, RenderResult},
    },
};

/// Tracing parameters for [`PaletteVectorizer`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VectorizeParams {
    /// Number of palette colors the raster is quantized to.
    pub palette_size: usize,
    /// Palette refinement passes.
    pub quant_cycles: u32,
    /// Colors covering less than this fraction of opaque pixels are merged into their nearest
    /// neighbor.
    pub min_color_ratio: f64,
    /// Boundary loops with fewer pixel edges than this are dropped as speckles.
    pub path_omit: usize,
    /// Turn in degrees at or above which a traced boundary point is kept as a corner.
    pub corner_threshold: f64,
    /// Boundary points closer than this many pixels to the current segment start do not bend
    /// the segment.
    pub length_threshold: f64,
    /// Largest angle in degrees between a straight segment and the boundary points it replaces.
    pub splice_threshold: f64,
    /// Rasters are downsampled so their larger side does not exceed this.
    pub max_dimension: u32,
    /// Pixels with alpha below this are treated as background.
    pub alpha_threshold: u8,
    /// Color blended under semi-transparent pixels before tracing.
    pub background_color: Rgb8,
    /// Opacity of `background_color`; `0` disables blending.
    pub background_opacity: f64,
}

impl Default for VectorizeParams {
    fn default() -> Self {
        Self::circuit_profile()
    }
}

impl VectorizeParams {
    /// Fixed profile tuned for rendered circuit boards.
    pub fn circuit_profile() -> Self {
        Self {
            palette_size: 8,
            quant_cycles: 2,
            min_color_ratio: 0.03,
            path_omit: 6,
            corner_threshold: 60.0,
            length_threshold: 4.0,
            splice_threshold: 12.0,
            max_dimension: 320,
            alpha_threshold: 16,
            background_color: Rgb8::WHITE,
            background_opacity: 0.0,
        }
    }

    /// Same profile with a background blended under the raster.
    pub fn with_background(mut self, color: Rgb8, opacity: f64) -> Self {
        self.background_color = color;
        self.background_opacity = clamp01(opacity);
        self
    }
}

/// Built-in raster tracer.
///
/// Quantizes the raster to a small palette, traces the boundary of every color region and emits
/// one even-odd `<path>` per color. Staircase edges are smoothed into straight segments and
/// corners sharper than [`VectorizeParams::corner_threshold`] are kept.
#[derive(Clone, Copy, Debug, Default)]
pub struct PaletteVectorizer;

impl Vectorizer for PaletteVectorizer {
    #[tracing::instrument(skip(self, png, params), fields(png_len = png.len()))]
    fn vectorize(&self, png: &[u8], params: &VectorizeParams) -> RenderResult<String> {
        if params.palette_size == 0 {
            return Err(RenderError::vectorization("palette size must be > 0"));
        }
        let decoded = png::decode_rgba8(png)
            .map_err(|e| RenderError::vectorization(format!("decode raster: {e}")))?;
        if decoded.width == 0 || decoded.height == 0 {
            return Err(RenderError::vectorization("raster is empty"));
        }

        let (src_w, src_h) = (decoded.width, decoded.height);
        let mut img = downsample(decoded, params.max_dimension)?;
        if params.background_opacity > 0.0 {
            blend_background(
                &mut img.rgba8,
                params.background_color,
                params.background_opacity,
            );
        }

        let indexed = quantize(&img, params);
        Ok(emit_svg(&img, &indexed, src_w, src_h, params))
    }
}

fn downsample(img: png::DecodedRaster, max_dimension: u32) -> RenderResult<png::DecodedRaster> {
    let largest = img.width.max(img.height);
    if max_dimension == 0 || largest <= max_dimension {
        return Ok(img);
    }
    let ratio = max_dimension as f64 / largest as f64;
    let w = ((img.width as f64 * ratio).round() as u32).max(1);
    let h = ((img.height as f64 * ratio).round() as u32).max(1);

    let src = image::RgbaImage::from_raw(img.width, img.height, img.rgba8)
        .ok_or_else(|| RenderError::vectorization("rgba buffer does not match dimensions"))?;
    let resized = image::imageops::resize(&src, w, h, image::imageops::FilterType::Triangle);
    Ok(png::DecodedRaster {
        width: w,
        height: h,
        rgba8: resized.into_raw(),
    })
}

/// Composite `color` at `opacity` under every pixel (straight alpha, source-over).
fn blend_background(rgba: &mut [u8], color: Rgb8, opacity: f64) {
    let bg = [f64::from(color.r), f64::from(color.g), f64::from(color.b)];
    for px in rgba.chunks_exact_mut(4) {
        let alpha = f64::from(px[3]) / 255.0;
        let out_alpha = alpha + opacity * (1.0 - alpha);
        if out_alpha <= 0.0 {
            px[0] = color.r;
            px[1] = color.g;
            px[2] = color.b;
            px[3] = 0;
            continue;
        }
        for c in 0..3 {
            let blended = (f64::from(px[c]) * alpha + bg[c] * opacity * (1.0 - alpha)) / out_alpha;
            px[c] = blended.round().clamp(0.0, 255.0) as u8;
        }
        px[3] = (out_alpha * 255.0).round().clamp(0.0, 255.0) as u8;
    }
}

/// Quantized raster: per-pixel palette index (`None` for background) plus the palette.
#[derive(Debug)]
struct Indexed {
    palette: Vec<[u8; 3]>,
    pixels: Vec<Option<usize>>,
}

fn dist2(a: [u8; 3], b: [u8; 3]) -> u32 {
    a.iter()
        .zip(b.iter())
        .map(|(&x, &y)| {
            let d = i32::from(x) - i32::from(y);
            (d * d) as u32
        })
        .sum()
}

fn nearest(palette: &[[u8; 3]], c: [u8; 3], alive: &[bool]) -> usize {
    let mut best = 0usize;
    let mut best_d = u32::MAX;
    for (i, p) in palette.iter().enumerate() {
        if !alive[i] {
            continue;
        }
        let d = dist2(*p, c);
        if d < best_d {
            best_d = d;
            best = i;
        }
    }
    best
}

fn quantize(img: &png::DecodedRaster, params: &VectorizeParams) -> Indexed {
    let colors: Vec<Option<[u8; 3]>> = img
        .rgba8
        .chunks_exact(4)
        .map(|px| (px[3] >= params.alpha_threshold).then_some([px[0], px[1], px[2]]))
        .collect();
    let opaque: Vec<[u8; 3]> = colors.iter().flatten().copied().collect();
    if opaque.is_empty() {
        return Indexed {
            palette: Vec::new(),
            pixels: vec![None; colors.len()],
        };
    }

    // Deterministic seeding: evenly spaced samples over the opaque pixels.
    let k = params.palette_size.min(opaque.len());
    let mut palette: Vec<[u8; 3]> = (0..k).map(|i| opaque[i * opaque.len() / k]).collect();
    let mut alive = vec![true; k];

    for _ in 0..params.quant_cycles {
        let mut sums = vec![[0u64; 4]; k];
        for c in &opaque {
            let i = nearest(&palette, *c, &alive);
            sums[i][0] += u64::from(c[0]);
            sums[i][1] += u64::from(c[1]);
            sums[i][2] += u64::from(c[2]);
            sums[i][3] += 1;
        }
        for (p, s) in palette.iter_mut().zip(sums.iter()) {
            if s[3] > 0 {
                *p = [
                    (s[0] / s[3]) as u8,
                    (s[1] / s[3]) as u8,
                    (s[2] / s[3]) as u8,
                ];
            }
        }
    }

    let mut counts = vec![0usize; k];
    for c in &opaque {
        counts[nearest(&palette, *c, &alive)] += 1;
    }
    let min_count = (params.min_color_ratio.max(0.0) * opaque.len() as f64).ceil() as usize;
    let dominant = counts
        .iter()
        .enumerate()
        .max_by_key(|(i, n)| (**n, std::cmp::Reverse(*i)))
        .map_or(0, |(i, _)| i);
    for (i, n) in counts.iter().enumerate() {
        if i != dominant && (*n == 0 || *n < min_count) {
            alive[i] = false;
        }
    }

    let pixels = colors
        .iter()
        .map(|c| c.map(|c| nearest(&palette, c, &alive)))
        .collect();
    Indexed { palette, pixels }
}

fn thresholds(params: &VectorizeParams) -> TraceThresholds {
    TraceThresholds {
        corner_deg: params.corner_threshold,
        length: params.length_threshold,
        splice_deg: params.splice_threshold,
        min_edges: params.path_omit,
    }
}

fn emit_svg(
    img: &png::DecodedRaster,
    indexed: &Indexed,
    out_w: u32,
    out_h: u32,
    params: &VectorizeParams,
) -> String {
    let (w, h) = (img.width, img.height);
    let mut svg = format!(
        r#"<svg xmlns="http://www.w3.org/2000/svg" width="{out_w}" height="{out_h}" viewBox="0 0 {w} {h}">"#
    );
    let limits = thresholds(params);

    for (idx, color) in indexed.palette.iter().enumerate() {
        let mask: Vec<bool> = indexed.pixels.iter().map(|p| *p == Some(idx)).collect();
        let (count, alpha_sum) = mask
            .iter()
            .zip(img.rgba8.chunks_exact(4))
            .filter(|(inside, _)| **inside)
            .fold((0usize, 0u64), |(n, a), (_, px)| (n + 1, a + u64::from(px[3])));
        if count == 0 {
            continue;
        }

        let polygons = trace::trace_layer(&mask, w as usize, h as usize, &limits);
        if polygons.is_empty() {
            continue;
        }
        let mut d = String::new();
        for polygon in &polygons {
            trace::write_subpath(&mut d, polygon);
        }

        let alpha = alpha_sum as f64 / count as f64 / 255.0;
        let _ = write!(
            svg,
            r#"<path fill="rgb({},{},{})" fill-rule="evenodd""#,
            color[0], color[1], color[2]
        );
        if alpha < 0.999 {
            let _ = write!(svg, r#" fill-opacity="{:.3}""#, alpha);
        }
        let _ = write!(svg, r#" d="{d}"/>"#);
    }

    svg.push_str("</svg>");
    svg
}

#[cfg(test)]
#[path = "../../tests/unit/convert/vectorize.rs"]
mod tests;
