use std::{fs::File, io::BufReader, path::Path, path::PathBuf, time::Duration};

use serde::{Deserialize, Serialize};

use crate::{
    cache::DEFAULT_CACHE_CAPACITY,
    convert::VectorizeParams,
    foundation::error::{RenderError, RenderResult},
    input::DEFAULT_ENTRYPOINT,
};

/// Tunables for a [`crate::RenderDispatcher`].
///
/// Every field has a default, so a partial (or empty) JSON object is a valid configuration.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineOpts {
    /// GLB scene cache capacity.
    pub scene_cache_capacity: usize,
    /// 3D raster cache capacity.
    pub raster_cache_capacity: usize,
    /// Wall-clock budget for one sandbox evaluation, in milliseconds.
    pub evaluation_timeout_ms: u64,
    /// 3D raster width for PNG output when the request gives none.
    pub default_png_size: u32,
    /// 3D raster width traced for SVG output when the request gives none.
    pub svg_raster_size: u32,
    /// Entrypoint used when a bundle does not name one.
    pub default_entrypoint: String,
    /// Extra font directories for SVG rasterization.
    pub font_dirs: Vec<PathBuf>,
    /// 3D raster tracing profile. The background is always taken from the request.
    pub vectorize: VectorizeParams,
}

impl Default for PipelineOpts {
    fn default() -> Self {
        Self {
            scene_cache_capacity: DEFAULT_CACHE_CAPACITY,
            raster_cache_capacity: DEFAULT_CACHE_CAPACITY,
            evaluation_timeout_ms: 30_000,
            default_png_size: 1024,
            svg_raster_size: 1024,
            default_entrypoint: DEFAULT_ENTRYPOINT.to_owned(),
            font_dirs: Vec::new(),
            vectorize: VectorizeParams::circuit_profile(),
        }
    }
}

impl PipelineOpts {
    /// Parse options from a JSON reader.
    pub fn from_reader<R: std::io::Read>(r: R) -> RenderResult<Self> {
        let opts: Self = serde_json::from_reader(r)
            .map_err(|e| RenderError::serde(format!("parse pipeline options JSON: {e}")))?;
        opts.validate()?;
        Ok(opts)
    }

    /// Parse options from a JSON file on disk.
    pub fn from_path(path: impl AsRef<Path>) -> RenderResult<Self> {
        let path = path.as_ref();
        let f = File::open(path).map_err(|e| {
            RenderError::serde(format!("open pipeline options '{}': {e}", path.display()))
        })?;
        Self::from_reader(BufReader::new(f))
    }

    /// Reject values the pipeline cannot run with.
    pub fn validate(&self) -> RenderResult<()> {
        if self.evaluation_timeout_ms == 0 {
            return Err(RenderError::serde("evaluation_timeout_ms must be non-zero"));
        }
        if self.default_png_size == 0 || self.svg_raster_size == 0 {
            return Err(RenderError::serde(
                "default_png_size/svg_raster_size must be non-zero",
            ));
        }
        if self.default_entrypoint.trim().is_empty() {
            return Err(RenderError::serde("default_entrypoint must not be empty"));
        }
        if self.vectorize.palette_size == 0 {
            return Err(RenderError::serde("vectorize.palette_size must be non-zero"));
        }
        let v = &self.vectorize;
        for (name, value) in [
            ("corner_threshold", v.corner_threshold),
            ("length_threshold", v.length_threshold),
            ("splice_threshold", v.splice_threshold),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(RenderError::serde(format!(
                    "vectorize.{name} must be a non-negative number"
                )));
            }
        }
        Ok(())
    }

    /// Evaluation deadline as a [`Duration`].
    pub fn evaluation_timeout(&self) -> Duration {
        Duration::from_millis(self.evaluation_timeout_ms)
    }
}
