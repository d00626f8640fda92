use xxhash_rust::xxh3::Xxh3;

use crate::{
    circuit::document::CircuitDocument,
    foundation::{color::Rgb8, error::RenderResult},
};

const XXH3_SEED: u64 = 0x8b5ad4a0c7d8e9f1;

/// 128-bit content hash of a circuit document, hex-encoded.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct DocumentKey(pub(crate) String);

impl DocumentKey {
    /// Hex digest.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for DocumentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Everything besides the document that changes the pixels of a 3D raster.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct RasterParams {
    /// Output width in pixels.
    pub width: u32,
    /// Output height in pixels.
    pub height: u32,
    /// Normalized zoom multiplier.
    pub zoom: f64,
    /// Whether the ground grid is drawn.
    pub grid: bool,
    /// Background color painted by the scene rasterizer itself, if any.
    ///
    /// Backgrounds composited after rasterization (SVG output) do not belong here.
    pub baked_background: Option<Rgb8>,
}

/// Key of one [`crate::ArtifactCache`] entry.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct CacheKey(String);

impl CacheKey {
    /// Key of the GLB scene built from a document.
    pub fn scene(doc: &DocumentKey) -> Self {
        Self(format!("scene:{doc}"))
    }

    /// Key of a 3D raster of a document.
    pub fn raster(doc: &DocumentKey, params: &RasterParams) -> Self {
        let bg = params
            .baked_background
            .map_or_else(|| "none".to_owned(), |c| format!("{:02x}{:02x}{:02x}", c.r, c.g, c.b));
        Self(format!(
            "raster:{doc}:{}x{}:z{:016x}:g{}:bg{bg}",
            params.width,
            params.height,
            params.zoom.to_bits(),
            u8::from(params.grid),
        ))
    }

    /// Key text.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CacheKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Hash `doc` over its canonical JSON form.
///
/// Object keys are sorted by the round trip through `serde_json::Value`, so documents that differ
/// only in key order share a key.
pub fn document_key(doc: &CircuitDocument) -> RenderResult<DocumentKey> {
    let canonical = serde_json::to_vec(&serde_json::to_value(doc)?)?;
    let mut h = StableHasher::new();
    h.write_u64(canonical.len() as u64);
    h.write_bytes(&canonical);
    Ok(DocumentKey(format!("{:032x}", h.finish())))
}

struct StableHasher {
    inner: Xxh3,
}

impl StableHasher {
    fn new() -> Self {
        Self {
            inner: Xxh3::with_seed(XXH3_SEED),
        }
    }

    fn write_bytes(&mut self, b: &[u8]) {
        self.inner.update(b);
    }

    fn write_u64(&mut self, v: u64) {
        self.write_bytes(&v.to_le_bytes());
    }

    fn finish(self) -> u128 {
        self.inner.digest128()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/cache/key.rs"]
mod tests;
