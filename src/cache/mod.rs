pub(crate) mod artifact;
pub(crate) mod key;

pub use artifact::{ArtifactCache, ArtifactCaches, CacheStats, DEFAULT_CACHE_CAPACITY};
pub use key::{CacheKey, DocumentKey, RasterParams, document_key};
