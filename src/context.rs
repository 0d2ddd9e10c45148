//! Explicitly owned codec context.

use std::path::PathBuf;
use std::sync::Arc;

use crate::pixel::Pixmap;
use crate::{
    Codec, CodecCache, CodecError, CodecRegistry, DecodeRequest, EncodeRequest, ImageFormat,
    Limits,
};

/// Registry, path cache and limits owned together.
///
/// Whoever issues decode requests owns one of these; there is no
/// process-wide cache. Share it behind an `Arc` to give several threads the
/// same cache.
#[derive(Debug, Default)]
pub struct CodecContext {
    registry: CodecRegistry,
    cache: CodecCache,
    limits: Limits,
}

impl CodecContext {
    pub fn new(registry: CodecRegistry, limits: Limits) -> Self {
        Self {
            registry,
            cache: CodecCache::new(),
            limits,
        }
    }

    pub fn registry(&self) -> &CodecRegistry {
        &self.registry
    }

    pub fn cache(&self) -> &CodecCache {
        &self.cache
    }

    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    /// Build a codec for a file, reusing the cached one while it is alive.
    pub fn make_from_path(&self, path: impl Into<PathBuf>) -> Result<Arc<Codec>, CodecError> {
        DecodeRequest::from_path(path)?
            .with_registry(&self.registry)
            .with_limits(&self.limits)
            .with_cache(&self.cache)
            .build()
    }

    /// Build a codec for a blob. Never touches the cache.
    pub fn make_from_bytes(&self, bytes: impl Into<Arc<[u8]>>) -> Result<Arc<Codec>, CodecError> {
        DecodeRequest::from_bytes(bytes)?
            .with_registry(&self.registry)
            .with_limits(&self.limits)
            .build()
    }

    /// Encode `pixmap` as `format`; `quality` is clamped to 0..=100.
    pub fn encode(
        &self,
        pixmap: &Pixmap<'_>,
        format: ImageFormat,
        quality: i32,
    ) -> Result<Arc<[u8]>, CodecError> {
        EncodeRequest::new(format)
            .with_quality(quality)
            .with_registry(&self.registry)
            .with_limits(&self.limits)
            .encode(pixmap)
    }
}
