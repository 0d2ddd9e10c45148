//! Format dispatch: turning a byte source into a [`Codec`].

use std::path::PathBuf;
use std::sync::Arc;

use log::{debug, warn};

use crate::{Codec, CodecCache, CodecError, CodecRegistry, ImageSource, Limits};

/// Codec construction request.
///
/// Sniffs the source's signature, asks the first matching registered
/// decoder to parse the header, falls back to the registry's native decoder
/// when nothing matches or the matched decoder fails, and validates the
/// resulting dimensions. Path sources go through the cache when one is set.
///
/// # Example
///
/// ```no_run
/// use imagecodec::DecodeRequest;
///
/// let codec = DecodeRequest::from_path("photo.jpg")?.build()?;
/// println!("{}x{} {:?}", codec.width(), codec.height(), codec.orientation());
/// # Ok::<(), imagecodec::CodecError>(())
/// ```
pub struct DecodeRequest<'a> {
    source: ImageSource,
    limits: Option<&'a Limits>,
    registry: Option<&'a CodecRegistry>,
    cache: Option<&'a CodecCache>,
}

impl<'a> DecodeRequest<'a> {
    pub fn new(source: ImageSource) -> Self {
        Self {
            source,
            limits: None,
            registry: None,
            cache: None,
        }
    }

    /// Request for a file; fails on an empty path.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, CodecError> {
        Ok(Self::new(ImageSource::from_path(path)?))
    }

    /// Request for an in-memory blob; fails on an empty blob.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Result<Self, CodecError> {
        Ok(Self::new(ImageSource::from_bytes(bytes)?))
    }

    /// Set resource limits.
    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Set a codec registry to control which formats are tried.
    pub fn with_registry(mut self, registry: &'a CodecRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    /// Consult and populate `cache` for path sources.
    pub fn with_cache(mut self, cache: &'a CodecCache) -> Self {
        self.cache = Some(cache);
        self
    }

    /// Construct and validate the codec.
    pub fn build(self) -> Result<Arc<Codec>, CodecError> {
        let cache = self.cache.zip(self.source.path());
        if let Some((cache, path)) = cache {
            if let Some(hit) = cache.get(path) {
                return Ok(hit);
            }
        }

        let default_registry;
        let registry = match self.registry {
            Some(registry) => registry,
            None => {
                default_registry = CodecRegistry::all();
                &default_registry
            }
        };
        let default_limits = Limits::default();
        let limits = self.limits.unwrap_or(&default_limits);

        let codec = self.construct(registry)?;
        limits
            .check_dimensions(codec.width(), codec.height())
            .inspect_err(|_| {
                warn!(
                    "rejecting {:?} image of {}x{}",
                    codec.format(),
                    codec.width(),
                    codec.height()
                )
            })?;

        let codec = Arc::new(codec.with_limits(limits));
        match cache {
            Some((cache, path)) => Ok(cache.insert(path, codec)),
            None => Ok(codec),
        }
    }

    /// Signature cascade plus native fallback.
    fn construct(&self, registry: &CodecRegistry) -> Result<Codec, CodecError> {
        let prefix = self.source.signature()?;

        let mut failure = CodecError::UnrecognizedFormat;
        match registry.decoders().find(|c| c.is_format(&prefix)) {
            Some(driver) => match Codec::open(driver.clone(), self.source.clone()) {
                Ok(codec) => {
                    debug!("dispatch: {:?} decoder accepted source", driver.format());
                    return Ok(codec);
                }
                Err(err) => {
                    debug!("dispatch: {:?} decoder rejected source: {err}", driver.format());
                    failure = err;
                }
            },
            None => {
                if let Some(format) = crate::ImageFormat::detect(&prefix) {
                    if !registry.can_decode(format) {
                        debug!("dispatch: {format:?} is not enabled");
                        failure = CodecError::DisabledFormat(format);
                    }
                }
            }
        }

        let Some(native) = registry.native_fallback() else {
            return Err(failure);
        };
        debug!("dispatch: trying native decoder");
        Codec::open(native.clone(), self.source.clone()).map_err(|err| {
            debug!("dispatch: native decoder failed: {err}");
            failure
        })
    }
}
