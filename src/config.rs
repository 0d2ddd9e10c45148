//! Format-specific codec configuration.
//!
//! The [`CodecConfig`] struct bundles all format-specific settings into a
//! single value that [`CodecRegistry::with_config`](crate::CodecRegistry::with_config)
//! bakes into the codecs it registers.

pub use crate::color::CmykFallback;

/// JPEG decoder and encoder settings.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub struct JpegConfig {
    /// Build image-specific Huffman tables when encoding.
    pub optimize_coding: bool,
    /// Treatment of CMYK images whose embedded ICC profile is missing or unusable.
    pub cmyk_fallback: CmykFallback,
}

impl Default for JpegConfig {
    fn default() -> Self {
        Self {
            optimize_coding: true,
            cmyk_fallback: CmykFallback::default(),
        }
    }
}

impl JpegConfig {
    pub fn with_optimize_coding(mut self, optimize: bool) -> Self {
        self.optimize_coding = optimize;
        self
    }

    pub fn with_cmyk_fallback(mut self, fallback: CmykFallback) -> Self {
        self.cmyk_fallback = fallback;
        self
    }
}

/// PNG encoder settings.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct PngConfig {
    /// Trade file size for encode speed.
    pub fast_compression: bool,
}

impl PngConfig {
    pub fn with_fast_compression(mut self, fast: bool) -> Self {
        self.fast_compression = fast;
        self
    }
}

/// Format-specific configuration overrides.
///
/// # Example
///
/// ```
/// use imagecodec::config::{CmykFallback, CodecConfig, JpegConfig};
/// use imagecodec::CodecRegistry;
///
/// let jpeg = JpegConfig::default().with_cmyk_fallback(CmykFallback::Fail);
/// let config = CodecConfig::default().with_jpeg(jpeg);
/// let registry = CodecRegistry::with_config(&config);
/// # let _ = registry;
/// ```
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
#[non_exhaustive]
pub struct CodecConfig {
    pub jpeg: JpegConfig,
    pub png: PngConfig,
}

impl CodecConfig {
    /// Set JPEG configuration.
    pub fn with_jpeg(mut self, config: JpegConfig) -> Self {
        self.jpeg = config;
        self
    }

    /// Set PNG configuration.
    pub fn with_png(mut self, config: PngConfig) -> Self {
        self.png = config;
        self
    }
}
