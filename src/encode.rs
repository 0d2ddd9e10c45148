//! Image encoding.

use std::sync::Arc;

use imgref::ImgRef;
use log::debug;
use rgb::Rgba;

use crate::pixel::Pixmap;
use crate::{CodecError, CodecRegistry, ImageFormat, Limits};

/// Quality used when none is set.
pub const DEFAULT_QUALITY: u8 = 100;

/// Image encode request builder.
///
/// Quality is clamped to 0..=100, never rejected. Lossless formats ignore it.
///
/// # Example
///
/// ```no_run
/// use imagecodec::{EncodeRequest, ImageFormat};
/// use imgref::ImgVec;
/// use rgb::Rgba;
///
/// let pixels = ImgVec::new(vec![Rgba { r: 0u8, g: 0, b: 0, a: 255 }; 100 * 100], 100, 100);
/// let jpeg = EncodeRequest::new(ImageFormat::Jpeg)
///     .with_quality(85)
///     .encode_rgba8(pixels.as_ref())?;
/// # Ok::<(), imagecodec::CodecError>(())
/// ```
pub struct EncodeRequest<'a> {
    format: ImageFormat,
    quality: u8,
    limits: Option<&'a Limits>,
    registry: Option<&'a CodecRegistry>,
}

impl<'a> EncodeRequest<'a> {
    /// Encode to a specific format.
    pub fn new(format: ImageFormat) -> Self {
        Self {
            format,
            quality: DEFAULT_QUALITY,
            limits: None,
            registry: None,
        }
    }

    /// Set quality; values outside 0..=100 are clamped.
    pub fn with_quality(mut self, quality: i32) -> Self {
        self.quality = quality.clamp(0, 100) as u8;
        self
    }

    /// Set resource limits.
    pub fn with_limits(mut self, limits: &'a Limits) -> Self {
        self.limits = Some(limits);
        self
    }

    /// Set a codec registry to control which formats are enabled.
    pub fn with_registry(mut self, registry: &'a CodecRegistry) -> Self {
        self.registry = Some(registry);
        self
    }

    pub fn format(&self) -> ImageFormat {
        self.format
    }

    /// Effective (clamped) quality.
    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Compress `pixmap` into a new immutable blob.
    pub fn encode(self, pixmap: &Pixmap<'_>) -> Result<Arc<[u8]>, CodecError> {
        if pixmap.is_empty() {
            return Err(CodecError::InvalidInput("empty source pixmap".into()));
        }
        if let Some(limits) = self.limits {
            limits.check_dimensions(pixmap.width(), pixmap.height())?;
        }

        let default_registry;
        let registry = match self.registry {
            Some(registry) => registry,
            None => {
                default_registry = CodecRegistry::all();
                &default_registry
            }
        };
        let encoder = registry.encoder(self.format)?;
        debug!(
            "encoding {}x{} {:?} as {:?} at quality {}",
            pixmap.width(),
            pixmap.height(),
            pixmap.info().color_type(),
            self.format,
            self.quality
        );
        let data = encoder.encode(pixmap, self.quality)?;
        Ok(data.into())
    }

    /// Encode unpremultiplied RGBA8 pixels.
    pub fn encode_rgba8(self, img: ImgRef<'_, Rgba<u8>>) -> Result<Arc<[u8]>, CodecError> {
        let pixmap = Pixmap::from_rgba_img(img)?;
        self.encode(&pixmap)
    }
}
