//! Runtime codec registry.

use std::sync::Arc;

use crate::codec::FormatCodec;
use crate::config::CodecConfig;
use crate::{CodecError, ImageFormat};

/// Set of image formats represented as bitflags.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
struct FormatSet(u8);

impl FormatSet {
    const EMPTY: Self = FormatSet(0);
    const ALL: Self = FormatSet(Self::JPEG | Self::WEBP | Self::PNG | Self::NATIVE);
    const JPEG: u8 = 1 << 0;
    const WEBP: u8 = 1 << 1;
    const PNG: u8 = 1 << 2;
    const NATIVE: u8 = 1 << 3;

    fn bit(format: ImageFormat) -> u8 {
        match format {
            ImageFormat::Jpeg => Self::JPEG,
            ImageFormat::WebP => Self::WEBP,
            ImageFormat::Png => Self::PNG,
            ImageFormat::Native => Self::NATIVE,
        }
    }

    fn contains(self, format: ImageFormat) -> bool {
        (self.0 & Self::bit(format)) != 0
    }

    fn set(&mut self, format: ImageFormat, enabled: bool) {
        if enabled {
            self.0 |= Self::bit(format);
        } else {
            self.0 &= !Self::bit(format);
        }
    }
}

/// Runtime codec registry.
///
/// An ordered table of [`FormatCodec`]s: the dispatcher tries them in table
/// order and the first whose signature matches wins. Compile-time features
/// decide which built-in codecs are *registered*; the per-format toggles
/// decide which are *enabled*. An optional native fallback handles whatever
/// the table does not.
#[derive(Clone, Debug)]
pub struct CodecRegistry {
    codecs: Vec<Arc<dyn FormatCodec>>,
    native: Option<Arc<dyn FormatCodec>>,
    decode_enabled: FormatSet,
    encode_enabled: FormatSet,
}

impl CodecRegistry {
    /// All compiled-in codecs, default settings, everything enabled.
    pub fn all() -> Self {
        Self::with_config(&CodecConfig::default())
    }

    /// All compiled-in codecs registered with `config`, everything enabled.
    ///
    /// Priority order: WebP, PNG, JPEG.
    #[allow(unused_mut, unused_variables)]
    pub fn with_config(config: &CodecConfig) -> Self {
        let mut registry = Self::empty();
        #[cfg(feature = "webp")]
        {
            registry = registry.with_codec(Arc::new(crate::codecs::webp::WebpCodec::new()));
        }
        #[cfg(feature = "png")]
        {
            registry = registry.with_codec(Arc::new(crate::codecs::png::PngCodec::new(config.png)));
        }
        #[cfg(feature = "jpeg")]
        {
            registry =
                registry.with_codec(Arc::new(crate::codecs::jpeg::JpegCodec::new(config.jpeg)));
        }
        registry
    }

    /// Compiled-in codecs registered but nothing enabled; caller must opt in.
    pub fn none() -> Self {
        let mut registry = Self::all();
        registry.decode_enabled = FormatSet::EMPTY;
        registry.encode_enabled = FormatSet::EMPTY;
        registry
    }

    /// No codecs at all.
    pub fn empty() -> Self {
        Self {
            codecs: Vec::new(),
            native: None,
            decode_enabled: FormatSet::ALL,
            encode_enabled: FormatSet::ALL,
        }
    }

    /// Register `codec` at the end of the table, replacing any codec
    /// already registered for its format (which keeps its position).
    pub fn with_codec(mut self, codec: Arc<dyn FormatCodec>) -> Self {
        let format = codec.format();
        match self.codecs.iter_mut().find(|c| c.format() == format) {
            Some(slot) => *slot = codec,
            None => self.codecs.push(codec),
        }
        self
    }

    /// Decoder consulted when no registered format matches or the matched
    /// decoder fails.
    pub fn with_native_fallback(mut self, codec: Arc<dyn FormatCodec>) -> Self {
        self.native = Some(codec);
        self
    }

    /// Enable or disable decoding for a format.
    pub fn with_decode(mut self, format: ImageFormat, enabled: bool) -> Self {
        self.decode_enabled.set(format, enabled);
        self
    }

    /// Enable or disable encoding for a format.
    pub fn with_encode(mut self, format: ImageFormat, enabled: bool) -> Self {
        self.encode_enabled.set(format, enabled);
        self
    }

    fn registered(&self, format: ImageFormat) -> Option<&Arc<dyn FormatCodec>> {
        self.codecs.iter().find(|c| c.format() == format)
    }

    /// Is this format registered AND enabled for decoding?
    pub fn can_decode(&self, format: ImageFormat) -> bool {
        self.decode_enabled.contains(format) && self.registered(format).is_some()
    }

    /// Is this format registered, able to encode, AND enabled for encoding?
    pub fn can_encode(&self, format: ImageFormat) -> bool {
        self.encode_enabled.contains(format)
            && self.registered(format).is_some_and(|c| c.can_encode())
    }

    /// Enabled decoders in dispatch order.
    pub fn decoders(&self) -> impl Iterator<Item = &Arc<dyn FormatCodec>> {
        self.codecs
            .iter()
            .filter(|c| self.decode_enabled.contains(c.format()))
    }

    /// The native fallback, if one is set and native decoding is enabled.
    pub fn native_fallback(&self) -> Option<&Arc<dyn FormatCodec>> {
        self.native
            .as_ref()
            .filter(|_| self.decode_enabled.contains(ImageFormat::Native))
    }

    /// The encoder for `format`.
    pub fn encoder(&self, format: ImageFormat) -> Result<&Arc<dyn FormatCodec>, CodecError> {
        let codec = self.registered(format).ok_or(CodecError::UnsupportedOperation {
            format,
            detail: "no codec registered",
        })?;
        if !self.encode_enabled.contains(format) {
            return Err(CodecError::DisabledFormat(format));
        }
        if !codec.can_encode() {
            return Err(CodecError::UnsupportedOperation {
                format,
                detail: "encoding",
            });
        }
        Ok(codec)
    }

    /// Formats that are both registered and enabled for decoding.
    pub fn decodable_formats(&self) -> impl Iterator<Item = ImageFormat> {
        self.decoders()
            .map(|c| c.format())
            .collect::<Vec<_>>()
            .into_iter()
    }

    /// Formats that are registered and enabled for encoding.
    pub fn encodable_formats(&self) -> impl Iterator<Item = ImageFormat> {
        self.codecs
            .iter()
            .map(|c| c.format())
            .filter(|&f| self.can_encode(f))
            .collect::<Vec<_>>()
            .into_iter()
    }
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::all()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn all_registry_priority_order() {
        let registry = CodecRegistry::all();
        let order: Vec<_> = registry.decodable_formats().collect();
        let mut expected = Vec::new();
        #[cfg(feature = "webp")]
        expected.push(ImageFormat::WebP);
        #[cfg(feature = "png")]
        expected.push(ImageFormat::Png);
        #[cfg(feature = "jpeg")]
        expected.push(ImageFormat::Jpeg);
        assert_eq!(order, expected);
    }

    #[test]
    fn none_registry() {
        let registry = CodecRegistry::none();

        assert!(!registry.can_decode(ImageFormat::Jpeg));
        assert!(!registry.can_encode(ImageFormat::Jpeg));
        assert_eq!(registry.decoders().count(), 0);
    }

    #[test]
    fn selective_enable() {
        let registry = CodecRegistry::none()
            .with_decode(ImageFormat::Jpeg, true)
            .with_encode(ImageFormat::WebP, true);

        #[cfg(feature = "jpeg")]
        assert!(registry.can_decode(ImageFormat::Jpeg));
        #[cfg(feature = "webp")]
        assert!(registry.can_encode(ImageFormat::WebP));

        assert!(!registry.can_decode(ImageFormat::Png));
        assert!(!registry.can_encode(ImageFormat::Jpeg));
    }

    #[test]
    fn disabled_encoder_reported() {
        let registry = CodecRegistry::all().with_encode(ImageFormat::Jpeg, false);
        #[cfg(feature = "jpeg")]
        assert!(matches!(
            registry.encoder(ImageFormat::Jpeg),
            Err(CodecError::DisabledFormat(ImageFormat::Jpeg))
        ));
        assert!(registry.encoder(ImageFormat::Native).is_err());
    }

    #[test]
    fn empty_registry_has_no_fallback() {
        let registry = CodecRegistry::empty();
        assert!(registry.native_fallback().is_none());
        assert_eq!(registry.decodable_formats().count(), 0);
    }
}
