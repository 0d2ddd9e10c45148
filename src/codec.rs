//! The codec facade and the per-format capability interface.

use std::sync::Arc;

use crate::pixel::{AlphaType, Bitmap, ColorType, PixelInfo, Pixmap};
use crate::{CodecError, ImageFormat, ImageSource, Limits, Orientation};

/// Header facts a format reports without decoding pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ImageHeader {
    pub width: u32,
    pub height: u32,
    pub orientation: Orientation,
    pub has_alpha: bool,
    /// The image carries only coverage, no color.
    pub alpha_only: bool,
}

impl ImageHeader {
    /// Opaque color image with identity orientation.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            orientation: Orientation::TopLeft,
            has_alpha: false,
            alpha_only: false,
        }
    }

    pub(crate) fn check_nonzero(&self, format: ImageFormat) -> Result<(), CodecError> {
        if self.width == 0 || self.height == 0 {
            log::debug!("{format:?} header declares {}x{}", self.width, self.height);
            return Err(CodecError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }
        Ok(())
    }
}

/// One encoded format's decoder and, optionally, encoder.
///
/// Implementations are stateless: every call reopens the source and builds
/// its own library state, so a single instance is shared by every codec of
/// its format and may be called from any thread.
pub trait FormatCodec: Send + Sync + core::fmt::Debug {
    fn format(&self) -> ImageFormat;

    /// Pure signature predicate over a byte prefix.
    fn is_format(&self, prefix: &[u8]) -> bool {
        self.format().matches_signature(prefix)
    }

    /// Parse only the header.
    fn read_header(&self, source: &ImageSource) -> Result<ImageHeader, CodecError>;

    /// Decode every row into `dst`, laid out as `dst_info`.
    ///
    /// `dst_info` has the header's dimensions and `dst` covers it. Buffers
    /// the decoder allocates on its own count against `limits`.
    fn read_pixels(
        &self,
        source: &ImageSource,
        header: &ImageHeader,
        dst_info: &PixelInfo,
        dst: &mut [u8],
        limits: &Limits,
    ) -> Result<(), CodecError>;

    fn can_encode(&self) -> bool {
        false
    }

    /// Compress `pixmap`; `quality` is already clamped to 0..=100.
    fn encode(&self, pixmap: &Pixmap<'_>, quality: u8) -> Result<Vec<u8>, CodecError> {
        let _ = (pixmap, quality);
        Err(CodecError::UnsupportedOperation {
            format: self.format(),
            detail: "encoding",
        })
    }
}

/// A constructed, validated image.
///
/// Immutable once built. It holds the header and the byte source but no
/// open file or decoder state, so it can be shared across threads and read
/// concurrently.
#[derive(Debug)]
pub struct Codec {
    header: ImageHeader,
    source: ImageSource,
    driver: Arc<dyn FormatCodec>,
    limits: Limits,
}

impl Codec {
    /// Parse `source`'s header with `driver`.
    pub fn open(driver: Arc<dyn FormatCodec>, source: ImageSource) -> Result<Self, CodecError> {
        let header = driver.read_header(&source)?;
        header.check_nonzero(driver.format())?;
        Ok(Self {
            header,
            source,
            driver,
            limits: Limits::default(),
        })
    }

    /// Limits applied to every later decode.
    pub(crate) fn with_limits(mut self, limits: &Limits) -> Self {
        self.limits = limits.clone();
        self
    }

    pub fn format(&self) -> ImageFormat {
        self.driver.format()
    }

    pub fn width(&self) -> u32 {
        self.header.width
    }

    pub fn height(&self) -> u32 {
        self.header.height
    }

    pub fn orientation(&self) -> Orientation {
        self.header.orientation
    }

    pub fn has_alpha(&self) -> bool {
        self.header.has_alpha
    }

    pub fn is_alpha_only(&self) -> bool {
        self.header.alpha_only
    }

    pub fn header(&self) -> &ImageHeader {
        &self.header
    }

    pub fn source(&self) -> &ImageSource {
        &self.source
    }

    /// Decode into a caller-owned buffer.
    ///
    /// The target must have the codec's dimensions. Each call reopens the
    /// source; two calls with the same target produce identical bytes.
    pub fn read_pixels(&self, dst_info: &PixelInfo, dst: &mut [u8]) -> Result<(), CodecError> {
        if dst_info.width() != self.width() || dst_info.height() != self.height() {
            return Err(CodecError::InvalidInput(format!(
                "target is {}x{}, image is {}x{}",
                dst_info.width(),
                dst_info.height(),
                self.width(),
                self.height()
            )));
        }
        dst_info.check_buffer(dst.len())?;
        self.driver
            .read_pixels(&self.source, &self.header, dst_info, dst, &self.limits)
    }

    /// Decode into a fresh bitmap: premultiplied RGBA, or alpha-only
    /// coverage for alpha-only images.
    pub fn make_bitmap(&self) -> Result<Bitmap, CodecError> {
        let color_type = if self.is_alpha_only() {
            ColorType::Alpha8
        } else {
            ColorType::Rgba8888
        };
        let info = PixelInfo::new(
            self.width(),
            self.height(),
            color_type,
            AlphaType::Premultiplied,
        );
        self.limits.check_memory(info.byte_size() as u64)?;
        let mut bitmap = Bitmap::new(info);
        self.read_pixels(&info, bitmap.pixels_mut())?;
        Ok(bitmap)
    }

    /// The original encoded bytes; a fresh file read for path sources.
    pub fn encoded_data(&self) -> Result<Arc<[u8]>, CodecError> {
        self.source.read_all()
    }
}
