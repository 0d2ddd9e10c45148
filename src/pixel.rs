//! Pixel layout descriptors and buffers.
//!
//! [`PixelInfo`] describes where and how pixels live in memory: dimensions,
//! [`ColorType`], [`AlphaType`] and row stride. Decoders write into a
//! caller-owned buffer described by a `PixelInfo`; encoders read from a
//! [`Pixmap`].

use imgref::ImgRef;
use rgb::Rgba;

use crate::CodecError;

/// Pixel memory layout.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ColorType {
    /// Single 8-bit alpha channel.
    Alpha8,
    /// Single channel, 8-bit grayscale.
    Gray8,
    /// 16-bit packed RGB (5/6/5, native endian, red in the high bits).
    Rgb565,
    /// 4 channels, 8-bit RGBA.
    Rgba8888,
    /// 4 channels, 8-bit BGRA.
    Bgra8888,
    /// 32-bit packed RGBA, 10 bits per color and 2 bits alpha (native endian, red in the low bits).
    Rgba1010102,
}

impl ColorType {
    /// Bytes per pixel for this layout.
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            ColorType::Alpha8 | ColorType::Gray8 => 1,
            ColorType::Rgb565 => 2,
            ColorType::Rgba8888 | ColorType::Bgra8888 | ColorType::Rgba1010102 => 4,
        }
    }

    /// Whether the layout stores an alpha channel.
    pub fn has_alpha(self) -> bool {
        matches!(
            self,
            ColorType::Alpha8
                | ColorType::Rgba8888
                | ColorType::Bgra8888
                | ColorType::Rgba1010102
        )
    }
}

/// How color channels relate to alpha.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum AlphaType {
    /// All pixels are opaque; alpha, if stored, is ignored.
    Opaque,
    /// Color channels are premultiplied by alpha.
    #[default]
    Premultiplied,
    /// Color channels are independent of alpha.
    Unpremultiplied,
}

/// Describes a pixel buffer: dimensions, layout, alpha convention and stride.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct PixelInfo {
    width: u32,
    height: u32,
    color_type: ColorType,
    alpha_type: AlphaType,
    row_bytes: usize,
}

impl PixelInfo {
    /// Tightly packed rows.
    ///
    /// Layouts without alpha are forced to [`AlphaType::Opaque`].
    pub fn new(width: u32, height: u32, color_type: ColorType, alpha_type: AlphaType) -> Self {
        let alpha_type = if color_type.has_alpha() {
            alpha_type
        } else {
            AlphaType::Opaque
        };
        Self {
            width,
            height,
            color_type,
            alpha_type,
            row_bytes: width as usize * color_type.bytes_per_pixel(),
        }
    }

    /// Same layout with an explicit row stride.
    pub fn with_row_bytes(mut self, row_bytes: usize) -> Result<Self, CodecError> {
        if row_bytes < self.min_row_bytes() {
            return Err(CodecError::InvalidInput(format!(
                "row stride {row_bytes} is smaller than {} bytes",
                self.min_row_bytes()
            )));
        }
        if self.height > 0 {
            row_bytes
                .checked_mul(self.height as usize - 1)
                .and_then(|n| n.checked_add(self.min_row_bytes()))
                .ok_or_else(|| {
                    CodecError::InvalidInput(format!(
                        "row stride {row_bytes} overflows for {} rows",
                        self.height
                    ))
                })?;
        }
        self.row_bytes = row_bytes;
        Ok(self)
    }

    /// Same dimensions and alpha type with a different color type; rows are tightly packed.
    pub fn with_color_type(self, color_type: ColorType) -> Self {
        Self::new(self.width, self.height, color_type, self.alpha_type)
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn color_type(&self) -> ColorType {
        self.color_type
    }

    pub fn alpha_type(&self) -> AlphaType {
        self.alpha_type
    }

    pub fn row_bytes(&self) -> usize {
        self.row_bytes
    }

    pub fn bytes_per_pixel(&self) -> usize {
        self.color_type.bytes_per_pixel()
    }

    /// Bytes actually occupied by pixels in one row.
    pub fn min_row_bytes(&self) -> usize {
        self.width as usize * self.bytes_per_pixel()
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }

    /// Bytes needed to hold every row; the last row need not be padded.
    pub fn byte_size(&self) -> usize {
        if self.is_empty() {
            return 0;
        }
        self.row_bytes
            .saturating_mul(self.height as usize - 1)
            .saturating_add(self.min_row_bytes())
    }

    /// Reject buffers too small for this layout.
    pub(crate) fn check_buffer(&self, len: usize) -> Result<(), CodecError> {
        let needed = self.byte_size();
        if len < needed {
            return Err(CodecError::InvalidInput(format!(
                "buffer too small: need {needed} bytes, got {len}"
            )));
        }
        Ok(())
    }
}

/// Borrowed, read-only pixels plus their layout.
#[derive(Clone, Copy, Debug)]
pub struct Pixmap<'a> {
    info: PixelInfo,
    pixels: &'a [u8],
}

impl<'a> Pixmap<'a> {
    /// Wrap `pixels`, validating that the buffer covers `info`.
    pub fn new(info: PixelInfo, pixels: &'a [u8]) -> Result<Self, CodecError> {
        info.check_buffer(pixels.len())?;
        Ok(Self { info, pixels })
    }

    /// View an unpremultiplied RGBA image; imgref strides are in pixels.
    pub fn from_rgba_img(img: ImgRef<'a, Rgba<u8>>) -> Result<Self, CodecError> {
        let info = PixelInfo::new(
            img.width() as u32,
            img.height() as u32,
            ColorType::Rgba8888,
            AlphaType::Unpremultiplied,
        )
        .with_row_bytes(img.stride() * 4)?;
        let buf: &'a [Rgba<u8>] = img.into_buf();
        Self::new(info, bytemuck::cast_slice(buf))
    }

    pub fn info(&self) -> &PixelInfo {
        &self.info
    }

    pub fn pixels(&self) -> &'a [u8] {
        self.pixels
    }

    pub fn width(&self) -> u32 {
        self.info.width
    }

    pub fn height(&self) -> u32 {
        self.info.height
    }

    pub fn is_empty(&self) -> bool {
        self.info.is_empty()
    }

    /// Pixel bytes of row `y`, without stride padding.
    pub fn row(&self, y: u32) -> &'a [u8] {
        let start = y as usize * self.info.row_bytes;
        &self.pixels[start..start + self.info.min_row_bytes()]
    }

    /// Convert into a buffer laid out as `dst_info`.
    pub fn read_pixels(&self, dst_info: &PixelInfo, dst: &mut [u8]) -> Result<(), CodecError> {
        crate::convert::convert_pixels(&self.info, self.pixels, dst_info, dst)
    }
}

/// Owned pixels plus their layout.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Bitmap {
    info: PixelInfo,
    pixels: Vec<u8>,
}

impl Bitmap {
    /// Zero-filled bitmap with tightly packed rows.
    pub fn new(info: PixelInfo) -> Self {
        let pixels = vec![0u8; info.byte_size()];
        Self { info, pixels }
    }

    pub fn info(&self) -> &PixelInfo {
        &self.info
    }

    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    pub fn pixels_mut(&mut self) -> &mut [u8] {
        &mut self.pixels
    }

    pub fn into_pixels(self) -> Vec<u8> {
        self.pixels
    }

    pub fn as_pixmap(&self) -> Pixmap<'_> {
        Pixmap {
            info: self.info,
            pixels: &self.pixels,
        }
    }
}
