//! PNG codec adapter using the png crate.

use log::debug;

use super::write_rows;
use crate::codec::{FormatCodec, ImageHeader};
use crate::config::PngConfig;
use crate::convert::{SourceLayout, convert_pixels};
use crate::pixel::{AlphaType, ColorType, PixelInfo, Pixmap};
use crate::{CodecError, ImageFormat, ImageSource, Limits, Orientation};

/// PNG decoder and encoder.
#[derive(Clone, Copy, Debug, Default)]
pub struct PngCodec {
    config: PngConfig,
}

impl PngCodec {
    pub fn new(config: PngConfig) -> Self {
        Self { config }
    }
}

fn decode_error(err: png::DecodingError) -> CodecError {
    match err {
        png::DecodingError::LimitsExceeded => {
            CodecError::LimitExceeded("PNG decoder buffers exceed the memory limit".into())
        }
        other => CodecError::decode(ImageFormat::Png, other),
    }
}

impl FormatCodec for PngCodec {
    fn format(&self) -> ImageFormat {
        ImageFormat::Png
    }

    fn read_header(&self, source: &ImageSource) -> Result<ImageHeader, CodecError> {
        let decoder = png::Decoder::new(source.open()?);
        let reader = decoder
            .read_info()
            .map_err(|e| CodecError::header(ImageFormat::Png, e))?;

        let info = reader.info();
        if info.animation_control.is_some() {
            debug!("png: animated image, only the default frame is decoded");
        }
        let has_alpha = matches!(
            info.color_type,
            png::ColorType::Rgba | png::ColorType::GrayscaleAlpha
        ) || info.trns.is_some();
        let orientation = info
            .exif_metadata
            .as_deref()
            .and_then(Orientation::parse_exif)
            .unwrap_or_default();

        Ok(ImageHeader {
            orientation,
            has_alpha,
            ..ImageHeader::new(info.width, info.height)
        })
    }

    fn read_pixels(
        &self,
        source: &ImageSource,
        header: &ImageHeader,
        dst_info: &PixelInfo,
        dst: &mut [u8],
        limits: &Limits,
    ) -> Result<(), CodecError> {
        let png_limits = png::Limits {
            bytes: limits.memory_cap(),
        };
        let mut decoder = png::Decoder::new_with_limits(source.open()?, png_limits);
        decoder.set_transformations(png::Transformations::normalize_to_color8());
        let mut reader = decoder.read_info().map_err(decode_error)?;

        let buffer_size = reader.output_buffer_size().ok_or_else(|| {
            CodecError::LimitExceeded("cannot determine PNG output buffer size".into())
        })?;
        limits.check_memory(buffer_size as u64)?;
        let mut raw_pixels = vec![0u8; buffer_size];
        let output_info = reader.next_frame(&mut raw_pixels).map_err(decode_error)?;
        raw_pixels.truncate(output_info.buffer_size());

        if output_info.width != header.width || output_info.height != header.height {
            return Err(CodecError::DecodeFailure {
                format: ImageFormat::Png,
                detail: "frame size differs from header".into(),
            });
        }

        let layout = match output_info.color_type {
            png::ColorType::Grayscale => SourceLayout::Gray,
            png::ColorType::GrayscaleAlpha => SourceLayout::GrayAlpha,
            png::ColorType::Rgb => SourceLayout::Rgb,
            png::ColorType::Rgba => SourceLayout::Rgba,
            png::ColorType::Indexed => {
                return Err(CodecError::DecodeFailure {
                    format: ImageFormat::Png,
                    detail: "palette was not expanded".into(),
                });
            }
        };
        write_rows(ImageFormat::Png, &raw_pixels, layout, dst_info, dst)
    }

    fn can_encode(&self) -> bool {
        true
    }

    fn encode(&self, pixmap: &Pixmap<'_>, _quality: u8) -> Result<Vec<u8>, CodecError> {
        let (width, height) = (pixmap.width(), pixmap.height());
        let src_info = pixmap.info();

        let (color, tight_info) = if src_info.color_type() == ColorType::Gray8 {
            (
                png::ColorType::Grayscale,
                PixelInfo::new(width, height, ColorType::Gray8, AlphaType::Opaque),
            )
        } else {
            (
                png::ColorType::Rgba,
                PixelInfo::new(width, height, ColorType::Rgba8888, AlphaType::Unpremultiplied),
            )
        };
        let mut data = vec![0u8; tight_info.byte_size()];
        convert_pixels(src_info, pixmap.pixels(), &tight_info, &mut data)?;

        let mut output = Vec::new();
        let mut encoder = png::Encoder::new(&mut output, width, height);
        encoder.set_color(color);
        encoder.set_depth(png::BitDepth::Eight);
        if self.config.fast_compression {
            encoder.set_compression(png::Compression::Fast);
        }

        let mut writer = encoder
            .write_header()
            .map_err(|e| CodecError::encode(ImageFormat::Png, e))?;
        writer
            .write_image_data(&data)
            .map_err(|e| CodecError::encode(ImageFormat::Png, e))?;
        writer
            .finish()
            .map_err(|e| CodecError::encode(ImageFormat::Png, e))?;

        Ok(output)
    }
}
