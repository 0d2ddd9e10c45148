//! WebP codec adapter using image-webp.
//!
//! Still images only. Encoding is lossless; the quality argument is ignored.

use image_webp::{WebPDecoder, WebPEncoder};
use log::debug;

use super::write_rows;
use crate::codec::{FormatCodec, ImageHeader};
use crate::convert::{SourceLayout, convert_pixels};
use crate::pixel::{AlphaType, ColorType, PixelInfo, Pixmap};
use crate::source::SourceReader;
use crate::{CodecError, ImageFormat, ImageSource, Limits, Orientation};

#[derive(Clone, Copy, Debug, Default)]
pub struct WebpCodec;

impl WebpCodec {
    pub fn new() -> Self {
        Self
    }

    fn open(source: &ImageSource) -> Result<WebPDecoder<SourceReader>, CodecError> {
        let decoder = WebPDecoder::new(source.open()?)
            .map_err(|e| CodecError::header(ImageFormat::WebP, e))?;
        if decoder.is_animated() {
            return Err(CodecError::UnsupportedOperation {
                format: ImageFormat::WebP,
                detail: "animated images",
            });
        }
        Ok(decoder)
    }
}

impl FormatCodec for WebpCodec {
    fn format(&self) -> ImageFormat {
        ImageFormat::WebP
    }

    fn read_header(&self, source: &ImageSource) -> Result<ImageHeader, CodecError> {
        let mut decoder = Self::open(source)?;
        let (width, height) = decoder.dimensions();
        let orientation = match decoder.exif_metadata() {
            Ok(exif) => exif
                .as_deref()
                .and_then(Orientation::parse_exif)
                .unwrap_or_default(),
            Err(err) => {
                debug!("webp: ignoring unreadable EXIF chunk: {err}");
                Orientation::TopLeft
            }
        };
        Ok(ImageHeader {
            orientation,
            has_alpha: decoder.has_alpha(),
            ..ImageHeader::new(width, height)
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
        let mut decoder = Self::open(source)?;
        if decoder.dimensions() != (header.width, header.height) {
            return Err(CodecError::DecodeFailure {
                format: ImageFormat::WebP,
                detail: "source changed since the codec was built".into(),
            });
        }
        let size = decoder.output_buffer_size().ok_or_else(|| {
            CodecError::LimitExceeded("WebP output buffer size overflows".into())
        })?;
        limits.check_memory(size as u64)?;
        let mut pixels = vec![0u8; size];
        decoder
            .read_image(&mut pixels)
            .map_err(|e| CodecError::decode(ImageFormat::WebP, e))?;

        let layout = if decoder.has_alpha() {
            SourceLayout::Rgba
        } else {
            SourceLayout::Rgb
        };
        write_rows(ImageFormat::WebP, &pixels, layout, dst_info, dst)
    }

    fn can_encode(&self) -> bool {
        true
    }

    fn encode(&self, pixmap: &Pixmap<'_>, _quality: u8) -> Result<Vec<u8>, CodecError> {
        let (width, height) = (pixmap.width(), pixmap.height());
        let tight = PixelInfo::new(width, height, ColorType::Rgba8888, AlphaType::Unpremultiplied);
        let mut data = vec![0u8; tight.byte_size()];
        convert_pixels(pixmap.info(), pixmap.pixels(), &tight, &mut data)?;

        let mut output = Vec::new();
        WebPEncoder::new(&mut output)
            .encode(&data, width, height, image_webp::ColorType::Rgba8)
            .map_err(|e| CodecError::encode(ImageFormat::WebP, e))?;
        Ok(output)
    }
}
