//! JPEG codec: header and scanline decode via `jpeg-decoder`, CMYK
//! finishing, and encode via `jpeg-encoder`.

use jpeg_decoder::{Decoder, ImageInfo, PixelFormat};
use jpeg_encoder::{ImageBuffer, JpegColorType};
use log::debug;

use super::{fill_opaque_alpha, write_rows};
use crate::codec::{FormatCodec, ImageHeader};
use crate::color::{ChannelOrder, CmykRows, finish_cmyk};
use crate::config::JpegConfig;
use crate::convert::{SourceLayout, convert_pixels};
use crate::pixel::{AlphaType, Bitmap, ColorType, PixelInfo, Pixmap};
use crate::source::SourceReader;
use crate::{CodecError, ImageFormat, ImageSource, Limits, Orientation};

/// A decoder that has read everything up to and including the frame header.
struct HeaderPass {
    decoder: Decoder<SourceReader>,
    info: ImageInfo,
}

impl HeaderPass {
    fn read(source: &ImageSource) -> Result<Self, CodecError> {
        let mut decoder = Decoder::new(source.open()?);
        decoder
            .read_info()
            .map_err(|e| CodecError::header(ImageFormat::Jpeg, e))?;
        let info = decoder.info().ok_or_else(|| CodecError::MalformedHeader {
            format: ImageFormat::Jpeg,
            detail: "no frame header".into(),
        })?;
        Ok(Self { decoder, info })
    }

    fn is_cmyk(&self) -> bool {
        self.info.pixel_format == PixelFormat::CMYK32
    }
}

/// Decoded scanlines in the decoder's native layout, tightly packed.
struct Scanlines {
    pixels: Vec<u8>,
    format: PixelFormat,
    /// Embedded profile, present only when every APP2 fragment was found.
    icc: Option<Vec<u8>>,
}

/// Where decoded rows go for a given target.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum OutputSpace {
    /// Rows are written straight into the caller's layout.
    Direct,
    /// CMYK rows are copied into an RGBA/BGRA target and converted in place.
    Cmyk(ChannelOrder),
    /// Decode into an RGBA scratch bitmap, then convert to the target.
    Scratch,
}

impl OutputSpace {
    fn choose(cmyk: bool, target: ColorType) -> Self {
        match (cmyk, target) {
            (true, ColorType::Rgba8888) => OutputSpace::Cmyk(ChannelOrder::Rgba),
            (true, ColorType::Bgra8888) => OutputSpace::Cmyk(ChannelOrder::Bgra),
            // CMYK pixels are 4 bytes wide; never write them into a narrower target.
            (true, _) => OutputSpace::Scratch,
            (
                false,
                ColorType::Rgba8888 | ColorType::Bgra8888 | ColorType::Gray8 | ColorType::Rgb565,
            ) => OutputSpace::Direct,
            (false, _) => OutputSpace::Scratch,
        }
    }
}

/// Reference JPEG codec.
#[derive(Clone, Copy, Debug, Default)]
pub struct JpegCodec {
    config: JpegConfig,
}

impl JpegCodec {
    pub fn new(config: JpegConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &JpegConfig {
        &self.config
    }

    /// Finish decoding a source after its header pass, within the memory cap.
    fn decode_scanlines(
        &self,
        pass: HeaderPass,
        header: &ImageHeader,
        limits: &Limits,
    ) -> Result<Scanlines, CodecError> {
        let HeaderPass { mut decoder, info } = pass;
        if u32::from(info.width) != header.width || u32::from(info.height) != header.height {
            return Err(CodecError::DecodeFailure {
                format: ImageFormat::Jpeg,
                detail: format!(
                    "frame is {}x{}, codec was built for {}x{}",
                    info.width, info.height, header.width, header.height
                ),
            });
        }

        let expected = u64::from(header.width)
            * u64::from(header.height)
            * info.pixel_format.pixel_bytes() as u64;
        limits.check_memory(expected)?;
        decoder.set_max_decoding_buffer_size(limits.memory_cap());

        let pixels = decoder
            .decode()
            .map_err(|e| CodecError::decode(ImageFormat::Jpeg, e))?;
        if pixels.len() as u64 != expected {
            return Err(CodecError::DecodeFailure {
                format: ImageFormat::Jpeg,
                detail: format!("decoded {} bytes, expected {expected}", pixels.len()),
            });
        }
        Ok(Scanlines {
            pixels,
            format: info.pixel_format,
            icc: decoder.icc_profile(),
        })
    }

    /// Write decoded color (non-CMYK) scanlines into `dst`.
    fn write_color(
        &self,
        scanlines: Scanlines,
        dst_info: &PixelInfo,
        dst: &mut [u8],
    ) -> Result<(), CodecError> {
        let (pixels, layout) = match scanlines.format {
            PixelFormat::L8 => (scanlines.pixels, SourceLayout::Gray),
            // Big-endian samples; keep the high byte.
            PixelFormat::L16 => (
                scanlines.pixels.chunks_exact(2).map(|s| s[0]).collect(),
                SourceLayout::Gray,
            ),
            PixelFormat::RGB24 => (scanlines.pixels, SourceLayout::Rgb),
            PixelFormat::CMYK32 => {
                return Err(CodecError::DecodeFailure {
                    format: ImageFormat::Jpeg,
                    detail: "CMYK scanlines routed to a color target".into(),
                });
            }
        };
        write_rows(ImageFormat::Jpeg, &pixels, layout, dst_info, dst)
    }

    /// Copy raw CMYK rows into a 4-byte target and convert them to RGB.
    fn write_cmyk(
        &self,
        scanlines: &Scanlines,
        dst_info: &PixelInfo,
        dst: &mut [u8],
        order: ChannelOrder,
    ) -> Result<(), CodecError> {
        let width = dst_info.width() as usize;
        let height = dst_info.height() as usize;
        let len = width * 4;
        for (src, row) in scanlines
            .pixels
            .chunks_exact(len)
            .zip(dst.chunks_mut(dst_info.row_bytes()))
            .take(height)
        {
            row[..len].copy_from_slice(src);
        }

        let rows = CmykRows {
            pixels: dst,
            width,
            height,
            row_bytes: dst_info.row_bytes(),
        };
        finish_cmyk(scanlines.icc.as_deref(), self.config.cmyk_fallback, rows, order)
    }
}

impl FormatCodec for JpegCodec {
    fn format(&self) -> ImageFormat {
        ImageFormat::Jpeg
    }

    fn read_header(&self, source: &ImageSource) -> Result<ImageHeader, CodecError> {
        let pass = HeaderPass::read(source)?;
        let orientation = pass
            .decoder
            .exif_data()
            .and_then(Orientation::parse_exif)
            .unwrap_or_default();
        debug!(
            "jpeg header: {}x{} {:?} {:?}",
            pass.info.width, pass.info.height, pass.info.pixel_format, orientation
        );
        Ok(ImageHeader {
            orientation,
            ..ImageHeader::new(u32::from(pass.info.width), u32::from(pass.info.height))
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
        if dst_info.color_type() == ColorType::Alpha8 {
            fill_opaque_alpha(dst_info, dst);
            return Ok(());
        }

        let pass = HeaderPass::read(source)?;
        let cmyk = pass.is_cmyk();
        let space = OutputSpace::choose(cmyk, dst_info.color_type());
        let scanlines = self.decode_scanlines(pass, header, limits)?;

        match space {
            OutputSpace::Direct => self.write_color(scanlines, dst_info, dst),
            OutputSpace::Cmyk(order) => self.write_cmyk(&scanlines, dst_info, dst, order),
            OutputSpace::Scratch => {
                debug!(
                    "jpeg: decoding through RGBA scratch for {:?} target",
                    dst_info.color_type()
                );
                let scratch_info = PixelInfo::new(
                    header.width,
                    header.height,
                    ColorType::Rgba8888,
                    AlphaType::Opaque,
                );
                limits.check_memory(scratch_info.byte_size() as u64)?;
                let mut scratch = Bitmap::new(scratch_info);
                if cmyk {
                    self.write_cmyk(
                        &scanlines,
                        &scratch_info,
                        scratch.pixels_mut(),
                        ChannelOrder::Rgba,
                    )?;
                } else {
                    self.write_color(scanlines, &scratch_info, scratch.pixels_mut())?;
                }
                convert_pixels(&scratch_info, scratch.pixels(), dst_info, dst)
            }
        }
    }

    fn can_encode(&self) -> bool {
        true
    }

    fn encode(&self, pixmap: &Pixmap<'_>, quality: u8) -> Result<Vec<u8>, CodecError> {
        let (width, height) = (pixmap.width(), pixmap.height());
        if width > u32::from(u16::MAX) || height > u32::from(u16::MAX) {
            return Err(CodecError::InvalidDimensions { width, height });
        }

        let info = pixmap.info();
        let straight = matches!(
            info.alpha_type(),
            AlphaType::Opaque | AlphaType::Unpremultiplied
        );
        let scratch;
        let image = match info.color_type() {
            ColorType::Gray8 => StridedImage::new(*pixmap, InputOrder::Gray),
            ColorType::Rgba8888 if straight => StridedImage::new(*pixmap, InputOrder::Rgba),
            ColorType::Bgra8888 if straight => StridedImage::new(*pixmap, InputOrder::Bgra),
            // Premultiplied sources are unpremultiplied first so translucent
            // pixels keep their color instead of darkening toward black.
            other => {
                debug!("jpeg encode: converting {other:?} source through RGBA scratch");
                let scratch_info =
                    PixelInfo::new(width, height, ColorType::Rgba8888, AlphaType::Unpremultiplied);
                let mut bitmap = Bitmap::new(scratch_info);
                pixmap.read_pixels(&scratch_info, bitmap.pixels_mut())?;
                scratch = bitmap;
                StridedImage::new(scratch.as_pixmap(), InputOrder::Rgba)
            }
        };

        // libjpeg treats quality 0 as 1.
        let quality = quality.clamp(1, 100);
        let mut output = Vec::new();
        let mut encoder = jpeg_encoder::Encoder::new(&mut output, quality);
        encoder.set_optimized_huffman_tables(self.config.optimize_coding);
        encoder
            .encode_image(image)
            .map_err(|e| CodecError::encode(ImageFormat::Jpeg, e))?;
        Ok(output)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum InputOrder {
    Gray,
    Rgba,
    Bgra,
}

/// Feeds the encoder one source row at a time, honouring the pixmap stride.
struct StridedImage<'a> {
    pixmap: Pixmap<'a>,
    order: InputOrder,
}

impl<'a> StridedImage<'a> {
    fn new(pixmap: Pixmap<'a>, order: InputOrder) -> Self {
        Self { pixmap, order }
    }
}

impl ImageBuffer for StridedImage<'_> {
    fn get_jpeg_color_type(&self) -> JpegColorType {
        match self.order {
            InputOrder::Gray => JpegColorType::Luma,
            InputOrder::Rgba | InputOrder::Bgra => JpegColorType::Ycbcr,
        }
    }

    fn width(&self) -> u16 {
        self.pixmap.width() as u16
    }

    fn height(&self) -> u16 {
        self.pixmap.height() as u16
    }

    fn fill_buffers(&self, y: u16, buffers: &mut [Vec<u8>; 4]) {
        let row = self.pixmap.row(u32::from(y));
        if self.order == InputOrder::Gray {
            buffers[0].extend_from_slice(row);
            return;
        }
        for px in row.chunks_exact(4) {
            let (r, g, b) = match self.order {
                InputOrder::Bgra => (px[2], px[1], px[0]),
                _ => (px[0], px[1], px[2]),
            };
            let (luma, cb, cr) = jpeg_encoder::rgb_to_ycbcr(r, g, b);
            buffers[0].push(luma);
            buffers[1].push(cb);
            buffers[2].push(cr);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn encode_solid(color: [u8; 4], alpha_type: AlphaType, width: u32, height: u32) -> Vec<u8> {
        let pixels = color.repeat((width * height) as usize);
        let info = PixelInfo::new(width, height, ColorType::Rgba8888, alpha_type);
        let pixmap = Pixmap::new(info, &pixels).unwrap();
        JpegCodec::default().encode(&pixmap, 95).unwrap()
    }

    fn source(data: Vec<u8>) -> ImageSource {
        ImageSource::from_bytes(Arc::<[u8]>::from(data)).unwrap()
    }

    fn close(a: u8, b: u8) -> bool {
        a.abs_diff(b) <= 4
    }

    #[test]
    fn output_space_selection() {
        assert_eq!(OutputSpace::choose(false, ColorType::Rgb565), OutputSpace::Direct);
        assert_eq!(OutputSpace::choose(false, ColorType::Rgba1010102), OutputSpace::Scratch);
        assert_eq!(
            OutputSpace::choose(true, ColorType::Bgra8888),
            OutputSpace::Cmyk(ChannelOrder::Bgra)
        );
        assert_eq!(OutputSpace::choose(true, ColorType::Gray8), OutputSpace::Scratch);
    }

    #[test]
    fn roundtrip_solid_color() {
        let codec = JpegCodec::default();
        let data = encode_solid([200, 100, 50, 255], AlphaType::Unpremultiplied, 16, 8);
        let source = source(data);
        let header = codec.read_header(&source).unwrap();
        assert_eq!((header.width, header.height), (16, 8));
        assert!(!header.has_alpha);

        let info = PixelInfo::new(16, 8, ColorType::Bgra8888, AlphaType::Premultiplied);
        let mut dst = vec![0u8; info.byte_size()];
        codec
            .read_pixels(&source, &header, &info, &mut dst, &Limits::default())
            .unwrap();
        let px = &dst[..4];
        assert!(close(px[0], 50) && close(px[1], 100) && close(px[2], 200), "{px:?}");
        assert_eq!(px[3], 255);
    }

    #[test]
    fn premultiplied_source_keeps_color() {
        // (200, 100, 50) at half coverage, stored premultiplied.
        let data = encode_solid([100, 50, 25, 128], AlphaType::Premultiplied, 8, 8);
        let codec = JpegCodec::default();
        let source = source(data);
        let header = codec.read_header(&source).unwrap();
        let info = PixelInfo::new(8, 8, ColorType::Rgba8888, AlphaType::Unpremultiplied);
        let mut dst = vec![0u8; info.byte_size()];
        codec
            .read_pixels(&source, &header, &info, &mut dst, &Limits::default())
            .unwrap();
        let px = &dst[..4];
        assert!(
            px[0].abs_diff(200) <= 6 && px[1].abs_diff(100) <= 6 && px[2].abs_diff(50) <= 6,
            "{px:?}"
        );
        assert_eq!(px[3], 255);
    }

    #[test]
    fn alpha_only_target_is_opaque_without_decoding() {
        let codec = JpegCodec::default();
        let source = source(encode_solid([0, 0, 0, 255], AlphaType::Opaque, 4, 4));
        let header = codec.read_header(&source).unwrap();
        let info = PixelInfo::new(4, 4, ColorType::Alpha8, AlphaType::Premultiplied);
        let mut dst = [0u8; 16];
        codec
            .read_pixels(&source, &header, &info, &mut dst, &Limits::default())
            .unwrap();
        assert_eq!(dst, [255u8; 16]);
    }

    #[test]
    fn scratch_target_matches_direct_decode() {
        let codec = JpegCodec::default();
        let source = source(encode_solid([255, 255, 255, 255], AlphaType::Opaque, 8, 8));
        let header = codec.read_header(&source).unwrap();
        let info = PixelInfo::new(8, 8, ColorType::Rgba1010102, AlphaType::Opaque);
        let mut dst = vec![0u8; info.byte_size()];
        codec
            .read_pixels(&source, &header, &info, &mut dst, &Limits::default())
            .unwrap();
        let v = u32::from_ne_bytes([dst[0], dst[1], dst[2], dst[3]]);
        assert!((v & 0x3FF) >= 1000, "{v:#x}");
        assert_eq!(v >> 30, 3);
    }

    #[test]
    fn memory_cap_stops_decode() {
        let codec = JpegCodec::default();
        let source = source(encode_solid([9, 9, 9, 255], AlphaType::Opaque, 16, 16));
        let header = codec.read_header(&source).unwrap();
        let info = PixelInfo::new(16, 16, ColorType::Rgba8888, AlphaType::Opaque);
        let mut dst = vec![0u8; info.byte_size()];

        // 16x16 RGB scanlines need 768 bytes.
        let tight = Limits::none().with_max_memory(767);
        assert!(matches!(
            codec.read_pixels(&source, &header, &info, &mut dst, &tight),
            Err(CodecError::LimitExceeded(_))
        ));
        let enough = Limits::none().with_max_memory(768);
        codec
            .read_pixels(&source, &header, &info, &mut dst, &enough)
            .unwrap();
    }

    #[test]
    fn gray_source_encodes_as_luma() {
        let pixels = [77u8; 64];
        let info = PixelInfo::new(8, 8, ColorType::Gray8, AlphaType::Opaque);
        let pixmap = Pixmap::new(info, &pixels).unwrap();
        let data = JpegCodec::default().encode(&pixmap, 90).unwrap();
        let mut decoder = Decoder::new(&data[..]);
        decoder.read_info().unwrap();
        assert_eq!(decoder.info().unwrap().pixel_format, PixelFormat::L8);
    }
}
