//! Built-in [`FormatCodec`](crate::FormatCodec) implementations.
//!
//! Each module adapts one format library to the codec interface. They share
//! the row writer below, which lifts a decoder's native scanlines into the
//! caller's target layout.

#[cfg(feature = "jpeg")]
pub mod jpeg;

#[cfg(feature = "png")]
pub mod png;

#[cfg(feature = "webp")]
pub mod webp;

use crate::convert::{SourceLayout, expand_row, pack_row};
use crate::pixel::PixelInfo;
use crate::{CodecError, ImageFormat};

/// Write tightly packed native scanlines into `dst`, one row at a time.
///
/// Exactly `dst_info.height()` rows are written at `row * row_bytes`; a
/// source that is too short for that is a decode failure, never a partial
/// write past the declared bounds.
pub(crate) fn write_rows(
    format: ImageFormat,
    src: &[u8],
    layout: SourceLayout,
    dst_info: &PixelInfo,
    dst: &mut [u8],
) -> Result<(), CodecError> {
    let width = dst_info.width() as usize;
    let height = dst_info.height() as usize;
    let src_stride = width * layout.channels();
    if src.len() < src_stride * height {
        return Err(CodecError::DecodeFailure {
            format,
            detail: format!(
                "decoder produced {} bytes, expected {}",
                src.len(),
                src_stride * height
            ),
        });
    }

    let mut scanline = vec![rgb::Rgba::new(0u8, 0, 0, 255); width];
    let dst_len = dst_info.min_row_bytes();
    for (src_row, dst_row) in src
        .chunks_exact(src_stride)
        .zip(dst.chunks_mut(dst_info.row_bytes()))
        .take(height)
    {
        expand_row(src_row, layout, &mut scanline);
        pack_row(
            &scanline,
            &mut dst_row[..dst_len],
            dst_info.color_type(),
            dst_info.alpha_type(),
        );
    }
    Ok(())
}

/// Fill every row of an alpha-only target with full coverage.
pub(crate) fn fill_opaque_alpha(dst_info: &PixelInfo, dst: &mut [u8]) {
    let len = dst_info.min_row_bytes();
    for row in dst
        .chunks_mut(dst_info.row_bytes())
        .take(dst_info.height() as usize)
    {
        row[..len].fill(0xFF);
    }
}
