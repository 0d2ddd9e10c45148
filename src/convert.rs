//! Row-level pixel format conversion.
//!
//! Every conversion goes through unpremultiplied 8-bit RGBA: a source row is
//! unpacked into [`Rgba<u8>`] and packed again into the destination layout.
//! Decoders use [`expand_row`] to lift their native scanlines into that
//! intermediate form.

use rgb::Rgba;

use crate::CodecError;
use crate::pixel::{AlphaType, ColorType, PixelInfo};

/// Native 8-bit scanline layouts produced by the decoder libraries.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum SourceLayout {
    Gray,
    GrayAlpha,
    Rgb,
    Rgba,
}

impl SourceLayout {
    pub(crate) fn channels(self) -> usize {
        match self {
            SourceLayout::Gray => 1,
            SourceLayout::GrayAlpha => 2,
            SourceLayout::Rgb => 3,
            SourceLayout::Rgba => 4,
        }
    }
}

const OPAQUE_BLACK: Rgba<u8> = Rgba {
    r: 0,
    g: 0,
    b: 0,
    a: 255,
};

/// Lift a native decoder scanline into unpremultiplied RGBA.
pub(crate) fn expand_row(src: &[u8], layout: SourceLayout, out: &mut [Rgba<u8>]) {
    let chunks = src.chunks_exact(layout.channels());
    for (px, s) in out.iter_mut().zip(chunks) {
        *px = match layout {
            SourceLayout::Gray => Rgba {
                r: s[0],
                g: s[0],
                b: s[0],
                a: 255,
            },
            SourceLayout::GrayAlpha => Rgba {
                r: s[0],
                g: s[0],
                b: s[0],
                a: s[1],
            },
            SourceLayout::Rgb => Rgba {
                r: s[0],
                g: s[1],
                b: s[2],
                a: 255,
            },
            SourceLayout::Rgba => Rgba {
                r: s[0],
                g: s[1],
                b: s[2],
                a: s[3],
            },
        };
    }
}

/// Unpack one row of `color_type` pixels into unpremultiplied RGBA.
pub(crate) fn unpack_row(
    src: &[u8],
    color_type: ColorType,
    alpha_type: AlphaType,
    out: &mut [Rgba<u8>],
) {
    match color_type {
        ColorType::Alpha8 => {
            for (px, &a) in out.iter_mut().zip(src) {
                *px = Rgba { r: 0, g: 0, b: 0, a };
            }
        }
        ColorType::Gray8 => expand_row(src, SourceLayout::Gray, out),
        ColorType::Rgb565 => {
            for (px, s) in out.iter_mut().zip(src.chunks_exact(2)) {
                let v = u16::from_ne_bytes([s[0], s[1]]);
                let r = ((v >> 11) & 0x1F) as u8;
                let g = ((v >> 5) & 0x3F) as u8;
                let b = (v & 0x1F) as u8;
                *px = Rgba {
                    r: (r << 3) | (r >> 2),
                    g: (g << 2) | (g >> 4),
                    b: (b << 3) | (b >> 2),
                    a: 255,
                };
            }
        }
        ColorType::Rgba8888 => {
            let src: &[Rgba<u8>] = bytemuck::cast_slice(src);
            out[..src.len()].copy_from_slice(src);
        }
        ColorType::Bgra8888 => {
            for (px, s) in out.iter_mut().zip(src.chunks_exact(4)) {
                *px = Rgba {
                    r: s[2],
                    g: s[1],
                    b: s[0],
                    a: s[3],
                };
            }
        }
        ColorType::Rgba1010102 => {
            for (px, s) in out.iter_mut().zip(src.chunks_exact(4)) {
                let v = u32::from_ne_bytes([s[0], s[1], s[2], s[3]]);
                let ten = |shift: u32| ((((v >> shift) & 0x3FF) * 255 + 511) / 1023) as u8;
                *px = Rgba {
                    r: ten(0),
                    g: ten(10),
                    b: ten(20),
                    a: ((v >> 30) * 85) as u8,
                };
            }
        }
    }

    match alpha_type {
        AlphaType::Opaque => out.iter_mut().for_each(|px| px.a = 255),
        AlphaType::Premultiplied => out.iter_mut().for_each(unpremultiply),
        AlphaType::Unpremultiplied => {}
    }
}

/// Pack unpremultiplied RGBA into one row of `color_type` pixels.
pub(crate) fn pack_row(
    src: &[Rgba<u8>],
    dst: &mut [u8],
    color_type: ColorType,
    alpha_type: AlphaType,
) {
    let bpp = color_type.bytes_per_pixel();
    for (px, d) in src.iter().zip(dst.chunks_exact_mut(bpp)) {
        let px = match alpha_type {
            AlphaType::Opaque => Rgba { a: 255, ..*px },
            AlphaType::Premultiplied => premultiply(*px),
            AlphaType::Unpremultiplied => *px,
        };
        match color_type {
            ColorType::Alpha8 => d[0] = px.a,
            ColorType::Gray8 => d[0] = luma(px),
            ColorType::Rgb565 => {
                let v = (u16::from(px.r >> 3) << 11)
                    | (u16::from(px.g >> 2) << 5)
                    | u16::from(px.b >> 3);
                d.copy_from_slice(&v.to_ne_bytes());
            }
            ColorType::Rgba8888 => d.copy_from_slice(&[px.r, px.g, px.b, px.a]),
            ColorType::Bgra8888 => d.copy_from_slice(&[px.b, px.g, px.r, px.a]),
            ColorType::Rgba1010102 => {
                let ten = |c: u8| (u32::from(c) * 1023 + 127) / 255;
                let a2 = (u32::from(px.a) * 3 + 127) / 255;
                let v = ten(px.r) | (ten(px.g) << 10) | (ten(px.b) << 20) | (a2 << 30);
                d.copy_from_slice(&v.to_ne_bytes());
            }
        }
    }
}

/// Convert a whole image between layouts.
///
/// Dimensions must match; strides may differ.
pub fn convert_pixels(
    src_info: &PixelInfo,
    src: &[u8],
    dst_info: &PixelInfo,
    dst: &mut [u8],
) -> Result<(), CodecError> {
    if src_info.width() != dst_info.width() || src_info.height() != dst_info.height() {
        return Err(CodecError::InvalidInput(format!(
            "cannot convert {}x{} pixels into a {}x{} target",
            src_info.width(),
            src_info.height(),
            dst_info.width(),
            dst_info.height()
        )));
    }
    src_info.check_buffer(src.len())?;
    dst_info.check_buffer(dst.len())?;
    if src_info.is_empty() {
        return Ok(());
    }

    let src_len = src_info.min_row_bytes();
    let dst_len = dst_info.min_row_bytes();
    let rows = src
        .chunks(src_info.row_bytes())
        .zip(dst.chunks_mut(dst_info.row_bytes()))
        .take(src_info.height() as usize);

    if src_info.color_type() == dst_info.color_type()
        && src_info.alpha_type() == dst_info.alpha_type()
    {
        for (s, d) in rows {
            d[..dst_len].copy_from_slice(&s[..src_len]);
        }
        return Ok(());
    }

    let mut scratch: Vec<Rgba<u8>> = vec![OPAQUE_BLACK; src_info.width() as usize];
    for (s, d) in rows {
        unpack_row(
            &s[..src_len],
            src_info.color_type(),
            src_info.alpha_type(),
            &mut scratch,
        );
        pack_row(
            &scratch,
            &mut d[..dst_len],
            dst_info.color_type(),
            dst_info.alpha_type(),
        );
    }
    Ok(())
}

/// Rec. 601 luma in 8.8 fixed point.
fn luma(px: Rgba<u8>) -> u8 {
    ((u32::from(px.r) * 77 + u32::from(px.g) * 150 + u32::from(px.b) * 29 + 128) >> 8) as u8
}

fn premultiply(px: Rgba<u8>) -> Rgba<u8> {
    let a = u32::from(px.a);
    let mul = |c: u8| ((u32::from(c) * a + 127) / 255) as u8;
    Rgba {
        r: mul(px.r),
        g: mul(px.g),
        b: mul(px.b),
        a: px.a,
    }
}

fn unpremultiply(px: &mut Rgba<u8>) {
    let a = u32::from(px.a);
    if a == 0 || a == 255 {
        return;
    }
    let div = |c: u8| ((u32::from(c) * 255 + a / 2) / a).min(255) as u8;
    px.r = div(px.r);
    px.g = div(px.g);
    px.b = div(px.b);
}

#[cfg(test)]
mod tests {
    use super::*;

    fn info(w: u32, h: u32, ct: ColorType, at: AlphaType) -> PixelInfo {
        PixelInfo::new(w, h, ct, at)
    }

    #[test]
    fn rgba_to_bgra_swaps_channels() {
        let src = [10u8, 20, 30, 255, 40, 50, 60, 255];
        let mut dst = [0u8; 8];
        convert_pixels(
            &info(2, 1, ColorType::Rgba8888, AlphaType::Unpremultiplied),
            &src,
            &info(2, 1, ColorType::Bgra8888, AlphaType::Unpremultiplied),
            &mut dst,
        )
        .unwrap();
        assert_eq!(dst, [30, 20, 10, 255, 60, 50, 40, 255]);
    }

    #[test]
    fn premultiply_on_pack() {
        let src = [200u8, 100, 50, 128];
        let mut dst = [0u8; 4];
        convert_pixels(
            &info(1, 1, ColorType::Rgba8888, AlphaType::Unpremultiplied),
            &src,
            &info(1, 1, ColorType::Rgba8888, AlphaType::Premultiplied),
            &mut dst,
        )
        .unwrap();
        assert_eq!(dst, [100, 50, 25, 128]);
    }

    #[test]
    fn gray_is_exact_for_gray_input() {
        let src = [0u8, 1, 127, 128, 254, 255];
        let mut rgba = [Rgba::new(0u8, 0, 0, 0); 6];
        expand_row(&src, SourceLayout::Gray, &mut rgba);
        let mut back = [0u8; 6];
        pack_row(&rgba, &mut back, ColorType::Gray8, AlphaType::Opaque);
        assert_eq!(back, src);
    }

    #[test]
    fn rgb565_packs_white_and_red() {
        let src = [Rgba::new(255u8, 255, 255, 255), Rgba::new(255, 0, 0, 255)];
        let mut dst = [0u8; 4];
        pack_row(&src, &mut dst, ColorType::Rgb565, AlphaType::Opaque);
        assert_eq!(u16::from_ne_bytes([dst[0], dst[1]]), 0xFFFF);
        assert_eq!(u16::from_ne_bytes([dst[2], dst[3]]), 0xF800);

        let mut back = [Rgba::new(0u8, 0, 0, 0); 2];
        unpack_row(&dst, ColorType::Rgb565, AlphaType::Opaque, &mut back);
        assert_eq!(back[0], Rgba::new(255, 255, 255, 255));
        assert_eq!(back[1], Rgba::new(255, 0, 0, 255));
    }

    #[test]
    fn rgba1010102_extremes() {
        let src = [Rgba::new(255u8, 0, 255, 255)];
        let mut dst = [0u8; 4];
        pack_row(&src, &mut dst, ColorType::Rgba1010102, AlphaType::Unpremultiplied);
        let v = u32::from_ne_bytes(dst);
        assert_eq!(v & 0x3FF, 0x3FF);
        assert_eq!((v >> 10) & 0x3FF, 0);
        assert_eq!((v >> 20) & 0x3FF, 0x3FF);
        assert_eq!(v >> 30, 3);
    }

    #[test]
    fn strides_are_respected() {
        let src_info = info(1, 2, ColorType::Gray8, AlphaType::Opaque)
            .with_row_bytes(3)
            .unwrap();
        let src = [7u8, 0xEE, 0xEE, 9];
        let dst_info = info(1, 2, ColorType::Alpha8, AlphaType::Premultiplied)
            .with_row_bytes(2)
            .unwrap();
        let mut dst = [0u8; 3];
        convert_pixels(&src_info, &src, &dst_info, &mut dst).unwrap();
        // Gray has no alpha, so every pixel becomes fully opaque.
        assert_eq!(dst, [255, 0, 255]);
    }

    #[test]
    fn mismatched_dimensions_rejected() {
        let mut dst = [0u8; 4];
        let result = convert_pixels(
            &info(2, 1, ColorType::Gray8, AlphaType::Opaque),
            &[0, 0],
            &info(1, 1, ColorType::Rgba8888, AlphaType::Premultiplied),
            &mut dst,
        );
        assert!(matches!(result, Err(CodecError::InvalidInput(_))));
    }
}
