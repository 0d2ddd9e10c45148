//! Shared helpers for integration tests: synthetic images and JPEG segment splicing.

#![allow(dead_code)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};

use imagecodec::pixel::{AlphaType, ColorType, PixelInfo, Pixmap};
use imagecodec::{EncodeRequest, ImageFormat};

pub fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

/// A path under the temp dir that no other test in this process uses.
pub fn temp_path(name: &str) -> PathBuf {
    static COUNTER: AtomicUsize = AtomicUsize::new(0);
    let n = COUNTER.fetch_add(1, Ordering::Relaxed);
    std::env::temp_dir().join(format!("imagecodec-{}-{n}-{name}", std::process::id()))
}

/// Deleted on drop.
pub struct TempFile(pub PathBuf);

impl TempFile {
    pub fn new(name: &str, contents: &[u8]) -> Self {
        let path = temp_path(name);
        std::fs::write(&path, contents).unwrap();
        Self(path)
    }
}

impl Drop for TempFile {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.0);
    }
}

/// Unpremultiplied RGBA gradient with a varying alpha channel.
pub fn gradient_rgba(width: u32, height: u32, with_alpha: bool) -> Vec<u8> {
    let mut pixels = Vec::with_capacity((width * height * 4) as usize);
    for y in 0..height {
        for x in 0..width {
            pixels.push((x * 255 / width.max(1)) as u8);
            pixels.push((y * 255 / height.max(1)) as u8);
            pixels.push(((x + y) * 7 % 256) as u8);
            pixels.push(if with_alpha { (64 + (x * 3 + y) % 192) as u8 } else { 255 });
        }
    }
    pixels
}

pub fn encode_rgba(format: ImageFormat, width: u32, height: u32, pixels: &[u8]) -> Vec<u8> {
    let info = PixelInfo::new(width, height, ColorType::Rgba8888, AlphaType::Unpremultiplied);
    let pixmap = Pixmap::new(info, pixels).unwrap();
    EncodeRequest::new(format)
        .with_quality(90)
        .encode(&pixmap)
        .unwrap()
        .to_vec()
}

pub fn solid_jpeg(width: u32, height: u32, rgb: [u8; 3]) -> Vec<u8> {
    let pixels: Vec<u8> = (0..width * height)
        .flat_map(|_| [rgb[0], rgb[1], rgb[2], 255])
        .collect();
    encode_rgba(ImageFormat::Jpeg, width, height, &pixels)
}

/// One marker segment: `FF marker len payload`.
pub fn segment(marker: u8, payload: &[u8]) -> Vec<u8> {
    let len = u16::try_from(payload.len() + 2).unwrap();
    let mut out = vec![0xFF, marker];
    out.extend_from_slice(&len.to_be_bytes());
    out.extend_from_slice(payload);
    out
}

/// Insert `segments` right after the SOI marker.
pub fn splice_after_soi(jpeg: &[u8], segments: &[Vec<u8>]) -> Vec<u8> {
    assert_eq!(&jpeg[..2], &[0xFF, 0xD8], "not a JPEG stream");
    let mut out = jpeg[..2].to_vec();
    for seg in segments {
        out.extend_from_slice(seg);
    }
    out.extend_from_slice(&jpeg[2..]);
    out
}

/// Little-endian TIFF with a single IFD0 entry: Orientation (0x0112).
pub fn tiff_with_orientation(value: u16) -> Vec<u8> {
    let mut tiff = b"II*\0".to_vec();
    tiff.extend_from_slice(&8u32.to_le_bytes());
    tiff.extend_from_slice(&1u16.to_le_bytes());
    tiff.extend_from_slice(&0x0112u16.to_le_bytes());
    tiff.extend_from_slice(&3u16.to_le_bytes());
    tiff.extend_from_slice(&1u32.to_le_bytes());
    tiff.extend_from_slice(&value.to_le_bytes());
    tiff.extend_from_slice(&[0, 0]);
    tiff.extend_from_slice(&0u32.to_le_bytes());
    tiff
}

/// APP1 segment carrying an EXIF orientation.
pub fn exif_segment(orientation: u16) -> Vec<u8> {
    let mut payload = b"Exif\0\0".to_vec();
    payload.extend_from_slice(&tiff_with_orientation(orientation));
    segment(0xE1, &payload)
}

/// Split `profile` into APP2 ICC fragments of at most `chunk` bytes each,
/// numbered from 1, in storage order.
pub fn icc_segments(profile: &[u8], chunk: usize) -> Vec<Vec<u8>> {
    let chunks: Vec<&[u8]> = profile.chunks(chunk).collect();
    let count = u8::try_from(chunks.len()).unwrap();
    chunks
        .iter()
        .enumerate()
        .map(|(i, data)| {
            let mut payload = b"ICC_PROFILE\0".to_vec();
            payload.push(i as u8 + 1);
            payload.push(count);
            payload.extend_from_slice(data);
            segment(0xE2, &payload)
        })
        .collect()
}

/// Baseline CMYK JPEG straight from the encoder.
#[cfg(feature = "jpeg")]
pub fn cmyk_jpeg(width: u16, height: u16, cmyk: &[u8]) -> Vec<u8> {
    let mut out = Vec::new();
    jpeg_encoder::Encoder::new(&mut out, 95)
        .encode(cmyk, width, height, jpeg_encoder::ColorType::Cmyk)
        .unwrap();
    out
}

pub fn cmyk_pattern(width: u16, height: u16) -> Vec<u8> {
    let mut pixels = Vec::new();
    for y in 0..height {
        for x in 0..width {
            pixels.extend_from_slice(&[
                (x * 16) as u8,
                (y * 16) as u8,
                ((x + y) * 8) as u8,
                if x < width / 2 { 0 } else { 96 },
            ]);
        }
    }
    pixels
}

/// Minimal ICC v2 output profile: CMYK data, Lab PCS, lut8 A2B0.
pub fn cmyk_icc_profile() -> Vec<u8> {
    let s15 = |v: f64| ((v * 65536.0).round() as i32).to_be_bytes();

    let mut wtpt = b"XYZ \0\0\0\0".to_vec();
    for v in [0.9642, 1.0, 0.8249] {
        wtpt.extend_from_slice(&s15(v));
    }

    let mut lut = b"mft1\0\0\0\0".to_vec();
    lut.extend_from_slice(&[4, 3, 2, 0]);
    for i in 0..9 {
        let v = if i % 4 == 0 { 1.0 } else { 0.0 };
        lut.extend_from_slice(&s15(v));
    }
    for _ in 0..4 {
        lut.extend(0..=255u8);
    }
    // Grid corners, first channel slowest: lightness falls with ink.
    for corner in 0..16u32 {
        let k = corner & 1;
        let inks = (corner >> 1).count_ones();
        let l = if k == 1 { 20 } else { 255 - inks * 60 };
        lut.extend_from_slice(&[l as u8, 128, 128]);
    }
    for _ in 0..3 {
        lut.extend(0..=255u8);
    }

    let tags: [(&[u8; 4], &[u8]); 2] = [(b"wtpt", wtpt.as_slice()), (b"A2B0", lut.as_slice())];
    let table_len = 4 + tags.len() * 12;
    let mut offset = 128 + table_len;
    let mut table = (tags.len() as u32).to_be_bytes().to_vec();
    let mut data = Vec::new();
    for (sig, body) in tags {
        table.extend_from_slice(sig);
        table.extend_from_slice(&(offset as u32).to_be_bytes());
        table.extend_from_slice(&(body.len() as u32).to_be_bytes());
        data.extend_from_slice(body);
        while data.len() % 4 != 0 {
            data.push(0);
        }
        offset = 128 + table_len + data.len();
    }

    let total = 128 + table.len() + data.len();
    let mut header = Vec::with_capacity(128);
    header.extend_from_slice(&(total as u32).to_be_bytes());
    header.extend_from_slice(&[0; 4]);
    header.extend_from_slice(&[2, 0x10, 0, 0]);
    header.extend_from_slice(b"prtr");
    header.extend_from_slice(b"CMYK");
    header.extend_from_slice(b"Lab ");
    header.extend_from_slice(&[0; 12]);
    header.extend_from_slice(b"acsp");
    header.extend_from_slice(&[0; 24]);
    header.extend_from_slice(&[0; 4]);
    for v in [0.9642, 1.0, 0.8249] {
        header.extend_from_slice(&s15(v));
    }
    header.resize(128, 0);

    let mut profile = header;
    profile.extend_from_slice(&table);
    profile.extend_from_slice(&data);
    profile
}

/// Tight opaque RGBA8888 target for a codec.
pub fn rgba_target(width: u32, height: u32) -> (PixelInfo, Vec<u8>) {
    let info = PixelInfo::new(width, height, ColorType::Rgba8888, AlphaType::Premultiplied);
    let buf = vec![0u8; info.byte_size()];
    (info, buf)
}
