//! Image format detection and metadata.

/// Number of leading bytes read from a file before dispatch.
///
/// Enough to tell every registered format apart (WebP needs 12).
pub const SIGNATURE_LEN: usize = 14;

/// Supported image formats.
#[non_exhaustive]
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ImageFormat {
    Jpeg,
    Png,
    WebP,
    /// Decoded by a caller-supplied platform decoder.
    Native,
}

impl ImageFormat {
    /// Detect format from magic bytes. Returns None if unrecognized.
    ///
    /// Checks in dispatch priority order: WebP, PNG, JPEG.
    pub fn detect(data: &[u8]) -> Option<Self> {
        if is_webp(data) {
            return Some(ImageFormat::WebP);
        }
        if is_png(data) {
            return Some(ImageFormat::Png);
        }
        if is_jpeg(data) {
            return Some(ImageFormat::Jpeg);
        }
        None
    }

    /// Whether `data` starts with this format's signature.
    ///
    /// Always false for [`ImageFormat::Native`], which has no signature.
    pub fn matches_signature(self, data: &[u8]) -> bool {
        match self {
            ImageFormat::Jpeg => is_jpeg(data),
            ImageFormat::Png => is_png(data),
            ImageFormat::WebP => is_webp(data),
            ImageFormat::Native => false,
        }
    }

    /// Detect format from file extension (case-insensitive).
    pub fn from_extension(ext: &str) -> Option<Self> {
        match ext.to_lowercase().as_str() {
            "jpg" | "jpeg" | "jpe" | "jfif" => Some(ImageFormat::Jpeg),
            "webp" => Some(ImageFormat::WebP),
            "png" => Some(ImageFormat::Png),
            _ => None,
        }
    }

    /// MIME type string.
    pub fn mime_type(self) -> &'static str {
        match self {
            ImageFormat::Jpeg => "image/jpeg",
            ImageFormat::WebP => "image/webp",
            ImageFormat::Png => "image/png",
            ImageFormat::Native => "application/octet-stream",
        }
    }

    /// Common file extensions.
    pub fn extensions(self) -> &'static [&'static str] {
        match self {
            ImageFormat::Jpeg => &["jpg", "jpeg", "jpe", "jfif"],
            ImageFormat::WebP => &["webp"],
            ImageFormat::Png => &["png"],
            ImageFormat::Native => &[],
        }
    }
}

// JPEG: FF D8 FF
fn is_jpeg(data: &[u8]) -> bool {
    data.len() >= 3 && data[..3] == [0xFF, 0xD8, 0xFF]
}

// PNG: 89 50 4E 47 0D 0A 1A 0A
fn is_png(data: &[u8]) -> bool {
    data.len() >= 8 && data[..8] == [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]
}

// WebP: "RIFF....WEBP"
fn is_webp(data: &[u8]) -> bool {
    data.len() >= 12 && &data[0..4] == b"RIFF" && &data[8..12] == b"WEBP"
}
