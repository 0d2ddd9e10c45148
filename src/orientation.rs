//! EXIF orientation support.

/// Signature that opens an EXIF block inside a JPEG APP1 segment or a
/// WebP `EXIF` chunk: `"Exif"` plus two fill bytes.
pub(crate) const EXIF_SIGNATURE: &[u8; 6] = b"Exif\0\0";

/// EXIF orientation tag values.
///
/// Describes how the stored pixels should be transformed for display.
/// Values match the EXIF Orientation tag (TIFF tag 274). Codecs never apply
/// the transform themselves; it is reported so the caller can.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Orientation {
    /// No rotation or flip needed.
    #[default]
    TopLeft = 1,
    /// Mirror left-right.
    FlipHorizontal = 2,
    Rotate180 = 3,
    /// Mirror top-bottom.
    FlipVertical = 4,
    /// Rotate 90 CW then flip horizontally.
    Transpose = 5,
    /// Rotate 90 degrees clockwise.
    Rotate90 = 6,
    /// Rotate 90 CCW then flip horizontally.
    Transverse = 7,
    /// Rotate 270 degrees clockwise.
    Rotate270 = 8,
}

impl Orientation {
    /// Create from EXIF orientation value (1-8).
    ///
    /// Returns [`TopLeft`](Orientation::TopLeft) for out-of-range values.
    pub fn from_exif(value: u16) -> Self {
        match value {
            2 => Self::FlipHorizontal,
            3 => Self::Rotate180,
            4 => Self::FlipVertical,
            5 => Self::Transpose,
            6 => Self::Rotate90,
            7 => Self::Transverse,
            8 => Self::Rotate270,
            _ => Self::TopLeft,
        }
    }

    /// EXIF tag value (1-8).
    pub fn exif_value(self) -> u16 {
        self as u16
    }

    /// Whether this orientation swaps width and height (values 5-8).
    pub fn swaps_dimensions(self) -> bool {
        matches!(
            self,
            Self::Transpose | Self::Rotate90 | Self::Transverse | Self::Rotate270
        )
    }

    /// Display dimensions for the given stored dimensions.
    pub fn display_dimensions(self, stored_width: u32, stored_height: u32) -> (u32, u32) {
        if self.swaps_dimensions() {
            (stored_height, stored_width)
        } else {
            (stored_width, stored_height)
        }
    }

    pub fn is_identity(self) -> bool {
        matches!(self, Self::TopLeft)
    }

    /// Read the orientation tag from an EXIF block.
    ///
    /// `payload` is either a bare TIFF structure or one prefixed with
    /// [`EXIF_SIGNATURE`]. Missing or malformed data yields `None`.
    pub fn parse_exif(payload: &[u8]) -> Option<Self> {
        let tiff = payload.strip_prefix(EXIF_SIGNATURE).unwrap_or(payload);
        let exif = exif::Reader::new().read_raw(Vec::from(tiff)).ok()?;
        let field = exif.get_field(exif::Tag::Orientation, exif::In::PRIMARY)?;
        let value = field.value.get_uint(0)?;
        match value {
            1..=8 => Some(Self::from_exif(value as u16)),
            _ => None,
        }
    }
}
