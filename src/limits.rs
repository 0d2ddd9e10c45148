//! Resource limits.

use crate::CodecError;

/// Largest width or height accepted by default.
pub const MAX_VALID_SIZE: u32 = (1 << 29) - 1;

/// Resource limits for codec construction and decode/encode operations.
///
/// Used to reject hostile or absurd headers before any pixel work. The
/// width/height caps default to [`MAX_VALID_SIZE`]; pixel and memory caps
/// default to `None` (no limit).
#[derive(Clone, Debug)]
pub struct Limits {
    /// Maximum image width in pixels.
    pub max_width: Option<u64>,
    /// Maximum image height in pixels.
    pub max_height: Option<u64>,
    /// Maximum total pixels (width × height).
    pub max_pixels: Option<u64>,
    /// Maximum memory allocation in bytes for decoder-internal buffers.
    pub max_memory_bytes: Option<u64>,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_width: Some(MAX_VALID_SIZE as u64),
            max_height: Some(MAX_VALID_SIZE as u64),
            max_pixels: None,
            max_memory_bytes: None,
        }
    }
}

impl Limits {
    /// Create a new Limits with no restrictions beyond non-zero dimensions.
    pub fn none() -> Self {
        Self {
            max_width: None,
            max_height: None,
            max_pixels: None,
            max_memory_bytes: None,
        }
    }

    /// Set maximum width and height.
    pub fn with_max_size(mut self, width: u64, height: u64) -> Self {
        self.max_width = Some(width);
        self.max_height = Some(height);
        self
    }

    /// Set maximum total pixels.
    pub fn with_max_pixels(mut self, pixels: u64) -> Self {
        self.max_pixels = Some(pixels);
        self
    }

    /// Set maximum memory allocation in bytes.
    pub fn with_max_memory(mut self, bytes: u64) -> Self {
        self.max_memory_bytes = Some(bytes);
        self
    }

    /// Whether `width x height` is a valid image size under these limits.
    pub fn is_valid_size(&self, width: u32, height: u32) -> bool {
        self.check_dimensions(width, height).is_ok()
    }

    /// Check dimensions against limits.
    ///
    /// Zero-sized images are always rejected.
    pub fn check_dimensions(&self, width: u32, height: u32) -> Result<(), CodecError> {
        let invalid = CodecError::InvalidDimensions { width, height };
        if width == 0 || height == 0 {
            return Err(invalid);
        }
        if let Some(max_width) = self.max_width {
            if u64::from(width) > max_width {
                return Err(invalid);
            }
        }
        if let Some(max_height) = self.max_height {
            if u64::from(height) > max_height {
                return Err(invalid);
            }
        }
        if let Some(max_pixels) = self.max_pixels {
            let pixels = u64::from(width) * u64::from(height);
            if pixels > max_pixels {
                return Err(invalid);
            }
        }
        Ok(())
    }

    /// Check if a memory allocation is within limits.
    pub fn check_memory(&self, bytes: u64) -> Result<(), CodecError> {
        if let Some(max_memory) = self.max_memory_bytes {
            if bytes > max_memory {
                return Err(CodecError::LimitExceeded(format!(
                    "allocation {bytes} bytes exceeds memory limit {max_memory}"
                )));
            }
        }
        Ok(())
    }

    /// The memory cap as a byte count for decoder libraries; `usize::MAX`
    /// when unset.
    pub(crate) fn memory_cap(&self) -> usize {
        self.max_memory_bytes
            .map_or(usize::MAX, |bytes| usize::try_from(bytes).unwrap_or(usize::MAX))
    }
}
