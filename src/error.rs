//! Unified error types for codec operations.

use crate::format::ImageFormat;

/// Unified error type for codec operations.
///
/// Every failure of the codec subsystem surfaces as one of these values.
/// Nothing here panics or aborts; decoder-library failures are converted at
/// the call site and all per-call resources are released before returning.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum CodecError {
    /// Source is empty, missing, or unreadable.
    #[error("invalid source: {0}")]
    InvalidSource(String),

    /// No registered decoder claims the signature and the native fallback failed too.
    #[error("unrecognized image format")]
    UnrecognizedFormat,

    /// Format recognized but disabled in the codec registry.
    #[error("format {0:?} is disabled in the codec registry")]
    DisabledFormat(ImageFormat),

    /// Signature matched but the header could not be parsed.
    #[error("malformed {format:?} header: {detail}")]
    MalformedHeader {
        format: ImageFormat,
        detail: String,
    },

    /// Declared size is zero or exceeds the configured maximum.
    #[error("invalid image dimensions: {width}x{height}")]
    InvalidDimensions { width: u32, height: u32 },

    /// Caller-supplied target or source pixels are unusable.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// Format doesn't support the requested operation.
    #[error("format {format:?} does not support: {detail}")]
    UnsupportedOperation {
        format: ImageFormat,
        detail: &'static str,
    },

    /// Decoder library reported a fatal error while producing scanlines.
    #[error("{format:?} decode failed: {detail}")]
    DecodeFailure {
        format: ImageFormat,
        detail: String,
    },

    /// Embedded ICC profile could not be extracted, parsed, or applied.
    #[error("color profile unusable: {0}")]
    ColorProfileUnusable(String),

    /// Encoder library reported a failure.
    #[error("{format:?} encode failed: {detail}")]
    EncodeFailure {
        format: ImageFormat,
        detail: String,
    },

    /// Resource limit exceeded.
    #[error("limit exceeded: {0}")]
    LimitExceeded(String),

    #[error("i/o error: {0}")]
    Io(#[from] std::io::Error),
}

impl CodecError {
    /// Wrap a decoder-library error raised mid-decode.
    pub(crate) fn decode<E: core::fmt::Display>(format: ImageFormat, error: E) -> Self {
        CodecError::DecodeFailure {
            format,
            detail: error.to_string(),
        }
    }

    /// Wrap a decoder-library error raised while reading the header.
    pub(crate) fn header<E: core::fmt::Display>(format: ImageFormat, error: E) -> Self {
        CodecError::MalformedHeader {
            format,
            detail: error.to_string(),
        }
    }

    /// Wrap an encoder-library error.
    pub(crate) fn encode<E: core::fmt::Display>(format: ImageFormat, error: E) -> Self {
        CodecError::EncodeFailure {
            format,
            detail: error.to_string(),
        }
    }
}
