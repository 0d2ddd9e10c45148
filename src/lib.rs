//! # imagecodec
//!
//! Image codec subsystem: format sniffing and dispatch, header-only codec
//! construction, decoding into caller-chosen pixel layouts, and re-encoding.
//!
//! Each built-in codec is feature-gated. Enable only what you need:
//!
//! ```toml
//! [dependencies]
//! imagecodec = { version = "0.1", default-features = false, features = ["jpeg", "png"] }
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use imagecodec::{AlphaType, CodecContext, ColorType, ImageFormat, PixelInfo};
//!
//! let context = CodecContext::default();
//! let codec = context.make_from_path("photo.jpg")?;
//!
//! // Decode into a BGRA target with padded rows.
//! let (width, height) = (codec.width(), codec.height());
//! let info = PixelInfo::new(width, height, ColorType::Bgra8888, AlphaType::Premultiplied)
//!     .with_row_bytes(width as usize * 4 + 64)?;
//! let mut pixels = vec![0u8; info.byte_size()];
//! codec.read_pixels(&info, &mut pixels)?;
//!
//! // Re-encode as PNG.
//! let bitmap = codec.make_bitmap()?;
//! let png = context.encode(&bitmap.as_pixmap(), ImageFormat::Png, 100)?;
//! # let _ = png;
//! # Ok::<(), imagecodec::CodecError>(())
//! ```

#![forbid(unsafe_code)]

mod cache;
mod codec;
pub mod codecs;
mod color;
pub mod config;
mod context;
pub mod convert;
mod decode;
mod encode;
mod error;
mod format;
mod limits;
mod orientation;
pub mod pixel;
mod registry;
mod source;

pub use cache::CodecCache;
pub use codec::{Codec, FormatCodec, ImageHeader};
pub use color::{CmykFallback, CmykTransform, cmyk_to_rgb_approx};
pub use context::CodecContext;
pub use decode::DecodeRequest;
pub use encode::{DEFAULT_QUALITY, EncodeRequest};
pub use error::CodecError;
pub use format::{ImageFormat, SIGNATURE_LEN};
pub use limits::{Limits, MAX_VALID_SIZE};
pub use orientation::Orientation;
pub use pixel::{AlphaType, Bitmap, ColorType, PixelInfo, Pixmap};
pub use registry::CodecRegistry;
pub use source::{ImageSource, SourceReader};
