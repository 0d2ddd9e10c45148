//! CMYK to RGB color conversion.
//!
//! A CMYK JPEG is decoded without any library-side color conversion and
//! finished here: through its embedded ICC profile when one parses (via
//! `moxcms`, behind the `cms` feature), otherwise according to the
//! configured [`CmykFallback`].

use log::{debug, warn};

use crate::CodecError;

/// What to do with CMYK pixels when no usable ICC profile is available.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum CmykFallback {
    /// Leave the decoded CMYK channel values in the target untouched.
    Untransformed,
    /// Naive ink model: `r = (255 - c) * (255 - k) / 255`, and so on.
    #[default]
    Approximate,
    /// Fail the decode with [`CodecError::ColorProfileUnusable`].
    Fail,
}

/// Channel order of the 4-byte target that receives converted pixels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum ChannelOrder {
    Rgba,
    Bgra,
}

/// Mutable view over 4-byte-per-pixel rows holding CMYK.
pub(crate) struct CmykRows<'a> {
    pub pixels: &'a mut [u8],
    pub width: usize,
    pub height: usize,
    pub row_bytes: usize,
}

impl CmykRows<'_> {
    fn for_each_row(
        &mut self,
        mut f: impl FnMut(&mut [u8]) -> Result<(), CodecError>,
    ) -> Result<(), CodecError> {
        let len = self.width * 4;
        for row in self
            .pixels
            .chunks_mut(self.row_bytes)
            .take(self.height)
        {
            f(&mut row[..len])?;
        }
        Ok(())
    }
}

/// Convert CMYK rows in place to opaque RGBA or BGRA.
///
/// `icc` is the reassembled embedded profile, if the image carried one.
pub(crate) fn finish_cmyk(
    icc: Option<&[u8]>,
    fallback: CmykFallback,
    mut rows: CmykRows<'_>,
    order: ChannelOrder,
) -> Result<(), CodecError> {
    let unusable = match icc {
        Some(profile) => match CmykTransform::new(profile) {
            Ok(transform) => {
                debug!("applying embedded ICC profile ({} bytes)", profile.len());
                return rows.for_each_row(|row| transform.apply(row, order));
            }
            Err(err) => err,
        },
        None => CodecError::ColorProfileUnusable("no complete embedded ICC profile".into()),
    };

    match fallback {
        CmykFallback::Fail => Err(unusable),
        CmykFallback::Untransformed => {
            warn!("{unusable}; leaving CMYK values untransformed");
            Ok(())
        }
        CmykFallback::Approximate => {
            warn!("{unusable}; using approximate CMYK conversion");
            rows.for_each_row(|row| {
                approximate_row(row, order);
                Ok(())
            })
        }
    }
}

/// Naive CMYK to RGB without a profile.
pub fn cmyk_to_rgb_approx(c: u8, m: u8, y: u8, k: u8) -> [u8; 3] {
    let k = 255 - u32::from(k);
    let ch = |v: u8| (((255 - u32::from(v)) * k + 127) / 255) as u8;
    [ch(c), ch(m), ch(y)]
}

fn approximate_row(row: &mut [u8], order: ChannelOrder) {
    for px in row.chunks_exact_mut(4) {
        let [r, g, b] = cmyk_to_rgb_approx(px[0], px[1], px[2], px[3]);
        px.copy_from_slice(&match order {
            ChannelOrder::Rgba => [r, g, b, 255],
            ChannelOrder::Bgra => [b, g, r, 255],
        });
    }
}

fn finish_row(row: &mut [u8], order: ChannelOrder) {
    for px in row.chunks_exact_mut(4) {
        px[3] = 255;
        if order == ChannelOrder::Bgra {
            px.swap(0, 2);
        }
    }
}

/// A parsed CMYK profile bound to an sRGB destination.
#[cfg(feature = "cms")]
pub struct CmykTransform {
    executor: std::sync::Arc<dyn moxcms::TransformExecutor<u8> + Send + Sync>,
}

#[cfg(feature = "cms")]
impl CmykTransform {
    /// Parse `icc` and build a CMYK to sRGB transform.
    pub fn new(icc: &[u8]) -> Result<Self, CodecError> {
        use moxcms::{ColorProfile, DataColorSpace, Layout, TransformOptions};

        let profile = ColorProfile::new_from_slice(icc)
            .map_err(|e| CodecError::ColorProfileUnusable(format!("{e:?}")))?;
        if profile.color_space != DataColorSpace::Cmyk {
            return Err(CodecError::ColorProfileUnusable(format!(
                "expected a CMYK profile, got {:?}",
                profile.color_space
            )));
        }
        let executor = profile
            .create_transform_8bit(
                Layout::Rgba,
                &ColorProfile::new_srgb(),
                Layout::Rgba,
                TransformOptions::default(),
            )
            .map_err(|e| CodecError::ColorProfileUnusable(format!("{e:?}")))?;
        Ok(Self { executor })
    }

    /// Transform one row of 4-byte CMYK pixels in place into opaque RGBA.
    pub fn transform_row(&self, row: &mut [u8]) -> Result<(), CodecError> {
        let src: Vec<u8> = row.to_vec();
        self.executor
            .transform(&src, row)
            .map_err(|e| CodecError::ColorProfileUnusable(format!("{e:?}")))?;
        finish_row(row, ChannelOrder::Rgba);
        Ok(())
    }

    pub(crate) fn apply(&self, row: &mut [u8], order: ChannelOrder) -> Result<(), CodecError> {
        self.transform_row(row)?;
        if order == ChannelOrder::Bgra {
            row.chunks_exact_mut(4).for_each(|px| px.swap(0, 2));
        }
        Ok(())
    }
}

/// Stand-in when color management is compiled out; never constructs.
#[cfg(not(feature = "cms"))]
pub struct CmykTransform(());

#[cfg(not(feature = "cms"))]
impl CmykTransform {
    pub fn new(_icc: &[u8]) -> Result<Self, CodecError> {
        Err(CodecError::ColorProfileUnusable(
            "color management not compiled in".into(),
        ))
    }

    pub fn transform_row(&self, row: &mut [u8]) -> Result<(), CodecError> {
        finish_row(row, ChannelOrder::Rgba);
        Ok(())
    }

    pub(crate) fn apply(&self, row: &mut [u8], order: ChannelOrder) -> Result<(), CodecError> {
        finish_row(row, order);
        Ok(())
    }
}
