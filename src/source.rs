//! Encoded byte sources.
//!
//! A codec never keeps a file handle or a decoder open between calls. It
//! keeps an [`ImageSource`] and reopens it for every header read, pixel
//! decode, or `encoded_data` request.

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, BufRead, BufReader, Cursor, Read, Seek, SeekFrom};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::CodecError;
use crate::format::SIGNATURE_LEN;

/// Where a codec's encoded bytes live.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum ImageSource {
    /// A file, reopened on every access.
    Path(PathBuf),
    /// An immutable, shared in-memory blob.
    Bytes(Arc<[u8]>),
}

impl ImageSource {
    /// File source. Empty paths are rejected.
    pub fn from_path(path: impl Into<PathBuf>) -> Result<Self, CodecError> {
        let path = path.into();
        if path.as_os_str().is_empty() {
            return Err(CodecError::InvalidSource("empty path".into()));
        }
        Ok(ImageSource::Path(path))
    }

    /// Blob source. Empty blobs are rejected.
    pub fn from_bytes(bytes: impl Into<Arc<[u8]>>) -> Result<Self, CodecError> {
        let bytes = bytes.into();
        if bytes.is_empty() {
            return Err(CodecError::InvalidSource("empty data".into()));
        }
        Ok(ImageSource::Bytes(bytes))
    }

    pub fn path(&self) -> Option<&Path> {
        match self {
            ImageSource::Path(path) => Some(path),
            ImageSource::Bytes(_) => None,
        }
    }

    /// Open a fresh reader positioned at the start of the data.
    pub fn open(&self) -> Result<SourceReader, CodecError> {
        match self {
            ImageSource::Path(path) => {
                let file = File::open(path).map_err(|e| {
                    CodecError::InvalidSource(format!("{}: {e}", path.display()))
                })?;
                Ok(SourceReader::File(BufReader::new(file)))
            }
            ImageSource::Bytes(bytes) => Ok(SourceReader::Memory(Cursor::new(bytes.clone()))),
        }
    }

    /// Leading bytes used for signature sniffing.
    ///
    /// At most [`SIGNATURE_LEN`] bytes for files; the whole blob for
    /// memory sources. A short read is not an error.
    pub fn signature(&self) -> Result<Cow<'_, [u8]>, CodecError> {
        match self {
            ImageSource::Path(_) => {
                let mut prefix = Vec::with_capacity(SIGNATURE_LEN);
                self.open()?
                    .take(SIGNATURE_LEN as u64)
                    .read_to_end(&mut prefix)?;
                if prefix.is_empty() {
                    return Err(CodecError::InvalidSource("empty file".into()));
                }
                Ok(Cow::Owned(prefix))
            }
            ImageSource::Bytes(bytes) => Ok(Cow::Borrowed(&bytes[..])),
        }
    }

    /// The complete encoded data.
    pub fn read_all(&self) -> Result<Arc<[u8]>, CodecError> {
        match self {
            ImageSource::Path(path) => Ok(std::fs::read(path)?.into()),
            ImageSource::Bytes(bytes) => Ok(bytes.clone()),
        }
    }
}

/// Buffered reader over either source kind.
pub enum SourceReader {
    File(BufReader<File>),
    Memory(Cursor<Arc<[u8]>>),
}

impl Read for SourceReader {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        match self {
            SourceReader::File(r) => r.read(buf),
            SourceReader::Memory(r) => r.read(buf),
        }
    }
}

impl BufRead for SourceReader {
    fn fill_buf(&mut self) -> io::Result<&[u8]> {
        match self {
            SourceReader::File(r) => r.fill_buf(),
            SourceReader::Memory(r) => r.fill_buf(),
        }
    }

    fn consume(&mut self, amt: usize) {
        match self {
            SourceReader::File(r) => r.consume(amt),
            SourceReader::Memory(r) => r.consume(amt),
        }
    }
}

impl Seek for SourceReader {
    fn seek(&mut self, pos: SeekFrom) -> io::Result<u64> {
        match self {
            SourceReader::File(r) => r.seek(pos),
            SourceReader::Memory(r) => r.seek(pos),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_sources_rejected() {
        assert!(matches!(
            ImageSource::from_path(""),
            Err(CodecError::InvalidSource(_))
        ));
        assert!(matches!(
            ImageSource::from_bytes(Vec::new()),
            Err(CodecError::InvalidSource(_))
        ));
    }

    #[test]
    fn missing_file_is_invalid_source() {
        let source = ImageSource::from_path("/definitely/not/here.jpg").unwrap();
        assert!(matches!(source.open(), Err(CodecError::InvalidSource(_))));
    }

    #[test]
    fn file_signature_is_capped() {
        let path = std::env::temp_dir().join(format!(
            "imagecodec-source-{}.bin",
            std::process::id()
        ));
        std::fs::write(&path, [7u8; 64]).unwrap();
        let source = ImageSource::from_path(&path).unwrap();
        assert_eq!(source.signature().unwrap().len(), SIGNATURE_LEN);
        assert_eq!(source.read_all().unwrap().len(), 64);
        std::fs::remove_file(&path).unwrap();
    }

    #[test]
    fn memory_reader_rewinds_each_open() {
        let source = ImageSource::from_bytes(vec![1u8, 2, 3]).unwrap();
        let mut first = Vec::new();
        source.open().unwrap().read_to_end(&mut first).unwrap();
        let mut second = Vec::new();
        source.open().unwrap().read_to_end(&mut second).unwrap();
        assert_eq!(first, second);
        assert_eq!(&*source.signature().unwrap(), &[1u8, 2, 3][..]);
    }
}
