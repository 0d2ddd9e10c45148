//! Path-keyed codec cache.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError, Weak};

use log::debug;

use crate::Codec;

/// Deduplicates codec construction for file sources.
///
/// Entries are weak: the cache never keeps a codec alive. While any strong
/// reference to the codec for a path exists, lookups for that path return
/// that same object; once the last one drops, the next lookup misses and the
/// file is parsed again. Dead entries are swept lazily on lookup, or in bulk
/// by [`purge`](Self::purge).
#[derive(Debug, Default)]
pub struct CodecCache {
    entries: Mutex<HashMap<PathBuf, Weak<Codec>>>,
}

impl CodecCache {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, Weak<Codec>>> {
        // A panic while holding the lock cannot leave the map half-updated.
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// The live codec for `path`, if any.
    pub fn get(&self, path: &Path) -> Option<Arc<Codec>> {
        let mut entries = self.lock();
        let weak = entries.get(path)?;
        match weak.upgrade() {
            Some(codec) => {
                debug!("codec cache hit: {}", path.display());
                Some(codec)
            }
            None => {
                entries.remove(path);
                None
            }
        }
    }

    /// Insert `codec` for `path` unless a live codec is already cached.
    ///
    /// Returns the cached codec: the existing one if another caller won the
    /// race, `codec` otherwise.
    pub fn insert(&self, path: &Path, codec: Arc<Codec>) -> Arc<Codec> {
        let mut entries = self.lock();
        if let Some(existing) = entries.get(path).and_then(Weak::upgrade) {
            debug!("codec cache race lost for {}", path.display());
            return existing;
        }
        entries.insert(path.to_path_buf(), Arc::downgrade(&codec));
        codec
    }

    /// Drop the entry for `path`.
    pub fn remove(&self, path: &Path) {
        self.lock().remove(path);
    }

    /// Sweep dead entries; returns how many were removed.
    pub fn purge(&self) -> usize {
        let mut entries = self.lock();
        let before = entries.len();
        entries.retain(|_, weak| weak.strong_count() > 0);
        before - entries.len()
    }

    /// Number of entries, dead ones included until swept.
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::codec::{FormatCodec, ImageHeader};
    use crate::pixel::PixelInfo;
    use crate::{CodecError, ImageFormat, ImageSource, Limits};

    #[derive(Debug)]
    struct Fixed;

    impl FormatCodec for Fixed {
        fn format(&self) -> ImageFormat {
            ImageFormat::Native
        }

        fn read_header(&self, _source: &ImageSource) -> Result<ImageHeader, CodecError> {
            Ok(ImageHeader::new(1, 1))
        }

        fn read_pixels(
            &self,
            _source: &ImageSource,
            _header: &ImageHeader,
            _dst_info: &PixelInfo,
            _dst: &mut [u8],
            _limits: &Limits,
        ) -> Result<(), CodecError> {
            Ok(())
        }
    }

    fn codec(path: &str) -> Arc<Codec> {
        let source = ImageSource::from_path(path).unwrap();
        Arc::new(Codec::open(Arc::new(Fixed), source).unwrap())
    }

    #[test]
    fn hit_returns_same_identity() {
        let cache = CodecCache::new();
        let path = Path::new("/img/a.jpg");
        let first = cache.insert(path, codec("/img/a.jpg"));
        let hit = cache.get(path).unwrap();
        assert!(Arc::ptr_eq(&first, &hit));
    }

    #[test]
    fn first_insert_wins() {
        let cache = CodecCache::new();
        let path = Path::new("/img/a.jpg");
        let winner = cache.insert(path, codec("/img/a.jpg"));
        let loser = codec("/img/a.jpg");
        let returned = cache.insert(path, loser.clone());
        assert!(Arc::ptr_eq(&winner, &returned));
        assert!(!Arc::ptr_eq(&loser, &returned));
    }

    #[test]
    fn entries_do_not_keep_codecs_alive() {
        let cache = CodecCache::new();
        let path = Path::new("/img/b.png");
        let strong = cache.insert(path, codec("/img/b.png"));
        let weak = Arc::downgrade(&strong);
        drop(strong);
        assert!(weak.upgrade().is_none());
        assert_eq!(cache.len(), 1);
        assert!(cache.get(path).is_none());
        assert!(cache.is_empty());
    }

    #[test]
    fn purge_sweeps_dead_entries() {
        let cache = CodecCache::new();
        let live = cache.insert(Path::new("/a"), codec("/a"));
        drop(cache.insert(Path::new("/b"), codec("/b")));
        drop(cache.insert(Path::new("/c"), codec("/c")));
        assert_eq!(cache.purge(), 2);
        assert_eq!(cache.len(), 1);
        assert!(cache.get(Path::new("/a")).is_some());
        drop(live);
    }

    #[test]
    fn dead_entry_is_replaced() {
        let cache = CodecCache::new();
        let path = Path::new("/img/c.webp");
        drop(cache.insert(path, codec("/img/c.webp")));
        let fresh = codec("/img/c.webp");
        let returned = cache.insert(path, fresh.clone());
        assert!(Arc::ptr_eq(&fresh, &returned));
    }
}
