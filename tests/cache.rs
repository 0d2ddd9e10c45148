#![cfg(feature = "png")]

mod common;

use std::sync::Arc;
use std::thread;

use common::*;
use imagecodec::{CodecContext, ImageFormat};

fn png_file(name: &str) -> TempFile {
    let pixels = gradient_rgba(5, 7, true);
    TempFile::new(name, &encode_rgba(ImageFormat::Png, 5, 7, &pixels))
}

#[test]
fn same_path_shares_live_codec() {
    init_logging();
    let file = png_file("shared.png");
    let context = CodecContext::default();

    let first = context.make_from_path(&file.0).unwrap();
    let second = context.make_from_path(&file.0).unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(context.cache().len(), 1);
}

#[test]
fn cache_hit_does_not_reopen_file() {
    let file = png_file("deleted.png");
    let context = CodecContext::default();

    let first = context.make_from_path(&file.0).unwrap();
    std::fs::remove_file(&file.0).unwrap();
    let second = context.make_from_path(&file.0).unwrap();
    assert!(Arc::ptr_eq(&first, &second));

    drop((first, second));
    assert!(context.make_from_path(&file.0).is_err());
}

#[test]
fn dropped_codec_is_rebuilt() {
    let file = png_file("rebuilt.png");
    let context = CodecContext::default();

    let first = context.make_from_path(&file.0).unwrap();
    let (w, h) = (first.width(), first.height());
    drop(first);
    assert!(context.cache().get(&file.0).is_none());

    let again = context.make_from_path(&file.0).unwrap();
    assert_eq!((again.width(), again.height()), (w, h));
    assert_eq!(context.cache().len(), 1);
}

#[test]
fn purge_sweeps_dead_entries() {
    let a = png_file("purge-a.png");
    let b = png_file("purge-b.png");
    let context = CodecContext::default();

    let keep = context.make_from_path(&a.0).unwrap();
    drop(context.make_from_path(&b.0).unwrap());
    assert_eq!(context.cache().len(), 2);
    assert_eq!(context.cache().purge(), 1);
    assert_eq!(context.cache().len(), 1);

    context.cache().remove(&a.0);
    assert!(context.cache().is_empty());
    drop(keep);
}

#[test]
fn blobs_bypass_cache() {
    let pixels = gradient_rgba(5, 7, false);
    let data: Arc<[u8]> = encode_rgba(ImageFormat::Png, 5, 7, &pixels).into();
    let context = CodecContext::default();

    let first = context.make_from_bytes(data.clone()).unwrap();
    let second = context.make_from_bytes(data).unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert!(context.cache().is_empty());
}

#[test]
fn concurrent_callers_converge() {
    let file = png_file("concurrent.png");
    let context = Arc::new(CodecContext::default());

    let codecs: Vec<_> = (0..8)
        .map(|_| {
            let context = Arc::clone(&context);
            let path = file.0.clone();
            thread::spawn(move || context.make_from_path(path).unwrap())
        })
        .collect::<Vec<_>>()
        .into_iter()
        .map(|handle| handle.join().unwrap())
        .collect();

    // Every thread got a valid codec; the cache holds at most one live entry.
    assert!(codecs.iter().all(|c| c.width() == 5 && c.height() == 7));
    let cached = context.cache().get(&file.0).unwrap();
    assert!(codecs.iter().any(|c| Arc::ptr_eq(c, &cached)));
    assert_eq!(context.cache().len(), 1);
}
