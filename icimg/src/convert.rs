//! Transcoding: decode to RGBA, re-encode in the target format.

use std::path::{Path, PathBuf};
use std::sync::Mutex;
use std::time::Instant;

use anyhow::Context;
use imagecodec::pixel::{AlphaType, ColorType, PixelInfo};
use imagecodec::{Bitmap, CodecContext};
use indicatif::{ProgressBar, ProgressStyle};
use log::debug;
use rayon::prelude::*;

use crate::ConvertArgs;
use crate::batch::{self, BatchSummary, FileResult};
use crate::output::OutputConfig;

/// Run the `convert` subcommand.
pub fn run(args: ConvertArgs) -> anyhow::Result<()> {
    let files = batch::expand_inputs(&args.files)?;
    if files.is_empty() {
        anyhow::bail!("no image files found");
    }

    let context = CodecContext::default();
    let output = OutputConfig::new(
        args.output.as_deref(),
        args.force,
        args.format.to_image_format(),
    );
    let summary = Mutex::new(BatchSummary::default());
    let count = files.len();

    if count == 1 {
        let result = convert_one(&context, &files[0], &args, &output, count);
        match (&result.error, &result.output_path, result.output_size) {
            (Some(err), _, _) => eprintln!("error: {}: {err}", files[0].display()),
            (None, Some(path), Some(size)) => eprintln!(
                "{} -> {} ({})",
                batch::format_size(result.input_size),
                batch::format_size(size),
                path.display()
            ),
            _ => {}
        }
        lock(&summary).push(result);
    } else {
        let jobs = args.jobs.unwrap_or_else(|| {
            std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(1)
        });
        let pool = rayon::ThreadPoolBuilder::new().num_threads(jobs).build()?;

        let pb = ProgressBar::new(count as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{bar:40.cyan/blue}] {pos}/{len} ({eta})")?
                .progress_chars("=>-"),
        );

        pool.install(|| {
            files.par_iter().for_each(|path| {
                let result = convert_one(&context, path, &args, &output, count);
                if let Some(err) = &result.error {
                    pb.println(format!("error: {}: {err}", path.display()));
                }
                lock(&summary).push(result);
                pb.inc(1);
            });
        });
        pb.finish_and_clear();
    }

    let summary = summary
        .into_inner()
        .unwrap_or_else(std::sync::PoisonError::into_inner);
    if args.report {
        summary.print_report();
    }
    if summary.error_count() > 0 {
        anyhow::bail!("{} of {} files failed", summary.error_count(), count);
    }
    Ok(())
}

fn lock(summary: &Mutex<BatchSummary>) -> std::sync::MutexGuard<'_, BatchSummary> {
    summary.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn convert_one(
    context: &CodecContext,
    input: &Path,
    args: &ConvertArgs,
    output: &OutputConfig,
    count: usize,
) -> FileResult {
    let start = Instant::now();
    let input_size = std::fs::metadata(input).map(|m| m.len()).unwrap_or(0);
    let (output_path, output_size, error) = match transcode(context, input, args, output, count) {
        Ok((path, size)) => (Some(path), Some(size), None),
        Err(e) => (None, None, Some(format!("{e:#}"))),
    };
    FileResult {
        input_path: input.to_path_buf(),
        input_size,
        output_path,
        output_size,
        error,
        duration: start.elapsed(),
    }
}

fn transcode(
    context: &CodecContext,
    input: &Path,
    args: &ConvertArgs,
    output: &OutputConfig,
    count: usize,
) -> anyhow::Result<(PathBuf, u64)> {
    let out_path = output.resolve(input, count)?;
    output.check_writable(input, &out_path)?;

    let codec = context
        .make_from_path(input)
        .with_context(|| format!("reading {}", input.display()))?;

    // Straight alpha, so lossless targets keep color under transparency.
    let info = PixelInfo::new(
        codec.width(),
        codec.height(),
        ColorType::Rgba8888,
        AlphaType::Unpremultiplied,
    );
    let mut bitmap = Bitmap::new(info);
    codec.read_pixels(&info, bitmap.pixels_mut())?;

    let format = args.format.to_image_format();
    debug!(
        "{}: {:?} {}x{} -> {format:?}",
        input.display(),
        codec.format(),
        codec.width(),
        codec.height()
    );
    let encoded = context.encode(&bitmap.as_pixmap(), format, args.quality)?;

    OutputConfig::ensure_parent(&out_path)?;
    std::fs::write(&out_path, &encoded)
        .with_context(|| format!("writing {}", out_path.display()))?;
    Ok((out_path, encoded.len() as u64))
}
