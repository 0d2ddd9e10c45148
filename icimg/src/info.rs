//! Image inspection: build codecs from headers without decoding pixels.

use std::path::Path;

use imagecodec::CodecContext;
use serde::Serialize;

use crate::InfoArgs;
use crate::batch;

/// Run the `info` subcommand.
pub fn run(args: InfoArgs) -> anyhow::Result<()> {
    let files = batch::expand_inputs(&args.files)?;
    if files.is_empty() {
        anyhow::bail!("no image files found");
    }

    let context = CodecContext::default();
    let multi = files.len() > 1;

    for (i, path) in files.iter().enumerate() {
        if multi && !args.json {
            if i > 0 {
                println!();
            }
            println!("{}:", path.display());
        }

        match inspect_file(&context, path) {
            Ok(info) => {
                if args.json {
                    println!("{}", serde_json::to_string_pretty(&info)?);
                } else {
                    print_info(&info);
                }
            }
            Err(e) => eprintln!("  error: {e}"),
        }
    }

    Ok(())
}

fn inspect_file(context: &CodecContext, path: &Path) -> anyhow::Result<ImageInfoDisplay> {
    let file_size = std::fs::metadata(path)?.len();
    let codec = context.make_from_path(path)?;
    let orientation = codec.orientation();
    let (display_width, display_height) =
        orientation.display_dimensions(codec.width(), codec.height());

    Ok(ImageInfoDisplay {
        path: path.display().to_string(),
        format: format!("{:?}", codec.format()),
        mime_type: codec.format().mime_type().to_string(),
        width: codec.width(),
        height: codec.height(),
        display_width,
        display_height,
        orientation: orientation.exif_value(),
        has_alpha: codec.has_alpha(),
        alpha_only: codec.is_alpha_only(),
        file_size,
    })
}

#[derive(Debug, Serialize)]
struct ImageInfoDisplay {
    path: String,
    format: String,
    mime_type: String,
    width: u32,
    height: u32,
    display_width: u32,
    display_height: u32,
    orientation: u16,
    has_alpha: bool,
    alpha_only: bool,
    file_size: u64,
}

fn print_info(info: &ImageInfoDisplay) {
    println!("  Format:       {} ({})", info.format, info.mime_type);
    println!("  Dimensions:   {}x{}", info.width, info.height);
    if info.display_width != info.width || info.display_height != info.height {
        println!(
            "  Display:      {}x{} (orientation: {})",
            info.display_width, info.display_height, info.orientation
        );
    } else if info.orientation != 1 {
        println!("  Orientation:  {}", info.orientation);
    }
    println!(
        "  Alpha:        {}",
        match (info.has_alpha, info.alpha_only) {
            (_, true) => "alpha only",
            (true, false) => "yes",
            (false, false) => "no",
        }
    );
    println!("  File size:    {}", batch::format_size(info.file_size));
}
