//! icimg: inspect and transcode images through `imagecodec`.

mod batch;
mod convert;
mod info;
mod output;

use clap::{Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(name = "icimg", version, about = "Inspect and transcode JPEG, PNG and WebP images")]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Read headers and print format, dimensions and orientation.
    Info(InfoArgs),

    /// Decode to RGBA and re-encode in another format.
    Convert(ConvertArgs),
}

/// Arguments for the `info` subcommand.
#[derive(Parser, Debug)]
pub struct InfoArgs {
    /// Input files or glob patterns.
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Output as JSON.
    #[arg(long)]
    pub json: bool,
}

/// Arguments for the `convert` subcommand.
#[derive(Parser, Debug)]
pub struct ConvertArgs {
    /// Input files or glob patterns.
    #[arg(required = true)]
    pub files: Vec<String>,

    /// Target output format.
    #[arg(short, long, value_enum)]
    pub format: FormatArg,

    /// Quality (clamped to 0-100; ignored by lossless formats).
    #[arg(short, long, default_value_t = 90, allow_negative_numbers = true)]
    pub quality: i32,

    /// Output file or directory (dir/ with trailing slash for batch).
    #[arg(short, long)]
    pub output: Option<String>,

    /// Allow overwriting existing files.
    #[arg(long)]
    pub force: bool,

    /// Number of parallel workers (default: CPU count).
    #[arg(short = 'j', long)]
    pub jobs: Option<usize>,

    /// Print a summary table after converting.
    #[arg(long)]
    pub report: bool,
}

/// Target image format.
#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum FormatArg {
    Jpeg,
    Png,
    Webp,
}

impl FormatArg {
    pub fn to_image_format(self) -> imagecodec::ImageFormat {
        match self {
            FormatArg::Jpeg => imagecodec::ImageFormat::Jpeg,
            FormatArg::Png => imagecodec::ImageFormat::Png,
            FormatArg::Webp => imagecodec::ImageFormat::WebP,
        }
    }
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    match Cli::parse().command {
        Command::Info(args) => info::run(args),
        Command::Convert(args) => convert::run(args),
    }
}
