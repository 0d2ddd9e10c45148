//! Input expansion and batch reporting.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use imagecodec::ImageFormat;

/// Expand input patterns into a deduplicated list of image files.
///
/// Glob patterns and directories only pick up files with a known image
/// extension; plain file paths are taken as given. Larger files come first
/// so parallel workers finish together.
pub fn expand_inputs(patterns: &[String]) -> anyhow::Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut files = Vec::new();

    for pattern in patterns {
        if pattern.contains(['*', '?', '[']) {
            for entry in glob::glob(pattern)? {
                let path = entry?;
                if path.is_file() && is_image(&path) {
                    push_unique(path, &mut seen, &mut files);
                }
            }
        } else {
            let path = PathBuf::from(pattern);
            if path.is_dir() {
                for_each_image_in_dir(&path, &mut seen, &mut files);
            } else if path.is_file() {
                push_unique(path, &mut seen, &mut files);
            } else {
                anyhow::bail!("not a file or directory: {}", path.display());
            }
        }
    }

    files.sort_by_key(|p| std::cmp::Reverse(p.metadata().map(|m| m.len()).unwrap_or(0)));
    Ok(files)
}

fn push_unique(path: PathBuf, seen: &mut HashSet<PathBuf>, files: &mut Vec<PathBuf>) {
    if let Ok(canonical) = path.canonicalize() {
        if seen.insert(canonical) {
            files.push(path);
        }
    }
}

/// Whether the path has a recognized image extension.
pub fn is_image(path: &Path) -> bool {
    path.extension()
        .and_then(|e| e.to_str())
        .and_then(ImageFormat::from_extension)
        .is_some()
}

fn for_each_image_in_dir(dir: &Path, seen: &mut HashSet<PathBuf>, files: &mut Vec<PathBuf>) {
    let Ok(entries) = std::fs::read_dir(dir) else {
        return;
    };
    for entry in entries.flatten() {
        let path = entry.path();
        if path.is_dir() {
            for_each_image_in_dir(&path, seen, files);
        } else if path.is_file() && is_image(&path) {
            push_unique(path, seen, files);
        }
    }
}

/// Outcome of converting one file.
#[derive(Debug)]
pub struct FileResult {
    pub input_path: PathBuf,
    pub input_size: u64,
    pub output_path: Option<PathBuf>,
    pub output_size: Option<u64>,
    pub error: Option<String>,
    pub duration: Duration,
}

#[derive(Debug, Default)]
pub struct BatchSummary {
    pub results: Vec<FileResult>,
}

impl BatchSummary {
    pub fn push(&mut self, result: FileResult) {
        self.results.push(result);
    }

    pub fn error_count(&self) -> usize {
        self.results.iter().filter(|r| r.error.is_some()).count()
    }

    pub fn print_report(&self) {
        if self.results.is_empty() {
            println!("No files converted.");
            return;
        }

        println!("{:<40} {:>10} {:>10} {:>8}", "File", "Input", "Output", "Time");
        println!("{}", "-".repeat(72));
        for r in &self.results {
            let name = r
                .input_path
                .file_name()
                .and_then(|n| n.to_str())
                .unwrap_or("?");
            match (&r.error, r.output_size) {
                (Some(err), _) => {
                    println!("{:<40} {:>10} {}", name, format_size(r.input_size), err)
                }
                (None, Some(out)) => println!(
                    "{:<40} {:>10} {:>10} {:>6}ms",
                    name,
                    format_size(r.input_size),
                    format_size(out),
                    r.duration.as_millis()
                ),
                (None, None) => {}
            }
        }
        println!("{}", "-".repeat(72));

        let total_in: u64 = self.results.iter().map(|r| r.input_size).sum();
        let total_out: u64 = self.results.iter().filter_map(|r| r.output_size).sum();
        println!(
            "{} converted, {} errors | {} -> {}",
            self.results.len() - self.error_count(),
            self.error_count(),
            format_size(total_in),
            format_size(total_out),
        );
    }
}

/// Human-readable byte size.
pub fn format_size(bytes: u64) -> String {
    if bytes < 1024 {
        format!("{bytes} B")
    } else if bytes < 1024 * 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{:.1} MB", bytes as f64 / (1024.0 * 1024.0))
    }
}
