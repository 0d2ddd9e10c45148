//! Output path resolution.

use std::path::{Path, PathBuf};

use anyhow::{Context, bail};
use imagecodec::ImageFormat;

/// Where converted files go.
pub struct OutputConfig {
    target_dir: Option<PathBuf>,
    target_file: Option<PathBuf>,
    force: bool,
    format: ImageFormat,
}

impl OutputConfig {
    pub fn new(output: Option<&str>, force: bool, format: ImageFormat) -> Self {
        let (target_dir, target_file) = match output {
            Some(o) => {
                let path = PathBuf::from(o);
                if o.ends_with('/') || o.ends_with('\\') || path.is_dir() {
                    (Some(path), None)
                } else {
                    (None, Some(path))
                }
            }
            None => (None, None),
        };
        Self {
            target_dir,
            target_file,
            force,
            format,
        }
    }

    /// Output path for `input`; next to it with the target extension by default.
    pub fn resolve(&self, input: &Path, input_count: usize) -> anyhow::Result<PathBuf> {
        if let Some(target) = &self.target_file {
            if input_count > 1 {
                bail!("-o with a file path only works for a single input file (got {input_count})");
            }
            return Ok(target.clone());
        }

        let stem = input
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("output");
        let ext = self.format.extensions().first().copied().unwrap_or("bin");
        let filename = format!("{stem}.{ext}");

        match &self.target_dir {
            Some(dir) => Ok(dir.join(filename)),
            None => Ok(input.parent().unwrap_or(Path::new(".")).join(filename)),
        }
    }

    /// Refuse to clobber the input or an existing file without `--force`.
    pub fn check_writable(&self, input: &Path, output: &Path) -> anyhow::Result<()> {
        if let (Ok(ci), Ok(co)) = (input.canonicalize(), output.canonicalize()) {
            if ci == co {
                bail!("output would overwrite input: {}", input.display());
            }
        }
        if output.exists() && !self.force {
            bail!(
                "output already exists: {}\nUse --force to overwrite",
                output.display()
            );
        }
        Ok(())
    }

    pub fn ensure_parent(output: &Path) -> anyhow::Result<()> {
        if let Some(parent) = output.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("creating directory: {}", parent.display()))?;
            }
        }
        Ok(())
    }
}
