//! EXIF metadata embedding through the external `exiftool` program
//!
//! Embedding is best effort: a missing executable or a failing run is
//! logged and the downloaded image is kept as is.

use log::{debug, error, info, warn};
use std::env;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::NamedTempFile;

use crate::types::Entry;

#[cfg(windows)]
const EXECUTABLE_NAMES: &[&str] = &["exiftool.exe", "exiftool(-k).exe", "exiftool"];
#[cfg(not(windows))]
const EXECUTABLE_NAMES: &[&str] = &["exiftool", "exiftool.exe", "exiftool(-k).exe"];

/// Writes entry metadata into a saved image
pub trait MetadataEmbedder {
    /// Never fails; problems are logged
    fn embed(&self, path: &Path, entry: &Entry);
}

/// [`MetadataEmbedder`] that shells out to exiftool
#[derive(Debug, Clone, Default)]
pub struct ExifToolEmbedder {
    exiftool_path: Option<PathBuf>,
    verbose: bool,
}

impl ExifToolEmbedder {
    pub fn new(exiftool_path: Option<PathBuf>) -> Self {
        Self {
            exiftool_path,
            verbose: false,
        }
    }

    /// Log the exiftool output of every run
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    fn run(&self, exiftool: &Path, path: &Path, entry: &Entry) -> std::io::Result<()> {
        // Kept alive until exiftool has read it
        let comment_file = match compose_comment(entry) {
            Some(comment) => {
                let mut file = NamedTempFile::new()?;
                file.write_all(comment.as_bytes())?;
                file.flush()?;
                Some(file)
            }
            None => None,
        };

        let output = Command::new(exiftool)
            .args(exiftool_args(entry, comment_file.as_ref().map(|f| f.path())))
            .arg(path)
            .output()?;

        if output.status.success() {
            info!("Embedded metadata into {}", path.display());
            if self.verbose {
                debug!(
                    "exiftool output: {}",
                    String::from_utf8_lossy(&output.stdout).trim()
                );
            }
        } else {
            error!(
                "exiftool failed on {} ({}): {}",
                path.display(),
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            );
        }
        Ok(())
    }
}

impl MetadataEmbedder for ExifToolEmbedder {
    fn embed(&self, path: &Path, entry: &Entry) {
        let Some(exiftool) = locate_exiftool(self.exiftool_path.as_deref()) else {
            warn!(
                "exiftool not found, skipping metadata for {}",
                path.display()
            );
            return;
        };

        if let Err(e) = self.run(&exiftool, path, entry) {
            error!("Failed to run {}: {}", exiftool.display(), e);
        }
    }
}

/// Find exiftool at `configured` (a file or a directory) or on `PATH`
pub fn locate_exiftool(configured: Option<&Path>) -> Option<PathBuf> {
    if let Some(configured) = configured {
        if configured.is_file() {
            return Some(configured.to_path_buf());
        }
        if configured.is_dir() {
            return find_in_dir(configured);
        }
        warn!("Configured exiftool path {} does not exist", configured.display());
    }

    let path_var = env::var_os("PATH")?;
    env::split_paths(&path_var).find_map(|dir| find_in_dir(&dir))
}

fn find_in_dir(dir: &Path) -> Option<PathBuf> {
    EXECUTABLE_NAMES
        .iter()
        .map(|name| dir.join(name))
        .find(|candidate| candidate.is_file())
}

/// Caption as `Title: ...` and `Description: ...` separated by a blank line
///
/// `None` when the entry has no caption.
pub fn compose_comment(entry: &Entry) -> Option<String> {
    let parts: Vec<String> = [
        entry
            .caption_title
            .as_deref()
            .map(|t| format!("Title: {}", t)),
        entry
            .caption_description
            .as_deref()
            .map(|d| format!("Description: {}", d)),
    ]
    .into_iter()
    .flatten()
    .collect();

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n\n"))
    }
}

fn exiftool_args(entry: &Entry, comment_file: Option<&Path>) -> Vec<String> {
    let mut args = vec![
        "-overwrite_original".to_string(),
        "-charset".to_string(),
        "utf8".to_string(),
    ];
    if let Some(title) = &entry.title {
        args.push(format!("-ImageDescription={}", title));
    }
    if let Some(copyright) = &entry.copyright {
        args.push(format!("-Copyright={}", copyright));
    }
    if let Some(comment_file) = comment_file {
        args.push(format!("-UserComment<={}", comment_file.display()));
        args.push(format!("-XPComment<={}", comment_file.display()));
    }
    args
}
