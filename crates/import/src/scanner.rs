use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

use grosz_core::SourceType;

/// A discovered export file together with the source it was found under.
#[derive(Debug, Clone)]
pub struct SourceFile {
    pub path: PathBuf,
    pub source_type: SourceType,
}

#[derive(Debug, Error)]
pub enum DiscoveryError {
    #[error("No input files discovered in {}", .0.display())]
    NoInputFiles(PathBuf),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Discover export files under `root`. Expected layout:
///
/// ```text
/// <root>/ing/file_1.csv
/// <root>/ing/file_2.csv
/// <root>/mbank/file_1.csv
/// ```
///
/// A missing source subdirectory is only a warning; an empty result set is
/// fatal. Files are sorted by name within each source so reruns see the
/// same order.
pub fn scan_root(root: &Path) -> Result<Vec<SourceFile>, DiscoveryError> {
    let mut files = Vec::new();

    for source_type in SourceType::ALL {
        let dir = root.join(source_type.dir_name());
        if !dir.is_dir() {
            tracing::warn!(
                "directory for source of type {source_type} not found (expected: {})",
                dir.display()
            );
            continue;
        }

        let mut paths: Vec<PathBuf> = fs::read_dir(&dir)?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| path.is_file() && has_csv_extension(path))
            .collect();
        paths.sort();

        files.extend(paths.into_iter().map(|path| SourceFile { path, source_type }));
    }

    if files.is_empty() {
        return Err(DiscoveryError::NoInputFiles(root.to_path_buf()));
    }

    Ok(files)
}

fn has_csv_extension(path: &Path) -> bool {
    path.extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
}
