//! Copy a model artifact into its deployment location.
//!
//! The destination's parent directory is created on demand and an existing
//! destination file is overwritten. File contents, permission bits and the
//! access/modification times are carried over. There is no atomic rename or
//! checksum step.

use std::fs::{self, File, FileTimes};
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Debug, Error)]
pub enum DeployError {
    #[error("Source file not found: {0}")]
    SourceMissing(PathBuf),
    #[error("Source is not a regular file: {0}")]
    SourceNotFile(PathBuf),
    #[error("Source and destination are the same file: {path}")]
    SameFile { path: PathBuf },
    #[error("Failed to create directory {path}: {source}")]
    CreateDir {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to copy {src} to {dest}: {source}")]
    Copy {
        src: PathBuf,
        dest: PathBuf,
        source: std::io::Error,
    },
    #[error("Failed to copy timestamps to {path}: {source}")]
    Timestamps {
        path: PathBuf,
        source: std::io::Error,
    },
}

/// Outcome of a successful copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeployReport {
    pub src: PathBuf,
    /// Final file path; differs from the requested destination when that was a directory.
    pub dest: PathBuf,
    pub bytes: u64,
}

/// Copy `src` to `dest`, creating parent directories and overwriting any existing file.
///
/// When `dest` is an existing directory the file lands inside it under the
/// source's file name.
pub fn deploy_artifact(src: &Path, dest: &Path) -> Result<DeployReport, DeployError> {
    let src_meta = match fs::metadata(src) {
        Ok(meta) => meta,
        Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
            return Err(DeployError::SourceMissing(src.to_path_buf()));
        }
        Err(source) => {
            return Err(DeployError::Copy {
                src: src.to_path_buf(),
                dest: dest.to_path_buf(),
                source,
            });
        }
    };
    if !src_meta.is_file() {
        return Err(DeployError::SourceNotFile(src.to_path_buf()));
    }

    let dest = resolve_destination(src, dest);
    if is_same_file(src, &dest) {
        return Err(DeployError::SameFile { path: dest });
    }
    if let Some(parent) = dest.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| DeployError::CreateDir {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let bytes = fs::copy(src, &dest).map_err(|source| DeployError::Copy {
        src: src.to_path_buf(),
        dest: dest.clone(),
        source,
    })?;
    copy_timestamps(&src_meta, &dest)?;

    tracing::debug!(bytes, "Deployed {} to {}", src.display(), dest.display());
    Ok(DeployReport {
        src: src.to_path_buf(),
        dest,
        bytes,
    })
}

fn resolve_destination(src: &Path, dest: &Path) -> PathBuf {
    match src.file_name() {
        Some(name) if dest.is_dir() => dest.join(name),
        _ => dest.to_path_buf(),
    }
}

// fs::copy truncates the destination before reading, so copying a file onto
// itself would empty it.
fn is_same_file(src: &Path, dest: &Path) -> bool {
    match (fs::canonicalize(src), fs::canonicalize(dest)) {
        (Ok(src), Ok(dest)) => src == dest,
        _ => false,
    }
}

fn copy_timestamps(src_meta: &fs::Metadata, dest: &Path) -> Result<(), DeployError> {
    let timestamps_err = |source: std::io::Error| DeployError::Timestamps {
        path: dest.to_path_buf(),
        source,
    };
    let mut times = FileTimes::new();
    if let Ok(accessed) = src_meta.accessed() {
        times = times.set_accessed(accessed);
    }
    if let Ok(modified) = src_meta.modified() {
        times = times.set_modified(modified);
    }
    let file = open_for_timestamps(dest).map_err(timestamps_err)?;
    file.set_times(times).map_err(timestamps_err)
}

// futimens only needs a readable handle; the copied permissions may forbid writing.
#[cfg(not(windows))]
fn open_for_timestamps(path: &Path) -> std::io::Result<File> {
    File::open(path)
}

#[cfg(windows)]
fn open_for_timestamps(path: &Path) -> std::io::Result<File> {
    File::options().write(true).open(path)
}
