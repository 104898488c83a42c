//! Raw per-group CSV files and the failed-groups list.
//!
//! Each group is written to `dest_group_NNN.csv` in long format
//! (`date,keyword,interest,group`). Failed group indices are appended to
//! `failed_groups.txt`, one per line, as they fail; a fetch run rewrites the
//! list at the end without the groups that have since succeeded.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::error::TrendsError;
use crate::types::RawTrendRow;

pub const GROUP_FILE_PREFIX: &str = "dest_group_";
pub const FAILED_GROUPS_FILE: &str = "failed_groups.txt";

/// Path of the raw CSV for group `index`.
#[must_use]
pub fn group_path(dir: &Path, index: usize) -> PathBuf {
    dir.join(format!("{GROUP_FILE_PREFIX}{index:03}.csv"))
}

/// Writes one group's rows with a header.
///
/// # Errors
///
/// Returns [`TrendsError::Csv`] / [`TrendsError::Io`] if the file cannot be written.
pub fn write_group_csv(path: &Path, rows: &[RawTrendRow]) -> Result<(), TrendsError> {
    let display = path.display().to_string();
    let mut writer = csv::Writer::from_path(path).map_err(|e| TrendsError::Csv {
        path: display.clone(),
        source: e,
    })?;
    for row in rows {
        writer.serialize(row).map_err(|e| TrendsError::Csv {
            path: display.clone(),
            source: e,
        })?;
    }
    writer
        .flush()
        .map_err(|e| TrendsError::Io { path: display, source: e })
}

/// Reads a raw group CSV back.
///
/// # Errors
///
/// Returns [`TrendsError::Csv`] if the file cannot be opened or any row fails to parse.
pub fn read_group_csv(path: &Path) -> Result<Vec<RawTrendRow>, TrendsError> {
    let display = path.display().to_string();
    let mut reader = csv::Reader::from_path(path).map_err(|e| TrendsError::Csv {
        path: display.clone(),
        source: e,
    })?;
    reader
        .deserialize()
        .collect::<Result<Vec<RawTrendRow>, _>>()
        .map_err(|e| TrendsError::Csv {
            path: display,
            source: e,
        })
}

/// All `dest_group_*.csv` files in `dir`, sorted by name.
///
/// # Errors
///
/// Returns [`TrendsError::Io`] if the directory cannot be listed.
pub fn list_group_files(dir: &Path) -> Result<Vec<PathBuf>, TrendsError> {
    let io_err = |e| TrendsError::Io {
        path: dir.display().to_string(),
        source: e,
    };
    let mut files: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(io_err)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|n| n.starts_with(GROUP_FILE_PREFIX) && n.ends_with(".csv"))
        })
        .collect();
    files.sort();
    Ok(files)
}

/// Appends `index` to the failed-groups list in `dir`.
///
/// # Errors
///
/// Returns [`TrendsError::Io`] if the file cannot be opened or written.
pub fn append_failed_group(dir: &Path, index: usize) -> Result<(), TrendsError> {
    let path = dir.join(FAILED_GROUPS_FILE);
    let io_err = |e| TrendsError::Io {
        path: path.display().to_string(),
        source: e,
    };
    let mut file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .map_err(io_err)?;
    writeln!(file, "{index}").map_err(io_err)
}

/// Reads the failed-groups list; a missing file is an empty list and
/// unparseable lines are ignored.
#[must_use]
pub fn read_failed_groups(dir: &Path) -> Vec<usize> {
    std::fs::read_to_string(dir.join(FAILED_GROUPS_FILE))
        .map(|content| {
            content
                .lines()
                .filter_map(|line| line.trim().parse().ok())
                .collect()
        })
        .unwrap_or_default()
}

/// Replaces the failed-groups list with `indices` (sorted, deduplicated).
/// An empty list removes the file.
///
/// # Errors
///
/// Returns [`TrendsError::Io`] if the file cannot be written or removed.
pub fn write_failed_groups(dir: &Path, indices: &[usize]) -> Result<(), TrendsError> {
    let path = dir.join(FAILED_GROUPS_FILE);
    let io_err = |e| TrendsError::Io {
        path: path.display().to_string(),
        source: e,
    };
    let mut sorted = indices.to_vec();
    sorted.sort_unstable();
    sorted.dedup();

    if sorted.is_empty() {
        return match std::fs::remove_file(&path) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(io_err(e)),
            _ => Ok(()),
        };
    }
    let content: String = sorted.iter().map(|i| format!("{i}\n")).collect();
    std::fs::write(&path, content).map_err(io_err)
}
