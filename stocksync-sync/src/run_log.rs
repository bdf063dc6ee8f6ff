//! Append-only CSV record of attempted updates.
//!
//! One row per attempted variant:
//! `timestamp,sku,inventory_item_id,quantity,result,message`. The header is
//! written when the file is new or empty. Rotates at 10 MiB, keeping 5 copies:
//!   run.csv → run.csv.1 → … → run.csv.5

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};

use stocksync_core::RunLogEntry;

use crate::error::{io_err, SyncError};

/// Maximum log size before rotation (10 MiB).
pub const MAX_LOG_BYTES: u64 = 10 * 1024 * 1024;

/// Maximum number of rotated copies to keep.
pub const MAX_ROTATED_FILES: usize = 5;

/// Append `entries` to the log at `path`, creating it (and its parent
/// directories) if needed.
pub fn append(path: &Path, entries: &[RunLogEntry]) -> Result<(), SyncError> {
    if entries.is_empty() {
        return Ok(());
    }
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| io_err(parent, e))?;
    }
    if rotate_if_needed(path, MAX_LOG_BYTES, MAX_ROTATED_FILES).map_err(|e| io_err(path, e))? {
        tracing::info!(path = %path.display(), "run log rotated");
    }

    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .map_err(|e| io_err(path, e))?;
    let needs_header = file.metadata().map_err(|e| io_err(path, e))?.len() == 0;

    let mut writer = csv::WriterBuilder::new()
        .has_headers(needs_header)
        .from_writer(file);
    for entry in entries {
        writer.serialize(entry)?;
    }
    writer.flush().map_err(|e| io_err(path, e))?;
    Ok(())
}

/// Read every entry of the live log file (rotated copies are ignored).
/// A missing file reads as empty.
pub fn read_entries(path: &Path) -> Result<Vec<RunLogEntry>, SyncError> {
    let file = match fs::File::open(path) {
        Ok(file) => file,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Vec::new()),
        Err(err) => return Err(io_err(path, err)),
    };
    let mut reader = csv::Reader::from_reader(file);
    let mut entries = Vec::new();
    for row in reader.deserialize() {
        entries.push(row?);
    }
    Ok(entries)
}

/// The last `n` entries of the live log, oldest first.
pub fn tail(path: &Path, n: usize) -> Result<Vec<RunLogEntry>, SyncError> {
    let mut entries = read_entries(path)?;
    let start = entries.len().saturating_sub(n);
    Ok(entries.split_off(start))
}

/// Rotate `log_path` if its size reached `max_bytes`.
///
/// `<name>.<max_files>` is deleted, `<name>.<n>` shifts to `<name>.<n+1>`,
/// and `<name>` becomes `<name>.1`. The next append starts a fresh file with
/// its own header. Returns `true` if rotation occurred; a missing file is
/// not an error.
pub fn rotate_if_needed(log_path: &Path, max_bytes: u64, max_files: usize) -> io::Result<bool> {
    let size = match fs::metadata(log_path) {
        Ok(meta) => meta.len(),
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(false),
        Err(err) => return Err(err),
    };

    if size < max_bytes {
        return Ok(false);
    }

    let oldest = numbered_path(log_path, max_files);
    if oldest.exists() {
        fs::remove_file(&oldest)?;
    }

    for n in (1..max_files).rev() {
        let src = numbered_path(log_path, n);
        if src.exists() {
            fs::rename(&src, numbered_path(log_path, n + 1))?;
        }
    }

    fs::rename(log_path, numbered_path(log_path, 1))?;
    Ok(true)
}

/// Path of the `n`-th rotated copy of `base` (e.g. `run.csv.2`).
fn numbered_path(base: &Path, n: usize) -> PathBuf {
    let name = base
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("run.csv");
    base.with_file_name(format!("{name}.{n}"))
}
