//! ZIP expansion into an extraction directory
//!
//! Every entry name is checked against the destination before the first byte
//! is written, so a single traversal entry ("zip slip") aborts the whole
//! expansion with nothing on disk.

use std::fs::{self, File};
use std::io::{self, BufReader};
use std::path::{Path, PathBuf};

use zip::ZipArchive;

use crate::document::Result;
use crate::storage::sandbox;

/// Expand `archive_path` into `dest`, returning the number of entries written
pub fn expand(archive_path: &Path, dest: &Path) -> Result<usize> {
    let file = File::open(archive_path)?;
    let mut archive = ZipArchive::new(BufReader::new(file))?;

    let mut targets: Vec<(PathBuf, bool)> = Vec::with_capacity(archive.len());
    for index in 0..archive.len() {
        let entry = archive.by_index_raw(index)?;
        let target = sandbox::contain(dest, entry.name()).map_err(|e| {
            tracing::warn!(entry = %entry.name(), archive = %archive_path.display(), "Rejected archive entry outside extraction directory");
            e
        })?;
        targets.push((target, entry.is_dir()));
    }

    let archive_path = sandbox::normalize(archive_path);
    let mut written = 0;
    for (index, (target, is_dir)) in targets.iter().enumerate() {
        if *is_dir {
            fs::create_dir_all(target)?;
            continue;
        }
        if *target == archive_path {
            tracing::warn!(entry = %target.display(), "Skipping archive entry that would overwrite the archive");
            continue;
        }
        if let Some(parent) = target.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut entry = archive.by_index(index)?;
        let mut out = File::create(target)?;
        io::copy(&mut entry, &mut out)?;
        written += 1;
    }

    Ok(written)
}
