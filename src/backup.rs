//! Sibling backup file handling.
//!
//! `board.xlsx` has its backup at `board_backup.xlsx`. Restore copies the
//! backup over the primary file and never deletes the backup; backup copies
//! the primary file over the backup.

use anyhow::{Context, Result};
use std::path::{Path, PathBuf};

/// `dir/name.ext` -> `dir/name_backup.ext`
pub fn backup_path(path: &Path) -> PathBuf {
    let stem = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_backup.{}", stem, ext.to_string_lossy()),
        None => format!("{}_backup", stem),
    };
    path.with_file_name(name)
}

/// Copy the backup over `path` if a backup exists. Returns whether it did.
pub fn restore_from_backup(path: &Path) -> std::io::Result<bool> {
    let backup = backup_path(path);
    if !backup.exists() {
        log::info!(
            "No backup file found at {} - using existing workbook",
            backup.display()
        );
        return Ok(false);
    }
    std::fs::copy(&backup, path)?;
    log::info!(
        "Restored {} from backup {}",
        file_name(path),
        file_name(&backup)
    );
    Ok(true)
}

/// Copy `path` to its backup location.
pub fn write_backup(path: &Path) -> Result<PathBuf> {
    let backup = backup_path(path);
    std::fs::copy(path, &backup).with_context(|| {
        format!(
            "Failed to copy {} to backup {}",
            path.display(),
            backup.display()
        )
    })?;
    log::info!("Backed up {} to {}", file_name(path), file_name(&backup));
    Ok(backup)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .and_then(|n| n.to_str())
        .unwrap_or("(unknown)")
        .to_string()
}
