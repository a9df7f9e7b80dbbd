//! File system helpers for the install steps.
//!
//! Each helper attaches the offending path to its error with `anyhow`
//! context so the diagnostic report points at the file that failed. The
//! "tolerated" outcomes of the install flow (a missing folder on removal, an
//! existing destination on move) are returned as values instead of errors.

use anyhow::{Context, Result};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Result of [`move_into`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// The entry now lives in the destination directory.
    Moved,
    /// An entry with the same name already existed; nothing was moved.
    AlreadyExists,
}

/// Ensures a directory exists, creating it and all parent directories if necessary.
pub fn ensure_dir(path: &Path) -> Result<()> {
    if !path.exists() {
        fs::create_dir_all(path)
            .with_context(|| format!("Failed to create directory: {}", path.display()))?;
    } else if !path.is_dir() {
        return Err(anyhow::anyhow!("Path exists but is not a directory: {}", path.display()));
    }
    Ok(())
}

/// Copies `src` to `dst` when `src` is a regular file.
///
/// Returns `Ok(false)` without touching `dst` when `src` does not exist.
pub fn copy_if_exists(src: &Path, dst: &Path) -> Result<bool> {
    if !src.is_file() {
        return Ok(false);
    }
    fs::copy(src, dst).with_context(|| {
        format!("Failed to copy file from {} to {}", src.display(), dst.display())
    })?;
    Ok(true)
}

/// Removes a directory tree, treating a missing directory as success.
///
/// Returns whether anything was removed.
pub fn remove_dir_if_exists(path: &Path) -> Result<bool> {
    match fs::remove_dir_all(path) {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
        Err(e) => {
            Err(e).with_context(|| format!("Failed to remove directory: {}", path.display()))
        }
    }
}

/// Regular files directly inside `dir` (symlinks are followed, subdirectories skipped).
pub fn list_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let path = entry?.path();
        if path.is_file() {
            files.push(path);
        }
    }
    files.sort();
    Ok(files)
}

/// Subdirectories directly inside `dir`.
pub fn list_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs = Vec::new();
    for entry in
        fs::read_dir(dir).with_context(|| format!("Failed to read directory: {}", dir.display()))?
    {
        let entry = entry?;
        if entry.file_type()?.is_dir() {
            dirs.push(entry.path());
        }
    }
    dirs.sort();
    Ok(dirs)
}

/// Every entry directly inside `dir`, sorted by name.
pub fn list_entries(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut entries = fs::read_dir(dir)
        .with_context(|| format!("Failed to read directory: {}", dir.display()))?
        .map(|entry| entry.map(|e| e.path()))
        .collect::<io::Result<Vec<_>>>()
        .with_context(|| format!("Failed to list directory: {}", dir.display()))?;
    entries.sort();
    Ok(entries)
}

/// Moves the file or directory `src` into `dest_dir`, keeping its name.
///
/// An existing entry with the same name in `dest_dir` is left untouched and
/// reported as [`MoveOutcome::AlreadyExists`]. A rename across file systems
/// falls back to copy-then-delete.
pub fn move_into(src: &Path, dest_dir: &Path) -> Result<MoveOutcome> {
    let name = src
        .file_name()
        .with_context(|| format!("Cannot move path without a file name: {}", src.display()))?;
    let dst = dest_dir.join(name);

    if fs::symlink_metadata(&dst).is_ok() {
        return Ok(MoveOutcome::AlreadyExists);
    }

    match fs::rename(src, &dst) {
        Ok(()) => Ok(MoveOutcome::Moved),
        Err(e) if e.kind() == io::ErrorKind::CrossesDevices => {
            copy_then_remove(src, &dst)?;
            Ok(MoveOutcome::Moved)
        }
        Err(e) => Err(e).with_context(|| {
            format!("Failed to move {} to {}", src.display(), dst.display())
        }),
    }
}

fn copy_then_remove(src: &Path, dst: &Path) -> Result<()> {
    if src.is_dir() {
        copy_dir(src, dst)?;
        fs::remove_dir_all(src)
            .with_context(|| format!("Failed to remove directory: {}", src.display()))?;
    } else {
        fs::copy(src, dst).with_context(|| {
            format!("Failed to copy file from {} to {}", src.display(), dst.display())
        })?;
        fs::remove_file(src)
            .with_context(|| format!("Failed to remove file: {}", src.display()))?;
    }
    Ok(())
}

/// Copies a directory tree. Symlinks and special files are skipped.
fn copy_dir(src: &Path, dst: &Path) -> Result<()> {
    ensure_dir(dst)?;

    for entry in
        fs::read_dir(src).with_context(|| format!("Failed to read directory: {}", src.display()))?
    {
        let entry = entry?;
        let file_type = entry.file_type()?;
        let src_path = entry.path();
        let dst_path = dst.join(entry.file_name());

        if file_type.is_dir() {
            copy_dir(&src_path, &dst_path)?;
        } else if file_type.is_file() {
            fs::copy(&src_path, &dst_path).with_context(|| {
                format!(
                    "Failed to copy file from {} to {}",
                    src_path.display(),
                    dst_path.display()
                )
            })?;
        }
    }

    Ok(())
}
