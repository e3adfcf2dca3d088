//! File-system adapter over the in-memory codec.
//!
//! ```no_run
//! use minipack::archive::{self, UnpackOptions};
//!
//! // Pack
//! archive::pack_to_file(&["readme.txt", "logo.png"], "out.minipack")?;
//!
//! // Unpack
//! let bytes = std::fs::read("out.minipack")?;
//! archive::unpack(&bytes, "extracted", &UnpackOptions::default())?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! Whole files are read into memory, handed to [`crate::encode`] /
//! [`crate::decode`], and the result written back out.  Unpacking decodes and
//! verifies the full archive before touching the destination directory.

use std::collections::HashSet;
use std::fs::{self, OpenOptions};
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use serde::Serialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::codec::{self, MinipackError};
use crate::digest;
use crate::entry::Entry;
use crate::reader::Reader;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error(transparent)]
    Codec(#[from] MinipackError),
    #[error("Refusing to extract entry with unsafe name {name:?}")]
    UnsafeName { name: String },
    #[error("Not a regular file: {}", .path.display())]
    NotAFile { path: PathBuf },
    #[error("Destination already exists: {}", .path.display())]
    AlreadyExists { path: PathBuf },
    #[error("Duplicate entry name {name:?}")]
    DuplicateName { name: String },
}

// ── UnpackOptions ────────────────────────────────────────────────────────────

/// Configuration for [`unpack`].
#[derive(Debug, Clone, Default)]
pub struct UnpackOptions {
    /// Replace files that already exist in the destination.
    pub overwrite: bool,
}

// ── EntryInfo ────────────────────────────────────────────────────────────────

/// Lightweight descriptor returned by [`list`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryInfo {
    pub index:  usize,
    pub name:   String,
    pub size:   u64,
    pub sha256: String,
}

// ── Pack ─────────────────────────────────────────────────────────────────────

/// Read each path and encode them, in order, into one archive.
///
/// The entry name is the path's final component; two inputs sharing one
/// fail with [`ArchiveError::DuplicateName`].
pub fn pack_paths<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<u8>, ArchiveError> {
    let entries = paths
        .iter()
        .map(|p| read_entry(p.as_ref()))
        .collect::<Result<Vec<_>, _>>()?;
    check_unique(entries.iter().map(|e| e.name.as_str()))?;
    let archive = codec::encode(&entries)?;
    info!(entries = entries.len(), bytes = archive.len(), "packed archive");
    Ok(archive)
}

pub fn pack_to_file<P: AsRef<Path>, Q: AsRef<Path>>(paths: &[P], output: Q) -> Result<usize, ArchiveError> {
    let archive = pack_paths(paths)?;
    fs::write(output.as_ref(), &archive)?;
    Ok(archive.len())
}

fn read_entry(path: &Path) -> Result<Entry, ArchiveError> {
    if !path.is_file() {
        return Err(ArchiveError::NotAFile { path: path.to_owned() });
    }
    let name = path
        .file_name()
        .ok_or_else(|| ArchiveError::NotAFile { path: path.to_owned() })?
        .to_string_lossy()
        .into_owned();
    let body = fs::read(path)?;
    debug!(name = %name, size = body.len(), "read input");
    Ok(Entry { name, body })
}

// ── Unpack ───────────────────────────────────────────────────────────────────

/// Decode `archive` and write every entry into `dest`, creating it if needed.
///
/// Returns the paths written, in archive order.  Nothing is written unless
/// the whole archive decodes, every name is safe and no name repeats.
///
/// Existing destination paths, symlinks included, are never followed: without
/// `overwrite` they are an error, with it they are unlinked and recreated.
pub fn unpack<P: AsRef<Path>>(archive: &[u8], dest: P, opts: &UnpackOptions) -> Result<Vec<PathBuf>, ArchiveError> {
    let dest = dest.as_ref();
    let entries = codec::decode(archive)?;
    check_unique(entries.iter().map(|e| e.name.as_str()))?;

    let mut targets = Vec::with_capacity(entries.len());
    for entry in &entries {
        if !is_safe_name(&entry.name) {
            return Err(ArchiveError::UnsafeName { name: entry.name.clone() });
        }
        let target = dest.join(&entry.name);
        if !opts.overwrite && fs::symlink_metadata(&target).is_ok() {
            return Err(ArchiveError::AlreadyExists { path: target });
        }
        targets.push(target);
    }

    if !dest.exists() { fs::create_dir_all(dest)?; }
    for (entry, target) in entries.iter().zip(&targets) {
        write_new(target, &entry.body, opts.overwrite)?;
        debug!(path = %target.display(), size = entry.body.len(), "extracted");
    }
    info!(entries = targets.len(), dest = %dest.display(), "unpacked archive");
    Ok(targets)
}

/// Create `target` afresh; `create_new` refuses any existing path,
/// dangling symlinks included.
fn write_new(target: &Path, body: &[u8], overwrite: bool) -> Result<(), ArchiveError> {
    if overwrite && fs::symlink_metadata(target).is_ok() {
        fs::remove_file(target)?;
    }
    let mut file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(target)
        .map_err(|e| match e.kind() {
            io::ErrorKind::AlreadyExists => ArchiveError::AlreadyExists { path: target.to_owned() },
            _ => ArchiveError::Io(e),
        })?;
    file.write_all(body)?;
    Ok(())
}

fn check_unique<'a>(names: impl Iterator<Item = &'a str>) -> Result<(), ArchiveError> {
    let mut seen = HashSet::new();
    for name in names {
        if !seen.insert(name) {
            return Err(ArchiveError::DuplicateName { name: name.to_owned() });
        }
    }
    Ok(())
}

/// A name must be a single, plain path component.
fn is_safe_name(name: &str) -> bool {
    !name.is_empty()
        && name != "."
        && name != ".."
        && !name.contains(['/', '\\', '\0'])
}

// ── List ─────────────────────────────────────────────────────────────────────

/// Describe each entry of a verified archive.
pub fn list(archive: &[u8]) -> Result<Vec<EntryInfo>, ArchiveError> {
    Reader::new(archive)
        .enumerate()
        .map(|(index, entry)| {
            let entry = entry?;
            Ok(EntryInfo {
                index,
                name:   entry.name.to_owned(),
                size:   entry.body.len() as u64,
                sha256: digest::to_hex(&entry.hash),
            })
        })
        .collect()
}
