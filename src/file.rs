//! Target file I/O.
//!
//! The input is read once into an owned buffer and the output is written
//! once, atomically, after the patch has been applied in memory. A failed run
//! never leaves a partially written output file behind.

use crate::applicator::{apply, ApplyReport};
use crate::patch::Patch;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum FileError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write {}: {source}", path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub fn read_target(path: &Path) -> Result<Vec<u8>, FileError> {
    fs::read(path).map_err(|source| FileError::Read {
        path: path.to_path_buf(),
        source,
    })
}

/// Atomic file write: tempfile + fsync + rename.
///
/// An existing file at `path` keeps its permissions. A new file gets
/// `permissions` when given, otherwise the tempfile default.
pub fn write_atomic(
    path: &Path,
    content: &[u8],
    permissions: Option<fs::Permissions>,
) -> Result<(), FileError> {
    let to_write_error = |source| FileError::Write {
        path: path.to_path_buf(),
        source,
    };

    let permissions = match fs::metadata(path) {
        Ok(meta) => Some(meta.permissions()),
        Err(_) => permissions,
    };

    // Tempfile lives next to the target so the rename stays on one filesystem
    let parent = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent).map_err(to_write_error)?;
    temp.write_all(content).map_err(to_write_error)?;
    if let Some(permissions) = permissions {
        temp.as_file()
            .set_permissions(permissions)
            .map_err(to_write_error)?;
    }
    temp.as_file().sync_all().map_err(to_write_error)?;
    temp.persist(path).map_err(|e| to_write_error(e.error))?;

    Ok(())
}

/// Patch `input` and write the result to `output`.
///
/// With `output` set to `None` the patch is applied in memory only and the
/// report describes what would be written.
pub fn patch_file(
    input: &Path,
    output: Option<&Path>,
    patch: &Patch,
) -> Result<ApplyReport, crate::Error> {
    let buffer = read_target(input)?;
    tracing::debug!(path = %input.display(), len = buffer.len(), "read target");

    let applied = apply(buffer, patch)?;

    if let Some(output) = output {
        // A fresh output inherits the input's mode
        let permissions = fs::metadata(input)
            .map(|meta| meta.permissions())
            .map_err(|source| FileError::Read {
                path: input.to_path_buf(),
                source,
            })?;
        write_atomic(output, &applied.buffer, Some(permissions))?;
        tracing::info!(path = %output.display(), "wrote patched file");
    }

    Ok(applied.report)
}
