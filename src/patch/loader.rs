use crate::file::FileError;
use crate::patch::errors::PatchError;
use crate::patch::parser::{parse_patch_with_warnings, ParsedPatch};
use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error(transparent)]
    File(#[from] FileError),

    #[error("invalid patch definition ({}): {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: PatchError,
    },
}

impl LoadError {
    /// The parse failure, if the file could be read.
    pub fn patch_error(&self) -> Option<&PatchError> {
        match self {
            LoadError::Parse { source, .. } => Some(source),
            LoadError::File(_) => None,
        }
    }
}

pub fn load_from_str(input: &str) -> Result<ParsedPatch, PatchError> {
    parse_patch_with_warnings(input)
}

pub fn load_from_path(path: impl AsRef<Path>) -> Result<ParsedPatch, LoadError> {
    let path = path.as_ref();
    let to_parse_error = |source| LoadError::Parse {
        path: path.to_path_buf(),
        source,
    };

    let bytes = fs::read(path).map_err(|source| FileError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let contents = String::from_utf8(bytes).map_err(|e| {
        to_parse_error(PatchError::NotUtf8 {
            valid_up_to: e.utf8_error().valid_up_to(),
        })
    })?;
    load_from_str(&contents).map_err(to_parse_error)
}
