use crate::applicator::ApplicationError;
use crate::file::FileError;
use crate::patch::{LoadError, PatchError};
use std::fmt;

/// Any failure of a patch run.
#[derive(thiserror::Error, Debug)]
pub enum Error {
    #[error(transparent)]
    Patch(#[from] PatchError),

    #[error(transparent)]
    Load(#[from] LoadError),

    #[error(transparent)]
    Application(#[from] ApplicationError),

    #[error(transparent)]
    File(#[from] FileError),
}

/// The distinguishable failure kinds reported to users.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    PatchFormat,
    LengthMismatch,
    PatternNotFound,
    AmbiguousPattern,
    Io,
}

impl ErrorKind {
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorKind::PatchFormat => "patch-format",
            ErrorKind::LengthMismatch => "length-mismatch",
            ErrorKind::PatternNotFound => "pattern-not-found",
            ErrorKind::AmbiguousPattern => "ambiguous-pattern",
            ErrorKind::Io => "io",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Error {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::Patch(e) => patch_kind(e),
            Error::Load(LoadError::Parse { source, .. }) => patch_kind(source),
            Error::Load(LoadError::File(_)) | Error::File(_) => ErrorKind::Io,
            Error::Application(ApplicationError::PatternNotFound { .. }) => {
                ErrorKind::PatternNotFound
            }
            Error::Application(ApplicationError::AmbiguousPattern { .. }) => {
                ErrorKind::AmbiguousPattern
            }
        }
    }
}

fn patch_kind(e: &PatchError) -> ErrorKind {
    if e.is_length_mismatch() {
        ErrorKind::LengthMismatch
    } else {
        ErrorKind::PatchFormat
    }
}
