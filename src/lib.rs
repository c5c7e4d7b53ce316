//! Byteseq Patcher: dual-anchor byte sequence patching for binaries
//!
//! Rewrites a small set of bytes inside a binary without a disassembler. A
//! patch definition names two anchors (byte sequences with replacements) and
//! the signed distance between them. The patch is applied only when that
//! two-anchor arrangement occurs exactly once in the target.
//!
//! # Architecture
//!
//! Text flows through [`parse_patch`] into a [`Patch`], the
//! [`scan`](scan::scan) pass collects every dual match, and [`apply`] writes
//! both anchors once uniqueness is established. File I/O lives in [`file`]
//! and stays out of the matching logic.
//!
//! # Safety
//!
//! - Zero or multiple dual matches are refused, never guessed at
//! - Original and patched sequences must have equal length
//! - The buffer is mutated only after the match is confirmed unique
//! - Output files are written atomically (tempfile + fsync + rename)
//!
//! # Example
//!
//! ```
//! use byteseq_patcher::{apply, parse_patch};
//!
//! let patch = parse_patch(
//!     "original: BB CC\npatched: 11 22\noffset: 1\noriginal: EE FF\npatched: 33 44\n",
//! )?;
//!
//! let applied = apply(vec![0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF], &patch)?;
//! assert_eq!(applied.buffer, vec![0xAA, 0x11, 0x22, 0xDD, 0x33, 0x44]);
//! # Ok::<(), byteseq_patcher::Error>(())
//! ```

pub mod applicator;
pub mod codec;
pub mod error;
pub mod file;
pub mod patch;
pub mod scan;

// Re-exports
pub use applicator::{apply, check, ApplicationError, Applied, ApplyReport, PatchStatus};
pub use codec::HexError;
pub use error::{Error, ErrorKind};
pub use file::{patch_file, FileError};
pub use patch::{
    load_from_path, parse_patch, parse_patch_with_warnings, LoadError, ParseWarning, ParsedPatch,
    Patch, PatchError, SequencePair,
};
pub use scan::MatchOffsetPair;
