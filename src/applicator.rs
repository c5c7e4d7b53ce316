//! Patch applicator - applies a two-anchor patch to an owned buffer
//!
//! This module:
//! - Refuses to guess: zero or multiple dual matches are errors
//! - Writes both anchors only after the match is known to be unique
//! - Reports whether a buffer is already patched (read-only check)
//! - Returns a serializable report describing exactly what changed

use crate::codec;
use crate::patch::Patch;
use crate::scan::{find, scan, MatchOffsetPair};
use serde::Serialize;
use std::fmt;
use thiserror::Error;
use xxhash_rust::xxh3::xxh3_64;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("pattern not found (first anchor occurs {first_anchor_hits} time(s) without the second anchor in place)")]
    PatternNotFound { first_anchor_hits: usize },

    #[error("ambiguous pattern: found {count} dual matches, expected exactly 1")]
    AmbiguousPattern {
        count: usize,
        offsets: Vec<MatchOffsetPair>,
    },
}

/// One overwritten byte range.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PatchedRegion {
    pub offset: usize,
    pub original: String,
    pub patched: String,
}

/// What an application changed, for display or JSON output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyReport {
    pub matched: MatchOffsetPair,
    pub regions: Vec<PatchedRegion>,
    pub buffer_len: usize,
    pub input_digest: String,
    pub output_digest: String,
}

/// A successfully patched buffer.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "Applied holds the patched buffer, which still needs to be persisted"]
pub struct Applied {
    pub buffer: Vec<u8>,
    pub report: ApplyReport,
}

/// Read-only status of a patch against a buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum PatchStatus {
    /// The original anchors match uniquely; `apply` would succeed
    WouldApply { matched: MatchOffsetPair },
    /// The patched anchors match uniquely; the buffer is already patched
    AlreadyApplied { matched: MatchOffsetPair },
}

impl fmt::Display for PatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PatchStatus::WouldApply { matched } => write!(f, "would apply ({matched})"),
            PatchStatus::AlreadyApplied { matched } => {
                write!(f, "already applied ({matched})")
            }
        }
    }
}

/// Apply `patch` to `buffer`, taking ownership and returning the result.
pub fn apply(mut buffer: Vec<u8>, patch: &Patch) -> Result<Applied, ApplicationError> {
    let matched = unique_match(&buffer, patch)?;
    let input_digest = digest(&buffer);

    let regions = vec![
        region(matched.first_offset, patch.first().original(), patch.first().patched()),
        region(
            matched.second_offset,
            patch.second().original(),
            patch.second().patched(),
        ),
    ];

    // Overlapping regions are legal with negative offsets; the second write wins.
    overwrite(&mut buffer, matched.first_offset, patch.first().patched());
    overwrite(&mut buffer, matched.second_offset, patch.second().patched());

    tracing::info!(
        first_offset = matched.first_offset,
        second_offset = matched.second_offset,
        "patch applied"
    );

    let report = ApplyReport {
        matched,
        regions,
        buffer_len: buffer.len(),
        input_digest,
        output_digest: digest(&buffer),
    };

    Ok(Applied { buffer, report })
}

/// Determine whether `patch` would apply to `buffer` or has already been applied.
pub fn check(buffer: &[u8], patch: &Patch) -> Result<PatchStatus, ApplicationError> {
    match unique_match(buffer, patch) {
        Ok(matched) => Ok(PatchStatus::WouldApply { matched }),
        Err(ApplicationError::PatternNotFound { first_anchor_hits }) => {
            match scan(buffer, &patch.reversed()).as_slice() {
                [matched] => Ok(PatchStatus::AlreadyApplied { matched: *matched }),
                _ => Err(ApplicationError::PatternNotFound { first_anchor_hits }),
            }
        }
        Err(err) => Err(err),
    }
}

fn unique_match(buffer: &[u8], patch: &Patch) -> Result<MatchOffsetPair, ApplicationError> {
    let offsets = scan(buffer, patch);
    match offsets.as_slice() {
        [] => Err(ApplicationError::PatternNotFound {
            first_anchor_hits: count_occurrences(buffer, patch.first().original()),
        }),
        [matched] => Ok(*matched),
        _ => Err(ApplicationError::AmbiguousPattern {
            count: offsets.len(),
            offsets,
        }),
    }
}

fn count_occurrences(buffer: &[u8], sequence: &[u8]) -> usize {
    let mut count = 0;
    let mut cursor = 0;
    while let Some(offset) = find(buffer, sequence, cursor, buffer.len()) {
        count += 1;
        cursor = offset + 1;
    }
    count
}

fn overwrite(buffer: &mut [u8], offset: usize, bytes: &[u8]) {
    buffer[offset..offset + bytes.len()].copy_from_slice(bytes);
}

fn region(offset: usize, original: &[u8], patched: &[u8]) -> PatchedRegion {
    PatchedRegion {
        offset,
        original: codec::encode(original),
        patched: codec::encode(patched),
    }
}

/// xxh3 digest of a buffer as 16 lowercase hex digits.
pub fn digest(bytes: &[u8]) -> String {
    format!("{:016x}", xxh3_64(bytes))
}
