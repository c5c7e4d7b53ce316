use crate::codec;
use crate::patch::errors::PatchError;
use serde::Serialize;
use std::fmt;

/// Which of the two anchors a sequence pair belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Anchor {
    First,
    Second,
}

impl fmt::Display for Anchor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Anchor::First => write!(f, "first"),
            Anchor::Second => write!(f, "second"),
        }
    }
}

/// Labeled fields of a patch definition document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Original,
    Patched,
    Offset,
}

impl Field {
    pub const ALL: [Field; 3] = [Field::Original, Field::Patched, Field::Offset];

    pub fn label(self) -> &'static str {
        match self {
            Field::Original => "original",
            Field::Patched => "patched",
            Field::Offset => "offset",
        }
    }

    /// Case-insensitive label lookup.
    pub fn from_label(label: &str) -> Option<Field> {
        Field::ALL
            .into_iter()
            .find(|field| field.label().eq_ignore_ascii_case(label))
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:", self.label())
    }
}

/// One anchor's "find this" and "replace with this" bytes.
///
/// Both sequences are non-empty and of equal length: a patch is applied by
/// in-place overwrite, so it can never grow or shrink the target.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SequencePair {
    original: Vec<u8>,
    patched: Vec<u8>,
}

impl SequencePair {
    /// Build the pair serving as `anchor`, enforcing the equal-length rule.
    pub fn new(anchor: Anchor, original: Vec<u8>, patched: Vec<u8>) -> Result<Self, PatchError> {
        if original.is_empty() || patched.is_empty() {
            return Err(PatchError::EmptySequence { anchor });
        }
        if original.len() != patched.len() {
            return Err(PatchError::LengthMismatch {
                anchor,
                original: original.len(),
                patched: patched.len(),
            });
        }
        Ok(Self { original, patched })
    }

    pub fn original(&self) -> &[u8] {
        &self.original
    }

    pub fn patched(&self) -> &[u8] {
        &self.patched
    }

    pub fn len(&self) -> usize {
        self.original.len()
    }

    /// Always false for a constructed pair; kept for API symmetry with `len`.
    pub fn is_empty(&self) -> bool {
        self.original.is_empty()
    }

    pub fn is_noop(&self) -> bool {
        self.original == self.patched
    }

    fn swapped(&self) -> Self {
        Self {
            original: self.patched.clone(),
            patched: self.original.clone(),
        }
    }
}

impl fmt::Display for SequencePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} -> {}",
            codec::encode(&self.original),
            codec::encode(&self.patched)
        )
    }
}

/// A two-anchor patch rule.
///
/// The second anchor must start exactly `relative_offset` bytes after the end
/// of the first anchor's match. The offset may be negative.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Patch {
    first: SequencePair,
    second: SequencePair,
    relative_offset: i64,
}

impl Patch {
    pub fn new(
        first: SequencePair,
        second: SequencePair,
        relative_offset: i64,
    ) -> Result<Self, PatchError> {
        if !writes_change_bytes(&first, &second, relative_offset) {
            return Err(PatchError::NoChange);
        }
        Ok(Self {
            first,
            second,
            relative_offset,
        })
    }

    pub fn first(&self) -> &SequencePair {
        &self.first
    }

    pub fn second(&self) -> &SequencePair {
        &self.second
    }

    pub fn relative_offset(&self) -> i64 {
        self.relative_offset
    }

    /// The same rule as it appears in an already-patched buffer.
    pub fn reversed(&self) -> Patch {
        Patch {
            first: self.first.swapped(),
            second: self.second.swapped(),
            relative_offset: self.relative_offset,
        }
    }
}

/// Whether applying both anchors leaves any byte different.
///
/// Anchors that overlap (negative offset) are laid out on a scratch span so a
/// second write that restores the first one's bytes counts as no change.
fn writes_change_bytes(
    first: &SequencePair,
    second: &SequencePair,
    relative_offset: i64,
) -> bool {
    let first_len = first.len() as i64;
    let second_start = first_len.saturating_add(relative_offset);
    let second_end = second_start.saturating_add(second.len() as i64);

    if second_start >= first_len || second_end <= 0 {
        return !(first.is_noop() && second.is_noop());
    }

    let origin = second_start.min(0);
    let span = (first_len.max(second_end) - origin) as usize;
    let first_at = (-origin) as usize;
    let second_at = (second_start - origin) as usize;

    let mut before = vec![None; span];
    overlay(&mut before, first_at, first.original());
    overlay(&mut before, second_at, second.original());

    let mut after = before.clone();
    overlay(&mut after, first_at, first.patched());
    overlay(&mut after, second_at, second.patched());

    before != after
}

fn overlay(span: &mut [Option<u8>], at: usize, bytes: &[u8]) {
    for (slot, byte) in span[at..at + bytes.len()].iter_mut().zip(bytes) {
        *slot = Some(*byte);
    }
}
