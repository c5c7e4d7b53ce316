use crate::codec::HexError;
use crate::patch::schema::{Anchor, Field};
use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatchError {
    #[error("patch definition is not valid UTF-8 (bad byte at offset {valid_up_to})")]
    NotUtf8 { valid_up_to: usize },

    #[error("line {line}: malformed hex in '{field}' field: {source}")]
    MalformedHex {
        line: usize,
        field: Field,
        #[source]
        source: HexError,
    },

    #[error("missing '{field}' field for the {anchor} anchor")]
    MissingField { anchor: Anchor, field: Field },

    #[error("line {line}: unexpected '{field}' field, expected {expected}")]
    UnexpectedField {
        line: usize,
        field: Field,
        expected: &'static str,
    },

    #[error("line {line}: unknown field '{label}'{hint}")]
    UnknownLabel {
        line: usize,
        label: String,
        hint: String,
    },

    #[error("line {line}: expected a labeled field, found '{text}'")]
    UnlabeledLine { line: usize, text: String },

    #[error("line {line}: '{field}' field has no value")]
    MissingValue { line: usize, field: Field },

    #[error("{anchor} anchor has an empty byte sequence")]
    EmptySequence { anchor: Anchor },

    #[error(
        "{anchor} anchor changes length: original is {original} bytes, patched is {patched} bytes"
    )]
    LengthMismatch {
        anchor: Anchor,
        original: usize,
        patched: usize,
    },

    #[error("patch changes no bytes: applying both anchors leaves the matched region unchanged")]
    NoChange,
}

impl PatchError {
    /// Length mismatches are reported as their own kind; everything else is
    /// a malformed patch definition.
    pub fn is_length_mismatch(&self) -> bool {
        matches!(self, PatchError::LengthMismatch { .. })
    }
}
