//! Patch definition parser.
//!
//! A patch definition is a list of labeled fields, in this order:
//!
//! ```text
//! # comments and blank lines are ignored anywhere
//! original: BB CC
//! patched:  11 22
//! offset:   0          (optional)
//! original: EE FF
//! patched:  33 44
//! ```
//!
//! Fields are recognized by label, never by line number. A label with no
//! value on its own line takes the value from the next content line, which
//! supports the older "label / comment / value" layout.

use crate::codec;
use crate::patch::errors::PatchError;
use crate::patch::schema::{Anchor, Field, Patch, SequencePair};
use std::fmt;
use std::iter::Peekable;

/// Non-fatal diagnostics produced while parsing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParseWarning {
    /// The offset field was present but not a decimal integer; 0 was used.
    OffsetDefaulted { line: usize, value: String },
}

impl fmt::Display for ParseWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParseWarning::OffsetDefaulted { line, value } if value.is_empty() => {
                write!(f, "line {line}: offset has no value, using 0")
            }
            ParseWarning::OffsetDefaulted { line, value } => {
                write!(f, "line {line}: offset '{value}' is not an integer, using 0")
            }
        }
    }
}

/// A parsed patch together with its diagnostics.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedPatch {
    pub patch: Patch,
    pub warnings: Vec<ParseWarning>,
}

/// Parse a patch definition, logging any warnings.
pub fn parse_patch(document: &str) -> Result<Patch, PatchError> {
    let parsed = parse_patch_with_warnings(document)?;
    for warning in &parsed.warnings {
        tracing::warn!("{warning}");
    }
    Ok(parsed.patch)
}

/// Parse a patch definition, returning warnings to the caller.
pub fn parse_patch_with_warnings(document: &str) -> Result<ParsedPatch, PatchError> {
    let entries = read_entries(document)?;
    let mut warnings = Vec::new();

    let mut state = State::FirstOriginal;
    let mut first_original = None;
    let mut first_patched = None;
    let mut offset = None;
    let mut second_original = None;
    let mut second_patched = None;

    for entry in entries {
        state = match (state, entry.field) {
            (State::FirstOriginal, Field::Original) => {
                first_original = Some(decode_entry(&entry)?);
                State::FirstPatched
            }
            (State::FirstPatched, Field::Patched) => {
                first_patched = Some(decode_entry(&entry)?);
                State::OffsetOrSecond
            }
            (State::OffsetOrSecond, Field::Offset) => {
                offset = Some(parse_offset(&entry, &mut warnings));
                State::SecondOriginal
            }
            (State::OffsetOrSecond | State::SecondOriginal, Field::Original) => {
                second_original = Some(decode_entry(&entry)?);
                State::SecondPatched
            }
            (State::SecondPatched, Field::Patched) => {
                second_patched = Some(decode_entry(&entry)?);
                State::Done
            }
            (state, field) => {
                return Err(PatchError::UnexpectedField {
                    line: entry.line,
                    field,
                    expected: state.expected(),
                })
            }
        };
    }

    let (first_original, first_patched) = match (first_original, first_patched) {
        (Some(original), Some(patched)) => (original, patched),
        (None, _) => return Err(missing(Anchor::First, Field::Original)),
        (Some(_), None) => return Err(missing(Anchor::First, Field::Patched)),
    };
    let (second_original, second_patched) = match (second_original, second_patched) {
        (Some(original), Some(patched)) => (original, patched),
        (None, _) => return Err(missing(Anchor::Second, Field::Original)),
        (Some(_), None) => return Err(missing(Anchor::Second, Field::Patched)),
    };

    let first = SequencePair::new(Anchor::First, first_original, first_patched)?;
    let second = SequencePair::new(Anchor::Second, second_original, second_patched)?;
    let patch = Patch::new(first, second, offset.unwrap_or(0))?;

    Ok(ParsedPatch { patch, warnings })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    FirstOriginal,
    FirstPatched,
    OffsetOrSecond,
    SecondOriginal,
    SecondPatched,
    Done,
}

impl State {
    fn expected(self) -> &'static str {
        match self {
            State::FirstOriginal => "'original:' of the first anchor",
            State::FirstPatched => "'patched:' of the first anchor",
            State::OffsetOrSecond => "'offset:' or 'original:' of the second anchor",
            State::SecondOriginal => "'original:' of the second anchor",
            State::SecondPatched => "'patched:' of the second anchor",
            State::Done => "end of patch definition",
        }
    }
}

fn missing(anchor: Anchor, field: Field) -> PatchError {
    PatchError::MissingField { anchor, field }
}

#[derive(Debug)]
struct Entry<'a> {
    line: usize,
    field: Field,
    value: &'a str,
}

fn decode_entry(entry: &Entry<'_>) -> Result<Vec<u8>, PatchError> {
    if entry.value.is_empty() {
        return Err(PatchError::MissingValue {
            line: entry.line,
            field: entry.field,
        });
    }
    codec::decode(entry.value).map_err(|source| PatchError::MalformedHex {
        line: entry.line,
        field: entry.field,
        source,
    })
}

fn parse_offset(entry: &Entry<'_>, warnings: &mut Vec<ParseWarning>) -> i64 {
    match entry.value.parse::<i64>() {
        Ok(offset) => offset,
        Err(_) => {
            warnings.push(ParseWarning::OffsetDefaulted {
                line: entry.line,
                value: entry.value.to_string(),
            });
            0
        }
    }
}

/// Split the document into labeled entries, skipping blanks and comments.
fn read_entries(document: &str) -> Result<Vec<Entry<'_>>, PatchError> {
    let mut lines = document
        .lines()
        .enumerate()
        .map(|(idx, text)| (idx + 1, text.trim()))
        .filter(|(_, text)| !text.is_empty() && !text.starts_with('#'))
        .peekable();

    let mut entries = Vec::new();

    while let Some((line, text)) = lines.next() {
        let Some((label, value)) = split_label(text) else {
            return Err(PatchError::UnlabeledLine {
                line,
                text: text.to_string(),
            });
        };

        let Some(field) = Field::from_label(label) else {
            return Err(PatchError::UnknownLabel {
                line,
                label: label.to_string(),
                hint: suggest_label(label),
            });
        };

        let value = if value.is_empty() {
            take_continuation(&mut lines).unwrap_or("")
        } else {
            value
        };

        entries.push(Entry { line, field, value });
    }

    Ok(entries)
}

fn split_label(text: &str) -> Option<(&str, &str)> {
    let (label, value) = text.split_once(':')?;
    Some((label.trim(), value.trim()))
}

/// Consume the next line as a value if it is not itself a labeled field.
fn take_continuation<'a, I>(lines: &mut Peekable<I>) -> Option<&'a str>
where
    I: Iterator<Item = (usize, &'a str)>,
{
    let (_, next) = lines.peek()?;
    if split_label(next).is_some() {
        return None;
    }
    lines.next().map(|(_, text)| text)
}

fn suggest_label(label: &str) -> String {
    let lowered = label.to_ascii_lowercase();
    Field::ALL
        .into_iter()
        .map(|field| (field, strsim::levenshtein(&lowered, field.label())))
        .filter(|(_, distance)| *distance <= 3)
        .min_by_key(|(_, distance)| *distance)
        .map(|(field, _)| format!(" (did you mean '{field}'?)"))
        .unwrap_or_default()
}
