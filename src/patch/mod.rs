//! Patch definitions: the two-anchor rule and its text format.

pub mod errors;
pub mod loader;
pub mod parser;
pub mod schema;

pub use errors::PatchError;
pub use loader::{load_from_path, load_from_str, LoadError};
pub use parser::{parse_patch, parse_patch_with_warnings, ParseWarning, ParsedPatch};
pub use schema::{Anchor, Field, Patch, SequencePair};
