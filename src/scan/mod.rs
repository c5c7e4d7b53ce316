//! Byte matching and the dual-anchor scan.

pub mod matcher;
pub mod scanner;

pub use matcher::find;
pub use scanner::{scan, MatchOffsetPair};
