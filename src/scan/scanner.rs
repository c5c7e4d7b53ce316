//! Dual-anchor scanner.
//!
//! A single anchor is rarely unique in a multi-megabyte binary. The scanner
//! pairs every occurrence of the first anchor with a positional check for the
//! second: it must start exactly `relative_offset` bytes after the end of the
//! first match. All such dual matches are collected so that callers can refuse
//! ambiguous patches.

use crate::patch::Patch;
use crate::scan::matcher::find;
use serde::Serialize;
use std::fmt;

/// Offsets of one confirmed dual match.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct MatchOffsetPair {
    pub first_offset: usize,
    pub second_offset: usize,
}

impl fmt::Display for MatchOffsetPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "first anchor at {:#x}, second anchor at {:#x}",
            self.first_offset, self.second_offset
        )
    }
}

/// Find every dual match of `patch`'s original anchors in `buffer`.
///
/// Matches are returned in ascending order of the first anchor's offset.
/// The cursor always moves past the current first-anchor start, so the scan
/// terminates for any relative offset, negative ones included.
pub fn scan(buffer: &[u8], patch: &Patch) -> Vec<MatchOffsetPair> {
    let first = patch.first().original();
    let second = patch.second().original();
    let mut pairs = Vec::new();
    let mut cursor = 0usize;

    while cursor < buffer.len() {
        let Some(first_offset) = find(buffer, first, cursor, buffer.len()) else {
            break;
        };

        let first_end = first_offset + first.len();
        let (window_start, window_end) =
            window_bounds(first_end, patch.relative_offset(), second.len());

        let second_offset = usize::try_from(window_start)
            .ok()
            .and_then(|start| find(buffer, second, start, start + second.len()));

        let next = match second_offset {
            Some(second_offset) => {
                tracing::debug!(first_offset, second_offset, "dual match");
                pairs.push(MatchOffsetPair {
                    first_offset,
                    second_offset,
                });
                second_offset + second.len()
            }
            None => {
                tracing::trace!(first_offset, window_start, "second anchor not in window");
                clamp_to_cursor(window_end)
            }
        };

        cursor = next.max(first_offset + 1);
    }

    pairs
}

/// Bounds of the exact window the second anchor must occupy.
fn window_bounds(first_end: usize, relative_offset: i64, len: usize) -> (i64, i64) {
    let start = i64::try_from(first_end)
        .unwrap_or(i64::MAX)
        .saturating_add(relative_offset);
    let len = i64::try_from(len).unwrap_or(i64::MAX);
    (start, start.saturating_add(len))
}

fn clamp_to_cursor(offset: i64) -> usize {
    usize::try_from(offset.max(0)).unwrap_or(usize::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::patch::{Anchor, SequencePair};
    use proptest::prelude::*;

    fn patch(first: &[u8], second: &[u8], offset: i64) -> Patch {
        let first = SequencePair::new(Anchor::First, first.to_vec(), vec![0x11; first.len()])
            .unwrap();
        let second = SequencePair::new(Anchor::Second, second.to_vec(), vec![0x33; second.len()])
            .unwrap();
        Patch::new(first, second, offset).unwrap()
    }

    fn pair(first_offset: usize, second_offset: usize) -> MatchOffsetPair {
        MatchOffsetPair {
            first_offset,
            second_offset,
        }
    }

    #[test]
    fn test_adjacent_gap_of_one() {
        let buf = [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];
        let p = patch(&[0xBB, 0xCC], &[0xEE, 0xFF], 1);
        assert_eq!(scan(&buf, &p), vec![pair(1, 4)]);
    }

    #[test]
    fn test_window_is_exact() {
        // EE FF sits one byte after the first anchor's end, not zero
        let buf = [0xAA, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF];
        let p = patch(&[0xBB, 0xCC], &[0xEE, 0xFF], 0);
        assert!(scan(&buf, &p).is_empty());
    }

    #[test]
    fn test_directly_adjacent_anchors() {
        let buf = [0x00, 0xBB, 0xCC, 0xEE, 0xFF, 0x00];
        let p = patch(&[0xBB, 0xCC], &[0xEE, 0xFF], 0);
        assert_eq!(scan(&buf, &p), vec![pair(1, 3)]);
    }

    #[test]
    fn test_collects_every_dual_match() {
        let buf = [
            0xBB, 0xCC, 0xDD, 0xEE, 0xFF, 0x00, 0xBB, 0xCC, 0xDD, 0xEE, 0xFF,
        ];
        let p = patch(&[0xBB, 0xCC], &[0xEE, 0xFF], 1);
        assert_eq!(scan(&buf, &p), vec![pair(0, 3), pair(6, 9)]);
    }

    #[test]
    fn test_false_first_anchor_is_skipped() {
        let buf = [0xBB, 0xCC, 0x00, 0x00, 0xBB, 0xCC, 0xEE, 0xFF];
        let p = patch(&[0xBB, 0xCC], &[0xEE, 0xFF], 0);
        assert_eq!(scan(&buf, &p), vec![pair(4, 6)]);
    }

    #[test]
    fn test_negative_offset_overlapping_tail() {
        let buf = [0x00, 0x11, 0x22, 0x33, 0x44, 0x55];
        let p = patch(&[0x11, 0x22, 0x33], &[0x33, 0x44], -1);
        assert_eq!(scan(&buf, &p), vec![pair(1, 3)]);
    }

    #[test]
    fn test_negative_offset_second_before_first() {
        let buf = [0xEE, 0xFF, 0x00, 0xBB, 0xCC];
        let p = patch(&[0xBB, 0xCC], &[0xEE, 0xFF], -5);
        assert_eq!(scan(&buf, &p), vec![pair(3, 0)]);
    }

    #[test]
    fn test_window_before_buffer_start() {
        let buf = [0xBB, 0xCC, 0xBB, 0xCC];
        let p = patch(&[0xBB, 0xCC], &[0xEE, 0xFF], -100);
        assert!(scan(&buf, &p).is_empty());
    }

    #[test]
    fn test_window_past_buffer_end() {
        let buf = [0x00, 0xBB, 0xCC, 0xEE];
        let p = patch(&[0xBB, 0xCC], &[0xEE, 0xFF], 0);
        assert!(scan(&buf, &p).is_empty());
    }

    #[test]
    fn test_extreme_offsets_terminate() {
        let buf = [0xBB; 32];
        assert!(scan(&buf, &patch(&[0xBB], &[0xEE], i64::MAX)).is_empty());
        assert!(scan(&buf, &patch(&[0xBB], &[0xEE], i64::MIN)).is_empty());
    }

    #[test]
    fn test_absent_first_anchor() {
        let buf = [0x01, 0x02, 0x03];
        assert!(scan(&buf, &patch(&[0xBB], &[0x02], 0)).is_empty());
    }

    #[test]
    fn test_empty_buffer() {
        assert!(scan(&[], &patch(&[0xBB], &[0xEE], 0)).is_empty());
    }

    proptest! {
        #[test]
        fn prop_every_pair_honours_offset(
            buf in proptest::collection::vec(0u8..4, 0..96),
            first in proptest::collection::vec(0u8..4, 1..3),
            second in proptest::collection::vec(0u8..4, 1..3),
            offset in -6i64..6,
        ) {
            let p = patch(&first, &second, offset);
            let pairs = scan(&buf, &p);

            for w in pairs.windows(2) {
                prop_assert!(w[0].first_offset < w[1].first_offset);
            }
            for m in pairs {
                let first_end = m.first_offset + first.len();
                prop_assert_eq!(&buf[m.first_offset..first_end], first.as_slice());
                prop_assert_eq!(m.second_offset as i64, first_end as i64 + offset);
                prop_assert_eq!(
                    &buf[m.second_offset..m.second_offset + second.len()],
                    second.as_slice()
                );
            }
        }
    }
}
