/// Find the first exact occurrence of `sequence` in `buffer[search_start..search_end]`.
///
/// Returns the absolute offset of the match. `search_end` is clamped to the
/// buffer length; an empty sequence or a window shorter than the sequence
/// never matches.
pub fn find(buffer: &[u8], sequence: &[u8], search_start: usize, search_end: usize) -> Option<usize> {
    let search_end = search_end.min(buffer.len());
    if sequence.is_empty() || search_start >= search_end {
        return None;
    }

    let window = &buffer[search_start..search_end];
    if window.len() < sequence.len() {
        return None;
    }

    window
        .windows(sequence.len())
        .position(|candidate| candidate == sequence)
        .map(|pos| search_start + pos)
}

#[cfg(test)]
mod tests {
    use super::*;

    const BUF: &[u8] = &[0xAA, 0xBB, 0xCC, 0xDD, 0xBB, 0xCC];

    #[test]
    fn test_find_first_occurrence() {
        assert_eq!(find(BUF, &[0xBB, 0xCC], 0, BUF.len()), Some(1));
    }

    #[test]
    fn test_find_respects_start() {
        assert_eq!(find(BUF, &[0xBB, 0xCC], 2, BUF.len()), Some(4));
    }

    #[test]
    fn test_find_respects_end() {
        assert_eq!(find(BUF, &[0xBB, 0xCC], 2, 5), None);
        assert_eq!(find(BUF, &[0xBB, 0xCC], 1, 3), Some(1));
    }

    #[test]
    fn test_find_at_buffer_end() {
        assert_eq!(find(BUF, &[0xCC], 3, BUF.len()), Some(5));
    }

    #[test]
    fn test_find_clamps_end() {
        assert_eq!(find(BUF, &[0xBB, 0xCC], 3, 1000), Some(4));
    }

    #[test]
    fn test_find_empty_sequence() {
        assert_eq!(find(BUF, &[], 0, BUF.len()), None);
    }

    #[test]
    fn test_find_window_too_small() {
        assert_eq!(find(BUF, &[0xAA, 0xBB, 0xCC], 0, 2), None);
        assert_eq!(find(BUF, &[0xAA], 4, 4), None);
        assert_eq!(find(BUF, &[0xAA], 9, 12), None);
    }

    #[test]
    fn test_find_absent() {
        assert_eq!(find(BUF, &[0x00], 0, BUF.len()), None);
    }
}
