//! Library-level workflow tests
//!
//! Patch text -> parse -> scan -> apply -> write, checked against files on disk.

use byteseq_patcher::scan::scan;
use byteseq_patcher::{
    apply, check, load_from_path, parse_patch, patch_file, ApplicationError, ErrorKind,
    MatchOffsetPair, PatchError, PatchStatus,
};
use std::fs;
use tempfile::TempDir;

/// A fake "binary": a length check followed, four bytes later, by its jump.
fn sample_binary() -> Vec<u8> {
    let mut bin = vec![0x7F, b'E', b'L', b'F'];
    bin.extend_from_slice(&[0x00; 32]);
    // cmp eax, 0x40
    bin.extend_from_slice(&[0x83, 0xF8, 0x40]);
    bin.extend_from_slice(&[0x90, 0x90, 0x90, 0x90]);
    // jne +0x0A
    bin.extend_from_slice(&[0x75, 0x0A]);
    bin.extend_from_slice(&[0xCC; 16]);
    // a second cmp with no jump after it
    bin.extend_from_slice(&[0x83, 0xF8, 0x40, 0xC3]);
    bin
}

const PATCH: &str = "\
# Relax the length check
original: 83 F8 40
patched:  83 F8 7F
# jne sits four bytes after the cmp
offset: 4
original: 75 0A
patched:  EB 0A
";

fn setup() -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("target.bin"), sample_binary()).unwrap();
    fs::write(dir.path().join("fix.patch"), PATCH).unwrap();
    dir
}

#[test]
fn test_end_to_end_apply() {
    let dir = setup();
    let patch = load_from_path(dir.path().join("fix.patch")).unwrap().patch;
    let output = dir.path().join("patched.bin");

    let report = patch_file(&dir.path().join("target.bin"), Some(output.as_path()), &patch).unwrap();
    assert_eq!(
        report.matched,
        MatchOffsetPair {
            first_offset: 36,
            second_offset: 43
        }
    );

    let patched = fs::read(&output).unwrap();
    let mut expected = sample_binary();
    expected[38] = 0x7F;
    expected[43] = 0xEB;
    assert_eq!(patched, expected);
}

#[test]
fn test_status_before_and_after() {
    let dir = setup();
    let patch = parse_patch(PATCH).unwrap();
    let original = fs::read(dir.path().join("target.bin")).unwrap();

    assert!(matches!(
        check(&original, &patch),
        Ok(PatchStatus::WouldApply { .. })
    ));

    let applied = apply(original, &patch).unwrap();
    assert!(matches!(
        check(&applied.buffer, &patch),
        Ok(PatchStatus::AlreadyApplied { .. })
    ));
    assert!(scan(&applied.buffer, &patch).is_empty());
}

#[test]
fn test_duplicated_region_is_ambiguous_and_writes_nothing() {
    let dir = setup();
    let mut doubled = sample_binary();
    doubled.extend_from_slice(&sample_binary());
    let input = dir.path().join("doubled.bin");
    fs::write(&input, &doubled).unwrap();
    let output = dir.path().join("out.bin");

    let patch = parse_patch(PATCH).unwrap();
    let err = patch_file(&input, Some(output.as_path()), &patch).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::AmbiguousPattern);
    assert!(!output.exists());
    assert_eq!(fs::read(&input).unwrap(), doubled);
}

#[test]
fn test_absent_anchor_is_not_found() {
    let patch = parse_patch(PATCH).unwrap();
    let err = apply(vec![0x00; 128], &patch).unwrap_err();
    assert!(matches!(err, ApplicationError::PatternNotFound { .. }));
}

#[test]
fn test_length_mismatch_is_rejected_before_scanning() {
    let err = parse_patch("original: 83 F8 40\npatched: 83 F8\noriginal: 75 0A\npatched: EB 0A\n")
        .unwrap_err();
    assert!(err.is_length_mismatch());
}

#[test]
fn test_legacy_layout_with_value_below_label() {
    let legacy = "\
original:
# cmp eax, 0x40
83 F8 40
patched:
# cmp eax, 0x7F
83 F8 7F
offset:
4
original:
# jne
75 0A
patched:
# jmp
EB 0A
";
    assert_eq!(parse_patch(legacy).unwrap(), parse_patch(PATCH).unwrap());
}

#[test]
fn test_malformed_hex_reports_line() {
    let err = parse_patch("original: 83 F8 4\npatched: 83 F8 7F\n").unwrap_err();
    assert!(matches!(err, PatchError::MalformedHex { line: 1, .. }));
    assert!(err.to_string().starts_with("line 1:"));
}
