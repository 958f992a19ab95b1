use std::fs;

use tempfile::tempdir;

fn write_manifest(dir: &std::path::Path, manifest: &str, files: &[(&str, &[u8])]) -> std::path::PathBuf {
    for (name, data) in files {
        fs::write(dir.join(name), data).unwrap();
    }
    let manifest_text: String = manifest
        .lines()
        .map(|line| {
            let (idx, name) = line.split_once(',').unwrap();
            format!("{idx},{}\n", dir.join(name).display())
        })
        .collect();
    let manifest_path = dir.join("manifest.txt");
    fs::write(&manifest_path, manifest_text).unwrap();
    manifest_path
}

// S4: truncating an otherwise-valid archive must surface as a range error,
// never a panic.
#[test]
fn truncated_archive_is_rejected_cleanly() {
    let dir = tempdir().unwrap();
    let manifest_path = write_manifest(dir.path(), "0,a.txt\n", &[("a.txt", b"hello world")]);
    let archive_path = dir.path().join("out.cab");
    cabkit::ops::pack(&manifest_path, 6, &archive_path).unwrap();

    let mut bytes = fs::read(&archive_path).unwrap();
    bytes.truncate(bytes.len() - 4);
    let truncated_path = dir.path().join("truncated.cab");
    fs::write(&truncated_path, &bytes).unwrap();

    let dest_dir = dir.path().join("extracted");
    let err = cabkit::ops::extract(&truncated_path, &dest_dir).unwrap_err();
    assert!(matches!(err, cabkit::CabError::Range { .. }) || matches!(err, cabkit::CabError::TruncatedBlock { .. }));
}

// S5: a flipped signature byte must be rejected as a bad signature, not
// silently accepted or misparsed.
#[test]
fn corrupted_signature_is_rejected() {
    let dir = tempdir().unwrap();
    let manifest_path = write_manifest(dir.path(), "0,a.txt\n", &[("a.txt", b"hello")]);
    let archive_path = dir.path().join("out.cab");
    cabkit::ops::pack(&manifest_path, 6, &archive_path).unwrap();

    let mut bytes = fs::read(&archive_path).unwrap();
    bytes[0] = b'X';
    let bad_path = dir.path().join("bad.cab");
    fs::write(&bad_path, &bytes).unwrap();

    let dest_dir = dir.path().join("extracted");
    let err = cabkit::ops::extract(&bad_path, &dest_dir).unwrap_err();
    assert!(matches!(err, cabkit::CabError::BadSignature { .. }));
}

// S6: a corrupted payload with an intact structure still extracts --
// checksum mismatches are warnings, not failures.
#[test]
fn checksum_mismatch_does_not_abort_extraction() {
    let dir = tempdir().unwrap();
    let manifest_path = write_manifest(dir.path(), "0,a.txt\n", &[("a.txt", b"a payload long enough to matter")]);
    let archive_path = dir.path().join("out.cab");
    cabkit::ops::pack(&manifest_path, 0, &archive_path).unwrap();

    let mut bytes = fs::read(&archive_path).unwrap();
    // Flip a byte inside the block payload region (well past the header/tables).
    let flip_at = bytes.len() - 2;
    bytes[flip_at] ^= 0xFF;
    let corrupt_path = dir.path().join("corrupt.cab");
    fs::write(&corrupt_path, &bytes).unwrap();

    let dest_dir = dir.path().join("extracted");
    // Must not error out just because a checksum no longer matches.
    let result = cabkit::ops::extract(&corrupt_path, &dest_dir);
    assert!(result.is_ok(), "checksum mismatch must be a warning, not a hard failure: {result:?}");
}

// Property 7: clone refuses archives that are not structurally identical.
#[test]
fn clone_refuses_structural_mismatch() {
    let dir = tempdir().unwrap();
    let reference_manifest = write_manifest(dir.path(), "0,a.txt\n", &[("a.txt", b"hello")]);
    let reference_path = dir.path().join("reference.cab");
    cabkit::ops::pack(&reference_manifest, 6, &reference_path).unwrap();

    let target_manifest = write_manifest(dir.path(), "0,a.txt\n0,b.txt\n", &[("a.txt", b"hello"), ("b.txt", b"world")]);
    let target_path = dir.path().join("target.cab");
    cabkit::ops::pack(&target_manifest, 6, &target_path).unwrap();

    let err = cabkit::ops::clone(&reference_path, &target_path).unwrap_err();
    assert!(matches!(err, cabkit::CabError::StructuralMismatch { .. }));
}

// Pack rejects manifests naming a source file that doesn't exist, instead
// of panicking on a missing read.
#[test]
fn pack_reports_missing_source_file() {
    let dir = tempdir().unwrap();
    let manifest_path = dir.path().join("manifest.txt");
    fs::write(&manifest_path, format!("0,{}\n", dir.path().join("missing.txt").display())).unwrap();

    let archive_path = dir.path().join("out.cab");
    let err = cabkit::ops::pack(&manifest_path, 6, &archive_path).unwrap_err();
    assert!(matches!(err, cabkit::CabError::Io { .. }));
}
