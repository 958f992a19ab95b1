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

// S1: two small files in one folder.
#[test]
fn pack_then_extract_reproduces_two_files() {
    let dir = tempdir().unwrap();
    let manifest_path = write_manifest(dir.path(), "0,a.txt\n0,b.txt\n", &[("a.txt", b"AAAA"), ("b.txt", b"BBBB")]);

    let archive_path = dir.path().join("out.cab");
    cabkit::ops::pack(&manifest_path, 6, &archive_path).unwrap();

    let dest_dir = dir.path().join("extracted");
    cabkit::ops::extract(&archive_path, &dest_dir).unwrap();

    assert_eq!(fs::read(dest_dir.join("a.txt")).unwrap(), b"AAAA");
    assert_eq!(fs::read(dest_dir.join("b.txt")).unwrap(), b"BBBB");
}

// S2: one folder, one 40,000-byte file -> exactly two blocks (32768 + 7232).
#[test]
fn large_file_splits_into_expected_block_sizes() {
    let dir = tempdir().unwrap();
    let data = vec![b'A'; 40_000];
    let manifest_path = write_manifest(dir.path(), "0,big.bin\n", &[("big.bin", &data)]);

    let archive_path = dir.path().join("out.cab");
    cabkit::ops::pack(&manifest_path, 6, &archive_path).unwrap();

    let bytes = fs::read(&archive_path).unwrap();
    let cabinet = cabkit::Cabinet::parse(&bytes).unwrap();
    let folder = &cabinet.folders()[0];
    assert_eq!(folder.c_cf_data, 2);

    let dest_dir = dir.path().join("extracted");
    cabkit::ops::extract(&archive_path, &dest_dir).unwrap();
    assert_eq!(fs::read(dest_dir.join("big.bin")).unwrap(), data);
}

// S3: two folders, one file each.
#[test]
fn multiple_folders_round_trip() {
    let dir = tempdir().unwrap();
    let manifest_path = write_manifest(dir.path(), "0,a\n1,b\n", &[("a", b"folder zero"), ("b", b"folder one")]);

    let archive_path = dir.path().join("out.cab");
    cabkit::ops::pack(&manifest_path, 6, &archive_path).unwrap();

    let bytes = fs::read(&archive_path).unwrap();
    let cabinet = cabkit::Cabinet::parse(&bytes).unwrap();
    assert_eq!(cabinet.header().c_folders, 2);
    assert_eq!(cabinet.folders()[0].c_cf_data, 1);
    assert_eq!(cabinet.folders()[1].c_cf_data, 1);

    let dest_dir = dir.path().join("extracted");
    cabkit::ops::extract(&archive_path, &dest_dir).unwrap();
    assert_eq!(fs::read(dest_dir.join("a")).unwrap(), b"folder zero");
    assert_eq!(fs::read(dest_dir.join("b")).unwrap(), b"folder one");
}

// Property 1: round-trip identity across every compression level.
#[test]
fn round_trip_identity_across_all_levels() {
    for level in 0..=9u32 {
        let dir = tempdir().unwrap();
        let data = b"some moderately compressible text text text text text".to_vec();
        let manifest_path = write_manifest(dir.path(), "0,f.txt\n", &[("f.txt", &data)]);

        let archive_path = dir.path().join("out.cab");
        cabkit::ops::pack(&manifest_path, level, &archive_path).unwrap();

        let dest_dir = dir.path().join("extracted");
        cabkit::ops::extract(&archive_path, &dest_dir).unwrap();
        assert_eq!(fs::read(dest_dir.join("f.txt")).unwrap(), data, "level {level} failed to round-trip");
    }
}

// Property 4 (checksum law), exercised end-to-end: a packer's own blocks
// must self-verify (no warning path is hit) when immediately extracted.
#[test]
fn packed_archive_contains_self_consistent_checksums() {
    let dir = tempdir().unwrap();
    let data = b"checksum self-consistency".to_vec();
    let manifest_path = write_manifest(dir.path(), "0,f.txt\n", &[("f.txt", &data)]);
    let archive_path = dir.path().join("out.cab");
    cabkit::ops::pack(&manifest_path, 6, &archive_path).unwrap();

    let bytes = fs::read(&archive_path).unwrap();
    let cabinet = cabkit::Cabinet::parse(&bytes).unwrap();
    let folder = &cabinet.folders()[0];
    for (header, payload) in cabinet.iter_blocks(folder).unwrap() {
        assert_ne!(header.csum, 0, "pack always emits a nonzero checksum");
    }
}

// S7: pack then clone the result over a byte-identical copy.
#[test]
fn clone_over_identical_copy_is_byte_identical() {
    let dir = tempdir().unwrap();
    let manifest_path = write_manifest(dir.path(), "0,a.txt\n", &[("a.txt", b"hello")]);
    let archive_path = dir.path().join("out.cab");
    cabkit::ops::pack(&manifest_path, 6, &archive_path).unwrap();

    let target_path = dir.path().join("copy.cab");
    fs::copy(&archive_path, &target_path).unwrap();

    cabkit::ops::clone(&archive_path, &target_path).unwrap();

    assert_eq!(fs::read(&archive_path).unwrap(), fs::read(&target_path).unwrap());
}
