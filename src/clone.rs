//! Structural diff+patch: rewrites the mutable header and per-file fields
//! of a target archive from a structurally identical reference archive.

use tracing::info;

use crate::archive::Cabinet;
use crate::consts;
use crate::error::{CabError, Result};

/// Compares `reference` and `target` structurally and, if compatible,
/// reports the patches `apply_patches` should make. Structural mismatches
/// (folder/file counts, per-folder compression type, per-file folder
/// index, or per-file name) are refused outright rather than patched.
fn check_structural_match(reference: &Cabinet<'_>, target: &Cabinet<'_>) -> Result<()> {
    if reference.header().c_folders != target.header().c_folders {
        return Err(CabError::StructuralMismatch { field: "cFolders".to_string() });
    }
    if reference.header().c_files != target.header().c_files {
        return Err(CabError::StructuralMismatch { field: "cFiles".to_string() });
    }
    for (i, (a, b)) in reference.folders().iter().zip(target.folders().iter()).enumerate() {
        if a.type_compress != b.type_compress {
            return Err(CabError::StructuralMismatch { field: format!("folder[{i}].typeCompress") });
        }
    }
    for (i, (a, b)) in reference.files().iter().zip(target.files().iter()).enumerate() {
        if a.i_folder != b.i_folder {
            return Err(CabError::StructuralMismatch { field: format!("file[{i}].iFolder") });
        }
        if a.name != b.name {
            return Err(CabError::StructuralMismatch { field: format!("file[{i}].name") });
        }
    }
    Ok(())
}

/// Patches `target_bytes` in place so its mutable header/file fields match
/// `reference`. Assumes `check_structural_match` already succeeded; the
/// compressed body is never touched.
fn apply_patches(reference: &Cabinet<'_>, target: &Cabinet<'_>, target_bytes: &mut [u8]) {
    let rh = reference.header();
    put_u32(target_bytes, consts::HEADER_RESERVED1_OFFSET, rh.reserved1);
    put_u32(target_bytes, consts::HEADER_RESERVED2_OFFSET, rh.reserved2);
    put_u32(target_bytes, consts::HEADER_RESERVED3_OFFSET, rh.reserved3);
    target_bytes[consts::HEADER_VERSION_MINOR_OFFSET] = rh.version_minor;
    target_bytes[consts::HEADER_VERSION_MAJOR_OFFSET] = rh.version_major;
    put_u16(target_bytes, consts::HEADER_FLAGS_OFFSET, rh.flags);
    put_u16(target_bytes, consts::HEADER_SET_ID_OFFSET, rh.set_id);
    put_u16(target_bytes, consts::HEADER_I_CABINET_OFFSET, rh.i_cabinet);
    info!("corrected reserved fields, version, flags, setID, iCabinet from reference");

    for (i, (rf, tf)) in reference.files().iter().zip(target.files().iter()).enumerate() {
        if rf.date == tf.date && rf.time == tf.time && rf.attribs == tf.attribs {
            continue;
        }
        let offset = target.file_record_offset(i);
        put_u16(target_bytes, offset + consts::FILE_ENTRY_DATE_OFFSET, rf.date);
        put_u16(target_bytes, offset + consts::FILE_ENTRY_TIME_OFFSET, rf.time);
        put_u16(target_bytes, offset + consts::FILE_ENTRY_ATTRIBS_OFFSET, rf.attribs);
        info!(file = %tf.name, "corrected date/time/attribs from reference");
    }
}

fn put_u16(buf: &mut [u8], offset: usize, value: u16) {
    buf[offset..offset + 2].copy_from_slice(&value.to_le_bytes());
}

fn put_u32(buf: &mut [u8], offset: usize, value: u32) {
    buf[offset..offset + 4].copy_from_slice(&value.to_le_bytes());
}

/// Runs the clone operation over already-mapped byte ranges. Exposed at
/// this granularity so it can be exercised without real files in tests;
/// `ops::clone` drives this against `mmap`-backed archives.
pub fn clone_into(reference_bytes: &[u8], target_bytes: &mut [u8]) -> Result<()> {
    let reference = Cabinet::parse(reference_bytes)?;
    let target = Cabinet::parse(target_bytes)?;
    check_structural_match(&reference, &target)?;
    apply_patches(&reference, &target, target_bytes);
    Ok(())
}
