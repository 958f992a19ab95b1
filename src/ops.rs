//! Archive operations (C6): list, extract, pack, and clone. This is the
//! only layer that touches the filesystem; everything below is pure.

use std::fs::{self, File};
use std::io::Write;
use std::path::{Path, PathBuf};

use memmap2::{Mmap, MmapMut};
use tracing::debug;

use crate::archive::Cabinet;
use crate::clone as clone_impl;
use crate::consts;
use crate::error::{CabError, Result};
use crate::manifest::{self, ManifestEntry};
use crate::model::{self, FileEntry, FolderEntry, Header};
use crate::pipeline;

fn map_readonly(path: &Path) -> Result<Mmap> {
    let file = File::open(path).map_err(|e| CabError::io("open", path, e))?;
    unsafe { Mmap::map(&file) }.map_err(|e| CabError::io("mmap", path, e))
}

/// Parses `path` and writes a human-readable summary of its header,
/// folders, and files to `out`. Presentational only: unsupported
/// compression types are shown as a placeholder rather than rejected.
pub fn list(path: &Path, out: &mut dyn Write) -> Result<()> {
    let mmap = map_readonly(path)?;
    let cabinet = Cabinet::parse(&mmap)?;
    let header = cabinet.header();

    writeln!(
        out,
        "cabinet: {} folder(s), {} file(s), cbCabinet={}, setID=0x{:04x}, iCabinet={}",
        header.c_folders, header.c_files, header.cb_cabinet, header.set_id, header.i_cabinet
    )
    .map_err(|e| CabError::io("write", "<stdout>", e))?;

    for (index, folder) in cabinet.folders().iter().enumerate() {
        let ctype = describe_compression(folder);
        writeln!(out, "folder #{index}: {ctype}, {} block(s)", folder.c_cf_data)
            .map_err(|e| CabError::io("write", "<stdout>", e))?;
        for (block_index, (block_header, _payload)) in cabinet.iter_blocks(folder)?.into_iter().enumerate() {
            writeln!(
                out,
                "  block #{block_index}: csum=0x{:08x} cbData={} cbUncomp={}",
                block_header.csum, block_header.cb_data, block_header.cb_uncomp
            )
            .map_err(|e| CabError::io("write", "<stdout>", e))?;
        }
        for file in cabinet.files_in_folder(index) {
            let datetime =
                file.datetime().map(|dt| dt.to_string()).unwrap_or_else(|| "(unset)".to_string());
            writeln!(out, "  {} ({} bytes) {}", file.name, file.cb_file, datetime)
                .map_err(|e| CabError::io("write", "<stdout>", e))?;
        }
    }
    Ok(())
}

fn describe_compression(folder: &FolderEntry) -> String {
    match folder.compression_kind() {
        consts::COMPRESS_TYPE_NONE => "stored".to_string(),
        consts::COMPRESS_TYPE_MSZIP => "ms-zip".to_string(),
        other => format!("unsupported (0x{other:04x})"),
    }
}

/// Extracts every file in `archive_path` into `dest_dir`, creating it
/// (mode 0755) if absent. Archived filenames are reduced to their final
/// path component before joining with `dest_dir`, so a maliciously crafted
/// name cannot escape the destination via `..` or an absolute path.
pub fn extract(archive_path: &Path, dest_dir: &Path) -> Result<()> {
    let mmap = map_readonly(archive_path)?;
    let cabinet = Cabinet::parse(&mmap)?;

    create_dest_dir(dest_dir)?;

    for (index, folder) in cabinet.folders().iter().enumerate() {
        debug!(folder = index, "extracting folder");
        let bytes = pipeline::extract_folder(&cabinet, index, folder)?;
        for file in cabinet.files_in_folder(index) {
            let start = file.uoff_folder_start as usize;
            let end = start
                .checked_add(file.cb_file as usize)
                .ok_or(CabError::BufferOverflow { what: "file byte range" })?;
            if end > bytes.len() {
                return Err(CabError::TruncatedBlock { expected: end, got: bytes.len() });
            }
            let out_path = safe_join(dest_dir, &file.name);
            fs::write(&out_path, &bytes[start..end]).map_err(|e| CabError::io("write", &out_path, e))?;
        }
    }
    Ok(())
}

fn safe_join(dest_dir: &Path, name: &str) -> PathBuf {
    let basename = Path::new(name).file_name().map(PathBuf::from).unwrap_or_else(|| PathBuf::from(name));
    dest_dir.join(basename)
}

#[cfg(unix)]
fn create_dest_dir(dest_dir: &Path) -> Result<()> {
    use std::os::unix::fs::DirBuilderExt;
    if dest_dir.exists() {
        return Ok(());
    }
    fs::DirBuilder::new()
        .mode(0o755)
        .create(dest_dir)
        .map_err(|e| CabError::io("mkdir", dest_dir, e))
}

#[cfg(not(unix))]
fn create_dest_dir(dest_dir: &Path) -> Result<()> {
    if dest_dir.exists() {
        return Ok(());
    }
    fs::create_dir(dest_dir).map_err(|e| CabError::io("mkdir", dest_dir, e))
}

/// Packs the files named in `manifest_path` into a new archive at
/// `output_path`, using `level` (0..=9) for ms-zip compression. Builds
/// the whole archive in memory and writes it with a single sequential
/// `write_all`; a failure partway through never leaves a partial file.
pub fn pack(manifest_path: &Path, level: u32, output_path: &Path) -> Result<()> {
    let text = fs::read_to_string(manifest_path).map_err(|e| CabError::io("read", manifest_path, e))?;
    let entries = manifest::parse(&text)?;
    let bytes = build_archive_bytes(&entries, level)?;
    let mut file = File::create(output_path).map_err(|e| CabError::io("create", output_path, e))?;
    file.write_all(&bytes).map_err(|e| CabError::io("write", output_path, e))?;
    Ok(())
}

struct PackedFolder {
    files: Vec<FileEntry>,
    blocks: Vec<pipeline::PackedBlock>,
}

fn build_archive_bytes(entries: &[ManifestEntry], level: u32) -> Result<Vec<u8>> {
    let folder_count = manifest::folder_count(entries);
    let file_count = entries.len();

    let mut packed_folders = Vec::with_capacity(folder_count as usize);
    for folder_index in 0..folder_count {
        let folder_entries = manifest::entries_for_folder(entries, folder_index);
        let mut staging = Vec::new();
        let mut files = Vec::with_capacity(folder_entries.len());
        for entry in &folder_entries {
            let source = Path::new(&entry.source_path);
            let data = fs::read(source).map_err(|e| CabError::io("read", source, e))?;
            let uoff_folder_start = staging.len() as u32;
            staging.extend_from_slice(&data);
            files.push(FileEntry {
                cb_file: data.len() as u32,
                uoff_folder_start,
                i_folder: folder_index as u16,
                date: 0,
                time: 0,
                attribs: 0,
                name: manifest::archived_name(&entry.source_path).to_string(),
            });
        }
        let blocks = pipeline::pack_folder(&staging, true, level)?;
        packed_folders.push(PackedFolder { files, blocks });
    }

    let coff_files = consts::HEADER_SIZE + folder_count as usize * consts::FOLDER_ENTRY_SIZE;
    let file_table_size: usize = packed_folders
        .iter()
        .flat_map(|f| f.files.iter())
        .map(|f| consts::FILE_ENTRY_SIZE + f.name.len() + 1)
        .sum();
    let block_base = coff_files + file_table_size;

    let mut folder_table = Vec::with_capacity(folder_count as usize);
    let mut coff_cab_start = block_base;
    for packed in &packed_folders {
        let folder_compressed_size: usize = packed.blocks.iter().map(|b| b.encoded_len()).sum();
        folder_table.push(FolderEntry {
            coff_cab_start: coff_cab_start as u32,
            c_cf_data: packed.blocks.len() as u16,
            type_compress: consts::COMPRESS_TYPE_MSZIP,
        });
        coff_cab_start += folder_compressed_size;
    }
    let cb_cabinet = coff_cab_start;

    let set_id = (std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.subsec_micros())
        .unwrap_or(0)) as u16;

    let mut header = Header::new_for_pack(folder_count as u16, file_count as u16, set_id);
    header.coff_files = coff_files as u32;
    header.cb_cabinet = cb_cabinet as u32;

    let mut out = Vec::with_capacity(cb_cabinet);
    model::write_header(&mut out, &header);
    for folder in &folder_table {
        model::write_folder_entry(&mut out, folder);
    }
    for packed in &packed_folders {
        for file in &packed.files {
            model::write_file_entry(&mut out, file);
        }
    }
    for packed in &packed_folders {
        for block in &packed.blocks {
            model::write_data_block_header(&mut out, &block.header);
            out.extend_from_slice(&block.payload);
        }
    }
    Ok(out)
}

/// Clones the mutable header/file fields of `reference` onto `target`,
/// refusing with [`CabError::StructuralMismatch`] if the two archives are
/// not structurally identical. The target's compressed body is never
/// rewritten; only header-region bytes are patched in place, then flushed.
pub fn clone(reference_path: &Path, target_path: &Path) -> Result<()> {
    let reference_file = File::open(reference_path).map_err(|e| CabError::io("open", reference_path, e))?;
    let reference = unsafe { Mmap::map(&reference_file) }.map_err(|e| CabError::io("mmap", reference_path, e))?;

    let target_file =
        fs::OpenOptions::new().read(true).write(true).open(target_path).map_err(|e| CabError::io("open", target_path, e))?;
    let mut target = unsafe { MmapMut::map_mut(&target_file) }.map_err(|e| CabError::io("mmap", target_path, e))?;

    clone_impl::clone_into(&reference, &mut target)?;
    target.flush().map_err(|e| CabError::io("flush", target_path, e))?;
    Ok(())
}
