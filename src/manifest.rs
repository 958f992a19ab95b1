//! Parses the pack manifest: one `<folder_index>,<source_path>` entry per
//! line, folder indices nonnegative and grouped contiguously in increasing
//! folder order.

use crate::error::{CabError, Result};

/// One parsed manifest line.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ManifestEntry {
    pub folder_index: u32,
    pub source_path: String,
}

/// Parses the manifest text. The final line may omit its trailing newline.
pub fn parse(text: &str) -> Result<Vec<ManifestEntry>> {
    let mut entries = Vec::new();
    for (line_no, raw_line) in text.lines().enumerate() {
        let line_no = line_no + 1;
        if raw_line.is_empty() {
            continue;
        }
        let (idx_str, path) = raw_line.split_once(',').ok_or_else(|| CabError::Manifest {
            line: line_no,
            message: "expected `<folder_index>,<source_path>`".to_string(),
        })?;
        let folder_index: u32 = idx_str.trim().parse().map_err(|_| CabError::Manifest {
            line: line_no,
            message: format!("`{idx_str}` is not a nonnegative integer"),
        })?;
        if path.is_empty() {
            return Err(CabError::Manifest { line: line_no, message: "empty source path".to_string() });
        }
        entries.push(ManifestEntry { folder_index, source_path: path.to_string() });
    }
    Ok(entries)
}

/// `max(folder_index) + 1`, or 0 for an empty manifest.
pub fn folder_count(entries: &[ManifestEntry]) -> u32 {
    entries.iter().map(|e| e.folder_index + 1).max().unwrap_or(0)
}

/// Entries whose `folder_index == folder`, in manifest order. Per the
/// manifest's grouping requirement this is already a contiguous run, but
/// filtering is robust to deviations without silently reordering anything.
pub fn entries_for_folder(entries: &[ManifestEntry], folder: u32) -> Vec<&ManifestEntry> {
    entries.iter().filter(|e| e.folder_index == folder).collect()
}

/// The archived filename: the last `/`-separated path segment.
pub fn archived_name(source_path: &str) -> &str {
    source_path.rsplit('/').next().unwrap_or(source_path)
}
