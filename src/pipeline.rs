//! The folder pipeline (C5): drives chunked (de)compression across a
//! folder's block chain, carrying the 32 KiB dictionary between blocks.

use tracing::{debug, trace, warn};

use crate::archive::Cabinet;
use crate::checksum;
use crate::consts;
use crate::error::{CabError, Result};
use crate::model::{DataBlockHeader, FolderEntry};
use crate::mszip::{self, MsZipCompressor, MsZipDecompressor};

/// Decompresses every block of `folder` in order, returning the
/// concatenated uncompressed bytes (total length `Σ cbUncomp`).
///
/// Checksum mismatches are logged as warnings and do not abort extraction;
/// this preserves the historical behaviour where a corrupted archive still
/// yields best-effort output (see `DESIGN.md`).
pub fn extract_folder(cabinet: &Cabinet<'_>, folder_index: usize, folder: &FolderEntry) -> Result<Vec<u8>> {
    let kind = folder.compression_kind();
    if kind != consts::COMPRESS_TYPE_NONE && kind != consts::COMPRESS_TYPE_MSZIP {
        return Err(CabError::UnsupportedCompression { type_compress: folder.type_compress });
    }

    let blocks = cabinet.iter_blocks(folder)?;
    debug!(folder = folder_index, blocks = blocks.len(), "decompressing folder");
    let mut decompressor = MsZipDecompressor::new();
    let mut out = Vec::new();

    for (block_index, (block_header, payload)) in blocks.into_iter().enumerate() {
        verify_checksum(folder_index, block_index, &block_header, payload);

        let uncompressed = if kind == consts::COMPRESS_TYPE_MSZIP {
            decompressor.decompress_block(payload, block_header.cb_uncomp as usize)?
        } else {
            mszip::decompress_stored_block(payload, block_header.cb_uncomp as usize)?
        };
        trace!(
            folder = folder_index,
            block = block_index,
            cb_data = block_header.cb_data,
            cb_uncomp = uncompressed.len(),
            "decompressed block"
        );
        out.extend_from_slice(&uncompressed);
    }
    debug!(folder = folder_index, bytes = out.len(), "folder decompressed");
    Ok(out)
}

fn verify_checksum(folder_index: usize, block_index: usize, header: &DataBlockHeader, payload: &[u8]) {
    if header.csum == 0 {
        return;
    }
    let computed = block_checksum(header.cb_data, header.cb_uncomp, payload);
    if computed != header.csum {
        warn!(
            folder = folder_index,
            block = block_index,
            expected = header.csum,
            computed,
            "checksum mismatch in cabinet data block; continuing best-effort"
        );
    }
}

/// Computes the C2 checksum over `cbData || cbUncomp || payload`.
pub fn block_checksum(cb_data: u16, cb_uncomp: u16, payload: &[u8]) -> u32 {
    let mut buf = Vec::with_capacity(4 + payload.len());
    buf.extend_from_slice(&cb_data.to_le_bytes());
    buf.extend_from_slice(&cb_uncomp.to_le_bytes());
    buf.extend_from_slice(payload);
    checksum::checksum(&buf)
}

/// One compressed data block ready to be serialized: its header (with
/// `csum` already computed) and its payload bytes.
pub struct PackedBlock {
    pub header: DataBlockHeader,
    pub payload: Vec<u8>,
}

impl PackedBlock {
    pub fn encoded_len(&self) -> usize {
        consts::DATA_BLOCK_HEADER_SIZE + self.payload.len()
    }
}

/// Slices `staging` into ≤32,768-byte chunks and compresses each in turn,
/// chaining the 32 KiB dictionary across chunks (property 2, 3, 4 of the
/// testable-properties list).
pub fn pack_folder(staging: &[u8], use_mszip: bool, level: u32) -> Result<Vec<PackedBlock>> {
    let mut compressor = MsZipCompressor::with_level(level);
    let mut blocks = Vec::new();
    let chunks: Vec<&[u8]> = staging.chunks(consts::MAX_UNCOMPRESSED_BLOCK_SIZE).collect();
    let last_index = chunks.len().saturating_sub(1);

    for (i, chunk) in chunks.into_iter().enumerate() {
        let payload = if use_mszip {
            compressor.compress_block(chunk, i == last_index)?
        } else {
            chunk.to_vec()
        };
        let cb_data = payload.len() as u16;
        let cb_uncomp = chunk.len() as u16;
        let csum = block_checksum(cb_data, cb_uncomp, &payload);
        trace!(block = i, cb_uncomp, cb_data, "packed block");
        blocks.push(PackedBlock { header: DataBlockHeader { csum, cb_data, cb_uncomp }, payload });
    }
    debug!(blocks = blocks.len(), bytes = staging.len(), "folder packed");
    if blocks.is_empty() {
        // An empty folder (zero bytes of content) still needs a reconcilable
        // block count of zero; nothing to emit.
    }
    Ok(blocks)
}
