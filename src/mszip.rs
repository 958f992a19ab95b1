//! The "ms-zip" deflate codec: raw RFC 1951 streams tagged with a 0x43 0x4B
//! ("CK") signature, chained across blocks by a 32 KiB sliding dictionary.
//!
//! The compressor keeps one continuous `flate2::Compress` stream and
//! flushes it at each block boundary (`Sync` for interior blocks, `Finish`
//! for the last); because the stream is never reset, its LZ77 window is
//! exactly the previous blocks' uncompressed bytes, which is what the
//! decompressor reloads explicitly. The decompressor resets per block and
//! reseeds the window by feeding a synthetic empty stored-block chunk
//! through it ahead of the real payload, since raw-mode `Decompress`
//! has no direct `set_dictionary`. Both sides observe the same external
//! contract: block *i* only decodes correctly given block *i-1*'s output.

use byteorder::{LittleEndian, WriteBytesExt};

use crate::consts::{MAX_UNCOMPRESSED_BLOCK_SIZE, MSZIP_SIGNATURE};
use crate::error::{CabError, Result};

const MSZIP_BLOCK_TERMINATOR: u16 = 0x0003;

/// Compresses successive 32 KiB-or-smaller chunks into ms-zip blocks.
pub struct MsZipCompressor {
    compressor: flate2::Compress,
}

impl MsZipCompressor {
    pub fn new() -> MsZipCompressor {
        MsZipCompressor { compressor: flate2::Compress::new(flate2::Compression::new(6), false) }
    }

    pub fn with_level(level: u32) -> MsZipCompressor {
        MsZipCompressor { compressor: flate2::Compress::new(flate2::Compression::new(level), false) }
    }

    /// Compresses one chunk, returning the full block payload (signature
    /// included, but not the 8-byte block header).
    pub fn compress_block(&mut self, data: &[u8], is_last_block: bool) -> Result<Vec<u8>> {
        debug_assert!(data.len() <= MAX_UNCOMPRESSED_BLOCK_SIZE);
        let mut out = Vec::<u8>::with_capacity(data.len() + 16);
        out.extend_from_slice(&MSZIP_SIGNATURE);
        let flush =
            if is_last_block { flate2::FlushCompress::Finish } else { flate2::FlushCompress::Sync };
        self.compressor
            .compress_vec(data, &mut out, flush)
            .map_err(|e| CabError::Codec(format!("ms-zip compression failed: {e}")))?;
        if !is_last_block {
            out.write_u16::<LittleEndian>(MSZIP_BLOCK_TERMINATOR).unwrap();
        }
        // Fall back to a literal "stored" payload if deflate expanded the data.
        let max_out_len = data.len() + 7;
        if out.len() > max_out_len {
            out = Vec::with_capacity(max_out_len);
            out.extend_from_slice(&MSZIP_SIGNATURE);
            out.push(1);
            out.write_u16::<LittleEndian>(data.len() as u16).unwrap();
            out.write_u16::<LittleEndian>(!(data.len() as u16)).unwrap();
            out.extend_from_slice(data);
        }
        Ok(out)
    }
}

impl Default for MsZipCompressor {
    fn default() -> Self {
        MsZipCompressor::new()
    }
}

/// Decompresses successive ms-zip blocks, maintaining the 32 KiB dictionary.
pub struct MsZipDecompressor {
    decompressor: flate2::Decompress,
    dictionary: Vec<u8>,
}

impl MsZipDecompressor {
    pub fn new() -> MsZipDecompressor {
        MsZipDecompressor {
            decompressor: flate2::Decompress::new(false),
            dictionary: Vec::with_capacity(MAX_UNCOMPRESSED_BLOCK_SIZE),
        }
    }

    /// Decompresses one block's payload (signature included) to exactly
    /// `uncompressed_size` bytes.
    pub fn decompress_block(&mut self, data: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
        if data.len() < MSZIP_SIGNATURE.len() || data[..2] != MSZIP_SIGNATURE {
            return Err(CabError::Codec("ms-zip block missing CK signature".to_string()));
        }
        let data = &data[MSZIP_SIGNATURE.len()..];

        self.decompressor.reset(false);
        if !self.dictionary.is_empty() {
            debug_assert!(self.dictionary.len() <= MAX_UNCOMPRESSED_BLOCK_SIZE);
            let length = self.dictionary.len() as u16;
            let mut chunk: Vec<u8> = vec![0];
            chunk.write_u16::<LittleEndian>(length).unwrap();
            chunk.write_u16::<LittleEndian>(!length).unwrap();
            chunk.extend_from_slice(&self.dictionary);
            let mut sink = Vec::with_capacity(self.dictionary.len());
            self.decompressor
                .decompress_vec(&chunk, &mut sink, flate2::FlushDecompress::Sync)
                .map_err(|e| CabError::Codec(format!("ms-zip dictionary reseed failed: {e}")))?;
        }

        let mut out = Vec::<u8>::with_capacity(uncompressed_size);
        self.decompressor
            .decompress_vec(data, &mut out, flate2::FlushDecompress::Finish)
            .map_err(|e| CabError::Codec(format!("ms-zip decompression failed: {e}")))?;
        if out.len() != uncompressed_size {
            return Err(CabError::TruncatedBlock { expected: uncompressed_size, got: out.len() });
        }

        if out.len() >= MAX_UNCOMPRESSED_BLOCK_SIZE {
            let start = out.len() - MAX_UNCOMPRESSED_BLOCK_SIZE;
            self.dictionary = out[start..].to_vec();
        } else {
            let total = self.dictionary.len() + out.len();
            if total > MAX_UNCOMPRESSED_BLOCK_SIZE {
                self.dictionary.drain(..(total - MAX_UNCOMPRESSED_BLOCK_SIZE));
            }
            self.dictionary.extend_from_slice(&out);
        }
        Ok(out)
    }
}

impl Default for MsZipDecompressor {
    fn default() -> Self {
        MsZipDecompressor::new()
    }
}

/// Copies a "stored" block's payload directly; stored blocks carry no tag
/// and are treated as truly raw (see `DESIGN.md`'s decided open question).
pub fn decompress_stored_block(data: &[u8], uncompressed_size: usize) -> Result<Vec<u8>> {
    if data.len() != uncompressed_size {
        return Err(CabError::TruncatedBlock { expected: uncompressed_size, got: data.len() });
    }
    Ok(data.to_vec())
}
