use std::path::PathBuf;

use thiserror::Error;

/// Everything that can go wrong while parsing, building, or patching a cabinet.
///
/// Each variant maps to a distinct process exit code at the CLI boundary.
#[derive(Debug, Error)]
pub enum CabError {
    /// Argument parsing / CLI misuse.
    #[error("usage error: {0}")]
    Usage(String),

    /// File open/read/write/stat/mmap failed.
    #[error("{op} failed for {path}: {source}")]
    Io {
        op: &'static str,
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A structure or span would read past the archive's declared length.
    #[error("range error: offset {offset} + len {len} exceeds {available} available bytes")]
    Range {
        offset: usize,
        len: usize,
        available: usize,
    },

    /// Header magic did not equal "MSCF".
    #[error("bad signature: expected MSCF, found {found:02x?}")]
    BadSignature { found: [u8; 4] },

    /// `typeCompress` low nibble was not 0 (stored) or 1 (ms-zip).
    #[error("unsupported compression type 0x{type_compress:x}")]
    UnsupportedCompression { type_compress: u16 },

    /// A block produced fewer uncompressed bytes than `cbUncomp` declared.
    #[error("truncated block: expected {expected} bytes, got {got}")]
    TruncatedBlock { expected: usize, got: usize },

    /// The underlying deflate library refused input.
    #[error("codec error: {0}")]
    Codec(String),

    /// Pack computed a size that would overflow a fixed buffer.
    #[error("buffer overflow while computing {what}")]
    BufferOverflow { what: &'static str },

    /// Clone refused because a non-patchable field differed between reference and target.
    #[error("structural mismatch in field `{field}`")]
    StructuralMismatch { field: String },

    /// The pack manifest was malformed.
    #[error("manifest error at line {line}: {message}")]
    Manifest { line: usize, message: String },
}

/// Shorthand used throughout the crate.
pub type Result<T> = std::result::Result<T, CabError>;

impl CabError {
    pub(crate) fn io(op: &'static str, path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        CabError::Io { op, path: path.into(), source }
    }

    /// Maps each variant to a distinct nonzero process exit code, per the
    /// convention that 0 is success and 1 is a usage error.
    pub fn exit_code(&self) -> i32 {
        match self {
            CabError::Usage(_) => 1,
            CabError::Io { .. } => 2,
            CabError::Range { .. } => 3,
            CabError::BadSignature { .. } => 4,
            CabError::UnsupportedCompression { .. } => 5,
            CabError::TruncatedBlock { .. } => 6,
            CabError::Codec(_) => 7,
            CabError::BufferOverflow { .. } => 8,
            CabError::StructuralMismatch { .. } => 9,
            CabError::Manifest { .. } => 10,
        }
    }
}
