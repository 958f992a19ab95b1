//! A library for reading, writing, and structurally diffing [Windows
//! cabinet](https://en.wikipedia.org/wiki/Cabinet_(file_format)) (CAB)
//! archives.
//!
//! The parser borrows directly from a mapped byte range ([`Cabinet::parse`]
//! takes a `&[u8]`); see the `cab-list`/`cab-extract`/`cab-pack`/`cab-clone`
//! binaries for the filesystem-facing operations built on top of it.

mod archive;
mod checksum;
mod clone;
mod consts;
mod cursor;
mod datetime;
mod error;
mod manifest;
mod model;
mod mszip;
mod pipeline;

pub mod ops;

pub use archive::Cabinet;
pub use error::{CabError, Result};
pub use model::{DataBlockHeader, FileEntry, FolderEntry, Header};

/// Installs a `tracing` subscriber reading `RUST_LOG` (defaulting to `warn`),
/// for use by the CLI binaries at startup.
pub fn init_logging() {
    use tracing_subscriber::EnvFilter;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    let _ = tracing_subscriber::fmt().with_env_filter(filter).try_init();
}
