//! Zip archive download and extraction.

use super::transport::{Transport, TransportError};
use std::io::Cursor;
use std::path::{Path, PathBuf};
use thiserror::Error;
use zip::result::ZipError;
use zip::ZipArchive;

/// Archive fetch error types.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("Download failed: {0}")]
    Transport(#[from] TransportError),

    #[error("Not a valid zip archive: {0}")]
    Corrupt(#[source] ZipError),

    #[error("Failed to write into {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Download `url` into memory and extract every entry below `dest`.
///
/// Internal paths are preserved and directories are created as needed.
/// Returns the number of archive entries.
pub fn fetch_and_extract(
    transport: &dyn Transport,
    url: &str,
    dest: &Path,
) -> Result<usize, ArchiveError> {
    let body = transport.get(url)?;
    let mut archive = ZipArchive::new(Cursor::new(body)).map_err(ArchiveError::Corrupt)?;

    std::fs::create_dir_all(dest).map_err(|source| ArchiveError::Io {
        path: dest.to_path_buf(),
        source,
    })?;

    archive.extract(dest).map_err(|err| match err {
        ZipError::Io(source) => ArchiveError::Io {
            path: dest.to_path_buf(),
            source,
        },
        other => ArchiveError::Corrupt(other),
    })?;

    tracing::info!("Files extracted to {}", dest.display());
    Ok(archive.len())
}
