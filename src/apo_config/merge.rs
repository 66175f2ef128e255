//! Idempotent block merge into `config.txt`.
//!
//! Concurrent runs against the same file are not supported; there is no
//! locking.

use std::fs::{self, OpenOptions};
use std::io::{ErrorKind, Write};
use std::path::Path;

/// What a merge did to the file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeOutcome {
    /// The file did not exist and was created with the block
    Created,

    /// The file held the pristine default and was replaced by the block
    ReplacedDefault,

    /// The block was appended to existing content
    Appended,

    /// The block was already present; nothing was written
    AlreadyPresent,
}

impl MergeOutcome {
    pub fn wrote(self) -> bool {
        self != MergeOutcome::AlreadyPresent
    }
}

/// Make sure `block` appears in the file at `path`.
///
/// Content equal to `default_template` counts as untouched and is replaced.
/// Otherwise the block is appended unless it is already a substring.
/// Blocks that differ only in parameter values are not recognised as
/// duplicates.
pub fn merge_block(
    path: &Path,
    block: &str,
    default_template: Option<&str>,
) -> std::io::Result<MergeOutcome> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }

    match OpenOptions::new().write(true).create_new(true).open(path) {
        Ok(mut file) => {
            writeln!(file, "{block}")?;
            tracing::info!("Created {} with directive block", path.display());
            return Ok(MergeOutcome::Created);
        }
        Err(err) if err.kind() == ErrorKind::AlreadyExists => {}
        Err(err) => return Err(err),
    }

    let existing = fs::read_to_string(path)?;

    if default_template.is_some_and(|template| existing == template) {
        fs::write(path, format!("{block}\n"))?;
        tracing::info!("Replaced default {} with directive block", path.display());
        return Ok(MergeOutcome::ReplacedDefault);
    }

    if existing.contains(block) {
        tracing::info!("Directive block already present in {}", path.display());
        return Ok(MergeOutcome::AlreadyPresent);
    }

    let mut file = OpenOptions::new().append(true).open(path)?;
    if !existing.is_empty() && !existing.ends_with('\n') {
        file.write_all(b"\n")?;
    }
    writeln!(file, "{block}")?;
    tracing::info!("Appended directive block to {}", path.display());
    Ok(MergeOutcome::Appended)
}
