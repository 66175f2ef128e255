//! Installer download and unattended launch.

use super::transport::{Transport, TransportError};
use std::path::{Path, PathBuf};
use std::process::Command;
use thiserror::Error;

/// File name the installer is saved under.
pub const INSTALLER_FILE_NAME: &str = "EqualizerAPO-setup.exe";

/// NSIS silent-install switch.
pub const SILENT_FLAG: &str = "/S";

/// Installer error types.
#[derive(Debug, Error)]
pub enum InstallerError {
    #[error("Download failed: {0}")]
    Download(#[from] TransportError),

    #[error("Failed to save installer to {}: {source}", path.display())]
    Save {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to start {}: {source}", path.display())]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Starts child processes without waiting for them.
pub trait ProcessLauncher {
    /// Spawn `program` detached and return its process id.
    fn spawn_detached(&self, program: &Path, args: &[&str]) -> std::io::Result<u32>;
}

/// Launcher backed by `std::process::Command`.
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemLauncher;

impl ProcessLauncher for SystemLauncher {
    fn spawn_detached(&self, program: &Path, args: &[&str]) -> std::io::Result<u32> {
        // The child handle is dropped on purpose; the installer outlives this call.
        let child = Command::new(program).args(args).spawn()?;
        Ok(child.id())
    }
}

/// A started installer process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchedInstaller {
    pub path: PathBuf,
    pub pid: u32,
}

/// Downloads the installer and starts it silently.
pub struct InstallerLauncher<'a> {
    transport: &'a dyn Transport,
    launcher: &'a dyn ProcessLauncher,
}

impl<'a> InstallerLauncher<'a> {
    pub fn new(transport: &'a dyn Transport, launcher: &'a dyn ProcessLauncher) -> Self {
        Self {
            transport,
            launcher,
        }
    }

    /// Save the installer into `workdir` and start it with [`SILENT_FLAG`].
    ///
    /// Returns as soon as the process has been spawned. `workdir` must
    /// outlive the installer, so callers keep it for the whole run.
    pub fn launch(&self, url: &str, workdir: &Path) -> Result<LaunchedInstaller, InstallerError> {
        let bytes = self.transport.get(url)?;
        let path = workdir.join(INSTALLER_FILE_NAME);
        std::fs::write(&path, &bytes).map_err(|source| InstallerError::Save {
            path: path.clone(),
            source,
        })?;
        tracing::info!("Downloaded Equalizer APO installer to {}", path.display());

        let pid = self
            .launcher
            .spawn_detached(&path, &[SILENT_FLAG])
            .map_err(|source| InstallerError::Spawn {
                path: path.clone(),
                source,
            })?;
        tracing::info!("Started Equalizer APO installer (pid {pid})");

        Ok(LaunchedInstaller { path, pid })
    }
}
