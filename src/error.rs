//! Top-level provisioning errors and the process exit-code contract.

use crate::config::ConfigError;
use crate::net::{InstallerError, TransportError};
use crate::ui::UiError;
use std::path::PathBuf;
use thiserror::Error;

/// Errors that end a provisioning run.
///
/// Plugin download problems never show up here: they are reported per plugin
/// in the run report and only downgrade the exit status.
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("Administrator privileges are required")]
    NotElevated,

    #[error(transparent)]
    Settings(#[from] ConfigError),

    #[error("Installer failed: {0}")]
    Installer(#[from] InstallerError),

    #[error("Network error: {0}")]
    Transport(#[from] TransportError),

    #[error("Timed out waiting for {what} after {attempts} attempts")]
    UiWaitTimeout { what: String, attempts: u32 },

    #[error("Unexpected window structure: {0}")]
    UiStructure(String),

    #[error("UI automation error: {0}")]
    Ui(#[from] UiError),

    #[error("Failed to update {}: {source}", path.display())]
    ConfigIo {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("This tool only runs on Windows")]
    UnsupportedPlatform,
}

impl ProvisionError {
    /// Exit status reported to the operator for this failure.
    pub fn exit_status(&self) -> ExitStatus {
        match self {
            ProvisionError::UiWaitTimeout { .. }
            | ProvisionError::UiStructure(_)
            | ProvisionError::Ui(_) => ExitStatus::GuiFailure,
            ProvisionError::ConfigIo { .. } => ExitStatus::ConfigFailure,
            _ => ExitStatus::SetupFailure,
        }
    }
}

/// Process exit codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum ExitStatus {
    /// Everything was installed and configured
    Success = 0,

    /// Settings, elevation, installer download or launch failed
    SetupFailure = 1,

    /// Device configured and config merged, but at least one plugin was skipped
    PartialPluginsSkipped = 2,

    /// The installer UI never appeared or did not look as expected
    GuiFailure = 3,

    /// config.txt could not be read or written
    ConfigFailure = 4,
}

impl ExitStatus {
    pub fn code(self) -> u8 {
        self as u8
    }
}

impl From<ExitStatus> for std::process::ExitCode {
    fn from(status: ExitStatus) -> Self {
        std::process::ExitCode::from(status.code())
    }
}
