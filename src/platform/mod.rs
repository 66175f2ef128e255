//! Windows integration: COM lifetime, elevation and where Equalizer APO
//! lives on disk.

#[cfg(windows)]
pub mod com;
#[cfg(windows)]
pub mod elevation;
#[cfg(windows)]
pub mod registry;

#[cfg(windows)]
pub use com::ComGuard;
#[cfg(windows)]
pub use elevation::is_elevated;
#[cfg(windows)]
pub use registry::RegistryLocator;

use std::path::{Path, PathBuf};

/// Directory under the install root holding `config.txt`.
pub const CONFIG_DIR_NAME: &str = "config";

pub const CONFIG_FILE_NAME: &str = "config.txt";

/// Directory under the install root that Equalizer APO loads VST plugins from.
pub const VST_DIR_NAME: &str = "VSTPlugins";

const INSTALL_DIR_NAME: &str = "EqualizerAPO";

/// Where an Equalizer APO installation keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApoLocations {
    pub config_file: PathBuf,
    pub vst_dir: PathBuf,
}

impl ApoLocations {
    /// Standard layout below an install root.
    pub fn under(root: &Path) -> Self {
        Self {
            config_file: root.join(CONFIG_DIR_NAME).join(CONFIG_FILE_NAME),
            vst_dir: root.join(VST_DIR_NAME),
        }
    }

    /// `%ProgramFiles%\EqualizerAPO`, the installer's default target.
    pub fn default_install() -> Self {
        let program_files = std::env::var_os("ProgramFiles")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(r"C:\Program Files"));
        Self::under(&program_files.join(INSTALL_DIR_NAME))
    }

    /// Replace either location with an explicit override.
    pub fn with_overrides(mut self, config_file: Option<&Path>, vst_dir: Option<&Path>) -> Self {
        if let Some(path) = config_file {
            self.config_file = path.to_path_buf();
        }
        if let Some(path) = vst_dir {
            self.vst_dir = path.to_path_buf();
        }
        self
    }
}

/// Finds the Equalizer APO installation after setup has run.
pub trait InstallLocator {
    fn locate(&self) -> ApoLocations;
}

impl InstallLocator for ApoLocations {
    fn locate(&self) -> ApoLocations {
        self.clone()
    }
}
