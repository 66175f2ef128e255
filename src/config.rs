//! Provisioning settings.
//!
//! Everything that used to be a hardcoded URL or path lives in
//! [`ProvisionConfig`]. Settings are read from a TOML file when one exists
//! and fall back to defaults field by field.

use crate::poll::PollPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use thiserror::Error;

/// Environment variable pointing at an explicit settings file.
pub const CONFIG_ENV_VAR: &str = "APO_PROVISION_CONFIG";

/// Settings file looked up next to the executable.
pub const CONFIG_FILE_NAME: &str = "apo-provision.toml";

const DEFAULT_INSTALLER_URL: &str = "https://sourceforge.net/projects/equalizerapo/files/latest/download";
const DEFAULT_LOUDMAX_URL: &str = "https://www.dropbox.com/scl/fi/yovjswlx94m7u6qink5sk/LoudMax_v1_45_WIN_VST2.zip?rlkey=tjjc50g4h120n8jxf1iud6qyc&dl=1";
const DEFAULT_RNNOISE_REPO: &str = "werman/noise-suppression-for-voice";
const DEFAULT_RELEASE_API: &str = "https://api.github.com";

/// Settings error types.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read settings file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse settings file {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Where a plugin archive comes from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum PluginSource {
    /// Fixed download URL
    Url { name: String, url: String },

    /// Newest matching zip asset of a GitHub release
    GithubRelease {
        name: String,
        repo: String,
        asset_contains: String,
        #[serde(default)]
        include_prerelease: bool,
    },
}

impl PluginSource {
    pub fn name(&self) -> &str {
        match self {
            PluginSource::Url { name, .. } | PluginSource::GithubRelease { name, .. } => name,
        }
    }
}

/// Poll and settle timings for the installer UI, plus the download limit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub dialog_poll_interval_ms: u64,
    pub dialog_poll_attempts: u32,
    pub tree_poll_interval_ms: u64,
    pub tree_timeout_ms: u64,
    pub settle_delay_ms: u64,

    /// Whole-request limit for downloads; unset means no limit
    pub download_timeout_secs: Option<u64>,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            dialog_poll_interval_ms: 1000,
            dialog_poll_attempts: 20,
            tree_poll_interval_ms: 500,
            tree_timeout_ms: 5000,
            settle_delay_ms: 100,
            download_timeout_secs: None,
        }
    }
}

impl TimingConfig {
    pub fn dialog_poll(&self) -> PollPolicy {
        PollPolicy::new(
            Duration::from_millis(self.dialog_poll_interval_ms),
            self.dialog_poll_attempts,
        )
    }

    pub fn tree_poll(&self) -> PollPolicy {
        PollPolicy::within(
            Duration::from_millis(self.tree_timeout_ms),
            Duration::from_millis(self.tree_poll_interval_ms),
        )
    }

    pub fn settle(&self) -> Duration {
        Duration::from_millis(self.settle_delay_ms)
    }

    pub fn download_timeout(&self) -> Option<Duration> {
        self.download_timeout_secs.map(Duration::from_secs)
    }
}

/// Complete provisioning settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProvisionConfig {
    /// Equalizer APO installer download
    pub installer_url: String,

    /// Substring of the capture device name to enable
    pub target_device: String,

    /// Overrides the config.txt location found in the registry
    pub config_file_path: Option<PathBuf>,

    /// Overrides the VST plugin directory found in the registry
    pub vst_plugin_dir: Option<PathBuf>,

    /// Plugin archives extracted into the VST directory
    pub plugins: Vec<PluginSource>,

    /// Base URL of the release-hosting API
    pub release_api_base: String,

    /// Refuse to run without administrator rights
    pub require_elevation: bool,

    /// Pause before the process exits so the console stays readable
    pub exit_delay_secs: u64,

    pub timing: TimingConfig,
}

impl Default for ProvisionConfig {
    fn default() -> Self {
        Self {
            installer_url: DEFAULT_INSTALLER_URL.to_string(),
            target_device: "Default".to_string(),
            config_file_path: None,
            vst_plugin_dir: None,
            plugins: vec![
                PluginSource::Url {
                    name: "LoudMax".to_string(),
                    url: DEFAULT_LOUDMAX_URL.to_string(),
                },
                PluginSource::GithubRelease {
                    name: "rnnoise".to_string(),
                    repo: DEFAULT_RNNOISE_REPO.to_string(),
                    asset_contains: "win-".to_string(),
                    include_prerelease: false,
                },
            ],
            release_api_base: DEFAULT_RELEASE_API.to_string(),
            require_elevation: true,
            exit_delay_secs: 3,
            timing: TimingConfig::default(),
        }
    }
}

impl ProvisionConfig {
    /// Parse settings from TOML text.
    pub fn from_toml(text: &str, origin: &Path) -> Result<Self, ConfigError> {
        toml::from_str(text).map_err(|source| ConfigError::Parse {
            path: origin.to_path_buf(),
            source,
        })
    }

    /// Load settings from a file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml(&text, path)
    }

    /// Settings file to use, if any.
    ///
    /// An explicit path in [`CONFIG_ENV_VAR`] wins even when the file is
    /// missing, so a typo surfaces as an error instead of silent defaults.
    pub fn locate() -> Option<PathBuf> {
        if let Some(explicit) = std::env::var_os(CONFIG_ENV_VAR) {
            return Some(PathBuf::from(explicit));
        }

        let beside_exe = std::env::current_exe()
            .ok()?
            .parent()?
            .join(CONFIG_FILE_NAME);
        beside_exe.exists().then_some(beside_exe)
    }

    /// Load the located settings file or fall back to defaults.
    pub fn discover() -> Result<Self, ConfigError> {
        match Self::locate() {
            Some(path) => {
                tracing::info!("Loading settings from {}", path.display());
                Self::load(&path)
            }
            None => Ok(Self::default()),
        }
    }
}
