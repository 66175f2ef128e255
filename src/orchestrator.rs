//! One provisioning run from installer download to merged `config.txt`.

use crate::apo_config::{merge_block, ChannelLayout, DirectiveBlock, MergeOutcome, DEFAULT_CONFIG_TEMPLATE};
use crate::audio::{self, ChannelProbe};
use crate::config::{PluginSource, ProvisionConfig};
use crate::error::{ExitStatus, ProvisionError};
use crate::net::{
    fetch_and_extract, InstallerError, InstallerLauncher, LaunchedInstaller, ProcessLauncher,
    ReleaseResolver, Transport,
};
use crate::platform::{ApoLocations, InstallLocator};
use crate::poll::Sleeper;
use crate::ui::{Desktop, DeviceSelectionDriver, SelectionOutcome, SelectorSettings};

/// Everything the run touches outside the process.
#[derive(Clone, Copy)]
pub struct Collaborators<'a> {
    pub transport: &'a dyn Transport,
    pub launcher: &'a dyn ProcessLauncher,
    pub desktop: &'a dyn Desktop,
    pub sleeper: &'a dyn Sleeper,
    pub channels: &'a dyn ChannelProbe,
    pub locator: &'a dyn InstallLocator,
}

/// What happened to one plugin archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PluginOutcome {
    /// Extracted into the VST directory
    Installed { entries: usize },

    /// No download URL could be determined
    Unresolved(String),

    /// Download or extraction failed
    Failed(String),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PluginReport {
    pub name: String,
    pub outcome: PluginOutcome,
}

impl PluginReport {
    pub fn is_installed(&self) -> bool {
        matches!(self.outcome, PluginOutcome::Installed { .. })
    }
}

/// Summary of a run that got as far as merging the config.
#[derive(Debug, Clone)]
pub struct ProvisionReport {
    pub installer: LaunchedInstaller,
    pub selection: SelectionOutcome,
    pub locations: ApoLocations,
    pub plugins: Vec<PluginReport>,
    pub layout: ChannelLayout,
    pub merge: MergeOutcome,
}

impl ProvisionReport {
    pub fn skipped_plugins(&self) -> impl Iterator<Item = &PluginReport> {
        self.plugins.iter().filter(|plugin| !plugin.is_installed())
    }

    pub fn exit_status(&self) -> ExitStatus {
        if self.skipped_plugins().next().is_some() {
            ExitStatus::PartialPluginsSkipped
        } else {
            ExitStatus::Success
        }
    }
}

pub struct Orchestrator<'a> {
    config: &'a ProvisionConfig,
    deps: Collaborators<'a>,
}

impl<'a> Orchestrator<'a> {
    pub fn new(config: &'a ProvisionConfig, deps: Collaborators<'a>) -> Self {
        Self { config, deps }
    }

    /// Install, enable the APO on the target microphone, add plugins and
    /// merge the directive block.
    ///
    /// Plugin failures are recorded in the report. Everything else ends the
    /// run with an error.
    pub fn run(&self) -> Result<ProvisionReport, ProvisionError> {
        let driver = DeviceSelectionDriver::new(
            self.deps.desktop,
            self.deps.sleeper,
            SelectorSettings::from_config(self.config),
        )?;

        // Leftover windows from an earlier run must not be mistaken for ours
        let stale = driver.snapshot();
        if !stale.is_empty() {
            tracing::warn!("Ignoring {} matching window(s) already open", stale.len());
        }

        // Keeps the downloaded installer on disk until setup has finished
        let workdir = tempfile::tempdir().map_err(|source| InstallerError::Save {
            path: std::env::temp_dir(),
            source,
        })?;
        let installer = InstallerLauncher::new(self.deps.transport, self.deps.launcher)
            .launch(&self.config.installer_url, workdir.path())?;

        let selection = driver.excluding(stale).run()?;

        let locations = self.deps.locator.locate().with_overrides(
            self.config.config_file_path.as_deref(),
            self.config.vst_plugin_dir.as_deref(),
        );

        let plugins = self
            .config
            .plugins
            .iter()
            .map(|source| self.install_plugin(source, &locations))
            .collect();

        let layout = audio::default_input_layout(self.deps.channels);
        let block = DirectiveBlock::new(&selection.key, layout).render();
        let merge = merge_block(&locations.config_file, &block, Some(DEFAULT_CONFIG_TEMPLATE))
            .map_err(|source| ProvisionError::ConfigIo {
                path: locations.config_file.clone(),
                source,
            })?;

        Ok(ProvisionReport {
            installer,
            selection,
            locations,
            plugins,
            layout,
            merge,
        })
    }

    fn install_plugin(&self, source: &PluginSource, locations: &ApoLocations) -> PluginReport {
        let name = source.name().to_string();

        let url = match source {
            PluginSource::Url { url, .. } => url.clone(),
            PluginSource::GithubRelease {
                repo,
                asset_contains,
                include_prerelease,
                ..
            } => {
                let resolver = ReleaseResolver::new(self.deps.transport, &self.config.release_api_base);
                match resolver.resolve(repo, asset_contains, *include_prerelease) {
                    Ok(asset) => asset.download_url,
                    Err(e) => {
                        tracing::warn!("Skipping {name}: {e}");
                        return PluginReport {
                            name,
                            outcome: PluginOutcome::Unresolved(e.to_string()),
                        };
                    }
                }
            }
        };

        let outcome = match fetch_and_extract(self.deps.transport, &url, &locations.vst_dir) {
            Ok(entries) => {
                tracing::info!("Installed {name} ({entries} entries)");
                PluginOutcome::Installed { entries }
            }
            Err(e) => {
                tracing::warn!("Skipping {name}: {e}");
                PluginOutcome::Failed(e.to_string())
            }
        };

        PluginReport { name, outcome }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{
        zip_bytes, FakeDesktop, FakeLauncher, FakeTransport, FakeWindow, FixedChannels,
        RecordingSleeper,
    };
    use crate::ui::listing::{ListingEntry, CAPTURE_SENTINEL, PLAYBACK_SENTINEL};
    use crate::ui::Disposition;
    use serde_json::json;
    use std::fs;
    use std::path::Path;

    const INSTALLER: &str = "https://dl.test/EqualizerAPO-setup.exe";
    const LOUDMAX: &str = "https://dl.test/LoudMax.zip";
    const RNNOISE: &str = "https://dl.test/win-rnnoise.zip";
    const API: &str = "https://api.test";
    const REPO: &str = "werman/noise-suppression-for-voice";

    fn config(target: &str) -> ProvisionConfig {
        ProvisionConfig {
            installer_url: INSTALLER.to_string(),
            target_device: target.to_string(),
            release_api_base: API.to_string(),
            plugins: vec![
                PluginSource::Url {
                    name: "LoudMax".to_string(),
                    url: LOUDMAX.to_string(),
                },
                PluginSource::GithubRelease {
                    name: "rnnoise".to_string(),
                    repo: REPO.to_string(),
                    asset_contains: "win-".to_string(),
                    include_prerelease: false,
                },
            ],
            ..ProvisionConfig::default()
        }
    }

    fn releases() -> serde_json::Value {
        json!([{
            "tag_name": "v1.10",
            "prerelease": false,
            "assets": [{
                "name": "win-rnnoise.zip",
                "content_type": "application/zip",
                "browser_download_url": RNNOISE,
            }],
        }])
    }

    fn full_transport() -> FakeTransport {
        FakeTransport::default()
            .with_body(INSTALLER, b"MZ".to_vec())
            .with_body(LOUDMAX, zip_bytes(&[("LoudMax64.dll", "dll")]))
            .with_json(&format!("{API}/repos/{REPO}/releases"), releases())
            .with_body(
                RNNOISE,
                zip_bytes(&[
                    ("win-rnnoise/vst/rnnoise_mono.dll", "mono"),
                    ("win-rnnoise/vst/rnnoise_stereo.dll", "stereo"),
                ]),
            )
    }

    fn tree() -> Vec<ListingEntry> {
        [
            PLAYBACK_SENTINEL,
            "Speakers",
            "Realtek",
            "not installed",
            CAPTURE_SENTINEL,
            "Line In",
            "Mic B",
            "APO is already installed",
        ]
        .into_iter()
        .map(ListingEntry::flat)
        .collect()
    }

    /// One lookup each for the selector, test and info titles.
    const SNAPSHOT_LOOKUPS: usize = 3;

    /// Installer windows appear only after the stale-window snapshot.
    fn installer_desktop() -> FakeDesktop {
        let desktop = FakeDesktop::default();
        desktop.add_window(
            FakeWindow::new(10, "Equalizer APO Device Selector")
                .visible_after(SNAPSHOT_LOOKUPS)
                .with_tree(tree()),
        );
        desktop.add_window(FakeWindow::new(11, "Testing APO").visible_after(SNAPSHOT_LOOKUPS));
        desktop.add_window(FakeWindow::new(12, "Info").visible_after(SNAPSHOT_LOOKUPS));
        desktop
    }

    struct Harness {
        transport: FakeTransport,
        launcher: FakeLauncher,
        desktop: FakeDesktop,
        sleeper: RecordingSleeper,
        channels: FixedChannels,
        locations: ApoLocations,
    }

    impl Harness {
        fn new(root: &Path) -> Self {
            Self {
                transport: full_transport(),
                launcher: FakeLauncher::default(),
                desktop: installer_desktop(),
                sleeper: RecordingSleeper::default(),
                channels: FixedChannels(Some(2)),
                locations: ApoLocations::under(root),
            }
        }

        fn run(&self, config: &ProvisionConfig) -> Result<ProvisionReport, ProvisionError> {
            let deps = Collaborators {
                transport: &self.transport,
                launcher: &self.launcher,
                desktop: &self.desktop,
                sleeper: &self.sleeper,
                channels: &self.channels,
                locator: &self.locations,
            };
            Orchestrator::new(config, deps).run()
        }
    }

    #[test]
    fn full_run_installs_plugins_and_writes_block() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new(dir.path());

        let report = harness.run(&config("Mic B")).unwrap();

        assert_eq!(report.exit_status(), ExitStatus::Success);
        assert_eq!(report.selection.key, "Line In Mic B");
        assert_eq!(report.selection.disposition, Disposition::Dismiss);
        assert_eq!(report.layout, ChannelLayout::Stereo);
        assert_eq!(report.merge, MergeOutcome::Created);
        assert_eq!(report.installer.pid, 4242);

        let vst = dir.path().join("VSTPlugins");
        assert!(vst.join("LoudMax64.dll").is_file());
        assert!(vst.join("win-rnnoise/vst/rnnoise_stereo.dll").is_file());

        let expected = DirectiveBlock::new("Line In Mic B", ChannelLayout::Stereo).render();
        let written = fs::read_to_string(dir.path().join("config").join("config.txt")).unwrap();
        assert_eq!(written, format!("{expected}\n"));
    }

    #[test]
    fn second_run_leaves_config_unchanged() {
        let dir = tempfile::tempdir().unwrap();
        let config_file = dir.path().join("config").join("config.txt");

        Harness::new(dir.path()).run(&config("Mic B")).unwrap();
        let first = fs::read(&config_file).unwrap();
        let report = Harness::new(dir.path()).run(&config("Mic B")).unwrap();

        assert_eq!(report.merge, MergeOutcome::AlreadyPresent);
        assert_eq!(fs::read(&config_file).unwrap(), first);
    }

    #[test]
    fn pristine_default_config_is_replaced() {
        let dir = tempfile::tempdir().unwrap();
        let config_file = dir.path().join("config").join("config.txt");
        fs::create_dir_all(config_file.parent().unwrap()).unwrap();
        fs::write(&config_file, DEFAULT_CONFIG_TEMPLATE).unwrap();

        let report = Harness::new(dir.path()).run(&config("Mic B")).unwrap();

        assert_eq!(report.merge, MergeOutcome::ReplacedDefault);
        assert!(!fs::read_to_string(&config_file).unwrap().contains("Preamp"));
    }

    #[test]
    fn skipped_plugins_downgrade_exit_status() {
        let dir = tempfile::tempdir().unwrap();
        let mut harness = Harness::new(dir.path());
        harness.transport = FakeTransport::default()
            .with_body(INSTALLER, b"MZ".to_vec())
            .with_status(LOUDMAX, 503);

        let report = harness.run(&config("Mic B")).unwrap();

        assert_eq!(report.exit_status(), ExitStatus::PartialPluginsSkipped);
        assert_eq!(report.exit_status().code(), 2);
        assert!(matches!(report.plugins[0].outcome, PluginOutcome::Failed(_)));
        assert!(matches!(report.plugins[1].outcome, PluginOutcome::Unresolved(_)));
        assert_eq!(report.merge, MergeOutcome::Created);
    }

    #[test]
    fn unknown_channel_count_uses_mono_plugin() {
        let dir = tempfile::tempdir().unwrap();
        let mut harness = Harness::new(dir.path());
        harness.channels = FixedChannels(None);

        let report = harness.run(&config("Mic B")).unwrap();

        assert_eq!(report.layout, ChannelLayout::Mono);
        let written = fs::read_to_string(&report.locations.config_file).unwrap();
        assert!(written.contains(r"rnnoise_mono.dll"));
    }

    #[test]
    fn missing_device_keeps_placeholder_key() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new(dir.path());

        let report = harness.run(&config("Nonexistent")).unwrap();

        assert_eq!(report.selection.key, "Default");
        assert!(report.selection.matched.is_none());
        let written = fs::read_to_string(&report.locations.config_file).unwrap();
        assert!(written.starts_with("Device: Default\n"));
    }

    #[test]
    fn config_overrides_take_precedence_over_locator() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new(&dir.path().join("registry"));
        let mut config = config("Mic B");
        config.config_file_path = Some(dir.path().join("custom.txt"));
        config.vst_plugin_dir = Some(dir.path().join("vst"));

        let report = harness.run(&config).unwrap();

        assert_eq!(report.locations.config_file, dir.path().join("custom.txt"));
        assert!(dir.path().join("custom.txt").is_file());
        assert!(dir.path().join("vst").join("LoudMax64.dll").is_file());
    }

    #[test]
    fn stale_selector_window_is_ignored() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new(dir.path());
        // Already open before the run and without a usable tree
        harness
            .desktop
            .add_window(FakeWindow::new(9, "Old Device Selector"));

        let report = harness.run(&config("Mic B")).unwrap();

        assert_eq!(report.selection.key, "Line In Mic B");
        assert!(harness
            .desktop
            .actions()
            .contains(&"press:Equalizer APO Device Selector:Close".to_string()));
    }

    #[test]
    fn open_system_information_window_is_not_taken_for_info_dialog() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new(dir.path());
        harness
            .desktop
            .add_window(FakeWindow::new(8, "System Information"));

        harness.run(&config("Mic B")).unwrap();

        let actions = harness.desktop.actions();
        assert!(actions.contains(&"press:Info:OK".to_string()));
        assert!(!actions.iter().any(|a| a.starts_with("press:System Information")));
    }

    #[test]
    fn installer_failure_stops_before_gui() {
        let dir = tempfile::tempdir().unwrap();
        let mut harness = Harness::new(dir.path());
        harness.launcher = FakeLauncher::failing();

        let err = harness.run(&config("Mic B")).unwrap_err();

        assert_eq!(err.exit_status(), ExitStatus::SetupFailure);
        assert_eq!(harness.desktop.find_calls(), SNAPSHOT_LOOKUPS);
        assert!(!dir.path().join("config").exists());
    }

    #[test]
    fn missing_selector_is_a_gui_failure() {
        let dir = tempfile::tempdir().unwrap();
        let mut harness = Harness::new(dir.path());
        harness.desktop = FakeDesktop::default();

        let err = harness.run(&config("Mic B")).unwrap_err();

        assert!(matches!(err, ProvisionError::UiWaitTimeout { attempts: 20, .. }));
        assert_eq!(err.exit_status().code(), 3);
        assert!(harness.transport.requests().iter().all(|url| url == INSTALLER));
    }

    #[test]
    fn unwritable_config_is_a_config_failure() {
        let dir = tempfile::tempdir().unwrap();
        let harness = Harness::new(dir.path());
        let mut config = config("Mic B");
        // A directory where the file should be
        config.config_file_path = Some(dir.path().to_path_buf());

        let err = harness.run(&config).unwrap_err();

        assert!(matches!(err, ProvisionError::ConfigIo { .. }));
        assert_eq!(err.exit_status(), ExitStatus::ConfigFailure);
    }
}
