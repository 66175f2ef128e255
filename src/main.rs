use anyhow::Context;
use apo_provision::{logging, ExitStatus, ProvisionConfig, ProvisionError, ProvisionReport};
use std::process::ExitCode;
use std::time::Duration;

fn load_settings() -> anyhow::Result<ProvisionConfig> {
    ProvisionConfig::discover()
        .map_err(ProvisionError::from)
        .context("Failed to load apo-provision settings")
}

#[cfg(windows)]
fn provision(config: &ProvisionConfig) -> Result<ProvisionReport, ProvisionError> {
    use apo_provision::audio::WasapiChannelProbe;
    use apo_provision::net::{HttpTransport, SystemLauncher};
    use apo_provision::platform::{self, ComGuard, RegistryLocator};
    use apo_provision::ui::{UiError, UiaDesktop};
    use apo_provision::{Collaborators, Orchestrator, ThreadSleeper};

    if config.require_elevation && !platform::is_elevated() {
        return Err(ProvisionError::NotElevated);
    }

    let _com = ComGuard::new().map_err(|e| UiError::Unavailable(e.to_string()))?;
    let transport = HttpTransport::new(config.timing.download_timeout())?;
    let desktop = UiaDesktop::new()?;
    let channels = WasapiChannelProbe::new();
    let locator = RegistryLocator::new();

    let deps = Collaborators {
        transport: &transport,
        launcher: &SystemLauncher,
        desktop: &desktop,
        sleeper: &ThreadSleeper,
        channels: &channels,
        locator: &locator,
    };
    Orchestrator::new(config, deps).run()
}

#[cfg(not(windows))]
fn provision(_config: &ProvisionConfig) -> Result<ProvisionReport, ProvisionError> {
    Err(ProvisionError::UnsupportedPlatform)
}

fn report(result: Result<ProvisionReport, ProvisionError>) -> ExitStatus {
    match result {
        Ok(report) => {
            for plugin in report.skipped_plugins() {
                tracing::warn!("Plugin {} was not installed: {:?}", plugin.name, plugin.outcome);
            }
            if !report.merge.wrote() {
                tracing::info!("config.txt already held the directive block");
            }
            tracing::info!(
                "Device {} set up, config at {}",
                report.selection.key,
                report.locations.config_file.display()
            );
            report.exit_status()
        }
        Err(e) => {
            tracing::error!("{e}");
            e.exit_status()
        }
    }
}

fn main() -> ExitCode {
    logging::init();
    tracing::warn!("DO NOT TYPE OR MOVE MOUSE WHILE PROGRAM IS RUNNING");

    let (status, exit_delay) = match load_settings() {
        Ok(config) => (report(provision(&config)), config.exit_delay_secs),
        Err(e) => {
            tracing::error!("{e:#}");
            (ExitStatus::SetupFailure, ProvisionConfig::default().exit_delay_secs)
        }
    };

    tracing::info!("FINISHED with status {}. Closing in {exit_delay} seconds...", status.code());
    std::thread::sleep(Duration::from_secs(exit_delay));

    status.into()
}
