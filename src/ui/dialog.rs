//! Waiting for the installer's top-level windows.

use super::element::{Desktop, Dialog, TitlePattern, WindowId};
use crate::error::ProvisionError;
use crate::poll::{PollPolicy, Sleeper};
use std::collections::HashSet;
use std::time::Duration;

/// Polls the desktop for a window whose title matches a pattern.
pub struct DialogWaiter<'a> {
    desktop: &'a dyn Desktop,
    sleeper: &'a dyn Sleeper,
    policy: PollPolicy,
    settle: Duration,
}

impl<'a> DialogWaiter<'a> {
    pub fn new(
        desktop: &'a dyn Desktop,
        sleeper: &'a dyn Sleeper,
        policy: PollPolicy,
        settle: Duration,
    ) -> Self {
        Self {
            desktop,
            sleeper,
            policy,
            settle,
        }
    }

    /// Ids of windows currently matching `pattern`.
    ///
    /// Taken before the installer starts so that a window left over from an
    /// earlier run is never mistaken for the fresh one.
    pub fn snapshot(&self, pattern: &TitlePattern) -> HashSet<WindowId> {
        match self.desktop.find_windows(pattern) {
            Ok(windows) => windows.iter().map(|window| window.id()).collect(),
            Err(err) => {
                tracing::debug!("Window snapshot for {pattern} failed: {err}");
                HashSet::new()
            }
        }
    }

    /// Wait for a matching window that is not in `stale`.
    pub fn wait_excluding(
        &self,
        pattern: &TitlePattern,
        stale: &HashSet<WindowId>,
    ) -> Result<Box<dyn Dialog>, ProvisionError> {
        tracing::debug!("Waiting up to {:?} for {pattern}", self.policy.budget());
        let dialog = self
            .policy
            .poll(self.sleeper, || match self.desktop.find_windows(pattern) {
                Ok(windows) => windows
                    .into_iter()
                    .find(|window| !stale.contains(&window.id())),
                Err(err) => {
                    tracing::debug!("Window lookup for {pattern} failed: {err}");
                    None
                }
            })
            .map_err(|timeout| {
                tracing::error!("Could not connect to a window matching {pattern}");
                ProvisionError::UiWaitTimeout {
                    what: format!("window matching '{pattern}'"),
                    attempts: timeout.attempts,
                }
            })?;

        tracing::debug!("Attached to '{}'", dialog.title());
        // Give the window a moment to finish opening.
        self.sleeper.sleep(self.settle);
        Ok(dialog)
    }
}
