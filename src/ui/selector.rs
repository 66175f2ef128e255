//! Device Selector automation.
//!
//! After installation Equalizer APO opens its Device Selector. The driver
//! attaches to it, enables the APO on the target capture device (unless it is
//! already enabled), closes the dialog and acknowledges the two follow-up
//! dialogs. Each step is a state of [`SelectorState`]; the commit/dismiss
//! decision is carried explicitly as a [`Disposition`].

use super::dialog::DialogWaiter;
use super::element::{Desktop, DeviceTree, Dialog, TitlePattern, TreeEntry, WindowId};
use super::listing::{CaptureRow, DeviceListing, ListingEntry};
use crate::config::ProvisionConfig;
use crate::error::ProvisionError;
use crate::poll::{PollPolicy, Sleeper};
use std::collections::HashSet;
use std::time::Duration;

pub const SELECTOR_TITLE: &str = ".*Device Selector.*";
pub const TEST_DIALOG_TITLE: &str = ".*Testing APO.*";
pub const INFO_DIALOG_TITLE: &str = ".*Info.*";

pub const COMMIT_BUTTON: &str = "OK";
pub const DISMISS_BUTTON: &str = "Close";
pub const ACKNOWLEDGE_BUTTON: &str = "OK";

/// Selection key used until a device row is matched.
pub const PLACEHOLDER_SELECTION: &str = "Default";

/// Driver states, in the order a successful run visits them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SelectorState {
    AwaitDialog,
    AwaitTree,
    ScanningPlayback,
    ScanningCapture,
    DeviceFound,
    DeviceNotFound,
    Confirming,
    AwaitTestDialog,
    AwaitInfoDialog,
    Done,
}

/// How the Device Selector gets closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Disposition {
    /// Changes were made; press OK to apply them
    Commit,

    /// Nothing changed; close without applying
    Dismiss,
}

impl Disposition {
    pub fn button(self) -> &'static str {
        match self {
            Disposition::Commit => COMMIT_BUTTON,
            Disposition::Dismiss => DISMISS_BUTTON,
        }
    }
}

/// Timing and target for one driver run.
#[derive(Debug, Clone)]
pub struct SelectorSettings {
    /// Substring of the capture device name to enable
    pub target_device: String,
    pub dialog_poll: PollPolicy,
    pub tree_poll: PollPolicy,

    /// Delay before every interaction with a tree node
    pub settle: Duration,
}

impl SelectorSettings {
    pub fn from_config(config: &ProvisionConfig) -> Self {
        Self {
            target_device: config.target_device.clone(),
            dialog_poll: config.timing.dialog_poll(),
            tree_poll: config.timing.tree_poll(),
            settle: config.timing.settle(),
        }
    }
}

/// Result of a completed driver run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionOutcome {
    /// Device key for the `Device:` directive
    pub key: String,
    pub matched: Option<CaptureRow>,
    pub disposition: Disposition,
    pub history: Vec<SelectorState>,
}

impl SelectionOutcome {
    pub fn toggled(&self) -> bool {
        self.disposition == Disposition::Commit
    }
}

struct Session {
    state: SelectorState,
    dialog: Option<Box<dyn Dialog>>,
    tree: Option<Box<dyn DeviceTree>>,
    entries: Vec<Box<dyn TreeEntry>>,
    listing: DeviceListing,
    matched: Option<CaptureRow>,
    toggled: bool,
    key: String,
    history: Vec<SelectorState>,
}

impl Session {
    fn new() -> Self {
        Self {
            state: SelectorState::AwaitDialog,
            dialog: None,
            tree: None,
            entries: Vec::new(),
            listing: DeviceListing::default(),
            matched: None,
            toggled: false,
            key: PLACEHOLDER_SELECTION.to_string(),
            history: vec![SelectorState::AwaitDialog],
        }
    }

    /// Commit only when a toggle happened in this session.
    fn disposition(&self) -> Disposition {
        if self.toggled {
            Disposition::Commit
        } else {
            Disposition::Dismiss
        }
    }
}

fn attached(dialog: &Option<Box<dyn Dialog>>) -> Result<&dyn Dialog, ProvisionError> {
    dialog
        .as_deref()
        .ok_or_else(|| ProvisionError::UiStructure("Device Selector is not attached".to_string()))
}

/// Drives the Device Selector from attachment to the last follow-up dialog.
pub struct DeviceSelectionDriver<'a> {
    desktop: &'a dyn Desktop,
    sleeper: &'a dyn Sleeper,
    settings: SelectorSettings,
    selector_title: TitlePattern,
    test_title: TitlePattern,
    info_title: TitlePattern,
    stale: HashSet<WindowId>,
}

impl<'a> DeviceSelectionDriver<'a> {
    pub fn new(
        desktop: &'a dyn Desktop,
        sleeper: &'a dyn Sleeper,
        settings: SelectorSettings,
    ) -> Result<Self, ProvisionError> {
        Ok(Self {
            desktop,
            sleeper,
            settings,
            selector_title: TitlePattern::new(SELECTOR_TITLE)?,
            test_title: TitlePattern::new(TEST_DIALOG_TITLE)?,
            info_title: TitlePattern::new(INFO_DIALOG_TITLE)?,
            stale: HashSet::new(),
        })
    }

    /// Never attach to one of these windows.
    pub fn excluding(mut self, stale: HashSet<WindowId>) -> Self {
        self.stale = stale;
        self
    }

    /// Ids of every open window that one of the driver's waits could match.
    ///
    /// The follow-up patterns are loose (`.*Info.*` also matches
    /// "System Information"), so they are recorded alongside the selector.
    pub fn snapshot(&self) -> HashSet<WindowId> {
        let waiter = self.waiter();
        [&self.selector_title, &self.test_title, &self.info_title]
            .into_iter()
            .flat_map(|pattern| waiter.snapshot(pattern))
            .collect()
    }

    pub fn waiter(&self) -> DialogWaiter<'a> {
        DialogWaiter::new(
            self.desktop,
            self.sleeper,
            self.settings.dialog_poll,
            self.settings.settle,
        )
    }

    /// Run the state machine to completion.
    pub fn run(&self) -> Result<SelectionOutcome, ProvisionError> {
        let mut session = Session::new();

        while session.state != SelectorState::Done {
            let next = self.step(&mut session)?;
            tracing::debug!("Device Selector: {:?} -> {:?}", session.state, next);
            session.state = next;
            session.history.push(next);
        }

        Ok(SelectionOutcome {
            disposition: session.disposition(),
            key: session.key,
            matched: session.matched,
            history: session.history,
        })
    }

    fn settle(&self) {
        self.sleeper.sleep(self.settings.settle);
    }

    fn step(&self, session: &mut Session) -> Result<SelectorState, ProvisionError> {
        match session.state {
            SelectorState::AwaitDialog => {
                let dialog = self
                    .waiter()
                    .wait_excluding(&self.selector_title, &self.stale)?;
                session.dialog = Some(dialog);
                Ok(SelectorState::AwaitTree)
            }

            SelectorState::AwaitTree => {
                let dialog = attached(&session.dialog)?;
                let tree = self
                    .settings
                    .tree_poll
                    .poll(self.sleeper, || match dialog.device_tree() {
                        Ok(tree) => tree,
                        Err(err) => {
                            tracing::debug!("Device tree not ready: {err}");
                            None
                        }
                    })
                    .map_err(|timeout| ProvisionError::UiWaitTimeout {
                        what: "the device list".to_string(),
                        attempts: timeout.attempts,
                    })?;
                session.tree = Some(tree);
                Ok(SelectorState::ScanningPlayback)
            }

            SelectorState::ScanningPlayback => {
                let tree = session.tree.as_deref().ok_or_else(|| {
                    ProvisionError::UiStructure("device list disappeared".to_string())
                })?;
                let entries = tree.entries()?;
                let labels: Vec<ListingEntry> = entries
                    .iter()
                    .map(|entry| ListingEntry {
                        label: entry.label(),
                        cells: entry.cells(),
                    })
                    .collect();
                let listing = DeviceListing::from_entries(&labels);

                // The capture section only accepts input once the playback
                // header has been activated.
                match listing.playback_anchor().and_then(|index| entries.get(index)) {
                    Some(header) => {
                        self.settle();
                        header.select()?;
                        self.settle();
                        header.double_click()?;
                    }
                    None => tracing::warn!("Playback section not found in the device list"),
                }

                session.entries = entries;
                session.listing = listing;
                Ok(SelectorState::ScanningCapture)
            }

            SelectorState::ScanningCapture => {
                let listing = &session.listing;
                if !listing.has_capture_section() {
                    tracing::warn!("Capture section not found in the device list");
                }
                if !listing.skipped().is_empty() {
                    tracing::debug!("Ignored ungrouped entries {:?}", listing.skipped());
                }

                match listing.find(&self.settings.target_device).cloned() {
                    Some(row) => {
                        session.matched = Some(row);
                        Ok(SelectorState::DeviceFound)
                    }
                    None => Ok(SelectorState::DeviceNotFound),
                }
            }

            SelectorState::DeviceFound => {
                let row = session.matched.clone().ok_or_else(|| {
                    ProvisionError::UiStructure("no matched device row".to_string())
                })?;
                session.key = row.selection_key();

                if row.is_installed() {
                    tracing::info!("APO is already installed on {}", session.key);
                    return Ok(SelectorState::Confirming);
                }

                let node = session.entries.get(row.anchor).ok_or_else(|| {
                    ProvisionError::UiStructure(format!("device row {} vanished", row.anchor))
                })?;
                self.settle();
                node.select()?;
                self.settle();
                node.click()?;
                self.settle();
                node.select()?;
                self.settle();
                node.press_space()?;

                session.toggled = true;
                tracing::info!("Microphone checkbox checked for {}", session.key);
                Ok(SelectorState::Confirming)
            }

            SelectorState::DeviceNotFound => {
                tracing::warn!(
                    "Microphone device '{}' not found in the list",
                    self.settings.target_device
                );
                Ok(SelectorState::Confirming)
            }

            SelectorState::Confirming => {
                let dialog = attached(&session.dialog)?;
                let disposition = session.disposition();
                dialog.press_button(disposition.button())?;
                tracing::info!("Equalizer APO configured for {}", session.key);
                Ok(SelectorState::AwaitTestDialog)
            }

            SelectorState::AwaitTestDialog => {
                let dialog = self.waiter().wait_excluding(&self.test_title, &self.stale)?;
                dialog.press_button(ACKNOWLEDGE_BUTTON)?;
                Ok(SelectorState::AwaitInfoDialog)
            }

            SelectorState::AwaitInfoDialog => {
                let dialog = self.waiter().wait_excluding(&self.info_title, &self.stale)?;
                dialog.press_button(ACKNOWLEDGE_BUTTON)?;
                tracing::info!("Closed Equalizer APO");
                Ok(SelectorState::Done)
            }

            SelectorState::Done => Ok(SelectorState::Done),
        }
    }
}
