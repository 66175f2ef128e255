//! Equalizer APO provisioning - Library
//!
//! Installs Equalizer APO unattended and prepares a microphone for it.
//!
//! ## Steps
//!
//! - Download the installer and start it silently
//! - Drive the installer's Device Selector to enable the APO on the target
//!   capture device
//! - Download the LoudMax and rnnoise VST plugins into the plugin directory
//! - Merge the matching directive block into `config.txt`
//!
//! Everything that touches the network, processes, the desktop or the audio
//! stack sits behind a trait, so the run itself is testable off Windows.

pub mod apo_config;
pub mod audio;
pub mod config;
pub mod error;
pub mod logging;
pub mod net;
pub mod orchestrator;
pub mod platform;
pub mod poll;
pub mod ui;

#[cfg(test)]
mod testing;

pub use apo_config::{merge_block, ChannelLayout, DirectiveBlock, MergeOutcome};
pub use config::{PluginSource, ProvisionConfig};
pub use error::{ExitStatus, ProvisionError};
pub use orchestrator::{Collaborators, Orchestrator, PluginOutcome, PluginReport, ProvisionReport};
pub use platform::{ApoLocations, InstallLocator};
pub use poll::{PollPolicy, Sleeper, ThreadSleeper};
