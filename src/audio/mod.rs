//! Audio endpoint queries.

pub mod channels;

pub use channels::ChannelProbe;
#[cfg(windows)]
pub use channels::WasapiChannelProbe;

use crate::apo_config::ChannelLayout;

/// Layout of the default microphone, falling back to mono when unknown.
pub fn default_input_layout(probe: &dyn ChannelProbe) -> ChannelLayout {
    let channels = probe.default_input_channels();
    let layout = ChannelLayout::from_channels(channels);
    tracing::info!("Microphone detected as {layout} ({channels:?} channels)");
    layout
}
