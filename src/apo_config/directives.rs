//! The directive block written for the selected microphone.

use std::fmt;

/// `config.txt` exactly as a fresh Equalizer APO install ships it.
pub const DEFAULT_CONFIG_TEMPLATE: &str = "Preamp: -6 dB\nInclude: example.txt\nGraphicEQ: 25 0; 40 0; 63 0; 100 0; 160 0; 250 0; 400 0; 630 0; 1000 0; 1600 0; 2500 0; 4000 0; 6300 0; 10000 0; 16000 0";

const LOUDMAX_DIRECTIVE: &str = r#"VSTPlugin: Library LoudMax64.dll Thresh 0 Output 0.665909 "Fader Link" 0 "ISP Detection" 0 "Large GUI" 0"#;

/// Serialized rnnoise settings (VAD grace period 20 ms, threshold 0.65).
const RNNOISE_CHUNK_DATA: &str = "VkMyIdEAAAA8P3htbCB2ZXJzaW9uPSIxLjAiIGVuY29kaW5nPSJVVEYtOCI/PiA8Uk5Ob2lzZT48UEFSQU0gaWQ9InZhZF9ncmFjZV9wZXJpb2QiIHZhbHVlPSIyMC4wIi8+PFBBUkFNIGlkPSJ2YWRfcmV0cm9hY3RpdmVfZ3JhY2VfcGVyaW9kIiB2YWx1ZT0iMC4wIi8+PFBBUkFNIGlkPSJ2YWRfdGhyZXNob2xkIiB2YWx1ZT0iMC42NDk5OTk5NzYxNTgxNDIxIi8+PC9STk5vaXNlPgA=";

/// Channel layout of the capture device, picks the rnnoise plugin variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelLayout {
    Mono,
    Stereo,
}

impl ChannelLayout {
    /// Two channels means stereo; anything else, including unknown, is mono.
    pub fn from_channels(channels: Option<u16>) -> Self {
        match channels {
            Some(2) => ChannelLayout::Stereo,
            _ => ChannelLayout::Mono,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            ChannelLayout::Mono => "mono",
            ChannelLayout::Stereo => "stereo",
        }
    }
}

impl fmt::Display for ChannelLayout {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `Device:` line followed by the plugin chain for that device.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirectiveBlock {
    device_key: String,
    layout: ChannelLayout,
}

impl DirectiveBlock {
    pub fn new(device_key: &str, layout: ChannelLayout) -> Self {
        Self {
            device_key: device_key.to_string(),
            layout,
        }
    }

    pub fn lines(&self) -> Vec<String> {
        vec![
            format!("Device: {}", self.device_key),
            LOUDMAX_DIRECTIVE.to_string(),
            format!(
                r#"VSTPlugin: Library win-rnnoise\vst\rnnoise_{}.dll ChunkData "{}""#,
                self.layout, RNNOISE_CHUNK_DATA
            ),
        ]
    }

    /// Lines joined with `\n`, without a trailing newline.
    pub fn render(&self) -> String {
        self.lines().join("\n")
    }
}
