//! Channel count of the default capture endpoint.

/// Source of the default microphone's channel count.
pub trait ChannelProbe {
    /// `None` when there is no default capture device or its format cannot
    /// be read.
    fn default_input_channels(&self) -> Option<u16>;
}

#[cfg(windows)]
pub use wasapi::WasapiChannelProbe;

#[cfg(windows)]
mod wasapi {
    use super::ChannelProbe;
    use windows::Win32::Media::Audio::{
        eCapture, eConsole, IAudioClient, IMMDeviceEnumerator, MMDeviceEnumerator, WAVEFORMATEX,
    };
    use windows::Win32::System::Com::{CoCreateInstance, CoTaskMemFree, CLSCTX_ALL};

    /// Reads the shared-mode mix format of the console capture endpoint.
    ///
    /// COM must be initialized on the calling thread.
    #[derive(Debug, Default)]
    pub struct WasapiChannelProbe;

    impl WasapiChannelProbe {
        pub fn new() -> Self {
            Self
        }

        fn mix_channels(&self) -> windows::core::Result<Option<u16>> {
            unsafe {
                let enumerator: IMMDeviceEnumerator =
                    CoCreateInstance(&MMDeviceEnumerator, None, CLSCTX_ALL)?;
                let device = enumerator.GetDefaultAudioEndpoint(eCapture, eConsole)?;
                let audio_client: IAudioClient = device.Activate(CLSCTX_ALL, None)?;

                let format_ptr = audio_client.GetMixFormat()?;
                if format_ptr.is_null() {
                    return Ok(None);
                }

                let format: &WAVEFORMATEX = &*format_ptr;
                let channels = format.nChannels;
                CoTaskMemFree(Some(format_ptr as *const _));

                Ok(Some(channels))
            }
        }
    }

    impl ChannelProbe for WasapiChannelProbe {
        fn default_input_channels(&self) -> Option<u16> {
            match self.mix_channels() {
                Ok(channels) => channels,
                Err(e) => {
                    tracing::warn!("Could not read default microphone format: {e}");
                    None
                }
            }
        }
    }
}
