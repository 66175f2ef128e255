//! Equalizer APO install locations from the registry.
//!
//! Setup records `InstallPath` and `ConfigPath` under
//! `HKLM\SOFTWARE\EqualizerAPO`. Either value may be missing on older
//! installs, in which case the default layout fills the gap.

use super::{ApoLocations, InstallLocator, CONFIG_FILE_NAME};
use std::path::PathBuf;
use windows::core::PCWSTR;
use windows::Win32::System::Registry::{
    RegCloseKey, RegOpenKeyExW, RegQueryValueExW, HKEY, HKEY_LOCAL_MACHINE, KEY_READ,
    KEY_WOW64_64KEY, REG_SZ, REG_VALUE_TYPE,
};

/// Registry-based install locator.
pub struct RegistryLocator {
    key_path: Vec<u16>,
}

impl RegistryLocator {
    const APO_KEY: &'static str = r"SOFTWARE\EqualizerAPO";
    const INSTALL_PATH_VALUE: &'static str = "InstallPath";
    const CONFIG_PATH_VALUE: &'static str = "ConfigPath";

    pub fn new() -> Self {
        Self {
            key_path: to_wide(Self::APO_KEY),
        }
    }

    /// Read a string value, or `None` when the key or value is absent.
    fn read_string(&self, value: &str) -> Option<String> {
        unsafe {
            let mut hkey = HKEY::default();
            let result = RegOpenKeyExW(
                HKEY_LOCAL_MACHINE,
                PCWSTR::from_raw(self.key_path.as_ptr()),
                0,
                KEY_READ | KEY_WOW64_64KEY,
                &mut hkey,
            );
            if result.is_err() {
                return None;
            }

            let value_name = to_wide(value);
            let mut kind = REG_VALUE_TYPE::default();
            let mut data_size = 0u32;
            let result = RegQueryValueExW(
                hkey,
                PCWSTR::from_raw(value_name.as_ptr()),
                None,
                Some(&mut kind),
                None,
                Some(&mut data_size),
            );
            if result.is_err() || kind != REG_SZ || data_size == 0 {
                let _ = RegCloseKey(hkey);
                return None;
            }

            let mut buffer = vec![0u16; (data_size as usize).div_ceil(2)];
            let result = RegQueryValueExW(
                hkey,
                PCWSTR::from_raw(value_name.as_ptr()),
                None,
                None,
                Some(buffer.as_mut_ptr() as *mut u8),
                Some(&mut data_size),
            );
            let _ = RegCloseKey(hkey);
            if result.is_err() {
                return None;
            }

            let len = buffer.iter().position(|&c| c == 0).unwrap_or(buffer.len());
            let text = String::from_utf16_lossy(&buffer[..len]);
            (!text.is_empty()).then_some(text)
        }
    }
}

impl Default for RegistryLocator {
    fn default() -> Self {
        Self::new()
    }
}

impl InstallLocator for RegistryLocator {
    fn locate(&self) -> ApoLocations {
        let mut locations = match self.read_string(Self::INSTALL_PATH_VALUE) {
            Some(root) => ApoLocations::under(&PathBuf::from(root)),
            None => {
                tracing::warn!("Equalizer APO install path not in registry, using default");
                ApoLocations::default_install()
            }
        };
        if let Some(config_dir) = self.read_string(Self::CONFIG_PATH_VALUE) {
            locations.config_file = PathBuf::from(config_dir).join(CONFIG_FILE_NAME);
        }
        locations
    }
}

fn to_wide(s: &str) -> Vec<u16> {
    s.encode_utf16().chain(std::iter::once(0)).collect()
}
