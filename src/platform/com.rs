//! COM apartment lifetime.

use windows::Win32::System::Com::{CoInitializeEx, CoUninitialize, COINIT_APARTMENTTHREADED};

/// COM initialization guard that uninitializes COM on drop.
pub struct ComGuard {
    _private: (),
}

impl ComGuard {
    /// Initialize COM for the current thread.
    pub fn new() -> windows::core::Result<Self> {
        unsafe {
            // UI Automation and Core Audio both want an STA here
            CoInitializeEx(None, COINIT_APARTMENTTHREADED).ok()?;
        }
        Ok(Self { _private: () })
    }
}

impl Drop for ComGuard {
    fn drop(&mut self) {
        unsafe {
            CoUninitialize();
        }
    }
}
