//! Driving the Equalizer APO installer's dialogs.
//!
//! The selection logic works against the traits in [`element`]; on Windows
//! [`automation`] implements them with UI Automation.

#[cfg(windows)]
pub mod automation;
pub mod dialog;
pub mod element;
pub mod listing;
pub mod selector;

#[cfg(windows)]
pub use automation::UiaDesktop;
pub use dialog::DialogWaiter;
pub use element::{Desktop, DeviceTree, Dialog, TitlePattern, TreeEntry, UiError, WindowId};
pub use listing::{CaptureRow, DeviceListing, ListingEntry};
pub use selector::{
    DeviceSelectionDriver, Disposition, SelectionOutcome, SelectorSettings, SelectorState,
};
