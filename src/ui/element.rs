//! Window-tree seams used to drive the installer's dialogs.
//!
//! The automation backend (UI Automation on Windows) implements these
//! traits; the selection logic only ever sees labels and a handful of
//! actions.

use regex::Regex;
use std::fmt;
use thiserror::Error;

/// UI automation error types.
#[derive(Debug, Error)]
pub enum UiError {
    #[error("UI Automation is unavailable: {0}")]
    Unavailable(String),

    #[error("Element '{label}' rejected {action}: {reason}")]
    ActionFailed {
        label: String,
        action: &'static str,
        reason: String,
    },

    #[error("Button '{name}' not found in '{window}'")]
    ButtonNotFound { name: String, window: String },

    #[error("Failed to read window tree: {0}")]
    Query(String),

    #[error("Invalid title pattern '{pattern}': {source}")]
    Pattern {
        pattern: String,
        #[source]
        source: regex::Error,
    },
}

/// Stable identity of a top-level window (the native handle value).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct WindowId(pub isize);

/// Regular expression matched against window titles.
#[derive(Debug, Clone)]
pub struct TitlePattern(Regex);

impl TitlePattern {
    pub fn new(pattern: &str) -> Result<Self, UiError> {
        Regex::new(pattern)
            .map(Self)
            .map_err(|source| UiError::Pattern {
                pattern: pattern.to_string(),
                source,
            })
    }

    pub fn matches(&self, title: &str) -> bool {
        self.0.is_match(title)
    }
}

impl fmt::Display for TitlePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0.as_str())
    }
}

/// The set of top-level windows.
pub trait Desktop {
    /// All visible top-level windows whose title matches `pattern`.
    fn find_windows(&self, pattern: &TitlePattern) -> Result<Vec<Box<dyn Dialog>>, UiError>;
}

/// A top-level dialog of the foreign application.
pub trait Dialog {
    fn id(&self) -> WindowId;

    fn title(&self) -> String;

    /// The tree control listing audio devices, if it exists yet.
    fn device_tree(&self) -> Result<Option<Box<dyn DeviceTree>>, UiError>;

    /// Press the first button labelled `name`.
    fn press_button(&self, name: &str) -> Result<(), UiError>;
}

/// Tree control holding the device rows.
pub trait DeviceTree {
    /// Direct children in display order.
    fn entries(&self) -> Result<Vec<Box<dyn TreeEntry>>, UiError>;
}

/// One entry of the device tree.
pub trait TreeEntry {
    fn label(&self) -> String;

    /// Sub-cell labels when the backend exposes a row as one element with
    /// per-column children. Empty for flat trees.
    fn cells(&self) -> Vec<String>;

    fn select(&self) -> Result<(), UiError>;

    fn click(&self) -> Result<(), UiError>;

    fn double_click(&self) -> Result<(), UiError>;

    /// Send a single space keystroke to the entry.
    fn press_space(&self) -> Result<(), UiError>;
}
