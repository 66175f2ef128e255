//! In-memory stand-ins for the network, process, audio and window seams.

use crate::audio::ChannelProbe;
use crate::net::{ProcessLauncher, Transport, TransportError};
use crate::poll::Sleeper;
use crate::ui::{Desktop, DeviceTree, Dialog, ListingEntry, TitlePattern, TreeEntry, UiError, WindowId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

/// Build a zip archive in memory.
pub fn zip_bytes(files: &[(&str, &str)]) -> Vec<u8> {
    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    for (name, contents) in files {
        writer
            .start_file(*name, zip::write::SimpleFileOptions::default())
            .unwrap();
        writer.write_all(contents.as_bytes()).unwrap();
    }
    writer.finish().unwrap().into_inner()
}

#[derive(Default)]
pub struct RecordingSleeper {
    sleeps: RefCell<Vec<Duration>>,
}

impl RecordingSleeper {
    pub fn sleeps(&self) -> Vec<Duration> {
        self.sleeps.borrow().clone()
    }

    pub fn count(&self) -> usize {
        self.sleeps.borrow().len()
    }

    pub fn total(&self) -> Duration {
        self.sleeps.borrow().iter().sum()
    }
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, duration: Duration) {
        self.sleeps.borrow_mut().push(duration);
    }
}

enum Reply {
    Body(Vec<u8>),
    Status(u16),
}

/// Transport answering from a URL table; unknown URLs get a 404.
#[derive(Default)]
pub struct FakeTransport {
    replies: HashMap<String, Reply>,
    requests: RefCell<Vec<String>>,
}

impl FakeTransport {
    pub fn with_body(mut self, url: &str, body: Vec<u8>) -> Self {
        self.replies.insert(url.to_string(), Reply::Body(body));
        self
    }

    pub fn with_json(self, url: &str, value: serde_json::Value) -> Self {
        let body = serde_json::to_vec(&value).unwrap();
        self.with_body(url, body)
    }

    pub fn with_status(mut self, url: &str, status: u16) -> Self {
        self.replies.insert(url.to_string(), Reply::Status(status));
        self
    }

    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl Transport for FakeTransport {
    fn get(&self, url: &str) -> Result<Vec<u8>, TransportError> {
        self.requests.borrow_mut().push(url.to_string());
        match self.replies.get(url) {
            Some(Reply::Body(body)) => Ok(body.clone()),
            Some(Reply::Status(status)) => Err(TransportError::Status {
                url: url.to_string(),
                status: *status,
            }),
            None => Err(TransportError::Status {
                url: url.to_string(),
                status: 404,
            }),
        }
    }
}

#[derive(Default)]
pub struct FakeLauncher {
    fail: bool,
    launches: RefCell<Vec<(PathBuf, Vec<String>)>>,
}

impl FakeLauncher {
    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::default()
        }
    }

    pub fn launches(&self) -> Vec<(PathBuf, Vec<String>)> {
        self.launches.borrow().clone()
    }
}

impl ProcessLauncher for FakeLauncher {
    fn spawn_detached(&self, program: &Path, args: &[&str]) -> std::io::Result<u32> {
        if self.fail {
            return Err(std::io::Error::from(std::io::ErrorKind::PermissionDenied));
        }
        self.launches.borrow_mut().push((
            program.to_path_buf(),
            args.iter().map(|arg| arg.to_string()).collect(),
        ));
        Ok(4242)
    }
}

pub struct FixedChannels(pub Option<u16>);

impl ChannelProbe for FixedChannels {
    fn default_input_channels(&self) -> Option<u16> {
        self.0
    }
}

/// Scripted top-level window.
#[derive(Clone)]
pub struct FakeWindow {
    id: isize,
    title: String,
    visible_after: usize,
    tree: Option<Vec<ListingEntry>>,
    tree_ready_after: usize,
    tree_polls: usize,
    closed: bool,
}

impl FakeWindow {
    pub fn new(id: isize, title: &str) -> Self {
        Self {
            id,
            title: title.to_string(),
            visible_after: 0,
            tree: None,
            tree_ready_after: 0,
            tree_polls: 0,
            closed: false,
        }
    }

    /// Hidden from the first `lookups` desktop queries.
    pub fn visible_after(mut self, lookups: usize) -> Self {
        self.visible_after = lookups;
        self
    }

    pub fn with_tree(mut self, entries: Vec<ListingEntry>) -> Self {
        self.tree = Some(entries);
        self
    }

    /// Tree missing for the first `polls` lookups.
    pub fn tree_ready_after(mut self, polls: usize) -> Self {
        self.tree_ready_after = polls;
        self
    }
}

#[derive(Default)]
struct DesktopState {
    windows: Vec<FakeWindow>,
    find_calls: usize,
    actions: Vec<String>,
}

/// Desktop whose windows record every action taken on them.
///
/// Pressing any button closes the window it belongs to.
#[derive(Clone, Default)]
pub struct FakeDesktop {
    state: Rc<RefCell<DesktopState>>,
}

impl FakeDesktop {
    pub fn add_window(&self, window: FakeWindow) {
        self.state.borrow_mut().windows.push(window);
    }

    pub fn find_calls(&self) -> usize {
        self.state.borrow().find_calls
    }

    pub fn actions(&self) -> Vec<String> {
        self.state.borrow().actions.clone()
    }

    fn record(&self, action: String) {
        self.state.borrow_mut().actions.push(action);
    }
}

impl Desktop for FakeDesktop {
    fn find_windows(&self, pattern: &TitlePattern) -> Result<Vec<Box<dyn Dialog>>, UiError> {
        let mut state = self.state.borrow_mut();
        state.find_calls += 1;
        let calls = state.find_calls;
        Ok(state
            .windows
            .iter()
            .enumerate()
            .filter(|(_, w)| !w.closed && calls > w.visible_after && pattern.matches(&w.title))
            .map(|(index, _)| {
                Box::new(FakeDialog {
                    desktop: self.clone(),
                    index,
                }) as Box<dyn Dialog>
            })
            .collect())
    }
}

struct FakeDialog {
    desktop: FakeDesktop,
    index: usize,
}

impl FakeDialog {
    fn with_window<R>(&self, f: impl FnOnce(&mut FakeWindow) -> R) -> R {
        let mut state = self.desktop.state.borrow_mut();
        f(&mut state.windows[self.index])
    }
}

impl Dialog for FakeDialog {
    fn id(&self) -> WindowId {
        WindowId(self.with_window(|w| w.id))
    }

    fn title(&self) -> String {
        self.with_window(|w| w.title.clone())
    }

    fn device_tree(&self) -> Result<Option<Box<dyn DeviceTree>>, UiError> {
        let entries = self.with_window(|w| {
            w.tree_polls += 1;
            if w.tree_polls > w.tree_ready_after {
                w.tree.clone()
            } else {
                None
            }
        });
        Ok(entries.map(|entries| {
            Box::new(FakeTree {
                desktop: self.desktop.clone(),
                entries,
            }) as Box<dyn DeviceTree>
        }))
    }

    fn press_button(&self, name: &str) -> Result<(), UiError> {
        let title = self.with_window(|w| {
            w.closed = true;
            w.title.clone()
        });
        self.desktop.record(format!("press:{title}:{name}"));
        Ok(())
    }
}

struct FakeTree {
    desktop: FakeDesktop,
    entries: Vec<ListingEntry>,
}

impl DeviceTree for FakeTree {
    fn entries(&self) -> Result<Vec<Box<dyn TreeEntry>>, UiError> {
        Ok(self
            .entries
            .iter()
            .map(|entry| {
                Box::new(FakeEntry {
                    desktop: self.desktop.clone(),
                    entry: entry.clone(),
                }) as Box<dyn TreeEntry>
            })
            .collect())
    }
}

struct FakeEntry {
    desktop: FakeDesktop,
    entry: ListingEntry,
}

impl FakeEntry {
    fn act(&self, action: &str) -> Result<(), UiError> {
        self.desktop
            .record(format!("{action}:{}", self.entry.label));
        Ok(())
    }
}

impl TreeEntry for FakeEntry {
    fn label(&self) -> String {
        self.entry.label.clone()
    }

    fn cells(&self) -> Vec<String> {
        self.entry.cells.clone()
    }

    fn select(&self) -> Result<(), UiError> {
        self.act("select")
    }

    fn click(&self) -> Result<(), UiError> {
        self.act("click")
    }

    fn double_click(&self) -> Result<(), UiError> {
        self.act("double")
    }

    fn press_space(&self) -> Result<(), UiError> {
        self.act("space")
    }
}
