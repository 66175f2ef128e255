//! Structure of the Device Selector's device tree.
//!
//! The tree lists a "Playback devices" section followed by a "Capture
//! devices" section. Every capture device is shown as a row of three cells:
//! connector, device name and APO status.

/// Section header above the playback devices.
pub const PLAYBACK_SENTINEL: &str = "Playback devices";

/// Section header above the capture devices.
pub const CAPTURE_SENTINEL: &str = "Capture devices";

/// Status fragment of a device that already has the APO enabled.
pub const INSTALLED_MARKER: &str = "already installed";

/// Labels read from one tree entry.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ListingEntry {
    pub label: String,
    pub cells: Vec<String>,
}

impl ListingEntry {
    pub fn flat(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            cells: Vec::new(),
        }
    }

    pub fn row(connector: &str, device: &str, status: &str) -> Self {
        Self {
            label: connector.to_string(),
            cells: vec![connector.to_string(), device.to_string(), status.to_string()],
        }
    }
}

/// A capture device row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CaptureRow {
    /// Index of the tree entry that represents the row
    pub anchor: usize,
    pub connector: String,
    pub device: String,
    pub status: String,
}

impl CaptureRow {
    pub fn is_installed(&self) -> bool {
        self.status.contains(INSTALLED_MARKER)
    }

    /// Device key as Equalizer APO expects it in a `Device:` directive.
    pub fn selection_key(&self) -> String {
        format!("{} {}", self.connector, self.device)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Playback,
    Capture,
}

/// Rows recovered from a device tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DeviceListing {
    playback_anchor: Option<usize>,
    capture_anchor: Option<usize>,
    rows: Vec<CaptureRow>,
    skipped: Vec<usize>,
}

impl DeviceListing {
    /// Walk the entries in display order and group the capture section.
    ///
    /// Entries exposing at least three cells are rows on their own. Flat
    /// labels are grouped in threes counted from the capture header, not
    /// from the top of the tree; blank filler cells directly after the header
    /// are ignored. Past the first row a blank label is a real (empty) cell.
    /// A partial group cut short by a structured row is recorded as skipped
    /// rather than shifting every following row.
    pub fn from_entries(entries: &[ListingEntry]) -> Self {
        let mut listing = Self::default();
        let mut section = Section::Preamble;
        let mut pending: Vec<(usize, &str)> = Vec::with_capacity(3);
        let mut after_header = false;

        for (index, entry) in entries.iter().enumerate() {
            match entry.label.as_str() {
                PLAYBACK_SENTINEL => {
                    listing.playback_anchor.get_or_insert(index);
                    section = Section::Playback;
                    continue;
                }
                CAPTURE_SENTINEL => {
                    listing.capture_anchor = Some(index);
                    listing.skipped.extend(pending.drain(..).map(|(i, _)| i));
                    section = Section::Capture;
                    after_header = true;
                    continue;
                }
                _ => {}
            }

            if section != Section::Capture {
                continue;
            }

            if let [connector, device, status, ..] = entry.cells.as_slice() {
                after_header = false;
                listing.skipped.extend(pending.drain(..).map(|(i, _)| i));
                listing.rows.push(CaptureRow {
                    anchor: index,
                    connector: connector.clone(),
                    device: device.clone(),
                    status: status.clone(),
                });
                continue;
            }

            if after_header && entry.label.trim().is_empty() {
                continue;
            }
            after_header = false;

            pending.push((index, entry.label.as_str()));
            if let [(anchor, connector), (_, device), (_, status)] = pending.as_slice() {
                listing.rows.push(CaptureRow {
                    anchor: *anchor,
                    connector: connector.to_string(),
                    device: device.to_string(),
                    status: status.to_string(),
                });
                pending.clear();
            }
        }

        listing.skipped.extend(pending.into_iter().map(|(i, _)| i));
        listing
    }

    /// Convenience for flat trees.
    pub fn from_labels<S: AsRef<str>>(labels: &[S]) -> Self {
        let entries: Vec<ListingEntry> = labels
            .iter()
            .map(|label| ListingEntry::flat(label.as_ref()))
            .collect();
        Self::from_entries(&entries)
    }

    pub fn playback_anchor(&self) -> Option<usize> {
        self.playback_anchor
    }

    pub fn has_capture_section(&self) -> bool {
        self.capture_anchor.is_some()
    }

    pub fn rows(&self) -> &[CaptureRow] {
        &self.rows
    }

    /// Entry indices that could not be grouped into a row.
    pub fn skipped(&self) -> &[usize] {
        &self.skipped
    }

    /// First capture row whose device name contains `needle`.
    pub fn find(&self, needle: &str) -> Option<&CaptureRow> {
        self.rows.iter().find(|row| row.device.contains(needle))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn capture_labels() -> Vec<&'static str> {
        vec![
            CAPTURE_SENTINEL,
            "USB Mic",
            "Mic A",
            "already installed",
            "Line In",
            "Mic B",
            "not installed",
        ]
    }

    #[test]
    fn groups_capture_labels_into_rows() {
        let listing = DeviceListing::from_labels(&capture_labels()[..]);

        let row = listing.find("Mic B").unwrap();
        assert_eq!(row.anchor, 4);
        assert_eq!(row.connector, "Line In");
        assert_eq!(row.status, "not installed");
        assert!(!row.is_installed());
        assert_eq!(row.selection_key(), "Line In Mic B");

        let row = listing.find("Mic A").unwrap();
        assert_eq!(row.anchor, 1);
        assert!(row.is_installed());
    }

    #[test]
    fn playback_rows_are_never_candidates() {
        let labels = [
            PLAYBACK_SENTINEL,
            "Speakers",
            "Mic Speakers",
            "not installed",
            CAPTURE_SENTINEL,
            "Microphone",
            "Yeti",
            "not installed",
        ];
        let listing = DeviceListing::from_labels(&labels);

        assert_eq!(listing.playback_anchor(), Some(0));
        assert_eq!(listing.rows().len(), 1);
        assert_eq!(listing.find("Mic").map(|r| r.device.as_str()), None);
        assert_eq!(listing.find("Yeti").unwrap().anchor, 5);
    }

    #[test]
    fn grouping_is_anchored_at_the_capture_header() {
        // One playback row plus a single-cell header: absolute index
        // arithmetic would misalign every capture row here.
        let labels = [
            PLAYBACK_SENTINEL,
            "Speakers",
            "Realtek",
            "not installed",
            CAPTURE_SENTINEL,
            "Microphone",
            "Realtek Mic",
            "not installed",
        ];
        let row = DeviceListing::from_labels(&labels).find("Realtek Mic").cloned().unwrap();

        assert_eq!(row.anchor, 5);
        assert_eq!(row.connector, "Microphone");
    }

    #[test]
    fn blank_header_cells_are_ignored() {
        let labels = [CAPTURE_SENTINEL, "", "", "Microphone", "Yeti", ""];
        let listing = DeviceListing::from_labels(&labels);

        let row = listing.find("Yeti").unwrap();
        assert_eq!(row.anchor, 3);
        assert_eq!(row.status, "");
        assert!(listing.skipped().is_empty());
    }

    #[test]
    fn blank_connector_after_first_row_is_kept() {
        let labels = [
            CAPTURE_SENTINEL,
            "",
            "",
            "Mic",
            "Mic A",
            "not installed",
            "",
            "Virtual Cable",
            "not installed",
            "Microphone",
            "Yeti",
            "not installed",
        ];
        let listing = DeviceListing::from_labels(&labels);

        assert_eq!(listing.rows().len(), 3);
        assert!(listing.skipped().is_empty());

        let cable = listing.find("Virtual Cable").unwrap();
        assert_eq!(cable.anchor, 6);
        assert_eq!(cable.connector, "");
        assert_eq!(cable.status, "not installed");

        let yeti = listing.find("Yeti").unwrap();
        assert_eq!(yeti.anchor, 9);
        assert_eq!(yeti.connector, "Microphone");
        assert_eq!(yeti.selection_key(), "Microphone Yeti");
    }

    #[test]
    fn structured_rows_survive_informational_entries() {
        let entries = vec![
            ListingEntry::flat(CAPTURE_SENTINEL),
            ListingEntry::row("USB", "Mic A", "APO is already installed"),
            ListingEntry::flat("Some devices are hidden"),
            ListingEntry::row("Line In", "Mic B", "not installed"),
        ];
        let listing = DeviceListing::from_entries(&entries);

        assert_eq!(listing.rows().len(), 2);
        assert_eq!(listing.find("Mic B").unwrap().anchor, 3);
        assert_eq!(listing.skipped(), &[2]);
    }

    #[test]
    fn missing_capture_section_yields_no_rows() {
        let listing = DeviceListing::from_labels(&[PLAYBACK_SENTINEL, "Speakers", "Mic", "x"]);
        assert!(!listing.has_capture_section());
        assert!(listing.find("Mic").is_none());
    }

    #[test]
    fn trailing_partial_group_is_skipped() {
        let listing = DeviceListing::from_labels(&[CAPTURE_SENTINEL, "Microphone", "Yeti"]);
        assert!(listing.rows().is_empty());
        assert_eq!(listing.skipped(), &[1, 2]);
    }
}
