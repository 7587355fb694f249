//! Idempotent archival of coordinate lines under country / state headings.
//!
//! The document is laid out as
//!
//! ```text
//! United States            HEADING_1
//! California               HEADING_2
//! 37.774900, -122.419400   NORMAL_TEXT, linked to the source URL
//! ```
//!
//! Heading lookup is a flat scan over every paragraph in the document, not scoped to
//! the country's subtree. A state whose name matches some unrelated paragraph collides
//! with it. The read (duplicate check, heading lookup) and the write (batch update) are
//! two separate calls, so a concurrent editor can race between them.
//!
//! Coordinate lines are appended at the end of their state's section, so a section
//! reads oldest first. A line is not placed directly under its state heading unless the
//! heading is new.

use tracing::{debug, info};

use super::model::{units, NamedStyle, Paragraph, Request};
use super::DocumentStore;
use crate::coords::Coordinate;
use crate::error::Result;
use crate::geocode::LocationLabel;

/// First body offset of a document.
const BODY_START: usize = 1;

#[derive(Debug, Clone, PartialEq)]
pub struct ArchiveRecord {
    pub url: String,
    pub coordinate: Coordinate,
    pub location: LocationLabel,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Appended,
    SkippedDuplicate,
}

/// Whether the record's coordinate text or URL is already present anywhere in the body.
pub fn is_duplicate(paragraphs: &[Paragraph], record: &ArchiveRecord) -> bool {
    let needle = record.coordinate.to_string();
    paragraphs.iter().any(|p| {
        p.text.contains(&needle)
            || p.text.contains(&record.url)
            || p.links.iter().any(|link| link == &record.url)
    })
}

/// Indices of the country and state heading paragraphs, if present.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Anchors {
    pub country: Option<usize>,
    pub state: Option<usize>,
}

pub fn find_anchors(paragraphs: &[Paragraph], location: &LocationLabel) -> Anchors {
    let country = paragraphs
        .iter()
        .position(|p| p.text.trim() == location.country);
    let state = paragraphs
        .iter()
        .enumerate()
        .find(|(i, p)| Some(*i) != country && p.text.trim() == location.state)
        .map(|(i, _)| i);
    Anchors { country, state }
}

/// Where a new paragraph goes in the pre-batch document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Slot {
    /// In front of the paragraph starting at this offset.
    Before(usize),
    /// Just before the final newline of the paragraph ending at `offset + 1`. Used when
    /// that paragraph ends the body, since nothing may be inserted at the body's end index.
    BeforeLastNewline(usize),
}

impl Slot {
    /// Right after `paragraphs[i]`.
    fn after(paragraphs: &[Paragraph], i: usize) -> Slot {
        let p = &paragraphs[i];
        if i + 1 == paragraphs.len() {
            Slot::BeforeLastNewline(p.end - 1)
        } else {
            Slot::Before(p.end)
        }
    }

    fn offset(self) -> usize {
        match self {
            Slot::Before(offset) | Slot::BeforeLastNewline(offset) => offset,
        }
    }

    /// Text inserting `label` as a paragraph here, and where the paragraph starts in it.
    fn wrap(self, label: &str) -> (String, usize) {
        match self {
            Slot::Before(_) => (format!("{}\n", label), 0),
            Slot::BeforeLastNewline(_) => (format!("\n{}", label), 1),
        }
    }
}

/// End of the state's section: after the run of non-blank body paragraphs that
/// follows its heading.
fn section_slot(paragraphs: &[Paragraph], heading: usize) -> Slot {
    match paragraphs[heading + 1..]
        .iter()
        .position(|p| p.style != NamedStyle::NormalText || p.is_blank())
    {
        Some(n) => Slot::Before(paragraphs[heading + 1 + n].start),
        None => Slot::after(paragraphs, paragraphs.len() - 1),
    }
}

/// Requests accumulated for one batch, with the inserts made so far.
#[derive(Default)]
struct Batch {
    requests: Vec<Request>,
    inserted: Vec<(usize, usize)>,
}

impl Batch {
    /// Where a pre-batch offset lands once the inserts queued so far are applied.
    fn shift(&self, offset: usize) -> usize {
        self.inserted
            .iter()
            .fold(offset, |pos, &(at, len)| if at <= pos { pos + len } else { pos })
    }

    fn insert(&mut self, at: usize, text: String) {
        self.inserted.push((at, units(&text)));
        self.requests.push(Request::insert_text(at, text));
    }

    /// Insert a styled heading paragraph at `at`; returns the offset just past it.
    fn heading(&mut self, slot: Slot, at: usize, label: &str, style: NamedStyle) -> usize {
        let (text, lead) = slot.wrap(label);
        let start = at + lead;
        let end = start + units(label) + 1;
        self.insert(at, text);
        self.requests.push(Request::paragraph_style(start, end, style));
        end
    }

    /// Insert the linked coordinate line; `at` is already in post-insert offsets.
    fn coordinate_line(&mut self, slot: Slot, at: usize, line: &str, url: &str) {
        let (text, lead) = slot.wrap(line);
        let line_start = at + lead;
        let line_end = line_start + units(line);
        self.insert(at, text);
        if lead > 0 {
            // The split-off newline inherits the previous run's link.
            self.requests.push(Request::unlink(at, line_start));
        }
        self.requests.push(Request::link(line_start, line_end, url));
        self.requests
            .push(Request::paragraph_style(line_start, line_end + 1, NamedStyle::NormalText));
    }
}

/// Compute the batch that files `record` under its country and state headings,
/// creating whichever heading is missing.
pub fn plan_insertion(paragraphs: &[Paragraph], record: &ArchiveRecord) -> Vec<Request> {
    let LocationLabel { country, state } = &record.location;
    let anchors = find_anchors(paragraphs, &record.location);
    let mut batch = Batch::default();
    let line = record.coordinate.to_string();

    let slot = match anchors.state {
        Some(heading) => {
            let slot = section_slot(paragraphs, heading);
            if anchors.country.is_none() {
                let top = Slot::Before(BODY_START);
                batch.heading(top, BODY_START, country, NamedStyle::Heading1);
            }
            slot
        }
        None => {
            let state_slot = match anchors.country {
                Some(i) => Slot::after(paragraphs, i),
                None => Slot::Before(batch.heading(
                    Slot::Before(BODY_START),
                    BODY_START,
                    country,
                    NamedStyle::Heading1,
                )),
            };
            // A new country heading is already in post-insert offsets; an existing one
            // comes before every insert, so its offsets hold as they are.
            let state_end =
                batch.heading(state_slot, state_slot.offset(), state, NamedStyle::Heading2);
            // A state heading that ends the body leaves its line at the body end too.
            let line_slot = match state_slot {
                Slot::Before(_) => Slot::Before(state_end),
                Slot::BeforeLastNewline(_) => Slot::BeforeLastNewline(state_end - 1),
            };
            batch.coordinate_line(line_slot, line_slot.offset(), &line, &record.url);
            return batch.requests;
        }
    };

    let at = batch.shift(slot.offset());
    batch.coordinate_line(slot, at, &line, &record.url);
    batch.requests
}

/// Files records into a document, skipping ones already present.
pub struct Archiver<S> {
    store: S,
}

impl<S: DocumentStore> Archiver<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub fn archive(&mut self, record: &ArchiveRecord) -> Result<Outcome> {
        let paragraphs = self.store.fetch_paragraphs()?;

        if is_duplicate(&paragraphs, record) {
            info!(coordinate = %record.coordinate, "Location already in document, skipping");
            return Ok(Outcome::SkippedDuplicate);
        }

        let requests = plan_insertion(&paragraphs, record);
        debug!(count = requests.len(), ?requests, "Submitting batch update");
        self.store.batch_update(&requests)?;
        info!(
            coordinate = %record.coordinate,
            country = %record.location.country,
            state = %record.location.state,
            "Appended location"
        );
        Ok(Outcome::Appended)
    }
}
