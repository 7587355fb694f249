use std::fmt;

use tracing::info;

use crate::coords::{extract_coordinates, Coordinate};
use crate::docs::writer::{ArchiveRecord, Archiver, Outcome};
use crate::docs::DocumentStore;
use crate::error::Result;
use crate::geocode::{Geocoder, LocationLabel};

/// What happened to one URL.
#[derive(Debug, Clone, PartialEq)]
pub struct Report {
    pub coordinate: Coordinate,
    pub location: LocationLabel,
    pub outcome: Outcome,
}

impl fmt::Display for Report {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Extracted coordinates: {}", self.coordinate)?;
        writeln!(f, "Location: {}, {}", self.location.state, self.location.country)?;
        match self.outcome {
            Outcome::Appended => write!(f, "Successfully archived location!"),
            Outcome::SkippedDuplicate => {
                write!(f, "Location already exists in the document. Skipping...")
            }
        }
    }
}

/// Extract → resolve → archive for a single URL. Any failure stops at its stage.
pub fn process<G, S>(url: &str, geocoder: &G, archiver: &mut Archiver<S>) -> Result<Report>
where
    G: Geocoder,
    S: DocumentStore,
{
    info!(%url, "Processing URL");
    let coordinate = extract_coordinates(url)?;
    info!(%coordinate, "Extracted coordinates");

    let location = geocoder.resolve(coordinate)?;

    let record = ArchiveRecord {
        url: url.to_string(),
        coordinate,
        location,
    };
    let outcome = archiver.archive(&record)?;

    Ok(Report {
        coordinate: record.coordinate,
        location: record.location,
        outcome,
    })
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;

    use super::*;
    use crate::docs::memory::MemoryDocument;
    use crate::docs::model::NamedStyle;
    use crate::error::ArchiveError;

    const SF_URL: &str = "https://www.google.com/maps/@37.774900,-122.419400,3a,75y,90t/data=!3m6!1e1!3m4!1sAbC!2e0!7i16384!8i8192";

    struct FixedGeocoder {
        label: Option<LocationLabel>,
        calls: Cell<usize>,
    }

    impl FixedGeocoder {
        fn new(country: &str, state: &str) -> Self {
            Self {
                label: Some(LocationLabel {
                    country: country.into(),
                    state: state.into(),
                }),
                calls: Cell::new(0),
            }
        }

        fn failing() -> Self {
            Self {
                label: None,
                calls: Cell::new(0),
            }
        }
    }

    impl Geocoder for FixedGeocoder {
        fn resolve(&self, coordinate: Coordinate) -> Result<LocationLabel> {
            self.calls.set(self.calls.get() + 1);
            self.label.clone().ok_or(ArchiveError::IncompleteLocation {
                coordinate,
                missing: "administrative_area_level_1",
            })
        }
    }

    #[test]
    fn san_francisco_end_to_end() {
        let geocoder = FixedGeocoder::new("United States", "California");
        let mut archiver = Archiver::new(MemoryDocument::empty());

        let report = process(SF_URL, &geocoder, &mut archiver).unwrap();
        assert_eq!(report.coordinate, Coordinate::new(37.7749, -122.4194));
        assert_eq!(report.outcome, Outcome::Appended);

        let doc = archiver.store();
        assert_eq!(
            doc.outline(),
            vec![
                ("United States".to_string(), NamedStyle::Heading1),
                ("California".to_string(), NamedStyle::Heading2),
                ("37.774900, -122.419400".to_string(), NamedStyle::NormalText),
            ]
        );
        assert_eq!(doc.paragraphs()[2].links, vec![SF_URL.to_string()]);
    }

    #[test]
    fn second_run_is_skipped() {
        let geocoder = FixedGeocoder::new("United States", "California");
        let mut archiver = Archiver::new(MemoryDocument::empty());
        process(SF_URL, &geocoder, &mut archiver).unwrap();

        let report = process(SF_URL, &geocoder, &mut archiver).unwrap();
        assert_eq!(report.outcome, Outcome::SkippedDuplicate);
        assert_eq!(archiver.store().batches.len(), 1);
        assert!(report.to_string().ends_with("Skipping..."));
    }

    #[test]
    fn unparseable_url_stops_before_geocoding() {
        let geocoder = FixedGeocoder::new("United States", "California");
        let mut archiver = Archiver::new(MemoryDocument::empty());

        let err = process("https://www.google.com/maps/search/pizza", &geocoder, &mut archiver)
            .unwrap_err();
        assert!(matches!(err, ArchiveError::Extraction { .. }));
        assert_eq!(geocoder.calls.get(), 0);
        assert_eq!(archiver.store().fetches, 0);
    }

    #[test]
    fn resolve_failure_leaves_document_untouched() {
        let geocoder = FixedGeocoder::failing();
        let mut archiver = Archiver::new(MemoryDocument::empty());

        let err = process(SF_URL, &geocoder, &mut archiver).unwrap_err();
        assert_eq!(err.stage(), "resolve");
        assert_eq!(geocoder.calls.get(), 1);
        assert_eq!(archiver.store().fetches, 0);
        assert!(archiver.store().batches.is_empty());
    }

    #[test]
    fn report_lines() {
        let report = Report {
            coordinate: Coordinate::new(37.7749, -122.4194),
            location: LocationLabel {
                country: "United States".into(),
                state: "California".into(),
            },
            outcome: Outcome::Appended,
        };
        assert_eq!(
            report.to_string(),
            "Extracted coordinates: 37.774900, -122.419400\n\
             Location: California, United States\n\
             Successfully archived location!"
        );
    }
}
