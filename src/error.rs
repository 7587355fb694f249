use thiserror::Error;

use crate::coords::Coordinate;

/// Everything that can abort processing of a single URL.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("could not extract coordinates from URL: {url}")]
    Extraction { url: String },

    #[error("geocoding request for {coordinate} failed: {source}")]
    Transport {
        coordinate: Coordinate,
        #[source]
        source: reqwest::Error,
    },

    #[error("geocoding API returned status {status}{}", detail(.message))]
    Geocoding {
        status: String,
        message: Option<String>,
    },

    #[error("no geocoding results for {coordinate}")]
    NoResults { coordinate: Coordinate },

    #[error("location for {coordinate} is missing a {missing} component")]
    IncompleteLocation {
        coordinate: Coordinate,
        missing: &'static str,
    },

    #[error("document {action} failed: {reason}")]
    DocumentAccess { action: &'static str, reason: String },
}

impl ArchiveError {
    /// Pipeline stage the error came from, for operator-facing messages.
    pub fn stage(&self) -> &'static str {
        match self {
            ArchiveError::Extraction { .. } => "extract",
            ArchiveError::Transport { .. }
            | ArchiveError::Geocoding { .. }
            | ArchiveError::NoResults { .. }
            | ArchiveError::IncompleteLocation { .. } => "resolve",
            ArchiveError::DocumentAccess { .. } => "archive",
        }
    }

    pub(crate) fn document(action: &'static str, reason: impl ToString) -> Self {
        ArchiveError::DocumentAccess {
            action,
            reason: reason.to_string(),
        }
    }
}

fn detail(message: &Option<String>) -> String {
    message
        .as_deref()
        .map(|m| format!(" ({m})"))
        .unwrap_or_default()
}

pub type Result<T, E = ArchiveError> = std::result::Result<T, E>;
