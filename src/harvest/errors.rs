use crate::extractor::ExtractError;
use crate::fetcher::FetchError;
use crate::storage::StorageError;
use std::fmt;
use thiserror::Error;

/// Why a single candidate was skipped. None of these stop a run.
#[derive(Debug, Error)]
pub enum HarvestError {
    #[error("transport failure: {0}")]
    TransportFailure(FetchError),

    #[error("could not resolve {url}: {reason}")]
    ResolutionFailed { url: String, reason: String },

    #[error("unreadable document: {0}")]
    UnreadableDocument(String),

    #[error("document too short ({pages} pages)")]
    TooShort { pages: usize },

    #[error("filesystem failure: {0}")]
    FilesystemFailure(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ErrorKind {
    Transport,
    Resolution,
    Unreadable,
    TooShort,
    Filesystem,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::Transport => "transport failure",
            ErrorKind::Resolution => "resolution failed",
            ErrorKind::Unreadable => "unreadable document",
            ErrorKind::TooShort => "too short",
            ErrorKind::Filesystem => "filesystem failure",
        };
        f.write_str(name)
    }
}

impl HarvestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            HarvestError::TransportFailure(_) => ErrorKind::Transport,
            HarvestError::ResolutionFailed { .. } => ErrorKind::Resolution,
            HarvestError::UnreadableDocument(_) => ErrorKind::Unreadable,
            HarvestError::TooShort { .. } => ErrorKind::TooShort,
            HarvestError::FilesystemFailure(_) => ErrorKind::Filesystem,
        }
    }
}

impl From<FetchError> for HarvestError {
    fn from(err: FetchError) -> Self {
        match err {
            FetchError::Write(source) => HarvestError::FilesystemFailure(source.to_string()),
            other => HarvestError::TransportFailure(other),
        }
    }
}

impl From<ExtractError> for HarvestError {
    fn from(err: ExtractError) -> Self {
        match err {
            ExtractError::Unreadable(decode) => HarvestError::UnreadableDocument(decode.0),
            ExtractError::TooShort { pages, .. } => HarvestError::TooShort { pages },
        }
    }
}

impl From<StorageError> for HarvestError {
    fn from(err: StorageError) -> Self {
        HarvestError::FilesystemFailure(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::DecodeError;

    #[test]
    fn fetch_errors_map_to_transport_except_writes() {
        let http = HarvestError::from(FetchError::http(reqwest::StatusCode::NOT_FOUND));
        assert_eq!(http.kind(), ErrorKind::Transport);

        let write = HarvestError::from(FetchError::Write(std::io::Error::other("disk full")));
        assert_eq!(write.kind(), ErrorKind::Filesystem);
    }

    #[test]
    fn extract_errors_keep_their_meaning() {
        let short = HarvestError::from(ExtractError::TooShort {
            pages: 4,
            min_pages: 6,
        });
        assert!(matches!(short, HarvestError::TooShort { pages: 4 }));

        let unreadable = HarvestError::from(ExtractError::Unreadable(DecodeError(
            "missing %PDF- header".into(),
        )));
        assert_eq!(unreadable.kind(), ErrorKind::Unreadable);
        assert_eq!(
            unreadable.to_string(),
            "unreadable document: missing %PDF- header"
        );
    }
}
