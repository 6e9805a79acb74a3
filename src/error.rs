//! Error types shared by every sighting source and the repository.

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::record::SightingId;

pub type Result<T> = std::result::Result<T, SightingError>;

/// Coarse classification callers branch on.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Network,
    Parse,
    NotFound,
    Validation,
    Concurrency,
    Storage,
    Internal,
}

/// Errors produced while reading, reconciling or submitting sightings.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum SightingError {
    /// The remote catalog could not be reached.
    #[error("request to {url} failed: {source}")]
    Network {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    /// The remote catalog answered with a non-success status.
    #[error("request to {url} failed with status {status}")]
    HttpStatus { url: String, status: u16 },
    /// A payload did not match the sighting shape.
    #[error("failed to parse sightings from {origin}: {source}")]
    Parse {
        origin: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("no sighting with id {0}")]
    NotFound(SightingId),
    #[error("invalid sighting: {0}")]
    Validation(String),
    /// An append would have stored a second record under an existing id.
    #[error("sighting id {0} is already stored locally")]
    Concurrency(SightingId),
    #[error("failed to access local store at {path:?}: {source}")]
    Storage {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("no sighting ids remain to allocate")]
    IdSpaceExhausted,
    #[error("submission task failed: {0}")]
    Interrupted(String),
}

impl SightingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Network { .. } | Self::HttpStatus { .. } => ErrorKind::Network,
            Self::Parse { .. } => ErrorKind::Parse,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::Validation(_) => ErrorKind::Validation,
            Self::Concurrency(_) => ErrorKind::Concurrency,
            Self::Storage { .. } => ErrorKind::Storage,
            Self::IdSpaceExhausted | Self::Interrupted(_) => ErrorKind::Internal,
        }
    }

    pub(crate) fn parse(origin: impl Into<String>, source: serde_json::Error) -> Self {
        Self::Parse {
            origin: origin.into(),
            source,
        }
    }

    pub(crate) fn storage(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Storage {
            path: path.into(),
            source,
        }
    }
}
