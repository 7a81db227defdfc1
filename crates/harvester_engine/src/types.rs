use harvester_core::{Field, FieldValue, Position};
use thiserror::Error;

use crate::locator::Locator;

/// Failures reported by a document session. These are never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("invalid locator '{locator}': {message}")]
    InvalidLocator { locator: String, message: String },
    #[error("browser error: {0}")]
    Browser(String),
    #[error("script evaluation failed: {0}")]
    Script(String),
    #[error("session is closed")]
    Closed,
}

impl SessionError {
    pub(crate) fn invalid_locator(locator: &Locator, message: impl Into<String>) -> Self {
        Self::InvalidLocator {
            locator: locator.as_str().to_string(),
            message: message.into(),
        }
    }
}

/// Outcome of a single field extractor.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum FieldError {
    #[error("field {field} unavailable: nothing usable at '{locator}'")]
    Unavailable { field: Field, locator: String },
    #[error(transparent)]
    Session(#[from] SessionError),
}

impl FieldError {
    pub(crate) fn unavailable(field: Field, locator: &Locator) -> Self {
        Self::Unavailable {
            field,
            locator: locator.as_str().to_string(),
        }
    }
}

pub type FieldResult = Result<FieldValue, FieldError>;

/// Fatal conditions that end a harvest.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum HarvestError {
    #[error("feed container not found with locator '{locator}' while looking for position {position}; not signed in or unexpected page layout")]
    FeedStructureMissing { locator: String, position: Position },
    #[error("session failed at position {position}: {source}")]
    Session {
        position: Position,
        #[source]
        source: SessionError,
    },
}
