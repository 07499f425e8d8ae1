use thiserror::Error;

use crate::NoteID;

/// Errors reported by a [`crate::NoteService`].
#[derive(Error, Debug)]
pub enum NoteServiceError {
    /// The note an update or delete refers to is gone.
    #[error("note `{0}` doesn't exist")]
    NotFound(NoteID),
    /// Network or service failure. The request may succeed if retried.
    #[error("note service unavailable: {0}")]
    RemoteUnavailable(String),
    /// The identity collaborator rejected the request.
    #[error("request is not authenticated")]
    Unauthenticated,
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    /// The service answered with a body that could not be understood.
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// A push receiver fell behind and skipped events.
    #[error("push channel lagged, {0} events skipped")]
    Lagged(u64),
    #[error("io error")]
    IOError(#[from] std::io::Error),
    #[error("serde error")]
    SerdeError(#[from] serde_json::Error),
}

impl NoteServiceError {
    /// Whether retrying the same request later can succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, NoteServiceError::RemoteUnavailable(_))
    }
}

impl From<reqwest::Error> for NoteServiceError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_decode() {
            NoteServiceError::MalformedResponse(e.to_string())
        } else {
            NoteServiceError::RemoteUnavailable(e.to_string())
        }
    }
}

/// Errors reported by a [`crate::NoteListSynchronizer`].
#[derive(Error, Debug)]
pub enum SyncError {
    #[error("cannot submit a blank note")]
    EmptyDraft,
    #[error("initial load failed after {attempts} attempts")]
    LoadFailed {
        attempts: u32,
        #[source]
        source: NoteServiceError,
    },
    #[error(transparent)]
    Service(#[from] NoteServiceError),
}
