use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::assistants::runs::Run;

/// Error object returned by the remote service alongside a non-2xx status.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiError {
    pub message: String,
    #[serde(rename = "type")]
    pub error_type: String,
    pub param: Option<String>,
    pub code: Option<String>,
}

impl ApiError {
    pub fn new(message: String, error_type: String) -> Self {
        Self {
            message,
            error_type,
            param: None,
            code: None,
        }
    }
}

impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

#[derive(Debug, Error)]
pub enum Error {
    /// The remote service rejected the credential (HTTP 401). Distinct from
    /// [`Error::Transport`] so a network outage is never mistaken for an
    /// invalid key.
    #[error("authentication rejected: {0}")]
    AuthenticationRejected(ApiError),

    /// The remote service rejected the request payload, e.g. a malformed
    /// function-tool schema.
    #[error("request rejected by remote service: {0}")]
    RemoteRejected(ApiError),

    /// The referenced remote resource id no longer exists (HTTP 404).
    #[error("remote resource not found: {0}")]
    NotFound(ApiError),

    /// The remote service itself failed (HTTP 5xx). Unlike
    /// [`Error::RemoteRejected`] this says nothing about the request, which
    /// may succeed on retry.
    #[error("remote service failure: {0}")]
    ServerError(ApiError),

    /// A run reached a terminal status other than `completed`.
    #[error("run {} ended with status {:?}", .run.id, .run.status)]
    RunFailed { run: Box<Run> },

    /// The poll ceiling elapsed before the run reached a terminal status.
    #[error("run {run_id} still not terminal after {waited:?}")]
    RunTimedOut { run_id: String, waited: Duration },

    /// A local store file exists but does not hold valid JSON.
    #[error("local store at {} is corrupt: {source}", .path.display())]
    LocalStoreCorrupt {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    /// A thread-history rename or removal targeted an id with no record.
    #[error("no thread record with id '{thread_id}'")]
    RecordNotFound { thread_id: String },

    #[error("I/O error at {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("event stream error: {0}")]
    Stream(#[from] reqwest_eventsource::Error),

    #[error("request cannot be cloned for streaming: {0}")]
    StreamRequest(#[from] reqwest_eventsource::CannotCloneRequestError),

    /// A session operation needs an assistant selected first.
    #[error("no assistant selected")]
    NoAssistantSelected,

    /// A session operation needs a thread opened first.
    #[error("no thread opened")]
    NoThreadSelected,
}

impl Error {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    pub(crate) fn corrupt(path: impl Into<PathBuf>, source: serde_json::Error) -> Self {
        Self::LocalStoreCorrupt {
            path: path.into(),
            source,
        }
    }
}
