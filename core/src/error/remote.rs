use thiserror::Error;

/// Longest slice of a non-success response body carried in an error message.
pub const ERROR_BODY_LIMIT: usize = 50;

/// Typed failure of a single remote annotation request. Never carries partial
/// data.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RemoteError {
    #[error("stopped")]
    Cancelled,

    #[error("API error {status}: {body}")]
    Unauthorized { status: u16, body: String },

    #[error("payload too large")]
    PayloadTooLarge,

    #[error("API error {status}: {body}")]
    Status { status: u16, body: String },

    #[error("request failed: {0}")]
    Transport(String),

    #[error("invalid response: {0}")]
    Decode(String),
}

impl RemoteError {
    /// Classify a non-success HTTP status. `body` is truncated here.
    pub fn from_status(status: u16, body: &str) -> Self {
        let body = truncate_body(body);
        match status {
            401 | 403 => Self::Unauthorized { status, body },
            413 => Self::PayloadTooLarge,
            _ => Self::Status { status, body },
        }
    }

    /// Credential rejections are never retried.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Unauthorized { .. })
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

pub fn truncate_body(body: &str) -> String {
    body.trim().chars().take(ERROR_BODY_LIMIT).collect()
}

/// Outcome of one attempt that did not yield an acceptable label.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AttemptError {
    #[error(transparent)]
    Remote(#[from] RemoteError),

    #[error("empty response")]
    EmptyResponse,

    #[error("too short ({0})")]
    TooShort(usize),
}

impl AttemptError {
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Remote(e) if e.is_fatal())
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Remote(e) if e.is_cancelled())
    }
}

/// Final failure of a task within one run. The `Display` text is what ends up
/// in the task's `error` field.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TaskFailure {
    /// Cancellation; the task goes back to `pending`.
    #[error("stopped")]
    Stopped,

    #[error("{0}")]
    Fatal(String),

    #[error("{0}")]
    Failed(String),

    #[error("max attempts reached")]
    MaxAttempts,

    #[error("no endpoint available")]
    NoEndpoint,

    #[error("internal error: {0}")]
    Internal(String),
}

impl TaskFailure {
    pub fn is_stopped(&self) -> bool {
        matches!(self, Self::Stopped)
    }
}
