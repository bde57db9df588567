//! Queue Error Types

#[derive(Debug, thiserror::Error)]
pub enum QueueError {
    #[error("Queue '{name}' push timed out after {timeout_ms} ms (occupancy {occupancy}/{capacity})")]
    PushTimeout {
        name: String,
        timeout_ms: u64,
        occupancy: usize,
        capacity: usize,
    },

    #[error("Queue '{name}' pop timed out after {timeout_ms} ms (queue empty)")]
    PopTimeout { name: String, timeout_ms: u64 },

    #[error("Queue '{name}' holds elements of type {bound}, not {requested}")]
    TypeMismatch {
        name: String,
        bound: String,
        requested: String,
    },

    #[error("Queue not found: {name}")]
    NotFound { name: String },

    #[error("Queue registry is already configured")]
    AlreadyConfigured,

    #[error("Queue '{name}' has an unrecognised kind")]
    UnknownKind { name: String },

    #[error("Queue '{name}' declares capacity 0; capacity must be positive")]
    InvalidCapacity { name: String },

    #[error("Queue '{name}' is declared more than once")]
    DuplicateName { name: String },
}

/// Result type for queue operations
pub type QueueResult<T> = Result<T, QueueError>;

/// Failed push carrying the rejected element back to the caller.
///
/// A timed-out push never consumes the value; callers that want to retry or
/// reroute it take it back out of the error.
#[derive(Debug)]
pub struct PushError<T> {
    pub value: T,
    pub error: QueueError,
}

impl<T> PushError<T> {
    /// Discard the element and keep the underlying error.
    pub fn into_error(self) -> QueueError {
        self.error
    }
}

impl<T> From<PushError<T>> for QueueError {
    fn from(failed: PushError<T>) -> Self {
        failed.error
    }
}

impl<T> std::fmt::Display for PushError<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        self.error.fmt(f)
    }
}

impl<T: std::fmt::Debug> std::error::Error for PushError<T> {}
