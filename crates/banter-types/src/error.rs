use thiserror::Error;

/// Errors from the record store (used by trait definitions in banter-core).
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("query error: {0}")]
    Query(String),
}

/// Errors from opening or reading the completion transport.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("connection failed: {0}")]
    Connect(String),

    #[error("endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("stream read failed: {0}")]
    Read(String),
}

/// Errors from assembling a chunked response stream.
#[derive(Debug, Error)]
pub enum StreamError {
    /// The stream failed or ended without the terminal sentinel.
    #[error("stream interrupted: {0}")]
    Interrupted(String),

    /// The stream was torn down by a concurrent session operation.
    #[error("stream cancelled")]
    Cancelled,
}

/// Errors surfaced to session callers.
#[derive(Debug, Error)]
pub enum SessionError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// A send is already in flight; the session state is untouched.
    #[error("session busy: a send is already in flight")]
    Busy,

    #[error("transport error: {0}")]
    Transport(#[from] TransportError),

    /// The response stream broke before completing. Fragments already
    /// applied stay visible in memory; nothing was persisted.
    #[error("stream interrupted: {0}")]
    StreamInterrupted(String),

    /// The send was cancelled by a concurrent session operation.
    #[error("send cancelled")]
    Cancelled,

    #[error("storage error: {0}")]
    Storage(#[from] StoreError),
}
