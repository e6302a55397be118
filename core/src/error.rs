//! Error types for `send` and `send_parse`.
//!
//! # Design
//! One variant per stage of a round trip, each wrapping the underlying
//! cause. `UnacceptableStatus` carries only the status code; callers that
//! need the body of a rejected response call `send` and inspect it
//! themselves.

use thiserror::Error;

/// Errors returned by [`send`](crate::send) and [`send_parse`](crate::send_parse).
#[derive(Debug, Error)]
pub enum Error {
    /// Method, URL, headers or cookies could not form a valid request.
    #[error("creating request: {0}")]
    RequestConstruction(#[source] BuildError),

    /// The transport failed, or the context was canceled or expired.
    #[error("sending request: {0}")]
    Transport(#[source] TransportError),

    /// The response body could not be read to the end.
    #[error("reading response: {0}")]
    ResponseRead(#[source] std::io::Error),

    /// The status code is not in the caller's acceptable set.
    #[error("unacceptable status code: {0}")]
    UnacceptableStatus(u16),

    /// The response body is not JSON of the expected shape.
    #[error("unmarshaling response: {0}")]
    Unmarshal(#[source] serde_json::Error),

    /// A request body could not be serialized to JSON.
    #[error("marshaling request body: {0}")]
    Marshal(#[source] serde_json::Error),
}

impl Error {
    /// Status code of an `UnacceptableStatus` error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::UnacceptableStatus(status) => Some(*status),
            _ => None,
        }
    }
}

/// Reasons a [`Request`](crate::Request) cannot be turned into a wire request.
#[derive(Debug, Error)]
pub enum BuildError {
    #[error("invalid method: {0}")]
    InvalidMethod(#[from] http::method::InvalidMethod),

    #[error("invalid url: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("invalid uri: {0}")]
    InvalidUri(#[from] http::uri::InvalidUri),

    #[error("invalid header name: {0}")]
    InvalidHeaderName(#[from] http::header::InvalidHeaderName),

    #[error("invalid header value for {name}: {source}")]
    InvalidHeaderValue {
        name: String,
        #[source]
        source: http::header::InvalidHeaderValue,
    },
}

/// Failures while executing a request through a [`Transport`](crate::Transport).
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("context canceled")]
    Canceled,

    #[error("context deadline exceeded")]
    DeadlineExceeded,

    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// Error reported by the underlying HTTP client.
    #[error(transparent)]
    Client(Box<dyn std::error::Error + Send + Sync>),
}

impl TransportError {
    pub fn client(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        TransportError::Client(Box::new(err))
    }

    /// The context ended before or during the round trip.
    pub fn is_context(&self) -> bool {
        matches!(
            self,
            TransportError::Canceled | TransportError::DeadlineExceeded
        )
    }
}
