//! Send an HTTP request described as plain data, optionally decoding a JSON
//! response into a caller-chosen type.
//!
//! # Overview
//! A [`Request`] (method, URL, headers, cookies, body, query params) is built
//! into a wire request, executed through a caller-owned [`Transport`], and
//! returned as a fully buffered [`Response`]. [`send_parse`] adds an optional
//! status allow-list and JSON decoding on top of [`send`].
//!
//! # Design
//! - The transport is always injected; the crate holds no global client and
//!   no state between calls.
//! - Request construction is a pure step ([`build_request`]) that produces an
//!   immutable `http::Request` before any I/O happens.
//! - The caller's header set replaces the wire headers wholesale.
//! - Every failure is returned to the caller, tagged with the stage it came
//!   from (see [`Error`]). Nothing is retried.
//! - Cancellation and deadlines come from the [`Context`] passed to each call.

pub mod client;
pub mod context;
pub mod cookie;
pub mod error;
pub mod header;
pub mod message;
pub mod method;
mod query;
pub mod transport;

pub use client::{build_request, parse_response, send, send_parse};
pub use context::{CancelHandle, Context};
pub use cookie::{Cookie, MaxAge, SameSite};
pub use error::{BuildError, Error, TransportError};
pub use header::Header;
pub use message::{Request, Response};
pub use method::Method;
pub use transport::{Body, Transport, UreqTransport};
