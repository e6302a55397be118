//! Request and response described as plain data.
//!
//! # Design
//! A `Request` is passive: nothing is validated when it is filled in, and
//! invalid methods, URLs or headers only surface when it is sent. A
//! `Response` is the normalized result of one round trip with the body fully
//! buffered.

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::cookie::Cookie;
use crate::error::Error;
use crate::header::Header;
use crate::method::Method;

/// An outbound HTTP request.
///
/// `url` must be absolute. `params` are URL-encoded and merged into any query
/// string already present in `url`.
#[derive(Debug, Clone, Default)]
pub struct Request {
    pub method: Method,
    pub url: String,
    pub header: Header,
    pub cookies: Vec<Cookie>,
    pub body: Vec<u8>,
    pub params: BTreeMap<String, String>,
}

impl Request {
    pub fn new(method: impl Into<Method>, url: impl Into<String>) -> Self {
        Self {
            method: method.into(),
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_header(mut self, name: impl AsRef<str>, value: impl Into<String>) -> Self {
        self.header.add(name, value);
        self
    }

    pub fn with_cookie(mut self, cookie: Cookie) -> Self {
        self.cookies.push(cookie);
        self
    }

    pub fn with_param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn with_body(mut self, body: impl Into<Vec<u8>>) -> Self {
        self.body = body.into();
        self
    }

    /// Serialize `value` as the body and set `content-type: application/json`.
    pub fn with_json<T: Serialize + ?Sized>(mut self, value: &T) -> Result<Self, Error> {
        self.body = serde_json::to_vec(value).map_err(Error::Marshal)?;
        self.header.set("content-type", "application/json");
        Ok(self)
    }
}

/// The normalized result of a round trip.
#[derive(Debug, Clone, Default)]
pub struct Response {
    pub body: Vec<u8>,
    pub header: Header,
    /// Cookies parsed from `Set-Cookie` headers.
    pub cookies: Vec<Cookie>,
    pub status_code: u16,
}

impl Response {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status_code)
    }

    pub fn is_client_error(&self) -> bool {
        (400..500).contains(&self.status_code)
    }

    pub fn is_server_error(&self) -> bool {
        (500..600).contains(&self.status_code)
    }

    /// Body decoded as UTF-8, invalid sequences replaced.
    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    /// Decode the body as JSON without looking at the status code.
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, Error> {
        serde_json::from_slice(&self.body).map_err(Error::Unmarshal)
    }
}
