//! HTTP verbs.
//!
//! `Method` is open: any string is accepted and nothing is checked until the
//! request is built. The associated constants cover the standard verbs.

use std::borrow::Cow;
use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

/// HTTP method of a [`Request`](crate::Request).
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Method(Cow<'static, str>);

impl Method {
    pub const GET: Method = Method(Cow::Borrowed("GET"));
    pub const POST: Method = Method(Cow::Borrowed("POST"));
    pub const PUT: Method = Method(Cow::Borrowed("PUT"));
    pub const PATCH: Method = Method(Cow::Borrowed("PATCH"));
    pub const DELETE: Method = Method(Cow::Borrowed("DELETE"));
    pub const HEAD: Method = Method(Cow::Borrowed("HEAD"));
    pub const OPTIONS: Method = Method(Cow::Borrowed("OPTIONS"));
    pub const TRACE: Method = Method(Cow::Borrowed("TRACE"));
    pub const CONNECT: Method = Method(Cow::Borrowed("CONNECT"));

    pub fn new(name: impl Into<String>) -> Self {
        Method(Cow::Owned(name.into()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Convert to the wire method. An empty method is sent as `GET`.
    pub(crate) fn to_http(&self) -> Result<http::Method, http::method::InvalidMethod> {
        if self.0.is_empty() {
            return Ok(http::Method::GET);
        }
        http::Method::from_bytes(self.0.as_bytes())
    }
}

impl Default for Method {
    fn default() -> Self {
        Method::GET
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Method {
    fn from(name: &str) -> Self {
        Method::new(name)
    }
}

impl From<String> for Method {
    fn from(name: String) -> Self {
        Method::new(name)
    }
}

impl FromStr for Method {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Method::new(s))
    }
}

impl PartialEq<str> for Method {
    fn eq(&self, other: &str) -> bool {
        self.as_str() == other
    }
}

impl PartialEq<&str> for Method {
    fn eq(&self, other: &&str) -> bool {
        self.as_str() == *other
    }
}
