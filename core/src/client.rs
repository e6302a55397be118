//! Request construction, the round trip, and typed parsing.
//!
//! # Design
//! A round trip is split the same way every time: [`build_request`] turns a
//! [`Request`] into an immutable `http::Request` without touching the
//! network, the injected [`Transport`] executes it, and the response is
//! buffered into a [`Response`]. [`parse_response`] is the pure second half
//! of [`send_parse`], usable on responses obtained any other way.

use std::io::{self, Read};

use http::header::{HeaderName, HeaderValue, COOKIE};
use http::HeaderMap;
use serde::de::DeserializeOwned;
use url::Url;

use crate::context::Context;
use crate::cookie;
use crate::error::{BuildError, Error};
use crate::header::Header;
use crate::message::{Request, Response};
use crate::query;
use crate::transport::{Body, Transport};

/// Build the wire request for `request`.
///
/// The header set is exactly `request.header`; nothing is merged in. Cookies
/// are folded into one `Cookie` header, appended to a caller-supplied one if
/// present. `params` are merged into the URL query.
pub fn build_request(request: &Request) -> Result<http::Request<Vec<u8>>, BuildError> {
    let method = request.method.to_http()?;
    let mut url = Url::parse(&request.url)?;
    let mut headers = header_map(&request.header)?;
    add_cookies(&mut headers, &request.cookies)?;
    query::merge_params(&mut url, &request.params);
    let uri: http::Uri = url.as_str().parse()?;

    let mut wire = http::Request::new(request.body.clone());
    *wire.method_mut() = method;
    *wire.uri_mut() = uri;
    *wire.headers_mut() = headers;
    Ok(wire)
}

fn header_map(header: &Header) -> Result<HeaderMap, BuildError> {
    let mut map = HeaderMap::new();
    for (name, values) in header.iter() {
        let name = HeaderName::from_bytes(name.as_bytes())?;
        for value in values {
            let value =
                HeaderValue::from_str(value).map_err(|source| BuildError::InvalidHeaderValue {
                    name: name.to_string(),
                    source,
                })?;
            map.append(name.clone(), value);
        }
    }
    Ok(map)
}

fn add_cookies(headers: &mut HeaderMap, cookies: &[cookie::Cookie]) -> Result<(), BuildError> {
    let Some(pairs) = cookie::request_header_value(cookies) else {
        return Ok(());
    };
    // An empty caller value counts as no Cookie header at all.
    let joined = match headers.get(COOKIE).filter(|existing| !existing.is_empty()) {
        Some(existing) => {
            format!("{}; {pairs}", String::from_utf8_lossy(existing.as_bytes()))
        }
        None => pairs,
    };
    let value = HeaderValue::from_str(&joined).map_err(|source| BuildError::InvalidHeaderValue {
        name: COOKIE.to_string(),
        source,
    })?;
    // Only the first Cookie value is extended; any further ones stay as-is.
    match headers.get_mut(COOKIE) {
        Some(first) => *first = value,
        None => {
            headers.insert(COOKIE, value);
        }
    }
    Ok(())
}

/// Perform one round trip and buffer the whole response.
///
/// Nothing is retried. The response body is released on every path.
pub fn send<T: Transport + ?Sized>(
    ctx: &Context,
    transport: &T,
    request: &Request,
) -> Result<Response, Error> {
    let wire = build_request(request).map_err(Error::RequestConstruction)?;
    tracing::debug!(method = %wire.method(), url = %wire.uri(), "sending request");

    ctx.check().map_err(Error::Transport)?;
    let response = transport.execute(ctx, wire).map_err(Error::Transport)?;

    let (parts, body) = response.into_parts();
    let mut reader = ContextReader { ctx, inner: body };
    let mut buf = Vec::new();
    // A read cut short by the context is reported the same way as a call
    // cut short by it.
    reader
        .read_to_end(&mut buf)
        .map_err(|err| match ctx.check() {
            Err(ctx_err) => Error::Transport(ctx_err),
            Ok(()) => Error::ResponseRead(err),
        })?;
    drop(reader);

    let status_code = parts.status.as_u16();
    tracing::debug!(status = status_code, bytes = buf.len(), "response received");

    Ok(Response {
        body: buf,
        header: Header::from(&parts.headers),
        cookies: cookie::from_set_cookie_headers(&parts.headers),
        status_code,
    })
}

/// [`send`], then [`parse_response`].
pub fn send_parse<T, C>(
    ctx: &Context,
    transport: &C,
    request: &Request,
    acceptable: &[u16],
) -> Result<T, Error>
where
    T: DeserializeOwned,
    C: Transport + ?Sized,
{
    let response = send(ctx, transport, request)?;
    parse_response(&response, acceptable)
}

/// Check the status against `acceptable` and decode the body as JSON.
///
/// An empty `acceptable` set accepts every status.
pub fn parse_response<T: DeserializeOwned>(
    response: &Response,
    acceptable: &[u16],
) -> Result<T, Error> {
    if !acceptable.is_empty() && !acceptable.contains(&response.status_code) {
        return Err(Error::UnacceptableStatus(response.status_code));
    }
    serde_json::from_slice(&response.body).map_err(Error::Unmarshal)
}

/// Fails reads once the context has ended.
struct ContextReader<'a> {
    ctx: &'a Context,
    inner: Body,
}

impl Read for ContextReader<'_> {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        self.ctx.check().map_err(io::Error::other)?;
        self.inner.read(buf)
    }
}
