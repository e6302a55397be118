//! Cookies: request-side serialization and `Set-Cookie` parsing.
//!
//! # Design
//! Requests only ever carry `name=value` pairs, folded into one `Cookie`
//! header. Responses are parsed leniently: a `Set-Cookie` line with an
//! invalid name or value is dropped, an attribute that cannot be understood
//! is kept verbatim in [`Cookie::unparsed`].

use std::fmt;

use http::header::SET_COOKIE;
use http::HeaderMap;

/// `Max-Age` attribute of a cookie.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MaxAge {
    Seconds(i64),
    /// `Max-Age` of zero or below: delete the cookie now.
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameSite {
    Lax,
    Strict,
    None,
}

impl SameSite {
    fn as_str(self) -> &'static str {
        match self {
            SameSite::Lax => "Lax",
            SameSite::Strict => "Strict",
            SameSite::None => "None",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    /// The value was (or must be) wrapped in double quotes on the wire.
    pub quoted: bool,
    pub path: Option<String>,
    pub domain: Option<String>,
    /// Raw `Expires` attribute; not interpreted.
    pub expires: Option<String>,
    pub max_age: Option<MaxAge>,
    pub secure: bool,
    pub http_only: bool,
    pub same_site: Option<SameSite>,
    pub partitioned: bool,
    pub unparsed: Vec<String>,
}

impl Cookie {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            ..Self::default()
        }
    }

    /// The `name=value` pair as sent in a request `Cookie` header.
    pub fn pair(&self) -> String {
        format!(
            "{}={}",
            sanitize_name(&self.name),
            sanitize_value(&self.value, self.quoted)
        )
    }
}

impl fmt::Display for Cookie {
    /// Renders the cookie in `Set-Cookie` syntax.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.pair())?;
        if let Some(path) = &self.path {
            write!(f, "; Path={path}")?;
        }
        if let Some(domain) = &self.domain {
            write!(f, "; Domain={}", domain.trim_start_matches('.'))?;
        }
        if let Some(expires) = &self.expires {
            write!(f, "; Expires={expires}")?;
        }
        match self.max_age {
            Some(MaxAge::Seconds(secs)) => write!(f, "; Max-Age={secs}")?,
            Some(MaxAge::Delete) => f.write_str("; Max-Age=0")?,
            None => {}
        }
        if self.http_only {
            f.write_str("; HttpOnly")?;
        }
        if self.secure {
            f.write_str("; Secure")?;
        }
        if let Some(same_site) = self.same_site {
            write!(f, "; SameSite={}", same_site.as_str())?;
        }
        if self.partitioned {
            f.write_str("; Partitioned")?;
        }
        Ok(())
    }
}

/// Fold `cookies` into a single `Cookie` header value, in order.
pub fn request_header_value(cookies: &[Cookie]) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    Some(cookies.iter().map(Cookie::pair).collect::<Vec<_>>().join("; "))
}

/// Parse every `Set-Cookie` header of a response, skipping invalid lines.
pub fn from_set_cookie_headers(headers: &HeaderMap) -> Vec<Cookie> {
    headers
        .get_all(SET_COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .filter_map(parse_set_cookie)
        .collect()
}

/// Parse one `Set-Cookie` line.
pub fn parse_set_cookie(line: &str) -> Option<Cookie> {
    let mut parts = line.trim().split(';');
    let (name, raw_value) = parts.next()?.trim().split_once('=')?;
    let name = name.trim();
    if !is_token(name) {
        return None;
    }
    let (value, quoted) = parse_value(raw_value, true)?;
    let mut cookie = Cookie {
        name: name.to_string(),
        value: value.to_string(),
        quoted,
        ..Cookie::default()
    };

    for part in parts {
        let part = part.trim();
        if part.is_empty() {
            continue;
        }
        let (attr, raw) = part.split_once('=').unwrap_or((part, ""));
        let attr = attr.trim();
        let Some((val, _)) = parse_value(raw, false) else {
            cookie.unparsed.push(part.to_string());
            continue;
        };
        match attr.to_ascii_lowercase().as_str() {
            "samesite" => {
                cookie.same_site = match val.to_ascii_lowercase().as_str() {
                    "lax" => Some(SameSite::Lax),
                    "strict" => Some(SameSite::Strict),
                    "none" => Some(SameSite::None),
                    _ => None,
                };
            }
            "secure" => cookie.secure = true,
            "httponly" => cookie.http_only = true,
            "partitioned" => cookie.partitioned = true,
            "domain" => cookie.domain = Some(val.to_string()),
            "path" => cookie.path = Some(val.to_string()),
            "expires" => cookie.expires = Some(val.to_string()),
            "max-age" => {
                // Leading zeros are not allowed on a non-zero value.
                if let Ok(secs) = val.parse::<i64>() {
                    if secs == 0 || !val.starts_with('0') {
                        cookie.max_age = Some(if secs <= 0 {
                            MaxAge::Delete
                        } else {
                            MaxAge::Seconds(secs)
                        });
                    }
                }
            }
            _ => cookie.unparsed.push(part.to_string()),
        }
    }
    Some(cookie)
}

/// Strip optional surrounding quotes and check every byte is a cookie octet.
fn parse_value(raw: &str, allow_quotes: bool) -> Option<(&str, bool)> {
    let raw = raw.trim();
    let (value, quoted) = if allow_quotes
        && raw.len() > 1
        && raw.starts_with('"')
        && raw.ends_with('"')
    {
        (&raw[1..raw.len() - 1], true)
    } else {
        (raw, false)
    };
    value
        .bytes()
        .all(is_cookie_octet)
        .then_some((value, quoted))
}

fn is_cookie_octet(b: u8) -> bool {
    (0x20..0x7f).contains(&b) && b != b'"' && b != b';' && b != b'\\'
}

fn is_token(s: &str) -> bool {
    !s.is_empty()
        && s.bytes().all(|b| {
            b.is_ascii_alphanumeric() || b"!#$%&'*+-.^_`|~".contains(&b)
        })
}

fn sanitize_name(name: &str) -> String {
    name.replace(['\r', '\n'], "-")
}

fn sanitize_value(value: &str, quoted: bool) -> String {
    let clean: String = value
        .chars()
        .filter(|c| c.is_ascii() && is_cookie_octet(*c as u8))
        .collect();
    if quoted || clean.contains([' ', ',']) {
        format!("\"{clean}\"")
    } else {
        clean
    }
}
