//! Parser for `.http` fixture files.
//!
//! A fixture holds one request and the response it should produce:
//!
//! ```text
//! GET /hello HTTP/1.1
//! Accept: text/plain
//!
//! HTTP/1.1 200 OK
//! Service-Name: Demo
//!
//! Hello, World!
//! ```
//!
//! The request line may omit the version. Header blocks are the lines
//! directly after the request or status line that contain a colon. The
//! request body runs up to the last line starting with `HTTP/1.1`; the
//! expected body runs to the end of the file.

use std::collections::BTreeMap;
use std::fmt;
use std::fs;
use std::path::Path;
use std::str::FromStr;

use thiserror::Error;
use url::Url;

use crate::error::Error;
use crate::request;

const VERSION: &str = "HTTP/1.1";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
    Put,
    Delete,
}

impl FromStr for Method {
    type Err = FixtureError;

    fn from_str(s: &str) -> Result<Method, FixtureError> {
        match s {
            "GET" => Ok(Method::Get),
            "POST" => Ok(Method::Post),
            "PUT" => Ok(Method::Put),
            "DELETE" => Ok(Method::Delete),
            other => Err(FixtureError::UnsupportedMethod(other.to_string())),
        }
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        let label = match self {
            Method::Get => "GET",
            Method::Post => "POST",
            Method::Put => "PUT",
            Method::Delete => "DELETE",
        };
        write!(f, "{label}")
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum FixtureError {
    #[error("the fixture is empty")]
    MissingRequestLine,
    #[error("unsupported method `{0}`, expected GET, POST, PUT or DELETE")]
    UnsupportedMethod(String),
    #[error("the request line has no url")]
    MissingUrl,
    #[error("malformed request line `{0}`")]
    MalformedRequestLine(String),
    #[error("cannot resolve url `{url}`: {reason}")]
    InvalidUrl { url: String, reason: url::ParseError },
    #[error("no `HTTP/1.1 <status>` line follows the request")]
    MissingStatusLine,
    #[error("invalid status code in `{0}`")]
    InvalidStatusCode(String),
}

/// What the live response is compared against.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Expectation {
    pub status: u16,
    /// Lowercased header name to lowercased expected value.
    pub headers: BTreeMap<String, String>,
    /// Empty means the body is not checked.
    pub body: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fixture {
    pub request: request::Request,
    pub expected: Expectation,
}

/// One fixture file, named by its path. A fixture that failed to parse is
/// still a test case; running it reports the parse error.
#[derive(Debug, Clone)]
pub struct TestCase {
    pub name: String,
    pub fixture: Result<Fixture, FixtureError>,
}

/// Reads and parses the fixture at `path`. Only a read failure is an error
/// here; parse failures are carried inside the returned case. Bytes that
/// are not valid UTF-8 are replaced rather than rejected.
pub fn load(path: &Path, base: &Url) -> Result<TestCase, Error> {
    let raw = fs::read(path).map_err(|source| Error::ReadFixture {
        path: path.to_path_buf(),
        source,
    })?;
    let case = TestCase {
        name: path.display().to_string(),
        fixture: parse(&String::from_utf8_lossy(&raw), base),
    };
    if let Err(ref e) = case.fixture {
        debug!("{}: {}", case.name, e);
    }
    Ok(case)
}

/// Parses fixture text. Relative request URLs are resolved against `base`.
pub fn parse(text: &str, base: &Url) -> Result<Fixture, FixtureError> {
    let lines: Vec<&str> = text.split_inclusive('\n').collect();
    let request_line = lines.first().ok_or(FixtureError::MissingRequestLine)?;

    let mut parts = request_line.split_whitespace();
    let method: Method = parts.next().ok_or(FixtureError::MissingRequestLine)?.parse()?;
    let raw_url = parts.next().ok_or(FixtureError::MissingUrl)?;
    match (parts.next(), parts.next()) {
        (None, None) | (Some(VERSION), None) => {}
        _ => return Err(FixtureError::MalformedRequestLine(request_line.trim_end().to_string())),
    }
    let url = base.join(raw_url).map_err(|reason| FixtureError::InvalidUrl {
        url: raw_url.to_string(),
        reason,
    })?;

    let request_headers_end = header_block_end(&lines, 1);
    let status_idx = (request_headers_end..lines.len())
        .rev()
        .find(|&i| lines[i].starts_with(VERSION))
        .ok_or(FixtureError::MissingStatusLine)?;
    let status = parse_status(lines[status_idx])?;
    let response_headers_end = header_block_end(&lines, status_idx + 1);

    let mut req = request::Request::new(&method.to_string(), url.as_str());
    for (name, value) in parse_headers(&lines[1..request_headers_end].concat()) {
        req.set_header(&name, value.as_bytes());
    }
    req.add_body(lines[request_headers_end..status_idx].concat().trim().as_bytes());

    Ok(Fixture {
        request: req,
        expected: Expectation {
            status,
            headers: parse_headers(&lines[status_idx + 1..response_headers_end].concat()),
            body: lines[response_headers_end..].concat().trim().to_string(),
        },
    })
}

/// Splits a header block into lowercased, trimmed name/value pairs. Lines
/// that do not contain exactly one colon are skipped.
pub fn parse_headers(block: &str) -> BTreeMap<String, String> {
    let mut headers = BTreeMap::new();
    for line in block.split('\n') {
        let mut pieces = line.split(':');
        if let (Some(name), Some(value), None) = (pieces.next(), pieces.next(), pieces.next()) {
            headers.insert(name.trim().to_lowercase(), value.trim().to_lowercase());
        }
    }
    headers
}

/// Index just past the run of header lines starting at `start`. A header
/// line contains a colon and is terminated by a newline.
fn header_block_end(lines: &[&str], start: usize) -> usize {
    let mut end = start;
    while end < lines.len() && lines[end].ends_with('\n') && lines[end].contains(':') {
        end += 1;
    }
    end
}

fn parse_status(line: &str) -> Result<u16, FixtureError> {
    let invalid = || FixtureError::InvalidStatusCode(line.trim_end().to_string());

    let rest = &line[VERSION.len()..];
    if !rest.is_empty() && !rest.starts_with(char::is_whitespace) {
        return Err(invalid());
    }
    let code = rest.split_whitespace().next().ok_or_else(invalid)?;
    if code.len() != 3 || !code.bytes().all(|b| b.is_ascii_digit()) {
        return Err(invalid());
    }
    code.parse().map_err(|_| invalid())
}
