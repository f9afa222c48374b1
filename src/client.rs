use std::collections::HashMap;
use std::io::{self, Read, Write};
use std::net::TcpStream;

use bytes::{Buf, BytesMut};
use thiserror::Error;
use url::{Position, Url};

use crate::request::{self, Header};

const MAX_HEADERS: usize = 64;
const READ_CHUNK: usize = 4096;

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("invalid url `{url}`: {source}")]
    InvalidUrl { url: String, source: url::ParseError },
    #[error("unsupported scheme `{0}`, only http is supported")]
    UnsupportedScheme(String),
    #[error("url `{0}` has no host")]
    MissingHost(String),
    #[error("failed to connect to {authority}: {source}")]
    Connect { authority: String, source: io::Error },
    #[error("i/o error talking to {authority}: {source}")]
    Io { authority: String, source: io::Error },
    #[error("malformed response: {0}")]
    MalformedResponse(httparse::Error),
    #[error("response ended before {0}")]
    Truncated(&'static str),
    #[error("connection closed before a response was received")]
    ConnectionClosed,
    #[error("unsupported transfer encoding `{0}`")]
    UnsupportedTransferEncoding(String),
}

/// A response as received by `HttpClient`, fully buffered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientResponse {
    pub status: u16,
    pub reason: String,
    pub headers: Vec<Header>,
    pub body: Vec<u8>,
}

impl ClientResponse {
    pub fn header(&self, name: &str) -> Option<&[u8]> {
        request::find(&self.headers, name).map(|h| &h.value[..])
    }

    pub fn body_text(&self) -> std::borrow::Cow<str> {
        String::from_utf8_lossy(&self.body)
    }
}

/// A blocking HTTP/1.1 client. The only state it holds between requests is
/// a pool of idle keep-alive connections, keyed by `host:port`.
pub struct HttpClient {
    idle: HashMap<String, TcpStream>,
}

impl HttpClient {
    pub fn new() -> HttpClient {
        HttpClient {
            idle: HashMap::new(),
        }
    }

    /// Sends `request`, whose target must be an absolute `http://` URL, and
    /// waits for the whole response.
    pub fn send(&mut self, request: &request::Request) -> Result<ClientResponse, ClientError> {
        let url = Url::parse(&request.target).map_err(|source| ClientError::InvalidUrl {
            url: request.target.clone(),
            source,
        })?;
        if url.scheme() != "http" {
            return Err(ClientError::UnsupportedScheme(url.scheme().to_string()));
        }
        let host = url.host_str().ok_or_else(|| ClientError::MissingHost(request.target.clone()))?;
        let authority = format!("{}:{}", host, url.port_or_known_default().unwrap_or(80));

        let defaults = [
            Header::new("Host", url[Position::BeforeHost..Position::AfterPort].as_bytes()),
            Header::new("User-Agent", concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).as_bytes()),
        ];
        let mut wire = Vec::with_capacity(READ_CHUNK);
        request.finalize(&url[Position::BeforePath..Position::AfterQuery], &defaults, &mut wire);
        let head_only = request.method == "HEAD";

        if let Some(mut stream) = self.idle.remove(&authority) {
            debug!("reusing pooled connection to {}", authority);
            match exchange(&mut stream, &authority, &wire, head_only) {
                Ok((response, keep_alive)) => {
                    if keep_alive {
                        self.idle.insert(authority, stream);
                    }
                    return Ok(response);
                }
                Err(ClientError::ConnectionClosed) => {
                    debug!("pooled connection to {} was stale, reconnecting", authority);
                }
                Err(e) => return Err(e),
            }
        }

        debug!("connecting to {}", authority);
        let mut stream = TcpStream::connect(&authority).map_err(|source| ClientError::Connect {
            authority: authority.clone(),
            source,
        })?;
        let (response, keep_alive) = exchange(&mut stream, &authority, &wire, head_only)?;
        if keep_alive {
            self.idle.insert(authority, stream);
        }
        Ok(response)
    }
}

impl Default for HttpClient {
    fn default() -> HttpClient {
        HttpClient::new()
    }
}

/// Writes one request and reads one response. The flag says whether the
/// connection may carry another request.
fn exchange(
    stream: &mut TcpStream,
    authority: &str,
    wire: &[u8],
    head_only: bool,
) -> Result<(ClientResponse, bool), ClientError> {
    let io_err = |source: io::Error| ClientError::Io { authority: authority.to_string(), source };

    if let Err(e) = stream.write_all(wire).and_then(|_| stream.flush()) {
        return match e.kind() {
            io::ErrorKind::BrokenPipe | io::ErrorKind::ConnectionReset => Err(ClientError::ConnectionClosed),
            _ => Err(io_err(e)),
        };
    }

    let mut buf = BytesMut::with_capacity(READ_CHUNK);
    let (mut response, header_length, content_length, mut keep_alive) = loop {
        if fill(stream, &mut buf).map_err(io_err)? == 0 {
            return Err(if buf.is_empty() {
                ClientError::ConnectionClosed
            } else {
                ClientError::Truncated("the response head")
            });
        }
        if let Some(parsed) = parse_head(&buf)? {
            break parsed;
        }
    };
    buf.advance(header_length);

    let bodyless = head_only || response.status == 204 || response.status == 304 || response.status < 200;
    if bodyless {
        return Ok((response, keep_alive));
    }

    match content_length {
        Some(length) => {
            while buf.len() < length {
                if fill(stream, &mut buf).map_err(io_err)? == 0 {
                    return Err(ClientError::Truncated("the declared content length"));
                }
            }
            response.body = buf[..length].to_vec();
        }
        None => {
            while fill(stream, &mut buf).map_err(io_err)? != 0 {}
            response.body = buf.to_vec();
            keep_alive = false;
        }
    }

    debug!("received {} with {} body bytes from {}", response.status, response.body.len(), authority);
    Ok((response, keep_alive))
}

fn fill(stream: &mut TcpStream, buf: &mut BytesMut) -> io::Result<usize> {
    let mut chunk = [0u8; READ_CHUNK];
    loop {
        match stream.read(&mut chunk) {
            Ok(n) => {
                buf.extend_from_slice(&chunk[..n]);
                return Ok(n);
            }
            Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(ref e) if e.kind() == io::ErrorKind::ConnectionReset => return Ok(0),
            Err(e) => return Err(e),
        }
    }
}

/// Parses a response head. Returns the response without body, the head
/// length, the content length if declared and the keep-alive flag.
fn parse_head(buf: &[u8]) -> Result<Option<(ClientResponse, usize, Option<usize>, bool)>, ClientError> {
    let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
    let mut res = httparse::Response::new(&mut headers);

    let header_length = match res.parse(buf).map_err(ClientError::MalformedResponse)? {
        httparse::Status::Complete(offset) => offset,
        httparse::Status::Partial => return Ok(None),
    };

    let response = ClientResponse {
        status: res.code.unwrap_or_default(),
        reason: res.reason.unwrap_or_default().to_string(),
        headers: res.headers.iter().map(|h| Header::new(h.name, h.value)).collect(),
        body: Vec::new(),
    };

    if let Some(encoding) = response.header("Transfer-Encoding") {
        let encoding = String::from_utf8_lossy(encoding).trim().to_ascii_lowercase();
        if encoding != "identity" {
            return Err(ClientError::UnsupportedTransferEncoding(encoding));
        }
    }

    let content_length = match response.header("Content-Length") {
        Some(value) => Some(
            std::str::from_utf8(value)
                .ok()
                .and_then(|v| v.trim().parse::<usize>().ok())
                .ok_or(ClientError::MalformedResponse(httparse::Error::HeaderValue))?,
        ),
        None => None,
    };

    let connection = response.header("Connection").map(|v| String::from_utf8_lossy(v).to_ascii_lowercase());
    let keep_alive = match (res.version, connection.as_deref()) {
        (_, Some("close")) => false,
        (Some(0), Some("keep-alive")) => true,
        (Some(0), _) => false,
        _ => true,
    };

    Ok(Some((response, header_length, content_length, keep_alive)))
}
