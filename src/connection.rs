use std::io::{self, Read, Write};
use std::str::FromStr;

use bytes::{Buf, BytesMut};
use mio::event::Event;
use mio::net::TcpStream;

use crate::{request, response, server};

const MAX_HEADERS: usize = 50;
const READ_CHUNK: usize = 4096;

pub struct Connection {
    incoming_buf: BytesMut,
    outgoing_buf: BytesMut,
    close_after_write: bool,
    pub state: State,
    pub stream: TcpStream,
    token: mio::Token,
}

impl Connection {
    pub fn server(stream: TcpStream, token: mio::Token) -> Connection {
        Connection {
            stream,
            incoming_buf: BytesMut::with_capacity(READ_CHUNK),
            outgoing_buf: BytesMut::with_capacity(READ_CHUNK),
            close_after_write: false,
            state: State::Reading,
            token,
        }
    }

    pub fn ready(&mut self, event: &Event, handler: &dyn server::Handler) {
        match self.state {
            State::Reading if event.is_readable() || event.is_read_closed() => self.read(handler),
            State::Writing if event.is_writable() || event.is_write_closed() => self.write(),
            _ => debug!("{:?}: ignoring event in state {:?}; event={:?}", self.token, self.state, event),
        }
    }

    fn read(&mut self, handler: &dyn server::Handler) {
        let mut chunk = [0u8; READ_CHUNK];
        let mut peer_closed = false;

        loop {
            match self.stream.read(&mut chunk) {
                Ok(0) => {
                    peer_closed = true;
                    break;
                }
                Ok(n) => {
                    debug!(
                        "{:?}: read bytes={} buf={}", self.token, n,
                        String::from_utf8_lossy(&chunk[..n]));
                    self.incoming_buf.extend_from_slice(&chunk[..n]);
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("got an error trying to read; err={:?}", e);
                    self.state = State::Closed;
                    return;
                }
            }
        }

        self.parse_requests(handler);

        if peer_closed {
            if !self.incoming_buf.is_empty() && !self.close_after_write {
                warn!("{:?}: peer closed with a partial request; buffered={}", self.token, self.incoming_buf.len());
                self.reject("Incomplete request");
            }
            self.close_after_write = true;
        }

        if !self.outgoing_buf.is_empty() {
            self.state = State::Writing;
            self.write();
        } else if peer_closed {
            self.state = State::Closed;
        }
    }

    fn write(&mut self) {
        while !self.outgoing_buf.is_empty() {
            match self.stream.write(&self.outgoing_buf) {
                Ok(0) => {
                    warn!("{:?}: wrote 0 bytes, closing", self.token);
                    self.state = State::Closed;
                    return;
                }
                Ok(n) => self.outgoing_buf.advance(n),
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => {
                    debug!("{:?}: not actually ready to write", self.token);
                    return;
                }
                Err(ref e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => {
                    error!("got an error trying to write; err={:?}", e);
                    self.state = State::Closed;
                    return;
                }
            }
        }

        debug!("{:?}: finished writing response", self.token);
        self.state = if self.close_after_write { State::Closed } else { State::Reading };
    }

    /// Handles every complete request in the buffer. Partial input stays
    /// buffered until the next read.
    fn parse_requests(&mut self, handler: &dyn server::Handler) {
        while !self.incoming_buf.is_empty() && !self.close_after_write {
            let mut headers = [httparse::EMPTY_HEADER; MAX_HEADERS];
            let mut req = httparse::Request::new(&mut headers);

            let header_length = match req.parse(&self.incoming_buf) {
                Ok(httparse::Status::Complete(offset)) => offset,
                Ok(httparse::Status::Partial) => {
                    debug!("{:?}: partial headers parsed", self.token);
                    return;
                }
                Err(e) => {
                    error!("{:?}: parse error={:?}", self.token, e);
                    self.reject("Malformed request");
                    return;
                }
            };

            if req.headers.iter().any(|h| h.name.eq_ignore_ascii_case("Transfer-Encoding")) {
                self.reject("Transfer-Encoding is not supported");
                return;
            }

            let content_length = match Connection::get_content_length(req.headers) {
                Ok(length) => length.unwrap_or(0),
                Err(()) => {
                    self.reject("Invalid Content-Length");
                    return;
                }
            };

            if header_length + content_length > self.incoming_buf.len() {
                debug!(
                    "Read complete headers, still waiting for body read={} content_length={}",
                    self.incoming_buf.len(), content_length);
                return;
            }

            let body_end = header_length + content_length;
            let request = request::Request::from_httparse(&req, &self.incoming_buf[header_length..body_end]);
            let close = wants_close(req.version, &request);
            self.incoming_buf.advance(body_end);

            let mut res = response::Response::new();
            handler.handle(&request, &mut res);
            if close {
                res.add_header("Connection", b"close");
                self.close_after_write = true;
            }
            self.queue(res);
        }
    }

    fn reject(&mut self, msg: &str) {
        let mut res = response::Response::bad_request(Some(msg));
        res.add_header("Connection", b"close");
        self.queue(res);
        self.incoming_buf.clear();
        self.close_after_write = true;
    }

    fn queue(&mut self, mut res: response::Response) {
        let mut buf = Vec::with_capacity(READ_CHUNK);
        res.finalize(&mut buf);
        self.outgoing_buf.extend_from_slice(&buf);
    }

    pub fn get_content_length(headers: &[httparse::Header]) -> Result<Option<usize>, ()> {
        match headers.iter().find(|h| h.name.eq_ignore_ascii_case("Content-Length")) {
            Some(header) => std::str::from_utf8(header.value)
                .ok()
                .and_then(|v| usize::from_str(v.trim()).ok())
                .map(Some)
                .ok_or(()),
            None => Ok(None),
        }
    }
}

fn wants_close(version: Option<u8>, request: &request::Request) -> bool {
    let connection = request.header("Connection").map(|v| String::from_utf8_lossy(v).to_ascii_lowercase());
    match (version, connection.as_deref()) {
        (_, Some("close")) => true,
        (Some(0), Some("keep-alive")) => false,
        (Some(0), _) => true,
        _ => false,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum State {
    Reading,
    Writing,
    Closed,
}
