const INITIAL_BODY_SIZE: usize = 4096;
const INITIAL_HEADER_COUNT: usize = 16;

/// A single header line. Values are kept as raw bytes; names are compared
/// case-insensitively wherever they are looked up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub name: String,
    pub value: Vec<u8>,
}

impl Header {
    pub fn new(name: &str, value: &[u8]) -> Header {
        Header {
            name: name.to_string(),
            value: value.to_vec(),
        }
    }
}

/// Finds the first header called `name`, ignoring ASCII case.
pub fn find<'h>(headers: &'h [Header], name: &str) -> Option<&'h Header> {
    headers.iter().find(|h| h.name.eq_ignore_ascii_case(name))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Request {
    pub method: String,
    /// Origin-form path for requests received by the server, absolute URL
    /// for requests handed to the client.
    pub target: String,
    pub headers: Vec<Header>,
    pub body: Vec<u8>,
}

impl Request {
    pub fn from_httparse(req: &httparse::Request, body: &[u8]) -> Request {
        Request {
            method: req.method.unwrap_or_default().to_string(),
            target: req.path.unwrap_or_default().to_string(),
            headers: req.headers.iter().map(|h| Header::new(h.name, h.value)).collect(),
            body: body.to_vec(),
        }
    }

    pub fn new(method: &str, target: &str) -> Request {
        Request {
            method: method.to_string(),
            target: target.to_string(),
            headers: Vec::with_capacity(INITIAL_HEADER_COUNT),
            body: Vec::with_capacity(INITIAL_BODY_SIZE),
        }
    }

    pub fn add_header(&mut self, name: &str, value: &[u8]) {
        self.headers.push(Header::new(name, value));
    }

    /// Replaces every existing header called `name` with a single value.
    pub fn set_header(&mut self, name: &str, value: &[u8]) {
        self.headers.retain(|h| !h.name.eq_ignore_ascii_case(name));
        self.add_header(name, value);
    }

    pub fn add_body(&mut self, body: &[u8]) {
        self.body.extend_from_slice(body);
    }

    pub fn header(&self, name: &str) -> Option<&[u8]> {
        find(&self.headers, name).map(|h| &h.value[..])
    }

    /// The target without its query string.
    pub fn path(&self) -> &str {
        match self.target.find('?') {
            Some(idx) => &self.target[..idx],
            None => &self.target,
        }
    }

    /// Encodes the request for the wire. `defaults` are only written when the
    /// request does not carry a header of the same name.
    pub fn finalize(&self, request_target: &str, defaults: &[Header], buf: &mut Vec<u8>) {
        buf.extend_from_slice(
            format!("{} {} HTTP/1.1\r\n", self.method, request_target).as_bytes());

        for header in defaults.iter().filter(|d| self.header(&d.name).is_none()) {
            write_header(header, buf);
        }
        for header in self.headers.iter() {
            write_header(header, buf);
        }

        let wants_length = !self.body.is_empty() || self.method == "POST" || self.method == "PUT";
        if wants_length && self.header("Content-Length").is_none() {
            buf.extend_from_slice(format!("Content-Length: {}\r\n", self.body.len()).as_bytes());
        }
        buf.extend_from_slice(b"\r\n");
        buf.extend_from_slice(&self.body);
    }
}

fn write_header(header: &Header, buf: &mut Vec<u8>) {
    buf.extend_from_slice(header.name.as_bytes());
    buf.extend_from_slice(b": ");
    buf.extend_from_slice(&header.value);
    buf.extend_from_slice(b"\r\n");
}
