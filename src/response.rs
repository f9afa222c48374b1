use crate::request::{self, Header};
use crate::status;

const INITIAL_BODY_SIZE: usize = 4096;
const INITIAL_HEADER_COUNT: usize = 16;

#[derive(Debug)]
pub struct Response {
    code: Option<status::Code>,
    headers: Vec<Header>,
    body: Vec<u8>,
}

impl Response {
    pub fn new() -> Response {
        Response {
            code: None,
            headers: Vec::with_capacity(INITIAL_HEADER_COUNT),
            body: Vec::with_capacity(INITIAL_BODY_SIZE),
        }
    }

    pub fn bad_request(msg: Option<&str>) -> Response {
        Response::plain(status::Code::BadRequest400, msg)
    }

    pub fn not_found(msg: Option<&str>) -> Response {
        Response::plain(status::Code::NotFound404, msg)
    }

    fn plain(code: status::Code, msg: Option<&str>) -> Response {
        Response {
            code: Some(code),
            headers: vec![Header::new("Content-Type", b"text/plain")],
            body: msg.map_or(vec![], |m| m.as_bytes().to_vec()),
        }
    }

    pub fn code(&self) -> Option<status::Code> {
        self.code
    }

    pub fn set_code(&mut self, code: status::Code) {
        self.code = Some(code);
    }

    /// Sets a header, replacing any previous value with the same name.
    pub fn add_header(&mut self, name: &str, value: &[u8]) {
        self.headers.retain(|h| !h.name.eq_ignore_ascii_case(name));
        self.headers.push(Header::new(name, value));
    }

    pub fn header(&self, name: &str) -> Option<&[u8]> {
        request::find(&self.headers, name).map(|h| &h.value[..])
    }

    pub fn add_body(&mut self, body: &[u8]) {
        self.body.extend_from_slice(body);
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn finalize(&mut self, buf: &mut Vec<u8>) {
        let code = *self.code.get_or_insert(status::Code::InternalServerError500);

        let date = time::OffsetDateTime::now_utc()
            .format(time::macros::format_description!(
                "[weekday repr:short], [day] [month repr:short] [year] [hour]:[minute]:[second] GMT"))
            .unwrap_or_default();
        let preamble = format!(
            "HTTP/1.1 {}\r\nDate: {}\r\nContent-Length: {}\r\n",
            code,
            date,
            self.body.len());

        buf.extend_from_slice(preamble.as_bytes());

        for header in self.headers.iter() {
            buf.extend_from_slice(header.name.as_bytes());
            buf.extend_from_slice(b": ");
            buf.extend_from_slice(&header.value);
            buf.extend_from_slice(b"\r\n");
        }
        buf.extend_from_slice(b"\r\n");

        buf.append(&mut self.body);
    }
}

impl Default for Response {
    fn default() -> Response {
        Response::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn finalized(mut res: Response) -> String {
        let mut buf = Vec::new();
        res.finalize(&mut buf);
        String::from_utf8(buf).unwrap()
    }

    #[test]
    fn unset_code_becomes_server_error() {
        let out = finalized(Response::new());
        assert!(out.starts_with("HTTP/1.1 500 Internal Server Error\r\n"), "{}", out);
        assert!(out.contains("\r\nContent-Length: 0\r\n"));
    }

    #[test]
    fn bad_request_carries_message() {
        let out = finalized(Response::bad_request(Some("Incomplete request")));
        assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"));
        assert!(out.contains("Content-Type: text/plain\r\n"));
        assert!(out.ends_with("\r\n\r\nIncomplete request"));
    }

    #[test]
    fn add_header_replaces_same_name() {
        let mut res = Response::new();
        res.add_header("Service-Name", b"one");
        res.add_header("service-name", b"Demo");
        assert_eq!(res.header("SERVICE-NAME"), Some(&b"Demo"[..]));

        res.set_code(status::Code::Ok200);
        res.add_body(b"Hello");
        let out = finalized(res);
        assert_eq!(out.matches("ervice-").count(), 1);
        assert!(out.contains("Content-Length: 5\r\n"));
    }
}
