//! The demo service: a single `GET /hello` route that insists on
//! `Accept: text/plain`. Used as a manual target for fixture runs.

use crate::server::Handler;
use crate::{request, response, status};

pub const REQUEST_ID: &str = "Some-Request-ID";
pub const SERVICE_NAME: &str = "Demo";
pub const GREETING: &str = "Hello, World!";
pub const ACCEPT_ERROR: &str = "Must set accept to text/plain";
pub const NOT_FOUND: &str = "404 page not found";

const TEXT_PLAIN: &[u8] = b"text/plain; charset=utf-8";

pub struct DemoService;

impl Handler for DemoService {
    fn handle(&self, req: &request::Request, res: &mut response::Response) {
        debug!("{} {}", req.method, req.target);

        if req.path() != "/hello" {
            *res = response::Response::not_found(Some(NOT_FOUND));
            res.add_header("Content-Type", TEXT_PLAIN);
            return;
        }
        if req.method != "GET" {
            res.set_code(status::Code::MethodNotAllowed405);
            res.add_header("Allow", b"GET");
            return;
        }

        res.add_header("Request-Id", REQUEST_ID.as_bytes());
        res.add_header("Service-Name", SERVICE_NAME.as_bytes());
        res.add_header("Content-Type", TEXT_PLAIN);

        if req.header("Accept") != Some(&b"text/plain"[..]) {
            res.set_code(status::Code::BadRequest400);
            res.add_body(ACCEPT_ERROR.as_bytes());
            return;
        }
        res.set_code(status::Code::Ok200);
        res.add_body(GREETING.as_bytes());
    }
}
