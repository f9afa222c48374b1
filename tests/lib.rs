extern crate httpcheck;

use std::io::{Read, Write};
use std::net::{SocketAddr, TcpStream};
use std::path::PathBuf;
use std::{fs, thread};

use httpcheck::client::HttpClient;
use httpcheck::config::RunnerConfig;
use httpcheck::demo::{self, DemoService};
use httpcheck::request::Request;
use httpcheck::server::HttpServer;
use httpcheck::{response, runner};

fn spawn_demo() -> SocketAddr {
    let mut server = HttpServer::bind("127.0.0.1:0".parse().unwrap(), DemoService).unwrap();
    let addr = server.local_addr().unwrap();
    thread::spawn(move || server.run());
    addr
}

fn raw_exchange(addr: SocketAddr, wire: &[u8]) -> String {
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(wire).unwrap();
    let mut out = String::new();
    stream.read_to_string(&mut out).unwrap();
    out
}

fn hello(addr: SocketAddr, accept: &[u8]) -> Request {
    let mut req = Request::new("GET", &format!("http://{}/hello", addr));
    req.add_header("Accept", accept);
    req
}

#[test]
fn demo_greets_over_the_wire() {
    let addr = spawn_demo();
    let mut client = HttpClient::new();

    let res = client.send(&hello(addr, b"text/plain")).unwrap();
    assert_eq!(res.status, 200);
    assert_eq!(res.body_text(), demo::GREETING);
    assert_eq!(res.header("request-id"), Some(demo::REQUEST_ID.as_bytes()));
    assert_eq!(res.header("service-name"), Some(demo::SERVICE_NAME.as_bytes()));
    assert!(res.header("date").is_some());

    // Second request reuses the pooled keep-alive connection.
    let res = client.send(&hello(addr, b"application/json")).unwrap();
    assert_eq!(res.status, 400);
    assert_eq!(res.body_text(), demo::ACCEPT_ERROR);
    assert_eq!(res.header("service-name"), Some(demo::SERVICE_NAME.as_bytes()));
}

#[test]
fn closure_handlers_serve_requests() {
    let handler = |req: &Request, res: &mut response::Response| {
        res.set_code(httpcheck::status::Code::Ok200);
        res.add_header("Content-Type", b"text/plain");
        res.add_body(&req.body);
    };
    let mut server = HttpServer::bind("127.0.0.1:0".parse().unwrap(), handler).unwrap();
    let addr = server.local_addr().unwrap();
    thread::spawn(move || server.run());

    let mut req = Request::new("POST", &format!("http://{}/echo", addr));
    req.add_body(b"boom");
    let res = HttpClient::new().send(&req).unwrap();
    assert_eq!(res.status, 200);
    assert_eq!(res.body, b"boom".to_vec());
}

#[test]
fn pipelined_requests_are_answered_in_order() {
    let addr = spawn_demo();
    let out = raw_exchange(
        addr,
        b"GET /hello HTTP/1.1\r\nAccept: text/plain\r\n\r\n\
          GET /nope HTTP/1.1\r\nConnection: close\r\n\r\n");

    let first = out.find("HTTP/1.1 200 OK").unwrap();
    let second = out.find("HTTP/1.1 404 Not Found").unwrap();
    assert!(first < second);
    assert!(out.ends_with(demo::NOT_FOUND));
}

#[test]
fn malformed_requests_get_bad_request() {
    let addr = spawn_demo();
    let out = raw_exchange(addr, b"GET /hello HTTP/1.1\r\nBad Header Line\r\n\r\n");
    assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{}", out);
    assert!(out.ends_with("Malformed request"));
}

#[test]
fn truncated_requests_get_bad_request() {
    let addr = spawn_demo();
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(b"POST /hello HTTP/1.1\r\nContent-Length: 10\r\n\r\nabc").unwrap();
    stream.shutdown(std::net::Shutdown::Write).unwrap();

    let mut out = String::new();
    stream.read_to_string(&mut out).unwrap();
    assert!(out.starts_with("HTTP/1.1 400 Bad Request\r\n"), "{}", out);
    assert!(out.ends_with("Incomplete request"));
}

#[test]
fn runner_reports_against_live_demo() {
    let addr = spawn_demo();
    let dir = tempfile::tempdir().unwrap();
    let pass = dir.path().join("pass.http");
    let fail = dir.path().join("fail.http");
    fs::write(&pass, "GET /hello\nAccept:text/plain\n\nHTTP/1.1 200 OK\n\nHello, World!\n").unwrap();
    fs::write(&fail, "GET /hello\nAccept:application/json\n\nHTTP/1.1 200 OK\n\nHello, World!\n").unwrap();
    fs::write(dir.path().join("ignored.txt"), "PATCH nonsense").unwrap();

    let config = RunnerConfig {
        tests: dir.path().to_path_buf(),
        pattern: "*.http".to_string(),
        base_url: format!("http://{}", addr),
    };
    let mut out = Vec::new();
    let summary = runner::run(&config, &mut out).unwrap();
    assert_eq!(summary, runner::Summary { passed: 1, failed: 1 });

    let text = String::from_utf8(out).unwrap();
    assert!(text.contains(&format!("✓ API:{}\n", pass.display())));
    assert!(text.contains(&format!(
        "✘ {}: Failed because 'Incorrect status code'\n\tExpected: '200'\n\tActual: '400'\n",
        fail.display())));
    assert!(text.ends_with("\n\n1 Errors caught\n"));
}

#[test]
fn bundled_fixtures_pass_against_demo() {
    let addr = spawn_demo();
    let config = RunnerConfig {
        tests: PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data"),
        pattern: "*.http".to_string(),
        base_url: format!("http://{}", addr),
    };
    let mut out = Vec::new();
    let summary = runner::run(&config, &mut out).unwrap();
    assert!(summary.success(), "{}", String::from_utf8_lossy(&out));
    assert_eq!(summary.passed, 3);
}

#[test]
fn close_request_with_trailing_bytes_gets_one_response() {
    let addr = spawn_demo();
    let mut stream = TcpStream::connect(addr).unwrap();
    stream.write_all(b"GET /hello HTTP/1.1\r\nAccept: text/plain\r\nConnection: close\r\n\r\nGET /hel").unwrap();
    stream.shutdown(std::net::Shutdown::Write).unwrap();

    let mut out = String::new();
    stream.read_to_string(&mut out).unwrap();
    assert_eq!(out.matches("HTTP/1.1 ").count(), 1, "{}", out);
    assert!(out.starts_with("HTTP/1.1 200 OK\r\n"));
    assert!(out.ends_with(demo::GREETING));
}
