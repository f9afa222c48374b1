use std::collections::HashMap;
use std::io;
use std::net::SocketAddr;

use mio::net::TcpListener;
use mio::{Events, Interest, Poll, Token};

use crate::connection::{Connection, State};
use crate::{request, response};

const SERVER: Token = Token(0);
const CONNECTIONS_START: usize = 1;
const EVENTS_CAPACITY: usize = 1024;

/// A handler that can handle incoming requests for a server.
pub trait Handler: Sync + Send {
    /// Receives a `Request`/`Response` pair, and should perform some action on them.
    ///
    /// This could be reading from the request, and writing to the response.
    fn handle(&self, request: &request::Request, response: &mut response::Response);

    /// This is run after a connection is received, on a per-connection basis (not a
    /// per-request basis, as a connection with keep-alive may handle multiple
    /// requests)
    fn on_connection_start(&self) { }

    /// This is run before a connection is closed, on a per-connection basis (not a
    /// per-request basis, as a connection with keep-alive may handle multiple
    /// requests)
    fn on_connection_end(&self) { }
}

impl<F> Handler for F where F: Fn(&request::Request, &mut response::Response), F: Sync + Send {
    fn handle(&self, req: &request::Request, res: &mut response::Response) {
        self(req, res)
    }
}

pub struct HttpServer<H> {
    server: TcpListener,
    poll: Poll,
    connections: HashMap<Token, Connection>,
    next_token: usize,
    handler: H,
}

impl<H: Handler> HttpServer<H> {
    pub fn bind(address: SocketAddr, handler: H) -> io::Result<HttpServer<H>> {
        let mut server = TcpListener::bind(address)?;
        let poll = Poll::new()?;
        poll.registry().register(&mut server, SERVER, Interest::READABLE)?;

        Ok(HttpServer {
            server,
            poll,
            connections: HashMap::new(),
            next_token: CONNECTIONS_START,
            handler,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.server.local_addr()
    }

    /// Runs the event loop on the current thread. Only returns on a fatal
    /// polling or accept error.
    pub fn run(&mut self) -> io::Result<()> {
        let mut events = Events::with_capacity(EVENTS_CAPACITY);

        loop {
            if let Err(e) = self.poll.poll(&mut events, None) {
                if e.kind() == io::ErrorKind::Interrupted {
                    continue;
                }
                return Err(e);
            }

            for event in events.iter() {
                match event.token() {
                    SERVER => self.accept()?,
                    token => self.ready(token, event),
                }
            }
        }
    }

    fn accept(&mut self) -> io::Result<()> {
        loop {
            match self.server.accept() {
                Ok((mut stream, addr)) => {
                    debug!("accepted a new connection from {}", addr);

                    let token = Token(self.next_token);
                    self.next_token += 1;
                    self.poll.registry().register(&mut stream, token, Interest::READABLE)?;
                    self.connections.insert(token, Connection::server(stream, token));
                    self.handler.on_connection_start();
                }
                Err(ref e) if e.kind() == io::ErrorKind::WouldBlock => return Ok(()),
                Err(ref e) if e.kind() == io::ErrorKind::ConnectionAborted => {
                    warn!("connection aborted before it was accepted");
                }
                Err(e) => {
                    error!("encountered error while accepting connection; err={:?}", e);
                    return Err(e);
                }
            }
        }
    }

    fn ready(&mut self, token: Token, event: &mio::event::Event) {
        let connection = match self.connections.get_mut(&token) {
            Some(connection) => connection,
            None => {
                debug!("{:?}: event for a connection that is already gone", token);
                return;
            }
        };

        debug!("{:?}: server connection is ready; event={:?}", token, event);
        connection.ready(event, &self.handler);

        let registry = self.poll.registry();
        let reregistered = match connection.state {
            State::Reading => registry.reregister(&mut connection.stream, token, Interest::READABLE),
            State::Writing => registry.reregister(&mut connection.stream, token, Interest::WRITABLE),
            State::Closed => Err(io::ErrorKind::NotConnected.into()),
        };

        if let Err(e) = reregistered {
            if e.kind() != io::ErrorKind::NotConnected {
                warn!("{:?}: failed to reregister connection; err={:?}", token, e);
            }
            if let Some(mut connection) = self.connections.remove(&token) {
                let _ = registry.deregister(&mut connection.stream);
                self.handler.on_connection_end();
            }
        }
    }
}

pub fn start<H: Handler>(address: SocketAddr, handler: H) -> io::Result<()> {
    let mut http_server = HttpServer::bind(address, handler)?;
    info!("Listening for HTTP on {}", http_server.local_addr()?);
    http_server.run()
}
