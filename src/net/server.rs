//! Core connection pipeline shared by the file server and the proxy.
//!
//! This module implements the low-level runtime: accepting TCP
//! connections, optionally passing them through a [`ConnectionGate`],
//! reading one request per connection and handing it to a [`Service`].
//! What a GET or a POST means is entirely up to the service.
//!
//! ## Request handling flow
//!
//! 1. Accept a TCP connection (accept errors are logged, never fatal)
//! 2. Take a slot from the gate, if any; the accept loop waits while
//!    the gate is full
//! 3. Spawn a task that incrementally parses one request
//!    (delegated to [`Parser`]) and validates its head
//!    (delegated to [`Validator`])
//! 4. Dispatch on the method (delegated to [`handler::dispatch`])
//! 5. Close the connection and release the slot
//!
//! A client that leaves before sending anything gets nothing back; any
//! other parse failure and every [`ServiceError`] is answered with a
//! minimal error response.

use std::net::{Shutdown, SocketAddr};
use std::sync::Arc;

use async_std::io::{self, Read};
use async_std::net::{TcpListener, TcpStream};
use async_std::task;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::error::ServiceError;
use crate::handler::{self, Service};
use crate::http::parser::{Parser, ParserError, ParserOk};
use crate::http::request::HttpRequest;
use crate::http::status::HttpStatus;
use crate::http::validator::{Validator, ValidatorError};
use crate::net::gate::{ConnectionGate, ConnectionPermit};
use crate::net::io::{is_disconnect, read_with_deadline, send_error};

/// Why a connection ended without a request and without a response.
#[derive(Debug)]
pub enum Disconnect {
    /// EOF before the first byte.
    Eof,
    /// The peer reset or aborted the connection.
    Reset(io::Error),
    /// Nothing arrived within the read deadline.
    Idle,
}

impl std::fmt::Display for Disconnect {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Disconnect::Eof => f.write_str("closed before sending a request"),
            Disconnect::Reset(err) => write!(f, "connection reset: {}", err),
            Disconnect::Idle => f.write_str("idle past the read deadline"),
        }
    }
}

/// Errors that can occur while reading a request from the stream; each
/// one is answered with its status.
#[derive(Debug, Error)]
pub enum ReadError {
    #[error(transparent)]
    Parser(#[from] ParserError),
    #[error(transparent)]
    Validator(#[from] ValidatorError),
    #[error("connection closed in the middle of a request")]
    Truncated,
    #[error("timed out in the middle of a request")]
    TimedOut,
    #[error("read failed: {0}")]
    Io(io::Error),
}

impl ReadError {
    pub fn into_http_status(self) -> HttpStatus {
        match self {
            ReadError::Parser(err) => err.into_http_status(),
            ReadError::Validator(err) => err.into_http_status(),
            ReadError::Truncated | ReadError::Io(_) => HttpStatus::BadRequest,
            ReadError::TimedOut => HttpStatus::RequestTimeout,
        }
    }
}

/// Result of reading one request off a connection.
#[derive(Debug)]
pub enum ParseOutcome {
    Success(HttpRequest),
    /// The peer is gone; nothing must be written back.
    Benign(Disconnect),
    Malformed(ReadError),
}

/// Reads and incrementally parses one HTTP request.
///
/// The request head is validated as soon as it is complete, so an
/// oversized or unsupported body is refused before it is buffered.
pub async fn read_request<R>(stream: &mut R, config: &ServerConfig) -> ParseOutcome
where
    R: Read + Unpin + ?Sized,
{
    let mut parser = Parser::new(config.parser_limits());
    let validator = Validator::new(config.max_body_size);
    let mut req = HttpRequest::new();
    let mut buffer = vec![0; config.buffer_size.max(1)];

    loop {
        let n = match read_with_deadline(stream, &mut buffer, config.read_timeout).await {
            Ok(0) if !parser.has_started() => return ParseOutcome::Benign(Disconnect::Eof),
            Ok(0) => return ParseOutcome::Malformed(ReadError::Truncated),
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(e) if is_disconnect(&e) => return ParseOutcome::Benign(Disconnect::Reset(e)),
            Err(e) if e.kind() == io::ErrorKind::TimedOut => {
                if parser.has_started() {
                    return ParseOutcome::Malformed(ReadError::TimedOut);
                }
                return ParseOutcome::Benign(Disconnect::Idle);
            }
            Err(e) => return ParseOutcome::Malformed(ReadError::Io(e)),
        };

        // Feed newly read bytes into the parser.
        let mut progress = match parser.feed(&buffer[..n], &mut req) {
            Ok(progress) => progress,
            Err(err) => return ParseOutcome::Malformed(err.into()),
        };

        loop {
            match progress {
                ParserOk::Incomplete => break,
                ParserOk::HeadersDone => {
                    if let Err(err) = validator.validate_request(&req) {
                        return ParseOutcome::Malformed(err.into());
                    }
                    // Feeding an empty slice lets the parser move on to
                    // body bytes it already buffered.
                    progress = match parser.feed(&[], &mut req) {
                        Ok(progress) => progress,
                        Err(err) => return ParseOutcome::Malformed(err.into()),
                    };
                }
                ParserOk::Done => return ParseOutcome::Success(req),
            }
        }
    }
}

pub struct Server<S> {
    listener: TcpListener,
    service: Arc<S>,
    config: Arc<ServerConfig>,
    gate: Option<ConnectionGate>,
}

impl<S: Service> Server<S> {
    /// Binds the listener described by `config`. The gate capacity comes
    /// from `config.max_connections`; `None` admits every connection.
    pub async fn bind(config: Arc<ServerConfig>, service: S) -> io::Result<Self> {
        let listener = TcpListener::bind(config.socket_addr()).await?;
        let gate = config.max_connections.map(ConnectionGate::new);

        info!(
            address = %listener.local_addr()?,
            max_connections = ?config.max_connections,
            "listener bound"
        );

        Ok(Self {
            listener,
            service: Arc::new(service),
            config,
            gate,
        })
    }

    pub fn local_addr(&self) -> io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn gate(&self) -> Option<&ConnectionGate> {
        self.gate.as_ref()
    }

    /// Runs the accept loop forever, spawning one task per connection.
    pub async fn run(self) -> io::Result<()> {
        loop {
            let (stream, peer) = match self.listener.accept().await {
                Ok(accepted) => accepted,
                Err(err) => {
                    warn!(error = %err, "failed to accept connection");
                    continue;
                }
            };

            let permit = match &self.gate {
                Some(gate) => Some(gate.acquire().await),
                None => None,
            };

            task::spawn(Self::handle_client(
                stream,
                peer,
                Arc::clone(&self.service),
                Arc::clone(&self.config),
                permit,
            ));
        }
    }

    /// Handles a single client connection: one request, one response,
    /// then close. The permit is dropped last, releasing the slot.
    async fn handle_client(
        mut stream: TcpStream,
        peer: SocketAddr,
        service: Arc<S>,
        config: Arc<ServerConfig>,
        permit: Option<ConnectionPermit>,
    ) {
        debug!(%peer, "handling new connection");

        match read_request(&mut stream, &config).await {
            ParseOutcome::Success(req) => {
                info!(%peer, method = %req.method, target = %req.uri, "request");
                if let Err(err) = handler::dispatch(service.as_ref(), &req, &mut stream).await {
                    let (status, reason) = err.http_status();
                    log_service_error(peer, &err, status);
                    send_error(&mut stream, status, reason, config.write_timeout).await;
                }
            }
            ParseOutcome::Benign(reason) => {
                debug!(%peer, %reason, "no request received");
            }
            ParseOutcome::Malformed(err) => {
                warn!(%peer, error = %err, "failed to parse request");
                let status = err.into_http_status();
                send_error(&mut stream, status, status.reason(), config.write_timeout).await;
            }
        }

        if let Err(err) = stream.shutdown(Shutdown::Both) {
            if err.kind() != io::ErrorKind::NotConnected {
                debug!(%peer, error = %err, "shutdown failed");
            }
        }
        drop(stream);
        drop(permit);
        debug!(%peer, "connection closed");
    }
}

fn log_service_error(peer: SocketAddr, err: &ServiceError, status: HttpStatus) {
    match status.code() {
        500..=599 => warn!(%peer, error = %err, status = status.code(), "request failed"),
        _ => info!(%peer, error = %err, status = status.code(), "request rejected"),
    }
}
