//! Forwarding of GET requests to their origin server.
//!
//! One upstream connection per client request. The outgoing request is
//! rewritten to origin-form with `Connection: close`, so the upstream
//! ends its response by closing; the response is then relayed to the
//! client byte for byte until that EOF.

use std::sync::Arc;

use async_std::io;
use async_std::net::TcpStream;
use async_trait::async_trait;
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::error::ServiceError;
use crate::handler::Service;
use crate::http::request::HttpRequest;
use crate::net::io::{CopySide, copy_with_deadlines, write_with_deadline};
use crate::proxy::target::ProxyTarget;

/// Headers that only concern the client-to-proxy hop.
const HOP_HEADERS: [&str; 2] = ["Proxy-Connection", "Keep-Alive"];

pub struct Forwarder {
    config: Arc<ServerConfig>,
}

impl Forwarder {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self { config }
    }

    async fn connect(&self, target: &ProxyTarget) -> Result<TcpStream, ServiceError> {
        let upstream = target.to_string();
        let dial = TcpStream::connect((target.host.as_str(), target.port));

        match io::timeout(self.config.connect_timeout, dial).await {
            Ok(stream) => Ok(stream),
            Err(err) if err.kind() == io::ErrorKind::TimedOut => {
                Err(ServiceError::UpstreamTimeout { upstream })
            }
            Err(source) => Err(ServiceError::UpstreamConnect { upstream, source }),
        }
    }

    pub async fn forward(&self, req: &HttpRequest, client: &mut TcpStream) -> Result<(), ServiceError> {
        let target = ProxyTarget::resolve(req)?;
        let upstream_name = target.to_string();
        info!(upstream = %upstream_name, target = %req.uri, "proxying request");

        let mut upstream = self.connect(&target).await?;

        let outgoing = rewrite_request(req, &target);
        write_with_deadline(&mut upstream, &outgoing, self.config.write_timeout)
            .await
            .map_err(|source| ServiceError::UpstreamWrite {
                upstream: upstream_name.clone(),
                source,
            })?;

        let relayed = copy_with_deadlines(
            &mut upstream,
            client,
            self.config.buffer_size,
            self.config.read_timeout,
            self.config.write_timeout,
        )
        .await;

        match relayed {
            Ok(bytes) => {
                info!(upstream = %upstream_name, bytes, "relayed response");
            }
            // Nothing reached the client yet, so it can still get a proper error
            Err(err) if err.copied == 0 && err.side == CopySide::Read => {
                return Err(match err.source.kind() {
                    io::ErrorKind::TimedOut => ServiceError::UpstreamTimeout {
                        upstream: upstream_name,
                    },
                    _ => ServiceError::UpstreamRead {
                        upstream: upstream_name,
                        source: err.source,
                    },
                });
            }
            Err(err) => {
                warn!(
                    upstream = %upstream_name,
                    bytes = err.copied,
                    side = %err.side,
                    error = %err.source,
                    "response relay interrupted"
                );
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Service for Forwarder {
    async fn get(&self, req: &HttpRequest, client: &mut TcpStream) -> Result<(), ServiceError> {
        self.forward(req, client).await
    }
}

/// Serializes the request as sent upstream: origin-form target, hop
/// headers dropped, `Host` naming the addressed authority and
/// `Connection: close`. The body is forwarded unchanged.
pub fn rewrite_request(req: &HttpRequest, target: &ProxyTarget) -> Vec<u8> {
    let mut headers = req.headers.clone();
    for name in HOP_HEADERS {
        headers.remove(name);
    }
    if req.target.authority().is_some() || !headers.contains("Host") {
        headers.set_raw("Host", &target.authority);
    }
    headers.set_raw("Connection", "close");

    let mut out = format!(
        "{} {} HTTP/1.1\r\n{}\r\n",
        req.method,
        req.target.origin_form(),
        headers.stringify()
    )
    .into_bytes();
    out.extend_from_slice(&req.body);
    out
}
