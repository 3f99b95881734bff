//! A concurrency-bounded static file server and a forwarding HTTP/1.1
//! proxy built on one shared connection pipeline.
//!
//! Both programs run [`net::server::Server`]: accept, gate, parse,
//! dispatch, close. They differ only in the [`handler::Service`] they
//! plug in: [`handler::StaticFiles`] for GET/POST on local files, and
//! [`proxy::Forwarder`] for relaying GET requests upstream.

pub mod config;
pub mod error;
pub mod handler;
pub mod http;
pub mod logging;
pub mod net;
pub mod proxy;
