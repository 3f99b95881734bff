//! Per-connection failure taxonomy.
//!
//! Every variant is resolved at the connection boundary: the pipeline
//! turns it into a synthesized error response (or, for variants raised
//! after bytes already reached the client, only a log line). None of
//! them ever terminates the process.

use thiserror::Error;

use crate::http::status::HttpStatus;

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("method {0} is not implemented")]
    UnsupportedMethod(String),

    #[error("request carries no target host")]
    MissingHost,

    #[error("invalid target authority {0:?}")]
    InvalidAuthority(String),

    #[error("could not connect to {upstream}: {source}")]
    UpstreamConnect {
        upstream: String,
        source: std::io::Error,
    },

    #[error("error writing to {upstream}: {source}")]
    UpstreamWrite {
        upstream: String,
        source: std::io::Error,
    },

    #[error("error reading from {upstream}: {source}")]
    UpstreamRead {
        upstream: String,
        source: std::io::Error,
    },

    #[error("{upstream} did not answer in time")]
    UpstreamTimeout { upstream: String },

    #[error("unsupported file type {0:?}")]
    UnsupportedFileType(String),

    #[error("file not found: {0}")]
    FileNotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl ServiceError {
    /// Status code and reason phrase sent to the client.
    pub fn http_status(&self) -> (HttpStatus, &'static str) {
        match self {
            ServiceError::UnsupportedMethod(_) => (HttpStatus::NotImplemented, "Not Implemented"),
            ServiceError::MissingHost => {
                (HttpStatus::BadRequest, "Bad Request: Missing host in request")
            }
            ServiceError::InvalidAuthority(_) => {
                (HttpStatus::BadRequest, "Bad Request: Invalid host in request")
            }
            ServiceError::UpstreamConnect { .. } => {
                (HttpStatus::BadGateway, "Bad Gateway: Could not connect to host")
            }
            ServiceError::UpstreamWrite { .. } => {
                (HttpStatus::BadGateway, "Bad Gateway: Error writing to remote")
            }
            ServiceError::UpstreamRead { .. } => {
                (HttpStatus::BadGateway, "Bad Gateway: Error reading from remote")
            }
            ServiceError::UpstreamTimeout { .. } => (HttpStatus::GatewayTimeout, "Gateway Timeout"),
            ServiceError::UnsupportedFileType(_) => {
                (HttpStatus::BadRequest, "Bad Request: Unsupported file type")
            }
            ServiceError::FileNotFound(_) => (HttpStatus::NotFound, "Not Found"),
            ServiceError::Io(_) => (HttpStatus::InternalServerError, "Internal Server Error"),
        }
    }
}
