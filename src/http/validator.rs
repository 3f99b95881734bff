use thiserror::Error;

use crate::http::HttpMethod;
use crate::http::HttpVersion;
use crate::http::request::HttpRequest;
use crate::http::status::HttpStatus;

#[derive(Debug, Error, PartialEq)]
pub enum ValidatorError {
    #[error("unsupported HTTP version {0}.{1}")]
    HttpVersionNotSupported(u8, u8),
    #[error("body of {0} bytes exceeds the configured limit")]
    PayloadTooLarge(usize),
    #[error("transfer-coded request bodies are not supported")]
    MissingContentLength,
    #[error("{0} does not accept a request body")]
    BodyNotAllowed(&'static str),
}

impl ValidatorError {
    pub fn into_http_status(self) -> HttpStatus {
        match self {
            ValidatorError::HttpVersionNotSupported(..) => HttpStatus::HttpVersionNotSupported,
            ValidatorError::PayloadTooLarge(_) => HttpStatus::PayloadTooLarge,
            ValidatorError::MissingContentLength => HttpStatus::LengthRequired,
            ValidatorError::BodyNotAllowed(_) => HttpStatus::BadRequest,
        }
    }
}

/// Semantic checks run once the request head is complete, before any
/// body byte is buffered.
pub struct Validator {
    max_body_size: usize,
}

impl Validator {
    pub fn new(max_body_size: usize) -> Self {
        Self { max_body_size }
    }

    fn validate_http_version(v: (u8, u8)) -> Result<(), ValidatorError> {
        match HttpVersion::is_valid(v) {
            Ok(HttpVersion::V1_0) | Ok(HttpVersion::V1_1) => Ok(()),
            _ => Err(ValidatorError::HttpVersionNotSupported(v.0, v.1)),
        }
    }

    fn validate_http_method(
        content_length: Option<usize>,
        method: &HttpMethod,
    ) -> Result<(), ValidatorError> {
        match method {
            HttpMethod::Trace => match content_length {
                Some(n) if n > 0 => Err(ValidatorError::BodyNotAllowed("TRACE")),
                _ => Ok(()),
            },
            _ => Ok(()),
        }
    }

    pub fn validate_request(&self, req: &HttpRequest) -> Result<(), ValidatorError> {
        Self::validate_http_version(req.http_version)?;

        // Chunked bodies are never decoded, so their length is unknown
        if req.headers.contains("Transfer-Encoding") {
            return Err(ValidatorError::MissingContentLength);
        }

        let content_length = req.content_length();
        Self::validate_http_method(content_length, &req.method)?;

        match content_length {
            Some(n) if n > self.max_body_size => Err(ValidatorError::PayloadTooLarge(n)),
            _ => Ok(()),
        }
    }
}
