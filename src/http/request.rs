use crate::http::HttpMethod;
use crate::http::headers::HttpHeaders;
use crate::http::target::RequestTarget;

/// A parsed request. Built incrementally by the
/// [`Parser`](crate::http::parser::Parser); once parsing reports
/// [`ParserOk::Done`](crate::http::parser::ParserOk::Done) the method and
/// target are non-empty.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: HttpMethod,
    /// The request-target exactly as it appeared on the request line.
    pub uri: String,
    pub target: RequestTarget,
    pub http_version: (u8, u8),

    // headers
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpRequest {
    pub fn new() -> Self {
        Self {
            method: HttpMethod::Other(String::new()),
            uri: String::new(),
            target: RequestTarget::Asterisk,
            http_version: (0, 0),
            headers: HttpHeaders::new(),
            body: Vec::new(),
        }
    }

    /// Value of the `Host` header, `None` when absent or blank.
    pub fn host(&self) -> Option<&str> {
        self.headers
            .get("Host")
            .map(str::trim)
            .filter(|host| !host.is_empty())
    }

    /// Declared body length. `None` when the header is absent; the
    /// parser has already rejected unparsable values.
    pub fn content_length(&self) -> Option<usize> {
        self.headers
            .get("Content-Length")
            .and_then(|v| v.parse::<usize>().ok())
    }
}

impl Default for HttpRequest {
    fn default() -> Self {
        Self::new()
    }
}
