use crate::http::headers::HttpHeaders;
use crate::http::status::HttpStatus;

pub enum ResponseHeader {
    ContentLength,
    ContentType,
    Connection,
    Date,
    Server,
}

/// A response synthesized by this process. Proxied responses never go
/// through this type: they are relayed as raw bytes.
#[derive(Debug)]
pub struct HttpResponse {
    pub status: HttpStatus,
    /// Reason phrase for the status line; defaults to the canonical one.
    pub reason: String,
    pub headers: HttpHeaders,
    pub body: Vec<u8>,
}

impl HttpResponse {
    pub fn new(status: HttpStatus) -> Self {
        Self {
            status,
            reason: status.reason().to_string(),
            headers: HttpHeaders::new(),
            body: Vec::new(),
        }
    }

    /// Minimal self-describing error response: plain-text body
    /// `"<code> <reason>"` with an exact `Content-Length`, and the
    /// connection marked for closing.
    pub fn error(status: HttpStatus, reason: &str) -> Self {
        let mut res = Self::new(status);
        res.reason = reason.to_string();
        res.body = format!("{} {}", status.code(), reason).into_bytes();

        res.set_header(ResponseHeader::ContentType, "text/plain");
        res.set_header(ResponseHeader::ContentLength, &res.body.len().to_string());
        res.set_header(ResponseHeader::Connection, "close");
        res
    }

    pub fn set_header(&mut self, h: ResponseHeader, value: &str) {
        let name = match h {
            ResponseHeader::ContentType => "Content-Type",
            ResponseHeader::ContentLength => "Content-Length",
            ResponseHeader::Connection => "Connection",
            ResponseHeader::Date => "Date",
            ResponseHeader::Server => "Server",
        };

        self.headers.set_raw(name, value);
    }

    // HTTP/1.1 <status> <reason>\r\n
    // <header_name>: <header_value>\r\n
    // ...
    // \r\n
    pub fn build_headers(&self) -> String {
        format!(
            "HTTP/1.1 {} {}\r\n{}\r\n",
            self.status.code(),
            self.reason,
            self.headers.stringify(),
        )
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut bytes = self.build_headers().into_bytes();
        bytes.extend_from_slice(&self.body);
        bytes
    }
}
