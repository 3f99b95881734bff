//! Incremental HTTP/1.x request parser.
//!
//! Bytes are pushed with [`Parser::feed`] as they arrive from the socket;
//! the parser keeps whatever it cannot consume yet and resumes on the next
//! call. It only understands framing and syntax: version support, body
//! rules and size policy live in the [`validator`](crate::http::validator),
//! which the connection pipeline runs when the parser reports
//! [`ParserOk::HeadersDone`].

use thiserror::Error;

use crate::http::request::HttpRequest;
use crate::http::status::HttpStatus;
use crate::http::target::RequestTarget;
use crate::http::{http_method_from_str, is_token};

/// Size limits applied while reading the request head.
#[derive(Debug, Clone, Copy)]
pub struct ParserLimits {
    pub max_request_line: usize,
    pub max_header_size: usize,
}

impl Default for ParserLimits {
    fn default() -> Self {
        Self {
            max_request_line: 8 * 1024,
            max_header_size: 16 * 1024,
        }
    }
}

#[derive(PartialEq, Debug)]
pub enum ParserOk {
    /// More bytes are needed.
    Incomplete,
    /// The request head has just been parsed; emitted exactly once.
    HeadersDone,
    /// The request, including its body, is complete.
    Done,
}

// To keep parser logic separate from HTTP status codes,
// variants are mapped to a status only at the connection boundary.
#[derive(Debug, Error, PartialEq)]
pub enum ParserError {
    #[error("malformed request: {0}")]
    Malformed(&'static str),

    #[error("request line exceeds {0} bytes")]
    UriTooLong(usize),

    #[error("request head exceeds {0} bytes")]
    HeadersTooLarge(usize),
}

impl ParserError {
    pub fn into_http_status(self) -> HttpStatus {
        match self {
            ParserError::Malformed(_) => HttpStatus::BadRequest,
            ParserError::UriTooLong(_) => HttpStatus::UriTooLong,
            ParserError::HeadersTooLarge(_) => HttpStatus::RequestHeaderFieldsTooLarge,
        }
    }
}

#[derive(PartialEq, PartialOrd, Debug, Clone, Copy)]
enum ParserState {
    RequestLine,
    Headers,
    Body,
    Done,
}

pub struct Parser {
    buf: Vec<u8>,
    state: ParserState,
    limits: ParserLimits,
    header_bytes: usize,
    bytes_seen: usize,
}

impl Parser {
    pub fn new(limits: ParserLimits) -> Self {
        Self {
            buf: Vec::new(),
            state: ParserState::RequestLine,
            limits,
            header_bytes: 0,
            bytes_seen: 0,
        }
    }

    /// Whether any byte of a request has been received yet.
    pub fn has_started(&self) -> bool {
        self.bytes_seen > 0
    }

    pub fn feed(&mut self, data: &[u8], req: &mut HttpRequest) -> Result<ParserOk, ParserError> {
        self.bytes_seen += data.len();
        self.buf.extend_from_slice(data);

        // Iteratively parse request based on current state while data is available
        loop {
            match self.state {
                ParserState::RequestLine => {
                    let limit = self.limits.max_request_line;
                    let Some(line) = self.take_line(limit, ParserError::UriTooLong(limit))? else {
                        return Ok(ParserOk::Incomplete);
                    };
                    // Empty lines before the request line are ignored (RFC 9112 section 2.2)
                    if line.is_empty() {
                        continue;
                    }
                    parse_request_line(&line, req)?;
                    self.state = ParserState::Headers;
                }
                ParserState::Headers => {
                    let budget = self.limits.max_header_size.saturating_sub(self.header_bytes);
                    let too_large = ParserError::HeadersTooLarge(self.limits.max_header_size);
                    let Some(line) = self.take_line(budget, too_large)? else {
                        return Ok(ParserOk::Incomplete);
                    };
                    self.header_bytes += line.len() + 2;

                    if line.is_empty() {
                        self.state = match req.content_length() {
                            Some(n) if n > 0 => ParserState::Body,
                            _ => ParserState::Done,
                        };
                        return Ok(ParserOk::HeadersDone);
                    }
                    parse_header_line(&line, req)?;
                }
                ParserState::Body => {
                    let content_length = req.content_length().unwrap_or(0);
                    let to_copy = std::cmp::min(self.buf.len(), content_length - req.body.len());
                    req.body.extend(self.buf.drain(..to_copy));

                    if req.body.len() < content_length {
                        return Ok(ParserOk::Incomplete);
                    }
                    self.state = ParserState::Done;
                }
                ParserState::Done => return Ok(ParserOk::Done),
            }
        }
    }

    /// Removes one line from the buffer, without its terminator. A bare
    /// `\n` is accepted as a line ending.
    fn take_line(&mut self, limit: usize, err: ParserError) -> Result<Option<Vec<u8>>, ParserError> {
        let Some(end) = self.buf.iter().position(|&b| b == b'\n') else {
            if self.buf.len() > limit {
                return Err(err);
            }
            return Ok(None);
        };

        let mut line: Vec<u8> = self.buf.drain(..=end).collect();
        line.pop();
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        if line.len() > limit {
            return Err(err);
        }
        Ok(Some(line))
    }
}

/// Request line: METHOD SP TARGET SP HTTP/VERSION
fn parse_request_line(line: &[u8], req: &mut HttpRequest) -> Result<(), ParserError> {
    let parts: Vec<&[u8]> = line.split(|&b| b == b' ').collect();
    if parts.len() != 3 {
        return Err(ParserError::Malformed("request line"));
    }

    if !is_token(parts[0]) {
        return Err(ParserError::Malformed("method"));
    }
    let method = std::str::from_utf8(parts[0]).map_err(|_| ParserError::Malformed("method"))?;

    let uri = std::str::from_utf8(parts[1]).map_err(|_| ParserError::Malformed("target"))?;
    let target = RequestTarget::parse(uri).ok_or(ParserError::Malformed("target"))?;

    let version = std::str::from_utf8(parts[2]).unwrap_or("");
    let http_version = version
        .strip_prefix("HTTP/")
        .and_then(|v| v.split_once('.'))
        .filter(|(maj, min)| {
            maj.len() == 1
                && min.len() == 1
                && maj.bytes().all(|b| b.is_ascii_digit())
                && min.bytes().all(|b| b.is_ascii_digit())
        })
        .and_then(|(maj, min)| Some((maj.parse::<u8>().ok()?, min.parse::<u8>().ok()?)))
        .ok_or(ParserError::Malformed("version"))?;

    req.method = http_method_from_str(method);
    req.uri = uri.to_string();
    req.target = target;
    req.http_version = http_version;
    Ok(())
}

fn parse_header_line(line: &[u8], req: &mut HttpRequest) -> Result<(), ParserError> {
    // obs-fold continuation lines are rejected (RFC 9112 section 5.2)
    if line[0] == b' ' || line[0] == b'\t' {
        return Err(ParserError::Malformed("folded header"));
    }

    let colon = line
        .iter()
        .position(|&b| b == b':')
        .ok_or(ParserError::Malformed("header without colon"))?;
    let (name, value) = (&line[..colon], &line[colon + 1..]);

    // No whitespace is allowed between the field name and the colon
    if !is_token(name) {
        return Err(ParserError::Malformed("header name"));
    }
    if value.iter().any(|&b| (b < 0x20 && b != b'\t') || b == 0x7f) {
        return Err(ParserError::Malformed("header value"));
    }

    // Values are forwarded as text, so obs-text that is not UTF-8 is refused
    // rather than rewritten
    let name = std::str::from_utf8(name).map_err(|_| ParserError::Malformed("header name"))?;
    let value = std::str::from_utf8(value).map_err(|_| ParserError::Malformed("header value encoding"))?;
    let value = value.trim_matches(|c| c == ' ' || c == '\t');

    if name.eq_ignore_ascii_case("content-length") {
        if value.is_empty() || !value.bytes().all(|b| b.is_ascii_digit()) {
            return Err(ParserError::Malformed("content-length"));
        }
        if value.parse::<usize>().is_err() {
            return Err(ParserError::Malformed("content-length"));
        }
        return match req.headers.get("Content-Length") {
            Some(existing) if existing != value => {
                Err(ParserError::Malformed("conflicting content-length"))
            }
            Some(_) => Ok(()),
            None => {
                req.headers.set_raw(name, value);
                Ok(())
            }
        };
    }

    req.headers.append(name, value);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::HttpMethod;

    fn parse_all(input: &[u8]) -> Result<(ParserOk, HttpRequest), ParserError> {
        let mut parser = Parser::new(ParserLimits::default());
        let mut req = HttpRequest::new();
        let mut res = parser.feed(input, &mut req)?;
        while res == ParserOk::HeadersDone {
            res = parser.feed(&[], &mut req)?;
        }
        Ok((res, req))
    }

    #[test]
    fn parses_simple_get() {
        let (res, req) = parse_all(b"GET /index.html HTTP/1.1\r\nHost: localhost\r\n\r\n").unwrap();

        assert_eq!(res, ParserOk::Done);
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.uri, "/index.html");
        assert_eq!(req.http_version, (1, 1));
        assert_eq!(req.host(), Some("localhost"));
        assert!(req.body.is_empty());
    }

    #[test]
    fn body_arrives_across_several_feeds() {
        let mut parser = Parser::new(ParserLimits::default());
        let mut req = HttpRequest::new();

        let head = b"POST /upload.txt HTTP/1.1\r\nContent-Length: 11\r\n\r\nhello";
        assert_eq!(parser.feed(head, &mut req).unwrap(), ParserOk::HeadersDone);
        assert_eq!(parser.feed(&[], &mut req).unwrap(), ParserOk::Incomplete);
        assert_eq!(parser.feed(b" world", &mut req).unwrap(), ParserOk::Done);
        assert_eq!(req.body, b"hello world");
    }

    #[test]
    fn head_split_mid_line_is_incomplete() {
        let mut parser = Parser::new(ParserLimits::default());
        let mut req = HttpRequest::new();

        assert!(!parser.has_started());
        assert_eq!(parser.feed(b"GET /a HT", &mut req).unwrap(), ParserOk::Incomplete);
        assert!(parser.has_started());
        assert_eq!(parser.feed(b"TP/1.0\r\nHost: x\r", &mut req).unwrap(), ParserOk::Incomplete);
        assert_eq!(parser.feed(b"\n\r\n", &mut req).unwrap(), ParserOk::HeadersDone);
        assert_eq!(parser.feed(&[], &mut req).unwrap(), ParserOk::Done);
        assert_eq!(req.http_version, (1, 0));
    }

    #[test]
    fn unknown_method_token_still_parses() {
        let (_, req) = parse_all(b"BREW /pot HTTP/1.1\r\n\r\n").unwrap();
        assert_eq!(req.method, HttpMethod::Other("BREW".to_string()));
    }

    #[test]
    fn bare_lf_and_leading_blank_lines_are_tolerated() {
        let (res, req) = parse_all(b"\r\nGET / HTTP/1.1\nHost: a\n\n").unwrap();
        assert_eq!(res, ParserOk::Done);
        assert_eq!(req.host(), Some("a"));
    }

    #[test]
    fn malformed_request_lines() {
        for input in [
            &b"GET /\r\n\r\n"[..],
            b"GET  / HTTP/1.1\r\n\r\n",
            b"GET / HTTP/1.1 extra\r\n\r\n",
            b"G(T / HTTP/1.1\r\n\r\n",
            b"GET index.html HTTP/1.1\r\n\r\n",
            b"GET / HTTX/1.1\r\n\r\n",
            b"GET / HTTP/11\r\n\r\n",
        ] {
            assert!(
                matches!(parse_all(input), Err(ParserError::Malformed(_))),
                "{:?}",
                String::from_utf8_lossy(input)
            );
        }
    }

    #[test]
    fn malformed_headers() {
        for input in [
            &b"GET / HTTP/1.1\r\nNoColon\r\n\r\n"[..],
            b"GET / HTTP/1.1\r\nHost : a\r\n\r\n",
            b"GET / HTTP/1.1\r\nHost: a\r\n folded\r\n\r\n",
            b"GET / HTTP/1.1\r\nContent-Length: -1\r\n\r\n",
            b"GET / HTTP/1.1\r\nContent-Length: 1\r\nContent-Length: 2\r\n\r\n",
            b"GET / HTTP/1.1\r\nX-Name: caf\xe9\r\n\r\n",
        ] {
            assert!(
                matches!(parse_all(input), Err(ParserError::Malformed(_))),
                "{:?}",
                String::from_utf8_lossy(input)
            );
        }
    }

    #[test]
    fn utf8_header_values_are_kept_verbatim() {
        let (_, req) = parse_all("GET / HTTP/1.1\r\nX-Name: café ☕\r\n\r\n".as_bytes()).unwrap();
        assert_eq!(req.headers.get("x-name"), Some("café ☕"));
    }

    #[test]
    fn repeated_headers_are_folded() {
        let (_, req) =
            parse_all(b"GET / HTTP/1.1\r\nAccept: a\r\naccept: b\r\nContent-Length: 0\r\ncontent-length: 0\r\n\r\n")
                .unwrap();
        assert_eq!(req.headers.get("Accept"), Some("a, b"));
        assert_eq!(req.content_length(), Some(0));
    }

    #[test]
    fn oversized_request_line_is_uri_too_long() {
        let limits = ParserLimits {
            max_request_line: 32,
            max_header_size: 1024,
        };
        let mut parser = Parser::new(limits);
        let mut req = HttpRequest::new();
        let line = format!("GET /{} HTTP/1.1\r\n", "a".repeat(64));

        let err = parser.feed(line.as_bytes(), &mut req).unwrap_err();
        assert_eq!(err.into_http_status(), HttpStatus::UriTooLong);
    }

    #[test]
    fn oversized_head_without_newline_is_rejected_early() {
        let limits = ParserLimits {
            max_request_line: 1024,
            max_header_size: 64,
        };
        let mut parser = Parser::new(limits);
        let mut req = HttpRequest::new();

        parser.feed(b"GET / HTTP/1.1\r\n", &mut req).unwrap();
        let err = parser.feed(&[b'x'; 128], &mut req).unwrap_err();
        assert_eq!(err, ParserError::HeadersTooLarge(64));
    }
}
