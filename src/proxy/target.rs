//! Upstream target resolution for forwarded requests.

use std::net::Ipv6Addr;

use crate::error::ServiceError;
use crate::http::request::HttpRequest;

pub const DEFAULT_PORT: u16 = 80;

/// Where a request is forwarded to. The port is always explicit.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProxyTarget {
    /// Host name or IP literal, IPv6 without brackets.
    pub host: String,
    pub port: u16,
    /// The authority as the client addressed it, used for the outgoing
    /// `Host` header.
    pub authority: String,
}

impl ProxyTarget {
    /// Takes the authority of an absolute-form target, falling back to
    /// the `Host` header for origin-form requests. The port defaults to 80
    /// only when none is written.
    pub fn resolve(req: &HttpRequest) -> Result<Self, ServiceError> {
        let authority = match req.target.authority() {
            Some(authority) => authority,
            None => req.host().ok_or(ServiceError::MissingHost)?,
        };
        let (host, port) = split_host_port(authority)?;
        Ok(Self {
            host,
            port: port.unwrap_or(DEFAULT_PORT),
            authority: authority.to_string(),
        })
    }
}

impl std::fmt::Display for ProxyTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.host.contains(':') {
            write!(f, "[{}]:{}", self.host, self.port)
        } else {
            write!(f, "{}:{}", self.host, self.port)
        }
    }
}

/// Splits `host[:port]`. Accepts bracketed IPv6 literals with or without
/// a port, and bare IPv6 literals (which cannot carry one).
pub fn split_host_port(authority: &str) -> Result<(String, Option<u16>), ServiceError> {
    let invalid = || ServiceError::InvalidAuthority(authority.to_string());

    let (host, port) = if let Some(rest) = authority.strip_prefix('[') {
        let (host, after) = rest.split_once(']').ok_or_else(invalid)?;
        if host.parse::<Ipv6Addr>().is_err() {
            return Err(invalid());
        }
        match after {
            "" => (host, None),
            _ => (host, Some(after.strip_prefix(':').ok_or_else(invalid)?)),
        }
    } else if authority.matches(':').count() > 1 {
        if authority.parse::<Ipv6Addr>().is_err() {
            return Err(invalid());
        }
        (authority, None)
    } else {
        match authority.split_once(':') {
            Some((host, port)) => (host, Some(port)),
            None => (authority, None),
        }
    };

    if host.is_empty() {
        return Err(ServiceError::MissingHost);
    }

    let port = match port {
        None | Some("") => None,
        Some(p) => Some(p.parse::<u16>().map_err(|_| invalid())?),
    };
    Ok((host.to_string(), port))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::http::parser::{Parser, ParserLimits};

    fn request(raw: &str) -> HttpRequest {
        let mut req = HttpRequest::new();
        Parser::new(ParserLimits::default())
            .feed(raw.as_bytes(), &mut req)
            .unwrap();
        req
    }

    #[test]
    fn split_variants() {
        assert_eq!(split_host_port("example.test").unwrap(), ("example.test".into(), None));
        assert_eq!(
            split_host_port("example.test:8080").unwrap(),
            ("example.test".into(), Some(8080))
        );
        assert_eq!(split_host_port("[::1]:81").unwrap(), ("::1".into(), Some(81)));
        assert_eq!(split_host_port("[::1]").unwrap(), ("::1".into(), None));
        assert_eq!(split_host_port("fe80::1").unwrap(), ("fe80::1".into(), None));
        assert_eq!(split_host_port("host:").unwrap(), ("host".into(), None));
    }

    #[test]
    fn split_rejects_bad_authorities() {
        assert!(matches!(split_host_port("host:http"), Err(ServiceError::InvalidAuthority(_))));
        assert!(matches!(split_host_port("host:70000"), Err(ServiceError::InvalidAuthority(_))));
        assert!(matches!(split_host_port("[::1"), Err(ServiceError::InvalidAuthority(_))));
        assert!(matches!(split_host_port("[::1]x"), Err(ServiceError::InvalidAuthority(_))));
        assert!(matches!(split_host_port("a:b:c"), Err(ServiceError::InvalidAuthority(_))));
        assert!(matches!(split_host_port(":80"), Err(ServiceError::MissingHost)));
    }

    #[test]
    fn absolute_form_defaults_to_port_80() {
        let target = ProxyTarget::resolve(&request("GET http://example.test/docs HTTP/1.1\r\n\r\n")).unwrap();
        assert_eq!(target.host, "example.test");
        assert_eq!(target.port, 80);
        assert_eq!(target.authority, "example.test");
        assert_eq!(target.to_string(), "example.test:80");
    }

    #[test]
    fn absolute_form_keeps_an_explicit_scheme_default_port() {
        for (raw, port, authority) in [
            ("GET https://example.test:443/x HTTP/1.1\r\n\r\n", 443, "example.test:443"),
            ("GET ftp://example.test:21/x HTTP/1.1\r\n\r\n", 21, "example.test:21"),
            ("GET http://example.test:80/x HTTP/1.1\r\n\r\n", 80, "example.test:80"),
        ] {
            let target = ProxyTarget::resolve(&request(raw)).unwrap();
            assert_eq!(target.host, "example.test");
            assert_eq!(target.port, port, "{}", raw);
            assert_eq!(target.authority, authority);
        }
    }

    #[test]
    fn absolute_form_wins_over_host_header() {
        let target = ProxyTarget::resolve(&request(
            "GET http://[::1]:8081/ HTTP/1.1\r\nHost: other.test\r\n\r\n",
        ))
        .unwrap();
        assert_eq!(target.host, "::1");
        assert_eq!(target.port, 8081);
        assert_eq!(target.authority, "[::1]:8081");
        assert_eq!(target.to_string(), "[::1]:8081");
    }

    #[test]
    fn origin_form_uses_host_header() {
        let target = ProxyTarget::resolve(&request("GET /x HTTP/1.1\r\nHost: example.test:9000\r\n\r\n")).unwrap();
        assert_eq!(target.host, "example.test");
        assert_eq!(target.port, 9000);
    }

    #[test]
    fn origin_form_without_host_is_missing_host() {
        for raw in [
            "GET /x HTTP/1.1\r\n\r\n",
            "GET /x HTTP/1.1\r\nHost:\r\n\r\n",
            "GET /x HTTP/1.1\r\nHost:   \r\n\r\n",
        ] {
            assert!(matches!(ProxyTarget::resolve(&request(raw)), Err(ServiceError::MissingHost)));
        }
    }
}
