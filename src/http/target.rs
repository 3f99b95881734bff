//! Request-target forms (RFC 9112 section 3.2).
//!
//! Only the three forms a plain HTTP/1.1 server or forwarding proxy
//! meets are accepted: origin-form (`/path?query`), absolute-form
//! (`http://host:port/path?query`) and the asterisk-form `*`.
//!
//! Absolute-form targets are validated with [`Url`], but the authority and
//! the path are kept exactly as the client wrote them: `Url` drops a port
//! equal to the scheme default and normalizes dot segments.

use url::Url;

#[derive(Debug, Clone, PartialEq)]
pub enum RequestTarget {
    Origin {
        path: String,
        query: Option<String>,
    },
    Absolute {
        /// `host[:port]` without userinfo.
        authority: String,
        path: String,
        query: Option<String>,
    },
    Asterisk,
}

fn split_query(raw: &str) -> (String, Option<String>) {
    match raw.split_once('?') {
        Some((path, query)) => (path.to_string(), Some(query.to_string())),
        None => (raw.to_string(), None),
    }
}

impl RequestTarget {
    pub fn parse(raw: &str) -> Option<Self> {
        if raw == "*" {
            return Some(RequestTarget::Asterisk);
        }

        if raw.starts_with('/') {
            let (path, query) = split_query(raw);
            return Some(RequestTarget::Origin { path, query });
        }

        let (_, rest) = raw.split_once("://")?;

        let url = Url::parse(raw).ok()?;
        if url.host_str().is_none_or(str::is_empty) {
            return None;
        }

        let rest = rest.split_once('#').map_or(rest, |(before, _)| before);
        let end = rest.find(['/', '?']).unwrap_or(rest.len());
        let (authority, path_and_query) = rest.split_at(end);
        let authority = authority
            .rsplit_once('@')
            .map_or(authority, |(_, host)| host)
            .to_string();
        let (path, query) = split_query(path_and_query);

        Some(RequestTarget::Absolute {
            authority,
            path,
            query,
        })
    }

    /// Authority of an absolute-form target, as written by the client.
    pub fn authority(&self) -> Option<&str> {
        match self {
            RequestTarget::Absolute { authority, .. } => Some(authority),
            _ => None,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            RequestTarget::Origin { path, .. } | RequestTarget::Absolute { path, .. } => path,
            RequestTarget::Asterisk => "*",
        }
    }

    pub fn query(&self) -> Option<&str> {
        match self {
            RequestTarget::Origin { query, .. } | RequestTarget::Absolute { query, .. } => {
                query.as_deref()
            }
            RequestTarget::Asterisk => None,
        }
    }

    /// The target rewritten without scheme or authority, as sent to an
    /// origin server.
    pub fn origin_form(&self) -> String {
        let path = match self.path() {
            "" => "/",
            path => path,
        };
        match self.query() {
            Some(query) => format!("{}?{}", path, query),
            None => path.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn origin_form_splits_query() {
        let target = RequestTarget::parse("/docs/index.html?lang=en").unwrap();
        assert_eq!(target.path(), "/docs/index.html");
        assert_eq!(target.query(), Some("lang=en"));
        assert_eq!(target.origin_form(), "/docs/index.html?lang=en");
    }

    #[test]
    fn absolute_form_keeps_path_and_query_only() {
        let target = RequestTarget::parse("http://example.test:8080/a/b?x=1").unwrap();
        assert_eq!(target.authority(), Some("example.test:8080"));
        assert_eq!(target.origin_form(), "/a/b?x=1");
    }

    #[test]
    fn absolute_form_keeps_client_path_bytes() {
        let target = RequestTarget::parse("http://example.test/a/../b/{x}?q=%7B#frag").unwrap();
        assert_eq!(target.origin_form(), "/a/../b/{x}?q=%7B");
    }

    #[test]
    fn absolute_form_keeps_default_port_and_drops_userinfo() {
        let target = RequestTarget::parse("https://user:pw@example.test:443?x").unwrap();
        assert_eq!(target.authority(), Some("example.test:443"));
        assert_eq!(target.origin_form(), "/?x");
    }

    #[test]
    fn absolute_form_without_path_becomes_root() {
        let target = RequestTarget::parse("http://example.test").unwrap();
        assert_eq!(target.origin_form(), "/");
    }

    #[test]
    fn rejects_relative_and_hostless_targets() {
        assert!(RequestTarget::parse("index.html").is_none());
        assert!(RequestTarget::parse("").is_none());
        assert!(RequestTarget::parse("http://").is_none());
        assert!(RequestTarget::parse("mailto:someone@example.test").is_none());
        assert_eq!(RequestTarget::parse("*"), Some(RequestTarget::Asterisk));
    }
}
