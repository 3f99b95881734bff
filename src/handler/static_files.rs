//! Local file serving (GET) and storing (POST).
//!
//! URL paths are mapped below the configured root: the path is
//! percent-decoded, then cleaned lexically so that `..` can never climb
//! above the root. `/` serves `index.html`.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::SystemTime;

use async_std::fs::{self, File};
use async_std::io::{ErrorKind, WriteExt};
use async_std::net::TcpStream;
use async_trait::async_trait;
use percent_encoding::percent_decode_str;
use tracing::{debug, info, warn};

use crate::config::ServerConfig;
use crate::error::ServiceError;
use crate::handler::{Service, mime};
use crate::http::request::HttpRequest;
use crate::http::response::{HttpResponse, ResponseHeader};
use crate::http::status::HttpStatus;
use crate::net::io::{copy_with_deadlines, write_response};

const INDEX_FILE: &str = "index.html";

pub struct StaticFiles {
    config: Arc<ServerConfig>,
}

impl StaticFiles {
    pub fn new(config: Arc<ServerConfig>) -> Self {
        Self { config }
    }

    fn root(&self) -> &Path {
        &self.config.static_files_root
    }

    fn response(&self, status: HttpStatus) -> HttpResponse {
        let mut res = HttpResponse::new(status);
        res.set_header(ResponseHeader::Date, &httpdate::fmt_http_date(SystemTime::now()));
        res.set_header(ResponseHeader::Server, &self.config.server_name);
        res
    }

    pub async fn serve(&self, url_path: &str, client: &mut TcpStream) -> Result<(), ServiceError> {
        let relative = match sanitize_path(url_path) {
            rel if rel.as_os_str().is_empty() => PathBuf::from(INDEX_FILE),
            rel => rel,
        };

        // Checked before the filesystem is touched
        let content_type = mime::content_type(&relative)
            .ok_or_else(|| ServiceError::UnsupportedFileType(mime::extension(&relative)))?;

        let full_path = self.root().join(&relative);
        debug!(path = %full_path.display(), "serving static file");

        let mut file = match File::open(&full_path).await {
            Ok(f) => f,
            Err(err) if err.kind() == ErrorKind::NotFound => {
                return Err(ServiceError::FileNotFound(relative.display().to_string()));
            }
            Err(err) => return Err(ServiceError::Io(err)),
        };

        let metadata = file.metadata().await?;
        if metadata.is_dir() {
            return Err(ServiceError::FileNotFound(relative.display().to_string()));
        }

        let mut res = self.response(HttpStatus::Ok);
        res.set_header(ResponseHeader::ContentType, content_type);
        res.set_header(ResponseHeader::ContentLength, &metadata.len().to_string());
        res.set_header(ResponseHeader::Connection, "close");

        if let Err(err) = write_response(client, &res, self.config.write_timeout).await {
            warn!(path = %full_path.display(), error = %err, "failed to send response headers");
            return Ok(());
        }

        // From here on the status line is out: failures can only be logged
        match copy_with_deadlines(
            &mut file,
            client,
            self.config.buffer_size,
            self.config.read_timeout,
            self.config.write_timeout,
        )
        .await
        {
            Ok(sent) => info!(path = %full_path.display(), bytes = sent, "served file"),
            Err(err) => warn!(
                path = %full_path.display(),
                bytes = err.copied,
                side = %err.side,
                error = %err.source,
                "failed to send file body"
            ),
        }
        Ok(())
    }

    pub async fn store(&self, url_path: &str, body: &[u8], client: &mut TcpStream) -> Result<(), ServiceError> {
        let relative = sanitize_path(url_path);
        if relative.as_os_str().is_empty() {
            return Err(ServiceError::Io(std::io::Error::new(
                ErrorKind::InvalidInput,
                "POST target names no file",
            )));
        }
        let full_path = self.root().join(&relative);

        if let Some(dir) = full_path.parent() {
            fs::create_dir_all(dir).await?;
        }

        let mut file = File::create(&full_path).await?;
        file.write_all(body).await?;
        file.flush().await?;

        info!(path = %full_path.display(), bytes = body.len(), "stored request body");

        let mut res = self.response(HttpStatus::Created);
        res.set_header(ResponseHeader::ContentType, "text/plain");
        res.set_header(ResponseHeader::ContentLength, "0");
        res.set_header(ResponseHeader::Connection, "close");

        if let Err(err) = write_response(client, &res, self.config.write_timeout).await {
            warn!(path = %full_path.display(), error = %err, "failed to send 201 response");
        }
        Ok(())
    }
}

#[async_trait]
impl Service for StaticFiles {
    async fn get(&self, req: &HttpRequest, client: &mut TcpStream) -> Result<(), ServiceError> {
        self.serve(req.target.path(), client).await
    }

    async fn post(&self, req: &HttpRequest, client: &mut TcpStream) -> Result<(), ServiceError> {
        self.store(req.target.path(), &req.body, client).await
    }
}

/// Decodes and cleans a URL path into a root-relative path. Empty and
/// `.` segments are dropped; `..` removes the previous segment and is
/// ignored at the root.
fn sanitize_path(path: &str) -> PathBuf {
    let decoded = percent_decode_str(path).decode_utf8_lossy();

    let mut segments: Vec<&str> = Vec::new();
    for segment in decoded.split(|c: char| c == '/' || c == '\\') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            s => segments.push(s),
        }
    }

    segments.into_iter().collect()
}
