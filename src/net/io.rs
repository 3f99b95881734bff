//! Socket I/O bounded by deadlines, and the error responder.
//!
//! Each read or write is allowed its own deadline; expiry surfaces as an
//! [`io::ErrorKind::TimedOut`] error so callers can tell a stalled peer
//! apart from a broken one.

use std::time::Duration;

use async_std::io::{self, Read, ReadExt, Write, WriteExt};
use tracing::{debug, warn};

use crate::http::response::HttpResponse;
use crate::http::status::HttpStatus;

pub async fn read_with_deadline<R>(reader: &mut R, buf: &mut [u8], deadline: Duration) -> io::Result<usize>
where
    R: Read + Unpin + ?Sized,
{
    io::timeout(deadline, reader.read(buf)).await
}

pub async fn write_with_deadline<W>(writer: &mut W, buf: &[u8], deadline: Duration) -> io::Result<()>
where
    W: Write + Unpin + ?Sized,
{
    io::timeout(deadline, writer.write_all(buf)).await
}

pub async fn write_response<W>(writer: &mut W, response: &HttpResponse, deadline: Duration) -> io::Result<()>
where
    W: Write + Unpin + ?Sized,
{
    write_with_deadline(writer, &response.to_bytes(), deadline).await?;
    io::timeout(deadline, writer.flush()).await
}

/// Writes a minimal error response. Failures are only logged: the
/// connection is closed right after regardless.
pub async fn send_error<W>(writer: &mut W, status: HttpStatus, reason: &str, deadline: Duration)
where
    W: Write + Unpin + ?Sized,
{
    let response = HttpResponse::error(status, reason);
    debug!(status = status.code(), reason, "sending error response");

    if let Err(err) = write_response(writer, &response, deadline).await {
        warn!(status = status.code(), error = %err, "failed to send error response");
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CopySide {
    Read,
    Write,
}

impl std::fmt::Display for CopySide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CopySide::Read => f.write_str("read"),
            CopySide::Write => f.write_str("write"),
        }
    }
}

/// A copy that stopped early. `copied` bytes had already been written.
#[derive(Debug)]
pub struct CopyError {
    pub copied: u64,
    pub side: CopySide,
    pub source: io::Error,
}

/// Copies `reader` into `writer` until EOF without looking at the bytes.
/// Every read and every write gets its own deadline, so a peer that goes
/// quiet bounds the copy instead of hanging it.
pub async fn copy_with_deadlines<R, W>(
    reader: &mut R,
    writer: &mut W,
    buffer_size: usize,
    read_deadline: Duration,
    write_deadline: Duration,
) -> Result<u64, CopyError>
where
    R: Read + Unpin + ?Sized,
    W: Write + Unpin + ?Sized,
{
    let mut buf = vec![0u8; buffer_size.max(1)];
    let mut copied = 0u64;

    loop {
        let n = match read_with_deadline(reader, &mut buf, read_deadline).await {
            Ok(0) => break,
            Ok(n) => n,
            Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
            Err(source) => {
                return Err(CopyError {
                    copied,
                    side: CopySide::Read,
                    source,
                });
            }
        };

        if let Err(source) = write_with_deadline(writer, &buf[..n], write_deadline).await {
            return Err(CopyError {
                copied,
                side: CopySide::Write,
                source,
            });
        }
        copied += n as u64;
    }

    io::timeout(write_deadline, writer.flush())
        .await
        .map_err(|source| CopyError {
            copied,
            side: CopySide::Write,
            source,
        })?;
    Ok(copied)
}

/// Errors meaning the peer is gone; nothing more can be written to it.
pub fn is_disconnect(err: &io::Error) -> bool {
    matches!(
        err.kind(),
        io::ErrorKind::ConnectionReset
            | io::ErrorKind::ConnectionAborted
            | io::ErrorKind::BrokenPipe
            | io::ErrorKind::NotConnected
    )
}
