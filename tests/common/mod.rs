//! Shared helpers for the loopback integration tests.

#![allow(dead_code)]

use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use async_std::io::{ReadExt, WriteExt};
use async_std::net::{TcpListener, TcpStream};
use async_std::task;

use rustygate::config::ServerConfig;
use rustygate::handler::Service;
use rustygate::net::gate::ConnectionGate;
use rustygate::net::server::Server;

static SCRATCH_COUNTER: AtomicUsize = AtomicUsize::new(0);

pub fn test_config() -> ServerConfig {
    ServerConfig {
        address: IpAddr::V4(Ipv4Addr::LOCALHOST),
        port: 0,
        read_timeout: Duration::from_secs(5),
        write_timeout: Duration::from_secs(5),
        connect_timeout: Duration::from_secs(2),
        ..ServerConfig::default()
    }
}

/// A fresh, empty directory under the system temp dir.
pub fn scratch_dir(name: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_nanos();
    let dir = std::env::temp_dir().join(format!(
        "rustygate-{}-{}-{}-{}",
        name,
        std::process::id(),
        SCRATCH_COUNTER.fetch_add(1, Ordering::Relaxed),
        nanos
    ));
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

/// Binds a server on an ephemeral loopback port and runs it in the
/// background.
pub async fn spawn_server<S, F>(config: ServerConfig, make_service: F) -> (SocketAddr, Option<ConnectionGate>)
where
    S: Service,
    F: FnOnce(Arc<ServerConfig>) -> S,
{
    let config = Arc::new(config);
    let server = Server::bind(Arc::clone(&config), make_service(Arc::clone(&config)))
        .await
        .unwrap();
    let addr = server.local_addr().unwrap();
    let gate = server.gate().cloned();
    task::spawn(server.run());
    (addr, gate)
}

/// Sends `raw` and reads until the server closes the connection.
pub async fn exchange(addr: SocketAddr, raw: &[u8]) -> Vec<u8> {
    let mut stream = TcpStream::connect(addr).await.unwrap();
    stream.write_all(raw).await.unwrap();
    let mut out = Vec::new();
    stream.read_to_end(&mut out).await.unwrap();
    out
}

/// Splits a raw response into its head (as text) and body.
pub fn split_response(raw: &[u8]) -> (String, Vec<u8>) {
    let end = raw
        .windows(4)
        .position(|w| w == b"\r\n\r\n")
        .expect("response has no header terminator");
    (
        String::from_utf8(raw[..end].to_vec()).unwrap(),
        raw[end + 4..].to_vec(),
    )
}

pub fn status_code(raw: &[u8]) -> u16 {
    let (head, _) = split_response(raw);
    head.split(' ').nth(1).unwrap().parse().unwrap()
}

pub fn header<'a>(head: &'a str, name: &str) -> Option<&'a str> {
    head.lines().skip(1).find_map(|line| {
        let (n, v) = line.split_once(':')?;
        n.eq_ignore_ascii_case(name).then(|| v.trim())
    })
}

/// A port on which nothing is listening.
pub async fn closed_port() -> u16 {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    listener.local_addr().unwrap().port()
}

/// Polls `cond` until it holds or `limit` elapses.
pub async fn eventually(limit: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let step = Duration::from_millis(10);
    let mut waited = Duration::ZERO;
    while waited < limit {
        if cond() {
            return true;
        }
        task::sleep(step).await;
        waited += step;
    }
    cond()
}
