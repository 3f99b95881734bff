//! Admission control: at most `max_connections` connections are past the
//! gate at once, and every exit path gives its slot back.

use std::time::Duration;

use async_std::io::WriteExt;
use async_std::net::TcpStream;

use rustygate::handler::StaticFiles;

mod common;

#[async_std::test]
async fn no_more_than_ten_connections_are_handled_at_once() {
    let mut config = common::test_config();
    config.static_files_root = common::scratch_dir("gate");
    let (addr, gate) = common::spawn_server(config, StaticFiles::new).await;
    let gate = gate.expect("file server is gated by default");
    assert_eq!(gate.capacity(), 10);

    // Idle clients hold their slot until they send something or leave
    let mut idle = Vec::new();
    for _ in 0..14 {
        idle.push(TcpStream::connect(addr).await.unwrap());
    }

    assert!(common::eventually(Duration::from_secs(2), || gate.in_use() == 10).await);
    async_std::task::sleep(Duration::from_millis(100)).await;
    assert_eq!(gate.in_use(), 10);

    drop(idle);
    assert!(common::eventually(Duration::from_secs(2), || gate.in_use() == 0).await);

    // Queued connections were not rejected, and the server still answers
    let raw = common::exchange(addr, b"GET /none.txt HTTP/1.1\r\nHost: a\r\n\r\n").await;
    assert_eq!(common::status_code(&raw), 404);
}

#[async_std::test]
async fn slots_are_released_on_every_error_path() {
    let mut config = common::test_config();
    config.static_files_root = common::scratch_dir("gate-faults");
    config.max_connections = Some(3);
    config.max_body_size = 8;
    let (addr, gate) = common::spawn_server(config, StaticFiles::new).await;
    let gate = gate.unwrap();

    let faulty: [&[u8]; 7] = [
        b"garbage\r\n\r\n",
        b"PUT /a.txt HTTP/1.1\r\nHost: a\r\n\r\n",
        b"GET /a.exe HTTP/1.1\r\nHost: a\r\n\r\n",
        b"GET /missing.html HTTP/1.1\r\nHost: a\r\n\r\n",
        b"GET / HTTP/3.0\r\n\r\n",
        b"POST /big.txt HTTP/1.1\r\nContent-Length: 9\r\n\r\n",
        b"POST / HTTP/1.1\r\nContent-Length: 0\r\n\r\n",
    ];
    for _ in 0..3 {
        for raw in faulty {
            let response = common::exchange(addr, raw).await;
            assert!(common::status_code(&response) >= 400);
        }
    }

    // Clients that vanish mid-request or before sending anything
    for _ in 0..5 {
        let mut stream = TcpStream::connect(addr).await.unwrap();
        stream.write_all(b"GET /index.ht").await.unwrap();
        drop(stream);
        drop(TcpStream::connect(addr).await.unwrap());
    }

    assert!(common::eventually(Duration::from_secs(2), || gate.in_use() == 0).await);

    let raw = common::exchange(addr, b"GET /none.txt HTTP/1.1\r\nHost: a\r\n\r\n").await;
    assert_eq!(common::status_code(&raw), 404);
}
