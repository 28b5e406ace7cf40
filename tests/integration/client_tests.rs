//! `WifiClient` against real loopback peers.

use std::io::{Read, Write};
use std::net::TcpListener;
use std::os::fd::OwnedFd;
use std::os::unix::net::UnixStream;
use std::thread;
use std::time::{Duration, Instant};

use hamclock_shim::WifiClient;
use hamclock_shim::ports::Transport;

fn listener() -> (TcpListener, u16) {
    let l = TcpListener::bind("127.0.0.1:0").unwrap();
    let port = l.local_addr().unwrap().port();
    (l, port)
}

#[test]
fn request_response_over_loopback() {
    let (l, port) = listener();
    let server = thread::spawn(move || {
        let (mut s, _) = l.accept().unwrap();
        let mut line = [0u8; 7];
        s.read_exact(&mut line).unwrap();
        assert_eq!(&line, b"GET /\r\n");
        s.write_all(b"HTTP/1.0 200 OK\r\n").unwrap();
    });

    let mut client = WifiClient::new().with_timeouts(2000, 2000);
    assert!(client.connect("127.0.0.1", port));
    assert_eq!(client.println("GET /"), 7);

    let mut reply = Vec::new();
    while let Some(b) = client.read() {
        reply.push(b);
    }
    assert_eq!(reply, b"HTTP/1.0 200 OK\r\n");
    assert!(!client.connected(), "EOF stops the client");
    server.join().unwrap();
}

#[test]
fn read_array_never_over_fetches() {
    let (l, port) = listener();
    let mut client = WifiClient::new().with_timeouts(2000, 2000);
    assert!(client.connect("127.0.0.1", port));
    let (mut peer, _) = l.accept().unwrap();

    peer.write_all(b"abc").unwrap();
    assert!(client.available(2000));
    peer.write_all(b"def").unwrap();

    let mut buf = [0u8; 16];
    assert_eq!(client.read_array(&mut buf), 3);
    assert_eq!(&buf[..3], b"abc");
    assert_eq!(client.read_array(&mut buf), 3);
    assert_eq!(&buf[..3], b"def");
}

#[test]
fn refused_connect_fails_quickly() {
    let (l, port) = listener();
    drop(l);
    let mut client = WifiClient::new();
    let started = Instant::now();
    assert!(!client.connect("127.0.0.1", port));
    assert!(!client.connected());
    assert!(started.elapsed() < Duration::from_secs(3));
}

#[test]
fn large_write_reaches_slow_reader() {
    let (a, mut b) = UnixStream::pair().unwrap();
    let payload: Vec<u8> = (0..256 * 1024).map(|i| (i % 251) as u8).collect();
    let expected = payload.clone();

    let reader = thread::spawn(move || {
        let mut got = Vec::new();
        let mut chunk = [0u8; 4096];
        loop {
            match b.read(&mut chunk) {
                Ok(0) => break,
                Ok(n) => {
                    got.extend_from_slice(&chunk[..n]);
                    thread::sleep(Duration::from_micros(200));
                }
                Err(e) => panic!("read: {e}"),
            }
        }
        got
    });

    let mut client = WifiClient::from_fd(OwnedFd::from(a));
    assert_eq!(client.write(&payload), payload.len());
    client.stop();
    assert_eq!(reader.join().unwrap(), expected);
}

#[cfg(any(target_os = "linux", target_os = "android"))]
#[test]
fn peer_closing_mid_write_returns_short_count() {
    let (a, mut b) = UnixStream::pair().unwrap();
    let reader = thread::spawn(move || {
        let mut chunk = [0u8; 1000];
        let _ = b.read(&mut chunk);
    });

    let payload = vec![0x55u8; 8 * 1024 * 1024];
    let mut client = WifiClient::from_fd(OwnedFd::from(a));
    let sent = client.write(&payload);
    reader.join().unwrap();
    assert!(sent < payload.len());
    assert!(!client.connected());
}

#[test]
fn stop_twice_through_transport() {
    let (a, _b) = UnixStream::pair().unwrap();
    let mut client = WifiClient::from_fd(OwnedFd::from(a));
    let t: &mut dyn Transport = &mut client;
    assert!(t.connected());
    t.stop();
    t.stop();
    assert!(!t.connected());
    assert_eq!(t.write(b"x"), 0);
    assert_eq!(t.read(), None);
}
