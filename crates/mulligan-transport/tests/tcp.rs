//! Integration tests for the TCP transport.
//!
//! These spin up a real listener on a loopback port and connect real
//! sockets, verifying that bytes actually flow and that closure is
//! observable from both sides.

use mulligan_transport::TcpTransport;
use tokio::io::{AsyncReadExt, AsyncWriteExt};
use tokio::net::TcpStream;

/// Binds a transport on an OS-assigned port and returns it with the
/// address a client should dial.
async fn bind_ephemeral() -> (TcpTransport, String) {
    let transport = TcpTransport::bind("127.0.0.1:0")
        .await
        .expect("should bind");
    let addr = transport
        .local_addr()
        .expect("should have local addr")
        .to_string();
    (transport, addr)
}

#[tokio::test]
async fn test_accept_and_send_reaches_client() {
    let (transport, addr) = bind_ephemeral().await;

    let accept = tokio::spawn(async move {
        transport.accept().await.expect("should accept")
    });
    let mut client = TcpStream::connect(&addr).await.expect("connect");
    let (conn, _read_half) = accept.await.expect("task");

    assert!(conn.id().into_inner() > 0);

    conn.send(b"hello from server").await.expect("send");

    let mut buf = [0u8; 17];
    client.read_exact(&mut buf).await.expect("read");
    assert_eq!(&buf, b"hello from server");
}

#[tokio::test]
async fn test_read_half_receives_client_bytes() {
    let (transport, addr) = bind_ephemeral().await;

    let accept = tokio::spawn(async move {
        transport.accept().await.expect("should accept")
    });
    let mut client = TcpStream::connect(&addr).await.expect("connect");
    let (_conn, mut read_half) = accept.await.expect("task");

    client.write_all(b"ping").await.expect("write");

    let mut buf = [0u8; 4];
    read_half.read_exact(&mut buf).await.expect("read");
    assert_eq!(&buf, b"ping");
}

#[tokio::test]
async fn test_clones_share_the_same_socket() {
    let (transport, addr) = bind_ephemeral().await;

    let accept = tokio::spawn(async move {
        transport.accept().await.expect("should accept")
    });
    let mut client = TcpStream::connect(&addr).await.expect("connect");
    let (conn, _read_half) = accept.await.expect("task");

    // A clone is the same connection: same id, same socket underneath.
    let clone = conn.clone();
    assert_eq!(clone.id(), conn.id());

    conn.send(b"one").await.expect("send");
    clone.send(b"two").await.expect("send via clone");

    let mut buf = [0u8; 6];
    client.read_exact(&mut buf).await.expect("read");
    assert_eq!(&buf, b"onetwo");
}

#[tokio::test]
async fn test_close_delivers_eof_to_client() {
    let (transport, addr) = bind_ephemeral().await;

    let accept = tokio::spawn(async move {
        transport.accept().await.expect("should accept")
    });
    let mut client = TcpStream::connect(&addr).await.expect("connect");
    let (conn, _read_half) = accept.await.expect("task");

    conn.close().await.expect("close");

    let mut buf = [0u8; 1];
    let n = client.read(&mut buf).await.expect("read after close");
    assert_eq!(n, 0, "client should see EOF");
}

#[tokio::test]
async fn test_connection_ids_are_unique_per_accept() {
    let (transport, addr) = bind_ephemeral().await;

    let accept = tokio::spawn(async move {
        let first = transport.accept().await.expect("accept one");
        let second = transport.accept().await.expect("accept two");
        (first, second)
    });
    let _c1 = TcpStream::connect(&addr).await.expect("connect");
    let _c2 = TcpStream::connect(&addr).await.expect("connect");
    let ((conn1, _), (conn2, _)) = accept.await.expect("task");

    assert_ne!(conn1.id(), conn2.id());
}
