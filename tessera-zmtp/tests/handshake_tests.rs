//! Handshake behaviour against well-behaved and misbehaving peers.

use std::io;
use std::time::Duration;

use compio::buf::BufResult;
use compio::io::{AsyncReadExt, AsyncWriteExt};
use compio::net::TcpStream;
use tessera_core::options::SocketOptions;
use tessera_zmtp::greeting::{Mechanism, ZmtpGreeting, GREETING_SIZE};
use tessera_zmtp::handshake::perform_handshake;
use tessera_zmtp::transport::TcpAcceptor;
use tessera_zmtp::{PairSocket, PullSocket, RepSocket, SocketType};

async fn acceptor() -> (TcpAcceptor, std::net::SocketAddr) {
    let acceptor = TcpAcceptor::bind("tcp://127.0.0.1:0").await.unwrap();
    let addr = acceptor.local_addr().unwrap();
    (acceptor, addr)
}

#[compio::test]
async fn raw_handshake_exchanges_identity() {
    let (acceptor, addr) = acceptor().await;
    let server = compio::runtime::spawn(async move {
        let (mut stream, _) = acceptor.accept().await.unwrap();
        perform_handshake(&mut stream, SocketType::Router, None, Duration::from_secs(5)).await
    });

    let mut client = TcpStream::connect(addr).await.unwrap();
    let client_res = perform_handshake(
        &mut client,
        SocketType::Dealer,
        Some(&b"dealer-7"[..]),
        Duration::from_secs(5),
    )
    .await
    .unwrap();
    let server_res = server.await.unwrap();

    assert_eq!(client_res.peer_socket_type, SocketType::Router);
    assert_eq!(client_res.peer_identity, None);
    assert_eq!(client_res.peer_version, (3, 0));
    assert_eq!(server_res.peer_socket_type, SocketType::Dealer);
    assert_eq!(server_res.peer_identity.as_deref(), Some(&b"dealer-7"[..]));
}

#[compio::test]
async fn incompatible_types_are_rejected() {
    let (acceptor, addr) = acceptor().await;
    let server = compio::runtime::spawn(async move {
        RepSocket::accept(&acceptor, SocketOptions::default()).await
    });

    let ep = format!("tcp://{addr}");
    let err = PullSocket::connect(&ep, SocketOptions::default()).await.err().unwrap();
    assert_eq!(err.kind(), io::ErrorKind::Other);
    assert!(err.to_string().contains("Handshake failed"));
    assert!(server.await.is_err());
}

#[compio::test]
async fn curve_mechanism_is_refused() {
    let (acceptor, addr) = acceptor().await;
    let server = compio::runtime::spawn(async move {
        PairSocket::accept(&acceptor, SocketOptions::default()).await
    });

    let mut raw = TcpStream::connect(addr).await.unwrap();
    let mut greeting = ZmtpGreeting::null(false);
    greeting.mechanism = Mechanism::Curve;
    let BufResult(res, _) = raw.write_all(greeting.encode().to_vec()).await;
    res.unwrap();

    let BufResult(res, theirs) = raw.read_exact(vec![0u8; GREETING_SIZE]).await;
    res.unwrap();
    assert_eq!(ZmtpGreeting::parse(&theirs).unwrap().mechanism, Mechanism::Null);

    let err = server.await.err().unwrap();
    assert!(err.to_string().contains("CURVE"));
}

#[compio::test]
async fn silent_peer_times_out() {
    let (acceptor, addr) = acceptor().await;
    let opts = SocketOptions::default().with_handshake_timeout(Duration::from_millis(50));
    let server = compio::runtime::spawn(async move { PairSocket::accept(&acceptor, opts).await });

    let _raw = TcpStream::connect(addr).await.unwrap();

    let err = server.await.err().unwrap();
    assert_eq!(err.kind(), io::ErrorKind::Other);
    assert!(err.to_string().contains("timed out"));
}
