//! End-to-end use of the facade API.

use std::io;
use std::time::Duration;

use tessera::dev_tracing::init_tracing;
use tessera::prelude::*;

#[compio::test]
async fn bind_helper_serves_first_peer() {
    init_tracing();

    let acceptor = TcpAcceptor::bind("tcp://127.0.0.1:0").await.unwrap();
    let ep = acceptor.local_endpoint().to_string();
    drop(acceptor);

    let (server, client) = futures::join!(
        RepSocket::bind(&ep, SocketOptions::default()),
        async {
            // Give bind a moment to run first.
            compio::time::sleep(Duration::from_millis(20)).await;
            ReqSocket::connect(&ep, SocketOptions::default()).await
        },
    );
    let (_acceptor, mut rep) = server.unwrap();
    let mut req = client.unwrap();

    req.send(vec![Bytes::from_static(b"ping")]).await.unwrap();
    let request = rep.recv().await.unwrap().unwrap();
    rep.send(request).await.unwrap();
    assert_eq!(
        req.recv().await.unwrap().unwrap(),
        vec![Bytes::from_static(b"ping")]
    );
}

#[compio::test]
async fn context_seeds_socket_options() {
    init_tracing();

    let ctx = Context::new().unwrap();
    ctx.set(ContextOption::MaxMessageSize(Some(16))).unwrap();
    let opts = ctx.socket_options().unwrap();
    let _slot = ctx.register_socket().unwrap();
    assert_eq!(ctx.live_sockets(), 1);

    let acceptor = TcpAcceptor::bind("tcp://127.0.0.1:0").await.unwrap();
    let ep = acceptor.local_endpoint().to_string();
    let (a, b) = futures::join!(
        PairSocket::connect(&ep, opts.clone()),
        PairSocket::accept(&acceptor, opts),
    );
    let (mut a, mut b) = (a.unwrap(), b.unwrap());

    let err = a
        .send(vec![Bytes::from(vec![0u8; 64])])
        .await
        .unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

    a.send(vec![Bytes::from_static(b"small")]).await.unwrap();
    assert_eq!(
        b.recv().await.unwrap().unwrap(),
        vec![Bytes::from_static(b"small")]
    );

    ctx.terminate().unwrap();
    assert!(ctx.terminate().is_err());
}

#[compio::test]
async fn pub_sub_through_facade() {
    init_tracing();

    let acceptor = TcpAcceptor::bind("tcp://127.0.0.1:0").await.unwrap();
    let ep = acceptor.local_endpoint().to_string();

    let mut publisher: PubSocket = PubSocket::new();
    let (key, sub) = futures::join!(
        publisher.accept(&acceptor),
        SubSocket::connect(&ep, SocketOptions::default()),
    );
    let (key, mut sub) = (key.unwrap(), sub.unwrap());

    sub.subscribe(b"").await.unwrap();
    assert!(publisher.recv_subscription(key).await.unwrap().is_some());

    publisher
        .send(vec![Bytes::from_static(b"any"), Bytes::from_static(b"thing")])
        .await
        .unwrap();
    let got = sub.recv().await.unwrap().unwrap();
    assert_eq!(got.len(), 2);
    assert_eq!(Socket::socket_type(&sub), SocketType::Sub);
}
