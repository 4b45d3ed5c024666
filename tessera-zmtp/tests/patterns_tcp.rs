//! Messaging patterns end to end over loopback TCP.

use std::io;
use std::time::Duration;

use bytes::Bytes;
use tessera_core::monitor::SocketEvent;
use tessera_core::options::SocketOptions;
use tessera_core::subscription::SubscriptionEvent;
use tessera_zmtp::pattern::{RepState, ReqState};
use tessera_zmtp::proxy::proxy;
use tessera_zmtp::transport::TcpAcceptor;
use tessera_zmtp::{
    ConnectionState, DealerSocket, PairSocket, PubSocket, PullSocket, PushSocket, RepSocket,
    ReqSocket, RouterSocket, Socket, SocketType, SubSocket,
};

async fn listen() -> (TcpAcceptor, String) {
    let acceptor = TcpAcceptor::bind("tcp://127.0.0.1:0").await.unwrap();
    let ep = acceptor.local_endpoint().to_string();
    (acceptor, ep)
}

fn msg(parts: &[&'static [u8]]) -> Vec<Bytes> {
    parts.iter().map(|p| Bytes::from_static(p)).collect()
}

#[compio::test]
async fn req_rep_alternates() {
    let (acceptor, ep) = listen().await;
    let (req, rep) = futures::join!(
        ReqSocket::connect(&ep, SocketOptions::default()),
        RepSocket::accept(&acceptor, SocketOptions::default()),
    );
    let (mut req, mut rep) = (req.unwrap(), rep.unwrap());

    for i in 0..3u8 {
        req.send(vec![Bytes::from(vec![b'q', i])]).await.unwrap();
        assert_eq!(req.req_state(), ReqState::AwaitingReply);

        let request = rep.recv().await.unwrap().unwrap();
        assert_eq!(request, vec![Bytes::from(vec![b'q', i])]);
        assert_eq!(rep.rep_state(), RepState::ReadyToReply);

        rep.send(vec![Bytes::from(vec![b'a', i])]).await.unwrap();
        let reply = req.recv().await.unwrap().unwrap();
        assert_eq!(reply, vec![Bytes::from(vec![b'a', i])]);
        assert_eq!(req.req_state(), ReqState::Idle);
    }

    let err = req.recv().await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);

    req.send(msg(&[b"one"])).await.unwrap();
    let err = req.send(msg(&[b"two"])).await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
}

#[compio::test]
async fn req_to_router_carries_envelope() {
    let (acceptor, ep) = listen().await;
    let (req, router) = futures::join!(
        ReqSocket::connect(&ep, SocketOptions::default()),
        RouterSocket::accept(&acceptor, SocketOptions::default()),
    );
    let (mut req, mut router) = (req.unwrap(), router.unwrap());

    let id = router.peer_routing_id().cloned().unwrap();
    assert_eq!(&id[..], &[0, 0, 0, 0, 1]);

    req.send(msg(&[b"hello"])).await.unwrap();
    let inbound = router.recv().await.unwrap().unwrap();
    assert_eq!(inbound, vec![id.clone(), Bytes::new(), Bytes::from_static(b"hello")]);

    router
        .send(vec![id, Bytes::new(), Bytes::from_static(b"world")])
        .await
        .unwrap();
    assert_eq!(req.recv().await.unwrap().unwrap(), msg(&[b"world"]));
}

#[compio::test]
async fn dealer_router_with_routing_id() {
    let (acceptor, ep) = listen().await;
    let dealer_opts = SocketOptions::default().with_routing_id(Bytes::from_static(b"client-1"));
    let (dealer, router) = futures::join!(
        DealerSocket::connect(&ep, dealer_opts),
        RouterSocket::accept(&acceptor, SocketOptions::default()),
    );
    let (mut dealer, mut router) = (dealer.unwrap(), router.unwrap());

    assert_eq!(router.peer_routing_id().map(|b| &b[..]), Some(&b"client-1"[..]));
    assert_eq!(router.peer_socket_type(), SocketType::Dealer);

    dealer.send(msg(&[b"job", b"42"])).await.unwrap();
    assert_eq!(
        router.recv().await.unwrap().unwrap(),
        msg(&[b"client-1", b"job", b"42"])
    );

    router.send(msg(&[b"client-1", b"done"])).await.unwrap();
    assert_eq!(dealer.recv().await.unwrap().unwrap(), msg(&[b"done"]));

    // Unknown identities are dropped silently until mandatory routing is on.
    router.send(msg(&[b"ghost", b"x"])).await.unwrap();
    router.set_router_mandatory(true);
    let err = router.send(msg(&[b"ghost", b"x"])).await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::NotFound);
}

#[compio::test]
async fn pub_sub_filters_by_prefix() {
    let (acceptor, ep) = listen().await;
    let mut publisher: PubSocket = PubSocket::new();
    let (key, sub) = futures::join!(
        publisher.accept(&acceptor),
        SubSocket::connect(&ep, SocketOptions::default()),
    );
    let (key, mut sub) = (key.unwrap(), sub.unwrap());
    assert_eq!(publisher.peer_count(), 1);

    sub.subscribe(b"weather").await.unwrap();
    // Second reference to the same prefix is not sent upstream.
    sub.subscribe(b"weather").await.unwrap();
    let event = publisher.recv_subscription(key).await.unwrap().unwrap();
    assert_eq!(event, SubscriptionEvent::Subscribe(Bytes::from_static(b"weather")));
    assert_eq!(publisher.subscription_count(), 1);

    publisher.send(msg(&[b"sports", b"0-0"])).await.unwrap();
    publisher.send(msg(&[b"weather.paris", b"20C"])).await.unwrap();
    assert_eq!(
        sub.recv().await.unwrap().unwrap(),
        msg(&[b"weather.paris", b"20C"])
    );

    publisher.send(msg(&[b"sports", b"1-0"])).await.unwrap();
    sub.set_recv_timeout(Some(Duration::from_millis(50)));
    let err = sub.recv().await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::TimedOut);

    let err = sub.send(msg(&[b"nope"])).await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::Unsupported);
    let err = Socket::recv(&mut publisher).await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::Unsupported);
}

#[compio::test]
async fn failed_subscription_send_is_rolled_back() {
    let (acceptor, ep) = listen().await;
    let mut publisher: PubSocket = PubSocket::new();
    let (key, sub) = futures::join!(
        publisher.accept(&acceptor),
        SubSocket::connect(&ep, SocketOptions::default()),
    );
    let (key, mut sub) = (key.unwrap(), sub.unwrap());

    sub.set_send_timeout(Some(Duration::ZERO));
    let err = sub.subscribe(b"weather").await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    assert!(sub.subscriptions().is_empty());

    sub.set_send_timeout(None);
    sub.subscribe(b"weather").await.unwrap();
    let event = publisher.recv_subscription(key).await.unwrap().unwrap();
    assert_eq!(event, SubscriptionEvent::Subscribe(Bytes::from_static(b"weather")));

    sub.set_send_timeout(Some(Duration::ZERO));
    let err = sub.unsubscribe(b"weather").await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::WouldBlock);
    assert!(sub.subscriptions().matches(b"weather.paris"));

    sub.set_send_timeout(None);
    sub.unsubscribe(b"weather").await.unwrap();
    let event = publisher.recv_subscription(key).await.unwrap().unwrap();
    assert_eq!(event, SubscriptionEvent::Unsubscribe(Bytes::from_static(b"weather")));
    assert!(sub.subscriptions().is_empty());
}

#[compio::test]
async fn push_round_robins_over_pulls() {
    let (acceptor, ep) = listen().await;
    let mut push: PushSocket = PushSocket::new();

    let err = push.send(msg(&[b"early"])).await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::NotConnected);

    let (k1, first) = futures::join!(
        push.accept(&acceptor),
        PullSocket::connect(&ep, SocketOptions::default()),
    );
    k1.unwrap();
    let mut first = first.unwrap();
    let (k2, second) = futures::join!(
        push.accept(&acceptor),
        PullSocket::connect(&ep, SocketOptions::default()),
    );
    k2.unwrap();
    let mut second = second.unwrap();
    assert_eq!(push.peer_count(), 2);

    let parts: [&'static [u8]; 4] = [b"m0", b"m1", b"m2", b"m3"];
    for m in parts {
        push.send(msg(&[m])).await.unwrap();
    }

    assert_eq!(first.recv().await.unwrap().unwrap(), msg(&[b"m0"]));
    assert_eq!(first.recv().await.unwrap().unwrap(), msg(&[b"m2"]));
    assert_eq!(second.recv().await.unwrap().unwrap(), msg(&[b"m1"]));
    assert_eq!(second.recv().await.unwrap().unwrap(), msg(&[b"m3"]));

    let err = first.send(msg(&[b"back"])).await.unwrap_err();
    assert_eq!(err.kind(), io::ErrorKind::Unsupported);
}

#[compio::test]
async fn pair_close_is_seen_as_end_of_stream() {
    let (acceptor, ep) = listen().await;
    let (a, b) = futures::join!(
        PairSocket::connect(&ep, SocketOptions::default()),
        PairSocket::accept(&acceptor, SocketOptions::default()),
    );
    let (mut a, mut b) = (a.unwrap(), b.unwrap());
    assert!(a.is_connected());
    assert_eq!(a.state(), ConnectionState::Active);

    a.send(msg(&[b"ping", b"x"])).await.unwrap();
    assert_eq!(b.recv().await.unwrap().unwrap(), msg(&[b"ping", b"x"]));
    b.send(msg(&[b"pong"])).await.unwrap();
    assert_eq!(a.recv().await.unwrap().unwrap(), msg(&[b"pong"]));

    let monitor = a.monitor();
    a.close().await.unwrap();
    a.close().await.unwrap();
    assert!(!a.is_connected());
    assert!(matches!(monitor.try_recv(), Ok(SocketEvent::Closed(_))));

    assert!(b.recv().await.unwrap().is_none());
    assert_eq!(b.state(), ConnectionState::Closed);
}

#[compio::test]
async fn recv_timeout_and_nonblocking() {
    let (acceptor, ep) = listen().await;
    let (a, b) = futures::join!(
        DealerSocket::connect(&ep, SocketOptions::default().with_tcp_keepalive(true)),
        DealerSocket::accept(&acceptor, SocketOptions::default()),
    );
    let (mut a, mut b) = (a.unwrap(), b.unwrap());

    a.set_recv_timeout(Some(Duration::from_millis(30)));
    assert_eq!(a.recv().await.unwrap_err().kind(), io::ErrorKind::TimedOut);

    a.set_recv_timeout(Some(Duration::ZERO));
    assert_eq!(a.recv().await.unwrap_err().kind(), io::ErrorKind::WouldBlock);

    b.send(msg(&[b"late"])).await.unwrap();
    a.set_recv_timeout(Some(Duration::from_secs(5)));
    assert_eq!(a.recv().await.unwrap().unwrap(), msg(&[b"late"]));
}

#[compio::test]
async fn proxy_forwards_until_frontend_closes() {
    let (front, front_ep) = listen().await;
    let (back, back_ep) = listen().await;

    let mut producer: PushSocket = PushSocket::new();
    let (k, frontend) = futures::join!(
        producer.connect(&front_ep),
        PullSocket::accept(&front, SocketOptions::default()),
    );
    k.unwrap();
    let mut frontend = frontend.unwrap();

    let mut backend: PushSocket = PushSocket::new();
    let (k, worker) = futures::join!(
        backend.accept(&back),
        PullSocket::connect(&back_ep, SocketOptions::default()),
    );
    k.unwrap();
    let mut worker = worker.unwrap();

    let parts: [&'static [u8]; 3] = [b"a", b"b", b"c"];
    for m in parts {
        producer.send(msg(&[m])).await.unwrap();
    }
    producer.close().await.unwrap();

    let forwarded = proxy(&mut frontend, &mut backend).await.unwrap();
    assert_eq!(forwarded, 3);
    for m in parts {
        assert_eq!(worker.recv().await.unwrap().unwrap(), msg(&[m]));
    }
}

async fn exchange<A: Socket, B: Socket>(a: &mut A, b: &mut B) -> io::Result<Vec<Bytes>> {
    a.send(msg(&[b"via", b"trait"])).await?;
    b.recv()
        .await?
        .ok_or_else(|| io::Error::from(io::ErrorKind::UnexpectedEof))
}

#[compio::test]
async fn socket_trait_is_uniform() {
    let (acceptor, ep) = listen().await;
    let (a, b) = futures::join!(
        PairSocket::connect(&ep, SocketOptions::default()),
        PairSocket::accept(&acceptor, SocketOptions::default()),
    );
    let (mut a, mut b) = (a.unwrap(), b.unwrap());

    assert_eq!(Socket::socket_type(&a), SocketType::Pair);
    assert_eq!(exchange(&mut a, &mut b).await.unwrap(), msg(&[b"via", b"trait"]));
}

#[cfg(unix)]
#[compio::test]
async fn ipc_pair_round_trip() {
    use tessera_zmtp::transport::IpcAcceptor;

    let path = std::env::temp_dir().join(format!("tessera-pair-{}.sock", std::process::id()));
    let ep = format!("ipc://{}", path.display());
    let acceptor = IpcAcceptor::bind(&ep).await.unwrap();

    let (a, b) = futures::join!(
        PairSocket::connect_ipc(&ep, SocketOptions::default()),
        PairSocket::accept_ipc(&acceptor, SocketOptions::default()),
    );
    let (mut a, mut b) = (a.unwrap(), b.unwrap());

    a.send(msg(&[b"over", b"ipc"])).await.unwrap();
    assert_eq!(b.recv().await.unwrap().unwrap(), msg(&[b"over", b"ipc"]));
    assert!(a.last_endpoint().is_some());

    drop(acceptor);
    assert!(!path.exists());
}
