//! One publisher, two subscribers with different topic prefixes.

use std::io;
use std::time::Duration;

use tessera::dev_tracing::init_tracing;
use tessera::prelude::*;

#[compio::main]
async fn main() -> io::Result<()> {
    init_tracing();

    let acceptor = TcpAcceptor::bind("tcp://127.0.0.1:0").await?;
    let endpoint = acceptor.local_endpoint().to_string();

    let mut publisher: PubSocket = PubSocket::new();
    let mut subscribers = Vec::new();
    for topic in [&b"weather."[..], &b"sports."[..]] {
        let (key, sub) = futures::join!(
            publisher.accept(&acceptor),
            SubSocket::connect(&endpoint, SocketOptions::default()),
        );
        let (key, mut sub) = (key?, sub?);
        sub.subscribe(topic).await?;
        publisher.recv_subscription(key).await?;
        subscribers.push(sub);
    }
    println!("{} subscribers attached", publisher.peer_count());

    for (topic, body) in [
        ("weather.paris", "20C"),
        ("sports.tennis", "6-4"),
        ("news.local", "nobody listens"),
        ("weather.oslo", "-3C"),
    ] {
        publisher
            .send(vec![Bytes::from(topic), Bytes::from(body)])
            .await?;
    }

    for (i, sub) in subscribers.iter_mut().enumerate() {
        sub.set_recv_timeout(Some(Duration::from_millis(100)));
        loop {
            match sub.recv().await {
                Ok(Some(msg)) => println!(
                    "subscriber {i}: {} {}",
                    String::from_utf8_lossy(&msg[0]),
                    String::from_utf8_lossy(&msg[1])
                ),
                Ok(None) => break,
                Err(e) if e.kind() == io::ErrorKind::TimedOut => break,
                Err(e) => return Err(e),
            }
        }
    }

    publisher.close().await
}
