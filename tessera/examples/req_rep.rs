//! REQ/REP echo over loopback TCP.
//!
//! Run with `RUST_LOG=debug cargo run --example req_rep` to see the
//! handshake and framing trace.

use std::io;

use tessera::dev_tracing::init_tracing;
use tessera::prelude::*;

#[compio::main]
async fn main() -> io::Result<()> {
    init_tracing();

    let acceptor = TcpAcceptor::bind("tcp://127.0.0.1:0").await?;
    let endpoint = acceptor.local_endpoint().to_string();
    println!("REP listening on {endpoint}");

    let server = compio::runtime::spawn(async move {
        let mut rep = RepSocket::accept(&acceptor, SocketOptions::default()).await?;
        while let Some(request) = rep.recv().await? {
            let mut reply = request;
            reply.push(Bytes::from_static(b"ack"));
            rep.send(reply).await?;
        }
        Ok::<_, io::Error>(())
    });

    let mut req = ReqSocket::connect(&endpoint, SocketOptions::default()).await?;
    for i in 0..3 {
        req.send(vec![Bytes::from(format!("request {i}"))]).await?;
        if let Some(reply) = req.recv().await? {
            let text: Vec<_> = reply.iter().map(|f| String::from_utf8_lossy(f)).collect();
            println!("reply: {text:?}");
        }
    }

    req.close().await?;
    server.await?;
    Ok(())
}
