#![forbid(unsafe_code)]
//! Brings up a UDP listen face and a single outbound peer face, then sends
//! one datagram to the peer every second.
//!
//! Run with:
//! cargo run --example udp_peer -- <peer-host> <peer-port>

use std::env;

use face_table::{FaceManager, NodeRole, TransportKind};
use tracing::info;

#[tokio::main]
async fn main() -> face_table::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut args = env::args().skip(1);
    let host = args.next().unwrap_or_else(|| "127.0.0.1".to_string());
    let port: u16 = args.next().and_then(|p| p.parse().ok()).unwrap_or(6363);

    let mut faces = FaceManager::initialize(NodeRole::Receiver)?;
    let listen = faces.create_udp_listener(6363).await?;
    info!(?listen, "udp listen face up");

    let (peer, _) = faces.lookup_or_create(&host, port, TransportKind::Udp).await?;
    info!(?peer, host, port, "peer face resolved");

    loop {
        faces.forced_send(peer, b"heartbeat").await?;
        tokio::time::sleep(std::time::Duration::from_secs(1)).await;
    }
}
