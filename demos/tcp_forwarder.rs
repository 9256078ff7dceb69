#![forbid(unsafe_code)]
//! Brings up a TCP listen face and accepts connections in a loop,
//! acknowledging each new peer face with a short frame.
//!
//! Run with:
//! cargo run --example tcp_forwarder

use face_table::{FaceManager, NodeRole};
use tracing::{info, warn};

#[tokio::main]
async fn main() -> face_table::Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(tracing::Level::INFO)
        .init();

    let mut faces = FaceManager::initialize(NodeRole::Router)?;
    let listen = faces.create_tcp_listener(6363).await?;
    info!(?listen, "tcp listen face up");

    loop {
        match faces.accept_tcp().await {
            Ok(id) => {
                info!(?id, "peer connected");
                if let Err(e) = faces.forced_send(id, b"welcome").await {
                    warn!(?id, error = %e, "welcome send failed");
                }
            }
            Err(e) => warn!(error = %e, "accept failed"),
        }
    }
}
