#![forbid(unsafe_code)]

//! A Face Table core for an ICN/CEFORE-style forwarder daemon.
//!
//! This crate owns exactly one thing: the mapping between a small integer
//! Face-ID and the UDP, TCP or UNIX-domain socket behind it. FIB, PIT and
//! Content Store lookups, and the event loop that drives them, live outside
//! this crate — [`FaceManager`] is the boundary those layers talk across.
//!
//! # Example
//!
//! ```rust,no_run
//! use face_table::{FaceManager, NodeRole, TransportKind};
//!
//! # async fn run() -> face_table::Result<()> {
//! let mut faces = FaceManager::initialize(NodeRole::Router)?;
//! let listen = faces.create_udp_listener(6363).await?;
//! let (peer, _) = faces.lookup_or_create("198.51.100.7", 6363, TransportKind::Udp).await?;
//! faces.forced_send(peer, b"hello").await?;
//! faces.close_face(listen);
//! # Ok(())
//! # }
//! ```
mod error;
mod face_table;
mod ids;
mod manager;
mod probe;
mod role;
mod socket_table;
mod wire;

pub use error::{Error, Result};
pub use ids::{peer_key, FaceId, IpPreference, LocalSocketKind, ReservedFace, TransportKind};
pub use manager::{FaceManager, FaceManagerStats, TcpPollEntry};
pub use probe::{LinkProbeEncoder, NullLinkProbeEncoder};
pub use role::NodeRole;
pub use wire::{LocalAppHeader, HEADER_TYPE_INTERNAL, HEADER_VERSION};
