use crate::{Error, Result};

/// Compile-time bound on the dynamic Face-ID range. Kept small for
/// `Receiver`, generous for `Router`, since a router is expected to carry
/// many concurrent peer faces while a receiver mostly talks to its
/// publishers and a handful of local applications.
const MAX_FACES_RECEIVER: u16 = 64;
const MAX_FACES_PUBLISHER: u16 = 128;
const MAX_FACES_ROUTER: u16 = 1024;

/// The role a forwarder process plays, chosen once at startup.
///
/// This is the sole configuration input to [`crate::FaceManager::initialize`],
/// mirroring the way `maestro-rs`'s `BindMode` is the sole configuration
/// input to its socket-binding helpers: a small `Copy` enum, no builder, no
/// file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeRole {
    /// Consumes Content Objects; talks to a small number of publishers.
    Receiver,
    /// Produces Content Objects; talks to a small number of subscribers.
    Publisher,
    /// Forwards on behalf of many peers; needs the largest face table.
    Router,
}

impl NodeRole {
    /// Compile-time bound on the number of faces (listen + dynamic) this
    /// role may hold open at once.
    pub const fn max_faces(self) -> u16 {
        match self {
            NodeRole::Receiver => MAX_FACES_RECEIVER,
            NodeRole::Publisher => MAX_FACES_PUBLISHER,
            NodeRole::Router => MAX_FACES_ROUTER,
        }
    }

    /// Resolves a role from a raw numeric code, e.g. one read from a config
    /// file or a wire-protocol handshake byte.
    ///
    /// The original source silently treats an unrecognized role as "no
    /// branch taken" rather than failing; spec.md flags this as an open
    /// question. We resolve it explicitly here: any code outside
    /// `0..=2` is a hard [`Error::UnknownRole`].
    pub fn from_code(code: u8) -> Result<Self> {
        match code {
            0 => Ok(NodeRole::Receiver),
            1 => Ok(NodeRole::Publisher),
            2 => Ok(NodeRole::Router),
            other => Err(Error::UnknownRole(other)),
        }
    }
}
