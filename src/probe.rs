//! The Interest-Link probe: a small frame emitted when a new face is
//! brought up so the peer learns about this forwarder.
//!
//! spec.md explicitly scopes the frame codec itself out ("the frame codec
//! that builds an Interest-Link probe message" is an external
//! collaborator). The Face Manager only needs *something* that can build
//! one; it takes that something as an injected dependency rather than
//! hard-coding a format, the same way `maestro-rs`'s `TcpHandler`/`UdpHandler`
//! traits let the embedding binary supply behaviour the framework itself
//! doesn't know about.

use crate::ids::FaceId;

/// Builds the bytes of an Interest-Link probe frame for a newly created
/// face. Implementors live outside this crate (the forwarder's
/// Interest/Data codec); the Face Manager never inspects the bytes it gets
/// back.
pub trait LinkProbeEncoder: Send + Sync {
    fn encode_link_probe(&self, face_id: FaceId) -> Vec<u8>;
}

/// A no-op encoder for callers that don't want link probes emitted (tests,
/// or a forwarder that announces itself some other way).
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLinkProbeEncoder;

impl LinkProbeEncoder for NullLinkProbeEncoder {
    fn encode_link_probe(&self, _face_id: FaceId) -> Vec<u8> {
        Vec::new()
    }
}
