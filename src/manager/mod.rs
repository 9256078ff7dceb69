//! The Face Manager: the crate's single public entry point, tying the Face
//! Table, Socket Index and Face-ID allocator (spec.md §2) together behind
//! `&mut self` methods. There is no internal locking anywhere in this type —
//! spec.md's "single-threaded, cooperative, externally-owned event loop"
//! constraint is enforced the same way `maestro-rs`'s handlers are: by
//! requiring exclusive access to run anything at all.

mod accept;
mod close;
mod listen;
mod local;
mod poll;
mod resolve;
mod send;

pub use poll::TcpPollEntry;

use std::os::fd::RawFd;
use std::sync::Arc;

use tracing::info;

use crate::error::{Error, Result};
use crate::face_table::FaceTable;
use crate::ids::{FaceId, IpPreference, ReservedFace, TransportKind};
use crate::probe::{LinkProbeEncoder, NullLinkProbeEncoder};
use crate::role::NodeRole;
use crate::socket_table::SocketTable;

/// Snapshot of Face Manager occupancy, a convenience this crate adds beyond
/// spec.md's External Interfaces table (see SPEC_FULL.md's supplemented
/// features).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceManagerStats {
    pub max_faces: u16,
    pub dynamic_in_use: usize,
    pub socket_index_len: usize,
}

/// Owns the Face Table, the Socket Index, and the dynamic Face-ID allocator
/// cursor. Every peer and listener the forwarder knows about is reachable
/// only through this type's methods.
pub struct FaceManager {
    role: NodeRole,
    pub(crate) faces: FaceTable,
    pub(crate) sockets: SocketTable,
    pub(crate) ip_preference: IpPreference,
    next_alloc: u16,
    pub(crate) probe_encoder: Arc<dyn LinkProbeEncoder>,
}

impl FaceManager {
    /// Allocates the Face Table (all slots zeroed) and the Socket Index
    /// sized for `role`'s `max_faces()`. Fails only if `role` cannot be
    /// resolved to a known role — see [`NodeRole::from_code`] for the
    /// fallible boundary constructor this is meant to be paired with.
    ///
    /// spec.md also asks this to fail "if already initialized"; in this
    /// crate that guard is structural rather than runtime-checked, since a
    /// `FaceManager` value can only be constructed once per call and two
    /// independent values can never collide over the same Face Table (see
    /// DESIGN.md). No link probes are emitted by this constructor; use
    /// [`FaceManager::with_link_probe_encoder`] to supply a non-null one.
    pub fn initialize(role: NodeRole) -> Result<Self> {
        Self::with_link_probe_encoder(role, Arc::new(NullLinkProbeEncoder))
    }

    /// Same as [`FaceManager::initialize`], but with an explicit
    /// [`LinkProbeEncoder`] for newly resolved peer faces (spec.md's
    /// out-of-scope "frame codec" external collaborator).
    pub fn with_link_probe_encoder(
        role: NodeRole,
        probe_encoder: Arc<dyn LinkProbeEncoder>,
    ) -> Result<Self> {
        let max_faces = role.max_faces();
        info!(?role, max_faces, "face manager initialized");
        Ok(FaceManager {
            role,
            faces: FaceTable::new(max_faces),
            sockets: SocketTable::new(),
            ip_preference: IpPreference::Both,
            next_alloc: ReservedFace::RESERVED,
            probe_encoder,
        })
    }

    pub fn role(&self) -> NodeRole {
        self.role
    }

    pub fn max_faces(&self) -> u16 {
        self.faces.max_faces()
    }

    /// The raw descriptor behind a face, or `None` if the face is unused or
    /// out of range.
    pub fn fd(&self, id: FaceId) -> Option<RawFd> {
        self.faces.get(id).filter(|slot| !slot.is_free()).map(|slot| slot.fd)
    }

    pub fn transport_kind(&self, id: FaceId) -> Option<TransportKind> {
        self.faces.get(id).filter(|slot| !slot.is_free()).map(|slot| slot.kind)
    }

    pub fn is_local(&self, id: FaceId) -> bool {
        self.faces.get(id).map(|slot| slot.local_flag).unwrap_or(false)
    }

    /// The next sequence number for `id`'s outgoing frames, wrapping on
    /// overflow. `None` if the face is unused or out of range.
    pub fn next_sequence(&mut self, id: FaceId) -> Option<u32> {
        self.faces.next_sequence(id)
    }

    pub fn stats(&self) -> FaceManagerStats {
        let dynamic_in_use = self
            .faces
            .iter_dynamic(ReservedFace::RESERVED)
            .filter(|(_, slot)| !slot.is_free())
            .count();
        FaceManagerStats {
            max_faces: self.faces.max_faces(),
            dynamic_in_use,
            socket_index_len: self.sockets.len(),
        }
    }

    /// The Face-ID Allocator (spec.md §4.2 C4): scans forward from the
    /// cursor through the dynamic range, wrapping once, and never returns a
    /// reserved id. O(max_faces) worst case, as spec.md requires.
    pub(crate) fn allocate_face_id(&mut self) -> Result<FaceId> {
        let max = self.faces.max_faces();
        let reserved = ReservedFace::RESERVED;
        if max <= reserved {
            return Err(Error::FaceTableFull);
        }
        let span = max - reserved;
        let start = self.next_alloc.clamp(reserved, max - 1);

        for offset in 0..span {
            let candidate = reserved + ((start - reserved + offset) % span);
            let id = FaceId(candidate);
            if self.faces.get(id).map(|slot| slot.is_free()).unwrap_or(false) {
                self.next_alloc = if candidate + 1 >= max { reserved } else { candidate + 1 };
                return Ok(id);
            }
        }
        Err(Error::FaceTableFull)
    }
}
