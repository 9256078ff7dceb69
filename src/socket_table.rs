//! The Socket Index (spec.md §2 C2): a keyed container mapping a canonical
//! peer-key to an [`EndpointRecord`], handing back a stable, revocable slot
//! handle.
//!
//! This is the arena+index pattern spec.md §9 asks for: the table is the
//! arena, [`SlotHandle`] is the opaque handle the Face Table stores instead
//! of a pointer, and an [`EndpointRecord`] carries its own Face-ID back
//! rather than a cyclic reference. The "opaque keyed container" spec.md
//! calls out as an external collaborator is simply `std::collections::HashMap`
//! here — there is nothing bespoke to build for it.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::os::fd::{AsRawFd, RawFd};

use tokio::net::{TcpListener, TcpStream, UdpSocket, UnixDatagram, UnixListener, UnixStream};

use crate::ids::{FaceId, TransportKind};

/// The OS resource owned by an [`EndpointRecord`]. Holding the real tokio
/// socket type (rather than a bare fd) means descriptor release is just
/// `Drop` — there is no separate "close the fd" step to forget.
pub(crate) enum EndpointResource {
    TcpListener(TcpListener),
    TcpStream(TcpStream),
    UdpSocket(UdpSocket),
    UnixListener(UnixListener),
    UnixStream(UnixStream),
    UnixDatagram(UnixDatagram),
}

impl EndpointResource {
    pub(crate) fn raw_fd(&self) -> RawFd {
        match self {
            EndpointResource::TcpListener(s) => s.as_raw_fd(),
            EndpointResource::TcpStream(s) => s.as_raw_fd(),
            EndpointResource::UdpSocket(s) => s.as_raw_fd(),
            EndpointResource::UnixListener(s) => s.as_raw_fd(),
            EndpointResource::UnixStream(s) => s.as_raw_fd(),
            EndpointResource::UnixDatagram(s) => s.as_raw_fd(),
        }
    }

    pub(crate) fn kind(&self) -> TransportKind {
        match self {
            EndpointResource::TcpListener(_) | EndpointResource::TcpStream(_) => {
                TransportKind::Tcp
            }
            EndpointResource::UdpSocket(_) => TransportKind::Udp,
            EndpointResource::UnixListener(_)
            | EndpointResource::UnixStream(_)
            | EndpointResource::UnixDatagram(_) => TransportKind::Local,
        }
    }

    pub(crate) fn as_tcp_listener(&self) -> Option<&TcpListener> {
        match self {
            EndpointResource::TcpListener(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_tcp_stream(&self) -> Option<&TcpStream> {
        match self {
            EndpointResource::TcpStream(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_udp_socket(&self) -> Option<&UdpSocket> {
        match self {
            EndpointResource::UdpSocket(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_unix_listener(&self) -> Option<&UnixListener> {
        match self {
            EndpointResource::UnixListener(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_unix_stream(&self) -> Option<&UnixStream> {
        match self {
            EndpointResource::UnixStream(s) => Some(s),
            _ => None,
        }
    }

    pub(crate) fn as_unix_datagram(&self) -> Option<&UnixDatagram> {
        match self {
            EndpointResource::UnixDatagram(s) => Some(s),
            _ => None,
        }
    }
}

/// One peer or listener: descriptor (via the owned [`EndpointResource`]),
/// peer address (if any), transport kind, and the Face-ID it resolves to.
pub(crate) struct EndpointRecord {
    pub(crate) key: String,
    pub(crate) resource: EndpointResource,
    pub(crate) peer_addr: Option<SocketAddr>,
    pub(crate) kind: TransportKind,
    pub(crate) face_id: FaceId,
}

/// Opaque handle into the [`SocketTable`] arena. The Face Table stores this
/// instead of a pointer, so closing a face can never leave a dangling
/// reference: the handle simply stops resolving to anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct SlotHandle(usize);

impl SlotHandle {
    #[cfg(test)]
    pub(crate) fn test_handle(v: usize) -> Self {
        SlotHandle(v)
    }
}

/// The Socket Index: peer-key → [`EndpointRecord`], backed by an arena of
/// slots so removal never shifts anyone else's handle.
#[derive(Default)]
pub(crate) struct SocketTable {
    arena: Vec<Option<EndpointRecord>>,
    index: HashMap<String, SlotHandle>,
}

impl SocketTable {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn contains_key(&self, key: &str) -> bool {
        self.index.contains_key(key)
    }

    pub(crate) fn get_by_key(&self, key: &str) -> Option<&EndpointRecord> {
        let handle = *self.index.get(key)?;
        self.get(handle)
    }

    pub(crate) fn handle_for_key(&self, key: &str) -> Option<SlotHandle> {
        self.index.get(key).copied()
    }

    pub(crate) fn get(&self, handle: SlotHandle) -> Option<&EndpointRecord> {
        self.arena.get(handle.0).and_then(|slot| slot.as_ref())
    }

    /// Inserts a new record, overwriting any existing record under the same
    /// key. Callers that must preserve invariant 2 (key uniqueness) are
    /// expected to close the old face themselves first; this call alone
    /// does not decide that policy.
    pub(crate) fn insert(&mut self, record: EndpointRecord) -> SlotHandle {
        let key = record.key.clone();

        if let Some(free) = self.arena.iter().position(Option::is_none) {
            self.arena[free] = Some(record);
            let handle = SlotHandle(free);
            self.index.insert(key, handle);
            return handle;
        }

        self.arena.push(Some(record));
        let handle = SlotHandle(self.arena.len() - 1);
        self.index.insert(key, handle);
        handle
    }

    /// Removes and returns the record at `handle`, if any live record is
    /// there. Idempotent: calling this twice on the same handle is a no-op
    /// the second time.
    pub(crate) fn remove(&mut self, handle: SlotHandle) -> Option<EndpointRecord> {
        let record = self.arena.get_mut(handle.0)?.take()?;
        self.index.remove(&record.key);
        Some(record)
    }

    pub(crate) fn len(&self) -> usize {
        self.index.len()
    }
}
