//! Local-Peer-Face creation (spec.md §4.5): one face per connected
//! application on the UNIX-domain local listener, keyed by
//! `"app-face-<fd>"` rather than by address.

use std::os::fd::AsRawFd;

use tokio::net::UnixStream;

use super::FaceManager;
use crate::error::{Error, Result};
use crate::ids::{local_peer_key, FaceId, ReservedFace, TransportKind};
use crate::socket_table::{EndpointRecord, EndpointResource};

impl FaceManager {
    /// Registers an already-accepted local application connection as a
    /// face, or returns the existing one if this descriptor was somehow
    /// seen before (idempotent, like the network peer resolver).
    pub fn lookup_or_create_local(&mut self, stream: UnixStream) -> Result<FaceId> {
        let fd = stream.as_raw_fd();
        let key = local_peer_key(fd);

        if let Some(record) = self.sockets.get_by_key(&key) {
            return Ok(record.face_id);
        }

        let id = self.allocate_face_id()?;
        let handle = self.sockets.insert(EndpointRecord {
            key,
            resource: EndpointResource::UnixStream(stream),
            peer_addr: None,
            kind: TransportKind::Local,
            face_id: id,
        });
        self.faces.populate(id, handle, fd, TransportKind::Local);
        Ok(id)
    }

    /// Accepts one pending connection on the local listen face and turns it
    /// into a local peer face in one step.
    pub async fn accept_local(&mut self) -> Result<FaceId> {
        let listen_id = ReservedFace::LocalListen.face_id();
        let closed = || Error::FaceClosed(listen_id.0);

        let handle = self
            .faces
            .get(listen_id)
            .filter(|slot| !slot.is_free())
            .and_then(|slot| slot.socket_slot)
            .ok_or_else(closed)?;
        let listener = self
            .sockets
            .get(handle)
            .and_then(|record| record.resource.as_unix_listener())
            .ok_or_else(closed)?;

        let (stream, _addr) = listener.accept().await?;
        self.lookup_or_create_local(stream)
    }
}
