//! The Send Fan-out (spec.md §4.8 C8): three narrow entry points that all
//! share one guarded write path. Every one of them refuses descriptors
//! below 3 — fd 0 doubles as "face is free" in the Face Table, and 1/2 are
//! stdout/stderr, never a face this crate created.

use crate::error::{Error, Result};
use crate::ids::FaceId;
use crate::ids::TransportKind;
use crate::socket_table::EndpointResource;
use crate::wire::LocalAppHeader;

use super::FaceManager;

impl FaceManager {
    /// Writes `payload` to the face's underlying socket as-is. A TCP write
    /// failure closes the face; a UDP or local-socket failure is just
    /// returned, since datagram sends don't imply the peer is gone.
    pub async fn forced_send(&mut self, id: FaceId, payload: &[u8]) -> Result<usize> {
        if !self.faces.in_range(id) {
            return Err(Error::FaceOutOfRange(id.0));
        }
        let fd = self.fd(id).ok_or(Error::FaceClosed(id.0))?;
        if fd < 3 {
            return Err(Error::GuardedDescriptor(id.0));
        }
        let kind = self.transport_kind(id).unwrap_or(TransportKind::Invalid);
        let handle = self
            .faces
            .get(id)
            .and_then(|slot| slot.socket_slot)
            .ok_or(Error::FaceClosed(id.0))?;

        let result = {
            let record = self.sockets.get(handle).ok_or(Error::FaceClosed(id.0))?;
            match &record.resource {
                EndpointResource::TcpStream(s) => s
                    .writable()
                    .await
                    .and_then(|()| s.try_write(payload))
                    .map_err(Error::Io),
                EndpointResource::UdpSocket(s) => s.send(payload).await.map_err(Error::Io),
                EndpointResource::UnixStream(s) => s
                    .writable()
                    .await
                    .and_then(|()| s.try_write(payload))
                    .map_err(Error::Io),
                EndpointResource::UnixDatagram(s) => s.send(payload).await.map_err(Error::Io),
                EndpointResource::TcpListener(_) | EndpointResource::UnixListener(_) => {
                    Err(Error::FaceClosed(id.0))
                }
            }
        };

        if kind == TransportKind::Tcp && result.is_err() {
            self.close_face(id);
        }
        result
    }

    /// Sends a Content Object. On a non-local face this is identical to
    /// [`FaceManager::forced_send`] of `wire_bytes`. On a local face,
    /// `wire_bytes` is ignored and `payload` is sent instead, prefixed with
    /// the fixed application header (spec.md §6).
    pub async fn object_send(
        &mut self,
        id: FaceId,
        wire_bytes: &[u8],
        payload: &[u8],
        chunk_number: u32,
    ) -> Result<usize> {
        if !self.is_local(id) {
            return self.forced_send(id, wire_bytes).await;
        }

        let header = LocalAppHeader::for_content(payload.len() as u32, chunk_number);
        let mut frame = Vec::with_capacity(LocalAppHeader::ENCODED_LEN + payload.len());
        frame.extend_from_slice(&header.encode());
        frame.extend_from_slice(payload);
        self.forced_send(id, &frame).await
    }

    /// Sends `header ++ payload` unframed to a local application face. A
    /// no-op returning `Ok(0)` on a non-local face, so callers can fall
    /// back to another send path instead of treating it as an error.
    pub async fn local_api_send(&mut self, id: FaceId, header: &[u8], payload: &[u8]) -> Result<usize> {
        if !self.is_local(id) {
            return Ok(0);
        }
        let mut frame = Vec::with_capacity(header.len() + payload.len());
        frame.extend_from_slice(header);
        frame.extend_from_slice(payload);
        self.forced_send(id, &frame).await
    }
}
