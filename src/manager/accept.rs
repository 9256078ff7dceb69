//! The TCP Accept Path (spec.md §4.6 C7): accepts on whichever of the IPv4
//! or IPv6 TCP listen faces has a pending connection, resolves the peer
//! under the canonical key, and supersedes a stale face under key
//! collision.

use std::net::SocketAddr;
use std::os::fd::AsRawFd;

use tokio::net::TcpStream;

use super::FaceManager;
use crate::error::{Error, Result};
use crate::ids::{peer_key, FaceId, ReservedFace, TransportKind};
use crate::socket_table::{EndpointRecord, EndpointResource};

impl FaceManager {
    fn tcp_listener(&self, id: FaceId) -> Option<&tokio::net::TcpListener> {
        let handle = self.faces.get(id).filter(|slot| !slot.is_free())?.socket_slot?;
        self.sockets.get(handle)?.resource.as_tcp_listener()
    }

    async fn accept_from_either_listener(&self) -> Result<(TcpStream, SocketAddr)> {
        let v4 = self.tcp_listener(ReservedFace::ListenTcpV4.face_id());
        let v6 = self.tcp_listener(ReservedFace::ListenTcpV6.face_id());

        match (v4, v6) {
            (Some(v4), Some(v6)) => {
                tokio::select! {
                    res = v4.accept() => res.map_err(Error::Io),
                    res = v6.accept() => res.map_err(Error::Io),
                }
            }
            (Some(v4), None) => v4.accept().await.map_err(Error::Io),
            (None, Some(v6)) => v6.accept().await.map_err(Error::Io),
            (None, None) => Err(Error::FaceClosed(ReservedFace::ListenTcpV4.face_id().0)),
        }
    }

    /// Waits for and accepts one inbound TCP connection, turning it into a
    /// peer face. If a face already exists under the remote address's key
    /// (e.g. the peer reconnected without us noticing the old socket died),
    /// that face is closed first so the new one cleanly takes its place.
    pub async fn accept_tcp(&mut self) -> Result<FaceId> {
        let (stream, peer_addr) = self.accept_from_either_listener().await?;
        self.register_accepted_tcp(stream, peer_addr).await
    }

    async fn register_accepted_tcp(&mut self, stream: TcpStream, peer_addr: SocketAddr) -> Result<FaceId> {
        let key = peer_key(&peer_addr.ip().to_string(), TransportKind::Tcp);

        if let Some(old) = self.sockets.get_by_key(&key) {
            let stale = old.face_id;
            self.close_face(stale);
        }

        // Any failure from here returns before `stream` is stored anywhere,
        // so dropping it on the way out closes the accepted descriptor.
        let id = self.allocate_face_id()?;
        let fd = stream.as_raw_fd();
        let handle = self.sockets.insert(EndpointRecord {
            key,
            resource: EndpointResource::TcpStream(stream),
            peer_addr: Some(peer_addr),
            kind: TransportKind::Tcp,
            face_id: id,
        });
        self.faces.populate(id, handle, fd, TransportKind::Tcp);

        let probe = self.probe_encoder.encode_link_probe(id);
        if !probe.is_empty() {
            self.forced_send(id, &probe).await?;
        }
        Ok(id)
    }
}
