//! The Listen-Face Builder (spec.md §4.3 C5): creates UDP, NDN-over-UDP, TCP
//! and local listen faces, following the same socket2-then-tokio recipe
//! `maestro-rs`'s `bind_tcp_listener`/`bind_udp_sockets` use.

use std::io;
use std::net::{IpAddr, Ipv4Addr, Ipv6Addr, SocketAddr};
use std::os::fd::AsRawFd;
use std::path::Path;

use socket2::{Domain, Protocol, SockAddr, Socket, Type};
use tokio::net::{TcpListener, UdpSocket, UnixDatagram, UnixListener};
use tracing::{info, warn};

use super::FaceManager;
use crate::error::{Error, Result};
use crate::ids::{FaceId, IpPreference, LocalSocketKind, ReservedFace, TransportKind};
use crate::socket_table::{EndpointRecord, EndpointResource};

/// UNIX listener backlog: spec.md only ever has one local application
/// connected at a time.
const LOCAL_BACKLOG: i32 = 1;
/// TCP listener backlog for peer connections.
const TCP_BACKLOG: i32 = 16;

fn wildcard(port: u16, v6: bool) -> SocketAddr {
    if v6 {
        SocketAddr::new(IpAddr::V6(Ipv6Addr::UNSPECIFIED), port)
    } else {
        SocketAddr::new(IpAddr::V4(Ipv4Addr::UNSPECIFIED), port)
    }
}

fn bind_udp_socket(addr: SocketAddr) -> io::Result<UdpSocket> {
    let domain = if addr.is_ipv6() { Domain::IPV6 } else { Domain::IPV4 };
    let socket = Socket::new(domain, Type::DGRAM, Some(Protocol::UDP))?;
    socket.set_reuse_address(true)?;
    #[cfg(target_os = "linux")]
    socket.set_reuse_port(true)?;
    if addr.is_ipv6() {
        socket.set_only_v6(true)?;
    } else {
        socket.set_broadcast(true)?;
    }
    socket.bind(&addr.into())?;
    socket.set_nonblocking(true)?;
    UdpSocket::from_std(socket.into())
}

fn bind_tcp_listener(addr: SocketAddr) -> io::Result<TcpListener> {
    let domain = if addr.is_ipv6() { Domain::IPV6 } else { Domain::IPV4 };
    let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))?;
    socket.set_reuse_address(true)?;
    #[cfg(target_os = "linux")]
    socket.set_reuse_port(true)?;
    if addr.is_ipv6() {
        socket.set_only_v6(true)?;
    }
    socket.bind(&addr.into())?;
    socket.listen(TCP_BACKLOG)?;
    socket.set_nonblocking(true)?;
    TcpListener::from_std(socket.into())
}

fn bind_unix_listener(path: &Path) -> io::Result<UnixListener> {
    let socket = Socket::new(Domain::UNIX, Type::STREAM, None)?;
    socket.bind(&SockAddr::unix(path)?)?;
    socket.listen(LOCAL_BACKLOG)?;
    socket.set_nonblocking(true)?;
    UnixListener::from_std(socket.into())
}

fn bind_unix_datagram(path: &Path) -> io::Result<UnixDatagram> {
    let socket = Socket::new(Domain::UNIX, Type::DGRAM, None)?;
    socket.bind(&SockAddr::unix(path)?)?;
    socket.set_nonblocking(true)?;
    UnixDatagram::from_std(socket.into())
}

impl FaceManager {
    fn register_listener(
        &mut self,
        id: FaceId,
        resource: EndpointResource,
        key: String,
        kind: TransportKind,
    ) {
        let fd = resource.raw_fd();
        let handle = self.sockets.insert(EndpointRecord {
            key,
            resource,
            peer_addr: None,
            kind,
            face_id: id,
        });
        self.faces.populate(id, handle, fd, kind);
    }

    /// spec.md §4.3's preference rule: narrows outbound resolution to v6
    /// only when v4 failed and v6 succeeded on the most recent bring-up.
    fn update_ip_preference(&mut self, v4_ok: bool, v6_ok: bool) {
        if v4_ok {
            self.ip_preference = IpPreference::Both;
        } else if v6_ok {
            self.ip_preference = IpPreference::V6Only;
        }
    }

    async fn bind_udp_pair(
        &mut self,
        port: u16,
        tag: &str,
        reserved_v4: ReservedFace,
        reserved_v6: ReservedFace,
    ) -> Result<FaceId> {
        let v4_ok = match bind_udp_socket(wildcard(port, false)) {
            Ok(socket) => {
                self.register_listener(
                    reserved_v4.face_id(),
                    EndpointResource::UdpSocket(socket),
                    format!("0.0.0.0:{tag}"),
                    TransportKind::Udp,
                );
                true
            }
            Err(e) => {
                warn!(error = %e, port, tag, "ipv4 udp listener bind failed");
                false
            }
        };

        let v6_ok = match bind_udp_socket(wildcard(port, true)) {
            Ok(socket) => {
                self.register_listener(
                    reserved_v6.face_id(),
                    EndpointResource::UdpSocket(socket),
                    format!(":::{tag}"),
                    TransportKind::Udp,
                );
                true
            }
            Err(e) => {
                warn!(error = %e, port, tag, "ipv6 udp listener bind failed");
                false
            }
        };

        self.update_ip_preference(v4_ok, v6_ok);

        if v4_ok {
            Ok(reserved_v4.face_id())
        } else if v6_ok {
            Ok(reserved_v6.face_id())
        } else {
            Err(Error::NoAddressAvailable)
        }
    }

    /// Brings up the plain UDP listen faces on `port`, one socket per IP
    /// family that binds successfully.
    pub async fn create_udp_listener(&mut self, port: u16) -> Result<FaceId> {
        self.bind_udp_pair(port, "udp", ReservedFace::ListenUdpV4, ReservedFace::ListenUdpV6)
            .await
    }

    /// Same bring-up as [`FaceManager::create_udp_listener`], registered
    /// under the NDN-tagged reserved ids instead.
    pub async fn create_ndn_listener(&mut self, port: u16) -> Result<FaceId> {
        self.bind_udp_pair(port, "ndn", ReservedFace::ListenNdnV4, ReservedFace::ListenNdnV6)
            .await
    }

    /// Brings up the TCP listen faces on `port`, one socket per IP family
    /// that binds successfully.
    pub async fn create_tcp_listener(&mut self, port: u16) -> Result<FaceId> {
        let v4_ok = match bind_tcp_listener(wildcard(port, false)) {
            Ok(listener) => {
                self.register_listener(
                    ReservedFace::ListenTcpV4.face_id(),
                    EndpointResource::TcpListener(listener),
                    "0.0.0.0:tcp".to_string(),
                    TransportKind::Tcp,
                );
                true
            }
            Err(e) => {
                warn!(error = %e, port, "ipv4 tcp listener bind failed");
                false
            }
        };

        let v6_ok = match bind_tcp_listener(wildcard(port, true)) {
            Ok(listener) => {
                self.register_listener(
                    ReservedFace::ListenTcpV6.face_id(),
                    EndpointResource::TcpListener(listener),
                    ":::tcp".to_string(),
                    TransportKind::Tcp,
                );
                true
            }
            Err(e) => {
                warn!(error = %e, port, "ipv6 tcp listener bind failed");
                false
            }
        };

        self.update_ip_preference(v4_ok, v6_ok);

        if v4_ok {
            Ok(ReservedFace::ListenTcpV4.face_id())
        } else if v6_ok {
            Ok(ReservedFace::ListenTcpV6.face_id())
        } else {
            Err(Error::NoAddressAvailable)
        }
    }

    /// Brings up the UNIX-domain local listener at `path`. The path is
    /// unlinked first so re-running after an unclean shutdown is idempotent.
    pub fn create_local_listener(
        &mut self,
        kind: LocalSocketKind,
        path: impl AsRef<Path>,
    ) -> Result<FaceId> {
        let path = path.as_ref();
        let _ = std::fs::remove_file(path);

        let (resource, fd) = match kind {
            LocalSocketKind::Stream => {
                let listener = bind_unix_listener(path)?;
                let fd = listener.as_raw_fd();
                (EndpointResource::UnixListener(listener), fd)
            }
            LocalSocketKind::Datagram => {
                let socket = bind_unix_datagram(path)?;
                let fd = socket.as_raw_fd();
                (EndpointResource::UnixDatagram(socket), fd)
            }
        };

        let id = ReservedFace::LocalListen.face_id();
        let key = path.to_string_lossy().into_owned();
        info!(path = %key, ?kind, "local listener bound");
        let handle = self.sockets.insert(EndpointRecord {
            key,
            resource,
            peer_addr: None,
            kind: TransportKind::Local,
            face_id: id,
        });
        self.faces.populate(id, handle, fd, TransportKind::Local);
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::NodeRole;

    #[tokio::test]
    async fn udp_listener_binds_both_families_on_loopback_friendly_port() {
        let mut fm = FaceManager::initialize(NodeRole::Router).unwrap();
        let id = fm.create_udp_listener(0).await.unwrap();
        assert!(id == ReservedFace::ListenUdpV4.face_id() || id == ReservedFace::ListenUdpV6.face_id());
        assert!(fm.fd(ReservedFace::ListenUdpV4.face_id()).is_some());
    }

    #[test]
    fn local_listener_is_idempotent_across_restarts() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("face.sock");

        let mut fm = FaceManager::initialize(NodeRole::Receiver).unwrap();
        fm.create_local_listener(LocalSocketKind::Stream, &path).unwrap();

        let mut fm2 = FaceManager::initialize(NodeRole::Receiver).unwrap();
        assert!(fm2.create_local_listener(LocalSocketKind::Stream, &path).is_ok());
    }
}
