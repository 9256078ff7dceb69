//! The Peer-Face Resolver (spec.md §4.4 C6): turns a host or a pre-resolved
//! address into a Face-ID, creating an outbound UDP or TCP peer face on
//! first contact and reusing it on every later call. Local faces are not
//! created here — they only ever arrive through the accept-based path in
//! `local.rs`, matching spec.md §6 listing `lookup-or-create-local` as its
//! own fd-keyed operation.

use std::net::SocketAddr;
use std::os::fd::AsRawFd;
use std::time::Duration;

use tokio::net::{TcpStream, UdpSocket};

use super::FaceManager;
use crate::error::{Error, Result};
use crate::ids::{peer_key, FaceId, TransportKind};
use crate::socket_table::{EndpointRecord, EndpointResource};

/// spec.md's blocking 5-second `select()` liveness probe, reworked as an
/// async timeout around the TCP socket becoming writable (i.e. the
/// handshake completing). UDP has no handshake to probe.
const LIVENESS_TIMEOUT: Duration = Duration::from_secs(5);

async fn probe_tcp_liveness(socket: &TcpStream) -> Result<()> {
    match tokio::time::timeout(LIVENESS_TIMEOUT, socket.writable()).await {
        Ok(Ok(())) => Ok(()),
        Ok(Err(e)) => Err(Error::Io(e)),
        Err(_) => Err(Error::PeerUnreachable(format!(
            "no response within {LIVENESS_TIMEOUT:?}"
        ))),
    }
}

impl FaceManager {
    /// All addresses `host:port` resolves to that match the current IP
    /// preference, in the order the resolver returned them.
    async fn resolve_preferred(&self, host: &str, port: u16) -> Result<Vec<SocketAddr>> {
        let candidates: Vec<SocketAddr> = tokio::net::lookup_host((host, port))
            .await
            .map_err(|e| Error::ResolveFailed(e.to_string()))?
            .filter(|addr| self.ip_preference.accepts(addr.ip()))
            .collect();

        if candidates.is_empty() {
            return Err(Error::ResolveFailed(host.to_string()));
        }
        Ok(candidates)
    }

    /// Pure lookup: never creates a face, returns `None` on a miss. Mirrors
    /// spec.md's `search_face`, which returns `-1` for the same case.
    pub fn search_face(&self, host: &str, transport: TransportKind) -> Option<FaceId> {
        let key = peer_key(host, transport);
        self.sockets.get_by_key(&key).map(|record| record.face_id)
    }

    /// The external-interface `lookup-peer-face` entry point: creates or
    /// reuses a peer face for an already-resolved address, skipping DNS.
    pub async fn lookup_peer_face(
        &mut self,
        addr: SocketAddr,
        transport: TransportKind,
    ) -> Result<(FaceId, bool)> {
        let key = peer_key(&addr.ip().to_string(), transport);
        if let Some(record) = self.sockets.get_by_key(&key) {
            return Ok((record.face_id, false));
        }

        let id = match transport {
            TransportKind::Udp => self.create_udp_peer(addr, key).await?,
            TransportKind::Tcp => self.create_tcp_peer(addr, key).await?,
            TransportKind::Invalid | TransportKind::Local => {
                return Err(Error::ResolveFailed(format!(
                    "unsupported transport for outbound peer resolution: {transport}"
                )))
            }
        };
        Ok((id, true))
    }

    /// Resolves `host:port` over DNS and tries each candidate address in
    /// turn, the way `cef_face_lookup_faceid`'s `for (cres = res; ...)` loop
    /// does: a candidate that fails to connect or probe live is discarded
    /// and the next one is tried, only giving up once every candidate has
    /// failed.
    pub async fn lookup_or_create(
        &mut self,
        host: &str,
        port: u16,
        transport: TransportKind,
    ) -> Result<(FaceId, bool)> {
        if matches!(transport, TransportKind::Invalid | TransportKind::Local) {
            return Err(Error::ResolveFailed(format!(
                "unsupported transport for outbound peer resolution: {transport}"
            )));
        }

        let candidates = self.resolve_preferred(host, port).await?;
        let mut last_err = None;
        for addr in candidates {
            match self.lookup_peer_face(addr, transport).await {
                Ok(result) => return Ok(result),
                Err(e) => last_err = Some(e),
            }
        }
        Err(last_err.unwrap_or_else(|| Error::ResolveFailed(host.to_string())))
    }

    async fn create_udp_peer(&mut self, addr: SocketAddr, key: String) -> Result<FaceId> {
        let bind_addr: SocketAddr = if addr.is_ipv6() { "[::]:0" } else { "0.0.0.0:0" }
            .parse()
            .expect("static address parses");
        let std_socket = std::net::UdpSocket::bind(bind_addr)?;
        std_socket.set_nonblocking(true)?;
        let socket = UdpSocket::from_std(std_socket)?;
        socket.connect(addr).await?;

        let id = self.allocate_face_id()?;
        let fd = socket.as_raw_fd();
        let handle = self.sockets.insert(EndpointRecord {
            key,
            resource: EndpointResource::UdpSocket(socket),
            peer_addr: Some(addr),
            kind: TransportKind::Udp,
            face_id: id,
        });
        self.faces.populate(id, handle, fd, TransportKind::Udp);
        Ok(id)
    }

    async fn create_tcp_peer(&mut self, addr: SocketAddr, key: String) -> Result<FaceId> {
        let stream = TcpStream::connect(addr).await?;
        probe_tcp_liveness(&stream).await?;

        let id = self.allocate_face_id()?;
        let fd = stream.as_raw_fd();
        let handle = self.sockets.insert(EndpointRecord {
            key,
            resource: EndpointResource::TcpStream(stream),
            peer_addr: Some(addr),
            kind: TransportKind::Tcp,
            face_id: id,
        });
        self.faces.populate(id, handle, fd, TransportKind::Tcp);
        Ok(id)
    }

    /// Same as [`FaceManager::lookup_or_create`], additionally emitting an
    /// Interest-Link probe (via the injected [`crate::probe::LinkProbeEncoder`])
    /// the first time a face is created for this peer — never on a cache hit.
    pub async fn lookup_or_create_from_string(
        &mut self,
        host: &str,
        port: u16,
        transport: TransportKind,
    ) -> Result<FaceId> {
        let (id, newly_created) = self.lookup_or_create(host, port, transport).await?;

        if newly_created {
            let probe = self.probe_encoder.encode_link_probe(id);
            if !probe.is_empty() {
                self.forced_send(id, &probe).await?;
            }
        }
        Ok(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::NodeRole;

    #[tokio::test]
    async fn repeated_lookup_reuses_the_same_face() {
        let listener = tokio::net::UdpSocket::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();
        drop(listener);

        let mut fm = FaceManager::initialize(NodeRole::Receiver).unwrap();
        let (first, created_first) = fm
            .lookup_or_create("127.0.0.1", port, TransportKind::Udp)
            .await
            .unwrap();
        assert!(created_first);

        let (second, created_second) = fm
            .lookup_or_create("127.0.0.1", port, TransportKind::Udp)
            .await
            .unwrap();
        assert_eq!(first, second);
        assert!(!created_second);
    }

    #[tokio::test]
    async fn falls_back_to_the_next_candidate_when_the_first_refuses_the_connection() {
        // "localhost" resolves to both loopback addresses; a TCP server
        // bound to only one of them forces the other candidate to fail with
        // connection-refused, which lookup_or_create must discard in favor
        // of the address that actually has a listener.
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let port = listener.local_addr().unwrap().port();

        let mut fm = FaceManager::initialize(NodeRole::Receiver).unwrap();
        let accept = tokio::spawn(async move { listener.accept().await });

        let (id, created) = fm
            .lookup_or_create("localhost", port, TransportKind::Tcp)
            .await
            .unwrap();
        assert!(created);
        assert!(fm.fd(id).is_some());
        accept.await.unwrap().unwrap();
    }

    #[tokio::test]
    async fn search_face_never_creates() {
        let fm = FaceManager::initialize(NodeRole::Receiver).unwrap();
        assert!(fm.search_face("127.0.0.1", TransportKind::Udp).is_none());
    }

    #[tokio::test]
    async fn local_transport_is_rejected_for_outbound_resolution() {
        let mut fm = FaceManager::initialize(NodeRole::Receiver).unwrap();
        let addr: SocketAddr = "127.0.0.1:9".parse().unwrap();
        let err = fm.lookup_peer_face(addr, TransportKind::Local).await.unwrap_err();
        assert!(matches!(err, Error::ResolveFailed(_)));
    }
}
