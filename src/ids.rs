use std::fmt;

/// Small integer identifier for a face, stable for the face's lifetime.
///
/// Higher layers (FIB, PIT, Content Store, the caller's poll loop) refer to
/// peers exclusively through this type; they never see a socket descriptor
/// or address directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FaceId(pub u16);

impl FaceId {
    pub(crate) fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for FaceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Face({})", self.0)
    }
}

impl From<FaceId> for u16 {
    fn from(id: FaceId) -> u16 {
        id.0
    }
}

/// The fixed prefix of the Face-ID space assigned to listen faces. Never
/// handed out by [`crate::manager::FaceManager`]'s allocator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u16)]
pub enum ReservedFace {
    /// IPv4 UDP listener.
    ListenUdpV4 = 0,
    /// IPv6 UDP listener.
    ListenUdpV6 = 1,
    /// IPv4 TCP listener.
    ListenTcpV4 = 2,
    /// IPv6 TCP listener.
    ListenTcpV6 = 3,
    /// IPv4 UDP listener for NDN-encoded traffic.
    ListenNdnV4 = 4,
    /// IPv6 UDP listener for NDN-encoded traffic.
    ListenNdnV6 = 5,
    /// UNIX-domain listener for local applications.
    LocalListen = 6,
}

impl ReservedFace {
    /// First Face-ID available to the dynamic allocator.
    pub const RESERVED: u16 = 7;

    pub const fn face_id(self) -> FaceId {
        FaceId(self as u16)
    }
}

impl From<ReservedFace> for FaceId {
    fn from(r: ReservedFace) -> FaceId {
        r.face_id()
    }
}

/// Tagged transport kind, stored as a small integer on the wire-adjacent
/// peer-key to keep keys stable across runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum TransportKind {
    /// No transport; used for a never-populated Face Table slot.
    Invalid = 0,
    Tcp = 1,
    Udp = 2,
    Local = 3,
}

impl TransportKind {
    /// The tag used in peer-keys, e.g. `"10.0.0.1:tcp"`.
    pub const fn key_tag(self) -> &'static str {
        match self {
            TransportKind::Invalid => "invalid",
            TransportKind::Tcp => "tcp",
            TransportKind::Udp => "udp",
            TransportKind::Local => "local",
        }
    }

    pub const fn is_local(self) -> bool {
        matches!(self, TransportKind::Local)
    }
}

impl fmt::Display for TransportKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_tag())
    }
}

/// Which IP address families outbound peer resolution should consider.
///
/// Starts at `Both`; the Listen-Face Builder narrows it to `V6Only` when
/// IPv4 bind fails and IPv6 succeeds (spec.md §4.3's "preference rule").
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IpPreference {
    Both,
    V6Only,
}

impl IpPreference {
    pub(crate) fn accepts(self, addr: std::net::IpAddr) -> bool {
        match self {
            IpPreference::Both => true,
            IpPreference::V6Only => addr.is_ipv6(),
        }
    }
}

/// UNIX-domain socket variants the Local Listen-Face Builder supports.
///
/// spec.md's original mentions a seqpacket variant too; tokio's
/// `UnixListener`/`UnixDatagram` only wrap `SOCK_STREAM` and `SOCK_DGRAM`,
/// so seqpacket is narrowed out here rather than silently miscompiled into
/// one of these two (see DESIGN.md).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LocalSocketKind {
    Stream,
    Datagram,
}

/// Builds the canonical peer-key for a network peer: `"<host>:<tag>"`.
pub fn peer_key(host: &str, kind: TransportKind) -> String {
    format!("{host}:{}", kind.key_tag())
}

/// Builds the canonical peer-key for a locally accepted application face.
pub fn local_peer_key(fd: std::os::fd::RawFd) -> String {
    format!("app-face-{fd}")
}
