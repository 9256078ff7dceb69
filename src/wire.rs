//! The application-protocol header prepended to Content Object sends on
//! local (UNIX-domain) faces.
//!
//! spec.md treats this on-wire layout as belonging to an external
//! application-protocol collaborator; it's reproduced here as a fixed
//! record so the crate is self-contained. Byte order is host-native per
//! spec.md §6 — this is intra-host IPC, not a network protocol.

/// Record `type` tag. spec.md only names `Internal`; other tags belong to
/// the external application protocol and are out of scope here.
pub const HEADER_TYPE_INTERNAL: u8 = 0;

/// Current header version.
pub const HEADER_VERSION: u8 = 1;

/// `{version:u8, type:u8 (Internal), payload-length:u32, chunk-number:u32}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LocalAppHeader {
    pub version: u8,
    pub kind: u8,
    pub payload_len: u32,
    pub chunk_number: u32,
}

impl LocalAppHeader {
    pub const ENCODED_LEN: usize = 1 + 1 + 4 + 4;

    pub fn for_content(payload_len: u32, chunk_number: u32) -> Self {
        LocalAppHeader {
            version: HEADER_VERSION,
            kind: HEADER_TYPE_INTERNAL,
            payload_len,
            chunk_number,
        }
    }

    /// Encodes the header in host-native byte order, matching spec.md §6.
    pub fn encode(&self) -> [u8; Self::ENCODED_LEN] {
        let mut buf = [0u8; Self::ENCODED_LEN];
        buf[0] = self.version;
        buf[1] = self.kind;
        buf[2..6].copy_from_slice(&self.payload_len.to_ne_bytes());
        buf[6..10].copy_from_slice(&self.chunk_number.to_ne_bytes());
        buf
    }
}
