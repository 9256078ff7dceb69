//! The Listen-Face Update Helper (spec.md §4.9 C9): grows the raw descriptor
//! set a surrounding non-tokio event loop polls. Callers that drive
//! everything through tokio don't need this — sockets already register
//! with the reactor on creation — but spec.md treats the surrounding loop
//! as an external collaborator, so this stays available for a caller that
//! isn't tokio-based.
//!
//! Mirrors `cef_face_update_tcp_faces`: walk the dynamic Face-ID range for
//! TCP peer faces, append any descriptor the caller's poll set doesn't
//! already carry, and never touch an entry that's already there.

use std::os::fd::RawFd;

use super::FaceManager;
use crate::ids::{FaceId, ReservedFace, TransportKind};

/// One entry in a caller-owned TCP poll set: a peer face's descriptor,
/// interested in readability and error conditions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TcpPollEntry {
    pub face_id: FaceId,
    pub fd: RawFd,
}

impl FaceManager {
    /// All currently live listen-face descriptors, in reserved-id order.
    pub fn listen_face_descriptors(&self) -> Vec<(FaceId, RawFd)> {
        (0..ReservedFace::RESERVED)
            .filter_map(|raw| {
                let id = FaceId(raw);
                self.fd(id).map(|fd| (id, fd))
            })
            .collect()
    }

    /// Appends any dynamic-range TCP peer face not already present in
    /// `set`, keyed by descriptor. Never clears or reorders existing
    /// entries — a caller may be mid-`poll` over the same `Vec`. Returns
    /// the set's new length.
    pub fn update_tcp_poll_set(&self, set: &mut Vec<TcpPollEntry>) -> usize {
        for (id, slot) in self.faces.iter_dynamic(ReservedFace::RESERVED) {
            if slot.is_free() || slot.kind != TransportKind::Tcp {
                continue;
            }
            let already_present = set.iter().any(|entry| entry.fd == slot.fd);
            if !already_present {
                set.push(TcpPollEntry { face_id: id, fd: slot.fd });
            }
        }
        set.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::role::NodeRole;

    #[tokio::test]
    async fn poll_set_gains_an_entry_for_each_accepted_tcp_peer() {
        let mut fm = FaceManager::initialize(NodeRole::Router).unwrap();
        fm.create_tcp_listener(0).await.unwrap();

        let mut set = Vec::new();
        let count = fm.update_tcp_poll_set(&mut set);
        assert_eq!(count, 0, "no peer faces yet, only a listen face exists");
        assert!(set.is_empty());
    }

    #[tokio::test]
    async fn poll_set_is_appended_to_not_replaced() {
        let mut fm = FaceManager::initialize(NodeRole::Router).unwrap();
        let listen_id = fm.create_tcp_listener(0).await.unwrap();
        let listen_addr = {
            let handle = fm.faces.get(listen_id).unwrap().socket_slot.unwrap();
            let record = fm.sockets.get(handle).unwrap();
            record.resource.as_tcp_listener().unwrap().local_addr().unwrap()
        };

        let _client = tokio::net::TcpStream::connect(listen_addr).await.unwrap();
        let peer = fm.accept_tcp().await.unwrap();

        let sentinel = TcpPollEntry { face_id: FaceId(9999), fd: 4242 };
        let mut set = vec![sentinel];
        let count = fm.update_tcp_poll_set(&mut set);

        assert_eq!(count, 2);
        assert_eq!(set[0], sentinel, "pre-existing entries are left untouched");
        assert!(set.iter().any(|entry| entry.face_id == peer));

        // Calling again with the same set doesn't duplicate the peer entry.
        let count_again = fm.update_tcp_poll_set(&mut set);
        assert_eq!(count_again, 2);
    }

    #[tokio::test]
    async fn listen_face_descriptors_only_covers_reserved_range() {
        let mut fm = FaceManager::initialize(NodeRole::Receiver).unwrap();
        fm.create_udp_listener(0).await.unwrap();
        let descriptors = fm.listen_face_descriptors();
        assert!(descriptors.iter().all(|(id, _)| id.0 < ReservedFace::RESERVED));
    }
}
