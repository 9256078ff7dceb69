//! Face Close (spec.md §4.7): idempotent removal from both tables. Dropping
//! the owned [`crate::socket_table::EndpointResource`] is what actually
//! closes the descriptor — this just stops anything from reaching it.

use tracing::debug;

use super::FaceManager;
use crate::ids::{FaceId, ReservedFace};

impl FaceManager {
    /// Removes `id` from the Socket Index and clears its Face Table slot.
    /// Safe to call on an already-closed or never-populated face.
    pub fn close_face(&mut self, id: FaceId) {
        if let Some(slot) = self.faces.get(id) {
            if let Some(handle) = slot.socket_slot {
                self.sockets.remove(handle);
            }
        }
        self.faces.clear(id);
        debug!(face = id.0, "face closed");
    }

    /// Closes every face the manager knows about. Peer faces go first,
    /// listen faces last, so a caller iterating faces mid-shutdown never
    /// sees a listener accept a connection with nowhere to route it.
    pub fn close_all(&mut self) {
        let max = self.faces.max_faces();
        for raw in ReservedFace::RESERVED..max {
            self.close_face(FaceId(raw));
        }
        for raw in 0..ReservedFace::RESERVED.min(max) {
            self.close_face(FaceId(raw));
        }
    }
}
