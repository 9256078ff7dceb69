//! The Face Table (spec.md §2 C3): a dense array indexed by Face-ID.

use std::os::fd::RawFd;

use crate::ids::{FaceId, TransportKind};
use crate::socket_table::SlotHandle;

/// One per possible Face-ID. A `fd` of `0` means the slot is free — this
/// mirrors spec.md's data model directly and is why every send path
/// (spec.md §4.8) additionally refuses descriptors below 3: fd 0 doubles as
/// "free" and must never be mistaken for a real, usable socket.
#[derive(Clone, Copy)]
pub(crate) struct FaceSlot {
    pub(crate) socket_slot: Option<SlotHandle>,
    pub(crate) fd: RawFd,
    pub(crate) kind: TransportKind,
    pub(crate) local_flag: bool,
    pub(crate) sequence: u32,
}

impl FaceSlot {
    const fn empty() -> Self {
        FaceSlot {
            socket_slot: None,
            fd: 0,
            kind: TransportKind::Invalid,
            local_flag: false,
            sequence: 0,
        }
    }

    pub(crate) fn is_free(&self) -> bool {
        self.fd == 0
    }
}

/// Dense, fixed-size array of [`FaceSlot`]s, one per possible [`FaceId`] in
/// `[0, max_faces)`.
pub(crate) struct FaceTable {
    slots: Vec<FaceSlot>,
}

impl FaceTable {
    pub(crate) fn new(max_faces: u16) -> Self {
        FaceTable {
            slots: vec![FaceSlot::empty(); max_faces as usize],
        }
    }

    pub(crate) fn max_faces(&self) -> u16 {
        self.slots.len() as u16
    }

    pub(crate) fn in_range(&self, id: FaceId) -> bool {
        id.index() < self.slots.len()
    }

    pub(crate) fn get(&self, id: FaceId) -> Option<&FaceSlot> {
        self.slots.get(id.index())
    }

    pub(crate) fn get_mut(&mut self, id: FaceId) -> Option<&mut FaceSlot> {
        self.slots.get_mut(id.index())
    }

    pub(crate) fn populate(
        &mut self,
        id: FaceId,
        socket_slot: SlotHandle,
        fd: RawFd,
        kind: TransportKind,
    ) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            *slot = FaceSlot {
                socket_slot: Some(socket_slot),
                fd,
                kind,
                local_flag: kind.is_local(),
                sequence: 0,
            };
        }
    }

    /// Clears a slot (index = 0, descriptor = 0) without touching the OS
    /// descriptor — closing the descriptor is the Endpoint Record's job
    /// (spec.md §5 resource policy), not the Face Table's.
    pub(crate) fn clear(&mut self, id: FaceId) {
        if let Some(slot) = self.slots.get_mut(id.index()) {
            *slot = FaceSlot::empty();
        }
    }

    pub(crate) fn next_sequence(&mut self, id: FaceId) -> Option<u32> {
        let slot = self.slots.get_mut(id.index())?;
        if slot.is_free() {
            return None;
        }
        let current = slot.sequence;
        slot.sequence = slot.sequence.wrapping_add(1);
        Some(current)
    }

    pub(crate) fn iter_dynamic(&self, reserved: u16) -> impl Iterator<Item = (FaceId, &FaceSlot)> {
        self.slots
            .iter()
            .enumerate()
            .skip(reserved as usize)
            .map(|(i, slot)| (FaceId(i as u16), slot))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fresh_table_is_all_free() {
        let table = FaceTable::new(8);
        for i in 0..8u16 {
            assert!(table.get(FaceId(i)).unwrap().is_free());
        }
    }

    #[test]
    fn sequence_increases_monotonically_and_wraps() {
        let mut table = FaceTable::new(8);
        table.populate(FaceId(0), SlotHandle::test_handle(0), 10, TransportKind::Udp);
        let slot = table.get_mut(FaceId(0)).unwrap();
        slot.sequence = u32::MAX;

        assert_eq!(table.next_sequence(FaceId(0)), Some(u32::MAX));
        assert_eq!(table.next_sequence(FaceId(0)), Some(0));
        assert_eq!(table.next_sequence(FaceId(0)), Some(1));
    }

    #[test]
    fn sequence_on_closed_face_is_none() {
        let mut table = FaceTable::new(4);
        assert_eq!(table.next_sequence(FaceId(1)), None);
    }
}
