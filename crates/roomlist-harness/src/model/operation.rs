//! Operations for model-based testing.
//!
//! Small, `Arbitrary`-derived mirrors of [`EditOperation`] over a tiny
//! identifier space, so generated sequences hit collisions, boundaries and
//! empty lists often.

use arbitrary::Arbitrary;
use roomlist_core::{EditOperation, RawEntry, RoomId};

/// Room identifier (u8 keeps the space small).
pub type ModelRoomId = u8;

/// Raw entry for a model room.
pub fn model_room(id: ModelRoomId) -> RawEntry {
    RawEntry::Room(RoomId::new(format!("!m{id}:sim")))
}

/// List operation over model rooms.
#[derive(Debug, Clone, PartialEq, Eq, Arbitrary)]
pub enum ListOp {
    /// Append rooms.
    Append {
        /// Rooms to append.
        ids: Vec<ModelRoomId>,
    },
    /// Insert a room.
    Insert {
        /// Target index.
        index: u8,
        /// Room.
        id: ModelRoomId,
    },
    /// Remove a room.
    Remove {
        /// Target index.
        index: u8,
    },
    /// Replace a room.
    Set {
        /// Target index.
        index: u8,
        /// Room.
        id: ModelRoomId,
    },
    /// Insert at the front.
    PushFront {
        /// Room.
        id: ModelRoomId,
    },
    /// Insert at the back.
    PushBack {
        /// Room.
        id: ModelRoomId,
    },
    /// Remove the first room.
    PopFront,
    /// Remove the last room.
    PopBack,
    /// Replace everything.
    Reset {
        /// New rooms.
        ids: Vec<ModelRoomId>,
    },
    /// Keep a prefix.
    Truncate {
        /// Length to keep.
        length: u8,
    },
    /// Remove everything.
    Clear,
}

impl ListOp {
    /// The edit operation this stands for.
    pub fn to_edit(&self) -> EditOperation<RawEntry> {
        let rooms = |ids: &[ModelRoomId]| ids.iter().copied().map(model_room).collect();
        match self {
            Self::Append { ids } => EditOperation::Append(rooms(ids)),
            Self::Insert { index, id } => {
                EditOperation::Insert { index: usize::from(*index), value: model_room(*id) }
            },
            Self::Remove { index } => EditOperation::Remove { index: usize::from(*index) },
            Self::Set { index, id } => {
                EditOperation::Set { index: usize::from(*index), value: model_room(*id) }
            },
            Self::PushFront { id } => EditOperation::PushFront(model_room(*id)),
            Self::PushBack { id } => EditOperation::PushBack(model_room(*id)),
            Self::PopFront => EditOperation::PopFront,
            Self::PopBack => EditOperation::PopBack,
            Self::Reset { ids } => EditOperation::Reset(rooms(ids)),
            Self::Truncate { length } => EditOperation::Truncate { length: usize::from(*length) },
            Self::Clear => EditOperation::Clear,
        }
    }
}
