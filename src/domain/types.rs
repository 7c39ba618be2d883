use serde::{Deserialize, Serialize};

// ============================================================================
// Rooms
// ============================================================================

/// One of the two heated rooms of the building.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, strum::Display,
)]
pub enum Room {
    #[strum(serialize = "room1")]
    One,
    #[strum(serialize = "room2")]
    Two,
}

impl Room {
    pub const ALL: [Room; 2] = [Room::One, Room::Two];

    /// Zero-based position used to index per-room arrays.
    pub fn index(self) -> usize {
        match self {
            Room::One => 0,
            Room::Two => 1,
        }
    }

    /// The neighbouring room heat is exchanged with.
    pub fn other(self) -> Room {
        match self {
            Room::One => Room::Two,
            Room::Two => Room::One,
        }
    }
}

/// A value held once per room, indexed by [`Room`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PerRoom<T>(pub [T; 2]);

impl<T> PerRoom<T> {
    pub fn new(room1: T, room2: T) -> Self {
        Self([room1, room2])
    }

    pub fn get(&self, room: Room) -> &T {
        &self.0[room.index()]
    }

    pub fn get_mut(&mut self, room: Room) -> &mut T {
        &mut self.0[room.index()]
    }
}

impl<T> std::ops::Index<Room> for PerRoom<T> {
    type Output = T;

    fn index(&self, room: Room) -> &T {
        self.get(room)
    }
}
