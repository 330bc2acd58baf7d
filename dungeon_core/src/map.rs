use std::ops::{Index, IndexMut};

use serde::{Deserialize, Serialize};

use crate::{Direction, RoomId};

/// Represents errors that can occur while wiring rooms together.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum MapError {
    #[error("Room '{room}' cannot have a passage back to itself")]
    SelfLoop { room: String },
    #[error("Room id {id} does not exist in a map of {len} rooms")]
    UnknownRoom { id: RoomId, len: usize },
}

/// A room at a certain level of a dungeon.
///
/// Holds at most one passage per [`Direction`]. Passages point at other rooms
/// by [`RoomId`]; the room does not own its neighbors, the [`RoomMap`] does.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    name: String,
    level: i32,
    neighbors: [Option<RoomId>; 6],
    /// Name of the trap in this room, if any.
    pub trap: Option<String>,
    /// Name of the monster in this room, if any.
    pub monster: Option<String>,
}

impl Room {
    /// Creates a room with no passages.
    pub fn new(name: impl Into<String>, level: i32) -> Self {
        Room {
            name: name.into(),
            level,
            neighbors: [None; 6],
            trap: None,
            monster: None,
        }
    }

    /// Creates a room on level 1.
    pub fn named(name: impl Into<String>) -> Self {
        Room::new(name, 1)
    }

    /// Name used to identify the room.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Level of the room within its dungeon.
    pub fn level(&self) -> i32 {
        self.level
    }

    /// Returns the neighbor in the given direction, if there is one.
    #[inline]
    pub fn neighbor_to(&self, d: Direction) -> Option<RoomId> {
        self.neighbors[d.slot()]
    }

    /// Returns the rooms reachable from this one, in [`Direction::ALL`] order.
    pub fn neighbors(&self) -> impl DoubleEndedIterator<Item = RoomId> + '_ {
        self.neighbors.iter().filter_map(|n| *n)
    }

    /// Returns `(direction, neighbor)` for every passage out of this room.
    pub fn exits(&self) -> impl Iterator<Item = (Direction, RoomId)> + '_ {
        Direction::ALL
            .into_iter()
            .filter_map(|d| self.neighbor_to(d).map(|n| (d, n)))
    }

    /// Returns a JSON representation of the room that can be reloaded.
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }

    pub(crate) fn set_neighbor(&mut self, d: Direction, room: RoomId) {
        self.neighbors[d.slot()] = Some(room);
    }
}

/// Reads a room from a JSON source string.
pub fn read_room_from_json(source: &str) -> Result<Room, serde_json::Error> {
    serde_json::from_str(source)
}

/// Arena owning every room of a dungeon, registered or not.
///
/// Rooms are addressed by the [`RoomId`] handed out by [`RoomMap::insert`].
/// Ids are never reused since rooms cannot be removed.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomMap {
    rooms: Vec<Room>,
}

impl RoomMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        RoomMap { rooms: Vec::new() }
    }

    /// Number of rooms held by the map.
    #[inline]
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }

    /// Checks if the id refers to a room in this map.
    #[inline]
    pub fn contains(&self, id: RoomId) -> bool {
        id < self.rooms.len()
    }

    /// Moves a room into the map and returns its id.
    ///
    /// A room that already carries passages (one read from JSON, or cloned out
    /// of another map) may only point at rooms already in this map, and never
    /// at the id it is about to receive.
    pub fn insert(&mut self, room: Room) -> Result<RoomId, MapError> {
        let id = self.rooms.len();
        for neighbor in room.neighbors() {
            if neighbor == id {
                return Err(MapError::SelfLoop {
                    room: room.name.clone(),
                });
            }
            self.check(neighbor)?;
        }
        self.rooms.push(room);
        Ok(id)
    }

    /// Gets an immutable reference to a room.
    ///
    /// Returns `None` if the id is out of range.
    pub fn get(&self, id: RoomId) -> Option<&Room> {
        self.rooms.get(id)
    }

    fn check(&self, id: RoomId) -> Result<(), MapError> {
        if self.contains(id) {
            Ok(())
        } else {
            Err(MapError::UnknownRoom {
                id,
                len: self.rooms.len(),
            })
        }
    }

    /// Adds a one-way passage from `from` to `to` in direction `d`.
    ///
    /// Any passage already in that slot is replaced.
    pub fn add_single_direction_neighbor(
        &mut self,
        from: RoomId,
        to: RoomId,
        d: Direction,
    ) -> Result<(), MapError> {
        self.check(from)?;
        self.check(to)?;
        if from == to {
            return Err(MapError::SelfLoop {
                room: self.rooms[from].name.clone(),
            });
        }
        self.rooms[from].set_neighbor(d, to);
        Ok(())
    }

    /// Adds a two-way passage: `from` leads to `to` in direction `d`, and `to`
    /// leads back in the opposite direction.
    ///
    /// Both slots are validated before either is written.
    pub fn add_neighbor(&mut self, from: RoomId, to: RoomId, d: Direction) -> Result<(), MapError> {
        self.check(from)?;
        self.check(to)?;
        if from == to {
            return Err(MapError::SelfLoop {
                room: self.rooms[from].name.clone(),
            });
        }
        self.rooms[from].set_neighbor(d, to);
        self.rooms[to].set_neighbor(d.opposite(), from);
        Ok(())
    }

    /// Returns an iterator that yields `(id, &Room)` for each room.
    pub fn enumerate(&self) -> impl Iterator<Item = (RoomId, &Room)> {
        self.rooms.iter().enumerate()
    }
}

impl Index<RoomId> for RoomMap {
    type Output = Room;

    #[inline]
    fn index(&self, id: RoomId) -> &Self::Output {
        match self.rooms.get(id) {
            Some(room) => room,
            None => panic!(
                "Room id {} out of range for map of {} rooms",
                id,
                self.rooms.len()
            ),
        }
    }
}

impl IndexMut<RoomId> for RoomMap {
    #[inline]
    fn index_mut(&mut self, id: RoomId) -> &mut Self::Output {
        let len = self.rooms.len();
        match self.rooms.get_mut(id) {
            Some(room) => room,
            None => panic!("Room id {} out of range for map of {} rooms", id, len),
        }
    }
}
