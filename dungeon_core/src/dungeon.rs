use std::{
    collections::HashMap,
    ops::{Index, IndexMut},
};

use serde::{Deserialize, Serialize};

use crate::{
    Direction, RoomId,
    map::{MapError, Room, RoomMap},
};

/// Represents errors raised by dungeon construction, lookup and loading.
#[derive(Debug, thiserror::Error)]
pub enum DungeonError {
    #[error("A room named '{name}' is already registered")]
    DuplicateRoom { name: String },
    #[error("No room named '{name}' is registered")]
    RoomNotFound { name: String },
    #[error(transparent)]
    Map(#[from] MapError),
    #[error("Invalid dungeon JSON: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Inconsistent dungeon data: {0}")]
    Inconsistent(String),
    #[error("Line {line}: {message}")]
    Parse { line: usize, message: String },
}

/// A collection of (possibly connected) rooms with a recommended start.
///
/// Every room lives in the dungeon's [`RoomMap`]. Registering a room makes it
/// searchable by name; a room that is only inserted can still be reached
/// through passages but cannot be looked up, and does not count toward
/// [`Dungeon::size`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(try_from = "DungeonRecord")]
pub struct Dungeon {
    rooms: RoomMap,
    registry: HashMap<String, RoomId>,
    start: RoomId,
}

/// Unchecked shape of a serialized dungeon.
#[derive(Deserialize)]
struct DungeonRecord {
    rooms: RoomMap,
    registry: HashMap<String, RoomId>,
    start: RoomId,
}

impl TryFrom<DungeonRecord> for Dungeon {
    type Error = DungeonError;

    fn try_from(record: DungeonRecord) -> Result<Self, Self::Error> {
        let DungeonRecord {
            rooms,
            registry,
            start,
        } = record;

        for (name, &id) in &registry {
            match rooms.get(id) {
                Some(room) if room.name() == name.as_str() => {}
                Some(room) => {
                    return Err(DungeonError::Inconsistent(format!(
                        "key '{}' is registered for room '{}'",
                        name,
                        room.name()
                    )));
                }
                None => {
                    return Err(DungeonError::Inconsistent(format!(
                        "key '{}' refers to missing room id {}",
                        name, id
                    )));
                }
            }
        }

        for (id, room) in rooms.enumerate() {
            for (d, neighbor) in room.exits() {
                if neighbor == id {
                    return Err(MapError::SelfLoop {
                        room: room.name().to_string(),
                    }
                    .into());
                }
                if !rooms.contains(neighbor) {
                    return Err(DungeonError::Inconsistent(format!(
                        "room '{}' leads {} to missing room id {}",
                        room.name(),
                        d,
                        neighbor
                    )));
                }
            }
        }

        let start_name = rooms
            .get(start)
            .map(|room| room.name())
            .ok_or_else(|| DungeonError::Inconsistent(format!("start id {} is missing", start)))?;
        if registry.get(start_name) != Some(&start) {
            return Err(DungeonError::Inconsistent(format!(
                "start room '{}' is not registered",
                start_name
            )));
        }

        Ok(Dungeon {
            rooms,
            registry,
            start,
        })
    }
}

impl Dungeon {
    /// Creates a dungeon around its start room, which is registered.
    ///
    /// The start room must not carry passages yet: there is nothing for them
    /// to lead to.
    pub fn new(start: Room) -> Result<Self, DungeonError> {
        let mut rooms = RoomMap::new();
        let name = start.name().to_string();
        let start = rooms.insert(start)?;
        let mut registry = HashMap::new();
        registry.insert(name, start);
        Ok(Dungeon {
            rooms,
            registry,
            start,
        })
    }

    /// Recommended starting point for exploring the dungeon.
    pub fn start(&self) -> RoomId {
        self.start
    }

    /// Moves a room into the dungeon without registering its name.
    ///
    /// The room can be linked and traveled through, but `has`/`find` will not
    /// see it. Fails like [`RoomMap::insert`] on passages the dungeon cannot
    /// hold.
    pub fn insert_room(&mut self, room: Room) -> Result<RoomId, DungeonError> {
        Ok(self.rooms.insert(room)?)
    }

    /// Moves a room into the dungeon and registers it under its name.
    ///
    /// Fails without inserting anything if the name is already registered or
    /// the room carries passages the dungeon cannot hold.
    pub fn add_room(&mut self, room: Room) -> Result<RoomId, DungeonError> {
        if self.has(room.name()) {
            return Err(DungeonError::DuplicateRoom {
                name: room.name().to_string(),
            });
        }
        let name = room.name().to_string();
        let id = self.rooms.insert(room)?;
        log::debug!("registered room '{}' as {}", name, id);
        self.registry.insert(name, id);
        Ok(id)
    }

    /// Registers a room previously added with [`Dungeon::insert_room`].
    pub fn register(&mut self, id: RoomId) -> Result<(), DungeonError> {
        let name = self
            .rooms
            .get(id)
            .map(|room| room.name().to_string())
            .ok_or(MapError::UnknownRoom {
                id,
                len: self.rooms.len(),
            })?;
        if self.registry.contains_key(&name) {
            return Err(DungeonError::DuplicateRoom { name });
        }
        log::debug!("registered room '{}' as {}", name, id);
        self.registry.insert(name, id);
        Ok(())
    }

    /// Returns true if a room with the given name is registered.
    pub fn has(&self, room_name: &str) -> bool {
        self.registry.contains_key(room_name)
    }

    /// Returns the id of the named room.
    pub fn find(&self, room_name: &str) -> Result<RoomId, DungeonError> {
        self.registry
            .get(room_name)
            .copied()
            .ok_or_else(|| DungeonError::RoomNotFound {
                name: room_name.to_string(),
            })
    }

    /// Number of registered rooms.
    pub fn size(&self) -> usize {
        self.registry.len()
    }

    /// Arena holding every room, registered or not.
    pub fn rooms(&self) -> &RoomMap {
        &self.rooms
    }

    /// Registered room names, sorted.
    pub fn room_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.registry.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// See [`RoomMap::add_neighbor`].
    pub fn add_neighbor(
        &mut self,
        from: RoomId,
        to: RoomId,
        d: Direction,
    ) -> Result<(), DungeonError> {
        Ok(self.rooms.add_neighbor(from, to, d)?)
    }

    /// See [`RoomMap::add_single_direction_neighbor`].
    pub fn add_single_direction_neighbor(
        &mut self,
        from: RoomId,
        to: RoomId,
        d: Direction,
    ) -> Result<(), DungeonError> {
        Ok(self.rooms.add_single_direction_neighbor(from, to, d)?)
    }

    /// Returns a JSON string representation of the dungeon.
    pub fn to_json(&self) -> Result<String, DungeonError> {
        Ok(serde_json::to_string(self)?)
    }
}

/// Reads a full dungeon from a JSON source string, checking its invariants.
pub fn read_dungeon_from_json(source: &str) -> Result<Dungeon, DungeonError> {
    Ok(serde_json::from_str(source)?)
}

impl Index<RoomId> for Dungeon {
    type Output = Room;

    #[inline]
    fn index(&self, id: RoomId) -> &Self::Output {
        &self.rooms[id]
    }
}

impl IndexMut<RoomId> for Dungeon {
    #[inline]
    fn index_mut(&mut self, id: RoomId) -> &mut Self::Output {
        &mut self.rooms[id]
    }
}

/// Loads a dungeon from its text description.
///
/// Each non-blank line that does not start with `#` holds `|`-separated fields:
///
/// ```text
/// room    | <name> [| <level>]
/// hidden  | <name> [| <level>]
/// start   | <name>
/// link    | <from> | <direction> | <to>
/// oneway  | <from> | <direction> | <to>
/// trap    | <name> | <trap>
/// monster | <name> | <monster>
/// ```
///
/// `hidden` rooms are traversable but not registered. Without a `start` line
/// the first `room` becomes the start.
pub fn load_dungeon_from_string(source: &str) -> Result<Dungeon, DungeonError> {
    let mut rooms = RoomMap::new();
    let mut declared: HashMap<String, RoomId> = HashMap::new();
    let mut registry: HashMap<String, RoomId> = HashMap::new();
    let mut first_room: Option<RoomId> = None;
    let mut start: Option<RoomId> = None;

    for (index, raw) in source.lines().enumerate() {
        let line = index + 1;
        let text = raw.trim();
        if text.is_empty() || text.starts_with('#') {
            continue;
        }
        let fail = |message: String| DungeonError::Parse { line, message };
        let fields: Vec<&str> = text.split('|').map(str::trim).collect();

        match (fields[0], &fields[1..]) {
            (kind @ ("room" | "hidden"), [name, rest @ ..]) if rest.len() <= 1 => {
                if name.is_empty() {
                    return Err(fail("room name is empty".to_string()));
                }
                if declared.contains_key(*name) {
                    return Err(fail(format!("room '{}' declared twice", name)));
                }
                let level = match rest.first() {
                    Some(level) => level
                        .parse::<i32>()
                        .map_err(|_| fail(format!("invalid level '{}'", level)))?,
                    None => 1,
                };
                let id = rooms
                    .insert(Room::new(*name, level))
                    .map_err(|e| fail(e.to_string()))?;
                declared.insert(name.to_string(), id);
                if kind == "room" {
                    registry.insert(name.to_string(), id);
                    if first_room.is_none() {
                        first_room = Some(id);
                    }
                }
            }
            ("start", [name]) => {
                if start.is_some() {
                    return Err(fail("multiple start rooms".to_string()));
                }
                let id = registry.get(*name).copied().ok_or_else(|| {
                    fail(format!("start room '{}' is not a registered room", name))
                })?;
                start = Some(id);
            }
            (kind @ ("link" | "oneway"), [from, direction, to]) => {
                let from = declared_room(&declared, from, line)?;
                let to = declared_room(&declared, to, line)?;
                let d: Direction = direction.parse().map_err(|e| fail(format!("{}", e)))?;
                let linked = if kind == "link" {
                    rooms.add_neighbor(from, to, d)
                } else {
                    rooms.add_single_direction_neighbor(from, to, d)
                };
                linked.map_err(|e| fail(e.to_string()))?;
            }
            (kind @ ("trap" | "monster"), [name, tag]) => {
                let id = declared_room(&declared, name, line)?;
                let room = &mut rooms[id];
                if kind == "trap" {
                    room.trap = Some(tag.to_string());
                } else {
                    room.monster = Some(tag.to_string());
                }
            }
            (kind, _) => {
                return Err(fail(format!("unrecognized or malformed '{}' entry", kind)));
            }
        }
    }

    let start = start
        .or(first_room)
        .ok_or_else(|| DungeonError::Inconsistent("no rooms declared".to_string()))?;
    log::debug!(
        "loaded dungeon with {} rooms ({} registered)",
        rooms.len(),
        registry.len()
    );
    Ok(Dungeon {
        rooms,
        registry,
        start,
    })
}

fn declared_room(
    declared: &HashMap<String, RoomId>,
    name: &str,
    line: usize,
) -> Result<RoomId, DungeonError> {
    declared.get(name).copied().ok_or_else(|| DungeonError::Parse {
        line,
        message: format!("room '{}' has not been declared", name),
    })
}
