use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

pub mod agent;
pub mod dungeon;
pub mod map;
pub mod scenario;

pub use agent::{Rat, SearchStrategy, SearchTrace};
pub use dungeon::{Dungeon, DungeonError, load_dungeon_from_string, read_dungeon_from_json};
pub use map::{MapError, Room, RoomMap, read_room_from_json};

/// Index of a room inside the arena that owns it.
pub type RoomId = usize;

/// One of the six passages a room can have.
///
/// The declaration order is also the order in which neighbors are reported,
/// and therefore the tie-break order of every search.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    East,
    West,
    North,
    South,
    Up,
    Down,
}

impl Direction {
    /// All directions in slot order.
    pub const ALL: [Direction; 6] = [
        Direction::East,
        Direction::West,
        Direction::North,
        Direction::South,
        Direction::Up,
        Direction::Down,
    ];

    /// Returns the direction leading back, e.g. North <-> South.
    pub const fn opposite(self) -> Direction {
        match self {
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }

    /// Position of this direction's slot in a room's neighbor table.
    #[inline]
    pub const fn slot(self) -> usize {
        self as usize
    }
}

/// Free-function form of [`Direction::opposite`].
pub const fn opposite(d: Direction) -> Direction {
    d.opposite()
}

/// Raised when text does not name one of the six directions.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DirectionError {
    #[error("'{0}' is not a direction (expected east, west, north, south, up or down)")]
    Invalid(String),
}

impl FromStr for Direction {
    type Err = DirectionError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "e" | "east" => Ok(Direction::East),
            "w" | "west" => Ok(Direction::West),
            "n" | "north" => Ok(Direction::North),
            "s" | "south" => Ok(Direction::South),
            "u" | "up" => Ok(Direction::Up),
            "d" | "down" => Ok(Direction::Down),
            _ => Err(DirectionError::Invalid(s.to_string())),
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Direction::East => "east",
            Direction::West => "west",
            Direction::North => "north",
            Direction::South => "south",
            Direction::Up => "up",
            Direction::Down => "down",
        };
        f.write_str(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_opposite_pairs() {
        assert_eq!(Direction::East.opposite(), Direction::West);
        assert_eq!(Direction::North.opposite(), Direction::South);
        assert_eq!(opposite(Direction::Up), Direction::Down);
        assert_eq!(opposite(Direction::Down), Direction::Up);
    }

    #[test]
    fn test_slot_order_matches_declaration() {
        for (i, d) in Direction::ALL.iter().enumerate() {
            assert_eq!(d.slot(), i);
        }
    }

    #[test]
    fn test_parse_direction() {
        assert_eq!("North".parse::<Direction>(), Ok(Direction::North));
        assert_eq!(" d ".parse::<Direction>(), Ok(Direction::Down));
        assert_eq!(
            "sideways".parse::<Direction>(),
            Err(DirectionError::Invalid("sideways".to_string()))
        );
        for d in Direction::ALL {
            assert_eq!(d.to_string().parse::<Direction>(), Ok(d));
        }
    }

    proptest! {
        #[test]
        fn opposite_is_an_involution(i in 0usize..6) {
            let d = Direction::ALL[i];
            prop_assert_eq!(d.opposite().opposite(), d);
            prop_assert_ne!(d.opposite(), d);
        }
    }
}
