//! Ready-made dungeons with a rat at their start.
//!
//! Scenarios 1-6 have a single expected route that every search strategy
//! must produce; 7 and 8 only have properties the route must satisfy.

use rand::{Rng, SeedableRng, rngs::StdRng};

use crate::{
    Direction, RoomId,
    agent::Rat,
    dungeon::{Dungeon, DungeonError},
    map::Room,
};

/// Side length of the grid scenario.
pub const GRID_SIZE: usize = 20;

/// One of the numbered test dungeons.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scenario {
    ThreeRooms,
    Square,
    Looped,
    Unreachable,
    DungeonX,
    CaveIn,
    Grid,
    Random { rooms: usize, seed: u64 },
}

impl Scenario {
    /// Scenario for a menu number (1-8). The seed only affects scenario 8.
    pub fn from_number(number: u8, seed: u64) -> Option<Scenario> {
        match number {
            1 => Some(Scenario::ThreeRooms),
            2 => Some(Scenario::Square),
            3 => Some(Scenario::Looped),
            4 => Some(Scenario::Unreachable),
            5 => Some(Scenario::DungeonX),
            6 => Some(Scenario::CaveIn),
            7 => Some(Scenario::Grid),
            8 => Some(Scenario::Random { rooms: 30, seed }),
            _ => None,
        }
    }

    pub fn number(&self) -> u8 {
        match self {
            Scenario::ThreeRooms => 1,
            Scenario::Square => 2,
            Scenario::Looped => 3,
            Scenario::Unreachable => 4,
            Scenario::DungeonX => 5,
            Scenario::CaveIn => 6,
            Scenario::Grid => 7,
            Scenario::Random { .. } => 8,
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            Scenario::ThreeRooms => "three rooms in a row",
            Scenario::Square => "four rooms in a square",
            Scenario::Looped => "looped dungeon",
            Scenario::Unreachable => "looped dungeon, unconnected goal",
            Scenario::DungeonX => "long paths to the food",
            Scenario::CaveIn => "cave-in on the stairs",
            Scenario::Grid => "fully connected 20x20 grid",
            Scenario::Random { .. } => "random dungeon",
        }
    }

    /// Name of the room the rat should reach.
    pub fn target(&self) -> String {
        match self {
            Scenario::ThreeRooms => "two".to_string(),
            Scenario::Square => "bottom right".to_string(),
            Scenario::Looped => "five".to_string(),
            Scenario::Unreachable => "unconnected".to_string(),
            Scenario::DungeonX | Scenario::CaveIn => "food".to_string(),
            Scenario::Grid => format!("{},{}", GRID_SIZE - 1, GRID_SIZE - 1),
            Scenario::Random { rooms, .. } => format!("r{}", rooms.saturating_sub(1)),
        }
    }

    /// The route every strategy must find, when there is exactly one.
    pub fn expected_path(&self) -> Option<Vec<&'static str>> {
        match self {
            Scenario::ThreeRooms => Some(vec!["start here", "one", "two"]),
            Scenario::Square => Some(vec!["top left", "top right", "bottom right"]),
            Scenario::Looped => Some(vec!["start", "two", "one", "three", "four", "five"]),
            Scenario::Unreachable => Some(vec![]),
            Scenario::DungeonX => Some(vec![
                "center",
                "south1",
                "south2",
                "stair1",
                "upstairs-east1",
                "food",
            ]),
            Scenario::CaveIn => Some(vec!["center", "downstairs", "west1", "sw2", "sw3", "food"]),
            Scenario::Grid | Scenario::Random { .. } => None,
        }
    }

    /// Builds the dungeon and its rat.
    pub fn build(&self) -> Result<Rat, DungeonError> {
        match *self {
            Scenario::ThreeRooms => rat_in_three_room_dungeon(),
            Scenario::Square => rat_in_square_dungeon(),
            Scenario::Looped | Scenario::Unreachable => rat_in_looped_dungeon(),
            Scenario::DungeonX => rat_in_dungeon_x(),
            Scenario::CaveIn => rat_after_cave_in(),
            Scenario::Grid => rat_in_fully_connected_grid(GRID_SIZE),
            Scenario::Random { rooms, seed } => rat_in_random_dungeon(rooms, seed),
        }
    }

    /// Checks a computed route against what this scenario requires.
    pub fn accepts(&self, path: &[String]) -> bool {
        match self.expected_path() {
            Some(expected) => path == expected.as_slice(),
            None => {
                let reaches_target = path.last() == Some(&self.target());
                match self {
                    Scenario::Grid => reaches_target && path.len() > GRID_SIZE - 1,
                    _ => reaches_target,
                }
            }
        }
    }
}

/// Three rooms in a row, going north from "start here".
pub fn rat_in_three_room_dungeon() -> Result<Rat, DungeonError> {
    let mut d = Dungeon::new(Room::new("start here", 1))?;
    let r0 = d.start();
    let r1 = d.add_room(Room::new("one", 1))?;
    let r2 = d.add_room(Room::new("two", 2))?;
    d.add_neighbor(r0, r1, Direction::North)?;
    d.add_neighbor(r1, r2, Direction::North)?;
    Ok(Rat::new(d, r0))
}

/// Four rooms in a square, starting at the top left.
pub fn rat_in_square_dungeon() -> Result<Rat, DungeonError> {
    let mut d = Dungeon::new(Room::named("top left"))?;
    let top_left = d.start();
    let bottom_left = d.add_room(Room::named("bottom left"))?;
    let top_right = d.add_room(Room::named("top right"))?;
    let bottom_right = d.add_room(Room::named("bottom right"))?;
    d.add_neighbor(top_left, top_right, Direction::East)?;
    d.add_neighbor(top_left, bottom_left, Direction::South)?;
    d.add_neighbor(bottom_right, bottom_left, Direction::West)?;
    d.add_neighbor(bottom_right, top_right, Direction::North)?;
    Ok(Rat::new(d, top_left))
}

/// Six connected rooms plus one unconnected room.
///
/// Linking "two" up to "start" reuses the start's down slot, so the start
/// only leads to "two" even though "one" still leads up to the start.
pub fn rat_in_looped_dungeon() -> Result<Rat, DungeonError> {
    let mut d = Dungeon::new(Room::new("start", 0))?;
    let r0 = d.start();
    let r1 = d.add_room(Room::new("one", 1))?;
    let r2 = d.add_room(Room::new("two", 1))?;
    let r3 = d.add_room(Room::new("three", 1))?;
    let r4 = d.add_room(Room::new("four", 1))?;
    let r5 = d.add_room(Room::new("five", 1))?;
    d.add_room(Room::new("unconnected", 1))?;
    d.add_neighbor(r0, r1, Direction::Down)?;
    d.add_neighbor(r1, r2, Direction::North)?;
    d.add_neighbor(r1, r3, Direction::South)?;
    d.add_neighbor(r2, r0, Direction::Up)?;
    d.add_neighbor(r3, r4, Direction::East)?;
    d.add_neighbor(r4, r5, Direction::South)?;
    Ok(Rat::new(d, r0))
}

/// Several long paths and one loop around a central room.
///
/// ```text
///                  north2
///                  north1
/// west1 downstairs center east1
///  |               south1
/// sw2              south2 stair1 upstairs-east1
/// sw3 -----------------------------> food
/// ```
pub fn rat_in_dungeon_x() -> Result<Rat, DungeonError> {
    let mut d = Dungeon::new(Room::new("center", 1))?;
    let center = d.start();
    let north1 = d.add_room(Room::new("north1", 1))?;
    let north2 = d.add_room(Room::new("north2", 1))?;
    let east1 = d.add_room(Room::new("east1", 1))?;
    let down = d.add_room(Room::new("downstairs", 0))?;
    let west1 = d.add_room(Room::new("west1", 0))?;
    let sw2 = d.add_room(Room::new("sw2", 0))?;
    let sw3 = d.add_room(Room::new("sw3", 0))?;
    let south1 = d.add_room(Room::new("south1", 1))?;
    let south2 = d.add_room(Room::new("south2", 1))?;
    let stair1 = d.add_room(Room::new("stair1", 2))?;
    let upstairs_east1 = d.add_room(Room::new("upstairs-east1", 2))?;
    let food = d.add_room(Room::new("food", 1))?;

    d.add_neighbor(center, north1, Direction::North)?;
    d.add_neighbor(north1, north2, Direction::North)?;
    d.add_neighbor(center, down, Direction::Down)?;
    d.add_neighbor(down, west1, Direction::West)?;
    d.add_neighbor(west1, sw2, Direction::South)?;
    d.add_neighbor(sw2, sw3, Direction::South)?;
    d.add_neighbor(sw3, food, Direction::Up)?;
    d.add_neighbor(center, east1, Direction::East)?;
    d.add_neighbor(center, south1, Direction::South)?;
    d.add_neighbor(south1, south2, Direction::South)?;
    d.add_neighbor(south2, stair1, Direction::Up)?;
    d.add_neighbor(stair1, upstairs_east1, Direction::East)?;
    d.add_neighbor(upstairs_east1, food, Direction::Down)?;
    Ok(Rat::new(d, center))
}

/// [`rat_in_dungeon_x`] after south2's stairs are replaced by a dead end,
/// which forces the route through downstairs.
pub fn rat_after_cave_in() -> Result<Rat, DungeonError> {
    let mut rat = rat_in_dungeon_x()?;
    let dungeon = rat.dungeon_mut();
    let south2 = dungeon.find("south2")?;
    let new_stairs = dungeon.add_room(Room::new("hidden stairway", 3))?;
    dungeon.add_neighbor(south2, new_stairs, Direction::Up)?;
    Ok(rat)
}

/// Name of the grid room at `row`, `col`.
pub fn grid_room_name(row: usize, col: usize) -> String {
    format!("{},{}", row, col)
}

/// A `size` x `size` grid where every room is linked to the rooms beside it.
pub fn rat_in_fully_connected_grid(size: usize) -> Result<Rat, DungeonError> {
    let mut d = Dungeon::new(Room::named(grid_room_name(0, 0)))?;
    let start = d.start();
    for row in 0..size {
        for col in 0..size {
            if row > 0 || col > 0 {
                d.add_room(Room::named(grid_room_name(row, col)))?;
            }
        }
    }
    for row in 0..size {
        for col in 0..size {
            connect_grid_neighbors(&mut d, row, col)?;
        }
    }
    Ok(Rat::new(d, start))
}

/// Links the room at `row`, `col` to the rooms north and west of it.
fn connect_grid_neighbors(d: &mut Dungeon, row: usize, col: usize) -> Result<(), DungeonError> {
    let current = d.find(&grid_room_name(row, col))?;
    if row != 0 {
        let north = d.find(&grid_room_name(row - 1, col))?;
        d.add_neighbor(current, north, Direction::North)?;
    }
    if col != 0 {
        let west = d.find(&grid_room_name(row, col - 1))?;
        d.add_neighbor(current, west, Direction::West)?;
    }
    Ok(())
}

/// A connected dungeon of `rooms` rooms named `r0`, `r1`, ... with random
/// two-way passages. The same seed always produces the same dungeon.
///
/// Every room hangs off an earlier one, and extra passages only use free
/// slots, so all rooms stay reachable from `r0`.
pub fn rat_in_random_dungeon(rooms: usize, seed: u64) -> Result<Rat, DungeonError> {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut d = Dungeon::new(Room::new("r0", 0))?;
    let mut ids: Vec<RoomId> = vec![d.start()];

    for i in 1..rooms {
        let level = rng.random_range(0..3);
        let id = d.add_room(Room::new(format!("r{}", i), level))?;
        let offset = rng.random_range(0..ids.len());
        for k in 0..ids.len() {
            let parent = ids[(offset + k) % ids.len()];
            if let Some(dir) = free_direction(&d, parent, id, &mut rng) {
                d.add_neighbor(parent, id, dir)?;
                break;
            }
        }
        ids.push(id);
    }

    if ids.len() > 1 {
        for _ in 0..rooms / 2 {
            let a = ids[rng.random_range(0..ids.len())];
            let b = ids[rng.random_range(0..ids.len())];
            if a == b {
                continue;
            }
            if let Some(dir) = free_direction(&d, a, b, &mut rng) {
                d.add_neighbor(a, b, dir)?;
            }
        }
    }

    for &id in &ids {
        if rng.random_bool(0.1) {
            d[id].trap = Some("pit".to_string());
        } else if rng.random_bool(0.1) {
            d[id].monster = Some("spider".to_string());
        }
    }

    log::debug!("generated random dungeon of {} rooms from seed {}", rooms, seed);
    Ok(Rat::at_start(d))
}

/// A random direction whose slot is empty in `from` and whose opposite slot is
/// empty in `to`.
fn free_direction(d: &Dungeon, from: RoomId, to: RoomId, rng: &mut StdRng) -> Option<Direction> {
    let offset = rng.random_range(0..Direction::ALL.len());
    (0..Direction::ALL.len())
        .map(|k| Direction::ALL[(offset + k) % Direction::ALL.len()])
        .find(|&dir| {
            d[from].neighbor_to(dir).is_none() && d[to].neighbor_to(dir.opposite()).is_none()
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_round_trip() {
        for n in 1..=8 {
            let scenario = Scenario::from_number(n, 7).unwrap();
            assert_eq!(scenario.number(), n);
        }
        assert_eq!(Scenario::from_number(0, 7), None);
        assert_eq!(Scenario::from_number(9, 7), None);
    }

    #[test]
    fn test_every_target_is_registered() {
        for n in 1..=8 {
            let scenario = Scenario::from_number(n, 3).unwrap();
            let rat = scenario.build().unwrap();
            assert!(rat.dungeon().has(&scenario.target()), "{}", scenario.title());
        }
    }

    #[test]
    fn test_grid_size() {
        let rat = rat_in_fully_connected_grid(4).unwrap();
        assert_eq!(rat.dungeon().size(), 16);
        let corner = rat.dungeon().find("3,3").unwrap();
        assert_eq!(rat.dungeon()[corner].neighbors().count(), 2);
        let middle = rat.dungeon().find("1,2").unwrap();
        assert_eq!(rat.dungeon()[middle].neighbors().count(), 4);
    }

    #[test]
    fn test_random_dungeon_is_deterministic() {
        let a = rat_in_random_dungeon(25, 99).unwrap();
        let b = rat_in_random_dungeon(25, 99).unwrap();
        assert_eq!(a.dungeon().rooms(), b.dungeon().rooms());
        assert_eq!(a.dungeon().size(), 25);
    }

    #[test]
    fn test_random_dungeon_links_are_symmetric() {
        let rat = rat_in_random_dungeon(40, 5).unwrap();
        let rooms = rat.dungeon().rooms();
        for (id, room) in rooms.enumerate() {
            for (dir, neighbor) in room.exits() {
                assert_eq!(rooms[neighbor].neighbor_to(dir.opposite()), Some(id));
            }
        }
    }

    #[test]
    fn test_accepts() {
        let square = Scenario::Square;
        let good: Vec<String> = ["top left", "top right", "bottom right"]
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert!(square.accepts(&good));
        assert!(!square.accepts(&good[..2]));
        assert!(Scenario::Unreachable.accepts(&[]));
        assert!(!Scenario::Grid.accepts(&["0,0".to_string(), "19,19".to_string()]));
    }
}
