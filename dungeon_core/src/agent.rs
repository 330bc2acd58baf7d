use std::{
    collections::{HashSet, VecDeque},
    fmt,
    str::FromStr,
};

use crate::{RoomId, dungeon::Dungeon};

/// The uninformed search a [`Rat`] can run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SearchStrategy {
    DepthFirst,
    BreadthFirst,
    IterativeDeepening,
}

impl SearchStrategy {
    pub const ALL: [SearchStrategy; 3] = [
        SearchStrategy::DepthFirst,
        SearchStrategy::BreadthFirst,
        SearchStrategy::IterativeDeepening,
    ];

    /// Single-letter code: `d`, `b` or `i`.
    pub const fn letter(self) -> char {
        match self {
            SearchStrategy::DepthFirst => 'd',
            SearchStrategy::BreadthFirst => 'b',
            SearchStrategy::IterativeDeepening => 'i',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum StrategyError {
    #[error(
        "Invalid algorithm code '{0}': use (d)epth-first, (b)readth-first or (i)terative deepening"
    )]
    Unknown(String),
}

impl FromStr for SearchStrategy {
    type Err = StrategyError;

    /// Only the first character counts, ignoring case, so `"d"`, `"DFS"` and
    /// `"depth"` all select depth-first search.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().chars().next().map(|c| c.to_ascii_lowercase()) {
            Some('d') => Ok(SearchStrategy::DepthFirst),
            Some('b') => Ok(SearchStrategy::BreadthFirst),
            Some('i') => Ok(SearchStrategy::IterativeDeepening),
            _ => Err(StrategyError::Unknown(s.to_string())),
        }
    }
}

impl fmt::Display for SearchStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SearchStrategy::DepthFirst => "depth-first",
            SearchStrategy::BreadthFirst => "breadth-first",
            SearchStrategy::IterativeDeepening => "iterative deepening",
        };
        f.write_str(name)
    }
}

/// Everything one search produced, for display and inspection.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchTrace {
    pub strategy: SearchStrategy,
    /// Rooms from start to target inclusive, or empty when unreachable.
    pub path: Vec<RoomId>,
    /// Rooms in the order they were visited. Iterative deepening repeats
    /// rooms across rounds.
    pub visited: Vec<RoomId>,
    /// Depth bound that produced the path, for iterative deepening.
    pub depth: Option<usize>,
}

type Path = Vec<RoomId>;

/// Collection of partial paths awaiting expansion.
trait Frontier: Default {
    /// Whether the most recently added path comes out first.
    const LIFO: bool;

    fn put(&mut self, path: Path);

    fn take(&mut self) -> Option<Path>;
}

/// Depth-first frontier.
type Stack = Vec<Path>;

/// Breadth-first frontier.
type Queue = VecDeque<Path>;

impl Frontier for Stack {
    const LIFO: bool = true;

    fn put(&mut self, path: Path) {
        self.push(path);
    }

    fn take(&mut self) -> Option<Path> {
        self.pop()
    }
}

impl Frontier for Queue {
    const LIFO: bool = false;

    fn put(&mut self, path: Path) {
        self.push_back(path);
    }

    fn take(&mut self) -> Option<Path> {
        self.pop_front()
    }
}

/// An agent that explores a dungeon by searching for paths between rooms.
///
/// The rat always searches from the start location it was created with. It
/// keeps no state between searches, so changes made through
/// [`Rat::dungeon_mut`] are seen by the next search.
#[derive(Debug, Clone)]
pub struct Rat {
    dungeon: Dungeon,
    start_location: RoomId,
    echo_rooms_searched: bool,
}

impl Rat {
    /// Creates a rat in `dungeon` that searches from `start_location`.
    pub fn new(dungeon: Dungeon, start_location: RoomId) -> Self {
        Rat {
            dungeon,
            start_location,
            echo_rooms_searched: false,
        }
    }

    /// Creates a rat at the dungeon's recommended start.
    pub fn at_start(dungeon: Dungeon) -> Self {
        let start = dungeon.start();
        Rat::new(dungeon, start)
    }

    /// Builder form of [`Rat::set_echo_rooms_searched`].
    pub fn with_echo(mut self, echo: bool) -> Self {
        self.echo_rooms_searched = echo;
        self
    }

    /// Makes the rat log each room's name as it is visited.
    pub fn set_echo_rooms_searched(&mut self) {
        self.echo_rooms_searched = true;
    }

    pub fn echo_rooms_searched(&self) -> bool {
        self.echo_rooms_searched
    }

    pub fn dungeon(&self) -> &Dungeon {
        &self.dungeon
    }

    /// Mutable access for changing the dungeon between searches.
    pub fn dungeon_mut(&mut self) -> &mut Dungeon {
        &mut self.dungeon
    }

    pub fn start_location(&self) -> RoomId {
        self.start_location
    }

    /// Path from the start to `target` found with depth-first search.
    ///
    /// The path includes both ends and is empty if there is none.
    ///
    /// # Panics
    ///
    /// Panics if `target` or the start location is not a room of the dungeon.
    pub fn path_to(&self, target: RoomId) -> Vec<RoomId> {
        self.path_with(SearchStrategy::DepthFirst, target)
    }

    /// Path from the start to `target` found with breadth-first search; it has
    /// the fewest possible passages.
    pub fn bfs_path_to(&self, target: RoomId) -> Vec<RoomId> {
        self.path_with(SearchStrategy::BreadthFirst, target)
    }

    /// Path from the start to `target` found with iterative deepening, with
    /// depth bounds from 1 up to the number of registered rooms.
    pub fn id_path_to(&self, target: RoomId) -> Vec<RoomId> {
        self.path_with(SearchStrategy::IterativeDeepening, target)
    }

    /// Room names along [`Rat::path_to`].
    pub fn directions_to(&self, target: RoomId) -> Vec<String> {
        self.directions_with(SearchStrategy::DepthFirst, target)
    }

    /// Room names along [`Rat::bfs_path_to`].
    pub fn bfs_directions_to(&self, target: RoomId) -> Vec<String> {
        self.directions_with(SearchStrategy::BreadthFirst, target)
    }

    /// Room names along [`Rat::id_path_to`].
    pub fn id_directions_to(&self, target: RoomId) -> Vec<String> {
        self.directions_with(SearchStrategy::IterativeDeepening, target)
    }

    pub fn path_with(&self, strategy: SearchStrategy, target: RoomId) -> Vec<RoomId> {
        self.trace(strategy, target).path
    }

    pub fn directions_with(&self, strategy: SearchStrategy, target: RoomId) -> Vec<String> {
        self.names(&self.path_with(strategy, target))
    }

    /// Converts a path of ids into room names.
    pub fn names(&self, path: &[RoomId]) -> Vec<String> {
        path.iter()
            .map(|&id| self.dungeon[id].name().to_string())
            .collect()
    }

    /// Runs a search and reports the path together with the visit order.
    pub fn trace(&self, strategy: SearchStrategy, target: RoomId) -> SearchTrace {
        log::debug!(
            "{} search from '{}' to '{}'",
            strategy,
            self.dungeon[self.start_location].name(),
            self.dungeon[target].name()
        );
        let mut visited = Vec::new();
        let (path, depth) = match strategy {
            SearchStrategy::DepthFirst => (self.explore::<Stack>(target, None, &mut visited), None),
            SearchStrategy::BreadthFirst => {
                (self.explore::<Queue>(target, None, &mut visited), None)
            }
            SearchStrategy::IterativeDeepening => self.deepen(target, &mut visited),
        };
        log::debug!(
            "{} search visited {} rooms, path has {} rooms",
            strategy,
            visited.len(),
            path.len()
        );
        SearchTrace {
            strategy,
            path,
            visited,
            depth,
        }
    }

    /// Expands partial paths from the start until one ends at the target.
    ///
    /// A room is expanded only the first time a path to it is taken off the
    /// frontier. With a `limit`, paths never grow beyond that many passages.
    fn explore<F: Frontier>(
        &self,
        target: RoomId,
        limit: Option<usize>,
        visits: &mut Vec<RoomId>,
    ) -> Vec<RoomId> {
        let rooms = self.dungeon.rooms();
        let goal = rooms[target].name();
        let mut frontier = F::default();
        let mut visited: HashSet<&str> = HashSet::new();
        frontier.put(vec![self.start_location]);

        while let Some(path) = frontier.take() {
            let Some(&current) = path.last() else {
                continue;
            };
            let room = &rooms[current];
            if !visited.insert(room.name()) {
                continue;
            }
            visits.push(current);
            if self.echo_rooms_searched {
                log::info!(target: "rat::visit", "Visiting: {}", room.name());
            }
            if room.name() == goal {
                return path;
            }
            if limit.is_some_and(|limit| path.len() > limit) {
                continue;
            }

            // LIFO frontiers get neighbors reversed so they pop in direction order
            let neighbors: Vec<RoomId> = if F::LIFO {
                room.neighbors().rev().collect()
            } else {
                room.neighbors().collect()
            };
            for next in neighbors {
                if visited.contains(rooms[next].name()) {
                    continue;
                }
                let mut extended = Vec::with_capacity(path.len() + 1);
                extended.extend_from_slice(&path);
                extended.push(next);
                frontier.put(extended);
            }
        }
        Vec::new()
    }

    /// Depth-limited depth-first search with growing bounds.
    ///
    /// The bound stops at the registered room count, so a target only
    /// reachable through a longer chain of unregistered rooms is reported as
    /// unreachable.
    fn deepen(&self, target: RoomId, visits: &mut Vec<RoomId>) -> (Vec<RoomId>, Option<usize>) {
        for depth in 1..=self.dungeon.size() {
            let path = self.explore::<Stack>(target, Some(depth), visits);
            if !path.is_empty() {
                return (path, Some(depth));
            }
        }
        (Vec::new(), None)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Direction, map::Room};
    use std::cell::RefCell;

    thread_local! {
        static ECHOED: RefCell<Vec<String>> = const { RefCell::new(Vec::new()) };
    }

    /// Collects `rat::visit` lines on the thread that emits them.
    struct VisitCapture;

    impl log::Log for VisitCapture {
        fn enabled(&self, metadata: &log::Metadata) -> bool {
            metadata.target() == "rat::visit"
        }

        fn log(&self, record: &log::Record) {
            if self.enabled(record.metadata()) {
                ECHOED.with(|echoed| echoed.borrow_mut().push(record.args().to_string()));
            }
        }

        fn flush(&self) {}
    }

    static CAPTURE: VisitCapture = VisitCapture;

    fn echoed_during<T>(f: impl FnOnce() -> T) -> (T, Vec<String>) {
        // another test may have installed it already
        let _ = log::set_logger(&CAPTURE);
        log::set_max_level(log::LevelFilter::Info);
        ECHOED.with(|echoed| echoed.borrow_mut().clear());
        let result = f();
        (result, ECHOED.with(|echoed| echoed.take()))
    }

    /// top left -- top right
    ///    |            |
    /// bottom left -- bottom right
    fn square() -> (Rat, RoomId) {
        let mut d = Dungeon::new(Room::named("top left")).unwrap();
        let tl = d.start();
        let bl = d.add_room(Room::named("bottom left")).unwrap();
        let tr = d.add_room(Room::named("top right")).unwrap();
        let br = d.add_room(Room::named("bottom right")).unwrap();
        d.add_neighbor(tl, tr, Direction::East).unwrap();
        d.add_neighbor(tl, bl, Direction::South).unwrap();
        d.add_neighbor(br, bl, Direction::West).unwrap();
        d.add_neighbor(br, tr, Direction::North).unwrap();
        (Rat::new(d, tl), br)
    }

    fn visited_names(rat: &Rat, trace: &SearchTrace) -> Vec<String> {
        rat.names(&trace.visited)
    }

    #[test]
    fn test_parse_strategy_letters() {
        assert_eq!("d".parse::<SearchStrategy>(), Ok(SearchStrategy::DepthFirst));
        assert_eq!("Breadth".parse::<SearchStrategy>(), Ok(SearchStrategy::BreadthFirst));
        assert_eq!(
            " I ".parse::<SearchStrategy>(),
            Ok(SearchStrategy::IterativeDeepening)
        );
        assert!("x".parse::<SearchStrategy>().is_err());
        assert!("".parse::<SearchStrategy>().is_err());
        for s in SearchStrategy::ALL {
            assert_eq!(s.letter().to_string().parse::<SearchStrategy>(), Ok(s));
        }
    }

    #[test]
    fn test_depth_first_visit_order() {
        let (rat, br) = square();
        let trace = rat.trace(SearchStrategy::DepthFirst, br);
        assert_eq!(
            visited_names(&rat, &trace),
            vec!["top left", "top right", "bottom right"]
        );
        assert_eq!(trace.depth, None);
    }

    #[test]
    fn test_breadth_first_visit_order() {
        let (rat, br) = square();
        let trace = rat.trace(SearchStrategy::BreadthFirst, br);
        assert_eq!(
            visited_names(&rat, &trace),
            vec!["top left", "top right", "bottom left", "bottom right"]
        );
        assert_eq!(
            rat.names(&trace.path),
            vec!["top left", "top right", "bottom right"]
        );
    }

    #[test]
    fn test_iterative_deepening_repeats_rounds() {
        let (rat, br) = square();
        let trace = rat.trace(SearchStrategy::IterativeDeepening, br);
        assert_eq!(trace.depth, Some(2));
        assert_eq!(
            visited_names(&rat, &trace),
            vec![
                "top left",
                "top right",
                "bottom left",
                "top left",
                "top right",
                "bottom right"
            ]
        );
    }

    #[test]
    fn test_target_is_start() {
        let (rat, _) = square();
        let start = rat.start_location();
        for s in SearchStrategy::ALL {
            assert_eq!(rat.path_with(s, start), vec![start]);
        }
    }

    #[test]
    fn test_echo_does_not_change_result() {
        let (rat, br) = square();
        let quiet = rat.trace(SearchStrategy::BreadthFirst, br);
        let rat = rat.with_echo(true);
        assert!(rat.echo_rooms_searched());
        assert_eq!(rat.trace(SearchStrategy::BreadthFirst, br), quiet);
    }

    #[test]
    fn test_echo_lines_follow_visit_order() {
        let (mut rat, br) = square();
        let (_, silent) = echoed_during(|| rat.trace(SearchStrategy::IterativeDeepening, br));
        assert!(silent.is_empty());

        rat.set_echo_rooms_searched();
        assert!(rat.echo_rooms_searched());
        for s in SearchStrategy::ALL {
            let (trace, echoed) = echoed_during(|| rat.trace(s, br));
            let expected: Vec<String> = visited_names(&rat, &trace)
                .into_iter()
                .map(|name| format!("Visiting: {}", name))
                .collect();
            assert_eq!(echoed, expected, "{}", s);
        }
    }

    #[test]
    fn test_one_way_passage_is_not_walked_backwards() {
        let mut d = Dungeon::new(Room::named("cellar")).unwrap();
        let cellar = d.start();
        let attic = d.add_room(Room::named("attic")).unwrap();
        d.add_single_direction_neighbor(attic, cellar, Direction::Down).unwrap();
        let rat = Rat::at_start(d);
        for s in SearchStrategy::ALL {
            assert!(rat.path_with(s, attic).is_empty());
        }
    }

    #[test]
    fn test_deepening_ceiling_is_registered_count() {
        // start -> a -> b -> c where only the start is registered
        let mut d = Dungeon::new(Room::named("start")).unwrap();
        let mut previous = d.start();
        let mut chain = Vec::new();
        for name in ["a", "b", "c"] {
            let next = d.insert_room(Room::named(name)).unwrap();
            d.add_neighbor(previous, next, Direction::North).unwrap();
            chain.push(next);
            previous = next;
        }
        let rat = Rat::at_start(d);
        let far = chain[2];
        assert_eq!(rat.directions_to(far), vec!["start", "a", "b", "c"]);
        assert_eq!(rat.bfs_path_to(far).len(), 4);
        assert!(rat.id_path_to(far).is_empty());
        assert_eq!(rat.id_directions_to(chain[0]), vec!["start", "a"]);
    }
}
