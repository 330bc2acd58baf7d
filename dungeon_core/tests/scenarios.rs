use dungeon_core::{
    Direction, Rat, Room, SearchStrategy,
    scenario::{
        self, GRID_SIZE, Scenario, rat_in_dungeon_x, rat_in_fully_connected_grid,
        rat_in_looped_dungeon,
    },
};

fn directions(rat: &Rat, strategy: SearchStrategy, target: &str) -> Vec<String> {
    let target = rat.dungeon().find(target).unwrap();
    rat.directions_with(strategy, target)
}

#[test]
fn test_first_six_scenarios_for_every_strategy() {
    for n in 1..=6 {
        let scenario = Scenario::from_number(n, 0).unwrap();
        let rat = scenario.build().unwrap();
        let expected = scenario.expected_path().unwrap();
        for strategy in SearchStrategy::ALL {
            let path = directions(&rat, strategy, &scenario.target());
            assert_eq!(path, expected, "scenario {} with {}", n, strategy);
            assert!(scenario.accepts(&path));
        }
    }
}

#[test]
fn test_three_rooms_wrappers_agree() {
    let rat = scenario::rat_in_three_room_dungeon().unwrap();
    let two = rat.dungeon().find("two").unwrap();
    let expected = vec!["start here", "one", "two"];
    assert_eq!(rat.directions_to(two), expected);
    assert_eq!(rat.bfs_directions_to(two), expected);
    assert_eq!(rat.id_directions_to(two), expected);
    assert_eq!(rat.names(&rat.path_to(two)), expected);
}

#[test]
fn test_unconnected_room_gives_empty_path() {
    let rat = rat_in_looped_dungeon().unwrap();
    let goal = rat.dungeon().find("unconnected").unwrap();
    assert!(rat.path_to(goal).is_empty());
    assert!(rat.bfs_path_to(goal).is_empty());
    assert!(rat.id_path_to(goal).is_empty());
}

#[test]
fn test_new_passage_is_seen_by_next_search() {
    let mut rat = rat_in_dungeon_x().unwrap();
    let food = rat.dungeon().find("food").unwrap();
    assert_eq!(
        rat.directions_to(food),
        vec!["center", "south1", "south2", "stair1", "upstairs-east1", "food"]
    );

    // a shortcut from east1 straight down to the food
    let east1 = rat.dungeon().find("east1").unwrap();
    rat.dungeon_mut()
        .add_single_direction_neighbor(east1, food, Direction::Down)
        .unwrap();
    for strategy in SearchStrategy::ALL {
        assert_eq!(
            directions(&rat, strategy, "food"),
            vec!["center", "east1", "food"],
            "{}",
            strategy
        );
    }
}

#[test]
fn test_cave_in_reroutes_through_downstairs() {
    let mut rat = rat_in_dungeon_x().unwrap();
    let dungeon = rat.dungeon_mut();
    let south2 = dungeon.find("south2").unwrap();
    let stairs = dungeon.add_room(Room::new("hidden stairway", 3)).unwrap();
    dungeon.add_neighbor(south2, stairs, Direction::Up).unwrap();
    for strategy in SearchStrategy::ALL {
        assert_eq!(
            directions(&rat, strategy, "food"),
            vec!["center", "downstairs", "west1", "sw2", "sw3", "food"]
        );
    }
}

#[test]
fn test_grid_corner_to_corner() {
    let rat = rat_in_fully_connected_grid(GRID_SIZE).unwrap();
    let goal = rat.dungeon().find("19,19").unwrap();
    let start = rat.start_location();

    for strategy in [SearchStrategy::DepthFirst, SearchStrategy::IterativeDeepening] {
        let path = rat.path_with(strategy, goal);
        assert!(path.len() - 1 > 19, "{} took {} passages", strategy, path.len() - 1);
        assert_eq!(path.first(), Some(&start));
        assert_eq!(path.last(), Some(&goal));
        assert!(Scenario::Grid.accepts(&rat.names(&path)));
    }

    let shortest = rat.bfs_path_to(goal);
    assert_eq!(shortest.len() - 1, 38);
    assert_eq!(rat.dungeon()[shortest[0]].name(), "0,0");
}

#[test]
fn test_random_scenario_reaches_target() {
    for seed in [1, 2, 3, 42] {
        let scenario = Scenario::from_number(8, seed).unwrap();
        let rat = scenario.build().unwrap();
        for strategy in SearchStrategy::ALL {
            let path = directions(&rat, strategy, &scenario.target());
            assert!(scenario.accepts(&path), "seed {} with {}", seed, strategy);
            assert_eq!(path[0], "r0");
        }
    }
}

#[test]
fn test_echo_trace_matches_path_end() {
    let rat = rat_in_dungeon_x().unwrap().with_echo(true);
    let food = rat.dungeon().find("food").unwrap();
    let trace = rat.trace(SearchStrategy::DepthFirst, food);
    assert_eq!(trace.visited.first(), Some(&rat.start_location()));
    assert_eq!(trace.visited.last(), Some(&food));
    assert_eq!(
        rat.names(&trace.visited),
        vec![
            "center",
            "east1",
            "north1",
            "north2",
            "south1",
            "south2",
            "stair1",
            "upstairs-east1",
            "food"
        ]
    );
}

#[test]
fn test_map_files_load() {
    let dungeon =
        dungeon_core::load_dungeon_from_string(include_str!("../../maps/dungeon_x.txt")).unwrap();
    assert_eq!(dungeon.size(), 13);
    let rat = Rat::at_start(dungeon);
    assert_eq!(
        directions(&rat, SearchStrategy::IterativeDeepening, "food"),
        Scenario::DungeonX.expected_path().unwrap()
    );
    let sw2 = rat.dungeon().find("sw2").unwrap();
    assert_eq!(rat.dungeon()[sw2].trap.as_deref(), Some("falling rocks"));

    let hidden =
        dungeon_core::load_dungeon_from_string(include_str!("../../maps/hidden_passage.txt"))
            .unwrap();
    assert_eq!(hidden.size(), 2);
    let rat = Rat::at_start(hidden);
    for strategy in SearchStrategy::ALL {
        assert_eq!(
            directions(&rat, strategy, "cellar"),
            vec!["hall", "crawlspace", "cellar"]
        );
    }
}
