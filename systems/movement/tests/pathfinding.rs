use maze_escape_core::CellCoord;
use maze_escape_system_movement::{find_path, gradient_step};
use maze_escape_world::{MazeConfig, MazeState, Passability, SPAWN};

fn maze(seed: u32) -> MazeState {
    MazeState::generate(&MazeConfig {
        seed,
        include_telepads: false,
        ..MazeConfig::default()
    })
}

#[test]
fn astar_agrees_with_distance_field_on_generated_mazes() {
    for seed in [1, 9, 77] {
        let maze = maze(seed);
        let field = maze.agent_field(SPAWN);
        let goals: Vec<CellCoord> = field.reachable_cells().step_by(7).collect();
        for goal in goals {
            let route = find_path(maze.grid(), SPAWN, goal, Passability::Agent)
                .expect("reachable goal has a route");
            assert_eq!(Some(route.len() as u32), field.reachable_distance(goal));
        }
    }
}

#[test]
fn gradient_descent_reaches_the_origin_from_every_tile() {
    let maze = maze(3);
    let field = maze.agent_field(SPAWN);
    for start in field.reachable_cells() {
        let mut cell = start;
        let mut previous = field.reachable_distance(cell).unwrap_or(0);
        while let Some(next) = gradient_step(&field, maze.grid(), cell, Passability::Agent) {
            let distance = field.reachable_distance(next).unwrap_or(u32::MAX);
            assert_eq!(distance + 1, previous);
            previous = distance;
            cell = next;
        }
        assert_eq!(cell, SPAWN);
    }
}

#[test]
fn generators_are_never_routed_through() {
    let maze = maze(5);
    let field = maze.agent_field(SPAWN);
    let far = field
        .reachable_cells()
        .max_by_key(|cell| field.reachable_distance(*cell))
        .expect("spawn is reachable");
    let route = find_path(maze.grid(), SPAWN, far, Passability::Agent).expect("route");
    for cell in route {
        assert!(maze.is_walkable(cell));
    }
}
