use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use tilewalk_core::{GridPosition, TileType};
use tilewalk_system_pathfinding::{find_path, is_corner_safe, path_cost, step_cost};
use tilewalk_world::Grid;

fn walkable_cells(grid: &Grid) -> Vec<GridPosition> {
    grid.iter()
        .filter(|(_, cell)| cell.is_walkable())
        .map(|(position, _)| position)
        .collect()
}

#[test]
fn start_equal_to_goal_yields_single_cell() {
    let grid = Grid::with_pillars(9, 7, 10, 3).expect("grid");
    for cell in walkable_cells(&grid) {
        assert_eq!(find_path(&grid, cell, cell), Some(vec![cell]));
    }
}

#[test]
fn unwalkable_or_outside_endpoints_yield_none() {
    let grid = Grid::bordered(6, 6).expect("grid");
    let floor = GridPosition::new(2, 2);
    let wall = GridPosition::new(0, 3);
    let outside = [
        GridPosition::new(-1, 2),
        GridPosition::new(2, -1),
        GridPosition::new(6, 2),
        GridPosition::new(2, 6),
    ];

    assert_eq!(find_path(&grid, floor, wall), None);
    assert_eq!(find_path(&grid, wall, floor), None);
    assert_eq!(find_path(&grid, wall, wall), None);
    for cell in outside {
        assert_eq!(find_path(&grid, floor, cell), None, "{cell:?}");
        assert_eq!(find_path(&grid, cell, floor), None, "{cell:?}");
    }
}

#[test]
fn open_grid_paths_take_chebyshev_steps() {
    let grid = Grid::bordered(12, 9).expect("grid");
    let cells = walkable_cells(&grid);

    for &start in cells.iter().step_by(3) {
        for &goal in cells.iter().step_by(5) {
            let path = find_path(&grid, start, goal).expect("open grid is connected");
            assert_eq!(path.first(), Some(&start));
            assert_eq!(path.last(), Some(&goal));
            assert_eq!(
                path.len(),
                1 + start.chebyshev_distance(goal) as usize,
                "{start:?} -> {goal:?}"
            );
        }
    }
}

#[test]
fn corner_to_corner_on_bordered_twenty_grid() {
    let grid = Grid::bordered(20, 20).expect("grid");
    let start = GridPosition::new(1, 1);
    let goal = GridPosition::new(18, 18);

    let path = find_path(&grid, start, goal).expect("path exists");

    assert_eq!(path.len(), 18);
    for (index, cell) in path.iter().enumerate() {
        let step = index as i32 + 1;
        assert_eq!(*cell, GridPosition::new(step, step));
    }
    let cost = path_cost(&path).expect("adjacent steps");
    assert!((cost - 17.0 * std::f32::consts::SQRT_2).abs() < 1e-3);
}

#[test]
fn walled_in_cell_is_isolated() {
    let mut grid = Grid::bordered(9, 9).expect("grid");
    let center = GridPosition::new(4, 4);
    for dx in -1..=1 {
        for dy in -1..=1 {
            if dx != 0 || dy != 0 {
                grid.set_tile(center.offset(dx, dy), TileType::Wall)
                    .expect("in bounds");
            }
        }
    }

    let elsewhere = GridPosition::new(1, 1);
    assert_eq!(find_path(&grid, center, elsewhere), None);
    assert_eq!(find_path(&grid, elsewhere, center), None);
    assert_eq!(find_path(&grid, center, center), Some(vec![center]));

    grid.set_tile(center, TileType::Wall).expect("in bounds");
    assert_eq!(find_path(&grid, elsewhere, center), None);
}

#[test]
fn random_maps_produce_valid_optimal_paths() {
    let mut rng = ChaCha8Rng::seed_from_u64(0x5eed);

    for seed in 0..24 {
        let grid = Grid::with_pillars(14, 11, 35, seed).expect("grid");
        let cells = walkable_cells(&grid);

        for _ in 0..20 {
            let start = cells[rng.gen_range(0..cells.len())];
            let goal = cells[rng.gen_range(0..cells.len())];
            let Some(path) = find_path(&grid, start, goal) else {
                continue;
            };

            assert_eq!(path.first(), Some(&start));
            assert_eq!(path.last(), Some(&goal));
            for pair in path.windows(2) {
                assert!(grid.is_walkable(pair[1]));
                assert!(step_cost(pair[0], pair[1]).is_some(), "non-adjacent step");
                assert!(
                    is_corner_safe(&grid, pair[0], pair[1]),
                    "corner cut between {:?} and {:?}",
                    pair[0],
                    pair[1]
                );
            }

            let cost = path_cost(&path).expect("adjacent steps");
            let lower_bound = start.chebyshev_distance(goal) as f32;
            assert!(cost + 1e-4 >= lower_bound);
        }
    }
}

#[test]
fn equal_cost_choices_are_reproducible() {
    let grid = Grid::with_pillars(16, 16, 40, 99).expect("grid");
    let cells = walkable_cells(&grid);
    let start = cells[0];
    let goal = cells[cells.len() - 1];

    let first = find_path(&grid, start, goal);
    for _ in 0..5 {
        assert_eq!(find_path(&grid, start, goal), first);
    }
}
