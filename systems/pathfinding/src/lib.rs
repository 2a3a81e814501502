#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Deterministic A* pathfinding over the walkable tile grid.
//!
//! Agents move in eight directions. Cardinal steps cost [`CARDINAL_COST`],
//! diagonal steps cost [`DIAGONAL_COST`], and a diagonal step is only
//! permitted when both orthogonal cells bridging it are walkable, so paths
//! never cut wall corners. The Chebyshev distance serves as the heuristic.

use std::{cmp::Ordering, collections::BinaryHeap};

use tilewalk_core::GridPosition;
use tilewalk_world::Grid;
use tracing::{debug, trace};

/// Cost of moving to an orthogonally adjacent cell.
pub const CARDINAL_COST: f32 = 1.0;

/// Cost of moving to a diagonally adjacent cell.
pub const DIAGONAL_COST: f32 = std::f32::consts::SQRT_2;

const NEIGHBOR_OFFSETS: [(i32, i32); 8] = [
    (-1, -1),
    (-1, 0),
    (-1, 1),
    (0, -1),
    (0, 1),
    (1, -1),
    (1, 0),
    (1, 1),
];

/// Computes the cheapest path from `start` to `goal`.
///
/// The returned path begins with `start` and ends with `goal`. `None` is
/// returned when either endpoint lies outside the grid or is not walkable, or
/// when the goal cannot be reached. When `start == goal` the path is
/// `[start]`.
///
/// The open set is a binary heap ordered by lowest `f`, then lowest `h`, then
/// insertion order, which makes the chosen path reproducible whenever several
/// paths share the optimal cost.
#[must_use]
pub fn find_path(grid: &Grid, start: GridPosition, goal: GridPosition) -> Option<Vec<GridPosition>> {
    if !grid.is_walkable(start) || !grid.is_walkable(goal) {
        debug!(?start, ?goal, "path endpoints are not walkable");
        return None;
    }

    if start == goal {
        return Some(vec![start]);
    }

    let mut search = Search::new(grid);
    let path = search.run(start, goal);
    match &path {
        Some(path) => trace!(
            ?start,
            ?goal,
            waypoints = path.len(),
            expanded = search.expanded,
            "path found"
        ),
        None => debug!(?start, ?goal, expanded = search.expanded, "goal unreachable"),
    }
    path
}

/// Admissible estimate of the remaining cost between two cells.
#[must_use]
pub fn heuristic(from: GridPosition, to: GridPosition) -> f32 {
    from.chebyshev_distance(to) as f32
}

/// Cost of a single step between adjacent cells.
///
/// Returns `None` when the cells are identical or not adjacent.
#[must_use]
pub fn step_cost(from: GridPosition, to: GridPosition) -> Option<f32> {
    let dx = from.column().abs_diff(to.column());
    let dy = from.row().abs_diff(to.row());
    match (dx, dy) {
        (1, 1) => Some(DIAGONAL_COST),
        (1, 0) | (0, 1) => Some(CARDINAL_COST),
        _ => None,
    }
}

/// Total cost of walking `path` from its first to its last cell.
///
/// Returns `None` if two consecutive cells are not adjacent.
#[must_use]
pub fn path_cost(path: &[GridPosition]) -> Option<f32> {
    path.windows(2)
        .map(|pair| step_cost(pair[0], pair[1]))
        .sum()
}

/// Reports whether a diagonal step from `from` to `to` stays clear of wall corners.
///
/// Cardinal steps always satisfy the rule.
#[must_use]
pub fn is_corner_safe(grid: &Grid, from: GridPosition, to: GridPosition) -> bool {
    let dx = to.column() - from.column();
    let dy = to.row() - from.row();
    if dx == 0 || dy == 0 {
        return true;
    }

    grid.is_walkable(from.offset(dx, 0)) && grid.is_walkable(from.offset(0, dy))
}

#[derive(Clone, Copy, Debug)]
struct PathNode {
    position: GridPosition,
    parent: Option<usize>,
    g_cost: f32,
    h_cost: f32,
}

impl PathNode {
    fn f_cost(&self) -> f32 {
        self.g_cost + self.h_cost
    }
}

#[derive(Clone, Copy, Debug)]
struct OpenEntry {
    f_cost: f32,
    h_cost: f32,
    sequence: u64,
    index: usize,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for OpenEntry {}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for OpenEntry {
    // Reversed so the max-heap pops the cheapest, then oldest, entry first.
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .f_cost
            .total_cmp(&self.f_cost)
            .then_with(|| other.h_cost.total_cmp(&self.h_cost))
            .then_with(|| other.sequence.cmp(&self.sequence))
    }
}

/// Per-call search state. Nodes live in an arena indexed by grid cell and
/// refer to their parents by index.
struct Search<'a> {
    grid: &'a Grid,
    nodes: Vec<Option<PathNode>>,
    closed: Vec<bool>,
    open: BinaryHeap<OpenEntry>,
    sequence: u64,
    expanded: usize,
}

impl<'a> Search<'a> {
    fn new(grid: &'a Grid) -> Self {
        Self {
            grid,
            nodes: vec![None; grid.len()],
            closed: vec![false; grid.len()],
            open: BinaryHeap::new(),
            sequence: 0,
            expanded: 0,
        }
    }

    fn run(&mut self, start: GridPosition, goal: GridPosition) -> Option<Vec<GridPosition>> {
        let start_index = self.grid.index(start)?;
        let goal_index = self.grid.index(goal)?;

        self.admit(
            start_index,
            PathNode {
                position: start,
                parent: None,
                g_cost: 0.0,
                h_cost: heuristic(start, goal),
            },
        );

        while let Some(entry) = self.open.pop() {
            if self.closed[entry.index] {
                continue;
            }

            if entry.index == goal_index {
                return Some(self.reconstruct(goal_index));
            }

            self.closed[entry.index] = true;
            self.expanded += 1;

            let Some(current) = self.nodes[entry.index] else {
                continue;
            };

            for (dx, dy) in NEIGHBOR_OFFSETS {
                let neighbor = current.position.offset(dx, dy);
                let Some(neighbor_index) = self.grid.index(neighbor) else {
                    continue;
                };
                if self.closed[neighbor_index] || !self.grid.is_walkable(neighbor) {
                    continue;
                }
                if !is_corner_safe(self.grid, current.position, neighbor) {
                    continue;
                }
                let Some(cost) = step_cost(current.position, neighbor) else {
                    continue;
                };

                let tentative = current.g_cost + cost;
                let improves = self.nodes[neighbor_index]
                    .map_or(true, |known| tentative < known.g_cost);
                if !improves {
                    continue;
                }

                self.admit(
                    neighbor_index,
                    PathNode {
                        position: neighbor,
                        parent: Some(entry.index),
                        g_cost: tentative,
                        h_cost: heuristic(neighbor, goal),
                    },
                );
            }
        }

        None
    }

    fn admit(&mut self, index: usize, node: PathNode) {
        self.nodes[index] = Some(node);
        self.open.push(OpenEntry {
            f_cost: node.f_cost(),
            h_cost: node.h_cost,
            sequence: self.sequence,
            index,
        });
        self.sequence += 1;
    }

    fn reconstruct(&self, goal_index: usize) -> Vec<GridPosition> {
        let mut path = Vec::new();
        let mut cursor = Some(goal_index);
        while let Some(index) = cursor {
            let Some(node) = self.nodes[index] else {
                break;
            };
            path.push(node.position);
            cursor = node.parent;
        }
        path.reverse();
        path
    }
}
