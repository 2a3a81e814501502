#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Per-tick collision correction between agents and against wall tiles.
//!
//! Resolution is sequential in agent-list order: every agent is first
//! separated from the agents the spatial hash reports nearby, then pushed out
//! of the wall tiles its bounding box overlaps. Walls collide with their exact
//! outline, a rectangle for top-down tiles and a diamond for isometric ones.
//! An agent whose center still rounds onto a blocked cell afterwards is
//! settled back onto the nearest walkable tile. Corrections are geometric
//! clamps and never fail.

mod spatial;

use glam::Vec2;
use tilewalk_core::{Aabb, GridPosition, Projection, TileShape};
use tilewalk_system_movement::Agent;
use tilewalk_world::Grid;
use tracing::{debug, trace};

pub use spatial::{CellKey, IndexError, SpatialIndex};

/// Axis two agents are separated along when their centers coincide.
pub const COINCIDENT_AXIS: Vec2 = Vec2::X;

/// Fraction of the way from a tile's edge to its center at which a settled agent is placed.
const SETTLE_DEPTH: f32 = 0.25;

/// Farthest ring of cells searched for a walkable tile when settling.
const SETTLE_RINGS: i32 = 2;

/// Number of corrections applied during one collision pass.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CollisionReport {
    /// Agent pairs pushed apart.
    pub agent_contacts: usize,
    /// Agent and wall tile pairs resolved.
    pub wall_contacts: usize,
    /// Agents moved back onto a walkable tile after the wall pass.
    pub settled: usize,
}

/// Collision system that owns the spatial index and its query scratch buffer.
#[derive(Clone, Debug)]
pub struct CollisionResolver {
    index: SpatialIndex,
    nearby: Vec<usize>,
}

impl CollisionResolver {
    /// Creates a resolver whose spatial hash buckets are `cell_size` world units wide.
    pub fn new(cell_size: f32) -> Result<Self, IndexError> {
        Ok(Self {
            index: SpatialIndex::new(cell_size)?,
            nearby: Vec::new(),
        })
    }

    /// Spatial hash populated by the most recent pass.
    #[must_use]
    pub const fn index(&self) -> &SpatialIndex {
        &self.index
    }

    /// Separates overlapping agents and pushes agents out of walls.
    ///
    /// The spatial index is rebuilt from the current positions before any
    /// correction is applied. Elapsed time is not an input: corrections are
    /// positional and velocities are only clipped, never integrated.
    ///
    /// Once the pass returns, every agent that started on a walkable tile
    /// stands on one again, so it can keep planning paths.
    pub fn detect_and_resolve(
        &mut self,
        grid: &Grid,
        projection: &Projection,
        agents: &mut [Agent],
    ) -> CollisionReport {
        self.index.rebuild(agents);

        let mut report = CollisionReport::default();
        for current in 0..agents.len() {
            let bounds = agents[current].bounding_box();
            self.index.query_nearby(&bounds, &mut self.nearby);
            for &other in &self.nearby {
                if other == current {
                    continue;
                }
                let (first, second) = pair_mut(agents, current, other);
                if separate(first, second) {
                    report.agent_contacts += 1;
                }
            }
        }

        for agent in agents.iter_mut() {
            report.wall_contacts += resolve_walls(grid, projection, agent);
            if settle(grid, projection, agent) {
                report.settled += 1;
            }
        }

        trace!(
            agents = agents.len(),
            agent_contacts = report.agent_contacts,
            wall_contacts = report.wall_contacts,
            settled = report.settled,
            "collision pass complete"
        );
        report
    }
}

/// Pushes both agents apart by half the overlap each.
fn separate(first: &mut Agent, second: &mut Agent) -> bool {
    let combined = first.collider_radius() + second.collider_radius();
    let offset = second.position() - first.position();
    let distance = offset.length();
    if distance >= combined {
        return false;
    }

    let normal = if distance > 0.0 {
        offset / distance
    } else {
        COINCIDENT_AXIS
    };
    let push = normal * ((combined - distance) * 0.5);
    first.displace(-push);
    second.displace(push);
    true
}

fn resolve_walls(grid: &Grid, projection: &Projection, agent: &mut Agent) -> usize {
    let (low, high) = grid_span(projection, &agent.bounding_box());
    let mut contacts = 0;
    for row in low.row()..=high.row() {
        for column in low.column()..=high.column() {
            let cell = GridPosition::new(column, row);
            if !grid.is_wall(cell) {
                continue;
            }

            let tile = projection.tile_shape(cell);
            if !tile.bounds().intersects(&agent.bounding_box()) {
                continue;
            }
            if let Some(normal) = push_out_of(&tile, agent) {
                slide(agent, normal);
                contacts += 1;
            }
        }
    }
    contacts
}

/// Moves the agent so its circle no longer overlaps `tile` and returns the push direction.
fn push_out_of(tile: &TileShape, agent: &mut Agent) -> Option<Vec2> {
    let center = agent.position();
    let radius = agent.collider_radius();

    if !tile.contains(center) {
        let offset = center - tile.closest_point(center);
        let distance = offset.length();
        if distance >= radius || distance == 0.0 {
            return None;
        }
        let normal = offset / distance;
        agent.displace(normal * (radius - distance));
        return Some(normal);
    }

    let (normal, edge) = tile.nearest_edge(center);
    agent.set_position(edge + normal * radius);
    Some(normal)
}

/// Moves an agent whose center rounds onto a blocked cell just inside the nearest walkable tile.
///
/// Wall pushes are resolved one tile at a time, so leaving one wall can land
/// the center in a neighbouring one. Returns `false` when the agent already
/// stands on a walkable tile or no walkable tile is close enough.
fn settle(grid: &Grid, projection: &Projection, agent: &mut Agent) -> bool {
    let center = agent.position();
    let cell = projection.world_to_grid(center);
    if grid.is_walkable(cell) {
        return false;
    }

    let Some(target) = nearest_walkable_point(grid, projection, cell, center) else {
        debug!(agent = agent.id().get(), ?cell, "no walkable tile near agent");
        return false;
    };

    if let Some(normal) = (target - center).try_normalize() {
        slide(agent, normal);
    }
    agent.set_position(target);
    trace!(agent = agent.id().get(), ?cell, "agent settled off a blocked tile");
    true
}

/// Point just inside the walkable tile nearest to `point`, searching rings around `cell`.
fn nearest_walkable_point(
    grid: &Grid,
    projection: &Projection,
    cell: GridPosition,
    point: Vec2,
) -> Option<Vec2> {
    for ring in 1..=SETTLE_RINGS {
        let mut best: Option<(f32, Vec2)> = None;
        for row in -ring..=ring {
            for column in -ring..=ring {
                if column.abs() != ring && row.abs() != ring {
                    continue;
                }
                let candidate = cell.offset(column, row);
                if !grid.is_walkable(candidate) {
                    continue;
                }

                let tile = projection.tile_shape(candidate);
                let entry = tile.closest_point(point);
                let distance = entry.distance_squared(point);
                if best.map_or(true, |(closest, _)| distance < closest) {
                    best = Some((distance, entry.lerp(tile.center(), SETTLE_DEPTH)));
                }
            }
        }
        if let Some((_, target)) = best {
            return Some(target);
        }
    }
    None
}

/// Removes the part of the velocity that drives into the wall.
fn slide(agent: &mut Agent, normal: Vec2) {
    let velocity = agent.velocity();
    let into_wall = velocity.dot(normal);
    if into_wall < 0.0 {
        agent.set_velocity(velocity - normal * into_wall);
    }
}

/// Grid cells touched by the corners of `bounds`, widened by one cell on every side.
fn grid_span(projection: &Projection, bounds: &Aabb) -> (GridPosition, GridPosition) {
    let corners = bounds.corners().map(|corner| projection.world_to_grid(corner));
    let mut low = corners[0];
    let mut high = corners[0];
    for corner in &corners[1..] {
        low = GridPosition::new(low.column().min(corner.column()), low.row().min(corner.row()));
        high = GridPosition::new(
            high.column().max(corner.column()),
            high.row().max(corner.row()),
        );
    }
    (low.offset(-1, -1), high.offset(1, 1))
}

fn pair_mut(agents: &mut [Agent], first: usize, second: usize) -> (&mut Agent, &mut Agent) {
    if first < second {
        let (head, tail) = agents.split_at_mut(second);
        (&mut head[first], &mut tail[0])
    } else {
        let (head, tail) = agents.split_at_mut(first);
        (&mut tail[0], &mut head[second])
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilewalk_core::{AgentId, AgentKind};
    use tilewalk_system_movement::AgentConfig;

    fn agent(id: u32, position: Vec2) -> Agent {
        Agent::new(
            AgentId::new(id),
            AgentKind::Enemy,
            position,
            AgentConfig::default(),
        )
    }

    #[test]
    fn pair_mut_keeps_argument_order() {
        let mut agents = vec![agent(1, Vec2::ZERO), agent(2, Vec2::ONE), agent(3, Vec2::X)];
        let (first, second) = pair_mut(&mut agents, 2, 0);
        assert_eq!(first.id(), AgentId::new(3));
        assert_eq!(second.id(), AgentId::new(1));
    }

    #[test]
    fn settling_moves_a_center_off_a_wall_tile() {
        let projection = Projection::default();
        let grid = Grid::bordered(8, 8).expect("grid");
        let wall = GridPosition::new(1, 0);
        let mut stuck = agent(1, projection.grid_to_world(wall) + Vec2::new(-10.0, 2.5));
        stuck.set_velocity(Vec2::new(0.0, -40.0));

        assert!(settle(&grid, &projection, &mut stuck));
        assert!(grid.is_walkable(stuck.grid_position(&projection)));
        assert!(stuck.velocity().length() < 40.0);

        assert!(!settle(&grid, &projection, &mut stuck));
    }

    #[test]
    fn settling_gives_up_far_from_any_floor() {
        let projection = Projection::default();
        let grid = Grid::bordered(8, 8).expect("grid");
        let start = projection.grid_to_world(GridPosition::new(-5, -5));
        let mut lost = agent(1, start);

        assert!(!settle(&grid, &projection, &mut lost));
        assert_eq!(lost.position(), start);
    }

    #[test]
    fn sliding_keeps_tangential_velocity() {
        let mut moving = agent(1, Vec2::ZERO);
        moving.set_velocity(Vec2::new(50.0, 20.0));
        slide(&mut moving, Vec2::NEG_X);
        assert_eq!(moving.velocity(), Vec2::new(0.0, 20.0));

        moving.set_velocity(Vec2::new(-30.0, 5.0));
        slide(&mut moving, Vec2::NEG_X);
        assert_eq!(moving.velocity(), Vec2::new(-30.0, 5.0));
    }

    #[test]
    fn grid_span_is_widened_by_one_cell() {
        let projection = Projection::TopDown {
            tile_width: 32.0,
            tile_height: 32.0,
        };
        let bounds = Aabb::from_center_size(Vec2::new(64.0, 64.0), Vec2::splat(20.0));
        assert_eq!(
            grid_span(&projection, &bounds),
            (GridPosition::new(1, 1), GridPosition::new(3, 3))
        );
    }
}
