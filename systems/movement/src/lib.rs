#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Agents and the deterministic movement system that walks them along their paths.

use std::{collections::VecDeque, time::Duration};

use glam::Vec2;
use tilewalk_core::{Aabb, AgentId, AgentKind, Event, GridPosition, Projection};
use tilewalk_system_pathfinding::find_path;
use tilewalk_world::Grid;
use tracing::debug;

/// Distance in world units under which an agent snaps onto its next waypoint.
pub const ARRIVAL_RADIUS: f32 = 2.0;

/// Physical parameters shared by every agent of a given archetype.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentConfig {
    collider_radius: f32,
    size: Vec2,
    speed: f32,
}

impl AgentConfig {
    /// Creates a new configuration from a collider radius, bounding box size and walking speed.
    #[must_use]
    pub const fn new(collider_radius: f32, size: Vec2, speed: f32) -> Self {
        Self {
            collider_radius,
            size,
            speed,
        }
    }

    /// Radius of the circle used for collision.
    #[must_use]
    pub const fn collider_radius(&self) -> f32 {
        self.collider_radius
    }

    /// Size of the axis-aligned box used for broad-phase queries.
    #[must_use]
    pub const fn size(&self) -> Vec2 {
        self.size
    }

    /// Walking speed in world units per second.
    #[must_use]
    pub const fn speed(&self) -> f32 {
        self.speed
    }
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self::new(10.0, Vec2::new(20.0, 20.0), 100.0)
    }
}

/// Circular agent moving through world space.
///
/// The bounding box is derived from the position and is refreshed every time
/// the position changes. The path is owned by the agent, excludes the cell
/// the agent started from, and is consumed front to back.
#[derive(Clone, Debug, PartialEq)]
pub struct Agent {
    id: AgentId,
    kind: AgentKind,
    position: Vec2,
    velocity: Vec2,
    config: AgentConfig,
    bounding_box: Aabb,
    path: VecDeque<GridPosition>,
}

impl Agent {
    /// Creates an agent at the provided world position.
    #[must_use]
    pub fn new(id: AgentId, kind: AgentKind, position: Vec2, config: AgentConfig) -> Self {
        Self {
            id,
            kind,
            position,
            velocity: Vec2::ZERO,
            config,
            bounding_box: Aabb::from_center_size(position, config.size()),
            path: VecDeque::new(),
        }
    }

    /// Creates an agent standing on the center of `cell`.
    #[must_use]
    pub fn spawn_at(
        id: AgentId,
        kind: AgentKind,
        cell: GridPosition,
        projection: &Projection,
        config: AgentConfig,
    ) -> Self {
        Self::new(id, kind, projection.grid_to_world(cell), config)
    }

    /// Identifier assigned to the agent.
    #[must_use]
    pub const fn id(&self) -> AgentId {
        self.id
    }

    /// Who steers the agent.
    #[must_use]
    pub const fn kind(&self) -> AgentKind {
        self.kind
    }

    /// Current world position of the agent's center.
    #[must_use]
    pub const fn position(&self) -> Vec2 {
        self.position
    }

    /// Velocity applied during the last movement step.
    #[must_use]
    pub const fn velocity(&self) -> Vec2 {
        self.velocity
    }

    /// Radius of the agent's collision circle.
    #[must_use]
    pub const fn collider_radius(&self) -> f32 {
        self.config.collider_radius()
    }

    /// Box around the agent derived from its position and size.
    #[must_use]
    pub const fn bounding_box(&self) -> Aabb {
        self.bounding_box
    }

    /// Remaining waypoints, next one first.
    #[must_use]
    pub fn path(&self) -> &VecDeque<GridPosition> {
        &self.path
    }

    /// Reports whether the agent still has waypoints to walk.
    #[must_use]
    pub fn has_path(&self) -> bool {
        !self.path.is_empty()
    }

    /// Cell the agent currently stands on.
    #[must_use]
    pub fn grid_position(&self, projection: &Projection) -> GridPosition {
        projection.world_to_grid(self.position)
    }

    /// Moves the agent to `position`.
    pub fn set_position(&mut self, position: Vec2) {
        self.position = position;
        self.update_bounding_box();
    }

    /// Shifts the agent by `delta`.
    pub fn displace(&mut self, delta: Vec2) {
        self.set_position(self.position + delta);
    }

    /// Overrides the agent's velocity.
    pub fn set_velocity(&mut self, velocity: Vec2) {
        self.velocity = velocity;
    }

    /// Replaces the agent's path with a freshly planned one.
    ///
    /// On success the start cell is dropped from the planned path and `true`
    /// is returned. When no path exists the current path is cleared and
    /// `false` is returned, leaving the agent standing still.
    pub fn set_path(&mut self, grid: &Grid, start: GridPosition, goal: GridPosition) -> bool {
        self.path.clear();
        let Some(planned) = find_path(grid, start, goal) else {
            debug!(agent = self.id.get(), ?start, ?goal, "no path available");
            return false;
        };

        self.path.extend(planned.into_iter().skip(1));
        true
    }

    /// Advances the agent towards its next waypoint.
    ///
    /// The agent never overshoots its waypoint: once it is within
    /// [`ARRIVAL_RADIUS`] it snaps onto the waypoint's world position, removes
    /// it from the path and returns it. At most one waypoint is consumed per
    /// call. Without a path the velocity drops to zero.
    pub fn follow_path(&mut self, dt: Duration, projection: &Projection) -> Option<GridPosition> {
        let Some(&next) = self.path.front() else {
            self.velocity = Vec2::ZERO;
            return None;
        };

        let target = projection.grid_to_world(next);
        let offset = target - self.position;
        let distance = offset.length();
        if distance > 1.0 {
            let direction = offset / distance;
            self.velocity = direction * self.config.speed();
            let step = (self.config.speed() * dt.as_secs_f32()).min(distance);
            self.set_position(self.position + direction * step);
        }

        if self.position.distance(target) < ARRIVAL_RADIUS {
            self.set_position(target);
            let _ = self.path.pop_front();
            if self.path.is_empty() {
                self.velocity = Vec2::ZERO;
            }
            return Some(next);
        }

        None
    }

    /// Recomputes the bounding box from the current position.
    pub fn update_bounding_box(&mut self) {
        self.bounding_box = Aabb::from_center_size(self.position, self.config.size());
    }
}

/// Pure system that integrates every agent along its path for one tick.
#[derive(Debug, Default)]
pub struct Movement;

impl Movement {
    /// Advances all agents in list order and reports consumed waypoints.
    pub fn handle(
        &mut self,
        agents: &mut [Agent],
        dt: Duration,
        projection: &Projection,
        out: &mut Vec<Event>,
    ) {
        for agent in agents.iter_mut() {
            if let Some(cell) = agent.follow_path(dt, projection) {
                out.push(Event::WaypointReached {
                    agent: agent.id(),
                    cell,
                });
            }
        }
    }
}
