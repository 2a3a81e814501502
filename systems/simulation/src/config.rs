//! Serializable description of a simulation run.

use glam::Vec2;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tilewalk_core::{GridPosition, Projection};
use tilewalk_system_behaviour::EnemyBehaviour;
use tilewalk_system_collision::IndexError;
use tilewalk_system_movement::AgentConfig;
use tilewalk_world::GridError;

/// Reasons a configuration cannot be turned into a simulation.
#[derive(Debug, Error, PartialEq)]
pub enum ConfigError {
    /// Tiles must have a positive, finite size.
    #[error("tile size must be positive, got {width}x{height}")]
    InvalidTileSize {
        /// Configured tile width.
        width: f32,
        /// Configured tile height.
        height: f32,
    },
    /// Spatial hash buckets must have a positive, finite size.
    #[error("spatial cell size must be positive, got {0}")]
    InvalidCellSize(f32),
    /// An agent archetype needs a positive radius, size and speed.
    #[error("agent spawn #{index} needs a positive radius, size and speed")]
    InvalidAgent {
        /// Position of the spawn in agent order, the player being zero.
        index: usize,
    },
    /// Behaviour distances must be non-negative.
    #[error("attack range, chase range and wander radius must be non-negative")]
    InvalidRange,
    /// A spawn cell is outside the grid or not walkable.
    #[error("agent spawn #{index} at {cell:?} is not on a walkable cell")]
    BlockedSpawn {
        /// Position of the spawn in agent order, the player being zero.
        index: usize,
        /// Offending cell.
        cell: GridPosition,
    },
    /// The grid could not be built.
    #[error(transparent)]
    Grid(#[from] GridError),
    /// The spatial index could not be built.
    #[error(transparent)]
    Index(#[from] IndexError),
}

/// Placement and physical parameters of a single agent.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentSpawn {
    /// Cell the agent starts on.
    pub cell: GridPosition,
    /// Radius of the collision circle in world units.
    pub radius: f32,
    /// Bounding box size in world units.
    pub size: Vec2,
    /// Walking speed in world units per second.
    pub speed: f32,
}

impl AgentSpawn {
    /// Spawn on `cell` with the default physical parameters.
    #[must_use]
    pub fn at(cell: GridPosition) -> Self {
        Self {
            cell,
            ..Self::default()
        }
    }

    /// Physical parameters handed to the spawned agent.
    #[must_use]
    pub const fn agent_config(&self) -> AgentConfig {
        AgentConfig::new(self.radius, self.size, self.speed)
    }

    fn is_valid(&self) -> bool {
        positive(self.radius) && positive(self.size.x) && positive(self.size.y) && positive(self.speed)
    }
}

impl Default for AgentSpawn {
    fn default() -> Self {
        let defaults = AgentConfig::default();
        Self {
            cell: GridPosition::new(1, 1),
            radius: defaults.collider_radius(),
            size: defaults.size(),
            speed: defaults.speed(),
        }
    }
}

/// Everything needed to build a [`crate::Simulation`].
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Number of grid columns, border included.
    pub width: u32,
    /// Number of grid rows, border included.
    pub height: u32,
    /// Interior wall pillars scattered at start.
    pub pillar_count: usize,
    /// Seed for pillar placement and enemy wandering.
    pub seed: u64,
    /// Grid to world transform.
    pub projection: Projection,
    /// Edge length of a spatial hash bucket in world units.
    pub spatial_cell_size: f32,
    /// Player placement.
    pub player: AgentSpawn,
    /// Enemy placements in agent order.
    pub enemies: Vec<AgentSpawn>,
    /// Distance in world units at which enemies attack.
    pub attack_range: f32,
    /// Distance in world units at which enemies start chasing.
    pub chase_range: f32,
    /// Maximum per-axis distance in cells of a wander target.
    pub wander_radius: i32,
    /// Random cells tried per tick while looking for a wander target.
    pub wander_attempts: u32,
}

impl SimulationConfig {
    /// Checks every value that does not depend on the generated grid.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let tile = self.projection.tile_size();
        if !positive(tile.x) || !positive(tile.y) {
            return Err(ConfigError::InvalidTileSize {
                width: tile.x,
                height: tile.y,
            });
        }
        if !positive(self.spatial_cell_size) {
            return Err(ConfigError::InvalidCellSize(self.spatial_cell_size));
        }
        if let Some(index) = self.spawns().position(|spawn| !spawn.is_valid()) {
            return Err(ConfigError::InvalidAgent { index });
        }
        if !(self.attack_range >= 0.0) || !(self.chase_range >= 0.0) || self.wander_radius < 0 {
            return Err(ConfigError::InvalidRange);
        }
        Ok(())
    }

    /// Enemy behaviour tuning derived from the configured ranges.
    #[must_use]
    pub const fn enemy_behaviour(&self) -> EnemyBehaviour {
        EnemyBehaviour::new(
            self.attack_range,
            self.chase_range,
            self.wander_radius,
            self.wander_attempts,
        )
    }

    /// Player spawn followed by every enemy spawn.
    pub fn spawns(&self) -> impl Iterator<Item = &AgentSpawn> + '_ {
        std::iter::once(&self.player).chain(self.enemies.iter())
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        Self {
            width: 20,
            height: 20,
            pillar_count: 0,
            seed: 0x7469_6c65,
            projection: Projection::default(),
            spatial_cell_size: 64.0,
            player: AgentSpawn::at(GridPosition::new(1, 1)),
            enemies: vec![
                AgentSpawn::at(GridPosition::new(18, 18)),
                AgentSpawn::at(GridPosition::new(18, 1)),
            ],
            attack_range: 24.0,
            chase_range: 150.0,
            wander_radius: 5,
            wander_attempts: 10,
        }
    }
}

fn positive(value: f32) -> bool {
    value.is_finite() && value > 0.0
}
