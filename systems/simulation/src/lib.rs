#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Authoritative Tilewalk simulation state and its tick orchestration.
//!
//! Adapters build a [`Simulation`] from a [`SimulationConfig`], submit
//! [`Command`] values through [`apply`], and read state back through the
//! [`query`] module. A tick evaluates every enemy's behaviour tree, walks
//! every agent along its path, and then lets the collision resolver correct
//! overlaps, always in agent order.

mod config;

use tilewalk_core::{AgentId, AgentKind, Command, Event, Projection, WELCOME_BANNER};
use tilewalk_system_behaviour::{BehaviourTree, Brain};
use tilewalk_system_collision::{CollisionReport, CollisionResolver};
use tilewalk_system_movement::{Agent, Movement};
use tilewalk_world::Grid;
use tracing::{debug, info};

pub use config::{AgentSpawn, ConfigError, SimulationConfig};

/// Identifier given to the player agent; enemies are numbered from one.
pub const PLAYER_ID: AgentId = AgentId::new(0);

/// Represents the authoritative simulation state.
#[derive(Debug)]
pub struct Simulation {
    banner: &'static str,
    grid: Grid,
    projection: Projection,
    agents: Vec<Agent>,
    brains: Vec<Brain>,
    movement: Movement,
    collision: CollisionResolver,
    last_collision: CollisionReport,
    tick_index: u64,
}

impl Simulation {
    /// Builds the grid and spawns the player followed by every enemy.
    pub fn new(config: &SimulationConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let grid = Grid::with_pillars(config.width, config.height, config.pillar_count, config.seed)?;
        let collision = CollisionResolver::new(config.spatial_cell_size)?;

        let mut agents = Vec::with_capacity(config.enemies.len() + 1);
        for (index, spawn) in config.spawns().enumerate() {
            if !grid.is_walkable(spawn.cell) {
                return Err(ConfigError::BlockedSpawn {
                    index,
                    cell: spawn.cell,
                });
            }

            let kind = if index == 0 {
                AgentKind::Player
            } else {
                AgentKind::Enemy
            };
            let id = AgentId::new(index as u32);
            agents.push(Agent::spawn_at(
                id,
                kind,
                spawn.cell,
                &config.projection,
                spawn.agent_config(),
            ));
        }

        let tree = BehaviourTree::enemy(config.enemy_behaviour());
        let brains = agents
            .iter()
            .skip(1)
            .map(|enemy| Brain::new(tree.clone(), config.seed ^ u64::from(enemy.id().get())))
            .collect();

        info!(
            width = grid.width(),
            height = grid.height(),
            enemies = config.enemies.len(),
            "simulation ready"
        );

        Ok(Self {
            banner: WELCOME_BANNER,
            grid,
            projection: config.projection,
            agents,
            brains,
            movement: Movement,
            collision,
            last_collision: CollisionReport::default(),
            tick_index: 0,
        })
    }
}

/// Applies the provided command to the simulation, mutating state deterministically.
pub fn apply(simulation: &mut Simulation, command: Command, out_events: &mut Vec<Event>) {
    match command {
        Command::Tick { dt } => {
            simulation.tick_index = simulation.tick_index.saturating_add(1);
            out_events.push(Event::TimeAdvanced { dt });

            if let Some((player, enemies)) = simulation.agents.split_first_mut() {
                for (enemy, brain) in enemies.iter_mut().zip(simulation.brains.iter_mut()) {
                    let _ = brain.think(
                        enemy,
                        player,
                        &simulation.grid,
                        &simulation.projection,
                        out_events,
                    );
                }
            }

            simulation.movement.handle(
                &mut simulation.agents,
                dt,
                &simulation.projection,
                out_events,
            );
            simulation.last_collision = simulation.collision.detect_and_resolve(
                &simulation.grid,
                &simulation.projection,
                &mut simulation.agents,
            );
        }
        Command::MovePlayer { goal } => {
            let Some(player) = simulation.agents.first_mut() else {
                return;
            };
            let agent = player.id();
            let start = player.grid_position(&simulation.projection);
            if player.set_path(&simulation.grid, start, goal) {
                out_events.push(Event::PathAssigned {
                    agent,
                    goal,
                    waypoints: player.path().len(),
                });
            } else {
                debug!(?start, ?goal, "player move rejected");
                out_events.push(Event::PathNotFound { agent, goal });
            }
        }
    }
}

/// Query functions that provide read-only access to the simulation state.
pub mod query {
    use super::{CollisionReport, Simulation};
    use tilewalk_core::{AgentId, GridPosition, Projection};
    use tilewalk_system_movement::Agent;
    use tilewalk_world::Grid;

    /// Retrieves the welcome banner that adapters may display.
    #[must_use]
    pub fn welcome_banner(simulation: &Simulation) -> &'static str {
        simulation.banner
    }

    /// Provides read-only access to the grid.
    #[must_use]
    pub fn grid(simulation: &Simulation) -> &Grid {
        &simulation.grid
    }

    /// Grid to world transform used by the simulation.
    #[must_use]
    pub fn projection(simulation: &Simulation) -> Projection {
        simulation.projection
    }

    /// Every agent in deterministic order, the player first.
    #[must_use]
    pub fn agents(simulation: &Simulation) -> &[Agent] {
        &simulation.agents
    }

    /// The player agent.
    #[must_use]
    pub fn player(simulation: &Simulation) -> Option<&Agent> {
        simulation.agents.first()
    }

    /// Looks up an agent by identifier.
    #[must_use]
    pub fn agent(simulation: &Simulation, id: AgentId) -> Option<&Agent> {
        simulation.agents.iter().find(|agent| agent.id() == id)
    }

    /// Cell the agent with `id` currently stands on.
    #[must_use]
    pub fn agent_cell(simulation: &Simulation, id: AgentId) -> Option<GridPosition> {
        agent(simulation, id).map(|agent| agent.grid_position(&simulation.projection))
    }

    /// Number of ticks processed so far.
    #[must_use]
    pub fn tick_index(simulation: &Simulation) -> u64 {
        simulation.tick_index
    }

    /// Corrections applied by the most recent collision pass.
    #[must_use]
    pub fn last_collision(simulation: &Simulation) -> CollisionReport {
        simulation.last_collision
    }
}
