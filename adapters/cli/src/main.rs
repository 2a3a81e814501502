#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Headless command-line runner for the Tilewalk simulation.

use std::{collections::VecDeque, fs, path::PathBuf, time::Duration};

use anyhow::{Context, Result};
use clap::Parser;
use tilewalk_core::{Command, Event, GridPosition};
use tilewalk_simulation::{apply, query, Simulation, SimulationConfig};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// Runs a Tilewalk simulation without a window and prints what happened.
#[derive(Parser, Debug)]
#[command(name = "tilewalk", version, long_about = None)]
struct Args {
    /// TOML file describing the grid, projection and agents
    #[arg(long)]
    config: Option<PathBuf>,

    /// Number of ticks to simulate
    #[arg(long, default_value_t = 600)]
    ticks: u32,

    /// Overrides the seed from the configuration
    #[arg(long)]
    seed: Option<u64>,

    /// Length of a tick in milliseconds
    #[arg(long, default_value_t = 16)]
    dt_ms: u64,

    /// Player destination as `column,row`; repeat to queue several
    #[arg(long = "move", value_parser = parse_cell)]
    moves: Vec<GridPosition>,
}

fn main() -> Result<()> {
    init_tracing();
    let args = Args::parse();

    let mut config = load_config(args.config.as_ref())?;
    if let Some(seed) = args.seed {
        config.seed = seed;
    }

    let mut simulation = Simulation::new(&config).context("failed to build simulation")?;
    println!("{}", query::welcome_banner(&simulation));

    let dt = Duration::from_millis(args.dt_ms);
    let mut moves: VecDeque<GridPosition> = args.moves.into_iter().collect();
    let mut tally = EventTally::default();
    let mut events = Vec::new();

    for _ in 0..args.ticks {
        let player_idle = query::player(&simulation).is_some_and(|player| !player.has_path());
        if player_idle {
            if let Some(goal) = moves.pop_front() {
                apply(&mut simulation, Command::MovePlayer { goal }, &mut events);
            }
        }

        apply(&mut simulation, Command::Tick { dt }, &mut events);
        tally.record(&events);
        events.clear();
    }

    info!(ticks = query::tick_index(&simulation), "run finished");
    print!("{}", summary(&simulation, &tally));
    Ok(())
}

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

fn load_config(path: Option<&PathBuf>) -> Result<SimulationConfig> {
    let Some(path) = path else {
        return Ok(SimulationConfig::default());
    };

    let contents = fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    toml::from_str(&contents)
        .with_context(|| format!("failed to parse config file {}", path.display()))
}

/// Parses a `column,row` pair.
fn parse_cell(value: &str) -> Result<GridPosition, String> {
    let (column, row) = value
        .split_once(',')
        .ok_or_else(|| format!("expected `column,row`, got `{value}`"))?;
    let column = column.trim().parse::<i32>().map_err(|e| e.to_string())?;
    let row = row.trim().parse::<i32>().map_err(|e| e.to_string())?;
    Ok(GridPosition::new(column, row))
}

/// Running count of every event kind observed during a run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
struct EventTally {
    ticks: u64,
    paths_assigned: u64,
    paths_not_found: u64,
    waypoints_reached: u64,
    attacks: u64,
}

impl EventTally {
    fn record(&mut self, events: &[Event]) {
        for event in events {
            match event {
                Event::TimeAdvanced { .. } => self.ticks += 1,
                Event::PathAssigned { .. } => self.paths_assigned += 1,
                Event::PathNotFound { .. } => self.paths_not_found += 1,
                Event::WaypointReached { .. } => self.waypoints_reached += 1,
                Event::AgentAttacked { .. } => self.attacks += 1,
            }
        }
    }
}

fn summary(simulation: &Simulation, tally: &EventTally) -> String {
    let mut text = format!(
        "ticks: {}\npaths assigned: {}\npaths not found: {}\nwaypoints reached: {}\nattacks: {}\n",
        tally.ticks,
        tally.paths_assigned,
        tally.paths_not_found,
        tally.waypoints_reached,
        tally.attacks,
    );
    let projection = query::projection(simulation);
    for agent in query::agents(simulation) {
        let cell = agent.grid_position(&projection);
        let position = agent.position();
        text.push_str(&format!(
            "agent {} {:?} at ({:.1}, {:.1}) cell ({}, {})\n",
            agent.id().get(),
            agent.kind(),
            position.x,
            position.y,
            cell.column(),
            cell.row(),
        ));
    }
    text
}
