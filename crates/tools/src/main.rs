use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result, bail};
use arena_core::search::next_direction;
use arena_core::{AgentId, ArenaConfig, GoalMode, GridCoord, Planner, World};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{Level, info};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(author, version, about = "Answers planner queries against a world snapshot", long_about = None)]
struct Args {
    /// Path to the world snapshot JSON file
    #[arg(short, long)]
    world: PathBuf,
    /// Agent the queries are asked for
    #[arg(short, long, default_value_t = 1)]
    agent: u64,
    /// Optional TOML file overriding arena constants
    #[arg(short, long)]
    config: Option<PathBuf>,
    #[command(subcommand)]
    query: Query,
}

#[derive(Subcommand)]
enum Query {
    /// Path from the agent to a cell
    Path {
        col: i32,
        row: i32,
        #[arg(long, value_enum, default_value_t = ModeArg::CellExact)]
        mode: ModeArg,
    },
    /// Hazard countdown under the agent's footprint
    Threat,
    /// Nearest hazard-free, non-dead-corner cell
    Safe,
    /// Ranked explosive placements with their escape cells
    Place,
    /// Cheapest obstacle-crossing route to a cell
    Breach { col: i32, row: i32 },
    /// Cells from which the agent's blast destroys an obstacle
    Clear { col: i32, row: i32 },
    /// Attack positions and trap cell against an opponent
    Attack { opponent: u64 },
    /// Nearest reachable item marker
    Item,
}

#[derive(Clone, Copy, ValueEnum)]
enum ModeArg {
    CellExact,
    Footprint,
}

impl From<ModeArg> for GoalMode {
    fn from(mode: ModeArg) -> Self {
        match mode {
            ModeArg::CellExact => GoalMode::CellExact,
            ModeArg::Footprint => GoalMode::FootprintProximity,
        }
    }
}

#[derive(Serialize)]
struct AttackReport {
    positions: Vec<(GridCoord, u32)>,
    trap: Option<GridCoord>,
}

fn load_world(path: &Path) -> Result<World> {
    let data = fs::read_to_string(path)
        .with_context(|| format!("Failed to read world file: {}", path.display()))?;
    serde_json::from_str(&data).with_context(|| "Failed to deserialize world JSON")
}

fn load_config(path: Option<&Path>) -> Result<ArenaConfig> {
    match path {
        Some(path) => ArenaConfig::load(path)
            .with_context(|| format!("Failed to load config: {}", path.display())),
        None => Ok(ArenaConfig::default()),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value).context("Failed to encode answer")?);
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    let world = load_world(&args.world)?;
    let config = load_config(args.config.as_deref())?;
    let agent = AgentId(args.agent);
    if world.agent(agent).is_none() {
        bail!("agent {} is not in the snapshot", args.agent);
    }

    let mut planner = Planner::new(config);
    planner.sync_hazards(&world);
    info!(
        explosives = planner.hazards().explosive_count(),
        now_ms = world.now_ms,
        "snapshot loaded"
    );

    match args.query {
        Query::Path { col, row, mode } => {
            let path = planner.find_path(&world, agent, GridCoord::new(col, row), mode.into());
            if let Some(direction) = path.as_deref().and_then(next_direction) {
                info!(?direction, "first move");
            }
            print_json(&path)
        }
        Query::Threat => {
            let position = world.agent(agent).map(|a| a.position);
            let threat = position.and_then(|position| planner.threat_at(position, world.now_ms));
            print_json(&threat)
        }
        Query::Safe => print_json(&planner.find_safe_tile(&world, agent)),
        Query::Place => print_json(&planner.score_placements(&world, agent)),
        Query::Breach { col, row } => {
            print_json(&planner.plan_breach(&world, agent, GridCoord::new(col, row)))
        }
        Query::Clear { col, row } => {
            print_json(&planner.clearing_positions(&world, agent, GridCoord::new(col, row)))
        }
        Query::Attack { opponent } => {
            let opponent = AgentId(opponent);
            print_json(&AttackReport {
                positions: planner.attack_positions(&world, agent, opponent),
                trap: planner.trap_cell(&world, opponent),
            })
        }
        Query::Item => print_json(&planner.nearest_item(&world, agent)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn loads_world_and_config_from_disk() {
        let dir = tempdir().expect("tempdir");
        let world_path = dir.path().join("world.json");
        let config_path = dir.path().join("arena.toml");
        fs::write(
            &world_path,
            r#"{"grid": ["..", ".C"], "agents": [{"id": 1, "position": {"x": 0.0, "y": 0.0}, "speed": 1, "blast_range": 2, "bomb_allowance": 1}]}"#,
        )
        .expect("write world");
        fs::write(&config_path, "escape_depth = 3\n").expect("write config");

        let world = load_world(&world_path).expect("world loads");
        assert_eq!(world.grid.height(), 2);
        assert!(world.agent(AgentId(1)).is_some());

        let config = load_config(Some(&config_path)).expect("config loads");
        assert_eq!(config.escape_depth, 3);
        assert_eq!(load_config(None).expect("defaults"), ArenaConfig::default());
    }

    #[test]
    fn malformed_world_reports_context() {
        let dir = tempdir().expect("tempdir");
        let path = dir.path().join("broken.json");
        fs::write(&path, r#"{"grid": ["..", "."]}"#).expect("write world");

        let err = load_world(&path).expect_err("ragged grid must be rejected");
        assert!(err.to_string().contains("deserialize world"));
    }
}
