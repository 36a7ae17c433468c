use std::io;

use anyhow::{Result, ensure};
use arena_core::{
    Agent, AgentId, ArenaConfig, Explosive, ExplosiveId, GoalMode, Grid, GridCoord, HazardCell,
    HazardMap, Planner, TileKind, World, blast_range_for, blast_zone, destroyed_by,
    destruction_score, to_grid_coord, to_world_pos,
};
use clap::Parser;
use rand_chacha::{
    ChaCha8Rng,
    rand_core::{Rng, SeedableRng},
};
use tracing::{Level, debug, info};
use tracing_subscriber::EnvFilter;

const FUSE_MS: u64 = 3000;
const TICK_MS: u64 = 100;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value_t = 42)]
    seed: u64,
    #[arg(short, long, default_value_t = 1000)]
    ticks: u32,
    #[arg(long, default_value_t = 13)]
    width: usize,
    #[arg(long, default_value_t = 11)]
    height: usize,
}

fn roll(rng: &mut ChaCha8Rng, below: u64) -> u64 {
    rng.next_u64() % below
}

/// Pillared arena with scattered obstacles. Spawn corners are kept open.
fn generate_arena(rng: &mut ChaCha8Rng, width: usize, height: usize) -> Grid {
    let mut grid = Grid::new(width, height);
    for (cell, _) in Grid::new(width, height).cells() {
        let pillar = cell.col % 2 == 1 && cell.row % 2 == 1;
        let tile = if pillar {
            TileKind::Wall
        } else if roll(rng, 100) < 45 {
            TileKind::Obstacle
        } else {
            TileKind::Empty
        };
        grid.set_tile(cell, tile);
    }
    let (w, h) = (width as i32, height as i32);
    for corner in [(0, 0), (w - 1, 0), (0, h - 1), (w - 1, h - 1)] {
        for (dc, dr) in [(0, 0), (1, 0), (-1, 0), (0, 1), (0, -1)] {
            grid.set_tile(GridCoord::new(corner.0 + dc, corner.1 + dr), TileKind::Empty);
        }
    }
    grid
}

fn obstacle_count(grid: &Grid) -> usize {
    grid.cells().filter(|(_, tile)| *tile == TileKind::Obstacle).count()
}

fn same_hazards(left: &HazardMap, right: &HazardMap) -> bool {
    let mut a: Vec<_> = left.hazard_cells().collect();
    let mut b: Vec<_> = right.hazard_cells().collect();
    let key = |h: &HazardCell| (h.cell, h.explosive);
    a.sort_by_key(key);
    b.sort_by_key(key);
    a == b
}

fn check_invariants(planner: &mut Planner, world: &World, config: &ArenaConfig) -> Result<()> {
    let rebuilt = HazardMap::from_world(world, config.default_blast_range);
    ensure!(same_hazards(planner.hazards(), &rebuilt), "incremental hazards diverged from rebuild");

    for agent in &world.agents {
        if let Some(tile) = planner.find_safe_tile(world, agent.id) {
            ensure!(
                !planner.hazards().is_threatened(tile),
                "safe tile {tile:?} for agent {} is threatened",
                agent.id.0
            );
        }
        let candidates = planner.score_placements(world, agent.id);
        for candidate in &candidates {
            ensure!(
                candidate.score == destruction_score(&world.grid, candidate.cell, agent.blast_range),
                "memoized score diverged at {:?}",
                candidate.cell
            );
            let blast = blast_zone(&world.grid, candidate.cell, agent.blast_range);
            ensure!(
                !blast.contains(&candidate.escape)
                    && !planner.hazards().is_threatened(candidate.escape),
                "escape {:?} of placement {:?} is not safe",
                candidate.escape,
                candidate.cell
            );
        }
    }
    Ok(())
}

/// One step of a simple survival policy: flee when threatened, otherwise
/// head for the best placement and drop an explosive on arrival.
fn act(
    planner: &mut Planner,
    world: &mut World,
    agent_id: AgentId,
    next_explosive: &mut u64,
) -> Option<()> {
    let agent = world.agent(agent_id)?.clone();
    let cell = to_grid_coord(planner.config(), agent.position);
    let threatened = planner.hazards().is_threatened(cell);

    let target = if threatened {
        planner.find_safe_tile(world, agent_id)?
    } else {
        let best = planner.score_placements(world, agent_id).into_iter().next()?;
        let owned = world.explosives.iter().filter(|e| e.owner == agent_id).count();
        if best.cell == cell && owned < usize::from(agent.bomb_allowance) {
            let explosive = Explosive {
                id: ExplosiveId(*next_explosive),
                owner: agent_id,
                cell,
                detonates_at_ms: world.now_ms + FUSE_MS,
            };
            *next_explosive += 1;
            world.explosives.push(explosive);
            planner.explosive_placed(world, &explosive);
            return Some(());
        }
        best.cell
    };

    let path = planner.find_path(world, agent_id, target, GoalMode::CellExact)?;
    let step = *path.get(1)?;
    let position = to_world_pos(planner.config(), step);
    world.upsert_agent(Agent { position, ..agent });
    Some(())
}

/// Detonates every due explosive, then lets the planner extend the pending
/// crosses that the destroyed obstacles used to shield.
fn detonate_due(planner: &mut Planner, world: &mut World) -> usize {
    let due: Vec<Explosive> =
        world.explosives.iter().filter(|e| e.detonates_at_ms <= world.now_ms).copied().collect();
    let mut cleared = Vec::new();
    for explosive in &due {
        let range = blast_range_for(world, explosive, planner.config().default_blast_range);
        let reached = destroyed_by(&world.grid, explosive.cell, range);
        let destroyed = world.apply_detonation(explosive.id, &reached);
        planner.explosive_detonated(explosive.id);
        debug!(explosive = explosive.id.0, destroyed = destroyed.len(), "detonated");
        cleared.extend(destroyed);
    }
    planner.obstacles_destroyed(world, &cleared);
    due.len()
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive(Level::INFO.into()))
        .with_writer(io::stderr)
        .init();

    let args = Args::parse();
    ensure!(args.width >= 3 && args.height >= 3, "arena must be at least 3x3");

    info!(seed = args.seed, ticks = args.ticks, "starting planner fuzz harness");
    let config = ArenaConfig::default();
    let mut rng = ChaCha8Rng::seed_from_u64(args.seed);
    let mut world = World::new(generate_arena(&mut rng, args.width, args.height));
    let (w, h) = (args.width as i32 - 1, args.height as i32 - 1);
    for (id, (col, row)) in [(0, 0), (w, h), (w, 0), (0, h)].into_iter().enumerate() {
        world.upsert_agent(Agent {
            id: AgentId(id as u64 + 1),
            position: to_world_pos(&config, GridCoord::new(col, row)),
            speed: 1,
            blast_range: 1 + roll(&mut rng, 3) as u8,
            bomb_allowance: 1,
        });
    }

    let mut planner = Planner::new(config.clone());
    planner.sync_hazards(&world);
    let mut next_explosive = 1;
    let mut obstacles = obstacle_count(&world.grid);
    let mut detonations = 0;

    for tick in 0..args.ticks {
        world.now_ms = u64::from(tick) * TICK_MS;
        detonations += detonate_due(&mut planner, &mut world);

        let remaining = obstacle_count(&world.grid);
        ensure!(remaining <= obstacles, "obstacles reappeared at tick {tick}");
        obstacles = remaining;

        let ids: Vec<AgentId> = world.agents.iter().map(|a| a.id).collect();
        for id in ids {
            act(&mut planner, &mut world, id, &mut next_explosive);
        }
        check_invariants(&mut planner, &world, &config)?;

        if obstacles == 0 && world.explosives.is_empty() {
            info!(tick, "arena cleared");
            break;
        }
    }

    info!(detonations, obstacles_left = obstacles, "fuzzing completed successfully");
    Ok(())
}
