//! Shared test fixtures for the unit test suites.
//! This module exists to avoid repeating layout and agent setup across many tests.
//! It does not own production planning logic.

use crate::config::ArenaConfig;
use crate::grid::{Grid, to_world_pos};
use crate::types::{AgentId, ExplosiveId, GridCoord};
use crate::world::{Agent, Explosive, World};

pub(crate) fn grid(rows: &[&str]) -> Grid {
    Grid::from_rows(rows).expect("fixture layout must be valid")
}

/// Agent standing exactly on `cell`, speed 1, one bomb.
pub(crate) fn agent_at(id: u64, cell: GridCoord, blast_range: u8) -> Agent {
    Agent {
        id: AgentId(id),
        position: to_world_pos(&ArenaConfig::default(), cell),
        speed: 1,
        blast_range,
        bomb_allowance: 1,
    }
}

pub(crate) fn explosive_at(id: u64, owner: u64, cell: GridCoord, detonates_at_ms: u64) -> Explosive {
    Explosive { id: ExplosiveId(id), owner: AgentId(owner), cell, detonates_at_ms }
}

pub(crate) fn world_with(rows: &[&str], agents: Vec<Agent>) -> World {
    let mut world = World::new(grid(rows));
    world.agents = agents;
    world
}

/// Open 5x5 board with one agent at the top-left corner.
pub(crate) fn open_board_fixture() -> (World, AgentId) {
    let world = world_with(
        &[".....", ".....", ".....", ".....", "....."],
        vec![agent_at(1, GridCoord::new(0, 0), 2)],
    );
    (world, AgentId(1))
}
