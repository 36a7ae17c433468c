//! Per-match query facade for one controlling policy loop.
//! This module exists to keep the incrementally maintained state (hazard map,
//! zero-score memo, layout fingerprint) next to the queries that read it.
//! It does not own the world snapshot; every query borrows the current one.

use tracing::{debug, info};

use crate::config::ArenaConfig;
use crate::grid::to_grid_coord;
use crate::hazard::{HazardMap, Threat, blast_range_for};
use crate::placement::{PlacementCandidate, PlacementQuery, PlacementScorer};
use crate::search::{
    BreachRoute, GoalMode, PathQuery, find_breach_route, find_path_avoiding, find_safe_tile,
    next_direction, to_world_path,
};
use crate::tactics::{
    ItemRoute, attack_positions, clearing_positions, items_within_reach, trap_cell,
};
use crate::types::{AgentId, Direction, ExplosiveId, GridCoord, WorldPos};
use crate::world::{Agent, Explosive, World};

#[derive(Clone, Debug)]
pub struct Planner {
    config: ArenaConfig,
    hazards: HazardMap,
    scorer: PlacementScorer,
}

impl Default for Planner {
    fn default() -> Self {
        Self::new(ArenaConfig::default())
    }
}

impl Planner {
    pub fn new(config: ArenaConfig) -> Self {
        Self { config, hazards: HazardMap::new(), scorer: PlacementScorer::new() }
    }

    pub fn config(&self) -> &ArenaConfig {
        &self.config
    }

    pub fn hazards(&self) -> &HazardMap {
        &self.hazards
    }

    pub fn scorer(&self) -> &PlacementScorer {
        &self.scorer
    }

    /// Map reset: drops every hazard and the zero-score memo.
    pub fn reset(&mut self) {
        self.hazards.clear();
        self.scorer.reset();
        info!("planner reset");
    }

    /// Records a newly placed explosive. Returns the number of hazard cells added.
    pub fn explosive_placed(&mut self, world: &World, explosive: &Explosive) -> usize {
        self.observe_layout(world);
        let range = blast_range_for(world, explosive, self.config.default_blast_range);
        self.hazards.add(&world.grid, explosive, range)
    }

    /// Discards the hazard cells of a detonated explosive.
    pub fn explosive_detonated(&mut self, id: ExplosiveId) -> bool {
        let removed = self.hazards.remove(id);
        if !removed {
            debug!(explosive = id.0, "detonation of untracked explosive");
        }
        removed
    }

    /// Re-derives pending crosses that the `cleared` obstacle cells used to
    /// shield. Call after `World::apply_detonation`.
    pub fn obstacles_destroyed(&mut self, world: &World, cleared: &[GridCoord]) -> usize {
        if cleared.is_empty() {
            return 0;
        }
        let refreshed =
            self.hazards.refresh_cleared(world, cleared, self.config.default_blast_range);
        debug!(cleared = cleared.len(), refreshed, "hazards refreshed after clearing");
        refreshed
    }

    /// Rebuilds the hazard map from every explosive in the snapshot.
    pub fn sync_hazards(&mut self, world: &World) {
        self.observe_layout(world);
        self.hazards = HazardMap::from_world(world, self.config.default_blast_range);
    }

    /// Route that never enters a cell holding an explosive. Threatened cells
    /// are avoided too, unless the agent already stands in one and has to
    /// cross hazards to get out. The target itself is never refused.
    pub fn find_path(
        &self,
        world: &World,
        agent: AgentId,
        target: GridCoord,
        mode: GoalMode,
    ) -> Option<Vec<GridCoord>> {
        let agent = self.lookup(world, agent)?;
        let start = self.cell_of(agent);
        let query = match mode {
            GoalMode::CellExact => PathQuery::cell_exact(start, target),
            GoalMode::FootprintProximity => PathQuery::footprint(start, target, agent.speed),
        };
        let escaping = self.hazards.is_threatened(start);
        find_path_avoiding(&world.grid, &query, |cell| {
            cell != target
                && (world.has_explosive_at(cell) || (!escaping && self.hazards.is_threatened(cell)))
        })
    }

    pub fn find_world_path(
        &self,
        world: &World,
        agent: AgentId,
        target: GridCoord,
        mode: GoalMode,
    ) -> Option<Vec<WorldPos>> {
        let path = self.find_path(world, agent, target, mode)?;
        Some(to_world_path(&self.config, &path))
    }

    pub fn threat_at(&self, position: WorldPos, now_ms: u64) -> Option<Threat> {
        self.hazards.threat_at(&self.config, position, now_ms)
    }

    pub fn find_safe_tile(&self, world: &World, agent: AgentId) -> Option<GridCoord> {
        let agent = self.lookup(world, agent)?;
        find_safe_tile(&world.grid, self.cell_of(agent), |cell| self.hazards.is_threatened(cell))
    }

    pub fn score_placements(&mut self, world: &World, agent: AgentId) -> Vec<PlacementCandidate> {
        self.observe_layout(world);
        let Some(agent) = self.lookup(world, agent) else {
            return Vec::new();
        };
        let query = PlacementQuery {
            origin: self.cell_of(agent),
            range: agent.blast_range,
            escape_depth: self.config.escape_depth,
        };
        self.scorer.score_placements(&world.grid, &self.hazards, query, |cell| {
            world.has_explosive_at(cell)
        })
    }

    pub fn next_direction(path: &[GridCoord]) -> Option<Direction> {
        next_direction(path)
    }

    /// Cheapest route to a stationary target counting obstacles to clear.
    pub fn plan_breach(
        &self,
        world: &World,
        agent: AgentId,
        target: GridCoord,
    ) -> Option<BreachRoute> {
        let agent = self.lookup(world, agent)?;
        find_breach_route(&world.grid, self.cell_of(agent), target)
    }

    /// Cells from which the agent's blast would cover the opponent, nearest first.
    pub fn attack_positions(
        &self,
        world: &World,
        agent: AgentId,
        opponent: AgentId,
    ) -> Vec<(GridCoord, u32)> {
        let (Some(agent), Some(opponent)) = (self.lookup(world, agent), self.lookup(world, opponent))
        else {
            return Vec::new();
        };
        attack_positions(
            &world.grid,
            self.cell_of(agent),
            self.cell_of(opponent),
            agent.blast_range,
            |cell| self.hazards.is_threatened(cell) || world.has_explosive_at(cell),
        )
    }

    /// Cells from which the agent's blast would destroy `obstacle`, nearest first.
    pub fn clearing_positions(
        &self,
        world: &World,
        agent: AgentId,
        obstacle: GridCoord,
    ) -> Vec<(GridCoord, u32)> {
        let Some(agent) = self.lookup(world, agent) else {
            return Vec::new();
        };
        clearing_positions(&world.grid, self.cell_of(agent), obstacle, agent.blast_range, |cell| {
            self.hazards.is_threatened(cell) || world.has_explosive_at(cell)
        })
    }

    /// Exit cell that seals the opponent in, when it stands in a dead corner.
    pub fn trap_cell(&self, world: &World, opponent: AgentId) -> Option<GridCoord> {
        let opponent = self.lookup(world, opponent)?;
        trap_cell(&world.grid, self.cell_of(opponent))
    }

    /// Nearest item marker within `item_reach`, avoiding threatened cells.
    pub fn nearest_item(&self, world: &World, agent: AgentId) -> Option<ItemRoute> {
        let agent = self.lookup(world, agent)?;
        items_within_reach(&world.grid, self.cell_of(agent), self.config.item_reach, |cell| {
            self.hazards.is_threatened(cell)
        })
        .into_iter()
        .next()
    }

    fn lookup<'w>(&self, world: &'w World, id: AgentId) -> Option<&'w Agent> {
        let agent = world.agent(id);
        if agent.is_none() {
            debug!(agent = id.0, "query for unknown agent");
        }
        agent
    }

    fn cell_of(&self, agent: &Agent) -> GridCoord {
        to_grid_coord(&self.config, agent.position)
    }

    /// Walls never change within a match, so a new wall layout means a new map.
    /// The scorer owns the fingerprint and drops its memo on a change.
    fn observe_layout(&mut self, world: &World) {
        if self.scorer.observe_layout(&world.grid) {
            info!("wall layout changed, invalidating planner state");
            self.hazards = HazardMap::from_world(world, self.config.default_blast_range);
        }
    }
}
