//! Explosive placement scoring.
//! This module exists to rank reachable cells by how many destructible
//! obstacles a placement there would clear, keeping only placements that
//! leave a provable escape. It does not move the agent or place anything.
//!
//! Obstacles only ever disappear during a match, so a placement that clears
//! nothing can never start clearing something later. Those zero results are
//! remembered per `(cell, range)` until the layout is reset; nonzero scores
//! are always recomputed.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::grid::Grid;
use crate::hazard::{HazardMap, blast_zone};
use crate::search::{find_escape_cell, reachable_cells};
use crate::types::{Direction, GridCoord, TileKind};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacementCandidate {
    pub cell: GridCoord,
    /// Obstacles the blast would destroy.
    pub score: u32,
    /// Steps from the agent's cell.
    pub distance: u32,
    /// Nearest cell outside every hazard, simulated one included.
    pub escape: GridCoord,
}

/// Obstacles destroyed by an explosive at `cell` with `range`.
///
/// Each cardinal scan stops at the first wall without counting it, or counts
/// the first obstacle once and then stops.
pub fn destruction_score(grid: &Grid, cell: GridCoord, range: u8) -> u32 {
    let mut score = 0;
    for direction in Direction::ALL {
        if first_obstacle(grid, cell, direction, range).is_some() {
            score += 1;
        }
    }
    score
}

/// Obstacle cells a detonation at `cell` clears, at most one per direction.
pub fn destroyed_by(grid: &Grid, cell: GridCoord, range: u8) -> Vec<GridCoord> {
    Direction::ALL
        .into_iter()
        .filter_map(|direction| first_obstacle(grid, cell, direction, range))
        .collect()
}

fn first_obstacle(
    grid: &Grid,
    cell: GridCoord,
    direction: Direction,
    range: u8,
) -> Option<GridCoord> {
    for step in 1..=i32::from(range) {
        let probe = cell.offset(direction, step);
        match grid.tile(probe)? {
            TileKind::Wall => return None,
            TileKind::Obstacle => return Some(probe),
            TileKind::Empty | TileKind::Item(_) => {}
        }
    }
    None
}

#[derive(Clone, Debug, Default)]
pub struct PlacementScorer {
    known_zero: HashSet<(GridCoord, u8)>,
    layout: Option<u64>,
}

/// Inputs of one scoring pass.
#[derive(Clone, Copy, Debug)]
pub struct PlacementQuery {
    pub origin: GridCoord,
    pub range: u8,
    pub escape_depth: u32,
}

impl PlacementScorer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Forgets every remembered zero. Only valid on a map reset.
    pub fn reset(&mut self) {
        self.known_zero.clear();
        self.layout = None;
    }

    /// Records the wall layout of `grid`, clearing the memo when it differs
    /// from the layout seen before. Returns whether the memo was cleared.
    pub fn observe_layout(&mut self, grid: &Grid) -> bool {
        let fingerprint = grid.layout_fingerprint();
        match self.layout.replace(fingerprint) {
            Some(previous) if previous != fingerprint => {
                self.known_zero.clear();
                true
            }
            _ => false,
        }
    }

    pub fn known_zero_count(&self) -> usize {
        self.known_zero.len()
    }

    pub fn is_known_zero(&self, cell: GridCoord, range: u8) -> bool {
        self.known_zero.contains(&(cell, range))
    }

    pub fn score(&mut self, grid: &Grid, cell: GridCoord, range: u8) -> u32 {
        if self.is_known_zero(cell, range) {
            return 0;
        }
        let score = destruction_score(grid, cell, range);
        if score == 0 {
            self.known_zero.insert((cell, range));
        }
        score
    }

    /// Scores every cell reachable from `query.origin` over open ground.
    ///
    /// Cells for which `occupied` holds (an explosive already sits there) are
    /// skipped. A candidate is kept only when a cell outside both its own
    /// simulated blast and every existing hazard is reachable within
    /// `query.escape_depth` steps. Results are ordered by score descending,
    /// then distance ascending.
    pub fn score_placements<O>(
        &mut self,
        grid: &Grid,
        hazards: &HazardMap,
        query: PlacementQuery,
        occupied: O,
    ) -> Vec<PlacementCandidate>
    where
        O: Fn(GridCoord) -> bool,
    {
        self.observe_layout(grid);

        let mut candidates = Vec::new();
        let mut rejected = 0usize;
        for (cell, distance) in reachable_cells(grid, query.origin) {
            if occupied(cell) {
                continue;
            }
            let score = self.score(grid, cell, query.range);
            if score == 0 {
                continue;
            }
            let blast = blast_zone(grid, cell, query.range);
            let escape = find_escape_cell(grid, cell, query.escape_depth, |probe| {
                blast.contains(&probe) || hazards.is_threatened(probe)
            });
            match escape {
                Some(escape) => {
                    candidates.push(PlacementCandidate { cell, score, distance, escape })
                }
                None => {
                    trace!(col = cell.col, row = cell.row, score, "placement has no escape");
                    rejected += 1;
                }
            }
        }

        candidates.sort_by(|a, b| {
            b.score.cmp(&a.score).then(a.distance.cmp(&b.distance)).then(a.cell.cmp(&b.cell))
        });
        debug!(
            accepted = candidates.len(),
            rejected,
            known_zero = self.known_zero.len(),
            "placements scored"
        );
        candidates
    }
}
