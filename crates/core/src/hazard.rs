//! Blast-cross derivation and the live hazard map.
//! This module exists to answer "is this position unsafe, and how soon" from
//! pending explosives, with add/remove scoped to one explosive at a time.
//! It does not decide whether to move; severity tiers are advisory.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use tracing::{trace, warn};

use crate::config::{ArenaConfig, SeverityThresholds};
use crate::grid::{Grid, footprint_cells};
use crate::types::{Direction, ExplosiveId, GridCoord, WorldPos, manhattan};
use crate::world::{Explosive, World};

/// Countdown tiers, most urgent first.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Severity {
    Critical,
    High,
    Elevated,
    Low,
}

impl Severity {
    pub fn classify(millis_until: u64, thresholds: &SeverityThresholds) -> Self {
        if millis_until < thresholds.critical_below_ms {
            Severity::Critical
        } else if millis_until < thresholds.high_below_ms {
            Severity::High
        } else if millis_until < thresholds.elevated_below_ms {
            Severity::Elevated
        } else {
            Severity::Low
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardCell {
    pub cell: GridCoord,
    pub detonates_at_ms: u64,
    pub explosive: ExplosiveId,
}

/// Answer of an unsafe-position query: the soonest overlapping detonation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Threat {
    pub severity: Severity,
    pub millis_until_detonation: u64,
    pub detonates_at_ms: u64,
}

/// Cells threatened by an explosive at `origin` with the given range.
///
/// The origin is always included. Each cardinal scan stops before the first
/// impassable cell, so a wall or obstacle shields everything behind it and
/// is not itself part of the set. An origin off the grid threatens nothing.
pub fn blast_zone(grid: &Grid, origin: GridCoord, range: u8) -> Vec<GridCoord> {
    if !grid.in_bounds(origin) {
        return Vec::new();
    }
    let mut cells = vec![origin];
    for direction in Direction::ALL {
        for step in 1..=i32::from(range) {
            let cell = origin.offset(direction, step);
            if !grid.is_passable(cell) {
                break;
            }
            cells.push(cell);
        }
    }
    cells
}

/// Blast range of an explosive, taken from its owner when the owner is known.
pub fn blast_range_for(world: &World, explosive: &Explosive, default_range: u8) -> u8 {
    match world.agent(explosive.owner) {
        Some(owner) => owner.blast_range,
        None => {
            warn!(
                explosive = explosive.id.0,
                owner = explosive.owner.0,
                default_range,
                "explosive owner unknown, using default blast range"
            );
            default_range
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct HazardMap {
    by_cell: BTreeMap<GridCoord, Vec<(ExplosiveId, u64)>>,
    by_explosive: BTreeMap<ExplosiveId, Vec<GridCoord>>,
}

impl HazardMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds the map from every explosive in the snapshot.
    pub fn from_world(world: &World, default_range: u8) -> Self {
        let mut map = Self::new();
        for explosive in &world.explosives {
            let range = blast_range_for(world, explosive, default_range);
            map.add(&world.grid, explosive, range);
        }
        map
    }

    /// Re-derives the crosses of tracked explosives that share a line with a
    /// `cleared` cell within their range. Returns how many were re-derived.
    pub fn refresh_cleared(
        &mut self,
        world: &World,
        cleared: &[GridCoord],
        default_range: u8,
    ) -> usize {
        let mut refreshed = 0;
        for explosive in &world.explosives {
            if !self.contains_explosive(explosive.id) {
                continue;
            }
            let range = blast_range_for(world, explosive, default_range);
            let reaches = cleared.iter().any(|cell| {
                Direction::between(explosive.cell, *cell).is_some()
                    && manhattan(explosive.cell, *cell) <= u32::from(range)
            });
            if reaches {
                self.add(&world.grid, explosive, range);
                refreshed += 1;
            }
        }
        refreshed
    }

    /// Derives and records the blast cross of one explosive, replacing any
    /// earlier entry for the same id. Returns the number of cells added.
    pub fn add(&mut self, grid: &Grid, explosive: &Explosive, range: u8) -> usize {
        self.remove(explosive.id);
        let cells = blast_zone(grid, explosive.cell, range);
        for cell in &cells {
            self.by_cell.entry(*cell).or_default().push((explosive.id, explosive.detonates_at_ms));
        }
        let count = cells.len();
        trace!(explosive = explosive.id.0, range, cells = count, "hazard added");
        self.by_explosive.insert(explosive.id, cells);
        count
    }

    /// Discards every hazard cell tagged with `id`. Returns whether any existed.
    pub fn remove(&mut self, id: ExplosiveId) -> bool {
        let Some(cells) = self.by_explosive.remove(&id) else {
            return false;
        };
        for cell in cells {
            if let Some(entries) = self.by_cell.get_mut(&cell) {
                entries.retain(|(explosive, _)| *explosive != id);
                if entries.is_empty() {
                    self.by_cell.remove(&cell);
                }
            }
        }
        true
    }

    pub fn clear(&mut self) {
        self.by_cell.clear();
        self.by_explosive.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.by_cell.is_empty()
    }

    pub fn explosive_count(&self) -> usize {
        self.by_explosive.len()
    }

    pub fn contains_explosive(&self, id: ExplosiveId) -> bool {
        self.by_explosive.contains_key(&id)
    }

    pub fn cells_of(&self, id: ExplosiveId) -> Option<&[GridCoord]> {
        self.by_explosive.get(&id).map(Vec::as_slice)
    }

    pub fn is_threatened(&self, cell: GridCoord) -> bool {
        self.by_cell.contains_key(&cell)
    }

    /// Soonest detonation time among all hazards covering `cell`.
    pub fn soonest_at(&self, cell: GridCoord) -> Option<u64> {
        self.by_cell.get(&cell)?.iter().map(|(_, at)| *at).min()
    }

    pub fn hazard_cells(&self) -> impl Iterator<Item = HazardCell> + '_ {
        self.by_cell.iter().flat_map(|(cell, entries)| {
            entries.iter().map(move |(explosive, at)| HazardCell {
                cell: *cell,
                detonates_at_ms: *at,
                explosive: *explosive,
            })
        })
    }

    /// Unsafe-position query for an agent whose top-left corner is at `pos`.
    /// Every cell of the footprint is checked and the soonest detonation wins.
    pub fn threat_at(&self, config: &ArenaConfig, pos: WorldPos, now_ms: u64) -> Option<Threat> {
        footprint_cells(config, pos)
            .into_iter()
            .filter_map(|cell| self.soonest_at(cell))
            .min()
            .map(|at| make_threat(config, at, now_ms))
    }
}

fn make_threat(config: &ArenaConfig, detonates_at_ms: u64, now_ms: u64) -> Threat {
    let millis_until_detonation = detonates_at_ms.saturating_sub(now_ms);
    Threat {
        severity: Severity::classify(millis_until_detonation, &config.severity),
        millis_until_detonation,
        detonates_at_ms,
    }
}
