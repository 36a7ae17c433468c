pub mod config;
pub mod error;
pub mod grid;
pub mod hazard;
pub mod heap;
pub mod placement;
pub mod planner;
pub mod search;
pub mod tactics;
pub mod types;
pub mod world;

#[cfg(test)]
mod test_support;

pub use config::{ArenaConfig, SeverityThresholds};
pub use error::{ConfigError, GridError};
pub use grid::{Grid, footprint_cells, is_passable_footprint, to_grid_coord, to_world_pos};
pub use hazard::{HazardCell, HazardMap, Severity, Threat, blast_range_for, blast_zone};
pub use heap::{HeapHandle, IndexedMinHeap};
pub use placement::{
    PlacementCandidate, PlacementQuery, PlacementScorer, destroyed_by, destruction_score,
};
pub use planner::Planner;
pub use search::{BreachRoute, GoalMode, PathQuery, SearchStrategy};
pub use tactics::ItemRoute;
pub use types::*;
pub use world::{Agent, Explosive, World};
