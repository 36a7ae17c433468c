//! Grid searches: goal-directed paths, obstacle-breaching routes, safety
//! targets and flood-fill reachability.
//! Every search takes the grid and plain predicates; none of them reads
//! hazard state or agent records directly.

mod breach;
mod pathfinding;
mod reachability;
mod safety;

pub use breach::{BreachRoute, find_breach_route};
pub use pathfinding::{
    GoalMode, PathQuery, SearchStrategy, find_path, find_path_avoiding, next_direction,
    to_world_path,
};
pub use reachability::reachable_cells;
pub use safety::{find_escape_cell, find_safe_tile};
