//! Evasion targets.
//! This module exists to pick where an agent should stand when hazards are
//! pending, and to prove an escape exists before a placement is recommended.
//! It does not track hazards; callers pass an `is_hazard` predicate.

use std::collections::{HashMap, HashSet, VecDeque, hash_map::Entry};

use tracing::trace;

use crate::grid::Grid;
use crate::types::GridCoord;

/// Nearest hazard-free cell that is not a dead corner, by breadth-first
/// layers from `start`.
///
/// The whole layer at the first qualifying distance is compared: more
/// passable exits wins, then the smaller row-major coordinate. When no cell in
/// the reachable component qualifies, the nearest hazard-free cell is returned
/// regardless of its exits.
pub fn find_safe_tile<H>(grid: &Grid, start: GridCoord, is_hazard: H) -> Option<GridCoord>
where
    H: Fn(GridCoord) -> bool,
{
    if !grid.in_bounds(start) {
        return None;
    }

    let mut visited: HashSet<GridCoord> = HashSet::from([start]);
    let mut layer = vec![start];
    let mut fallback: Option<GridCoord> = None;
    let mut depth = 0u32;

    while !layer.is_empty() {
        let mut best: Option<(usize, GridCoord)> = None;
        let mut layer_fallback: Option<GridCoord> = None;

        for &cell in &layer {
            if !grid.is_passable(cell) || is_hazard(cell) {
                continue;
            }
            if layer_fallback.is_none_or(|current| cell < current) {
                layer_fallback = Some(cell);
            }
            let exits = grid.passable_neighbor_count(cell);
            if exits < 2 {
                continue;
            }
            let better = match best {
                None => true,
                Some((best_exits, best_cell)) => {
                    exits > best_exits || (exits == best_exits && cell < best_cell)
                }
            };
            if better {
                best = Some((exits, cell));
            }
        }

        if let Some((exits, cell)) = best {
            trace!(depth, exits, "safe tile found");
            return Some(cell);
        }
        if fallback.is_none() {
            fallback = layer_fallback;
        }

        let mut next_layer = Vec::new();
        for &cell in &layer {
            if cell != start && !grid.is_passable(cell) {
                continue;
            }
            for neighbor in cell.neighbors() {
                if grid.is_passable(neighbor) && visited.insert(neighbor) {
                    next_layer.push(neighbor);
                }
            }
        }
        layer = next_layer;
        depth += 1;
    }

    trace!(depth, fallback = fallback.is_some(), "no structurally safe tile");
    fallback
}

/// First cell within `max_steps` of open ground from `start` for which
/// `is_unsafe` does not hold. The start may itself be impassable, as when it
/// holds the explosive being evaluated.
pub fn find_escape_cell<U>(
    grid: &Grid,
    start: GridCoord,
    max_steps: u32,
    is_unsafe: U,
) -> Option<GridCoord>
where
    U: Fn(GridCoord) -> bool,
{
    if !grid.in_bounds(start) {
        return None;
    }
    if grid.is_passable(start) && !is_unsafe(start) {
        return Some(start);
    }

    let mut steps: HashMap<GridCoord, u32> = HashMap::from([(start, 0)]);
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        let taken = steps.get(&current).copied().unwrap_or(0);
        if taken >= max_steps {
            continue;
        }
        for neighbor in current.neighbors() {
            if !grid.is_passable(neighbor) {
                continue;
            }
            if let Entry::Vacant(entry) = steps.entry(neighbor) {
                if !is_unsafe(neighbor) {
                    return Some(neighbor);
                }
                entry.insert(taken + 1);
                queue.push_back(neighbor);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use crate::types::manhattan;

    fn c(col: i32, row: i32) -> GridCoord {
        GridCoord::new(col, row)
    }

    #[test]
    fn current_cell_is_returned_when_already_safe() {
        let g = grid(&["...", "...", "..."]);
        assert_eq!(find_safe_tile(&g, c(1, 1), |_| false), Some(c(1, 1)));
    }

    #[test]
    fn boxed_in_cell_is_a_dead_corner_and_skipped() {
        let g = grid(&["CCCCC", "C...C", "CCCCC"]);
        // (1,1) has a single open neighbor; (2,1) has two.
        assert!(g.is_dead_corner(c(1, 1)));
        assert_eq!(find_safe_tile(&g, c(1, 1), |_| false), Some(c(2, 1)));
    }

    #[test]
    fn hazard_cells_are_never_chosen() {
        let g = grid(&[".....", ".....", "....."]);
        let threatened = [c(2, 1), c(1, 1), c(3, 1), c(2, 0), c(2, 2)];
        let tile = find_safe_tile(&g, c(2, 1), |cell| threatened.contains(&cell))
            .expect("open board has safe tiles");
        assert!(!threatened.contains(&tile));
        assert_eq!(manhattan(c(2, 1), tile), 2);
    }

    #[test]
    fn same_layer_prefers_more_exits() {
        // One-wide corridor to the left, a room to the right.
        let g = grid(&["WWWWWWW", "W.....W", "WWWW..W", "WWWW..W"]);
        let tile = find_safe_tile(&g, c(3, 1), |cell| cell == c(3, 1)).expect("tile");
        assert_eq!(tile, c(4, 1));
    }

    #[test]
    fn falls_back_to_hazard_free_dead_corner() {
        let g = grid(&["C.C", "CCC"]);
        let tile = find_safe_tile(&g, c(1, 0), |_| false);
        assert_eq!(tile, Some(c(1, 0)));
    }

    #[test]
    fn no_hazard_free_cell_yields_none() {
        let g = grid(&["..."]);
        assert_eq!(find_safe_tile(&g, c(0, 0), |_| true), None);
    }

    #[test]
    fn escape_cell_respects_step_horizon() {
        let g = grid(&["......"]);
        let unsafe_cells = |cell: GridCoord| cell.col <= 3;
        assert_eq!(find_escape_cell(&g, c(0, 0), 3, unsafe_cells), None);
        assert_eq!(find_escape_cell(&g, c(0, 0), 4, unsafe_cells), Some(c(4, 0)));
    }
}
