use std::collections::{HashMap, VecDeque, hash_map::Entry};

use crate::grid::Grid;
use crate::types::GridCoord;

/// Flood fill over open ground from `start`, in breadth-first order with the
/// step distance of each cell. The start is always included, even when it is
/// not itself passable (an agent standing on its own explosive).
pub fn reachable_cells(grid: &Grid, start: GridCoord) -> Vec<(GridCoord, u32)> {
    if !grid.in_bounds(start) {
        return Vec::new();
    }

    let mut distance: HashMap<GridCoord, u32> = HashMap::from([(start, 0)]);
    let mut order = vec![(start, 0)];
    let mut queue = VecDeque::from([start]);

    while let Some(current) = queue.pop_front() {
        let next_distance = distance.get(&current).copied().unwrap_or(0) + 1;
        for neighbor in current.neighbors() {
            if !grid.is_passable(neighbor) {
                continue;
            }
            if let Entry::Vacant(entry) = distance.entry(neighbor) {
                entry.insert(next_distance);
                order.push((neighbor, next_distance));
                queue.push_back(neighbor);
            }
        }
    }

    order
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    #[test]
    fn flood_fill_stops_at_walls_and_obstacles() {
        let g = grid(&["..C.", ".W..", "W..."]);
        let cells = reachable_cells(&g, GridCoord::new(0, 0));
        let coords: Vec<GridCoord> = cells.iter().map(|(cell, _)| *cell).collect();
        assert_eq!(coords.len(), 3);
        assert!(coords.contains(&GridCoord::new(1, 0)));
        assert!(coords.contains(&GridCoord::new(0, 1)));
        assert!(!coords.contains(&GridCoord::new(2, 0)));
    }

    #[test]
    fn distances_are_non_decreasing() {
        let g = grid(&["....", "....", "...."]);
        let cells = reachable_cells(&g, GridCoord::new(1, 1));
        assert_eq!(cells.len(), 12);
        assert!(cells.windows(2).all(|pair| pair[0].1 <= pair[1].1));
        assert_eq!(cells.iter().map(|(_, d)| *d).max(), Some(3));
    }

    #[test]
    fn out_of_bounds_start_reaches_nothing() {
        let g = grid(&[".."]);
        assert!(reachable_cells(&g, GridCoord::new(5, 5)).is_empty());
    }
}
