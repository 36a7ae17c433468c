//! Routes toward a stationary target that may cross destructible obstacles.
//! Open ground costs nothing and each obstacle costs one, so the cheapest
//! route is the one that needs the fewest placements to clear.

use std::collections::{HashMap, HashSet, VecDeque};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::grid::Grid;
use crate::types::{GridCoord, TileKind};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BreachRoute {
    /// Start to goal inclusive.
    pub path: Vec<GridCoord>,
    /// Obstacle cells on `path`, in travel order.
    pub obstacles: Vec<GridCoord>,
    pub cost: u32,
}

/// 0-1 BFS from `start` to `goal`. Walls are never crossed except when the
/// wall is the goal itself.
pub fn find_breach_route(grid: &Grid, start: GridCoord, goal: GridCoord) -> Option<BreachRoute> {
    if !grid.in_bounds(start) || !grid.in_bounds(goal) {
        return None;
    }

    let mut cost: HashMap<GridCoord, u32> = HashMap::from([(start, 0)]);
    let mut came_from: HashMap<GridCoord, GridCoord> = HashMap::new();
    let mut settled: HashSet<GridCoord> = HashSet::new();
    let mut deque = VecDeque::from([start]);

    while let Some(current) = deque.pop_front() {
        if !settled.insert(current) {
            continue;
        }
        let current_cost = cost.get(&current).copied().unwrap_or(0);
        if current == goal {
            trace!(settled = settled.len(), cost = current_cost, "breach route found");
            let path = reconstruct(&came_from, start, goal);
            let obstacles = path.iter().copied().filter(|cell| grid.is_obstacle(*cell)).collect();
            return Some(BreachRoute { path, obstacles, cost: current_cost });
        }

        for neighbor in current.neighbors() {
            let Some(step) = step_cost(grid, neighbor, goal) else {
                continue;
            };
            let candidate = current_cost + step;
            if cost.get(&neighbor).is_some_and(|known| *known <= candidate) {
                continue;
            }
            cost.insert(neighbor, candidate);
            came_from.insert(neighbor, current);
            if step == 0 {
                deque.push_front(neighbor);
            } else {
                deque.push_back(neighbor);
            }
        }
    }

    None
}

fn step_cost(grid: &Grid, cell: GridCoord, goal: GridCoord) -> Option<u32> {
    match grid.tile(cell)? {
        TileKind::Empty | TileKind::Item(_) => Some(0),
        TileKind::Obstacle => Some(1),
        TileKind::Wall => (cell == goal).then_some(0),
    }
}

fn reconstruct(
    came_from: &HashMap<GridCoord, GridCoord>,
    start: GridCoord,
    goal: GridCoord,
) -> Vec<GridCoord> {
    let mut path = vec![goal];
    let mut current = goal;
    while current != start {
        match came_from.get(&current) {
            Some(previous) => current = *previous,
            None => break,
        }
        path.push(current);
    }
    path.reverse();
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    fn c(col: i32, row: i32) -> GridCoord {
        GridCoord::new(col, row)
    }

    #[test]
    fn open_route_costs_nothing() {
        let g = grid(&["....", "...."]);
        let route = find_breach_route(&g, c(0, 0), c(3, 1)).expect("route");
        assert_eq!(route.cost, 0);
        assert!(route.obstacles.is_empty());
        assert_eq!(route.path.first(), Some(&c(0, 0)));
        assert_eq!(route.path.last(), Some(&c(3, 1)));
    }

    #[test]
    fn prefers_fewest_obstacles_over_shortest_length() {
        // Straight line crosses three obstacles; the detour crosses one.
        let g = grid(&[".CCC.", "...C."]);
        let route = find_breach_route(&g, c(0, 0), c(4, 0)).expect("route");
        assert_eq!(route.cost, 1);
        assert_eq!(route.obstacles, vec![c(3, 1)]);
        assert_eq!(route.path.len(), 7);
    }

    #[test]
    fn sealed_target_is_reached_through_obstacles() {
        let g = grid(&["..C..", "WWWWW"]);
        let route = find_breach_route(&g, c(0, 0), c(4, 0)).expect("route");
        assert_eq!(route.cost, 1);
        assert_eq!(route.obstacles, vec![c(2, 0)]);
        assert_eq!(route.path.len(), 5);
    }

    #[test]
    fn walls_are_never_crossed() {
        let g = grid(&["..W.."]);
        assert_eq!(find_breach_route(&g, c(0, 0), c(4, 0)), None);
    }

    #[test]
    fn wall_goal_is_exempt() {
        let g = grid(&["..W"]);
        let route = find_breach_route(&g, c(0, 0), c(2, 0)).expect("route");
        assert_eq!(route.cost, 0);
        assert_eq!(route.path.len(), 3);
    }
}
