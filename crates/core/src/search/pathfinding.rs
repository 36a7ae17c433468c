//! Goal-directed search over the tile grid.
//! This module exists so every movement query shares one parameterized
//! search: stride, goal relaxation and frontier ordering are chosen per query.
//! It does not own hazard state; callers pass a blocking predicate instead.

use std::cmp::Ordering;
use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::config::ArenaConfig;
use crate::grid::{Grid, to_world_pos};
use crate::heap::{HeapHandle, IndexedMinHeap};
use crate::types::{Direction, GridCoord, WorldPos, chebyshev, manhattan};

/// When a search counts as having arrived.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum GoalMode {
    /// The current cell must equal the target. Always expands at stride 1.
    #[default]
    CellExact,
    /// Arrived once the Chebyshev distance to the target is at most
    /// `speed - 1`. Expands at a stride equal to the agent's speed.
    FootprintProximity,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchStrategy {
    /// Uniform-cost A* with the Manhattan heuristic.
    #[default]
    AStar,
    /// Orders the frontier by heuristic alone. Faster, not shortest.
    Greedy,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PathQuery {
    pub start: GridCoord,
    pub goal: GridCoord,
    pub speed: u8,
    pub mode: GoalMode,
    pub strategy: SearchStrategy,
}

impl PathQuery {
    pub fn cell_exact(start: GridCoord, goal: GridCoord) -> Self {
        Self { start, goal, speed: 1, mode: GoalMode::CellExact, strategy: SearchStrategy::AStar }
    }

    pub fn footprint(start: GridCoord, goal: GridCoord, speed: u8) -> Self {
        Self {
            start,
            goal,
            speed,
            mode: GoalMode::FootprintProximity,
            strategy: SearchStrategy::AStar,
        }
    }

    pub fn with_strategy(mut self, strategy: SearchStrategy) -> Self {
        self.strategy = strategy;
        self
    }

    /// Cells covered by one expansion step.
    pub fn stride(&self) -> i32 {
        match self.mode {
            GoalMode::CellExact => 1,
            GoalMode::FootprintProximity => i32::from(self.speed.clamp(1, 3)),
        }
    }

    pub fn is_goal(&self, cell: GridCoord) -> bool {
        match self.mode {
            GoalMode::CellExact => cell == self.goal,
            GoalMode::FootprintProximity => {
                chebyshev(cell, self.goal) <= self.stride().unsigned_abs() - 1
            }
        }
    }
}

#[derive(Clone, Copy, Debug)]
struct OpenNode {
    coord: GridCoord,
    g: u32,
    h: u32,
    f: u32,
    parent: Option<usize>,
}

fn frontier_order(a: &OpenNode, b: &OpenNode) -> Ordering {
    a.f.cmp(&b.f).then(a.h.cmp(&b.h)).then(a.coord.cmp(&b.coord))
}

pub fn find_path(grid: &Grid, query: &PathQuery) -> Option<Vec<GridCoord>> {
    find_path_avoiding(grid, query, |_| false)
}

/// Searches from `query.start` toward `query.goal`, refusing to enter any
/// cell for which `blocked` holds. The goal cell is exempt from the
/// passability check but not from `blocked`.
///
/// Returns the cells visited from start to arrival inclusive, a single-cell
/// path when the start already satisfies the goal, and `None` when the
/// frontier runs dry.
pub fn find_path_avoiding<B>(grid: &Grid, query: &PathQuery, blocked: B) -> Option<Vec<GridCoord>>
where
    B: Fn(GridCoord) -> bool,
{
    if !grid.in_bounds(query.start) || !grid.in_bounds(query.goal) {
        return None;
    }
    if query.is_goal(query.start) {
        return Some(vec![query.start]);
    }

    let stride = query.stride();
    let mut open = IndexedMinHeap::new(frontier_order);
    let mut queued: HashMap<GridCoord, HeapHandle> = HashMap::new();
    let mut closed: HashSet<GridCoord> = HashSet::new();
    let mut expanded: Vec<(GridCoord, Option<usize>)> = Vec::new();

    let h = manhattan(query.start, query.goal);
    let handle = open.push(OpenNode { coord: query.start, g: 0, h, f: h, parent: None });
    queued.insert(query.start, handle);

    while let Some(node) = open.pop_min() {
        queued.remove(&node.coord);
        if !closed.insert(node.coord) {
            continue;
        }
        let index = expanded.len();
        expanded.push((node.coord, node.parent));

        if query.is_goal(node.coord) {
            trace!(expanded = expanded.len(), cost = node.g, "path found");
            return Some(reconstruct(&expanded, index));
        }

        for direction in Direction::ALL {
            let Some(next) = hop(grid, node.coord, direction, stride, query.goal, &blocked) else {
                continue;
            };
            if closed.contains(&next) {
                continue;
            }
            let g = node.g + stride.unsigned_abs();
            let h = manhattan(next, query.goal);
            let f = match query.strategy {
                SearchStrategy::AStar => g + h,
                SearchStrategy::Greedy => h,
            };
            match queued.get(&next) {
                Some(&handle) => {
                    if let Some(queued_node) = open.get_mut(handle)
                        && g < queued_node.g
                    {
                        queued_node.g = g;
                        queued_node.f = f;
                        queued_node.parent = Some(index);
                        open.restore_order(handle);
                    }
                }
                None => {
                    let handle =
                        open.push(OpenNode { coord: next, g, h, f, parent: Some(index) });
                    queued.insert(next, handle);
                }
            }
        }
    }

    trace!(expanded = expanded.len(), "frontier exhausted");
    None
}

/// Landing cell of one hop, or `None` when any cell along it is impassable
/// or blocked. Only the landing cell may be the exempt goal.
fn hop<B>(
    grid: &Grid,
    from: GridCoord,
    direction: Direction,
    stride: i32,
    goal: GridCoord,
    blocked: &B,
) -> Option<GridCoord>
where
    B: Fn(GridCoord) -> bool,
{
    for step in 1..=stride {
        let cell = from.offset(direction, step);
        if !grid.in_bounds(cell) || blocked(cell) {
            return None;
        }
        let exempt = step == stride && cell == goal;
        if !exempt && !grid.is_passable(cell) {
            return None;
        }
    }
    Some(from.offset(direction, stride))
}

fn reconstruct(expanded: &[(GridCoord, Option<usize>)], mut index: usize) -> Vec<GridCoord> {
    let mut path = Vec::new();
    loop {
        let (coord, parent) = expanded[index];
        path.push(coord);
        match parent {
            Some(parent) => index = parent,
            None => break,
        }
    }
    path.reverse();
    path
}

/// Movement command that takes the first step of `path`.
pub fn next_direction(path: &[GridCoord]) -> Option<Direction> {
    match path {
        [from, to, ..] => Direction::between(*from, *to),
        _ => None,
    }
}

pub fn to_world_path(config: &ArenaConfig, path: &[GridCoord]) -> Vec<WorldPos> {
    path.iter().map(|cell| to_world_pos(config, *cell)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    fn c(col: i32, row: i32) -> GridCoord {
        GridCoord::new(col, row)
    }

    #[test]
    fn start_on_goal_yields_single_cell_path() {
        let g = grid(&["...", "...", "..."]);
        assert_eq!(find_path(&g, &PathQuery::cell_exact(c(1, 1), c(1, 1))), Some(vec![c(1, 1)]));
    }

    #[test]
    fn astar_routes_around_walls_with_shortest_length() {
        let g = grid(&[".....", ".WWW.", ".....", "....."]);
        let path = find_path(&g, &PathQuery::cell_exact(c(2, 0), c(2, 2))).expect("path exists");
        assert_eq!(path.first(), Some(&c(2, 0)));
        assert_eq!(path.last(), Some(&c(2, 2)));
        assert_eq!(path.len(), 7);
        for pair in path.windows(2) {
            assert_eq!(manhattan(pair[0], pair[1]), 1);
        }
    }

    #[test]
    fn unreachable_goal_returns_none() {
        let g = grid(&["..W..", "..W..", "..W.."]);
        assert_eq!(find_path(&g, &PathQuery::cell_exact(c(0, 0), c(4, 0))), None);
    }

    #[test]
    fn goal_on_obstacle_is_reachable() {
        let g = grid(&["...C", "...."]);
        let path = find_path(&g, &PathQuery::cell_exact(c(0, 0), c(3, 0))).expect("exempt goal");
        assert_eq!(path.last(), Some(&c(3, 0)));
        assert_eq!(path.len(), 4);
    }

    #[test]
    fn obstacle_before_goal_still_blocks() {
        let g = grid(&["..C.", "WWWW"]);
        assert_eq!(find_path(&g, &PathQuery::cell_exact(c(0, 0), c(3, 0))), None);
    }

    #[test]
    fn blocked_predicate_forces_detour() {
        let g = grid(&["...", "...", "..."]);
        let hazard = c(1, 0);
        let path = find_path_avoiding(&g, &PathQuery::cell_exact(c(0, 0), c(2, 0)), |cell| {
            cell == hazard
        })
        .expect("detour exists");
        assert!(!path.contains(&hazard));
        assert_eq!(path.len(), 5);
    }

    #[test]
    fn fast_agent_hops_and_arrives_within_proximity() {
        let g = grid(&["......."]);
        let path =
            find_path(&g, &PathQuery::footprint(c(0, 0), c(6, 0), 2)).expect("hop path exists");
        assert_eq!(path, vec![c(0, 0), c(2, 0), c(4, 0), c(6, 0)]);

        let path = find_path(&g, &PathQuery::footprint(c(0, 0), c(5, 0), 2)).expect("path");
        assert_eq!(path, vec![c(0, 0), c(2, 0), c(4, 0)]);
    }

    #[test]
    fn hop_cannot_jump_over_impassable_cell() {
        let g = grid(&[".W...", ".....", "....."]);
        let path = find_path(&g, &PathQuery::footprint(c(0, 0), c(4, 0), 2))
            .expect("path around the wall");
        assert_eq!(path.get(1), Some(&c(0, 2)), "the only legal first hop goes down");
        for pair in path.windows(2) {
            let dir = Direction::between(pair[0], pair[1]).expect("straight hop");
            assert_eq!(manhattan(pair[0], pair[1]), 2);
            assert!(g.is_passable(pair[0].offset(dir, 1)));
        }
    }

    #[test]
    fn cell_exact_mode_ignores_speed() {
        let g = grid(&["....."]);
        let mut query = PathQuery::cell_exact(c(0, 0), c(4, 0));
        query.speed = 3;
        assert_eq!(find_path(&g, &query).map(|p| p.len()), Some(5));
    }

    #[test]
    fn greedy_strategy_still_reaches_goal() {
        let g = grid(&[".....", ".WWW.", "....."]);
        let query = PathQuery::cell_exact(c(0, 0), c(4, 2)).with_strategy(SearchStrategy::Greedy);
        let path = find_path(&g, &query).expect("greedy path");
        assert_eq!(path.last(), Some(&c(4, 2)));
    }

    #[test]
    fn greedy_reparents_a_queued_cell_reached_more_cheaply() {
        let g = grid(&[".W.WW.", "W....W", ".W....", "..WW..", "....W.", "......", "W....W"]);
        let query = PathQuery::cell_exact(c(1, 5), c(2, 1)).with_strategy(SearchStrategy::Greedy);
        let path = find_path(&g, &query).expect("greedy path");
        // (3,5) is first queued behind the detour through row 4.
        assert_eq!(
            path,
            vec![
                c(1, 5),
                c(2, 5),
                c(3, 5),
                c(4, 5),
                c(5, 5),
                c(5, 4),
                c(5, 3),
                c(5, 2),
                c(4, 2),
                c(4, 1),
                c(3, 1),
                c(2, 1),
            ]
        );
    }

    #[test]
    fn out_of_bounds_endpoints_yield_none() {
        let g = grid(&["..."]);
        assert_eq!(find_path(&g, &PathQuery::cell_exact(c(-1, 0), c(2, 0))), None);
        assert_eq!(find_path(&g, &PathQuery::cell_exact(c(0, 0), c(3, 0))), None);
    }

    #[test]
    fn next_direction_reads_first_step() {
        assert_eq!(next_direction(&[c(1, 1), c(1, 0)]), Some(Direction::Up));
        assert_eq!(next_direction(&[c(1, 1), c(3, 1), c(5, 1)]), Some(Direction::Right));
        assert_eq!(next_direction(&[c(1, 1)]), None);
    }
}
