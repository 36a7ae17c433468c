//! Opponent- and item-directed queries built on the searches.
//! This module exists for the targeting questions a policy asks after
//! survival is settled: where to stand to hit an opponent or clear a chosen
//! obstacle, where to seal an opponent in, and which pickup to walk to.

use serde::{Deserialize, Serialize};

use crate::grid::Grid;
use crate::hazard::blast_zone;
use crate::placement::destroyed_by;
use crate::search::{PathQuery, find_path_avoiding, reachable_cells};
use crate::types::{GridCoord, ItemKind, TileKind, chebyshev};

/// Reachable cells from which an explosive of `range` would cover `target`,
/// nearest first. Cells for which `blocked` holds are not offered.
pub fn attack_positions<B>(
    grid: &Grid,
    from: GridCoord,
    target: GridCoord,
    range: u8,
    blocked: B,
) -> Vec<(GridCoord, u32)>
where
    B: Fn(GridCoord) -> bool,
{
    reachable_cells(grid, from)
        .into_iter()
        .filter(|(cell, _)| !blocked(*cell))
        .filter(|(cell, _)| blast_zone(grid, *cell, range).contains(&target))
        .collect()
}

/// Reachable cells from which an explosive of `range` would destroy
/// `obstacle`, nearest first. Cells for which `blocked` holds are not offered.
pub fn clearing_positions<B>(
    grid: &Grid,
    from: GridCoord,
    obstacle: GridCoord,
    range: u8,
    blocked: B,
) -> Vec<(GridCoord, u32)>
where
    B: Fn(GridCoord) -> bool,
{
    if grid.tile(obstacle) != Some(TileKind::Obstacle) {
        return Vec::new();
    }
    reachable_cells(grid, from)
        .into_iter()
        .filter(|(cell, _)| !blocked(*cell))
        .filter(|(cell, _)| destroyed_by(grid, *cell, range).contains(&obstacle))
        .collect()
}

/// The single exit of a dead corner, whose occupation seals `cell` in.
/// `None` when `cell` has zero or at least two passable exits.
pub fn trap_cell(grid: &Grid, cell: GridCoord) -> Option<GridCoord> {
    let mut exits = cell.neighbors().into_iter().filter(|n| grid.is_passable(*n));
    let exit = exits.next()?;
    exits.next().is_none().then_some(exit)
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRoute {
    pub cell: GridCoord,
    pub kind: ItemKind,
    pub path: Vec<GridCoord>,
}

/// Item markers within `reach` (Chebyshev) of `from` that have a path,
/// shortest path first.
pub fn items_within_reach<B>(
    grid: &Grid,
    from: GridCoord,
    reach: u32,
    blocked: B,
) -> Vec<ItemRoute>
where
    B: Fn(GridCoord) -> bool,
{
    let mut routes: Vec<ItemRoute> = grid
        .cells()
        .filter_map(|(cell, tile)| match tile {
            TileKind::Item(kind) if chebyshev(cell, from) <= reach => Some((cell, kind)),
            _ => None,
        })
        .filter_map(|(cell, kind)| {
            let path = find_path_avoiding(grid, &PathQuery::cell_exact(from, cell), &blocked)?;
            Some(ItemRoute { cell, kind, path })
        })
        .collect();
    routes.sort_by(|a, b| a.path.len().cmp(&b.path.len()).then(a.cell.cmp(&b.cell)));
    routes
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;

    fn c(col: i32, row: i32) -> GridCoord {
        GridCoord::new(col, row)
    }

    #[test]
    fn attack_positions_share_a_line_with_the_target() {
        let g = grid(&[".....", ".W...", "....."]);
        let spots = attack_positions(&g, c(0, 0), c(2, 2), 2, |_| false);
        let cells: Vec<GridCoord> = spots.iter().map(|(cell, _)| *cell).collect();
        assert!(cells.contains(&c(2, 0)));
        assert!(cells.contains(&c(0, 2)));
        assert!(cells.contains(&c(4, 2)));
        assert!(!cells.contains(&c(1, 1)));
        assert!(spots.windows(2).all(|pair| pair[0].1 <= pair[1].1));
    }

    #[test]
    fn walls_shield_the_target() {
        let g = grid(&["..W..", "....."]);
        let spots = attack_positions(&g, c(0, 1), c(4, 0), 4, |_| false);
        assert!(spots.iter().all(|(cell, _)| *cell != c(0, 0) && *cell != c(1, 0)));
        assert!(spots.iter().any(|(cell, _)| *cell == c(4, 1)));
    }

    #[test]
    fn clearing_positions_line_up_with_the_obstacle() {
        let g = grid(&[".....", "..C..", "....."]);
        let spots = clearing_positions(&g, c(0, 0), c(2, 1), 2, |_| false);
        let cells: Vec<GridCoord> = spots.iter().map(|(cell, _)| *cell).collect();
        assert_eq!(cells, vec![c(0, 1), c(2, 0), c(1, 1), c(3, 1), c(2, 2), c(4, 1)]);
        assert!(spots.windows(2).all(|pair| pair[0].1 <= pair[1].1));

        let shielded = grid(&["C.C..", "....."]);
        let spots = clearing_positions(&shielded, c(4, 1), c(0, 0), 3, |cell| cell == c(0, 1));
        assert_eq!(spots.iter().map(|(cell, _)| *cell).collect::<Vec<_>>(), vec![c(1, 0)]);
        assert!(clearing_positions(&shielded, c(4, 1), c(1, 0), 3, |_| false).is_empty());
    }

    #[test]
    fn trap_cell_only_for_single_exit() {
        let g = grid(&["C.C", "C.C", "..."]);
        assert_eq!(trap_cell(&g, c(1, 0)), Some(c(1, 1)));
        assert_eq!(trap_cell(&g, c(1, 1)), None);
        let sealed = grid(&["CCC", "C.C", "CCC"]);
        assert_eq!(trap_cell(&sealed, c(1, 1)), None);
    }

    #[test]
    fn items_sorted_by_path_length_and_limited_by_reach() {
        let g = grid(&["S........R", "..........", "W........."]);
        let routes = items_within_reach(&g, c(2, 0), 6, |_| false);
        assert_eq!(routes.len(), 1, "the range item sits beyond reach");
        assert_eq!(routes[0].cell, c(0, 0));
        assert_eq!(routes[0].kind, ItemKind::Speed);
        assert_eq!(routes[0].path.len(), 3);

        let g = grid(&["B...S", "....."]);
        let routes = items_within_reach(&g, c(3, 0), 6, |_| false);
        assert_eq!(routes.iter().map(|r| r.cell).collect::<Vec<_>>(), vec![c(4, 0), c(0, 0)]);
    }
}
