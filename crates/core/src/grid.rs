//! Tile storage, bounds-checked access and pixel/cell conversion.
//! This module exists so every algorithm shares one passability rule.
//! It does not own hazard state or any search.

use std::hash::Hasher;

use serde::{Deserialize, Serialize};
use xxhash_rust::xxh3::Xxh3;

use crate::config::ArenaConfig;
use crate::error::GridError;
use crate::types::{GridCoord, TileKind, WorldPos};

/// Fixed-size, row-major tile array. Serialized as one glyph string per row.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct Grid {
    width: usize,
    height: usize,
    tiles: Vec<TileKind>,
}

impl Grid {
    pub fn new(width: usize, height: usize) -> Self {
        Self { width, height, tiles: vec![TileKind::Empty; width * height] }
    }

    pub fn from_rows<S: AsRef<str>>(rows: &[S]) -> Result<Self, GridError> {
        let Some(first) = rows.first() else {
            return Err(GridError::Empty);
        };
        let width = first.as_ref().chars().count();
        if width == 0 {
            return Err(GridError::Empty);
        }
        let mut tiles = Vec::with_capacity(width * rows.len());
        for (row, line) in rows.iter().enumerate() {
            let line = line.as_ref();
            let found = line.chars().count();
            if found != width {
                return Err(GridError::RaggedRow { row, expected: width, found });
            }
            for (col, glyph) in line.chars().enumerate() {
                let tile =
                    TileKind::from_glyph(glyph).ok_or(GridError::UnknownGlyph { glyph, col, row })?;
                tiles.push(tile);
            }
        }
        Ok(Self { width, height: rows.len(), tiles })
    }

    pub fn to_rows(&self) -> Vec<String> {
        self.tiles
            .chunks(self.width.max(1))
            .take(self.height)
            .map(|row| row.iter().map(|tile| tile.glyph()).collect())
            .collect()
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn in_bounds(&self, coord: GridCoord) -> bool {
        self.index(coord).is_some()
    }

    /// The tile at `coord`, or `None` outside the grid.
    pub fn tile(&self, coord: GridCoord) -> Option<TileKind> {
        self.index(coord).map(|idx| self.tiles[idx])
    }

    /// Empty and item tiles are passable; walls, obstacles and out-of-bounds cells are not.
    pub fn is_passable(&self, coord: GridCoord) -> bool {
        self.tile(coord).is_some_and(TileKind::is_passable)
    }

    pub fn is_obstacle(&self, coord: GridCoord) -> bool {
        self.tile(coord) == Some(TileKind::Obstacle)
    }

    pub fn passable_neighbor_count(&self, coord: GridCoord) -> usize {
        coord.neighbors().into_iter().filter(|n| self.is_passable(*n)).count()
    }

    /// A cell with fewer than two passable exits can be sealed by a single placement.
    pub fn is_dead_corner(&self, coord: GridCoord) -> bool {
        self.passable_neighbor_count(coord) < 2
    }

    pub fn set_tile(&mut self, coord: GridCoord, tile: TileKind) {
        if let Some(idx) = self.index(coord) {
            self.tiles[idx] = tile;
        }
    }

    /// Clears a destructible obstacle. Returns whether the tile changed.
    ///
    /// This is the only tile transition that happens during a match.
    pub fn destroy_obstacle(&mut self, coord: GridCoord) -> bool {
        match self.index(coord) {
            Some(idx) if self.tiles[idx] == TileKind::Obstacle => {
                self.tiles[idx] = TileKind::Empty;
                true
            }
            _ => false,
        }
    }

    pub fn cells(&self) -> impl Iterator<Item = (GridCoord, TileKind)> + '_ {
        self.tiles.iter().enumerate().map(|(idx, tile)| {
            let col = (idx % self.width) as i32;
            let row = (idx / self.width) as i32;
            (GridCoord::new(col, row), *tile)
        })
    }

    /// Hash of the dimensions and wall cells. Walls never change within a match,
    /// so a different fingerprint means a different map.
    pub fn layout_fingerprint(&self) -> u64 {
        let mut hasher = Xxh3::new();
        hasher.write_u64(self.width as u64);
        hasher.write_u64(self.height as u64);
        for (idx, tile) in self.tiles.iter().enumerate() {
            if *tile == TileKind::Wall {
                hasher.write_u64(idx as u64);
            }
        }
        hasher.finish()
    }

    fn index(&self, coord: GridCoord) -> Option<usize> {
        let col = usize::try_from(coord.col).ok()?;
        let row = usize::try_from(coord.row).ok()?;
        if col >= self.width || row >= self.height {
            return None;
        }
        Some(row * self.width + col)
    }
}

impl TryFrom<Vec<String>> for Grid {
    type Error = GridError;

    fn try_from(rows: Vec<String>) -> Result<Self, Self::Error> {
        Grid::from_rows(&rows)
    }
}

impl From<Grid> for Vec<String> {
    fn from(grid: Grid) -> Self {
        grid.to_rows()
    }
}

/// Round-half-up of `pixel / tile_size` on each axis.
pub fn to_grid_coord(config: &ArenaConfig, pos: WorldPos) -> GridCoord {
    let col = (pos.x / config.tile_size + 0.5).floor() as i32;
    let row = (pos.y / config.tile_size + 0.5).floor() as i32;
    GridCoord::new(col, row)
}

pub fn to_world_pos(config: &ArenaConfig, coord: GridCoord) -> WorldPos {
    WorldPos::new(f64::from(coord.col) * config.tile_size, f64::from(coord.row) * config.tile_size)
}

/// Every cell overlapped by an agent whose top-left corner is at `pos`.
/// The far edge is exclusive, so a footprint ending exactly on a cell
/// boundary does not spill into the next cell.
pub fn footprint_cells(config: &ArenaConfig, pos: WorldPos) -> Vec<GridCoord> {
    let first_col = (pos.x / config.tile_size).floor() as i32;
    let first_row = (pos.y / config.tile_size).floor() as i32;
    let last_col = ((pos.x + config.agent_size) / config.tile_size).ceil() as i32 - 1;
    let last_row = ((pos.y + config.agent_size) / config.tile_size).ceil() as i32 - 1;

    let mut cells = Vec::with_capacity(4);
    for row in first_row..=last_row.max(first_row) {
        for col in first_col..=last_col.max(first_col) {
            cells.push(GridCoord::new(col, row));
        }
    }
    cells
}

pub fn is_passable_footprint(grid: &Grid, config: &ArenaConfig, pos: WorldPos) -> bool {
    footprint_cells(config, pos).into_iter().all(|cell| grid.is_passable(cell))
}
