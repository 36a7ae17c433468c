//! Value types shared by every spatial query.
//! This module exists so coordinates, identities and tile classes have one definition.
//! It does not own grid storage or any search policy.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct AgentId(pub u64);

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ExplosiveId(pub u64);

/// Integer cell index. Field order makes the derived ordering row-major.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridCoord {
    pub row: i32,
    pub col: i32,
}

impl GridCoord {
    pub const fn new(col: i32, row: i32) -> Self {
        Self { row, col }
    }

    /// Saturates at the `i32` limits, which always lie outside any grid.
    pub fn offset(self, direction: Direction, steps: i32) -> Self {
        let (dc, dr) = direction.delta();
        Self {
            row: self.row.saturating_add(dr.saturating_mul(steps)),
            col: self.col.saturating_add(dc.saturating_mul(steps)),
        }
    }

    pub fn neighbors(self) -> [GridCoord; 4] {
        Direction::ALL.map(|direction| self.offset(direction, 1))
    }
}

pub fn manhattan(a: GridCoord, b: GridCoord) -> u32 {
    a.col.abs_diff(b.col) + a.row.abs_diff(b.row)
}

pub fn chebyshev(a: GridCoord, b: GridCoord) -> u32 {
    a.col.abs_diff(b.col).max(a.row.abs_diff(b.row))
}

/// Continuous pixel-space position of an agent's top-left corner.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct WorldPos {
    pub x: f64,
    pub y: f64,
}

impl WorldPos {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Direction {
    Up,
    Right,
    Down,
    Left,
}

impl Direction {
    pub const ALL: [Direction; 4] = [Direction::Up, Direction::Right, Direction::Down, Direction::Left];

    /// `(column delta, row delta)` of a single step.
    pub const fn delta(self) -> (i32, i32) {
        match self {
            Direction::Up => (0, -1),
            Direction::Right => (1, 0),
            Direction::Down => (0, 1),
            Direction::Left => (-1, 0),
        }
    }

    /// Direction of a straight move from `from` to `to`, if they share a row or column.
    pub fn between(from: GridCoord, to: GridCoord) -> Option<Direction> {
        match (to.col.cmp(&from.col), to.row.cmp(&from.row)) {
            (Ordering::Greater, Ordering::Equal) => Some(Direction::Right),
            (Ordering::Less, Ordering::Equal) => Some(Direction::Left),
            (Ordering::Equal, Ordering::Greater) => Some(Direction::Down),
            (Ordering::Equal, Ordering::Less) => Some(Direction::Up),
            _ => None,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ItemKind {
    ExtraBomb,
    BlastRange,
    Speed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TileKind {
    Empty,
    Wall,
    Obstacle,
    Item(ItemKind),
}

impl TileKind {
    pub const fn is_passable(self) -> bool {
        matches!(self, TileKind::Empty | TileKind::Item(_))
    }

    pub const fn glyph(self) -> char {
        match self {
            TileKind::Empty => '.',
            TileKind::Wall => 'W',
            TileKind::Obstacle => 'C',
            TileKind::Item(ItemKind::ExtraBomb) => 'B',
            TileKind::Item(ItemKind::BlastRange) => 'R',
            TileKind::Item(ItemKind::Speed) => 'S',
        }
    }

    pub const fn from_glyph(glyph: char) -> Option<TileKind> {
        match glyph {
            '.' => Some(TileKind::Empty),
            'W' => Some(TileKind::Wall),
            'C' => Some(TileKind::Obstacle),
            'B' => Some(TileKind::Item(ItemKind::ExtraBomb)),
            'R' => Some(TileKind::Item(ItemKind::BlastRange)),
            'S' => Some(TileKind::Item(ItemKind::Speed)),
            _ => None,
        }
    }
}
