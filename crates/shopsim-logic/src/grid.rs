//! Tile coordinates, shelf keys, adjacency, and walkability.
//!
//! Shelf stocks are keyed by [`Tile`] internally; the string form `"x,y"`
//! exists only at the save-file boundary via [`Tile::key`] / [`Tile::parse_key`]
//! and must round-trip exactly.

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// A tile coordinate on the shop grid.
///
/// Ordered by x then y, which matches the serialized key order and gives
/// deterministic iteration when used as a `BTreeMap` key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Tile {
    pub x: i32,
    pub y: i32,
}

impl Tile {
    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Serialized shelf key, e.g. `"4,7"`.
    pub fn key(&self) -> String {
        format!("{},{}", self.x, self.y)
    }

    /// Parse a `"x,y"` shelf key. Returns `None` for malformed keys.
    pub fn parse_key(key: &str) -> Option<Self> {
        let (x, y) = key.split_once(',')?;
        Some(Self {
            x: x.trim().parse().ok()?,
            y: y.trim().parse().ok()?,
        })
    }

    pub fn manhattan(&self, other: Tile) -> i32 {
        (self.x - other.x).abs() + (self.y - other.y).abs()
    }

    /// Center of this tile in continuous tile-space.
    pub fn center(&self) -> (f32, f32) {
        (self.x as f32 + 0.5, self.y as f32 + 0.5)
    }

    /// The four orthogonal neighbors.
    pub fn neighbors(&self) -> [Tile; 4] {
        [
            Tile::new(self.x + 1, self.y),
            Tile::new(self.x - 1, self.y),
            Tile::new(self.x, self.y + 1),
            Tile::new(self.x, self.y - 1),
        ]
    }
}

impl fmt::Display for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

/// Grid bounds plus the set of tiles occupied by placed objects.
#[derive(Debug, Clone)]
pub struct WalkGrid {
    pub width: i32,
    pub height: i32,
    pub blocked: HashSet<Tile>,
}

impl WalkGrid {
    pub fn new(size: (i32, i32), blocked: HashSet<Tile>) -> Self {
        Self {
            width: size.0,
            height: size.1,
            blocked,
        }
    }

    pub fn in_bounds(&self, tile: Tile) -> bool {
        tile.x >= 0 && tile.y >= 0 && tile.x < self.width && tile.y < self.height
    }

    pub fn is_walkable(&self, tile: Tile) -> bool {
        self.in_bounds(tile) && !self.blocked.contains(&tile)
    }

    /// Walkable tiles orthogonally adjacent to `tile` (the tile itself may be
    /// blocked; shelves are approached from beside, not stood on).
    pub fn adjacent_walk_tiles(&self, tile: Tile) -> Vec<Tile> {
        tile.neighbors()
            .into_iter()
            .filter(|t| self.is_walkable(*t))
            .collect()
    }
}
