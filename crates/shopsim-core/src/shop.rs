//! Shop layout: placed fixtures, per-shelf stock, and owned fixtures.
//!
//! The layout is an engine-owned resource. Placement only succeeds on an
//! empty, in-bounds tile; placing a shelf registers an empty
//! [`ShelfStock`] under the shelf's tile key.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};

use shopsim_logic::constants::SHOP_GRID;
use shopsim_logic::economy::FixtureKind;
use shopsim_logic::grid::{Tile, WalkGrid};
use shopsim_logic::shelf::ShelfStock;

/// A placed fixture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopObject {
    pub kind: FixtureKind,
    pub tile: Tile,
}

/// Counts of owned-but-not-placed fixtures.
///
/// Placed fixtures live in [`ShopLayout::objects`]; these are extras the
/// player can still place.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct FixtureInventory {
    #[serde(default)]
    pub shelves: u32,
    #[serde(default)]
    pub counters: u32,
    #[serde(default)]
    pub posters: u32,
}

impl FixtureInventory {
    pub fn count(&self, kind: FixtureKind) -> u32 {
        match kind {
            FixtureKind::Shelf => self.shelves,
            FixtureKind::Counter => self.counters,
            FixtureKind::Poster => self.posters,
        }
    }

    pub fn add(&mut self, kind: FixtureKind, amount: u32) {
        match kind {
            FixtureKind::Shelf => self.shelves += amount,
            FixtureKind::Counter => self.counters += amount,
            FixtureKind::Poster => self.posters += amount,
        }
    }

    /// Consume one owned fixture for placement; fails when none are owned.
    pub fn consume_for_place(&mut self, kind: FixtureKind) -> bool {
        let slot = match kind {
            FixtureKind::Shelf => &mut self.shelves,
            FixtureKind::Counter => &mut self.counters,
            FixtureKind::Poster => &mut self.posters,
        };
        if *slot == 0 {
            return false;
        }
        *slot -= 1;
        true
    }
}

/// Placed objects and shelf stocks on the shop grid.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShopLayout {
    pub grid: (i32, i32),
    pub objects: Vec<ShopObject>,
    /// Stock per shelf tile; `BTreeMap` order is the deterministic
    /// tie-break for equidistant restock targets.
    pub shelf_stocks: BTreeMap<Tile, ShelfStock>,
    pub fixtures_owned: FixtureInventory,
}

impl Default for ShopLayout {
    fn default() -> Self {
        let mut layout = Self {
            grid: SHOP_GRID,
            objects: Vec::new(),
            shelf_stocks: BTreeMap::new(),
            fixtures_owned: FixtureInventory::default(),
        };
        // Every shop opens with a counter and a wall poster.
        layout.place(FixtureKind::Counter, Tile::new(10, 7));
        layout.place(FixtureKind::Poster, Tile::new(2, 1));
        layout
    }
}

impl ShopLayout {
    pub fn in_bounds(&self, tile: Tile) -> bool {
        tile.x >= 0 && tile.y >= 0 && tile.x < self.grid.0 && tile.y < self.grid.1
    }

    pub fn object_at(&self, tile: Tile) -> Option<&ShopObject> {
        self.objects.iter().find(|obj| obj.tile == tile)
    }

    /// Place a fixture. Fails on out-of-bounds or occupied tiles. Placing a
    /// shelf registers an empty stock entry.
    pub fn place(&mut self, kind: FixtureKind, tile: Tile) -> bool {
        if !self.in_bounds(tile) || self.object_at(tile).is_some() {
            return false;
        }
        self.objects.push(ShopObject { kind, tile });
        if kind == FixtureKind::Shelf {
            self.shelf_stocks.entry(tile).or_default();
        }
        true
    }

    /// Remove whatever is placed at `tile`, along with any shelf stock.
    pub fn remove_at(&mut self, tile: Tile) {
        self.objects.retain(|obj| obj.tile != tile);
        self.shelf_stocks.remove(&tile);
    }

    pub fn find_object_tile(&self, kind: FixtureKind) -> Option<Tile> {
        self.objects.iter().find(|obj| obj.kind == kind).map(|obj| obj.tile)
    }

    /// The counter customers pay at and staff pick up from.
    pub fn counter_tile(&self) -> Option<Tile> {
        self.find_object_tile(FixtureKind::Counter)
    }

    pub fn shelf_tiles(&self) -> Vec<Tile> {
        self.objects
            .iter()
            .filter(|obj| obj.kind == FixtureKind::Shelf)
            .map(|obj| obj.tile)
            .collect()
    }

    /// Entrance/exit tile on the bottom edge.
    pub fn door_tile(&self) -> Tile {
        Tile::new(1, self.grid.1 - 1)
    }

    /// Walkability view: every placed object blocks its tile.
    pub fn walk_grid(&self) -> WalkGrid {
        let blocked: HashSet<Tile> = self.objects.iter().map(|obj| obj.tile).collect();
        WalkGrid::new(self.grid, blocked)
    }

    /// Re-register missing stock entries and repair loaded ones.
    pub fn normalize(&mut self) {
        self.objects.retain(|obj| {
            obj.tile.x >= 0 && obj.tile.y >= 0 && obj.tile.x < self.grid.0 && obj.tile.y < self.grid.1
        });
        let shelf_tiles: HashSet<Tile> = self.shelf_tiles().into_iter().collect();
        self.shelf_stocks.retain(|tile, _| shelf_tiles.contains(tile));
        for tile in shelf_tiles {
            self.shelf_stocks.entry(tile).or_default();
        }
        for stock in self.shelf_stocks.values_mut() {
            stock.normalize();
        }
    }
}
