//! Components attached to agent entities.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use shopsim_logic::catalog::{Product, Rarity};
use shopsim_logic::constants::staff;
use shopsim_logic::grid::Tile;

/// 2D position in continuous tile space: (10.5, 7.5) is the center of tile
/// (10, 7).
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Vec2 {
    pub x: f32,
    pub y: f32,
}

impl Vec2 {
    pub const ZERO: Self = Self { x: 0.0, y: 0.0 };

    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    /// Center of a tile.
    pub fn from_tile(tile: Tile) -> Self {
        let (x, y) = tile.center();
        Self { x, y }
    }

    /// The tile this position falls inside.
    pub fn tile(&self) -> Tile {
        Tile::new(self.x.floor() as i32, self.y.floor() as i32)
    }

    pub fn distance_squared(&self, other: Vec2) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        dx * dx + dy * dy
    }

    /// Step toward `target` by at most `step`, landing exactly on it when
    /// within reach (avoids drift accumulation).
    pub fn step_toward(&self, target: Vec2, step: f32) -> Vec2 {
        let dx = target.x - self.x;
        let dy = target.y - self.y;
        let dist = (dx * dx + dy * dy).sqrt();
        if dist <= step || dist == 0.0 {
            target
        } else {
            Vec2::new(self.x + dx / dist * step, self.y + dy / dist * step)
        }
    }
}

/// Spatial position component.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct Position(pub Vec2);

/// A staff agent's chosen restock intent for its next pickup/deliver cycle.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RestockPlan {
    pub shelf: Tile,
    pub product: Product,
    /// Capacity deficit at planning time.
    pub amount: u32,
    /// The card to relist, for listed-card shelves.
    pub card_id: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffState {
    #[default]
    Idle,
    Moving,
    Stocking,
}

/// What the current `Moving` leg is for.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StaffTask {
    #[default]
    None,
    Pickup,
    Deliver,
}

/// The roaming staff agent. Created once at shop initialization and mutated
/// every tick; never destroyed during a session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StaffAgent {
    pub state: StaffState,
    pub task: StaffTask,
    pub target_tile: Option<Tile>,
    /// Remaining waypoints, consumed front-to-back.
    pub path: Vec<Tile>,
    pub plan: Option<RestockPlan>,
    pub speed_tiles_per_s: f32,
    /// Idle shelf-scan throttle; zeroed by shelf-change notifications.
    pub scan_cooldown: f32,
    pub stock_timer: f32,
    /// Set by `notify_shelf_change`; checked before the full scan.
    pub priority_shelf: Option<Tile>,
    /// Mobile carry buffer, filled at the counter.
    pub carry_boosters: u32,
    pub carry_decks: u32,
    pub carry_singles: BTreeMap<Rarity, u32>,
    pub xp: u32,
}

impl Default for StaffAgent {
    fn default() -> Self {
        Self {
            state: StaffState::Idle,
            task: StaffTask::None,
            target_tile: None,
            path: Vec::new(),
            plan: None,
            speed_tiles_per_s: staff::SPEED_TILES_PER_S,
            scan_cooldown: 0.4,
            stock_timer: 0.0,
            priority_shelf: None,
            carry_boosters: 0,
            carry_decks: 0,
            carry_singles: BTreeMap::new(),
            xp: 0,
        }
    }
}

impl StaffAgent {
    /// Units of `product` currently carried.
    pub fn carried(&self, product: Product) -> u32 {
        match product {
            Product::Booster => self.carry_boosters,
            Product::Deck => self.carry_decks,
            Product::Single(rarity) => self.carry_singles.get(&rarity).copied().unwrap_or(0),
        }
    }

    pub fn carried_singles_total(&self) -> u32 {
        self.carry_singles.values().sum()
    }

    /// Remove carried units for delivery; returns the units actually taken.
    pub fn take_carried(&mut self, product: Product, amount: u32) -> u32 {
        let take = amount.min(self.carried(product));
        if take == 0 {
            return 0;
        }
        match product {
            Product::Booster => self.carry_boosters -= take,
            Product::Deck => self.carry_decks -= take,
            Product::Single(rarity) => {
                if let Some(count) = self.carry_singles.get_mut(&rarity) {
                    *count -= take;
                    if *count == 0 {
                        self.carry_singles.remove(&rarity);
                    }
                }
            }
        }
        take
    }

    pub fn level(&self) -> u32 {
        shopsim_logic::staff_xp::staff_level_from_xp(self.xp)
    }

    /// Drop the in-flight plan and return to idle.
    pub fn clear_plan(&mut self) {
        self.plan = None;
        self.task = StaffTask::None;
        self.target_tile = None;
        self.path.clear();
        self.state = StaffState::Idle;
        self.stock_timer = 0.0;
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerState {
    #[default]
    ToShelf,
    ToCounter,
    Paying,
    Exit,
}

/// One browsing customer. Spawned by the scheduler, despawned once `done`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomerAgent {
    pub state: CustomerState,
    pub target: Vec2,
    /// Chosen purchase: which shelf and what product, if anything.
    pub purchase: Option<(Tile, Product)>,
    /// Browse/pay dwell countdown; movement is fully gated while positive.
    pub wait_s: f32,
    pub speed_tiles_per_s: f32,
    pub done: bool,
}

impl CustomerAgent {
    pub fn new(target: Vec2) -> Self {
        Self {
            state: CustomerState::ToShelf,
            target,
            purchase: None,
            wait_s: 0.0,
            speed_tiles_per_s: shopsim_logic::constants::customers::SPEED_TILES_PER_S,
            done: false,
        }
    }
}
