//! Tuning constants: grid size, pacing, carry limits, prices, XP awards.
//!
//! Plain consts with no engine dependency. Both the native engine and the
//! headless simtest read these.

/// Shop grid dimensions in tiles (width, height).
pub const SHOP_GRID: (i32, i32) = (20, 12);

/// Day/night pacing (simulation seconds).
pub mod phase {
    pub const DAY_DURATION_SECONDS: f64 = 300.0;
    pub const NIGHT_DURATION_SECONDS: f64 = 60.0;
}

/// Largest delta time a single tick will advance; longer stalls are clamped
/// rather than replayed.
pub const MAX_TICK_DELTA: f32 = 0.25;

/// Fixed scenario seed for a fresh session.
pub const DEFAULT_SEED: u64 = 1337;

pub const START_MONEY: i64 = 1400;
pub const START_DAY: u32 = 1;
pub const START_PACKS: u32 = 3;

/// Customer pacing and safety caps.
pub mod customers {
    /// Spawn interval ramps from START down to MIN over RAMP_DAYS.
    pub const SPAWN_INTERVAL_START: f64 = 7.0;
    pub const SPAWN_INTERVAL_MIN: f64 = 4.2;
    pub const SPAWN_RAMP_DAYS: u32 = 14;

    /// Hard caps keeping per-tick work bounded.
    pub const MAX_ACTIVE: usize = 10;
    pub const MAX_SPAWNED_PER_DAY: usize = 14;
    pub const MAX_SPAWNS_PER_TICK: usize = 1;

    /// If at cap or no shelf exists, push the next attempt by this much.
    pub const SPAWN_RETRY_DELAY: f64 = 0.75;

    pub const SPEED_TILES_PER_S: f32 = 1.4;
    pub const BROWSE_TIME_RANGE: (f32, f32) = (0.6, 1.4);
    pub const PAY_TIME_RANGE: (f32, f32) = (0.25, 0.7);
}

/// Staff agent movement, scanning, and carry capacity.
pub mod staff {
    pub const SPEED_TILES_PER_S: f32 = 4.0;
    /// Idle shelf-scan throttle; zeroed by shelf-change notifications.
    pub const SCAN_COOLDOWN: f32 = 0.8;
    /// Dwell at the shelf while stocking.
    pub const STOCK_TIME: f32 = 0.8;

    /// Carry buffer limits, filled at the counter.
    pub const CARRY_MAX_BOOSTERS: u32 = 8;
    pub const CARRY_MAX_DECKS: u32 = 4;
    /// Total singles across all rarities.
    pub const CARRY_MAX_SINGLES: u32 = 10;
}

/// Wholesale ordering.
pub mod orders {
    /// Seconds between placing an order and its delivery.
    pub const LEAD_TIME_SECONDS: f64 = 30.0;
}

/// Staff progression XP awards.
pub mod staff_xp {
    pub const XP_PER_SALE_DOLLAR: f32 = 2.0;
    pub const XP_PER_RESTOCK_ITEM: f32 = 3.0;
    pub const XP_PER_PACK_OPENED: u32 = 12;
    /// XP per level; staff level is derived from total XP.
    pub const XP_PER_LEVEL: u32 = 100;
}

/// Sell-back factor (below 1.0 so buy->sell loops cannot profit).
pub const SELLBACK_FACTOR: f32 = 0.6;

/// Forecast defaults.
pub mod forecast {
    pub const WINDOW_DAYS: u32 = 3;
    pub const MAX_SUGGESTIONS: usize = 4;
    pub const MAX_STOCKOUT_SHELVES: usize = 5;
}

/// Cap on persisted analytics event-log entries; oldest drop first.
pub const MAX_EVENT_LOG: usize = 400;
