//! Save/Load for the shop simulation.
//!
//! Saves are JSON documents. Every field of [`SaveData`] defaults
//! independently, so saves written before a field existed still load; shelf
//! stocks are keyed by the serialized `"x,y"` tile key at this boundary and
//! malformed keys are dropped rather than failing the load. Corrupt
//! non-critical history (event log, analytics) is truncated, never fatal.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{Read, Write};

use shopsim_logic::analytics::AnalyticsState;
use shopsim_logic::cards::{CardCollection, Deck};
use shopsim_logic::constants::{self, phase, DEFAULT_SEED};
use shopsim_logic::grid::Tile;
use shopsim_logic::inventory::{Inventory, InventoryOrder};
use shopsim_logic::pricing::{Prices, PricingSettings};
use shopsim_logic::progression::PlayerProgression;
use shopsim_logic::shelf::ShelfStock;
use shopsim_logic::skill_tree::{SkillTreeDef, SkillTreeState};

use crate::components::{Position, StaffAgent, Vec2};
use crate::engine::{DayPhase, ShopEngine};
use crate::shop::{FixtureInventory, ShopObject};
use crate::systems::DaySpawner;

/// Save format version (increment when the format changes incompatibly).
const SAVE_VERSION: u32 = 1;

fn default_version() -> u32 {
    SAVE_VERSION
}

fn default_day() -> u32 {
    constants::START_DAY
}

fn default_money() -> i64 {
    constants::START_MONEY
}

/// Persisted staff fields; transient path/plan state is rebuilt by the next
/// idle scan.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SavedStaff {
    #[serde(default)]
    pub pos: Vec2,
    #[serde(default)]
    pub xp: u32,
    #[serde(default)]
    pub carry_boosters: u32,
    #[serde(default)]
    pub carry_decks: u32,
    #[serde(default)]
    pub carry_singles: BTreeMap<shopsim_logic::catalog::Rarity, u32>,
}

/// Serializable snapshot of the whole shop state.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SaveData {
    #[serde(default = "default_version")]
    pub version: u32,
    #[serde(default)]
    pub sim_time: f64,
    #[serde(default = "default_day")]
    pub day: u32,
    #[serde(default)]
    pub day_phase: DayPhase,
    #[serde(default)]
    pub phase_timer: f64,
    #[serde(default = "default_money")]
    pub money: i64,
    #[serde(default)]
    pub inventory: Inventory,
    #[serde(default)]
    pub pending_orders: Vec<InventoryOrder>,
    #[serde(default)]
    pub objects: Vec<ShopObject>,
    /// Shelf stocks keyed by the serialized `"x,y"` shelf key.
    #[serde(default)]
    pub shelf_stocks: BTreeMap<String, ShelfStock>,
    #[serde(default)]
    pub fixtures_owned: FixtureInventory,
    #[serde(default)]
    pub prices: Option<Prices>,
    #[serde(default)]
    pub pricing: PricingSettings,
    #[serde(default)]
    pub progression: PlayerProgression,
    #[serde(default)]
    pub skills: SkillTreeState,
    #[serde(default)]
    pub collection: CardCollection,
    #[serde(default)]
    pub deck: Deck,
    #[serde(default)]
    pub analytics: AnalyticsState,
    #[serde(default)]
    pub staff: SavedStaff,
    #[serde(default)]
    pub spawner: DaySpawner,
}

impl SaveData {
    /// Capture the engine's persistent state.
    pub fn from_engine(engine: &ShopEngine) -> Self {
        let staff = engine
            .staff_snapshot()
            .map(|snapshot| (snapshot.pos, snapshot.xp))
            .unwrap_or((Vec2::ZERO, 0));
        let carry = engine
            .world
            .query_one::<&StaffAgent>(engine.staff)
            .ok()
            .and_then(|mut query| {
                query.get().map(|agent| {
                    (agent.carry_boosters, agent.carry_decks, agent.carry_singles.clone())
                })
            })
            .unwrap_or_default();
        Self {
            version: SAVE_VERSION,
            sim_time: engine.sim_time,
            day: engine.day,
            day_phase: engine.day_phase,
            phase_timer: engine.phase_timer,
            money: engine.money,
            inventory: engine.inventory.clone(),
            pending_orders: engine.pending_orders.clone(),
            objects: engine.layout.objects.clone(),
            shelf_stocks: engine
                .layout
                .shelf_stocks
                .iter()
                .map(|(tile, stock)| (tile.key(), stock.clone()))
                .collect(),
            fixtures_owned: engine.layout.fixtures_owned,
            prices: Some(engine.prices.clone()),
            pricing: engine.pricing.clone(),
            progression: engine.progression.clone(),
            skills: engine.skills.clone(),
            collection: engine.collection.clone(),
            deck: engine.deck.clone(),
            analytics: engine.analytics.clone(),
            staff: SavedStaff {
                pos: staff.0,
                xp: staff.1,
                carry_boosters: carry.0,
                carry_decks: carry.1,
                carry_singles: carry.2,
            },
            spawner: engine.spawner.clone(),
        }
    }

    /// Rebuild an engine, normalizing anything out of range.
    pub fn into_engine(mut self, skill_tree: SkillTreeDef) -> ShopEngine {
        let mut engine = ShopEngine::with_seed(skill_tree, DEFAULT_SEED);
        engine.sim_time = self.sim_time.max(0.0);
        engine.day = self.day.max(1);
        engine.day_phase = self.day_phase;
        engine.phase_timer = self.phase_timer.max(0.0);
        engine.money = self.money;
        engine.inventory = self.inventory;
        engine.pending_orders = self.pending_orders;

        engine.layout.objects = self.objects;
        engine.layout.shelf_stocks = self
            .shelf_stocks
            .into_iter()
            .filter_map(|(key, stock)| Tile::parse_key(&key).map(|tile| (tile, stock)))
            .collect();
        engine.layout.fixtures_owned = self.fixtures_owned;
        engine.layout.normalize();

        engine.prices = self.prices.unwrap_or_default();
        engine.pricing = self.pricing;
        self.progression.normalize();
        engine.progression = self.progression;
        self.skills.invalidate();
        engine.skills = self.skills;
        engine.collection = self.collection;
        engine.deck = self.deck;
        self.analytics.normalize();
        engine.analytics = self.analytics;

        engine.spawner = if self.spawner.schedule.is_empty() {
            DaySpawner::for_day(engine.day, phase::DAY_DURATION_SECONDS)
        } else {
            self.spawner
        };

        // Recreate the staff entity with the persisted bits; plan/path
        // state rebuilds on the next idle scan.
        let agent = StaffAgent {
            xp: self.staff.xp,
            carry_boosters: self.staff.carry_boosters,
            carry_decks: self.staff.carry_decks,
            carry_singles: self.staff.carry_singles,
            ..StaffAgent::default()
        };
        let pos = if self.staff.pos == Vec2::ZERO {
            Vec2::from_tile(engine.layout.door_tile())
        } else {
            self.staff.pos
        };
        engine.world = hecs::World::new();
        engine.staff = engine.world.spawn((Position(pos), agent));
        engine
    }
}

/// Errors that can occur during save/load.
#[derive(Debug)]
pub enum SaveError {
    Io(std::io::Error),
    Json(serde_json::Error),
    VersionMismatch { expected: u32, found: u32 },
}

impl From<std::io::Error> for SaveError {
    fn from(e: std::io::Error) -> Self {
        SaveError::Io(e)
    }
}

impl From<serde_json::Error> for SaveError {
    fn from(e: serde_json::Error) -> Self {
        SaveError::Json(e)
    }
}

impl std::fmt::Display for SaveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SaveError::Io(e) => write!(f, "IO error: {e}"),
            SaveError::Json(e) => write!(f, "Serialization error: {e}"),
            SaveError::VersionMismatch { expected, found } => {
                write!(f, "Save version mismatch: expected {expected}, found {found}")
            }
        }
    }
}

impl std::error::Error for SaveError {}

/// Save the complete simulation to a writer as pretty JSON.
pub fn save_simulation<W: Write>(writer: W, engine: &ShopEngine) -> Result<(), SaveError> {
    let data = SaveData::from_engine(engine);
    serde_json::to_writer_pretty(writer, &data)?;
    Ok(())
}

/// Load a simulation from a reader.
pub fn load_simulation<R: Read>(reader: R, skill_tree: SkillTreeDef) -> Result<ShopEngine, SaveError> {
    let data: SaveData = serde_json::from_reader(reader)?;
    if data.version > SAVE_VERSION {
        return Err(SaveError::VersionMismatch {
            expected: SAVE_VERSION,
            found: data.version,
        });
    }
    Ok(data.into_engine(skill_tree))
}

impl ShopEngine {
    /// Save simulation state to a writer.
    pub fn save<W: Write>(&self, writer: W) -> Result<(), SaveError> {
        save_simulation(writer, self)
    }

    /// Load simulation state from a reader, replacing this engine.
    pub fn load<R: Read>(&mut self, reader: R) -> Result<(), SaveError> {
        let loaded = load_simulation(reader, self.skill_tree.clone())?;
        *self = loaded;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopsim_logic::catalog::{Product, Rarity};
    use shopsim_logic::economy::FixtureKind;
    use shopsim_logic::skill_tree::default_skill_tree;

    fn populated_engine() -> ShopEngine {
        let mut engine = ShopEngine::with_seed(default_skill_tree(), 11);
        engine.inventory.add(Product::Booster, 8);
        engine.inventory.add(Product::Single(Rarity::Rare), 3);
        engine.layout.place(FixtureKind::Shelf, Tile::new(2, 2));
        engine.stock_shelf(Tile::new(2, 2), Product::Booster, 4);
        engine.place_order(Product::Deck, 2);
        engine.progression.skill_points = 2;
        engine.rank_up("haggle");
        engine.collection.add("c1", 3);
        engine.deck_add_card("c1");
        for _ in 0..120 {
            engine.update(0.1);
        }
        engine
    }

    #[test]
    fn save_load_roundtrip() {
        let engine = populated_engine();
        let mut buffer = Vec::new();
        engine.save(&mut buffer).expect("save failed");

        let loaded = load_simulation(&buffer[..], default_skill_tree()).expect("load failed");
        assert_eq!(loaded.money(), engine.money());
        assert_eq!(loaded.day(), engine.day());
        assert!((loaded.sim_time() - engine.sim_time()).abs() < 1e-9);
        assert_eq!(loaded.inventory().booster_packs, engine.inventory().booster_packs);
        assert_eq!(loaded.pending_orders().len(), engine.pending_orders().len());
        assert_eq!(
            loaded.shelf_stock(Tile::new(2, 2)).map(|s| s.qty),
            engine.shelf_stock(Tile::new(2, 2)).map(|s| s.qty)
        );
        assert_eq!(loaded.skills().rank("haggle"), 1);
        assert_eq!(loaded.collection().get("c1"), 3);
        assert_eq!(loaded.deck().committed("c1"), 1);
        assert_eq!(
            loaded.staff_snapshot().unwrap().xp,
            engine.staff_snapshot().unwrap().xp
        );
    }

    #[test]
    fn shelf_keys_round_trip_exactly() {
        let engine = populated_engine();
        let data = SaveData::from_engine(&engine);
        assert!(data.shelf_stocks.contains_key("2,2"));
        let loaded = data.into_engine(default_skill_tree());
        assert!(loaded.shelf_stock(Tile::new(2, 2)).is_some());
    }

    #[test]
    fn empty_document_loads_with_defaults() {
        // A save missing every newer field still loads.
        let loaded = load_simulation("{}".as_bytes(), default_skill_tree()).expect("defaults");
        assert_eq!(loaded.money(), constants::START_MONEY);
        assert_eq!(loaded.day(), 1);
        assert_eq!(loaded.progression().level, 1);
        assert!(loaded.staff_snapshot().is_some());
    }

    #[test]
    fn malformed_shelf_keys_are_dropped() {
        let json = r#"{
            "shelf_stocks": {
                "2,2": {"product": "booster", "qty": 3, "max_qty": 10, "cards": []},
                "not-a-key": {"product": "deck", "qty": 1, "max_qty": 10, "cards": []}
            },
            "objects": [{"kind": "shelf", "tile": {"x": 2, "y": 2}}]
        }"#;
        let loaded = load_simulation(json.as_bytes(), default_skill_tree()).expect("load");
        assert_eq!(loaded.layout().shelf_stocks.len(), 1);
        assert_eq!(loaded.shelf_stock(Tile::new(2, 2)).unwrap().qty, 3);
    }

    #[test]
    fn damaged_values_normalize_on_load() {
        let json = format!(
            r#"{{
                "progression": {{"level": 999999, "xp": 5, "skill_points": 3}},
                "analytics": {{"days": {{}}, "event_log": [{}], "max_events": 2}}
            }}"#,
            (0..6)
                .map(|i| format!(r#"{{"day":1,"t":{i},"kind":"x","message":"{i}"}}"#))
                .collect::<Vec<_>>()
                .join(",")
        );
        let loaded = load_simulation(json.as_bytes(), default_skill_tree()).expect("load");
        assert_eq!(loaded.progression().level, shopsim_logic::progression::MAX_LEVEL);
        assert_eq!(loaded.progression().xp, 0);
        assert_eq!(loaded.analytics().event_log.len(), 2);
        assert_eq!(loaded.analytics().event_log[0].message, "4");
    }

    #[test]
    fn newer_version_is_rejected() {
        let json = r#"{"version": 99}"#;
        match load_simulation(json.as_bytes(), default_skill_tree()) {
            Err(SaveError::VersionMismatch { expected, found }) => {
                assert_eq!(expected, SAVE_VERSION);
                assert_eq!(found, 99);
            }
            other => panic!("expected version mismatch, got {:?}", other.map(|_| ())),
        }
    }

    #[test]
    fn loaded_engine_keeps_simulating() {
        let engine = populated_engine();
        let mut buffer = Vec::new();
        engine.save(&mut buffer).unwrap();
        let mut loaded = load_simulation(&buffer[..], default_skill_tree()).unwrap();
        for _ in 0..200 {
            loaded.update(0.1);
        }
        // Invariants hold after resume.
        for stock in loaded.layout().shelf_stocks.values() {
            assert!(stock.qty <= stock.max_qty);
            if !stock.cards.is_empty() {
                assert_eq!(stock.qty as usize, stock.cards.len());
            }
        }
    }
}
