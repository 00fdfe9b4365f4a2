//! Shop engine - the tick loop and the single owner of all shop state.
//!
//! Per tick, in order: pending-order delivery, day/night phase advance,
//! staff update, customer update. Every stage sees the same post-delivery
//! shelf/inventory snapshot, so no agent ever observes a half-applied
//! delivery. Player actions arrive between ticks through the mutator
//! methods below and funnel through the same mutation contracts.

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use shopsim_logic::analytics::AnalyticsState;
use shopsim_logic::cards::{card_def, open_booster, CardCollection, Deck};
use shopsim_logic::catalog::Product;
use shopsim_logic::constants::{
    self, orders, phase, DEFAULT_SEED, MAX_TICK_DELTA, SHOP_GRID, START_MONEY, START_PACKS,
};
use shopsim_logic::economy::{fixture_cost, xp_from_sale, xp_from_sellback, FixtureKind};
use shopsim_logic::forecast::{compute_restock_suggestions, top_stockout_shelves, RestockSuggestion};
use shopsim_logic::grid::Tile;
use shopsim_logic::inventory::{Inventory, InventoryOrder};
use shopsim_logic::pricing::{
    effective_sale_price, market_buy_price, sellback_total, wholesale_order_total, Prices,
    PricingMode, PricingSettings,
};
use shopsim_logic::progression::PlayerProgression;
use shopsim_logic::shelf::ShelfStock;
use shopsim_logic::skill_tree::{Modifiers, SkillTreeDef, SkillTreeState};
use shopsim_logic::staff_xp::{award_staff_xp, StaffXpEvent};

use crate::components::{
    CustomerAgent, CustomerState, Position, StaffAgent, StaffState, StaffTask, Vec2,
};
use crate::shop::ShopLayout;
use crate::systems::{
    update_customers, update_staff, CustomerContext, DaySpawner, PurchaseEvent, StaffContext,
};

/// Day/night cycle phase.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DayPhase {
    #[default]
    Day,
    Night,
}

/// Read-only staff view for rendering.
#[derive(Debug, Clone)]
pub struct StaffSnapshot {
    pub pos: Vec2,
    pub state: StaffState,
    pub task: StaffTask,
    pub target_tile: Option<Tile>,
    pub path: Vec<Tile>,
    pub xp: u32,
    pub level: u32,
}

/// Read-only customer view for rendering.
#[derive(Debug, Clone, Copy)]
pub struct CustomerSnapshot {
    pub pos: Vec2,
    pub state: CustomerState,
}

/// The simulation engine. Owns every mutable piece of shop state;
/// collaborators (rendering, UI) interact only through methods.
pub struct ShopEngine {
    pub(crate) world: World,
    pub(crate) staff: Entity,
    pub(crate) sim_time: f64,
    pub(crate) day: u32,
    pub(crate) day_phase: DayPhase,
    pub(crate) phase_timer: f64,
    pub(crate) paused: bool,
    pub(crate) money: i64,
    pub(crate) layout: ShopLayout,
    pub(crate) inventory: Inventory,
    pub(crate) pending_orders: Vec<InventoryOrder>,
    pub(crate) prices: Prices,
    pub(crate) pricing: PricingSettings,
    pub(crate) progression: PlayerProgression,
    pub(crate) skills: SkillTreeState,
    pub(crate) skill_tree: SkillTreeDef,
    pub(crate) collection: CardCollection,
    pub(crate) deck: Deck,
    pub(crate) analytics: AnalyticsState,
    pub(crate) spawner: DaySpawner,
    pub(crate) rng: StdRng,
}

impl ShopEngine {
    /// Fresh shop with the fixed scenario seed.
    pub fn new(skill_tree: SkillTreeDef) -> Self {
        Self::with_seed(skill_tree, DEFAULT_SEED)
    }

    pub fn with_seed(skill_tree: SkillTreeDef, seed: u64) -> Self {
        let mut world = World::new();
        let layout = ShopLayout::default();
        let staff_start = Vec2::from_tile(layout.door_tile());
        let staff = world.spawn((Position(staff_start), StaffAgent::default()));
        let mut inventory = Inventory::default();
        inventory.add(Product::Booster, START_PACKS);
        Self {
            world,
            staff,
            sim_time: 0.0,
            day: constants::START_DAY,
            day_phase: DayPhase::Day,
            phase_timer: 0.0,
            paused: false,
            money: START_MONEY,
            layout,
            inventory,
            pending_orders: Vec::new(),
            prices: Prices::default(),
            pricing: PricingSettings::default(),
            progression: PlayerProgression::default(),
            skills: SkillTreeState::default(),
            skill_tree,
            collection: CardCollection::default(),
            deck: Deck::default(),
            analytics: AnalyticsState::default(),
            spawner: DaySpawner::for_day(constants::START_DAY, phase::DAY_DURATION_SECONDS),
            rng: StdRng::seed_from_u64(seed),
        }
    }

    // ── Tick loop ───────────────────────────────────────────────────────

    /// Advance the simulation by `delta_seconds`, clamped to avoid
    /// unbounded catch-up after a stall. A paused engine does not advance.
    pub fn update(&mut self, delta_seconds: f32) {
        if self.paused {
            return;
        }
        let dt = delta_seconds.clamp(0.0, MAX_TICK_DELTA);
        if dt <= 0.0 {
            return;
        }
        self.sim_time += dt as f64;
        self.deliver_due_orders();
        self.advance_phase(dt as f64);
        self.tick_staff(dt);
        self.tick_customers(dt);
    }

    /// Freeze the simulation clock; agents stay exactly where they are and
    /// keep their paths and plans.
    pub fn pause(&mut self) {
        self.paused = true;
    }

    pub fn resume(&mut self) {
        self.paused = false;
    }

    pub fn is_paused(&self) -> bool {
        self.paused
    }

    fn deliver_due_orders(&mut self) {
        if self.pending_orders.is_empty() {
            return;
        }
        let now = self.sim_time;
        let mut due = Vec::new();
        self.pending_orders.retain(|order| {
            if order.deliver_at <= now {
                due.push(order.clone());
                false
            } else {
                true
            }
        });
        for order in due {
            self.inventory.apply_order(&order);
            for (product, qty) in order.lines() {
                self.analytics.record_order_delivered(self.day, product, qty);
            }
            self.analytics.log(
                self.day,
                self.sim_time,
                "order",
                format!("Order delivered: {} units", order.total_units()),
            );
            log::info!("order delivered: {} units", order.total_units());
        }
    }

    fn advance_phase(&mut self, dt: f64) {
        self.phase_timer += dt;
        match self.day_phase {
            DayPhase::Day => {
                if self.phase_timer >= phase::DAY_DURATION_SECONDS {
                    self.day_phase = DayPhase::Night;
                    self.phase_timer = 0.0;
                    log::info!("day {} closing", self.day);
                }
            }
            DayPhase::Night => {
                if self.phase_timer >= phase::NIGHT_DURATION_SECONDS {
                    self.day += 1;
                    self.day_phase = DayPhase::Day;
                    self.phase_timer = 0.0;
                    self.spawner = DaySpawner::for_day(self.day, phase::DAY_DURATION_SECONDS);
                    self.analytics
                        .log(self.day, self.sim_time, "day", format!("Day {} opens", self.day));
                    log::info!("day {} opens", self.day);
                }
            }
        }
    }

    fn tick_staff(&mut self, dt: f32) {
        let mut ctx = StaffContext {
            layout: &mut self.layout,
            inventory: &mut self.inventory,
            collection: &mut self.collection,
            deck: &self.deck,
        };
        let Ok((pos, agent)) = self
            .world
            .query_one_mut::<(&mut Position, &mut StaffAgent)>(self.staff)
        else {
            return;
        };
        if let Some(report) = update_staff(pos, agent, dt, &mut ctx) {
            self.analytics.record_restock(self.day, report.product, report.qty);
            self.analytics.log(
                self.day,
                self.sim_time,
                "restock",
                format!("Staff restocked {} x{} at {}", report.product, report.qty, report.shelf),
            );
            log::debug!("staff restocked {} x{}", report.product, report.qty);
        }
    }

    fn tick_customers(&mut self, dt: f32) {
        if self.day_phase == DayPhase::Day {
            let active = self.active_customers();
            let can_spawn = !self.layout.shelf_tiles().is_empty();
            let due = self.spawner.due_spawns(self.phase_timer, active, can_spawn);
            for _ in 0..due {
                self.spawn_customer();
            }
        }

        let mods = self.skills.modifiers(&self.skill_tree);
        let events = {
            let ctx = CustomerContext {
                layout: &self.layout,
                prices: &self.prices,
                pricing: &self.pricing,
                mods,
            };
            update_customers(&mut self.world, dt, &ctx, &mut self.rng)
        };
        for event in events {
            self.apply_sale(event);
        }

        let finished: Vec<Entity> = self
            .world
            .query::<&CustomerAgent>()
            .iter()
            .filter(|(_, agent)| agent.done)
            .map(|(entity, _)| entity)
            .collect();
        for entity in finished {
            let _ = self.world.despawn(entity);
        }
    }

    fn spawn_customer(&mut self) {
        let shelves = self.layout.shelf_tiles();
        let Some(&shelf) = shelves.get(self.rng.gen_range(0..shelves.len().max(1))) else {
            return;
        };
        let entrance = Vec2::new(1.5, SHOP_GRID.1 as f32 - 1.0);
        self.world
            .spawn((Position(entrance), CustomerAgent::new(Vec2::from_tile(shelf))));
        self.analytics.record_visitor(self.day);
        log::debug!("customer spawned, heading to {shelf}");
    }

    /// Sell one unit off a shelf at the till (UI-driven sale path). Returns
    /// the revenue, or `None` when the shelf has nothing to sell.
    pub fn sell_from_shelf(&mut self, tile: Tile) -> Option<u32> {
        self.apply_sale(PurchaseEvent {
            shelf: tile,
            product: self.layout.shelf_stocks.get(&tile)?.product?,
        })
    }

    /// Complete a purchase against the shared ledger: shelf decrement,
    /// revenue, analytics, player XP, staff XP, and the staff reaction
    /// notification. Returns the revenue.
    fn apply_sale(&mut self, event: PurchaseEvent) -> Option<u32> {
        let mods = self.skills.modifiers(&self.skill_tree);
        let stock = self.layout.shelf_stocks.get_mut(&event.shelf)?;
        let outcome = stock.sell_unit(&mut self.rng)?;
        // Charge the same effective price the weighting used.
        let price = effective_sale_price(&self.prices, &self.pricing, outcome.product, &mods);
        self.money += price as i64;
        self.analytics.record_sale(
            self.day,
            outcome.product,
            price as i64,
            Some(&event.shelf.key()),
            outcome.became_empty,
        );
        self.analytics.log(
            self.day,
            self.sim_time,
            "sale",
            format!("Sold {} for ${price}", outcome.product),
        );
        self.progression.add_xp(xp_from_sale(price, &mods));
        if let Ok(agent) = self.world.query_one_mut::<&mut StaffAgent>(self.staff) {
            agent.xp = award_staff_xp(agent.xp, StaffXpEvent::Sale, price, Some(outcome.product)).new_xp;
            agent.priority_shelf = Some(event.shelf);
            agent.scan_cooldown = 0.0;
        }
        log::debug!("sale: {} for ${price}", outcome.product);
        Some(price)
    }

    // ── Staff notification hook ─────────────────────────────────────────

    /// Must be called after any externally-driven stock reduction so the
    /// staff agent reacts immediately instead of waiting out its scan
    /// throttle. Accepts the serialized `"x,y"` shelf key; malformed keys
    /// are ignored.
    pub fn notify_shelf_change(&mut self, shelf_key: &str) {
        if let Some(tile) = Tile::parse_key(shelf_key) {
            self.notify_shelf_change_tile(tile);
        }
    }

    pub fn notify_shelf_change_tile(&mut self, tile: Tile) {
        if let Ok(agent) = self.world.query_one_mut::<&mut StaffAgent>(self.staff) {
            agent.priority_shelf = Some(tile);
            agent.scan_cooldown = 0.0;
        }
    }

    // ── Player actions (UI write surface) ───────────────────────────────

    /// Buy a fixture into the owned pool. Applies the skill discount.
    pub fn try_buy_fixture(&mut self, kind: FixtureKind) -> bool {
        let mods = self.skills.modifiers(&self.skill_tree);
        let cost = fixture_cost(kind, &mods) as i64;
        if self.money < cost {
            return false;
        }
        self.money -= cost;
        self.layout.fixtures_owned.add(kind, 1);
        self.analytics.log(
            self.day,
            self.sim_time,
            "fixture",
            format!("Bought {} for ${cost}", kind.as_str()),
        );
        true
    }

    /// Place an owned fixture on an empty, in-bounds tile.
    pub fn try_place_object(&mut self, kind: FixtureKind, tile: Tile) -> bool {
        if !self.layout.fixtures_owned.consume_for_place(kind) {
            return false;
        }
        if !self.layout.place(kind, tile) {
            // Tile was occupied or out of bounds; the fixture stays owned.
            self.layout.fixtures_owned.add(kind, 1);
            return false;
        }
        true
    }

    /// Manually move stock from the warehouse onto a shelf. Returns the
    /// units actually moved.
    pub fn stock_shelf(&mut self, tile: Tile, product: Product, amount: u32) -> u32 {
        let Some(stock) = self.layout.shelf_stocks.get_mut(&tile) else {
            return 0;
        };
        let moved = stock.stock_from(&mut self.inventory, product, amount);
        if moved > 0 {
            self.analytics.record_restock(self.day, product, moved);
        }
        moved
    }

    /// Place a wholesale order; cost is charged now, goods arrive after the
    /// lead time.
    pub fn place_order(&mut self, product: Product, qty: u32) -> bool {
        if qty == 0 {
            return false;
        }
        let cost = wholesale_order_total(product, qty) as i64;
        if self.money < cost {
            return false;
        }
        self.money -= cost;
        let mut order = InventoryOrder {
            cost,
            deliver_at: self.sim_time + orders::LEAD_TIME_SECONDS,
            ..InventoryOrder::default()
        };
        match product {
            Product::Booster => order.boosters = qty,
            Product::Deck => order.decks = qty,
            Product::Single(rarity) => {
                order.singles.insert(rarity, qty);
            }
        }
        self.pending_orders.push(order);
        self.analytics.record_order_placed(self.day, product, qty);
        self.analytics.log(
            self.day,
            self.sim_time,
            "order",
            format!("Ordered {product} x{qty} for ${cost}"),
        );
        true
    }

    /// Append an externally built order (UI bulk ordering). The engine
    /// still owns delivery.
    pub fn push_order(&mut self, order: InventoryOrder) {
        for (product, qty) in order.lines() {
            self.analytics.record_order_placed(self.day, product, qty);
        }
        self.pending_orders.push(order);
    }

    /// Open one booster from inventory into the collection. Returns the
    /// revealed card ids.
    pub fn open_pack(&mut self) -> Option<Vec<String>> {
        if !self.inventory.remove(Product::Booster, 1) {
            return None;
        }
        let cards = open_booster(&mut self.rng);
        for card_id in &cards {
            self.collection.add(card_id, 1);
        }
        self.analytics.record_pack_open(self.day, 1);
        if let Ok(agent) = self.world.query_one_mut::<&mut StaffAgent>(self.staff) {
            agent.xp = award_staff_xp(agent.xp, StaffXpEvent::PackOpen, 1, None).new_xp;
        }
        self.analytics
            .log(self.day, self.sim_time, "pack", "Opened a booster pack".to_string());
        Some(cards)
    }

    /// Sell uncommitted copies of a card back to the market. Returns the
    /// payout, or `None` when nothing could be sold.
    pub fn sell_back(&mut self, card_id: &str, qty: u32) -> Option<u32> {
        let def = card_def(card_id)?;
        let sellable = shopsim_logic::pricing::sellable_copies(
            self.collection.get(card_id),
            self.deck.committed(card_id),
        );
        let qty = qty.min(sellable);
        if qty == 0 {
            return None;
        }
        if !self.collection.remove(card_id, qty) {
            return None;
        }
        let payout = sellback_total(market_buy_price(Product::Single(def.rarity)), qty);
        self.money += payout as i64;
        let mods = self.skills.modifiers(&self.skill_tree);
        self.progression.add_xp(xp_from_sellback(payout, &mods));
        self.analytics.record_sellback(self.day);
        self.analytics.log(
            self.day,
            self.sim_time,
            "sellback",
            format!("Sold back {card_id} x{qty} for ${payout}"),
        );
        Some(payout)
    }

    /// Spend a skill point.
    pub fn rank_up(&mut self, skill_id: &str) -> bool {
        self.skills.rank_up(&self.skill_tree, skill_id, &mut self.progression)
    }

    pub fn set_price(&mut self, product: Product, price: u32) {
        self.prices.set(product, price);
    }

    pub fn set_pricing_mode(&mut self, mode: PricingMode) {
        self.pricing.mode = mode;
    }

    pub fn set_markup_pct(&mut self, product: Product, pct: f32) {
        self.pricing.set_markup_pct(product, pct);
    }

    // ── Read surface ────────────────────────────────────────────────────

    pub fn money(&self) -> i64 {
        self.money
    }

    pub fn day(&self) -> u32 {
        self.day
    }

    pub fn day_phase(&self) -> DayPhase {
        self.day_phase
    }

    pub fn sim_time(&self) -> f64 {
        self.sim_time
    }

    pub fn inventory(&self) -> &Inventory {
        &self.inventory
    }

    pub fn prices(&self) -> &Prices {
        &self.prices
    }

    pub fn pricing(&self) -> &PricingSettings {
        &self.pricing
    }

    pub fn progression(&self) -> &PlayerProgression {
        &self.progression
    }

    pub fn skills(&self) -> &SkillTreeState {
        &self.skills
    }

    pub fn skill_tree(&self) -> &SkillTreeDef {
        &self.skill_tree
    }

    pub fn collection(&self) -> &CardCollection {
        &self.collection
    }

    pub fn deck(&self) -> &Deck {
        &self.deck
    }

    pub fn analytics(&self) -> &AnalyticsState {
        &self.analytics
    }

    pub fn pending_orders(&self) -> &[InventoryOrder] {
        &self.pending_orders
    }

    pub fn shelf_stock(&self, tile: Tile) -> Option<&ShelfStock> {
        self.layout.shelf_stocks.get(&tile)
    }

    pub fn layout(&self) -> &ShopLayout {
        &self.layout
    }

    /// Aggregated skill modifiers (memoized).
    pub fn modifiers(&mut self) -> Modifiers {
        self.skills.modifiers(&self.skill_tree)
    }

    /// The effective sale price a customer would pay right now.
    pub fn effective_price(&mut self, product: Product) -> u32 {
        let mods = self.skills.modifiers(&self.skill_tree);
        effective_sale_price(&self.prices, &self.pricing, product, &mods)
    }

    /// Reorder suggestions from the trailing sales window.
    pub fn restock_suggestions(&self) -> Vec<RestockSuggestion> {
        compute_restock_suggestions(
            &self.analytics,
            self.day,
            &self.inventory,
            &self.layout.shelf_stocks,
            orders::LEAD_TIME_SECONDS,
            constants::forecast::WINDOW_DAYS,
            constants::forecast::MAX_SUGGESTIONS,
        )
    }

    /// Shelves with the most stockouts over the trailing window.
    pub fn stockout_report(&self) -> Vec<(String, u32)> {
        top_stockout_shelves(
            &self.analytics,
            self.day,
            constants::forecast::WINDOW_DAYS,
            constants::forecast::MAX_STOCKOUT_SHELVES,
        )
    }

    pub fn active_customers(&self) -> usize {
        self.world.query::<&CustomerAgent>().iter().count()
    }

    /// Staff view for rendering; never hands out mutable agent state.
    pub fn staff_snapshot(&self) -> Option<StaffSnapshot> {
        let mut query = self
            .world
            .query_one::<(&Position, &StaffAgent)>(self.staff)
            .ok()?;
        let (pos, agent) = query.get()?;
        Some(StaffSnapshot {
            pos: pos.0,
            state: agent.state,
            task: agent.task,
            target_tile: agent.target_tile,
            path: agent.path.clone(),
            xp: agent.xp,
            level: agent.level(),
        })
    }

    /// Customer views for rendering.
    pub fn customer_snapshots(&self) -> Vec<CustomerSnapshot> {
        self.world
            .query::<(&Position, &CustomerAgent)>()
            .iter()
            .map(|(_, (pos, agent))| CustomerSnapshot {
                pos: pos.0,
                state: agent.state,
            })
            .collect()
    }

    // ── Deck editing (exclusive ownership; no raw &mut Deck) ────────────

    /// Add an owned, uncommitted copy to the deck.
    pub fn deck_add_card(&mut self, card_id: &str) -> bool {
        if self.collection.get(card_id) <= self.deck.committed(card_id) {
            return false;
        }
        self.deck.add(card_id)
    }

    pub fn deck_remove_card(&mut self, card_id: &str) -> bool {
        self.deck.remove(card_id)
    }

    /// Grant battle XP (the battle minigame itself lives outside the core).
    pub fn record_battle_win(&mut self) {
        let mods = self.skills.modifiers(&self.skill_tree);
        self.progression
            .add_xp(shopsim_logic::economy::xp_from_battle_win(&mods));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shopsim_logic::constants::customers as customer_consts;
    use shopsim_logic::skill_tree::default_skill_tree;

    fn engine() -> ShopEngine {
        ShopEngine::with_seed(default_skill_tree(), 7)
    }

    fn engine_with_stocked_shelf() -> ShopEngine {
        let mut engine = engine();
        engine.inventory.add(Product::Booster, 10);
        engine.layout.place(FixtureKind::Shelf, Tile::new(2, 2));
        assert_eq!(engine.stock_shelf(Tile::new(2, 2), Product::Booster, 5), 5);
        engine
    }

    #[test]
    fn new_engine_defaults() {
        let engine = engine();
        assert_eq!(engine.money(), START_MONEY);
        assert_eq!(engine.day(), 1);
        assert_eq!(engine.day_phase(), DayPhase::Day);
        assert_eq!(engine.inventory().booster_packs, START_PACKS);
        assert_eq!(engine.active_customers(), 0);
        assert!(engine.staff_snapshot().is_some());
    }

    #[test]
    fn pause_freezes_everything() {
        let mut engine = engine_with_stocked_shelf();
        engine.pause();
        let staff_before = engine.staff_snapshot().unwrap().pos;
        for _ in 0..100 {
            engine.update(0.1);
        }
        assert_eq!(engine.sim_time(), 0.0);
        assert_eq!(engine.staff_snapshot().unwrap().pos, staff_before);
        engine.resume();
        engine.update(0.1);
        assert!(engine.sim_time() > 0.0);
    }

    #[test]
    fn delta_is_clamped() {
        let mut engine = engine();
        engine.update(100.0);
        assert!((engine.sim_time() - MAX_TICK_DELTA as f64).abs() < 1e-6);
    }

    #[test]
    fn order_delivers_exactly_once_at_timestamp() {
        let mut engine = engine();
        engine.pending_orders.push(InventoryOrder {
            boosters: 5,
            cost: 20,
            deliver_at: 10.0,
            ..InventoryOrder::default()
        });
        let start_packs = engine.inventory().booster_packs;

        // Not applied while now < 10.0.
        for _ in 0..39 {
            engine.update(0.25);
        }
        assert!(engine.sim_time() < 10.0);
        assert_eq!(engine.inventory().booster_packs, start_packs);
        assert_eq!(engine.pending_orders().len(), 1);

        // Applied exactly once when now >= 10.0.
        engine.update(0.25);
        assert!(engine.sim_time() >= 10.0);
        assert_eq!(engine.inventory().booster_packs, start_packs + 5);
        assert!(engine.pending_orders().is_empty());

        engine.update(0.25);
        assert_eq!(engine.inventory().booster_packs, start_packs + 5);
    }

    #[test]
    fn phase_transitions_day_night_day() {
        let mut engine = engine();
        engine.phase_timer = phase::DAY_DURATION_SECONDS - 0.1;
        engine.update(0.2);
        assert_eq!(engine.day_phase(), DayPhase::Night);
        assert_eq!(engine.day(), 1);
        engine.phase_timer = phase::NIGHT_DURATION_SECONDS - 0.1;
        engine.update(0.2);
        assert_eq!(engine.day_phase(), DayPhase::Day);
        assert_eq!(engine.day(), 2);
    }

    #[test]
    fn place_order_charges_and_delivers_after_lead_time() {
        let mut engine = engine();
        let money_before = engine.money();
        assert!(engine.place_order(Product::Booster, 5));
        let cost = wholesale_order_total(Product::Booster, 5) as i64;
        assert_eq!(engine.money(), money_before - cost);
        assert_eq!(engine.pending_orders().len(), 1);
        let packs_before = engine.inventory().booster_packs;

        // Lead time elapses (clamped ticks).
        let ticks = (orders::LEAD_TIME_SECONDS / 0.25) as usize + 2;
        for _ in 0..ticks {
            engine.update(0.25);
        }
        assert_eq!(engine.inventory().booster_packs, packs_before + 5);
        let day = engine.analytics().day(1).unwrap();
        assert_eq!(day.orders_placed[&Product::Booster], 5);
        assert_eq!(day.orders_delivered[&Product::Booster], 5);
    }

    #[test]
    fn cannot_order_without_money() {
        let mut engine = engine();
        engine.money = 1;
        assert!(!engine.place_order(Product::Deck, 10));
        assert_eq!(engine.money(), 1);
        assert!(engine.pending_orders().is_empty());
    }

    #[test]
    fn buy_and_place_fixture() {
        let mut engine = engine();
        assert!(!engine.try_place_object(FixtureKind::Shelf, Tile::new(4, 4)), "none owned yet");
        assert!(engine.try_buy_fixture(FixtureKind::Shelf));
        assert_eq!(engine.money(), START_MONEY - 250);
        assert!(engine.try_place_object(FixtureKind::Shelf, Tile::new(4, 4)));
        assert!(engine.shelf_stock(Tile::new(4, 4)).is_some());
        // Occupied tile refunds the owned fixture.
        assert!(engine.try_buy_fixture(FixtureKind::Shelf));
        assert!(!engine.try_place_object(FixtureKind::Shelf, Tile::new(4, 4)));
        assert_eq!(engine.layout().fixtures_owned.shelves, 1);
    }

    #[test]
    fn fixture_discount_applies() {
        let mut engine = engine();
        engine.progression.skill_points = 20;
        engine.progression.level = 20;
        // bulk_buying needs premium_display 3 which needs haggle 3.
        for _ in 0..3 {
            assert!(engine.rank_up("haggle"));
        }
        for _ in 0..3 {
            assert!(engine.rank_up("premium_display"));
        }
        assert!(engine.rank_up("bulk_buying"));
        let expected = fixture_cost(FixtureKind::Shelf, &engine.modifiers()) as i64;
        let money_before = engine.money();
        assert!(engine.try_buy_fixture(FixtureKind::Shelf));
        let charged = money_before - engine.money();
        assert_eq!(charged, expected);
        assert!(charged < 250, "discount applied");
    }

    #[test]
    fn haggle_scenario_effective_price_and_sale() {
        let mut engine = engine_with_stocked_shelf();
        engine.set_price(Product::Booster, 10);
        engine.progression.skill_points = 5;
        for _ in 0..5 {
            assert!(engine.rank_up("haggle"));
        }
        let mods = engine.modifiers();
        assert!((mods.sell_price_pct - 0.05).abs() < 1e-6);
        let price = engine.effective_price(Product::Booster);
        assert!(price >= 10, "modifier never lowers the price");

        // The sale yields exactly the effective price.
        let money_before = engine.money();
        engine.apply_sale(PurchaseEvent {
            shelf: Tile::new(2, 2),
            product: Product::Booster,
        });
        assert_eq!(engine.money() - money_before, price as i64);
        assert_eq!(engine.shelf_stock(Tile::new(2, 2)).unwrap().qty, 4);
    }

    #[test]
    fn sale_drives_staff_notification_and_analytics() {
        let mut engine = engine_with_stocked_shelf();
        engine.apply_sale(PurchaseEvent {
            shelf: Tile::new(2, 2),
            product: Product::Booster,
        });
        let snapshot = engine.staff_snapshot().unwrap();
        assert!(snapshot.xp > 0, "staff earns sale XP");
        let agent = engine
            .world
            .query_one_mut::<&StaffAgent>(engine.staff)
            .unwrap();
        assert_eq!(agent.priority_shelf, Some(Tile::new(2, 2)));
        assert_eq!(agent.scan_cooldown, 0.0);
        let day = engine.analytics().day(1).unwrap();
        assert_eq!(day.units_sold[&Product::Booster], 1);
        assert!(day.revenue > 0);
        assert!(engine.progression().xp > 0 || engine.progression().level > 1);
    }

    #[test]
    fn selling_out_records_stockout() {
        let mut engine = engine();
        engine.inventory.add(Product::Booster, 1);
        engine.layout.place(FixtureKind::Shelf, Tile::new(2, 2));
        engine.stock_shelf(Tile::new(2, 2), Product::Booster, 1);
        let revenue = engine.sell_from_shelf(Tile::new(2, 2)).expect("unit on shelf");
        assert!(revenue >= 1);
        assert!(engine.sell_from_shelf(Tile::new(2, 2)).is_none(), "shelf drained");
        let day = engine.analytics().day(1).unwrap();
        assert_eq!(day.stockouts_by_shelf["2,2"], 1);
        assert_eq!(engine.shelf_stock(Tile::new(2, 2)).unwrap().product, None);
        assert_eq!(engine.stockout_report(), vec![("2,2".to_string(), 1)]);
    }

    #[test]
    fn notify_shelf_change_parses_boundary_keys() {
        let mut engine = engine();
        engine.notify_shelf_change("3,4");
        let agent = engine
            .world
            .query_one_mut::<&StaffAgent>(engine.staff)
            .unwrap();
        assert_eq!(agent.priority_shelf, Some(Tile::new(3, 4)));
        // Malformed keys are ignored, not errors.
        engine.notify_shelf_change("not-a-key");
    }

    #[test]
    fn open_pack_flows_into_collection() {
        let mut engine = engine();
        let packs = engine.inventory().booster_packs;
        let cards = engine.open_pack().expect("start packs available");
        assert_eq!(cards.len(), 5);
        assert_eq!(engine.inventory().booster_packs, packs - 1);
        assert_eq!(engine.collection().total(), 5);
        assert_eq!(engine.analytics().day(1).unwrap().packs_opened, 1);

        engine.inventory.booster_packs = 0;
        assert!(engine.open_pack().is_none());
    }

    #[test]
    fn sellback_pays_and_locks_deck_copies() {
        let mut engine = engine();
        engine.collection.add("l1", 2);
        assert!(engine.deck_add_card("l1"));
        // One copy committed; only one sellable.
        let payout = engine.sell_back("l1", 5).expect("one spare copy");
        // legendary market 28 * 0.6 -> 17.
        assert_eq!(payout, 17);
        assert_eq!(engine.collection().get("l1"), 1);
        assert!(engine.sell_back("l1", 1).is_none(), "remaining copy is committed");
        assert_eq!(engine.analytics().day(1).unwrap().sells_back, 1);
    }

    #[test]
    fn customers_spawn_and_complete_purchases_over_a_day() {
        let mut engine = engine_with_stocked_shelf();
        engine.inventory.add(Product::Booster, 40);
        for _ in 0..4000 {
            engine.update(0.1);
            if engine.sim_time() > 120.0 {
                break;
            }
        }
        let day = engine.analytics().day(1).unwrap();
        assert!(day.visitors > 0, "customers should have spawned");
        assert!(day.revenue > 0, "someone should have bought something");
        assert!(engine.money() > START_MONEY);
        // Caps hold.
        assert!(engine.active_customers() <= customer_consts::MAX_ACTIVE);
    }

    #[test]
    fn night_spawns_nobody() {
        let mut engine = engine_with_stocked_shelf();
        engine.day_phase = DayPhase::Night;
        engine.phase_timer = 0.0;
        for _ in 0..100 {
            engine.update(0.1);
        }
        assert_eq!(engine.active_customers(), 0);
    }
}
