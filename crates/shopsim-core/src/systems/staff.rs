//! Staff agent: restock planning, pathfinding, and the
//! pickup/deliver/stocking state machine.
//!
//! The agent idles until a throttled scan (or a shelf-change notification)
//! finds a restock target, walks a BFS path to the counter to fill its
//! carry buffer when needed, then on to the shelf, dwells, and applies the
//! restock. Every failure path drops the plan and returns to idle; no
//! retries within a tick, no errors.

use shopsim_logic::cards::CardCollection;
use shopsim_logic::cards::Deck;
use shopsim_logic::catalog::{Product, Rarity};
use shopsim_logic::constants::staff::{
    CARRY_MAX_BOOSTERS, CARRY_MAX_DECKS, CARRY_MAX_SINGLES, SCAN_COOLDOWN, STOCK_TIME,
};
use shopsim_logic::grid::Tile;
use shopsim_logic::inventory::Inventory;
use shopsim_logic::pathfinding::bfs_path;
use shopsim_logic::shelf::ShelfStock;
use shopsim_logic::staff_xp::{award_staff_xp, StaffXpEvent};

use crate::components::{Position, RestockPlan, StaffAgent, StaffState, StaffTask, Vec2};
use crate::shop::ShopLayout;

/// Squared distance at which a waypoint counts as reached.
const ARRIVE_EPS_SQ: f32 = 0.0004;

/// Shared shop state the staff system reads and mutates.
pub struct StaffContext<'a> {
    pub layout: &'a mut ShopLayout,
    pub inventory: &'a mut Inventory,
    pub collection: &'a mut CardCollection,
    pub deck: &'a Deck,
}

/// A restock the agent completed this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RestockReport {
    pub shelf: Tile,
    pub product: Product,
    pub qty: u32,
}

/// Whether `stock` can be restocked right now, and with what.
///
/// Threshold policy is near-full-only: a shelf is eligible as soon as any
/// unit is missing. Listed-card shelves restock the card id already listed,
/// and only while the collection owns more copies than the deck commits.
fn plan_for_shelf(
    tile: Tile,
    stock: &ShelfStock,
    agent: &StaffAgent,
    inventory: &Inventory,
    collection: &CardCollection,
    deck: &Deck,
) -> Option<RestockPlan> {
    if stock.max_qty == 0 || stock.capacity_left() == 0 {
        return None;
    }
    if stock.is_listed() {
        let card_id = stock.cards.first()?;
        let product = stock.product?;
        if collection.get(card_id) <= deck.committed(card_id) {
            return None;
        }
        return Some(RestockPlan {
            shelf: tile,
            product,
            amount: 1,
            card_id: Some(card_id.clone()),
        });
    }
    let product = stock.product?;
    if inventory.available(product) + agent.carried(product) == 0 {
        return None;
    }
    Some(RestockPlan {
        shelf: tile,
        product,
        amount: stock.capacity_left(),
        card_id: None,
    })
}

/// Pick the best restock target: the eligible shelf at minimum Manhattan
/// distance from `staff_tile`, ties broken by shelf-map order.
pub fn choose_restock_plan(
    staff_tile: Tile,
    agent: &StaffAgent,
    layout: &ShopLayout,
    inventory: &Inventory,
    collection: &CardCollection,
    deck: &Deck,
) -> Option<RestockPlan> {
    let mut best: Option<(i32, RestockPlan)> = None;
    for (tile, stock) in &layout.shelf_stocks {
        let Some(plan) = plan_for_shelf(*tile, stock, agent, inventory, collection, deck) else {
            continue;
        };
        let dist = staff_tile.manhattan(*tile);
        if best.as_ref().map_or(true, |(d, _)| dist < *d) {
            best = Some((dist, plan));
        }
    }
    best.map(|(_, plan)| plan)
}

/// Route the agent to the nearest walkable tile adjacent to `poi`. Falls
/// back to an empty path when unreachable so the agent assumes it starts at
/// the destination next tick instead of deadlocking.
fn route_to_adjacent(pos: &Position, agent: &mut StaffAgent, layout: &ShopLayout, poi: Tile) -> bool {
    let grid = layout.walk_grid();
    let from = pos.0.tile();
    let mut candidates = grid.adjacent_walk_tiles(poi);
    if candidates.is_empty() {
        return false;
    }
    candidates.sort_by_key(|tile| (from.manhattan(*tile), *tile));
    let dest = candidates[0];
    agent.target_tile = Some(dest);
    agent.path = bfs_path(&grid, from, dest).unwrap_or_default();
    agent.state = StaffState::Moving;
    true
}

/// Counter pickup: top up each carry buffer toward its limit, preferring
/// the planned product's rarity for the shared singles capacity.
fn do_pickup(agent: &mut StaffAgent, inventory: &mut Inventory) {
    let take_boosters = (CARRY_MAX_BOOSTERS - agent.carry_boosters).min(inventory.booster_packs);
    if take_boosters > 0 && inventory.remove(Product::Booster, take_boosters) {
        agent.carry_boosters += take_boosters;
    }
    let take_decks = (CARRY_MAX_DECKS - agent.carry_decks).min(inventory.decks);
    if take_decks > 0 && inventory.remove(Product::Deck, take_decks) {
        agent.carry_decks += take_decks;
    }

    let mut room = CARRY_MAX_SINGLES.saturating_sub(agent.carried_singles_total());
    let planned = agent.plan.as_ref().and_then(|plan| plan.product.rarity());
    let mut order: Vec<Rarity> = Vec::with_capacity(Rarity::ALL.len());
    if let Some(rarity) = planned {
        order.push(rarity);
    }
    order.extend(Rarity::ALL.iter().copied().filter(|r| Some(*r) != planned));
    for rarity in order {
        if room == 0 {
            break;
        }
        let take = room.min(inventory.singles_of(rarity));
        if take > 0 && inventory.remove(Product::Single(rarity), take) {
            *agent.carry_singles.entry(rarity).or_insert(0) += take;
            room -= take;
        }
    }
}

/// Apply the planned restock at the shelf. Listed cards move one copy from
/// the collection; bulk products drain the carry buffer up to capacity.
fn apply_restock(plan: &RestockPlan, agent: &mut StaffAgent, ctx: &mut StaffContext) -> Option<RestockReport> {
    let stock = ctx.layout.shelf_stocks.get_mut(&plan.shelf)?;
    if let Some(card_id) = &plan.card_id {
        if ctx.collection.get(card_id) <= ctx.deck.committed(card_id) {
            return None;
        }
        if !stock.add_listed_card(plan.product, card_id) {
            return None;
        }
        ctx.collection.remove(card_id, 1);
        return Some(RestockReport {
            shelf: plan.shelf,
            product: plan.product,
            qty: 1,
        });
    }
    let accepted = stock.accept_units(plan.product, agent.carried(plan.product));
    if accepted == 0 {
        return None;
    }
    agent.take_carried(plan.product, accepted);
    Some(RestockReport {
        shelf: plan.shelf,
        product: plan.product,
        qty: accepted,
    })
}

/// Advance the staff state machine by `dt` seconds. Returns a report when a
/// restock landed this tick.
pub fn update_staff(
    pos: &mut Position,
    agent: &mut StaffAgent,
    dt: f32,
    ctx: &mut StaffContext,
) -> Option<RestockReport> {
    agent.scan_cooldown = (agent.scan_cooldown - dt).max(0.0);

    match agent.state {
        StaffState::Stocking => {
            agent.stock_timer = (agent.stock_timer - dt).max(0.0);
            if agent.stock_timer > 0.0 {
                return None;
            }
            let report = match agent.plan.take() {
                Some(plan) => apply_restock(&plan, agent, ctx),
                None => None,
            };
            if let Some(report) = &report {
                agent.xp = award_staff_xp(agent.xp, StaffXpEvent::Restock, report.qty, Some(report.product))
                    .new_xp;
            }
            agent.clear_plan();
            report
        }
        StaffState::Moving => {
            let Some(target_tile) = agent.target_tile else {
                agent.clear_plan();
                return None;
            };
            let next_tile = agent.path.first().copied().unwrap_or(target_tile);
            let waypoint = Vec2::from_tile(next_tile);
            if pos.0.distance_squared(waypoint) < ARRIVE_EPS_SQ {
                // Snap to the center to avoid drift accumulation.
                pos.0 = waypoint;
                if !agent.path.is_empty() {
                    agent.path.remove(0);
                }
                if agent.path.is_empty() && next_tile == target_tile {
                    on_arrival(pos, agent, ctx);
                }
                return None;
            }
            pos.0 = pos.0.step_toward(waypoint, agent.speed_tiles_per_s * dt);
            None
        }
        StaffState::Idle => {
            if agent.scan_cooldown > 0.0 {
                return None;
            }
            agent.scan_cooldown = SCAN_COOLDOWN;
            let staff_tile = pos.0.tile();

            let plan = match agent.priority_shelf.take() {
                Some(tile) => ctx
                    .layout
                    .shelf_stocks
                    .get(&tile)
                    .and_then(|stock| {
                        plan_for_shelf(tile, stock, agent, ctx.inventory, ctx.collection, ctx.deck)
                    })
                    .or_else(|| {
                        choose_restock_plan(staff_tile, agent, ctx.layout, ctx.inventory, ctx.collection, ctx.deck)
                    }),
                None => choose_restock_plan(staff_tile, agent, ctx.layout, ctx.inventory, ctx.collection, ctx.deck),
            };
            let Some(plan) = plan else {
                return None;
            };

            // Bulk restocks route through the counter unless the buffer
            // already holds the product; listed cards go straight to the
            // shelf.
            let needs_pickup = plan.card_id.is_none() && agent.carried(plan.product) == 0;
            let poi = if needs_pickup {
                match ctx.layout.counter_tile() {
                    Some(counter) => counter,
                    None => return None,
                }
            } else {
                plan.shelf
            };
            agent.task = if needs_pickup { StaffTask::Pickup } else { StaffTask::Deliver };
            agent.plan = Some(plan);
            if !route_to_adjacent(pos, agent, ctx.layout, poi) {
                agent.clear_plan();
            }
            None
        }
    }
}

/// Final-waypoint arrival: pickups immediately re-route toward the shelf;
/// deliveries start the stocking dwell.
fn on_arrival(pos: &mut Position, agent: &mut StaffAgent, ctx: &mut StaffContext) {
    match agent.task {
        StaffTask::Pickup => {
            do_pickup(agent, ctx.inventory);
            agent.task = StaffTask::Deliver;
            let shelf = agent.plan.as_ref().map(|plan| plan.shelf);
            match shelf {
                Some(shelf) if route_to_adjacent(pos, agent, ctx.layout, shelf) => {}
                _ => agent.clear_plan(),
            }
        }
        StaffTask::Deliver => {
            agent.state = StaffState::Stocking;
            agent.stock_timer = STOCK_TIME;
        }
        StaffTask::None => agent.clear_plan(),
    }
}
