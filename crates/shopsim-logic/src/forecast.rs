//! Reorder suggestions from trailing sales averages.
//!
//! For each product: project lead-time demand from the trailing-window
//! average daily units sold, add a small safety buffer, subtract everything
//! already on hand (warehouse plus shelves, listed cards counting as singles
//! of their rarity), and recommend the positive remainder. No automation;
//! the ordering UI surfaces these.

use std::collections::BTreeMap;

use crate::analytics::AnalyticsState;
use crate::catalog::Product;
use crate::constants::phase::DAY_DURATION_SECONDS;
use crate::grid::Tile;
use crate::inventory::Inventory;
use crate::shelf::ShelfStock;

/// One suggested reorder line.
#[derive(Debug, Clone, PartialEq)]
pub struct RestockSuggestion {
    pub product: Product,
    pub recommended_qty: u32,
    pub avg_daily_units: f64,
    pub current_total_stock: u32,
    pub lead_time_s: f64,
    pub reason: String,
}

/// Average daily units sold over the last `window_days` (inclusive of the
/// current day). Days with no recorded metrics are skipped entirely.
pub fn sales_avg_daily_units(
    analytics: &AnalyticsState,
    day: u32,
    product: Product,
    window_days: u32,
) -> f64 {
    let day = day.max(1);
    let window = window_days.max(1);
    let first = day.saturating_sub(window - 1).max(1);
    let mut total = 0u64;
    let mut days = 0u32;
    for dd in first..=day {
        if let Some(metrics) = analytics.day(dd) {
            total += metrics.units_sold_of(product) as u64;
            days += 1;
        }
    }
    if days == 0 {
        return 0.0;
    }
    total as f64 / days as f64
}

/// Total on-hand units of `product`: warehouse plus every shelf carrying it.
/// Listed-card shelves count as singles of their rarity via the shelf's
/// product field.
pub fn current_stock_for_product(
    product: Product,
    inventory: &Inventory,
    shelves: &BTreeMap<Tile, ShelfStock>,
) -> u32 {
    let mut total = inventory.available(product);
    for stock in shelves.values() {
        if stock.qty > 0 && stock.product == Some(product) {
            total += stock.qty;
        }
    }
    total
}

/// Compute suggested reorder quantities, largest first.
#[allow(clippy::too_many_arguments)]
pub fn compute_restock_suggestions(
    analytics: &AnalyticsState,
    day: u32,
    inventory: &Inventory,
    shelves: &BTreeMap<Tile, ShelfStock>,
    lead_time_seconds: f64,
    window_days: u32,
    max_suggestions: usize,
) -> Vec<RestockSuggestion> {
    let lead = lead_time_seconds.max(1.0);
    let mut suggestions = Vec::new();
    for product in Product::ALL {
        let avg_daily = sales_avg_daily_units(analytics, day, product, window_days);
        if avg_daily <= 0.0 {
            continue;
        }
        // Daily demand converted into lead-time demand.
        let demand = (avg_daily / DAY_DURATION_SECONDS) * lead;
        // Buffer: 10% of daily demand, at least one unit.
        let safety = (avg_daily * 0.10).max(1.0);
        let want = demand + safety;
        let current = current_stock_for_product(product, inventory, shelves);
        let recommended = (want - current as f64).ceil().max(0.0) as u32;
        if recommended == 0 {
            continue;
        }
        suggestions.push(RestockSuggestion {
            product,
            recommended_qty: recommended,
            avg_daily_units: avg_daily,
            current_total_stock: current,
            lead_time_s: lead,
            reason: format!("avg {avg_daily:.2}/day, lead {}s", lead as u64),
        });
    }
    suggestions.sort_by(|a, b| {
        b.recommended_qty
            .cmp(&a.recommended_qty)
            .then(b.avg_daily_units.total_cmp(&a.avg_daily_units))
    });
    suggestions.truncate(max_suggestions.max(1));
    suggestions
}

/// Shelves with the most stockout events over the trailing window.
pub fn top_stockout_shelves(
    analytics: &AnalyticsState,
    day: u32,
    window_days: u32,
    limit: usize,
) -> Vec<(String, u32)> {
    let day = day.max(1);
    let window = window_days.max(1);
    let first = day.saturating_sub(window - 1).max(1);
    let mut counts: BTreeMap<String, u32> = BTreeMap::new();
    for dd in first..=day {
        if let Some(metrics) = analytics.day(dd) {
            for (key, count) in &metrics.stockouts_by_shelf {
                *counts.entry(key.clone()).or_insert(0) += count;
            }
        }
    }
    let mut items: Vec<(String, u32)> = counts.into_iter().collect();
    items.sort_by(|a, b| b.1.cmp(&a.1).then(a.0.cmp(&b.0)));
    items.truncate(limit.max(1));
    items
}
