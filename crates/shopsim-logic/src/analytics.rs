//! Per-day sales metrics and the capped event log.
//!
//! Metrics accumulate incrementally as events occur; nothing is recomputed
//! after the fact. The event log is chronological and bounded: once the cap
//! is exceeded the oldest entries drop first. Stockout counters are keyed by
//! the serialized shelf key since this state persists verbatim.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::Product;
use crate::constants::MAX_EVENT_LOG;

/// One human-readable line in the rolling event log.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventLogEntry {
    #[serde(default)]
    pub day: u32,
    /// Simulation time of the event.
    #[serde(default)]
    pub t: f64,
    #[serde(default)]
    pub kind: String,
    #[serde(default)]
    pub message: String,
}

/// Counters for a single shop day.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DailyMetrics {
    #[serde(default)]
    pub visitors: u32,
    #[serde(default)]
    pub revenue: i64,
    #[serde(default)]
    pub units_sold: BTreeMap<Product, u32>,
    #[serde(default)]
    pub revenue_by_product: BTreeMap<Product, i64>,
    /// Items moved onto shelves (manual + staff).
    #[serde(default)]
    pub restocked: BTreeMap<Product, u32>,
    #[serde(default)]
    pub orders_placed: BTreeMap<Product, u32>,
    #[serde(default)]
    pub orders_delivered: BTreeMap<Product, u32>,
    /// Times a shelf hit qty 0 from a sale, by serialized shelf key.
    #[serde(default)]
    pub stockouts_by_shelf: BTreeMap<String, u32>,
    #[serde(default)]
    pub packs_opened: u32,
    /// Sellback actions confirmed.
    #[serde(default)]
    pub sells_back: u32,
}

impl DailyMetrics {
    pub fn units_sold_of(&self, product: Product) -> u32 {
        self.units_sold.get(&product).copied().unwrap_or(0)
    }
}

/// Persisted analytics: balancing data plus player-facing stats.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnalyticsState {
    #[serde(default)]
    pub days: BTreeMap<u32, DailyMetrics>,
    #[serde(default)]
    pub event_log: Vec<EventLogEntry>,
    #[serde(default = "default_max_events")]
    pub max_events: usize,
}

fn default_max_events() -> usize {
    MAX_EVENT_LOG
}

impl Default for AnalyticsState {
    fn default() -> Self {
        Self {
            days: BTreeMap::new(),
            event_log: Vec::new(),
            max_events: MAX_EVENT_LOG,
        }
    }
}

impl AnalyticsState {
    fn day_mut(&mut self, day: u32) -> &mut DailyMetrics {
        self.days.entry(day.max(1)).or_default()
    }

    pub fn day(&self, day: u32) -> Option<&DailyMetrics> {
        self.days.get(&day)
    }

    /// Append a log line, dropping from the oldest end past the cap.
    pub fn log(&mut self, day: u32, t: f64, kind: &str, message: String) {
        self.event_log.push(EventLogEntry {
            day,
            t,
            kind: kind.to_string(),
            message,
        });
        if self.event_log.len() > self.max_events {
            let excess = self.event_log.len() - self.max_events;
            self.event_log.drain(..excess);
        }
    }

    pub fn record_visitor(&mut self, day: u32) {
        self.day_mut(day).visitors += 1;
    }

    pub fn record_sale(
        &mut self,
        day: u32,
        product: Product,
        revenue: i64,
        shelf_key: Option<&str>,
        became_empty: bool,
    ) {
        let metrics = self.day_mut(day);
        metrics.revenue += revenue;
        *metrics.units_sold.entry(product).or_insert(0) += 1;
        *metrics.revenue_by_product.entry(product).or_insert(0) += revenue;
        if became_empty {
            if let Some(key) = shelf_key {
                *metrics.stockouts_by_shelf.entry(key.to_string()).or_insert(0) += 1;
            }
        }
    }

    pub fn record_restock(&mut self, day: u32, product: Product, qty: u32) {
        if qty == 0 {
            return;
        }
        *self.day_mut(day).restocked.entry(product).or_insert(0) += qty;
    }

    pub fn record_pack_open(&mut self, day: u32, packs: u32) {
        if packs == 0 {
            return;
        }
        self.day_mut(day).packs_opened += packs;
    }

    pub fn record_order_placed(&mut self, day: u32, product: Product, qty: u32) {
        if qty == 0 {
            return;
        }
        *self.day_mut(day).orders_placed.entry(product).or_insert(0) += qty;
    }

    pub fn record_order_delivered(&mut self, day: u32, product: Product, qty: u32) {
        if qty == 0 {
            return;
        }
        *self.day_mut(day).orders_delivered.entry(product).or_insert(0) += qty;
    }

    pub fn record_sellback(&mut self, day: u32) {
        self.day_mut(day).sells_back += 1;
    }

    /// Re-impose the log cap after loading a save with a larger history.
    pub fn normalize(&mut self) {
        if self.max_events == 0 {
            self.max_events = MAX_EVENT_LOG;
        }
        if self.event_log.len() > self.max_events {
            let excess = self.event_log.len() - self.max_events;
            self.event_log.drain(..excess);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Rarity;

    #[test]
    fn sales_accumulate() {
        let mut analytics = AnalyticsState::default();
        analytics.record_sale(1, Product::Booster, 4, Some("2,2"), false);
        analytics.record_sale(1, Product::Booster, 4, Some("2,2"), true);
        let day = analytics.day(1).unwrap();
        assert_eq!(day.revenue, 8);
        assert_eq!(day.units_sold_of(Product::Booster), 2);
        assert_eq!(day.revenue_by_product[&Product::Booster], 8);
        assert_eq!(day.stockouts_by_shelf["2,2"], 1);
    }

    #[test]
    fn days_are_independent() {
        let mut analytics = AnalyticsState::default();
        analytics.record_visitor(1);
        analytics.record_visitor(2);
        analytics.record_visitor(2);
        assert_eq!(analytics.day(1).unwrap().visitors, 1);
        assert_eq!(analytics.day(2).unwrap().visitors, 2);
        assert!(analytics.day(3).is_none());
    }

    #[test]
    fn day_zero_clamps_to_one() {
        let mut analytics = AnalyticsState::default();
        analytics.record_visitor(0);
        assert_eq!(analytics.day(1).unwrap().visitors, 1);
    }

    #[test]
    fn zero_quantity_records_are_noops() {
        let mut analytics = AnalyticsState::default();
        analytics.record_restock(1, Product::Deck, 0);
        analytics.record_order_placed(1, Product::Deck, 0);
        analytics.record_pack_open(1, 0);
        assert!(analytics.day(1).is_none());
    }

    #[test]
    fn restock_and_orders_accumulate() {
        let mut analytics = AnalyticsState::default();
        analytics.record_restock(3, Product::Single(Rarity::Rare), 2);
        analytics.record_order_placed(3, Product::Booster, 5);
        analytics.record_order_delivered(3, Product::Booster, 5);
        let day = analytics.day(3).unwrap();
        assert_eq!(day.restocked[&Product::Single(Rarity::Rare)], 2);
        assert_eq!(day.orders_placed[&Product::Booster], 5);
        assert_eq!(day.orders_delivered[&Product::Booster], 5);
    }

    #[test]
    fn log_caps_oldest_first() {
        let mut analytics = AnalyticsState {
            max_events: 3,
            ..Default::default()
        };
        for i in 0..5 {
            analytics.log(1, i as f64, "test", format!("event {i}"));
        }
        assert_eq!(analytics.event_log.len(), 3);
        assert_eq!(analytics.event_log[0].message, "event 2");
        assert_eq!(analytics.event_log[2].message, "event 4");
    }

    #[test]
    fn normalize_truncates_oversized_loaded_log() {
        let mut analytics = AnalyticsState::default();
        for i in 0..10 {
            analytics.event_log.push(EventLogEntry {
                day: 1,
                t: i as f64,
                kind: "x".into(),
                message: format!("{i}"),
            });
        }
        analytics.max_events = 4;
        analytics.normalize();
        assert_eq!(analytics.event_log.len(), 4);
        assert_eq!(analytics.event_log[0].message, "6");
    }
}
