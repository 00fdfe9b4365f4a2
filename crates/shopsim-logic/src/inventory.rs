//! Warehouse inventory and pending wholesale orders.
//!
//! All counts are unsigned so the non-negativity invariant is structural;
//! removal helpers fail (returning `false`) instead of saturating.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::{Product, Rarity};

/// Back-room stock not yet moved onto shelves.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Inventory {
    pub booster_packs: u32,
    pub decks: u32,
    /// Singles by rarity; absent keys read as zero.
    pub singles: BTreeMap<Rarity, u32>,
}

impl Inventory {
    pub fn singles_of(&self, rarity: Rarity) -> u32 {
        self.singles.get(&rarity).copied().unwrap_or(0)
    }

    pub fn total_singles(&self) -> u32 {
        self.singles.values().sum()
    }

    /// Units available for the given product.
    pub fn available(&self, product: Product) -> u32 {
        match product {
            Product::Booster => self.booster_packs,
            Product::Deck => self.decks,
            Product::Single(rarity) => self.singles_of(rarity),
        }
    }

    pub fn add(&mut self, product: Product, amount: u32) {
        match product {
            Product::Booster => self.booster_packs += amount,
            Product::Deck => self.decks += amount,
            Product::Single(rarity) => {
                *self.singles.entry(rarity).or_insert(0) += amount;
            }
        }
    }

    /// Remove `amount` units; fails without mutation if not enough on hand.
    pub fn remove(&mut self, product: Product, amount: u32) -> bool {
        if self.available(product) < amount {
            return false;
        }
        match product {
            Product::Booster => self.booster_packs -= amount,
            Product::Deck => self.decks -= amount,
            Product::Single(rarity) => {
                if let Some(count) = self.singles.get_mut(&rarity) {
                    *count -= amount;
                }
            }
        }
        true
    }

    /// Apply a delivered order in full.
    pub fn apply_order(&mut self, order: &InventoryOrder) {
        self.booster_packs += order.boosters;
        self.decks += order.decks;
        for (rarity, amount) in &order.singles {
            *self.singles.entry(*rarity).or_insert(0) += amount;
        }
    }
}

/// A wholesale order in flight; delivered once `deliver_at` elapses.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InventoryOrder {
    #[serde(default)]
    pub boosters: u32,
    #[serde(default)]
    pub decks: u32,
    #[serde(default)]
    pub singles: BTreeMap<Rarity, u32>,
    #[serde(default)]
    pub cost: i64,
    /// Absolute simulation-time timestamp.
    #[serde(default)]
    pub deliver_at: f64,
}

impl InventoryOrder {
    /// Total units across all product lines.
    pub fn total_units(&self) -> u32 {
        self.boosters + self.decks + self.singles.values().sum::<u32>()
    }

    /// Per-product unit counts for analytics recording.
    pub fn lines(&self) -> Vec<(Product, u32)> {
        let mut lines = Vec::new();
        if self.boosters > 0 {
            lines.push((Product::Booster, self.boosters));
        }
        if self.decks > 0 {
            lines.push((Product::Deck, self.decks));
        }
        for (rarity, amount) in &self.singles {
            if *amount > 0 {
                lines.push((Product::Single(*rarity), *amount));
            }
        }
        lines
    }
}
