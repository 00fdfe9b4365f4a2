//! Economic choices: purchase weighting, fixture costs, player XP awards.
//!
//! Purchase weights are an inverse, floor-clamped function of the effective
//! price (cheaper items draw more buyers) with a separate curve per
//! product family. The weights must be computed from the same effective
//! price the transaction will charge, so demand stays consistent with
//! revenue.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::skill_tree::Modifiers;

/// Minimum weight so nothing is ever impossible to sell.
const WEIGHT_FLOOR: f32 = 0.2;

/// Stochastic purchase weight for a product at its effective price.
pub fn purchase_weight(product: Product, effective_price: u32) -> f32 {
    let price = effective_price as f32;
    let raw = match product {
        Product::Booster => 1.2 - price / 10.0,
        Product::Deck => 1.0 - price / 20.0,
        Product::Single(_) => 1.4 - price / 4.0,
    };
    raw.max(WEIGHT_FLOOR)
}

/// Draw one product from `(product, effective_price)` options by weight.
/// Returns `None` when no options exist.
pub fn choose_purchase(options: &[(Product, u32)], rng: &mut impl Rng) -> Option<Product> {
    if options.is_empty() {
        return None;
    }
    let weights: Vec<f32> = options
        .iter()
        .map(|(product, price)| purchase_weight(*product, *price))
        .collect();
    let total: f32 = weights.iter().sum();
    let mut roll = rng.gen::<f32>() * total;
    for ((product, _), weight) in options.iter().zip(&weights) {
        roll -= weight;
        if roll <= 0.0 {
            return Some(*product);
        }
    }
    // Float underflow on the last item.
    options.last().map(|(product, _)| *product)
}

/// Placeable fixture kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FixtureKind {
    Shelf,
    Counter,
    Poster,
}

impl FixtureKind {
    pub const ALL: [FixtureKind; 3] = [FixtureKind::Shelf, FixtureKind::Counter, FixtureKind::Poster];

    pub fn base_cost(&self) -> u32 {
        match self {
            FixtureKind::Shelf => 250,
            FixtureKind::Counter => 800,
            FixtureKind::Poster => 120,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FixtureKind::Shelf => "shelf",
            FixtureKind::Counter => "counter",
            FixtureKind::Poster => "poster",
        }
    }
}

/// Fixture purchase cost after the skill discount (capped at 95%).
pub fn fixture_cost(kind: FixtureKind, mods: &Modifiers) -> u32 {
    let pct = mods.fixture_discount_pct.clamp(0.0, 0.95);
    ((kind.base_cost() as f32 * (1.0 - pct)).round() as u32).max(1)
}

/// Player XP from a single sale. Revenue-based (not profit) so it is always
/// non-negative.
pub fn xp_from_sale(revenue: u32, mods: &Modifiers) -> u64 {
    let base = revenue as f32 * 2.0;
    let k = 1.0 + mods.sales_xp_pct.max(0.0);
    (base * k).round() as u64
}

/// Player XP from winning a battle.
pub fn xp_from_battle_win(mods: &Modifiers) -> u64 {
    let k = 1.0 + mods.battle_xp_pct.max(0.0);
    (120.0 * k).round() as u64
}

/// Player XP from selling items or cards back to the market.
pub fn xp_from_sellback(revenue: u32, mods: &Modifiers) -> u64 {
    let k = 1.0 + mods.sales_xp_pct.max(0.0);
    (revenue as f32 * k).round() as u64
}
