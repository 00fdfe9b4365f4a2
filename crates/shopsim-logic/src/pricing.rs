//! Price derivation: wholesale, retail, effective sale, and sellback.
//!
//! Three separate sources of truth, deliberately kept apart:
//! * wholesale/supplier unit costs: what ordering stock costs; player
//!   pricing never moves these
//! * market buy prices: what random singles and sellback trade at; the
//!   player cannot move the market
//! * retail prices: player-controlled, either absolute dollar figures or a
//!   markup over wholesale
//!
//! The effective sale price charged at the counter is the retail base price
//! scaled by the aggregated `sell_price_pct` skill modifier.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::catalog::{Product, Rarity};
use crate::constants::SELLBACK_FACTOR;
use crate::skill_tree::Modifiers;

/// Supplier unit cost for ordering. Unaffected by retail pricing.
pub fn wholesale_unit_cost(product: Product) -> u32 {
    match product {
        Product::Booster => 2,
        Product::Deck => 11,
        Product::Single(Rarity::Common) => 1,
        Product::Single(Rarity::Uncommon) => 1,
        Product::Single(Rarity::Rare) => 4,
        Product::Single(Rarity::Epic) => 7,
        Product::Single(Rarity::Legendary) => 17,
    }
}

/// Total supplier cost for ordering `qty` units.
pub fn wholesale_order_total(product: Product, qty: u32) -> u32 {
    if qty == 0 {
        return 0;
    }
    (wholesale_unit_cost(product) * qty).max(1)
}

/// Market buy price. Independent of player retail pricing.
pub fn market_buy_price(product: Product) -> u32 {
    match product {
        Product::Booster => 2,
        Product::Deck => 11,
        Product::Single(Rarity::Common) => 1,
        Product::Single(Rarity::Uncommon) => 2,
        Product::Single(Rarity::Rare) => 6,
        Product::Single(Rarity::Epic) => 12,
        Product::Single(Rarity::Legendary) => 28,
    }
}

/// Player-edited absolute retail prices.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Prices {
    pub booster: u32,
    pub deck: u32,
    pub single_common: u32,
    pub single_uncommon: u32,
    pub single_rare: u32,
    pub single_epic: u32,
    pub single_legendary: u32,
}

impl Default for Prices {
    fn default() -> Self {
        Self {
            booster: 4,
            deck: 18,
            single_common: 1,
            single_uncommon: 2,
            single_rare: 6,
            single_epic: 12,
            single_legendary: 28,
        }
    }
}

impl Prices {
    pub fn get(&self, product: Product) -> u32 {
        match product {
            Product::Booster => self.booster,
            Product::Deck => self.deck,
            Product::Single(Rarity::Common) => self.single_common,
            Product::Single(Rarity::Uncommon) => self.single_uncommon,
            Product::Single(Rarity::Rare) => self.single_rare,
            Product::Single(Rarity::Epic) => self.single_epic,
            Product::Single(Rarity::Legendary) => self.single_legendary,
        }
    }

    /// Set an absolute price, floored at 1.
    pub fn set(&mut self, product: Product, price: u32) {
        let price = price.max(1);
        match product {
            Product::Booster => self.booster = price,
            Product::Deck => self.deck = price,
            Product::Single(Rarity::Common) => self.single_common = price,
            Product::Single(Rarity::Uncommon) => self.single_uncommon = price,
            Product::Single(Rarity::Rare) => self.single_rare = price,
            Product::Single(Rarity::Epic) => self.single_epic = price,
            Product::Single(Rarity::Legendary) => self.single_legendary = price,
        }
    }
}

/// Which retail derivation is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PricingMode {
    #[default]
    Absolute,
    Markup,
}

/// Player-configurable retail pricing controls.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PricingSettings {
    #[serde(default)]
    pub mode: PricingMode,
    /// Markup fraction per product (0.5 == +50%). Absent keys read as 0.
    #[serde(default)]
    pub markup_pct: BTreeMap<Product, f32>,
}

/// Clamp markup to 0%..200%.
pub fn clamp_markup_pct(pct: f32) -> f32 {
    pct.clamp(0.0, 2.0)
}

impl PricingSettings {
    pub fn markup_pct(&self, product: Product) -> f32 {
        clamp_markup_pct(self.markup_pct.get(&product).copied().unwrap_or(0.0))
    }

    pub fn set_markup_pct(&mut self, product: Product, pct: f32) {
        self.markup_pct.insert(product, clamp_markup_pct(pct));
    }
}

/// Retail price from wholesale cost and markup percent.
pub fn compute_retail_price(wholesale_cost: u32, markup_pct: f32) -> u32 {
    let base = wholesale_cost.max(1) as f32;
    ((base * (1.0 + clamp_markup_pct(markup_pct))).round() as u32).max(1)
}

/// Retail base price before skill modifiers, per the active pricing mode.
pub fn retail_base_price(prices: &Prices, pricing: &PricingSettings, product: Product) -> u32 {
    match pricing.mode {
        PricingMode::Absolute => prices.get(product).max(1),
        PricingMode::Markup => {
            compute_retail_price(wholesale_unit_cost(product), pricing.markup_pct(product))
        }
    }
}

/// Apply the sell-price modifier to an integer price: rounded, floored at 1.
pub fn apply_sell_price_pct(base_price: u32, sell_price_pct: f32) -> u32 {
    ((base_price as f32 * (1.0 + sell_price_pct)).round() as i64).max(1) as u32
}

/// The price a customer actually pays.
pub fn effective_sale_price(
    prices: &Prices,
    pricing: &PricingSettings,
    product: Product,
    mods: &Modifiers,
) -> u32 {
    apply_sell_price_pct(retail_base_price(prices, pricing, product), mods.sell_price_pct)
}

/// Copies sellable back to the market (deck-committed copies are locked).
pub fn sellable_copies(owned: u32, in_deck: u32) -> u32 {
    owned.saturating_sub(in_deck)
}

/// Unit payout for selling back to the market.
pub fn sellback_unit_price(market_price: u32) -> u32 {
    ((market_price.max(1) as f32 * SELLBACK_FACTOR).round() as u32).max(1)
}

/// Total payout for selling `qty` units back.
pub fn sellback_total(market_price: u32, qty: u32) -> u32 {
    sellback_unit_price(market_price) * qty
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wholesale_below_retail_defaults() {
        let prices = Prices::default();
        for product in Product::ALL {
            assert!(wholesale_unit_cost(product) <= prices.get(product));
        }
    }

    #[test]
    fn markup_clamped() {
        assert_eq!(clamp_markup_pct(-0.5), 0.0);
        assert_eq!(clamp_markup_pct(5.0), 2.0);
        assert_eq!(clamp_markup_pct(0.3), 0.3);
    }

    #[test]
    fn retail_from_markup() {
        // booster wholesale 2, +50% -> 3
        assert_eq!(compute_retail_price(2, 0.5), 3);
        // 200% cap
        assert_eq!(compute_retail_price(10, 9.0), 30);
        assert_eq!(compute_retail_price(0, 0.0), 1);
    }

    #[test]
    fn base_price_follows_mode() {
        let prices = Prices::default();
        let mut pricing = PricingSettings::default();
        assert_eq!(retail_base_price(&prices, &pricing, Product::Deck), 18);

        pricing.mode = PricingMode::Markup;
        pricing.set_markup_pct(Product::Deck, 1.0);
        // deck wholesale 11, +100% -> 22
        assert_eq!(retail_base_price(&prices, &pricing, Product::Deck), 22);
    }

    #[test]
    fn effective_price_zero_mods_is_base() {
        let prices = Prices::default();
        let pricing = PricingSettings::default();
        let mods = Modifiers::default();
        for product in Product::ALL {
            assert_eq!(
                effective_sale_price(&prices, &pricing, product, &mods),
                retail_base_price(&prices, &pricing, product)
            );
        }
    }

    #[test]
    fn effective_price_strictly_higher_with_positive_pct() {
        let prices = Prices::default();
        let pricing = PricingSettings::default();
        let mods = Modifiers {
            sell_price_pct: 0.10,
            ..Modifiers::default()
        };
        // 10% on a $10 base -> 11
        assert_eq!(apply_sell_price_pct(10, 0.10), 11);
        assert!(
            effective_sale_price(&prices, &pricing, Product::Deck, &mods)
                > retail_base_price(&prices, &pricing, Product::Deck)
        );
    }

    #[test]
    fn price_floors_at_one() {
        assert_eq!(apply_sell_price_pct(1, -0.99), 1);
        assert_eq!(sellback_unit_price(1), 1);
    }

    #[test]
    fn sellback_below_market() {
        for product in Product::ALL {
            let market = market_buy_price(product);
            assert!(sellback_unit_price(market) <= market);
        }
        // legendary: 28 * 0.6 = 16.8 -> 17
        assert_eq!(sellback_unit_price(28), 17);
        assert_eq!(sellback_total(28, 3), 51);
    }

    #[test]
    fn sellable_copies_respect_deck() {
        assert_eq!(sellable_copies(3, 2), 1);
        assert_eq!(sellable_copies(2, 2), 0);
        assert_eq!(sellable_copies(1, 2), 0);
    }

    #[test]
    fn order_total() {
        assert_eq!(wholesale_order_total(Product::Booster, 5), 10);
        assert_eq!(wholesale_order_total(Product::Booster, 0), 0);
    }

    #[test]
    fn absolute_price_set_floors() {
        let mut prices = Prices::default();
        prices.set(Product::Booster, 0);
        assert_eq!(prices.get(Product::Booster), 1);
    }
}
