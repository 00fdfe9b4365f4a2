//! Shelf stock: the shared mutable resource both agents trade against.
//!
//! Invariants, enforced by rejecting violating mutations rather than
//! clamping into an inconsistent state:
//! * `0 <= qty <= max_qty`
//! * if `cards` is non-empty, `qty == cards.len()` and every card is a
//!   listed single of the shelf's product rarity

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::catalog::Product;
use crate::inventory::Inventory;

pub const DEFAULT_SHELF_CAPACITY: u32 = 10;

/// Stock held by one placed shelf.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ShelfStock {
    /// `None` is the empty sentinel, persisted as `"empty"`.
    #[serde(with = "product_or_empty", default)]
    pub product: Option<Product>,
    #[serde(default)]
    pub qty: u32,
    #[serde(default = "default_capacity")]
    pub max_qty: u32,
    /// Specific listed card ids when the shelf sells individual singles
    /// instead of fungible stock.
    #[serde(default)]
    pub cards: Vec<String>,
}

fn default_capacity() -> u32 {
    DEFAULT_SHELF_CAPACITY
}

impl Default for ShelfStock {
    fn default() -> Self {
        Self::empty(DEFAULT_SHELF_CAPACITY)
    }
}

/// What a completed sale removed from the shelf.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaleOutcome {
    pub product: Product,
    /// The specific card sold, for listed-card shelves.
    pub card_id: Option<String>,
    /// True when this sale drained the shelf to zero.
    pub became_empty: bool,
}

impl ShelfStock {
    pub fn empty(max_qty: u32) -> Self {
        Self {
            product: None,
            qty: 0,
            max_qty,
            cards: Vec::new(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.qty == 0
    }

    pub fn capacity_left(&self) -> u32 {
        self.max_qty.saturating_sub(self.qty)
    }

    pub fn is_listed(&self) -> bool {
        !self.cards.is_empty()
    }

    /// Whether bulk units of `product` may be stocked here: the shelf must
    /// not carry listed cards, and any existing stock must match.
    pub fn accepts_bulk(&self, product: Product) -> bool {
        if self.is_listed() {
            return false;
        }
        self.qty == 0 || self.product == Some(product)
    }

    /// Accept up to `amount` bulk units the caller already holds (a carry
    /// buffer or warehouse withdrawal). Returns the units accepted.
    pub fn accept_units(&mut self, product: Product, amount: u32) -> u32 {
        if amount == 0 || !self.accepts_bulk(product) {
            return 0;
        }
        let moved = amount.min(self.capacity_left());
        if moved == 0 {
            return 0;
        }
        self.product = Some(product);
        self.qty += moved;
        moved
    }

    /// Move up to `amount` units of `product` from `inventory` onto the
    /// shelf. Returns the units actually moved (0 on rejection).
    pub fn stock_from(&mut self, inventory: &mut Inventory, product: Product, amount: u32) -> u32 {
        let moved = amount.min(inventory.available(product));
        let moved = self.accept_units(product, moved);
        if moved == 0 {
            return 0;
        }
        // The min above guarantees availability.
        inventory.remove(product, moved);
        moved
    }

    /// List one specific card copy. The shelf must have room and must not
    /// already hold bulk stock or listed cards of a different product.
    pub fn add_listed_card(&mut self, product: Product, card_id: &str) -> bool {
        if product.rarity().is_none() || self.capacity_left() == 0 {
            return false;
        }
        let listed_other = self.is_listed() && self.product != Some(product);
        let bulk_here = !self.is_listed() && self.qty > 0;
        if listed_other || bulk_here {
            return false;
        }
        self.cards.push(card_id.to_string());
        self.product = Some(product);
        self.qty = self.cards.len() as u32;
        true
    }

    /// Sell one unit. Listed-card shelves lose one card chosen uniformly at
    /// random; draining the shelf resets it to the empty sentinel.
    pub fn sell_unit(&mut self, rng: &mut impl Rng) -> Option<SaleOutcome> {
        let product = self.product?;
        if self.qty == 0 {
            return None;
        }
        let card_id = if self.is_listed() {
            let idx = rng.gen_range(0..self.cards.len());
            Some(self.cards.swap_remove(idx))
        } else {
            None
        };
        self.qty -= 1;
        let became_empty = self.qty == 0;
        if became_empty {
            self.product = None;
            self.cards.clear();
        }
        Some(SaleOutcome {
            product,
            card_id,
            became_empty,
        })
    }

    /// Clamp persisted values back into the invariant envelope. Used at
    /// load time; live mutation never needs it.
    pub fn normalize(&mut self) {
        if self.max_qty == 0 {
            self.max_qty = DEFAULT_SHELF_CAPACITY;
        }
        if !self.cards.is_empty() {
            self.cards.truncate(self.max_qty as usize);
            self.qty = self.cards.len() as u32;
        } else if self.qty > self.max_qty {
            self.qty = self.max_qty;
        }
        if self.qty == 0 {
            self.product = None;
            self.cards.clear();
        }
    }
}

/// Persist `Option<Product>` with the `"empty"` sentinel the save format uses.
mod product_or_empty {
    use super::Product;
    use serde::de::{self, Deserialize, Deserializer};
    use serde::Serializer;

    pub fn serialize<S: Serializer>(value: &Option<Product>, serializer: S) -> Result<S::Ok, S::Error> {
        match value {
            Some(product) => serializer.serialize_str(product.key()),
            None => serializer.serialize_str("empty"),
        }
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Product>, D::Error> {
        let s = String::deserialize(deserializer)?;
        if s == "empty" {
            return Ok(None);
        }
        Product::from_key(&s)
            .map(Some)
            .ok_or_else(|| de::Error::custom(format!("unknown product `{s}`")))
    }
}
