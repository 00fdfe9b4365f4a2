//! Product and rarity taxonomy.
//!
//! Every pricing, inventory, and analytics table is keyed by exactly these
//! product keys: `booster`, `deck`, `single_<rarity>`. Internally products
//! are a tagged enum so an unknown key is a parse failure at the boundary,
//! never a silent runtime no-op; the string form is used for persistence and
//! must round-trip exactly.

use serde::de::{self, Deserialize, Deserializer};
use serde::{Serialize, Serializer};
use std::fmt;

/// Card rarity tiers, cheapest first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Rarity {
    Common,
    Uncommon,
    Rare,
    Epic,
    Legendary,
}

impl Rarity {
    pub const ALL: [Rarity; 5] = [
        Rarity::Common,
        Rarity::Uncommon,
        Rarity::Rare,
        Rarity::Epic,
        Rarity::Legendary,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Rarity::Common => "common",
            Rarity::Uncommon => "uncommon",
            Rarity::Rare => "rare",
            Rarity::Epic => "epic",
            Rarity::Legendary => "legendary",
        }
    }

    pub fn from_str(s: &str) -> Option<Rarity> {
        match s {
            "common" => Some(Rarity::Common),
            "uncommon" => Some(Rarity::Uncommon),
            "rare" => Some(Rarity::Rare),
            "epic" => Some(Rarity::Epic),
            "legendary" => Some(Rarity::Legendary),
            _ => None,
        }
    }
}

impl fmt::Display for Rarity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Rarity {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Rarity {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Rarity::from_str(&s).ok_or_else(|| de::Error::custom(format!("unknown rarity `{s}`")))
    }
}

/// A sellable product family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Product {
    Booster,
    Deck,
    Single(Rarity),
}

impl Product {
    pub const ALL: [Product; 7] = [
        Product::Booster,
        Product::Deck,
        Product::Single(Rarity::Common),
        Product::Single(Rarity::Uncommon),
        Product::Single(Rarity::Rare),
        Product::Single(Rarity::Epic),
        Product::Single(Rarity::Legendary),
    ];

    /// The canonical product key used in every persisted table.
    pub fn key(&self) -> &'static str {
        match self {
            Product::Booster => "booster",
            Product::Deck => "deck",
            Product::Single(Rarity::Common) => "single_common",
            Product::Single(Rarity::Uncommon) => "single_uncommon",
            Product::Single(Rarity::Rare) => "single_rare",
            Product::Single(Rarity::Epic) => "single_epic",
            Product::Single(Rarity::Legendary) => "single_legendary",
        }
    }

    pub fn from_key(key: &str) -> Option<Product> {
        match key {
            "booster" => Some(Product::Booster),
            "deck" => Some(Product::Deck),
            _ => {
                let rarity = key.strip_prefix("single_")?;
                Rarity::from_str(rarity).map(Product::Single)
            }
        }
    }

    /// The rarity for single-card products, `None` for sealed product.
    pub fn rarity(&self) -> Option<Rarity> {
        match self {
            Product::Single(r) => Some(*r),
            _ => None,
        }
    }
}

impl fmt::Display for Product {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

impl Serialize for Product {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.key())
    }
}

impl<'de> Deserialize<'de> for Product {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Product::from_key(&s).ok_or_else(|| de::Error::custom(format!("unknown product `{s}`")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn product_keys_round_trip() {
        for product in Product::ALL {
            assert_eq!(Product::from_key(product.key()), Some(product));
        }
    }

    #[test]
    fn rarity_names_round_trip() {
        for rarity in Rarity::ALL {
            assert_eq!(Rarity::from_str(rarity.as_str()), Some(rarity));
        }
    }

    #[test]
    fn exact_key_strings() {
        assert_eq!(Product::Booster.key(), "booster");
        assert_eq!(Product::Deck.key(), "deck");
        assert_eq!(Product::Single(Rarity::Legendary).key(), "single_legendary");
    }

    #[test]
    fn unknown_keys_rejected() {
        assert_eq!(Product::from_key("holo"), None);
        assert_eq!(Product::from_key("single_holo"), None);
        assert_eq!(Product::from_key(""), None);
    }

    #[test]
    fn rarity_accessor() {
        assert_eq!(Product::Booster.rarity(), None);
        assert_eq!(Product::Single(Rarity::Rare).rarity(), Some(Rarity::Rare));
    }

    #[test]
    fn serde_uses_key_strings() {
        // Rely on serde_test-free check: the Display form equals the key.
        assert_eq!(Product::Single(Rarity::Epic).to_string(), "single_epic");
        assert_eq!(Rarity::Uncommon.to_string(), "uncommon");
    }
}
