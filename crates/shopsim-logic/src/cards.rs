//! Static card pool, the player's counted collection, and the battle deck.
//!
//! The pool is a fixed table (12 common, 8 uncommon, 5 rare, 3 epic,
//! 2 legendary). Listed-card shelves, sellback, and pack opening all work in
//! terms of card ids from this pool.

use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::OnceLock;

use crate::catalog::Rarity;

/// Deck building limits.
pub const DECK_SIZE: u32 = 20;
pub const MAX_COPIES_PER_CARD: u32 = 2;

/// Rare-slot odds when opening a booster.
const RARITY_ROLL: [(Rarity, f32); 3] = [
    (Rarity::Rare, 0.80),
    (Rarity::Epic, 0.18),
    (Rarity::Legendary, 0.02),
];

/// A card definition in the static pool.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CardDef {
    pub card_id: String,
    pub name: String,
    pub rarity: Rarity,
    pub cost: u32,
    pub attack: u32,
    pub health: u32,
}

fn build_pool() -> Vec<CardDef> {
    let mut cards = Vec::new();
    let mut push = |prefix: &str, name: &str, rarity, count: u32, cost, attack_base: u32, health| {
        for idx in 1..=count {
            cards.push(CardDef {
                card_id: format!("{prefix}{idx}"),
                name: format!("{name} {idx}"),
                rarity,
                cost,
                attack: attack_base + idx % 2,
                health,
            });
        }
    };
    push("c", "Sproutling", Rarity::Common, 12, 1, 1, 2);
    push("u", "River Guard", Rarity::Uncommon, 8, 2, 2, 3);
    push("r", "Skyblade", Rarity::Rare, 5, 3, 3, 4);
    push("e", "Voidcaller", Rarity::Epic, 3, 4, 4, 5);
    push("l", "Ancient Wyrm", Rarity::Legendary, 2, 5, 6, 6);
    cards
}

/// The full card pool.
pub fn card_pool() -> &'static [CardDef] {
    static POOL: OnceLock<Vec<CardDef>> = OnceLock::new();
    POOL.get_or_init(build_pool)
}

/// Look up a card definition by id.
pub fn card_def(card_id: &str) -> Option<&'static CardDef> {
    card_pool().iter().find(|c| c.card_id == card_id)
}

/// Open one booster: 3 commons, 1 uncommon, and a rolled rare-slot card.
pub fn open_booster(rng: &mut impl Rng) -> Vec<String> {
    let pool = card_pool();
    let of = |rarity: Rarity| -> Vec<&CardDef> { pool.iter().filter(|c| c.rarity == rarity).collect() };
    let commons = of(Rarity::Common);
    let uncommons = of(Rarity::Uncommon);

    let mut cards: Vec<String> = Vec::with_capacity(5);
    for _ in 0..3 {
        cards.push(commons.choose(rng).expect("pool has commons").card_id.clone());
    }
    cards.push(uncommons.choose(rng).expect("pool has uncommons").card_id.clone());

    let roll: f32 = rng.gen();
    let mut cumulative = 0.0;
    let mut slot = Rarity::Rare;
    for (rarity, chance) in RARITY_ROLL {
        cumulative += chance;
        if roll <= cumulative {
            slot = rarity;
            break;
        }
    }
    let candidates = of(slot);
    cards.push(candidates.choose(rng).expect("pool has rare slots").card_id.clone());
    cards
}

/// The player's card collection: card id -> copies owned.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CardCollection {
    pub cards: BTreeMap<String, u32>,
}

impl CardCollection {
    pub fn add(&mut self, card_id: &str, amount: u32) {
        if amount == 0 {
            return;
        }
        *self.cards.entry(card_id.to_string()).or_insert(0) += amount;
    }

    /// Remove copies; fails without mutation if fewer than `amount` owned.
    pub fn remove(&mut self, card_id: &str, amount: u32) -> bool {
        match self.cards.get_mut(card_id) {
            Some(owned) if *owned >= amount => {
                *owned -= amount;
                if *owned == 0 {
                    self.cards.remove(card_id);
                }
                true
            }
            _ => false,
        }
    }

    pub fn get(&self, card_id: &str) -> u32 {
        self.cards.get(card_id).copied().unwrap_or(0)
    }

    pub fn total(&self) -> u32 {
        self.cards.values().sum()
    }
}

/// The active battle deck: card id -> copies committed.
///
/// Copies in the deck are committed and cannot be listed on shelves or sold
/// back; callers compare against [`CardCollection`] ownership.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Deck {
    pub cards: BTreeMap<String, u32>,
}

impl Deck {
    pub fn total(&self) -> u32 {
        self.cards.values().sum()
    }

    pub fn committed(&self, card_id: &str) -> u32 {
        self.cards.get(card_id).copied().unwrap_or(0)
    }

    pub fn can_add(&self, card_id: &str) -> bool {
        self.committed(card_id) < MAX_COPIES_PER_CARD && self.total() < DECK_SIZE
    }

    pub fn add(&mut self, card_id: &str) -> bool {
        if !self.can_add(card_id) {
            return false;
        }
        *self.cards.entry(card_id.to_string()).or_insert(0) += 1;
        true
    }

    pub fn remove(&mut self, card_id: &str) -> bool {
        match self.cards.get_mut(card_id) {
            Some(count) if *count > 0 => {
                *count -= 1;
                if *count == 0 {
                    self.cards.remove(card_id);
                }
                true
            }
            _ => false,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.total() == DECK_SIZE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn pool_composition() {
        let pool = card_pool();
        assert_eq!(pool.len(), 30);
        let count = |r| pool.iter().filter(|c| c.rarity == r).count();
        assert_eq!(count(Rarity::Common), 12);
        assert_eq!(count(Rarity::Uncommon), 8);
        assert_eq!(count(Rarity::Rare), 5);
        assert_eq!(count(Rarity::Epic), 3);
        assert_eq!(count(Rarity::Legendary), 2);
    }

    #[test]
    fn card_ids_unique() {
        let pool = card_pool();
        for (i, a) in pool.iter().enumerate() {
            for b in &pool[i + 1..] {
                assert_ne!(a.card_id, b.card_id);
            }
        }
    }

    #[test]
    fn booster_has_fixed_shape() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..50 {
            let cards = open_booster(&mut rng);
            assert_eq!(cards.len(), 5);
            let rarities: Vec<Rarity> = cards.iter().map(|id| card_def(id).unwrap().rarity).collect();
            assert!(rarities[..3].iter().all(|r| *r == Rarity::Common));
            assert_eq!(rarities[3], Rarity::Uncommon);
            assert!(rarities[4] >= Rarity::Rare);
        }
    }

    #[test]
    fn collection_add_remove() {
        let mut col = CardCollection::default();
        col.add("c1", 3);
        assert_eq!(col.get("c1"), 3);
        assert!(col.remove("c1", 2));
        assert_eq!(col.get("c1"), 1);
        assert!(!col.remove("c1", 2));
        assert_eq!(col.get("c1"), 1);
        assert!(col.remove("c1", 1));
        assert_eq!(col.get("c1"), 0);
        assert!(!col.cards.contains_key("c1"));
    }

    #[test]
    fn deck_limits() {
        let mut deck = Deck::default();
        assert!(deck.add("c1"));
        assert!(deck.add("c1"));
        assert!(!deck.add("c1"), "third copy rejected");
        for idx in 2..=10 {
            let id = format!("c{idx}");
            // c2..c10 won't all exist past c12, but ids are arbitrary here.
            deck.add(&id);
            deck.add(&id);
        }
        assert_eq!(deck.total(), DECK_SIZE);
        assert!(deck.is_valid());
        assert!(!deck.add("u1"), "deck full");
    }

    #[test]
    fn deck_remove() {
        let mut deck = Deck::default();
        deck.add("r1");
        assert!(deck.remove("r1"));
        assert!(!deck.remove("r1"));
        assert_eq!(deck.total(), 0);
    }
}
