//! Staff agent XP awards.
//!
//! The roaming staff member earns XP for sales rung up, items restocked, and
//! packs opened; singles carry a rarity multiplier. Levels are derived from
//! total XP, so there is no separate level counter to keep in sync.

use crate::catalog::{Product, Rarity};
use crate::constants::staff_xp::{XP_PER_LEVEL, XP_PER_PACK_OPENED, XP_PER_RESTOCK_ITEM, XP_PER_SALE_DOLLAR};

/// What kind of shop event is being rewarded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaffXpEvent {
    /// `amount` is sale dollars.
    Sale,
    /// `amount` is items actually moved onto a shelf.
    Restock,
    /// `amount` is packs opened.
    PackOpen,
}

/// Outcome of awarding staff XP.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StaffXpAward {
    pub gained_xp: u32,
    pub new_xp: u32,
    pub prev_level: u32,
    pub new_level: u32,
}

impl StaffXpAward {
    pub fn leveled_up(&self) -> bool {
        self.new_level > self.prev_level
    }
}

/// Derive staff level from total XP.
pub fn staff_level_from_xp(total_xp: u32) -> u32 {
    1 + total_xp / XP_PER_LEVEL
}

fn rarity_mult(product: Option<Product>) -> f32 {
    match product.and_then(|p| p.rarity()) {
        Some(Rarity::Common) => 1.0,
        Some(Rarity::Uncommon) => 1.15,
        Some(Rarity::Rare) => 1.4,
        Some(Rarity::Epic) => 1.8,
        Some(Rarity::Legendary) => 2.4,
        None => 1.0,
    }
}

/// XP gained for an event; zero-amount events earn nothing, any other sale
/// or restock earns at least 1.
pub fn compute_staff_xp(event: StaffXpEvent, amount: u32, product: Option<Product>) -> u32 {
    if amount == 0 {
        return 0;
    }
    let mult = rarity_mult(product);
    match event {
        StaffXpEvent::Sale => ((amount as f32 * XP_PER_SALE_DOLLAR * mult).round() as u32).max(1),
        StaffXpEvent::Restock => ((amount as f32 * XP_PER_RESTOCK_ITEM * mult).round() as u32).max(1),
        StaffXpEvent::PackOpen => amount * XP_PER_PACK_OPENED,
    }
}

/// Pure award: total XP in, award summary out.
pub fn award_staff_xp(
    current_total_xp: u32,
    event: StaffXpEvent,
    amount: u32,
    product: Option<Product>,
) -> StaffXpAward {
    let gained = compute_staff_xp(event, amount, product);
    let new_xp = current_total_xp + gained;
    StaffXpAward {
        gained_xp: gained,
        new_xp,
        prev_level: staff_level_from_xp(current_total_xp),
        new_level: staff_level_from_xp(new_xp),
    }
}
