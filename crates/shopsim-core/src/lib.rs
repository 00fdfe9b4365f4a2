//! ShopSim Core - Card Shop Simulation Engine
//!
//! A single-threaded, tick-driven simulation of a trading-card shop: a
//! roaming staff agent restocks shelves via grid pathfinding, customers
//! arrive on a ramped schedule and make weighted purchase choices, and
//! every sale feeds pricing, progression, and analytics.
//!
//! # Architecture
//!
//! Agents live in a `hecs` world: the staff member and each active
//! customer are entities with a [`components::Position`] plus their state
//! component. Everything else (shelves, inventory, analytics, progression)
//! is a resource owned exclusively by [`engine::ShopEngine`]; collaborators
//! only ever see accessor and mutator methods, never raw references.
//!
//! # Example
//!
//! ```rust,no_run
//! use shopsim_core::prelude::*;
//!
//! let mut engine = ShopEngine::new(shopsim_logic::skill_tree::default_skill_tree());
//!
//! loop {
//!     engine.update(1.0 / 60.0); // 60 FPS
//! }
//! ```

pub mod components;
pub mod engine;
pub mod persistence;
pub mod shop;
pub mod systems;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::components::*;
    pub use crate::engine::{DayPhase, ShopEngine};
    pub use crate::shop::ShopLayout;
}
