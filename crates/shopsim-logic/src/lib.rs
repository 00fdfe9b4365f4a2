//! Pure simulation logic for ShopSim.
//!
//! This crate contains all shop-economy logic that is independent of any
//! engine, storage, or rendering runtime. Functions take plain data and
//! return results, making them unit-testable and portable between the
//! native engine, the headless simtest harness, and any future frontend.
//!
//! # Module Overview
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`analytics`] | Per-day sales metrics and the capped event log |
//! | [`cards`] | Static card pool, counted collection, battle deck, boosters |
//! | [`catalog`] | Product and rarity taxonomy with exact key round-trip |
//! | [`constants`] | Tuning values: pacing, carry limits, prices, XP awards |
//! | [`economy`] | Purchase weighting, fixture costs, player XP awards |
//! | [`forecast`] | Reorder suggestions from trailing sales averages |
//! | [`grid`] | Tile value type, shelf keys, adjacency, walkability |
//! | [`inventory`] | Warehouse counts and pending wholesale orders |
//! | [`pacing`] | Customer spawn interval ramp and daily schedules |
//! | [`pathfinding`] | BFS shortest paths over the 4-connected shop grid |
//! | [`pricing`] | Wholesale, retail, effective, and sellback prices |
//! | [`progression`] | Player XP curve, levels, and skill points |
//! | [`shelf`] | Shelf stock invariants and stock/sell mutation contracts |
//! | [`skill_tree`] | Skill definitions, rank state, modifier aggregation |
//! | [`staff_xp`] | Staff agent XP awards per shop event |

pub mod analytics;
pub mod cards;
pub mod catalog;
pub mod constants;
pub mod economy;
pub mod forecast;
pub mod grid;
pub mod inventory;
pub mod pacing;
pub mod pathfinding;
pub mod pricing;
pub mod progression;
pub mod shelf;
pub mod skill_tree;
pub mod staff_xp;
