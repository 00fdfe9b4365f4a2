//! ShopSim Headless Simulation Harness
//!
//! Validates pure simulation logic and runs a multi-day engine soak with no
//! rendering. Runs entirely in-process.
//!
//! Usage:
//!   cargo run -p shopsim-simtest
//!   cargo run -p shopsim-simtest -- --verbose

use std::collections::HashSet;

use shopsim_core::prelude::*;
use shopsim_logic::catalog::{Product, Rarity};
use shopsim_logic::constants::{customers, phase, START_MONEY};
use shopsim_logic::economy::FixtureKind;
use shopsim_logic::grid::{Tile, WalkGrid};
use shopsim_logic::pacing;
use shopsim_logic::pathfinding::bfs_path;
use shopsim_logic::pricing::{self, Prices, PricingMode, PricingSettings};
use shopsim_logic::progression::{xp_to_next, PlayerProgression, MAX_LEVEL};
use shopsim_logic::skill_tree::{default_skill_tree, Modifiers, SkillTreeState};

// ── Test harness ────────────────────────────────────────────────────────

struct TestResult {
    name: String,
    passed: bool,
    detail: String,
}

fn check(results: &mut Vec<TestResult>, name: &str, passed: bool, detail: String) {
    results.push(TestResult {
        name: name.to_string(),
        passed,
        detail,
    });
}

fn main() {
    env_logger::init();
    let verbose = std::env::args().any(|a| a == "--verbose");
    println!("=== ShopSim Simulation Harness ===\n");

    let mut results = Vec::new();

    results.extend(validate_pathfinding(verbose));
    results.extend(validate_pricing(verbose));
    results.extend(validate_progression(verbose));
    results.extend(validate_pacing(verbose));
    results.extend(validate_engine_soak(verbose));

    // ── Summary ──
    println!();
    let passed = results.iter().filter(|r| r.passed).count();
    let failed = results.iter().filter(|r| !r.passed).count();
    let total = results.len();

    for r in &results {
        let icon = if r.passed { "✓" } else { "✗" };
        if !r.passed || verbose {
            println!("  {} {}: {}", icon, r.name, r.detail);
        }
    }

    println!(
        "\n=== RESULT: {}/{} passed, {} failed ===",
        passed, total, failed
    );

    if failed > 0 {
        std::process::exit(1);
    }
}

// ── 1. Pathfinding sweep ────────────────────────────────────────────────

fn validate_pathfinding(_verbose: bool) -> Vec<TestResult> {
    println!("--- Pathfinding ---");
    let mut results = Vec::new();

    // Every open-grid path has Manhattan length.
    let grid = WalkGrid::new((20, 12), HashSet::new());
    let mut all_manhattan = true;
    for goal in [Tile::new(19, 11), Tile::new(7, 3), Tile::new(0, 11)] {
        let start = Tile::new(0, 0);
        match bfs_path(&grid, start, goal) {
            Some(path) => {
                if path.len() as i32 != start.manhattan(goal) {
                    all_manhattan = false;
                }
            }
            None => all_manhattan = false,
        }
    }
    check(
        &mut results,
        "open_grid_shortest",
        all_manhattan,
        "BFS paths match Manhattan distance on an open grid".into(),
    );

    // A wall with one gap is routed through the gap.
    let mut blocked = HashSet::new();
    for y in 0..12 {
        if y != 6 {
            blocked.insert(Tile::new(10, y));
        }
    }
    let walled = WalkGrid::new((20, 12), blocked);
    let path = bfs_path(&walled, Tile::new(0, 6), Tile::new(19, 6));
    let through_gap = path
        .as_ref()
        .map(|p| p.contains(&Tile::new(10, 6)) && p.iter().all(|t| walled.is_walkable(*t)))
        .unwrap_or(false);
    check(
        &mut results,
        "wall_gap_routing",
        through_gap,
        format!("path length {:?}", path.map(|p| p.len())),
    );

    // Fully enclosed goal is unreachable, not a panic.
    let mut sealed = HashSet::new();
    for t in Tile::new(5, 5).neighbors() {
        sealed.insert(t);
    }
    let enclosed = WalkGrid::new((20, 12), sealed);
    check(
        &mut results,
        "enclosed_unreachable",
        bfs_path(&enclosed, Tile::new(0, 0), Tile::new(5, 5)).is_none(),
        "enclosed goal yields None".into(),
    );

    results
}

// ── 2. Pricing sweep ────────────────────────────────────────────────────

fn validate_pricing(_verbose: bool) -> Vec<TestResult> {
    println!("--- Pricing ---");
    let mut results = Vec::new();
    let prices = Prices::default();
    let absolute = PricingSettings::default();
    let mut markup = PricingSettings {
        mode: PricingMode::Markup,
        ..PricingSettings::default()
    };
    for product in Product::ALL {
        markup.set_markup_pct(product, 0.5);
    }

    let mods = Modifiers::default();
    let all_floor_one = Product::ALL.iter().all(|&p| {
        pricing::effective_sale_price(&prices, &absolute, p, &mods) >= 1
            && pricing::effective_sale_price(&prices, &markup, p, &mods) >= 1
    });
    check(
        &mut results,
        "price_floor",
        all_floor_one,
        "every mode/product price is >= 1".into(),
    );

    let markup_above_wholesale = Product::ALL.iter().all(|&p| {
        pricing::retail_base_price(&prices, &markup, p) >= pricing::wholesale_unit_cost(p)
    });
    check(
        &mut results,
        "markup_covers_wholesale",
        markup_above_wholesale,
        "+50% markup never sells below supplier cost".into(),
    );

    let no_arbitrage = Product::ALL.iter().all(|&p| {
        pricing::sellback_unit_price(pricing::market_buy_price(p)) <= pricing::market_buy_price(p)
    });
    check(
        &mut results,
        "sellback_no_arbitrage",
        no_arbitrage,
        "sellback never pays above market".into(),
    );

    results
}

// ── 3. Progression sweep ────────────────────────────────────────────────

fn validate_progression(_verbose: bool) -> Vec<TestResult> {
    println!("--- Progression ---");
    let mut results = Vec::new();

    let mut monotonic = true;
    let mut prev = 0;
    for level in 1..MAX_LEVEL {
        let need = xp_to_next(level);
        if need == 0 || need < prev {
            monotonic = false;
            break;
        }
        prev = need;
    }
    check(
        &mut results,
        "xp_curve_monotonic",
        monotonic && xp_to_next(MAX_LEVEL) == 0,
        format!("xp_to_next(1)={}, xp_to_next(cap)=0", xp_to_next(1)),
    );

    // Spending 5 points on haggle yields exactly 5x its per-rank bonus.
    let tree = default_skill_tree();
    let mut state = SkillTreeState::default();
    let mut prog = PlayerProgression {
        level: 10,
        xp: 0,
        skill_points: 5,
    };
    let mut ok = true;
    for _ in 0..5 {
        ok &= state.rank_up(&tree, "haggle", &mut prog);
    }
    let mods = state.modifiers(&tree);
    check(
        &mut results,
        "haggle_rank_stack",
        ok && (mods.sell_price_pct - 0.05).abs() < 1e-6 && prog.skill_points == 0,
        format!("sell_price_pct={:.3}", mods.sell_price_pct),
    );

    results
}

// ── 4. Customer pacing sweep ────────────────────────────────────────────

fn validate_pacing(_verbose: bool) -> Vec<TestResult> {
    println!("--- Pacing ---");
    let mut results = Vec::new();

    let mut bounded = true;
    let mut prev = f64::INFINITY;
    for day in 1..=(2 * customers::SPAWN_RAMP_DAYS + 1) {
        let interval = pacing::customer_spawn_interval(day);
        if interval > prev + 1e-9
            || interval < customers::SPAWN_INTERVAL_MIN - 1e-9
            || interval > customers::SPAWN_INTERVAL_START + 1e-9
        {
            bounded = false;
        }
        prev = interval;
    }
    check(
        &mut results,
        "interval_ramp",
        bounded,
        format!(
            "day1={}s, ramped={}s",
            pacing::customer_spawn_interval(1),
            pacing::customer_spawn_interval(1 + customers::SPAWN_RAMP_DAYS)
        ),
    );

    let mut capped = true;
    for day in [1, 10, 50, 500] {
        let schedule = pacing::build_spawn_schedule(day, phase::DAY_DURATION_SECONDS);
        if schedule.len() > customers::MAX_SPAWNED_PER_DAY {
            capped = false;
        }
    }
    check(
        &mut results,
        "daily_cap",
        capped,
        format!("cap={}", customers::MAX_SPAWNED_PER_DAY),
    );

    results
}

// ── 5. Engine soak: three full days ─────────────────────────────────────

fn validate_engine_soak(verbose: bool) -> Vec<TestResult> {
    println!("--- Engine soak ---");
    let mut results = Vec::new();

    let mut engine = ShopEngine::new(default_skill_tree());
    engine.place_order(Product::Booster, 30);
    engine.place_order(Product::Single(Rarity::Rare), 10);
    for _ in 0..3 {
        assert_buy_and_place(&mut engine, &mut results);
    }

    // Stock the first shelf by hand so day 1 has sales immediately.
    let shelf = engine.layout().shelf_tiles()[0];
    let day_length = phase::DAY_DURATION_SECONDS + phase::NIGHT_DURATION_SECONDS;
    let mut invariant_violations = 0;
    let mut ticks = 0u64;
    while engine.sim_time() < 3.0 * day_length {
        engine.update(1.0 / 30.0);
        ticks += 1;
        if ticks % 30 == 0 {
            for stock in engine.layout().shelf_stocks.values() {
                if stock.qty > stock.max_qty {
                    invariant_violations += 1;
                }
                if !stock.cards.is_empty() && stock.qty as usize != stock.cards.len() {
                    invariant_violations += 1;
                }
            }
            if engine.active_customers() > customers::MAX_ACTIVE {
                invariant_violations += 1;
            }
        }
        // Keep the shelf supplied the way the manage UI would.
        if ticks % 300 == 0 {
            engine.stock_shelf(shelf, Product::Booster, 5);
        }
    }

    check(
        &mut results,
        "soak_invariants",
        invariant_violations == 0,
        format!("{invariant_violations} violations over {ticks} ticks"),
    );
    check(
        &mut results,
        "soak_days_pass",
        engine.day() >= 3,
        format!("reached day {}", engine.day()),
    );

    let total_visitors: u32 = (1..=engine.day())
        .filter_map(|d| engine.analytics().day(d))
        .map(|m| m.visitors)
        .sum();
    let total_revenue: i64 = (1..=engine.day())
        .filter_map(|d| engine.analytics().day(d))
        .map(|m| m.revenue)
        .sum();
    check(
        &mut results,
        "soak_commerce",
        total_visitors > 0 && total_revenue > 0,
        format!("{total_visitors} visitors, ${total_revenue} revenue"),
    );
    if verbose {
        println!(
            "  money {} (start {}), staff level {}",
            engine.money(),
            START_MONEY,
            engine.staff_snapshot().map(|s| s.level).unwrap_or(0)
        );
    }

    // Forecast reacts to the sales history.
    let suggestions = engine.restock_suggestions();
    let all_positive = suggestions.iter().all(|s| s.recommended_qty > 0);
    check(
        &mut results,
        "forecast_sane",
        all_positive,
        format!("{} suggestions", suggestions.len()),
    );

    // Save/load roundtrip mid-simulation.
    let mut buffer = Vec::new();
    let saved = engine.save(&mut buffer).is_ok();
    let reloaded = saved
        && serde_json::from_slice::<serde_json::Value>(&buffer).is_ok()
        && engine.load(&buffer[..]).is_ok();
    check(
        &mut results,
        "soak_save_load",
        reloaded,
        format!("{} bytes of JSON", buffer.len()),
    );

    results
}

fn assert_buy_and_place(engine: &mut ShopEngine, results: &mut Vec<TestResult>) {
    let bought = engine.try_buy_fixture(FixtureKind::Shelf);
    // Find a free tile along the top shelf row.
    let mut placed = false;
    if bought {
        for x in 2..18 {
            if engine.try_place_object(FixtureKind::Shelf, Tile::new(x, 3)) {
                placed = true;
                break;
            }
        }
    }
    if !(bought && placed) {
        check(
            results,
            "shelf_setup",
            false,
            "could not buy and place a shelf".into(),
        );
    }
}
