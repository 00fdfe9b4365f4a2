//! Skill tree: static node definitions, player rank state, and the
//! aggregated modifier cache.
//!
//! The tree definition is an explicitly constructed, immutable value that
//! callers pass into every function needing it; only [`SkillTreeState`] is
//! mutable per-session state. Definitions are validated at construction:
//! every prerequisite must exist, ranks are >= 1, and the prerequisite graph
//! is acyclic.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashSet};
use std::fmt;

use crate::progression::PlayerProgression;

/// Aggregated fractional skill effects (0.10 == +10%).
///
/// Combinable by addition and scalar scaling; the per-rank contributions of
/// every owned skill sum into one value.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct Modifiers {
    pub sell_price_pct: f32,
    pub sales_xp_pct: f32,
    pub battle_xp_pct: f32,
    pub fixture_discount_pct: f32,
}

impl Modifiers {
    pub fn scale(self, k: f32) -> Self {
        Self {
            sell_price_pct: self.sell_price_pct * k,
            sales_xp_pct: self.sales_xp_pct * k,
            battle_xp_pct: self.battle_xp_pct * k,
            fixture_discount_pct: self.fixture_discount_pct * k,
        }
    }
}

impl std::ops::Add for Modifiers {
    type Output = Self;
    fn add(self, other: Self) -> Self {
        Self {
            sell_price_pct: self.sell_price_pct + other.sell_price_pct,
            sales_xp_pct: self.sales_xp_pct + other.sales_xp_pct,
            battle_xp_pct: self.battle_xp_pct + other.battle_xp_pct,
            fixture_discount_pct: self.fixture_discount_pct + other.fixture_discount_pct,
        }
    }
}

/// A prerequisite edge: `skill_id` must be at `rank` or higher.
#[derive(Debug, Clone)]
pub struct SkillPrereq {
    pub skill_id: &'static str,
    pub rank: u32,
}

/// One node in the static skill tree.
#[derive(Debug, Clone)]
pub struct SkillNodeDef {
    pub skill_id: &'static str,
    pub name: &'static str,
    pub desc: &'static str,
    pub max_rank: u32,
    pub level_req: u32,
    pub prereqs: Vec<SkillPrereq>,
    pub mods_per_rank: Modifiers,
}

/// Errors found while validating a tree definition.
#[derive(Debug, PartialEq, Eq)]
pub enum SkillTreeError {
    TooFewNodes(usize),
    BadMaxRank(&'static str),
    BadLevelReq(&'static str),
    MissingPrereq { skill: &'static str, prereq: &'static str },
    BadPrereqRank(&'static str),
    PrereqCycle(&'static str),
}

impl fmt::Display for SkillTreeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SkillTreeError::TooFewNodes(n) => write!(f, "skill tree needs >= 20 nodes, got {n}"),
            SkillTreeError::BadMaxRank(s) => write!(f, "{s}: max_rank must be >= 1"),
            SkillTreeError::BadLevelReq(s) => write!(f, "{s}: level_req must be >= 1"),
            SkillTreeError::MissingPrereq { skill, prereq } => {
                write!(f, "{skill}: prerequisite `{prereq}` does not exist")
            }
            SkillTreeError::BadPrereqRank(s) => write!(f, "{s}: prerequisite rank must be >= 1"),
            SkillTreeError::PrereqCycle(s) => write!(f, "prerequisite cycle detected at {s}"),
        }
    }
}

impl std::error::Error for SkillTreeError {}

/// The validated, immutable skill tree.
#[derive(Debug, Clone)]
pub struct SkillTreeDef {
    nodes: BTreeMap<&'static str, SkillNodeDef>,
}

impl SkillTreeDef {
    /// Build and validate a tree from its nodes.
    pub fn new(nodes: Vec<SkillNodeDef>) -> Result<Self, SkillTreeError> {
        let map: BTreeMap<&'static str, SkillNodeDef> =
            nodes.into_iter().map(|n| (n.skill_id, n)).collect();
        let tree = Self { nodes: map };
        tree.validate()?;
        Ok(tree)
    }

    pub fn get(&self, skill_id: &str) -> Option<&SkillNodeDef> {
        self.nodes.get(skill_id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &SkillNodeDef> {
        self.nodes.values()
    }

    fn validate(&self) -> Result<(), SkillTreeError> {
        if self.nodes.len() < 20 {
            return Err(SkillTreeError::TooFewNodes(self.nodes.len()));
        }
        for node in self.nodes.values() {
            if node.max_rank < 1 {
                return Err(SkillTreeError::BadMaxRank(node.skill_id));
            }
            if node.level_req < 1 {
                return Err(SkillTreeError::BadLevelReq(node.skill_id));
            }
            for pr in &node.prereqs {
                if !self.nodes.contains_key(pr.skill_id) {
                    return Err(SkillTreeError::MissingPrereq {
                        skill: node.skill_id,
                        prereq: pr.skill_id,
                    });
                }
                if pr.rank < 1 {
                    return Err(SkillTreeError::BadPrereqRank(node.skill_id));
                }
            }
        }
        // DFS cycle check over prerequisite edges.
        let mut visited = HashSet::new();
        for &sid in self.nodes.keys() {
            self.dfs(sid, &mut HashSet::new(), &mut visited)?;
        }
        Ok(())
    }

    fn dfs(
        &self,
        cur: &'static str,
        visiting: &mut HashSet<&'static str>,
        visited: &mut HashSet<&'static str>,
    ) -> Result<(), SkillTreeError> {
        if visited.contains(cur) {
            return Ok(());
        }
        if !visiting.insert(cur) {
            return Err(SkillTreeError::PrereqCycle(cur));
        }
        for pr in &self.nodes[cur].prereqs {
            self.dfs(pr.skill_id, visiting, visited)?;
        }
        visiting.remove(cur);
        visited.insert(cur);
        Ok(())
    }
}

/// Why a rank-up is currently impossible.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RankUpBlock {
    UnknownSkill,
    MaxRank,
    NoSkillPoints,
    LevelTooLow(u32),
    PrereqUnmet { skill_id: String, rank: u32 },
}

impl fmt::Display for RankUpBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RankUpBlock::UnknownSkill => write!(f, "Unknown skill."),
            RankUpBlock::MaxRank => write!(f, "Already max rank."),
            RankUpBlock::NoSkillPoints => write!(f, "No skill points."),
            RankUpBlock::LevelTooLow(req) => write!(f, "Requires level {req}."),
            RankUpBlock::PrereqUnmet { skill_id, rank } => {
                write!(f, "Requires {skill_id} rank {rank}.")
            }
        }
    }
}

/// Player-owned skill ranks plus the cached aggregated modifiers.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SkillTreeState {
    pub ranks: BTreeMap<String, u32>,
    /// Memoized aggregate; `None` means dirty.
    #[serde(skip)]
    cached_mods: Option<Modifiers>,
}

impl SkillTreeState {
    pub fn rank(&self, skill_id: &str) -> u32 {
        self.ranks.get(skill_id).copied().unwrap_or(0)
    }

    /// Check every rank-up gate without mutating anything.
    pub fn can_rank_up(
        &self,
        tree: &SkillTreeDef,
        skill_id: &str,
        prog: &PlayerProgression,
    ) -> Result<(), RankUpBlock> {
        let node = tree.get(skill_id).ok_or(RankUpBlock::UnknownSkill)?;
        if self.rank(skill_id) >= node.max_rank {
            return Err(RankUpBlock::MaxRank);
        }
        if prog.skill_points == 0 {
            return Err(RankUpBlock::NoSkillPoints);
        }
        if prog.level < node.level_req {
            return Err(RankUpBlock::LevelTooLow(node.level_req));
        }
        for pr in &node.prereqs {
            if self.rank(pr.skill_id) < pr.rank {
                return Err(RankUpBlock::PrereqUnmet {
                    skill_id: pr.skill_id.to_string(),
                    rank: pr.rank,
                });
            }
        }
        Ok(())
    }

    /// Spend one skill point on a rank. Returns `false` when any gate fails.
    pub fn rank_up(
        &mut self,
        tree: &SkillTreeDef,
        skill_id: &str,
        prog: &mut PlayerProgression,
    ) -> bool {
        if self.can_rank_up(tree, skill_id, prog).is_err() {
            return false;
        }
        *self.ranks.entry(skill_id.to_string()).or_insert(0) += 1;
        prog.skill_points -= 1;
        self.cached_mods = None;
        true
    }

    /// Aggregated modifiers, memoized until the next rank-up. Ranks beyond a
    /// node's max (possible only in damaged saves) are capped.
    pub fn modifiers(&mut self, tree: &SkillTreeDef) -> Modifiers {
        if let Some(mods) = self.cached_mods {
            return mods;
        }
        let mut mods = Modifiers::default();
        for (skill_id, &rank) in &self.ranks {
            if rank == 0 {
                continue;
            }
            if let Some(node) = tree.get(skill_id) {
                mods = mods + node.mods_per_rank.scale(rank.min(node.max_rank) as f32);
            }
        }
        self.cached_mods = Some(mods);
        mods
    }

    /// Drop the memoized aggregate (used after load).
    pub fn invalidate(&mut self) {
        self.cached_mods = None;
    }
}

/// The game's default skill tree (23 nodes).
pub fn default_skill_tree() -> SkillTreeDef {
    fn node(
        skill_id: &'static str,
        name: &'static str,
        desc: &'static str,
        max_rank: u32,
        level_req: u32,
        prereqs: Vec<SkillPrereq>,
        mods_per_rank: Modifiers,
    ) -> SkillNodeDef {
        SkillNodeDef {
            skill_id,
            name,
            desc,
            max_rank,
            level_req,
            prereqs,
            mods_per_rank,
        }
    }
    fn pre(skill_id: &'static str, rank: u32) -> SkillPrereq {
        SkillPrereq { skill_id, rank }
    }
    let sell = |pct| Modifiers { sell_price_pct: pct, ..Modifiers::default() };
    let sales_xp = |pct| Modifiers { sales_xp_pct: pct, ..Modifiers::default() };
    let battle_xp = |pct| Modifiers { battle_xp_pct: pct, ..Modifiers::default() };
    let fixture = |pct| Modifiers { fixture_discount_pct: pct, ..Modifiers::default() };

    let nodes = vec![
        // Commerce spine
        node("haggle", "Haggle", "Increase your sell prices slightly.", 10, 1, vec![], sell(0.01)),
        node(
            "premium_display",
            "Premium Display",
            "Better presentation means customers pay a little more.",
            10,
            5,
            vec![pre("haggle", 3)],
            sell(0.005),
        ),
        node(
            "local_reputation",
            "Local Reputation",
            "Earn more XP from sales.",
            5,
            3,
            vec![pre("haggle", 2)],
            sales_xp(0.05),
        ),
        node(
            "bulk_buying",
            "Bulk Buying",
            "Discount fixture purchases.",
            5,
            8,
            vec![pre("premium_display", 3)],
            fixture(0.03),
        ),
        node(
            "market_savvy",
            "Market Savvy",
            "Earn more XP from battle wins.",
            5,
            6,
            vec![pre("local_reputation", 2)],
            battle_xp(0.05),
        ),
        // Battle branch
        node("sparring", "Sparring", "Learn by fighting; +battle XP.", 5, 1, vec![], battle_xp(0.05)),
        node(
            "tactics",
            "Tactics",
            "More battle XP from smarter play.",
            5,
            4,
            vec![pre("sparring", 2)],
            battle_xp(0.05),
        ),
        node(
            "champion",
            "Champion",
            "A proven winner; more battle XP.",
            5,
            10,
            vec![pre("tactics", 3)],
            battle_xp(0.06),
        ),
        // Operations branch
        node(
            "shopkeeping",
            "Shopkeeping",
            "Core shop operations training.",
            5,
            1,
            vec![],
            sales_xp(0.03),
        ),
        node(
            "inventory_habits",
            "Inventory Habits",
            "Learn to run tighter operations.",
            5,
            4,
            vec![pre("shopkeeping", 2)],
            Modifiers::default(),
        ),
        node(
            "store_layout",
            "Store Layout",
            "Place fixtures intentionally.",
            5,
            6,
            vec![pre("shopkeeping", 2)],
            fixture(0.01),
        ),
        node(
            "community_events",
            "Community Events",
            "More sales XP from engagement.",
            5,
            7,
            vec![pre("shopkeeping", 3)],
            sales_xp(0.04),
        ),
        node(
            "collector",
            "Collector",
            "A love of cards keeps you motivated (+sales XP).",
            5,
            2,
            vec![pre("haggle", 1)],
            sales_xp(0.03),
        ),
        node(
            "advertising",
            "Advertising",
            "Premium display has more impact on pricing.",
            5,
            9,
            vec![pre("premium_display", 4)],
            sell(0.004),
        ),
        node(
            "vip_regulars",
            "VIP Regulars",
            "Regulars pay a little more.",
            5,
            12,
            vec![pre("advertising", 2)],
            sell(0.004),
        ),
        node(
            "shrewd_deals",
            "Shrewd Deals",
            "Discount fixtures further.",
            5,
            14,
            vec![pre("bulk_buying", 2)],
            fixture(0.02),
        ),
        node(
            "sales_grind",
            "Sales Grind",
            "More XP from sales (practice).",
            10,
            11,
            vec![pre("local_reputation", 3)],
            sales_xp(0.02),
        ),
        node(
            "battle_grind",
            "Battle Grind",
            "More XP from wins (practice).",
            10,
            11,
            vec![pre("tactics", 2)],
            battle_xp(0.02),
        ),
        node(
            "master_merchant",
            "Master Merchant",
            "Late-game pricing edge.",
            10,
            25,
            vec![pre("vip_regulars", 3), pre("sales_grind", 5)],
            sell(0.003),
        ),
        node(
            "legend",
            "Legend",
            "Late-game battle XP edge.",
            10,
            25,
            vec![pre("champion", 3), pre("battle_grind", 5)],
            battle_xp(0.02),
        ),
        node(
            "frugal_builder",
            "Frugal Builder",
            "Fixtures are cheaper.",
            10,
            15,
            vec![pre("store_layout", 2)],
            fixture(0.01),
        ),
        node(
            "efficiency",
            "Efficiency",
            "General skill; more sales XP.",
            10,
            10,
            vec![pre("inventory_habits", 2)],
            sales_xp(0.01),
        ),
        node(
            "grit",
            "Grit",
            "General skill; more battle XP.",
            10,
            10,
            vec![pre("sparring", 3)],
            battle_xp(0.01),
        ),
    ];
    SkillTreeDef::new(nodes).expect("default skill tree is valid")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn prog_with(level: u32, points: u32) -> PlayerProgression {
        PlayerProgression {
            level,
            xp: 0,
            skill_points: points,
        }
    }

    #[test]
    fn default_tree_validates() {
        let tree = default_skill_tree();
        assert!(tree.len() >= 20);
    }

    #[test]
    fn too_few_nodes_rejected() {
        let nodes = vec![SkillNodeDef {
            skill_id: "only",
            name: "Only",
            desc: "",
            max_rank: 1,
            level_req: 1,
            prereqs: vec![],
            mods_per_rank: Modifiers::default(),
        }];
        assert_eq!(SkillTreeDef::new(nodes).unwrap_err(), SkillTreeError::TooFewNodes(1));
    }

    fn filler_nodes(count: usize) -> Vec<SkillNodeDef> {
        const IDS: [&str; 24] = [
            "f0", "f1", "f2", "f3", "f4", "f5", "f6", "f7", "f8", "f9", "f10", "f11", "f12",
            "f13", "f14", "f15", "f16", "f17", "f18", "f19", "f20", "f21", "f22", "f23",
        ];
        IDS[..count]
            .iter()
            .map(|id| SkillNodeDef {
                skill_id: id,
                name: "Filler",
                desc: "",
                max_rank: 1,
                level_req: 1,
                prereqs: vec![],
                mods_per_rank: Modifiers::default(),
            })
            .collect()
    }

    #[test]
    fn missing_prereq_rejected() {
        let mut nodes = filler_nodes(20);
        nodes[0].prereqs = vec![SkillPrereq { skill_id: "ghost", rank: 1 }];
        assert_eq!(
            SkillTreeDef::new(nodes).unwrap_err(),
            SkillTreeError::MissingPrereq { skill: "f0", prereq: "ghost" }
        );
    }

    #[test]
    fn cycle_rejected() {
        let mut nodes = filler_nodes(20);
        nodes[0].prereqs = vec![SkillPrereq { skill_id: "f1", rank: 1 }];
        nodes[1].prereqs = vec![SkillPrereq { skill_id: "f0", rank: 1 }];
        assert!(matches!(
            SkillTreeDef::new(nodes).unwrap_err(),
            SkillTreeError::PrereqCycle(_)
        ));
    }

    #[test]
    fn rank_up_happy_path_consumes_one_point() {
        let tree = default_skill_tree();
        let mut state = SkillTreeState::default();
        let mut prog = prog_with(1, 3);
        assert!(state.rank_up(&tree, "haggle", &mut prog));
        assert_eq!(state.rank("haggle"), 1);
        assert_eq!(prog.skill_points, 2);
    }

    #[test]
    fn rank_up_gates() {
        let tree = default_skill_tree();
        let mut state = SkillTreeState::default();

        // No points.
        let mut broke = prog_with(10, 0);
        assert!(!state.rank_up(&tree, "haggle", &mut broke));

        // Level too low.
        let mut low = prog_with(1, 5);
        assert_eq!(
            state.can_rank_up(&tree, "premium_display", &low),
            Err(RankUpBlock::LevelTooLow(5))
        );

        // Prereq unmet: premium_display needs haggle 3.
        low.level = 20;
        assert!(matches!(
            state.can_rank_up(&tree, "premium_display", &low),
            Err(RankUpBlock::PrereqUnmet { .. })
        ));

        // Unknown skill.
        assert!(!state.rank_up(&tree, "time_travel", &mut low));

        // Max rank.
        let mut rich = prog_with(50, 100);
        for _ in 0..10 {
            assert!(state.rank_up(&tree, "haggle", &mut rich));
        }
        assert!(!state.rank_up(&tree, "haggle", &mut rich));
        assert_eq!(rich.skill_points, 90);
    }

    #[test]
    fn haggle_five_ranks_sums_modifiers() {
        let tree = default_skill_tree();
        let mut state = SkillTreeState::default();
        let mut prog = prog_with(10, 5);
        for _ in 0..5 {
            assert!(state.rank_up(&tree, "haggle", &mut prog));
        }
        let mods = state.modifiers(&tree);
        assert!((mods.sell_price_pct - 0.05).abs() < 1e-6);
        assert_eq!(prog.skill_points, 0);
    }

    #[test]
    fn modifier_cache_invalidates_on_rank_up() {
        let tree = default_skill_tree();
        let mut state = SkillTreeState::default();
        let mut prog = prog_with(10, 2);
        let before = state.modifiers(&tree);
        assert_eq!(before, Modifiers::default());
        state.rank_up(&tree, "sparring", &mut prog);
        let after = state.modifiers(&tree);
        assert!(after.battle_xp_pct > 0.0);
    }

    #[test]
    fn loaded_overranked_skill_is_capped() {
        let tree = default_skill_tree();
        let mut state = SkillTreeState::default();
        // haggle max_rank is 10; a damaged save may carry more.
        state.ranks.insert("haggle".into(), 40);
        let mods = state.modifiers(&tree);
        assert!((mods.sell_price_pct - 0.10).abs() < 1e-6);
    }

    #[test]
    fn modifiers_add_and_scale() {
        let a = Modifiers { sell_price_pct: 0.01, ..Modifiers::default() };
        let b = Modifiers { sales_xp_pct: 0.02, ..Modifiers::default() };
        let sum = a + b;
        assert!((sum.sell_price_pct - 0.01).abs() < 1e-6);
        assert!((sum.sales_xp_pct - 0.02).abs() < 1e-6);
        let scaled = sum.scale(3.0);
        assert!((scaled.sell_price_pct - 0.03).abs() < 1e-6);
    }
}
