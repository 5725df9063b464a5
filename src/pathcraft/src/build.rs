//! Canonical build record extraction.
//!
//! Walks a decoded [`BuildDocument`] and produces the [`BuildRecord`]
//! every downstream consumer works from. The extractor is total: a
//! document section that is missing yields an empty field, never an
//! error, because anything the decoder produced is well-formed by
//! construction.

use std::collections::{BTreeMap, BTreeSet};

use serde::Serialize;

use crate::document::{BuildDocument, Element};

/// Start nodes sit below this id.
pub const START_NODE_LIMIT: u32 = 10;

/// Ascendancy nodes sit above this id.
pub const ASCENDANCY_NODE_FLOOR: u32 = 60_000;

/// Maximum ascendancy points a build can allocate. Informational only;
/// the extractor reports counts against it but never enforces it.
pub const ASCENDANCY_POINT_CAP: usize = 8;

/// Value recorded for meta attributes the document does not carry.
/// Meta keys are always present so consumers never need presence checks.
pub const UNKNOWN: &str = "Unknown";

// ============================================================================
// Record types
// ============================================================================

/// Canonical build record, one per decoded build.
#[derive(Debug, Clone, Serialize)]
pub struct BuildRecord {
    pub meta: BTreeMap<String, String>,
    pub gem_setups: Vec<GemSetup>,
    pub gear: BTreeMap<String, ItemSummary>,
    pub passives: PassiveAllocation,
    pub stats: BTreeMap<String, StatValue>,
}

/// One enabled skill group and its gem chain, in socket order.
#[derive(Debug, Clone, Serialize)]
pub struct GemSetup {
    pub label: String,
    pub gems: Vec<GemRef>,
}

impl GemSetup {
    /// The main skill: first non-support gem in socket order. A setup
    /// holding only support gems has no main skill.
    pub fn main_skill(&self) -> Option<&GemRef> {
        self.gems.iter().find(|g| !g.support)
    }
}

/// A single gem reference inside a setup.
#[derive(Debug, Clone, Serialize)]
pub struct GemRef {
    pub name: String,
    pub level: u32,
    pub quality: u32,
    pub enabled: bool,
    pub support: bool,
}

/// Item rarity as declared in the item's text block.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Rarity {
    Normal,
    Magic,
    Rare,
    Unique,
    Relic,
}

impl Rarity {
    fn from_marker(s: &str) -> Self {
        match s.to_ascii_uppercase().as_str() {
            "MAGIC" => Rarity::Magic,
            "RARE" => Rarity::Rare,
            "UNIQUE" => Rarity::Unique,
            "RELIC" => Rarity::Relic,
            _ => Rarity::Normal,
        }
    }

    /// Whether the text block carries a separate name line ahead of the
    /// base type line. Misreading this offset maps fields wrongly, so
    /// the branch is required, not cosmetic.
    fn has_name_line(self) -> bool {
        matches!(self, Rarity::Rare | Rarity::Unique | Rarity::Relic)
    }
}

/// Summary of one equipped item, parsed from its text block.
#[derive(Debug, Clone, Serialize)]
pub struct ItemSummary {
    pub name: String,
    pub base_type: String,
    pub rarity: Rarity,
    pub level_req: u32,
    pub quality: u32,
}

/// Allocated passive nodes, partitioned by id range.
///
/// The partition is total and disjoint: every node id lands in exactly
/// one bucket.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PassiveAllocation {
    pub start: BTreeSet<u32>,
    pub ascendancy: BTreeSet<u32>,
    pub regular: BTreeSet<u32>,
}

impl PassiveAllocation {
    pub fn total(&self) -> usize {
        self.start.len() + self.ascendancy.len() + self.regular.len()
    }

    /// Allocated ascendancy points against the fixed cap.
    pub fn ascendancy_points(&self) -> (usize, usize) {
        (self.ascendancy.len(), ASCENDANCY_POINT_CAP)
    }
}

/// Bucket a node id falls into.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeClass {
    Start,
    Ascendancy,
    Regular,
}

/// Classify a passive node id. Total over the whole id space.
pub fn classify_node(id: u32) -> NodeClass {
    if id < START_NODE_LIMIT {
        NodeClass::Start
    } else if id > ASCENDANCY_NODE_FLOOR {
        NodeClass::Ascendancy
    } else {
        NodeClass::Regular
    }
}

/// A reported stat value, coerced once at extraction time.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum StatValue {
    Number(f64),
    Text(String),
}

impl StatValue {
    /// Three-tier coercion, applied per value independently: an
    /// infinity literal is kept as a floating sentinel, text with a
    /// decimal point or exponent parses as float, otherwise integer,
    /// otherwise the raw text is retained.
    pub fn coerce(raw: &str) -> StatValue {
        let trimmed = raw.trim();
        match trimmed.to_ascii_lowercase().as_str() {
            "inf" | "+inf" | "infinity" | "+infinity" => return StatValue::Number(f64::INFINITY),
            "-inf" | "-infinity" => return StatValue::Number(f64::NEG_INFINITY),
            _ => {}
        }
        if trimmed.contains(['.', 'e', 'E']) {
            if let Ok(f) = trimmed.parse::<f64>() {
                return StatValue::Number(f);
            }
        } else if let Ok(i) = trimmed.parse::<i64>() {
            return StatValue::Number(i as f64);
        }
        StatValue::Text(raw.to_string())
    }
}

// ============================================================================
// Extraction
// ============================================================================

/// Extract the canonical record from a decoded document.
///
/// `source_ref` is the link or identifier the code came from and is
/// recorded in `meta` under `source`.
pub fn extract(doc: &BuildDocument, source_ref: &str) -> BuildRecord {
    BuildRecord {
        meta: extract_meta(doc, source_ref),
        gem_setups: extract_gem_setups(doc),
        gear: extract_gear(doc),
        passives: extract_passives(doc),
        stats: extract_stats(doc),
    }
}

fn meta_attr(elem: Option<&Element>, name: &str) -> String {
    elem.and_then(|e| e.attr(name))
        .filter(|v| !v.is_empty())
        .unwrap_or(UNKNOWN)
        .to_string()
}

fn extract_meta(doc: &BuildDocument, source_ref: &str) -> BTreeMap<String, String> {
    let build = doc.build();
    let class = meta_attr(build, "className");
    let ascendancy = meta_attr(build, "ascendClassName");
    let level = meta_attr(build, "level");

    // Declared name when present, otherwise a composed placeholder in
    // the same shape the report scripts print.
    let build_name = build
        .and_then(|b| b.attr("name"))
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| {
            if class == UNKNOWN {
                UNKNOWN.to_string()
            } else {
                format!("{class} {ascendancy} Lvl {level}")
            }
        });

    let mut meta = BTreeMap::new();
    meta.insert("class".to_string(), class);
    meta.insert("ascendancy".to_string(), ascendancy);
    meta.insert("level".to_string(), level);
    meta.insert("build_name".to_string(), build_name);
    meta.insert(
        "source".to_string(),
        if source_ref.is_empty() {
            UNKNOWN.to_string()
        } else {
            source_ref.to_string()
        },
    );
    meta.insert("bandit".to_string(), meta_attr(build, "bandit"));
    meta.insert(
        "pantheon_major".to_string(),
        meta_attr(build, "pantheonMajorGod"),
    );
    meta.insert(
        "pantheon_minor".to_string(),
        meta_attr(build, "pantheonMinorGod"),
    );
    meta.insert(
        "tree_version".to_string(),
        meta_attr(doc.tree(), "treeVersion"),
    );
    meta
}

fn extract_gem_setups(doc: &BuildDocument) -> Vec<GemSetup> {
    let Some(skills) = doc.skills() else {
        return Vec::new();
    };

    let mut setups = Vec::new();
    for skill in skills.descendants_named("Skill") {
        // Only groups explicitly enabled in the document count.
        if skill.attr("enabled") != Some("true") {
            continue;
        }

        let gems: Vec<GemRef> = skill.children_named("Gem").map(parse_gem).collect();
        if gems.is_empty() {
            continue;
        }

        let label = skill
            .attr("label")
            .filter(|l| !l.trim().is_empty())
            .or_else(|| skill.attr("slot").filter(|s| !s.trim().is_empty()))
            .map(|l| l.trim().to_string())
            .unwrap_or_else(|| gems[0].name.clone());

        setups.push(GemSetup { label, gems });
    }
    setups
}

fn parse_gem(gem: &Element) -> GemRef {
    let name = gem
        .attr("nameSpec")
        .filter(|n| !n.is_empty())
        .or_else(|| gem.attr("skillId"))
        .unwrap_or_default()
        .to_string();
    GemRef {
        name,
        level: attr_u32(gem, "level").unwrap_or(1),
        quality: attr_u32(gem, "quality").unwrap_or(0),
        enabled: gem.attr("enabled") != Some("false"),
        support: matches!(gem.attr("support"), Some("true") | Some("1")),
    }
}

fn attr_u32(elem: &Element, name: &str) -> Option<u32> {
    elem.attr(name).and_then(|v| v.trim().parse().ok())
}

fn extract_gear(doc: &BuildDocument) -> BTreeMap<String, ItemSummary> {
    let Some(items) = doc.items() else {
        return BTreeMap::new();
    };

    // Item text blocks by id.
    let mut item_texts: BTreeMap<&str, &str> = BTreeMap::new();
    for item in items.descendants_named("Item") {
        if let Some(id) = item.attr("id") {
            item_texts.insert(id, item.text.as_str());
        }
    }

    // The active item set is the one the build actually wears; the
    // others are stashed weapon swaps and theorycraft sets.
    let active_id = items.attr("activeItemSet").unwrap_or("1");
    let item_set = items
        .descendants_named("ItemSet")
        .into_iter()
        .find(|set| set.attr("id") == Some(active_id))
        .or_else(|| items.descendants_named("ItemSet").into_iter().next());

    let mut gear = BTreeMap::new();
    let Some(item_set) = item_set else {
        return gear;
    };

    for slot in item_set.children_named("Slot") {
        let (Some(slot_name), Some(item_id)) = (slot.attr("name"), slot.attr("itemId")) else {
            continue;
        };
        if item_id == "0" {
            continue;
        }
        if let Some(summary) = item_texts.get(item_id).and_then(|t| parse_item_summary(t)) {
            gear.insert(slot_name.to_string(), summary);
        }
    }
    gear
}

/// Parse one item text block into a summary.
///
/// Blocks are line-oriented. The line after the `Rarity:` marker is the
/// display name for rarities that carry one (the base type follows on
/// the next line); Normal and Magic items lead with the base type
/// directly.
fn parse_item_summary(text: &str) -> Option<ItemSummary> {
    let lines: Vec<&str> = text
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect();

    let rarity_idx = lines.iter().position(|l| l.starts_with("Rarity:"))?;
    let rarity = Rarity::from_marker(lines[rarity_idx]["Rarity:".len()..].trim());

    let name = lines.get(rarity_idx + 1)?.to_string();
    let base_type = if rarity.has_name_line() {
        lines
            .get(rarity_idx + 2)
            .copied()
            .unwrap_or(name.as_str())
            .to_string()
    } else {
        name.clone()
    };

    let mut summary = ItemSummary {
        name,
        base_type,
        rarity,
        level_req: 0,
        quality: 0,
    };
    for line in &lines {
        if let Some(rest) = line.strip_prefix("LevelReq:") {
            summary.level_req = rest.trim().parse().unwrap_or(0);
        } else if let Some(rest) = line.strip_prefix("Quality:") {
            summary.quality = rest.trim().trim_start_matches('+').parse().unwrap_or(0);
        }
    }
    Some(summary)
}

fn extract_passives(doc: &BuildDocument) -> PassiveAllocation {
    let Some(tree) = doc.tree() else {
        return PassiveAllocation::default();
    };

    let active_id = tree.attr("activeSpec").unwrap_or("1");
    let spec = tree
        .children_named("Spec")
        .find(|s| s.attr("id") == Some(active_id))
        .or_else(|| tree.children_named("Spec").next());

    let mut allocation = PassiveAllocation::default();
    let Some(nodes) = spec.and_then(|s| s.attr("nodes")) else {
        return allocation;
    };

    for raw in nodes.split(',') {
        let Ok(id) = raw.trim().parse::<u32>() else {
            continue;
        };
        match classify_node(id) {
            NodeClass::Start => allocation.start.insert(id),
            NodeClass::Ascendancy => allocation.ascendancy.insert(id),
            NodeClass::Regular => allocation.regular.insert(id),
        };
    }
    allocation
}

fn extract_stats(doc: &BuildDocument) -> BTreeMap<String, StatValue> {
    let Some(build) = doc.build() else {
        return BTreeMap::new();
    };

    let mut stats = BTreeMap::new();
    for stat in build.descendants_named("PlayerStat") {
        let (Some(key), Some(value)) = (stat.attr("stat"), stat.attr("value")) else {
            continue;
        };
        stats.insert(key.to_string(), StatValue::coerce(value));
    }
    stats
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::parse_document;

    fn doc(xml: &str) -> BuildDocument {
        parse_document(xml).unwrap()
    }

    const FULL_BUILD: &str = r#"<PathOfBuilding>
    <Build className="Witch" ascendClassName="Occultist" level="92" bandit="None">
        <PlayerStat stat="Life" value="4870"/>
        <PlayerStat stat="TotalDPS" value="1234567.5"/>
        <PlayerStat stat="ManaUnreserved" value="inf"/>
        <PlayerStat stat="SkillName" value="Hexblast"/>
    </Build>
    <Skills>
        <SkillSet id="1">
            <Skill enabled="true" label="Hexblast Setup">
                <Gem nameSpec="Hexblast" level="21" quality="20"/>
                <Gem nameSpec="Void Manipulation Support" level="20" support="true"/>
            </Skill>
            <Skill enabled="true" slot="Helmet">
                <Gem nameSpec="Despair" level="20"/>
            </Skill>
            <Skill enabled="false" label="Swap">
                <Gem nameSpec="Forbidden Rite"/>
            </Skill>
        </SkillSet>
    </Skills>
    <Items activeItemSet="2">
        <Item id="1">Rarity: UNIQUE
Void Battery
Prophecy Wand
LevelReq: 68
Implicits: 1</Item>
        <Item id="2">Rarity: MAGIC
Seething Divine Life Flask of Staunching
Quality: 20</Item>
        <ItemSet id="1">
            <Slot name="Weapon 1" itemId="2"/>
        </ItemSet>
        <ItemSet id="2">
            <Slot name="Weapon 1" itemId="1"/>
            <Slot name="Flask 1" itemId="2"/>
            <Slot name="Weapon 2" itemId="0"/>
        </ItemSet>
    </Items>
    <Tree activeSpec="2" treeVersion="3_25">
        <Spec id="1" nodes="4,100"/>
        <Spec id="2" nodes="1, 2, 70000, 5, 1500"/>
    </Tree>
</PathOfBuilding>"#;

    #[test]
    fn test_meta_always_has_keys() {
        let record = extract(&doc(FULL_BUILD), "https://pobb.in/abc");
        assert_eq!(record.meta["class"], "Witch");
        assert_eq!(record.meta["ascendancy"], "Occultist");
        assert_eq!(record.meta["source"], "https://pobb.in/abc");
        assert_eq!(record.meta["tree_version"], "3_25");
        // Absent attributes are recorded, not dropped.
        assert_eq!(record.meta["pantheon_major"], UNKNOWN);
    }

    #[test]
    fn test_meta_unknown_on_empty_document() {
        let record = extract(&doc("<PathOfBuilding/>"), "");
        assert_eq!(record.meta["class"], UNKNOWN);
        assert_eq!(record.meta["build_name"], UNKNOWN);
        assert_eq!(record.meta["source"], UNKNOWN);
    }

    #[test]
    fn test_disabled_skill_groups_are_skipped() {
        let record = extract(&doc(FULL_BUILD), "");
        let labels: Vec<&str> = record.gem_setups.iter().map(|s| s.label.as_str()).collect();
        assert_eq!(labels, vec!["Hexblast Setup", "Helmet"]);
    }

    #[test]
    fn test_main_skill_is_first_non_support() {
        let record = extract(&doc(FULL_BUILD), "");
        let setup = &record.gem_setups[0];
        assert_eq!(setup.main_skill().map(|g| g.name.as_str()), Some("Hexblast"));
    }

    #[test]
    fn test_main_skill_stable_under_support_reordering() {
        let base = GemRef {
            name: String::new(),
            level: 20,
            quality: 0,
            enabled: true,
            support: true,
        };
        let main = GemRef {
            name: "Hexblast".into(),
            support: false,
            ..base.clone()
        };
        let sup = |n: &str| GemRef {
            name: n.into(),
            ..base.clone()
        };

        let a = GemSetup {
            label: "x".into(),
            gems: vec![sup("A"), main.clone(), sup("B"), sup("C")],
        };
        let b = GemSetup {
            label: "x".into(),
            gems: vec![sup("A"), main.clone(), sup("C"), sup("B")],
        };
        assert_eq!(a.main_skill().unwrap().name, b.main_skill().unwrap().name);
    }

    #[test]
    fn test_all_support_setup_has_no_main_skill() {
        let setup = GemSetup {
            label: "auras".into(),
            gems: vec![GemRef {
                name: "Enlighten Support".into(),
                level: 4,
                quality: 0,
                enabled: true,
                support: true,
            }],
        };
        assert!(setup.main_skill().is_none());
    }

    #[test]
    fn test_gear_uses_active_item_set() {
        let record = extract(&doc(FULL_BUILD), "");
        let weapon = &record.gear["Weapon 1"];
        assert_eq!(weapon.name, "Void Battery");
        assert_eq!(weapon.base_type, "Prophecy Wand");
        assert_eq!(weapon.rarity, Rarity::Unique);
        assert_eq!(weapon.level_req, 68);
        // Empty slots are not reported.
        assert!(!record.gear.contains_key("Weapon 2"));
    }

    #[test]
    fn test_magic_item_has_no_name_line() {
        let record = extract(&doc(FULL_BUILD), "");
        let flask = &record.gear["Flask 1"];
        assert_eq!(flask.base_type, "Seething Divine Life Flask of Staunching");
        assert_eq!(flask.rarity, Rarity::Magic);
        assert_eq!(flask.quality, 20);
    }

    #[test]
    fn test_passive_partition_example() {
        let record = extract(&doc(FULL_BUILD), "");
        let p = &record.passives;
        assert_eq!(p.start, BTreeSet::from([1, 2, 5]));
        assert_eq!(p.ascendancy, BTreeSet::from([70000]));
        assert_eq!(p.regular, BTreeSet::from([1500]));
        assert_eq!(p.ascendancy_points(), (1, ASCENDANCY_POINT_CAP));
    }

    #[test]
    fn test_node_partition_is_total_and_disjoint() {
        for id in [0, 9, 10, 59_999, 60_000, 60_001, u32::MAX] {
            let class = classify_node(id);
            let expected = if id < 10 {
                NodeClass::Start
            } else if id > 60_000 {
                NodeClass::Ascendancy
            } else {
                NodeClass::Regular
            };
            assert_eq!(class, expected, "id {id}");
        }
    }

    #[test]
    fn test_stat_coercion_tiers() {
        assert_eq!(StatValue::coerce("4870"), StatValue::Number(4870.0));
        assert_eq!(StatValue::coerce("12.5"), StatValue::Number(12.5));
        assert_eq!(StatValue::coerce("1e6"), StatValue::Number(1_000_000.0));
        assert_eq!(StatValue::coerce("inf"), StatValue::Number(f64::INFINITY));
        assert_eq!(
            StatValue::coerce("-inf"),
            StatValue::Number(f64::NEG_INFINITY)
        );
        assert_eq!(
            StatValue::coerce("Hexblast"),
            StatValue::Text("Hexblast".into())
        );
    }

    #[test]
    fn test_stats_coerced_independently() {
        let record = extract(&doc(FULL_BUILD), "");
        assert_eq!(record.stats["Life"], StatValue::Number(4870.0));
        assert_eq!(record.stats["TotalDPS"], StatValue::Number(1_234_567.5));
        assert_eq!(
            record.stats["ManaUnreserved"],
            StatValue::Number(f64::INFINITY)
        );
        assert_eq!(record.stats["SkillName"], StatValue::Text("Hexblast".into()));
    }

    #[test]
    fn test_missing_sections_yield_empty_fields() {
        let record = extract(&doc("<PathOfBuilding/>"), "");
        assert!(record.gem_setups.is_empty());
        assert!(record.gear.is_empty());
        assert_eq!(record.passives.total(), 0);
        assert!(record.stats.is_empty());
    }
}
