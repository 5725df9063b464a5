//! Localized stat text resolution.
//!
//! Maps localized stat lines (the catalog data ships Korean matchers)
//! to stable trade-system stat identifiers. Resolution runs a fixed
//! pipeline: normalize, pseudo-stat shortcut, exact matcher lookup,
//! fuzzy fallback. A miss is a normal outcome, not an error; only a
//! catalog that fails to load is surfaced as a failure.
//!
//! The mapper is an explicit context object constructed from a catalog
//! once and shared by reference; there is no hidden global instance,
//! so tests can hold several independent catalogs side by side.

use std::collections::HashMap;
use std::io::BufRead;
use std::str::FromStr;
use std::sync::LazyLock;

use regex::Regex;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

/// Minimum similarity ratio the fuzzy fallback accepts.
pub const FUZZY_THRESHOLD: f64 = 0.7;

static PLACEHOLDER_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"#(?:\s*~\s*#)+").expect("valid regex"));

static WHITESPACE_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\s+").expect("valid regex"));

static RANGE_VALUE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d+(?:\.\d+)?)\s*[~-]\s*(\d+(?:\.\d+)?)").expect("valid regex")
});

static SINGLE_VALUE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[+-]?(\d+(?:\.\d+)?)").expect("valid regex"));

/// High-frequency aggregate stat phrases with fixed trade identifiers.
///
/// Checked by substring containment before any catalog lookup; the
/// first match wins. Cheap and approximate by design: a phrase that is
/// a substring of a longer unrelated phrase will false-positive, which
/// is accepted for hot-path speed.
const PSEUDO_STAT_SHORTCUTS: &[(&str, &str)] = &[
    ("총 생명력", "pseudo.pseudo_total_life"),
    ("총 최대 생명력", "pseudo.pseudo_total_life"),
    ("총 마나", "pseudo.pseudo_total_mana"),
    ("총 최대 마나", "pseudo.pseudo_total_mana"),
    ("총 에너지 실드", "pseudo.pseudo_total_energy_shield"),
    ("총 최대 에너지 실드", "pseudo.pseudo_total_energy_shield"),
    ("총 원소 저항", "pseudo.pseudo_total_elemental_resistance"),
    ("총 화염 저항", "pseudo.pseudo_total_fire_resistance"),
    ("총 냉기 저항", "pseudo.pseudo_total_cold_resistance"),
    ("총 번개 저항", "pseudo.pseudo_total_lightning_resistance"),
    ("총 카오스 저항", "pseudo.pseudo_total_chaos_resistance"),
    ("총 힘", "pseudo.pseudo_total_strength"),
    ("총 민첩", "pseudo.pseudo_total_dexterity"),
    ("총 지능", "pseudo.pseudo_total_intelligence"),
    ("총 모든 능력치", "pseudo.pseudo_total_all_attributes"),
    ("총 공격 속도", "pseudo.pseudo_total_attack_speed"),
    ("총 시전 속도", "pseudo.pseudo_total_cast_speed"),
    ("이동 속도", "pseudo.pseudo_increased_movement_speed"),
    ("총 물리 피해 증가", "pseudo.pseudo_increased_physical_damage"),
    ("총 원소 피해 증가", "pseudo.pseudo_increased_elemental_damage"),
    ("총 주문 피해 증가", "pseudo.pseudo_increased_spell_damage"),
    ("전역 치명타 확률", "pseudo.pseudo_global_critical_strike_chance"),
    (
        "전역 치명타 배율",
        "pseudo.pseudo_global_critical_strike_multiplier",
    ),
    ("총 젬 레벨", "pseudo.pseudo_total_additional_gem_levels"),
    (
        "총 주문 젬 레벨",
        "pseudo.pseudo_total_additional_spell_gem_levels",
    ),
    (
        "총 소환수 젬 레벨",
        "pseudo.pseudo_total_additional_minion_gem_levels",
    ),
    ("생명력 재생", "pseudo.pseudo_total_life_regen"),
    ("아이템 희귀도", "pseudo.pseudo_increased_rarity"),
];

#[derive(Debug, Error)]
pub enum StatMapError {
    #[error("failed to read stat catalog: {0}")]
    Io(#[from] std::io::Error),

    #[error("stat catalog line {line} is not valid JSON: {source}")]
    Parse {
        line: usize,
        source: serde_json::Error,
    },
}

/// Mod type a trade identifier is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ModType {
    #[default]
    Explicit,
    Implicit,
    Crafted,
    Enchant,
    Pseudo,
    Fractured,
}

impl ModType {
    pub fn as_str(self) -> &'static str {
        match self {
            ModType::Explicit => "explicit",
            ModType::Implicit => "implicit",
            ModType::Crafted => "crafted",
            ModType::Enchant => "enchant",
            ModType::Pseudo => "pseudo",
            ModType::Fractured => "fractured",
        }
    }
}

impl FromStr for ModType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "explicit" => Ok(ModType::Explicit),
            "implicit" => Ok(ModType::Implicit),
            "crafted" => Ok(ModType::Crafted),
            "enchant" => Ok(ModType::Enchant),
            "pseudo" => Ok(ModType::Pseudo),
            "fractured" => Ok(ModType::Fractured),
            other => Err(format!("unknown mod type: {other}")),
        }
    }
}

/// Opaque trade-system stat identifier. Handed to downstream search
/// construction unmodified.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct TradeStatId(pub String);

impl std::fmt::Display for TradeStatId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One catalog stat: the canonical reference string, its trade
/// identifiers per mod type, and the "better" direction.
#[derive(Debug, Clone)]
pub struct StatEntry {
    pub reference: String,
    pub trade_ids: HashMap<String, Vec<String>>,
    /// 1 higher-is-better, -1 lower-is-better, 0 neutral.
    pub better: i8,
}

#[derive(Debug, Deserialize)]
struct RawStat {
    #[serde(rename = "ref", default)]
    reference: Option<String>,
    #[serde(default)]
    matchers: Vec<RawMatcher>,
    #[serde(default)]
    trade: RawTrade,
    #[serde(default)]
    better: i8,
}

#[derive(Debug, Deserialize)]
struct RawMatcher {
    string: String,
}

#[derive(Debug, Default, Deserialize)]
struct RawTrade {
    #[serde(default)]
    ids: HashMap<String, Vec<String>>,
}

/// Loaded stat translation catalog.
pub struct StatMapper {
    entries: Vec<StatEntry>,
    /// Normalized localized matcher -> entry index.
    matcher_index: HashMap<String, usize>,
    /// Lowercased canonical reference -> entry index.
    reference_index: HashMap<String, usize>,
}

impl StatMapper {
    /// Load a catalog from newline-delimited JSON records.
    ///
    /// A record carrying a `resolve` field nests its stats under a
    /// `stats` array; plain records are one stat each. A malformed
    /// line fails the whole load so the caller sees "catalog
    /// unavailable" instead of silently resolving nothing.
    pub fn load(reader: impl BufRead) -> Result<StatMapper, StatMapError> {
        let mut mapper = StatMapper {
            entries: Vec::new(),
            matcher_index: HashMap::new(),
            reference_index: HashMap::new(),
        };

        for (idx, line) in reader.lines().enumerate() {
            let line = line?;
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let value: Value =
                serde_json::from_str(line).map_err(|source| StatMapError::Parse {
                    line: idx + 1,
                    source,
                })?;

            if value.get("resolve").is_some() {
                let stats = value
                    .get("stats")
                    .and_then(Value::as_array)
                    .cloned()
                    .unwrap_or_default();
                for stat in stats {
                    mapper.add_raw(stat, idx + 1)?;
                }
            } else {
                mapper.add_raw(value, idx + 1)?;
            }
        }
        Ok(mapper)
    }

    /// Load a catalog from in-memory NDJSON text.
    pub fn load_str(text: &str) -> Result<StatMapper, StatMapError> {
        Self::load(text.as_bytes())
    }

    fn add_raw(&mut self, value: Value, line: usize) -> Result<(), StatMapError> {
        let raw: RawStat =
            serde_json::from_value(value).map_err(|source| StatMapError::Parse { line, source })?;

        let index = self.entries.len();
        self.entries.push(StatEntry {
            reference: raw.reference.clone().unwrap_or_default(),
            trade_ids: raw.trade.ids,
            better: raw.better,
        });

        if let Some(reference) = raw.reference {
            if !reference.is_empty() {
                self.reference_index.insert(reference.to_lowercase(), index);
            }
        }
        for matcher in raw.matchers {
            if !matcher.string.is_empty() {
                self.matcher_index
                    .insert(normalize(&matcher.string), index);
            }
        }
        Ok(())
    }

    /// Number of distinct localized matchers loaded.
    pub fn matcher_count(&self) -> usize {
        self.matcher_index.len()
    }

    /// Resolve localized stat text to a trade identifier.
    ///
    /// Pipeline, in priority order: pseudo-stat shortcut, exact
    /// matcher lookup (requested mod type first, then any populated
    /// one), fuzzy fallback at [`FUZZY_THRESHOLD`]. `None` means
    /// "untranslatable", which is a valid outcome.
    pub fn resolve(&self, localized_text: &str, mod_type: ModType) -> Option<TradeStatId> {
        let normalized = normalize(localized_text);

        for (phrase, id) in PSEUDO_STAT_SHORTCUTS {
            if normalized.contains(phrase) {
                return Some(TradeStatId((*id).to_string()));
            }
        }

        if let Some(&index) = self.matcher_index.get(&normalized) {
            if let Some(id) = pick_trade_id(&self.entries[index], mod_type) {
                return Some(id);
            }
        }

        self.fuzzy_match(&normalized)
            .and_then(|index| pick_trade_id(&self.entries[index], mod_type))
    }

    /// Resolve by canonical (source-language) reference string.
    pub fn resolve_reference(&self, reference: &str, mod_type: ModType) -> Option<TradeStatId> {
        let index = *self.reference_index.get(&reference.to_lowercase())?;
        pick_trade_id(&self.entries[index], mod_type)
    }

    /// Best catalog key by similarity ratio, accepted only at or above
    /// the fixed threshold.
    fn fuzzy_match(&self, normalized: &str) -> Option<usize> {
        let mut best: Option<(f64, usize)> = None;
        for (key, &index) in &self.matcher_index {
            let ratio = strsim::normalized_levenshtein(normalized, key);
            if ratio >= FUZZY_THRESHOLD && best.map_or(true, |(b, _)| ratio > b) {
                best = Some((ratio, index));
            }
        }
        best.map(|(_, index)| index)
    }
}

fn pick_trade_id(entry: &StatEntry, mod_type: ModType) -> Option<TradeStatId> {
    if let Some(ids) = entry.trade_ids.get(mod_type.as_str()) {
        if let Some(id) = ids.first() {
            return Some(TradeStatId(id.clone()));
        }
    }
    // Requested mod type absent: fall back to any populated one.
    entry
        .trade_ids
        .values()
        .find_map(|ids| ids.first())
        .map(|id| TradeStatId(id.clone()))
}

/// Normalize localized stat text for lookup: collapse placeholder
/// ranges to a single `#`, collapse whitespace runs, case-fold.
pub fn normalize(text: &str) -> String {
    let collapsed = PLACEHOLDER_RUN.replace_all(text, "#");
    let collapsed = WHITESPACE_RUN.replace_all(&collapsed, " ");
    collapsed.trim().to_lowercase()
}

/// Pull numeric bounds out of localized stat text: a `min~max` range
/// when present, otherwise a single leading value as the minimum.
pub fn extract_values(text: &str) -> (Option<f64>, Option<f64>) {
    if let Some(caps) = RANGE_VALUE.captures(text) {
        let min = caps[1].parse().ok();
        let max = caps[2].parse().ok();
        return (min, max);
    }
    if let Some(caps) = SINGLE_VALUE.captures(text) {
        return (caps[1].parse().ok(), None);
    }
    (None, None)
}
