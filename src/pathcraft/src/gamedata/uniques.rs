//! Unique item catalog ingestion.
//!
//! Source format: `[[ ... ]]`-delimited blocks, one item per block.
//! Line 1 is the item name, line 2 the base type; the remaining lines
//! are keyword lines (`Variant:`, level requirement, `Implicits:`) or
//! mod lines. Parsing is a single forward pass with one piece of
//! mutable state (the remaining implicit count) and no lookahead, so a
//! mod line misread as a keyword line is simply lost from the mod list.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static DIGIT_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\d+").expect("valid regex"));

static INLINE_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{[^}]*\}").expect("valid regex"));

/// Keyword prefixes that mark a line as item metadata rather than a
/// mod. Anything matched here never reaches the mod lists.
const METADATA_PREFIXES: &[&str] = &[
    "League:",
    "Source:",
    "Has Alt Variant:",
    "Selected Variant:",
    "Selected Alt Variant:",
    "Upgrade:",
    "Limited",
];

/// One unique item as parsed from its block. Immutable after ingest.
#[derive(Debug, Clone, Serialize)]
pub struct ItemCatalogEntry {
    pub name: String,
    pub base_type: String,
    pub variants: Vec<String>,
    pub level_req: Option<u32>,
    pub implicits: Vec<String>,
    pub mods: Vec<String>,
}

/// Unique item catalog keyed by display name.
///
/// Later blocks with the same name overwrite earlier ones; there is no
/// merging.
#[derive(Debug, Clone, Default, Serialize)]
pub struct ItemCatalog {
    entries: HashMap<String, ItemCatalogEntry>,
}

impl ItemCatalog {
    pub fn get(&self, name: &str) -> Option<&ItemCatalogEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &ItemCatalogEntry> {
        self.entries.values()
    }
}

/// Parse a unique-item data table into a catalog.
///
/// Blocks that do not carry at least a name and base type line are
/// skipped; the remainder of the text continues to be processed.
pub fn parse_uniques(text: &str) -> ItemCatalog {
    let mut catalog = ItemCatalog::default();

    let mut rest = text;
    while let Some(open) = rest.find("[[") {
        let body_start = open + 2;
        let Some(close) = rest[body_start..].find("]]") else {
            break;
        };
        let body = &rest[body_start..body_start + close];
        rest = &rest[body_start + close + 2..];

        if let Some(entry) = parse_block(body) {
            catalog.entries.insert(entry.name.clone(), entry);
        }
    }
    catalog
}

fn parse_block(body: &str) -> Option<ItemCatalogEntry> {
    let mut lines = body
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.starts_with("--"));

    let name = lines.next()?;
    let base_type = lines.next()?;

    let mut entry = ItemCatalogEntry {
        name: name.to_string(),
        base_type: base_type.to_string(),
        variants: Vec::new(),
        level_req: None,
        implicits: Vec::new(),
        mods: Vec::new(),
    };

    // Remaining implicit lines to consume; armed by `Implicits: N`.
    let mut implicit_remaining = 0usize;

    for line in lines {
        if let Some(rest) = line.strip_prefix("Variant:") {
            entry.variants.push(rest.trim().to_string());
            continue;
        }
        if line.starts_with("LevelReq:") || line.contains("Requires Level") {
            entry.level_req = DIGIT_RUN
                .find(line)
                .and_then(|m| m.as_str().parse().ok());
            continue;
        }
        if let Some(rest) = line.strip_prefix("Implicits:") {
            implicit_remaining = rest.trim().parse().unwrap_or(0);
            continue;
        }
        if METADATA_PREFIXES.iter().any(|p| line.starts_with(p)) {
            continue;
        }

        let stripped = INLINE_TAG.replace_all(line, "");
        let stripped = stripped.trim();
        if stripped.is_empty() {
            continue;
        }
        if implicit_remaining > 0 {
            entry.implicits.push(stripped.to_string());
            implicit_remaining -= 1;
        } else {
            entry.mods.push(stripped.to_string());
        }
    }

    Some(entry)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
itemBases = {}
uniques = {
[[
Wilma's Requital
Ancient Gauntlets
League: Harbinger
Variant: Pre 3.21
Variant: Current
Requires Level 60
Implicits: 2
+30 to maximum Life
+10% to Fire Resistance
Adds 5 to 10 Physical Damage
Curse Enemies with level 10 Vulnerability
Source: drop
]],
-- trailing comment between blocks
[[
broken
]],
[[
Void Battery
Prophecy Wand
Implicits: 1
{tags:caster}+10 to maximum Mana
Gains no inherent bonuses from Intelligence
]],
}
"#;

    #[test]
    fn test_implicit_counter_split() {
        let catalog = parse_uniques(SAMPLE);
        let item = catalog.get("Wilma's Requital").unwrap();
        assert_eq!(item.base_type, "Ancient Gauntlets");
        assert_eq!(
            item.implicits,
            vec!["+30 to maximum Life", "+10% to Fire Resistance"]
        );
        // The Source: line is metadata and never reaches the mods.
        assert_eq!(
            item.mods,
            vec![
                "Adds 5 to 10 Physical Damage",
                "Curse Enemies with level 10 Vulnerability"
            ]
        );
    }

    #[test]
    fn test_variants_and_level_requirement() {
        let catalog = parse_uniques(SAMPLE);
        let item = catalog.get("Wilma's Requital").unwrap();
        assert_eq!(item.variants, vec!["Pre 3.21", "Current"]);
        assert_eq!(item.level_req, Some(60));
    }

    #[test]
    fn test_inline_tags_stripped() {
        let catalog = parse_uniques(SAMPLE);
        let item = catalog.get("Void Battery").unwrap();
        assert_eq!(item.implicits, vec!["+10 to maximum Mana"]);
    }

    #[test]
    fn test_truncated_block_skipped_without_aborting() {
        let catalog = parse_uniques(SAMPLE);
        assert!(catalog.get("broken").is_none());
        // Blocks after the truncated one still parse.
        assert!(catalog.get("Void Battery").is_some());
        assert_eq!(catalog.len(), 2);
    }

    #[test]
    fn test_last_write_wins_on_duplicate_names() {
        let text = "[[\nSame Name\nFirst Base\n]]\n[[\nSame Name\nSecond Base\n]]";
        let catalog = parse_uniques(text);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("Same Name").unwrap().base_type, "Second Base");
    }

    #[test]
    fn test_empty_input_yields_empty_catalog() {
        assert!(parse_uniques("").is_empty());
        assert!(parse_uniques("no blocks here").is_empty());
    }
}
