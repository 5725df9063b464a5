//! Gem catalog ingestion.
//!
//! Source format: repeated `name = "..."` assignments, each opening one
//! gem's textual scope. A scope runs to the next `name = "..."`
//! assignment (or end of text), and every field is extracted from the
//! scope independently.
//!
//! Known fragility: the scope split assumes no nested `name = "..."`
//! inside another gem's data. If the source ever nests, scopes will be
//! mis-split. Whether nesting can actually occur in the source data is
//! unverified; this stays an open question rather than another regex.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

static NAME_ASSIGN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"name\s*=\s*"([^"]*)""#).expect("valid regex"));

static GEM_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"gemId\s*=\s*"([^"]*)""#).expect("valid regex"));

static TAG_STRING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"tagString\s*=\s*"([^"]*)""#).expect("valid regex"));

static MAX_LEVEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"naturalMaxLevel\s*=\s*(\d+)").expect("valid regex"));

/// Scope substring marking a vaal skill record.
const VAAL_SCOPE_MARKER: &str = "vaalGem = true";

/// Natural level cap assumed when the record does not declare one.
const DEFAULT_MAX_LEVEL: u32 = 20;

/// Socket color class derived from attribute requirements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum GemColor {
    Red,
    Green,
    Blue,
    White,
}

impl GemColor {
    pub fn name(self) -> &'static str {
        match self {
            GemColor::Red => "red",
            GemColor::Green => "green",
            GemColor::Blue => "blue",
            GemColor::White => "white",
        }
    }

    /// Classify by attribute requirements, in fixed priority order:
    /// intelligence is evaluated first and wins ties, then dexterity
    /// against strength, then a bare strength requirement. The order is
    /// deliberate; the checks are not symmetric.
    pub fn classify(req_str: u32, req_dex: u32, req_int: u32) -> GemColor {
        if req_int > 0 && req_int >= req_str && req_int >= req_dex {
            GemColor::Blue
        } else if req_dex > req_str {
            GemColor::Green
        } else if req_str > 0 {
            GemColor::Red
        } else {
            GemColor::White
        }
    }
}

/// One gem record. Immutable after ingest.
#[derive(Debug, Clone, Serialize)]
pub struct GemCatalogEntry {
    pub id: String,
    pub name: String,
    pub tags: Vec<String>,
    pub req_str: u32,
    pub req_dex: u32,
    pub req_int: u32,
    pub max_level: u32,
    pub color: GemColor,
    pub is_support: bool,
    pub is_vaal: bool,
}

/// Gem catalog keyed by display name, last-write-wins.
#[derive(Debug, Clone, Default, Serialize)]
pub struct GemCatalog {
    entries: HashMap<String, GemCatalogEntry>,
}

impl GemCatalog {
    pub fn get(&self, name: &str) -> Option<&GemCatalogEntry> {
        self.entries.get(name)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &GemCatalogEntry> {
        self.entries.values()
    }
}

/// Support classification heuristic: the tag string mentions "support"
/// or the display name carries the "Support" suffix. Substring-based,
/// so a hypothetical skill named "Supportive Cry" would false-positive;
/// that imprecision is accepted and kept visible here.
pub fn is_support_gem(name: &str, tag_string: &str) -> bool {
    tag_string.to_ascii_lowercase().contains("support") || name.contains("Support")
}

/// Vaal classification heuristic: the display name mentions "vaal" or
/// the raw record scope carries the vaal marker field. Same accepted
/// false-positive risk as [`is_support_gem`].
pub fn is_vaal_gem(name: &str, scope: &str) -> bool {
    name.to_ascii_lowercase().contains("vaal") || scope.contains(VAAL_SCOPE_MARKER)
}

/// Parse a gem data table into a catalog.
///
/// Records that fail field extraction fall back to defaults rather
/// than aborting; an empty input yields an empty catalog.
pub fn parse_gems(text: &str) -> GemCatalog {
    let mut catalog = GemCatalog::default();

    let matches: Vec<_> = NAME_ASSIGN.captures_iter(text).collect();
    for (i, caps) in matches.iter().enumerate() {
        let whole = caps.get(0).expect("capture 0 always present");
        let name = caps[1].to_string();
        if name.is_empty() {
            continue;
        }

        let scope_end = matches
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map(|m| m.start())
            .unwrap_or(text.len());
        let scope = &text[whole.start()..scope_end];

        let entry = parse_scope(name, scope);
        catalog.entries.insert(entry.name.clone(), entry);
    }
    catalog
}

fn parse_scope(name: String, scope: &str) -> GemCatalogEntry {
    let id = GEM_ID
        .captures(scope)
        .map(|c| c[1].to_string())
        .unwrap_or_default();

    let tag_string = TAG_STRING
        .captures(scope)
        .map(|c| c[1].to_string())
        .unwrap_or_default();
    let tags: Vec<String> = tag_string
        .split(',')
        .map(|t| t.trim().to_ascii_lowercase())
        .filter(|t| !t.is_empty())
        .collect();

    let req_str = req_field(scope, "reqStr");
    let req_dex = req_field(scope, "reqDex");
    let req_int = req_field(scope, "reqInt");

    let max_level = MAX_LEVEL
        .captures(scope)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(DEFAULT_MAX_LEVEL);

    GemCatalogEntry {
        color: GemColor::classify(req_str, req_dex, req_int),
        is_support: is_support_gem(&name, &tag_string),
        is_vaal: is_vaal_gem(&name, scope),
        id,
        name,
        tags,
        req_str,
        req_dex,
        req_int,
        max_level,
    }
}

fn req_field(scope: &str, field: &str) -> u32 {
    // Small enough to build per lookup; the three requirement fields
    // share one pattern shape.
    let pattern = Regex::new(&format!(r"{field}\s*=\s*(\d+)")).expect("valid regex");
    pattern
        .captures(scope)
        .and_then(|c| c[1].parse().ok())
        .unwrap_or(0)
}
