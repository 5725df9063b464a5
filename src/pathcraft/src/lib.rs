//! # pathcraft
//!
//! Build data normalization library - decoding, extraction, ingestion,
//! and stat translation.
//!
//! This library provides functionality to:
//! - Decode shareable build codes (base64 + zlib + XML) into documents
//! - Extract canonical build records (skills, gear, passives, stats)
//! - Ingest bundled game-data tables into item and gem catalogs
//! - Resolve localized stat text to trade-system stat identifiers
//!
//! All four components are synchronous, pure transforms: no network
//! I/O, no caching, no presentation decisions. Catalogs are immutable
//! once constructed, so concurrent reads are safe; rebuilding a
//! catalog concurrently is the caller's problem to serialize.
//!
//! ## Example
//!
//! ```no_run
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let code = std::fs::read_to_string("build_code.txt")?;
//!
//! // Decode the shareable code and extract the canonical record
//! let doc = pathcraft::decode(code.trim())?;
//! let record = pathcraft::extract(&doc, "https://pobb.in/abc123");
//!
//! println!("Class: {}", record.meta["class"]);
//! for setup in &record.gem_setups {
//!     if let Some(main) = setup.main_skill() {
//!         println!("{}: {}", setup.label, main.name);
//!     }
//! }
//! # Ok(())
//! # }
//! ```

pub mod build;
pub mod code;
pub mod document;
pub mod gamedata;
pub mod statmap;

// Re-export commonly used items
#[doc(inline)]
pub use build::{
    classify_node, extract, BuildRecord, GemRef, GemSetup, ItemSummary, NodeClass,
    PassiveAllocation, Rarity, StatValue,
};
#[doc(inline)]
pub use code::{decode, DecodeError};
#[doc(inline)]
pub use document::{BuildDocument, Element};
#[doc(inline)]
pub use gamedata::{
    parse_gems, parse_uniques, GemCatalog, GemCatalogEntry, GemColor, ItemCatalog,
    ItemCatalogEntry,
};
#[doc(inline)]
pub use statmap::{ModType, StatMapError, StatMapper, TradeStatId};
