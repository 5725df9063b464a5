//! Game-data table ingestion.
//!
//! The planning tool bundles its item and gem catalogs as
//! scripting-language data tables: multi-line `[[ ... ]]` item blocks
//! and repeated `key = value` gem records. Neither file follows a
//! formal grammar, so ingestion is line- and regex-oriented, tolerant
//! of unknown trailing fields, and never fatal: a block or record that
//! does not match the expected shape is skipped and the rest of the
//! file is still processed. Partial catalogs are an accepted outcome.

mod gems;
mod uniques;

pub use gems::{is_support_gem, is_vaal_gem, parse_gems, GemCatalog, GemCatalogEntry, GemColor};
pub use uniques::{parse_uniques, ItemCatalog, ItemCatalogEntry};
