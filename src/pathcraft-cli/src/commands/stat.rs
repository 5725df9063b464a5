//! Stat translation command handlers

use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{bail, Context, Result};
use pathcraft::{ModType, StatMapper};

/// Resolve one localized stat line against a catalog.
pub fn resolve(text: &str, catalog: &Path, mod_type: &str) -> Result<()> {
    let mod_type: ModType = mod_type
        .parse()
        .map_err(|e: String| anyhow::anyhow!(e))?;

    let file = File::open(catalog)
        .with_context(|| format!("failed to open stat catalog {}", catalog.display()))?;
    let mapper = StatMapper::load(BufReader::new(file))
        .with_context(|| format!("stat catalog unavailable: {}", catalog.display()))?;

    match mapper.resolve(text, mod_type) {
        Some(id) => {
            println!("{id}");
            Ok(())
        }
        None => bail!("no trade stat id for: {text}"),
    }
}
