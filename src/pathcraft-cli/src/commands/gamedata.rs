//! Game-data ingestion command handlers

use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;

/// Parse a unique-item table and print the catalog as JSON.
pub fn uniques(input: &Path, pretty: bool) -> Result<()> {
    let text = read_table(input)?;
    let catalog = pathcraft::parse_uniques(&text);
    eprintln!("parsed {} unique items", catalog.len());
    print_json(&catalog, pretty)
}

/// Parse a gem table and print the catalog as JSON.
pub fn gems(input: &Path, pretty: bool) -> Result<()> {
    let text = read_table(input)?;
    let catalog = pathcraft::parse_gems(&text);
    eprintln!("parsed {} gems", catalog.len());
    print_json(&catalog, pretty)
}

fn read_table(input: &Path) -> Result<String> {
    fs::read_to_string(input)
        .with_context(|| format!("failed to read data table {}", input.display()))
}

fn print_json<T: Serialize>(value: &T, pretty: bool) -> Result<()> {
    let json = if pretty {
        serde_json::to_string_pretty(value)?
    } else {
        serde_json::to_string(value)?
    };
    println!("{json}");
    Ok(())
}
