//! CLI argument definitions for pathcraft
//!
//! This module contains all clap-derived structs and enums for CLI parsing.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "pathcraft")]
#[command(about = "Build data normalization toolset", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Decode a build code and print the canonical build record
    #[command(visible_alias = "d")]
    Decode {
        /// Build code, or path to a file containing one
        code: String,

        /// Source link recorded in the build record's meta
        #[arg(short, long)]
        source: Option<String>,

        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Game-data table ingestion (uniques, gems)
    #[command(visible_alias = "g")]
    Gamedata {
        #[command(subcommand)]
        command: GamedataCommand,
    },

    /// Stat translation operations
    Stat {
        #[command(subcommand)]
        command: StatCommand,
    },
}

#[derive(Subcommand)]
pub enum GamedataCommand {
    /// Parse a unique-item data table into a catalog
    Uniques {
        /// Path to the data table file
        input: PathBuf,

        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },

    /// Parse a gem data table into a catalog
    Gems {
        /// Path to the data table file
        input: PathBuf,

        /// Pretty-print the JSON output
        #[arg(short, long)]
        pretty: bool,
    },
}

#[derive(Subcommand)]
pub enum StatCommand {
    /// Resolve localized stat text to a trade stat identifier
    Resolve {
        /// Localized stat text to resolve
        text: String,

        /// Path to the localization catalog (newline-delimited JSON)
        #[arg(short, long)]
        catalog: PathBuf,

        /// Mod type to prefer (explicit, implicit, crafted, enchant, pseudo, fractured)
        #[arg(short, long, default_value = "explicit")]
        mod_type: String,
    },
}
