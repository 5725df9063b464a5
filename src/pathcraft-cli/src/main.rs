mod cli;
mod commands;

use anyhow::Result;
use clap::Parser;

use cli::{Cli, Commands, GamedataCommand, StatCommand};

fn main() -> Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Decode {
            code,
            source,
            pretty,
        } => {
            commands::decode::handle(&code, source.as_deref(), pretty)?;
        }

        Commands::Gamedata { command } => match command {
            GamedataCommand::Uniques { input, pretty } => {
                commands::gamedata::uniques(&input, pretty)?;
            }
            GamedataCommand::Gems { input, pretty } => {
                commands::gamedata::gems(&input, pretty)?;
            }
        },

        Commands::Stat { command } => match command {
            StatCommand::Resolve {
                text,
                catalog,
                mod_type,
            } => {
                commands::stat::resolve(&text, &catalog, &mod_type)?;
            }
        },
    }

    Ok(())
}
