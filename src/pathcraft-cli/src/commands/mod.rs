//! Command handlers for the pathcraft CLI
//!
//! Each subcommand has its own module with handler functions.

pub mod decode;
pub mod gamedata;
pub mod stat;
