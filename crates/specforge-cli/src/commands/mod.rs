//! Subcommand implementations.

pub mod combine;
pub mod generate;
