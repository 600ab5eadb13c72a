//! Command implementations for the setup-everything CLI.
//!
//! Each submodule handles one subcommand. `setup` chains the other two.

pub mod download;
pub mod install;
pub mod setup;
