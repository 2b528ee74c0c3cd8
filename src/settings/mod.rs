//! Settings loading and the command line of the operator binary.
//! See `bin/settings_demo.rs` for a manual check.

mod cli;
pub use clap::{Parser, Subcommand};
pub use cli::*;

mod settings;
pub use settings::*;
