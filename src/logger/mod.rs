//! Process-wide `tracing` setup with a filter that can be swapped once settings load.
//! See `bin/logger_demo.rs` for a manual check.

mod logger;
pub use logger::*;

pub use tracing::{debug, error, info, trace, warn};
