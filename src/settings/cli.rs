use super::{Parser, Subcommand};

pub const MEMORY_BACKEND_NOTE: &str = "With store.backend = \"memory\" every invocation starts \
from an empty store, so state written by one command is gone by the next. Use the redis \
backend (e.g. --settings settings/release.toml) to keep relationships between commands.";

#[derive(Parser, Debug)]
#[command(
    name = "rapport",
    about = "Inspect and drive user relationships",
    after_help = MEMORY_BACKEND_NOTE
)]
pub struct Cli {
    #[arg(long)]
    pub settings: Option<String>,

    /// Acting user; overrides `session.username` from settings
    #[arg(long = "as")]
    pub acting_as: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Send a link request
    Send { username: String },
    /// Withdraw a sent request
    Cancel { username: String },
    /// Accept a received request
    Accept { username: String },
    /// Decline a received request
    Reject { username: String },
    /// Remove an established link
    Remove { username: String },
    /// Print the acting user's requests and links
    Show,
    /// Check both records of a pair for inconsistencies
    Inspect { first: String, second: String },
}
