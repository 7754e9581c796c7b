//! CLI argument parsing using clap

use clap::{ArgAction, Parser, Subcommand};
use std::path::PathBuf;
use std::time::Duration;

/// What to do with the account
#[derive(Debug, Clone, Subcommand, PartialEq, Eq)]
pub enum Command {
    /// Report items and fines, renew everything, then list items (default)
    Auto,
    /// List checked-out items
    Items {
        /// Only list items due within this many days
        #[arg(long)]
        due_within: Option<u32>,
    },
    /// Show total fines owed
    Fines,
    /// Renew every checked-out item
    RenewAll,
    /// Renew items never renewed before, then report items due soon
    Cron {
        /// Report items due within this many days
        #[arg(long, default_value_t = 7)]
        due_within: u32,
    },
    /// Renew specific items by token
    Renew {
        /// Item tokens as shown by `items` (RENEW^ prefixes are accepted)
        #[arg(required = true)]
        tokens: Vec<String>,
    },
}

/// SirsiDynix library account manager
#[derive(Parser, Debug)]
#[command(name = "sirsi", about = "Manage a SirsiDynix library account", version)]
pub struct Args {
    /// JSON file with `catalog`, `userid` and `password` keys
    #[arg(short, long, default_value = "~/.sirsi.json")]
    pub config: PathBuf,

    /// Catalog URL, including the scheme
    #[arg(long)]
    pub catalog: Option<String>,

    /// Patron card number
    #[arg(long)]
    pub userid: Option<String>,

    /// Patron PIN (prompted for when missing everywhere)
    #[arg(long)]
    pub password: Option<String>,

    /// Per-request timeout, e.g. `30s` or `1m`
    #[arg(long, default_value = "30s", value_parser = humantime::parse_duration)]
    pub timeout: Duration,

    /// Increase log verbosity (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Option<Command>,
}
