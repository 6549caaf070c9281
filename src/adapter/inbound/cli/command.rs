//! Command-line interface definitions.
//!
//! Defines the CLI structure for the parimarket binary using `clap`. Every
//! subcommand is a single market operation against the configured database.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};
use rust_decimal::Decimal;

use crate::domain::EventKind;

/// Default configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "parimarket.toml";

/// Pari-mutuel prediction market CLI
#[derive(Parser, Debug)]
#[command(name = "parimarket")]
#[command(version)]
pub struct Cli {
    /// Configuration file (defaults apply when it does not exist)
    #[arg(short, long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    pub config: PathBuf,

    /// Override the database URL from the configuration
    #[arg(long, global = true)]
    pub database: Option<String>,

    /// JSON output for scripting
    #[arg(long, global = true)]
    pub json: bool,

    /// Decrease output verbosity
    #[arg(short, long, global = true)]
    pub quiet: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Write a config file and create the database
    Init(InitArgs),

    /// Manage users
    #[command(subcommand)]
    User(UserCommand),

    /// Manage events
    #[command(subcommand)]
    Event(EventCommand),

    /// Spend points on an outcome
    Buy(BuyArgs),

    /// Sell whole shares back for half their face value
    Sell(SellArgs),

    /// Settle an event on its winning outcome
    Resolve(ResolveArgs),

    /// Show live odds of an event
    Odds(OddsArgs),

    /// Show a user's open positions
    Portfolio(UserArg),

    /// Show the recent activity feed
    Activity(ActivityArgs),
}

/// User subcommands.
#[derive(Subcommand, Debug)]
pub enum UserCommand {
    /// Register a user with the starting balance
    Add {
        username: String,
        /// Grant admin rights
        #[arg(long)]
        admin: bool,
    },
    /// Show a balance, or overwrite it with --set
    Balance {
        user: i64,
        #[arg(long)]
        set: Option<i64>,
    },
    /// List all users
    List,
}

/// Event kind as accepted on the command line.
#[derive(Clone, Copy, Debug, Default, ValueEnum)]
pub enum KindArg {
    /// Yes / No
    #[default]
    Binary,
    /// Two or more named outcomes
    Multi,
}

impl From<KindArg> for EventKind {
    fn from(kind: KindArg) -> Self {
        match kind {
            KindArg::Binary => Self::Binary,
            KindArg::Multi => Self::Multi,
        }
    }
}

/// Event subcommands.
#[derive(Subcommand, Debug)]
pub enum EventCommand {
    /// Open a new event
    Create {
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        #[arg(short, long, value_enum, default_value_t = KindArg::Binary)]
        kind: KindArg,
        /// Outcome label (repeat for multi events)
        #[arg(short, long = "outcome")]
        outcomes: Vec<String>,
    },
    /// Edit title and description, optionally replacing outcomes
    Update {
        event: i64,
        title: String,
        #[arg(short, long, default_value = "")]
        description: String,
        /// Replacement outcome label (repeat)
        #[arg(short, long = "outcome")]
        outcomes: Vec<String>,
    },
    /// Delete an event and refund open positions
    Delete { event: i64 },
    /// Reopen a resolved event
    Unresolve { event: i64 },
    /// List events, most recently traded first
    List,
    /// Show one event
    Show {
        event: i64,
        /// Include this user's positions
        #[arg(long)]
        user: Option<i64>,
    },
}

#[derive(Args, Debug)]
pub struct InitArgs {
    /// Overwrite an existing config file
    #[arg(long)]
    pub force: bool,
}

#[derive(Args, Debug)]
pub struct BuyArgs {
    #[arg(long)]
    pub user: i64,
    #[arg(long)]
    pub event: i64,
    #[arg(long)]
    pub outcome: i64,
    /// Points to spend
    pub amount: i64,
}

#[derive(Args, Debug)]
pub struct SellArgs {
    #[arg(long)]
    pub user: i64,
    #[arg(long)]
    pub event: i64,
    #[arg(long)]
    pub outcome: i64,
    /// Whole shares to sell
    pub shares: Decimal,
}

#[derive(Args, Debug)]
pub struct ResolveArgs {
    pub event: i64,
    /// Winning outcome id
    #[arg(long)]
    pub winner: i64,
}

#[derive(Args, Debug)]
pub struct OddsArgs {
    pub event: i64,
    /// Show the recorded odds history instead
    #[arg(long)]
    pub history: bool,
}

#[derive(Args, Debug)]
pub struct UserArg {
    pub user: i64,
}

#[derive(Args, Debug)]
pub struct ActivityArgs {
    #[arg(short, long, default_value = "50")]
    pub limit: usize,
}
