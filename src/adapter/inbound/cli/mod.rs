//! CLI module graph and dispatch.

pub mod command;
pub mod event;
pub mod init;
pub mod output;
pub mod report;
pub mod trade;
pub mod user;

use tracing::debug;

use crate::error::Result;
use crate::infrastructure::bootstrap::open_market;
use crate::infrastructure::config::settings::Config;

use command::{Cli, Commands};
use output::OutputConfig;

/// Load configuration, open the market and run one command.
///
/// # Errors
/// Returns configuration, storage and market errors unchanged.
pub fn run(cli: Cli) -> Result<()> {
    output::configure(OutputConfig::new(cli.json, cli.quiet));

    let mut config = Config::load_or_default(&cli.config)?;
    if let Some(url) = cli.database {
        config.database.url = url;
    }
    config.init_logging();
    debug!(config = %cli.config.display(), database = %config.database.url, "Configuration loaded");

    if let Commands::Init(args) = &cli.command {
        return init::execute(&cli.config, &config, args.force);
    }

    let market = open_market(&config)?;
    let service = &market.service;

    match cli.command {
        Commands::Init(_) => Ok(()),
        Commands::User(cmd) => user::execute(service, cmd),
        Commands::Event(cmd) => event::execute(service, cmd),
        Commands::Buy(args) => trade::buy(service, &args),
        Commands::Sell(args) => trade::sell(service, &args),
        Commands::Resolve(args) => trade::resolve(service, &args),
        Commands::Odds(args) => report::odds(service, &args),
        Commands::Portfolio(args) => report::portfolio(service, &args),
        Commands::Activity(args) => report::activity(service, &args),
    }
}
