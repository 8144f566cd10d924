mod api;
mod cmd;
mod core;

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cmd::associated_companies::AssociatedCompaniesCommand;
use crate::cmd::calculate::CalculateCommand;
use crate::cmd::config::ConfigCommand;
use crate::cmd::schema::SchemaCommand;
use crate::cmd::serve::ServeCommand;

#[derive(Parser, Debug)]
#[command(name = "mrcalc", version, about = "UK Corporation Tax Marginal Relief Calculator")]
struct Cli {
    /// Financial year configuration file (JSON). Uses the built-in table if not specified.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Calculate corporation tax and marginal relief for an accounting period
    Calculate(CalculateCommand),
    /// Show whether associated company counts are needed for an accounting period
    AssociatedCompanies(AssociatedCompaniesCommand),
    /// Show the financial year configuration
    Config(ConfigCommand),
    /// Print the configuration file format
    Schema(SchemaCommand),
    /// Run the HTTP API
    Serve(ServeCommand),
}

fn main() -> anyhow::Result<()> {
    pretty_env_logger::init();

    let cli = Cli::parse();
    if let Command::Schema(cmd) = &cli.command {
        return cmd.exec();
    }

    let config = cmd::load_config(cli.config.as_deref())?;
    match cli.command {
        Command::Calculate(cmd) => cmd.exec(&config),
        Command::AssociatedCompanies(cmd) => cmd.exec(&config),
        Command::Config(cmd) => cmd.exec(&config),
        Command::Serve(cmd) => cmd.exec(config),
        Command::Schema(cmd) => cmd.exec(),
    }
}
