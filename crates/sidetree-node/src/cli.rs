use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(name = "sidetree", about = "Sidetree DID node", version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Command {
    /// Start the node and serve the request API
    Run(RunArgs),
    /// Validate the node and protocol files without starting anything
    Check(CheckArgs),
}

#[derive(Args)]
pub struct RunArgs {
    #[arg(short, long, default_value = "sidetree.toml")]
    pub config: PathBuf,
    #[arg(short, long, default_value = "protocol.toml")]
    pub protocol: PathBuf,
    /// Overrides `server.bind_addr` from the config file
    #[arg(long)]
    pub bind: Option<String>,
}

#[derive(Args)]
pub struct CheckArgs {
    #[arg(short, long, default_value = "sidetree.toml")]
    pub config: PathBuf,
    #[arg(short, long, default_value = "protocol.toml")]
    pub protocol: PathBuf,
}
