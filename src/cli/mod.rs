pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "notes")]
#[command(about = "Notes CLI - Operator tooling for the Notes API")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in human-readable text format")]
    pub text: bool,

    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Issue bearer tokens signed with the configured secret")]
    Token {
        #[command(subcommand)]
        cmd: commands::token::TokenCommands,
    },

    #[command(about = "Inspect the resolved server configuration")]
    Config {
        #[command(subcommand)]
        cmd: commands::config::ConfigCommands,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum OutputFormat {
    Text,
    Json,
}

impl OutputFormat {
    pub fn from_cli(cli: &Cli) -> Self {
        if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Text
        }
    }
}

pub async fn run(cli: Cli) -> anyhow::Result<()> {
    let output_format = OutputFormat::from_cli(&cli);

    match cli.command {
        Commands::Token { cmd } => commands::token::handle(cmd, output_format).await,
        Commands::Config { cmd } => commands::config::handle(cmd, output_format).await,
    }
}
