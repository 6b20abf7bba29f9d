pub mod commands;
pub mod utils;

use clap::{Parser, Subcommand};
use serde::{Deserialize, Serialize};

#[derive(Parser)]
#[command(name = "supermart")]
#[command(about = "Supermart admin CLI - tenant provisioning and token inspection")]
#[command(version)]
pub struct Cli {
    #[arg(long, global = true, help = "Output in JSON format")]
    pub json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    #[command(about = "Tenant provisioning")]
    Tenant {
        #[command(subcommand)]
        cmd: commands::tenant::TenantCommands,
    },

    #[command(about = "Platform superuser management")]
    Superuser {
        #[command(subcommand)]
        cmd: commands::superuser::SuperuserCommands,
    },

    #[command(about = "Token inspection")]
    Token {
        #[command(subcommand)]
        cmd: commands::token::TokenCommands,
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
        Commands::Tenant { cmd } => commands::tenant::handle(cmd, output_format).await,
        Commands::Superuser { cmd } => commands::superuser::handle(cmd, output_format).await,
        Commands::Token { cmd } => commands::token::handle(cmd, output_format).await,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_valid() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_tenant_create() {
        let cli = Cli::try_parse_from([
            "supermart", "--json", "tenant", "create", "Acme Foods",
            "--owner-username", "ada", "--owner-email", "ada@acme.com",
            "--owner-password", "Secret123", "--phone", "+254700000000",
        ])
        .unwrap();
        assert!(cli.json);
        assert!(matches!(cli.command, Commands::Tenant { .. }));
    }
}
