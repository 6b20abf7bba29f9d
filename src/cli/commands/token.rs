use clap::Subcommand;

use crate::auth::{AuthError, TokenCodec, TokenType};
use crate::cli::OutputFormat;
use crate::config;

#[derive(Subcommand)]
pub enum TokenCommands {
    #[command(about = "Verify a token with the configured secret and print its claims")]
    Inspect {
        token: String,
    },
}

pub async fn handle(cmd: TokenCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        TokenCommands::Inspect { token } => {
            let codec = TokenCodec::from_config(&config::config().security)?;
            let claims = match codec.decode(&token, TokenType::Access) {
                Err(AuthError::WrongTokenType { .. }) => codec.decode(&token, TokenType::Refresh)?,
                other => other?,
            };

            match output_format {
                OutputFormat::Json => println!("{}", serde_json::to_string_pretty(&claims)?),
                OutputFormat::Text => {
                    println!("Subject:  {} ({})", claims.sub, claims.username);
                    println!("Type:     {:?}", claims.token_type);
                    println!(
                        "Tenant:   {}",
                        claims.tenant_schema.as_ref().map(|s| s.as_str()).unwrap_or("(platform)")
                    );
                    println!("Issuer:   {}", claims.iss);
                    println!("Expires:  {}", claims.expires_at());
                    println!("JTI:      {}", claims.jti);
                }
            }
            Ok(())
        }
    }
}
