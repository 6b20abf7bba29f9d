use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::OutputFormat;

#[derive(Subcommand)]
pub enum SuperuserCommands {
    #[command(about = "Create a platform superuser (no tenant)")]
    Create {
        username: String,

        email: String,

        #[arg(long)]
        password: String,
    },
}

pub async fn handle(cmd: SuperuserCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    match cmd {
        SuperuserCommands::Create { username, email, password } => {
            let service = tenant_service().await?;
            let user = service.create_superuser(&username, &email, &password).await?;

            output_success(
                &output_format,
                &format!("Superuser '{}' created", user.username),
                Some(json!({ "id": user.id, "username": user.username })),
            )
        }
    }
}
