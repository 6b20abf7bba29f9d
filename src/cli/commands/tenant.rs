use clap::Subcommand;
use serde_json::json;

use crate::cli::utils::*;
use crate::cli::OutputFormat;
use crate::services::SignupRequest;

#[derive(Subcommand)]
pub enum TenantCommands {
    #[command(about = "List all tenants")]
    List,

    #[command(about = "Create a tenant with its schema, domain and owner")]
    Create {
        #[arg(help = "Company name")]
        name: String,

        #[arg(long, help = "Schema name (defaults to a slug of the company name)")]
        schema: Option<String>,

        #[arg(long)]
        owner_username: String,

        #[arg(long)]
        owner_email: String,

        #[arg(long)]
        owner_password: String,

        #[arg(long, default_value = "Owner")]
        first_name: String,

        #[arg(long, default_value = "Account")]
        last_name: String,

        #[arg(long)]
        phone: String,

        #[arg(long, default_value = "1-10", help = "One of 1-10, 11-50, 51-200, 201-500, 500+")]
        size: String,
    },
}

pub async fn handle(cmd: TenantCommands, output_format: OutputFormat) -> anyhow::Result<()> {
    let service = tenant_service().await?;

    match cmd {
        TenantCommands::List => {
            let tenants = service.list_tenants().await?;

            if tenants.is_empty() {
                return output_empty_collection(&output_format, "tenants", "No tenants provisioned");
            }

            match output_format {
                OutputFormat::Json => {
                    println!("{}", serde_json::to_string_pretty(&json!({ "tenants": tenants }))?);
                }
                OutputFormat::Text => {
                    println!("{:<20} {:<25} {:<8} {:<8} {}", "SCHEMA", "NAME", "ACTIVE", "TRIAL", "CREATED");
                    println!("{}", "-".repeat(75));

                    for tenant in &tenants {
                        println!(
                            "{:<20} {:<25} {:<8} {:<8} {}",
                            tenant.schema_name.as_str(), tenant.name, tenant.is_active, tenant.on_trial, tenant.created_on
                        );
                    }
                }
            }

            Ok(())
        }
        TenantCommands::Create {
            name,
            schema,
            owner_username,
            owner_email,
            owner_password,
            first_name,
            last_name,
            phone,
            size,
        } => {
            let (tenant, owner) = service
                .signup(SignupRequest {
                    first_name,
                    last_name,
                    email: owner_email,
                    username: owner_username,
                    password: owner_password,
                    company_name: name,
                    company_size: size,
                    phone_number: phone,
                    schema_name: schema,
                })
                .await?;

            let domain = service.domain_for(&tenant.schema_name);
            output_success(
                &output_format,
                &format!("Tenant '{}' created on {}", tenant.schema_name, domain),
                Some(json!({ "tenant": tenant, "domain": domain, "owner_id": owner.id })),
            )
        }
    }
}
