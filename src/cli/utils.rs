use serde_json::{json, Value};
use std::sync::Arc;

use crate::cli::OutputFormat;
use crate::config;
use crate::database::{DatabaseManager, PgStore};
use crate::services::TenantService;

/// Output a success message in the appropriate format
pub fn output_success(
    output_format: &OutputFormat,
    message: &str,
    data: Option<Value>,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            let mut response = json!({
                "success": true,
                "message": message
            });

            if let Some(data_value) = data {
                response["data"] = data_value;
            }

            println!("{}", serde_json::to_string_pretty(&response)?);
        }
        OutputFormat::Text => {
            println!("✓ {}", message);
        }
    }
    Ok(())
}

/// Output an empty collection in the appropriate format
pub fn output_empty_collection(
    output_format: &OutputFormat,
    collection_name: &str,
    message: &str,
) -> anyhow::Result<()> {
    match output_format {
        OutputFormat::Json => {
            println!("{}", serde_json::to_string_pretty(&json!({
                collection_name: []
            }))?);
        }
        OutputFormat::Text => {
            println!("{}", message);
        }
    }
    Ok(())
}

/// Connect to `DATABASE_URL` and make sure the platform tables exist.
pub async fn connect_store() -> anyhow::Result<PgStore> {
    let config = config::config();
    let url = config
        .database
        .url
        .as_deref()
        .ok_or_else(|| anyhow::anyhow!("DATABASE_URL is not set"))?;

    let db = DatabaseManager::connect(url, &config.database).await?;
    db.bootstrap().await?;
    Ok(PgStore::new(db))
}

pub async fn tenant_service() -> anyhow::Result<TenantService> {
    let store = Arc::new(connect_store().await?);
    Ok(TenantService::new(
        store.clone(),
        store,
        config::config().api.base_domain.clone(),
    ))
}
