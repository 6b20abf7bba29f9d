/// Shared types used across the codebase

use serde::{Deserialize, Serialize};
use std::fmt;

/// Postgres identifier length limit.
const MAX_SCHEMA_LEN: usize = 63;

/// Schemas that belong to the platform or to Postgres itself.
const RESERVED_SCHEMAS: &[&str] = &["public", "information_schema", "platform", "admin", "www"];

/// Name of an isolated tenant schema.
///
/// Always a lowercase Postgres identifier (`[a-z][a-z0-9_]*`, at most 63
/// bytes) that is safe to interpolate into `CREATE SCHEMA` / `SET search_path`.
/// The platform schema `public` is only reachable through [`SchemaName::public`];
/// parsing it from input is rejected.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct SchemaName(String);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SchemaNameError {
    #[error("schema name must not be empty")]
    Empty,
    #[error("schema name must be at most {MAX_SCHEMA_LEN} characters")]
    TooLong,
    #[error("schema name must start with a lowercase letter")]
    InvalidStart,
    #[error("schema name may only contain lowercase letters, digits and underscores")]
    InvalidCharacter,
    #[error("schema name '{0}' is reserved")]
    Reserved(String),
}

impl SchemaName {
    pub fn parse(raw: &str) -> Result<Self, SchemaNameError> {
        if raw.is_empty() {
            return Err(SchemaNameError::Empty);
        }
        if raw.len() > MAX_SCHEMA_LEN {
            return Err(SchemaNameError::TooLong);
        }
        if !raw.starts_with(|c: char| c.is_ascii_lowercase()) {
            return Err(SchemaNameError::InvalidStart);
        }
        if !raw.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_') {
            return Err(SchemaNameError::InvalidCharacter);
        }
        if RESERVED_SCHEMAS.contains(&raw) || raw.starts_with("pg_") {
            return Err(SchemaNameError::Reserved(raw.to_string()));
        }
        Ok(Self(raw.to_string()))
    }

    /// The shared platform schema served on the base domain.
    pub fn public() -> Self {
        Self("public".to_string())
    }

    pub fn is_public(&self) -> bool {
        self.0 == "public"
    }

    /// Derive a schema name from a free-form company name.
    ///
    /// "Acme Foods Ltd." becomes `acme_foods_ltd`; names starting with a digit
    /// get a `t_` prefix.
    pub fn slugify(name: &str) -> Result<Self, SchemaNameError> {
        let mut slug = String::with_capacity(name.len());
        for c in name.trim().chars() {
            if c.is_ascii_alphanumeric() {
                slug.push(c.to_ascii_lowercase());
            } else if !slug.ends_with('_') && !slug.is_empty() {
                slug.push('_');
            }
        }
        let slug = slug.trim_end_matches('_');
        let slug = if slug.starts_with(|c: char| c.is_ascii_digit()) {
            format!("t_{}", slug)
        } else {
            slug.to_string()
        };
        let slug: String = slug.chars().take(MAX_SCHEMA_LEN).collect();
        Self::parse(slug.trim_end_matches('_'))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// DNS label for the tenant's default host. Hostname labels may not
    /// contain underscores or end with a hyphen.
    pub fn host_label(&self) -> String {
        self.0.replace('_', "-").trim_end_matches('-').to_string()
    }

    /// Double-quoted identifier for DDL.
    pub fn quoted(&self) -> String {
        format!("\"{}\"", self.0)
    }
}

impl TryFrom<String> for SchemaName {
    type Error = SchemaNameError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<SchemaName> for String {
    fn from(value: SchemaName) -> Self {
        value.0
    }
}

impl fmt::Display for SchemaName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Company size buckets offered at signup.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CompanySize {
    #[serde(rename = "1-10")]
    Micro,
    #[serde(rename = "11-50")]
    Small,
    #[serde(rename = "51-200")]
    Medium,
    #[serde(rename = "201-500")]
    Large,
    #[serde(rename = "500+")]
    Enterprise,
}

impl CompanySize {
    pub fn as_str(&self) -> &'static str {
        match self {
            CompanySize::Micro => "1-10",
            CompanySize::Small => "11-50",
            CompanySize::Medium => "51-200",
            CompanySize::Large => "201-500",
            CompanySize::Enterprise => "500+",
        }
    }

    pub fn parse(raw: &str) -> Option<Self> {
        match raw {
            "1-10" => Some(CompanySize::Micro),
            "11-50" => Some(CompanySize::Small),
            "51-200" => Some(CompanySize::Medium),
            "201-500" => Some(CompanySize::Large),
            "500+" => Some(CompanySize::Enterprise),
            _ => None,
        }
    }
}
