use chrono::{NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::SchemaName;

pub const DEFAULT_MAX_USERS: i32 = 5;

/// A company with its own isolated schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tenant {
    pub id: Uuid,
    pub name: String,
    pub schema_name: SchemaName,
    pub owner_id: Option<Uuid>,
    pub contact_person: String,
    pub email: Option<String>,
    pub phone_number: String,
    pub is_active: bool,
    pub paid_until: Option<NaiveDate>,
    pub on_trial: bool,
    pub max_users: i32,
    pub created_on: NaiveDate,
}

/// Host name routed to a tenant schema.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Domain {
    pub domain: String,
    pub tenant_id: Uuid,
    pub is_primary: bool,
}

#[derive(Debug, Clone)]
pub struct NewTenant {
    pub name: String,
    pub schema_name: SchemaName,
    pub owner_id: Option<Uuid>,
    pub contact_person: String,
    pub email: Option<String>,
    pub phone_number: String,
}

impl NewTenant {
    /// Materialize with signup defaults: active, on trial, unpaid.
    pub fn into_tenant(self) -> Tenant {
        Tenant {
            id: Uuid::new_v4(),
            name: self.name,
            schema_name: self.schema_name,
            owner_id: self.owner_id,
            contact_person: self.contact_person,
            email: self.email,
            phone_number: self.phone_number,
            is_active: true,
            paid_until: None,
            on_trial: true,
            max_users: DEFAULT_MAX_USERS,
            created_on: Utc::now().date_naive(),
        }
    }
}

/// Partial update applied by platform administrators.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TenantUpdate {
    pub contact_person: Option<String>,
    pub email: Option<String>,
    pub phone_number: Option<String>,
    pub is_active: Option<bool>,
    pub paid_until: Option<NaiveDate>,
    pub on_trial: Option<bool>,
    pub max_users: Option<i32>,
}

impl TenantUpdate {
    pub fn apply(self, tenant: &mut Tenant) {
        if let Some(v) = self.contact_person {
            tenant.contact_person = v;
        }
        if let Some(v) = self.email {
            tenant.email = Some(v);
        }
        if let Some(v) = self.phone_number {
            tenant.phone_number = v;
        }
        if let Some(v) = self.is_active {
            tenant.is_active = v;
        }
        if let Some(v) = self.paid_until {
            tenant.paid_until = Some(v);
        }
        if let Some(v) = self.on_trial {
            tenant.on_trial = v;
        }
        if let Some(v) = self.max_users {
            tenant.max_users = v;
        }
    }
}
