use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::types::CompanySize;

/// An account. `tenant_id` is `None` only for platform superusers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub username: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub company_name: Option<String>,
    pub company_size: Option<CompanySize>,
    pub is_active: bool,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
}

impl User {
    /// Whether this user may act inside the given tenant.
    pub fn belongs_to(&self, tenant_id: Uuid) -> bool {
        self.is_superuser || self.tenant_id == Some(tenant_id)
    }
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub tenant_id: Option<Uuid>,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub company_name: Option<String>,
    pub company_size: Option<CompanySize>,
    pub is_superuser: bool,
}

impl NewUser {
    pub fn into_user(self) -> User {
        User {
            id: Uuid::new_v4(),
            tenant_id: self.tenant_id,
            username: self.username,
            email: self.email.to_ascii_lowercase(),
            password_hash: self.password_hash,
            first_name: self.first_name,
            last_name: self.last_name,
            phone_number: self.phone_number,
            company_name: self.company_name,
            company_size: self.company_size,
            is_active: true,
            is_superuser: self.is_superuser,
            date_joined: Utc::now(),
        }
    }
}

/// Public profile returned by the API.
#[derive(Debug, Clone, Serialize)]
pub struct UserProfile {
    pub id: Uuid,
    pub tenant_id: Option<Uuid>,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    pub phone_number: Option<String>,
    pub company_name: Option<String>,
    pub company_size: Option<CompanySize>,
    pub is_superuser: bool,
    pub date_joined: DateTime<Utc>,
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            tenant_id: user.tenant_id,
            username: user.username.clone(),
            email: user.email.clone(),
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            phone_number: user.phone_number.clone(),
            company_name: user.company_name.clone(),
            company_size: user.company_size,
            is_superuser: user.is_superuser,
            date_joined: user.date_joined,
        }
    }
}
