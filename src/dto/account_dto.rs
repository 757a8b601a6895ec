use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::user::{Account, AccountRole};
use crate::utils::validation::{validate_email, validate_not_empty, validate_password};

// Request para registrar una cuenta
#[derive(Debug, Deserialize, Validate)]
pub struct RegisterAccountRequest {
    #[validate(custom = "validate_email")]
    pub email: String,
    #[validate(custom = "validate_password")]
    pub password: String,
    #[validate(custom = "validate_not_empty")]
    pub name: String,
    pub role: String,
}

// Request para actualizar el perfil; un cambio de `role` dispara el orquestador
#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateProfileRequest {
    #[validate(custom = "validate_email")]
    pub email: Option<String>,
    #[validate(custom = "validate_not_empty")]
    pub name: Option<String>,
    pub role: Option<String>,
}

// Response de cuenta (sin hash de credencial)
#[derive(Debug, Serialize)]
pub struct AccountResponse {
    pub id: String,
    pub email: String,
    pub name: String,
    pub role: AccountRole,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fleet_owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl From<Account> for AccountResponse {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            email: account.email,
            name: account.name,
            role: account.role,
            fleet_owner_id: account.fleet_owner_id,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}
