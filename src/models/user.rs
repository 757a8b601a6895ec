//! Modelo de Account
//!
//! Cuentas de dueños de flota y conductores. El hash de la credencial se
//! persiste pero nunca sale en las respuestas de la API.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::record_store::snake_case_keys;
use crate::storage::Record;

/// Rol de una cuenta
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AccountRole {
    Owner,
    Driver,
}

impl AccountRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            AccountRole::Owner => "owner",
            AccountRole::Driver => "driver",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "owner" => Some(AccountRole::Owner),
            "driver" => Some(AccountRole::Driver),
            _ => None,
        }
    }
}

impl fmt::Display for AccountRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Account principal - un registro de la colección `users`
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Account {
    pub id: String,
    pub email: String,
    pub password_hash: String,
    pub name: String,
    pub role: AccountRole,
    /// Dueño de la flota a la que pertenece un conductor
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fleet_owner_id: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record for Account {
    const COLLECTION: &'static str = "users";

    fn migrate(from_version: u32, record: Value) -> Result<Value, String> {
        match from_version {
            // El formato legado guardaba el hash en `password`
            0 => match snake_case_keys(record) {
                Value::Object(mut map) => {
                    if let Some(hash) = map.remove("password") {
                        map.insert("password_hash".to_string(), hash);
                    }
                    Ok(Value::Object(map))
                }
                _ => Err("account record is not an object".to_string()),
            },
            _ => Ok(record),
        }
    }
}

/// Datos para crear una cuenta; la contraseña llega en texto plano y solo se hashea
#[derive(Debug, Clone)]
pub struct CreateAccountInput {
    pub email: String,
    pub password: String,
    pub name: String,
    pub role: AccountRole,
}

/// Merge parcial sobre una cuenta: los campos `None` se conservan
#[derive(Debug, Clone, Default, PartialEq)]
pub struct AccountUpdate {
    pub email: Option<String>,
    pub name: Option<String>,
    pub role: Option<AccountRole>,
    /// `Some(None)` limpia, `Some(Some(id))` asigna, `None` ignora
    pub fleet_owner_id: Option<Option<String>>,
}

impl AccountUpdate {
    pub fn is_empty(&self) -> bool {
        self == &AccountUpdate::default()
    }

    /// Aplicar el merge sobre una copia de la cuenta
    pub fn apply(&self, account: &Account, now: DateTime<Utc>) -> Account {
        Account {
            email: self.email.clone().unwrap_or_else(|| account.email.clone()),
            name: self.name.clone().unwrap_or_else(|| account.name.clone()),
            role: self.role.unwrap_or(account.role),
            fleet_owner_id: match &self.fleet_owner_id {
                Some(value) => value.clone(),
                None => account.fleet_owner_id.clone(),
            },
            updated_at: now,
            ..account.clone()
        }
    }
}
