//! Modelos de flota
//!
//! Códigos de ingreso, membresías conductor-dueño y camiones.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::storage::record_store::snake_case_keys;
use crate::storage::Record;
use crate::utils::code_generator::is_code_expired;

/// Código de ingreso a una flota
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FleetCode {
    pub code: String,
    pub owner_id: String,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
    pub is_active: bool,
}

impl FleetCode {
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        is_code_expired(self.expires_at, now)
    }

    /// Activo y no expirado en `now`
    pub fn is_usable_at(&self, now: DateTime<Utc>) -> bool {
        self.is_active && !self.is_expired_at(now)
    }
}

impl Record for FleetCode {
    const COLLECTION: &'static str = "fleet_codes";
}

/// Estado de una membresía: `active` hasta que el dueño la retira
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum MembershipStatus {
    Active,
    Removed { removed_at: DateTime<Utc> },
}

/// Membresía de un conductor en la flota de un dueño
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FleetMembership {
    pub id: String,
    pub driver_id: String,
    pub owner_id: String,
    pub driver_email: String,
    pub driver_name: String,
    pub joined_at: DateTime<Utc>,
    #[serde(flatten)]
    pub status: MembershipStatus,
}

impl FleetMembership {
    pub fn is_active(&self) -> bool {
        matches!(self.status, MembershipStatus::Active)
    }
}

impl Record for FleetMembership {
    const COLLECTION: &'static str = "fleet_members";

    fn migrate(from_version: u32, record: Value) -> Result<Value, String> {
        match from_version {
            // El formato legado no registraba cuándo se retiró la membresía;
            // se usa la fecha de ingreso como cota inferior
            0 => match snake_case_keys(record) {
                Value::Object(mut map) => {
                    let removed = map.get("status").and_then(Value::as_str) == Some("removed");
                    if removed && !map.contains_key("removed_at") {
                        let joined_at = map.get("joined_at").cloned().unwrap_or(Value::Null);
                        map.insert("removed_at".to_string(), joined_at);
                    }
                    Ok(Value::Object(map))
                }
                _ => Err("membership record is not an object".to_string()),
            },
            _ => Ok(record),
        }
    }
}

/// Datos de ingreso de un conductor a una flota
#[derive(Debug, Clone)]
pub struct NewMembership {
    pub driver_id: String,
    pub owner_id: String,
    pub driver_email: String,
    pub driver_name: String,
}

/// Estado del camión
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TruckStatus {
    Active,
    Maintenance,
    Inactive,
}

/// Camión registrado por un dueño
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Truck {
    pub id: String,
    pub owner_id: String,
    pub make: String,
    pub model: String,
    pub year: i32,
    pub vin: String,
    pub license_plate: String,
    pub registered_at: DateTime<Utc>,
    pub status: TruckStatus,
}

impl Record for Truck {
    const COLLECTION: &'static str = "trucks";
}

/// Datos para registrar un camión
#[derive(Debug, Clone)]
pub struct RegisterTruckInput {
    pub make: String,
    pub model: String,
    pub year: i32,
    pub vin: String,
    pub license_plate: String,
}

/// Merge parcial sobre un camión
#[derive(Debug, Clone, Default)]
pub struct TruckUpdate {
    pub make: Option<String>,
    pub model: Option<String>,
    pub year: Option<i32>,
    pub vin: Option<String>,
    pub license_plate: Option<String>,
    pub status: Option<TruckStatus>,
}

impl TruckUpdate {
    pub fn apply(&self, truck: &Truck) -> Truck {
        Truck {
            make: self.make.as_deref().map(str::trim).map(str::to_string).unwrap_or_else(|| truck.make.clone()),
            model: self.model.as_deref().map(str::trim).map(str::to_string).unwrap_or_else(|| truck.model.clone()),
            year: self.year.unwrap_or(truck.year),
            vin: self.vin.as_deref().map(normalize_identifier).unwrap_or_else(|| truck.vin.clone()),
            license_plate: self
                .license_plate
                .as_deref()
                .map(normalize_identifier)
                .unwrap_or_else(|| truck.license_plate.clone()),
            status: self.status.unwrap_or(truck.status),
            ..truck.clone()
        }
    }
}

/// VIN y matrícula se guardan sin espacios alrededor y en mayúsculas
pub fn normalize_identifier(value: &str) -> String {
    value.trim().to_uppercase()
}
