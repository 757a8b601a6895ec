//! Generación de códigos de flota e identificadores

use chrono::{DateTime, Duration, Utc};
use rand::Rng;

use crate::utils::errors::AppError;

const FLEET_CODE_CHARSET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const ID_SUFFIX_CHARSET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

pub const FLEET_CODE_LENGTH: usize = 8;
pub const FLEET_CODE_VALIDITY_DAYS: i64 = 7;
pub const DEFAULT_MAX_ATTEMPTS: u32 = 10;

fn random_string(charset: &[u8], len: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..len)
        .map(|_| char::from(charset[rng.gen_range(0..charset.len())]))
        .collect()
}

/// Código de 8 caracteres tomados uniformemente de `[A-Z0-9]`
pub fn generate_fleet_code() -> String {
    random_string(FLEET_CODE_CHARSET, FLEET_CODE_LENGTH)
}

/// Fecha de expiración de un código: exactamente 7 días después
pub fn calculate_expiration_date(from: DateTime<Utc>) -> DateTime<Utc> {
    from + Duration::days(FLEET_CODE_VALIDITY_DAYS)
}

/// Un código expira estrictamente después de `expires_at`; el instante exacto sigue vigente
pub fn is_code_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now > expires_at
}

/// Generar un código que no esté en `existing_codes`, con un número acotado de intentos
pub fn generate_unique_fleet_code(
    existing_codes: &[String],
    max_attempts: u32,
) -> Result<String, AppError> {
    for _ in 0..max_attempts {
        let code = generate_fleet_code();
        if !existing_codes.iter().any(|existing| *existing == code) {
            return Ok(code);
        }
    }

    Err(AppError::ExhaustedRetries(format!(
        "Unable to generate unique fleet code after {} attempts",
        max_attempts
    )))
}

/// Id opaco: `{prefix}_{unix_millis}_{9 caracteres base36}`
pub fn generate_id(prefix: &str) -> String {
    format!(
        "{}_{}_{}",
        prefix,
        Utc::now().timestamp_millis(),
        random_string(ID_SUFFIX_CHARSET, 9)
    )
}
