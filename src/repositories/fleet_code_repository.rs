use std::fmt;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::models::fleet::FleetCode;
use crate::storage::{Collection, RecordStore};
use crate::utils::errors::{AppError, AppResult};

/// Motivo por el que un código no sirve para ingresar a una flota
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodeRejection {
    NotFound,
    Inactive,
    Expired,
}

impl fmt::Display for CodeRejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let message = match self {
            CodeRejection::NotFound => "Fleet code not found",
            CodeRejection::Inactive => "Fleet code is no longer active",
            CodeRejection::Expired => "Fleet code has expired",
        };
        f.write_str(message)
    }
}

/// Resultado de validar un código de flota
#[derive(Debug, Clone, PartialEq)]
pub enum FleetCodeValidation {
    Valid(FleetCode),
    Invalid(CodeRejection),
}

impl FleetCodeValidation {
    pub fn is_valid(&self) -> bool {
        matches!(self, FleetCodeValidation::Valid(_))
    }

    pub fn error(&self) -> Option<String> {
        match self {
            FleetCodeValidation::Valid(_) => None,
            FleetCodeValidation::Invalid(rejection) => Some(rejection.to_string()),
        }
    }

    pub fn record(&self) -> Option<&FleetCode> {
        match self {
            FleetCodeValidation::Valid(code) => Some(code),
            FleetCodeValidation::Invalid(_) => None,
        }
    }
}

/// Validar un registro (o su ausencia) en el instante `now`
///
/// Prioridad: inexistente, inactivo, expirado.
pub fn validate_record(record: Option<FleetCode>, now: DateTime<Utc>) -> FleetCodeValidation {
    match record {
        None => FleetCodeValidation::Invalid(CodeRejection::NotFound),
        Some(code) if !code.is_active => FleetCodeValidation::Invalid(CodeRejection::Inactive),
        Some(code) if code.is_expired_at(now) => FleetCodeValidation::Invalid(CodeRejection::Expired),
        Some(code) => FleetCodeValidation::Valid(code),
    }
}

/// Registro de códigos de flota. Los códigos nunca se borran, solo se desactivan.
pub struct FleetCodeRepository {
    codes: Collection<FleetCode>,
}

impl FleetCodeRepository {
    pub fn new(store: RecordStore) -> Self {
        Self {
            codes: Collection::new(store),
        }
    }

    /// Código activo y no expirado del dueño; la expiración se evalúa al leer
    pub async fn get_active(&self, owner_id: &str) -> AppResult<Option<FleetCode>> {
        let now = Utc::now();
        Ok(self
            .codes
            .find(|c| c.owner_id == owner_id && c.is_usable_at(now))
            .await?)
    }

    pub async fn get_by_code(&self, code: &str) -> AppResult<Option<FleetCode>> {
        Ok(self.codes.find(|c| c.code == code).await?)
    }

    pub async fn all(&self) -> AppResult<Vec<FleetCode>> {
        Ok(self.codes.all().await?)
    }

    pub async fn create(&self, code: FleetCode) -> AppResult<FleetCode> {
        let mut guard = self.codes.lock().await?;
        let mut next = guard.records().to_vec();
        next.push(code.clone());
        guard.commit(next).await?;

        info!("🔑 Código de flota creado para {} (expira {})", code.owner_id, code.expires_at);
        Ok(code)
    }

    /// Emitir un código solo si el dueño no tiene otro utilizable
    ///
    /// La verificación y el alta comparten el lock de la colección, así dos
    /// generaciones concurrentes no dejan dos códigos activos.
    pub async fn create_for_owner(&self, code: FleetCode) -> AppResult<FleetCode> {
        let now = Utc::now();
        let mut guard = self.codes.lock().await?;
        if guard
            .records()
            .iter()
            .any(|c| c.owner_id == code.owner_id && c.is_usable_at(now))
        {
            return Err(AppError::Conflict(
                "An active fleet code already exists; invalidate it first".to_string(),
            ));
        }
        if guard.records().iter().any(|c| c.code == code.code) {
            return Err(AppError::Conflict(format!("Fleet code '{}' already exists", code.code)));
        }

        let mut next = guard.records().to_vec();
        next.push(code.clone());
        guard.commit(next).await?;

        info!("🔑 Código de flota creado para {} (expira {})", code.owner_id, code.expires_at);
        Ok(code)
    }

    /// Desactivar un código puntual
    pub async fn invalidate(&self, code: &str) -> AppResult<FleetCode> {
        let mut guard = self.codes.lock().await?;
        let index = guard
            .records()
            .iter()
            .position(|c| c.code == code)
            .ok_or_else(|| AppError::NotFound(format!("Fleet code '{}' not found", code)))?;

        let mut next = guard.records().to_vec();
        let updated = FleetCode {
            is_active: false,
            ..next[index].clone()
        };
        next[index] = updated.clone();
        guard.commit(next).await?;

        debug!("🔒 Código de flota desactivado: {}", code);
        Ok(updated)
    }

    /// Desactivar todos los códigos activos del dueño; devuelve cuántos cambiaron
    pub async fn invalidate_all_for_owner(&self, owner_id: &str) -> AppResult<usize> {
        let mut guard = self.codes.lock().await?;
        let affected = guard
            .records()
            .iter()
            .filter(|c| c.owner_id == owner_id && c.is_active)
            .count();
        if affected == 0 {
            return Ok(0);
        }

        let next = guard
            .records()
            .iter()
            .map(|c| {
                if c.owner_id == owner_id && c.is_active {
                    FleetCode {
                        is_active: false,
                        ..c.clone()
                    }
                } else {
                    c.clone()
                }
            })
            .collect();
        guard.commit(next).await?;

        info!("🔒 {} código(s) de flota desactivados para {}", affected, owner_id);
        Ok(affected)
    }

    /// Única fuente de verdad sobre si un código permite ingresar a una flota
    pub async fn validate(&self, code: &str) -> AppResult<FleetCodeValidation> {
        let record = self.get_by_code(code).await?;
        Ok(validate_record(record, Utc::now()))
    }

    /// Todos los códigos emitidos, para chequear unicidad al generar
    pub async fn all_code_strings(&self) -> AppResult<Vec<String>> {
        let guard = self.codes.lock().await?;
        Ok(guard.records().iter().map(|c| c.code.clone()).collect())
    }
}
