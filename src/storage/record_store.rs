//! Record store genérico
//!
//! `load`/`save` trabajan sobre la colección completa de un tipo. El archivo
//! persistido es un sobre versionado `{ "version": n, "records": [...] }`;
//! un arreglo JSON plano se interpreta como versión 0 (formato legado).

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{Map, Value};
use tracing::{debug, info};

use super::{StorageBackend, StorageError};

/// Entidad persistible en una colección
pub trait Record: Serialize + DeserializeOwned + Clone + Send + Sync + 'static {
    /// Clave estable de la colección
    const COLLECTION: &'static str;

    /// Versión actual del esquema de un registro
    const SCHEMA_VERSION: u32 = 1;

    /// Llevar un registro crudo de `from_version` a `from_version + 1`
    ///
    /// Por defecto, la versión 0 solo traduce las claves camelCase del
    /// formato legado a snake_case.
    fn migrate(from_version: u32, record: Value) -> Result<Value, String> {
        match from_version {
            0 => Ok(snake_case_keys(record)),
            _ => Ok(record),
        }
    }
}

/// Convertir las claves de primer nivel de un objeto a snake_case
pub fn snake_case_keys(record: Value) -> Value {
    match record {
        Value::Object(map) => Value::Object(
            map.into_iter()
                .map(|(key, value)| (to_snake_case(&key), value))
                .collect::<Map<String, Value>>(),
        ),
        other => other,
    }
}

fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    for c in key.chars() {
        if c.is_ascii_uppercase() {
            out.push('_');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}

#[derive(Serialize)]
struct Envelope<'a, T> {
    version: u32,
    records: &'a [T],
}

/// Punto de acceso a las colecciones sobre un backend
#[derive(Clone)]
pub struct RecordStore {
    backend: Arc<dyn StorageBackend>,
}

impl RecordStore {
    pub fn new(backend: Arc<dyn StorageBackend>) -> Self {
        Self { backend }
    }

    /// Cargar la colección completa de `T`, en orden de inserción
    ///
    /// Una colección inexistente es una secuencia vacía, nunca un error.
    pub async fn load<T: Record>(&self) -> Result<Vec<T>, StorageError> {
        match self.backend.read(T::COLLECTION).await? {
            Some(bytes) => Ok(decode::<T>(&bytes)?.1),
            None => Ok(Vec::new()),
        }
    }

    /// Reemplazar la colección completa de `T`
    pub async fn save<T: Record>(&self, records: &[T]) -> Result<(), StorageError> {
        let envelope = Envelope {
            version: T::SCHEMA_VERSION,
            records,
        };
        let bytes = serde_json::to_vec_pretty(&envelope).map_err(|source| {
            StorageError::Serialization {
                collection: T::COLLECTION.to_string(),
                source,
            }
        })?;
        self.backend.write(T::COLLECTION, &bytes).await?;
        debug!("💾 Colección '{}' guardada ({} registros)", T::COLLECTION, records.len());
        Ok(())
    }

    /// Crear la colección vacía si todavía no existe
    pub async fn init<T: Record>(&self) -> Result<(), StorageError> {
        if self.backend.read(T::COLLECTION).await?.is_none() {
            info!("🆕 Creando colección vacía '{}'", T::COLLECTION);
            self.save::<T>(&[]).await?;
        }
        Ok(())
    }

    /// Reescribir la colección en la versión de esquema actual si hace falta
    ///
    /// Devuelve `true` si hubo que migrar.
    pub async fn migrate<T: Record>(&self) -> Result<bool, StorageError> {
        let Some(bytes) = self.backend.read(T::COLLECTION).await? else {
            return Ok(false);
        };
        let (version, records) = decode::<T>(&bytes)?;
        if version == T::SCHEMA_VERSION {
            return Ok(false);
        }
        info!(
            "🔄 Migrando colección '{}' de v{} a v{} ({} registros)",
            T::COLLECTION,
            version,
            T::SCHEMA_VERSION,
            records.len()
        );
        self.save(&records).await?;
        Ok(true)
    }
}

fn migration_error<T: Record>(from: u32, reason: impl Into<String>) -> StorageError {
    StorageError::Migration {
        collection: T::COLLECTION.to_string(),
        from,
        reason: reason.into(),
    }
}

/// Decodificar bytes persistidos a (versión almacenada, registros actuales)
fn decode<T: Record>(bytes: &[u8]) -> Result<(u32, Vec<T>), StorageError> {
    let serialization = |source| StorageError::Serialization {
        collection: T::COLLECTION.to_string(),
        source,
    };

    if bytes.iter().all(u8::is_ascii_whitespace) {
        return Ok((T::SCHEMA_VERSION, Vec::new()));
    }

    let value: Value = serde_json::from_slice(bytes).map_err(serialization)?;
    let (version, raw_records) = match value {
        Value::Array(records) => (0, records),
        Value::Object(mut map) => {
            let version = map
                .get("version")
                .and_then(Value::as_u64)
                .and_then(|v| u32::try_from(v).ok())
                .ok_or_else(|| migration_error::<T>(0, "missing or invalid version"))?;
            match map.remove("records") {
                Some(Value::Array(records)) => (version, records),
                _ => return Err(migration_error::<T>(version, "missing records array")),
            }
        }
        _ => return Err(migration_error::<T>(0, "collection is neither an array nor an envelope")),
    };

    if version > T::SCHEMA_VERSION {
        return Err(StorageError::UnsupportedVersion {
            collection: T::COLLECTION.to_string(),
            found: version,
            supported: T::SCHEMA_VERSION,
        });
    }

    let records = raw_records
        .into_iter()
        .map(|raw| {
            let mut current = raw;
            for from in version..T::SCHEMA_VERSION {
                current = T::migrate(from, current).map_err(|reason| migration_error::<T>(from, reason))?;
            }
            serde_json::from_value(current).map_err(serialization)
        })
        .collect::<Result<Vec<T>, StorageError>>()?;

    Ok((version, records))
}
