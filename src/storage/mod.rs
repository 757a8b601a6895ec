//! Almacenamiento de colecciones
//!
//! Este módulo contiene el record store genérico: cada tipo de entidad vive
//! en una colección durable identificada por una clave estable, y se carga
//! y se persiste completa.

pub mod backend;
pub mod collection;
pub mod record_store;

pub use backend::{FileBackend, MemoryBackend, StorageBackend};
pub use collection::{Collection, CollectionGuard};
pub use record_store::{Record, RecordStore};

use thiserror::Error;
use tracing::info;

use crate::models::checklist::{Checklist, ChecklistCompletion};
use crate::models::fleet::{FleetCode, FleetMembership, Truck};
use crate::models::user::Account;

/// Errores de la capa de almacenamiento
#[derive(Error, Debug)]
pub enum StorageError {
    #[error("I/O error on collection '{collection}': {source}")]
    Io {
        collection: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Serialization error on collection '{collection}': {source}")]
    Serialization {
        collection: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Collection '{collection}' has schema version {found}, newest supported is {supported}")]
    UnsupportedVersion {
        collection: String,
        found: u32,
        supported: u32,
    },

    #[error("Migration of collection '{collection}' from version {from} failed: {reason}")]
    Migration {
        collection: String,
        from: u32,
        reason: String,
    },
}

/// Inicializa y migra todas las colecciones conocidas
///
/// Una colección ausente se crea vacía; una colección en un formato antiguo
/// se reescribe en la versión actual.
pub async fn bootstrap(store: &RecordStore) -> Result<(), StorageError> {
    init_and_migrate::<Account>(store).await?;
    init_and_migrate::<FleetCode>(store).await?;
    init_and_migrate::<FleetMembership>(store).await?;
    init_and_migrate::<Truck>(store).await?;
    init_and_migrate::<Checklist>(store).await?;
    init_and_migrate::<ChecklistCompletion>(store).await?;
    info!("📦 Colecciones inicializadas");
    Ok(())
}

async fn init_and_migrate<T: Record>(store: &RecordStore) -> Result<(), StorageError> {
    store.init::<T>().await?;
    store.migrate::<T>().await?;
    Ok(())
}
