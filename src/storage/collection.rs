//! Colección protegida por mutex
//!
//! Mantiene en memoria la copia ordenada de una colección y serializa el
//! ciclo cargar-calcular-guardar: dos operaciones concurrentes sobre la misma
//! colección nunca se pisan las escrituras.

use tokio::sync::{Mutex, MutexGuard};

use super::{Record, RecordStore, StorageError};

pub struct Collection<T: Record> {
    store: RecordStore,
    records: Mutex<Option<Vec<T>>>,
}

impl<T: Record> Collection<T> {
    pub fn new(store: RecordStore) -> Self {
        Self {
            store,
            records: Mutex::new(None),
        }
    }

    /// Tomar el lock de la colección, cargándola del store la primera vez
    pub async fn lock(&self) -> Result<CollectionGuard<'_, T>, StorageError> {
        let mut records = self.records.lock().await;
        if records.is_none() {
            *records = Some(self.store.load::<T>().await?);
        }
        Ok(CollectionGuard {
            store: &self.store,
            records,
        })
    }

    /// Copia completa de la colección
    pub async fn all(&self) -> Result<Vec<T>, StorageError> {
        Ok(self.lock().await?.records().to_vec())
    }

    /// Registros que cumplen el predicado, en orden
    pub async fn filter<F>(&self, predicate: F) -> Result<Vec<T>, StorageError>
    where
        F: Fn(&T) -> bool,
    {
        let guard = self.lock().await?;
        Ok(guard.records().iter().filter(|r| predicate(r)).cloned().collect())
    }

    /// Primer registro que cumple el predicado
    pub async fn find<F>(&self, predicate: F) -> Result<Option<T>, StorageError>
    where
        F: Fn(&T) -> bool,
    {
        let guard = self.lock().await?;
        Ok(guard.records().iter().find(|r| predicate(r)).cloned())
    }
}

/// Acceso exclusivo a una colección mientras dura el guard
pub struct CollectionGuard<'a, T: Record> {
    store: &'a RecordStore,
    records: MutexGuard<'a, Option<Vec<T>>>,
}

impl<T: Record> CollectionGuard<'_, T> {
    pub fn records(&self) -> &[T] {
        self.records.as_deref().unwrap_or(&[])
    }

    /// Persistir la nueva versión de la colección y reemplazar la copia en memoria
    ///
    /// Si la escritura falla, la copia en memoria queda intacta.
    pub async fn commit(&mut self, next: Vec<T>) -> Result<(), StorageError> {
        self.store.save(&next).await?;
        *self.records = Some(next);
        Ok(())
    }
}
