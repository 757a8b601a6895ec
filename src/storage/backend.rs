//! Backends de almacenamiento
//!
//! Un backend solo sabe leer y escribir bytes por clave de colección.
//! `FileBackend` persiste en disco con reemplazo atómico; `MemoryBackend`
//! se usa en tests y en modo efímero.

use std::collections::HashMap;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::debug;

use super::StorageError;

/// Operaciones de lectura/escritura sobre colecciones completas
#[async_trait]
pub trait StorageBackend: Send + Sync {
    /// Leer el contenido de una colección; `None` si nunca se escribió
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError>;

    /// Reemplazar el contenido completo de una colección
    async fn write(&self, key: &str, contents: &[u8]) -> Result<(), StorageError>;
}

/// Backend en disco: un archivo JSON por colección dentro de `data_dir`
#[derive(Debug, Clone)]
pub struct FileBackend {
    data_dir: PathBuf,
}

impl FileBackend {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
        }
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    fn path_for(&self, key: &str) -> PathBuf {
        self.data_dir.join(format!("{}.json", key))
    }
}

fn io_error(key: &str, source: std::io::Error) -> StorageError {
    StorageError::Io {
        collection: key.to_string(),
        source,
    }
}

#[async_trait]
impl StorageBackend for FileBackend {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        let path = self.path_for(key);
        match tokio::fs::read(&path).await {
            Ok(bytes) => {
                debug!("📥 Leídos {} bytes de {}", bytes.len(), path.display());
                Ok(Some(bytes))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(io_error(key, e)),
        }
    }

    async fn write(&self, key: &str, contents: &[u8]) -> Result<(), StorageError> {
        tokio::fs::create_dir_all(&self.data_dir)
            .await
            .map_err(|e| io_error(key, e))?;

        // Escribir a un temporal y renombrar: el archivo final nunca queda a medias
        let path = self.path_for(key);
        let mut tmp = path.clone();
        tmp.set_extension("json.tmp");

        tokio::fs::write(&tmp, contents)
            .await
            .map_err(|e| io_error(key, e))?;
        tokio::fs::rename(&tmp, &path)
            .await
            .map_err(|e| io_error(key, e))?;

        debug!("💾 Escritos {} bytes en {}", contents.len(), path.display());
        Ok(())
    }
}

/// Backend en memoria compartido entre clones
#[derive(Debug, Clone, Default)]
pub struct MemoryBackend {
    collections: Arc<RwLock<HashMap<String, Vec<u8>>>>,
}

impl MemoryBackend {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contenido crudo de una colección (útil para inspeccionar el formato persistido)
    pub async fn raw(&self, key: &str) -> Option<Vec<u8>> {
        self.collections.read().await.get(key).cloned()
    }

    /// Sembrar una colección con bytes arbitrarios
    pub async fn put_raw(&self, key: &str, contents: Vec<u8>) {
        self.collections.write().await.insert(key.to_string(), contents);
    }
}

#[async_trait]
impl StorageBackend for MemoryBackend {
    async fn read(&self, key: &str) -> Result<Option<Vec<u8>>, StorageError> {
        Ok(self.collections.read().await.get(key).cloned())
    }

    async fn write(&self, key: &str, contents: &[u8]) -> Result<(), StorageError> {
        self.collections
            .write()
            .await
            .insert(key.to_string(), contents.to_vec());
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_backend_missing_collection_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path());

        assert!(backend.read("trucks").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_file_backend_replaces_without_leaving_temp_file() {
        let dir = tempfile::tempdir().unwrap();
        let backend = FileBackend::new(dir.path().join("nested"));

        backend.write("trucks", b"[1]").await.unwrap();
        backend.write("trucks", b"[1,2]").await.unwrap();

        let stored = backend.read("trucks").await.unwrap().unwrap();
        assert_eq!(stored, b"[1,2]");
        assert!(!dir.path().join("nested").join("trucks.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_memory_backend_shared_between_clones() {
        let backend = MemoryBackend::new();
        let other = backend.clone();

        backend.write("users", b"[]").await.unwrap();
        assert_eq!(other.raw("users").await.unwrap(), b"[]");
    }
}
