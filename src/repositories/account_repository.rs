use chrono::Utc;
use tracing::{debug, info};

use crate::models::user::{Account, AccountUpdate, CreateAccountInput};
use crate::storage::{Collection, RecordStore};
use crate::utils::code_generator::generate_id;
use crate::utils::errors::{conflict_error, not_found_error, AppError, AppResult};

/// Directorio de cuentas: búsqueda, alta, merge y verificación de credenciales
pub struct AccountRepository {
    accounts: Collection<Account>,
    bcrypt_cost: u32,
}

/// Emails iguales sin distinguir mayúsculas (Unicode) ni espacios de los bordes
fn same_email(a: &str, b: &str) -> bool {
    a.trim().to_lowercase() == b.trim().to_lowercase()
}

impl AccountRepository {
    pub fn new(store: RecordStore, bcrypt_cost: u32) -> Self {
        Self {
            accounts: Collection::new(store),
            bcrypt_cost,
        }
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<Account>> {
        Ok(self.accounts.find(|a| same_email(&a.email, email)).await?)
    }

    pub async fn find_by_id(&self, id: &str) -> AppResult<Option<Account>> {
        Ok(self.accounts.find(|a| a.id == id).await?)
    }

    pub async fn all(&self) -> AppResult<Vec<Account>> {
        Ok(self.accounts.all().await?)
    }

    /// ¿Otra cuenta distinta de `id` ya usa este email?
    pub async fn email_in_use_by_other(&self, email: &str, id: &str) -> AppResult<bool> {
        Ok(self
            .accounts
            .find(|a| a.id != id && same_email(&a.email, email))
            .await?
            .is_some())
    }

    pub async fn create(&self, input: CreateAccountInput) -> AppResult<Account> {
        let email = input.email.trim().to_string();

        // Verificar antes de pagar el costo del hash
        if self.find_by_email(&email).await?.is_some() {
            return Err(conflict_error("Account", "email", &email));
        }

        let password_hash = hash_password(input.password, self.bcrypt_cost).await?;

        let mut guard = self.accounts.lock().await?;
        if guard.records().iter().any(|a| same_email(&a.email, &email)) {
            return Err(conflict_error("Account", "email", &email));
        }

        let now = Utc::now();
        let account = Account {
            id: generate_id("user"),
            email,
            password_hash,
            name: input.name.trim().to_string(),
            role: input.role,
            fleet_owner_id: None,
            created_at: now,
            updated_at: now,
        };

        let mut next = guard.records().to_vec();
        next.push(account.clone());
        guard.commit(next).await?;

        info!("👤 Cuenta creada: {} ({})", account.id, account.role);
        Ok(account)
    }

    /// Merge de campos; `updated_at` se refresca siempre
    pub async fn update(&self, id: &str, update: AccountUpdate) -> AppResult<Account> {
        let mut guard = self.accounts.lock().await?;

        let index = guard
            .records()
            .iter()
            .position(|a| a.id == id)
            .ok_or_else(|| not_found_error("Account", id))?;

        if let Some(email) = &update.email {
            if guard
                .records()
                .iter()
                .any(|a| a.id != id && same_email(&a.email, email))
            {
                return Err(AppError::Conflict(
                    "Email is already in use by another account".to_string(),
                ));
            }
        }

        let mut next = guard.records().to_vec();
        let updated = update.apply(&next[index], Utc::now());
        next[index] = updated.clone();
        guard.commit(next).await?;

        debug!("👤 Cuenta actualizada: {}", id);
        Ok(updated)
    }

    pub async fn verify_credential(&self, plain: &str, hash: &str) -> AppResult<bool> {
        verify_password(plain.to_string(), hash.to_string()).await
    }

    /// Buscar por email y verificar la credencial; `None` si no coincide
    pub async fn authenticate(&self, email: &str, password: &str) -> AppResult<Option<Account>> {
        let Some(account) = self.find_by_email(email).await? else {
            return Ok(None);
        };
        if self.verify_credential(password, &account.password_hash).await? {
            Ok(Some(account))
        } else {
            Ok(None)
        }
    }
}

/// bcrypt es deliberadamente lento: se ejecuta fuera del runtime async
async fn hash_password(password: String, cost: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || bcrypt::hash(password, cost))
        .await
        .map_err(|e| AppError::Internal(format!("Hashing task failed: {}", e)))?
        .map_err(AppError::from)
}

async fn verify_password(plain: String, hash: String) -> AppResult<bool> {
    tokio::task::spawn_blocking(move || bcrypt::verify(plain, &hash))
        .await
        .map_err(|e| AppError::Internal(format!("Verification task failed: {}", e)))?
        .map_err(AppError::from)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::user::AccountRole;
    use crate::storage::MemoryBackend;
    use crate::utils::errors::ErrorKind;
    use std::sync::Arc;

    fn repository() -> AccountRepository {
        AccountRepository::new(RecordStore::new(Arc::new(MemoryBackend::new())), 4)
    }

    fn input(email: &str, role: AccountRole) -> CreateAccountInput {
        CreateAccountInput {
            email: email.to_string(),
            password: "correct horse".to_string(),
            name: "Test User".to_string(),
            role,
        }
    }

    #[tokio::test]
    async fn test_create_hashes_credential() {
        let repo = repository();
        let account = repo.create(input("owner@example.com", AccountRole::Owner)).await.unwrap();

        assert_ne!(account.password_hash, "correct horse");
        assert!(repo.verify_credential("correct horse", &account.password_hash).await.unwrap());
        assert!(!repo.verify_credential("wrong horse", &account.password_hash).await.unwrap());
    }

    #[tokio::test]
    async fn test_duplicate_email_is_conflict_case_insensitive() {
        let repo = repository();
        repo.create(input("owner@example.com", AccountRole::Owner)).await.unwrap();

        let error = repo
            .create(input("OWNER@Example.com", AccountRole::Driver))
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Conflict);
        assert_eq!(repo.all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_find_by_email_ignores_case() {
        let repo = repository();
        let created = repo.create(input("Driver@Example.com", AccountRole::Driver)).await.unwrap();

        let found = repo.find_by_email("driver@example.COM").await.unwrap().unwrap();
        assert_eq!(found.id, created.id);
        assert!(repo.find_by_id(&created.id).await.unwrap().is_some());
        assert!(repo.find_by_id("user_missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_update_missing_is_not_found() {
        let repo = repository();
        let error = repo.update("user_missing", AccountUpdate::default()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_update_refreshes_timestamp_and_keeps_omitted_fields() {
        let repo = repository();
        let created = repo.create(input("driver@example.com", AccountRole::Driver)).await.unwrap();

        let updated = repo
            .update(
                &created.id,
                AccountUpdate {
                    fleet_owner_id: Some(Some("user_owner".to_string())),
                    ..Default::default()
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.fleet_owner_id.as_deref(), Some("user_owner"));
        assert_eq!(updated.email, created.email);
        assert_eq!(updated.password_hash, created.password_hash);
        assert!(updated.updated_at >= created.updated_at);
    }

    #[tokio::test]
    async fn test_update_rejects_taken_email() {
        let repo = repository();
        repo.create(input("a@example.com", AccountRole::Owner)).await.unwrap();
        let b = repo.create(input("b@example.com", AccountRole::Owner)).await.unwrap();

        assert!(repo.email_in_use_by_other("A@example.com", &b.id).await.unwrap());
        let error = repo
            .update(
                &b.id,
                AccountUpdate {
                    email: Some("A@EXAMPLE.COM".to_string()),
                    ..Default::default()
                },
            )
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Conflict);
    }

    #[tokio::test]
    async fn test_authenticate() {
        let repo = repository();
        let created = repo.create(input("owner@example.com", AccountRole::Owner)).await.unwrap();

        let ok = repo.authenticate("OWNER@example.com", "correct horse").await.unwrap();
        assert_eq!(ok.map(|a| a.id), Some(created.id));
        assert!(repo.authenticate("owner@example.com", "nope").await.unwrap().is_none());
        assert!(repo.authenticate("ghost@example.com", "correct horse").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_email_match_is_unicode_case_insensitive() {
        let repo = repository();
        let account = repo.create(input("ÉLISE@Example.com", AccountRole::Driver)).await.unwrap();

        let found = repo.find_by_email("  élise@example.com ").await.unwrap().unwrap();
        assert_eq!(found.id, account.id);

        let error = repo.create(input("élise@EXAMPLE.com", AccountRole::Owner)).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Conflict);
        assert!(repo.email_in_use_by_other("Élise@example.com", "user_other").await.unwrap());
        assert!(!repo.email_in_use_by_other("élise@example.com", &account.id).await.unwrap());
    }

    #[test]
    fn test_same_email_trims_both_sides() {
        assert!(same_email(" Driver@Example.com", "driver@example.com  "));
        assert!(!same_email("driver@example.com", "driver2@example.com"));
    }
}
