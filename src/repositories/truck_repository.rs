use chrono::Utc;
use tracing::info;

use crate::models::fleet::{normalize_identifier, RegisterTruckInput, Truck, TruckStatus, TruckUpdate};
use crate::storage::{Collection, RecordStore};
use crate::utils::code_generator::generate_id;
use crate::utils::errors::{not_found_error, AppError, AppResult};

pub struct TruckRepository {
    trucks: Collection<Truck>,
}

fn ensure_owner(truck: &Truck, owner_id: &str) -> AppResult<()> {
    if truck.owner_id != owner_id {
        return Err(AppError::Forbidden("Truck does not belong to this owner".to_string()));
    }
    Ok(())
}

impl TruckRepository {
    pub fn new(store: RecordStore) -> Self {
        Self {
            trucks: Collection::new(store),
        }
    }

    pub async fn register(&self, owner_id: &str, input: RegisterTruckInput) -> AppResult<Truck> {
        let truck = Truck {
            id: generate_id("truck"),
            owner_id: owner_id.to_string(),
            make: input.make.trim().to_string(),
            model: input.model.trim().to_string(),
            year: input.year,
            vin: normalize_identifier(&input.vin),
            license_plate: normalize_identifier(&input.license_plate),
            registered_at: Utc::now(),
            status: TruckStatus::Active,
        };

        let mut guard = self.trucks.lock().await?;
        let mut next = guard.records().to_vec();
        next.push(truck.clone());
        guard.commit(next).await?;

        info!("🚛 Camión {} registrado para {}", truck.id, owner_id);
        Ok(truck)
    }

    pub async fn by_owner(&self, owner_id: &str) -> AppResult<Vec<Truck>> {
        Ok(self.trucks.filter(|t| t.owner_id == owner_id).await?)
    }

    pub async fn by_id(&self, id: &str, owner_id: &str) -> AppResult<Truck> {
        let truck = self
            .trucks
            .find(|t| t.id == id)
            .await?
            .ok_or_else(|| not_found_error("Truck", id))?;
        ensure_owner(&truck, owner_id)?;
        Ok(truck)
    }

    pub async fn update(&self, id: &str, owner_id: &str, update: TruckUpdate) -> AppResult<Truck> {
        let mut guard = self.trucks.lock().await?;
        let index = guard
            .records()
            .iter()
            .position(|t| t.id == id)
            .ok_or_else(|| not_found_error("Truck", id))?;

        let mut next = guard.records().to_vec();
        ensure_owner(&next[index], owner_id)?;
        let updated = update.apply(&next[index]);
        next[index] = updated.clone();
        guard.commit(next).await?;

        Ok(updated)
    }

    pub async fn delete(&self, id: &str, owner_id: &str) -> AppResult<()> {
        let mut guard = self.trucks.lock().await?;
        let truck = guard
            .records()
            .iter()
            .find(|t| t.id == id)
            .ok_or_else(|| not_found_error("Truck", id))?;
        ensure_owner(truck, owner_id)?;

        let next = guard.records().iter().filter(|t| t.id != id).cloned().collect();
        guard.commit(next).await?;

        info!("🗑️ Camión {} eliminado", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;
    use crate::utils::errors::ErrorKind;
    use std::sync::Arc;

    fn repository() -> TruckRepository {
        TruckRepository::new(RecordStore::new(Arc::new(MemoryBackend::new())))
    }

    fn input() -> RegisterTruckInput {
        RegisterTruckInput {
            make: " Freightliner ".to_string(),
            model: "Cascadia".to_string(),
            year: 2021,
            vin: " 1fujgldr5clbp8834 ".to_string(),
            license_plate: "abc-1234".to_string(),
        }
    }

    #[tokio::test]
    async fn test_register_normalizes_fields() {
        let repo = repository();
        let truck = repo.register("owner_o", input()).await.unwrap();

        assert!(truck.id.starts_with("truck_"));
        assert_eq!(truck.make, "Freightliner");
        assert_eq!(truck.vin, "1FUJGLDR5CLBP8834");
        assert_eq!(truck.license_plate, "ABC-1234");
        assert_eq!(truck.status, TruckStatus::Active);
    }

    #[tokio::test]
    async fn test_owner_scoping() {
        let repo = repository();
        let truck = repo.register("owner_o", input()).await.unwrap();
        repo.register("owner_p", input()).await.unwrap();

        assert_eq!(repo.by_owner("owner_o").await.unwrap().len(), 1);
        assert_eq!(
            repo.by_id(&truck.id, "owner_p").await.unwrap_err().kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            repo.delete(&truck.id, "owner_p").await.unwrap_err().kind(),
            ErrorKind::Forbidden
        );
        assert_eq!(
            repo.by_id("truck_missing", "owner_o").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let repo = repository();
        let truck = repo.register("owner_o", input()).await.unwrap();

        let updated = repo
            .update(
                &truck.id,
                "owner_o",
                TruckUpdate {
                    status: Some(TruckStatus::Maintenance),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.status, TruckStatus::Maintenance);
        assert_eq!(updated.registered_at, truck.registered_at);

        repo.delete(&truck.id, "owner_o").await.unwrap();
        assert!(repo.by_owner("owner_o").await.unwrap().is_empty());
        assert_eq!(
            repo.delete(&truck.id, "owner_o").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }
}
