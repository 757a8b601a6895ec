use chrono::Utc;
use tracing::info;

use crate::models::fleet::{FleetMembership, MembershipStatus, NewMembership};
use crate::storage::{Collection, RecordStore};
use crate::utils::code_generator::generate_id;
use crate::utils::errors::{AppError, AppResult};

/// Registro de membresías. Las bajas cambian el estado; el historial se conserva.
pub struct FleetMemberRepository {
    members: Collection<FleetMembership>,
}

fn new_membership(member: NewMembership) -> FleetMembership {
    FleetMembership {
        id: generate_id("member"),
        driver_id: member.driver_id,
        owner_id: member.owner_id,
        driver_email: member.driver_email,
        driver_name: member.driver_name,
        joined_at: Utc::now(),
        status: MembershipStatus::Active,
    }
}

impl FleetMemberRepository {
    pub fn new(store: RecordStore) -> Self {
        Self {
            members: Collection::new(store),
        }
    }

    /// Miembros activos de la flota de un dueño
    pub async fn by_owner(&self, owner_id: &str) -> AppResult<Vec<FleetMembership>> {
        Ok(self
            .members
            .filter(|m| m.owner_id == owner_id && m.is_active())
            .await?)
    }

    /// Membresía activa de un conductor, si la tiene
    pub async fn by_driver(&self, driver_id: &str) -> AppResult<Option<FleetMembership>> {
        Ok(self
            .members
            .find(|m| m.driver_id == driver_id && m.is_active())
            .await?)
    }

    /// Historial completo, incluidas las membresías retiradas
    pub async fn all(&self) -> AppResult<Vec<FleetMembership>> {
        Ok(self.members.all().await?)
    }

    /// Agregar una membresía activa sin verificar unicidad
    pub async fn add(&self, member: NewMembership) -> AppResult<FleetMembership> {
        let membership = new_membership(member);

        let mut guard = self.members.lock().await?;
        let mut next = guard.records().to_vec();
        next.push(membership.clone());
        guard.commit(next).await?;

        info!("🚚 Conductor {} se unió a la flota de {}", membership.driver_id, membership.owner_id);
        Ok(membership)
    }

    /// Agregar una membresía solo si el conductor no tiene otra activa
    ///
    /// Verificación y alta ocurren bajo el mismo lock: dos ingresos
    /// concurrentes del mismo conductor no pueden crear dos membresías.
    pub async fn add_if_no_active(&self, member: NewMembership) -> AppResult<FleetMembership> {
        let mut guard = self.members.lock().await?;
        if guard
            .records()
            .iter()
            .any(|m| m.driver_id == member.driver_id && m.is_active())
        {
            return Err(AppError::Conflict("Driver already belongs to a fleet".to_string()));
        }

        let membership = new_membership(member);
        let mut next = guard.records().to_vec();
        next.push(membership.clone());
        guard.commit(next).await?;

        info!("🚚 Conductor {} se unió a la flota de {}", membership.driver_id, membership.owner_id);
        Ok(membership)
    }

    /// Retirar la membresía activa del conductor en la flota del dueño
    pub async fn remove(&self, driver_id: &str, owner_id: &str) -> AppResult<bool> {
        let mut guard = self.members.lock().await?;
        let Some(index) = guard
            .records()
            .iter()
            .position(|m| m.driver_id == driver_id && m.owner_id == owner_id && m.is_active())
        else {
            return Ok(false);
        };

        let mut next = guard.records().to_vec();
        next[index] = FleetMembership {
            status: MembershipStatus::Removed { removed_at: Utc::now() },
            ..next[index].clone()
        };
        guard.commit(next).await?;

        info!("🚪 Conductor {} retirado de la flota de {}", driver_id, owner_id);
        Ok(true)
    }

    /// Retirar al conductor de cualquier flota; devuelve cuántas membresías cambiaron
    pub async fn remove_all_for_driver(&self, driver_id: &str) -> AppResult<usize> {
        let mut guard = self.members.lock().await?;
        let affected = guard
            .records()
            .iter()
            .filter(|m| m.driver_id == driver_id && m.is_active())
            .count();
        if affected == 0 {
            return Ok(0);
        }

        let removed_at = Utc::now();
        let next = guard
            .records()
            .iter()
            .map(|m| {
                if m.driver_id == driver_id && m.is_active() {
                    FleetMembership {
                        status: MembershipStatus::Removed { removed_at },
                        ..m.clone()
                    }
                } else {
                    m.clone()
                }
            })
            .collect();
        guard.commit(next).await?;

        info!("🚪 Conductor {} retirado de {} flota(s)", driver_id, affected);
        Ok(affected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemoryBackend;
    use crate::utils::errors::ErrorKind;
    use std::sync::Arc;

    fn repository() -> FleetMemberRepository {
        FleetMemberRepository::new(RecordStore::new(Arc::new(MemoryBackend::new())))
    }

    fn join(driver_id: &str, owner_id: &str) -> NewMembership {
        NewMembership {
            driver_id: driver_id.to_string(),
            owner_id: owner_id.to_string(),
            driver_email: format!("{}@example.com", driver_id),
            driver_name: driver_id.to_uppercase(),
        }
    }

    #[tokio::test]
    async fn test_add_then_remove_keeps_history() {
        let repo = repository();
        repo.add(join("driver_d", "owner_o")).await.unwrap();

        let active = repo.by_driver("driver_d").await.unwrap().unwrap();
        assert_eq!(active.owner_id, "owner_o");

        assert!(repo.remove("driver_d", "owner_o").await.unwrap());
        assert!(repo.by_driver("driver_d").await.unwrap().is_none());

        let history = repo.all().await.unwrap();
        assert_eq!(history.len(), 1);
        assert!(matches!(history[0].status, MembershipStatus::Removed { .. }));
    }

    #[tokio::test]
    async fn test_remove_requires_matching_owner() {
        let repo = repository();
        repo.add(join("driver_d", "owner_o")).await.unwrap();

        assert!(!repo.remove("driver_d", "owner_x").await.unwrap());
        assert!(!repo.remove("driver_z", "owner_o").await.unwrap());
        assert!(repo.by_driver("driver_d").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_by_owner_lists_only_active() {
        let repo = repository();
        repo.add(join("driver_a", "owner_o")).await.unwrap();
        repo.add(join("driver_b", "owner_o")).await.unwrap();
        repo.add(join("driver_c", "owner_p")).await.unwrap();
        repo.remove("driver_b", "owner_o").await.unwrap();

        let members = repo.by_owner("owner_o").await.unwrap();
        assert_eq!(members.len(), 1);
        assert_eq!(members[0].driver_id, "driver_a");
    }

    #[tokio::test]
    async fn test_remove_all_for_driver() {
        let repo = repository();
        repo.add(join("driver_d", "owner_o")).await.unwrap();

        assert_eq!(repo.remove_all_for_driver("driver_d").await.unwrap(), 1);
        assert_eq!(repo.remove_all_for_driver("driver_d").await.unwrap(), 0);
        assert!(repo.by_driver("driver_d").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_add_if_no_active_rejects_second_membership() {
        let repo = repository();
        repo.add_if_no_active(join("driver_d", "owner_o")).await.unwrap();

        let error = repo.add_if_no_active(join("driver_d", "owner_p")).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Conflict);

        repo.remove("driver_d", "owner_o").await.unwrap();
        repo.add_if_no_active(join("driver_d", "owner_p")).await.unwrap();
        assert_eq!(repo.by_driver("driver_d").await.unwrap().unwrap().owner_id, "owner_p");
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_concurrent_joins_leave_one_active_membership() {
        let repo = Arc::new(repository());
        let mut handles = Vec::new();
        for _ in 0..8 {
            let repo = repo.clone();
            handles.push(tokio::spawn(async move {
                repo.add_if_no_active(join("driver_d", "owner_o")).await
            }));
        }

        let mut joined = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                joined += 1;
            }
        }
        assert_eq!(joined, 1);
        let active = repo
            .all()
            .await
            .unwrap()
            .into_iter()
            .filter(|m| m.driver_id == "driver_d" && m.is_active())
            .count();
        assert_eq!(active, 1);
    }
}
