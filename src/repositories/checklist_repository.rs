use std::collections::{HashMap, HashSet};

use chrono::Utc;
use tracing::{debug, info};

use crate::models::checklist::{
    Checklist, ChecklistCompletion, ChecklistItem, ChecklistItemInput, CreateChecklistInput,
    UpdateChecklistInput,
};
use crate::storage::{Collection, RecordStore};
use crate::utils::code_generator::generate_id;
use crate::utils::errors::{bad_request_error, not_found_error, AppError, AppResult};

/// Checklists de los dueños y completitud por conductor
///
/// Orden de locks: `checklists` antes que `completions`.
pub struct ChecklistRepository {
    checklists: Collection<Checklist>,
    completions: Collection<ChecklistCompletion>,
}

/// Construir los ítems guardados a partir de la entrada
///
/// Solo se conserva un id que ya pertenece al checklist (`known`); cualquier
/// otro recibe uno nuevo. Repetir un id conocido es `BadRequest`. `order` por
/// defecto es la posición.
fn build_items(
    items: Vec<ChecklistItemInput>,
    known: &HashSet<String>,
) -> AppResult<Vec<ChecklistItem>> {
    let mut used = HashSet::new();
    let mut built = Vec::with_capacity(items.len());
    for (index, item) in items.into_iter().enumerate() {
        let id = match item.id.map(|id| id.trim().to_string()) {
            Some(id) if known.contains(&id) => {
                if !used.insert(id.clone()) {
                    return Err(bad_request_error(&format!("Duplicate checklist item id '{}'", id)));
                }
                id
            }
            _ => generate_id("item"),
        };
        built.push(ChecklistItem {
            id,
            description: item.description.trim().to_string(),
            order: item.order.unwrap_or(index as u32),
        });
    }
    Ok(built)
}

fn ensure_owner(checklist: &Checklist, owner_id: &str) -> AppResult<()> {
    if checklist.owner_id != owner_id {
        return Err(AppError::Forbidden("Checklist does not belong to this owner".to_string()));
    }
    Ok(())
}

impl ChecklistRepository {
    pub fn new(store: RecordStore) -> Self {
        Self {
            checklists: Collection::new(store.clone()),
            completions: Collection::new(store),
        }
    }

    pub async fn create(&self, owner_id: &str, input: CreateChecklistInput) -> AppResult<Checklist> {
        let now = Utc::now();
        let checklist = Checklist {
            id: generate_id("checklist"),
            owner_id: owner_id.to_string(),
            title: input.title.trim().to_string(),
            items: build_items(input.items, &HashSet::new())?,
            created_at: now,
            updated_at: now,
        };

        let mut guard = self.checklists.lock().await?;
        let mut next = guard.records().to_vec();
        next.push(checklist.clone());
        guard.commit(next).await?;

        info!("📋 Checklist {} creado ({} ítems)", checklist.id, checklist.items.len());
        Ok(checklist)
    }

    pub async fn by_owner(&self, owner_id: &str) -> AppResult<Vec<Checklist>> {
        Ok(self.checklists.filter(|c| c.owner_id == owner_id).await?)
    }

    pub async fn by_id(&self, id: &str) -> AppResult<Option<Checklist>> {
        Ok(self.checklists.find(|c| c.id == id).await?)
    }

    /// Reemplazar título y/o ítems; `updated_at` se refresca
    ///
    /// Las completitudes de ítems que ya no existen se purgan antes de guardar
    /// el checklist.
    pub async fn update(
        &self,
        id: &str,
        owner_id: &str,
        update: UpdateChecklistInput,
    ) -> AppResult<Checklist> {
        let mut checklists = self.checklists.lock().await?;
        let index = checklists
            .records()
            .iter()
            .position(|c| c.id == id)
            .ok_or_else(|| not_found_error("Checklist", id))?;

        let mut next = checklists.records().to_vec();
        let current = &next[index];
        ensure_owner(current, owner_id)?;

        let items = match update.items {
            Some(items) => {
                let known: HashSet<String> = current.items.iter().map(|i| i.id.clone()).collect();
                build_items(items, &known)?
            }
            None => current.items.clone(),
        };
        let updated = Checklist {
            title: update
                .title
                .map(|t| t.trim().to_string())
                .unwrap_or_else(|| current.title.clone()),
            items,
            updated_at: Utc::now(),
            ..current.clone()
        };

        let mut completions = self.completions.lock().await?;
        let remaining: Vec<ChecklistCompletion> = completions
            .records()
            .iter()
            .filter(|c| c.checklist_id != id || updated.has_item(&c.item_id))
            .cloned()
            .collect();
        let purged = completions.records().len() - remaining.len();
        if purged > 0 {
            completions.commit(remaining).await?;
        }

        next[index] = updated.clone();
        checklists.commit(next).await?;

        debug!("📋 Checklist {} actualizado ({} completitudes purgadas)", id, purged);
        Ok(updated)
    }

    /// Borrar el checklist y todas sus filas de completitud
    ///
    /// Las completitudes se purgan primero: una falla a mitad de camino deja
    /// un checklist sin avance, nunca filas huérfanas.
    pub async fn delete(&self, id: &str, owner_id: &str) -> AppResult<usize> {
        let mut checklists = self.checklists.lock().await?;
        let checklist = checklists
            .records()
            .iter()
            .find(|c| c.id == id)
            .ok_or_else(|| not_found_error("Checklist", id))?;
        ensure_owner(checklist, owner_id)?;

        let mut completions = self.completions.lock().await?;
        let remaining: Vec<ChecklistCompletion> = completions
            .records()
            .iter()
            .filter(|c| c.checklist_id != id)
            .cloned()
            .collect();
        let purged = completions.records().len() - remaining.len();
        if purged > 0 {
            completions.commit(remaining).await?;
        }

        let next = checklists.records().iter().filter(|c| c.id != id).cloned().collect();
        checklists.commit(next).await?;

        info!("🗑️ Checklist {} eliminado ({} completitudes purgadas)", id, purged);
        Ok(purged)
    }

    /// Upsert por (checklist, ítem, conductor)
    ///
    /// `completed_at` solo se estampa al marcar como completo.
    pub async fn set_completion(
        &self,
        checklist_id: &str,
        item_id: &str,
        driver_id: &str,
        completed: bool,
    ) -> AppResult<ChecklistCompletion> {
        let checklists = self.checklists.lock().await?;
        let checklist = checklists
            .records()
            .iter()
            .find(|c| c.id == checklist_id)
            .ok_or_else(|| not_found_error("Checklist", checklist_id))?;
        if !checklist.has_item(item_id) {
            return Err(not_found_error("Checklist item", item_id));
        }

        let mut completions = self.completions.lock().await?;
        let existing = completions
            .records()
            .iter()
            .position(|c| c.matches(checklist_id, item_id, driver_id));

        let mut next = completions.records().to_vec();
        let completion = ChecklistCompletion {
            id: existing
                .map(|index| next[index].id.clone())
                .unwrap_or_else(|| generate_id("completion")),
            checklist_id: checklist_id.to_string(),
            item_id: item_id.to_string(),
            driver_id: driver_id.to_string(),
            completed,
            completed_at: completed.then(Utc::now),
        };
        match existing {
            Some(index) => next[index] = completion.clone(),
            None => next.push(completion.clone()),
        }
        completions.commit(next).await?;

        debug!(
            "✅ Ítem {} de {} para {}: completed={}",
            item_id, checklist_id, driver_id, completed
        );
        Ok(completion)
    }

    /// Mapa ítem → completado para un conductor, limitado a los ítems actuales
    pub async fn status_for(
        &self,
        checklist_id: &str,
        driver_id: &str,
    ) -> AppResult<HashMap<String, bool>> {
        let checklists = self.checklists.lock().await?;
        let Some(checklist) = checklists.records().iter().find(|c| c.id == checklist_id) else {
            return Ok(HashMap::new());
        };

        let completions = self.completions.lock().await?;
        Ok(completions
            .records()
            .iter()
            .filter(|c| {
                c.checklist_id == checklist_id
                    && c.driver_id == driver_id
                    && checklist.has_item(&c.item_id)
            })
            .map(|c| (c.item_id.clone(), c.completed))
            .collect())
    }

    pub async fn completions_for_driver(&self, driver_id: &str) -> AppResult<Vec<ChecklistCompletion>> {
        Ok(self.completions.filter(|c| c.driver_id == driver_id).await?)
    }

    pub async fn all_completions(&self) -> AppResult<Vec<ChecklistCompletion>> {
        Ok(self.completions.all().await?)
    }

    /// Purgar todo el avance de un conductor; devuelve cuántas filas se borraron
    pub async fn delete_driver_completions(&self, driver_id: &str) -> AppResult<usize> {
        let mut completions = self.completions.lock().await?;
        let remaining: Vec<ChecklistCompletion> = completions
            .records()
            .iter()
            .filter(|c| c.driver_id != driver_id)
            .cloned()
            .collect();
        let purged = completions.records().len() - remaining.len();
        if purged > 0 {
            completions.commit(remaining).await?;
            info!("🧹 {} completitud(es) purgadas para {}", purged, driver_id);
        }
        Ok(purged)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::checklist::progress_percent;
    use crate::storage::MemoryBackend;
    use crate::utils::errors::ErrorKind;
    use std::sync::Arc;

    fn repository() -> ChecklistRepository {
        ChecklistRepository::new(RecordStore::new(Arc::new(MemoryBackend::new())))
    }

    fn items(descriptions: &[&str]) -> Vec<ChecklistItemInput> {
        descriptions
            .iter()
            .map(|d| ChecklistItemInput {
                id: None,
                description: d.to_string(),
                order: None,
            })
            .collect()
    }

    async fn pre_trip(repo: &ChecklistRepository, owner_id: &str) -> Checklist {
        repo.create(
            owner_id,
            CreateChecklistInput {
                title: "Pre-trip inspection".to_string(),
                items: items(&["Tires", "Brakes", "Lights"]),
            },
        )
        .await
        .unwrap()
    }

    #[tokio::test]
    async fn test_create_assigns_ids_and_order() {
        let repo = repository();
        let checklist = pre_trip(&repo, "owner_o").await;

        assert!(checklist.id.starts_with("checklist_"));
        assert!(checklist.items.iter().all(|i| i.id.starts_with("item_")));
        let orders: Vec<u32> = checklist.items.iter().map(|i| i.order).collect();
        assert_eq!(orders, vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_update_replaces_items_and_keeps_known_ids() {
        let repo = repository();
        let checklist = pre_trip(&repo, "owner_o").await;
        let kept = checklist.items[0].clone();

        let updated = repo
            .update(
                &checklist.id,
                "owner_o",
                UpdateChecklistInput {
                    title: None,
                    items: Some(vec![
                        ChecklistItemInput {
                            id: Some(kept.id.clone()),
                            description: kept.description.clone(),
                            order: Some(0),
                        },
                        ChecklistItemInput {
                            id: None,
                            description: "Mirrors".to_string(),
                            order: Some(1),
                        },
                    ]),
                },
            )
            .await
            .unwrap();

        assert_eq!(updated.title, checklist.title);
        assert_eq!(updated.items.len(), 2);
        assert_eq!(updated.items[0].id, kept.id);
        assert!(updated.updated_at >= checklist.updated_at);

        let error = repo
            .update(&checklist.id, "owner_x", UpdateChecklistInput::default())
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Forbidden);
    }

    #[tokio::test]
    async fn test_delete_cascades_only_to_its_completions() {
        let repo = repository();
        let doomed = pre_trip(&repo, "owner_o").await;
        let kept = pre_trip(&repo, "owner_o").await;

        repo.set_completion(&doomed.id, &doomed.items[0].id, "driver_d", true).await.unwrap();
        repo.set_completion(&doomed.id, &doomed.items[1].id, "driver_e", true).await.unwrap();
        repo.set_completion(&kept.id, &kept.items[0].id, "driver_d", true).await.unwrap();

        assert_eq!(repo.delete(&doomed.id, "owner_o").await.unwrap(), 2);

        let remaining = repo.all_completions().await.unwrap();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining[0].checklist_id, kept.id);
        assert!(repo.by_id(&doomed.id).await.unwrap().is_none());
        assert_eq!(
            repo.delete(&doomed.id, "owner_o").await.unwrap_err().kind(),
            ErrorKind::NotFound
        );
    }

    #[tokio::test]
    async fn test_set_completion_upserts_by_triple() {
        let repo = repository();
        let checklist = pre_trip(&repo, "owner_o").await;
        let item = &checklist.items[0].id;

        let first = repo.set_completion(&checklist.id, item, "driver_d", true).await.unwrap();
        assert!(first.completed_at.is_some());

        let second = repo.set_completion(&checklist.id, item, "driver_d", false).await.unwrap();
        assert_eq!(second.id, first.id);
        assert!(second.completed_at.is_none());
        assert_eq!(repo.all_completions().await.unwrap().len(), 1);

        repo.set_completion(&checklist.id, item, "driver_e", true).await.unwrap();
        assert_eq!(repo.all_completions().await.unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_set_completion_requires_known_item() {
        let repo = repository();
        let checklist = pre_trip(&repo, "owner_o").await;

        let error = repo
            .set_completion(&checklist.id, "item_missing", "driver_d", true)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);

        let error = repo
            .set_completion("checklist_missing", &checklist.items[0].id, "driver_d", true)
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::NotFound);
    }

    #[tokio::test]
    async fn test_status_for_is_per_driver() {
        let repo = repository();
        let checklist = pre_trip(&repo, "owner_o").await;
        repo.set_completion(&checklist.id, &checklist.items[0].id, "driver_d", true).await.unwrap();
        repo.set_completion(&checklist.id, &checklist.items[1].id, "driver_d", true).await.unwrap();
        repo.set_completion(&checklist.id, &checklist.items[2].id, "driver_e", true).await.unwrap();

        let status = repo.status_for(&checklist.id, "driver_d").await.unwrap();
        assert_eq!(status.len(), 2);
        assert!(!status.contains_key(&checklist.items[2].id));

        let done = status.values().filter(|c| **c).count();
        assert_eq!(progress_percent(done, checklist.items.len()), 67);
    }

    #[tokio::test]
    async fn test_delete_driver_completions() {
        let repo = repository();
        let checklist = pre_trip(&repo, "owner_o").await;
        repo.set_completion(&checklist.id, &checklist.items[0].id, "driver_d", true).await.unwrap();
        repo.set_completion(&checklist.id, &checklist.items[0].id, "driver_e", true).await.unwrap();

        assert_eq!(repo.delete_driver_completions("driver_d").await.unwrap(), 1);
        assert!(repo.completions_for_driver("driver_d").await.unwrap().is_empty());
        assert_eq!(repo.completions_for_driver("driver_e").await.unwrap().len(), 1);
    }

    fn with_id(id: &str, description: &str) -> ChecklistItemInput {
        ChecklistItemInput {
            id: Some(id.to_string()),
            description: description.to_string(),
            order: None,
        }
    }

    #[tokio::test]
    async fn test_create_ignores_caller_item_ids() {
        let repo = repository();
        let checklist = repo
            .create(
                "owner_o",
                CreateChecklistInput {
                    title: "Walkaround".to_string(),
                    items: vec![with_id("item_x", "Tires"), with_id("item_x", "Brakes")],
                },
            )
            .await
            .unwrap();

        assert!(checklist.items.iter().all(|i| i.id != "item_x"));
        assert_ne!(checklist.items[0].id, checklist.items[1].id);
    }

    #[tokio::test]
    async fn test_update_only_keeps_ids_of_this_checklist() {
        let repo = repository();
        let checklist = pre_trip(&repo, "owner_o").await;
        let other = pre_trip(&repo, "owner_o").await;
        let kept = &checklist.items[0].id;

        let updated = repo
            .update(
                &checklist.id,
                "owner_o",
                UpdateChecklistInput {
                    title: None,
                    items: Some(vec![
                        with_id(kept, "Tires"),
                        with_id(&other.items[0].id, "Borrowed"),
                        with_id("item_invented", "Invented"),
                    ]),
                },
            )
            .await
            .unwrap();

        assert_eq!(&updated.items[0].id, kept);
        assert_ne!(updated.items[1].id, other.items[0].id);
        assert_ne!(updated.items[2].id, "item_invented");

        let error = repo
            .update(
                &checklist.id,
                "owner_o",
                UpdateChecklistInput {
                    title: None,
                    items: Some(vec![with_id(kept, "Tires"), with_id(kept, "Tires again")]),
                },
            )
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::BadRequest);
        let stored = repo.by_id(&checklist.id).await.unwrap().unwrap();
        assert_eq!(stored.items.len(), 3);
    }

    #[tokio::test]
    async fn test_update_purges_completions_of_removed_items() {
        let repo = repository();
        let checklist = pre_trip(&repo, "owner_o").await;
        let other = pre_trip(&repo, "owner_o").await;
        let (tires, brakes) = (&checklist.items[0], &checklist.items[1]);
        repo.set_completion(&checklist.id, &tires.id, "driver_d", true).await.unwrap();
        repo.set_completion(&checklist.id, &brakes.id, "driver_d", true).await.unwrap();
        repo.set_completion(&other.id, &other.items[1].id, "driver_d", true).await.unwrap();

        repo.update(
            &checklist.id,
            "owner_o",
            UpdateChecklistInput {
                title: None,
                items: Some(vec![with_id(&tires.id, "Tires"), with_id("", "Mirrors")]),
            },
        )
        .await
        .unwrap();

        let status = repo.status_for(&checklist.id, "driver_d").await.unwrap();
        assert_eq!(status.len(), 1);
        assert_eq!(status.get(&tires.id), Some(&true));

        let rows = repo.completions_for_driver("driver_d").await.unwrap();
        assert_eq!(rows.len(), 2);
        assert!(rows.iter().all(|c| c.item_id != brakes.id));
    }
}
