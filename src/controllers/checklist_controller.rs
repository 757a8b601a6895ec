use std::sync::Arc;

use crate::dto::checklist_dto::{
    ChecklistView, CreateChecklistRequest, SetCompletionRequest, UpdateChecklistRequest,
};
use crate::dto::ApiResponse;
use crate::middleware::identity::CallerIdentity;
use crate::models::checklist::{
    Checklist, ChecklistCompletion, ChecklistItemInput, CreateChecklistInput, UpdateChecklistInput,
};
use crate::models::user::AccountRole;
use crate::repositories::account_repository::AccountRepository;
use crate::repositories::checklist_repository::ChecklistRepository;
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, not_found_error, AppError, AppResult};

fn check_title(title: &str) -> AppResult<()> {
    if title.trim().is_empty() {
        return Err(bad_request_error("Checklist title is required"));
    }
    Ok(())
}

fn check_items(items: &[ChecklistItemInput]) -> AppResult<()> {
    if items.is_empty() {
        return Err(bad_request_error("Checklist must contain at least one item"));
    }
    if items.iter().any(|item| item.description.trim().is_empty()) {
        return Err(bad_request_error("Checklist items need a description"));
    }
    Ok(())
}

pub struct ChecklistController {
    accounts: Arc<AccountRepository>,
    checklists: Arc<ChecklistRepository>,
}

impl ChecklistController {
    pub fn new(state: &AppState) -> Self {
        Self {
            accounts: state.accounts.clone(),
            checklists: state.checklists.clone(),
        }
    }

    /// Dueño del conductor que llama; `Forbidden` si no pertenece a una flota
    async fn fleet_owner_of(&self, caller: &CallerIdentity) -> AppResult<String> {
        let driver = self
            .accounts
            .find_by_id(&caller.account_id)
            .await?
            .ok_or_else(|| not_found_error("Account", &caller.account_id))?;
        driver
            .fleet_owner_id
            .ok_or_else(|| AppError::Forbidden("Driver does not belong to a fleet".to_string()))
    }

    /// Dueños ven sus checklists; conductores los de su flota con su avance
    pub async fn list(&self, caller: &CallerIdentity) -> AppResult<Vec<ChecklistView>> {
        match caller.role {
            AccountRole::Owner => {
                let checklists = self.checklists.by_owner(&caller.account_id).await?;
                Ok(checklists.into_iter().map(ChecklistView::for_owner).collect())
            }
            AccountRole::Driver => {
                let owner_id = self.fleet_owner_of(caller).await?;
                let checklists = self.checklists.by_owner(&owner_id).await?;

                let mut views = Vec::with_capacity(checklists.len());
                for checklist in checklists {
                    let status = self
                        .checklists
                        .status_for(&checklist.id, &caller.account_id)
                        .await?;
                    views.push(ChecklistView::for_driver(checklist, status));
                }
                Ok(views)
            }
        }
    }

    pub async fn create(
        &self,
        caller: &CallerIdentity,
        request: CreateChecklistRequest,
    ) -> AppResult<ApiResponse<Checklist>> {
        caller.require_role(AccountRole::Owner, "create checklist")?;
        check_title(&request.title)?;
        check_items(&request.items)?;

        let checklist = self
            .checklists
            .create(
                &caller.account_id,
                CreateChecklistInput {
                    title: request.title,
                    items: request.items,
                },
            )
            .await?;

        Ok(ApiResponse::success_with_message(
            checklist,
            "Checklist created successfully",
        ))
    }

    pub async fn update(
        &self,
        caller: &CallerIdentity,
        id: &str,
        request: UpdateChecklistRequest,
    ) -> AppResult<ApiResponse<Checklist>> {
        caller.require_role(AccountRole::Owner, "update checklist")?;
        if let Some(title) = &request.title {
            check_title(title)?;
        }
        if let Some(items) = &request.items {
            check_items(items)?;
        }

        let checklist = self
            .checklists
            .update(
                id,
                &caller.account_id,
                UpdateChecklistInput {
                    title: request.title,
                    items: request.items,
                },
            )
            .await?;

        Ok(ApiResponse::success_with_message(
            checklist,
            "Checklist updated successfully",
        ))
    }

    /// Borrado en cascada; devuelve cuántas filas de avance se purgaron
    pub async fn delete(&self, caller: &CallerIdentity, id: &str) -> AppResult<usize> {
        caller.require_role(AccountRole::Owner, "delete checklist")?;
        self.checklists.delete(id, &caller.account_id).await
    }

    /// Un conductor marca un ítem de un checklist de su propia flota
    pub async fn set_completion(
        &self,
        caller: &CallerIdentity,
        request: SetCompletionRequest,
    ) -> AppResult<ChecklistCompletion> {
        caller.require_role(AccountRole::Driver, "update checklist progress")?;
        let owner_id = self.fleet_owner_of(caller).await?;

        let checklist = self
            .checklists
            .by_id(&request.checklist_id)
            .await?
            .ok_or_else(|| not_found_error("Checklist", &request.checklist_id))?;
        if checklist.owner_id != owner_id {
            return Err(AppError::Forbidden(
                "Checklist does not belong to the driver's fleet".to_string(),
            ));
        }

        self.checklists
            .set_completion(
                &request.checklist_id,
                &request.item_id,
                &caller.account_id,
                request.completed,
            )
            .await
    }
}
