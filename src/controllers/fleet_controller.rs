use std::sync::Arc;

use chrono::Utc;
use tracing::info;

use crate::dto::fleet_dto::{FleetCodeResponse, FleetMemberResponse};
use crate::dto::ApiResponse;
use crate::middleware::identity::CallerIdentity;
use crate::models::fleet::{FleetCode, NewMembership};
use crate::models::user::{AccountRole, AccountUpdate};
use crate::repositories::account_repository::AccountRepository;
use crate::repositories::checklist_repository::ChecklistRepository;
use crate::repositories::fleet_code_repository::{FleetCodeRepository, FleetCodeValidation};
use crate::repositories::fleet_member_repository::FleetMemberRepository;
use crate::state::AppState;
use crate::utils::code_generator::{calculate_expiration_date, generate_unique_fleet_code};
use crate::utils::errors::{bad_request_error, not_found_error, AppError, AppResult};
use crate::utils::validation::{normalize_fleet_code, validate_fleet_code_format};

/// Reglas de flota que los registros no imponen por sí solos:
/// un código activo por dueño y una membresía activa por conductor
pub struct FleetController {
    accounts: Arc<AccountRepository>,
    fleet_codes: Arc<FleetCodeRepository>,
    members: Arc<FleetMemberRepository>,
    checklists: Arc<ChecklistRepository>,
    max_attempts: u32,
}

impl FleetController {
    pub fn new(state: &AppState) -> Self {
        Self {
            accounts: state.accounts.clone(),
            fleet_codes: state.fleet_codes.clone(),
            members: state.members.clone(),
            checklists: state.checklists.clone(),
            max_attempts: state.config.fleet_code_max_attempts,
        }
    }

    pub async fn generate_code(
        &self,
        caller: &CallerIdentity,
    ) -> AppResult<ApiResponse<FleetCodeResponse>> {
        caller.require_role(AccountRole::Owner, "generate fleet code")?;

        if self.fleet_codes.get_active(&caller.account_id).await?.is_some() {
            return Err(AppError::Conflict(
                "An active fleet code already exists; invalidate it first".to_string(),
            ));
        }

        let existing = self.fleet_codes.all_code_strings().await?;
        let code = generate_unique_fleet_code(&existing, self.max_attempts)?;
        let now = Utc::now();
        let record = self
            .fleet_codes
            .create_for_owner(FleetCode {
                code,
                owner_id: caller.account_id.clone(),
                created_at: now,
                expires_at: calculate_expiration_date(now),
                is_active: true,
            })
            .await?;

        Ok(ApiResponse::success_with_message(
            record.into(),
            "Fleet code generated successfully",
        ))
    }

    pub async fn active_code(&self, caller: &CallerIdentity) -> AppResult<FleetCodeResponse> {
        caller.require_role(AccountRole::Owner, "read fleet code")?;
        let code = self
            .fleet_codes
            .get_active(&caller.account_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No active fleet code".to_string()))?;
        Ok(code.into())
    }

    pub async fn invalidate_code(
        &self,
        caller: &CallerIdentity,
    ) -> AppResult<ApiResponse<FleetCodeResponse>> {
        caller.require_role(AccountRole::Owner, "invalidate fleet code")?;
        let active = self
            .fleet_codes
            .get_active(&caller.account_id)
            .await?
            .ok_or_else(|| AppError::NotFound("No active fleet code".to_string()))?;

        let record = self.fleet_codes.invalidate(&active.code).await?;
        Ok(ApiResponse::success_with_message(
            record.into(),
            "Fleet code invalidated",
        ))
    }

    /// Ingreso de un conductor: rol, sin flota previa, código válido
    pub async fn join(
        &self,
        caller: &CallerIdentity,
        raw_code: &str,
    ) -> AppResult<ApiResponse<FleetMemberResponse>> {
        caller.require_role(AccountRole::Driver, "join fleet")?;

        let code = normalize_fleet_code(raw_code);
        if validate_fleet_code_format(&code).is_err() {
            return Err(bad_request_error("Fleet code must be 8 alphanumeric characters"));
        }

        let driver = self
            .accounts
            .find_by_id(&caller.account_id)
            .await?
            .ok_or_else(|| not_found_error("Account", &caller.account_id))?;

        if self.members.by_driver(&driver.id).await?.is_some() {
            return Err(AppError::Conflict("Driver already belongs to a fleet".to_string()));
        }

        let owner_id = match self.fleet_codes.validate(&code).await? {
            FleetCodeValidation::Valid(record) => record.owner_id,
            FleetCodeValidation::Invalid(rejection) => {
                return Err(AppError::BadRequest(rejection.to_string()))
            }
        };

        let membership = self
            .members
            .add_if_no_active(NewMembership {
                driver_id: driver.id.clone(),
                owner_id: owner_id.clone(),
                driver_email: driver.email.clone(),
                driver_name: driver.name.clone(),
            })
            .await?;

        self.accounts
            .update(
                &driver.id,
                AccountUpdate {
                    fleet_owner_id: Some(Some(owner_id)),
                    ..Default::default()
                },
            )
            .await?;

        Ok(ApiResponse::success_with_message(
            membership.into(),
            "Joined fleet successfully",
        ))
    }

    pub async fn members(&self, caller: &CallerIdentity) -> AppResult<Vec<FleetMemberResponse>> {
        caller.require_role(AccountRole::Owner, "list fleet members")?;
        let members = self.members.by_owner(&caller.account_id).await?;
        Ok(members.into_iter().map(Into::into).collect())
    }

    /// Retirar a un conductor: la membresía pasa a `removed`, se limpia su
    /// `fleet_owner_id` y se purga su avance en los checklists del dueño
    pub async fn remove_member(&self, caller: &CallerIdentity, driver_id: &str) -> AppResult<()> {
        caller.require_role(AccountRole::Owner, "remove fleet member")?;

        if !self.members.remove(driver_id, &caller.account_id).await? {
            return Err(AppError::NotFound(format!(
                "Driver '{}' is not an active member of this fleet",
                driver_id
            )));
        }

        self.accounts
            .update(
                driver_id,
                AccountUpdate {
                    fleet_owner_id: Some(None),
                    ..Default::default()
                },
            )
            .await?;

        let purged = self.checklists.delete_driver_completions(driver_id).await?;
        info!(
            "🚪 Conductor {} retirado de la flota de {} ({} completitudes purgadas)",
            driver_id, caller.account_id, purged
        );
        Ok(())
    }
}
