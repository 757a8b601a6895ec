use std::sync::Arc;

use tracing::info;
use validator::Validate;

use crate::dto::account_dto::{AccountResponse, RegisterAccountRequest, UpdateProfileRequest};
use crate::dto::ApiResponse;
use crate::middleware::identity::CallerIdentity;
use crate::models::user::{AccountRole, CreateAccountInput};
use crate::repositories::account_repository::AccountRepository;
use crate::services::role_change_service::{ProfileChange, RoleChangeService};
use crate::state::AppState;
use crate::utils::errors::{bad_request_error, not_found_error, AppResult};

fn parse_role(value: &str) -> AppResult<AccountRole> {
    AccountRole::parse(value)
        .ok_or_else(|| bad_request_error("Role must be either 'owner' or 'driver'"))
}

pub struct AccountController {
    accounts: Arc<AccountRepository>,
    role_changes: Arc<RoleChangeService>,
}

impl AccountController {
    pub fn new(state: &AppState) -> Self {
        Self {
            accounts: state.accounts.clone(),
            role_changes: state.role_changes.clone(),
        }
    }

    pub async fn register(
        &self,
        request: RegisterAccountRequest,
    ) -> AppResult<ApiResponse<AccountResponse>> {
        request.validate()?;
        let role = parse_role(&request.role)?;

        let account = self
            .accounts
            .create(CreateAccountInput {
                email: request.email,
                password: request.password,
                name: request.name,
                role,
            })
            .await?;

        Ok(ApiResponse::success_with_message(
            account.into(),
            "Account registered successfully",
        ))
    }

    pub async fn profile(&self, caller: &CallerIdentity) -> AppResult<AccountResponse> {
        let account = self
            .accounts
            .find_by_id(&caller.account_id)
            .await?
            .ok_or_else(|| not_found_error("Account", &caller.account_id))?;
        Ok(account.into())
    }

    /// Actualizar nombre, email y/o rol; un cambio de rol pasa por el orquestador
    pub async fn update_profile(
        &self,
        caller: &CallerIdentity,
        request: UpdateProfileRequest,
    ) -> AppResult<ApiResponse<AccountResponse>> {
        request.validate()?;
        let role = request.role.as_deref().map(parse_role).transpose()?;

        if request.email.is_none() && request.name.is_none() && role.is_none() {
            return Err(bad_request_error("No profile fields to update"));
        }

        let change = ProfileChange {
            name: request.name.map(|n| n.trim().to_string()),
            email: request.email.map(|e| e.trim().to_string()),
            role,
        };
        let account = self.role_changes.apply(&caller.account_id, change).await?;

        if role.is_some_and(|r| r != caller.role) {
            info!("🔄 {} ahora tiene rol {}", account.id, account.role);
        }

        Ok(ApiResponse::success_with_message(
            account.into(),
            "Profile updated successfully",
        ))
    }
}
