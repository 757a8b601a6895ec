use std::sync::Arc;

use validator::{Validate, ValidationErrors};

use crate::dto::truck_dto::{CreateTruckRequest, UpdateTruckRequest};
use crate::dto::ApiResponse;
use crate::middleware::identity::CallerIdentity;
use crate::models::fleet::Truck;
use crate::models::user::AccountRole;
use crate::repositories::truck_repository::TruckRepository;
use crate::state::AppState;
use crate::utils::errors::{AppError, AppResult};
use crate::utils::validation::validate_truck_year;

fn check_year(year: i32) -> AppResult<()> {
    validate_truck_year(year).map_err(|e| {
        let mut errors = ValidationErrors::new();
        errors.add("year", e);
        AppError::Validation(errors)
    })
}

pub struct TruckController {
    trucks: Arc<TruckRepository>,
}

impl TruckController {
    pub fn new(state: &AppState) -> Self {
        Self {
            trucks: state.trucks.clone(),
        }
    }

    pub async fn register(
        &self,
        caller: &CallerIdentity,
        request: CreateTruckRequest,
    ) -> AppResult<ApiResponse<Truck>> {
        caller.require_role(AccountRole::Owner, "register truck")?;
        request.validate()?;
        check_year(request.year)?;

        let truck = self.trucks.register(&caller.account_id, request.into()).await?;
        Ok(ApiResponse::success_with_message(
            truck,
            "Truck registered successfully",
        ))
    }

    pub async fn list(&self, caller: &CallerIdentity) -> AppResult<Vec<Truck>> {
        caller.require_role(AccountRole::Owner, "list trucks")?;
        self.trucks.by_owner(&caller.account_id).await
    }

    pub async fn get(&self, caller: &CallerIdentity, id: &str) -> AppResult<Truck> {
        caller.require_role(AccountRole::Owner, "read truck")?;
        self.trucks.by_id(id, &caller.account_id).await
    }

    pub async fn update(
        &self,
        caller: &CallerIdentity,
        id: &str,
        request: UpdateTruckRequest,
    ) -> AppResult<ApiResponse<Truck>> {
        caller.require_role(AccountRole::Owner, "update truck")?;
        request.validate()?;
        if let Some(year) = request.year {
            check_year(year)?;
        }

        let truck = self.trucks.update(id, &caller.account_id, request.into()).await?;
        Ok(ApiResponse::success_with_message(
            truck,
            "Truck updated successfully",
        ))
    }

    pub async fn delete(&self, caller: &CallerIdentity, id: &str) -> AppResult<()> {
        caller.require_role(AccountRole::Owner, "delete truck")?;
        self.trucks.delete(id, &caller.account_id).await
    }
}
