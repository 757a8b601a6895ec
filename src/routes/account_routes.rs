use axum::{
    extract::State,
    routing::{get, post},
    Json, Router,
};

use crate::controllers::account_controller::AccountController;
use crate::dto::account_dto::{AccountResponse, RegisterAccountRequest, UpdateProfileRequest};
use crate::dto::ApiResponse;
use crate::middleware::identity::CallerIdentity;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_account_router() -> Router<AppState> {
    Router::new()
        .route("/register", post(register))
        .route("/profile", get(get_profile).put(update_profile))
}

async fn register(
    State(state): State<AppState>,
    Json(request): Json<RegisterAccountRequest>,
) -> Result<Json<ApiResponse<AccountResponse>>, AppError> {
    let controller = AccountController::new(&state);
    let response = controller.register(request).await?;
    Ok(Json(response))
}

async fn get_profile(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<AccountResponse>, AppError> {
    let controller = AccountController::new(&state);
    let response = controller.profile(&caller).await?;
    Ok(Json(response))
}

async fn update_profile(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(request): Json<UpdateProfileRequest>,
) -> Result<Json<ApiResponse<AccountResponse>>, AppError> {
    let controller = AccountController::new(&state);
    let response = controller.update_profile(&caller, request).await?;
    Ok(Json(response))
}
