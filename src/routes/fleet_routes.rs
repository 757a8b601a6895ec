use axum::{
    extract::{Path, State},
    routing::{delete, get, post},
    Json, Router,
};
use serde_json::{json, Value};

use crate::controllers::fleet_controller::FleetController;
use crate::dto::fleet_dto::{FleetCodeResponse, FleetMemberResponse, JoinFleetRequest};
use crate::dto::ApiResponse;
use crate::middleware::identity::CallerIdentity;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_fleet_router() -> Router<AppState> {
    Router::new()
        .route(
            "/code",
            get(get_active_code).post(generate_code).delete(invalidate_code),
        )
        .route("/join", post(join_fleet))
        .route("/members", get(list_members))
        .route("/members/:driver_id", delete(remove_member))
}

async fn generate_code(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<ApiResponse<FleetCodeResponse>>, AppError> {
    let controller = FleetController::new(&state);
    let response = controller.generate_code(&caller).await?;
    Ok(Json(response))
}

async fn get_active_code(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<FleetCodeResponse>, AppError> {
    let controller = FleetController::new(&state);
    let response = controller.active_code(&caller).await?;
    Ok(Json(response))
}

async fn invalidate_code(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<ApiResponse<FleetCodeResponse>>, AppError> {
    let controller = FleetController::new(&state);
    let response = controller.invalidate_code(&caller).await?;
    Ok(Json(response))
}

async fn join_fleet(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(request): Json<JoinFleetRequest>,
) -> Result<Json<ApiResponse<FleetMemberResponse>>, AppError> {
    let controller = FleetController::new(&state);
    let response = controller.join(&caller, &request.code).await?;
    Ok(Json(response))
}

async fn list_members(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<FleetMemberResponse>>, AppError> {
    let controller = FleetController::new(&state);
    let response = controller.members(&caller).await?;
    Ok(Json(response))
}

async fn remove_member(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(driver_id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let controller = FleetController::new(&state);
    controller.remove_member(&caller, &driver_id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Driver removed from fleet"
    })))
}
