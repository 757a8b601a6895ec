use axum::{
    extract::{Path, State},
    routing::get,
    Json, Router,
};
use serde_json::{json, Value};

use crate::controllers::truck_controller::TruckController;
use crate::dto::truck_dto::{CreateTruckRequest, UpdateTruckRequest};
use crate::dto::ApiResponse;
use crate::middleware::identity::CallerIdentity;
use crate::models::fleet::Truck;
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_truck_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_trucks).post(create_truck))
        .route("/:id", get(get_truck).put(update_truck).delete(delete_truck))
}

async fn create_truck(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(request): Json<CreateTruckRequest>,
) -> Result<Json<ApiResponse<Truck>>, AppError> {
    let controller = TruckController::new(&state);
    let response = controller.register(&caller, request).await?;
    Ok(Json(response))
}

async fn list_trucks(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<Truck>>, AppError> {
    let controller = TruckController::new(&state);
    let response = controller.list(&caller).await?;
    Ok(Json(response))
}

async fn get_truck(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<Json<Truck>, AppError> {
    let controller = TruckController::new(&state);
    let response = controller.get(&caller, &id).await?;
    Ok(Json(response))
}

async fn update_truck(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
    Json(request): Json<UpdateTruckRequest>,
) -> Result<Json<ApiResponse<Truck>>, AppError> {
    let controller = TruckController::new(&state);
    let response = controller.update(&caller, &id, request).await?;
    Ok(Json(response))
}

async fn delete_truck(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let controller = TruckController::new(&state);
    controller.delete(&caller, &id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Truck deleted successfully"
    })))
}
