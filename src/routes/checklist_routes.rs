use axum::{
    extract::{Path, State},
    routing::{get, patch, put},
    Json, Router,
};
use serde_json::{json, Value};

use crate::controllers::checklist_controller::ChecklistController;
use crate::dto::checklist_dto::{
    ChecklistView, CreateChecklistRequest, SetCompletionRequest, UpdateChecklistRequest,
};
use crate::dto::ApiResponse;
use crate::middleware::identity::CallerIdentity;
use crate::models::checklist::{Checklist, ChecklistCompletion};
use crate::state::AppState;
use crate::utils::errors::AppError;

pub fn create_checklist_router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_checklists).post(create_checklist))
        .route("/completion", patch(set_completion))
        .route("/:id", put(update_checklist).delete(delete_checklist))
}

async fn list_checklists(
    State(state): State<AppState>,
    caller: CallerIdentity,
) -> Result<Json<Vec<ChecklistView>>, AppError> {
    let controller = ChecklistController::new(&state);
    let response = controller.list(&caller).await?;
    Ok(Json(response))
}

async fn create_checklist(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(request): Json<CreateChecklistRequest>,
) -> Result<Json<ApiResponse<Checklist>>, AppError> {
    let controller = ChecklistController::new(&state);
    let response = controller.create(&caller, request).await?;
    Ok(Json(response))
}

async fn update_checklist(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
    Json(request): Json<UpdateChecklistRequest>,
) -> Result<Json<ApiResponse<Checklist>>, AppError> {
    let controller = ChecklistController::new(&state);
    let response = controller.update(&caller, &id, request).await?;
    Ok(Json(response))
}

async fn delete_checklist(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Path(id): Path<String>,
) -> Result<Json<Value>, AppError> {
    let controller = ChecklistController::new(&state);
    let purged = controller.delete(&caller, &id).await?;
    Ok(Json(json!({
        "success": true,
        "message": "Checklist deleted successfully",
        "purged_completions": purged
    })))
}

async fn set_completion(
    State(state): State<AppState>,
    caller: CallerIdentity,
    Json(request): Json<SetCompletionRequest>,
) -> Result<Json<ChecklistCompletion>, AppError> {
    let controller = ChecklistController::new(&state);
    let response = controller.set_completion(&caller, request).await?;
    Ok(Json(response))
}
