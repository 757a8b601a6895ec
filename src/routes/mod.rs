//! Rutas HTTP
//!
//! Capa delgada sobre los controladores: extracción de identidad y JSON.

pub mod account_routes;
pub mod checklist_routes;
pub mod fleet_routes;
pub mod truck_routes;

use axum::{response::Json, routing::get, Router};
use serde_json::{json, Value};

use crate::state::AppState;

/// Crear el router principal de la API
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .nest("/api/accounts", account_routes::create_account_router())
        .nest("/api/fleet", fleet_routes::create_fleet_router())
        .nest("/api/trucks", truck_routes::create_truck_router())
        .nest("/api/checklists", checklist_routes::create_checklist_router())
}

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "fleet-ops",
        "timestamp": chrono::Utc::now().to_rfc3339(),
    }))
}
