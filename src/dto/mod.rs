//! Objetos de request/response de la API

pub mod account_dto;
pub mod checklist_dto;
pub mod common_dto;
pub mod fleet_dto;
pub mod truck_dto;

pub use common_dto::ApiResponse;
